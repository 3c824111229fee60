use super::protocol::{Resource, ResourceContent};
use super::ServerContext;

pub const MODEL_URI: &str = "reelmatch://model";

pub fn list_resources() -> Vec<Resource> {
    vec![Resource {
        uri: MODEL_URI.into(),
        name: "Model Stats".into(),
        description: "Catalog size, vocabulary, weighting and dataset fingerprint of the loaded model".into(),
        mime_type: "application/json".into(),
    }]
}

pub fn read_resource(uri: &str, ctx: &ServerContext) -> Result<Vec<ResourceContent>, String> {
    if uri != MODEL_URI {
        return Err(format!("Unknown resource URI: {uri}"));
    }
    let text = serde_json::to_string_pretty(ctx.model.stats())
        .map_err(|e| format!("Failed to encode model stats: {e}"))?;
    Ok(vec![ResourceContent {
        uri: uri.to_string(),
        mime_type: "application/json".into(),
        text,
    }])
}
