use serde_json::{json, Value};

use super::protocol::{ToolDefinition, ToolResult};
use super::ServerContext;
use crate::model::rank::Scored;
use crate::poster::Poster;

const DEFAULT_TITLE_LIMIT: usize = 50;

pub fn list_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "recommend".into(),
            description: "Titles most similar to the given title, best first. The title must match exactly; an unknown title returns no recommendations.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "Exact catalog title"
                    },
                    "n": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Number of recommendations (default from config)"
                    }
                },
                "required": ["title"]
            }),
        },
        ToolDefinition {
            name: "titles".into(),
            description: "List catalog titles in catalog order, optionally filtered by a case-insensitive substring.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "filter": {
                        "type": "string",
                        "description": "Substring to match"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum titles to return (default: 50)"
                    }
                }
            }),
        },
        ToolDefinition {
            name: "poster".into(),
            description: "Fetch and thumbnail the poster of a title. Reports when the poster is unavailable.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "Exact catalog title"
                    }
                },
                "required": ["title"]
            }),
        },
    ]
}

pub fn call_tool(name: &str, args: &Value, ctx: &ServerContext) -> ToolResult {
    match name {
        "recommend" => tool_recommend(args, ctx),
        "titles" => tool_titles(args, ctx),
        "poster" => tool_poster(args, ctx),
        _ => ToolResult::error(format!("Unknown tool: {name}")),
    }
}

fn format_recommendation(query: &str, recs: &[Scored]) -> String {
    let mut out = format!("{} recommendation(s) for {query}\n", recs.len());
    for (rank, rec) in recs.iter().enumerate() {
        let genre = if rec.item.genre.is_empty() { "-" } else { rec.item.genre.as_str() };
        out.push_str(&format!(
            "{:>2}. {} ({genre}) rating {:.1} score {:.4}\n",
            rank + 1,
            rec.item.title,
            rec.item.rating,
            rec.score,
        ));
    }
    out
}

fn tool_recommend(args: &Value, ctx: &ServerContext) -> ToolResult {
    let title = match args.get("title").and_then(|v| v.as_str()) {
        Some(t) => t,
        None => return ToolResult::error("Missing required parameter: title"),
    };
    let n = match args.get("n") {
        None | Some(Value::Null) => ctx.default_n,
        Some(v) => match v.as_u64() {
            Some(n) => n as usize,
            None => return ToolResult::error("Parameter n must be a positive integer"),
        },
    };

    match ctx.model.recommend(title, n) {
        Ok(recs) if recs.is_empty() => {
            let mut out = String::from("No recommendations found.");
            let suggestions = ctx.model.catalog().suggest(title, 5);
            if !suggestions.is_empty() {
                out.push_str(&format!(" Did you mean: {}?", suggestions.join(", ")));
            }
            ToolResult::success(out)
        }
        Ok(recs) => ToolResult::success(format_recommendation(title, &recs)),
        Err(e) => ToolResult::error(e.to_string()),
    }
}

fn tool_titles(args: &Value, ctx: &ServerContext) -> ToolResult {
    let limit = args
        .get("limit")
        .and_then(|v| v.as_u64())
        .map(|n| n as usize)
        .unwrap_or(DEFAULT_TITLE_LIMIT);
    let catalog = ctx.model.catalog();
    let titles = match args.get("filter").and_then(|v| v.as_str()) {
        Some(filter) => catalog.suggest(filter, limit),
        None => catalog.titles().into_iter().take(limit).collect(),
    };
    if titles.is_empty() {
        return ToolResult::success("No titles found.");
    }
    ToolResult::success(titles.join("\n"))
}

fn tool_poster(args: &Value, ctx: &ServerContext) -> ToolResult {
    let title = match args.get("title").and_then(|v| v.as_str()) {
        Some(t) => t,
        None => return ToolResult::error("Missing required parameter: title"),
    };
    let Some(item) = ctx.model.catalog().find(title) else {
        return ToolResult::error(format!("Unknown title: {title}"));
    };
    match ctx.posters.enhance(&item.poster) {
        Poster::Present(thumb) => ToolResult::success(
            json!({
                "title": item.title,
                "url": item.poster,
                "width": thumb.width(),
                "height": thumb.height(),
            })
            .to_string(),
        ),
        Poster::Absent(reason) => {
            ToolResult::success(format!("Poster not available for {}: {reason}", item.title))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, CatalogItem};
    use crate::model::vectorize::Weighting;
    use crate::model::Model;
    use crate::poster::PosterSource;

    struct NoPosters;

    impl PosterSource for NoPosters {
        fn enhance(&self, _url: &str) -> Poster {
            Poster::Absent("offline".into())
        }
    }

    fn model() -> Model {
        Model::build(
            Catalog::new(vec![
                CatalogItem::new("Heat", "crime drama"),
                CatalogItem::new("Ronin", "crime thriller"),
                CatalogItem::new("Amelie", "romance comedy"),
            ]),
            Weighting::Count,
            1,
        )
    }

    fn text(result: &ToolResult) -> &str {
        &result.content[0].text
    }

    #[test]
    fn recommend_tool_lists_ranked_titles() {
        let model = model();
        let ctx = ServerContext::new(&model, &NoPosters, 5);
        let result = call_tool("recommend", &json!({"title": "Heat", "n": 2}), &ctx);
        assert!(result.is_error.is_none());
        let out = text(&result);
        assert!(out.starts_with("2 recommendation(s) for Heat"));
        assert!(out.find("Ronin").unwrap() < out.find("Amelie").unwrap());
    }

    #[test]
    fn recommend_unknown_title_suggests() {
        let model = model();
        let ctx = ServerContext::new(&model, &NoPosters, 5);
        let result = call_tool("recommend", &json!({"title": "heat"}), &ctx);
        assert!(result.is_error.is_none());
        assert_eq!(text(&result), "No recommendations found. Did you mean: Heat?");
    }

    #[test]
    fn recommend_zero_n_is_error() {
        let model = model();
        let ctx = ServerContext::new(&model, &NoPosters, 5);
        let result = call_tool("recommend", &json!({"title": "Heat", "n": 0}), &ctx);
        assert_eq!(result.is_error, Some(true));
        assert!(text(&result).contains("n must be positive"));
    }

    #[test]
    fn titles_tool_filters() {
        let model = model();
        let ctx = ServerContext::new(&model, &NoPosters, 5);
        let all = call_tool("titles", &json!({}), &ctx);
        assert_eq!(text(&all), "Heat\nRonin\nAmelie");
        let some = call_tool("titles", &json!({"filter": "RON", "limit": 3}), &ctx);
        assert_eq!(text(&some), "Ronin");
    }

    #[test]
    fn poster_tool_reports_absent() {
        let model = model();
        let ctx = ServerContext::new(&model, &NoPosters, 5);
        let result = call_tool("poster", &json!({"title": "Heat"}), &ctx);
        assert!(result.is_error.is_none());
        assert_eq!(text(&result), "Poster not available for Heat: offline");
        let unknown = call_tool("poster", &json!({"title": "Nope"}), &ctx);
        assert_eq!(unknown.is_error, Some(true));
    }

    #[test]
    fn unknown_tool() {
        let model = model();
        let ctx = ServerContext::new(&model, &NoPosters, 5);
        assert_eq!(call_tool("index", &json!({}), &ctx).is_error, Some(true));
    }
}
