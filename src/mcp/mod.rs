pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;

use crate::model::Model;
use crate::poster::PosterSource;

/// Shared, read-only state handed to every request.
pub struct ServerContext<'a> {
    pub model: &'a Model,
    pub posters: &'a dyn PosterSource,
    pub default_n: usize,
}

impl<'a> ServerContext<'a> {
    pub fn new(model: &'a Model, posters: &'a dyn PosterSource, default_n: usize) -> Self {
        Self {
            model,
            posters,
            default_n,
        }
    }
}
