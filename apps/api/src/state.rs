use std::sync::Arc;

use crate::auth::SessionResolver;
use crate::config::Config;
use crate::items::pipeline::ImportPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: ImportPipeline,
    /// Pluggable session source. Default: `AuthClient` against `AUTH_URL`.
    pub sessions: Arc<dyn SessionResolver>,
    pub config: Config,
}
