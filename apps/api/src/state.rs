use std::sync::Arc;

use crate::config::Config;
use crate::llm::Llm;
use crate::render::Compiler;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// LLM behind a trait object so tests substitute a scripted double.
    pub llm: Arc<dyn Llm>,
    /// Typesetting engine, likewise pluggable.
    pub compiler: Arc<dyn Compiler>,
    pub store: Store,
    pub config: Config,
}
