//! # Application State
//!
//! Shared state handed to every relay session: the loaded configuration, the
//! connection registry, and the translation pipeline. Built once at startup
//! and shared via `Arc`; the registry is the only mutable piece and guards
//! itself.

use crate::config::AppConfig;
use crate::relay::registry::ConnectionRegistry;
use crate::translation::{TranslationBackend, TranslationPipeline};
use std::sync::Arc;

pub struct AppState {
    pub config: AppConfig,
    pub registry: ConnectionRegistry,
    pub pipeline: TranslationPipeline,
}

impl AppState {
    /// Create application state from configuration and the external
    /// translation backend.
    pub fn new(config: AppConfig, backend: Arc<dyn TranslationBackend>) -> Self {
        let pipeline = TranslationPipeline::new(backend, config.languages.clone());
        Self {
            config,
            registry: ConnectionRegistry::new(),
            pipeline,
        }
    }
}
