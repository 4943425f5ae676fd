//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::config::Config;
use crate::upstream::{ModalClient, UpstreamError, XaiClient, http_client};

/// State shared across all HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Music inference service.
    pub modal: ModalClient,
    /// Lyrics model; `None` when no API key is configured.
    pub xai: Option<XaiClient>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, UpstreamError> {
        let client = http_client()?;
        let modal = ModalClient::new(client.clone(), &config.modal_api_url)?;
        let xai = match &config.xai_api_key {
            Some(key) => Some(XaiClient::new(
                client,
                &config.xai_base_url,
                key.clone(),
                config.xai_model.clone(),
            )?),
            None => None,
        };
        Ok(Self { config: Arc::new(config), modal, xai })
    }
}
