use std::sync::Arc;

use confstream_leg_core::{CallFlowController, CallbackUrls, Result};

/// Shared state of every webhook handler
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<CallFlowController>,
    /// Overrides the `Host` header when building callback URLs
    pub public_host: Option<String>,
}

impl AppState {
    pub fn new(controller: Arc<CallFlowController>, public_host: Option<String>) -> Self {
        Self {
            controller,
            public_host,
        }
    }

    /// Callback URLs for a request that arrived with `request_host`
    pub fn callback_urls(&self, request_host: &str) -> Result<CallbackUrls> {
        let host = self.public_host.as_deref().unwrap_or(request_host);
        CallbackUrls::new(&self.controller.config().callback_scheme, host)
    }
}
