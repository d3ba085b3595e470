//! Shared state for every HTTP handler.

use std::sync::Arc;

use crate::application::DraftSessionManager;
use crate::ports::ProviderInfo;

/// Application state cloned into each request.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<DraftSessionManager>,
    pub provider: ProviderInfo,
}

impl AppState {
    pub fn new(manager: Arc<DraftSessionManager>, provider: ProviderInfo) -> Self {
        Self { manager, provider }
    }
}
