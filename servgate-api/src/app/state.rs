use servgate_core::Gateway;
use std::sync::Arc;

/// Shared application state for handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
}
