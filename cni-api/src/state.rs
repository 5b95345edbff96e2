use crate::config::Config;
use crate::email::Mailer;
use cni_core::storage::Storage;
use std::sync::Arc;

/// Shared handler state: storage backend, mail transport, configuration.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, mailer: Arc<dyn Mailer>, config: Config) -> Self {
        Self {
            storage,
            mailer,
            config: Arc::new(config),
        }
    }
}
