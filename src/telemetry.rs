//! Install ping sent when the app starts. Never affects the caller.
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::BackendApi;

pub async fn announce_install(api: &BackendApi) {
    match api.announce_install().await {
        Ok(()) => debug!(shop = api.shop_domain(), "install announced"),
        Err(err) => warn!(%err, "install ping failed"),
    }
}

/// Fire and forget. The handle is only useful to tests that want to wait.
pub fn spawn_announce(api: Arc<BackendApi>) -> JoinHandle<()> {
    tokio::spawn(async move { announce_install(&api).await })
}
