//! Contract with the embedding host: identity tokens, shop context and the
//! native product picker.
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::error::BridgeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickerOptions {
    pub multiple: bool,
}

#[async_trait]
pub trait HostBridge: Send + Sync {
    /// Fresh identity token for one outgoing request.
    async fn id_token(&self) -> Result<String, BridgeError>;

    fn shop_domain(&self) -> &str;

    /// Access token for the store admin API, when the host exposes one.
    fn admin_access_token(&self) -> Option<String>;

    /// Open the product picker. Returns the raw payload; see
    /// [`crate::picker::normalize_picker_payload`].
    async fn pick_products(&self, options: PickerOptions) -> Result<Value, BridgeError>;
}

/// Bridge backed by configuration, used when running outside the admin iframe.
/// Picker payloads are queued up front (e.g. from command-line arguments).
pub struct StaticBridge {
    shop_domain: String,
    id_token: Option<String>,
    admin_access_token: Option<String>,
    picks: Mutex<VecDeque<Value>>,
}

impl StaticBridge {
    pub fn new(shop_domain: impl Into<String>) -> Self {
        Self {
            shop_domain: shop_domain.into(),
            id_token: None,
            admin_access_token: None,
            picks: Mutex::new(VecDeque::new()),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        let non_empty = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());
        Self {
            shop_domain: cfg.app.shop_domain.trim().to_string(),
            id_token: non_empty(&cfg.auth.id_token),
            admin_access_token: non_empty(&cfg.auth.admin_access_token),
            picks: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_id_token(mut self, token: impl Into<String>) -> Self {
        self.id_token = Some(token.into());
        self
    }

    pub async fn queue_pick(&self, payload: Value) {
        self.picks.lock().await.push_back(payload);
    }
}

#[async_trait]
impl HostBridge for StaticBridge {
    async fn id_token(&self) -> Result<String, BridgeError> {
        self.id_token
            .clone()
            .ok_or_else(|| BridgeError::TokenUnavailable("no id_token configured".into()))
    }

    fn shop_domain(&self) -> &str {
        &self.shop_domain
    }

    fn admin_access_token(&self) -> Option<String> {
        self.admin_access_token.clone()
    }

    async fn pick_products(&self, _options: PickerOptions) -> Result<Value, BridgeError> {
        self.picks
            .lock()
            .await
            .pop_front()
            .ok_or(BridgeError::PickerCancelled)
    }
}
