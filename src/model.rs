//! Wire shapes of the backend's configuration and report payloads.
use serde::{Deserialize, Deserializer, Serialize};

use crate::gid::ProductId;

/// Per-product coming-soon configuration as stored by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ComingSoonConfig {
    pub start_date: Option<String>,
    pub start_time: Option<String>,
    pub end_date: Option<String>,
    pub end_time: Option<String>,
    pub start_timestamp: Option<String>,
    pub end_timestamp: Option<String>,
    pub product_title: Option<String>,
    pub product_image_url: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub enable_notify_me: bool,
}

/// Backend documents sometimes carry `null` where a value is expected.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Rows for deleted products carry a null or unusable id.
fn lenient_product_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<ProductId>, D::Error> {
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| serde_json::from_value(v).ok()))
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ButtonType {
    #[default]
    Rounded,
    Sharp,
}

impl ButtonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ButtonType::Rounded => "rounded",
            ButtonType::Sharp => "sharp",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ButtonConfig {
    pub is_custom_button: bool,
    pub button_text: String,
    pub button_color: String,
    pub button_type: ButtonType,
    pub text_color: String,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            is_custom_button: false,
            button_text: "Notify Me".into(),
            button_color: "#0080FF".into(),
            button_type: ButtonType::Rounded,
            text_color: "#FFFFFF".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FormConfig {
    pub heading: String,
    pub description: String,
    pub button_text: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            heading: "Get Notified When Available".into(),
            description: "Enter your email address and we'll send you a notification when this item becomes available again.".into(),
            button_text: "Notify Me".into(),
        }
    }
}

/// The `sold_out` feature config: the notify-me toggle plus widget styling.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NotifyMeSettings {
    // older backends stored the misspelled key
    #[serde(alias = "enable_nofity_me", deserialize_with = "null_as_default")]
    pub enable_notify_me: bool,
    pub button_config: ButtonConfig,
    pub form_config: FormConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreOrderProduct {
    pub product_id: ProductId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PreOrderSelection {
    pub products: Vec<PreOrderProduct>,
}

impl PreOrderSelection {
    pub fn contains(&self, id: ProductId) -> bool {
        self.products.iter().any(|p| p.product_id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subscription {
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_product_id")]
    pub product_id: Option<ProductId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub product_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default)]
    pub product_image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubscriptionPage {
    pub subscriptions: Vec<Subscription>,
    pub pagination: Option<Pagination>,
}

/// Body of the report download request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReportRange {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitPayload {
    pub shop_domain: String,
    pub session_token: String,
}

/// Store product as listed by the admin catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub title: String,
    pub status: String,
    pub price: String,
    pub inventory_quantity: i64,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CatalogResponse {
    pub products: Vec<AdminProduct>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AdminProduct {
    pub id: ProductId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub variants: Vec<AdminVariant>,
    #[serde(default)]
    pub image: Option<AdminImage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AdminVariant {
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub inventory_quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AdminImage {
    #[serde(default)]
    pub src: Option<String>,
}

impl From<AdminProduct> for CatalogProduct {
    fn from(p: AdminProduct) -> Self {
        let first = p.variants.first();
        Self {
            id: p.id,
            title: p.title,
            status: p.status,
            price: first
                .and_then(|v| v.price.clone())
                .unwrap_or_else(|| "0".into()),
            inventory_quantity: first.and_then(|v| v.inventory_quantity).unwrap_or(0),
            image_url: p.image.and_then(|i| i.src),
        }
    }
}
