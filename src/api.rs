use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{StatusCode, Url};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::bridge::HostBridge;
use crate::client::RequestClient;
use crate::config::Config;
use crate::error::{ApiError, BridgeError};
use crate::gid::ProductId;
use crate::model::{
    CatalogProduct, CatalogResponse, InitPayload, ReportRange, SubscriptionPage,
};

const ADMIN_TOKEN_HEADER: &str = "x-shopify-access-token";

/// Feature areas with a config document on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    ComingSoon,
    SoldOut,
    PreOrder,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::ComingSoon => "coming_soon",
            Feature::SoldOut => "sold_out",
            Feature::PreOrder => "pre_order",
        }
    }
}

/// Typed access to the never-miss backend for one shop.
#[derive(Debug, Clone)]
pub struct BackendApi {
    client: RequestClient,
    base_url: Url,
    init_base_url: Url,
    catalog_api_version: String,
    catalog_limit: u32,
}

impl BackendApi {
    pub fn new(client: RequestClient, base_url: &str) -> Result<Self, ApiError> {
        let base_url = parse_base(base_url)?;
        Ok(Self {
            client,
            init_base_url: base_url.clone(),
            base_url,
            catalog_api_version: "2023-10".into(),
            catalog_limit: 20,
        })
    }

    pub fn from_config(client: RequestClient, cfg: &Config) -> Result<Self, ApiError> {
        let mut api = Self::new(client, &cfg.backend.base_url)?;
        api.init_base_url = parse_base(cfg.init_base_url())?;
        api.catalog_api_version = cfg.catalog.api_version.clone();
        api.catalog_limit = cfg.catalog.limit;
        Ok(api)
    }

    pub fn bridge(&self) -> &Arc<dyn HostBridge> {
        self.client.bridge()
    }

    pub fn shop_domain(&self) -> &str {
        self.client.bridge().shop_domain()
    }

    fn shop_url(&self, base: &Url, path: &str) -> Result<Url, ApiError> {
        base.join(&format!("{}/{}", self.shop_domain(), path))
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))
    }

    pub fn config_url(&self, feature: Feature, product: Option<ProductId>) -> Result<Url, ApiError> {
        let path = match product {
            Some(id) => format!("config/{}/{}", feature.as_str(), id),
            None => format!("config/{}", feature.as_str()),
        };
        self.shop_url(&self.base_url, &path)
    }

    /// `Ok(None)` when the backend has no config yet (404).
    #[instrument(skip(self, feature), fields(feature = feature.as_str()))]
    pub async fn fetch_config(
        &self,
        feature: Feature,
        product: Option<ProductId>,
    ) -> Result<Option<Value>, ApiError> {
        let url = self.config_url(feature, product)?;
        let res = self.client.get(url).await?;
        if res.status == StatusCode::NOT_FOUND {
            debug!("no configuration stored yet");
            return Ok(None);
        }
        let res = res.error_for_status()?;
        Ok(Some(res.json()?))
    }

    /// PUT the full config document.
    #[instrument(skip(self, feature, body), fields(feature = feature.as_str()))]
    pub async fn save_config(
        &self,
        feature: Feature,
        product: Option<ProductId>,
        body: &Value,
    ) -> Result<(), ApiError> {
        let url = self.config_url(feature, product)?;
        let res = self.client.put(url, body).await?.error_for_status()?;
        info!(status = %res.status, "configuration saved");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_subscriptions(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<SubscriptionPage, ApiError> {
        let mut url = self.shop_url(&self.base_url, "subscriptions")?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string());
        let res = self.client.get(url).await?.error_for_status()?;
        res.json()
    }

    /// Raw CSV bytes for the notify-me subscriptions in the range.
    #[instrument(skip(self))]
    pub async fn download_report(&self, range: &ReportRange) -> Result<Vec<u8>, ApiError> {
        let url = self.shop_url(&self.base_url, "report/notify-me/download")?;
        let res = self.client.post(url, range).await?.error_for_status()?;
        Ok(res.body)
    }

    /// Install ping sent when the app is opened.
    #[instrument(skip(self))]
    pub async fn announce_install(&self) -> Result<(), ApiError> {
        let url = self.shop_url(&self.init_base_url, "init")?;
        let payload = InitPayload {
            shop_domain: self.shop_domain().to_string(),
            session_token: String::new(),
        };
        self.client.post(url, &payload).await?.error_for_status()?;
        Ok(())
    }

    /// Products from the store admin API, for the pre-order picker.
    #[instrument(skip(self))]
    pub async fn list_catalog(&self) -> Result<Vec<CatalogProduct>, ApiError> {
        let mut url = Url::parse(&format!(
            "https://{}/admin/api/{}/products.json",
            self.shop_domain(),
            self.catalog_api_version
        ))
        .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("limit", &self.catalog_limit.to_string());

        let mut headers = HeaderMap::new();
        if let Some(token) = self.bridge().admin_access_token() {
            let value = HeaderValue::from_str(&token).map_err(|_| {
                BridgeError::TokenUnavailable("admin access token is not a valid header value".into())
            })?;
            headers.insert(HeaderName::from_static(ADMIN_TOKEN_HEADER), value);
        }
        let res = self
            .client
            .get_with_headers(url, &headers)
            .await?
            .error_for_status()?;
        let catalog: CatalogResponse = res.json()?;
        Ok(catalog.products.into_iter().map(Into::into).collect())
    }
}

fn parse_base(raw: &str) -> Result<Url, ApiError> {
    let mut raw = raw.trim().to_string();
    // Url::join drops the last segment unless the base ends with '/'
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(e.to_string()))
}
