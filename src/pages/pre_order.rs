//! Pre-order page: which products customers may pre-order when out of stock.
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::{BackendApi, Feature};
use crate::bridge::PickerOptions;
use crate::controller::{Banner, ConfigForm, ConfigPage, ListState, PageState};
use crate::error::{ApiError, BridgeError, PageError};
use crate::gid::ProductId;
use crate::model::{CatalogProduct, PreOrderProduct, PreOrderSelection};
use crate::picker::normalize_picker_payload;

#[derive(Debug, Default, Clone, Copy)]
pub struct PreOrderForm;

impl ConfigForm for PreOrderForm {
    type Draft = PreOrderSelection;

    fn feature(&self) -> Feature {
        Feature::PreOrder
    }

    fn defaults(&self) -> PreOrderSelection {
        PreOrderSelection::default()
    }

    fn from_remote(&self, remote: Value) -> Result<PreOrderSelection, ApiError> {
        Ok(serde_json::from_value(remote)?)
    }

    fn to_remote(&self, draft: &PreOrderSelection) -> Result<Value, ApiError> {
        Ok(serde_json::to_value(draft)?)
    }

    fn saved_banner(&self, draft: &PreOrderSelection) -> (String, String) {
        let n = draft.products.len();
        (
            "Settings Saved Successfully".into(),
            format!(
                "{n} product{} selected for pre-order.",
                if n == 1 { "" } else { "s" }
            ),
        )
    }
}

/// Selection page plus the store catalog it picks from.
pub struct PreOrderPage {
    page: ConfigPage<PreOrderForm>,
    catalog: ListState<CatalogProduct>,
}

impl PreOrderPage {
    pub fn new(api: Arc<BackendApi>) -> Self {
        Self {
            page: ConfigPage::new(api, PreOrderForm),
            catalog: ListState::Loading,
        }
    }

    pub fn page(&self) -> &ConfigPage<PreOrderForm> {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut ConfigPage<PreOrderForm> {
        &mut self.page
    }

    pub fn selected(&self) -> &[PreOrderProduct] {
        self.page.draft().map(|d| d.products.as_slice()).unwrap_or(&[])
    }

    pub async fn load(&mut self) {
        self.page.load().await;
    }

    /// Load store products. On failure the catalog is left empty and a
    /// banner explains why; no placeholder products are substituted.
    pub async fn load_catalog(&mut self) {
        if self.catalog.is_unmounted() {
            return;
        }
        self.catalog.begin_refresh();
        let result = self.page.api().list_catalog().await;
        match result {
            Ok(products) => {
                info!(count = products.len(), "catalog loaded");
                self.catalog.finish(products);
            }
            Err(err) => {
                warn!(%err, "failed to load store products");
                self.catalog.finish(Vec::new());
                self.page.show_banner(Banner::critical(
                    "Products Unavailable",
                    "Store products could not be loaded. Please try again.",
                ));
            }
        }
    }

    pub fn catalog(&self) -> &[CatalogProduct] {
        self.catalog.rows()
    }

    /// Catalog entries whose title contains `term`, ignoring case.
    pub fn filtered_catalog(&self, term: &str) -> Vec<&CatalogProduct> {
        let needle = term.trim().to_lowercase();
        self.catalog()
            .iter()
            .filter(|p| p.title.to_lowercase().contains(&needle))
            .collect()
    }

    /// Select or deselect a catalog product.
    pub fn toggle(&mut self, product: ProductId) -> bool {
        if self.selected().iter().any(|p| p.product_id == product) {
            return self.remove(product);
        }
        let Some(found) = self.catalog().iter().find(|p| p.id == product).cloned() else {
            return false;
        };
        self.page.edit(|d| {
            d.products.push(PreOrderProduct {
                product_id: found.id,
                title: found.title,
                image_url: found.image_url,
            })
        })
    }

    pub fn remove(&mut self, product: ProductId) -> bool {
        if !self.selected().iter().any(|p| p.product_id == product) {
            return false;
        }
        self.page
            .edit(|d| d.products.retain(|p| p.product_id != product))
    }

    /// Open the host picker (multi-select) and add new picks. Returns how
    /// many products were added.
    pub async fn pick_products(&mut self) -> Result<usize, PageError> {
        if !matches!(self.page.state(), PageState::Ready { .. }) {
            return Err(PageError::NotReady);
        }
        let payload = match self
            .page
            .api()
            .bridge()
            .pick_products(PickerOptions { multiple: true })
            .await
        {
            Ok(payload) => payload,
            Err(BridgeError::PickerCancelled) => return Ok(0),
            Err(err) => return Err(ApiError::from(err).into()),
        };
        let mut fresh: Vec<PreOrderProduct> = Vec::new();
        for p in normalize_picker_payload(payload)? {
            let known = self.selected().iter().any(|s| s.product_id == p.id)
                || fresh.iter().any(|s| s.product_id == p.id);
            if !known {
                fresh.push(PreOrderProduct {
                    product_id: p.id,
                    title: p.title,
                    image_url: p.image_url,
                });
            }
        }
        // a repeat pick leaves the page clean
        if fresh.is_empty() {
            return Ok(0);
        }
        let added = fresh.len();
        self.page.edit(|d| d.products.extend(fresh));
        Ok(added)
    }

    pub async fn save(&mut self) -> Result<(), PageError> {
        self.page.save().await
    }

    pub fn unmount(&mut self) {
        self.page.unmount();
        self.catalog = ListState::Unmounted;
    }
}
