//! Sold-out page: a single toggle for the storefront "Notify Me" opt-in.
use serde_json::Value;

use crate::api::Feature;
use crate::controller::{ConfigForm, ConfigPage};
use crate::error::ApiError;
use crate::model::NotifyMeSettings;

/// Shares the `sold_out` document with the notify-me styling page. The whole
/// document is kept as the draft so saving the toggle keeps the styling.
#[derive(Debug, Default, Clone, Copy)]
pub struct SoldOutForm;

impl ConfigForm for SoldOutForm {
    type Draft = NotifyMeSettings;

    fn feature(&self) -> Feature {
        Feature::SoldOut
    }

    fn defaults(&self) -> NotifyMeSettings {
        NotifyMeSettings::default()
    }

    fn from_remote(&self, remote: Value) -> Result<NotifyMeSettings, ApiError> {
        Ok(serde_json::from_value(remote)?)
    }

    fn to_remote(&self, draft: &NotifyMeSettings) -> Result<Value, ApiError> {
        Ok(serde_json::to_value(draft)?)
    }

    fn saved_banner(&self, draft: &NotifyMeSettings) -> (String, String) {
        let state = if draft.enable_notify_me { "shown" } else { "hidden" };
        (
            "Settings Saved Successfully".into(),
            format!("The 'Notify Me' option is now {state} for sold out items."),
        )
    }
}

pub type SoldOutPage = ConfigPage<SoldOutForm>;

impl ConfigPage<SoldOutForm> {
    pub fn notify_me_enabled(&self) -> Option<bool> {
        self.draft().map(|d| d.enable_notify_me)
    }

    pub fn set_notify_me(&mut self, enabled: bool) -> bool {
        self.edit(|d| d.enable_notify_me = enabled)
    }
}
