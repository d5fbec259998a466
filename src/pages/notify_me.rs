//! Notify-me widget styling: button look and opt-in form copy.
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::api::Feature;
use crate::controller::{ConfigForm, ConfigPage};
use crate::error::{ApiError, ValidationError};
use crate::model::{ButtonType, NotifyMeSettings};

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid color regex"));

pub fn is_hex_color(value: &str) -> bool {
    HEX_COLOR.is_match(value)
}

/// One edit to the notify-me settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyMeEdit {
    Enabled(bool),
    CustomButton(bool),
    ButtonText(String),
    ButtonColor(String),
    TextColor(String),
    ButtonType(ButtonType),
    FormHeading(String),
    FormDescription(String),
    FormButtonText(String),
}

impl NotifyMeEdit {
    /// Whether the control for this edit is enabled in `draft`. Button styling
    /// needs the feature and the custom button on; form copy needs the feature.
    pub fn allowed(&self, draft: &NotifyMeSettings) -> bool {
        match self {
            NotifyMeEdit::Enabled(_) => true,
            NotifyMeEdit::CustomButton(_)
            | NotifyMeEdit::FormHeading(_)
            | NotifyMeEdit::FormDescription(_)
            | NotifyMeEdit::FormButtonText(_) => draft.enable_notify_me,
            NotifyMeEdit::ButtonText(_)
            | NotifyMeEdit::ButtonColor(_)
            | NotifyMeEdit::TextColor(_)
            | NotifyMeEdit::ButtonType(_) => {
                draft.enable_notify_me && draft.button_config.is_custom_button
            }
        }
    }

    fn apply(self, draft: &mut NotifyMeSettings) {
        let button = &mut draft.button_config;
        let form = &mut draft.form_config;
        match self {
            NotifyMeEdit::Enabled(v) => draft.enable_notify_me = v,
            NotifyMeEdit::CustomButton(v) => button.is_custom_button = v,
            NotifyMeEdit::ButtonText(v) => button.button_text = v,
            NotifyMeEdit::ButtonColor(v) => button.button_color = v,
            NotifyMeEdit::TextColor(v) => button.text_color = v,
            NotifyMeEdit::ButtonType(v) => button.button_type = v,
            NotifyMeEdit::FormHeading(v) => form.heading = v,
            NotifyMeEdit::FormDescription(v) => form.description = v,
            NotifyMeEdit::FormButtonText(v) => form.button_text = v,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NotifyMeForm;

impl ConfigForm for NotifyMeForm {
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

    fn validate(&self, draft: &NotifyMeSettings) -> Result<(), ValidationError> {
        let button = &draft.button_config;
        for (field, value) in [
            ("Button color", &button.button_color),
            ("Text color", &button.text_color),
        ] {
            if !is_hex_color(value) {
                return Err(ValidationError::InvalidColor {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    fn to_remote(&self, draft: &NotifyMeSettings) -> Result<Value, ApiError> {
        Ok(serde_json::to_value(draft)?)
    }

    fn saved_banner(&self, _draft: &NotifyMeSettings) -> (String, String) {
        (
            "Settings Saved Successfully".into(),
            "Notify me button and form settings have been saved.".into(),
        )
    }
}

pub type NotifyMePage = ConfigPage<NotifyMeForm>;

impl ConfigPage<NotifyMeForm> {
    /// Apply an edit if its control is enabled. Returns whether it applied.
    pub fn apply(&mut self, edit: NotifyMeEdit) -> bool {
        let allowed = self.draft().is_some_and(|d| edit.allowed(d));
        allowed && self.edit(|d| edit.apply(d))
    }
}
