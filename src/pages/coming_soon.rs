//! Coming-soon countdowns: the product list and the per-product settings page.
use chrono::{
    DateTime, FixedOffset, LocalResult, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::{BackendApi, Feature};
use crate::bridge::PickerOptions;
use crate::controller::{ConfigForm, ConfigPage, ListState};
use crate::error::{ApiError, BridgeError, PageError, ValidationError};
use crate::gid::ProductId;
use crate::model::ComingSoonConfig;
use crate::picker::normalize_picker_payload;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// Parse a date field. Empty input clears the field.
pub fn parse_date(raw: &str) -> Result<Option<NaiveDate>, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(Some)
        .map_err(|_| ValidationError::InvalidDate(raw.to_string()))
}

/// Parse a time field (`HH:MM`, seconds tolerated). Empty input clears it.
pub fn parse_time(raw: &str) -> Result<Option<NaiveTime>, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map(Some)
        .map_err(|_| ValidationError::InvalidTime(raw.to_string()))
}

fn lenient_date(raw: Option<&str>) -> Option<NaiveDate> {
    // stored dates are sometimes full ISO timestamps
    let raw = raw?.trim();
    NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), DATE_FORMAT).ok()
}

fn lenient_time(raw: Option<&str>) -> Option<NaiveTime> {
    parse_time(raw?).ok().flatten()
}

/// Where the settings page is opened for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsTarget {
    pub product: ProductId,
    pub title: String,
    pub image_url: Option<String>,
    /// Stored config to prefill from, when the product is already configured.
    pub existing: Option<ComingSoonConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComingSoonDraft {
    pub start_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_date: Option<NaiveDate>,
    pub end_time: Option<NaiveTime>,
    pub enable_notify_me: bool,
    pub product_title: String,
    pub product_image_url: String,
}

pub struct ComingSoonForm {
    product: ProductId,
    title: String,
    image_url: String,
    offset: FixedOffset,
}

impl ComingSoonForm {
    pub fn new(target: &SettingsTarget, offset: FixedOffset) -> Self {
        Self {
            product: target.product,
            title: target.title.clone(),
            image_url: target.image_url.clone().unwrap_or_default(),
            offset,
        }
    }

    /// Instant of a local date and time in the shop's offset.
    pub fn instant(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        let local = date.and_time(time);
        match self.offset.from_local_datetime(&local) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            // fixed offsets are never ambiguous
            _ => Utc.from_utc_datetime(&local),
        }
    }

    fn bounds(
        &self,
        draft: &ComingSoonDraft,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), ValidationError> {
        let (Some(start_date), Some(start_time)) = (draft.start_date, draft.start_time) else {
            return Err(ValidationError::MissingStart);
        };
        let (Some(end_date), Some(end_time)) = (draft.end_date, draft.end_time) else {
            return Err(ValidationError::MissingEnd);
        };
        let start = self.instant(start_date, start_time);
        let end = self.instant(end_date, end_time);
        if start >= end {
            return Err(ValidationError::InvalidRange);
        }
        Ok((start, end))
    }
}

impl ConfigForm for ComingSoonForm {
    type Draft = ComingSoonDraft;

    fn feature(&self) -> Feature {
        Feature::ComingSoon
    }

    fn product(&self) -> Option<ProductId> {
        Some(self.product)
    }

    fn defaults(&self) -> ComingSoonDraft {
        ComingSoonDraft {
            start_date: None,
            start_time: None,
            end_date: None,
            end_time: None,
            enable_notify_me: false,
            product_title: self.title.clone(),
            product_image_url: self.image_url.clone(),
        }
    }

    fn from_remote(&self, remote: Value) -> Result<ComingSoonDraft, ApiError> {
        let cfg: ComingSoonConfig = serde_json::from_value(remote)?;
        let pick = |own: &str, stored: Option<String>| {
            if own.is_empty() {
                stored.unwrap_or_default()
            } else {
                own.to_string()
            }
        };
        Ok(ComingSoonDraft {
            start_date: lenient_date(cfg.start_date.as_deref()),
            start_time: lenient_time(cfg.start_time.as_deref()),
            end_date: lenient_date(cfg.end_date.as_deref()),
            end_time: lenient_time(cfg.end_time.as_deref()),
            enable_notify_me: cfg.enable_notify_me,
            product_title: pick(&self.title, cfg.product_title),
            product_image_url: pick(&self.image_url, cfg.product_image_url),
        })
    }

    fn is_complete(&self, draft: &ComingSoonDraft) -> bool {
        draft.start_date.is_some()
            && draft.start_time.is_some()
            && draft.end_date.is_some()
            && draft.end_time.is_some()
    }

    fn validate(&self, draft: &ComingSoonDraft) -> Result<(), ValidationError> {
        self.bounds(draft).map(|_| ())
    }

    fn to_remote(&self, draft: &ComingSoonDraft) -> Result<Value, ApiError> {
        let (start, end) = self.bounds(draft)?;
        let date = |d: Option<NaiveDate>| d.map(|d| d.format(DATE_FORMAT).to_string());
        let time = |t: Option<NaiveTime>| t.map(|t| t.format(TIME_FORMAT).to_string());
        let cfg = ComingSoonConfig {
            start_date: date(draft.start_date),
            start_time: time(draft.start_time),
            end_date: date(draft.end_date),
            end_time: time(draft.end_time),
            start_timestamp: Some(start.to_rfc3339_opts(SecondsFormat::Millis, true)),
            end_timestamp: Some(end.to_rfc3339_opts(SecondsFormat::Millis, true)),
            product_title: Some(draft.product_title.clone()),
            product_image_url: Some(draft.product_image_url.clone()),
            enable_notify_me: draft.enable_notify_me,
        };
        Ok(serde_json::to_value(cfg)?)
    }

    fn saved_banner(&self, draft: &ComingSoonDraft) -> (String, String) {
        (
            "Settings Saved Successfully".into(),
            format!(
                "Coming soon settings have been configured for \"{}\".",
                draft.product_title
            ),
        )
    }

    fn save_failed_banner(&self) -> (String, String) {
        (
            "Save Failed".into(),
            "There was an error saving the coming soon settings. Please try again.".into(),
        )
    }
}

pub type ComingSoonSettings = ConfigPage<ComingSoonForm>;

impl ConfigPage<ComingSoonForm> {
    /// Open the settings page. A target carrying an existing config is
    /// prefilled without a round trip; otherwise call `load()`.
    pub fn open(api: Arc<BackendApi>, target: &SettingsTarget, offset: FixedOffset) -> Self {
        let mut page = ConfigPage::new(api, ComingSoonForm::new(target, offset));
        if let Some(existing) = &target.existing {
            match serde_json::to_value(existing) {
                Ok(value) => page.apply_load(Ok(Some(value))),
                Err(err) => warn!(%err, "could not prefill coming soon settings"),
            }
        }
        page
    }

    pub fn set_start(&mut self, date: &str, time: &str) -> Result<bool, ValidationError> {
        let (date, time) = (parse_date(date)?, parse_time(time)?);
        Ok(self.edit(|d| {
            d.start_date = date;
            d.start_time = time;
        }))
    }

    pub fn set_end(&mut self, date: &str, time: &str) -> Result<bool, ValidationError> {
        let (date, time) = (parse_date(date)?, parse_time(time)?);
        Ok(self.edit(|d| {
            d.end_date = date;
            d.end_time = time;
        }))
    }

    pub fn set_notify_me(&mut self, enabled: bool) -> bool {
        self.edit(|d| d.enable_notify_me = enabled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleStatus {
    Active,
    Upcoming,
    Expired,
    /// No usable timestamps stored.
    Configured,
}

impl ScheduleStatus {
    pub fn at(cfg: &ComingSoonConfig, now: DateTime<Utc>) -> Self {
        let parse = |raw: Option<&str>| {
            raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc))
        };
        match (
            parse(cfg.start_timestamp.as_deref()),
            parse(cfg.end_timestamp.as_deref()),
        ) {
            (Some(start), Some(end)) if now >= start && now <= end => ScheduleStatus::Active,
            (Some(start), Some(_)) if now < start => ScheduleStatus::Upcoming,
            (Some(_), Some(_)) => ScheduleStatus::Expired,
            _ => ScheduleStatus::Configured,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScheduleStatus::Active => "Active",
            ScheduleStatus::Upcoming => "Upcoming",
            ScheduleStatus::Expired => "Expired",
            ScheduleStatus::Configured => "Configured",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComingSoonEntry {
    pub product: ProductId,
    pub title: String,
    pub image_url: Option<String>,
    pub status: ScheduleStatus,
    pub config: ComingSoonConfig,
}

impl ComingSoonEntry {
    fn from_config(product: ProductId, config: ComingSoonConfig, now: DateTime<Utc>) -> Self {
        Self {
            product,
            title: config.product_title.clone().unwrap_or_default(),
            image_url: config.product_image_url.clone().filter(|u| !u.is_empty()),
            status: ScheduleStatus::at(&config, now),
            config,
        }
    }

    pub fn target(&self) -> SettingsTarget {
        SettingsTarget {
            product: self.product,
            title: self.title.clone(),
            image_url: self.image_url.clone(),
            existing: Some(self.config.clone()),
        }
    }
}

/// Backend map `product_<id> -> config` into table rows, ordered by id.
pub fn entries_from_map(remote: Value, now: DateTime<Utc>) -> Result<Vec<ComingSoonEntry>, ApiError> {
    let Value::Object(map) = remote else {
        return Err(ApiError::UnexpectedResponse(
            "coming soon configs are not an object".into(),
        ));
    };
    let mut entries = Vec::with_capacity(map.len());
    for (key, value) in map {
        let product = match ProductId::parse(&key) {
            Ok(id) => id,
            Err(err) => {
                warn!(%err, key = %key, "skipping coming soon entry with bad key");
                continue;
            }
        };
        let config: ComingSoonConfig = match serde_json::from_value(value) {
            Ok(config) => config,
            Err(err) => {
                warn!(%err, key = %key, "skipping unreadable coming soon entry");
                continue;
            }
        };
        entries.push(ComingSoonEntry::from_config(product, config, now));
    }
    entries.sort_by_key(|e| e.product);
    Ok(entries)
}

pub struct ComingSoonList {
    api: Arc<BackendApi>,
    state: ListState<ComingSoonEntry>,
}

impl ComingSoonList {
    pub fn new(api: Arc<BackendApi>) -> Self {
        Self {
            api,
            state: ListState::Loading,
        }
    }

    pub fn state(&self) -> &ListState<ComingSoonEntry> {
        &self.state
    }

    pub fn entries(&self) -> &[ComingSoonEntry] {
        self.state.rows()
    }

    pub async fn fetch(api: &BackendApi, now: DateTime<Utc>) -> Result<Vec<ComingSoonEntry>, ApiError> {
        match api.fetch_config(Feature::ComingSoon, None).await? {
            Some(remote) => entries_from_map(remote, now),
            None => Ok(Vec::new()),
        }
    }

    /// Failures keep whatever rows were shown before.
    pub fn apply_refresh(&mut self, result: Result<Vec<ComingSoonEntry>, ApiError>) {
        match result {
            Ok(entries) => {
                info!(count = entries.len(), "coming soon configs loaded");
                self.state.finish(entries);
            }
            Err(err) => {
                warn!(%err, "failed to fetch coming soon configs");
                let previous = self.state.rows().to_vec();
                self.state.finish(previous);
            }
        }
    }

    pub async fn refresh(&mut self) {
        if self.state.is_unmounted() {
            return;
        }
        self.state.begin_refresh();
        let result = Self::fetch(&self.api, Utc::now()).await;
        self.apply_refresh(result);
    }

    /// Settings target for a row.
    pub fn open(&self, product: ProductId) -> Option<SettingsTarget> {
        self.entries()
            .iter()
            .find(|e| e.product == product)
            .map(ComingSoonEntry::target)
    }

    /// Pick a product with the host picker and return where to configure it.
    /// `Ok(None)` when the picker was dismissed without a selection.
    pub async fn add_product(&mut self) -> Result<Option<SettingsTarget>, PageError> {
        let payload = match self
            .api
            .bridge()
            .pick_products(PickerOptions { multiple: false })
            .await
        {
            Ok(payload) => payload,
            Err(BridgeError::PickerCancelled) => return Ok(None),
            Err(err) => return Err(ApiError::from(err).into()),
        };
        let Some(picked) = normalize_picker_payload(payload)?.into_iter().next() else {
            return Ok(None);
        };

        if let Some(existing) = self.open(picked.id) {
            info!(product = %picked.id, "product already listed");
            return Ok(Some(existing));
        }

        if let ListState::Ready(rows) | ListState::Refreshing(rows) = &mut self.state {
            rows.push(ComingSoonEntry {
                product: picked.id,
                title: picked.title.clone(),
                image_url: picked.image_url.clone(),
                status: ScheduleStatus::Configured,
                config: ComingSoonConfig::default(),
            });
        }
        Ok(Some(SettingsTarget {
            product: picked.id,
            title: picked.title,
            image_url: picked.image_url,
            existing: None,
        }))
    }

    pub fn unmount(&mut self) {
        self.state = ListState::Unmounted;
    }
}
