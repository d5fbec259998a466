//! Shared load → edit → save life cycle of the configuration pages.
//!
//! Every settings page is a [`ConfigPage`] over a feature-specific
//! [`ConfigForm`]. The page state is a single enum, so a page can never be
//! saving while it is still loading. Feedback is a [`Banner`] overlay that is
//! independent of the state and never blocks editing.
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::api::{BackendApi, Feature};
use crate::error::{ApiError, PageError, ValidationError};
use crate::gid::ProductId;

pub const DEFAULT_BANNER_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub title: String,
    pub description: String,
    pub tone: Tone,
    shown_at: Instant,
    auto_dismiss: Option<Duration>,
}

impl Banner {
    /// Success banners go away on their own.
    pub fn success(title: impl Into<String>, description: impl Into<String>, ttl: Duration) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            tone: Tone::Success,
            shown_at: Instant::now(),
            auto_dismiss: Some(ttl),
        }
    }

    /// Critical banners stay until dismissed.
    pub fn critical(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            tone: Tone::Critical,
            shown_at: Instant::now(),
            auto_dismiss: None,
        }
    }

    pub fn from_validation(err: &ValidationError) -> Self {
        Self::critical(err.title(), err.description())
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.auto_dismiss
            .is_some_and(|ttl| now.saturating_duration_since(self.shown_at) >= ttl)
    }
}

/// Holds at most one banner; showing a new one replaces the old.
#[derive(Debug, Clone, Default)]
pub struct BannerSlot {
    current: Option<Banner>,
}

impl BannerSlot {
    pub fn show(&mut self, banner: Banner) {
        self.current = Some(banner);
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }

    /// Visible banner at `now`; expired banners are dropped.
    pub fn visible(&mut self, now: Instant) -> Option<&Banner> {
        if self.current.as_ref().is_some_and(|b| b.is_expired(now)) {
            self.current = None;
        }
        self.current.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState<D> {
    Loading,
    Ready { draft: D, dirty: bool },
    Saving { draft: D },
    Unmounted,
}

/// Feature-specific half of a settings page.
pub trait ConfigForm: Send + Sync {
    type Draft: Clone + Debug + Send + Sync;

    fn feature(&self) -> Feature;

    fn product(&self) -> Option<ProductId> {
        None
    }

    /// Draft used when nothing is stored yet or loading failed.
    fn defaults(&self) -> Self::Draft;

    fn from_remote(&self, remote: Value) -> Result<Self::Draft, ApiError>;

    /// Required fields present. Gates the save action.
    fn is_complete(&self, _draft: &Self::Draft) -> bool {
        true
    }

    /// Runs synchronously before any request is issued.
    fn validate(&self, _draft: &Self::Draft) -> Result<(), ValidationError> {
        Ok(())
    }

    /// The full document to store; never a partial patch.
    fn to_remote(&self, draft: &Self::Draft) -> Result<Value, ApiError>;

    fn saved_banner(&self, _draft: &Self::Draft) -> (String, String) {
        (
            "Settings Saved Successfully".into(),
            "Your configuration has been saved.".into(),
        )
    }

    fn save_failed_banner(&self) -> (String, String) {
        (
            "Save Failed".into(),
            "There was an error saving the configuration. Please try again.".into(),
        )
    }
}

/// Result of the fetch half of a load, applied later with
/// [`ConfigPage::apply_load`].
pub type LoadOutcome = Result<Option<Value>, ApiError>;

pub struct ConfigPage<F: ConfigForm> {
    api: Arc<BackendApi>,
    form: F,
    state: PageState<F::Draft>,
    banner: BannerSlot,
    banner_ttl: Duration,
}

impl<F: ConfigForm> ConfigPage<F> {
    pub fn new(api: Arc<BackendApi>, form: F) -> Self {
        Self {
            api,
            form,
            state: PageState::Loading,
            banner: BannerSlot::default(),
            banner_ttl: DEFAULT_BANNER_TTL,
        }
    }

    pub fn with_banner_ttl(mut self, ttl: Duration) -> Self {
        self.banner_ttl = ttl;
        self
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn api(&self) -> &Arc<BackendApi> {
        &self.api
    }

    pub fn state(&self) -> &PageState<F::Draft> {
        &self.state
    }

    pub fn draft(&self) -> Option<&F::Draft> {
        match &self.state {
            PageState::Ready { draft, .. } | PageState::Saving { draft } => Some(draft),
            _ => None,
        }
    }

    pub fn is_dirty(&self) -> bool {
        matches!(self.state, PageState::Ready { dirty: true, .. })
    }

    pub fn banner(&mut self) -> Option<&Banner> {
        self.banner.visible(Instant::now())
    }

    pub fn banner_at(&mut self, now: Instant) -> Option<&Banner> {
        self.banner.visible(now)
    }

    pub fn dismiss_banner(&mut self) {
        self.banner.dismiss();
    }

    pub fn show_banner(&mut self, banner: Banner) {
        self.banner.show(banner);
    }

    pub fn banner_ttl(&self) -> Duration {
        self.banner_ttl
    }

    /// Fetch the stored config. Does not touch the page, so it can run while
    /// the page goes away.
    pub async fn fetch(api: &BackendApi, form: &F) -> LoadOutcome {
        api.fetch_config(form.feature(), form.product()).await
    }

    /// Always ends in `Ready` with a clean draft, unless the page is gone.
    pub fn apply_load(&mut self, outcome: LoadOutcome) {
        if matches!(self.state, PageState::Unmounted) {
            debug!(feature = self.form.feature().as_str(), "load finished after unmount; ignored");
            return;
        }
        let draft = match outcome {
            Ok(Some(remote)) => match self.form.from_remote(remote) {
                Ok(draft) => draft,
                Err(err) => {
                    warn!(%err, feature = self.form.feature().as_str(), "stored config unreadable; using defaults");
                    self.form.defaults()
                }
            },
            Ok(None) => self.form.defaults(),
            Err(err) => {
                warn!(%err, feature = self.form.feature().as_str(), "failed to fetch configuration; using defaults");
                self.form.defaults()
            }
        };
        self.state = PageState::Ready { draft, dirty: false };
    }

    pub async fn load(&mut self) {
        if matches!(self.state, PageState::Unmounted) {
            return;
        }
        let outcome = Self::fetch(&self.api, &self.form).await;
        self.apply_load(outcome);
    }

    /// Apply a user edit. Returns false when the page is not editable.
    pub fn edit(&mut self, change: impl FnOnce(&mut F::Draft)) -> bool {
        match &mut self.state {
            PageState::Ready { draft, dirty } => {
                change(draft);
                *dirty = true;
                true
            }
            _ => false,
        }
    }

    pub fn can_save(&self) -> bool {
        match &self.state {
            PageState::Ready { draft, dirty } => *dirty && self.form.is_complete(draft),
            _ => false,
        }
    }

    /// Validate, then PUT the whole draft.
    ///
    /// Validation failures and backend failures both leave the draft and the
    /// dirty flag untouched so the merchant can fix and retry.
    pub async fn save(&mut self) -> Result<(), PageError> {
        let draft = match &self.state {
            PageState::Ready { dirty: false, .. } => return Err(PageError::Unchanged),
            PageState::Ready { draft, .. } => draft.clone(),
            _ => return Err(PageError::NotReady),
        };

        if let Err(err) = self.form.validate(&draft) {
            self.banner.show(Banner::from_validation(&err));
            return Err(err.into());
        }
        let body = self.form.to_remote(&draft)?;

        self.state = PageState::Saving { draft };
        let result = self
            .api
            .save_config(self.form.feature(), self.form.product(), &body)
            .await;
        self.apply_save(result)
    }

    fn apply_save(&mut self, result: Result<(), ApiError>) -> Result<(), PageError> {
        let draft = match std::mem::replace(&mut self.state, PageState::Unmounted) {
            PageState::Saving { draft } => draft,
            other => {
                self.state = other;
                return result.map_err(Into::into);
            }
        };
        match result {
            Ok(()) => {
                info!(feature = self.form.feature().as_str(), "configuration saved");
                let (title, description) = self.form.saved_banner(&draft);
                self.banner
                    .show(Banner::success(title, description, self.banner_ttl));
                self.state = PageState::Ready { draft, dirty: false };
                Ok(())
            }
            Err(err) => {
                warn!(%err, feature = self.form.feature().as_str(), "failed to save configuration");
                let (title, description) = self.form.save_failed_banner();
                self.banner.show(Banner::critical(title, description));
                self.state = PageState::Ready { draft, dirty: true };
                Err(err.into())
            }
        }
    }

    /// The page is gone; late completions become no-ops.
    pub fn unmount(&mut self) {
        self.state = PageState::Unmounted;
        self.banner.dismiss();
    }
}

/// State of the read-only list pages.
#[derive(Debug, Clone, PartialEq)]
pub enum ListState<T> {
    Loading,
    Ready(Vec<T>),
    /// Reloading; the previous rows stay visible.
    Refreshing(Vec<T>),
    Unmounted,
}

impl<T> ListState<T> {
    pub fn rows(&self) -> &[T] {
        match self {
            ListState::Ready(rows) | ListState::Refreshing(rows) => rows,
            _ => &[],
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, ListState::Loading | ListState::Refreshing(_))
    }

    pub fn is_unmounted(&self) -> bool {
        matches!(self, ListState::Unmounted)
    }

    /// Enter the busy state, keeping rows that are already shown.
    pub fn begin_refresh(&mut self) {
        *self = match std::mem::replace(self, ListState::Loading) {
            ListState::Ready(rows) | ListState::Refreshing(rows) => ListState::Refreshing(rows),
            ListState::Unmounted => ListState::Unmounted,
            ListState::Loading => ListState::Loading,
        };
    }

    /// Replace the rows unless the page is gone.
    pub fn finish(&mut self, rows: Vec<T>) {
        if !self.is_unmounted() {
            *self = ListState::Ready(rows);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_banner_expires_critical_does_not() {
        let mut slot = BannerSlot::default();
        let ok = Banner::success("Saved", "done", Duration::from_secs(3));
        let shown = ok.shown_at;
        slot.show(ok);
        assert!(slot.visible(shown + Duration::from_secs(2)).is_some());
        assert!(slot.visible(shown + Duration::from_secs(3)).is_none());

        let bad = Banner::critical("Save Failed", "retry");
        let shown = bad.shown_at;
        slot.show(bad);
        assert!(slot.visible(shown + Duration::from_secs(3600)).is_some());
        slot.dismiss();
        assert!(slot.visible(shown).is_none());
    }

    #[test]
    fn list_state_keeps_rows_while_refreshing() {
        let mut state = ListState::Loading;
        assert!(state.is_busy());
        state.finish(vec![1, 2]);
        state.begin_refresh();
        assert_eq!(state, ListState::Refreshing(vec![1, 2]));
        assert_eq!(state.rows(), &[1, 2]);
        state.finish(vec![3]);
        assert_eq!(state, ListState::Ready(vec![3]));
    }

    #[test]
    fn list_state_ignores_results_after_unmount() {
        let mut state: ListState<u8> = ListState::Unmounted;
        state.begin_refresh();
        state.finish(vec![1]);
        assert!(state.is_unmounted());
    }
}
