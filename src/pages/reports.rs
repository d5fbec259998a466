//! Notify-me subscriptions: paged list and CSV export.
use chrono::{Datelike, NaiveDate};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::api::BackendApi;
use crate::controller::{Banner, BannerSlot, ListState, DEFAULT_BANNER_TTL};
use crate::download::DownloadSink;
use crate::error::{ApiError, PageError, ValidationError};
use crate::model::{Pagination, ReportRange, Subscription, SubscriptionPage};
use crate::pages::coming_soon::parse_date;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

pub fn report_filename(start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "notify-me-subscriptions-{}-to-{}.csv",
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    )
}

/// Inclusive export range; end is never before start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl ExportRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvalidExportRange);
        }
        Ok(Self { start, end })
    }

    /// First of the month through `today`.
    pub fn month_to_date(today: NaiveDate) -> Self {
        let start = today.with_day(1).unwrap_or(today);
        Self { start, end: today }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn filename(&self) -> String {
        report_filename(self.start, self.end)
    }

    fn body(&self) -> ReportRange {
        ReportRange {
            start_date: self.start.format("%Y-%m-%d").to_string(),
            end_date: self.end.format("%Y-%m-%d").to_string(),
        }
    }
}

pub struct ReportsPage {
    api: Arc<BackendApi>,
    sink: Arc<dyn DownloadSink>,
    rows: ListState<Subscription>,
    pagination: Pagination,
    range: ExportRange,
    exporting: bool,
    banner: BannerSlot,
    banner_ttl: Duration,
}

impl ReportsPage {
    pub fn new(
        api: Arc<BackendApi>,
        sink: Arc<dyn DownloadSink>,
        page_size: u32,
        today: NaiveDate,
    ) -> Self {
        let limit = if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size };
        Self {
            api,
            sink,
            rows: ListState::Loading,
            pagination: Pagination { page: 1, limit },
            range: ExportRange::month_to_date(today),
            exporting: false,
            banner: BannerSlot::default(),
            banner_ttl: DEFAULT_BANNER_TTL,
        }
    }

    pub fn with_banner_ttl(mut self, ttl: Duration) -> Self {
        self.banner_ttl = ttl;
        self
    }

    pub fn rows(&self) -> &[Subscription] {
        self.rows.rows()
    }

    pub fn state(&self) -> &ListState<Subscription> {
        &self.rows
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn has_previous(&self) -> bool {
        self.pagination.page > 1
    }

    /// A full page suggests there may be more.
    pub fn has_next(&self) -> bool {
        self.rows().len() as u32 == self.pagination.limit
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

    pub async fn fetch(api: &BackendApi, page: u32, limit: u32) -> Result<SubscriptionPage, ApiError> {
        api.list_subscriptions(page, limit).await
    }

    pub fn apply_page(&mut self, requested: u32, result: Result<SubscriptionPage, ApiError>) {
        if self.rows.is_unmounted() {
            return;
        }
        let limit = self.pagination.limit;
        match result {
            Ok(page) => {
                self.pagination = page.pagination.unwrap_or(Pagination {
                    page: requested,
                    limit,
                });
                info!(page = self.pagination.page, rows = page.subscriptions.len(), "subscriptions loaded");
                self.rows.finish(page.subscriptions);
            }
            Err(err) => {
                warn!(%err, page = requested, "failed to load subscriptions");
                self.pagination = Pagination { page: 1, limit };
                self.rows.finish(Vec::new());
            }
        }
    }

    pub async fn load(&mut self, page: u32) {
        if self.rows.is_unmounted() {
            return;
        }
        let page = page.max(1);
        self.rows.begin_refresh();
        let result = Self::fetch(&self.api, page, self.pagination.limit).await;
        self.apply_page(page, result);
    }

    /// Returns false when already on the last page.
    pub async fn next_page(&mut self) -> bool {
        if !self.has_next() || self.rows.is_busy() {
            return false;
        }
        self.load(self.pagination.page + 1).await;
        true
    }

    pub async fn previous_page(&mut self) -> bool {
        if !self.has_previous() || self.rows.is_busy() {
            return false;
        }
        self.load(self.pagination.page - 1).await;
        true
    }

    pub fn export_range(&self) -> ExportRange {
        self.range
    }

    /// Set the export range from `YYYY-MM-DD` strings. Empty keeps the
    /// current bound.
    pub fn set_export_range(&mut self, start: &str, end: &str) -> Result<ExportRange, ValidationError> {
        let start = parse_date(start)?.unwrap_or(self.range.start);
        let end = parse_date(end)?.unwrap_or(self.range.end);
        self.range = ExportRange::new(start, end)?;
        Ok(self.range)
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    /// Download the CSV for the export range and hand it to the sink.
    pub async fn export(&mut self) -> Result<PathBuf, PageError> {
        if self.exporting {
            return Err(PageError::NotReady);
        }
        let range = self.range;
        self.exporting = true;
        let result = self.download(range).await;
        self.exporting = false;

        match result {
            Ok(path) => {
                self.banner.show(Banner::success(
                    "Export Complete",
                    format!("Saved {}.", range.filename()),
                    self.banner_ttl,
                ));
                Ok(path)
            }
            Err(err) => {
                warn!(%err, "report export failed");
                self.banner.show(Banner::critical(
                    "Export Failed",
                    "The report could not be downloaded. Please try again.",
                ));
                Err(err.into())
            }
        }
    }

    async fn download(&self, range: ExportRange) -> Result<PathBuf, ApiError> {
        let bytes = self.api.download_report(&range.body()).await?;
        self.sink.save(&range.filename(), &bytes).await
    }

    /// Admin link for the row's product; `None` when the product is gone.
    pub fn product_admin_url(&self, row: &Subscription) -> Option<String> {
        row.product_id.map(|id| id.admin_url(self.api.shop_domain()))
    }

    pub fn unmount(&mut self) {
        self.rows = ListState::Unmounted;
        self.banner.dismiss();
    }
}
