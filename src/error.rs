//! Error taxonomy shared by the request client, the backend API and the pages.
use reqwest::StatusCode;
use thiserror::Error;

/// Failures reported by the embedding host.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("identity token unavailable: {0}")]
    TokenUnavailable(String),
    #[error("product picker was cancelled")]
    PickerCancelled,
    #[error("product picker unavailable: {0}")]
    PickerUnavailable(String),
}

/// Network-level failure: the request never produced a response.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Both the authenticated attempt and the unauthenticated retry failed.
    /// `source` is the error of the first attempt.
    #[error("request to {url} failed")]
    RequestFailed {
        url: String,
        #[source]
        source: TransportError,
    },
    #[error("backend returned {status}: {body}")]
    Http { status: StatusCode, body: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid product reference: {0:?}")]
    InvalidProductRef(String),
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error("draft is not valid: {0}")]
    InvalidDraft(#[from] ValidationError),
    #[error("unrecognized picker payload: {0}")]
    UnrecognizedPickerPayload(String),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// HTTP status if the backend answered with an error response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Client-side validation failures. Raised before any request is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("start date and time are required")]
    MissingStart,
    #[error("end date and time are required")]
    MissingEnd,
    #[error("end must be after start")]
    InvalidRange,
    #[error("{field} is not a #RRGGBB color: {value:?}")]
    InvalidColor { field: &'static str, value: String },
    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("invalid time {0:?}, expected HH:MM")]
    InvalidTime(String),
    #[error("export end date is before start date")]
    InvalidExportRange,
}

impl ValidationError {
    /// Banner title shown to the merchant.
    pub fn title(&self) -> &'static str {
        match self {
            ValidationError::MissingStart => "Start Date & Time Required",
            ValidationError::MissingEnd => "End Date & Time Required",
            ValidationError::InvalidRange => "Invalid Time Range",
            ValidationError::InvalidColor { .. } => "Invalid Color",
            ValidationError::InvalidDate(_) => "Invalid Date",
            ValidationError::InvalidTime(_) => "Invalid Time",
            ValidationError::InvalidExportRange => "Invalid Date Range",
        }
    }

    pub fn description(&self) -> String {
        match self {
            ValidationError::MissingStart => {
                "Please set both start date and time for the coming soon timer.".to_string()
            }
            ValidationError::MissingEnd => {
                "Please set both end date and time for the coming soon timer.".to_string()
            }
            ValidationError::InvalidRange => {
                "End date and time must be after start date and time.".to_string()
            }
            ValidationError::InvalidColor { field, value } => {
                format!("{field} must be a hex color like #0080FF (got \"{value}\").")
            }
            ValidationError::InvalidDate(value) => {
                format!("\"{value}\" is not a valid date. Use YYYY-MM-DD.")
            }
            ValidationError::InvalidTime(value) => {
                format!("\"{value}\" is not a valid time. Use HH:MM.")
            }
            ValidationError::InvalidExportRange => {
                "The report end date must not be before the start date.".to_string()
            }
        }
    }
}

/// Outcome of a page action that did not complete.
#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("page is not ready")]
    NotReady,
    #[error("no unsaved changes")]
    Unchanged,
}
