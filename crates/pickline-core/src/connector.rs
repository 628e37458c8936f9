//! Source connector contract.
//!
//! A connector owns everything specific to one remote order-management API:
//! request building, pagination mechanics, raw-field mapping, and order-id
//! deduplication. The pipeline only sees the normalized [`FetchPage`] it
//! yields, and drains pages until `next_cursor` runs out.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{Sale, SourceId, SourceOrder};

/// Connector-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    AuthFailed,
    InvalidResponse,
    Internal,
}

/// Structured connector/catalog error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn auth_failed(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::AuthFailed,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidResponse,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::AuthFailed => "source.auth_failed",
            SourceErrorKind::InvalidResponse => "source.invalid_response",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// One page of normalized records from a source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchPage {
    pub sales: Vec<Sale>,
    pub orders: Vec<SourceOrder>,
    /// Opaque cursor for the next page; `None` ends the drain loop.
    pub next_cursor: Option<u64>,
}

impl FetchPage {
    pub fn last(sales: Vec<Sale>, orders: Vec<SourceOrder>) -> Self {
        Self {
            sales,
            orders,
            next_cursor: None,
        }
    }
}

/// Source connector contract consumed by the pipeline.
///
/// Implementations must be `Send + Sync`; each registered source runs its
/// fetch on its own task during the parallel stage.
pub trait SaleSource: Send + Sync {
    /// Returns the source identifier.
    fn id(&self) -> SourceId;

    /// Human label used in logs and the run summary. Two connectors may
    /// share a [`SourceId`] (e.g. two storefront channels) but carry
    /// distinct labels.
    fn label(&self) -> &str;

    /// Establishes identity/credentials. Called once before the parallel
    /// fetch stage; a failure here is fatal only for the primary source.
    fn init<'a>(&'a self)
        -> Pin<Box<dyn Future<Output = Result<(), SourceError>> + Send + 'a>>;

    /// Fetches one page of pending sales starting at `cursor`.
    fn fetch<'a>(
        &'a self,
        cursor: Option<u64>,
    ) -> Pin<Box<dyn Future<Output = Result<FetchPage, SourceError>> + Send + 'a>>;
}
