//! Traits describing provider capabilities and shared helper types.

use async_trait::async_trait;
use reqwest::Error as ReqwestError;
use serde_json::Error as JsonError;

use crate::model::{AddressMatch, MatchId, ProviderMeta, ScheduleSnapshot};

/// Maximum number of characters of an upstream error body kept for diagnostics.
pub const ERROR_BODY_LIMIT: usize = 200;

#[derive(thiserror::Error, Debug)]
/// Underlying cause of a failed provider request.
pub enum FetchCause {
    /// Connection, timeout, or transport failure.
    #[error("network error: {0}")]
    Network(#[from] ReqwestError),
    /// The response body was not valid JSON.
    #[error("malformed response: {0}")]
    Decode(#[from] JsonError),
}

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to provider backends.
pub enum ProviderError {
    /// Upstream answered HTTP 429.
    #[error("Rate limited by provider (HTTP 429)")]
    RateLimited,
    /// Upstream answered with an error status other than 429.
    #[error("Provider error (HTTP {status}): {body}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated to [`ERROR_BODY_LIMIT`] characters.
        body: String,
    },
    /// The request could not be completed or decoded.
    #[error("Failed to fetch schedule data: {0}")]
    FetchFailed(#[from] FetchCause),
    /// The selected property is no longer part of the provider's search results.
    #[error("Selected address/property no longer found in provider results")]
    MatchNotFound,
    /// No provider is routed for the municipality.
    #[error("Unsupported municipality: {0}")]
    UnsupportedKommun(String),
}

impl ProviderError {
    /// Build an [`ProviderError::Upstream`] keeping at most [`ERROR_BODY_LIMIT`] characters of the body.
    #[must_use]
    pub fn upstream(status: u16, body: &str) -> Self {
        ProviderError::Upstream {
            status,
            body: body.chars().take(ERROR_BODY_LIMIT).collect(),
        }
    }

    /// Whether a later attempt with the same configuration may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited | ProviderError::Upstream { .. } | ProviderError::FetchFailed(_)
        )
    }

    /// Whether the stored property selection is stale and the user has to pick again.
    #[must_use]
    pub fn is_stale_selection(&self) -> bool {
        matches!(self, ProviderError::MatchNotFound)
    }
}

impl From<ReqwestError> for ProviderError {
    fn from(err: ReqwestError) -> Self {
        ProviderError::FetchFailed(FetchCause::Network(err))
    }
}

impl From<JsonError> for ProviderError {
    fn from(err: JsonError) -> Self {
        ProviderError::FetchFailed(FetchCause::Decode(err))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Parameters identifying the household whose schedule is fetched.
pub struct FetchRequest {
    /// Municipality the household belongs to.
    pub kommun: String,
    /// Free-text query that located the property during setup.
    pub address_query: String,
    /// Identifier of the property selected from that query's results.
    pub match_id: MatchId,
}

impl FetchRequest {
    /// Construct a new fetch request with trimmed fields.
    #[must_use]
    pub fn new<K: Into<String>, Q: Into<String>>(kommun: K, address_query: Q, match_id: MatchId) -> Self {
        Self {
            kommun: kommun.into().trim().to_owned(),
            address_query: address_query.into().trim().to_owned(),
            match_id,
        }
    }
}

#[async_trait]
/// Capability set every schedule data source implements.
pub trait Provider: Send + Sync {
    /// Metadata describing this provider.
    fn meta(&self) -> &ProviderMeta;

    /// Search properties by free text. An empty query yields no matches without a request.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::RateLimited`], [`ProviderError::Upstream`], or
    /// [`ProviderError::FetchFailed`] when the provider request fails.
    async fn search(&self, query: &str) -> Result<Vec<AddressMatch>, ProviderError>;

    /// Fetch the normalized schedule of a previously selected property.
    ///
    /// # Errors
    ///
    /// Returns the [`Provider::search`] errors, plus [`ProviderError::MatchNotFound`] when
    /// the selected property has disappeared from the provider's results.
    async fn fetch(&self, request: &FetchRequest) -> Result<ScheduleSnapshot, ProviderError>;
}
