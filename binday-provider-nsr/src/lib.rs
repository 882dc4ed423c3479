//! Provider implementation for NSR AB, serving municipalities in north-west Skåne.
//!
//! NSR only exposes a free-text search endpoint. Every property record in the
//! search response embeds its complete pickup schedule, so fetching a schedule
//! means searching again and picking the stored property id out of the results.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::sync::OnceCell;

use binday_core::{
    model::{AddressMatch, ProviderId, ProviderMeta, ScheduleSnapshot},
    plugin::ProviderPlugin,
    ports::{FetchRequest, Provider, ProviderError},
};

/// Record parsing and schedule normalization.
pub mod normalize;

/// Default address of the search endpoint.
pub const SEARCH_URL: &str = "https://nsr.se/api/wastecalendar/search";

/// Bundled search response used instead of the live endpoint in demo mode.
pub const DEMO_FIXTURE: &str = include_str!("../fixtures/nsr_demo.json");

/// Municipalities (without "kommun") whose collection NSR handles.
pub const KOMMUNER: [&str; 6] = [
    "Bjuv",
    "Båstad",
    "Helsingborg",
    "Höganäs",
    "Åstorp",
    "Ängelholm",
];

const PROVIDER_ID: &str = "nsr";
const PROVIDER_NAME: &str = "NSR AB";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Live,
    Demo,
}

/// Search and schedule implementation for NSR.
pub struct NsrProvider {
    client: Client,
    meta: ProviderMeta,
    search_url: String,
    source: Source,
    demo_cache: OnceCell<Vec<Value>>,
}

impl NsrProvider {
    /// Create a provider talking to the live endpoint through the given HTTP client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            meta: provider_meta(),
            search_url: SEARCH_URL.to_owned(),
            source: Source::Live,
            demo_cache: OnceCell::new(),
        }
    }

    /// Create a provider answering every search with the bundled demo fixture.
    #[must_use]
    pub fn demo(client: Client) -> Self {
        Self {
            source: Source::Demo,
            ..Self::new(client)
        }
    }

    /// Point the provider at another search endpoint.
    #[must_use]
    pub fn with_search_url<U: Into<String>>(mut self, search_url: U) -> Self {
        self.search_url = search_url.into();
        self
    }

    /// Property records matching `query`.
    async fn records(&self, query: &str) -> Result<Vec<Value>, ProviderError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        match self.source {
            Source::Demo => self.demo_records().await,
            Source::Live => self.search_live(query).await,
        }
    }

    async fn search_live(&self, query: &str) -> Result<Vec<Value>, ProviderError> {
        tracing::debug!(url = %self.search_url, %query, "searching NSR");

        let response = self
            .client
            .get(&self.search_url)
            .query(&[("query", query)])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("rate limited by NSR");
            return Err(ProviderError::RateLimited);
        }
        if status.as_u16() >= 400 {
            let body = response.text().await?;
            tracing::warn!(status = status.as_u16(), "NSR answered with an error status");
            return Err(ProviderError::upstream(status.as_u16(), &body));
        }

        // NSR does not reliably send a JSON content type, so decode the bytes directly.
        let body = response.bytes().await?;
        let payload: Value = serde_json::from_slice(&body)?;
        Ok(into_records(payload))
    }

    async fn demo_records(&self) -> Result<Vec<Value>, ProviderError> {
        let records = self
            .demo_cache
            .get_or_try_init(|| async {
                tracing::info!("serving NSR demo fixture instead of the live endpoint");
                serde_json::from_str::<Value>(DEMO_FIXTURE).map(into_records)
            })
            .await?;
        Ok(records.clone())
    }
}

#[async_trait]
impl Provider for NsrProvider {
    fn meta(&self) -> &ProviderMeta {
        &self.meta
    }

    async fn search(&self, query: &str) -> Result<Vec<AddressMatch>, ProviderError> {
        let records = self.records(query).await?;
        Ok(normalize::parse_matches(&records))
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<ScheduleSnapshot, ProviderError> {
        let records = self.records(&request.address_query).await?;

        let selected = records
            .iter()
            .find(|record| normalize::record_id(record) == request.match_id.0)
            .ok_or(ProviderError::MatchNotFound)?;

        let events = normalize::normalize_exec(normalize::record_exec(selected), 0);

        Ok(ScheduleSnapshot {
            provider_id: self.meta.id.clone(),
            provider_name: self.meta.name.clone(),
            kommun: request.kommun.clone(),
            address_query: request.address_query.clone(),
            match_id: request.match_id.clone(),
            match_label: normalize::match_label(selected),
            events,
        })
    }
}

/// Build the plugin bundle for the NSR provider.
#[must_use]
pub fn plugin(client: Client) -> ProviderPlugin {
    let live = Arc::new(NsrProvider::new(client.clone()));
    let demo = Arc::new(NsrProvider::demo(client));

    ProviderPlugin {
        meta: provider_meta(),
        kommuner: KOMMUNER.iter().map(|&kommun| kommun.to_owned()).collect(),
        live,
        demo,
    }
}

fn provider_meta() -> ProviderMeta {
    ProviderMeta {
        id: ProviderId(String::from(PROVIDER_ID)),
        name: String::from(PROVIDER_NAME),
    }
}

/// The `fp` array of a search response; any other shape counts as no results.
fn into_records(payload: Value) -> Vec<Value> {
    match payload {
        Value::Object(mut body) => match body.remove("fp") {
            Some(Value::Array(records)) => records,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
