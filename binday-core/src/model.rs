//! Domain data structures for providers, property matches, and collection schedules.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier for a schedule provider known to binday.
pub struct ProviderId(pub String);

impl fmt::Display for ProviderId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Metadata describing a provider and its human-friendly name.
pub struct ProviderMeta {
    /// Unique identifier.
    pub id: ProviderId,
    /// Display name of the organisation behind the data source.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Provider-scoped identifier of a property returned by a search.
pub struct MatchId(pub String);

impl fmt::Display for MatchId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for MatchId {
    fn from(value: &str) -> Self {
        MatchId(value.trim().to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Property returned from a provider search.
///
/// The id is unique within one search response but may change over time for the
/// same physical address.
pub struct AddressMatch {
    /// Identifier used when fetching the schedule again.
    pub id: MatchId,
    /// Human-readable "street, city" label.
    pub label: String,
    /// The untouched provider record.
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One scheduled pickup.
pub struct CollectionEvent {
    /// Date of the pickup.
    pub date: NaiveDate,
    /// Waste type code as sent by the provider, e.g. `KÄRL 1`.
    pub type_raw: String,
    /// Provider-formatted label of the waste type.
    pub type_formatted: String,
    /// Number of the physical container, when the raw type names one.
    pub container_number: Option<String>,
}

impl CollectionEvent {
    /// Whether the event refers to a specific physical container.
    #[must_use]
    pub fn has_container(&self) -> bool {
        self.container_number.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Result of a single fetch for a configured household.
pub struct ScheduleSnapshot {
    /// Identifier of the provider that produced the data.
    pub provider_id: ProviderId,
    /// Display name of that provider.
    pub provider_name: String,
    /// Municipality the household belongs to.
    pub kommun: String,
    /// Free-text query that located the property.
    pub address_query: String,
    /// Identifier of the selected property.
    pub match_id: MatchId,
    /// Label of the selected property.
    pub match_label: String,
    /// Pickups sorted ascending by date; equal dates keep provider order.
    pub events: Vec<CollectionEvent>,
}
