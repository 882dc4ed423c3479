//! Turning NSR search records into property matches and collection events.
//!
//! NSR describes a property's schedule as four parallel arrays inside `Exec`;
//! index `i` of every array belongs to the same pickup. The API is undocumented
//! and not always consistent, so everything here is lenient: misaligned arrays
//! are cut to the shortest one, and unparsable entries are dropped.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;

use binday_core::model::{AddressMatch, CollectionEvent, MatchId};

static CONTAINER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bKÄRL\s*(\d+)\b").expect("Invalid container regex"));

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_PREFIX_LEN: usize = 10;

const FIELD_ID: &str = "id";
const FIELD_ADDRESS: &str = "Adress";
const FIELD_CITY: &str = "Ort";
const FIELD_EXEC: &str = "Exec";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
/// The `Exec` block of a property record, one vector per wire array.
pub struct ExecColumns {
    /// `Datum`: ISO dates, sometimes with a time suffix.
    pub dates: Vec<String>,
    /// `AvfallsTyp`: raw waste type codes.
    pub type_raw: Vec<String>,
    /// `AvfallsTypFormaterat`: display labels of the waste types.
    pub type_formatted: Vec<String>,
    /// `DatumFormaterat`: provider-formatted dates. Not needed for normalization.
    pub date_formatted: Vec<String>,
}

impl ExecColumns {
    /// Read the columns from an `Exec` value. Anything but an object yields empty columns.
    #[must_use]
    pub fn from_value(exec: Option<&Value>) -> Self {
        let Some(Value::Object(exec)) = exec else {
            return Self::default();
        };

        let column = |key: &str| -> Vec<String> {
            exec.get(key)
                .and_then(Value::as_array)
                .map(|items| items.iter().map(text_of).collect())
                .unwrap_or_default()
        };

        Self {
            dates: column("Datum"),
            type_raw: column("AvfallsTyp"),
            type_formatted: column("AvfallsTypFormaterat"),
            date_formatted: column("DatumFormaterat"),
        }
    }
}

/// Normalize an `Exec` value into date-sorted collection events.
///
/// Equal dates keep their wire order. A `limit` of zero keeps every event.
#[must_use]
pub fn normalize_exec(exec: Option<&Value>, limit: usize) -> Vec<CollectionEvent> {
    let columns = ExecColumns::from_value(exec);

    let mut events: Vec<CollectionEvent> = columns
        .dates
        .iter()
        .zip(&columns.type_raw)
        .zip(&columns.type_formatted)
        .filter_map(|((date, type_raw), type_formatted)| {
            let date = parse_date(date)?;
            let type_raw = type_raw.trim();
            Some(CollectionEvent {
                date,
                type_raw: type_raw.to_owned(),
                type_formatted: type_formatted.trim().to_owned(),
                container_number: container_number(type_raw),
            })
        })
        .collect();

    events.sort_by_key(|event| event.date);
    if limit > 0 {
        events.truncate(limit);
    }
    events
}

/// Container number named by a raw waste type such as `KÄRL 2`.
#[must_use]
pub fn container_number(type_raw: &str) -> Option<String> {
    CONTAINER_REGEX
        .captures(type_raw)
        .and_then(|captures| captures.get(1))
        .map(|number| number.as_str().to_owned())
}

/// Parse the date part of a `Datum` entry, ignoring anything after the first ten characters.
#[must_use]
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let prefix: String = value.chars().take(DATE_PREFIX_LEN).collect();
    if !is_iso_date_shape(&prefix) {
        tracing::debug!(%value, "dropping event with non-ISO date");
        return None;
    }
    match NaiveDate::parse_from_str(&prefix, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(err) => {
            tracing::debug!(%value, %err, "dropping event with unparsable date");
            None
        }
    }
}

/// `YYYY-MM-DD` with zero-padded fields; chrono alone also accepts `2024-1-5`.
fn is_iso_date_shape(prefix: &str) -> bool {
    let bytes = prefix.as_bytes();
    bytes.len() == DATE_PREFIX_LEN
        && bytes.iter().enumerate().all(|(index, byte)| match index {
            4 | 7 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        })
}

/// Property matches from search records, in provider order.
///
/// Records without an id or street address are skipped.
#[must_use]
pub fn parse_matches(records: &[Value]) -> Vec<AddressMatch> {
    records
        .iter()
        .filter_map(|record| {
            let id = record_id(record);
            let address = field_text(record, FIELD_ADDRESS);
            if id.is_empty() || address.is_empty() {
                tracing::debug!(%id, "skipping search record without id or address");
                return None;
            }

            let city = field_text(record, FIELD_CITY);
            let label = if city.is_empty() {
                address
            } else {
                format!("{address}, {city}")
            };

            Some(AddressMatch {
                id: MatchId(id),
                label,
                raw: record.clone(),
            })
        })
        .collect()
}

/// Label of a selected record; falls back to the city alone, then to `Unknown`.
#[must_use]
pub fn match_label(record: &Value) -> String {
    let address = field_text(record, FIELD_ADDRESS);
    let city = field_text(record, FIELD_CITY);
    match (address.is_empty(), city.is_empty()) {
        (false, false) => format!("{address}, {city}"),
        (false, true) => address,
        (true, false) => city,
        (true, true) => "Unknown".to_owned(),
    }
}

/// Trimmed, stringified `id` of a record.
#[must_use]
pub fn record_id(record: &Value) -> String {
    field_text(record, FIELD_ID)
}

/// The `Exec` block of a record, if present.
#[must_use]
pub fn record_exec(record: &Value) -> Option<&Value> {
    record.get(FIELD_EXEC)
}

fn field_text(record: &Value, key: &str) -> String {
    record
        .get(key)
        .map(text_of)
        .unwrap_or_default()
        .trim()
        .to_owned()
}

// NSR sends ids as numbers for some properties and as strings for others.
fn text_of(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
