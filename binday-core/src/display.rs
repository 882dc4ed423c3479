//! Presentation helpers deriving "next collection" facts from a schedule.
//!
//! Everything here works on an already normalized, date-sorted event list and an
//! explicit `today`, so callers decide which clock and time zone apply.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{CollectionEvent, ScheduleSnapshot};

/// Prefix of raw waste types that name a physical container.
pub const CONTAINER_KEYWORD: &str = "KÄRL";

/// Label used for events that carry neither a formatted nor a raw type.
pub const UNKNOWN_TYPE: &str = "Unknown";

/// First event on or after `today`.
#[must_use]
pub fn next_event(events: &[CollectionEvent], today: NaiveDate) -> Option<&CollectionEvent> {
    events.iter().find(|event| event.date >= today)
}

/// All events on `date`, in schedule order.
#[must_use]
pub fn events_on(events: &[CollectionEvent], date: NaiveDate) -> Vec<&CollectionEvent> {
    events.iter().filter(|event| event.date == date).collect()
}

/// Human-facing label for the waste type of one event.
///
/// Container events show the raw code with the formatted label in parentheses,
/// e.g. `KÄRL 1 (Mat- och restavfall)`. Other events prefer the formatted label.
#[must_use]
pub fn display_type(event: &CollectionEvent) -> Option<String> {
    let type_raw = event.type_raw.trim();
    let type_formatted = event.type_formatted.trim();

    let names_container =
        event.has_container() || type_raw.to_uppercase().starts_with(CONTAINER_KEYWORD);

    let label = if names_container {
        if !type_formatted.is_empty() && type_formatted != type_raw {
            format!("{type_raw} ({type_formatted})").trim().to_owned()
        } else if type_raw.is_empty() {
            type_formatted.to_owned()
        } else {
            type_raw.to_owned()
        }
    } else if type_formatted.is_empty() {
        type_raw.to_owned()
    } else {
        type_formatted.to_owned()
    };

    (!label.is_empty()).then_some(label)
}

/// Deduplicated display labels of everything collected on the next collection day.
#[must_use]
pub fn next_day_types(events: &[CollectionEvent], today: NaiveDate) -> Vec<String> {
    let Some(next) = next_event(events, today) else {
        return Vec::new();
    };

    let mut labels: Vec<String> = Vec::new();
    for label in events_on(events, next.date).into_iter().filter_map(display_type) {
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    labels
}

/// Combined label for the next collection day, e.g. `KÄRL 1 + KÄRL 2`.
#[must_use]
pub fn next_collection_type(events: &[CollectionEvent], today: NaiveDate) -> Option<String> {
    let labels = next_day_types(events, today);
    (!labels.is_empty()).then(|| labels.join(" + "))
}

/// Whole days from `today` until the next collection.
#[must_use]
pub fn days_until_next(events: &[CollectionEvent], today: NaiveDate) -> Option<i64> {
    next_event(events, today).map(|event| (event.date - today).num_days())
}

/// Key under which an event is grouped per waste type.
fn type_key(event: &CollectionEvent) -> &str {
    if !event.type_formatted.is_empty() {
        &event.type_formatted
    } else if !event.type_raw.is_empty() {
        &event.type_raw
    } else {
        UNKNOWN_TYPE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Earliest upcoming date of one waste type.
pub struct TypeDate {
    /// Slug of the label, stable across runs.
    pub key: String,
    /// Waste type label as shown to users.
    pub label: String,
    /// Date of the next collection of this type.
    pub date: NaiveDate,
}

/// Earliest upcoming date per waste type, ordered by date and then by label.
#[must_use]
pub fn next_dates_by_type(events: &[CollectionEvent], today: NaiveDate) -> Vec<TypeDate> {
    let mut earliest: HashMap<&str, NaiveDate> = HashMap::new();
    for event in events.iter().filter(|event| event.date >= today) {
        earliest
            .entry(type_key(event))
            .and_modify(|date| *date = (*date).min(event.date))
            .or_insert(event.date);
    }

    let mut dates: Vec<TypeDate> = earliest
        .into_iter()
        .map(|(label, date)| TypeDate {
            key: slugify(label),
            label: label.to_owned(),
            date,
        })
        .collect();
    dates.sort_by(|left, right| {
        left.date
            .cmp(&right.date)
            .then_with(|| left.label.to_lowercase().cmp(&right.label.to_lowercase()))
    });
    dates
}

/// The first `limit` events of the schedule.
///
/// Truncation happens here at presentation time; providers always return the full list.
#[must_use]
pub fn upcoming(events: &[CollectionEvent], limit: usize) -> &[CollectionEvent] {
    events.get(..limit).unwrap_or(events)
}

/// Stable identifier fragment for a label: lowercase ASCII, digits, and underscores.
#[must_use]
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_separator = false;

    for character in value.trim().to_lowercase().chars() {
        let mapped = match character {
            'å' | 'ä' => 'a',
            'ö' => 'o',
            other => other,
        };
        if mapped.is_ascii_lowercase() || mapped.is_ascii_digit() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(mapped);
        } else {
            pending_separator = true;
        }
    }

    if slug.is_empty() {
        "unknown".to_owned()
    } else {
        slug
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Knobs controlling how much of a schedule a summary carries.
pub struct SummaryOptions {
    /// Number of events listed as upcoming.
    pub upcoming_limit: usize,
    /// Maximum number of per-type dates, or `None` to leave them out.
    pub per_type_cap: Option<usize>,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            upcoming_limit: 10,
            per_type_cap: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Next-collection facts published to the home-automation side.
pub struct NextCollectionSummary {
    /// Provider display name.
    pub provider: String,
    /// Provider identifier.
    pub provider_id: String,
    /// Municipality of the household.
    pub kommun: String,
    /// Free-text query of the household.
    pub address_query: String,
    /// Selected property identifier.
    pub match_id: String,
    /// Selected property label.
    pub match_label: String,
    /// Date of the next collection.
    pub next_date: Option<NaiveDate>,
    /// Combined waste type label of the next collection day.
    pub next_type: Option<String>,
    /// Days from today until the next collection.
    pub days_until: Option<i64>,
    /// Container number of the first event of the next collection.
    pub next_container_number: Option<String>,
    /// Raw type of the first event of the next collection.
    pub next_type_raw: Option<String>,
    /// Formatted type of the first event of the next collection.
    pub next_type_formatted: Option<String>,
    /// Display labels of every event on the next collection day.
    pub next_day_types_display: Vec<String>,
    /// All events on the next collection day.
    pub next_day_events: Vec<CollectionEvent>,
    /// Leading events of the schedule.
    pub upcoming: Vec<CollectionEvent>,
    /// Earliest upcoming date per waste type.
    pub per_type: Vec<TypeDate>,
}

impl NextCollectionSummary {
    /// Derive the summary for `today` from a fetched snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &ScheduleSnapshot, today: NaiveDate, options: SummaryOptions) -> Self {
        let events = snapshot.events.as_slice();
        let next = next_event(events, today);
        let next_day_events: Vec<CollectionEvent> = next
            .map(|event| events_on(events, event.date).into_iter().cloned().collect())
            .unwrap_or_default();

        let per_type: Vec<TypeDate> = options
            .per_type_cap
            .map(|cap| {
                next_dates_by_type(events, today)
                    .into_iter()
                    .take(cap)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            provider: snapshot.provider_name.clone(),
            provider_id: snapshot.provider_id.0.clone(),
            kommun: snapshot.kommun.clone(),
            address_query: snapshot.address_query.clone(),
            match_id: snapshot.match_id.0.clone(),
            match_label: snapshot.match_label.clone(),
            next_date: next.map(|event| event.date),
            next_type: next_collection_type(events, today),
            days_until: days_until_next(events, today),
            next_container_number: next.and_then(|event| event.container_number.clone()),
            next_type_raw: next.map(|event| event.type_raw.clone()),
            next_type_formatted: next.map(|event| event.type_formatted.clone()),
            next_day_types_display: next_day_types(events, today),
            next_day_events,
            upcoming: upcoming(events, options.upcoming_limit).to_vec(),
            per_type,
        }
    }
}
