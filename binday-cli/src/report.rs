use binday_core::display::{NextCollectionSummary, display_type};
use binday_core::model::{AddressMatch, CollectionEvent};
use chrono::NaiveDate;

pub(crate) fn render_matches(matches: &[AddressMatch]) -> String {
    if matches.is_empty() {
        return "No properties matched the search.".to_owned();
    }

    let id_width = matches
        .iter()
        .map(|found| found.id.0.chars().count())
        .max()
        .unwrap_or(0);

    matches
        .iter()
        .map(|found| format!("{:<id_width$}  {}", found.id.0, found.label))
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn render_summary(summary: &NextCollectionSummary, today: NaiveDate) -> String {
    let mut lines = vec![format!(
        "{} ({}, {})",
        summary.match_label, summary.kommun, summary.provider
    )];

    match (summary.next_date, summary.next_type.as_deref()) {
        (Some(date), next_type) => {
            lines.push(format!(
                "Next collection: {} {} ({})",
                date.format("%Y-%m-%d"),
                date.format("%a"),
                relative_day_label(date, today)
            ));
            lines.push(format!("Type: {}", next_type.unwrap_or("-")));
        }
        (None, _) => lines.push("No upcoming collections.".to_owned()),
    }

    if !summary.upcoming.is_empty() {
        lines.push(String::new());
        lines.push("Upcoming:".to_owned());
        lines.extend(summary.upcoming.iter().map(|event| event_line(event, today)));
    }

    if !summary.per_type.is_empty() {
        lines.push(String::new());
        lines.push("Next date per type:".to_owned());
        lines.extend(
            summary
                .per_type
                .iter()
                .map(|entry| format!("  {}: {}", entry.label, entry.date.format("%Y-%m-%d"))),
        );
    }

    lines.join("\n")
}

fn event_line(event: &CollectionEvent, today: NaiveDate) -> String {
    format!(
        "  {}  {:<3}  {:<12}  {}",
        event.date.format("%Y-%m-%d"),
        event.date.format("%a"),
        relative_day_label(event.date, today),
        display_type(event).unwrap_or_else(|| "-".to_owned())
    )
}

fn relative_day_label(date: NaiveDate, today: NaiveDate) -> String {
    let delta = (date - today).num_days();
    match delta {
        0 => "today".to_owned(),
        1 => "tomorrow".to_owned(),
        days if days > 1 => format!("in {days} days"),
        -1 => "yesterday".to_owned(),
        days => format!("{} days ago", days.abs()),
    }
}
