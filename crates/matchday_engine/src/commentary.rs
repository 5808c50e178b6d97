use std::sync::LazyLock;

use matchday_core::{CommentaryEvent, EventKind, Side};
use matchday_logging::md_debug;
use regex::Regex;
use scraper::ElementRef;

use crate::page::{self, element_text, has_class_containing, Page};

static MINUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*(?:\+\s*(\d+))?").expect("incident minute regex is valid")
});

/// Timeline incidents from the summary page, in page order.
pub fn extract_commentary(page: &Page) -> Vec<CommentaryEvent> {
    let events: Vec<_> = page.select(&page::INCIDENT_ROW).filter_map(incident).collect();
    md_debug!("extracted {} timeline incidents", events.len());
    events
}

fn incident(row: ElementRef<'_>) -> Option<CommentaryEvent> {
    let description = element_text(row);
    let is_half_time = marks_half_time(&description);

    let (minute, added_time) = match row.select(&page::INCIDENT_TIME).next().map(element_text) {
        Some(time) => parse_minute(&time)?,
        None if is_half_time => (45, None),
        None => return None,
    };

    let side = if has_class_containing(row, "homeParticipant") {
        Some(Side::Home)
    } else if has_class_containing(row, "awayParticipant") {
        Some(Side::Away)
    } else {
        None
    };

    let player = row
        .select(&page::INCIDENT_PLAYER)
        .next()
        .map(element_text)
        .filter(|name| !name.is_empty());

    Some(CommentaryEvent {
        minute,
        added_time,
        event_type: classify(row, &description),
        side,
        player,
        description,
        is_half_time,
    })
}

/// `"45+2'"` -> `(45, Some(2))`, `"67'"` -> `(67, None)`.
pub fn parse_minute(text: &str) -> Option<(u32, Option<u32>)> {
    let caps = MINUTE.captures(text)?;
    let minute = caps[1].parse().ok()?;
    let added = caps.get(2).and_then(|m| m.as_str().parse().ok());
    Some((minute, added))
}

fn marks_half_time(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("half time") || lower.contains("half-time") || lower.contains("halftime")
}

fn classify(row: ElementRef<'_>, description: &str) -> EventKind {
    let mut markers = description.to_lowercase();
    for icon in row.select(&page::INCIDENT_ICON) {
        for class in icon.value().classes() {
            markers.push(' ');
            markers.push_str(&class.to_lowercase());
        }
        if let Some(title) = icon.value().attr("title") {
            markers.push(' ');
            markers.push_str(&title.to_lowercase());
        }
    }

    let any = |needles: &[&str]| needles.iter().any(|needle| markers.contains(needle));
    if any(&["substitution", "subst"]) {
        EventKind::Substitution
    } else if any(&["redcard", "red-card", "red card", "yellowred"]) {
        EventKind::RedCard
    } else if any(&["yellowcard", "yellow-card", "yellow card"]) {
        EventKind::YellowCard
    } else if any(&["goal", "soccer"]) {
        EventKind::Goal
    } else {
        EventKind::Other
    }
}
