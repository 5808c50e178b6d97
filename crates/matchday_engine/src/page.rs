use std::sync::LazyLock;

use matchday_core::parse::clean_whitespace;
use scraper::{ElementRef, Html, Selector};

fn compile(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|err| panic!("invalid static selector {css:?}: {err}"))
}

macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: LazyLock<Selector> = LazyLock::new(|| compile($css));
    };
}

// Detail page header.
selector!(HOME_TEAM, ".duelParticipant__home .participant__participantName");
selector!(AWAY_TEAM, ".duelParticipant__away .participant__participantName");
selector!(PARTICIPANT_NAME, ".participant__participantName");
selector!(HOME_TEAM_LINK, ".duelParticipant__home a[href*='/team/']");
selector!(AWAY_TEAM_LINK, ".duelParticipant__away a[href*='/team/']");
selector!(START_TIME, ".duelParticipant__startTime");
selector!(DATETIME_ATTR, "[datetime]");
selector!(STATUS, ".fixedHeaderDuel__detailStatus");
selector!(STAGE, "span.tournamentHeader__country");
selector!(STAGE_FALLBACK, ".tournamentHeader__country, .tournamentHeader__country a");

// Scores.
selector!(SCORE_HOME, ".detailScore__wrapper > span:first-child");
selector!(SCORE_AWAY, ".detailScore__wrapper > span:last-child");
selector!(SCORE_WRAPPER_SPANS, ".detailScore__wrapper span");
selector!(HALF_TIME, ".detailScore__halftime");
selector!(HALF_TIME_VARIANTS, ".detailScore__halftime, .detailScore__halfTime");
selector!(INFO_OR_INCIDENT, ".mi__item, .smv__incident");
selector!(EXTRA_TIME, ".detailScore__extraTime");
selector!(PENALTIES, ".detailScore__penalties");

// Match info block.
selector!(INFO_ITEM, ".mi__item");

// Statistics sub-page.
selector!(STAT_ROW, ".stat__row, ._row_");
selector!(STAT_CATEGORY, ".stat__category, ._category_, .stat__categoryName");
selector!(
    STAT_VALUES,
    ".stat__homeValue, .stat__awayValue, ._homeValue_, ._awayValue_"
);
selector!(SECTION_ROW, ".section > div");
selector!(DIV, "div");

// Summary timeline.
selector!(INCIDENT_ROW, ".smv__participantRow");
selector!(INCIDENT_TIME, ".smv__timeBox");
selector!(INCIDENT_PLAYER, ".smv__playerName");
selector!(INCIDENT_ICON, "svg, .smv__incidentIcon, .smv__incidentIconSub, [class*='card']");

// Listing pages.
selector!(LISTING_ROW, ".event__match");
selector!(LISTING_LINK, "a");
selector!(MATCH_ANCHOR, "a[href*='/match/']");

/// A parsed page. Wraps `scraper::Html`, which is not `Send`: parse, query and
/// drop inside one synchronous call, never across an `.await`.
pub struct Page {
    document: Html,
}

impl Page {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    pub fn select<'a>(&'a self, selector: &'a Selector) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.document.select(selector)
    }

    pub fn first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.document.select(selector).next()
    }

    /// Whitespace-normalised text of the first match, if any.
    pub fn first_text(&self, selector: &Selector) -> Option<String> {
        self.first(selector).map(element_text)
    }

    pub fn texts(&self, selector: &Selector) -> Vec<String> {
        self.select(selector).map(element_text).collect()
    }

    /// All text nodes of the document, concatenated in document order.
    pub fn full_text(&self) -> String {
        self.document.root_element().text().collect()
    }
}

pub fn element_text(element: ElementRef<'_>) -> String {
    let raw: String = element.text().collect::<Vec<_>>().join(" ");
    clean_whitespace(raw.as_str())
}

pub fn has_class_containing(element: ElementRef<'_>, needle: &str) -> bool {
    element.value().classes().any(|class| class.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_whitespace_normalised() {
        let page = Page::parse("<div class='a'>  Arsenal \n <b>FC</b> </div>");
        let selector = compile(".a");
        assert_eq!(page.first_text(&selector).as_deref(), Some("Arsenal FC"));
        assert_eq!(page.first_text(&HALF_TIME), None);
    }

    #[test]
    fn static_selectors_compile() {
        for selector in [
            &*HOME_TEAM,
            &*SCORE_HOME,
            &*STAT_VALUES,
            &*INCIDENT_ICON,
            &*LISTING_ROW,
            &*HOME_TEAM_LINK,
        ] {
            let _ = Page::parse("<p></p>").first(selector);
        }
    }
}
