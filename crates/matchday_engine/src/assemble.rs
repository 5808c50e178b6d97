use std::sync::Arc;

use matchday_core::parse::{
    clean_whitespace, parse_attendance, parse_date, parse_iso_timestamp, DEFAULT_DATE_FORMAT,
};
use matchday_core::{system_clock, Clock, Match, MatchInfo, MatchStatus, Statistic, Team};
use matchday_logging::{md_debug, md_error, md_info};
use scraper::Selector;

use crate::commentary::extract_commentary;
use crate::fetch::Fetcher;
use crate::page::{self, element_text, Page};
use crate::result::extract_result;
use crate::stats::extract_statistics;
use crate::{AssemblyError, MatchTarget};

const SUMMARY_SEGMENT: &str = "match-summary/";
const STATISTICS_SEGMENT: &str = "match-summary/match-statistics/";

#[derive(Debug, Clone)]
pub struct AssemblyOptions {
    pub include_statistics: bool,
    pub include_match_info: bool,
    pub include_commentary: bool,
    /// Tried before the built-in fallbacks when reading the start time.
    pub date_format: String,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            include_statistics: true,
            include_match_info: true,
            include_commentary: false,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

/// Turns one [`MatchTarget`] into a [`Match`]: detail page, then the
/// statistics sub-page when enabled. A failed page fetch or missing team
/// names abort; every extracted field is best-effort.
pub struct MatchAssembler {
    fetcher: Arc<dyn Fetcher>,
    clock: Clock,
    options: AssemblyOptions,
}

impl MatchAssembler {
    pub fn new(fetcher: Arc<dyn Fetcher>, options: AssemblyOptions) -> Self {
        Self {
            fetcher,
            clock: system_clock(),
            options,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn options(&self) -> &AssemblyOptions {
        &self.options
    }

    pub async fn assemble(&self, target: &MatchTarget) -> Result<Match, AssemblyError> {
        md_info!("Scraping match: {}", target.match_id);
        match self.try_assemble(target).await {
            Ok(record) => Ok(record),
            Err(err) => {
                md_error!("Error scraping match {}: {err}", target.match_id);
                Err(err)
            }
        }
    }

    async fn try_assemble(&self, target: &MatchTarget) -> Result<Match, AssemblyError> {
        let detail = self.fetcher.fetch(&target.url).await?;
        let mut record = match_from_detail(&detail.html, target, &self.options)?;
        record.scraped_at = Some((self.clock)());

        if self.options.include_statistics {
            let stats_page = self
                .fetcher
                .fetch(&statistics_url(&target.url))
                .await
                .map_err(AssemblyError::StatisticsFetch)?;
            record.statistics = statistics_from_html(&stats_page.html);
        }
        Ok(record)
    }
}

fn statistics_from_html(html: &str) -> Vec<Statistic> {
    extract_statistics(&Page::parse(html))
}

/// Everything the detail page alone provides. Statistics stay empty.
pub fn match_from_detail(
    html: &str,
    target: &MatchTarget,
    options: &AssemblyOptions,
) -> Result<Match, AssemblyError> {
    let page = Page::parse(html);
    let (home_team, away_team) = extract_teams(&page).ok_or(AssemblyError::MissingTeams)?;

    let info = if options.include_match_info {
        Some(extract_match_info(&page)).filter(|info| !info.is_empty())
    } else {
        None
    };
    let commentary = if options.include_commentary {
        extract_commentary(&page)
    } else {
        Vec::new()
    };

    Ok(Match {
        match_id: target.match_id.clone(),
        url: target.url.clone(),
        country: target.country.clone(),
        league: target.league.clone(),
        season: target.season.clone(),
        stage: extract_stage(&page),
        date: extract_date(&page, &options.date_format),
        status: parse_status(page.first_text(&page::STATUS).as_deref()),
        home_team,
        away_team,
        result: extract_result(&page),
        odds: None,
        info,
        statistics: Vec::new(),
        commentary,
        scraped_at: None,
    })
}

fn extract_teams(page: &Page) -> Option<(Team, Team)> {
    let primary = (
        page.first_text(&page::HOME_TEAM).filter(|name| !name.is_empty()),
        page.first_text(&page::AWAY_TEAM).filter(|name| !name.is_empty()),
    );
    let (home, away) = match primary {
        (Some(home), Some(away)) => (home, away),
        _ => {
            md_debug!("team selectors empty, using participant names");
            let mut names = page
                .texts(&page::PARTICIPANT_NAME)
                .into_iter()
                .filter(|name| !name.is_empty());
            (names.next()?, names.next()?)
        }
    };

    let team_id = |selector: &Selector| {
        page.first(selector)
            .and_then(|link| link.value().attr("href"))
            .and_then(team_id_from_href)
    };
    let mut home = Team::named(home);
    home.external_id = team_id(&page::HOME_TEAM_LINK);
    let mut away = Team::named(away);
    away.external_id = team_id(&page::AWAY_TEAM_LINK);
    Some((home, away))
}

/// `/team/arsenal/hA1Zm19f/` -> `hA1Zm19f`.
pub fn team_id_from_href(href: &str) -> Option<String> {
    let (_, rest) = href.split_once("/team/")?;
    let mut segments = rest.split('/').filter(|segment| !segment.is_empty());
    let _slug = segments.next()?;
    segments.next().map(str::to_string)
}

fn extract_date(page: &Page, date_format: &str) -> Option<chrono::NaiveDateTime> {
    page.first_text(&page::START_TIME)
        .and_then(|text| parse_date(&text, date_format))
        .or_else(|| {
            page.select(&page::DATETIME_ATTR)
                .filter_map(|element| element.value().attr("datetime"))
                .find_map(parse_iso_timestamp)
        })
}

/// Keyword order matters: "ft" is checked before "ht", "aet" and "pen".
pub fn parse_status(text: Option<&str>) -> MatchStatus {
    let Some(text) = text else {
        return MatchStatus::Finished;
    };
    let lower = clean_whitespace(text).to_lowercase();
    if lower.contains("finished") || lower.contains("ft") {
        MatchStatus::Finished
    } else if lower.contains("half time") || lower.contains("ht") {
        MatchStatus::HalfTime
    } else if lower.contains("postponed") {
        MatchStatus::Postponed
    } else if lower.contains("cancelled") {
        MatchStatus::Cancelled
    } else if lower.contains("aet") {
        MatchStatus::AfterExtraTime
    } else if lower.contains("pen") {
        MatchStatus::AfterPenalties
    } else {
        MatchStatus::Finished
    }
}

fn extract_stage(page: &Page) -> Option<String> {
    page.first_text(&page::STAGE)
        .filter(|text| !text.is_empty())
        .or_else(|| {
            page.select(&page::STAGE_FALLBACK).map(element_text).find(|text| {
                let lower = text.to_lowercase();
                lower.contains("round") || lower.contains("final")
            })
        })
}

pub fn extract_match_info(page: &Page) -> MatchInfo {
    let mut info = MatchInfo::default();
    for text in page.texts(&page::INFO_ITEM) {
        let lower = text.to_lowercase();
        let value = text
            .split_once(':')
            .map(|(_, value)| clean_whitespace(value))
            .filter(|value| !value.is_empty());

        if lower.contains("referee") {
            info.referee = value.clone();
        }
        if lower.contains("venue") || lower.contains("stadium") {
            info.venue = value.clone();
        }
        if lower.contains("attendance") {
            info.attendance = value.as_deref().and_then(parse_attendance);
        }
        if lower.contains("weather") {
            info.weather = value;
        }
    }
    info
}

/// Statistics sub-page URL: query and fragment dropped, `match-summary/`
/// extended to `match-summary/match-statistics/` (appended when absent).
pub fn statistics_url(match_url: &str) -> String {
    let base = match_url.split('#').next().unwrap_or(match_url);
    let mut base = base.split('?').next().unwrap_or(base).to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    if base.contains(SUMMARY_SEGMENT) {
        base.replace(SUMMARY_SEGMENT, STATISTICS_SEGMENT)
    } else {
        base + STATISTICS_SEGMENT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistics_url_variants() {
        assert_eq!(
            statistics_url("https://host/match/ABC/#/match-summary"),
            "https://host/match/ABC/match-summary/match-statistics/"
        );
        assert_eq!(
            statistics_url("https://host/match/ABC/match-summary?x=1"),
            "https://host/match/ABC/match-summary/match-statistics/"
        );
    }

    #[test]
    fn status_keywords_follow_priority() {
        assert_eq!(parse_status(None), MatchStatus::Finished);
        assert_eq!(parse_status(Some("Half Time")), MatchStatus::HalfTime);
        assert_eq!(parse_status(Some("Postponed")), MatchStatus::Postponed);
        assert_eq!(parse_status(Some("AET")), MatchStatus::AfterExtraTime);
        assert_eq!(parse_status(Some("Pen.")), MatchStatus::AfterPenalties);
        // "after" contains "ft", which wins.
        assert_eq!(parse_status(Some("After Pen.")), MatchStatus::Finished);
        assert_eq!(parse_status(Some("Live")), MatchStatus::Finished);
    }

    fn target() -> MatchTarget {
        MatchTarget {
            match_id: "ABC".to_string(),
            url: "https://host/match/ABC/".to_string(),
            country: "england".to_string(),
            league: "premier-league".to_string(),
            season: "2023-2024".to_string(),
        }
    }

    #[test]
    fn participant_names_stand_in_for_team_selectors() {
        let html = r#"<div class="participant__participantName">Arsenal</div>
                      <div class="participant__participantName"></div>
                      <div class="participant__participantName">Chelsea</div>"#;
        let record = match_from_detail(html, &target(), &AssemblyOptions::default()).unwrap();
        assert_eq!(record.home_team.name, "Arsenal");
        assert_eq!(record.away_team.name, "Chelsea");

        let lonely = r#"<div class="participant__participantName">Arsenal</div>"#;
        let err = match_from_detail(lonely, &target(), &AssemblyOptions::default()).unwrap_err();
        assert!(matches!(err, AssemblyError::MissingTeams));
    }

    #[test]
    fn datetime_attribute_backs_up_start_time_text() {
        let html = r#"<div class="duelParticipant__home"><div class="participant__participantName">Arsenal</div></div>
                      <div class="duelParticipant__away"><div class="participant__participantName">Chelsea</div></div>
                      <div class="duelParticipant__startTime">kick-off soon</div>
                      <time datetime="2024-03-02T15:00:00Z">Sat</time>"#;
        let record = match_from_detail(html, &target(), &AssemblyOptions::default()).unwrap();
        let expected = chrono::NaiveDate::from_ymd_opt(2024, 3, 2)
            .and_then(|d| d.and_hms_opt(15, 0, 0))
            .unwrap();
        assert_eq!(record.date, Some(expected));
    }

    #[test]
    fn team_id_needs_slug_and_id() {
        assert_eq!(team_id_from_href("/team/arsenal/hA1Zm19f/").as_deref(), Some("hA1Zm19f"));
        assert_eq!(team_id_from_href("/team/arsenal/"), None);
        assert_eq!(team_id_from_href("/player/saka/abc/"), None);
    }

    #[test]
    fn match_info_reads_label_value_items() {
        let page = Page::parse(
            r#"<div class="mi__item"><span>Referee:</span> <span>Taylor A. (Eng)</span></div>
               <div class="mi__item"><span>Venue:</span> <span>Emirates Stadium (London)</span></div>
               <div class="mi__item"><span>Attendance:</span> <span>60,214</span></div>"#,
        );
        let info = extract_match_info(&page);
        assert_eq!(info.referee.as_deref(), Some("Taylor A. (Eng)"));
        assert_eq!(info.venue.as_deref(), Some("Emirates Stadium (London)"));
        assert_eq!(info.attendance, Some(60214));
        assert_eq!(info.weather, None);
    }
}
