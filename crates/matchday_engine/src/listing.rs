use std::collections::HashSet;

use matchday_core::parse::extract_external_id;
use matchday_logging::{md_debug, md_info};
use scraper::ElementRef;
use url::Url;

use crate::page::{self, Page};
use crate::MatchTarget;

const ROW_ID_PREFIX: &str = "g_1_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchLink {
    pub match_id: String,
    pub url: String,
}

impl MatchLink {
    pub fn from_url(url: &str) -> Option<Self> {
        Some(Self {
            match_id: extract_external_id(url)?,
            url: url.to_string(),
        })
    }

    pub fn into_target(self, country: &str, league: &str, season: &str) -> MatchTarget {
        MatchTarget {
            match_id: self.match_id,
            url: self.url,
            country: country.to_string(),
            league: league.to_string(),
            season: season.to_string(),
        }
    }
}

/// Match links on a results or fixtures listing, first occurrence per id.
///
/// Rows (`.event__match`) are preferred; a page without rows is scanned for
/// bare `/match/` anchors instead.
pub fn discover_match_links(html: &str, base_url: &str) -> Vec<MatchLink> {
    let base = Url::parse(base_url).ok();
    let page = Page::parse(html);

    let mut links: Vec<MatchLink> = page
        .select(&page::LISTING_ROW)
        .filter_map(|row| row_link(row, base.as_ref()))
        .collect();
    if links.is_empty() {
        md_debug!("no listing rows, scanning match anchors");
        links = page
            .select(&page::MATCH_ANCHOR)
            .filter_map(|anchor| {
                let url = resolve(anchor.value().attr("href")?, base.as_ref())?;
                MatchLink::from_url(&url)
            })
            .collect();
    }

    let mut seen = HashSet::new();
    links.retain(|link| seen.insert(link.match_id.clone()));
    md_info!("Extracted {} match links", links.len());
    links
}

fn row_link(row: ElementRef<'_>, base: Option<&Url>) -> Option<MatchLink> {
    let href = row.select(&page::LISTING_LINK).next()?.value().attr("href")?;
    let url = resolve(href, base)?;
    let match_id = extract_external_id(&url).or_else(|| {
        row.value()
            .id()
            .and_then(|id| id.strip_prefix(ROW_ID_PREFIX))
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    })?;
    Some(MatchLink { match_id, url })
}

fn resolve(reference: &str, base: Option<&Url>) -> Option<String> {
    let trimmed = reference.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("javascript:") {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return Some(url.into());
    }
    base.and_then(|base| base.join(trimmed).ok()).map(Into::into)
}

/// One match URL per line; blank lines and `#` comments are ignored, as are
/// lines without a recognisable match id.
pub fn parse_match_list(text: &str) -> Vec<MatchLink> {
    let mut seen = HashSet::new();
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let link = MatchLink::from_url(line);
            if link.is_none() {
                md_debug!("ignoring list entry without match id: {line}");
            }
            link
        })
        .filter(|link| seen.insert(link.match_id.clone()))
        .collect()
}
