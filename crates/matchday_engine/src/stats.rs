use matchday_core::Statistic;
use matchday_logging::{md_debug, md_info};
use scraper::ElementRef;

use crate::page::{self, element_text, Page};

/// Reads the statistics sub-page. The row layout is tried first; the
/// three-column section layout only when it yields nothing.
pub fn extract_statistics(page: &Page) -> Vec<Statistic> {
    let mut statistics: Vec<_> = page.select(&page::STAT_ROW).filter_map(labelled_row).collect();

    if statistics.is_empty() {
        md_debug!("no labelled stat rows, trying section layout");
        statistics = page
            .select(&page::SECTION_ROW)
            .filter_map(three_column_row)
            .collect();
    }

    md_info!("Extracted {} statistics", statistics.len());
    statistics
}

/// `category` element plus exactly one home and one away value element.
fn labelled_row(row: ElementRef<'_>) -> Option<Statistic> {
    let category = row.select(&page::STAT_CATEGORY).next().map(element_text)?;
    let values: Vec<_> = row.select(&page::STAT_VALUES).map(element_text).collect();
    match values.as_slice() {
        [home, away] => Some(Statistic::from_values(category, home.as_str(), away.as_str())),
        _ => {
            md_debug!("skipping stat row {category:?}: {} values", values.len());
            None
        }
    }
}

/// `[home_value, category, away_value]`.
fn three_column_row(row: ElementRef<'_>) -> Option<Statistic> {
    let texts: Vec<_> = row.select(&page::DIV).map(element_text).collect();
    match texts.as_slice() {
        [home, category, away] => Some(Statistic::from_values(
            category.as_str(),
            home.as_str(),
            away.as_str(),
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labelled_rows_skip_malformed_entries() {
        let page = Page::parse(
            r#"<div class="stat__row">
                 <div class="stat__category">Ball Possession</div>
                 <div class="stat__homeValue">61%</div><div class="stat__awayValue">39%</div>
               </div>
               <div class="stat__row"><div class="stat__homeValue">4</div><div class="stat__awayValue">2</div></div>
               <div class="stat__row"><div class="stat__category">Corners</div><div class="stat__homeValue">4</div></div>"#,
        );
        let stats = extract_statistics(&page);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].category, "Ball Possession");
        assert_eq!(stats[0].home_numeric, Some(61.0));
        assert_eq!(stats[0].away_value, "39%");
    }

    #[test]
    fn section_layout_only_when_rows_yield_nothing() {
        let both = Page::parse(
            r#"<div class="stat__row">
                 <div class="stat__category">Corners</div>
                 <div class="stat__homeValue">7</div><div class="stat__awayValue">3</div>
               </div>
               <div class="section"><div><div>12</div><div>Fouls</div><div>9</div></div></div>"#,
        );
        let stats = extract_statistics(&both);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].category, "Corners");

        let sections_only = Page::parse(
            r#"<div class="section"><div><div>12</div><div>Fouls</div><div>9</div></div></div>"#,
        );
        let stats = extract_statistics(&sections_only);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].category, "Fouls");
        assert_eq!(stats[0].home_value, "12");
    }
}
