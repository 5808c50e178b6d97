use chrono::{DateTime, Utc};

const MAX_PART_LEN: usize = 60;

/// `{country}_{league}_{season}_{YYYYmmdd_HHMMSS}.{ext}`, each part made safe
/// for Windows and POSIX filesystems.
pub fn export_filename(
    country: &str,
    league: &str,
    season: &str,
    at: DateTime<Utc>,
    extension: &str,
) -> String {
    format!(
        "{}_{}_{}_{}.{extension}",
        sanitize_part(country),
        sanitize_part(league),
        sanitize_part(season),
        at.format("%Y%m%d_%H%M%S"),
    )
}

/// Lower-cases, maps separators and forbidden characters to `-`, collapses
/// repeats and trims. Empty input becomes `unknown`.
pub fn sanitize_part(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_dash = false;
    for c in input.trim().chars() {
        let mapped = if c.is_whitespace() || is_forbidden(c) || c == '_' {
            '-'
        } else {
            c.to_ascii_lowercase()
        };
        if mapped == '-' {
            if !prev_dash {
                out.push('-');
            }
            prev_dash = true;
        } else {
            out.push(mapped);
            prev_dash = false;
        }
    }

    let mut cleaned = out.trim_matches(&['-', '.'][..]).to_string();
    if cleaned.chars().count() > MAX_PART_LEN {
        cleaned = cleaned.chars().take(MAX_PART_LEN).collect();
    }
    if cleaned.is_empty() || is_reserved_windows_name(&cleaned) {
        cleaned = if cleaned.is_empty() {
            "unknown".to_string()
        } else {
            format!("{cleaned}-")
        };
    }
    cleaned
}

fn is_forbidden(c: char) -> bool {
    matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}')
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parts_are_sanitized() {
        assert_eq!(sanitize_part("Premier League"), "premier-league");
        assert_eq!(sanitize_part(" 2023/2024 "), "2023-2024");
        assert_eq!(sanitize_part("a: *b*"), "a-b");
        assert_eq!(sanitize_part("???"), "unknown");
        assert_eq!(sanitize_part("con"), "con-");
    }

    #[test]
    fn filename_layout() {
        let at = Utc.with_ymd_and_hms(2024, 5, 19, 18, 4, 9).unwrap();
        assert_eq!(
            export_filename("England", "Premier League", "2023-2024", at, "csv"),
            "england_premier-league_2023-2024_20240519_180409.csv"
        );
    }
}
