use chrono::{NaiveDate, NaiveTime};

const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"];

/// Parse free-text spreadsheet dates.
///
/// Accepts year-first `YYYY-MM-DD` / `YYYY/MM/DD` / `YYYY.MM.DD` and day-first
/// `DD.MM.YYYY` / `DD/MM/YYYY` / `DD-MM-YYYY` / `DD.MM.YY`, optionally followed
/// by a time of day (space or `T` separated) and a trailing `г.`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = strip_year_marker(s.trim());
    if s.is_empty() {
        return None;
    }

    let (date_part, time_part) = match s.split_once(|c: char| c == 'T' || c.is_whitespace()) {
        Some((date, time)) => (date, time.trim()),
        None => (s, ""),
    };
    if !time_part.is_empty()
        && !TIME_FORMATS
            .iter()
            .any(|f| NaiveTime::parse_from_str(time_part, f).is_ok())
    {
        return None;
    }

    parse_date_token(date_part)
}

/// ISO `YYYY-MM-DD` for a parseable cell, empty string otherwise.
pub fn canonical_date(s: &str) -> String {
    parse_date(s)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn strip_year_marker(s: &str) -> &str {
    let s = s.strip_suffix('.').map(str::trim_end).unwrap_or(s);
    match s.strip_suffix('г') {
        Some(rest) => rest.trim_end(),
        None => s,
    }
}

fn parse_date_token(tok: &str) -> Option<NaiveDate> {
    let sep = tok.chars().find(|c| matches!(c, '-' | '/' | '.'))?;
    let parts: Vec<&str> = tok.split(sep).collect();
    if parts.len() != 3
        || parts
            .iter()
            .any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit()))
    {
        return None;
    }
    let (a, b, c) = (parts[0], parts[1], parts[2]);
    if b.len() > 2 {
        return None;
    }

    match (a.len(), c.len()) {
        (4, 1..=2) => NaiveDate::from_ymd_opt(a.parse().ok()?, b.parse().ok()?, c.parse().ok()?),
        (1..=2, 4) => NaiveDate::from_ymd_opt(c.parse().ok()?, b.parse().ok()?, a.parse().ok()?),
        (1..=2, 2) => {
            // same pivot as strftime %y: 69-99 → 1900s, 00-68 → 2000s
            let yy: i32 = c.parse().ok()?;
            let year = if yy >= 69 { 1900 + yy } else { 2000 + yy };
            NaiveDate::from_ymd_opt(year, b.parse().ok()?, a.parse().ok()?)
        }
        _ => None,
    }
}
