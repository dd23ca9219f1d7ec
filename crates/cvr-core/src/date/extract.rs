use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::interval::{MonthInterval, YearMonth};
use super::tokens::{month_from_token, normalize_year, INTERNSHIP_ALT, MONTH_ALT, PRESENT_ALT};

// All extractors run over folded text (lowercased, diacritics
// stripped) and stay within a single line: separators never cross
// newlines, so unrelated date mentions on neighboring lines cannot
// fuse into one range.
//
// SEP joins a start to an explicit end. Before a present token the
// separator may be missing entirely ("Sept 2019 to date" consumes
// "to" as part of the token, not the separator).
const SEP: &str = r"[ \t]*(?:[-–—]|to|au|a)[ \t]*";
const PSEP: &str = r"[ \t]*(?:[-–—]|to|au|a)?[ \t]*";

lazy_static! {
    static ref YEAR_RANGE_RE: Regex = Regex::new(&format!(
        r"\b(?P<y1>\d{{4}}){sep}(?:(?P<y2>\d{{4}})\b|(?P<y2s>\d{{2}})\b)|\b(?P<y1p>\d{{4}}){psep}(?P<p>{present})\b",
        sep = SEP,
        psep = PSEP,
        present = &*PRESENT_ALT,
    ))
    .unwrap();

    static ref MONTH_RANGE_RE: Regex = Regex::new(&format!(
        r"\b(?P<m1>{month})\.?,?[ \t]+(?P<y1>\d{{4}})(?:{sep}(?:(?P<m2>{month})\.?,?[ \t]+(?P<y2>\d{{4}}|\d{{2}})\b|(?P<y3>\d{{4}})\b)|{psep}(?P<p>{present})\b)",
        month = &*MONTH_ALT,
        sep = SEP,
        psep = PSEP,
        present = &*PRESENT_ALT,
    ))
    .unwrap();

    static ref DAY_MONTH_RANGE_RE: Regex = Regex::new(&format!(
        r"\b(?P<d1>\d{{1,2}})[ \t]+(?P<m1>{month})\.?[ \t]+(?P<y1>\d{{4}})(?:{sep}(?P<d2>\d{{1,2}})[ \t]+(?P<m2>{month})\.?[ \t]+(?P<y2>\d{{4}})\b|{psep}(?P<p>{present})\b)",
        month = &*MONTH_ALT,
        sep = SEP,
        psep = PSEP,
        present = &*PRESENT_ALT,
    ))
    .unwrap();

    static ref SLASH_RANGE_RE: Regex = Regex::new(&format!(
        r"\b(?P<m1>\d{{1,2}})/(?P<y1>\d{{4}})(?:{sep}(?P<m2>\d{{1,2}})/(?P<y2>\d{{4}})\b|{psep}(?P<p>{present})\b)",
        sep = SEP,
        psep = PSEP,
        present = &*PRESENT_ALT,
    ))
    .unwrap();

    static ref DOTTED_RANGE_RE: Regex = Regex::new(&format!(
        r"\b(?P<a1>\d{{1,2}})\.(?P<b1>\d{{1,2}})\.(?P<y1>\d{{4}})(?:{sep}(?P<a2>\d{{1,2}})\.(?P<b2>\d{{1,2}})\.(?P<y2>\d{{4}})\b|{psep}(?P<p>{present})\b)",
        sep = SEP,
        psep = PSEP,
        present = &*PRESENT_ALT,
    ))
    .unwrap();

    static ref SINGLE_MONTH_RE: Regex = Regex::new(&format!(
        r"\b(?P<m>{month})\.?,?[ \t]*(?P<y>\d{{4}})\b",
        month = &*MONTH_ALT,
    ))
    .unwrap();

    static ref SINCE_RE: Regex = Regex::new(&format!(
        r"\b(?:since|depuis)[ \t]+(?P<m>{month})\.?[ \t]*(?P<y>\d{{4}})\b",
        month = &*MONTH_ALT,
    ))
    .unwrap();

    static ref FROM_RANGE_RE: Regex = Regex::new(&format!(
        r"\b(?:from|de)[ \t]+(?P<m1>{month})\.?[ \t]*(?P<y1>\d{{4}})(?:{sep}(?P<m2>{month})\.?[ \t]*(?P<y2>\d{{4}})\b|{psep}(?P<p>{present})\b)",
        month = &*MONTH_ALT,
        sep = SEP,
        psep = PSEP,
        present = &*PRESENT_ALT,
    ))
    .unwrap();

    static ref INTERNSHIP_RE: Regex =
        Regex::new(&format!(r"\b(?:{})\b", &*INTERNSHIP_ALT)).unwrap();
}

/// True when the folded text carries an internship/trainee marker.
pub fn has_internship_token(folded: &str) -> bool {
    INTERNSHIP_RE.is_match(folded)
}

fn index_of(year: i32, month: u32) -> i32 {
    year * 12 + (month as i32 - 1)
}

fn captured_year(caps: &Captures<'_>, name: &str, current_year: i32) -> Option<i32> {
    caps.name(name)
        .and_then(|m| normalize_year(m.as_str(), current_year))
}

fn captured_month(caps: &Captures<'_>, name: &str) -> Option<u32> {
    caps.name(name).and_then(|m| month_from_token(m.as_str()))
}

/// `YYYY-YYYY`, `YYYY-YY`, `YYYY-present`. Start is January of the
/// start year; an explicit end year means January of that year,
/// exclusive; present resolves to the current month, right-open.
fn extract_year_ranges(folded: &str, now: YearMonth, out: &mut Vec<MonthInterval>) {
    for caps in YEAR_RANGE_RE.captures_iter(folded) {
        let start_year = captured_year(&caps, "y1", now.year)
            .or_else(|| captured_year(&caps, "y1p", now.year));
        let Some(start_year) = start_year else {
            continue;
        };
        let start = index_of(start_year, 1);

        let end = if caps.name("p").is_some() {
            now.index()
        } else if let Some(year) = captured_year(&caps, "y2", now.year) {
            index_of(year, 1)
        } else if let Some(m) = caps.name("y2s") {
            // a 2-digit tail followed by - or / is an ISO-style date
            // ("1999-06-15"), not a year range
            if matches!(folded[m.end()..].chars().next(), Some('-') | Some('/')) {
                continue;
            }
            match normalize_year(m.as_str(), now.year) {
                Some(year) => index_of(year, 1),
                None => continue,
            }
        } else {
            continue;
        };

        out.extend(MonthInterval::new(start, end));
    }
}

/// `Mon YYYY – [Mon] YYYY|YY|present`. An explicit end month is
/// inclusive; a bare end year behaves like the year-range end.
fn extract_month_ranges(folded: &str, now: YearMonth, out: &mut Vec<MonthInterval>) {
    for caps in MONTH_RANGE_RE.captures_iter(folded) {
        let (Some(start_month), Some(start_year)) = (
            captured_month(&caps, "m1"),
            captured_year(&caps, "y1", now.year),
        ) else {
            continue;
        };
        let start = index_of(start_year, start_month);

        let end = if caps.name("p").is_some() {
            now.index()
        } else if let (Some(month), Some(year)) = (
            captured_month(&caps, "m2"),
            captured_year(&caps, "y2", now.year),
        ) {
            index_of(year, month) + 1
        } else if let Some(year) = captured_year(&caps, "y3", now.year) {
            index_of(year, 1)
        } else {
            continue;
        };

        out.extend(MonthInterval::new(start, end));
    }
}

/// `12 mars 2020 – 3 juin 2021`; days only anchor the match, the
/// interval stays month-grained.
fn extract_day_month_ranges(folded: &str, now: YearMonth, out: &mut Vec<MonthInterval>) {
    for caps in DAY_MONTH_RANGE_RE.captures_iter(folded) {
        let (Some(start_month), Some(start_year)) = (
            captured_month(&caps, "m1"),
            captured_year(&caps, "y1", now.year),
        ) else {
            continue;
        };
        let start = index_of(start_year, start_month);

        let end = if caps.name("p").is_some() {
            now.index()
        } else if let (Some(month), Some(year)) = (
            captured_month(&caps, "m2"),
            captured_year(&caps, "y2", now.year),
        ) {
            index_of(year, month) + 1
        } else {
            continue;
        };

        out.extend(MonthInterval::new(start, end));
    }
}

/// `MM/YYYY – MM/YYYY|present`.
fn extract_slash_ranges(folded: &str, now: YearMonth, out: &mut Vec<MonthInterval>) {
    for caps in SLASH_RANGE_RE.captures_iter(folded) {
        let (Some(start_month), Some(start_year)) = (
            caps.name("m1").and_then(|m| parse_month_number(m.as_str())),
            captured_year(&caps, "y1", now.year),
        ) else {
            continue;
        };
        let start = index_of(start_year, start_month);

        let end = if caps.name("p").is_some() {
            now.index()
        } else if let (Some(month), Some(year)) = (
            caps.name("m2").and_then(|m| parse_month_number(m.as_str())),
            captured_year(&caps, "y2", now.year),
        ) {
            index_of(year, month) + 1
        } else {
            continue;
        };

        out.extend(MonthInterval::new(start, end));
    }
}

/// `DD.MM.YYYY – DD.MM.YYYY`, DD/MM precedence (French convention):
/// when both leading numbers could be a month, the second one is.
fn extract_dotted_ranges(folded: &str, now: YearMonth, out: &mut Vec<MonthInterval>) {
    for caps in DOTTED_RANGE_RE.captures_iter(folded) {
        let start_month = dotted_month(
            caps.name("a1").map(|m| m.as_str()),
            caps.name("b1").map(|m| m.as_str()),
        );
        let (Some(start_month), Some(start_year)) =
            (start_month, captured_year(&caps, "y1", now.year))
        else {
            continue;
        };
        let start = index_of(start_year, start_month);

        let end = if caps.name("p").is_some() {
            now.index()
        } else {
            let month = dotted_month(
                caps.name("a2").map(|m| m.as_str()),
                caps.name("b2").map(|m| m.as_str()),
            );
            match (month, captured_year(&caps, "y2", now.year)) {
                (Some(month), Some(year)) => index_of(year, month) + 1,
                _ => continue,
            }
        };

        out.extend(MonthInterval::new(start, end));
    }
}

fn dotted_month(first: Option<&str>, second: Option<&str>) -> Option<u32> {
    let first: u32 = first?.parse().ok()?;
    let second: u32 = second?.parse().ok()?;
    if (1..=12).contains(&second) {
        Some(second)
    } else if (1..=12).contains(&first) {
        Some(first)
    } else {
        None
    }
}

fn parse_month_number(token: &str) -> Option<u32> {
    let value: u32 = token.parse().ok()?;
    (1..=12).contains(&value).then_some(value)
}

/// `Since Mon YYYY` / `Depuis Mon YYYY` / `From|De Mon YYYY to|à …`.
fn extract_open_ended(folded: &str, now: YearMonth, out: &mut Vec<MonthInterval>) {
    for caps in SINCE_RE.captures_iter(folded) {
        if let (Some(month), Some(year)) = (
            captured_month(&caps, "m"),
            captured_year(&caps, "y", now.year),
        ) {
            out.extend(MonthInterval::new(index_of(year, month), now.index()));
        }
    }

    for caps in FROM_RANGE_RE.captures_iter(folded) {
        let (Some(start_month), Some(start_year)) = (
            captured_month(&caps, "m1"),
            captured_year(&caps, "y1", now.year),
        ) else {
            continue;
        };
        let start = index_of(start_year, start_month);

        let end = if caps.name("p").is_some() {
            now.index()
        } else if let (Some(month), Some(year)) = (
            captured_month(&caps, "m2"),
            captured_year(&caps, "y2", now.year),
        ) {
            index_of(year, month) + 1
        } else {
            continue;
        };

        out.extend(MonthInterval::new(start, end));
    }
}

/// A lone `Mon YYYY` only counts near an internship keyword; anywhere
/// else a single month-year is a certification date, a publication, a
/// diploma.
fn extract_single_months(folded_line: &str, now: YearMonth, out: &mut Vec<MonthInterval>) {
    for caps in SINGLE_MONTH_RE.captures_iter(folded_line) {
        if let (Some(month), Some(year)) = (
            captured_month(&caps, "m"),
            captured_year(&caps, "y", now.year),
        ) {
            let start = index_of(year, month);
            out.extend(MonthInterval::new(start, start + 1));
        }
    }
}

fn run_range_extractors(folded: &str, now: YearMonth, out: &mut Vec<MonthInterval>) {
    extract_year_ranges(folded, now, out);
    extract_month_ranges(folded, now, out);
    extract_day_month_ranges(folded, now, out);
    extract_slash_ranges(folded, now, out);
    extract_dotted_ranges(folded, now, out);
    extract_open_ended(folded, now, out);
}

/// Raw (unmerged) intervals of a whole folded text. Single month-year
/// mentions are admitted when an internship keyword sits within ±1
/// line. The union is associative and commutative, so extractor order
/// is immaterial.
pub fn extract_intervals(folded: &str, now: YearMonth) -> Vec<MonthInterval> {
    let mut out = Vec::new();
    run_range_extractors(folded, now, &mut out);

    let lines: Vec<&str> = folded.split('\n').collect();
    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let start = i.saturating_sub(1);
        let end = (i + 2).min(lines.len());
        if lines[start..end].iter().any(|l| INTERNSHIP_RE.is_match(l)) {
            extract_single_months(line, now, &mut out);
        }
    }
    out
}

/// Raw intervals of a single folded line, for role segmentation.
/// `internship_context` reflects the caller's ±1-line scan.
pub fn extract_line_intervals(
    folded_line: &str,
    now: YearMonth,
    internship_context: bool,
) -> Vec<MonthInterval> {
    let mut out = Vec::new();
    run_range_extractors(folded_line, now, &mut out);
    if internship_context {
        extract_single_months(folded_line, now, &mut out);
    }
    out
}
