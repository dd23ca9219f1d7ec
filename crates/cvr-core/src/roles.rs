use std::collections::HashSet;
use std::sync::LazyLock;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::date::extract::has_internship_token;
use crate::date::tokens::month_from_token;
use crate::date::{
    extract_line_intervals, merge_intervals, months_to_years, total_months, MonthInterval,
    YearMonth,
};

static START_HEADINGS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "experience",
        "experiences",
        "professionalexperience",
        "workexperience",
        "workhistory",
        "careerhistory",
        "employmenthistory",
        "parcoursprofessionnel",
        "experienceprofessionnelle",
        "experiencesprofessionnelles",
    ]
    .into_iter()
    .collect()
});

static END_HEADINGS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "education",
        "formation",
        "formations",
        "skills",
        "technicalskills",
        "competences",
        "competencestechniques",
        "projects",
        "projets",
        "personalprojects",
        "certifications",
        "languages",
        "langues",
        "hobbies",
        "interests",
        "centresdinteret",
        "references",
        "about",
        "aboutme",
        "summary",
        "profile",
        "profil",
        "contact",
    ]
    .into_iter()
    .collect()
});

// Truncation anchor for fallback titles: the first date-ish token on a
// role's opening line.
static DATE_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:19|20)\d{2}\b|\b\d{1,2}\s*/\s*\d{4}\b|\b\d{1,2}\.\d{1,2}\.\d{4}\b").unwrap()
});

// "X years experience" / "X ans d'expérience" anchors, folded form.
static YEARS_ANCHOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?P<n>\d{1,2})[ \t]*\+?[ \t]*(?:years?|yrs?|ans)[ \t]+(?:of[ \t]+)?(?:d')?experience\b")
        .unwrap()
});

static PROFESSIONAL_SIGNAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:senior|lead|principal|manager|head|director|architect|cdi|permanent|full[ -]time)\b")
        .unwrap()
});

/// One role carved out of the experience scope. The month fields come
/// from the merged intervals of the role's block, so
/// `duration_months >= 1`.
#[derive(Debug, Clone)]
pub struct ParsedRole {
    pub title: String,
    pub start_month_index: i32,
    pub end_month_index: i32,
    pub duration_months: i32,
    pub text_block: String,
    pub professional: bool,
    /// `[start, end)` line indices into the canonical text.
    pub line_range: (usize, usize),
    pub intervals: Vec<MonthInterval>,
}

impl ParsedRole {
    /// Folded title+block, the haystack for relevance/internship/skill
    /// containment checks.
    pub fn folded_haystack(&self) -> String {
        crate::normalize::fold(&format!("{}\n{}", self.title, self.text_block))
    }
}

/// Everything downstream analyzers need from one segmentation pass.
/// Computed once per candidate and shared by reference.
#[derive(Debug, Clone)]
pub struct Segmentation {
    pub roles: Vec<ParsedRole>,
    /// A start heading was actually found (vs. whole-text fallback).
    pub section_found: bool,
    /// `[start, end)` line range of the section body.
    pub section_line_range: Option<(usize, usize)>,
    /// Merged intervals over the full text.
    pub text_intervals: Vec<MonthInterval>,
    /// Total professional years, via roles or the fallback chain.
    pub years_experience: Option<f64>,
}

struct LineView<'a> {
    canonical: &'a str,
    folded: String,
}

/// Segment the canonical text into roles and derive total professional
/// experience. `folded` must be `normalize::fold(canonical)`.
pub fn segment(canonical: &str, folded: &str, now: YearMonth) -> Segmentation {
    let lines = build_lines(canonical, folded);

    let section = locate_experience_section(&lines);
    let section_found = section.is_some();
    let (scope_start, scope_end) = section.unwrap_or((0, lines.len()));
    if !section_found {
        debug!("no experience heading found, segmenting over whole text");
    }

    let roles = carve_roles(&lines, scope_start, scope_end, now);

    let text_intervals = merge_intervals(&crate::date::extract_intervals(folded, now));

    let years_experience = professional_years(&roles)
        .or_else(|| fallback_years(&lines, section, &text_intervals, folded, now));

    Segmentation {
        roles,
        section_found,
        section_line_range: section,
        text_intervals,
        years_experience,
    }
}

fn build_lines<'a>(canonical: &'a str, folded: &str) -> Vec<LineView<'a>> {
    let folded_lines: Vec<&str> = folded.split('\n').collect();
    canonical
        .split('\n')
        .enumerate()
        .map(|(i, line)| LineView {
            canonical: line,
            folded: folded_lines.get(i).copied().unwrap_or("").to_string(),
        })
        .collect()
}

fn heading_key(folded_line: &str) -> String {
    folded_line.chars().filter(|c| c.is_alphabetic()).collect()
}

fn looks_like_heading(canonical_line: &str) -> bool {
    let trimmed = canonical_line.trim();
    if trimmed.chars().count() > 100 {
        return false;
    }
    let words = trimmed.split_whitespace().count();
    if words > 10 {
        return false;
    }
    if words <= 5 {
        return true;
    }

    let letters: Vec<char> = trimmed.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.is_empty() {
        return false;
    }
    let upper = letters.iter().filter(|c| c.is_uppercase()).count();
    upper as f64 / letters.len() as f64 >= 0.7
}

fn is_heading(line: &LineView<'_>, set: &HashSet<&'static str>) -> bool {
    set.contains(heading_key(&line.folded).as_str()) && looks_like_heading(line.canonical)
}

/// `(body_start, body_end)` line range of the experience section. When
/// the first candidate's body is tiny (< 100 chars) the next start
/// heading is tried and the larger body wins.
fn locate_experience_section(lines: &[LineView<'_>]) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize, usize)> = None;

    for (i, line) in lines.iter().enumerate() {
        if !is_heading(line, &START_HEADINGS) {
            continue;
        }
        let end = lines
            .iter()
            .enumerate()
            .skip(i + 1)
            .find(|(_, l)| is_heading(l, &END_HEADINGS))
            .map(|(j, _)| j)
            .unwrap_or(lines.len());

        let body_len: usize = lines[i + 1..end].iter().map(|l| l.canonical.len()).sum();

        match best {
            None => {
                if body_len >= 100 {
                    return Some((i + 1, end));
                }
                best = Some((i + 1, end, body_len));
            }
            Some((_, _, prev_len)) if body_len > prev_len => {
                best = Some((i + 1, end, body_len));
                if body_len >= 100 {
                    break;
                }
            }
            _ => {}
        }
    }

    best.map(|(start, end, _)| (start, end))
}

fn internship_context(lines: &[LineView<'_>], i: usize) -> bool {
    let start = i.saturating_sub(1);
    let end = (i + 2).min(lines.len());
    lines[start..end]
        .iter()
        .any(|l| has_internship_token(&l.folded))
}

fn is_skill_list_line(canonical_line: &str) -> bool {
    let trimmed = canonical_line.trim();
    if trimmed.chars().count() > 140 {
        return true;
    }
    let words: Vec<&str> = trimmed.split_whitespace().collect();
    let separators = trimmed
        .chars()
        .filter(|c| matches!(c, ',' | '|' | '/' | '•'))
        .count();
    if separators >= 3 && words.len() >= 4 {
        return true;
    }
    let short_tokens = words
        .iter()
        .filter(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).len() <= 3)
        .count();
    short_tokens >= 5
}

fn carve_roles(
    lines: &[LineView<'_>],
    scope_start: usize,
    scope_end: usize,
    now: YearMonth,
) -> Vec<ParsedRole> {
    let mut openings: Vec<(usize, Vec<MonthInterval>)> = Vec::new();
    for i in scope_start..scope_end {
        let line = &lines[i];
        if line.folded.is_empty() {
            continue;
        }
        let intervals = extract_line_intervals(&line.folded, now, internship_context(lines, i));
        if !intervals.is_empty() {
            openings.push((i, intervals));
        }
    }

    let mut roles = Vec::with_capacity(openings.len());
    for (k, (open, _)) in openings.iter().enumerate() {
        let block_end = openings
            .get(k + 1)
            .map(|(next, _)| *next)
            .unwrap_or(scope_end);

        let mut block_intervals = openings[k].1.clone();
        for i in (open + 1)..block_end {
            block_intervals.extend(extract_line_intervals(
                &lines[i].folded,
                now,
                internship_context(lines, i),
            ));
        }
        let merged = merge_intervals(&block_intervals);
        let Some((first, last)) = merged.first().zip(merged.last()) else {
            continue;
        };

        let prev_open = k.checked_sub(1).map(|p| openings[p].0);
        let title = role_title(lines, *open, scope_start, prev_open);

        let text_block = lines[*open..block_end]
            .iter()
            .map(|l| l.canonical)
            .collect::<Vec<_>>()
            .join("\n");

        let folded_block: String = lines[*open..block_end]
            .iter()
            .map(|l| l.folded.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let professional = !has_internship_token(&crate::normalize::fold(&title))
            && !has_internship_token(&folded_block);

        roles.push(ParsedRole {
            title,
            start_month_index: first.start,
            end_month_index: last.end,
            duration_months: total_months(&merged),
            text_block,
            professional,
            line_range: (*open, block_end),
            intervals: merged,
        });
    }
    roles
}

/// Up to two previous lines may carry the title; a line that is blank,
/// a heading, a skill list, or itself a role opener does not qualify.
/// Falls back to the opening line truncated before its first date.
fn role_title(
    lines: &[LineView<'_>],
    open: usize,
    scope_start: usize,
    prev_open: Option<usize>,
) -> String {
    let lower_bound = prev_open.map(|p| p + 1).unwrap_or(scope_start);

    for back in 1..=2usize {
        let Some(i) = open.checked_sub(back) else {
            break;
        };
        if i < lower_bound {
            break;
        }
        let line = &lines[i];
        if line.canonical.trim().is_empty() {
            continue;
        }
        if is_heading(line, &START_HEADINGS) || is_heading(line, &END_HEADINGS) {
            break;
        }
        if is_skill_list_line(line.canonical) {
            continue;
        }
        return line.canonical.trim().to_string();
    }

    title_from_opening_line(lines[open].canonical)
}

fn title_from_opening_line(canonical_line: &str) -> String {
    let trimmed = canonical_line.trim();
    let cut = DATE_TOKEN_RE
        .find(trimmed)
        .map(|m| m.start())
        .unwrap_or(trimmed.len());

    // Peel trailing separators and dangling month names left over from
    // the truncation ("Stagiaire – Mars " → "Stagiaire").
    let mut title: &str = &trimmed[..cut];
    loop {
        let before = title.len();
        title = title.trim_end_matches(|c: char| {
            c.is_whitespace()
                || matches!(c, '-' | '–' | '—' | ',' | ';' | ':' | '.' | '|' | '•' | '(')
        });
        if let Some(last) = title.split_whitespace().last() {
            if month_from_token(&crate::normalize::fold(last)).is_some() {
                title = &title[..title.len() - last.len()];
                continue;
            }
        }
        if title.len() == before {
            break;
        }
    }

    if title.is_empty() {
        trimmed.to_string()
    } else {
        title.to_string()
    }
}

/// Sum of merged professional-role durations, as a union so concurrent
/// stints do not double count. `None` when no role was carved at all;
/// `Some(0.0)` when roles exist but every one is an internship.
fn professional_years(roles: &[ParsedRole]) -> Option<f64> {
    if roles.is_empty() {
        return None;
    }
    let intervals: Vec<MonthInterval> = roles
        .iter()
        .filter(|r| r.professional)
        .flat_map(|r| r.intervals.iter().copied())
        .collect();
    Some(months_to_years(total_months(&merge_intervals(&intervals))))
}

/// (a) section intervals → (b) full-text intervals → (c) explicit
/// years anchors, internship-only texts excluded.
fn fallback_years(
    lines: &[LineView<'_>],
    section: Option<(usize, usize)>,
    text_intervals: &[MonthInterval],
    folded: &str,
    now: YearMonth,
) -> Option<f64> {
    if let Some((start, end)) = section {
        let mut intervals = Vec::new();
        for line in &lines[start..end] {
            intervals.extend(extract_line_intervals(
                &line.folded,
                now,
                has_internship_token(&line.folded),
            ));
        }
        let merged = merge_intervals(&intervals);
        if !merged.is_empty() {
            return Some(months_to_years(total_months(&merged)));
        }
    }

    if !text_intervals.is_empty() {
        return Some(months_to_years(total_months(text_intervals)));
    }

    if looks_internship_only(folded) {
        return None;
    }
    YEARS_ANCHOR_RE
        .captures_iter(folded)
        .filter_map(|caps| caps.name("n")?.as_str().parse::<i32>().ok())
        .max()
        .map(|years| months_to_years(years * 12))
}

fn looks_internship_only(folded: &str) -> bool {
    has_internship_token(folded) && !PROFESSIONAL_SIGNAL_RE.is_match(folded)
}
