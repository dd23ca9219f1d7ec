use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::date::YearMonth;
use crate::features::recency::title_level;
use crate::normalize::fold;
use crate::roles::ParsedRole;

/// Red-flag penalties are capped; hard filters handle the rest.
pub const MAX_TOTAL_PENALTY: u32 = 25;

/// Roles ending further back than this do not count toward hopping.
const HOPPING_WINDOW_MONTHS: i32 = 60;
const SHORT_STINT_MONTHS: i32 = 12;

static LEADERSHIP_TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:lead|principal|architect|head|director)\b").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedFlagKind {
    JobHopping,
    EmploymentGap,
    TitleInflation,
    CareerRegression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize)]
pub struct RedFlag {
    pub kind: RedFlagKind,
    pub severity: Severity,
    pub evidence: String,
    pub penalty: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RedFlagReport {
    pub flags: Vec<RedFlag>,
    pub total_penalty: u32,
}

/// All rules run over the professional roles; internships neither hop
/// nor gap.
pub fn analyze(
    roles: &[ParsedRole],
    total_years: Option<f64>,
    now: YearMonth,
) -> RedFlagReport {
    let professional: Vec<&ParsedRole> = roles.iter().filter(|r| r.professional).collect();

    let mut flags = Vec::new();
    job_hopping(&professional, now, &mut flags);
    employment_gaps(&professional, &mut flags);
    title_inflation(&professional, total_years, &mut flags);
    career_regression(&professional, &mut flags);

    let total_penalty = flags
        .iter()
        .map(|f| f.penalty)
        .sum::<u32>()
        .min(MAX_TOTAL_PENALTY);

    RedFlagReport {
        flags,
        total_penalty,
    }
}

fn job_hopping(professional: &[&ParsedRole], now: YearMonth, flags: &mut Vec<RedFlag>) {
    let short_recent: Vec<&ParsedRole> = professional
        .iter()
        .copied()
        .filter(|r| now.index() - r.end_month_index <= HOPPING_WINDOW_MONTHS)
        .filter(|r| r.duration_months < SHORT_STINT_MONTHS)
        .collect();

    let stints = short_recent
        .iter()
        .map(|r| format!("{} ({} mo)", r.title, r.duration_months))
        .collect::<Vec<_>>()
        .join(", ");

    match short_recent.len() {
        n if n >= 3 => flags.push(RedFlag {
            kind: RedFlagKind::JobHopping,
            severity: Severity::High,
            evidence: format!("{n} stints under 12 months in the last 5 years: {stints}"),
            penalty: 10,
        }),
        2 => flags.push(RedFlag {
            kind: RedFlagKind::JobHopping,
            severity: Severity::Medium,
            evidence: format!("2 stints under 12 months in the last 5 years: {stints}"),
            penalty: 5,
        }),
        _ => {}
    }
}

fn employment_gaps(professional: &[&ParsedRole], flags: &mut Vec<RedFlag>) {
    let mut by_end: Vec<&ParsedRole> = professional.to_vec();
    by_end.sort_by_key(|r| (r.end_month_index, r.start_month_index));

    for pair in by_end.windows(2) {
        let gap = pair[1].start_month_index - pair[0].end_month_index;
        let (severity, penalty) = if gap > 24 {
            (Severity::High, 8)
        } else if gap > 12 {
            (Severity::Medium, 4)
        } else {
            continue;
        };
        flags.push(RedFlag {
            kind: RedFlagKind::EmploymentGap,
            severity,
            evidence: format!(
                "{} month gap between \"{}\" and \"{}\"",
                gap, pair[0].title, pair[1].title
            ),
            penalty,
        });
    }
}

fn title_inflation(
    professional: &[&ParsedRole],
    total_years: Option<f64>,
    flags: &mut Vec<RedFlag>,
) {
    let Some(years) = total_years else {
        return;
    };

    let senior_title = professional
        .iter()
        .copied()
        .find(|r| title_level(&fold(&r.title)) == Some(3));
    if let Some(role) = senior_title {
        let (severity, penalty) = if years < 2.0 {
            (Some(Severity::High), 10)
        } else if years < 3.0 {
            (Some(Severity::Medium), 5)
        } else {
            (None, 0)
        };
        if let Some(severity) = severity {
            flags.push(RedFlag {
                kind: RedFlagKind::TitleInflation,
                severity,
                evidence: format!(
                    "senior title \"{}\" with only {years:.1} years of experience",
                    role.title
                ),
                penalty,
            });
        }
    }

    if years < 4.0 {
        if let Some(role) = professional
            .iter()
            .copied()
            .find(|r| LEADERSHIP_TITLE_RE.is_match(&fold(&r.title)))
        {
            flags.push(RedFlag {
                kind: RedFlagKind::TitleInflation,
                severity: Severity::High,
                evidence: format!(
                    "leadership title \"{}\" with only {years:.1} years of experience",
                    role.title
                ),
                penalty: 8,
            });
        }
    }
}

fn career_regression(professional: &[&ParsedRole], flags: &mut Vec<RedFlag>) {
    let mut by_start: Vec<&ParsedRole> = professional.to_vec();
    by_start.sort_by_key(|r| (r.start_month_index, r.end_month_index));

    let titled: Vec<(&ParsedRole, u8)> = by_start
        .iter()
        .filter_map(|r| title_level(&fold(&r.title)).map(|level| (*r, level)))
        .collect();

    for pair in titled.windows(2) {
        let ((prev, prev_level), (next, next_level)) = (pair[0], pair[1]);
        if prev_level == 3 && next_level == 1 {
            flags.push(RedFlag {
                kind: RedFlagKind::CareerRegression,
                severity: Severity::Medium,
                evidence: format!(
                    "senior-to-junior move: \"{}\" then \"{}\"",
                    prev.title, next.title
                ),
                penalty: 5,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{fold as fold_text, normalize};
    use crate::roles::segment;

    const NOW: YearMonth = YearMonth {
        year: 2025,
        month: 6,
    };

    fn report(raw: &str) -> RedFlagReport {
        let canonical = normalize(raw);
        let folded = fold_text(&canonical);
        let seg = segment(&canonical, &folded, NOW);
        analyze(&seg.roles, seg.years_experience, NOW)
    }

    fn kinds(report: &RedFlagReport) -> Vec<RedFlagKind> {
        report.flags.iter().map(|f| f.kind).collect()
    }

    #[test]
    fn three_recent_short_stints_flag_high() {
        let r = report(
            "Engineer\n01/2021 - 09/2021 at A\n\
             Engineer\n01/2022 - 10/2022 at B\n\
             Engineer\n03/2023 - 01/2024 at C",
        );
        let flag = r.flags.iter().find(|f| f.kind == RedFlagKind::JobHopping);
        let flag = flag.expect("hopping flag");
        assert_eq!(flag.severity, Severity::High);
        assert_eq!(flag.penalty, 10);
    }

    #[test]
    fn exactly_two_short_stints_flag_medium() {
        let r = report(
            "Engineer\n01/2022 - 09/2022 at A\n\
             Engineer\n01/2023 - 10/2023 at B",
        );
        let flag = r.flags.iter().find(|f| f.kind == RedFlagKind::JobHopping);
        let flag = flag.expect("hopping flag");
        assert_eq!(flag.severity, Severity::Medium);
        assert_eq!(flag.penalty, 5);
    }

    #[test]
    fn old_short_stints_stay_out_of_the_window() {
        let r = report(
            "Engineer\n01/2010 - 06/2010 at A\n\
             Engineer\n01/2011 - 06/2011 at B\n\
             Engineer\n01/2012 - 06/2012 at C\n\
             Engineer\n01/2013 - present at D",
        );
        assert!(!kinds(&r).contains(&RedFlagKind::JobHopping));
    }

    #[test]
    fn long_gaps_between_roles_flag() {
        let r = report(
            "Engineer\n2015 - 2017 at A\n\
             Engineer\n2020 - 2023 at B",
        );
        let flag = r
            .flags
            .iter()
            .find(|f| f.kind == RedFlagKind::EmploymentGap)
            .expect("gap flag");
        // Jan 2017 → Jan 2020 = 36 months
        assert_eq!(flag.severity, Severity::High);
        assert_eq!(flag.penalty, 8);
    }

    #[test]
    fn moderate_gap_flags_medium() {
        let r = report(
            "Engineer\n2019 - 2021 at A\n\
             Engineer\n06/2022 - present at B",
        );
        let flag = r
            .flags
            .iter()
            .find(|f| f.kind == RedFlagKind::EmploymentGap)
            .expect("gap flag");
        assert_eq!(flag.severity, Severity::Medium);
        assert_eq!(flag.penalty, 4);
    }

    #[test]
    fn senior_title_with_thin_history_is_inflated() {
        let r = report("Senior Engineer\n01/2024 - present at A");
        let flag = r
            .flags
            .iter()
            .find(|f| f.kind == RedFlagKind::TitleInflation)
            .expect("inflation flag");
        assert_eq!(flag.severity, Severity::High);
        assert_eq!(flag.penalty, 10);
    }

    #[test]
    fn leadership_title_under_four_years_flags() {
        // 3.4 years: clears the senior-title bands but not the
        // stricter leadership bar
        let r = report("Tech Lead\n2022 - present at A");
        let penalties: Vec<u32> = r
            .flags
            .iter()
            .filter(|f| f.kind == RedFlagKind::TitleInflation)
            .map(|f| f.penalty)
            .collect();
        assert_eq!(penalties, vec![8]);
    }

    #[test]
    fn regression_from_senior_to_junior_flags_medium() {
        let r = report("Senior Architect 2018-2022\nJunior Engineer 2022-2025");
        let flag = r
            .flags
            .iter()
            .find(|f| f.kind == RedFlagKind::CareerRegression)
            .expect("regression flag");
        assert_eq!(flag.severity, Severity::Medium);
        assert_eq!(flag.penalty, 5);
        assert_eq!(r.total_penalty, 5);
    }

    #[test]
    fn internship_roles_never_hop() {
        let r = report(
            "Stagiaire\nMars 2023 – Juin 2023\n\
             Stagiaire\nJanvier 2024 – Avril 2024\n\
             Stagiaire\nJuin 2024 – Septembre 2024",
        );
        assert!(kinds(&r).is_empty());
    }

    #[test]
    fn penalty_totals_are_capped() {
        let r = report(
            "Senior Lead Architect\n01/2024 - 03/2024 at A\n\
             Junior Dev\n04/2024 - 06/2024 at B\n\
             Senior Head of Platform\n08/2024 - 10/2024 at C\n\
             Junior Dev\n11/2024 - 01/2025 at D",
        );
        assert!(r.total_penalty <= MAX_TOTAL_PENALTY);
        assert!(r.flags.len() >= 3);
    }
}
