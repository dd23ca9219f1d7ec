use serde::Serialize;

use crate::date::{merge_intervals, months_to_years, total_months, MonthInterval, YearMonth};
use crate::normalize::fold;
use crate::roles::Segmentation;
use crate::spec::RoleSpec;

/// How fresh a role is relative to the injected clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleRecency {
    Current,
    Recent,
    Old,
}

impl RoleRecency {
    pub fn of(end_month_index: i32, now: YearMonth) -> Self {
        let gap = now.index() - end_month_index;
        if gap <= 1 {
            RoleRecency::Current
        } else if gap <= 24 {
            RoleRecency::Recent
        } else {
            RoleRecency::Old
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleSummary {
    pub title: String,
    pub start_month_index: i32,
    pub end_month_index: i32,
    pub duration_months: i32,
    pub professional: bool,
    pub relevant: bool,
    pub recency: RoleRecency,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelevantExperience {
    pub total_years: Option<f64>,
    pub relevant_years: Option<f64>,
    pub roles: Vec<RoleSummary>,
}

/// Tag each role for relevance and recency, and total the months that
/// are both relevant and professional. Without relevance keywords
/// every professional year is relevant.
pub fn analyze(seg: &Segmentation, role_spec: &RoleSpec, now: YearMonth) -> RelevantExperience {
    let folded_keywords: Vec<String> = role_spec
        .experience_relevance_keywords
        .iter()
        .map(|k| fold(k))
        .filter(|k| !k.is_empty())
        .collect();

    let roles: Vec<RoleSummary> = seg
        .roles
        .iter()
        .map(|role| {
            let haystack = role.folded_haystack();
            let relevant = folded_keywords.is_empty()
                || folded_keywords.iter().any(|k| haystack.contains(k.as_str()));
            RoleSummary {
                title: role.title.clone(),
                start_month_index: role.start_month_index,
                end_month_index: role.end_month_index,
                duration_months: role.duration_months,
                professional: role.professional,
                relevant,
                recency: RoleRecency::of(role.end_month_index, now),
            }
        })
        .collect();

    let total_years = seg.years_experience;

    let relevant_years = if total_years.is_none() {
        None
    } else if folded_keywords.is_empty() {
        total_years
    } else {
        let intervals: Vec<MonthInterval> = seg
            .roles
            .iter()
            .zip(&roles)
            .filter(|(parsed, summary)| parsed.professional && summary.relevant)
            .flat_map(|(parsed, _)| parsed.intervals.iter().copied())
            .collect();
        Some(months_to_years(total_months(&merge_intervals(&intervals))))
    };

    RelevantExperience {
        total_years,
        relevant_years,
        roles,
    }
}
