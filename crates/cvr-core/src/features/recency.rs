use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::date::YearMonth;
use crate::matching::any_term_in;
use crate::roles::ParsedRole;
use crate::spec::{ProjectSpec, RoleSpec};

static SENIOR_TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:senior|sr|lead|principal|staff|architect|head|director|vp|cto)\b").unwrap()
});

static MID_TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:mid|mid-level|intermediate|confirme)\b").unwrap());

static JUNIOR_TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:junior|jr|stagiaire|intern|debutant|graduate|apprenti|alternant)\b").unwrap()
});

/// Title tier for trajectory analysis: senior 3, mid 2, junior 1.
/// Untitled roles carry no tier and are skipped in transitions.
pub(crate) fn title_level(folded_title: &str) -> Option<u8> {
    if SENIOR_TITLE_RE.is_match(folded_title) {
        Some(3)
    } else if JUNIOR_TITLE_RE.is_match(folded_title) {
        Some(1)
    } else if MID_TITLE_RE.is_match(folded_title) {
        Some(2)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillRecencyCategory {
    Current,
    Recent,
    Stale,
    Old,
    Unknown,
}

impl SkillRecencyCategory {
    pub fn multiplier(&self) -> f64 {
        match self {
            SkillRecencyCategory::Current => 1.0,
            SkillRecencyCategory::Recent => 0.85,
            SkillRecencyCategory::Stale => 0.6,
            SkillRecencyCategory::Old => 0.3,
            SkillRecencyCategory::Unknown => 0.7,
        }
    }

    fn of_gap(gap_months: i32) -> Self {
        if gap_months <= 1 {
            SkillRecencyCategory::Current
        } else if gap_months <= 24 {
            SkillRecencyCategory::Recent
        } else if gap_months <= 60 {
            SkillRecencyCategory::Stale
        } else {
            SkillRecencyCategory::Old
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trajectory {
    Ascending,
    Descending,
    Stable,
    Unclear,
}

impl Trajectory {
    fn adjustment(&self) -> f64 {
        match self {
            Trajectory::Ascending => 0.1,
            Trajectory::Descending => -0.15,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillRecency {
    pub skill: String,
    pub category: SkillRecencyCategory,
    pub multiplier: f64,
    /// Title of the latest professional role naming the skill.
    pub role_title: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecencyAnalysis {
    pub skills: Vec<SkillRecency>,
    pub trajectory: Trajectory,
    pub recency_score: f64,
}

/// Per-skill freshness from the latest professional role naming the
/// skill, plus the career trajectory over title tiers.
pub fn analyze(
    roles: &[ParsedRole],
    role_spec: &RoleSpec,
    project: &ProjectSpec,
    now: YearMonth,
) -> RecencyAnalysis {
    let haystacks: Vec<(String, &ParsedRole)> = roles
        .iter()
        .filter(|r| r.professional)
        .map(|r| (r.folded_haystack(), r))
        .collect();

    let skills: Vec<SkillRecency> = role_spec
        .must_have_skills
        .iter()
        .chain(&role_spec.nice_to_have_skills)
        .map(|skill| {
            let terms = project.terms_for(&skill.skill);
            let latest = haystacks
                .iter()
                .filter(|(haystack, _)| any_term_in(haystack, &terms))
                .map(|(_, role)| role)
                .max_by_key(|role| role.end_month_index);

            let (category, role_title) = match latest {
                Some(role) => (
                    SkillRecencyCategory::of_gap(now.index() - role.end_month_index),
                    Some(role.title.clone()),
                ),
                None => (SkillRecencyCategory::Unknown, None),
            };

            SkillRecency {
                skill: skill.skill.clone(),
                multiplier: category.multiplier(),
                category,
                role_title,
            }
        })
        .collect();

    let trajectory = career_trajectory(roles);

    let known: Vec<f64> = skills
        .iter()
        .filter(|s| s.category != SkillRecencyCategory::Unknown)
        .map(|s| s.multiplier)
        .collect();
    let base = if known.is_empty() {
        0.7
    } else {
        known.iter().sum::<f64>() / known.len() as f64
    };
    let recency_score = (base + trajectory.adjustment()).clamp(0.0, 1.0);

    RecencyAnalysis {
        skills,
        trajectory,
        recency_score,
    }
}

/// Adjacent transitions between titled roles, in start order.
fn career_trajectory(roles: &[ParsedRole]) -> Trajectory {
    let mut by_start: Vec<&ParsedRole> = roles.iter().collect();
    by_start.sort_by_key(|r| (r.start_month_index, r.end_month_index));

    let levels: Vec<u8> = by_start
        .iter()
        .filter_map(|r| title_level(&crate::normalize::fold(&r.title)))
        .collect();

    let mut ascending = 0usize;
    let mut descending = 0usize;
    for pair in levels.windows(2) {
        if pair[1] > pair[0] {
            ascending += 1;
        } else if pair[1] < pair[0] {
            descending += 1;
        }
    }

    if ascending > descending && ascending >= 1 {
        Trajectory::Ascending
    } else if descending > ascending && descending >= 1 {
        Trajectory::Descending
    } else if roles.len() >= 3 {
        Trajectory::Stable
    } else {
        Trajectory::Unclear
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{fold, normalize};
    use crate::roles::segment;
    use crate::spec::RoleSkill;

    const NOW: YearMonth = YearMonth {
        year: 2025,
        month: 6,
    };

    fn analyzed(raw: &str, skills: &[&str]) -> RecencyAnalysis {
        let canonical = normalize(raw);
        let folded = fold(&canonical);
        let seg = segment(&canonical, &folded, NOW);
        let role_spec = RoleSpec {
            role_id: "r".into(),
            title: "t".into(),
            must_have_skills: skills.iter().map(|s| RoleSkill::new(*s, 1.0)).collect(),
            ..RoleSpec::default()
        };
        analyze(&seg.roles, &role_spec, &ProjectSpec::default(), NOW)
    }

    #[test]
    fn skill_in_current_role_is_current() {
        let r = analyzed("Engineer\n2023 - present at Acme\nbuilt rust services", &["rust"]);
        assert_eq!(r.skills[0].category, SkillRecencyCategory::Current);
        assert_eq!(r.skills[0].multiplier, 1.0);
        assert_eq!(r.skills[0].role_title.as_deref(), Some("Engineer"));
    }

    #[test]
    fn skill_only_in_old_roles_decays() {
        let r = analyzed("Engineer\n2014 - 2016 at Initech\nrust firmware", &["rust"]);
        assert_eq!(r.skills[0].category, SkillRecencyCategory::Old);
        assert_eq!(r.skills[0].multiplier, 0.3);
    }

    #[test]
    fn stale_band_sits_between_recent_and_old() {
        let r = analyzed("Engineer\n2019 - 2021 at Initech\nrust tooling", &["rust"]);
        assert_eq!(r.skills[0].category, SkillRecencyCategory::Stale);
    }

    #[test]
    fn unseen_skill_is_unknown_with_default_multiplier() {
        let r = analyzed("Engineer\n2023 - present at Acme\npython only", &["rust"]);
        assert_eq!(r.skills[0].category, SkillRecencyCategory::Unknown);
        assert_eq!(r.skills[0].multiplier, 0.7);
        assert!(r.skills[0].role_title.is_none());
        // no known-category skills: base 0.7, no trajectory signal
        assert!((r.recency_score - 0.7).abs() < 1e-9);
    }

    #[test]
    fn descending_titles_penalize_the_score() {
        let r = analyzed(
            "Senior Architect 2018-2022\nJunior Engineer 2022-2025",
            &[],
        );
        assert_eq!(r.trajectory, Trajectory::Descending);
        assert!((r.recency_score - 0.55).abs() < 1e-9);
    }

    #[test]
    fn ascending_titles_lift_the_score() {
        let r = analyzed(
            "Junior Developer\n2018 - 2020 at Acme\nSenior Developer\n2020 - present at Acme",
            &[],
        );
        assert_eq!(r.trajectory, Trajectory::Ascending);
        assert!((r.recency_score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn two_level_roles_without_signal_are_unclear() {
        let r = analyzed("Engineer\n2018 - 2020\nEngineer\n2020 - 2022", &[]);
        assert_eq!(r.trajectory, Trajectory::Unclear);
    }
}
