pub mod weights;

use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::features::{CandidateFeatures, SeniorityLevel, Severity};
use crate::matching::SkillMatch;
use crate::spec::RoleSpec;

pub use weights::{ComponentWeights, DEFAULT_WEIGHTS};

/// Per-component scores, each within `[0, 1]`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ComponentScores {
    pub must_have: f64,
    pub nice_to_have: f64,
    pub experience: f64,
    pub skill_depth: f64,
    pub seniority: f64,
    pub recency: f64,
    pub project_scale: f64,
    pub education: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreResult {
    /// `round(100 · Σ(weight · component))`, before penalties.
    pub raw_score: u32,
    /// `max(0, raw - total_penalty)`: the ranking key.
    pub overall_score: u32,
    pub components: ComponentScores,
    pub weights: ComponentWeights,
    pub total_penalty: u32,
    pub below_threshold: bool,
    pub threshold_reasons: Vec<String>,
}

impl ScoreResult {
    /// Flat JSON breakdown for logs and persisted snapshots.
    pub fn breakdown_json(&self) -> serde_json::Value {
        json!({
            "must_have": self.components.must_have,
            "nice_to_have": self.components.nice_to_have,
            "experience": self.components.experience,
            "skill_depth": self.components.skill_depth,
            "seniority": self.components.seniority,
            "recency": self.components.recency,
            "project_scale": self.components.project_scale,
            "education": self.components.education,
            "raw": self.raw_score,
            "penalty": self.total_penalty,
            "overall": self.overall_score,
        })
    }
}

/// Weighted component scores, penalty application and hard-filter
/// evaluation. Hard filters only annotate; they never zero a score.
pub fn score(features: &CandidateFeatures, role_spec: &RoleSpec) -> ScoreResult {
    let weights = ComponentWeights::normalized(&role_spec.scoring.weights);

    let components = ComponentScores {
        must_have: skill_list_score(&features.must_have),
        nice_to_have: skill_list_score(&features.nice_to_have),
        experience: experience_component(features, role_spec),
        skill_depth: skill_depth_component(features),
        seniority: seniority_component(features, role_spec),
        recency: features.recency.recency_score,
        project_scale: features.project_scale.scale_score,
        education: education_component(features, role_spec),
    };

    let weighted = components.must_have * weights.must_have
        + components.nice_to_have * weights.nice_to_have
        + components.experience * weights.experience
        + components.skill_depth * weights.skill_depth
        + components.seniority * weights.seniority
        + components.recency * weights.recency
        + components.project_scale * weights.project_scale
        + components.education * weights.education;

    let raw_score = (100.0 * weighted).round() as u32;
    let total_penalty = features.red_flags.total_penalty;
    let overall_score = raw_score.saturating_sub(total_penalty);

    let threshold_reasons = evaluate_thresholds(features, role_spec, components.must_have);
    let below_threshold = !threshold_reasons.is_empty();
    debug!(raw_score, overall_score, below_threshold, "scored candidate");

    ScoreResult {
        raw_score,
        overall_score,
        components,
        weights,
        total_penalty,
        below_threshold,
        threshold_reasons,
    }
}

/// `Σ(weight·matched) / Σ(weight)`; an unweighted (or empty) list is
/// trivially satisfied.
fn skill_list_score(matches: &[SkillMatch]) -> f64 {
    let total: f64 = matches.iter().map(|m| m.weight).sum();
    if total <= 0.0 {
        return 1.0;
    }
    let matched: f64 = matches.iter().filter(|m| m.matched).map(|m| m.weight).sum();
    matched / total
}

/// Piecewise curve over `candidate_years / min_years`. Saturates at
/// 1.5× the requirement; decays fast under 60% of it.
fn experience_curve(candidate_years: Option<f64>, min_years: f64) -> f64 {
    if min_years <= 0.0 {
        return 1.0;
    }
    let Some(years) = candidate_years else {
        return 0.0;
    };
    let r = years / min_years;
    if r >= 1.5 {
        1.0
    } else if r >= 1.0 {
        0.8 + 0.4 * (r - 1.0)
    } else if r >= 0.6 {
        0.4 + (r - 0.6)
    } else {
        0.67 * r
    }
}

/// Curve over relevant years (total as fallback), with a freshness
/// bonus when a relevant role is still running or recently ended.
fn experience_component(features: &CandidateFeatures, role_spec: &RoleSpec) -> f64 {
    let relevant = &features.relevant_experience;
    let years = relevant.relevant_years.or(relevant.total_years);
    let mut score = experience_curve(years, role_spec.min_years_experience);

    let relevant_roles: Vec<_> = relevant
        .roles
        .iter()
        .filter(|r| r.relevant && r.professional)
        .collect();
    if relevant_roles
        .iter()
        .any(|r| r.recency == crate::features::RoleRecency::Current)
    {
        score += 0.1;
    } else if relevant_roles
        .iter()
        .any(|r| r.recency == crate::features::RoleRecency::Recent)
    {
        score += 0.05;
    }

    score.clamp(0.0, 1.0)
}

fn skill_depth_component(features: &CandidateFeatures) -> f64 {
    if features.skill_depth.is_empty() {
        return 0.5;
    }
    let n = features.skill_depth.len() as f64;
    let avg_depth = features.skill_depth.iter().map(|d| d.depth_score).sum::<f64>() / n;
    let high_quality = features
        .skill_depth
        .iter()
        .filter(|d| d.context_quality == crate::features::skill_depth::ContextQuality::High)
        .count() as f64
        / n;
    (avg_depth * 0.7 + high_quality * 0.3).clamp(0.0, 1.0)
}

/// Seniority fit is contextual to the role tier: a senior candidate is
/// no asset on a junior posting and vice versa.
fn seniority_component(features: &CandidateFeatures, role_spec: &RoleSpec) -> f64 {
    let conf = features.seniority.confidence;
    let min_years = role_spec.min_years_experience;

    let score = match features.seniority.level {
        SeniorityLevel::Unknown => 0.5,
        SeniorityLevel::Senior if min_years >= 5.0 => 0.9 + 0.1 * conf,
        SeniorityLevel::Mid if min_years >= 5.0 => 0.5 + 0.2 * conf,
        SeniorityLevel::Junior if min_years >= 5.0 => 0.2 - 0.1 * conf,
        SeniorityLevel::Senior if min_years >= 3.0 => 0.85,
        SeniorityLevel::Mid if min_years >= 3.0 => 0.8 + 0.2 * conf,
        SeniorityLevel::Junior if min_years >= 3.0 => 0.4 - 0.1 * conf,
        SeniorityLevel::Senior => 0.6,
        SeniorityLevel::Mid => 0.8,
        SeniorityLevel::Junior => 0.9,
    };
    score.clamp(0.0, 1.0)
}

/// Education matters less the more senior the role.
fn education_component(features: &CandidateFeatures, role_spec: &RoleSpec) -> f64 {
    let edu = features.education.education_score;
    let min_years = role_spec.min_years_experience;
    let score = if min_years >= 5.0 {
        0.5 + 0.3 * edu
    } else if min_years >= 3.0 {
        0.4 + 0.4 * edu
    } else {
        0.3 + 0.5 * edu
    };
    score.clamp(0.0, 1.0)
}

fn evaluate_thresholds(
    features: &CandidateFeatures,
    role_spec: &RoleSpec,
    must_have_score: f64,
) -> Vec<String> {
    let mut reasons = Vec::new();
    let Some(filters) = role_spec.hard_filters() else {
        return threshold_common(features, role_spec, reasons);
    };

    if let Some(min_ratio) = filters.min_must_have_match_ratio {
        if must_have_score < min_ratio {
            reasons.push(format!(
                "Must-have skill match {:.0}% below the required {:.0}%",
                must_have_score * 100.0,
                min_ratio * 100.0
            ));
        }
    }

    if filters.require_all_must_have_skills {
        let missing: Vec<&str> = features
            .must_have
            .iter()
            .filter(|m| !m.matched)
            .map(|m| m.term.as_str())
            .collect();
        if !missing.is_empty() {
            reasons.push(format!("Missing must-have skills: {}", missing.join(", ")));
        }
    }

    if let Some(min_relevant) = filters.min_relevant_experience_years {
        let relevant = features
            .relevant_experience
            .relevant_years
            .or(features.relevant_experience.total_years)
            .unwrap_or(0.0);
        if relevant < min_relevant {
            reasons.push(format!(
                "Relevant experience {relevant:.1} years below the required {min_relevant:.1}"
            ));
        }
    }

    if let Some(max_penalty) = filters.max_red_flag_penalty {
        if features.red_flags.total_penalty > max_penalty {
            reasons.push(format!(
                "Red-flag penalty {} exceeds the allowed {max_penalty}",
                features.red_flags.total_penalty
            ));
        }
    }

    threshold_common(features, role_spec, reasons)
}

/// Filters that apply with or without a hardFilters block.
fn threshold_common(
    features: &CandidateFeatures,
    role_spec: &RoleSpec,
    mut reasons: Vec<String>,
) -> Vec<String> {
    if role_spec.min_years_experience >= 5.0
        && features.seniority.level == SeniorityLevel::Junior
        && features.seniority.confidence > 0.6
    {
        reasons.push("Junior-level candidate for senior role".to_string());
    }

    let high_flags = features
        .red_flags
        .flags
        .iter()
        .filter(|f| f.severity == Severity::High)
        .count();
    if high_flags >= 2 {
        reasons.push(format!("{high_flags} high-severity red flags"));
    }

    reasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::YearMonth;
    use crate::matching::TextIndex;
    use crate::normalize::{fold, normalize};
    use crate::roles::segment;
    use crate::spec::{HardFilters, RoleSkill};

    const NOW: YearMonth = YearMonth {
        year: 2025,
        month: 6,
    };

    fn features_for(raw: &str, role_spec: &RoleSpec) -> CandidateFeatures {
        let canonical = normalize(raw);
        let folded = fold(&canonical);
        let seg = segment(&canonical, &folded, NOW);
        let index = TextIndex::new(&canonical, folded.clone());
        crate::features::extract(&index, &seg, &Default::default(), role_spec, NOW)
    }

    fn senior_role() -> RoleSpec {
        RoleSpec {
            role_id: "sr".into(),
            title: "Senior Engineer".into(),
            min_years_experience: 5.0,
            must_have_skills: vec![RoleSkill::new("rust", 1.0)],
            ..RoleSpec::default()
        }
    }

    #[test]
    fn experience_curve_bands() {
        assert_eq!(experience_curve(Some(3.0), 0.0), 1.0);
        assert_eq!(experience_curve(None, 5.0), 0.0);
        assert_eq!(experience_curve(Some(7.5), 5.0), 1.0);
        assert!((experience_curve(Some(6.4), 5.0) - 0.912).abs() < 1e-9);
        assert!((experience_curve(Some(4.0), 5.0) - 0.6).abs() < 1e-9);
        assert!((experience_curve(Some(2.0), 5.0) - 0.268).abs() < 1e-9);
    }

    #[test]
    fn skill_list_scores_are_weight_proportional() {
        let m = |w: f64, matched: bool| SkillMatch {
            term: "x".into(),
            weight: w,
            matched,
            evidence: if matched { vec!["e".into()] } else { vec![] },
        };
        assert_eq!(skill_list_score(&[]), 1.0);
        assert_eq!(skill_list_score(&[m(0.0, false)]), 1.0);
        assert!((skill_list_score(&[m(3.0, true), m(1.0, false)]) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn raw_score_is_the_weighted_rounded_sum() {
        let role = senior_role();
        let f = features_for(
            "Sr Software Engineer. 2019 - present at Acme. Led a team of 8. Rust in production.",
            &role,
        );
        let s = score(&f, &role);

        let weighted = s.components.must_have * s.weights.must_have
            + s.components.nice_to_have * s.weights.nice_to_have
            + s.components.experience * s.weights.experience
            + s.components.skill_depth * s.weights.skill_depth
            + s.components.seniority * s.weights.seniority
            + s.components.recency * s.weights.recency
            + s.components.project_scale * s.weights.project_scale
            + s.components.education * s.weights.education;
        assert_eq!(s.raw_score, (100.0 * weighted).round() as u32);
        assert!(s.raw_score <= 100);
        assert!(s.overall_score <= s.raw_score);
        assert!((s.weights.sum() - 1.0).abs() < 1e-3);
        // 6.4y on a 5y floor with a current role: curve 0.912 + 0.1
        assert_eq!(s.components.experience, 1.0);
        assert!(!s.below_threshold);
    }

    #[test]
    fn below_threshold_always_carries_reasons() {
        let mut role = senior_role();
        role.scoring.hard_filters = Some(HardFilters {
            require_all_must_have_skills: true,
            ..HardFilters::default()
        });
        let f = features_for("A python-only resume. 2019 - present.", &role);
        let s = score(&f, &role);

        assert!(s.below_threshold);
        assert!(s.threshold_reasons.iter().any(|r| r.contains("rust")));
    }

    #[test]
    fn junior_candidate_on_senior_role_is_flagged() {
        let role = senior_role();
        let f = features_for(
            "Junior Developer 2023-2024. Junior Developer 2024-present.",
            &role,
        );
        let s = score(&f, &role);

        assert!(s
            .threshold_reasons
            .contains(&"Junior-level candidate for senior role".to_string()));
        assert!(s.below_threshold);
    }

    #[test]
    fn relevant_experience_floor_appends_a_reason() {
        let mut role = senior_role();
        role.min_years_experience = 2.0;
        role.scoring.hard_filters = Some(HardFilters {
            min_relevant_experience_years: Some(2.0),
            ..HardFilters::default()
        });
        let f = features_for("Stagiaire – Mars 2024 – Juin 2024. PFE.", &role);
        let s = score(&f, &role);

        assert!(s.below_threshold);
        assert!(s
            .threshold_reasons
            .iter()
            .any(|r| r.contains("Relevant experience")));
    }

    #[test]
    fn penalty_subtracts_but_never_goes_negative() {
        let role = RoleSpec {
            role_id: "any".into(),
            title: "Any".into(),
            ..RoleSpec::default()
        };
        let f = features_for(
            "Senior Lead Architect\n01/2024 - 03/2024 at A\n\
             Junior Dev\n04/2024 - 06/2024 at B\n\
             Senior Head of Platform\n08/2024 - 10/2024 at C\n\
             Junior Dev\n11/2024 - 01/2025 at D",
            &role,
        );
        let s = score(&f, &role);
        assert_eq!(s.total_penalty, 25);
        assert_eq!(s.overall_score, s.raw_score.saturating_sub(25));
    }

    #[test]
    fn breakdown_json_is_flat_and_complete() {
        let role = senior_role();
        let f = features_for("Rust engineer, 2018 - present.", &role);
        let s = score(&f, &role);
        let json = s.breakdown_json();
        assert!(json.get("must_have").is_some());
        assert!(json.get("overall").unwrap().as_u64().is_some());
    }
}
