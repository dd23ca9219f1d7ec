use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A required or preferred skill with its relative weight.
/// Weights are relative; the scorer normalizes them per list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSkill {
    pub skill: String,
    #[serde(default = "default_skill_weight")]
    pub weight: f64,
}

fn default_skill_weight() -> f64 {
    1.0
}

impl RoleSkill {
    pub fn new(skill: impl Into<String>, weight: f64) -> Self {
        Self {
            skill: skill.into(),
            weight,
        }
    }

    /// Weight as consumed by the scorer (negative values clamp to 0).
    pub fn effective_weight(&self) -> f64 {
        self.weight.max(0.0)
    }
}

/// Senior/mid/junior token lists. Empty lists fall back to the
/// compiled-in defaults in `features::seniority`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeniorityIndicators {
    #[serde(default)]
    pub senior: Vec<String>,
    #[serde(default)]
    pub mid: Vec<String>,
    #[serde(default)]
    pub junior: Vec<String>,
}

/// The eight configurable component weights. `budget` and `contract`
/// are accepted from role-spec files but never consumed by the scorer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringWeights {
    #[serde(default)]
    pub must_have: f64,
    #[serde(default)]
    pub nice_to_have: f64,
    #[serde(default)]
    pub experience: f64,
    #[serde(default)]
    pub skill_depth: f64,
    #[serde(default)]
    pub seniority: f64,
    #[serde(default)]
    pub recency: f64,
    #[serde(default)]
    pub project_scale: f64,
    #[serde(default)]
    pub education: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<f64>,
}

/// Hard filters flip `below_threshold` and append a reason. They never
/// zero a score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_must_have_match_ratio: Option<f64>,
    #[serde(default)]
    pub require_all_must_have_skills: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_relevant_experience_years: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_red_flag_penalty: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringSpec {
    #[serde(default)]
    pub weights: ScoringWeights,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hard_filters: Option<HardFilters>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleSpec {
    pub role_id: String,
    pub title: String,
    #[serde(default)]
    pub min_years_experience: f64,
    #[serde(default)]
    pub must_have_skills: Vec<RoleSkill>,
    #[serde(default)]
    pub nice_to_have_skills: Vec<RoleSkill>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub experience_relevance_keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seniority_indicators: Option<SeniorityIndicators>,
    #[serde(default)]
    pub scoring: ScoringSpec,
}

/// Project-level configuration shared by every role of a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSpec {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub skill_aliases: HashMap<String, Vec<String>>,
}

impl ProjectSpec {
    /// All search terms for a skill: the skill name itself followed by
    /// its aliases (case preserved; matching folds later).
    pub fn terms_for(&self, skill: &str) -> Vec<String> {
        let mut terms = vec![skill.to_string()];
        if let Some(aliases) = self.skill_aliases.get(skill) {
            terms.extend(aliases.iter().cloned());
        }
        terms
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SpecError {
    #[error("role {0}: minYearsExperience must be >= 0, got {1}")]
    NegativeMinYears(String, f64),
    #[error("role {0}: minMustHaveMatchRatio must be within [0,1], got {1}")]
    MatchRatioOutOfRange(String, f64),
    #[error("role {0}: maxRedFlagPenalty must be within [0,25], got {1}")]
    PenaltyOutOfRange(String, u32),
    #[error("role {0}: skill '{1}' has negative weight {2}")]
    NegativeSkillWeight(String, String, f64),
}

impl RoleSpec {
    /// Structural validation for upstream loaders. The analysis pipeline
    /// itself clamps minor violations instead of failing (negative skill
    /// weights score as 0), so a loader may choose to log and proceed.
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.min_years_experience < 0.0 {
            return Err(SpecError::NegativeMinYears(
                self.role_id.clone(),
                self.min_years_experience,
            ));
        }
        for s in self.must_have_skills.iter().chain(&self.nice_to_have_skills) {
            if s.weight < 0.0 {
                return Err(SpecError::NegativeSkillWeight(
                    self.role_id.clone(),
                    s.skill.clone(),
                    s.weight,
                ));
            }
        }
        if let Some(filters) = &self.scoring.hard_filters {
            if let Some(ratio) = filters.min_must_have_match_ratio {
                if !(0.0..=1.0).contains(&ratio) {
                    return Err(SpecError::MatchRatioOutOfRange(self.role_id.clone(), ratio));
                }
            }
            if let Some(max) = filters.max_red_flag_penalty {
                if max > 25 {
                    return Err(SpecError::PenaltyOutOfRange(self.role_id.clone(), max));
                }
            }
        }
        Ok(())
    }

    pub fn hard_filters(&self) -> Option<&HardFilters> {
        self.scoring.hard_filters.as_ref()
    }
}
