use serde::Serialize;

use crate::spec::ScoringWeights;

/// Fallback when a role spec carries no usable weights.
/// Mirrors the shipped role files: skills dominate, experience next.
pub const DEFAULT_WEIGHTS: ComponentWeights = ComponentWeights {
    must_have: 0.30,
    nice_to_have: 0.10,
    experience: 0.20,
    skill_depth: 0.10,
    seniority: 0.10,
    recency: 0.08,
    project_scale: 0.08,
    education: 0.04,
};

/// The eight component weights after normalization: non-negative,
/// summing to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComponentWeights {
    pub must_have: f64,
    pub nice_to_have: f64,
    pub experience: f64,
    pub skill_depth: f64,
    pub seniority: f64,
    pub recency: f64,
    pub project_scale: f64,
    pub education: f64,
}

impl ComponentWeights {
    pub fn sum(&self) -> f64 {
        self.must_have
            + self.nice_to_have
            + self.experience
            + self.skill_depth
            + self.seniority
            + self.recency
            + self.project_scale
            + self.education
    }

    /// Clamp negatives to zero and divide by the sum; a zero (or
    /// all-negative) configuration falls back to `DEFAULT_WEIGHTS`
    /// silently, by contract.
    pub fn normalized(spec: &ScoringWeights) -> Self {
        let raw = Self {
            must_have: spec.must_have.max(0.0),
            nice_to_have: spec.nice_to_have.max(0.0),
            experience: spec.experience.max(0.0),
            skill_depth: spec.skill_depth.max(0.0),
            seniority: spec.seniority.max(0.0),
            recency: spec.recency.max(0.0),
            project_scale: spec.project_scale.max(0.0),
            education: spec.education.max(0.0),
        };

        let sum = raw.sum();
        if sum <= f64::EPSILON {
            return DEFAULT_WEIGHTS;
        }

        Self {
            must_have: raw.must_have / sum,
            nice_to_have: raw.nice_to_have / sum,
            experience: raw.experience / sum,
            skill_depth: raw.skill_depth / sum,
            seniority: raw.seniority / sum,
            recency: raw.recency / sum,
            project_scale: raw.project_scale / sum,
            education: raw.education / sum,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        assert!((DEFAULT_WEIGHTS.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_spec_falls_back_to_defaults() {
        let normalized = ComponentWeights::normalized(&ScoringWeights::default());
        assert_eq!(normalized, DEFAULT_WEIGHTS);
    }

    #[test]
    fn configured_weights_normalize_to_unit_sum() {
        let spec = ScoringWeights {
            must_have: 3.0,
            nice_to_have: 1.0,
            experience: 2.0,
            skill_depth: 1.0,
            seniority: 1.0,
            recency: 1.0,
            project_scale: 0.5,
            education: 0.5,
            ..ScoringWeights::default()
        };
        let normalized = ComponentWeights::normalized(&spec);
        assert!((normalized.sum() - 1.0).abs() < 1e-9);
        assert!((normalized.must_have - 0.3).abs() < 1e-9);
    }

    #[test]
    fn negative_weights_clamp_before_normalizing() {
        let spec = ScoringWeights {
            must_have: 1.0,
            experience: -5.0,
            ..ScoringWeights::default()
        };
        let normalized = ComponentWeights::normalized(&spec);
        assert_eq!(normalized.experience, 0.0);
        assert_eq!(normalized.must_have, 1.0);
    }

    #[test]
    fn ignored_budget_and_contract_fields_do_not_leak_into_weights() {
        let spec = ScoringWeights {
            must_have: 1.0,
            budget: Some(5.0),
            contract: Some(5.0),
            ..ScoringWeights::default()
        };
        let normalized = ComponentWeights::normalized(&spec);
        assert_eq!(normalized.must_have, 1.0);
        assert!((normalized.sum() - 1.0).abs() < 1e-9);
    }
}
