use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::date::YearMonth;
use crate::features::experience::RoleRecency;
use crate::matching::TextIndex;
use crate::roles::Segmentation;
use crate::spec::{ProjectSpec, RoleSpec};

/// Chars of folded context inspected on each side of a mention.
const CONTEXT_HALF: usize = 200;

static HIGH_SIGNAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:production|enterprise|platform|architecture|architected|led|designed|scaled|saas|b2b|high availability|mission critical|microservices)\b",
    )
    .unwrap()
});

static MEDIUM_SIGNAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:project|application|feature|integration|service|api)\b").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextQuality {
    High,
    Medium,
    Low,
}

impl ContextQuality {
    fn bonus(&self) -> f64 {
        match self {
            ContextQuality::High => 0.3,
            ContextQuality::Medium => 0.15,
            ContextQuality::Low => 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillDepth {
    pub skill: String,
    pub mention_count: usize,
    pub in_experience_section: bool,
    pub in_recent_role: bool,
    pub context_quality: ContextQuality,
    pub depth_score: f64,
}

/// Depth of evidence per required/preferred skill: how often it is
/// mentioned, whether inside the experience section, whether in a
/// fresh role, and how strong the surrounding language is.
pub fn analyze(
    index: &TextIndex<'_>,
    seg: &Segmentation,
    role_spec: &RoleSpec,
    project: &ProjectSpec,
    now: YearMonth,
) -> Vec<SkillDepth> {
    let recent_role_lines: Vec<(usize, usize)> = seg
        .roles
        .iter()
        .filter(|r| {
            matches!(
                RoleRecency::of(r.end_month_index, now),
                RoleRecency::Current | RoleRecency::Recent
            )
        })
        .map(|r| r.line_range)
        .collect();

    role_spec
        .must_have_skills
        .iter()
        .chain(&role_spec.nice_to_have_skills)
        .map(|skill| {
            let terms = project.terms_for(&skill.skill);
            let mentions = index.mentions(&terms);

            let in_experience_section = seg.section_line_range.is_some_and(|(start, end)| {
                mentions.iter().any(|m| (start..end).contains(&m.line))
            });

            let in_recent_role = mentions.iter().any(|m| {
                recent_role_lines
                    .iter()
                    .any(|(start, end)| (*start..*end).contains(&m.line))
            });

            let context_quality = strongest_context(index, &mentions);

            let mention_score = (mentions.len() as f64 / 5.0).min(1.0);
            let mut depth_score = 0.3 * mention_score + context_quality.bonus();
            if in_experience_section {
                depth_score += 0.2;
            }
            if in_recent_role {
                depth_score += 0.2;
            }

            SkillDepth {
                skill: skill.skill.clone(),
                mention_count: mentions.len(),
                in_experience_section,
                in_recent_role,
                context_quality,
                depth_score,
            }
        })
        .collect()
}

fn strongest_context(index: &TextIndex<'_>, mentions: &[crate::matching::Mention]) -> ContextQuality {
    let mut best = ContextQuality::Low;
    for mention in mentions {
        let window = index.folded_context(mention.folded_offset, CONTEXT_HALF);
        if HIGH_SIGNAL_RE.is_match(window) {
            return ContextQuality::High;
        }
        if MEDIUM_SIGNAL_RE.is_match(window) {
            best = ContextQuality::Medium;
        }
    }
    best
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

    fn depth_for(raw: &str, skill: &str) -> SkillDepth {
        let canonical = normalize(raw);
        let folded = fold(&canonical);
        let seg = segment(&canonical, &folded, NOW);
        let index = TextIndex::new(&canonical, folded.clone());
        let role_spec = RoleSpec {
            role_id: "r".into(),
            title: "t".into(),
            must_have_skills: vec![RoleSkill::new(skill, 1.0)],
            ..RoleSpec::default()
        };
        analyze(&index, &seg, &role_spec, &ProjectSpec::default(), NOW)
            .into_iter()
            .next()
            .unwrap()
    }

    #[test]
    fn counts_mentions_and_scores_context() {
        let depth = depth_for(
            "EXPERIENCE\nEngineer\n2022 - present at Acme\nRust services in production, more rust tooling",
            "rust",
        );
        assert_eq!(depth.mention_count, 2);
        assert!(depth.in_experience_section);
        assert!(depth.in_recent_role);
        assert_eq!(depth.context_quality, ContextQuality::High);
        // 0.3·(2/5) + 0.2 + 0.2 + 0.3
        assert!((depth.depth_score - 0.82).abs() < 1e-9);
    }

    #[test]
    fn skills_only_in_a_skills_list_score_shallow() {
        let depth = depth_for(
            "EXPERIENCE\nEngineer\n2010 - 2012 at Initech\nwrote firmware\nSKILLS\nrust, go, python",
            "rust",
        );
        assert_eq!(depth.mention_count, 1);
        assert!(!depth.in_experience_section);
        assert!(!depth.in_recent_role);
        assert_eq!(depth.context_quality, ContextQuality::Low);
        assert!((depth.depth_score - 0.06).abs() < 1e-9);
    }

    #[test]
    fn medium_signal_words_give_partial_credit() {
        let depth = depth_for("Built an api integration with redis", "redis");
        assert_eq!(depth.context_quality, ContextQuality::Medium);
    }

    #[test]
    fn unmentioned_skills_are_zero() {
        let depth = depth_for("A text about nothing in particular.", "kafka");
        assert_eq!(depth.mention_count, 0);
        assert_eq!(depth.depth_score, 0.0);
    }
}
