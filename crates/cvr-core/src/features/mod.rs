pub mod education;
pub mod experience;
pub mod parse_quality;
pub mod project_scale;
pub mod recency;
pub mod red_flags;
pub mod seniority;
pub mod skill_depth;

use serde::Serialize;
use tracing::debug;

use crate::date::YearMonth;
use crate::matching::{match_keyword, match_skill, KeywordHit, SkillMatch, TextIndex};
use crate::roles::Segmentation;
use crate::spec::{ProjectSpec, RoleSpec};

pub use education::EducationSignal;
pub use experience::{RelevantExperience, RoleRecency};
pub use parse_quality::ParseQuality;
pub use project_scale::ProjectScale;
pub use recency::{RecencyAnalysis, Trajectory};
pub use red_flags::{RedFlagReport, Severity};
pub use seniority::{SeniorityAssessment, SeniorityLevel};
pub use skill_depth::SkillDepth;

/// The full per-candidate feature bundle the scorer consumes.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateFeatures {
    pub must_have: Vec<SkillMatch>,
    pub nice_to_have: Vec<SkillMatch>,
    pub keyword_hits: Vec<KeywordHit>,
    pub years_experience: Option<f64>,
    pub relevant_experience: RelevantExperience,
    pub skill_depth: Vec<SkillDepth>,
    pub seniority: SeniorityAssessment,
    pub recency: RecencyAnalysis,
    pub red_flags: RedFlagReport,
    pub project_scale: ProjectScale,
    pub education: EducationSignal,
    pub parse_quality: ParseQuality,
    pub warnings: Vec<String>,
}

/// Run every analyzer over the shared text index and role list. The
/// segmentation is computed once upstream and passed by reference;
/// nothing here recomputes it.
pub fn extract(
    index: &TextIndex<'_>,
    seg: &Segmentation,
    project: &ProjectSpec,
    role_spec: &RoleSpec,
    now: YearMonth,
) -> CandidateFeatures {
    let must_have: Vec<SkillMatch> = role_spec
        .must_have_skills
        .iter()
        .map(|s| match_skill(index, s, project))
        .collect();
    let nice_to_have: Vec<SkillMatch> = role_spec
        .nice_to_have_skills
        .iter()
        .map(|s| match_skill(index, s, project))
        .collect();
    let keyword_hits: Vec<KeywordHit> = role_spec
        .keywords
        .iter()
        .map(|k| match_keyword(index, k))
        .collect();

    let years_experience = seg.years_experience;
    debug!(
        roles = seg.roles.len(),
        section_found = seg.section_found,
        ?years_experience,
        "segmentation complete"
    );

    let relevant_experience = experience::analyze(seg, role_spec, now);
    let skill_depth = skill_depth::analyze(index, seg, role_spec, project, now);
    let seniority = seniority::analyze(
        index,
        role_spec.seniority_indicators.as_ref(),
        years_experience,
    );
    let recency = recency::analyze(&seg.roles, role_spec, project, now);
    let red_flags = red_flags::analyze(&seg.roles, years_experience, now);
    let project_scale = project_scale::analyze(index);
    let education = education::analyze(index);
    let parse_quality = parse_quality::analyze(index.canonical, seg, &must_have, &nice_to_have);

    let warnings = build_warnings(
        index.canonical,
        years_experience,
        &red_flags,
        &recency,
        &parse_quality,
    );

    CandidateFeatures {
        must_have,
        nice_to_have,
        keyword_hits,
        years_experience,
        relevant_experience,
        skill_depth,
        seniority,
        recency,
        red_flags,
        project_scale,
        education,
        parse_quality,
        warnings,
    }
}

fn build_warnings(
    canonical: &str,
    years_experience: Option<f64>,
    red_flags: &RedFlagReport,
    recency: &RecencyAnalysis,
    parse_quality: &ParseQuality,
) -> Vec<String> {
    let mut warnings = Vec::new();

    if canonical.chars().count() < 200 {
        warnings.push("Very little text extracted from this resume".to_string());
    }
    if let Some(years) = years_experience {
        if years < 1.0 {
            warnings.push(format!(
                "Very junior candidate: {years:.1} years of professional experience"
            ));
        }
    }
    for flag in red_flags.flags.iter().filter(|f| f.severity == Severity::High) {
        warnings.push(format!("High-severity red flag: {}", flag.evidence));
    }
    if recency.trajectory == Trajectory::Descending {
        warnings.push("Career trajectory reads as descending".to_string());
    }
    for issue in &parse_quality.issues {
        warnings.push(format!("Parsing: {issue}"));
    }

    warnings
}
