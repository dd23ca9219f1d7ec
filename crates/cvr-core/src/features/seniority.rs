use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::matching::TextIndex;
use crate::spec::SeniorityIndicators;

const DEFAULT_SENIOR_TOKENS: &[&str] = &[
    "senior",
    "sr",
    "lead",
    "principal",
    "staff",
    "architect",
    "head of",
    "director",
    "expert",
    "vp",
    "cto",
];

const DEFAULT_MID_TOKENS: &[&str] = &["mid level", "mid-level", "intermediate", "confirme"];

const DEFAULT_JUNIOR_TOKENS: &[&str] = &[
    "junior",
    "jr",
    "debutant",
    "entry level",
    "entry-level",
    "graduate",
    "stagiaire",
    "internship",
    "intern",
    "apprentice",
    "alternant",
];

// Leadership phrases are stronger signals than bare title tokens.
static LEADERSHIP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:team lead|tech lead|led a team|led the team|managed a team|managing a team|engineering manager|chef d'equipe|responsable d'equipe|encadrement)\b",
    )
    .unwrap()
});

/// Evidence caps keep the output readable on token-dense resumes.
const MAX_EVIDENCE_LINES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeniorityLevel {
    Senior,
    Mid,
    Junior,
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeniorityAssessment {
    pub level: SeniorityLevel,
    pub confidence: f64,
    pub evidence: Vec<String>,
}

/// Token score over the whole text plus years-of-experience bands.
/// Every occurrence counts: a resume that says "junior" on two role
/// titles is more junior than one that says it once.
pub fn analyze(
    index: &TextIndex<'_>,
    indicators: Option<&SeniorityIndicators>,
    years_experience: Option<f64>,
) -> SeniorityAssessment {
    let senior_tokens = override_or_default(indicators.map(|i| &i.senior), DEFAULT_SENIOR_TOKENS);
    let mid_tokens = override_or_default(indicators.map(|i| &i.mid), DEFAULT_MID_TOKENS);
    let junior_tokens = override_or_default(indicators.map(|i| &i.junior), DEFAULT_JUNIOR_TOKENS);

    let mut evidence: Vec<String> = Vec::new();

    let mut senior_score = count_token_hits(index, &senior_tokens, &mut evidence) as i32;
    let _mid_hits = count_token_hits(index, &mid_tokens, &mut evidence);
    let mut junior_score = count_token_hits(index, &junior_tokens, &mut evidence) as i32;

    for m in LEADERSHIP_RE.find_iter(&index.folded) {
        senior_score += 2;
        push_evidence(&mut evidence, index.snippet_for_folded_offset(m.start()));
    }

    match years_experience {
        Some(years) if years >= 5.0 => {
            senior_score += 2;
            push_evidence(&mut evidence, format!("{years:.1} years of experience"));
        }
        Some(years) if years >= 3.0 => {
            senior_score += 1;
            push_evidence(&mut evidence, format!("{years:.1} years of experience"));
        }
        Some(years) if years < 2.0 => {
            junior_score += 1;
            push_evidence(&mut evidence, format!("{years:.1} years of experience"));
        }
        _ => {}
    }

    let net = senior_score - junior_score;
    let level = if net >= 3 {
        SeniorityLevel::Senior
    } else if net >= 1 {
        SeniorityLevel::Mid
    } else if net <= -1 {
        SeniorityLevel::Junior
    } else {
        SeniorityLevel::Unknown
    };

    let confidence = (0.5 + 0.1 * net.abs() as f64).clamp(0.3, 0.95);

    SeniorityAssessment {
        level,
        confidence,
        evidence,
    }
}

fn override_or_default(spec_tokens: Option<&Vec<String>>, defaults: &[&str]) -> Vec<String> {
    match spec_tokens {
        Some(tokens) if !tokens.is_empty() => tokens.clone(),
        _ => defaults.iter().map(|t| t.to_string()).collect(),
    }
}

/// Word-bounded alternation over the token list, folded like the text.
/// Boundaries matter here: "intern" must not count inside
/// "international".
fn token_regex(tokens: &[String]) -> Option<Regex> {
    let mut escaped: Vec<String> = tokens
        .iter()
        .map(|t| crate::normalize::fold(t))
        .filter(|t| !t.trim().is_empty())
        .map(|t| regex::escape(&t))
        .collect();
    if escaped.is_empty() {
        return None;
    }
    escaped.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    Regex::new(&format!(r"\b(?:{})\b", escaped.join("|"))).ok()
}

fn count_token_hits(
    index: &TextIndex<'_>,
    tokens: &[String],
    evidence: &mut Vec<String>,
) -> usize {
    let Some(re) = token_regex(tokens) else {
        return 0;
    };
    let mut count = 0;
    for m in re.find_iter(&index.folded) {
        count += 1;
        push_evidence(evidence, index.snippet_for_folded_offset(m.start()));
    }
    count
}

fn push_evidence(evidence: &mut Vec<String>, line: String) {
    if evidence.len() >= MAX_EVIDENCE_LINES || line.is_empty() {
        return;
    }
    if !evidence.contains(&line) {
        evidence.push(line);
    }
}
