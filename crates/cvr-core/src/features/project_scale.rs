use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::matching::TextIndex;

static USER_SCALE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?P<n>\d{1,3}(?:[, ]\d{3})*|\d+)\s*(?P<suffix>k|m|million[s]?)?\s*\+?\s*(?:users|clients|customers|utilisateurs|employees|employes|subscribers|abonnes|accounts)\b",
    )
    .unwrap()
});

static TEAM_SIZE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:team of|equipe de|managed|led a team of|encadrement de|supervised)\s+(?P<n>\d{1,4})\b",
    )
    .unwrap()
});

static COMPANY_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:startup|scale[- ]?up|enterprise|grand groupe|pme|agency|agence|saas|esn|consultancy)\b")
        .unwrap()
});

static IMPACT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:revenue|chiffre d'affaires|growth|croissance|reduced|improved|increased|optimized|optimise|launched|lance|migrated|migre|automated|automatise)\b",
    )
    .unwrap()
});

#[derive(Debug, Clone, Serialize)]
pub struct ProjectScale {
    pub max_user_scale: Option<u64>,
    pub max_team_size: Option<u32>,
    pub company_types: Vec<String>,
    pub impact_indicators: Vec<String>,
    pub scale_score: f64,
}

/// Numeric scale signals: user counts, team sizes, company context and
/// impact verbs, folded into a bounded score starting at 0.3.
pub fn analyze(index: &TextIndex<'_>) -> ProjectScale {
    let folded = index.folded.as_str();

    let max_user_scale = USER_SCALE_RE
        .captures_iter(folded)
        .filter_map(|caps| {
            let digits: String = caps
                .name("n")?
                .as_str()
                .chars()
                .filter(|c| c.is_ascii_digit())
                .collect();
            let base: u64 = digits.parse().ok()?;
            let factor = match caps.name("suffix").map(|s| s.as_str()) {
                Some("k") => 1_000,
                Some("m") | Some("million") | Some("millions") => 1_000_000,
                _ => 1,
            };
            base.checked_mul(factor)
        })
        .max();

    let max_team_size = TEAM_SIZE_RE
        .captures_iter(folded)
        .filter_map(|caps| caps.name("n")?.as_str().parse::<u32>().ok())
        .max();

    let company_types = distinct_matches(&COMPANY_TYPE_RE, folded);
    let impact_indicators = distinct_matches(&IMPACT_RE, folded);

    let user_bonus = match max_user_scale {
        Some(n) if n >= 1_000_000 => 0.3,
        Some(n) if n >= 100_000 => 0.25,
        Some(n) if n >= 10_000 => 0.2,
        Some(n) if n >= 1_000 => 0.1,
        Some(_) => 0.05,
        None => 0.0,
    };
    let team_bonus = match max_team_size {
        Some(n) if n >= 20 => 0.2,
        Some(n) if n >= 10 => 0.15,
        Some(n) if n >= 5 => 0.1,
        Some(n) if n >= 2 => 0.05,
        _ => 0.0,
    };
    let company_bonus = (company_types.len() as f64 * 0.05).min(0.1);
    let indicator_bonus = (impact_indicators.len() as f64 * 0.025).min(0.1);

    let scale_score =
        (0.3 + user_bonus + team_bonus + company_bonus + indicator_bonus).clamp(0.0, 1.0);

    ProjectScale {
        max_user_scale,
        max_team_size,
        company_types,
        impact_indicators,
        scale_score,
    }
}

fn distinct_matches(re: &Regex, folded: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for m in re.find_iter(folded) {
        let token = m.as_str().to_string();
        if !out.contains(&token) {
            out.push(token);
        }
    }
    out
}
