use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::matching::TextIndex;

/// Chars of folded context inspected around a degree mention.
const FIELD_CONTEXT_HALF: usize = 100;

static PHD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bph\.?\s?d\b|\bdoctorat\b|\bdoctorate\b").unwrap());
static MASTERS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bmaster(?:'?s)?\b|\bmsc\b|\bm\.sc?\.|\bmastere\b|\bbac\s*\+\s*5\b|\bdiplome d'ingenieur\b|\bmba\b")
        .unwrap()
});
static BACHELORS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bbachelor(?:'?s)?\b|\bbsc\b|\bb\.sc?\.|\blicence\b|\bbac\s*\+\s*3\b").unwrap()
});
static ASSOCIATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bassociate degree\b|\bassociate's\b|\bdut\b|\bbts\b|\bbac\s*\+\s*2\b").unwrap());
static BOOTCAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bbootcamp\b|\bcoding school\b").unwrap());

static CS_FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:computer science|informatique|informatics|software|computing)\b").unwrap()
});
static ENGINEERING_FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:engineering|ingenieur|ingenierie|genie)\b").unwrap());
static RELATED_FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:mathematics|mathematiques|physics|physique|statistics|statistiques|data|electronics|electronique|telecom)\b")
        .unwrap()
});
static UNRELATED_FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:business|marketing|law|droit|biology|biologie|history|histoire|arts|literature|litterature)\b")
        .unwrap()
});

static CERTIFICATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:aws certified[a-z ]*?|azure certified|gcp certified|google cloud certified|cka\b|ckad\b|scrum master|pmp\b|cissp\b|oracle certified)")
        .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegreeLevel {
    Bootcamp,
    Associate,
    Bachelors,
    Masters,
    Phd,
}

impl DegreeLevel {
    pub fn base_score(&self) -> f64 {
        match self {
            DegreeLevel::Phd => 1.0,
            DegreeLevel::Masters => 0.9,
            DegreeLevel::Bachelors => 0.8,
            DegreeLevel::Associate => 0.6,
            DegreeLevel::Bootcamp => 0.55,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationField {
    Cs,
    Engineering,
    Related,
    Unrelated,
    Unknown,
}

impl EducationField {
    /// Unrelated degrees do not count toward the score; an uncontexted
    /// degree gets the benefit of the doubt.
    fn relevant(&self) -> bool {
        !matches!(self, EducationField::Unrelated)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DegreeSignal {
    pub level: DegreeLevel,
    pub field: EducationField,
    pub evidence: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EducationSignal {
    pub degrees: Vec<DegreeSignal>,
    pub certifications: Vec<String>,
    pub education_score: f64,
}

/// Degrees by pattern family, field-tagged from the surrounding text;
/// the best relevant degree sets the score, certifications nudge it.
pub fn analyze(index: &TextIndex<'_>) -> EducationSignal {
    let folded = index.folded.as_str();

    let families: [(&Regex, DegreeLevel); 5] = [
        (&PHD_RE, DegreeLevel::Phd),
        (&MASTERS_RE, DegreeLevel::Masters),
        (&BACHELORS_RE, DegreeLevel::Bachelors),
        (&ASSOCIATE_RE, DegreeLevel::Associate),
        (&BOOTCAMP_RE, DegreeLevel::Bootcamp),
    ];

    let mut degrees = Vec::new();
    for (re, level) in families {
        for m in re.find_iter(folded) {
            let context = index.folded_context(m.start(), FIELD_CONTEXT_HALF);
            degrees.push(DegreeSignal {
                level,
                field: field_of(context),
                evidence: index.snippet_for_folded_offset(m.start()),
            });
        }
    }

    let certifications: Vec<String> = {
        let mut out: Vec<String> = Vec::new();
        for m in CERTIFICATION_RE.find_iter(folded) {
            let cert = m.as_str().trim().to_string();
            if !out.contains(&cert) {
                out.push(cert);
            }
        }
        out
    };

    let best = degrees
        .iter()
        .filter(|d| d.field.relevant())
        .map(|d| d.level)
        .max();

    let base = best.map(|level| level.base_score()).unwrap_or(0.5);
    let education_score = (base + certifications.len() as f64 * 0.05).clamp(0.0, 1.0);

    EducationSignal {
        degrees,
        certifications,
        education_score,
    }
}

fn field_of(context: &str) -> EducationField {
    if CS_FIELD_RE.is_match(context) {
        EducationField::Cs
    } else if ENGINEERING_FIELD_RE.is_match(context) {
        EducationField::Engineering
    } else if RELATED_FIELD_RE.is_match(context) {
        EducationField::Related
    } else if UNRELATED_FIELD_RE.is_match(context) {
        EducationField::Unrelated
    } else {
        EducationField::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{fold, normalize};

    fn education(raw: &str) -> EducationSignal {
        let canonical = normalize(raw);
        let folded = fold(&canonical);
        let index = TextIndex::new(&canonical, folded);
        analyze(&index)
    }

    #[test]
    fn ranks_the_best_relevant_degree() {
        let e = education("MSc Computer Science, 2016\nBachelor of Science in Physics, 2014");
        assert_eq!(e.degrees.len(), 2);
        assert_eq!(e.education_score, 0.9);
        let msc = e.degrees.iter().find(|d| d.level == DegreeLevel::Masters);
        assert_eq!(msc.unwrap().field, EducationField::Cs);
    }

    #[test]
    fn french_degrees_resolve() {
        let e = education("Diplôme d'ingénieur, Bac +5, génie logiciel");
        assert!(e.degrees.iter().any(|d| d.level == DegreeLevel::Masters));
        assert_eq!(e.education_score, 0.9);

        let e = education("Licence informatique, Université de Lyon");
        assert_eq!(e.education_score, 0.8);
        assert_eq!(e.degrees[0].field, EducationField::Cs);
    }

    #[test]
    fn unrelated_degrees_do_not_score() {
        let e = education("Master's degree in Marketing and Business");
        assert_eq!(e.degrees[0].field, EducationField::Unrelated);
        assert_eq!(e.education_score, 0.5);
    }

    #[test]
    fn no_degree_is_a_neutral_half() {
        let e = education("Self-taught, shipped a lot of software since forever.");
        assert!(e.degrees.is_empty());
        assert_eq!(e.education_score, 0.5);
    }

    #[test]
    fn certifications_nudge_the_score() {
        let e = education("BTS informatique. AWS Certified Solutions Architect. CKA.");
        assert_eq!(e.certifications.len(), 2);
        // associate 0.6 + 2 × 0.05
        assert!((e.education_score - 0.7).abs() < 1e-9);
    }

    #[test]
    fn bootcamp_counts_modestly() {
        let e = education("Completed a 12-week software bootcamp in 2022");
        assert_eq!(e.degrees[0].level, DegreeLevel::Bootcamp);
        assert!((e.education_score - 0.55).abs() < 1e-9);
    }
}
