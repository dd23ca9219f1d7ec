use serde::Serialize;

use crate::matching::SkillMatch;
use crate::roles::Segmentation;

/// Char proportion above which the extraction is considered garbled.
const GARBLE_CHAR_RATIO: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityBand {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextExtraction {
    Good,
    Partial,
    Poor,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParseQuality {
    pub overall: QualityBand,
    pub confidence: f64,
    pub text_extraction: TextExtraction,
    pub dates_parsed: usize,
    pub experience_section_found: bool,
    pub skills_matched: usize,
    pub issues: Vec<String>,
}

/// Self-assessment of how much the rest of the analysis can be
/// trusted: short or garbled text, missing dates, a missing experience
/// section and unmatched skills all lower the confidence.
pub fn analyze(
    canonical: &str,
    seg: &Segmentation,
    must_have: &[SkillMatch],
    nice_to_have: &[SkillMatch],
) -> ParseQuality {
    let mut confidence: f64 = 0.5;
    let mut issues = Vec::new();

    let char_count = canonical.chars().count();
    if char_count < 200 {
        confidence -= 0.2;
        issues.push("very little text extracted".to_string());
    } else if char_count < 1000 {
        confidence -= 0.1;
    } else if char_count > 3000 {
        confidence += 0.1;
    }

    let garbled = char_garble_ratio(canonical) > GARBLE_CHAR_RATIO;
    if garbled {
        confidence -= 0.2;
        issues.push("text contains a high share of non-text characters".to_string());
    }

    let dates_parsed = seg.text_intervals.len();
    if dates_parsed == 0 {
        confidence -= 0.15;
        issues.push("no date intervals parsed".to_string());
    } else if dates_parsed >= 2 {
        confidence += 0.1;
    }

    if seg.section_found {
        confidence += 0.1;
    } else {
        confidence -= 0.1;
        issues.push("experience section not located".to_string());
    }

    let total_skills = must_have.len() + nice_to_have.len();
    let skills_matched = must_have
        .iter()
        .chain(nice_to_have)
        .filter(|m| m.matched)
        .count();
    if total_skills > 0 {
        let ratio = skills_matched as f64 / total_skills as f64;
        if ratio >= 0.5 {
            confidence += 0.1;
        } else if skills_matched == 0 {
            confidence -= 0.1;
            issues.push("no required skills matched".to_string());
        }
    }

    let confidence = confidence.clamp(0.0, 1.0);
    let overall = if confidence >= 0.7 {
        QualityBand::High
    } else if confidence >= 0.4 {
        QualityBand::Medium
    } else {
        QualityBand::Low
    };

    let text_extraction = if char_count < 200 || garbled {
        TextExtraction::Poor
    } else if char_count >= 1000 {
        TextExtraction::Good
    } else {
        TextExtraction::Partial
    };

    ParseQuality {
        overall,
        confidence,
        text_extraction,
        dates_parsed,
        experience_section_found: seg.section_found,
        skills_matched,
        issues,
    }
}

/// Proportion of non-whitespace chars outside the ASCII/Latin/Arabic
/// repertoire a resume extraction should produce.
fn char_garble_ratio(canonical: &str) -> f64 {
    let mut total = 0usize;
    let mut garbled = 0usize;
    for c in canonical.chars().filter(|c| !c.is_whitespace()) {
        total += 1;
        let legitimate_script = c.is_ascii()
            || (c.is_alphabetic() && (c as u32) < 0x250)
            || is_arabic(c);
        let punctuation = matches!(c, '–' | '—' | '…' | '’' | '‘' | '“' | '”' | '€' | '°' | '•');
        if !legitimate_script && !punctuation {
            garbled += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        garbled as f64 / total as f64
    }
}

// Arabic, Arabic Supplement and the Arabic presentation forms PDF
// extractors commonly emit.
fn is_arabic(c: char) -> bool {
    let cp = c as u32;
    (0x0600..=0x06FF).contains(&cp)
        || (0x0750..=0x077F).contains(&cp)
        || (0x08A0..=0x08FF).contains(&cp)
        || (0xFB50..=0xFDFF).contains(&cp)
        || (0xFE70..=0xFEFF).contains(&cp)
}
