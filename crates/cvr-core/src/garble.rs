use serde::Serialize;

/// Token-level ratio above which the whole text reads as garbled.
const SINGLE_LETTER_RATIO: f64 = 0.25;
/// Per-line rule: lines this long made of mostly single letters.
const LINE_MIN_TOKENS: usize = 8;
const LINE_SINGLE_LETTER_SHARE: f64 = 0.6;
const GARBLED_LINE_QUORUM: usize = 2;

/// Whether the caller should re-extract through OCR, with the
/// triggering rule spelled out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OcrDecision {
    pub needs_ocr: bool,
    pub reason: String,
}

/// Deterministic garble predicate over canonical text. PDF extractors
/// that lose kerning emit "D é v e l o p p e u r"-style output: a high
/// share of single-letter tokens overall, or a couple of long lines
/// that are almost only single letters.
pub fn looks_garbled(canonical: &str) -> bool {
    assess(canonical).needs_ocr
}

pub fn assess(canonical: &str) -> OcrDecision {
    let tokens: Vec<&str> = canonical.split_whitespace().collect();
    if !tokens.is_empty() {
        let single = tokens.iter().filter(|t| is_single_letter(t)).count();
        let ratio = single as f64 / tokens.len() as f64;
        if ratio > SINGLE_LETTER_RATIO {
            return OcrDecision {
                needs_ocr: true,
                reason: format!(
                    "single-letter tokens make up {:.0}% of the text",
                    ratio * 100.0
                ),
            };
        }
    }

    let mut garbled_lines = 0usize;
    for line in canonical.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < LINE_MIN_TOKENS {
            continue;
        }
        let single = tokens.iter().filter(|t| is_single_letter(t)).count();
        if single as f64 / tokens.len() as f64 > LINE_SINGLE_LETTER_SHARE {
            garbled_lines += 1;
            if garbled_lines >= GARBLED_LINE_QUORUM {
                return OcrDecision {
                    needs_ocr: true,
                    reason: "multiple lines consist mostly of single-letter tokens".to_string(),
                };
            }
        }
    }

    OcrDecision {
        needs_ocr: false,
        reason: "text extraction looks usable".to_string(),
    }
}

fn is_single_letter(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic())
}
