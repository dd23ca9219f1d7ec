use serde::Serialize;
use strsim::damerau_levenshtein;

use crate::normalize::{fold, truncate_middle, SNIPPET_MAX_CHARS};
use crate::spec::{ProjectSpec, RoleSkill};

/// Normalized edit distance above this is not a match.
const FUZZY_THRESHOLD: f64 = 0.25;
/// Fuzzy pass only engages for terms of at least this many chars.
const FUZZY_MIN_TERM_LEN: usize = 4;
/// And never matches windows shorter than this.
const FUZZY_MIN_MATCH_LEN: usize = 3;

/// Evidence-carrying result for one required or preferred skill.
/// Invariant: `matched` implies at least one non-empty evidence line.
#[derive(Debug, Clone, Serialize)]
pub struct SkillMatch {
    pub term: String,
    pub weight: f64,
    pub matched: bool,
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeywordHit {
    pub term: String,
    pub matched: bool,
    pub evidence: Vec<String>,
}

/// An exact occurrence of a term, line-addressed so callers can test
/// membership in the experience section or a role block.
#[derive(Debug, Clone, Copy)]
pub struct Mention {
    pub line: usize,
    /// Byte offset into the folded text.
    pub folded_offset: usize,
}

/// Line-aligned canonical/folded view of one candidate's text, built
/// once per analysis and dropped on return. Never cache across
/// candidates: the contents are the candidate's lines.
pub struct TextIndex<'a> {
    pub canonical: &'a str,
    pub folded: String,
    lines: Vec<IndexedLine<'a>>,
}

struct IndexedLine<'a> {
    canonical: &'a str,
    folded_start: usize,
    folded_end: usize,
}

impl<'a> TextIndex<'a> {
    pub fn new(canonical: &'a str, folded: String) -> Self {
        let mut lines = Vec::new();
        let canonical_lines: Vec<&str> = canonical.split('\n').collect();
        let mut start = 0;
        for (i, folded_line) in folded.split('\n').enumerate() {
            lines.push(IndexedLine {
                canonical: canonical_lines.get(i).copied().unwrap_or(""),
                folded_start: start,
                folded_end: start + folded_line.len(),
            });
            start += folded_line.len() + 1;
        }
        Self {
            canonical,
            folded,
            lines,
        }
    }

    fn folded_line(&self, i: usize) -> &str {
        let line = &self.lines[i];
        &self.folded[line.folded_start..line.folded_end]
    }

    fn line_of_folded_offset(&self, offset: usize) -> usize {
        match self
            .lines
            .binary_search_by(|line| line.folded_start.cmp(&offset))
        {
            Ok(i) => i,
            Err(0) => 0,
            Err(i) => i - 1,
        }
    }

    /// Trimmed, length-capped evidence snippet for a line.
    pub fn line_snippet(&self, i: usize) -> String {
        truncate_middle(self.lines[i].canonical.trim(), SNIPPET_MAX_CHARS)
    }

    /// Evidence snippet for the line containing a folded-text offset.
    pub fn snippet_for_folded_offset(&self, offset: usize) -> String {
        self.line_snippet(self.line_of_folded_offset(offset))
    }

    /// ±`half` chars of folded context around an offset.
    pub fn folded_context(&self, offset: usize, half: usize) -> &str {
        let mut start = offset.saturating_sub(half);
        while start > 0 && !self.folded.is_char_boundary(start) {
            start -= 1;
        }
        let mut end = (offset + half).min(self.folded.len());
        while end < self.folded.len() && !self.folded.is_char_boundary(end) {
            end += 1;
        }
        &self.folded[start..end]
    }

    /// Every exact occurrence of any of the terms.
    pub fn mentions(&self, terms: &[String]) -> Vec<Mention> {
        let mut out = Vec::new();
        for term in terms {
            let folded_term = fold(term);
            if folded_term.is_empty() {
                continue;
            }
            let boundary = needs_boundaries(&folded_term);
            for (offset, _) in self.folded.match_indices(&folded_term) {
                if boundary && !has_word_boundaries(&self.folded, offset, folded_term.len()) {
                    continue;
                }
                out.push(Mention {
                    line: self.line_of_folded_offset(offset),
                    folded_offset: offset,
                });
            }
        }
        out.sort_by_key(|m| m.folded_offset);
        out.dedup_by_key(|m| m.folded_offset);
        out
    }

    fn exact_match(&self, folded_term: &str) -> Option<usize> {
        let boundary = needs_boundaries(folded_term);
        for (offset, _) in self.folded.match_indices(folded_term) {
            if boundary && !has_word_boundaries(&self.folded, offset, folded_term.len()) {
                continue;
            }
            return Some(offset);
        }
        None
    }

    /// Best fuzzy line for a term: a term-length window slides over
    /// each non-empty folded line, scored by normalized
    /// Damerau-Levenshtein distance, position within the line ignored.
    fn fuzzy_match(&self, folded_term: &str) -> Option<(usize, f64)> {
        let term_chars: Vec<char> = folded_term.chars().collect();
        if term_chars.len() < FUZZY_MIN_TERM_LEN {
            return None;
        }

        let mut best: Option<(usize, f64)> = None;
        for i in 0..self.lines.len() {
            let line = self.folded_line(i);
            if line.trim().is_empty() {
                continue;
            }
            let Some(score) = best_window_score(folded_term, &term_chars, line) else {
                continue;
            };
            if score > FUZZY_THRESHOLD {
                continue;
            }
            match best {
                Some((_, best_score)) if best_score <= score => {}
                _ => best = Some((i, score)),
            }
        }
        best
    }
}

/// Short all-alphanumeric terms ("go", "c", "r") require word
/// boundaries so "go" cannot match inside "google".
fn needs_boundaries(folded_term: &str) -> bool {
    folded_term.chars().count() <= 5 && folded_term.chars().all(|c| c.is_alphanumeric())
}

fn has_word_boundaries(folded: &str, offset: usize, len: usize) -> bool {
    let before = folded[..offset].chars().next_back();
    let after = folded[offset + len..].chars().next();
    !before.is_some_and(|c| c.is_alphanumeric()) && !after.is_some_and(|c| c.is_alphanumeric())
}

fn best_window_score(folded_term: &str, term_chars: &[char], line: &str) -> Option<f64> {
    let line_chars: Vec<char> = line.chars().collect();
    let term_len = term_chars.len();

    if line_chars.len() < FUZZY_MIN_MATCH_LEN {
        return None;
    }
    if line_chars.len() <= term_len {
        let window: String = line_chars.iter().collect();
        return Some(damerau_levenshtein(folded_term, &window) as f64 / term_len as f64);
    }

    let mut best = f64::MAX;
    for start in 0..=(line_chars.len() - term_len) {
        let window: String = line_chars[start..start + term_len].iter().collect();
        let score = damerau_levenshtein(folded_term, &window) as f64 / term_len as f64;
        if score < best {
            best = score;
            if best == 0.0 {
                break;
            }
        }
    }
    Some(best)
}

/// Two-pass search shared by skills and keywords: exact first across
/// every term, then fuzzy. Returns the evidence line.
fn match_terms(index: &TextIndex<'_>, terms: &[String]) -> Option<String> {
    for term in terms {
        let folded_term = fold(term);
        if folded_term.is_empty() {
            continue;
        }
        if let Some(offset) = index.exact_match(&folded_term) {
            let line = index.line_of_folded_offset(offset);
            return Some(index.line_snippet(line));
        }
    }

    let mut best: Option<(usize, f64)> = None;
    for term in terms {
        let folded_term = fold(term);
        if let Some((line, score)) = index.fuzzy_match(&folded_term) {
            match best {
                Some((_, best_score)) if best_score <= score => {}
                _ => best = Some((line, score)),
            }
        }
    }
    best.map(|(line, _)| index.line_snippet(line))
}

/// Match one role skill (plus its project aliases) against the text.
pub fn match_skill(index: &TextIndex<'_>, skill: &RoleSkill, project: &ProjectSpec) -> SkillMatch {
    let terms = project.terms_for(&skill.skill);
    match match_terms(index, &terms) {
        Some(evidence) => SkillMatch {
            term: skill.skill.clone(),
            weight: skill.effective_weight(),
            matched: true,
            evidence: vec![evidence],
        },
        None => SkillMatch {
            term: skill.skill.clone(),
            weight: skill.effective_weight(),
            matched: false,
            evidence: Vec::new(),
        },
    }
}

pub fn match_keyword(index: &TextIndex<'_>, keyword: &str) -> KeywordHit {
    let terms = vec![keyword.to_string()];
    match match_terms(index, &terms) {
        Some(evidence) => KeywordHit {
            term: keyword.to_string(),
            matched: true,
            evidence: vec![evidence],
        },
        None => KeywordHit {
            term: keyword.to_string(),
            matched: false,
            evidence: Vec::new(),
        },
    }
}

/// Boundary-aware exact containment of any term in a folded haystack
/// (role blocks, headings). No fuzzy pass: a role either names the
/// skill or it does not.
pub fn any_term_in(folded_haystack: &str, terms: &[String]) -> bool {
    terms.iter().any(|term| {
        let folded_term = fold(term);
        if folded_term.is_empty() {
            return false;
        }
        let boundary = needs_boundaries(&folded_term);
        folded_haystack
            .match_indices(&folded_term)
            .any(|(offset, _)| {
                !boundary || has_word_boundaries(folded_haystack, offset, folded_term.len())
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{fold, normalize};

    fn index(text: &str) -> (String, String) {
        let canonical = normalize(text);
        let folded = fold(&canonical);
        (canonical, folded)
    }

    fn skill(name: &str) -> RoleSkill {
        RoleSkill::new(name, 1.0)
    }

    #[test]
    fn short_terms_respect_word_boundaries() {
        let (canonical, folded) = index("React, Node.js, Go, TypeScript");
        let idx = TextIndex::new(&canonical, folded);

        let m = match_skill(&idx, &skill("go"), &ProjectSpec::default());
        assert!(m.matched);
        assert_eq!(m.evidence[0], "React, Node.js, Go, TypeScript");

        let (canonical, folded) = index("Googler since 2019, google scale");
        let idx = TextIndex::new(&canonical, folded);
        let m = match_skill(&idx, &skill("go"), &ProjectSpec::default());
        assert!(!m.matched);
        assert!(m.evidence.is_empty());
    }

    #[test]
    fn aliases_extend_the_matched_set() {
        let (canonical, folded) = index("Shipped golang microservices.");
        let idx = TextIndex::new(&canonical, folded);

        let bare = match_skill(&idx, &skill("go"), &ProjectSpec::default());
        assert!(!bare.matched);

        let mut project = ProjectSpec::default();
        project
            .skill_aliases
            .insert("go".into(), vec!["golang".into()]);
        let aliased = match_skill(&idx, &skill("go"), &project);
        assert!(aliased.matched);
        assert_eq!(aliased.evidence[0], "Shipped golang microservices.");
    }

    #[test]
    fn long_terms_match_inside_words_without_boundaries() {
        let (canonical, folded) = index("Senior Kubernetes-Administrator");
        let idx = TextIndex::new(&canonical, folded);
        let m = match_skill(&idx, &skill("kubernetes"), &ProjectSpec::default());
        assert!(m.matched);
    }

    #[test]
    fn fuzzy_pass_tolerates_ocr_typos() {
        let (canonical, folded) = index("Deployed on Kuberntes clusters");
        let idx = TextIndex::new(&canonical, folded);
        let m = match_skill(&idx, &skill("kubernetes"), &ProjectSpec::default());
        assert!(m.matched);
        assert_eq!(m.evidence[0], "Deployed on Kuberntes clusters");
    }

    #[test]
    fn fuzzy_pass_rejects_distant_terms_and_short_terms() {
        let (canonical, folded) = index("Worked with puppet and chef");
        let idx = TextIndex::new(&canonical, folded);
        assert!(!match_skill(&idx, &skill("kubernetes"), &ProjectSpec::default()).matched);
        // below the 4-char fuzzy floor, no fuzzy rescue
        assert!(!match_skill(&idx, &skill("php"), &ProjectSpec::default()).matched);
    }

    #[test]
    fn matched_evidence_is_a_line_of_the_text() {
        let (canonical, folded) = index("intro\nBuilt GraphQL APIs in production\noutro");
        let idx = TextIndex::new(&canonical, folded);
        let m = match_skill(&idx, &skill("graphql"), &ProjectSpec::default());
        assert!(m.matched);
        assert!(canonical.contains(&m.evidence[0]));
    }

    #[test]
    fn keyword_hits_use_the_same_passes() {
        let (canonical, folded) = index("Scaled a B2B SaaS platform");
        let idx = TextIndex::new(&canonical, folded);
        assert!(match_keyword(&idx, "saas").matched);
        assert!(!match_keyword(&idx, "fintech").matched);
    }

    #[test]
    fn mentions_count_every_occurrence_line_addressed() {
        let (canonical, folded) = index("rust services\nmore rust\nno match here\ntrust me");
        let idx = TextIndex::new(&canonical, folded);
        let mentions = idx.mentions(&["rust".to_string()]);
        // "trust" must not count: boundary rule
        assert_eq!(mentions.len(), 2);
        assert_eq!(mentions[0].line, 0);
        assert_eq!(mentions[1].line, 1);
    }

    #[test]
    fn any_term_in_checks_role_haystacks() {
        let haystack = fold("Lead Developer\nReact and Go, migrated the monolith");
        assert!(any_term_in(&haystack, &["go".to_string()]));
        assert!(!any_term_in(&haystack, &["golang".to_string()]));
        assert!(any_term_in(&haystack, &["react".to_string()]));
    }

    #[test]
    fn diacritics_fold_before_matching() {
        let (canonical, folded) = index("Développement métier en Éthique");
        let idx = TextIndex::new(&canonical, folded);
        assert!(match_keyword(&idx, "développement").matched);
        assert!(match_keyword(&idx, "developpement").matched);
    }
}
