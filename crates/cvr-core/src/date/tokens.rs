use std::collections::HashMap;
use std::sync::LazyLock;

/// Month token → 1-based month, EN + FR, full and short forms. Tokens
/// are matched against diacritic-folded, letters-only, lowercased text.
static MONTH_TOKENS: LazyLock<HashMap<&'static str, u32>> = LazyLock::new(|| {
    let table: &[(u32, &[&str])] = &[
        (1, &["jan", "janv", "janvier", "january"]),
        (2, &["feb", "february", "fev", "fevr", "fevrier"]),
        (3, &["mar", "mars", "march"]),
        (4, &["apr", "april", "avr", "avril"]),
        (5, &["may", "mai"]),
        (6, &["jun", "june", "juin"]),
        (7, &["jul", "july", "juil", "juillet"]),
        (8, &["aug", "august", "aou", "aout"]),
        (9, &["sep", "sept", "september", "septembre"]),
        (10, &["oct", "october", "octobre"]),
        (11, &["nov", "november", "novembre"]),
        (12, &["dec", "december", "decembre"]),
    ];

    let mut map = HashMap::new();
    for (month, tokens) in table {
        for token in *tokens {
            map.insert(*token, *month);
        }
    }
    map
});

/// Regex alternation over every month token, longest-first so full
/// names win over their short prefixes.
pub static MONTH_ALT: LazyLock<String> = LazyLock::new(|| {
    let mut tokens: Vec<&str> = MONTH_TOKENS.keys().copied().collect();
    tokens.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    tokens.join("|")
});

/// Locale-spanning "until now" phrases, in folded form. `présent`,
/// `été`-style accents are already stripped by the caller's fold.
pub const PRESENT_TOKENS: &[&str] = &[
    "present",
    "current",
    "actuellement",
    "actuel",
    "aujourd'hui",
    "a ce jour",
    "ce jour",
    "to date",
    "today",
    "en cours",
    "ongoing",
    "now",
    "maintenant",
];

pub static PRESENT_ALT: LazyLock<String> = LazyLock::new(|| {
    let mut tokens: Vec<&str> = PRESENT_TOKENS.to_vec();
    tokens.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    tokens.join("|")
});

/// Tokens that tag a role (or a lone month-year mention) as an
/// internship rather than professional experience, folded form.
pub const INTERNSHIP_TOKENS: &[&str] = &[
    "stage",
    "stagiaire",
    "internship",
    "intern",
    "trainee",
    "alternance",
    "apprentissage",
    "apprenti",
    "apprentie",
    "pfe",
    "sfe",
    "fin d'etudes",
];

pub static INTERNSHIP_ALT: LazyLock<String> = LazyLock::new(|| {
    let mut tokens: Vec<&str> = INTERNSHIP_TOKENS.to_vec();
    tokens.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    tokens.join("|")
});

/// Resolve a captured month token. Strips anything that is not a
/// letter, so `sept.` and `Févr` (post-fold `fevr`) both resolve.
pub fn month_from_token(token: &str) -> Option<u32> {
    let letters: String = token
        .chars()
        .filter(|c| c.is_alphabetic())
        .collect::<String>()
        .to_lowercase();
    MONTH_TOKENS.get(letters.as_str()).copied()
}

/// 4-digit years must land in `[1950, current_year + 1]`. 2-digit years
/// map into the 2000s when they could plausibly be recent (`<= current
/// year's last two digits + 1`), otherwise into the 1900s, and are then
/// revalidated against the same bounds.
pub fn normalize_year(token: &str, current_year: i32) -> Option<i32> {
    let value: i32 = token.parse().ok()?;
    let year = match token.len() {
        4 => value,
        2 => {
            if value <= current_year % 100 + 1 {
                2000 + value
            } else {
                1900 + value
            }
        }
        _ => return None,
    };
    (1950..=current_year + 1).contains(&year).then_some(year)
}
