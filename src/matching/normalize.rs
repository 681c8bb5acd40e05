// src/matching/normalize.rs - Script-aware name normalization
//!
//! Names are compared after canonicalization. Text with any Arabic-block code
//! point takes the Persian/Arabic path (diacritics dropped, letter variants
//! unified); everything else takes the Latin path (accents, punctuation and
//! generational suffixes removed). Text left with no Arabic-script letters
//! after the first path also goes through the second. Both paths lowercase
//! and collapse whitespace.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Letter variants unified before comparison. Zero-width non-joiner becomes a
/// space, zero-width joiner is dropped, lone hamza is removed.
pub const PERSIAN_ARABIC_SUBSTITUTIONS: [(char, &str); 12] = [
    ('\u{06A9}', "\u{0643}"), // keheh -> kaf
    ('\u{06CC}', "\u{064A}"), // farsi yeh -> yeh
    ('\u{0621}', ""),         // hamza
    ('\u{0623}', "\u{0627}"), // alef with hamza above
    ('\u{0625}', "\u{0627}"), // alef with hamza below
    ('\u{0622}', "\u{0627}"), // alef with madda
    ('\u{0629}', "\u{0647}"), // teh marbuta -> heh
    ('\u{06C0}', "\u{0647}"), // heh with yeh above -> heh
    ('\u{0624}', "\u{0648}"), // waw with hamza -> waw
    ('\u{0626}', "\u{064A}"), // yeh with hamza -> yeh
    ('\u{200C}', " "),
    ('\u{200D}', ""),
];

static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("punctuation pattern is valid"));

static GENERATIONAL_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(jr|sr|ii|iii|iv)\b").expect("suffix pattern is valid"));

/// First/middle/last tokens of a normalized name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NameParts {
    pub first: String,
    pub middle: String,
    pub last: String,
    pub full: String,
}

fn is_arabic_script(c: char) -> bool {
    matches!(c,
        '\u{0600}'..='\u{06FF}'
        | '\u{0750}'..='\u{077F}'
        | '\u{08A0}'..='\u{08FF}'
        | '\u{FB50}'..='\u{FDFF}'
        | '\u{FE70}'..='\u{FEFF}')
}

fn is_arabic_diacritic(c: char) -> bool {
    matches!(c, '\u{064B}'..='\u{065F}' | '\u{0670}' | '\u{06D6}'..='\u{06ED}')
}

fn is_latin_combining_mark(c: char) -> bool {
    ('\u{0300}'..='\u{036F}').contains(&c)
}

pub fn contains_arabic_script(text: &str) -> bool {
    text.chars().any(is_arabic_script)
}

fn substitute_persian_arabic(c: char, out: &mut String) {
    match PERSIAN_ARABIC_SUBSTITUTIONS.iter().find(|(from, _)| *from == c) {
        Some((_, to)) => out.push_str(to),
        None => out.push(c),
    }
}

fn normalize_persian_arabic(lowered: &str) -> String {
    let mut normalized = String::with_capacity(lowered.len());
    for c in lowered.chars().filter(|c| !is_arabic_diacritic(*c)) {
        substitute_persian_arabic(c, &mut normalized);
    }
    normalized
}

fn normalize_latin(lowered: &str) -> String {
    let stripped: String = lowered
        .nfd()
        .filter(|c| !is_latin_combining_mark(*c))
        .collect();
    let without_punctuation = PUNCTUATION.replace_all(&stripped, "");
    GENERATIONAL_SUFFIX
        .replace_all(&without_punctuation, "")
        .into_owned()
}

/// Canonical form of a name for comparison. Total over all inputs; the empty
/// string normalizes to itself.
pub fn normalize_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let normalized = if contains_arabic_script(&lowered) {
        let persian = normalize_persian_arabic(&lowered);
        // stray marks or hamza on an otherwise Latin name
        if contains_arabic_script(&persian) {
            persian
        } else {
            normalize_latin(&persian)
        }
    } else {
        normalize_latin(&lowered)
    };
    normalized.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits a name into parts after normalization. A single-token name yields
/// the same token as both first and last.
pub fn extract_name_parts(name: &str) -> NameParts {
    let full = normalize_name(name);
    let tokens: Vec<&str> = full.split(' ').filter(|t| !t.is_empty()).collect();

    let first = tokens.first().copied().unwrap_or_default().to_string();
    let last = tokens.last().copied().unwrap_or_default().to_string();
    let middle = if tokens.len() > 2 {
        tokens[1..tokens.len() - 1].join(" ")
    } else {
        String::new()
    };

    NameParts {
        first,
        middle,
        last,
        full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin_normalization() {
        assert_eq!(normalize_name("  José   García "), "jose garcia");
        assert_eq!(normalize_name("O'Brien-Smith"), "obriensmith");
        assert_eq!(normalize_name("Martin Luther King Jr."), "martin luther king");
        assert_eq!(normalize_name("Henry VIII"), "henry viii");
        assert_eq!(normalize_name("John Smith III"), "john smith");
        assert_eq!(normalize_name("Junior Srinivasan"), "junior srinivasan");
    }

    #[test]
    fn test_persian_diacritics_are_ignored() {
        assert_eq!(normalize_name("محمد"), normalize_name("محمّد"));
        assert_eq!(normalize_name("مُحَمَّد"), "محمد");
    }

    #[test]
    fn test_persian_letter_variants_unify() {
        // farsi yeh / arabic yeh and keheh / kaf
        assert_eq!(normalize_name("علی"), normalize_name("علي"));
        assert_eq!(normalize_name("کریم"), normalize_name("كريم"));
        // alef variants
        assert_eq!(normalize_name("آمنه"), normalize_name("امنه"));
        assert_eq!(normalize_name("أحمد"), "احمد");
        // teh marbuta
        assert_eq!(normalize_name("فاطمة"), normalize_name("فاطمه"));
    }

    #[test]
    fn test_zero_width_non_joiner_becomes_space() {
        assert_eq!(normalize_name("عبد\u{200C}الله"), "عبد الله");
        assert_eq!(normalize_name("عبد\u{200D}الله"), "عبدالله");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let samples = [
            "José García Jr.",
            "  Mary-Ann   O'Neil ",
            "محمّد امیری",
            "عبد\u{200C}الله",
            "Ünal Şahin",
            "",
            "III",
            "Jos\u{e9}\u{0621}",
            "Ren\u{e9}e\u{064B}",
            "O'Neil\u{0670}",
            "José محمّد",
        ];
        for sample in samples {
            let once = normalize_name(sample);
            assert_eq!(normalize_name(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_stray_arabic_marks_on_latin_name() {
        assert_eq!(normalize_name("Jos\u{e9}\u{0621}"), "jose");
        assert_eq!(normalize_name("O'Neil\u{0670} Jr."), "oneil");
        assert_eq!(normalize_name("Ren\u{e9}e\u{064B}"), normalize_name("Renee"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("   "), "");
        assert_eq!(extract_name_parts(""), NameParts::default());
    }

    #[test]
    fn test_extract_name_parts() {
        let parts = extract_name_parts("John Ronald Reuel Tolkien");
        assert_eq!(parts.first, "john");
        assert_eq!(parts.middle, "ronald reuel");
        assert_eq!(parts.last, "tolkien");
        assert_eq!(parts.full, "john ronald reuel tolkien");

        let two = extract_name_parts("Mohammad Amiri");
        assert_eq!(two.first, "mohammad");
        assert_eq!(two.middle, "");
        assert_eq!(two.last, "amiri");
    }

    #[test]
    fn test_single_token_name_is_first_and_last() {
        let parts = extract_name_parts("Cher");
        assert_eq!(parts.first, "cher");
        assert_eq!(parts.last, "cher");
        assert_eq!(parts.middle, "");
        assert_eq!(parts.full, "cher");
    }
}
