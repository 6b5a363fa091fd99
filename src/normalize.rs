//! Query variant generation for compound names.
//!
//! Raw compound names from supplier catalogs carry purity annotations,
//! bracketed qualifiers, and inconsistent separators that PubChem's name
//! index does not know about. This module derives a small, ordered set of
//! cleaned-up query variants from a raw name. The first variant is always
//! the most faithful to the input; later variants strip progressively more.

use std::sync::LazyLock;

use regex::Regex;

/// Maximum number of query variants produced per name.
pub const MAX_VARIANTS: usize = 5;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r"\s+").unwrap()
});

static PARENTHETICAL: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r"\s*\([^)]*\)").unwrap()
});

static BRACKETED: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r"\s*\[[^\]]*\]").unwrap()
});

/// Separators that supplier names use interchangeably with spaces.
const SEPARATORS: [char; 5] = ['-', '_', '/', ',', ';'];

/// Greek letters spelled out the way PubChem synonyms spell them.
const GREEK: [(char, &str); 14] = [
    ('α', "alpha"),
    ('β', "beta"),
    ('γ', "gamma"),
    ('δ', "delta"),
    ('ε', "epsilon"),
    ('ω', "omega"),
    ('μ', "mu"),
    ('Α', "Alpha"),
    ('Β', "Beta"),
    ('Γ', "Gamma"),
    ('Δ', "Delta"),
    ('Ε', "Epsilon"),
    ('Ω', "Omega"),
    ('Μ', "Mu"),
];

/// Produces the ordered list of query variants for a raw compound name.
///
/// The list is deduplicated case-insensitively, capped at [`MAX_VARIANTS`],
/// and ordered from most to least faithful to the input. An empty or
/// whitespace-only name yields an empty list; callers treat that as an
/// invalid input and skip backend traffic entirely.
#[must_use]
pub fn variants(name: &str) -> Vec<String> {
    let base = WHITESPACE.replace_all(name.trim(), " ").into_owned();
    if base.len() < 2 {
        return Vec::new();
    }

    let mut out: Vec<String> = Vec::new();
    let mut seen: Vec<String> = Vec::new();

    let mut push = |candidate: String, out: &mut Vec<String>, seen: &mut Vec<String>| {
        let cleaned = WHITESPACE.replace_all(candidate.trim(), " ").into_owned();
        if cleaned.len() < 2 || out.len() >= MAX_VARIANTS {
            return;
        }
        let key = cleaned.to_lowercase();
        if seen.contains(&key) {
            return;
        }
        seen.push(key);
        out.push(cleaned);
    };

    push(base.clone(), &mut out, &mut seen);
    push(
        PARENTHETICAL.replace_all(&base, "").into_owned(),
        &mut out,
        &mut seen,
    );
    push(
        BRACKETED.replace_all(&base, "").into_owned(),
        &mut out,
        &mut seen,
    );

    for sep in SEPARATORS {
        if base.contains(sep) {
            push(base.replace(sep, " "), &mut out, &mut seen);
            push(base.replace(sep, ""), &mut out, &mut seen);
        }
    }

    if base.chars().any(|c| GREEK.iter().any(|(g, _)| *g == c)) {
        let mut spelled = base.clone();
        for (letter, latin) in GREEK {
            spelled = spelled.replace(letter, latin);
        }
        push(spelled, &mut out, &mut seen);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants_plain_name_yields_single_variant() {
        let v = variants("curcumin");
        assert_eq!(v, vec!["curcumin"]);
    }

    #[test]
    fn test_variants_collapses_whitespace() {
        let v = variants("  caffeic   acid  ");
        assert_eq!(v[0], "caffeic acid");
    }

    #[test]
    fn test_variants_strips_parenthetical_segment() {
        let v = variants("Curcumin (95%)");
        assert!(v.contains(&"Curcumin (95%)".to_string()));
        assert!(v.contains(&"Curcumin".to_string()));
    }

    #[test]
    fn test_variants_strips_bracketed_segment() {
        let v = variants("quercetin [USP grade]");
        assert!(v.contains(&"quercetin".to_string()));
    }

    #[test]
    fn test_variants_separator_transforms() {
        let v = variants("epigallocatechin-gallate");
        assert!(v.contains(&"epigallocatechin gallate".to_string()));
        assert!(v.contains(&"epigallocatechingallate".to_string()));
    }

    #[test]
    fn test_variants_greek_transliteration() {
        let v = variants("α-tocopherol");
        assert!(v.iter().any(|s| s.contains("alpha")));
    }

    #[test]
    fn test_variants_empty_input_yields_no_variants() {
        assert!(variants("").is_empty());
        assert!(variants("   ").is_empty());
        assert!(variants("x").is_empty());
    }

    #[test]
    fn test_variants_capped_at_maximum() {
        // Plenty of separators to overflow the cap.
        let v = variants("a-b_c/d,e;f (x) [y]");
        assert!(v.len() <= MAX_VARIANTS);
    }

    #[test]
    fn test_variants_case_insensitive_dedup() {
        let v = variants("Curcumin (pure) curcumin");
        let lowered: Vec<String> = v.iter().map(|s| s.to_lowercase()).collect();
        let mut unique = lowered.clone();
        unique.dedup();
        assert_eq!(lowered.len(), unique.len());
    }

    #[test]
    fn test_variants_deterministic() {
        let a = variants("Curcumin (95%)");
        let b = variants("Curcumin (95%)");
        assert_eq!(a, b);
    }

    #[test]
    fn test_variants_first_is_most_faithful() {
        let v = variants("Curcumin (95%)");
        assert_eq!(v[0], "Curcumin (95%)");
    }
}
