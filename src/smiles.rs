//! SMILES plausibility validation.
//!
//! A cheap structural check applied to every candidate identifier before it
//! is accepted or cached. This is not a full SMILES grammar; it rejects the
//! junk the backend occasionally returns (empty strings, prose error
//! messages, truncated fragments) without pulling in a chemistry toolkit.

/// Returns true when `smiles` looks like a plausible SMILES string.
///
/// Rules: at least 3 characters, alphabet restricted to ASCII letters,
/// digits and `()[]@+-=#/\.`, and parentheses / square brackets each
/// individually balanced.
#[must_use]
pub fn is_valid_smiles(smiles: &str) -> bool {
    if smiles.len() < 3 {
        return false;
    }

    let mut paren_depth: i32 = 0;
    let mut bracket_depth: i32 = 0;

    for c in smiles.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '@' | '+' | '-' | '=' | '#' | '/' | '\\'
            | '.' => {}
            '(' => paren_depth += 1,
            ')' => {
                paren_depth -= 1;
                if paren_depth < 0 {
                    return false;
                }
            }
            '[' => bracket_depth += 1,
            ']' => {
                bracket_depth -= 1;
                if bracket_depth < 0 {
                    return false;
                }
            }
            _ => return false,
        }
    }

    paren_depth == 0 && bracket_depth == 0
}
