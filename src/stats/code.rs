//! Ordering for barcode and outlet codes.

use std::cmp::Ordering;

/// A barcode or outlet code ordered numerically when it is all digits.
///
/// Numeric codes sort before non-numeric ones. Leading zeros do not change
/// the numeric position; equal numbers fall back to text order so "007" and
/// "7" stay distinct keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodeKey<'a>(pub &'a str);

impl<'a> CodeKey<'a> {
    pub fn as_str(&self) -> &'a str {
        self.0
    }

    fn digits(&self) -> Option<&'a str> {
        let code = self.0;
        if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let trimmed = code.trim_start_matches('0');
        Some(if trimmed.is_empty() { "0" } else { trimmed })
    }
}

impl Ord for CodeKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.digits(), other.digits()) {
            (Some(a), Some(b)) => a
                .len()
                .cmp(&b.len())
                .then_with(|| a.cmp(b))
                .then_with(|| self.0.cmp(other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(other.0),
        }
    }
}

impl PartialOrd for CodeKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(codes: &[&'static str]) -> Vec<&'static str> {
        let mut keys: Vec<CodeKey> = codes.iter().map(|c| CodeKey(*c)).collect();
        keys.sort();
        keys.into_iter().map(|k| k.as_str()).collect()
    }

    #[test]
    fn digit_codes_sort_numerically() {
        assert_eq!(sorted(&["10", "9", "100", "99"]), vec!["9", "10", "99", "100"]);
    }

    #[test]
    fn leading_zeros_keep_numeric_position() {
        assert_eq!(sorted(&["0779002", "779001", "8"]), vec!["8", "779001", "0779002"]);
        assert_eq!(sorted(&["7", "007", "0"]), vec!["0", "007", "7"]);
        assert_ne!(CodeKey("007"), CodeKey("7"));
    }

    #[test]
    fn text_codes_follow_numeric_ones() {
        assert_eq!(sorted(&["B2", "A10", "12", "3"]), vec!["3", "12", "A10", "B2"]);
    }
}
