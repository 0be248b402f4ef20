//! Parsing of human-formatted price strings into a plain number.

use partcat_core::{MinorUnitCorrection, NOT_AVAILABLE};

/// Currency and tax markers removed before parsing, matched case-insensitively.
const STRIP_TOKENS: [&str; 3] = ["€", "eur", "ttc"];

/// Turns page price text such as `"1.234,56 € TTC"` into `1234.56`.
///
/// Pure: no I/O, never fails. Anything that cannot be read as a number
/// becomes `0.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceNormalizer {
    correction: Option<MinorUnitCorrection>,
}

impl PriceNormalizer {
    #[must_use]
    pub fn new(correction: Option<MinorUnitCorrection>) -> Self {
        Self { correction }
    }

    /// Normalizer without the minor-unit correction.
    #[must_use]
    pub fn plain() -> Self {
        Self { correction: None }
    }

    #[must_use]
    pub fn normalize(&self, price_text: &str) -> f64 {
        let trimmed = price_text.trim();
        if trimmed.eq_ignore_ascii_case(NOT_AVAILABLE) {
            return 0.0;
        }

        let mut text = trimmed.to_lowercase();
        for token in STRIP_TOKENS {
            text = text.replace(token, "");
        }

        let has_comma = text.contains(',');
        let dot_count = text.matches('.').count();
        let text = if has_comma && dot_count > 0 {
            text.replace('.', "").replace(',', ".")
        } else if has_comma {
            text.replace(',', ".")
        } else if dot_count > 1 {
            text.replace('.', "")
        } else {
            text
        };

        let digits: String = text
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        let value = match digits.parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => return 0.0,
        };

        match self.correction {
            Some(correction)
                if value > correction.threshold && !trimmed.contains([',', '.']) =>
            {
                value / correction.divisor
            }
            _ => value,
        }
    }
}

impl Default for PriceNormalizer {
    /// Minor-unit correction enabled with its default threshold and divisor.
    fn default() -> Self {
        Self::new(Some(MinorUnitCorrection::default()))
    }
}

/// [`PriceNormalizer::default`] applied to `price_text`.
#[must_use]
pub fn normalize_price(price_text: &str) -> f64 {
    PriceNormalizer::default().normalize(price_text)
}

#[cfg(test)]
#[path = "price_test.rs"]
mod tests;
