//! Three-stage repricing: markup, fixed surcharge, then tax with a ceiling.
//!
//! All arithmetic runs on [`Decimal`] so the final ceiling is applied to the
//! exact decimal amount rather than to a binary floating-point neighbour of it.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::PricingError;
use crate::products::{PricedRecord, RawProductRecord};

/// Operator-supplied repricing coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepricingParameters {
    markup_coefficient: Decimal,
    fixed_surcharge: Decimal,
    tax_coefficient: Decimal,
}

impl RepricingParameters {
    /// Validates and builds a parameter set.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::OutOfRange`] if either coefficient is below
    /// `1` or the surcharge is negative.
    pub fn new(
        markup_coefficient: Decimal,
        fixed_surcharge: Decimal,
        tax_coefficient: Decimal,
    ) -> Result<Self, PricingError> {
        check_min("markup coefficient", markup_coefficient, Decimal::ONE)?;
        check_min("fixed surcharge", fixed_surcharge, Decimal::ZERO)?;
        check_min("tax coefficient", tax_coefficient, Decimal::ONE)?;
        Ok(Self {
            markup_coefficient,
            fixed_surcharge,
            tax_coefficient,
        })
    }

    #[must_use]
    pub fn markup_coefficient(&self) -> Decimal {
        self.markup_coefficient
    }

    #[must_use]
    pub fn fixed_surcharge(&self) -> Decimal {
        self.fixed_surcharge
    }

    #[must_use]
    pub fn tax_coefficient(&self) -> Decimal {
        self.tax_coefficient
    }
}

impl Default for RepricingParameters {
    /// 60 % gross margin, 20.00 labour charge, 20 % VAT.
    fn default() -> Self {
        Self {
            markup_coefficient: Decimal::new(160, 2),
            fixed_surcharge: Decimal::new(2000, 2),
            tax_coefficient: Decimal::new(120, 2),
        }
    }
}

fn check_min(name: &'static str, value: Decimal, min: Decimal) -> Result<(), PricingError> {
    if value < min {
        return Err(PricingError::OutOfRange { name, min, value });
    }
    Ok(())
}

/// Display convention for price cells, e.g. `"1234,50 €"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceFormat {
    pub decimal_separator: char,
    /// Appended verbatim after the amount, including any leading space.
    pub currency_suffix: String,
}

impl Default for PriceFormat {
    fn default() -> Self {
        Self {
            decimal_separator: ',',
            currency_suffix: " €".to_owned(),
        }
    }
}

impl PriceFormat {
    /// Formats `amount` with exactly two fractional digits.
    #[must_use]
    pub fn format(&self, amount: Decimal) -> String {
        let fixed = format!("{:.2}", round_cents(amount));
        let localized: String = fixed
            .chars()
            .map(|c| if c == '.' { self.decimal_separator } else { c })
            .collect();
        format!("{localized}{}", self.currency_suffix)
    }
}

/// Intermediate amounts of one repricing, before formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBreakdown {
    pub supplier_ht: Decimal,
    pub margin_ht: Decimal,
    pub intermediate_ht: Decimal,
    /// Always a whole number.
    pub client_ttc: Decimal,
}

impl PriceBreakdown {
    /// Runs the three pricing stages on a supplier price.
    ///
    /// A price whose repricing would overflow [`Decimal`] is priced like an
    /// unparsed one, from a zero cost.
    #[must_use]
    pub fn compute(price: f64, params: &RepricingParameters) -> Self {
        let cost = decimal_from_price(price);
        Self::checked(cost, params)
            .or_else(|| Self::checked(Decimal::ZERO, params))
            .unwrap_or(Self {
                supplier_ht: Decimal::ZERO,
                margin_ht: Decimal::ZERO,
                intermediate_ht: Decimal::ZERO,
                client_ttc: Decimal::ZERO,
            })
    }

    fn checked(cost: Decimal, params: &RepricingParameters) -> Option<Self> {
        let supplier_ht = round_cents(cost);
        let margin_ht = round_cents(cost.checked_mul(params.markup_coefficient)?);
        let intermediate_ht = round_cents(margin_ht.checked_add(params.fixed_surcharge)?);
        let client_ttc = intermediate_ht.checked_mul(params.tax_coefficient)?.ceil();
        Some(Self {
            supplier_ht,
            margin_ht,
            intermediate_ht,
            client_ttc,
        })
    }
}

fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts a scraped price to `Decimal` through its shortest decimal
/// representation, so `19.2_f64` becomes exactly `19.2`.
fn decimal_from_price(price: f64) -> Decimal {
    if !price.is_finite() || price <= 0.0 {
        return Decimal::ZERO;
    }
    Decimal::from_str(&price.to_string())
        .or_else(|_| Decimal::try_from(price))
        .unwrap_or(Decimal::ZERO)
}

/// Applies [`RepricingParameters`] to scraped records.
#[derive(Debug, Clone, Default)]
pub struct RepricingEngine {
    params: RepricingParameters,
    format: PriceFormat,
}

impl RepricingEngine {
    #[must_use]
    pub fn new(params: RepricingParameters) -> Self {
        Self {
            params,
            format: PriceFormat::default(),
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: PriceFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn params(&self) -> &RepricingParameters {
        &self.params
    }

    /// Prices every record, preserving input order. Empty input yields an
    /// empty vector.
    #[must_use]
    pub fn apply(&self, records: &[RawProductRecord]) -> Vec<PricedRecord> {
        records.iter().map(|record| self.price(record)).collect()
    }

    #[must_use]
    pub fn price(&self, record: &RawProductRecord) -> PricedRecord {
        let breakdown = PriceBreakdown::compute(record.price_numeric, &self.params);
        PricedRecord {
            model_label: record.model_label.clone(),
            component_name: record.component_name.clone(),
            reference: record.reference.clone(),
            price_raw: record.price_raw.clone(),
            source_link: record.source_link.clone(),
            extra: record.extra.clone(),
            supplier_price_ht: self.format.format(breakdown.supplier_ht),
            gross_margin_ht: self.format.format(breakdown.margin_ht),
            intermediate_price_ht: self.format.format(breakdown.intermediate_ht),
            client_price_ttc: self.format.format(breakdown.client_ttc),
        }
    }
}

#[cfg(test)]
#[path = "pricing_test.rs"]
mod tests;
