//! Progressive income tax and banded levies.
//!
//! The `tax` module holds the two table-driven taxes that a country
//! configuration can carry: PAYE, a marginal-bracket income tax, and
//! LST, a flat amount looked up from gross pay bands.  Both tables are
//! plain data deserialised from the country JSON files; the functions
//! here only walk them.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Round a monetary figure to two decimal places, halves away from zero.
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// One marginal PAYE bracket.  `up_to` is the cumulative income ceiling
/// of the bracket and `rate` the fraction charged on income inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayeBracket {
    pub up_to: Decimal,
    pub rate: Decimal,
}

/// An ordered PAYE table.  Brackets must be ascending by `up_to`; the
/// last ceiling should be a large sentinel so every income is covered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayeSchedule {
    #[serde(default)]
    pub brackets: Vec<PayeBracket>,
}

impl PayeSchedule {
    pub fn new(brackets: Vec<PayeBracket>) -> Self {
        Self { brackets }
    }

    /// Tax owed on `taxable` income before any relief.
    ///
    /// Each bracket contributes `min(remaining, up_to - previous_up_to)`
    /// at its rate and the walk stops as soon as the income is used up.
    /// Income above the final ceiling is not taxed.  The sum is rounded
    /// once, at the end.
    pub fn tax_on(&self, taxable: Decimal) -> Decimal {
        let mut remaining = taxable;
        let mut floor = Decimal::ZERO;
        let mut tax = Decimal::ZERO;
        for bracket in &self.brackets {
            if remaining <= Decimal::ZERO {
                break;
            }
            let slice = remaining.min(bracket.up_to - floor);
            tax += slice * bracket.rate;
            remaining -= slice;
            floor = bracket.up_to;
        }
        round_currency(tax)
    }

    /// Ceiling of the highest bracket, if the table has any.
    pub fn top_ceiling(&self) -> Option<Decimal> {
        self.brackets.last().map(|b| b.up_to)
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        let mut previous = Decimal::ZERO;
        for (idx, bracket) in self.brackets.iter().enumerate() {
            if bracket.up_to <= previous {
                return Err(format!(
                    "PAYE bracket {} ceiling {} does not ascend past {}",
                    idx, bracket.up_to, previous
                ));
            }
            check_fraction("PAYE rate", bracket.rate)?;
            previous = bracket.up_to;
        }
        Ok(())
    }
}

/// Apply a flat relief to computed PAYE.  Never below zero.
pub fn apply_relief(paye: Decimal, relief: Decimal) -> Decimal {
    (paye - relief).max(Decimal::ZERO)
}

/// A Local Service Tax band: gross pay up to `up_to` owes `tax`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LstBand {
    pub up_to: Decimal,
    pub tax: Decimal,
}

/// Step-function lookup table for LST.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LstSchedule {
    #[serde(default)]
    pub bands: Vec<LstBand>,
}

impl LstSchedule {
    pub fn new(bands: Vec<LstBand>) -> Self {
        Self { bands }
    }

    /// LST for a given gross.  Picks the first band whose ceiling covers
    /// `gross`; anything above every band pays the last band's amount.
    pub fn tax_for(&self, gross: Decimal) -> Decimal {
        self.bands
            .iter()
            .find(|band| band.up_to >= gross)
            .or_else(|| self.bands.last())
            .map(|band| band.tax)
            .unwrap_or(Decimal::ZERO)
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        let mut previous: Option<Decimal> = None;
        for (idx, band) in self.bands.iter().enumerate() {
            if previous.map_or(false, |p| band.up_to <= p) {
                return Err(format!("LST band {} ceiling {} is out of order", idx, band.up_to));
            }
            if band.tax < Decimal::ZERO {
                return Err(format!("LST band {} has a negative amount", idx));
            }
            previous = Some(band.up_to);
        }
        Ok(())
    }
}

pub(crate) fn check_fraction(label: &str, value: Decimal) -> Result<(), String> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(format!("{} {} is outside [0, 1]", label, value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn kenya_brackets() -> PayeSchedule {
        PayeSchedule::new(vec![
            PayeBracket { up_to: dec!(24000), rate: dec!(0.10) },
            PayeBracket { up_to: dec!(32333), rate: dec!(0.25) },
            PayeBracket { up_to: dec!(500000), rate: dec!(0.30) },
            PayeBracket { up_to: dec!(800000), rate: dec!(0.325) },
            PayeBracket { up_to: dec!(1000000000000000), rate: dec!(0.35) },
        ])
    }

    #[test]
    fn test_paye_walks_brackets() {
        let paye = kenya_brackets();
        // 24000 * 0.10 + 8333 * 0.25 + 17667 * 0.30
        assert_eq!(paye.tax_on(dec!(50000)), dec!(9783.35));
    }

    #[test]
    fn test_paye_continuous_at_bracket_boundary() {
        let paye = kenya_brackets();
        assert_eq!(paye.tax_on(dec!(24000)), dec!(2400));
        assert_eq!(paye.tax_on(dec!(24001)), dec!(2400.25));
        assert_eq!(paye.tax_on(dec!(32333)), dec!(2400) + dec!(2083.25));
    }

    #[test]
    fn test_paye_rounds_only_the_total() {
        let paye = PayeSchedule::new(vec![
            PayeBracket { up_to: dec!(10), rate: dec!(0.1004) },
            PayeBracket { up_to: dec!(100), rate: dec!(0.1004) },
        ]);
        // 1.004 + 1.004; rounding each slice would give 2.00.
        assert_eq!(paye.tax_on(dec!(20)), dec!(2.01));
    }

    #[test]
    fn test_paye_zero_and_negative_income() {
        let paye = kenya_brackets();
        assert_eq!(paye.tax_on(Decimal::ZERO), Decimal::ZERO);
        assert_eq!(paye.tax_on(dec!(-500)), Decimal::ZERO);
        assert_eq!(PayeSchedule::default().tax_on(dec!(1000)), Decimal::ZERO);
    }

    #[test]
    fn test_paye_leaves_income_above_top_ceiling_untaxed() {
        let paye = PayeSchedule::new(vec![PayeBracket { up_to: dec!(1000), rate: dec!(0.5) }]);
        assert_eq!(paye.tax_on(dec!(5000)), dec!(500));
        assert_eq!(paye.top_ceiling(), Some(dec!(1000)));
    }

    #[test]
    fn test_relief_never_negative() {
        assert_eq!(apply_relief(dec!(2400), dec!(2400)), Decimal::ZERO);
        assert_eq!(apply_relief(dec!(100), dec!(2400)), Decimal::ZERO);
        assert_eq!(apply_relief(dec!(9783.35), dec!(2400)), dec!(7383.35));
    }

    #[test]
    fn test_lst_lookup() {
        let lst = LstSchedule::new(vec![
            LstBand { up_to: dec!(100000), tax: dec!(0) },
            LstBand { up_to: dec!(200000), tax: dec!(5000) },
            LstBand { up_to: dec!(300000), tax: dec!(10000) },
        ]);
        assert_eq!(lst.tax_for(dec!(100000)), dec!(0));
        assert_eq!(lst.tax_for(dec!(100001)), dec!(5000));
        assert_eq!(lst.tax_for(dec!(250000)), dec!(10000));
        // Above every band: the last band applies.
        assert_eq!(lst.tax_for(dec!(9000000)), dec!(10000));
        assert_eq!(LstSchedule::default().tax_for(dec!(9000000)), Decimal::ZERO);
    }

    #[test]
    fn test_validate_rejects_unordered_tables() {
        let paye = PayeSchedule::new(vec![
            PayeBracket { up_to: dec!(500), rate: dec!(0.1) },
            PayeBracket { up_to: dec!(400), rate: dec!(0.2) },
        ]);
        assert!(paye.validate().is_err());

        let paye = PayeSchedule::new(vec![PayeBracket { up_to: dec!(500), rate: dec!(1.5) }]);
        assert!(paye.validate().is_err());

        let lst = LstSchedule::new(vec![
            LstBand { up_to: dec!(200), tax: dec!(5) },
            LstBand { up_to: dec!(200), tax: dec!(10) },
        ]);
        assert!(lst.validate().is_err());
        assert!(kenya_brackets().validate().is_ok());
    }
}
