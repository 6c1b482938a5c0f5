//! Data models for the EWA engine.
//!
//! The `models` module defines the serialisable request and result
//! types exchanged with callers.  Field names follow the camelCase
//! convention of the JSON API; monetary values are [`Decimal`]s that
//! travel as plain JSON numbers.  Those numbers pass through an `f64`,
//! so an amount keeps its exact value up to about 15 significant digits.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A request to compute how much of the current cycle's pay can be
/// drawn today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRequest {
    /// Gross salary for a full pay cycle, in whole local currency units.
    pub salary: Decimal,
    /// Length of the pay cycle in days.  Must be positive.
    pub cycle_days: Decimal,
    /// Days worked so far in the cycle.  Values beyond `cycle_days` are
    /// accepted and reported through [`Warning::OverAccrual`].
    pub days_worked: Decimal,
    /// Country code selecting the deduction rules, e.g. `"KE"`.
    pub country: String,
}

/// Employee and employer parts of each RSSB scheme.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RssbBreakdown {
    pub pension_employee: Decimal,
    pub pension_employer: Decimal,
    pub medical_employee: Decimal,
    pub medical_employer: Decimal,
    pub maternity_employee: Decimal,
    pub maternity_employer: Decimal,
    pub employee_total: Decimal,
    pub employer_total: Decimal,
    pub total: Decimal,
}

/// Amounts owed to each statutory body for this accrual.  `sdl` and
/// `wcf` are employer costs and never come out of the employee's pay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Remittances {
    pub nssf: Decimal,
    pub rssb: Decimal,
    pub shif: Decimal,
    pub housing: Decimal,
    pub lst: Decimal,
    pub paye: Decimal,
    pub sdl: Decimal,
    pub wcf: Decimal,
}

/// Unusual results that are still returned rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Warning {
    /// More days were worked than the cycle has, so gross exceeds salary.
    #[serde(rename_all = "camelCase")]
    OverAccrual {
        days_worked: Decimal,
        cycle_days: Decimal,
    },
    /// Deductions exceed gross pay.
    #[serde(rename_all = "camelCase")]
    NegativeNetPay { net_pay: Decimal },
    /// Taxable income is above the highest PAYE ceiling; the excess was
    /// not taxed.
    #[serde(rename_all = "camelCase")]
    IncomeAboveTopBracket {
        taxable_income: Decimal,
        top_bracket: Decimal,
    },
}

/// Full breakdown of one calculation.  Every intermediate figure is
/// kept so callers can display or audit it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub country: String,
    pub currency: String,
    /// Gross pay accrued to date.
    pub gross: Decimal,
    pub nssf_employee: Decimal,
    pub nssf_employer: Decimal,
    pub rssb: RssbBreakdown,
    pub shif: Decimal,
    pub housing_levy: Decimal,
    /// Employer-only skills development levy.
    pub sdl: Decimal,
    /// Employer-only workers' compensation contribution.
    pub wcf: Decimal,
    /// Employee-side social security (NSSF plus RSSB employee parts).
    pub employee_deductions: Decimal,
    pub taxable_income: Decimal,
    pub paye_before_relief: Decimal,
    pub personal_relief: Decimal,
    pub paye_after_relief: Decimal,
    pub lst: Decimal,
    pub net_pay: Decimal,
    /// Net pay attributable to the days worked.
    pub earned_wage: Decimal,
    pub access_cap: Decimal,
    pub platform_fee: Decimal,
    /// What the employee can withdraw right now.
    pub you_can_access_now: Decimal,
    pub remittances: Remittances,
    #[serde(default)]
    pub warnings: Vec<Warning>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_amounts_within_float_precision_parse_exactly() {
        let request: CalculationRequest = serde_json::from_value(json!({
            "salary": 123456789012.34,
            "cycleDays": 30,
            "daysWorked": 12.5,
            "country": "KE"
        }))
        .unwrap();
        assert_eq!(request.salary, dec!(123456789012.34));
        assert_eq!(request.cycle_days, dec!(30));
        assert_eq!(request.days_worked, dec!(12.5));
    }

    #[test]
    fn test_amounts_serialize_as_numbers() {
        let warning = Warning::OverAccrual {
            days_worked: dec!(45),
            cycle_days: dec!(30),
        };
        let value = serde_json::to_value(&warning).unwrap();
        assert_eq!(value["kind"], json!("overAccrual"));
        assert_eq!(value["daysWorked"].as_f64(), Some(45.0));
        assert_eq!(value["cycleDays"].as_f64(), Some(30.0));
    }
}
