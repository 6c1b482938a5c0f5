//! Earned-wage calculation engine.
//!
//! The `engine` module turns a [`CalculationRequest`] and the matching
//! [`CountryConfig`] into a [`CalculationResult`].  [`calculate`] is a
//! pure function; [`quote`] adds the country lookup and [`quote_batch`]
//! fans many requests out across CPU cores with [`rayon`].

use crate::country::{CountryConfig, CountryRegistry, NssfScheme, RssbScheme, ShifScheme};
use crate::error::CalcError;
use crate::models::{CalculationRequest, CalculationResult, Remittances, RssbBreakdown, Warning};
use crate::tax::apply_relief;
use rayon::prelude::*;
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Compute the full breakdown for one request against one country.
///
/// Rejects a non-positive cycle and negative salary or days before doing
/// any arithmetic, and returns [`CalcError::AmountOutOfRange`] instead of
/// overflowing on amounts too large for a [`Decimal`].  Over-accrual and negative net pay are not errors;
/// they come back as [`Warning`]s on the result.
pub fn calculate(
    request: &CalculationRequest,
    config: &CountryConfig,
) -> Result<CalculationResult, CalcError> {
    validate(request)?;
    let salary = request.salary;
    let cycle_days = request.cycle_days;
    let days_worked = request.days_worked;

    // Multiply before dividing so a full cycle reproduces the salary exactly.
    let gross = div(mul(salary, days_worked)?, cycle_days)?;
    // Fixed amounts (tier-1 NSSF, flat SHIF, LST) are only owed on earnings.
    let accrued = gross > Decimal::ZERO;

    let (nssf_employee, nssf_employer) = match &config.nssf {
        Some(NssfScheme::Percentage {
            employee_rate,
            employer_rate,
        }) => (mul(gross, *employee_rate)?, mul(gross, *employer_rate)?),
        Some(NssfScheme::Tiered {
            tier1,
            tier2_rate,
            tier2_cap,
        }) if accrued => (
            add(*tier1, mul(gross.min(*tier2_cap), *tier2_rate)?)?,
            Decimal::ZERO,
        ),
        _ => (Decimal::ZERO, Decimal::ZERO),
    };

    let rssb = match &config.rssb {
        Some(scheme) => rssb_breakdown(gross, scheme)?,
        None => RssbBreakdown::default(),
    };

    let shif = match &config.shif {
        Some(ShifScheme::Flat { amount }) if accrued => *amount,
        Some(ShifScheme::Rate { rate }) => mul(gross, *rate)?,
        _ => Decimal::ZERO,
    };
    let housing_levy = match &config.housing {
        Some(levy) => mul(gross, levy.rate)?,
        None => Decimal::ZERO,
    };
    let sdl = match &config.sdl {
        Some(levy) => mul(gross, levy.employer_rate)?,
        None => Decimal::ZERO,
    };
    let wcf = match &config.wcf {
        Some(levy) => mul(gross, levy.employer_rate)?,
        None => Decimal::ZERO,
    };

    // Only employee-side social security is pre-tax.
    let employee_deductions = add(nssf_employee, rssb.employee_total)?;
    let taxable_income = sub(gross, employee_deductions)?;

    let paye_before_relief = config.paye.tax_on(taxable_income);
    let paye_after_relief = apply_relief(paye_before_relief, config.personal_relief);
    let lst = if accrued {
        config.lst.tax_for(gross)
    } else {
        Decimal::ZERO
    };

    let mut withheld = employee_deductions;
    for amount in [shif, housing_levy, paye_after_relief, lst] {
        withheld = add(withheld, amount)?;
    }
    let net_pay = sub(gross, withheld)?;
    // Second pro-ration: net pay is already for the days worked.
    let earned_wage = div(mul(net_pay, days_worked)?, cycle_days)?;
    let access_cap = mul(earned_wage, config.access_cap_percent)?;
    let platform_fee = mul(access_cap, config.platform_fee_percent)?;
    let you_can_access_now = sub(access_cap, platform_fee)?;

    let mut warnings = Vec::new();
    if days_worked > cycle_days {
        warnings.push(Warning::OverAccrual {
            days_worked,
            cycle_days,
        });
    }
    if let Some(top_bracket) = config.paye.top_ceiling() {
        if taxable_income > top_bracket {
            warnings.push(Warning::IncomeAboveTopBracket {
                taxable_income,
                top_bracket,
            });
        }
    }
    if net_pay < Decimal::ZERO {
        warnings.push(Warning::NegativeNetPay { net_pay });
    }

    let remittances = Remittances {
        nssf: add(nssf_employee, nssf_employer)?,
        rssb: rssb.total,
        shif,
        housing: housing_levy,
        lst,
        paye: paye_after_relief,
        sdl,
        wcf,
    };

    debug!(
        country = %config.code,
        %gross,
        %net_pay,
        %you_can_access_now,
        "calculated earned wage"
    );
    if !warnings.is_empty() {
        warn!(country = %config.code, ?warnings, "calculation produced warnings");
    }

    Ok(CalculationResult {
        country: config.code.clone(),
        currency: config.currency.clone(),
        gross,
        nssf_employee,
        nssf_employer,
        rssb,
        shif,
        housing_levy,
        sdl,
        wcf,
        employee_deductions,
        taxable_income,
        paye_before_relief,
        personal_relief: config.personal_relief,
        paye_after_relief,
        lst,
        net_pay,
        earned_wage,
        access_cap,
        platform_fee,
        you_can_access_now,
        remittances,
        warnings,
    })
}

/// Resolve the request's country and calculate.  An unknown country is
/// reported before the engine runs.
pub fn quote(
    request: &CalculationRequest,
    registry: &CountryRegistry,
) -> Result<CalculationResult, CalcError> {
    let config = registry.get(&request.country)?;
    calculate(request, &config)
}

/// Quote many requests in parallel.  Results line up with `requests`;
/// one bad request does not affect the others.
pub fn quote_batch(
    requests: &[CalculationRequest],
    registry: &CountryRegistry,
) -> Vec<Result<CalculationResult, CalcError>> {
    requests
        .par_iter()
        .map(|request| quote(request, registry))
        .collect()
}

fn validate(request: &CalculationRequest) -> Result<(), CalcError> {
    if request.cycle_days <= Decimal::ZERO {
        return Err(CalcError::InvalidCycle {
            cycle_days: request.cycle_days,
        });
    }
    if request.salary < Decimal::ZERO {
        return Err(CalcError::NegativeInput {
            field: "salary",
            value: request.salary,
        });
    }
    if request.days_worked < Decimal::ZERO {
        return Err(CalcError::NegativeInput {
            field: "daysWorked",
            value: request.days_worked,
        });
    }
    Ok(())
}

fn rssb_breakdown(gross: Decimal, scheme: &RssbScheme) -> Result<RssbBreakdown, CalcError> {
    let pension_employee = mul(gross, scheme.pension.employee_rate)?;
    let pension_employer = mul(gross, scheme.pension.employer_rate)?;
    let medical_employee = mul(gross, scheme.medical.employee_rate)?;
    let medical_employer = mul(gross, scheme.medical.employer_rate)?;
    let maternity_employee = mul(gross, scheme.maternity.employee_rate)?;
    let maternity_employer = mul(gross, scheme.maternity.employer_rate)?;
    let employee_total = add(add(pension_employee, medical_employee)?, maternity_employee)?;
    let employer_total = add(add(pension_employer, medical_employer)?, maternity_employer)?;
    Ok(RssbBreakdown {
        pension_employee,
        pension_employer,
        medical_employee,
        medical_employer,
        maternity_employee,
        maternity_employer,
        employee_total,
        employer_total,
        total: add(employee_total, employer_total)?,
    })
}

// Checked arithmetic: amounts past the 96-bit decimal range are an error,
// not a panic.

fn mul(lhs: Decimal, rhs: Decimal) -> Result<Decimal, CalcError> {
    lhs.checked_mul(rhs).ok_or(CalcError::AmountOutOfRange)
}

fn div(lhs: Decimal, rhs: Decimal) -> Result<Decimal, CalcError> {
    lhs.checked_div(rhs).ok_or(CalcError::AmountOutOfRange)
}

fn add(lhs: Decimal, rhs: Decimal) -> Result<Decimal, CalcError> {
    lhs.checked_add(rhs).ok_or(CalcError::AmountOutOfRange)
}

fn sub(lhs: Decimal, rhs: Decimal) -> Result<Decimal, CalcError> {
    lhs.checked_sub(rhs).ok_or(CalcError::AmountOutOfRange)
}
