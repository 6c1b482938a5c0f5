//! Country configuration and lookup.
//!
//! Each supported country is described by a [`CountryConfig`]: its
//! statutory payroll deductions plus the product's access cap and fee.
//! Configurations are data, not code.  The built-in set is compiled in
//! from `country_configs/*.json`; deployments may point the service at
//! their own directory instead (see [`CountryRegistry::from_dir`]).

use crate::error::{CalcError, ConfigError};
use crate::tax::{check_fraction, LstSchedule, PayeSchedule};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

/// Social-security contribution model.  A country uses exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "lowercase")]
pub enum NssfScheme {
    /// Employee and employer each pay a fraction of gross.
    #[serde(rename_all = "camelCase")]
    Percentage {
        employee_rate: Decimal,
        #[serde(default)]
        employer_rate: Decimal,
    },
    /// A fixed tier-1 contribution plus a capped tier-2 percentage,
    /// both on the employee side.
    #[serde(rename_all = "camelCase")]
    Tiered {
        tier1: Decimal,
        tier2_rate: Decimal,
        tier2_cap: Decimal,
    },
}

/// Health levy: either a flat amount or a fraction of gross.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "basis", rename_all = "lowercase")]
pub enum ShifScheme {
    Flat { amount: Decimal },
    Rate { rate: Decimal },
}

/// A levy charged as a fraction of gross.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLevy {
    pub rate: Decimal,
}

/// A levy borne entirely by the employer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerLevy {
    pub employer_rate: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionRates {
    #[serde(default)]
    pub employee_rate: Decimal,
    #[serde(default)]
    pub employer_rate: Decimal,
}

/// Rwanda-style social security: three schemes, each split between
/// employee and employer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RssbScheme {
    #[serde(default)]
    pub pension: ContributionRates,
    #[serde(default)]
    pub medical: ContributionRates,
    #[serde(default)]
    pub maternity: ContributionRates,
}

/// Everything the engine needs to know about one country.
///
/// Optional groups (`nssf`, `shif`, ...) are `None` when the country has
/// no such deduction.  Tables default to empty and `personal_relief`
/// to zero, so an unconfigured item contributes nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryConfig {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub personal_relief: Decimal,
    #[serde(default)]
    pub nssf: Option<NssfScheme>,
    #[serde(default)]
    pub shif: Option<ShifScheme>,
    #[serde(default)]
    pub housing: Option<RateLevy>,
    #[serde(default)]
    pub rssb: Option<RssbScheme>,
    #[serde(default)]
    pub sdl: Option<EmployerLevy>,
    #[serde(default)]
    pub wcf: Option<EmployerLevy>,
    #[serde(default)]
    pub paye: PayeSchedule,
    #[serde(default)]
    pub lst: LstSchedule,
    /// Fraction of earned wage an employee may draw before payday.
    pub access_cap_percent: Decimal,
    /// Fraction of the access cap kept as the platform fee.
    pub platform_fee_percent: Decimal,
}

impl CountryConfig {
    /// A configuration with no statutory deductions at all, only the
    /// commercial terms.  Useful as a starting point in tests and tools.
    pub fn bare(code: &str, access_cap_percent: Decimal, platform_fee_percent: Decimal) -> Self {
        Self {
            code: normalize_code(code),
            name: String::new(),
            currency: String::new(),
            personal_relief: Decimal::ZERO,
            nssf: None,
            shif: None,
            housing: None,
            rssb: None,
            sdl: None,
            wcf: None,
            paye: PayeSchedule::default(),
            lst: LstSchedule::default(),
            access_cap_percent,
            platform_fee_percent,
        }
    }

    /// Check that the tables are ordered and every rate is a fraction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.check().map_err(|reason| ConfigError::Invalid {
            code: self.code.clone(),
            reason,
        })
    }

    fn check(&self) -> Result<(), String> {
        if normalize_code(&self.code).is_empty() {
            return Err("country code is empty".to_string());
        }
        non_negative("personal relief", self.personal_relief)?;
        match &self.nssf {
            Some(NssfScheme::Percentage { employee_rate, employer_rate }) => {
                check_fraction("NSSF employee rate", *employee_rate)?;
                check_fraction("NSSF employer rate", *employer_rate)?;
            }
            Some(NssfScheme::Tiered { tier1, tier2_rate, tier2_cap }) => {
                non_negative("NSSF tier 1", *tier1)?;
                check_fraction("NSSF tier 2 rate", *tier2_rate)?;
                non_negative("NSSF tier 2 cap", *tier2_cap)?;
            }
            None => {}
        }
        match &self.shif {
            Some(ShifScheme::Flat { amount }) => non_negative("SHIF amount", *amount)?,
            Some(ShifScheme::Rate { rate }) => check_fraction("SHIF rate", *rate)?,
            None => {}
        }
        if let Some(housing) = &self.housing {
            check_fraction("housing rate", housing.rate)?;
        }
        if let Some(rssb) = &self.rssb {
            for (label, rates) in [
                ("RSSB pension", &rssb.pension),
                ("RSSB medical", &rssb.medical),
                ("RSSB maternity", &rssb.maternity),
            ] {
                check_fraction(label, rates.employee_rate)?;
                check_fraction(label, rates.employer_rate)?;
            }
        }
        for (label, levy) in [("SDL rate", &self.sdl), ("WCF rate", &self.wcf)] {
            if let Some(levy) = levy {
                check_fraction(label, levy.employer_rate)?;
            }
        }
        self.paye.validate()?;
        self.lst.validate()?;
        check_fraction("access cap", self.access_cap_percent)?;
        check_fraction("platform fee", self.platform_fee_percent)?;
        Ok(())
    }
}

fn non_negative(label: &str, value: Decimal) -> Result<(), String> {
    if value < Decimal::ZERO {
        return Err(format!("{} {} is negative", label, value));
    }
    Ok(())
}

/// Canonical form of a country code: trimmed, upper case.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

const BUILTIN_SOURCES: [(&str, &str); 4] = [
    ("country_configs/ke.json", include_str!("../country_configs/ke.json")),
    ("country_configs/rw.json", include_str!("../country_configs/rw.json")),
    ("country_configs/tz.json", include_str!("../country_configs/tz.json")),
    ("country_configs/ug.json", include_str!("../country_configs/ug.json")),
];

static BUILTIN: OnceLock<CountryRegistry> = OnceLock::new();

/// Read-only map from country code to configuration.
#[derive(Debug, Clone, Default)]
pub struct CountryRegistry {
    configs: HashMap<String, Arc<CountryConfig>>,
}

impl CountryRegistry {
    /// The compiled-in country set.  Parsed on first use and reused for
    /// the life of the process.
    pub fn builtin() -> Result<Self, ConfigError> {
        if let Some(registry) = BUILTIN.get() {
            return Ok(registry.clone());
        }
        let mut configs = Vec::with_capacity(BUILTIN_SOURCES.len());
        for (origin, raw) in BUILTIN_SOURCES {
            configs.push(parse_config(origin, raw)?);
        }
        let registry = Self::from_configs(configs)?;
        Ok(BUILTIN.get_or_init(|| registry).clone())
    }

    /// Load every `*.json` file in `path` as a [`CountryConfig`].
    ///
    /// Unlike a lenient scan, any unreadable, malformed or invalid file
    /// aborts the load: a half-loaded registry would make some countries
    /// silently disappear.
    pub fn from_dir(path: &Path) -> Result<Self, ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut files = Vec::new();
        for entry in std::fs::read_dir(path).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let file = entry.path();
            if file.is_file() && file.extension().map_or(false, |ext| ext == "json") {
                files.push(file);
            }
        }
        files.sort();

        let mut configs = Vec::with_capacity(files.len());
        for file in files {
            let raw = std::fs::read_to_string(&file).map_err(|source| ConfigError::Io {
                path: file.clone(),
                source,
            })?;
            debug!(path = %file.display(), "parsing country configuration");
            configs.push(parse_config(&file.display().to_string(), &raw)?);
        }
        let registry = Self::from_configs(configs)?;
        info!(
            countries = ?registry.codes(),
            dir = %path.display(),
            "loaded country configurations"
        );
        Ok(registry)
    }

    /// Build a registry from configurations already in memory.  Each is
    /// validated and its code normalised; duplicate codes are rejected.
    pub fn from_configs<I>(configs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = CountryConfig>,
    {
        let mut map = HashMap::new();
        for mut config in configs {
            config.code = normalize_code(&config.code);
            config.validate()?;
            if map.contains_key(&config.code) {
                return Err(ConfigError::Duplicate { code: config.code });
            }
            map.insert(config.code.clone(), Arc::new(config));
        }
        Ok(Self { configs: map })
    }

    /// Look up a country.  There is no fallback: an unknown code is an
    /// error, never an empty or borrowed configuration.
    pub fn get(&self, code: &str) -> Result<Arc<CountryConfig>, CalcError> {
        let key = normalize_code(code);
        self.configs
            .get(&key)
            .cloned()
            .ok_or(CalcError::UnknownCountry { code: key })
    }

    /// Known country codes in sorted order.
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.configs.keys().cloned().collect();
        codes.sort();
        codes
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

fn parse_config(origin: &str, raw: &str) -> Result<CountryConfig, ConfigError> {
    serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
        origin: origin.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ewa-engine-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_builtin_registry_has_known_countries() {
        let registry = CountryRegistry::builtin().unwrap();
        assert_eq!(registry.codes(), vec!["KE", "RW", "TZ", "UG"]);

        let kenya = registry.get("ke").unwrap();
        assert_eq!(kenya.currency, "KES");
        assert_eq!(kenya.personal_relief, dec!(2400));
        assert_eq!(
            kenya.nssf,
            Some(NssfScheme::Tiered {
                tier1: dec!(480),
                tier2_rate: dec!(0.06),
                tier2_cap: dec!(64000),
            })
        );
        assert_eq!(kenya.shif, Some(ShifScheme::Rate { rate: dec!(0.0275) }));
        assert_eq!(kenya.paye.brackets.len(), 5);

        let uganda = registry.get(" UG ").unwrap();
        assert!(uganda.shif.is_none());
        assert_eq!(uganda.lst.bands.len(), 11);
        assert_eq!(
            uganda.nssf,
            Some(NssfScheme::Percentage {
                employee_rate: dec!(0.05),
                employer_rate: dec!(0.10),
            })
        );
    }

    #[test]
    fn test_unknown_country_is_an_error() {
        let registry = CountryRegistry::builtin().unwrap();
        assert_eq!(
            registry.get("ZZ").unwrap_err(),
            CalcError::UnknownCountry { code: "ZZ".into() }
        );
        assert!(CountryRegistry::default().get("KE").is_err());
    }

    #[test]
    fn test_missing_groups_default_to_absent() {
        let config: CountryConfig = serde_json::from_str(
            r#"{"code":"xx","accessCapPercent":0.5,"platformFeePercent":0.02}"#,
        )
        .unwrap();
        assert_eq!(config.personal_relief, Decimal::ZERO);
        assert!(config.nssf.is_none());
        assert!(config.rssb.is_none());
        assert!(config.paye.brackets.is_empty());
        assert!(config.lst.bands.is_empty());
    }

    #[test]
    fn test_rssb_parts_default_to_zero() {
        let config: CountryConfig = serde_json::from_str(
            r#"{"code":"RW","rssb":{"pension":{"employeeRate":0.06}},
                "accessCapPercent":0.5,"platformFeePercent":0.02}"#,
        )
        .unwrap();
        let rssb = config.rssb.unwrap();
        assert_eq!(rssb.pension.employee_rate, dec!(0.06));
        assert_eq!(rssb.pension.employer_rate, Decimal::ZERO);
        assert_eq!(rssb.maternity, ContributionRates::default());
    }

    #[test]
    fn test_nssf_shape_must_be_tagged() {
        let untagged = r#"{"code":"KE","nssf":{"employeeRate":0.05},
            "accessCapPercent":0.5,"platformFeePercent":0.02}"#;
        assert!(serde_json::from_str::<CountryConfig>(untagged).is_err());
    }

    #[test]
    fn test_validation_rejects_bad_rates() {
        let mut config = CountryConfig::bare("KE", dec!(0.6), dec!(0.05));
        assert!(config.validate().is_ok());

        config.access_cap_percent = dec!(1.2);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        let mut config = CountryConfig::bare("KE", dec!(0.6), dec!(0.05));
        config.housing = Some(RateLevy { rate: dec!(-0.01) });
        assert!(config.validate().is_err());

        let config = CountryConfig::bare("  ", dec!(0.6), dec!(0.05));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_codes_rejected() {
        let err = CountryRegistry::from_configs(vec![
            CountryConfig::bare("KE", dec!(0.6), dec!(0.05)),
            CountryConfig::bare("ke", dec!(0.5), dec!(0.05)),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Duplicate { code } if code == "KE"));
    }

    #[test]
    fn test_from_dir_loads_json_files_only() {
        let dir = scratch_dir("load");
        std::fs::write(
            dir.join("zm.json"),
            r#"{"code":"ZM","currency":"ZMW","accessCapPercent":0.5,"platformFeePercent":0.03}"#,
        )
        .unwrap();
        std::fs::write(dir.join("notes.txt"), "not a config").unwrap();

        let registry = CountryRegistry::from_dir(&dir).unwrap();
        assert_eq!(registry.codes(), vec!["ZM"]);
        assert_eq!(registry.get("zm").unwrap().platform_fee_percent, dec!(0.03));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_from_dir_fails_on_malformed_file() {
        let dir = scratch_dir("malformed");
        std::fs::write(dir.join("bad.json"), "{ not json").unwrap();
        let err = CountryRegistry::from_dir(&dir).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_from_dir_missing_directory() {
        let missing = std::env::temp_dir().join("ewa-engine-does-not-exist");
        assert!(matches!(
            CountryRegistry::from_dir(&missing),
            Err(ConfigError::Io { .. })
        ));
    }
}
