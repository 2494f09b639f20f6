use serde::{Deserialize, Serialize};

const FULL_BENEFIT_DUAL_CODES: [&str; 3] = ["02", "04", "08"];
const PARTIAL_BENEFIT_DUAL_CODES: [&str; 4] = ["01", "03", "05", "06"];
const ESRD_ENTITLEMENT_CODES: [&str; 2] = ["2", "3"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Sex {
    /// Accepts both the letter and the numeric enrollment codes (`1`/`2`).
    pub fn parse(value: &str) -> Result<Self, DemographicsError> {
        match value.trim().to_ascii_uppercase().as_str() {
            "M" | "1" => Ok(Self::Male),
            "F" | "2" => Ok(Self::Female),
            _ => Err(DemographicsError::InvalidSex(value.to_string())),
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }
}

/// Age/sex cell layout. Medicare cells serve CMS-HCC, ESRD and RxHCC; the
/// ACA layout uses last-birthday age bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgeSexScheme {
    #[default]
    Medicare,
    Aca,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DemographicsError {
    #[error("sex must be 'M', 'F', '1' or '2' (got '{0}')")]
    InvalidSex(String),
}

/// Raw enrollment attributes as supplied by callers.
///
/// Only `age` and `sex` are required; derived flags can be overridden
/// explicitly when the caller already knows them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemographicsInput {
    pub age: u32,
    pub sex: String,
    #[serde(default = "default_dual_code")]
    pub dual_elgbl_cd: String,
    #[serde(default = "default_entitlement_code")]
    pub orec: String,
    #[serde(default = "default_entitlement_code")]
    pub crec: String,
    #[serde(default)]
    pub new_enrollee: bool,
    #[serde(default)]
    pub snp: bool,
    #[serde(default)]
    pub low_income: bool,
    #[serde(default)]
    pub lti: bool,
    #[serde(default)]
    pub graft_months: Option<u32>,
    #[serde(default)]
    pub esrd: Option<bool>,
    #[serde(default)]
    pub fbd: Option<bool>,
    #[serde(default)]
    pub pbd: Option<bool>,
    #[serde(default)]
    pub category: Option<String>,
}

fn default_dual_code() -> String {
    "00".to_string()
}

fn default_entitlement_code() -> String {
    "0".to_string()
}

impl DemographicsInput {
    pub fn new(age: u32, sex: impl Into<String>) -> Self {
        Self {
            age,
            sex: sex.into(),
            dual_elgbl_cd: default_dual_code(),
            orec: default_entitlement_code(),
            crec: default_entitlement_code(),
            new_enrollee: false,
            snp: false,
            low_income: false,
            lti: false,
            graft_months: None,
            esrd: None,
            fbd: None,
            pbd: None,
            category: None,
        }
    }
}

/// Beneficiary attributes consumed by the coefficient rules. Immutable for
/// the duration of a calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Demographics {
    pub age: u32,
    pub sex: Sex,
    pub dual_elgbl_cd: String,
    pub orec: String,
    pub crec: String,
    pub new_enrollee: bool,
    pub snp: bool,
    pub low_income: bool,
    pub lti: bool,
    pub fbd: bool,
    pub pbd: bool,
    pub esrd: bool,
    pub graft_months: Option<u32>,
    /// Age/sex cell label, e.g. `F70_74`.
    pub category: String,
    pub non_aged: bool,
    pub orig_disabled: bool,
    pub disabled: bool,
}

impl Demographics {
    pub fn from_input(
        input: DemographicsInput,
        scheme: AgeSexScheme,
    ) -> Result<Self, DemographicsError> {
        let sex = Sex::parse(&input.sex)?;
        let dual = input.dual_elgbl_cd.trim().to_string();
        let orec = input.orec.trim().to_string();
        let crec = input.crec.trim().to_string();

        let fbd = input
            .fbd
            .unwrap_or_else(|| FULL_BENEFIT_DUAL_CODES.contains(&dual.as_str()));
        let pbd = input
            .pbd
            .unwrap_or_else(|| PARTIAL_BENEFIT_DUAL_CODES.contains(&dual.as_str()));
        let esrd = input.esrd.unwrap_or_else(|| {
            ESRD_ENTITLEMENT_CODES.contains(&orec.as_str())
                || ESRD_ENTITLEMENT_CODES.contains(&crec.as_str())
        });

        let disabled = input.age < 65 && orec != "0";
        let orig_disabled = orec == "1" && !disabled;
        let category = match input.category {
            Some(category) if !category.trim().is_empty() => category.trim().to_string(),
            _ => categorize_age_sex(input.age, sex, input.new_enrollee, &orec, scheme),
        };

        Ok(Self {
            age: input.age,
            sex,
            dual_elgbl_cd: dual,
            orec,
            crec,
            new_enrollee: input.new_enrollee,
            snp: input.snp,
            low_income: input.low_income,
            lti: input.lti,
            fbd,
            pbd,
            esrd,
            graft_months: input.graft_months,
            category,
            non_aged: input.age <= 64,
            orig_disabled,
            disabled,
        })
    }
}

/// Age/sex cell label used as the demographic coefficient variable.
pub fn categorize_age_sex(
    age: u32,
    sex: Sex,
    new_enrollee: bool,
    orec: &str,
    scheme: AgeSexScheme,
) -> String {
    match scheme {
        AgeSexScheme::Aca => format!("{}AGE_LAST_{}", sex.code(), aca_band(age)),
        AgeSexScheme::Medicare if new_enrollee => {
            format!("NE{}{}", sex.code(), new_enrollee_band(age, orec))
        }
        AgeSexScheme::Medicare => format!("{}{}", sex.code(), community_band(age)),
    }
}

fn community_band(age: u32) -> &'static str {
    match age {
        0..=34 => "0_34",
        35..=44 => "35_44",
        45..=54 => "45_54",
        55..=59 => "55_59",
        60..=64 => "60_64",
        65..=69 => "65_69",
        70..=74 => "70_74",
        75..=79 => "75_79",
        80..=84 => "80_84",
        85..=89 => "85_89",
        90..=94 => "90_94",
        _ => "95_GT",
    }
}

// New enrollees turning 65 through the aged route fall into the 65 cell.
fn new_enrollee_band(age: u32, orec: &str) -> &'static str {
    match age {
        0..=34 => "0_34",
        35..=44 => "35_44",
        45..=54 => "45_54",
        55..=59 => "55_59",
        60..=63 => "60_64",
        64 if orec != "0" => "60_64",
        64 | 65 => "65",
        66 => "66",
        67 => "67",
        68 => "68",
        69 => "69",
        70..=74 => "70_74",
        75..=79 => "75_79",
        80..=84 => "80_84",
        85..=89 => "85_89",
        90..=94 => "90_94",
        _ => "95_GT",
    }
}

fn aca_band(age: u32) -> &'static str {
    match age {
        0 => "0_0",
        1 => "1_1",
        2..=4 => "2_4",
        5..=9 => "5_9",
        10..=14 => "10_14",
        15..=20 => "15_20",
        21..=24 => "21_24",
        25..=29 => "25_29",
        30..=34 => "30_34",
        35..=39 => "35_39",
        40..=44 => "40_44",
        45..=49 => "45_49",
        50..=54 => "50_54",
        55..=59 => "55_59",
        _ => "60_GT",
    }
}
