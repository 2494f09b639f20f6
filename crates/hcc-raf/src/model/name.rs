use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Actuarial model family a model name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModelDomain {
    CmsHcc,
    Esrd,
    RxHcc,
}

impl ModelDomain {
    pub const fn label(self) -> &'static str {
        match self {
            Self::CmsHcc => "CMS-HCC",
            Self::Esrd => "CMS-HCC ESRD",
            Self::RxHcc => "RxHCC",
        }
    }

    /// Parses the domain column used by the published reference tables,
    /// which spell the ESRD family either in full or as a bare `ESRD`.
    fn from_table_label(value: &str) -> Option<Self> {
        match value.trim() {
            "CMS-HCC" => Some(Self::CmsHcc),
            "CMS-HCC ESRD" | "ESRD" => Some(Self::Esrd),
            "RxHCC" => Some(Self::RxHcc),
            _ => None,
        }
    }
}

impl fmt::Display for ModelDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelVersion(pub u16);

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{:02}", self.0)
    }
}

/// Fully qualified model identity, e.g. `CMS-HCC Model V28`.
///
/// Every reference lookup is keyed by this value. It is parsed once at the
/// boundary so the rule engine can branch on [`ModelDomain`] directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelName {
    pub domain: ModelDomain,
    pub version: ModelVersion,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("invalid model name '{0}': expected '<CMS-HCC|CMS-HCC ESRD|RxHCC> Model V<NN>'")]
    InvalidModelName(String),
    #[error("unknown model domain '{0}'")]
    UnknownDomain(String),
    #[error("model version '{0}' carries no version number")]
    InvalidVersion(String),
}

impl ModelName {
    pub const fn new(domain: ModelDomain, version: u16) -> Self {
        Self {
            domain,
            version: ModelVersion(version),
        }
    }

    /// Builds a model name from the split domain/version columns found in
    /// coefficient, hierarchy and chronic-flag tables. The version column may
    /// read `V24`, `24` or `ESRD V24`; the trailing digits decide.
    pub fn from_parts(domain: &str, version: &str) -> Result<Self, ModelError> {
        let domain = ModelDomain::from_table_label(domain)
            .ok_or_else(|| ModelError::UnknownDomain(domain.trim().to_string()))?;

        let trimmed = version.trim();
        let digits_start = trimmed
            .rfind(|ch: char| !ch.is_ascii_digit())
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let number = trimmed[digits_start..]
            .parse::<u16>()
            .map_err(|_| ModelError::InvalidVersion(trimmed.to_string()))?;

        Ok(Self::new(domain, number))
    }

    pub fn is_esrd(&self) -> bool {
        self.domain == ModelDomain::Esrd
    }
}

impl FromStr for ModelName {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidModelName(value.to_string());
        let (domain, version) = value.trim().split_once(" Model ").ok_or_else(invalid)?;

        let domain = match domain {
            "CMS-HCC" => ModelDomain::CmsHcc,
            "CMS-HCC ESRD" => ModelDomain::Esrd,
            "RxHCC" => ModelDomain::RxHcc,
            _ => return Err(invalid()),
        };

        let digits = version.strip_prefix('V').ok_or_else(invalid)?;
        if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(invalid());
        }
        let number = digits.parse::<u16>().map_err(|_| invalid())?;

        Ok(Self::new(domain, number))
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Model {}", self.domain, self.version)
    }
}

impl Serialize for ModelName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ModelName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
