use super::demographics::Demographics;
use super::name::{ModelDomain, ModelName};
use crate::reference::CoefficientTable;
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// Rate-cell prefix used to build coefficient keys for this beneficiary.
///
/// ESRD beneficiaries that match none of the ESRD segments fall through to
/// the community CMS-HCC cells.
pub fn coefficient_prefix(demographics: &Demographics, model: &ModelName) -> String {
    match model.domain {
        ModelDomain::Esrd => {
            if let Some(prefix) = esrd_prefix(demographics) {
                return prefix;
            }
        }
        ModelDomain::RxHcc => return rx_prefix(demographics),
        ModelDomain::CmsHcc => {}
    }

    if demographics.lti {
        return "INS_".to_string();
    }
    if demographics.new_enrollee {
        let prefix = if demographics.snp { "SNPNE_" } else { "NE_" };
        return prefix.to_string();
    }

    let dual = if demographics.fbd {
        "F"
    } else if demographics.pbd {
        "P"
    } else {
        "N"
    };
    let aged = if demographics.age >= 65 { "A" } else { "D" };
    format!("C{dual}{aged}_")
}

fn esrd_prefix(demographics: &Demographics) -> Option<String> {
    if demographics.esrd {
        if demographics.graft_months.is_some() {
            if demographics.lti {
                return Some("GI_".to_string());
            }
            if demographics.new_enrollee {
                return Some("GNE_".to_string());
            }
            let dual = if demographics.fbd { "F" } else { "NP" };
            let aged = if demographics.age >= 65 { "A" } else { "N" };
            return Some(format!("G{dual}{aged}_"));
        }

        let prefix = if demographics.new_enrollee { "DNE_" } else { "DI_" };
        return Some(prefix.to_string());
    }

    match demographics.graft_months {
        Some(months @ 1..=3) => Some(format!("TRANSPLANT_KIDNEY_ONLY_{months}M")),
        _ => None,
    }
}

fn rx_prefix(demographics: &Demographics) -> String {
    if demographics.lti {
        let prefix = if demographics.new_enrollee {
            "Rx_NE_LTI_"
        } else {
            "Rx_CE_LTI_"
        };
        return prefix.to_string();
    }
    if demographics.new_enrollee {
        let prefix = if demographics.low_income {
            "Rx_NE_Lo_"
        } else {
            "Rx_NE_NoLo_"
        };
        return prefix.to_string();
    }

    let income = if demographics.low_income { "Low" } else { "NoLow" };
    let aged = if demographics.age >= 65 { "Aged" } else { "NoAged" };
    format!("Rx_CE_{income}{aged}_")
}

/// Resolves the weights for the demographic cell, the active categories and
/// the active interaction terms.
///
/// Results are keyed by the category label, the bare category number and the
/// interaction name respectively. Anything without a coefficient is left out.
pub fn apply_coefficients(
    demographics: &Demographics,
    hccs: &BTreeSet<String>,
    interactions: &BTreeMap<String, f64>,
    model: &ModelName,
    coefficients: &CoefficientTable,
) -> BTreeMap<String, f64> {
    let prefix = coefficient_prefix(demographics, model);
    let lookup = |variable: &str| {
        let key = format!("{prefix}{variable}").to_lowercase();
        let value = coefficients.get(&key);
        if value.is_none() {
            trace!(%model, key = %key, "no coefficient for variable");
        }
        value
    };

    let mut output = BTreeMap::new();

    if let Some(value) = lookup(&demographics.category) {
        output.insert(demographics.category.clone(), value);
    }

    for hcc in hccs {
        if let Some(value) = lookup(&format!("HCC{hcc}")) {
            output.insert(hcc.clone(), value);
        }
    }

    for (name, flag) in interactions {
        if flag.is_nan() || *flag < 1.0 {
            continue;
        }
        if let Some(value) = lookup(name) {
            output.insert(name.clone(), value);
        }
    }

    output
}

/// Sums weights in key order so identical inputs give bit-identical totals.
pub fn total_score(weights: &BTreeMap<String, f64>) -> f64 {
    weights.values().sum()
}
