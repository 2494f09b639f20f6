use crate::model::normalize_diagnosis_code;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Diagnosis code to condition category mapping for a single model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DxToCcTable {
    entries: HashMap<String, BTreeSet<String>>,
}

impl DxToCcTable {
    /// Records a mapping row. The diagnosis code is stored in normalized form.
    pub fn insert(&mut self, diagnosis_code: &str, cc: impl Into<String>) {
        self.entries
            .entry(normalize_diagnosis_code(diagnosis_code))
            .or_default()
            .insert(cc.into());
    }

    /// Exact lookup. `None` means the code is not mapped for this model.
    pub fn get(&self, diagnosis_code: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(diagnosis_code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<D: AsRef<str>, C: Into<String>> FromIterator<(D, C)> for DxToCcTable {
    fn from_iter<I: IntoIterator<Item = (D, C)>>(iter: I) -> Self {
        let mut table = Self::default();
        for (dx, cc) in iter {
            table.insert(dx.as_ref(), cc);
        }
        table
    }
}

/// Parent to children exclusion rules for a single model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HierarchyTable {
    rules: HashMap<String, BTreeSet<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HierarchyAnomaly {
    /// A category listed as its own child.
    SelfReference { cc: String },
    /// Two categories that each exclude the other.
    Mutual { first: String, second: String },
}

impl HierarchyTable {
    pub fn insert(&mut self, parent: impl Into<String>, child: impl Into<String>) {
        self.rules
            .entry(parent.into())
            .or_default()
            .insert(child.into());
    }

    pub fn children(&self, parent: &str) -> Option<&BTreeSet<String>> {
        self.rules.get(parent)
    }

    pub fn len(&self) -> usize {
        self.rules.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Scans the rule set for self references and mutual exclusions. The
    /// hierarchy resolver never consults this; it exists for load-time
    /// diagnostics.
    pub fn anomalies(&self) -> Vec<HierarchyAnomaly> {
        let mut found = BTreeSet::new();

        for (parent, children) in &self.rules {
            for child in children {
                if child == parent {
                    found.insert(HierarchyAnomaly::SelfReference { cc: parent.clone() });
                    continue;
                }

                let reverse = self
                    .rules
                    .get(child)
                    .is_some_and(|grandchildren| grandchildren.contains(parent));
                if reverse {
                    let (first, second) = if parent < child {
                        (parent.clone(), child.clone())
                    } else {
                        (child.clone(), parent.clone())
                    };
                    found.insert(HierarchyAnomaly::Mutual { first, second });
                }
            }
        }

        found.into_iter().collect()
    }
}

impl<P: Into<String>, C: Into<String>> FromIterator<(P, C)> for HierarchyTable {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        let mut table = Self::default();
        for (parent, child) in iter {
            table.insert(parent, child);
        }
        table
    }
}

/// Coefficient weights keyed by lowercase variable name (`cna_hcc19`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoefficientTable {
    values: HashMap<String, f64>,
}

impl CoefficientTable {
    pub fn insert(&mut self, variable: &str, value: f64) {
        self.values.insert(variable.trim().to_lowercase(), value);
    }

    /// Looks up an already lowercased key.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: AsRef<str>> FromIterator<(K, f64)> for CoefficientTable {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut table = Self::default();
        for (key, value) in iter {
            table.insert(key.as_ref(), value);
        }
        table
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChronicFlags {
    flags: HashMap<String, bool>,
}

impl ChronicFlags {
    pub fn insert(&mut self, hcc: impl Into<String>, chronic: bool) {
        self.flags.insert(hcc.into(), chronic);
    }

    pub fn is_chronic(&self, hcc: &str) -> Option<bool> {
        self.flags.get(hcc).copied()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// CPT/HCPCS codes whose professional claims count toward risk adjustment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EligibleProcedures {
    codes: HashSet<String>,
}

impl EligibleProcedures {
    pub fn insert(&mut self, code: &str) {
        self.codes.insert(code.trim().to_ascii_uppercase());
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(&code.trim().to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dx_table_normalizes_on_insert_but_looks_up_exactly() {
        let table: DxToCcTable = [("E11.9", "19"), ("e119", "20"), ("I5022", "85")]
            .into_iter()
            .collect();

        let ccs = table.get("E119").expect("mapped");
        assert_eq!(ccs.iter().map(String::as_str).collect::<Vec<_>>(), ["19", "20"]);
        assert!(table.get("E11.9").is_none());
        assert!(table.get("Z9999").is_none());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn coefficient_keys_are_lowercased() {
        let table: CoefficientTable = [("CNA_HCC19", 0.421)].into_iter().collect();
        assert_eq!(table.get("cna_hcc19"), Some(0.421));
        assert_eq!(table.get("CNA_HCC19"), None);
    }

    #[test]
    fn anomalies_report_self_and_mutual_rules() {
        let table: HierarchyTable = [("17", "18"), ("18", "17"), ("40", "40"), ("17", "19")]
            .into_iter()
            .collect();

        assert_eq!(
            table.anomalies(),
            vec![
                HierarchyAnomaly::SelfReference { cc: "40".into() },
                HierarchyAnomaly::Mutual {
                    first: "17".into(),
                    second: "18".into()
                },
            ]
        );
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn clean_hierarchy_has_no_anomalies() {
        let table: HierarchyTable = [("17", "18"), ("17", "19"), ("18", "19")]
            .into_iter()
            .collect();
        assert!(table.anomalies().is_empty());
    }

    #[test]
    fn eligible_procedures_match_case_insensitively() {
        let mut procedures = EligibleProcedures::default();
        procedures.insert("0398t");
        assert!(procedures.contains("0398T"));
        assert!(!procedures.contains("99999"));
    }
}
