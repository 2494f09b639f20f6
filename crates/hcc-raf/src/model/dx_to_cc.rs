use super::normalizer::normalize_diagnosis_code;
use crate::reference::DxToCcTable;
use std::collections::{BTreeMap, BTreeSet};

/// Condition category to the normalized diagnosis codes that produced it.
pub type CcToDx = BTreeMap<String, BTreeSet<String>>;

/// Raw lookup of a single, already normalized diagnosis code.
pub fn get_cc<'a>(diagnosis_code: &str, mapping: &'a DxToCcTable) -> Option<&'a BTreeSet<String>> {
    mapping.get(diagnosis_code)
}

/// Maps a batch of diagnosis codes to their condition categories.
///
/// Codes are normalized and deduplicated first. Codes absent from the table
/// contribute nothing. The key set of the result is the active category set.
pub fn apply_mapping<I, S>(diagnoses: I, mapping: &DxToCcTable) -> CcToDx
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let unique: BTreeSet<String> = diagnoses
        .into_iter()
        .map(|dx| normalize_diagnosis_code(dx.as_ref()))
        .filter(|dx| !dx.is_empty())
        .collect();

    let mut cc_to_dx = CcToDx::new();
    for dx in unique {
        let Some(ccs) = get_cc(&dx, mapping) else {
            continue;
        };
        for cc in ccs {
            cc_to_dx.entry(cc.clone()).or_default().insert(dx.clone());
        }
    }

    cc_to_dx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> DxToCcTable {
        [("E119", "19"), ("E119", "20"), ("I5022", "85"), ("E1165", "18")]
            .into_iter()
            .collect()
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn get_cc_is_an_exact_lookup() {
        let table = mapping();
        assert_eq!(get_cc("E119", &table), Some(&set(&["19", "20"])));
        assert_eq!(get_cc("E11.9", &table), None);
        assert_eq!(get_cc("Z9999", &table), None);
    }

    #[test]
    fn apply_mapping_builds_reverse_index() {
        let result = apply_mapping(["E11.9", "I50.22", "Z99.99"], &mapping());

        let expected: CcToDx = [
            ("19".to_string(), set(&["E119"])),
            ("20".to_string(), set(&["E119"])),
            ("85".to_string(), set(&["I5022"])),
        ]
        .into_iter()
        .collect();
        assert_eq!(result, expected);
    }

    #[test]
    fn duplicates_collapse_after_normalization() {
        let result = apply_mapping(["e11.9", "E119", " E11.9 "], &mapping());
        assert_eq!(result.get("19"), Some(&set(&["E119"])));
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn empty_and_unmapped_inputs_yield_nothing() {
        let table = mapping();
        assert!(apply_mapping(Vec::<String>::new(), &table).is_empty());
        assert!(apply_mapping(["Z99.99", ""], &table).is_empty());
    }

    #[test]
    fn mapping_is_deterministic_across_orderings() {
        let table = mapping();
        let forward = apply_mapping(["E119", "I5022", "E1165"], &table);
        let reversed = apply_mapping(["E1165", "I5022", "E119"], &table);
        assert_eq!(forward, reversed);
        assert_eq!(forward, apply_mapping(["E119", "I5022", "E1165"], &table));
    }
}
