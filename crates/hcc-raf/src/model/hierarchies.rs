use super::name::{ModelDomain, ModelName};
use crate::reference::HierarchyTable;
use std::collections::BTreeSet;

const V28_CC223_COMPANIONS: [&str; 5] = ["221", "222", "224", "225", "226"];
const ESRD_V21_REMOVED: [&str; 1] = ["134"];
const ESRD_V24_REMOVED: [&str; 4] = ["134", "135", "136", "137"];

/// Collapses the active category set through the model's hierarchy rules.
///
/// Fixed per-model overrides run first. The generic collapse is a single pass:
/// every removal is decided against the same snapshot of the active set and
/// subtracted once at the end, so rules never cascade within one call.
pub fn apply_hierarchies(
    active: &BTreeSet<String>,
    model: &ModelName,
    hierarchies: &HierarchyTable,
) -> BTreeSet<String> {
    let snapshot = apply_model_overrides(active, model);

    let mut to_remove = BTreeSet::new();
    for cc in &snapshot {
        if let Some(children) = hierarchies.children(cc) {
            to_remove.extend(children.intersection(&snapshot).cloned());
        }
    }

    snapshot.difference(&to_remove).cloned().collect()
}

fn apply_model_overrides(active: &BTreeSet<String>, model: &ModelName) -> BTreeSet<String> {
    let mut working = active.clone();

    match (model.domain, model.version.0) {
        (ModelDomain::CmsHcc, 28) => {
            let has_companion = V28_CC223_COMPANIONS
                .iter()
                .any(|cc| working.contains(*cc));
            if !has_companion {
                working.remove("223");
            }
        }
        // The unconditional ESRD removals mirror the published software and
        // are still awaiting confirmation against the model documentation.
        (ModelDomain::Esrd, 21) => {
            for cc in ESRD_V21_REMOVED {
                working.remove(cc);
            }
        }
        (ModelDomain::Esrd, 24) => {
            for cc in ESRD_V24_REMOVED {
                working.remove(cc);
            }
        }
        _ => {}
    }

    working
}

#[cfg(test)]
mod tests {
    use super::*;

    const V24: ModelName = ModelName::new(ModelDomain::CmsHcc, 24);
    const V28: ModelName = ModelName::new(ModelDomain::CmsHcc, 28);
    const ESRD_V21: ModelName = ModelName::new(ModelDomain::Esrd, 21);
    const ESRD_V24: ModelName = ModelName::new(ModelDomain::Esrd, 24);

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn diabetes_rules() -> HierarchyTable {
        [("17", "18"), ("17", "19"), ("18", "19")].into_iter().collect()
    }

    #[test]
    fn parent_removes_children() {
        let rules = diabetes_rules();
        assert_eq!(apply_hierarchies(&set(&["17", "18", "19"]), &V28, &rules), set(&["17"]));
        assert_eq!(apply_hierarchies(&set(&["18", "19"]), &V28, &rules), set(&["18"]));
    }

    #[test]
    fn multiple_hierarchies_apply_together() {
        let rules: HierarchyTable = [
            ("17", "18"),
            ("17", "19"),
            ("130", "131"),
            ("130", "132"),
        ]
        .into_iter()
        .collect();

        let active = set(&["17", "18", "19", "130", "131", "132"]);
        assert_eq!(apply_hierarchies(&active, &V24, &rules), set(&["17", "130"]));
    }

    #[test]
    fn collapse_is_single_pass_not_transitive() {
        let rules: HierarchyTable = [("parent", "mid"), ("mid", "leaf")].into_iter().collect();

        let result = apply_hierarchies(&set(&["parent", "leaf"]), &V24, &rules);
        assert_eq!(result, set(&["parent", "leaf"]));

        let result = apply_hierarchies(&set(&["parent", "mid", "leaf"]), &V24, &rules);
        assert_eq!(result, set(&["parent"]));
    }

    #[test]
    fn mutual_parents_remove_each_other() {
        let rules: HierarchyTable = [("A", "B"), ("B", "A")].into_iter().collect();
        let result = apply_hierarchies(&set(&["A", "B", "C"]), &V24, &rules);
        assert_eq!(result, set(&["C"]));
    }

    #[test]
    fn v28_drops_cc223_without_companion() {
        let rules = HierarchyTable::default();
        assert!(apply_hierarchies(&set(&["223"]), &V28, &rules).is_empty());
        assert_eq!(
            apply_hierarchies(&set(&["223", "225"]), &V28, &rules),
            set(&["223", "225"])
        );
        assert_eq!(
            apply_hierarchies(&set(&["221", "223"]), &V28, &rules),
            set(&["221", "223"])
        );
    }

    #[test]
    fn v28_companion_does_not_shield_cc223_from_generic_rules() {
        let rules: HierarchyTable = [("222", "223")].into_iter().collect();
        assert_eq!(apply_hierarchies(&set(&["222", "223"]), &V28, &rules), set(&["222"]));
    }

    #[test]
    fn cc223_rule_is_v28_only() {
        let rules = HierarchyTable::default();
        assert_eq!(apply_hierarchies(&set(&["223"]), &V24, &rules), set(&["223"]));
    }

    #[test]
    fn esrd_overrides_remove_fixed_categories() {
        let rules = HierarchyTable::default();
        assert_eq!(
            apply_hierarchies(&set(&["134", "135"]), &ESRD_V21, &rules),
            set(&["135"])
        );
        assert!(
            apply_hierarchies(&set(&["134", "135", "136", "137"]), &ESRD_V24, &rules).is_empty()
        );
        assert_eq!(
            apply_hierarchies(&set(&["134", "138"]), &ESRD_V24, &rules),
            set(&["138"])
        );
    }

    #[test]
    fn input_set_is_not_modified() {
        let active = set(&["17", "18", "19", "223"]);
        let original = active.clone();
        let _ = apply_hierarchies(&active, &V28, &diabetes_rules());
        assert_eq!(active, original);
    }

    #[test]
    fn empty_inputs_pass_through() {
        assert!(apply_hierarchies(&BTreeSet::new(), &V28, &diabetes_rules()).is_empty());
        assert_eq!(
            apply_hierarchies(&set(&["17"]), &V28, &HierarchyTable::default()),
            set(&["17"])
        );
    }
}
