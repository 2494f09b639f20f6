use super::tables::{
    ChronicFlags, CoefficientTable, DxToCcTable, EligibleProcedures, HierarchyTable,
};
use super::ReferenceData;
use crate::model::ModelName;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Immutable set of reference tables shared by every calculation.
///
/// A snapshot is never mutated once built. Reloading produces a new snapshot
/// that callers swap in wholesale.
#[derive(Debug, Clone)]
pub struct ReferenceSnapshot {
    dx_to_cc: HashMap<ModelName, DxToCcTable>,
    hierarchies: HashMap<ModelName, HierarchyTable>,
    coefficients: HashMap<ModelName, CoefficientTable>,
    chronic: HashMap<ModelName, ChronicFlags>,
    eligible_procedures: BTreeMap<u16, EligibleProcedures>,
    loaded_at: DateTime<Utc>,
    source: Option<PathBuf>,
}

impl ReferenceSnapshot {
    pub fn builder() -> ReferenceSnapshotBuilder {
        ReferenceSnapshotBuilder::default()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn models(&self) -> BTreeSet<ModelName> {
        self.dx_to_cc
            .keys()
            .chain(self.hierarchies.keys())
            .chain(self.coefficients.keys())
            .chain(self.chronic.keys())
            .copied()
            .collect()
    }

    pub fn summary(&self) -> ReferenceSummary {
        let models = self
            .models()
            .into_iter()
            .map(|model| ModelSummary {
                model,
                dx_mappings: self.dx_to_cc.get(&model).map_or(0, DxToCcTable::len),
                hierarchy_rules: self.hierarchies.get(&model).map_or(0, HierarchyTable::len),
                coefficients: self.coefficients.get(&model).map_or(0, CoefficientTable::len),
                chronic_flags: self.chronic.get(&model).map_or(0, ChronicFlags::len),
            })
            .collect();

        ReferenceSummary {
            loaded_at: self.loaded_at,
            source: self.source.as_ref().map(|path| path.display().to_string()),
            models,
            eligible_procedure_years: self.eligible_procedures.keys().copied().collect(),
        }
    }
}

impl ReferenceData for ReferenceSnapshot {
    fn dx_to_cc(&self, model: &ModelName) -> Option<&DxToCcTable> {
        self.dx_to_cc.get(model)
    }

    fn hierarchies(&self, model: &ModelName) -> Option<&HierarchyTable> {
        self.hierarchies.get(model)
    }

    fn coefficients(&self, model: &ModelName) -> Option<&CoefficientTable> {
        self.coefficients.get(model)
    }

    fn chronic_flags(&self, model: &ModelName) -> Option<&ChronicFlags> {
        self.chronic.get(model)
    }

    fn eligible_procedures(&self, year: u16) -> Option<&EligibleProcedures> {
        self.eligible_procedures.get(&year)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferenceSummary {
    pub loaded_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub models: Vec<ModelSummary>,
    pub eligible_procedure_years: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelSummary {
    pub model: ModelName,
    pub dx_mappings: usize,
    pub hierarchy_rules: usize,
    pub coefficients: usize,
    pub chronic_flags: usize,
}

/// Accumulates rows before freezing them into a [`ReferenceSnapshot`].
#[derive(Debug, Default)]
pub struct ReferenceSnapshotBuilder {
    dx_to_cc: HashMap<ModelName, DxToCcTable>,
    hierarchies: HashMap<ModelName, HierarchyTable>,
    coefficients: HashMap<ModelName, CoefficientTable>,
    chronic: HashMap<ModelName, ChronicFlags>,
    eligible_procedures: BTreeMap<u16, EligibleProcedures>,
    source: Option<PathBuf>,
}

impl ReferenceSnapshotBuilder {
    pub fn dx_to_cc(mut self, model: ModelName, diagnosis_code: &str, cc: &str) -> Self {
        self.add_dx_to_cc(model, diagnosis_code, cc);
        self
    }

    pub fn hierarchy(mut self, model: ModelName, parent: &str, child: &str) -> Self {
        self.add_hierarchy(model, parent, child);
        self
    }

    pub fn coefficient(mut self, model: ModelName, variable: &str, value: f64) -> Self {
        self.add_coefficient(model, variable, value);
        self
    }

    pub fn chronic(mut self, model: ModelName, hcc: &str, chronic: bool) -> Self {
        self.add_chronic(model, hcc, chronic);
        self
    }

    pub fn eligible_procedure(mut self, year: u16, code: &str) -> Self {
        self.add_eligible_procedure(year, code);
        self
    }

    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    pub(crate) fn add_dx_to_cc(&mut self, model: ModelName, diagnosis_code: &str, cc: &str) {
        self.dx_to_cc
            .entry(model)
            .or_default()
            .insert(diagnosis_code, cc.trim());
    }

    pub(crate) fn add_hierarchy(&mut self, model: ModelName, parent: &str, child: &str) {
        self.hierarchies
            .entry(model)
            .or_default()
            .insert(parent.trim(), child.trim());
    }

    pub(crate) fn add_coefficient(&mut self, model: ModelName, variable: &str, value: f64) {
        self.coefficients
            .entry(model)
            .or_default()
            .insert(variable, value);
    }

    pub(crate) fn add_chronic(&mut self, model: ModelName, hcc: &str, chronic: bool) {
        self.chronic
            .entry(model)
            .or_default()
            .insert(hcc.trim(), chronic);
    }

    pub(crate) fn add_eligible_procedure(&mut self, year: u16, code: &str) {
        self.eligible_procedures
            .entry(year)
            .or_default()
            .insert(code);
    }

    pub fn build(self) -> ReferenceSnapshot {
        ReferenceSnapshot {
            dx_to_cc: self.dx_to_cc,
            hierarchies: self.hierarchies,
            coefficients: self.coefficients,
            chronic: self.chronic,
            eligible_procedures: self.eligible_procedures,
            loaded_at: Utc::now(),
            source: self.source,
        }
    }
}
