//! Reference tables consumed by the rule engine: diagnosis mappings,
//! hierarchy exclusions, coefficients, chronic flags and eligible procedures.
//!
//! The engine only sees the [`ReferenceData`] trait. The bundled
//! implementation is [`ReferenceSnapshot`], usually built from a directory of
//! CSV files by [`ReferenceLoader`].

mod loader;
mod parser;
mod snapshot;
mod tables;

pub use loader::{ReferenceLoadError, ReferenceLoader};
pub use snapshot::{ModelSummary, ReferenceSnapshot, ReferenceSnapshotBuilder, ReferenceSummary};
pub use tables::{
    ChronicFlags, CoefficientTable, DxToCcTable, EligibleProcedures, HierarchyAnomaly,
    HierarchyTable,
};

use crate::model::ModelName;

/// Read-only lookups keyed by model identity.
///
/// `None` always means "no table loaded for this key", which callers must
/// keep distinct from a loaded table that happens to lack an entry.
pub trait ReferenceData: Send + Sync {
    fn dx_to_cc(&self, model: &ModelName) -> Option<&DxToCcTable>;
    fn hierarchies(&self, model: &ModelName) -> Option<&HierarchyTable>;
    fn coefficients(&self, model: &ModelName) -> Option<&CoefficientTable>;
    fn chronic_flags(&self, model: &ModelName) -> Option<&ChronicFlags>;
    fn eligible_procedures(&self, year: u16) -> Option<&EligibleProcedures>;

    /// The diagnosis mapping is what makes a model usable; the other tables
    /// may legitimately be absent and are treated as empty.
    fn require_dx_to_cc(&self, model: &ModelName) -> Result<&DxToCcTable, ReferenceError> {
        self.dx_to_cc(model)
            .ok_or(ReferenceError::ModelNotLoaded { model: *model })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("no dx-to-cc mapping loaded for {model}")]
    ModelNotLoaded { model: ModelName },
}
