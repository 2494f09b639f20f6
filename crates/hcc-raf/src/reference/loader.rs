use super::parser::{
    parse_flag, parse_rows, ChronicRow, CoefficientRow, DxToCcRow, EligibleProcedureRow,
    HierarchyRow,
};
use super::snapshot::{ReferenceSnapshot, ReferenceSnapshotBuilder};
use super::ReferenceData;
use crate::model::{ModelError, ModelName};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ReferenceLoadError {
    #[error("failed to read reference data at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid reference CSV {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },
    #[error("invalid model columns in {file}: {source}")]
    Model {
        file: String,
        #[source]
        source: ModelError,
    },
    #[error("cannot infer the payment year from {0}")]
    MissingYear(String),
    #[error("configured mapping file {0} was not found in the reference directory")]
    MissingFile(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableKind {
    EligibleProcedures,
    Coefficients,
    DxToCc,
    Hierarchies,
    Chronic,
}

impl TableKind {
    fn classify(file_name: &str) -> Option<Self> {
        if file_name.contains("ra_eligible_cpt_hcpcs") {
            Some(Self::EligibleProcedures)
        } else if file_name.contains("ra_coefficients") {
            Some(Self::Coefficients)
        } else if file_name.contains("ra_dx_to_cc") {
            Some(Self::DxToCc)
        } else if file_name.contains("ra_hierarchies") {
            Some(Self::Hierarchies)
        } else if file_name.contains("hcc_is_chronic") {
            Some(Self::Chronic)
        } else {
            None
        }
    }
}

/// Builds a [`ReferenceSnapshot`] from a directory of CSV exports.
///
/// Files are recognised by name (`ra_dx_to_cc_2026.csv`,
/// `ra_hierarchies_2026.csv`, `ra_coefficients_2026.csv`,
/// `hcc_is_chronic.csv`, `ra_eligible_cpt_hcpcs_2026.csv`) and read in
/// lexical order. Anything else in the directory is ignored.
#[derive(Debug, Clone)]
pub struct ReferenceLoader {
    dir: PathBuf,
    dx_to_cc_file: Option<String>,
}

impl ReferenceLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            dx_to_cc_file: None,
        }
    }

    /// Restricts diagnosis mappings to a single file, e.g. one payment
    /// year's `ra_dx_to_cc_2025.csv`.
    pub fn with_dx_to_cc_file(mut self, file_name: impl Into<String>) -> Self {
        self.dx_to_cc_file = Some(file_name.into());
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load(&self) -> Result<ReferenceSnapshot, ReferenceLoadError> {
        let mut builder = ReferenceSnapshot::builder().source(self.dir.clone());
        let mut saw_dx_file = false;

        for path in self.csv_files()? {
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();

            let Some(kind) = TableKind::classify(&file_name) else {
                debug!(file = %file_name, "skipping unrecognised reference file");
                continue;
            };

            if kind == TableKind::DxToCc {
                if let Some(wanted) = &self.dx_to_cc_file {
                    if wanted != &file_name {
                        debug!(file = %file_name, "skipping mapping file outside configured year");
                        continue;
                    }
                }
                saw_dx_file = true;
            }

            let file = std::fs::File::open(&path).map_err(|source| ReferenceLoadError::Io {
                path: path.clone(),
                source,
            })?;
            let rows = ingest(kind, &file_name, file, &mut builder)?;
            info!(file = %file_name, rows, "loaded reference table");
        }

        if let Some(wanted) = &self.dx_to_cc_file {
            if !saw_dx_file {
                return Err(ReferenceLoadError::MissingFile(wanted.clone()));
            }
        }

        let snapshot = builder.build();
        report_hierarchy_anomalies(&snapshot);
        Ok(snapshot)
    }

    fn csv_files(&self) -> Result<Vec<PathBuf>, ReferenceLoadError> {
        let io_error = |source| ReferenceLoadError::Io {
            path: self.dir.clone(),
            source,
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if path.is_file() && is_csv {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

fn ingest<R: Read>(
    kind: TableKind,
    file_name: &str,
    reader: R,
    builder: &mut ReferenceSnapshotBuilder,
) -> Result<usize, ReferenceLoadError> {
    let csv_error = |source| ReferenceLoadError::Csv {
        file: file_name.to_string(),
        source,
    };
    let model_error = |source| ReferenceLoadError::Model {
        file: file_name.to_string(),
        source,
    };

    match kind {
        TableKind::DxToCc => {
            let rows: Vec<DxToCcRow> = parse_rows(reader).map_err(csv_error)?;
            for row in &rows {
                let model: ModelName = row.model_name.parse().map_err(model_error)?;
                builder.add_dx_to_cc(model, &row.diagnosis_code, &row.cc);
            }
            Ok(rows.len())
        }
        TableKind::Hierarchies => {
            let rows: Vec<HierarchyRow> = parse_rows(reader).map_err(csv_error)?;
            for row in &rows {
                let model = match &row.model_fullname {
                    Some(fullname) => fullname.parse(),
                    None => ModelName::from_parts(&row.model_domain, &row.model_version),
                }
                .map_err(model_error)?;
                builder.add_hierarchy(model, &row.cc_parent, &row.cc_child);
            }
            Ok(rows.len())
        }
        TableKind::Coefficients => {
            let rows: Vec<CoefficientRow> = parse_rows(reader).map_err(csv_error)?;
            for row in &rows {
                let model = ModelName::from_parts(&row.model_domain, &row.model_version)
                    .map_err(model_error)?;
                builder.add_coefficient(model, &row.coefficient, row.value);
            }
            Ok(rows.len())
        }
        TableKind::Chronic => {
            let rows: Vec<ChronicRow> = parse_rows(reader).map_err(csv_error)?;
            for row in &rows {
                let model = ModelName::from_parts(&row.model_domain, &row.model_version)
                    .map_err(model_error)?;
                // Flags only feed reporting; anything unrecognised is not chronic.
                let chronic = parse_flag(&row.is_chronic).unwrap_or_else(|| {
                    if !row.is_chronic.is_empty() {
                        warn!(
                            file = %file_name,
                            hcc = %row.hcc,
                            value = %row.is_chronic,
                            "unrecognised chronic flag"
                        );
                    }
                    false
                });
                builder.add_chronic(model, &row.hcc, chronic);
            }
            Ok(rows.len())
        }
        TableKind::EligibleProcedures => {
            let year = year_from_file_name(file_name)
                .ok_or_else(|| ReferenceLoadError::MissingYear(file_name.to_string()))?;
            let rows: Vec<EligibleProcedureRow> = parse_rows(reader).map_err(csv_error)?;
            for row in &rows {
                builder.add_eligible_procedure(year, &row.cpt_hcpcs_code);
            }
            Ok(rows.len())
        }
    }
}

fn year_from_file_name(file_name: &str) -> Option<u16> {
    let stem = file_name.rsplit_once('.').map_or(file_name, |(stem, _)| stem);
    stem.rsplit('_').next()?.parse().ok()
}

fn report_hierarchy_anomalies(snapshot: &ReferenceSnapshot) {
    for model in snapshot.models() {
        let Some(table) = snapshot.hierarchies(&model) else {
            continue;
        };
        for anomaly in table.anomalies() {
            warn!(%model, ?anomaly, "hierarchy rule anomaly");
        }
    }
}
