use super::coefficients::{apply_coefficients, total_score};
use super::demographics::Demographics;
use super::dx_to_cc::{apply_mapping, CcToDx};
use super::hierarchies::apply_hierarchies;
use super::name::ModelName;
use super::normalizer::normalize_diagnosis_code;
use crate::reference::{CoefficientTable, HierarchyTable, ReferenceData, ReferenceError};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalculationPolicy {
    /// Reject requests that carry no diagnosis codes instead of scoring
    /// demographics alone.
    pub require_diagnoses: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RafRequest {
    pub model: ModelName,
    pub diagnosis_codes: Vec<String>,
    pub demographics: Demographics,
    pub interactions: BTreeMap<String, f64>,
}

impl RafRequest {
    pub fn new<I, S>(model: ModelName, diagnosis_codes: I, demographics: Demographics) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            model,
            diagnosis_codes: diagnosis_codes.into_iter().map(Into::into).collect(),
            demographics,
            interactions: BTreeMap::new(),
        }
    }

    pub fn with_interaction(mut self, name: impl Into<String>, value: f64) -> Self {
        self.interactions.insert(name.into(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RafResult {
    pub model: ModelName,
    pub risk_score: f64,
    pub risk_score_demographics: f64,
    pub risk_score_chronic_only: f64,
    pub risk_score_hcc: f64,
    pub hcc_list: Vec<String>,
    pub cc_to_dx: CcToDx,
    pub coefficients: BTreeMap<String, f64>,
    pub interactions: BTreeMap<String, f64>,
    pub chronic: BTreeMap<String, bool>,
    pub demographics: Demographics,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalculationError {
    #[error("at least one diagnosis code is required")]
    EmptyDiagnoses,
    #[error(transparent)]
    Reference(#[from] ReferenceError),
}

/// Runs the full scoring pipeline against a shared reference snapshot.
#[derive(Debug)]
pub struct RafCalculator<R> {
    reference: Arc<R>,
    policy: CalculationPolicy,
}

impl<R> Clone for RafCalculator<R> {
    fn clone(&self) -> Self {
        Self {
            reference: Arc::clone(&self.reference),
            policy: self.policy,
        }
    }
}

impl<R: ReferenceData> RafCalculator<R> {
    pub fn new(reference: Arc<R>) -> Self {
        Self {
            reference,
            policy: CalculationPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CalculationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> CalculationPolicy {
        self.policy
    }

    pub fn reference(&self) -> &Arc<R> {
        &self.reference
    }

    pub fn calculate(&self, request: &RafRequest) -> Result<RafResult, CalculationError> {
        let has_diagnosis = request
            .diagnosis_codes
            .iter()
            .any(|dx| !normalize_diagnosis_code(dx).is_empty());
        if self.policy.require_diagnoses && !has_diagnosis {
            return Err(CalculationError::EmptyDiagnoses);
        }

        let model = &request.model;
        let dx_to_cc = self.reference.require_dx_to_cc(model)?;

        // Absent hierarchy or coefficient tables contribute nothing.
        let no_hierarchies = HierarchyTable::default();
        let no_coefficients = CoefficientTable::default();
        let hierarchies = self
            .reference
            .hierarchies(model)
            .unwrap_or(&no_hierarchies);
        let coefficients = self
            .reference
            .coefficients(model)
            .unwrap_or(&no_coefficients);
        let chronic_flags = self.reference.chronic_flags(model);

        let mapped = apply_mapping(&request.diagnosis_codes, dx_to_cc);
        let active: BTreeSet<String> = mapped.keys().cloned().collect();
        let retained = apply_hierarchies(&active, model, hierarchies);

        let weights = apply_coefficients(
            &request.demographics,
            &retained,
            &request.interactions,
            model,
            coefficients,
        );

        let chronic: BTreeMap<String, bool> = retained
            .iter()
            .map(|hcc| {
                let flag = chronic_flags
                    .and_then(|flags| flags.is_chronic(hcc))
                    .unwrap_or(false);
                (hcc.clone(), flag)
            })
            .collect();

        let mut risk_score_demographics = 0.0;
        let mut risk_score_hcc = 0.0;
        let mut risk_score_chronic_only = 0.0;
        for (variable, weight) in &weights {
            if *variable == request.demographics.category {
                risk_score_demographics += weight;
                continue;
            }
            risk_score_hcc += weight;
            if chronic.get(variable).copied().unwrap_or(false) {
                risk_score_chronic_only += weight;
            }
        }

        let cc_to_dx: CcToDx = mapped
            .into_iter()
            .filter(|(cc, _)| retained.contains(cc))
            .collect();

        let risk_score = total_score(&weights);
        debug!(
            %model,
            diagnoses = request.diagnosis_codes.len(),
            active = active.len(),
            retained = retained.len(),
            risk_score,
            "calculated risk score"
        );

        Ok(RafResult {
            model: *model,
            risk_score,
            risk_score_demographics,
            risk_score_chronic_only,
            risk_score_hcc,
            hcc_list: retained.into_iter().collect(),
            cc_to_dx,
            coefficients: weights,
            interactions: request.interactions.clone(),
            chronic,
            demographics: request.demographics.clone(),
        })
    }
}
