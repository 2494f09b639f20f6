//! Risk adjustment rule engine: diagnosis normalization, category mapping,
//! hierarchy collapse and coefficient aggregation.

mod calculate;
mod coefficients;
mod demographics;
mod dx_to_cc;
mod hierarchies;
mod name;
mod normalizer;

pub use calculate::{CalculationError, CalculationPolicy, RafCalculator, RafRequest, RafResult};
pub use coefficients::{apply_coefficients, coefficient_prefix, total_score};
pub use demographics::{
    categorize_age_sex, AgeSexScheme, Demographics, DemographicsError, DemographicsInput, Sex,
};
pub use dx_to_cc::{apply_mapping, get_cc, CcToDx};
pub use hierarchies::apply_hierarchies;
pub use name::{ModelDomain, ModelError, ModelName, ModelVersion};
pub use normalizer::normalize_diagnosis_code;
