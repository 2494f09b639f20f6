use crate::infra::reference_loader;
use clap::Args;
use hcc_raf::config::{AppConfig, ReferenceConfig};
use hcc_raf::error::AppError;
use hcc_raf::model::{
    AgeSexScheme, CalculationPolicy, Demographics, DemographicsInput, ModelName, RafCalculator,
    RafRequest,
};
use hcc_raf::reference::ReferenceData;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct CalculateArgs {
    /// Model name, e.g. "CMS-HCC Model V28". Defaults to RAF_DEFAULT_MODEL.
    #[arg(long)]
    pub(crate) model: Option<String>,
    /// Diagnosis code (repeatable, dots optional)
    #[arg(long = "dx")]
    pub(crate) diagnoses: Vec<String>,
    #[arg(long)]
    pub(crate) age: u32,
    /// M, F, 1 or 2
    #[arg(long)]
    pub(crate) sex: String,
    /// Medicare/Medicaid dual eligibility code
    #[arg(long, default_value = "00")]
    pub(crate) dual: String,
    /// Original reason for entitlement
    #[arg(long, default_value = "0")]
    pub(crate) orec: String,
    /// Current reason for entitlement
    #[arg(long, default_value = "0")]
    pub(crate) crec: String,
    #[arg(long)]
    pub(crate) new_enrollee: bool,
    #[arg(long)]
    pub(crate) snp: bool,
    #[arg(long)]
    pub(crate) low_income: bool,
    /// Long-term institutional
    #[arg(long)]
    pub(crate) lti: bool,
    /// Months since kidney transplant
    #[arg(long)]
    pub(crate) graft_months: Option<u32>,
    /// Interaction term as NAME=VALUE (repeatable)
    #[arg(long = "interaction", value_parser = parse_interaction)]
    pub(crate) interactions: Vec<(String, f64)>,
    /// Reference CSV directory. Defaults to RAF_DATA_DIR.
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct InspectArgs {
    /// Reference CSV directory. Defaults to RAF_DATA_DIR.
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

pub(crate) fn parse_interaction(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("interaction name is empty in '{raw}'"));
    }
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("interaction '{name}' has a non-numeric value ({err})"))?;
    Ok((name.to_string(), value))
}

/// Resolves the model (falling back to the configured default) and derives
/// demographics for a single calculation.
pub(crate) fn build_request(
    model_name: Option<&str>,
    default_model: ModelName,
    diagnoses: Vec<String>,
    demographics: DemographicsInput,
    interactions: BTreeMap<String, f64>,
) -> Result<RafRequest, AppError> {
    let model = match model_name {
        Some(name) => name.parse::<ModelName>()?,
        None => default_model,
    };
    let demographics = Demographics::from_input(demographics, AgeSexScheme::Medicare)?;

    let mut request = RafRequest::new(model, diagnoses, demographics);
    request.interactions = interactions;
    Ok(request)
}

pub(crate) fn run_calculate(args: CalculateArgs) -> Result<(), AppError> {
    let mut settings = AppConfig::load()?.reference;
    apply_data_dir(&mut settings, args.data_dir.clone());

    let mut input = DemographicsInput::new(args.age, args.sex);
    input.dual_elgbl_cd = args.dual;
    input.orec = args.orec;
    input.crec = args.crec;
    input.new_enrollee = args.new_enrollee;
    input.snp = args.snp;
    input.low_income = args.low_income;
    input.lti = args.lti;
    input.graft_months = args.graft_months;

    let request = build_request(
        args.model.as_deref(),
        settings.default_model,
        args.diagnoses,
        input,
        args.interactions.into_iter().collect(),
    )?;

    let snapshot = reference_loader(&settings).load()?;
    let calculator = RafCalculator::new(Arc::new(snapshot)).with_policy(CalculationPolicy {
        require_diagnoses: settings.require_diagnoses,
    });
    let result = calculator.calculate(&request)?;

    print_json(&result)
}

pub(crate) fn run_inspect(args: InspectArgs) -> Result<(), AppError> {
    let mut settings = AppConfig::load()?.reference;
    apply_data_dir(&mut settings, args.data_dir);

    let snapshot = reference_loader(&settings).load()?;
    let anomalies: BTreeMap<String, _> = snapshot
        .models()
        .into_iter()
        .filter_map(|model| {
            let found = snapshot.hierarchies(&model)?.anomalies();
            (!found.is_empty()).then(|| (model.to_string(), found))
        })
        .collect();

    print_json(&json!({
        "summary": snapshot.summary(),
        "hierarchy_anomalies": anomalies,
    }))
}

fn apply_data_dir(settings: &mut ReferenceConfig, data_dir: Option<PathBuf>) {
    if let Some(dir) = data_dir {
        settings.data_dir = dir;
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
    println!("{rendered}");
    Ok(())
}
