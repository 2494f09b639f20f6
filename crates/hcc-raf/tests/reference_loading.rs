use hcc_raf::model::{ModelDomain, ModelName};
use hcc_raf::reference::{ReferenceData, ReferenceLoadError, ReferenceLoader};
use std::fs;
use std::path::PathBuf;

const V24: ModelName = ModelName::new(ModelDomain::CmsHcc, 24);
const V28: ModelName = ModelName::new(ModelDomain::CmsHcc, 28);
const ESRD_V24: ModelName = ModelName::new(ModelDomain::Esrd, 24);

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

#[test]
fn loads_every_recognised_table() {
    let snapshot = ReferenceLoader::new(fixtures())
        .load()
        .expect("fixtures load");

    let models: Vec<ModelName> = snapshot.models().into_iter().collect();
    assert_eq!(models, vec![V24, V28, ESRD_V24]);

    let v24 = snapshot.dx_to_cc(&V24).expect("v24 mappings");
    assert_eq!(v24.get("E1100").map(|ccs| ccs.len()), Some(1));

    let v28 = snapshot.dx_to_cc(&V28).expect("v28 mappings");
    assert!(v28.get("J449").is_some(), "dotted codes are normalized on load");

    let hierarchies = snapshot.hierarchies(&ESRD_V24).expect("esrd hierarchy");
    assert!(hierarchies.children("134").is_some());

    let coefficients = snapshot.coefficients(&V28).expect("v28 coefficients");
    assert_eq!(coefficients.get("cna_hcc36"), Some(0.166));

    let chronic = snapshot.chronic_flags(&V28).expect("v28 chronic flags");
    assert_eq!(chronic.is_chronic("226"), Some(false));
    assert_eq!(chronic.is_chronic("38"), Some(true));

    let procedures = snapshot.eligible_procedures(2026).expect("2026 procedures");
    assert!(procedures.contains("G0402"));
    assert!(!procedures.contains("00100"));
    assert!(snapshot.eligible_procedures(2025).is_none());
}

#[test]
fn dx_file_restriction_limits_mappings_to_one_year() {
    let snapshot = ReferenceLoader::new(fixtures())
        .with_dx_to_cc_file("ra_dx_to_cc_2025.csv")
        .load()
        .expect("fixtures load");

    let v28 = snapshot.dx_to_cc(&V28).expect("v28 mappings");
    assert!(v28.get("J449").is_none());
    assert!(v28.get("E119").is_some());
}

#[test]
fn missing_restricted_file_is_reported() {
    let error = ReferenceLoader::new(fixtures())
        .with_dx_to_cc_file("ra_dx_to_cc_2031.csv")
        .load()
        .expect_err("file is absent");

    assert!(matches!(error, ReferenceLoadError::MissingFile(name) if name == "ra_dx_to_cc_2031.csv"));
}

#[test]
fn summary_reports_row_counts() {
    let snapshot = ReferenceLoader::new(fixtures())
        .load()
        .expect("fixtures load");
    let summary = snapshot.summary();

    let v24 = summary
        .models
        .iter()
        .find(|entry| entry.model == V24)
        .expect("v24 summary");
    assert_eq!(v24.dx_mappings, 5);
    assert_eq!(v24.hierarchy_rules, 3);
    assert_eq!(v24.coefficients, 6);
    assert_eq!(v24.chronic_flags, 4);
    assert_eq!(summary.eligible_procedure_years, vec![2026]);
    assert!(summary.source.is_some());
}

#[test]
fn malformed_coefficient_file_names_the_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(
        dir.path().join("ra_coefficients_2026.csv"),
        "coefficient,value,model_domain,model_version\nCNA_HCC19,not-a-number,CMS-HCC,V28\n",
    )
    .expect("write fixture");

    let error = ReferenceLoader::new(dir.path())
        .load()
        .expect_err("bad value");

    match error {
        ReferenceLoadError::Csv { file, .. } => assert_eq!(file, "ra_coefficients_2026.csv"),
        other => panic!("expected csv error, got {other:?}"),
    }
}

#[test]
fn eligible_procedures_need_a_year_suffix() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(
        dir.path().join("ra_eligible_cpt_hcpcs.csv"),
        "cpt_hcpcs_code\n99213\n",
    )
    .expect("write fixture");

    let error = ReferenceLoader::new(dir.path())
        .load()
        .expect_err("year missing");
    assert!(matches!(error, ReferenceLoadError::MissingYear(_)));
}
