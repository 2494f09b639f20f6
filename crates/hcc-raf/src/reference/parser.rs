use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::io::Read;

#[derive(Debug, Deserialize)]
pub(crate) struct DxToCcRow {
    pub(crate) diagnosis_code: String,
    pub(crate) cc: String,
    pub(crate) model_name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HierarchyRow {
    pub(crate) cc_parent: String,
    pub(crate) cc_child: String,
    pub(crate) model_domain: String,
    pub(crate) model_version: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) model_fullname: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CoefficientRow {
    pub(crate) coefficient: String,
    pub(crate) value: f64,
    pub(crate) model_domain: String,
    pub(crate) model_version: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChronicRow {
    pub(crate) hcc: String,
    pub(crate) is_chronic: String,
    pub(crate) model_version: String,
    pub(crate) model_domain: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EligibleProcedureRow {
    pub(crate) cpt_hcpcs_code: String,
}

pub(crate) fn parse_rows<R: Read, T: DeserializeOwned>(reader: R) -> Result<Vec<T>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    csv_reader.deserialize::<T>().collect()
}

pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_uppercase().as_str() {
        "Y" | "YES" | "TRUE" | "1" => Some(true),
        "N" | "NO" | "FALSE" | "0" => Some(false),
        _ => None,
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn hierarchy_rows_allow_missing_fullname() {
        let rows: Vec<HierarchyRow> = parse_rows(Cursor::new(
            "cc_parent,cc_child,model_domain,model_version,model_fullname\n\
17,18,CMS-HCC,V24,CMS-HCC Model V24\n\
134,135,ESRD,V24,\n",
        ))
        .expect("rows parse");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].model_fullname.as_deref(), Some("CMS-HCC Model V24"));
        assert!(rows[1].model_fullname.is_none());
        assert_eq!(rows[1].model_domain, "ESRD");
    }

    #[test]
    fn coefficient_rows_parse_values() {
        let rows: Vec<CoefficientRow> = parse_rows(Cursor::new(
            "coefficient,value,model_domain,model_version\nCNA_HCC19 , 0.421 ,CMS-HCC,V28\n",
        ))
        .expect("rows parse");

        assert_eq!(rows[0].coefficient, "CNA_HCC19");
        assert!((rows[0].value - 0.421).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_values_surface_csv_errors() {
        let result: Result<Vec<CoefficientRow>, _> = parse_rows(Cursor::new(
            "coefficient,value,model_domain,model_version\nCNA_HCC19,abc,CMS-HCC,V28\n",
        ));
        assert!(result.is_err());
    }

    #[test]
    fn flags_accept_common_spellings() {
        assert_eq!(parse_flag("Y"), Some(true));
        assert_eq!(parse_flag(" n "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
