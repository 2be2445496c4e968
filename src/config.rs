use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pipeline configuration, normally loaded from a TOML file.
///
/// The `xbrl_mapping` sections tell the entity mappers which element id
/// carries each output field. Configuration is always passed explicitly
/// into the mappers and the orchestrator; there is no global state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub xbrl_mapping: XbrlMapping,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct XbrlMapping {
    pub company: Option<CompanyMapping>,
    pub financial_report: Option<ReportMapping>,
}

/// `[xbrl_mapping.company]`: output field -> element identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyMapping {
    pub edinet_code: String,
    pub company_name: String,
    #[serde(default)]
    pub security_code: Option<String>,
    #[serde(default)]
    pub industry_code: Option<String>,
}

/// `[xbrl_mapping.financial_report]`: output field -> element identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMapping {
    /// Element id of the composite fiscal-period label, e.g.
    /// `第121期 第３四半期(自 2023年10月1日 至 2023年12月31日)`.
    pub fiscal_year_and_quarter: String,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub fiscal_year_end: Option<String>,
    #[serde(default)]
    pub filing_date: Option<String>,
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// The company mapping section, or a configuration error if the
    /// deployment left it out.
    pub fn company_mapping(&self) -> Result<&CompanyMapping> {
        self.xbrl_mapping
            .company
            .as_ref()
            .ok_or(PipelineError::MissingConfigSection("xbrl_mapping.company"))
    }

    /// The report mapping section, or a configuration error if the
    /// deployment left it out.
    pub fn report_mapping(&self) -> Result<&ReportMapping> {
        self.xbrl_mapping
            .financial_report
            .as_ref()
            .ok_or(PipelineError::MissingConfigSection(
                "xbrl_mapping.financial_report",
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[xbrl_mapping.company]
edinet_code = "jpdei_cor:EDINETCodeDEI"
company_name = "jpdei_cor:FilerNameInJapaneseDEI"
security_code = "jpdei_cor:SecurityCodeDEI"

[xbrl_mapping.financial_report]
fiscal_year_and_quarter = "jpcrp_cor:FiscalYearCoverPage"
document_type = "jpdei_cor:DocumentTypeDEI"
fiscal_year_end = "jpdei_cor:CurrentPeriodEndDateDEI"
"#;

    #[test]
    fn test_parse_toml() {
        let config = PipelineConfig::from_toml_str(SAMPLE).unwrap();

        let company = config.company_mapping().unwrap();
        assert_eq!(company.edinet_code, "jpdei_cor:EDINETCodeDEI");
        assert_eq!(company.security_code.as_deref(), Some("jpdei_cor:SecurityCodeDEI"));
        assert!(company.industry_code.is_none());

        let report = config.report_mapping().unwrap();
        assert_eq!(report.fiscal_year_and_quarter, "jpcrp_cor:FiscalYearCoverPage");
        assert!(report.filing_date.is_none());
    }

    #[test]
    fn test_missing_sections_are_config_errors() {
        let config = PipelineConfig::from_toml_str("").unwrap();

        assert!(matches!(
            config.company_mapping(),
            Err(PipelineError::MissingConfigSection("xbrl_mapping.company"))
        ));
        assert!(matches!(
            config.report_mapping(),
            Err(PipelineError::MissingConfigSection(
                "xbrl_mapping.financial_report"
            ))
        ));
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        assert!(matches!(
            PipelineConfig::from_toml_str("xbrl_mapping = 1"),
            Err(PipelineError::Config(_))
        ));
    }
}
