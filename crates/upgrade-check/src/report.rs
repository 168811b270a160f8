//! Human-readable suite report

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use crate::error::VerifyResult;
use crate::runner::SuiteReport;
use crate::workflow::RunReport;

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Render the suite report. Per target: success, or the failing step and its reason.
pub fn render(report: &SuiteReport, format: OutputFormat) -> VerifyResult<String> {
    match format {
        OutputFormat::Table => Ok(render_table(report)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(report)?),
    }
}

fn render_table(report: &SuiteReport) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Target", "Result", "Failed step", "Reason"]);

    for run in &report.results {
        table.add_row(row(run));
    }

    format!(
        "{table}\n{} target(s): {} passed, {} failed",
        report.total, report.passed, report.failed
    )
}

fn row(run: &RunReport) -> Vec<String> {
    match &run.failure {
        None => vec![
            run.target.url.clone(),
            "ok".to_string(),
            String::new(),
            String::new(),
        ],
        Some(failure) => vec![
            run.target.url.clone(),
            "FAILED".to_string(),
            failure.stage.to_string(),
            failure.reason.clone(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::VerificationTarget;
    use crate::error::VerifyError;
    use crate::workflow::Stage;

    fn suite() -> SuiteReport {
        let ok = RunReport {
            target: VerificationTarget::from_domain("a.example.com"),
            final_stage: Stage::Completed,
            steps: vec![],
            failure: None,
            order_id: Some(12),
            duration_ms: 10,
        };
        let failed = RunReport::not_started(
            VerificationTarget::from_domain("b.example.com"),
            &VerifyError::Driver("node missing".into()),
        );
        SuiteReport {
            total: 2,
            passed: 1,
            failed: 1,
            duration_ms: 10,
            results: vec![ok, failed],
        }
    }

    #[test]
    fn test_table_names_failing_step() {
        let out = render(&suite(), OutputFormat::Table).unwrap();
        assert!(out.contains("http://a.example.com"));
        assert!(out.contains("NotStarted"));
        assert!(out.contains("node missing"));
        assert!(out.contains("1 passed, 1 failed"));
    }

    #[test]
    fn test_json_round_trips() {
        let out = render(&suite(), OutputFormat::Json).unwrap();
        let parsed: SuiteReport = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[1].failure.as_ref().unwrap().stage, Stage::NotStarted);
    }
}
