use chrono::Utc;
use clap::Args;
use loan_verify::config::AppConfig;
use loan_verify::error::AppError;
use loan_verify::verification::{
    Application, ApplicationId, ApplicationSubmission, ExtractedData, FieldComparison,
    VerificationEngine, VerificationReport,
};
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct VerifyArgs {
    /// JSON file holding the declared application (name, annual_salary, employer_name, ssn)
    #[arg(long)]
    pub(crate) application: PathBuf,
    /// JSON file holding raw OCR output for the pay stub
    #[arg(long)]
    pub(crate) extraction: PathBuf,
    /// Print each stage as it completes instead of only the final report
    #[arg(long)]
    pub(crate) live: bool,
    /// Emit the report as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_verify(args: VerifyArgs) -> Result<(), AppError> {
    let VerifyArgs {
        application,
        extraction,
        live,
        json,
    } = args;

    let config = AppConfig::load()?;
    let engine = VerificationEngine::new(config.verification);

    let submission: ApplicationSubmission =
        serde_json::from_str(&fs::read_to_string(application)?)?;
    let payload: serde_json::Value = serde_json::from_str(&fs::read_to_string(extraction)?)?;
    let application = Application::from_submission(
        ApplicationId("app-offline".to_string()),
        submission,
        Utc::now(),
    );
    let extracted = ExtractedData::from_ocr_value(&payload);

    if live {
        for event in engine.live(&application, extracted.clone())? {
            println!("[{:>3}%] {}", event.progress(), event.message());
        }
    }
    let report = engine.verify(&application, &extracted)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render_report(&report);
    }
    Ok(())
}

fn render_report(report: &VerificationReport) {
    println!("Verification {}", report.overall_status.label());
    render_field("name", &report.name);
    render_field("salary", &report.salary);
    render_field("employer", &report.employer);
    render_field("ssn", &report.ssn);
    println!("{}", report.summary());
}

fn render_field<T>(label: &str, comparison: &FieldComparison<T>) {
    let mark = if comparison.matched { "ok" } else { "--" };
    println!(
        "  [{mark}] {label:<8} {:?}: {}",
        comparison.outcome, comparison.reason
    );
}
