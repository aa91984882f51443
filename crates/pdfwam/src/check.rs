use crate::prelude::{println, *};
use colored::Colorize;
use pdf::{AnalysisConfig, AnalysisOutcome, DocumentSummary};
use pdfwam_core::report::{build_report, Report, ReportStatus};

#[derive(Debug, clap::Args, serde::Serialize, serde::Deserialize, Clone)]
pub struct CheckOptions {
    /// Path or http(s) URL of the PDF document
    pub source: String,

    /// User password of an encrypted document
    #[arg(short, long, env = "PDFWAM_PASSWORD", default_value = "")]
    pub password: String,

    /// Output the AWAM result map as JSON
    #[arg(long)]
    pub json: bool,

    /// Output the test report as JSON
    #[arg(long)]
    pub report: bool,

    /// Output results, memo and document summary as JSON
    #[arg(long)]
    pub developer: bool,

    /// Cross-check figures against the images on their page
    #[arg(long, env = "PDFWAM_VALIDATE_IMAGES")]
    pub validate_images: bool,

    /// With --validate-images, skip pages holding only 1-bit images
    #[arg(long, env = "PDFWAM_IGNORE_SINGLE_BIT_IMAGES")]
    pub ignore_single_bit_images: bool,

    /// Check the language of Document structure elements
    #[arg(long, env = "PDFWAM_CHECK_DOCUMENT_LANG")]
    pub check_document_lang: bool,

    /// Run the running headers and footers test
    #[arg(long, env = "PDFWAM_RUNNING_HEADERS")]
    pub running_headers: bool,

    /// Maximum structure tree depth to walk
    #[arg(long, env = "PDFWAM_MAX_DEPTH", default_value_t = pdf::config::DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Seed for page sampling
    #[arg(long, env = "PDFWAM_SEED")]
    pub seed: Option<u64>,
}

impl CheckOptions {
    pub fn config(&self) -> AnalysisConfig {
        AnalysisConfig {
            password: self.password.clone(),
            validate_images: self.validate_images,
            ignore_single_bit_images: self.ignore_single_bit_images,
            check_document_lang: self.check_document_lang,
            running_headers: self.running_headers,
            max_depth: self.max_depth,
            seed: self.seed,
        }
    }
}

pub async fn run(options: CheckOptions, global: crate::Global) -> Result<()> {
    if global.verbose {
        println!("Checking {}", options.source);
        println!();
    }

    let bytes = crate::input::load(&options.source).await?;
    let config = options.config();
    let outcome = tokio::task::spawn_blocking(move || pdf::analyze(&bytes, &config))
        .await?
        .map_err(Error::from)?;
    log::info!("{}", describe(&outcome.summary));

    if options.developer {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else if options.json {
        println!("{}", serde_json::to_string_pretty(&outcome.results)?);
    } else if options.report {
        println!("{}", serde_json::to_string_pretty(&build_report(&outcome.memo))?);
    } else {
        output_formatted(&outcome, global.verbose);
    }

    Ok(())
}

fn colored_status(status: &ReportStatus) -> String {
    match status {
        ReportStatus::Label("Pass") => "Pass".green().to_string(),
        ReportStatus::Label("Fail") => "Fail".red().to_string(),
        ReportStatus::Label(label) => label.dimmed().to_string(),
        ReportStatus::Counts { fail: 0, .. } => status.to_string().green().to_string(),
        ReportStatus::Counts { .. } => status.to_string().yellow().to_string(),
    }
}

pub fn report_table(report: &Report) -> prettytable::Table {
    let mut table = new_table();
    table.add_row(prettytable::row![
        "Test".bold().cyan(),
        "Status".bold().cyan(),
        "Description".bold().cyan()
    ]);
    for entry in &report.result {
        table.add_row(prettytable::row![
            entry.test,
            colored_status(&entry.status),
            entry.description
        ]);
    }
    table
}

fn output_formatted(outcome: &AnalysisOutcome, verbose: bool) {
    if verbose {
        crate::info::summary_table(&outcome.summary).printstd();
        println!();
    }

    let report = build_report(&outcome.memo);
    report_table(&report).printstd();
    println!();
    println!(
        "{} tests: {} failed, {} passed",
        report.summary.total,
        report.summary.fail.to_string().red().bold(),
        report.summary.pass.to_string().green().bold()
    );
    if verbose {
        println!("{} result map entries", outcome.results.len());
    }
}

/// Short description of the document, for logs.
pub fn describe(summary: &DocumentSummary) -> String {
    format!(
        "PDF {} with {} pages{}",
        summary.version,
        summary.page_count,
        if summary.tagged { ", tagged" } else { "" }
    )
}
