use crate::prelude::{println, *};
use colored::Colorize;
use pdf::{AnalysisConfig, DocumentSummary};

#[derive(Debug, clap::Args, serde::Serialize, serde::Deserialize, Clone)]
pub struct InfoOptions {
    /// Path or http(s) URL of the PDF document
    pub source: String,

    /// User password of an encrypted document
    #[arg(short, long, env = "PDFWAM_PASSWORD", default_value = "")]
    pub password: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Seed for page sampling
    #[arg(long, env = "PDFWAM_SEED")]
    pub seed: Option<u64>,
}

pub async fn run(options: InfoOptions, global: crate::Global) -> Result<()> {
    if global.verbose {
        println!("Reading {}", options.source);
        println!();
    }

    let bytes = crate::input::load(&options.source).await?;
    let config = AnalysisConfig {
        password: options.password.clone(),
        seed: options.seed,
        ..AnalysisConfig::default()
    };
    let summary = tokio::task::spawn_blocking(move || pdf::inspect(&bytes, &config))
        .await?
        .map_err(Error::from)?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        summary_table(&summary).printstd();
    }

    Ok(())
}

fn yes_no(value: bool) -> String {
    if value {
        "yes".green().to_string()
    } else {
        "no".to_string()
    }
}

pub fn summary_table(summary: &DocumentSummary) -> prettytable::Table {
    let mut table = new_table();
    let text = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

    table.add_row(prettytable::row!["Version".bold(), summary.version]);
    table.add_row(prettytable::row!["Pages".bold(), summary.page_count]);
    table.add_row(prettytable::row!["Title".bold(), text(&summary.title)]);
    table.add_row(prettytable::row!["Author".bold(), text(&summary.author)]);
    table.add_row(prettytable::row!["Producer".bold(), text(&summary.producer)]);
    table.add_row(prettytable::row!["Creator".bold(), text(&summary.creator)]);
    table.add_row(prettytable::row!["Encrypted".bold(), yes_no(summary.encrypted)]);
    table.add_row(prettytable::row!["Tagged".bold(), yes_no(summary.tagged)]);
    table.add_row(prettytable::row!["Structure tree".bold(), yes_no(summary.structure_tree)]);
    table.add_row(prettytable::row!["Scanned".bold(), yes_no(summary.scanned)]);
    table.add_row(prettytable::row!["Bookmarks".bold(), yes_no(summary.bookmarks)]);
    table.add_row(prettytable::row!["Forms".bold(), yes_no(summary.forms)]);
    table.add_row(prettytable::row!["Form fields".bold(), summary.form_fields]);
    table.add_row(prettytable::row!["Text input form".bold(), yes_no(summary.text_input_form)]);
    table.add_row(prettytable::row!["External links".bold(), yes_no(summary.external_links)]);
    table.add_row(prettytable::row!["Multimedia".bold(), yes_no(summary.multimedia)]);
    table.add_row(prettytable::row![
        "Embedded multimedia".bold(),
        yes_no(summary.embedded_multimedia)
    ]);
    table.add_row(prettytable::row!["Embedded fonts".bold(), yes_no(summary.embedded_fonts)]);
    table.add_row(prettytable::row!["Images".bold(), summary.images]);

    let columns = if summary.multi_column_pages.is_empty() {
        "-".to_string()
    } else {
        summary
            .multi_column_pages
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    table.add_row(prettytable::row!["Multi-column pages".bold(), columns]);

    table
}
