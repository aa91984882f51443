use crate::prelude::*;
use clap::Parser;

mod check;
mod error;
mod info;
mod input;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Check PDF documents against the EGOVMON and WCAG 2.0 PDF accessibility tests"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "PDFWAM_VERBOSE", global = true, default_value = "false")]
    verbose: bool,

    /// Log filter (error, warn, info, debug, trace). Falls back to RUST_LOG.
    #[clap(long, env = "PDFWAM_LOG_LEVEL", global = true)]
    log_level: Option<String>,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Run the accessibility tests on a document
    Check(crate::check::CheckOptions),

    /// Describe a document without testing it
    Info(crate::info::InfoOptions),
}

fn init_logging(global: &Global) {
    match &global.log_level {
        Some(level) => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
                .init()
        }
        None => env_logger::init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let app = App::parse();
    init_logging(&app.global);

    match app.command {
        SubCommands::Check(options) => crate::check::run(options, app.global).await,
        SubCommands::Info(options) => crate::info::run(options, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
