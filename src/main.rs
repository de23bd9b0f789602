use std::io::{self, Write};
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;

use feedreader::app::{logging, AppContext, FeedreaderError};
use feedreader::cli::commands::{self, RunMode};
use feedreader::cli::Cli;
use feedreader::config::Config;
use feedreader::domain::UrlQueue;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    logging::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            // nothing useful to do if stdout is gone
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let rendered = e.render().to_string();
            let detail = rendered.trim().trim_start_matches("error: ");
            let err = FeedreaderError::Usage(detail.to_string());
            commands::report_error(&err);
            return ExitCode::from(err.exit_code());
        }
    };

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            commands::report_error(&err);
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<u8, FeedreaderError> {
    let config = Config::load(cli.config.as_deref())?;
    let settings = cli.settings(config);

    let (mut queue, mode) = match (&cli.url, &cli.feedfile) {
        (Some(url), None) => (UrlQueue::single(url.clone()), RunMode::Single),
        (None, Some(path)) => (commands::load_feedfile(path)?, RunMode::FeedFile),
        _ => {
            return Err(FeedreaderError::Usage(
                "Exactly one of URL or --feedfile is required!".into(),
            ))
        }
    };

    let ctx = AppContext::new(settings);
    let mut stdout = io::stdout().lock();
    let code = commands::read_feeds(&ctx, &mut queue, mode, &mut stdout).await;
    stdout
        .flush()
        .map_err(|e| FeedreaderError::Internal(format!("Unable to write output! ({})", e)))?;

    Ok(code)
}
