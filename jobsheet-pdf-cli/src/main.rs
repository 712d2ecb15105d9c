use std::{io::Write, path::Path, process::Child};

use clap::Parser;
use jobsheet_pdf::{
    Config, JobRecord, error::AddContext, generate_with_browser, logging::init_logging,
    start_chromedriver,
};
use tracing::{error, info, warn};

use crate::cli::Cli;

mod cli;

fn kill_chrome(chrome_process: &mut Child) -> Result<(), jobsheet_pdf::Error> {
    chrome_process
        .kill()
        .map_err(jobsheet_pdf::Error::from)
        .add_context("killing chromedriver process from cli")?;
    Ok(())
}

/// The outcome of a run once cleanup has happened. A cleanup failure is logged, never allowed to
/// mask the run's own result.
fn after_cleanup(
    result: Result<(), jobsheet_pdf::Error>,
    cleanup: Result<(), jobsheet_pdf::Error>,
) -> Result<(), jobsheet_pdf::Error> {
    if let Err(e) = cleanup {
        warn!("{e}");
    }
    result
}

async fn write_job_sheet(
    record: &JobRecord,
    cli: &Cli,
    cfg: &Config,
) -> Result<(), jobsheet_pdf::Error> {
    let pdf = generate_with_browser(record, cli.comments.as_deref(), cfg)
        .await
        .add_context("generating pdf data from job record")?;
    if cli.stdout {
        let mut stdout = std::io::stdout();
        stdout
            .write_all(&pdf.bytes)
            .map_err(jobsheet_pdf::Error::from)
            .add_context("writing job sheet pdf to stdout")?;
        stdout
            .flush()
            .map_err(jobsheet_pdf::Error::from)
            .add_context("flushing stdout")?;
        return Ok(());
    }
    let path = pdf.save(Path::new(&cfg.output.dir))?;
    info!(path = %path.display(), "wrote job sheet");
    Ok(())
}

async fn run(cli: &Cli, cfg: &Config) -> Result<(), jobsheet_pdf::Error> {
    let records = cli
        .get_records()
        .add_context("deserializing job records from cli")?;
    cli.check_output(records.len())
        .add_context("checking output destination")?;
    for record in &records {
        write_job_sheet(record, cli, cfg).await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), jobsheet_pdf::Error> {
    let cli = Cli::parse();
    let cfg = cli.config().add_context("loading configuration")?;
    let _guard = init_logging(&cfg.logging, cli.log_level.as_deref())?;

    let mut chrome_process = if cli.no_driver {
        None
    } else {
        Some(start_chromedriver(&cfg.browser).add_context("starting chromedriver in cli")?)
    };
    let result = run(&cli, &cfg).await;
    if let Err(e) = &result {
        error!("{e}");
    }
    let cleanup = match chrome_process.as_mut() {
        Some(chrome) => kill_chrome(chrome),
        None => Ok(()),
    };
    after_cleanup(result, cleanup)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_failure_keeps_the_run_error() {
        let result = after_cleanup(
            Err(jobsheet_pdf::Error::from(String::from("rendering failed"))),
            Err(jobsheet_pdf::Error::from(String::from("kill failed"))),
        );
        assert!(result.unwrap_err().to_string().contains("rendering failed"));
        assert!(after_cleanup(Ok(()), Err(jobsheet_pdf::Error::from(String::from("x")))).is_ok());
    }
}
