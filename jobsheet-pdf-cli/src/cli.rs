use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

use clap::Parser;
use jobsheet_pdf::{Config, JobRecord, SiteVariant, error::AddContext};
use serde_json::Value;

fn read_until_eof() -> io::Result<String> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    Ok(input)
}

const DEFAULT_CONFIG: &str = "jobsheet-pdf.toml";

/// Parse a single job record, or a list of them.
fn parse_records(raw: &str) -> Result<Vec<JobRecord>, jobsheet_pdf::Error> {
    let value = serde_json::from_str::<Value>(raw)?;
    Ok(match value {
        Value::Array(_) => serde_json::from_value(value)?,
        record => vec![serde_json::from_value(record)?],
    })
}

#[derive(Debug, Parser)]
#[command(name = "jobsheet-pdf", about = "Render service job sheets to PDF")]
pub struct Cli {
    /// Path to the JSON file with job record data to print
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Free-text remarks to print on the job sheet
    #[arg(short, long)]
    pub comments: Option<String>,

    /// Path to the directory where PDF outputs should be saved
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Write the PDF bytes to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,

    /// Path to config TOML. If omitted, uses ./jobsheet-pdf.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Site branding to print with
    #[arg(long, value_parser = ["primary", "secondary", "default"])]
    pub site: Option<String>,

    /// Host identifier used to pick the site branding when --site is not given
    #[arg(long)]
    pub host: Option<String>,

    /// Override log level (trace/debug/info/warn/error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Connect to an already running WebDriver instead of starting chromedriver
    #[arg(long)]
    pub no_driver: bool,
}

impl Cli {
    /// Load configuration and fold the command line overrides into it.
    pub fn config(&self) -> Result<Config, jobsheet_pdf::Error> {
        let mut cfg = match &self.config {
            Some(path) => Config::load(path)?,
            None if Path::new(DEFAULT_CONFIG).exists() => Config::load(Path::new(DEFAULT_CONFIG))?,
            None => Config::default(),
        };
        if let Some(site) = &self.site {
            cfg.branding.site_variant = Some(
                site.parse::<SiteVariant>()
                    .add_context("reading --site")?,
            );
        }
        if let Some(host) = &self.host {
            cfg.branding.host = Some(host.clone());
        }
        if let Some(out) = &self.out {
            cfg.output.dir = out.to_string_lossy().into_owned();
        }
        Ok(cfg)
    }

    pub fn get_records(&self) -> Result<Vec<JobRecord>, jobsheet_pdf::Error> {
        let raw = match &self.data {
            Some(path) => fs::read_to_string(path)
                .map_err(jobsheet_pdf::Error::from)
                .add_context(&format!(
                    "reading job data from file '{}'",
                    path.to_str().unwrap_or("UNKNOWN")
                ))?,
            None => read_until_eof()
                .map_err(jobsheet_pdf::Error::from)
                .add_context("reading job data from stdin")?,
        };

        parse_records(&raw).add_context("parsing job record JSON")
    }

    /// Check that the records can be written where the command line asks.
    ///
    /// # Errors
    /// - [`jobsheet_pdf::Error`] if several records would be written to stdout, which can only
    ///   hold one PDF
    pub fn check_output(&self, record_count: usize) -> Result<(), jobsheet_pdf::Error> {
        if self.stdout && record_count > 1 {
            return Err(jobsheet_pdf::Error::from(format!(
                "--stdout writes a single PDF, but {record_count} job records were given"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_record_and_list_are_accepted() {
        assert_eq!(parse_records(r#"{"id": 1}"#).unwrap().len(), 1);
        let records = parse_records(r#"[{"id": 1}, {"id": "2", "location": null}]"#).unwrap();
        assert_eq!(records[1].id.as_deref(), Some("2"));
    }

    #[test]
    fn field_errors_keep_their_message() {
        let message = parse_records(r#"[{"id": 1}, 5]"#).unwrap_err().to_string();
        assert!(!message.contains("untagged"), "{message}");
        assert!(message.contains("expected struct JobRecord"), "{message}");
    }

    #[test]
    fn stdout_takes_one_record() {
        let cli = Cli::parse_from(["jobsheet-pdf", "--stdout"]);
        assert!(cli.check_output(1).is_ok());
        assert!(cli.check_output(2).is_err());
        let cli = Cli::parse_from(["jobsheet-pdf", "--out", "sheets"]);
        assert!(cli.check_output(3).is_ok());
    }
}
