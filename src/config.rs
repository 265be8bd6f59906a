// Command line and environment configuration.
//
// Connection settings come from flags or the environment so the secret never
// has to live in the source tree.
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use crate::source::DEFAULT_SHEETS_BASE_URL;
use crate::types::Department;

#[derive(Debug, Parser)]
#[command(name = "dept_dashboard", version, about = "Department analytics dashboard")]
pub struct Cli {
    #[command(flatten)]
    pub connection: Connection,

    /// Default log filter when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct Connection {
    /// Apps Script web app URL.
    #[arg(long, env = "DASHBOARD_BACKEND_URL", default_value = "")]
    pub backend_url: String,

    /// Shared secret sent to the backend.
    #[arg(long, env = "DASHBOARD_SECRET", default_value = "", hide_env_values = true)]
    pub secret: String,

    /// Spreadsheet used when a request does not name one.
    #[arg(long, env = "DASHBOARD_SHEET_ID")]
    pub sheet_id: Option<String>,

    #[arg(long, env = "DASHBOARD_SHEETS_BASE_URL", default_value = DEFAULT_SHEETS_BASE_URL)]
    pub sheets_base_url: String,

    /// HTTP timeout for both providers, in seconds.
    #[arg(long, default_value_t = 20)]
    pub timeout_secs: u64,
}

impl Connection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the dashboard page and its JSON endpoints.
    Serve {
        #[arg(long, env = "PORT", default_value_t = 5000)]
        port: u16,

        /// Logo embedded in the page header and watermark.
        #[arg(long, default_value = "image.png")]
        logo: PathBuf,
    },
    /// Print a department's dashboard to the terminal.
    Report(ReportArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ReportArgs {
    /// Shell, Modulation, MD or Area.
    pub department: Department,

    /// Only rows worked by this person.
    #[arg(long, default_value = "")]
    pub person: String,

    #[arg(long, value_enum, default_value_t = SourceKind::Backend)]
    pub source: SourceKind,

    /// Reload every N seconds (30 when no value is given) until interrupted.
    #[arg(long, value_name = "SECS", num_args = 0..=1, default_missing_value = "30")]
    pub watch: Option<u64>,

    /// Also write table.csv, area_ranking.csv and summary.json here.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Which provider a load goes through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Backend,
    Sheets,
}
