// Entry point and high-level CLI flow.
//
// - `serve` runs the web dashboard: one page plus JSON endpoints that fetch,
//   filter and aggregate a department's records on every load.
// - `report` runs the same pipeline once (or every N seconds with
//   `--watch`) and prints the cards, chart data and table to the terminal.
mod config;
mod fields;
mod loader;
mod output;
mod people;
mod refresh;
mod reports;
mod server;
mod source;
mod types;
mod util;

use anyhow::Result;
use clap::Parser;
use config::{Cli, Command, Connection, ReportArgs, SourceKind};
use refresh::AutoRefresh;
use source::{BackendSource, RecordSource, SheetSource};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt().with_env_filter(filter).init();
}

fn backend_source(conn: &Connection, client: reqwest::Client) -> BackendSource {
    if conn.backend_url.is_empty() {
        warn!("no backend URL configured; backend loads will fail");
    }
    BackendSource::new(client, conn.backend_url.clone(), conn.secret.clone())
}

async fn run_serve(conn: Connection, port: u16, logo: std::path::PathBuf) -> Result<()> {
    let client = source::http_client(conn.timeout())?;
    let backend = backend_source(&conn, client.clone());
    let sheets = server::SheetsConfig {
        client,
        base_url: conn.sheets_base_url.clone(),
        default_sheet_id: conn.sheet_id.clone(),
    };
    let logo_src = server::logo_data_url(&logo);
    let state = server::AppState::new(Arc::new(backend), sheets, logo_src);
    server::serve(state, port).await
}

/// Fetch, filter, aggregate and print once.
async fn report_once(source: &dyn RecordSource, args: &ReportArgs) {
    let fetched = source::load_records(source, args.department).await;
    let view = reports::dashboard_view(fetched, args.department, &args.person);
    println!(
        "Last updated: {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    output::print_view(&view);

    if let (Some(dir), Some(summary)) = (&args.out, &view.summary) {
        match output::export_summary(dir, summary) {
            Ok(files) => {
                for f in files {
                    println!("(exported to {})", f.display());
                }
                println!();
            }
            Err(e) => eprintln!("Write error: {:#}", e),
        }
    }
}

async fn run_report(conn: Connection, args: ReportArgs) -> Result<()> {
    let client = source::http_client(conn.timeout())?;
    let source: Arc<dyn RecordSource> = match args.source {
        SourceKind::Backend => Arc::new(backend_source(&conn, client)),
        SourceKind::Sheets => Arc::new(SheetSource::new(
            client,
            conn.sheets_base_url.clone(),
            conn.sheet_id.clone().unwrap_or_default(),
        )),
    };

    report_once(source.as_ref(), &args).await;

    let Some(secs) = args.watch else {
        return Ok(());
    };
    let mut refresh = AutoRefresh::new(Duration::from_secs(secs.max(1)));
    let args = Arc::new(args);
    refresh.start(move || {
        let source = source.clone();
        let args = args.clone();
        async move { report_once(source.as_ref(), &args).await }
    });
    info!(period = ?refresh.period(), "watching; Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;
    if refresh.is_running() {
        refresh.stop();
    }
    println!("Exiting the program.");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Command::Serve { port, logo } => run_serve(cli.connection, port, logo).await,
        Command::Report(args) => run_report(cli.connection, args).await,
    }
}
