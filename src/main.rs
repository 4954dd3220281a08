use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pypi_harvester::client::IndexClient;
use pypi_harvester::collector::Collector;
use pypi_harvester::export::CsvExporter;
use pypi_harvester::harvest::HarvestPipeline;
use pypi_harvester::model::SearchOrdering;

/// Harvest package metadata from a package index search.
#[derive(Parser, Debug)]
#[command(name = "pypi-harvester", version, about)]
struct Cli {
    /// Search keyword, e.g. "fpga".
    keyword: String,

    /// Result ordering for the search.
    #[arg(long, value_enum, default_value = "newest")]
    order: SearchOrdering,

    /// Output CSV path.
    #[arg(long, default_value = "pypi_packages.csv")]
    output: PathBuf,

    /// Index host.
    #[arg(long, default_value = "https://pypi.org")]
    host: String,

    /// Maximum concurrent metadata fetches.
    #[arg(long, default_value_t = 4)]
    concurrency: usize,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let client = IndexClient::with_timeout(Duration::from_secs(cli.timeout_secs))?
        .with_host(cli.host.trim_end_matches('/'));
    let collector = Collector::new(client.clone());
    let pipeline =
        HarvestPipeline::new(collector, client).with_concurrency(cli.concurrency);

    let report = pipeline.run(&cli.keyword, cli.order).await?;

    let mut exporter = CsvExporter::create(&cli.output)?;
    for record in &report.records {
        exporter.write_record(record)?;
    }
    exporter.finish()?;
    info!(
        rows = report.records.len(),
        path = %cli.output.display(),
        "wrote output table"
    );

    // Skipped names go to a sidecar file so a later run can retry them.
    if !report.skipped.is_empty() {
        let mut sidecar = cli.output.as_os_str().to_owned();
        sidecar.push(".skipped");
        let lines: Vec<String> = report
            .skipped
            .iter()
            .map(|s| format!("{}\t{}", s.name, s.reason))
            .collect();
        std::fs::write(&sidecar, lines.join("\n") + "\n")?;
        info!(
            skipped = report.skipped.len(),
            path = %PathBuf::from(&sidecar).display(),
            "recorded skipped packages"
        );
    }

    Ok(())
}
