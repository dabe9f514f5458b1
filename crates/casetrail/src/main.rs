use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use casetrail_core::{
    CaseOutput, CasePipeline, CsvSink, DirFetcher, Fetcher, HttpFetcher, KeyPolicy, RecordSink,
};

#[derive(Parser)]
#[command(
    name = "ctrail",
    about = "Export support case communication timelines as CSV",
    version
)]
struct Cli {
    /// Case identifiers to process
    #[arg(required = true)]
    cases: Vec<String>,

    /// Retrieval URL template; `{id}` is replaced with the case identifier
    #[arg(
        long,
        value_name = "URL",
        default_value = "https://support.example.com/export?case={id}",
        conflicts_with = "from_dir"
    )]
    url_template: String,

    /// Read saved exports from `<DIR>/<id>.html` instead of fetching
    #[arg(long, value_name = "DIR")]
    from_dir: Option<PathBuf>,

    /// Directory for the generated CSV files
    #[arg(long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Dedup key: `body`, or `envelope` (subject+sender+date+body)
    #[arg(long, value_name = "POLICY", default_value = "body")]
    dedupe: KeyPolicy,

    /// Also write a `case_<id>.report.json` run report per case
    #[arg(long)]
    report: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let fetcher: Box<dyn Fetcher> = match &cli.from_dir {
        Some(dir) => Box::new(DirFetcher::new(dir.clone())),
        None => Box::new(HttpFetcher::new(cli.url_template.clone())?),
    };
    let pipeline = CasePipeline::new().with_dedupe_policy(cli.dedupe);

    std::fs::create_dir_all(&cli.out_dir)?;

    let mut failures = 0usize;
    for id in &cli.cases {
        match export_case(&pipeline, fetcher.as_ref(), id, &cli.out_dir, cli.report).await {
            Ok(line) => println!("{id}: {line}"),
            Err(error) => {
                failures += 1;
                println!("{id}: failed: {error:#}");
            }
        }
    }

    if failures > 0 {
        tracing::warn!(failures, total = cli.cases.len(), "batch finished with failures");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

async fn export_case(
    pipeline: &CasePipeline,
    fetcher: &dyn Fetcher,
    id: &str,
    out_dir: &Path,
    with_report: bool,
) -> Result<String> {
    let output = pipeline.process(fetcher, id).await?;

    let path = out_dir.join(format!("case_{id}.csv"));
    let mut sink = CsvSink::create(&path)?;
    sink.write_case(&output.case, &output.timeline)?;

    if with_report {
        let report_path = out_dir.join(format!("case_{id}.report.json"));
        std::fs::write(&report_path, serde_json::to_vec_pretty(&output.report)?)?;
    }

    Ok(status_line(&output, &path))
}

fn status_line(output: &CaseOutput, path: &Path) -> String {
    let report = &output.report;
    let mut line = format!(
        "ok, {} entries ({} duplicates dropped) to {}",
        output.timeline.len(),
        report.duplicates_dropped,
        path.display()
    );

    if !report.is_clean() {
        let notes: Vec<String> = report.degradations.iter().map(ToString::to_string).collect();
        line.push_str(&format!(" [degraded: {}]", notes.join("; ")));
    }

    line
}
