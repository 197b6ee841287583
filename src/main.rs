use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use net_insight::logger::init_logger;
use net_insight::{analyze_with, analyze_with_deadline, AnalysisConfig, NetworkInput};

/// Detect communities and betweenness centrality of a network given as JSON.
#[derive(Parser, Debug)]
#[command(name = "net_insight", version, about)]
struct Args {
    /// Input document: { "nodes": [...], "links": [...] }.
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the analyzed graph, stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// YAML analysis configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Give up when the analysis takes longer than this many milliseconds.
    #[arg(long)]
    deadline_ms: Option<u64>,

    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Run community detection and centrality side by side.
    #[arg(long)]
    parallel: bool,

    /// Print the analysis report to stderr.
    #[arg(long)]
    summary: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.log_file.as_deref())?;

    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_yaml_file(path)?,
        None => AnalysisConfig::default(),
    };
    if args.parallel {
        config.parallel = true;
        config.centrality.parallel = true;
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_threads.max(1))
        .build_global()
        .context("failed to build worker pool")?;

    let file = File::open(&args.input)
        .with_context(|| format!("failed to open input {}", args.input.display()))?;
    let input: NetworkInput = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse input {}", args.input.display()))?;
    log::info!("Loaded {} nodes and {} links from {}",
               input.nodes.len(), input.links.len(), args.input.display());

    let analysis = match args.deadline_ms {
        Some(ms) => analyze_with_deadline(input, config, Duration::from_millis(ms))?,
        None => analyze_with(&input.nodes, &input.links, &config),
    };

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create output {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &analysis.graph)?;
            writer.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, &analysis.graph)?;
            writeln!(writer)?;
        }
    }

    if args.summary {
        eprintln!("{}", serde_json::to_string_pretty(&analysis.report)?);
    }
    Ok(())
}
