//! Command-line interface for finagent
//!
//! ```bash
//! export DEEPSEEK_API_KEY=sk-...
//! finagent filings/acme_10k.pdf --provider deepseek --template report
//! ```

mod cli;
mod summary;

use anyhow::{Context, bail};
use clap::Parser;
use cli::Cli;
use finagent_utils::{init_tracing, load_dotenv};
use finagent_valuation::{
    ResultWriter, ValuationError, ValuationPipeline, ValuationResult, sample,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    let cli = Cli::parse();
    init_tracing(&cli.log_config())?;

    info!("Starting finagent");

    let config = cli.valuation_config().context("invalid configuration")?;
    let pipeline =
        ValuationPipeline::new(config).context("could not set up the model provider")?;

    let documents = pipeline
        .loader()
        .load(&cli.file)
        .await
        .with_context(|| format!("could not load {}", cli.file.display()))?;
    println!("Loaded {} ({} document(s))", cli.file.display(), documents.len());

    let writer = ResultWriter::new(&cli.results_dir);

    if cli.samples == 1 {
        println!("Analyzing with {}...", pipeline.config().model);
        let result = tokio::select! {
            result = pipeline.analyze(&documents) => result.context("valuation failed")?,
            () = shutdown_signal() => return Err(ValuationError::Cancelled.into()),
        };
        present(&writer, &cli.file, &result, None).await?;
        return Ok(());
    }

    println!(
        "Running {} analyses with {} (at most {} at once)...",
        cli.samples,
        pipeline.config().model,
        cli.concurrency
    );
    let samples = sample(
        Arc::new(pipeline),
        documents.into(),
        cli.samples,
        cli.concurrency,
        shutdown_signal(),
    )
    .await?;

    let mut failures = 0;
    for sample in &samples {
        match &sample.outcome {
            Ok(result) => {
                println!("\n--- Sample {} ---", sample.index + 1);
                present(&writer, &cli.file, result, Some(sample.index + 1)).await?;
            }
            Err(e) => {
                failures += 1;
                warn!(sample = sample.index + 1, "Sample failed: {}", e);
                eprintln!("Sample {} failed: {e}", sample.index + 1);
            }
        }
    }

    if failures == samples.len() {
        bail!("all {failures} analyses failed");
    }
    Ok(())
}

/// Print the summary and write the result file
async fn present(
    writer: &ResultWriter,
    input: &Path,
    result: &ValuationResult,
    sample: Option<usize>,
) -> anyhow::Result<()> {
    match result {
        ValuationResult::Structured(valuation) => {
            print!("{}", summary::format_summary(&valuation.report()));
        }
        ValuationResult::Unparsed(_) => {
            eprintln!("The model did not return valid JSON; the raw output was saved.");
        }
        ValuationResult::Raw(_) => {}
    }

    let path = writer
        .write(input, result, sample)
        .await
        .context("could not write result")?;
    println!("Full results saved to {}", path.display());
    Ok(())
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("Ctrl-C handler unavailable");
        std::future::pending::<()>().await;
    }
}
