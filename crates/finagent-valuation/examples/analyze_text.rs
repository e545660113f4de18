//! Value a plain-text filing against a local OpenAI-compatible server
//!
//! Useful with LM Studio, vLLM or Ollama's OpenAI endpoint, which ignore the
//! API key but still require one to be set.
//!
//! To run this example:
//! ```bash
//! export OPENAI_API_BASE=http://localhost:1234/v1
//! export OPENAI_API_KEY=local
//!
//! cargo run --example analyze_text -- path/to/filing.txt qwen2.5-7b-instruct
//! ```

use finagent_utils::{LogConfig, init_tracing, load_dotenv};
use finagent_valuation::{CondenseConfig, CondenseStrategy, ValuationConfig, ValuationPipeline};
use std::env;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    init_tracing(&LogConfig::default())?;

    let args: Vec<String> = env::args().collect();
    let path = args.get(1).map_or("data/acme.txt", String::as_str);
    let model = args.get(2).map_or("qwen2.5-7b-instruct", String::as_str);

    println!("=== Valuation ===\n");
    println!("Document: {path}");
    println!("Model:    {model}\n");

    // Small local models have short contexts; truncate instead of summarising
    let config = ValuationConfig::builder()
        .model(model)
        .with_env_api_key()
        .request_timeout(Duration::from_secs(300))
        .condense(
            CondenseConfig::default()
                .with_strategy(CondenseStrategy::Truncate)
                .with_threshold(6000),
        )
        .build()?;

    let pipeline = ValuationPipeline::new(config)?;
    let result = pipeline.analyze_file(path).await?;

    match result.as_structured() {
        Some(valuation) => {
            let report = valuation.report();
            println!("Company:     {} ({})", report.company_name, report.ticker);
            println!("Revenue:     {} ({})", report.revenue.current, report.revenue.growth_rate);
            println!("Fair value:  {}", report.estimated_fair_value);
            println!("Methodology: {}", report.valuation_methodology);
        }
        None => println!("{}", result.render()),
    }

    Ok(())
}
