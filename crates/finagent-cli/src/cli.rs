//! Command-line arguments

use clap::Parser;
use clap::builder::RangedU64ValueParser;
use finagent_llm::ProviderKind;
use finagent_utils::{LogConfig, LogFormat};
use finagent_valuation::{
    BuiltinTemplate, CondenseConfig, CondenseStrategy, DEFAULT_RESULTS_DIR, OutputMode,
    TemplateSource, ValuationConfig,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "finagent", version)]
#[command(
    about = "Value a financial document (.txt or .pdf) with an OpenAI-compatible LLM",
    long_about = None
)]
pub struct Cli {
    /// Financial document to analyze (.txt or .pdf)
    pub file: PathBuf,

    /// Model vendor: openai or deepseek
    #[arg(long, default_value = "openai")]
    pub provider: ProviderKind,

    /// Model identifier (defaults to the provider's default model)
    #[arg(long)]
    pub model: Option<String>,

    /// Override the API base URL
    #[arg(long)]
    pub api_base: Option<String>,

    /// Response contract: structured (JSON fields) or raw (text as returned)
    #[arg(long)]
    pub mode: Option<OutputMode>,

    /// Built-in template: structured or report
    #[arg(long, default_value = "structured")]
    pub template: BuiltinTemplate,

    /// Jinja template file with a single {{ text }} placeholder
    #[arg(long, conflicts_with = "template")]
    pub template_file: Option<PathBuf>,

    /// Pre-pass for long or multi-page input: off, truncate or summarize
    #[arg(long, default_value = "summarize")]
    pub condense: CondenseStrategy,

    /// Character threshold for the pre-pass
    #[arg(long, default_value_t = 8000)]
    pub max_chars: usize,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Completion token limit
    #[arg(long)]
    pub max_tokens: Option<usize>,

    /// Number of independent analyses to run
    #[arg(
        long,
        default_value_t = 1,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub samples: usize,

    /// Maximum analyses in flight when sampling
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    /// Per-call timeout in seconds
    #[arg(long, default_value_t = 120)]
    pub timeout: u64,

    /// Directory for result files
    #[arg(long, default_value = DEFAULT_RESULTS_DIR)]
    pub results_dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Log output format: pretty or json
    #[arg(long, default_value = "pretty")]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn log_config(&self) -> LogConfig {
        LogConfig::new(self.verbose).with_format(self.log_format)
    }

    /// Translate flags into a pipeline configuration
    ///
    /// The API key always comes from the provider's environment variable.
    pub fn valuation_config(&self) -> finagent_valuation::Result<ValuationConfig> {
        let template = match &self.template_file {
            Some(path) => TemplateSource::File(path.clone()),
            None => TemplateSource::Builtin(self.template),
        };

        let mut builder = ValuationConfig::builder()
            .provider(self.provider)
            .template(template)
            .request_timeout(Duration::from_secs(self.timeout))
            .condense(
                CondenseConfig::default()
                    .with_strategy(self.condense)
                    .with_threshold(self.max_chars),
            )
            .with_env_api_key();

        if let Some(model) = &self.model {
            builder = builder.model(model);
        }
        if let Some(base) = &self.api_base {
            builder = builder.api_base(base);
        }
        if let Some(mode) = self.mode {
            builder = builder.output_mode(mode);
        }
        if let Some(temperature) = self.temperature {
            builder = builder.temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            builder = builder.max_tokens(max_tokens);
        }

        builder.build()
    }
}
