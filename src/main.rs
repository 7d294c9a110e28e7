//! CLI for squash-qgen: generate questions for answer spans in paragraphs.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use candle_core::{DType, Device};
use clap::Parser;
use tracing::info;

use squash_qgen::{
    load_instances, load_safetensors, load_tokenizer, locate_model, model::load_config, Gpt2LMHeadModel,
    GenerationConfig, QuestionRunner,
};

#[derive(Parser, Debug)]
#[command(name = "squash-qgen")]
#[command(about = "Generate questions for answer spans with a GPT-2 question generator")]
struct Args {
    /// Model directory or HuggingFace model ID
    #[arg(long)]
    model: String,

    /// Model revision when downloading from the Hub
    #[arg(long, default_value = "main")]
    revision: String,

    /// Instance file (JSON array of {para_index, paragraph, answer, class, algorithm})
    #[arg(long)]
    filename: PathBuf,

    /// Output document path
    #[arg(long, default_value = "squash/temp/generated_questions.json")]
    output: PathBuf,

    /// Greedy decoding instead of sampling
    #[arg(long)]
    no_sample: bool,

    /// Maximum question length in tokens
    #[arg(long, default_value = "50")]
    max_length: usize,

    /// Minimum question length in tokens
    #[arg(long, default_value = "1")]
    min_length: usize,

    /// Sampling seed
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Sampling softmax temperature
    #[arg(long, default_value = "0.7")]
    temperature: f32,

    /// Top-k filtering (0 disables)
    #[arg(long, default_value = "0")]
    top_k: usize,

    /// Nucleus filtering (0 disables)
    #[arg(long, default_value = "0.9")]
    top_p: f32,

    /// Cap on special-token redraws before min_length (unbounded when absent)
    #[arg(long)]
    max_resamples: Option<usize>,

    /// Run on CPU even when CUDA is available
    #[arg(long)]
    cpu: bool,
}

impl Args {
    fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            max_length: self.max_length,
            min_length: self.min_length,
            temperature: self.temperature,
            top_k: self.top_k,
            top_p: self.top_p,
            no_sample: self.no_sample,
            seed: self.seed,
            max_resamples: self.max_resamples,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let args = Args::parse();
    let config = args.generation_config();
    config.validate()?;
    info!(config = %serde_json::to_string(&config)?, "generation config");

    let device = if args.cpu {
        Device::Cpu
    } else {
        Device::cuda_if_available(0)?
    };
    info!(device = ?device, "selected device");

    let t0 = Instant::now();
    let files = locate_model(&args.model, &args.revision)
        .with_context(|| format!("failed to locate model {}", args.model))?;
    let model_config = load_config(&files.config)?;
    let vb = load_safetensors(&files.weights, DType::F32, &device)?;
    let model = Gpt2LMHeadModel::new(&model_config, vb)?;
    let tokenizer = load_tokenizer(&files.tokenizer)?;
    info!(
        layers = model.num_layers(),
        vocab_size = model_config.vocab_size,
        elapsed = ?t0.elapsed(),
        "loaded model"
    );

    let instances = load_instances(&args.filename, &tokenizer)
        .with_context(|| format!("failed to load instances from {}", args.filename.display()))?;

    let t0 = Instant::now();
    let runner = QuestionRunner::new(model, tokenizer, config)?;
    let document = runner.run(instances)?;
    info!(
        questions = document.num_questions(),
        elapsed = ?t0.elapsed(),
        "generation complete"
    );

    document.write_json(&args.output)?;
    Ok(())
}
