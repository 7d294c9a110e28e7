//! Model loading utilities.
//!
//! This module provides functions for:
//! - Downloading models from HuggingFace Hub
//! - Locating model files in a local checkpoint directory
//! - Loading SafeTensors weights and the GPT-2 config

use std::path::{Path, PathBuf};

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use hf_hub::{api::sync::Api, Repo, RepoType};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Paths to model files.
#[derive(Debug, Clone)]
pub struct ModelFiles {
    /// Path to config.json.
    pub config: PathBuf,
    /// Paths to weight files (SafeTensors).
    pub weights: Vec<PathBuf>,
    /// Path to tokenizer.json.
    pub tokenizer: PathBuf,
}

impl ModelFiles {
    /// Locate model files in a local checkpoint directory.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let require = |name: &str| -> Result<PathBuf> {
            let path = dir.join(name);
            if path.is_file() {
                Ok(path)
            } else {
                Err(Error::ModelLoad(format!("{} not found", path.display())))
            }
        };

        let config = require("config.json")?;
        let tokenizer = require("tokenizer.json")?;
        let weights = match require("model.safetensors") {
            Ok(path) => vec![path],
            Err(_) => {
                let index = require("model.safetensors.index.json")?;
                shard_names(&index)?
                    .into_iter()
                    .map(|name| require(&name))
                    .collect::<Result<Vec<_>>>()?
            }
        };

        Ok(Self {
            config,
            weights,
            tokenizer,
        })
    }
}

/// Resolve a model argument: an existing directory is used as is, anything
/// else is treated as a HuggingFace model ID.
pub fn locate_model(model: &str, revision: &str) -> Result<ModelFiles> {
    let path = Path::new(model);
    if path.is_dir() {
        ModelFiles::from_dir(path)
    } else {
        download_model(model, revision)
    }
}

/// Downloads model files from HuggingFace Hub.
///
/// # Arguments
///
/// * `model_id` - HuggingFace model ID
/// * `revision` - Git revision (branch, tag, or commit hash). Use "main" for latest.
pub fn download_model(model_id: &str, revision: &str) -> Result<ModelFiles> {
    let api = Api::new().map_err(|e| Error::ModelLoad(format!("Failed to create HF API: {e}")))?;

    let repo = api.repo(Repo::with_revision(
        model_id.to_string(),
        RepoType::Model,
        revision.to_string(),
    ));

    let config = repo
        .get("config.json")
        .map_err(|e| Error::ModelLoad(format!("Failed to download config.json: {e}")))?;
    let weights = download_weights(&repo)?;
    let tokenizer = repo
        .get("tokenizer.json")
        .map_err(|e| Error::ModelLoad(format!("Failed to download tokenizer.json: {e}")))?;

    Ok(ModelFiles {
        config,
        weights,
        tokenizer,
    })
}

fn download_weights(repo: &hf_hub::api::sync::ApiRepo) -> Result<Vec<PathBuf>> {
    if let Ok(path) = repo.get("model.safetensors") {
        return Ok(vec![path]);
    }

    if let Ok(index_path) = repo.get("model.safetensors.index.json") {
        let mut paths = Vec::new();
        for filename in shard_names(&index_path)? {
            let path = repo
                .get(&filename)
                .map_err(|e| Error::ModelLoad(format!("Failed to download {filename}: {e}")))?;
            paths.push(path);
        }
        return Ok(paths);
    }

    Err(Error::ModelLoad(
        "No SafeTensors weights found. Only SafeTensors checkpoints are supported.".into(),
    ))
}

/// Unique shard filenames listed in a safetensors index.
fn shard_names(index_path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(index_path)
        .map_err(|e| Error::ModelLoad(format!("Failed to read safetensors index: {e}")))?;
    let index: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| Error::ModelLoad(format!("Failed to parse safetensors index: {e}")))?;

    let weight_map = index["weight_map"]
        .as_object()
        .ok_or_else(|| Error::ModelLoad("Invalid safetensors index: missing weight_map".into()))?;

    let mut names: Vec<String> = weight_map
        .values()
        .filter_map(|v| v.as_str())
        .map(|s| s.to_string())
        .collect();
    names.sort();
    names.dedup();
    Ok(names)
}

/// Creates a VarBuilder from SafeTensors files.
///
/// # Safety
///
/// Uses memory-mapped file access. This is safe as long as the files are not
/// modified while being read.
#[allow(unsafe_code)]
pub fn load_safetensors(paths: &[PathBuf], dtype: DType, device: &Device) -> Result<VarBuilder<'static>> {
    let vb = unsafe { VarBuilder::from_mmaped_safetensors(paths, dtype, device)? };
    Ok(vb)
}

/// Loads the GPT-2 configuration from config.json.
pub fn load_config(path: impl AsRef<Path>) -> Result<Gpt2Config> {
    let content = std::fs::read_to_string(path.as_ref())
        .map_err(|e| Error::ModelLoad(format!("Failed to read config.json: {e}")))?;

    serde_json::from_str(&content).map_err(|e| Error::ModelLoad(format!("Failed to parse config.json: {e}")))
}

/// GPT-2 configuration from HuggingFace config.json.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Gpt2Config {
    /// Vocabulary size, special tokens included.
    pub vocab_size: usize,
    /// Maximum sequence length.
    #[serde(default = "default_n_positions")]
    pub n_positions: usize,
    /// Hidden dimension.
    #[serde(default = "default_n_embd")]
    pub n_embd: usize,
    /// Number of transformer blocks.
    #[serde(default = "default_n_layer")]
    pub n_layer: usize,
    /// Number of attention heads.
    #[serde(default = "default_n_head")]
    pub n_head: usize,
    /// MLP inner dimension; `4 * n_embd` when absent.
    #[serde(default)]
    pub n_inner: Option<usize>,
    /// LayerNorm epsilon.
    #[serde(default = "default_layer_norm_epsilon")]
    pub layer_norm_epsilon: f64,
}

fn default_n_positions() -> usize {
    1024
}

fn default_n_embd() -> usize {
    768
}

fn default_n_layer() -> usize {
    12
}

fn default_n_head() -> usize {
    12
}

fn default_layer_norm_epsilon() -> f64 {
    1e-5
}

impl Gpt2Config {
    /// MLP inner dimension.
    pub fn inner_dim(&self) -> usize {
        self.n_inner.unwrap_or(4 * self.n_embd)
    }

    /// Check that the dimensions are consistent.
    pub fn validate(&self) -> Result<()> {
        if self.n_head == 0 || self.n_embd % self.n_head != 0 {
            return Err(Error::Config(format!(
                "n_embd ({}) must be divisible by n_head ({})",
                self.n_embd, self.n_head
            )));
        }
        if self.vocab_size == 0 || self.n_positions == 0 {
            return Err(Error::Config("vocab_size and n_positions must be positive".into()));
        }
        Ok(())
    }
}
