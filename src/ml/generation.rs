// ============================================================
// Layer 5 — Generation Contract
// ============================================================
// The backbone language model is an external collaborator;
// this module fixes what the rest of the crate needs from it:
//
//   forward  → per-token logits [batch, seq, vocab]
//   generate → prompt followed by new tokens [batch, prompt + new]
//
// generate_answers feeds the prompt-only view of a batch to
// the backbone, stops on the profile's stop words and returns
// only the newly generated ids of every row.

use anyhow::{anyhow, Result};
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::application::config::PredictionConfig;
use crate::data::batcher::CausalLmBatch;
use crate::domain::profile::TokenizerProfile;
use crate::ml::stopping::{StoppingCriteria, TokenStoppingCriteria};
use crate::ml::token_losses::{sequence_log_probs, CausalLmLoss};

/// Decoding settings handed to `Backbone::generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub pad_token_id:       u32,
    pub min_new_tokens:     usize,
    pub max_new_tokens:     usize,
    pub do_sample:          bool,
    pub num_beams:          usize,
    pub temperature:        f64,
    pub top_k:              usize,
    pub top_p:              f64,
    pub repetition_penalty: f64,
}

impl From<&PredictionConfig> for GenerationParams {
    fn from(cfg: &PredictionConfig) -> Self {
        Self {
            pad_token_id:       0,
            min_new_tokens:     cfg.min_length_inference,
            max_new_tokens:     cfg.max_length_inference,
            do_sample:          cfg.do_sample,
            num_beams:          cfg.num_beams,
            temperature:        cfg.temperature,
            top_k:              cfg.top_k,
            top_p:              cfg.top_p,
            repetition_penalty: cfg.repetition_penalty,
        }
    }
}

impl GenerationParams {
    pub fn with_pad_token_id(mut self, pad_token_id: u32) -> Self {
        self.pad_token_id = pad_token_id;
        self
    }
}

pub trait Backbone<B: Backend> {
    fn forward(&self, input_ids: Tensor<B, 2, Int>, attention_mask: Tensor<B, 2, Int>) -> Tensor<B, 3>;

    fn generate(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
        params:         &GenerationParams,
        stopping:       &dyn StoppingCriteria,
    ) -> Tensor<B, 2, Int>;
}

/// Summed log-probs of each sequence's supervised tokens, `[batch]`.
pub fn batch_log_probs<B: Backend, M: Backbone<B>>(model: &M, batch: &CausalLmBatch<B>) -> Tensor<B, 1> {
    let logits = model.forward(batch.input_ids.clone(), batch.attention_mask.clone());
    sequence_log_probs(logits, batch.labels.clone())
}

/// Causal LM loss of the full view of `batch`.
pub fn batch_loss<B: Backend, M: Backbone<B>>(
    model: &M,
    batch: &CausalLmBatch<B>,
    loss:  CausalLmLoss,
) -> Tensor<B, 1> {
    let logits = model.forward(batch.input_ids.clone(), batch.attention_mask.clone());
    loss.forward(logits, batch.labels.clone())
}

/// Generate answers for the prompt view of `batch`.
/// Returns one row of new token ids per sample, prompt removed.
pub fn generate_answers<B: Backend, M: Backbone<B>>(
    model:   &M,
    batch:   CausalLmBatch<B>,
    cfg:     &PredictionConfig,
    profile: &TokenizerProfile,
) -> Result<Vec<Vec<i64>>> {
    let input_ids      = batch.prompt_input_ids;
    let attention_mask = batch.prompt_attention_mask;
    let [batch_size, prompt_len] = input_ids.dims();

    let stop_word_ids = profile
        .stop_words_ids
        .iter()
        .map(|ids| ids.iter().map(|&id| i64::from(id)).collect())
        .collect();
    let stopping = TokenStoppingCriteria::new(stop_word_ids, prompt_len);
    let params   = GenerationParams::from(cfg).with_pad_token_id(profile.pad_token_id);

    let output = model.generate(input_ids, attention_mask, &params, &stopping);
    let [_, total_len] = output.dims();
    if total_len == 0 {
        return Ok(vec![Vec::new(); batch_size]);
    }

    let values = output
        .into_data()
        .convert::<i64>()
        .to_vec::<i64>()
        .map_err(|e| anyhow!("Cannot read generated ids: {e:?}"))?;

    let start = prompt_len.min(total_len);
    Ok(values.chunks(total_len).map(|row| row[start..].to_vec()).collect())
}
