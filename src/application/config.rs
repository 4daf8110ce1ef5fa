// ============================================================
// Layer 2 — Experiment Configuration
// ============================================================
// All settings for building datasets, computing losses and
// post-processing predictions. Serialisable so it can be
// stored next to a run as JSON; every field has a default,
// so a partial JSON file is a valid config.

use serde::{Deserialize, Serialize};

use crate::ml::token_losses::CausalLmLoss;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("{field} must be within [0, 1], got {value}")]
    NotProbability { field: &'static str, value: f64 },

    #[error("label_smoothing must be within [0, 0.5), got {0}")]
    LabelSmoothing(f64),

    #[error("dataset.prompt_columns must name at least one column")]
    NoPromptColumns,

    #[error("dataset.answer_column must not be empty")]
    NoAnswerColumn,

    #[error("unknown causal language modeling loss '{0}'")]
    UnknownLoss(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub dataset:      DatasetConfig,
    pub tokenizer:    TokenizerConfig,
    pub augmentation: AugmentationConfig,
    pub training:     TrainingConfig,
    pub prediction:   PredictionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// One or more prompt columns; several are joined with a separator.
    pub prompt_columns:          Vec<String>,
    pub answer_column:           String,
    /// `None` disables parent chaining.
    pub parent_id_column:        Option<String>,
    pub id_column:               String,
    /// Escape sequences (e.g. `\n`) are decoded before use.
    pub text_prompt_start:       String,
    pub text_answer_separator:   String,
    /// Joins multi-column prompts; empty means the tokenizer separator.
    pub separator:               String,
    pub add_eos_token_to_prompt: bool,
    pub add_eos_token_to_answer: bool,
    pub mask_prompt_labels:      bool,
    /// Upper bound on the number of ancestors of any row.
    pub max_parent_depth:        usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            prompt_columns:          vec!["instruction".to_string()],
            answer_column:           "output".to_string(),
            parent_id_column:        None,
            id_column:               "id".to_string(),
            text_prompt_start:       "<|prompt|>".to_string(),
            text_answer_separator:   "<|answer|>".to_string(),
            separator:               String::new(),
            add_eos_token_to_prompt: true,
            add_eos_token_to_answer: true,
            mask_prompt_labels:      true,
            max_parent_depth:        64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Length of input_ids / attention_mask / labels.
    pub max_length:        usize,
    /// Length of the prompt-only view; also caps each encoded prompt.
    pub max_length_prompt: usize,
    /// Cap on each encoded answer, including the appended EOS.
    pub max_length_answer: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            max_length:        512,
            max_length_prompt: 256,
            max_length_answer: 256,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentationConfig {
    /// Chance to stop walking up the parent chain at each ancestor (train only).
    pub skip_parent_probability:   f64,
    /// Chance to prepend an unrelated random row (train only).
    pub random_parent_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Causal LM loss name, see `CausalLmLoss::names`.
    pub loss_function:        String,
    /// Preference loss name; unknown names fall back to the sigmoid loss.
    pub preference_loss:      String,
    pub beta:                 f64,
    pub label_smoothing:      f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            loss_function:   "TokenCrossEntropy".to_string(),
            preference_loss: "DPOLoss".to_string(),
            beta:            0.1,
            label_smoothing: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    pub metric:               String,
    pub stop_tokens:          Vec<String>,
    pub min_length_inference: usize,
    pub max_length_inference: usize,
    pub do_sample:            bool,
    pub num_beams:            usize,
    pub temperature:          f64,
    pub top_k:                usize,
    pub top_p:                f64,
    pub repetition_penalty:   f64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            metric:               "ExactMatch".to_string(),
            stop_tokens:          Vec::new(),
            min_length_inference: 2,
            max_length_inference: 256,
            do_sample:            false,
            num_beams:            1,
            temperature:          0.3,
            top_k:                0,
            top_p:                1.0,
            repetition_penalty:   1.2,
        }
    }
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dataset.prompt_columns.is_empty() {
            return Err(ConfigError::NoPromptColumns);
        }
        if self.dataset.answer_column.is_empty() {
            return Err(ConfigError::NoAnswerColumn);
        }
        if self.tokenizer.max_length == 0 {
            return Err(ConfigError::NotPositive { field: "tokenizer.max_length" });
        }
        if self.tokenizer.max_length_prompt == 0 {
            return Err(ConfigError::NotPositive { field: "tokenizer.max_length_prompt" });
        }
        if self.tokenizer.max_length_answer == 0 {
            return Err(ConfigError::NotPositive { field: "tokenizer.max_length_answer" });
        }

        for (field, value) in [
            ("augmentation.skip_parent_probability",   self.augmentation.skip_parent_probability),
            ("augmentation.random_parent_probability", self.augmentation.random_parent_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::NotProbability { field, value });
            }
        }

        self.training.validate()
    }
}

impl TrainingConfig {
    /// Checks that also apply after command line overrides.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.beta.is_finite() && self.beta > 0.0) {
            return Err(ConfigError::NotPositive { field: "training.beta" });
        }
        if !(0.0..0.5).contains(&self.label_smoothing) {
            return Err(ConfigError::LabelSmoothing(self.label_smoothing));
        }
        if CausalLmLoss::from_name(&self.loss_function).is_none() {
            return Err(ConfigError::UnknownLoss(self.loss_function.clone()));
        }
        Ok(())
    }
}
