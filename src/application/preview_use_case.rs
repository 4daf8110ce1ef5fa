// ============================================================
// Layer 2 — PreviewUseCase
// ============================================================
// Builds the causal LM dataset exactly as training would and
// shows the first items, so prompt formatting, parent chains
// and label masking can be checked before a run:
//
//   Step 1: Load config             (Layer 6 - infra)
//   Step 2: Load the table          (Layer 4 - data)
//   Step 3: Load the tokenizer      (Layer 6 - infra)
//   Step 4: Build the dataset       (Layer 4 - data)
//   Step 5: Decode the first items  (Layer 4 - data)

use anyhow::{Context, Result};
use rand::{rngs::StdRng, SeedableRng};
use std::path::PathBuf;
use std::sync::Arc;

use burn::data::dataset::Dataset;

use crate::data::{
    dataset::{CausalLmDataset, DatasetMode},
    loader::CsvLoader,
};
use crate::domain::traits::{RowSource, TextTokenizer};
use crate::infra::{config_store::ConfigStore, tokenizer_store::TokenizerStore};

#[derive(Debug, Clone)]
pub struct PreviewRequest {
    pub config_path:   Option<PathBuf>,
    pub data_path:     PathBuf,
    pub tokenizer_dir: PathBuf,
    pub mode:          DatasetMode,
    pub count:         usize,
    /// Fixed seed for the train-mode augmentations
    pub seed:          Option<u64>,
}

/// What one dataset item looks like after assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemPreview {
    pub index:             usize,
    /// Decoded prompt-only view, special tokens kept
    pub prompt_text:       String,
    /// Non-padding positions of the full view
    pub tokens:            usize,
    pub supervised_tokens: usize,
}

pub struct PreviewUseCase {
    request: PreviewRequest,
}

impl PreviewUseCase {
    pub fn new(request: PreviewRequest) -> Self {
        Self { request }
    }

    pub fn execute(&self) -> Result<Vec<ItemPreview>> {
        let req = &self.request;

        let cfg   = ConfigStore::load_or_default(req.config_path.as_deref())?;
        let table = CsvLoader::new(&req.data_path).load_table()?;
        let (tokenizer, profile) = TokenizerStore::new(&req.tokenizer_dir).load(&cfg)?;

        let dataset = CausalLmDataset::new(&table, &cfg, req.mode, Arc::new(tokenizer), profile)
            .with_context(|| format!("Cannot build {} dataset", req.mode))?;
        tracing::info!("Dataset ready: {} items ({})", dataset.len(), req.mode);

        preview_items(&dataset, req.count, req.seed)
    }
}

/// Assemble and decode the first `count` items of `dataset`.
pub fn preview_items(
    dataset: &CausalLmDataset,
    count:   usize,
    seed:    Option<u64>,
) -> Result<Vec<ItemPreview>> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None       => StdRng::from_entropy(),
    };

    (0..count.min(dataset.len()))
        .map(|index| {
            let item = dataset.read_data(index, &mut rng)?;
            let prompt_ids: Vec<u32> = item
                .prompt_input_ids
                .iter()
                .zip(&item.prompt_attention_mask)
                .filter(|&(_, &m)| m == 1)
                .map(|(&id, _)| id as u32)
                .collect();

            Ok(ItemPreview {
                index,
                prompt_text:       dataset.tokenizer().decode(&prompt_ids, false)?,
                tokens:            item.attention_mask.iter().filter(|&&m| m == 1).count(),
                supervised_tokens: item.supervised_tokens(),
            })
        })
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, CharTokenizer};

    #[test]
    fn test_preview_decodes_prompt_view() {
        let mut cfg = testing::plain_config();
        cfg.dataset.parent_id_column = Some("parent_id".into());
        let table = testing::table(&[
            ("id",        &["1", "2"]),
            ("parent_id", &["",  "1"]),
            ("prompt",    &["hi", "and?"]),
            ("answer",    &["yo", "ok"]),
        ]);
        let dataset = CausalLmDataset::new(
            &table, &cfg, DatasetMode::Validation, Arc::new(CharTokenizer), testing::profile(),
        )
        .unwrap();

        let previews = preview_items(&dataset, 10, Some(1)).unwrap();
        assert_eq!(previews.len(), 2);
        assert_eq!(previews[1].prompt_text, "hiyoand?");
        assert_eq!(previews[1].tokens, 10);
        assert_eq!(previews[1].supervised_tokens, 4);
    }
}
