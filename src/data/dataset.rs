// ============================================================
// Layer 4 — Causal LM Dataset (Sequence Builder)
// ============================================================
// Implements Burn's Dataset trait. Each item is built on
// demand from one table row:
//
//   row ──► EncodedSegment (prompt ids, answer ids)
//        ──► TurnChain      (ancestors prepended via parent ids)
//        ──► CausalLmItem   (left padded ids / mask / labels
//                            + prompt-only view for generation)
//
// In train mode two augmentations are applied per item:
//   - the parent walk stops early with skip_parent_probability
//   - an unrelated random row is prepended with
//     random_parent_probability
//
// The random generator is passed in explicitly so tests can
// use a seeded one; Dataset::get uses the thread-local rng of
// the worker thread calling it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use burn::data::dataset::Dataset;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::application::config::{AugmentationConfig, DatasetConfig, ExperimentConfig, TokenizerConfig};
use crate::data::error::DatasetError;
use crate::data::text::{get_texts, parse_prompt};
use crate::domain::conversation::{EncodedSegment, TurnChain, IGNORE_INDEX};
use crate::domain::profile::TokenizerProfile;
use crate::domain::table::Table;
use crate::domain::traits::TextTokenizer;

pub const INPUT_IDS:             &str = "input_ids";
pub const ATTENTION_MASK:        &str = "attention_mask";
pub const LABELS:                &str = "labels";
pub const PROMPT_INPUT_IDS:      &str = "prompt_input_ids";
pub const PROMPT_ATTENTION_MASK: &str = "prompt_attention_mask";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetMode {
    Train,
    Validation,
}

impl fmt::Display for DatasetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetMode::Train      => f.write_str("train"),
            DatasetMode::Validation => f.write_str("validation"),
        }
    }
}

/// Which end of an encoding survives truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruncationSide {
    /// Keep the last tokens.
    Left,
    /// Keep the first tokens.
    Right,
}

/// One fully assembled sample.
/// `input_ids`, `attention_mask` and `labels` have length `max_length`;
/// the prompt view has length `max_length_prompt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CausalLmItem {
    pub input_ids:             Vec<i64>,
    pub attention_mask:        Vec<i64>,
    pub labels:                Vec<i64>,
    pub prompt_input_ids:      Vec<i64>,
    pub prompt_attention_mask: Vec<i64>,
}

impl CausalLmItem {
    /// Fields keyed by the names the model side expects.
    pub fn fields(&self) -> [(&'static str, &[i64]); 5] {
        [
            (INPUT_IDS,             &self.input_ids),
            (ATTENTION_MASK,        &self.attention_mask),
            (LABELS,                &self.labels),
            (PROMPT_INPUT_IDS,      &self.prompt_input_ids),
            (PROMPT_ATTENTION_MASK, &self.prompt_attention_mask),
        ]
    }

    /// Number of positions that contribute to the loss.
    pub fn supervised_tokens(&self) -> usize {
        self.labels.iter().filter(|&&l| l != IGNORE_INDEX).count()
    }
}

pub struct CausalLmDataset {
    dataset:      DatasetConfig,
    tokenizer_cfg: TokenizerConfig,
    augmentation: AugmentationConfig,
    mode:         DatasetMode,
    tokenizer:    Arc<dyn TextTokenizer>,
    profile:      TokenizerProfile,
    prompts:      Vec<String>,
    answers:      Vec<String>,
    /// Row index of each row's parent; `None` when chaining is off.
    parents:      Option<Vec<Option<usize>>>,
}

impl CausalLmDataset {
    /// Build the dataset, failing fast on configuration problems:
    /// a missing or incomplete answer column, a missing prompt column,
    /// and cyclic or too deep parent chains.
    pub fn new(
        table:     &Table,
        cfg:       &ExperimentConfig,
        mode:      DatasetMode,
        tokenizer: Arc<dyn TextTokenizer>,
        profile:   TokenizerProfile,
    ) -> Result<Self, DatasetError> {
        let answer_column = &cfg.dataset.answer_column;
        let answers = table
            .column(answer_column)
            .ok_or_else(|| DatasetError::MissingColumn { mode, column: answer_column.clone() })?
            .iter()
            .map(|v| v.clone().ok_or_else(|| DatasetError::MissingValues {
                mode,
                column: answer_column.clone(),
            }))
            .collect::<Result<Vec<_>, _>>()?;

        let prompts: Vec<String> = get_texts(table, &cfg.dataset, &profile, Some(""))?
            .iter()
            .map(|p| parse_prompt(&cfg.dataset, &profile, p))
            .collect();

        let parents = match &cfg.dataset.parent_id_column {
            Some(parent_column) => resolve_parents(table, &cfg.dataset, parent_column, mode)?,
            None                => None,
        };
        if let Some(parents) = &parents {
            validate_chains(parents, cfg.dataset.max_parent_depth)?;
        }

        if let Some(first) = prompts.first() {
            tracing::info!("Sample prompt: {first}");
        }

        Ok(Self {
            dataset:       cfg.dataset.clone(),
            tokenizer_cfg: cfg.tokenizer.clone(),
            augmentation:  cfg.augmentation.clone(),
            mode,
            tokenizer,
            profile,
            prompts,
            answers,
            parents,
        })
    }

    pub fn mode(&self) -> DatasetMode {
        self.mode
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    pub fn tokenizer(&self) -> &dyn TextTokenizer {
        self.tokenizer.as_ref()
    }

    pub fn profile(&self) -> &TokenizerProfile {
        &self.profile
    }

    pub fn parent_chaining_enabled(&self) -> bool {
        self.parents.is_some()
    }

    /// Build item `index` with the calling thread's rng.
    pub fn try_get(&self, index: usize) -> Result<CausalLmItem, DatasetError> {
        self.read_data(index, &mut rand::thread_rng())
    }

    /// Encode row `idx` into prompt and answer ids.
    pub fn get_sample(&self, idx: usize) -> Result<EncodedSegment, DatasetError> {
        let tokenizer = self.tokenizer.as_ref();
        let prompt_ids = encode(
            tokenizer,
            &self.prompts[idx],
            self.tokenizer_cfg.max_length_prompt,
            TruncationSide::Left,
        )?;

        let add_eos = self.dataset.add_eos_token_to_answer;
        let max_length_answer = if add_eos {
            self.tokenizer_cfg.max_length_answer.saturating_sub(1)
        } else {
            self.tokenizer_cfg.max_length_answer
        };
        let mut answer_ids = encode(
            tokenizer,
            &self.answers[idx],
            max_length_answer,
            TruncationSide::Right,
        )?;
        if add_eos {
            answer_ids.push(i64::from(self.profile.eos_token_id));
        }

        Ok(EncodedSegment::new(prompt_ids, answer_ids))
    }

    /// Build the turn chain of row `idx` and assemble it into an item.
    pub fn read_data<R: Rng + ?Sized>(
        &self,
        idx: usize,
        rng: &mut R,
    ) -> Result<CausalLmItem, DatasetError> {
        if idx >= self.len() {
            return Err(DatasetError::IndexOutOfRange { index: idx, len: self.len() });
        }
        let train = self.mode == DatasetMode::Train;
        let mut chain = TurnChain::new(self.get_sample(idx)?);

        if let Some(parents) = &self.parents {
            let mut current = idx;
            while let Some(parent) = parents[current] {
                if train && rng.gen::<f64>() < self.augmentation.skip_parent_probability {
                    break;
                }
                chain.prepend(self.get_sample(parent)?);
                current = parent;
            }
        }

        if train && rng.gen::<f64>() < self.augmentation.random_parent_probability {
            let random_idx = rng.gen_range(0..self.len());
            chain.prepend(self.get_sample(random_idx)?);
        }

        Ok(self.assemble(&chain))
    }

    fn assemble(&self, chain: &TurnChain) -> CausalLmItem {
        let max_length   = self.tokenizer_cfg.max_length;
        let pad_token_id = i64::from(self.profile.pad_token_id);

        let input_ids      = chain.input_ids();
        let prompt_mask    = chain.prompt_mask();
        let attention_mask = vec![1; input_ids.len()];

        let mut labels = input_ids.clone();
        if self.dataset.mask_prompt_labels {
            for (label, &is_prompt) in labels.iter_mut().zip(&prompt_mask) {
                if is_prompt {
                    *label = IGNORE_INDEX;
                }
            }
        }
        // EOS may share its id with padding, so put it back explicitly.
        if self.dataset.add_eos_token_to_answer {
            if let Some(last) = labels.last_mut() {
                *last = i64::from(self.profile.eos_token_id);
            }
        }

        let kept = &labels[labels.len().saturating_sub(max_length)..];
        let mut padded_labels = vec![IGNORE_INDEX; max_length];
        padded_labels[max_length - kept.len()..].copy_from_slice(kept);

        let (input_ids, attention_mask) =
            pad_tokens(&input_ids, &attention_mask, max_length, pad_token_id);

        let prompt_ids  = chain.prompt_only_ids();
        let prompt_mask = vec![1; prompt_ids.len()];
        let (prompt_input_ids, prompt_attention_mask) = pad_tokens(
            &prompt_ids,
            &prompt_mask,
            self.tokenizer_cfg.max_length_prompt,
            pad_token_id,
        );

        CausalLmItem {
            input_ids,
            attention_mask,
            labels: padded_labels,
            prompt_input_ids,
            prompt_attention_mask,
        }
    }
}

impl Dataset<CausalLmItem> for CausalLmDataset {
    fn get(&self, index: usize) -> Option<CausalLmItem> {
        if index >= self.len() {
            return None;
        }
        match self.try_get(index) {
            Ok(item) => Some(item),
            Err(err) => {
                tracing::error!("Cannot build {} item {}: {}", self.mode, index, err);
                None
            }
        }
    }

    fn len(&self) -> usize {
        self.prompts.len()
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Tokenise `text` without special tokens and truncate to `max_length`.
pub fn encode(
    tokenizer:  &dyn TextTokenizer,
    text:       &str,
    max_length: usize,
    side:       TruncationSide,
) -> Result<Vec<i64>, DatasetError> {
    let ids = tokenizer.encode(text, false)?;
    let kept = match side {
        TruncationSide::Right => &ids[..ids.len().min(max_length)],
        TruncationSide::Left  => &ids[ids.len().saturating_sub(max_length)..],
    };
    Ok(kept.iter().map(|&id| i64::from(id)).collect())
}

/// Keep the last `max_length` tokens and left pad to exactly `max_length`.
/// Padding gets `pad_token_id` in the ids and 0 in the mask.
pub fn pad_tokens(
    input_ids:      &[i64],
    attention_mask: &[i64],
    max_length:     usize,
    pad_token_id:   i64,
) -> (Vec<i64>, Vec<i64>) {
    let start = input_ids.len().saturating_sub(max_length);
    let ids   = &input_ids[start..];
    let mask  = &attention_mask[start..];

    let offset = max_length - ids.len();
    let mut padded_ids  = vec![pad_token_id; max_length];
    let mut padded_mask = vec![0; max_length];
    padded_ids[offset..].copy_from_slice(ids);
    padded_mask[offset..].copy_from_slice(mask);
    (padded_ids, padded_mask)
}

/// Map every row to the row index of its parent.
/// Returns `None` (chaining disabled) when the table has no id column.
fn resolve_parents(
    table:         &Table,
    cfg:           &DatasetConfig,
    parent_column: &str,
    mode:          DatasetMode,
) -> Result<Option<Vec<Option<usize>>>, DatasetError> {
    let Some(ids) = table.column(&cfg.id_column) else {
        tracing::warn!(
            "When using a parent column, the table requires an '{}' column. \
             Disabling parent chaining for mode {}.",
            cfg.id_column,
            mode
        );
        return Ok(None);
    };
    let parent_ids = table
        .column(parent_column)
        .ok_or_else(|| DatasetError::MissingColumn { mode, column: parent_column.to_string() })?;

    // later duplicates win
    let id_to_idx: HashMap<&str, usize> = ids
        .iter()
        .enumerate()
        .filter_map(|(row, id)| id.as_deref().map(|id| (id, row)))
        .collect();

    let parents = parent_ids
        .iter()
        .map(|pid| pid.as_deref().and_then(|pid| id_to_idx.get(pid).copied()))
        .collect();
    Ok(Some(parents))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    OnPath,
    Done,
}

/// Reject parent graphs with cycles or with more than `max_depth`
/// ancestors above any row. Linear in the number of rows.
fn validate_chains(parents: &[Option<usize>], max_depth: usize) -> Result<(), DatasetError> {
    let mut state = vec![Visit::New; parents.len()];
    let mut depth = vec![0usize; parents.len()];
    let mut path  = Vec::new();

    for start in 0..parents.len() {
        path.clear();
        let mut current = Some(start);
        while let Some(row) = current {
            match state[row] {
                Visit::Done   => break,
                Visit::OnPath => return Err(DatasetError::ParentCycle { row: start, repeated: row }),
                Visit::New    => {
                    state[row] = Visit::OnPath;
                    path.push(row);
                    current = parents[row];
                }
            }
        }

        // `current` is either a finished row or the root's missing parent.
        let mut d = current.map_or(0, |row| depth[row] + 1);
        for &row in path.iter().rev() {
            if d > max_depth {
                return Err(DatasetError::ChainTooDeep { row: start, max_depth });
            }
            depth[row] = d;
            state[row] = Visit::Done;
            d += 1;
        }
    }
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, CharTokenizer, EOS, PAD};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn chain_table() -> Table {
        testing::table(&[
            ("id",        &["A", "B", "C"]),
            ("parent_id", &["",  "A", "B"]),
            ("prompt",    &["a", "bb", "c"]),
            ("answer",    &["x", "y", "zz"]),
        ])
    }

    fn chained_config() -> ExperimentConfig {
        let mut cfg = testing::plain_config();
        cfg.dataset.parent_id_column = Some("parent_id".into());
        cfg
    }

    fn build(table: &Table, cfg: &ExperimentConfig, mode: DatasetMode) -> CausalLmDataset {
        CausalLmDataset::new(table, cfg, mode, Arc::new(CharTokenizer), testing::profile()).unwrap()
    }

    fn unpadded(ids: &[i64], mask: &[i64]) -> Vec<i64> {
        ids.iter().zip(mask).filter(|&(_, &m)| m == 1).map(|(&i, _)| i).collect()
    }

    #[test]
    fn test_len_equals_row_count() {
        let ds = build(&chain_table(), &chained_config(), DatasetMode::Train);
        assert_eq!(ds.len(), 3);
    }

    #[test]
    fn test_chain_is_ancestor_first() {
        let ds   = build(&chain_table(), &chained_config(), DatasetMode::Validation);
        let item = ds.read_data(2, &mut StdRng::seed_from_u64(0)).unwrap();

        let expected: Vec<i64> = ["a", "x", "bb", "y", "c", "zz"]
            .iter()
            .flat_map(|s| testing::ids(s))
            .collect();
        assert_eq!(unpadded(&item.input_ids, &item.attention_mask), expected);
    }

    #[test]
    fn test_prompt_view_has_no_final_answer() {
        let ds   = build(&chain_table(), &chained_config(), DatasetMode::Validation);
        let item = ds.read_data(1, &mut StdRng::seed_from_u64(0)).unwrap();

        let expected: Vec<i64> = ["a", "x", "bb"].iter().flat_map(|s| testing::ids(s)).collect();
        assert_eq!(
            unpadded(&item.prompt_input_ids, &item.prompt_attention_mask),
            expected
        );
        assert_eq!(item.prompt_input_ids.len(), 16);
    }

    #[test]
    fn test_prompt_labels_are_masked() {
        let ds   = build(&chain_table(), &chained_config(), DatasetMode::Validation);
        let item = ds.read_data(2, &mut StdRng::seed_from_u64(0)).unwrap();

        // a x bb y c zz → only the answers are supervised
        let tail: Vec<i64> = item.labels[32 - 8..].to_vec();
        let i = IGNORE_INDEX;
        let expected: Vec<i64> = [vec![i], testing::ids("x"), vec![i, i], testing::ids("y"), vec![i], testing::ids("zz")]
            .concat();
        assert_eq!(tail, expected);
        assert!(item.labels[..32 - 8].iter().all(|&l| l == IGNORE_INDEX));
    }

    #[test]
    fn test_unmasked_labels_copy_inputs() {
        let mut cfg = chained_config();
        cfg.dataset.mask_prompt_labels = false;
        let ds   = build(&chain_table(), &cfg, DatasetMode::Validation);
        let item = ds.read_data(0, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(item.labels[30..], item.input_ids[30..]);
        assert_eq!(item.supervised_tokens(), 2);
    }

    #[test]
    fn test_eos_label_survives_when_pad_is_eos() {
        let mut cfg = chained_config();
        cfg.dataset.add_eos_token_to_answer = true;
        let mut profile = testing::profile();
        profile.pad_token_id = EOS;

        let ds = CausalLmDataset::new(
            &chain_table(), &cfg, DatasetMode::Validation, Arc::new(CharTokenizer), profile,
        )
        .unwrap();
        let item = ds.read_data(2, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(*item.labels.last().unwrap(), i64::from(EOS));
        assert_eq!(*item.input_ids.last().unwrap(), i64::from(EOS));
        // padding positions use the shared id but stay out of the loss
        assert_eq!(item.input_ids[0], i64::from(EOS));
        assert_eq!(item.labels[0], IGNORE_INDEX);
    }

    #[test]
    fn test_answer_budget_reserves_eos_slot() {
        let mut cfg = testing::plain_config();
        cfg.dataset.add_eos_token_to_answer = true;
        cfg.tokenizer.max_length_answer     = 3;
        let table = testing::table(&[("prompt", &["p"]), ("answer", &["abcdef"])]);
        let ds = build(&table, &cfg, DatasetMode::Validation);

        let seg = ds.get_sample(0).unwrap();
        assert_eq!(seg.answer_ids, [testing::ids("ab"), vec![i64::from(EOS)]].concat());
    }

    #[test]
    fn test_prompt_truncation_keeps_the_end() {
        let mut cfg = testing::plain_config();
        cfg.tokenizer.max_length_prompt = 3;
        let table = testing::table(&[("prompt", &["abcdef"]), ("answer", &["z"])]);
        let ds = build(&table, &cfg, DatasetMode::Validation);
        assert_eq!(ds.get_sample(0).unwrap().prompt_ids, testing::ids("def"));
    }

    #[test]
    fn test_overflow_keeps_most_recent_tokens() {
        let mut cfg = testing::plain_config();
        cfg.tokenizer.max_length = 4;
        let table = testing::table(&[("prompt", &["abcd"]), ("answer", &["xyz"])]);
        let ds   = build(&table, &cfg, DatasetMode::Validation);
        let item = ds.read_data(0, &mut StdRng::seed_from_u64(0)).unwrap();

        assert_eq!(item.input_ids, testing::ids("dxyz"));
        assert_eq!(item.attention_mask, vec![1; 4]);
        assert_eq!(item.labels, [vec![IGNORE_INDEX], testing::ids("xyz")].concat());
    }

    #[test]
    fn test_fixed_lengths_under_augmentation() {
        let mut cfg = chained_config();
        cfg.augmentation.skip_parent_probability   = 0.5;
        cfg.augmentation.random_parent_probability = 0.5;
        cfg.tokenizer.max_length        = 7;
        cfg.tokenizer.max_length_prompt = 5;
        let ds = build(&chain_table(), &cfg, DatasetMode::Train);

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            for idx in 0..ds.len() {
                let item = ds.read_data(idx, &mut rng).unwrap();
                assert_eq!(item.input_ids.len(), 7);
                assert_eq!(item.attention_mask.len(), 7);
                assert_eq!(item.labels.len(), 7);
                assert_eq!(item.prompt_input_ids.len(), 5);
                assert_eq!(item.prompt_attention_mask.len(), 5);
            }
        }
    }

    #[test]
    fn test_truncated_prompt_view_keeps_latest_tokens() {
        let mut cfg = chained_config();
        cfg.tokenizer.max_length_prompt = 5;
        let ds   = build(&chain_table(), &cfg, DatasetMode::Validation);
        let item = ds.read_data(2, &mut StdRng::seed_from_u64(0)).unwrap();

        // a x bb y c → the leading "a" is dropped
        assert_eq!(item.prompt_input_ids, testing::ids("xbbyc"));
        assert_eq!(item.prompt_attention_mask, vec![1; 5]);
    }

    #[test]
    fn test_skip_parent_only_applies_in_train_mode() {
        let mut cfg = chained_config();
        cfg.augmentation.skip_parent_probability = 1.0;

        let train = build(&chain_table(), &cfg, DatasetMode::Train);
        let item  = train.read_data(2, &mut StdRng::seed_from_u64(1)).unwrap();
        let expected: Vec<i64> = ["c", "zz"].iter().flat_map(|s| testing::ids(s)).collect();
        assert_eq!(unpadded(&item.input_ids, &item.attention_mask), expected);

        let valid = build(&chain_table(), &cfg, DatasetMode::Validation);
        let item  = valid.read_data(2, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(unpadded(&item.input_ids, &item.attention_mask).len(), 8);
    }

    #[test]
    fn test_random_parent_is_prepended() {
        let mut cfg = testing::plain_config();
        cfg.augmentation.random_parent_probability = 1.0;
        let table = testing::table(&[("prompt", &["p"]), ("answer", &["q"])]);
        let ds   = build(&table, &cfg, DatasetMode::Train);
        let item = ds.read_data(0, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(
            unpadded(&item.input_ids, &item.attention_mask),
            testing::ids("pqpq")
        );
    }

    #[test]
    fn test_random_parent_goes_before_ancestors() {
        let mut cfg = chained_config();
        cfg.augmentation.random_parent_probability = 1.0;
        let ds = build(&chain_table(), &cfg, DatasetMode::Train);
        let rows: Vec<Vec<i64>> = ["ax", "bby", "czz"].iter().map(|s| testing::ids(s)).collect();

        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let item = ds.read_data(1, &mut rng).unwrap();
            let ids  = unpadded(&item.input_ids, &item.attention_mask);
            let (random, own_chain) = ids.split_at(ids.len() - 5);
            assert_eq!(own_chain, testing::ids("axbby").as_slice());
            assert!(rows.iter().any(|row| row.as_slice() == random));
        }
    }

    #[test]
    fn test_missing_id_column_disables_chaining() {
        let table = testing::table(&[
            ("parent_id", &["", "0"]),
            ("prompt",    &["a", "b"]),
            ("answer",    &["x", "y"]),
        ]);
        let chained = build(&table, &chained_config(), DatasetMode::Validation);
        let plain   = build(&table, &testing::plain_config(), DatasetMode::Validation);
        assert!(!chained.parent_chaining_enabled());

        let mut rng = StdRng::seed_from_u64(0);
        for idx in 0..2 {
            assert_eq!(
                chained.read_data(idx, &mut rng).unwrap(),
                plain.read_data(idx, &mut rng).unwrap()
            );
        }
    }

    #[test]
    fn test_missing_answer_column_fails() {
        let table = testing::table(&[("prompt", &["a"])]);
        let err = CausalLmDataset::new(
            &table, &testing::plain_config(), DatasetMode::Train, Arc::new(CharTokenizer), testing::profile(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, DatasetError::MissingColumn { .. }));
        assert!(err.to_string().contains("train"));
    }

    #[test]
    fn test_missing_answer_value_fails() {
        let table = testing::table(&[("prompt", &["a", "b"]), ("answer", &["x", ""])]);
        let err = CausalLmDataset::new(
            &table, &testing::plain_config(), DatasetMode::Validation, Arc::new(CharTokenizer), testing::profile(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, DatasetError::MissingValues { .. }));
    }

    #[test]
    fn test_self_parent_is_rejected() {
        let table = testing::table(&[
            ("id",        &["A", "B"]),
            ("parent_id", &["",  "B"]),
            ("prompt",    &["a", "b"]),
            ("answer",    &["x", "y"]),
        ]);
        let err = CausalLmDataset::new(
            &table, &chained_config(), DatasetMode::Train, Arc::new(CharTokenizer), testing::profile(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, DatasetError::ParentCycle { row: 1, repeated: 1 }));
    }

    #[test]
    fn test_validate_chains() {
        // 0 ← 1 ← 2, 3 ↔ 4
        assert!(validate_chains(&[None, Some(0), Some(1)], 2).is_ok());
        assert!(matches!(
            validate_chains(&[None, Some(0), Some(1)], 1),
            Err(DatasetError::ChainTooDeep { max_depth: 1, .. })
        ));
        assert!(matches!(
            validate_chains(&[None, Some(0), Some(1), Some(4), Some(3)], 10),
            Err(DatasetError::ParentCycle { .. })
        ));
    }

    #[test]
    fn test_get_out_of_range_is_none() {
        let ds = build(&chain_table(), &chained_config(), DatasetMode::Validation);
        assert!(ds.get(3).is_none());
        assert!(ds.get(0).is_some());
    }

    #[test]
    fn test_pad_tokens_left_pads() {
        let (ids, mask) = pad_tokens(&[7, 8], &[1, 1], 4, i64::from(PAD));
        assert_eq!(ids, vec![0, 0, 7, 8]);
        assert_eq!(mask, vec![0, 0, 1, 1]);
    }
}
