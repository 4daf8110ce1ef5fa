// ============================================================
// Layer 4 — Causal LM Batcher
// ============================================================
// Implements Burn's Batcher trait to stack CausalLmItems into
// [batch_size, seq_len] integer tensors, one per item field.
//
// Items are left padded to a fixed length. With trimming
// enabled, leading columns that are padding in every row of
// the batch are dropped first, separately for the full view
// and the prompt-only view:
//
//   row 0:  P P P a b c        row 0:  P a b c
//   row 1:  P P d e f g   ──►  row 1:  d e f g
//
// ToDevice moves finished batches (or nested collections of
// tensors) to another device.
//
// Reference: Burn Book §4 (Batcher)

use std::collections::{BTreeMap, HashMap};

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::{BasicOps, TensorKind},
};

use crate::data::dataset::CausalLmItem;

// ─── CausalLmBatch ────────────────────────────────────────────────────────────
/// A batch of causal LM items, every tensor shaped [batch_size, seq_len].
#[derive(Debug, Clone)]
pub struct CausalLmBatch<B: Backend> {
    pub input_ids:             Tensor<B, 2, Int>,
    /// 1 = real token, 0 = padding
    pub attention_mask:        Tensor<B, 2, Int>,
    /// -100 where the position is excluded from the loss
    pub labels:                Tensor<B, 2, Int>,
    pub prompt_input_ids:      Tensor<B, 2, Int>,
    pub prompt_attention_mask: Tensor<B, 2, Int>,
}

// ─── CausalLmBatcher ──────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct CausalLmBatcher<B: Backend> {
    pub device:       B::Device,
    /// Drop all-padding leading columns before stacking
    pub trim_padding: bool,
}

impl<B: Backend> CausalLmBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device, trim_padding: false }
    }

    pub fn with_trim_padding(mut self, trim: bool) -> Self {
        self.trim_padding = trim;
        self
    }

    fn stack<F>(&self, items: &[CausalLmItem], field: F) -> Tensor<B, 2, Int>
    where
        F: Fn(&CausalLmItem) -> &[i64],
    {
        let batch_size = items.len();
        let seq_len    = items.first().map_or(0, |item| field(item).len());
        let flat: Vec<i64> = items
            .iter()
            .flat_map(|item| field(item).iter().copied())
            .collect();

        Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len])
    }
}

impl<B: Backend> Batcher<CausalLmItem, CausalLmBatch<B>> for CausalLmBatcher<B> {
    fn batch(&self, mut items: Vec<CausalLmItem>) -> CausalLmBatch<B> {
        if self.trim_padding {
            trim_padding(&mut items);
        }

        CausalLmBatch {
            input_ids:             self.stack(&items, |i| &i.input_ids),
            attention_mask:        self.stack(&items, |i| &i.attention_mask),
            labels:                self.stack(&items, |i| &i.labels),
            prompt_input_ids:      self.stack(&items, |i| &i.prompt_input_ids),
            prompt_attention_mask: self.stack(&items, |i| &i.prompt_attention_mask),
        }
    }
}

// ─── Padding trim ─────────────────────────────────────────────────────────────

/// First column holding a real token in any row. At least one column is kept.
fn first_used_column<'a>(masks: impl Iterator<Item = &'a [i64]>, width: usize) -> usize {
    masks
        .filter_map(|mask| mask.iter().position(|&m| m != 0))
        .min()
        .unwrap_or(width)
        .min(width.saturating_sub(1))
}

/// Remove leading columns that are padding for every item.
/// Labels are cut together with the full view.
pub fn trim_padding(items: &mut [CausalLmItem]) {
    let Some(first) = items.first() else {
        return;
    };
    let full_width   = first.attention_mask.len();
    let prompt_width = first.prompt_attention_mask.len();

    let full_start = first_used_column(
        items.iter().map(|i| i.attention_mask.as_slice()),
        full_width,
    );
    let prompt_start = first_used_column(
        items.iter().map(|i| i.prompt_attention_mask.as_slice()),
        prompt_width,
    );

    for item in items.iter_mut() {
        item.input_ids.drain(..full_start);
        item.attention_mask.drain(..full_start);
        item.labels.drain(..full_start);
        item.prompt_input_ids.drain(..prompt_start);
        item.prompt_attention_mask.drain(..prompt_start);
    }
}

// ─── Device transfer ──────────────────────────────────────────────────────────

/// Move a tensor, or a structure holding tensors, to `device`.
pub trait ToDevice<B: Backend> {
    fn to_device(self, device: &B::Device) -> Self;
}

impl<B, const D: usize, K> ToDevice<B> for Tensor<B, D, K>
where
    B: Backend,
    K: TensorKind<B> + BasicOps<B>,
{
    fn to_device(self, device: &B::Device) -> Self {
        Tensor::to_device(self, device)
    }
}

impl<B: Backend, T: ToDevice<B>> ToDevice<B> for Vec<T> {
    fn to_device(self, device: &B::Device) -> Self {
        self.into_iter().map(|t| t.to_device(device)).collect()
    }
}

impl<B: Backend, T: ToDevice<B>> ToDevice<B> for HashMap<String, T> {
    fn to_device(self, device: &B::Device) -> Self {
        self.into_iter().map(|(k, t)| (k, t.to_device(device))).collect()
    }
}

impl<B: Backend, T: ToDevice<B>> ToDevice<B> for BTreeMap<String, T> {
    fn to_device(self, device: &B::Device) -> Self {
        self.into_iter().map(|(k, t)| (k, t.to_device(device))).collect()
    }
}

impl<B: Backend> ToDevice<B> for CausalLmBatch<B> {
    fn to_device(self, device: &B::Device) -> Self {
        Self {
            input_ids:             self.input_ids.to_device(device),
            attention_mask:        self.attention_mask.to_device(device),
            labels:                self.labels.to_device(device),
            prompt_input_ids:      self.prompt_input_ids.to_device(device),
            prompt_attention_mask: self.prompt_attention_mask.to_device(device),
        }
    }
}

pub fn batch_to_device<B: Backend, T: ToDevice<B>>(value: T, device: &B::Device) -> T {
    value.to_device(device)
}
