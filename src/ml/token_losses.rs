// ============================================================
// Layer 5 — Causal LM Token Losses
// ============================================================
// Next-token cross entropy over logits [batch, seq, vocab]
// and labels [batch, seq]. Logits at position t predict the
// label at t + 1, so both are shifted by one before scoring.
// Labels equal to -100 are excluded.
//
//   TokenCrossEntropy   mean over every supervised token
//                       in the batch
//   SampleCrossEntropy  mean per sample, then mean over
//                       samples
//
// sequence_log_probs sums the same shifted log-probs per
// sequence; that is what the preference losses consume.

use burn::{prelude::*, tensor::activation::log_softmax};
use serde::{Deserialize, Serialize};

use crate::domain::conversation::IGNORE_INDEX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CausalLmLoss {
    TokenCrossEntropy,
    SampleCrossEntropy,
}

impl CausalLmLoss {
    pub fn names() -> &'static [&'static str] {
        &["TokenCrossEntropy", "SampleCrossEntropy"]
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "TokenCrossEntropy"  => Some(CausalLmLoss::TokenCrossEntropy),
            "SampleCrossEntropy" => Some(CausalLmLoss::SampleCrossEntropy),
            _                    => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CausalLmLoss::TokenCrossEntropy  => "TokenCrossEntropy",
            CausalLmLoss::SampleCrossEntropy => "SampleCrossEntropy",
        }
    }

    /// Scalar loss shaped `[1]`. Sequences need at least two positions.
    pub fn forward<B: Backend>(&self, logits: Tensor<B, 3>, labels: Tensor<B, 2, Int>) -> Tensor<B, 1> {
        let (log_probs, mask) = shifted_log_probs(logits, labels);
        match self {
            CausalLmLoss::TokenCrossEntropy => {
                let count = mask.sum().clamp_min(1.0);
                log_probs.sum().neg().div(count)
            }
            CausalLmLoss::SampleCrossEntropy => {
                let counts = mask.sum_dim(1).clamp_min(1.0);
                log_probs.sum_dim(1).neg().div(counts).mean()
            }
        }
    }
}

/// Sum of next-token log-probabilities per sequence, shaped `[batch]`.
pub fn sequence_log_probs<B: Backend>(logits: Tensor<B, 3>, labels: Tensor<B, 2, Int>) -> Tensor<B, 1> {
    let (log_probs, _) = shifted_log_probs(logits, labels);
    log_probs.sum_dim(1).squeeze(1)
}

/// Log-prob of every shifted target, zeroed where the label is ignored,
/// together with the 0/1 mask of supervised positions. Both `[batch, seq - 1]`.
fn shifted_log_probs<B: Backend>(
    logits: Tensor<B, 3>,
    labels: Tensor<B, 2, Int>,
) -> (Tensor<B, 2>, Tensor<B, 2>) {
    let [batch, seq_len, vocab] = logits.dims();

    let logits = logits.slice([0..batch, 0..seq_len - 1, 0..vocab]);
    let labels = labels.slice([0..batch, 1..seq_len]);

    let mask    = labels.clone().equal_elem(IGNORE_INDEX).bool_not().float();
    let targets = labels.clamp_min(0).unsqueeze_dim::<3>(2);

    let log_probs = log_softmax(logits, 2)
        .gather(2, targets)
        .squeeze::<2>(2);

    (log_probs * mask.clone(), mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::ElementConversion;

    type TestBackend = NdArray;

    fn fixture() -> (Tensor<TestBackend, 3>, Tensor<TestBackend, 2, Int>) {
        let device = Default::default();
        let ln3 = 3f32.ln();
        // sample 0: uniform logits, two supervised tokens (ln 2 each)
        // sample 1: p(token 1) = 3/4 at the first step, one supervised token
        let logits = Tensor::<TestBackend, 3>::from_floats(
            [
                [[0.0, 0.0], [0.0, 0.0], [0.0, 0.0]],
                [[0.0, ln3], [0.0, 0.0], [0.0, 0.0]],
            ],
            &device,
        );
        let labels = Tensor::<TestBackend, 2, Int>::from_ints(
            [[-100, 0, 0], [-100, 1, -100]],
            &device,
        );
        (logits, labels)
    }

    fn scalar(t: Tensor<TestBackend, 1>) -> f64 {
        t.into_scalar().elem()
    }

    #[test]
    fn test_token_cross_entropy() {
        let (logits, labels) = fixture();
        let loss = scalar(CausalLmLoss::TokenCrossEntropy.forward(logits, labels));
        let expected = (2.0 * 2f64.ln() + (4.0f64 / 3.0).ln()) / 3.0;
        assert!((loss - expected).abs() < 1e-5);
    }

    #[test]
    fn test_sample_cross_entropy() {
        let (logits, labels) = fixture();
        let loss = scalar(CausalLmLoss::SampleCrossEntropy.forward(logits, labels));
        let expected = (2f64.ln() + (4.0f64 / 3.0).ln()) / 2.0;
        assert!((loss - expected).abs() < 1e-5);
    }

    #[test]
    fn test_sequence_log_probs() {
        let (logits, labels) = fixture();
        let values = sequence_log_probs(logits, labels)
            .into_data()
            .convert::<f64>()
            .to_vec::<f64>()
            .unwrap();
        assert!((values[0] + 2.0 * 2f64.ln()).abs() < 1e-5);
        assert!((values[1] - 0.75f64.ln()).abs() < 1e-5);
    }

    #[test]
    fn test_name_lookup() {
        for name in CausalLmLoss::names() {
            assert_eq!(CausalLmLoss::from_name(name).map(|l| l.name()), Some(*name));
        }
        assert_eq!(CausalLmLoss::from_name("Perplexity"), None);
    }
}
