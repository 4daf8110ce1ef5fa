// ============================================================
// Layer 5 — Preference Losses (DPO family)
// ============================================================
// All variants share one computation over four per-example
// log-probabilities:
//
//   logits = (policy_chosen - policy_rejected)
//          - (reference_chosen - reference_rejected)
//
// and differ only in the per-example penalty:
//
//   Sigmoid  -log σ(β·logits)·(1-s) - log σ(-β·logits)·s
//   Hinge    relu(1 - β·logits)
//   Ipo      (logits - 1/(2β))²
//
// The loss is the batch mean. Chosen / rejected rewards are
// β-scaled policy-minus-reference log-probs, detached from the
// graph and averaged; they are reported, never trained on.
//
// Reference: Rafailov et al. 2023, "Direct Preference Optimization"
//            Azar et al. 2023, "A General Theoretical Paradigm to
//            Understand Learning from Human Preferences" (IPO)

use burn::{
    prelude::*,
    tensor::{activation, ElementConversion},
};
use serde::{Deserialize, Serialize};

use crate::application::config::TrainingConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreferenceLoss {
    #[default]
    Sigmoid,
    Hinge,
    Ipo,
}

impl PreferenceLoss {
    /// Resolve a configured loss name. Unknown names fall back to `Sigmoid`.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "dpoloss" | "sigmoid" => PreferenceLoss::Sigmoid,
            "hingeloss" | "hinge" => PreferenceLoss::Hinge,
            "ipoloss" | "ipo"     => PreferenceLoss::Ipo,
            _ => {
                tracing::warn!("Unknown preference loss '{name}', using DPOLoss");
                PreferenceLoss::Sigmoid
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PreferenceLoss::Sigmoid => "DPOLoss",
            PreferenceLoss::Hinge   => "HingeLoss",
            PreferenceLoss::Ipo     => "IPOLoss",
        }
    }

    /// Per-example loss for the implicit reward margins `logits`.
    pub fn per_example<B: Backend>(
        &self,
        logits:          Tensor<B, 1>,
        beta:            f64,
        label_smoothing: f64,
    ) -> Tensor<B, 1> {
        match self {
            PreferenceLoss::Sigmoid => {
                let scaled = logits.mul_scalar(beta);
                let pos = activation::log_sigmoid(scaled.clone()).neg();
                if label_smoothing == 0.0 {
                    return pos;
                }
                let neg = activation::log_sigmoid(scaled.neg()).neg();
                pos.mul_scalar(1.0 - label_smoothing) + neg.mul_scalar(label_smoothing)
            }
            PreferenceLoss::Hinge => {
                activation::relu(logits.mul_scalar(-beta).add_scalar(1.0))
            }
            PreferenceLoss::Ipo => {
                logits.sub_scalar(1.0 / (2.0 * beta)).powf_scalar(2.0)
            }
        }
    }
}

/// Scalar loss plus mean detached rewards, each shaped `[1]`.
#[derive(Debug, Clone)]
pub struct PreferenceLossOutput<B: Backend> {
    pub loss:            Tensor<B, 1>,
    pub chosen_reward:   Tensor<B, 1>,
    pub rejected_reward: Tensor<B, 1>,
}

impl<B: Backend> PreferenceLossOutput<B> {
    pub fn loss_value(&self) -> f64 {
        self.loss.clone().into_scalar().elem()
    }

    pub fn chosen_reward_value(&self) -> f64 {
        self.chosen_reward.clone().into_scalar().elem()
    }

    pub fn rejected_reward_value(&self) -> f64 {
        self.rejected_reward.clone().into_scalar().elem()
    }
}

/// A preference loss variant with its hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DpoObjective {
    pub variant:         PreferenceLoss,
    pub beta:            f64,
    /// Only used by the sigmoid variant.
    pub label_smoothing: f64,
}

impl DpoObjective {
    pub fn new(variant: PreferenceLoss, beta: f64) -> Self {
        Self { variant, beta, label_smoothing: 0.0 }
    }

    pub fn with_label_smoothing(mut self, label_smoothing: f64) -> Self {
        self.label_smoothing = label_smoothing;
        self
    }

    pub fn from_config(cfg: &TrainingConfig) -> Self {
        Self::new(PreferenceLoss::from_name(&cfg.preference_loss), cfg.beta)
            .with_label_smoothing(cfg.label_smoothing)
    }

    /// All four inputs are `[batch]` tensors of summed sequence log-probs.
    pub fn forward<B: Backend>(
        &self,
        policy_chosen_logps:      Tensor<B, 1>,
        policy_rejected_logps:    Tensor<B, 1>,
        reference_chosen_logps:   Tensor<B, 1>,
        reference_rejected_logps: Tensor<B, 1>,
    ) -> PreferenceLossOutput<B> {
        let chosen_reward   = (policy_chosen_logps.clone() - reference_chosen_logps.clone())
            .mul_scalar(self.beta)
            .detach()
            .mean();
        let rejected_reward = (policy_rejected_logps.clone() - reference_rejected_logps.clone())
            .mul_scalar(self.beta)
            .detach()
            .mean();

        let policy_logratio    = policy_chosen_logps - policy_rejected_logps;
        let reference_logratio = reference_chosen_logps - reference_rejected_logps;
        let logits = policy_logratio - reference_logratio;

        let loss = self
            .variant
            .per_example(logits, self.beta, self.label_smoothing)
            .mean();

        PreferenceLossOutput { loss, chosen_reward, rejected_reward }
    }
}
