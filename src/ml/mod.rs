// ============================================================
// Layer 5 — ML Layer (Burn)
// ============================================================
// Tensor-side code: the losses a fine-tuning run optimises,
// the contract a backbone model has to satisfy, and the
// scoring of generated text.
//
// What's in this layer:
//
//   losses.rs       — DPO preference losses (sigmoid, hinge,
//                     IPO) with detached reward diagnostics
//
//   token_losses.rs — next-token cross entropy (token and
//                     sample averaged) and per-sequence
//                     log-probs feeding the preference losses
//
//   stopping.rs     — stop-word based stopping criteria for
//                     generation
//
//   generation.rs   — the Backbone trait, generation params
//                     and answer generation for a batch
//
//   metrics.rs      — text metrics for generated answers
//
// Reference: Burn Book §3 (Building Blocks)
//            Rafailov et al. (2023) Direct Preference Optimization

/// DPO preference loss family
pub mod losses;

/// Causal LM cross entropy and sequence log-probs
pub mod token_losses;

/// Stopping criteria for generation
pub mod stopping;

/// Backbone contract and answer generation
pub mod generation;

/// Text metrics for scoring predictions
pub mod metrics;
