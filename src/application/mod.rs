// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (previewing a dataset, computing a
// preference loss, scoring predictions).
//
// Rules for this layer:
//   - No tensor math here (that's Layer 5)
//   - No printing here (that's Layer 1)
//   - No direct file format handling (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

/// Experiment configuration shared by every layer
pub mod config;

/// Build a dataset and show its first items
pub mod preview_use_case;

/// Preference loss over precomputed log-probabilities
pub mod dpo_loss_use_case;

/// Score generated answers and write the results table
pub mod evaluate_use_case;
