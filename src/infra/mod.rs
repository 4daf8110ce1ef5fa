// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles the file-system concerns that don't belong in
// any specific business layer:
//
//   tokenizer_store.rs — Tokenizer loading
//                        Reads a HuggingFace tokenizer directory
//                        and resolves eos / pad / sep / mask and
//                        the stop words into a TokenizerProfile.
//
//   config_store.rs    — Experiment config persistence
//                        Saves / loads ExperimentConfig as JSON
//                        and validates it on load.
//
//   results_writer.rs  — Results table export
//                        Writes scored predictions to CSV for
//                        later analysis.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Tokenizer loading and special-token resolution
pub mod tokenizer_store;

/// Experiment config JSON persistence
pub mod config_store;

/// Scored results CSV writer
pub mod results_writer;
