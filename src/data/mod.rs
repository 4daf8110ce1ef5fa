// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from a raw conversation table
// to tensor batches, and back from generated ids to scored
// predictions.
//
// The pipeline flows in this order:
//
//   CSV file
//       │
//       ▼
//   CsvLoader          → reads the file into a Table
//       │
//       ▼
//   get_texts /        → joins prompt columns, wraps them with
//   parse_prompt         the prompt start / answer separator
//       │
//       ▼
//   CausalLmDataset    → implements Burn's Dataset trait:
//       │                parent chains, label masking, left padding
//       ▼
//   CausalLmBatcher    → stacks items into tensor batches
//       │
//       ▼
//   DataLoader         → feeds batches to the training loop
//
// After generation, postprocess decodes, cleans and scores
// the predicted answers.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Errors raised while building or reading a dataset
pub mod error;

/// Loads a conversation table from CSV
pub mod loader;

/// Prompt text assembly and escape decoding
pub mod text;

/// Implements Burn's Dataset trait for causal LM samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Decodes, cleans and scores generated answers
pub mod postprocess;
