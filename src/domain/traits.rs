// ============================================================
// Layer 3 — Collaborator Traits
// ============================================================
// The core only talks to its collaborators through these
// traits:
//
//   RowSource      → CsvLoader (data layer)
//   TextTokenizer  → tokenizers::Tokenizer (infra layer),
//                    CharTokenizer in tests
//
// Metric and backbone contracts carry tensors or config and
// live in the ml layer instead.

use anyhow::Result;

use crate::domain::table::Table;

// ─── RowSource ────────────────────────────────────────────────────────────────
/// Anything that can produce the conversation table.
pub trait RowSource {
    fn load_table(&self) -> Result<Table>;
}

// ─── TextTokenizer ────────────────────────────────────────────────────────────
/// The tokenizer surface the sequence builder needs.
///
/// Implementations must be shareable across data-loading
/// worker threads, hence the `Send + Sync` bound.
pub trait TextTokenizer: Send + Sync {
    /// Token ids for `text`, optionally with the tokenizer's
    /// own special tokens (BOS etc.) added.
    fn encode(&self, text: &str, add_special_tokens: bool) -> Result<Vec<u32>>;

    /// Text for `ids`.
    fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String>;

    /// Id of a single token string, if it is in the vocabulary.
    fn token_to_id(&self, token: &str) -> Option<u32>;

    /// Vocabulary size including added tokens.
    fn vocab_size(&self) -> usize;
}
