// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types shared by every other layer.
//
//   - NO burn types
//   - NO file I/O
//   - only structs, enums and traits

/// Column-major table of optional string cells
pub mod table;

/// Encoded segments and turn chains
pub mod conversation;

/// Resolved special-token ids
pub mod profile;

/// Collaborator traits (row source, tokenizer)
pub mod traits;
