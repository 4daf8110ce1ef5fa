// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Loads a HuggingFace tokenizer directory and resolves its
// special tokens into an immutable TokenizerProfile.
//
// Files read from the directory:
//   tokenizer.json         — required, the fast tokenizer
//   tokenizer_config.json  — optional, names the special tokens
//                            (either "</s>" or {"content": "</s>"})
//
// Resolution order:
//   eos  — configured name, else the first known candidate
//          present in the vocabulary
//   pad  — configured name, else eos
//   sep  — dataset.separator, else configured name, else " "
//   mask — unk, else mask, else configured pad,
//          else the last vocabulary id
//
// Reference: HuggingFace tokenizers documentation

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokenizers::Tokenizer;

use crate::application::config::ExperimentConfig;
use crate::domain::profile::TokenizerProfile;
use crate::domain::traits::TextTokenizer;

const EOS_CANDIDATES: [&str; 4] = ["</s>", "<|endoftext|>", "<eos>", "<|im_end|>"];

// ─── HfTokenizer ──────────────────────────────────────────────────────────────

/// A `tokenizers::Tokenizer` behind the crate's TextTokenizer trait.
pub struct HfTokenizer {
    inner: Tokenizer,
}

impl HfTokenizer {
    pub fn new(inner: Tokenizer) -> Self {
        Self { inner }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Tokenizer::from_str(json)
            .map(Self::new)
            .map_err(|e| anyhow!("Cannot parse tokenizer JSON: {e}"))
    }
}

impl TextTokenizer for HfTokenizer {
    fn encode(&self, text: &str, add_special_tokens: bool) -> Result<Vec<u32>> {
        let encoding = self
            .inner
            .encode(text, add_special_tokens)
            .map_err(|e| anyhow!("Tokenizer encode failed: {e}"))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String> {
        self.inner
            .decode(ids, skip_special_tokens)
            .map_err(|e| anyhow!("Tokenizer decode failed: {e}"))
    }

    fn token_to_id(&self, token: &str) -> Option<u32> {
        self.inner.token_to_id(token)
    }

    fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(true)
    }
}

// ─── tokenizer_config.json ────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TokenName {
    Plain(String),
    Object { content: String },
}

impl From<TokenName> for String {
    fn from(name: TokenName) -> Self {
        match name {
            TokenName::Plain(s)            => s,
            TokenName::Object { content }  => content,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TokenizerConfigFile {
    eos_token:                 Option<TokenName>,
    pad_token:                 Option<TokenName>,
    sep_token:                 Option<TokenName>,
    unk_token:                 Option<TokenName>,
    mask_token:                Option<TokenName>,
    additional_special_tokens: Vec<TokenName>,
}

/// Special token strings named by a tokenizer directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecialTokenNames {
    pub eos:        Option<String>,
    pub pad:        Option<String>,
    pub sep:        Option<String>,
    pub unk:        Option<String>,
    pub mask:       Option<String>,
    pub additional: Vec<String>,
}

impl SpecialTokenNames {
    pub fn from_json(json: &str) -> Result<Self> {
        let file: TokenizerConfigFile =
            serde_json::from_str(json).context("Invalid tokenizer_config.json")?;
        Ok(Self {
            eos:        file.eos_token.map(String::from),
            pad:        file.pad_token.map(String::from),
            sep:        file.sep_token.map(String::from),
            unk:        file.unk_token.map(String::from),
            mask:       file.mask_token.map(String::from),
            additional: file.additional_special_tokens.into_iter().map(String::from).collect(),
        })
    }

    fn named(&self) -> impl Iterator<Item = &String> {
        [&self.eos, &self.pad, &self.sep, &self.unk, &self.mask]
            .into_iter()
            .flatten()
            .chain(&self.additional)
    }
}

// ─── Profile resolution ───────────────────────────────────────────────────────

impl TokenizerProfile {
    /// Resolve special tokens and stop words once, for the whole run.
    pub fn resolve(
        tokenizer: &dyn TextTokenizer,
        names:     &SpecialTokenNames,
        cfg:       &ExperimentConfig,
    ) -> Result<Self> {
        let id_of = |name: &Option<String>| name.as_deref().and_then(|n| tokenizer.token_to_id(n));

        let (eos_token, eos_token_id) = names
            .eos
            .iter()
            .map(String::as_str)
            .chain(EOS_CANDIDATES)
            .find_map(|t| tokenizer.token_to_id(t).map(|id| (t.to_string(), id)))
            .ok_or_else(|| anyhow!("Tokenizer has no end-of-sequence token"))?;

        let configured_pad = id_of(&names.pad);
        let pad_token_id   = configured_pad.unwrap_or(eos_token_id);

        let sep_token = if !cfg.dataset.separator.is_empty() {
            cfg.dataset.separator.clone()
        } else {
            names.sep.clone().unwrap_or_else(|| " ".to_string())
        };

        let vocab_size = tokenizer.vocab_size();
        let mask_token_id = id_of(&names.unk)
            .or_else(|| id_of(&names.mask))
            .or(configured_pad)
            .unwrap_or(vocab_size.saturating_sub(1) as u32);

        let mut special_tokens: Vec<String> = Vec::new();
        for token in names.named().chain(std::iter::once(&eos_token)) {
            if !special_tokens.contains(token) {
                special_tokens.push(token.clone());
            }
        }

        let mut stop_words_ids = Vec::with_capacity(cfg.prediction.stop_tokens.len());
        for stop in &cfg.prediction.stop_tokens {
            let is_special = special_tokens.iter().any(|t| t == stop);
            let ids = tokenizer
                .encode(stop, is_special)
                .with_context(|| format!("Cannot encode stop token '{stop}'"))?;
            stop_words_ids.push(ids);
        }

        Ok(Self {
            eos_token,
            eos_token_id,
            pad_token_id,
            sep_token,
            mask_token_id,
            special_tokens,
            stop_words_ids,
            vocab_size,
        })
    }
}

// ─── TokenizerStore ───────────────────────────────────────────────────────────

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    /// Load the tokenizer and resolve its profile for `cfg`.
    pub fn load(&self, cfg: &ExperimentConfig) -> Result<(HfTokenizer, TokenizerProfile)> {
        let tokenizer = self.load_tokenizer()?;
        let names     = self.load_special_tokens()?;
        let profile   = TokenizerProfile::resolve(&tokenizer, &names, cfg)?;

        tracing::info!(
            "Tokenizer loaded: vocab={}, eos='{}' ({}), pad={}",
            profile.vocab_size,
            profile.eos_token,
            profile.eos_token_id,
            profile.pad_token_id
        );
        Ok((tokenizer, profile))
    }

    pub fn load_tokenizer(&self) -> Result<HfTokenizer> {
        let path = self.dir.join("tokenizer.json");
        Tokenizer::from_file(&path)
            .map(HfTokenizer::new)
            .map_err(|e| anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e))
    }

    /// Special token names from tokenizer_config.json; empty when absent.
    pub fn load_special_tokens(&self) -> Result<SpecialTokenNames> {
        let path = self.dir.join("tokenizer_config.json");
        if !path.exists() {
            tracing::debug!("No tokenizer_config.json in '{}'", self.dir.display());
            return Ok(SpecialTokenNames::default());
        }
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        SpecialTokenNames::from_json(&json)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, CharTokenizer};

    /// A whitespace WordLevel tokenizer; the first `specials` tokens are special.
    fn word_level_json(tokens: &[&str], specials: usize) -> String {
        let vocab: serde_json::Map<String, serde_json::Value> = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), serde_json::json!(i)))
            .collect();
        let added: Vec<serde_json::Value> = tokens[..specials]
            .iter()
            .enumerate()
            .map(|(i, t)| {
                serde_json::json!({
                    "id": i, "content": t, "single_word": false, "lstrip": false,
                    "rstrip": false, "normalized": false, "special": true
                })
            })
            .collect();
        serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added,
            "normalizer": null,
            "pre_tokenizer": { "type": "Whitespace" },
            "post_processor": null,
            "decoder": null,
            "model": { "type": "WordLevel", "vocab": vocab, "unk_token": tokens[specials - 1] }
        })
        .to_string()
    }

    fn write_dir(tokenizer_json: &str, config_json: Option<&str>) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tokenizer.json"), tokenizer_json).unwrap();
        if let Some(cfg) = config_json {
            std::fs::write(dir.path().join("tokenizer_config.json"), cfg).unwrap();
        }
        dir
    }

    #[test]
    fn test_load_with_config_file() {
        let dir = write_dir(
            &word_level_json(&["<pad>", "</s>", "<unk>", "hello", "world", "###"], 3),
            Some(r#"{"eos_token": {"content": "</s>", "lstrip": false},
                     "pad_token": "<pad>", "unk_token": "<unk>", "model_max_length": 512}"#),
        );
        let mut cfg = ExperimentConfig::default();
        cfg.prediction.stop_tokens = vec!["</s>".into(), "###".into()];

        let (tokenizer, profile) = TokenizerStore::new(dir.path()).load(&cfg).unwrap();
        assert_eq!(profile.eos_token, "</s>");
        assert_eq!(profile.eos_token_id, 1);
        assert_eq!(profile.pad_token_id, 0);
        assert_eq!(profile.mask_token_id, 2);
        assert_eq!(profile.sep_token, " ");
        assert_eq!(profile.stop_words_ids, vec![vec![1], vec![5]]);
        assert_eq!(tokenizer.encode("hello world", false).unwrap(), vec![3, 4]);
        assert_eq!(tokenizer.decode(&[3, 1, 4], true).unwrap(), "hello world");
    }

    #[test]
    fn test_load_without_config_file_uses_fallbacks() {
        let dir = write_dir(&word_level_json(&["<|endoftext|>", "a", "b"], 1), None);
        let store = TokenizerStore::new(dir.path());
        let (_, profile) = store.load(&ExperimentConfig::default()).unwrap();

        assert_eq!(profile.eos_token, "<|endoftext|>");
        assert_eq!(profile.pad_token_id, profile.eos_token_id);
        // no unk, mask or pad configured → last vocabulary id
        assert_eq!(profile.mask_token_id, 2);
    }

    #[test]
    fn test_missing_eos_is_an_error() {
        let tokenizer = HfTokenizer::from_json(&word_level_json(&["[UNK]", "x"], 1)).unwrap();
        let result = TokenizerProfile::resolve(
            &tokenizer,
            &SpecialTokenNames::default(),
            &ExperimentConfig::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_separator_prefers_dataset_setting() {
        let names = SpecialTokenNames { sep: Some("<sep>".into()), ..Default::default() };
        let mut cfg = ExperimentConfig::default();
        let profile = TokenizerProfile::resolve(&CharTokenizer, &names, &cfg).unwrap();
        assert_eq!(profile.sep_token, "<sep>");

        cfg.dataset.separator = "||".into();
        let profile = TokenizerProfile::resolve(&CharTokenizer, &names, &cfg).unwrap();
        assert_eq!(profile.sep_token, "||");
    }

    #[test]
    fn test_mask_falls_back_to_configured_pad() {
        let names = SpecialTokenNames { pad: Some("<pad>".into()), ..Default::default() };
        let profile =
            TokenizerProfile::resolve(&CharTokenizer, &names, &ExperimentConfig::default()).unwrap();
        assert_eq!(profile.mask_token_id, testing::PAD);
        assert_eq!(profile.eos_token_id, testing::EOS);
    }

    #[test]
    fn test_special_token_names_parse_both_forms() {
        let names = SpecialTokenNames::from_json(
            r#"{"eos_token": "</s>", "unk_token": {"content": "<unk>"},
                "additional_special_tokens": ["<|user|>", {"content": "<|bot|>"}]}"#,
        )
        .unwrap();
        assert_eq!(names.eos.as_deref(), Some("</s>"));
        assert_eq!(names.unk.as_deref(), Some("<unk>"));
        assert_eq!(names.additional, vec!["<|user|>".to_string(), "<|bot|>".to_string()]);
    }
}
