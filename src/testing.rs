// Test fixtures shared by the unit tests of several layers.

use anyhow::{anyhow, Result};

use crate::application::config::ExperimentConfig;
use crate::domain::profile::TokenizerProfile;
use crate::domain::table::Table;
use crate::domain::traits::TextTokenizer;

pub const PAD: u32 = 0;
pub const EOS: u32 = 1;
pub const UNK: u32 = 2;
const CHAR_OFFSET: u32 = 10;

const SPECIALS: [(&str, u32); 3] = [("<pad>", PAD), ("</s>", EOS), ("<unk>", UNK)];

/// One token per character; `<pad>`, `</s>` and `<unk>` are single tokens.
pub struct CharTokenizer;

impl TextTokenizer for CharTokenizer {
    fn encode(&self, text: &str, _add_special_tokens: bool) -> Result<Vec<u32>> {
        let mut ids  = Vec::new();
        let mut rest = text;
        'outer: while let Some(c) = rest.chars().next() {
            for (token, id) in SPECIALS {
                if let Some(stripped) = rest.strip_prefix(token) {
                    ids.push(id);
                    rest = stripped;
                    continue 'outer;
                }
            }
            ids.push(c as u32 + CHAR_OFFSET);
            rest = &rest[c.len_utf8()..];
        }
        Ok(ids)
    }

    fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String> {
        let mut out = String::new();
        for &id in ids {
            if let Some((token, _)) = SPECIALS.iter().find(|(_, s)| *s == id) {
                if !skip_special_tokens {
                    out.push_str(token);
                }
                continue;
            }
            let c = id
                .checked_sub(CHAR_OFFSET)
                .and_then(char::from_u32)
                .ok_or_else(|| anyhow!("bad id {id}"))?;
            out.push(c);
        }
        Ok(out)
    }

    fn token_to_id(&self, token: &str) -> Option<u32> {
        if let Some((_, id)) = SPECIALS.iter().find(|(t, _)| *t == token) {
            return Some(*id);
        }
        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c as u32 + CHAR_OFFSET),
            _ => None,
        }
    }

    fn vocab_size(&self) -> usize {
        (0x11_0000 + CHAR_OFFSET) as usize
    }
}

/// Ids the char tokenizer produces for `text`, as item ids.
pub fn ids(text: &str) -> Vec<i64> {
    CharTokenizer
        .encode(text, false)
        .unwrap()
        .into_iter()
        .map(i64::from)
        .collect()
}

pub fn profile() -> TokenizerProfile {
    TokenizerProfile {
        eos_token:      "</s>".to_string(),
        eos_token_id:   EOS,
        pad_token_id:   PAD,
        sep_token:      " ".to_string(),
        mask_token_id:  UNK,
        special_tokens: SPECIALS.iter().map(|(t, _)| t.to_string()).collect(),
        stop_words_ids: Vec::new(),
        vocab_size:     CharTokenizer.vocab_size(),
    }
}

/// Config with empty prompt decorations so encoded lengths are easy to predict.
pub fn plain_config() -> ExperimentConfig {
    let mut cfg = ExperimentConfig::default();
    cfg.dataset.prompt_columns          = vec!["prompt".to_string()];
    cfg.dataset.answer_column           = "answer".to_string();
    cfg.dataset.text_prompt_start       = String::new();
    cfg.dataset.text_answer_separator   = String::new();
    cfg.dataset.add_eos_token_to_prompt = false;
    cfg.dataset.add_eos_token_to_answer = false;
    cfg.dataset.mask_prompt_labels      = true;
    cfg.tokenizer.max_length            = 32;
    cfg.tokenizer.max_length_prompt     = 16;
    cfg.tokenizer.max_length_answer     = 16;
    cfg
}

/// Build a table from string columns; `""` becomes a missing cell.
pub fn table(columns: &[(&str, &[&str])]) -> Table {
    Table::from_columns(columns.iter().map(|(name, values)| {
        let values = values
            .iter()
            .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
            .collect();
        (name.to_string(), values)
    }))
    .unwrap()
}
