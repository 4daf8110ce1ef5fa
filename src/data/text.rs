// ============================================================
// Layer 4 — Prompt Text Assembly
// ============================================================
// Turns table cells into the prompt strings the dataset
// tokenises:
//
//   1. join the prompt column(s) of each row
//   2. wrap each prompt as
//        <prompt start> prompt [EOS] <answer separator>
//
// The start and separator literals come from the config
// with escape sequences still in them ("\n" as two chars),
// so they are decoded first.

use crate::application::config::DatasetConfig;
use crate::data::error::DatasetError;
use crate::domain::profile::TokenizerProfile;
use crate::domain::table::Table;

// ─── Prompt assembly ─────────────────────────────────────────────────────────

/// Prompt text of every row.
///
/// A single prompt column is used as is. Several columns are joined with
/// `" {separator} "`; without an explicit separator the configured one is
/// used, or the tokenizer separator token when that is empty too.
/// Missing cells become empty strings.
pub fn get_texts(
    table:     &Table,
    cfg:       &DatasetConfig,
    profile:   &TokenizerProfile,
    separator: Option<&str>,
) -> Result<Vec<String>, DatasetError> {
    let columns = cfg
        .prompt_columns
        .iter()
        .map(|name| {
            table
                .column(name)
                .ok_or_else(|| DatasetError::MissingPromptColumn(name.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let [single] = columns.as_slice() {
        return Ok(single.iter().map(|v| v.clone().unwrap_or_default()).collect());
    }

    let separator = match separator {
        Some(sep)                          => sep,
        None if !cfg.separator.is_empty()  => cfg.separator.as_str(),
        None                               => profile.sep_token.as_str(),
    };
    let join_str = format!(" {separator} ");

    Ok((0..table.num_rows())
        .map(|row| {
            columns
                .iter()
                .map(|col| col[row].as_deref().unwrap_or(""))
                .collect::<Vec<_>>()
                .join(&join_str)
        })
        .collect())
}

/// Wrap a raw prompt with the configured start and answer separator.
pub fn parse_prompt(cfg: &DatasetConfig, profile: &TokenizerProfile, prompt: &str) -> String {
    let mut out = decode_escapes(&cfg.text_prompt_start);
    out.push_str(prompt);
    if cfg.add_eos_token_to_prompt {
        out.push_str(&profile.eos_token);
    }
    out.push_str(&decode_escapes(&cfg.text_answer_separator));
    out
}

// ─── Escape decoding ─────────────────────────────────────────────────────────

/// Decode backslash escapes the way Python's `unicode_escape` codec does.
/// Malformed or unknown escapes are kept verbatim.
pub fn decode_escapes(raw: &str) -> String {
    let mut out   = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(esc) = chars.next() else {
            out.push('\\');
            break;
        };
        match esc {
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"'  => out.push('"'),
            'a'  => out.push('\u{07}'),
            'b'  => out.push('\u{08}'),
            'f'  => out.push('\u{0C}'),
            'n'  => out.push('\n'),
            'r'  => out.push('\r'),
            't'  => out.push('\t'),
            'v'  => out.push('\u{0B}'),
            // backslash-newline is a line continuation
            '\n' => {}
            '0'..='7' => {
                let mut value = esc.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.extend(char::from_u32(value));
            }
            'x' | 'u' | 'U' => {
                let width = match esc {
                    'x' => 2,
                    'u' => 4,
                    _   => 8,
                };
                let mut digits = String::with_capacity(width);
                while digits.len() < width {
                    match chars.peek() {
                        Some(d) if d.is_ascii_hexdigit() => {
                            digits.push(*d);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                let decoded = (digits.len() == width)
                    .then(|| u32::from_str_radix(&digits, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);
                match decoded {
                    Some(ch) => out.push(ch),
                    None => {
                        out.push('\\');
                        out.push(esc);
                        out.push_str(&digits);
                    }
                }
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}
