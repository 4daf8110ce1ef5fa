// ============================================================
// Layer 5 — Stopping Criteria
// ============================================================
// Consulted by a backbone after every generation step. Only
// the generated part of each row (after the prompt length)
// is searched for stop words.

/// Decides whether generation should end, given the full sequences
/// (prompt followed by the tokens generated so far), one row per sample.
pub trait StoppingCriteria: Send + Sync {
    fn should_stop(&self, input_ids: &[Vec<i64>]) -> bool;
}

/// Stops once every row's generated part contains one stop word.
/// A stop word is a run of token ids that must appear contiguously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStoppingCriteria {
    stop_word_ids:        Vec<Vec<i64>>,
    prompt_input_ids_len: usize,
}

impl TokenStoppingCriteria {
    pub fn new(stop_word_ids: Vec<Vec<i64>>, prompt_input_ids_len: usize) -> Self {
        let stop_word_ids = stop_word_ids.into_iter().filter(|w| !w.is_empty()).collect();
        Self { stop_word_ids, prompt_input_ids_len }
    }

    fn found_in_every_row(stop_word: &[i64], generated: &[&[i64]]) -> bool {
        generated
            .iter()
            .all(|row| row.windows(stop_word.len()).any(|w| w == stop_word))
    }
}

impl StoppingCriteria for TokenStoppingCriteria {
    fn should_stop(&self, input_ids: &[Vec<i64>]) -> bool {
        if input_ids.is_empty() {
            return false;
        }
        let generated: Vec<&[i64]> = input_ids
            .iter()
            .map(|row| &row[self.prompt_input_ids_len.min(row.len())..])
            .collect();

        for stop_word in &self.stop_word_ids {
            if Self::found_in_every_row(stop_word, &generated) {
                if generated.iter().any(|row| row.len() == 1) {
                    tracing::warn!(
                        "Stopping criteria triggered for {:?} at first generated token.",
                        stop_word
                    );
                }
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ignores_prompt_tokens() {
        let criteria = TokenStoppingCriteria::new(vec![vec![9]], 2);
        assert!(!criteria.should_stop(&[vec![9, 9, 4]]));
        assert!(criteria.should_stop(&[vec![9, 9, 4, 9]]));
    }

    #[test]
    fn test_every_row_must_match() {
        let criteria = TokenStoppingCriteria::new(vec![vec![7, 8]], 1);
        let rows = vec![vec![0, 7, 8, 3], vec![0, 3, 7, 3]];
        assert!(!criteria.should_stop(&rows));

        let rows = vec![vec![0, 7, 8, 3], vec![0, 3, 7, 8]];
        assert!(criteria.should_stop(&rows));
    }

    #[test]
    fn test_any_stop_word_suffices() {
        let criteria = TokenStoppingCriteria::new(vec![vec![5], vec![6]], 0);
        assert!(criteria.should_stop(&[vec![1, 6], vec![6, 2]]));
    }

    #[test]
    fn test_empty_stop_words_never_stop() {
        let criteria = TokenStoppingCriteria::new(vec![Vec::new()], 0);
        assert!(!criteria.should_stop(&[vec![1, 2, 3]]));
        assert!(!TokenStoppingCriteria::new(Vec::new(), 0).should_stop(&[vec![1]]));
    }
}
