// ============================================================
// Layer 5 — Text Metrics
// ============================================================
// Scores generated answers against target answers.
//
// A metric is called either once per row with a one-row
// table slice, or, when it offers raw results, once for the
// whole table, returning per-row scores plus a free-text
// explanation for each row.

use std::collections::HashMap;

use anyhow::{bail, ensure, Result};

use crate::application::config::ExperimentConfig;
use crate::domain::table::Table;

/// Predicted and target texts handed to a metric.
#[derive(Debug, Clone, Copy)]
pub struct MetricInput<'a> {
    pub predicted_text: &'a [String],
    pub target_text:    &'a [String],
}

/// Per-row scores with an explanation per row.
#[derive(Debug, Clone, PartialEq)]
pub struct RawScores {
    pub scores:       Vec<f64>,
    pub explanations: Vec<String>,
}

pub trait TextMetric: Send + Sync {
    fn name(&self) -> &'static str;

    /// Mean score over the rows of `input`.
    fn score(&self, cfg: &ExperimentConfig, input: MetricInput<'_>, table: &Table) -> Result<f64>;

    /// Whole-table scoring with explanations; `None` when unsupported.
    fn score_raw(
        &self,
        _cfg:   &ExperimentConfig,
        _input: MetricInput<'_>,
        _table: &Table,
    ) -> Option<Result<RawScores>> {
        None
    }
}

pub fn metric_from_name(name: &str) -> Result<Box<dyn TextMetric>> {
    match name {
        "ExactMatch" => Ok(Box::new(ExactMatch)),
        "TokenF1"    => Ok(Box::new(TokenF1)),
        other        => bail!("Unknown metric '{other}', expected ExactMatch or TokenF1"),
    }
}

fn check_lengths(input: &MetricInput<'_>) -> Result<()> {
    ensure!(
        input.predicted_text.len() == input.target_text.len(),
        "{} predictions for {} targets",
        input.predicted_text.len(),
        input.target_text.len()
    );
    Ok(())
}

/// Arithmetic mean; 0.0 for no values.
pub fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    values.sum::<f64>() / n as f64
}

// ─── ExactMatch ───────────────────────────────────────────────────────────────

/// 1.0 when the trimmed texts are identical.
pub struct ExactMatch;

impl TextMetric for ExactMatch {
    fn name(&self) -> &'static str {
        "ExactMatch"
    }

    fn score(&self, _cfg: &ExperimentConfig, input: MetricInput<'_>, _table: &Table) -> Result<f64> {
        check_lengths(&input)?;
        Ok(mean(
            input
                .predicted_text
                .iter()
                .zip(input.target_text)
                .map(|(p, t)| if p.trim() == t.trim() { 1.0 } else { 0.0 }),
        ))
    }
}

// ─── TokenF1 ──────────────────────────────────────────────────────────────────

/// Harmonic mean of whitespace-token precision and recall.
pub struct TokenF1;

struct Overlap {
    precision: f64,
    recall:    f64,
}

impl Overlap {
    fn between(prediction: &str, target: &str) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for token in target.split_whitespace() {
            *counts.entry(token).or_default() += 1;
        }
        let predicted = prediction.split_whitespace().count();
        let expected  = target.split_whitespace().count();

        let mut common = 0;
        for token in prediction.split_whitespace() {
            if let Some(n) = counts.get_mut(token).filter(|n| **n > 0) {
                *n -= 1;
                common += 1;
            }
        }
        let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
        Self {
            precision: ratio(common, predicted),
            recall:    ratio(common, expected),
        }
    }

    fn f1(&self) -> f64 {
        let total = self.precision + self.recall;
        if total == 0.0 {
            0.0
        } else {
            2.0 * self.precision * self.recall / total
        }
    }
}

impl TextMetric for TokenF1 {
    fn name(&self) -> &'static str {
        "TokenF1"
    }

    fn score(&self, _cfg: &ExperimentConfig, input: MetricInput<'_>, _table: &Table) -> Result<f64> {
        check_lengths(&input)?;
        Ok(mean(
            input
                .predicted_text
                .iter()
                .zip(input.target_text)
                .map(|(p, t)| Overlap::between(p, t).f1()),
        ))
    }

    fn score_raw(
        &self,
        _cfg:  &ExperimentConfig,
        input: MetricInput<'_>,
        _table: &Table,
    ) -> Option<Result<RawScores>> {
        let result = check_lengths(&input).map(|()| {
            let (scores, explanations) = input
                .predicted_text
                .iter()
                .zip(input.target_text)
                .map(|(p, t)| {
                    let overlap = Overlap::between(p, t);
                    (
                        overlap.f1(),
                        format!("precision {:.3}, recall {:.3}", overlap.precision, overlap.recall),
                    )
                })
                .unzip();
            RawScores { scores, explanations }
        });
        Some(result)
    }
}
