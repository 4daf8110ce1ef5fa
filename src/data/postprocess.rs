// ============================================================
// Layer 4 — Prediction Post-processing
// ============================================================
// Turns generated token ids into scored predictions:
//
//   generated ids ──► decoded text   (postprocess_batch_predictions)
//                 ──► cleaned text   (clean_output: stop words cut)
//                 ──► scored rows    (postprocess_output)
//                 ──► results table  (format_output: pred_<answer>)

use anyhow::{ensure, Context, Result};

use crate::application::config::ExperimentConfig;
use crate::domain::table::Table;
use crate::domain::traits::TextTokenizer;
use crate::ml::metrics::{mean, MetricInput, TextMetric};

/// Cleaned predictions with their targets and per-row scores.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionOutput {
    pub predicted_text: Vec<String>,
    pub target_text:    Vec<String>,
    pub metrics:        Vec<f64>,
    /// Only set by metrics that return raw results.
    pub explanations:   Option<Vec<String>>,
}

impl PredictionOutput {
    pub fn mean_metric(&self) -> f64 {
        mean(self.metrics.iter().copied())
    }
}

/// Predictions ready for export, next to the prompt columns they answer.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedOutput {
    pub predicted_text: Vec<String>,
    pub metrics:        Vec<f64>,
    pub explanations:   Option<Vec<String>>,
    pub prompts:        Vec<(String, Vec<Option<String>>)>,
}

impl FormattedOutput {
    pub fn mean_metric(&self) -> f64 {
        mean(self.metrics.iter().copied())
    }
}

/// Decode generated answer ids, skipping special tokens.
pub fn postprocess_batch_predictions(
    tokenizer:            &dyn TextTokenizer,
    predicted_answer_ids: &[Vec<i64>],
) -> Result<Vec<String>> {
    predicted_answer_ids
        .iter()
        .map(|row| {
            let ids = row
                .iter()
                .map(|&id| u32::try_from(id).with_context(|| format!("Invalid token id {id}")))
                .collect::<Result<Vec<_>>>()?;
            Ok(tokenizer.decode(&ids, true)?.trim().to_string())
        })
        .collect()
}

/// Cut every text at the first occurrence of each stop word, in order.
pub fn clean_output(predicted_text: Vec<String>, stop_words: &[String]) -> Vec<String> {
    predicted_text
        .into_iter()
        .map(|text| {
            let mut text = text.trim();
            for stop in stop_words.iter().filter(|s| !s.is_empty()) {
                if let Some(pos) = text.find(stop.as_str()) {
                    text = &text[..pos];
                }
            }
            text.trim().to_string()
        })
        .collect()
}

/// Clean predictions and score them against `answers`.
pub fn postprocess_output(
    cfg:            &ExperimentConfig,
    table:          &Table,
    answers:        &[String],
    predicted_text: Vec<String>,
    metric:         &dyn TextMetric,
) -> Result<PredictionOutput> {
    let predicted_text = clean_output(predicted_text, &cfg.prediction.stop_tokens);
    let target_text    = answers.to_vec();
    ensure!(
        predicted_text.len() == target_text.len(),
        "{} predictions for {} answers",
        predicted_text.len(),
        target_text.len()
    );

    let input = MetricInput { predicted_text: &predicted_text, target_text: &target_text };
    let (metrics, explanations) = match metric.score_raw(cfg, input, table) {
        Some(raw) => {
            let raw = raw.with_context(|| format!("Metric {} failed", metric.name()))?;
            (raw.scores, Some(raw.explanations))
        }
        None => {
            let mut metrics = Vec::with_capacity(predicted_text.len());
            for row in 0..predicted_text.len() {
                let input = MetricInput {
                    predicted_text: &predicted_text[row..=row],
                    target_text:    &target_text[row..=row],
                };
                let row_table = table.slice_row(row).unwrap_or_default();
                metrics.push(metric.score(cfg, input, &row_table)?);
            }
            (metrics, None)
        }
    };

    Ok(PredictionOutput { predicted_text, target_text, metrics, explanations })
}

/// Attach the predictions to `table` as `pred_<answer_column>`.
pub fn format_output(
    cfg:    &ExperimentConfig,
    mut table: Table,
    output: PredictionOutput,
) -> Result<(FormattedOutput, Table)> {
    let prompts = cfg
        .dataset
        .prompt_columns
        .iter()
        .filter_map(|name| table.column(name).map(|values| (name.clone(), values.to_vec())))
        .collect();

    table.push_column(
        format!("pred_{}", cfg.dataset.answer_column),
        output.predicted_text.iter().cloned().map(Some).collect(),
    )?;

    let formatted = FormattedOutput {
        predicted_text: output.predicted_text,
        metrics:        output.metrics,
        explanations:   output.explanations,
        prompts,
    };
    Ok((formatted, table))
}
