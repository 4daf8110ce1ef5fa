// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores generated answers against a validation table:
//
//   Step 1: Load config and validation table   (Layer 6 / 4)
//   Step 2: Load the raw predictions           (Layer 4 - data)
//   Step 3: Clean + score them                 (Layer 4 / 5)
//   Step 4: Append pred_<answer> and metric    (Layer 4 - data)
//   Step 5: Write the results CSV              (Layer 6 - infra)
//
// The predictions file has one row per validation row and a
// `predicted_text` column, in the same order.

use anyhow::{ensure, Context, Result};
use std::path::PathBuf;

use crate::application::config::ExperimentConfig;
use crate::data::{
    loader::CsvLoader,
    postprocess::{format_output, postprocess_output, FormattedOutput},
};
use crate::domain::table::Table;
use crate::domain::traits::RowSource;
use crate::infra::{
    config_store::ConfigStore,
    results_writer::{metric_column, ResultsWriter},
};
use crate::ml::metrics::metric_from_name;

pub const PREDICTED_TEXT: &str = "predicted_text";

#[derive(Debug, Clone)]
pub struct EvaluateRequest {
    pub config_path:      Option<PathBuf>,
    pub data_path:        PathBuf,
    pub predictions_path: PathBuf,
    pub output_path:      PathBuf,
    /// Overrides `prediction.metric`
    pub metric:           Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluateReport {
    pub metric:      String,
    pub mean_metric: f64,
    pub output:      FormattedOutput,
    pub output_path: PathBuf,
}

pub struct EvaluateUseCase {
    request: EvaluateRequest,
}

impl EvaluateUseCase {
    pub fn new(request: EvaluateRequest) -> Self {
        Self { request }
    }

    pub fn execute(&self) -> Result<EvaluateReport> {
        let req = &self.request;

        let mut cfg = ConfigStore::load_or_default(req.config_path.as_deref())?;
        if let Some(metric) = &req.metric {
            cfg.prediction.metric = metric.clone();
        }

        let table       = CsvLoader::new(&req.data_path).load_table()?;
        let predictions = CsvLoader::new(&req.predictions_path).load_table()?;
        let predicted_text = predictions
            .column(PREDICTED_TEXT)
            .with_context(|| format!(
                "'{}' has no '{PREDICTED_TEXT}' column",
                req.predictions_path.display()
            ))?
            .iter()
            .map(|v| v.clone().unwrap_or_default())
            .collect();

        let (output, results) = score_table(&cfg, table, predicted_text)?;
        ResultsWriter::new(&req.output_path).write(&results)?;

        let mean_metric = output.mean_metric();
        tracing::info!("Mean {}: {:.4}", cfg.prediction.metric, mean_metric);

        Ok(EvaluateReport {
            metric: cfg.prediction.metric,
            mean_metric,
            output,
            output_path: req.output_path.clone(),
        })
    }
}

/// Clean and score `predicted_text` against the answer column of `table`.
/// Returns the formatted predictions and the table with
/// `pred_<answer>`, `metric` and, when available, `explanation` appended.
pub fn score_table(
    cfg:            &ExperimentConfig,
    table:          Table,
    predicted_text: Vec<String>,
) -> Result<(FormattedOutput, Table)> {
    let answer_column = &cfg.dataset.answer_column;
    let answers = table
        .column(answer_column)
        .with_context(|| format!("Validation table has no '{answer_column}' column"))?
        .iter()
        .cloned()
        .collect::<Option<Vec<String>>>()
        .with_context(|| format!("Column '{answer_column}' contains missing values"))?;
    ensure!(
        predicted_text.len() == answers.len(),
        "{} predictions for {} validation rows",
        predicted_text.len(),
        answers.len()
    );

    let metric = metric_from_name(&cfg.prediction.metric)?;
    let scored = postprocess_output(cfg, &table, &answers, predicted_text, metric.as_ref())?;
    let (output, mut results) = format_output(cfg, table, scored)?;

    results.push_column("metric", metric_column(&output.metrics))?;
    if let Some(explanations) = &output.explanations {
        results.push_column("explanation", explanations.iter().cloned().map(Some).collect())?;
    }
    Ok((output, results))
}
