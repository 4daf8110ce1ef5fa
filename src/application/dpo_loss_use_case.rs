// ============================================================
// Layer 2 — DpoLossUseCase
// ============================================================
// Computes a preference loss from precomputed sequence
// log-probabilities stored in a CSV file, one preference
// pair per row:
//
//   policy_chosen_logps,policy_rejected_logps,reference_chosen_logps,reference_rejected_logps
//   -12.5,-14.0,-13.1,-13.9
//
// The loss variant, beta and label smoothing come from the
// training section of the config; request fields override it.

use anyhow::{ensure, Context, Result};
use burn::backend::NdArray;
use burn::tensor::Tensor;
use std::path::PathBuf;

use crate::application::config::TrainingConfig;
use crate::data::loader::CsvLoader;
use crate::domain::table::Table;
use crate::domain::traits::RowSource;
use crate::infra::config_store::ConfigStore;
use crate::ml::losses::{DpoObjective, PreferenceLoss};

type CpuBackend = NdArray;

pub const POLICY_CHOSEN:      &str = "policy_chosen_logps";
pub const POLICY_REJECTED:    &str = "policy_rejected_logps";
pub const REFERENCE_CHOSEN:   &str = "reference_chosen_logps";
pub const REFERENCE_REJECTED: &str = "reference_rejected_logps";

#[derive(Debug, Clone, Default)]
pub struct DpoLossRequest {
    pub input_path:      PathBuf,
    pub config_path:     Option<PathBuf>,
    pub loss:            Option<String>,
    pub beta:            Option<f64>,
    pub label_smoothing: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DpoLossReport {
    pub variant:         PreferenceLoss,
    pub beta:            f64,
    pub pairs:           usize,
    pub loss:            f64,
    pub chosen_reward:   f64,
    pub rejected_reward: f64,
}

impl DpoLossReport {
    /// Mean margin between chosen and rejected rewards.
    pub fn reward_margin(&self) -> f64 {
        self.chosen_reward - self.rejected_reward
    }
}

pub struct DpoLossUseCase {
    request: DpoLossRequest,
}

impl DpoLossUseCase {
    pub fn new(request: DpoLossRequest) -> Self {
        Self { request }
    }

    pub fn execute(&self) -> Result<DpoLossReport> {
        let req = &self.request;

        let mut training = ConfigStore::load_or_default(req.config_path.as_deref())?.training;
        self.apply_overrides(&mut training);
        training.validate().context("Invalid preference loss settings")?;

        let table = CsvLoader::new(&req.input_path).load_table()?;
        compute_report(&table, &training)
    }

    fn apply_overrides(&self, training: &mut TrainingConfig) {
        if let Some(loss) = &self.request.loss {
            training.preference_loss = loss.clone();
        }
        if let Some(beta) = self.request.beta {
            training.beta = beta;
        }
        if let Some(smoothing) = self.request.label_smoothing {
            training.label_smoothing = smoothing;
        }
    }
}

/// Run the configured preference loss over every row of `table`.
pub fn compute_report(table: &Table, training: &TrainingConfig) -> Result<DpoLossReport> {
    ensure!(table.num_rows() > 0, "No preference pairs to score");

    let objective = DpoObjective::from_config(training);
    let device    = Default::default();
    let tensor = |name: &str| -> Result<Tensor<CpuBackend, 1>> {
        let values = float_column(table, name)?;
        Ok(Tensor::<CpuBackend, 1>::from_floats(values.as_slice(), &device))
    };

    let output = objective.forward(
        tensor(POLICY_CHOSEN)?,
        tensor(POLICY_REJECTED)?,
        tensor(REFERENCE_CHOSEN)?,
        tensor(REFERENCE_REJECTED)?,
    );

    let report = DpoLossReport {
        variant:         objective.variant,
        beta:            objective.beta,
        pairs:           table.num_rows(),
        loss:            output.loss_value(),
        chosen_reward:   output.chosen_reward_value(),
        rejected_reward: output.rejected_reward_value(),
    };
    tracing::info!(
        "{} over {} pairs: loss={:.4}, chosen_reward={:.4}, rejected_reward={:.4}",
        report.variant.name(),
        report.pairs,
        report.loss,
        report.chosen_reward,
        report.rejected_reward
    );
    Ok(report)
}

fn float_column(table: &Table, name: &str) -> Result<Vec<f32>> {
    let column = table
        .column(name)
        .with_context(|| format!("Missing column '{name}'"))?;
    column
        .iter()
        .enumerate()
        .map(|(row, cell)| {
            let cell = cell
                .as_deref()
                .with_context(|| format!("Empty '{name}' value in row {row}"))?;
            cell.trim()
                .parse::<f32>()
                .with_context(|| format!("Invalid '{name}' value '{cell}' in row {row}"))
        })
        .collect()
}
