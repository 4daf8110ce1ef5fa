// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `preview`, `dpo-loss` and
// `evaluate`, and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::{
    dpo_loss_use_case::DpoLossRequest,
    evaluate_use_case::EvaluateRequest,
    preview_use_case::PreviewRequest,
};
use crate::data::dataset::DatasetMode;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the dataset and print the first assembled prompts
    Preview(PreviewArgs),

    /// Compute a preference loss from precomputed log-probabilities
    DpoLoss(DpoLossArgs),

    /// Clean, score and export generated answers
    Evaluate(EvaluateArgs),
}

/// Dataset mode as accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Train,
    Validation,
}

impl From<ModeArg> for DatasetMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Train      => DatasetMode::Train,
            ModeArg::Validation => DatasetMode::Validation,
        }
    }
}

/// All arguments for the `preview` command.
#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// CSV table with prompt / answer (and optional id / parent_id) columns
    #[arg(long)]
    pub data: PathBuf,

    /// Directory containing tokenizer.json
    #[arg(long)]
    pub tokenizer_dir: PathBuf,

    /// Experiment config JSON; defaults are used when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Train mode enables parent skipping and random parent injection
    #[arg(long, value_enum, default_value_t = ModeArg::Validation)]
    pub mode: ModeArg,

    /// Number of items to show
    #[arg(long, default_value_t = 3)]
    pub count: usize,

    /// Seed for the train-mode augmentations
    #[arg(long)]
    pub seed: Option<u64>,
}

impl From<PreviewArgs> for PreviewRequest {
    fn from(a: PreviewArgs) -> Self {
        PreviewRequest {
            config_path:   a.config,
            data_path:     a.data,
            tokenizer_dir: a.tokenizer_dir,
            mode:          a.mode.into(),
            count:         a.count,
            seed:          a.seed,
        }
    }
}

/// All arguments for the `dpo-loss` command.
#[derive(Args, Debug)]
pub struct DpoLossArgs {
    /// CSV with policy_chosen_logps, policy_rejected_logps,
    /// reference_chosen_logps and reference_rejected_logps columns
    #[arg(long)]
    pub input: PathBuf,

    /// Experiment config JSON; defaults are used when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// DPOLoss, HingeLoss or IPOLoss
    #[arg(long)]
    pub loss: Option<String>,

    /// Temperature of the implicit reward
    #[arg(long)]
    pub beta: Option<f64>,

    /// Conservative DPO smoothing, sigmoid variant only
    #[arg(long)]
    pub label_smoothing: Option<f64>,
}

impl From<DpoLossArgs> for DpoLossRequest {
    fn from(a: DpoLossArgs) -> Self {
        DpoLossRequest {
            input_path:      a.input,
            config_path:     a.config,
            loss:            a.loss,
            beta:            a.beta,
            label_smoothing: a.label_smoothing,
        }
    }
}

/// All arguments for the `evaluate` command.
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Validation CSV the predictions were generated for
    #[arg(long)]
    pub data: PathBuf,

    /// CSV with a `predicted_text` column, one row per validation row
    #[arg(long)]
    pub predictions: PathBuf,

    /// Where to write the scored results table
    #[arg(long, default_value = "validation_predictions.csv")]
    pub output: PathBuf,

    /// Experiment config JSON; defaults are used when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Metric name, overrides the config
    #[arg(long)]
    pub metric: Option<String>,
}

impl From<EvaluateArgs> for EvaluateRequest {
    fn from(a: EvaluateArgs) -> Self {
        EvaluateRequest {
            config_path:      a.config,
            data_path:        a.data,
            predictions_path: a.predictions,
            output_path:      a.output,
            metric:           a.metric,
        }
    }
}
