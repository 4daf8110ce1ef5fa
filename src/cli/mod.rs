// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `preview`  — builds the dataset and shows assembled prompts
//   2. `dpo-loss` — preference loss over precomputed log-probs
//   3. `evaluate` — cleans, scores and exports generated answers
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, DpoLossArgs, EvaluateArgs, PreviewArgs};

/// Number of scored predictions echoed after `evaluate`
const SHOWN_PREDICTIONS: usize = 5;

#[derive(Parser, Debug)]
#[command(
    name = "causal-tune",
    version = "0.1.0",
    about = "Build causal LM fine-tuning sequences, compute preference losses and score answers."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Preview(args)  => Self::run_preview(args),
            Commands::DpoLoss(args)  => Self::run_dpo_loss(args),
            Commands::Evaluate(args) => Self::run_evaluate(args),
        }
    }

    fn run_preview(args: PreviewArgs) -> Result<()> {
        use crate::application::preview_use_case::PreviewUseCase;

        tracing::info!("Previewing dataset: {}", args.data.display());

        let previews = PreviewUseCase::new(args.into()).execute()?;
        for p in &previews {
            println!(
                "\n[{}] {} tokens, {} supervised\n{}",
                p.index, p.tokens, p.supervised_tokens, p.prompt_text
            );
        }
        Ok(())
    }

    fn run_dpo_loss(args: DpoLossArgs) -> Result<()> {
        use crate::application::dpo_loss_use_case::DpoLossUseCase;

        let report = DpoLossUseCase::new(args.into()).execute()?;
        println!("Loss ({}, beta={}): {:.6}", report.variant.name(), report.beta, report.loss);
        println!("Chosen reward:   {:.6}", report.chosen_reward);
        println!("Rejected reward: {:.6}", report.rejected_reward);
        println!("Reward margin:   {:.6}", report.reward_margin());
        Ok(())
    }

    fn run_evaluate(args: EvaluateArgs) -> Result<()> {
        use crate::application::evaluate_use_case::EvaluateUseCase;

        let report = EvaluateUseCase::new(args.into()).execute()?;
        println!("Mean {}: {:.4}", report.metric, report.mean_metric);

        let output = &report.output;
        for (row, predicted) in output.predicted_text.iter().enumerate().take(SHOWN_PREDICTIONS) {
            let prompt = output
                .prompts
                .first()
                .and_then(|(_, values)| values.get(row).cloned().flatten())
                .unwrap_or_default();
            println!("\nPrompt:    {prompt}\nPredicted: {predicted}\nMetric:    {:.4}", output.metrics[row]);
        }
        println!("\nResults written to {}", report.output_path.display());
        Ok(())
    }
}
