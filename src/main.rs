use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::Level;

use diabetes_risk::console::Console;
use diabetes_risk::logging::{init_logging, LogFormat};
use diabetes_risk::{
    server, Classifier, FeatureVector, ForestParams, ModelArtifact, RiskClass, ServeConfig,
    TrainConfig, Trainer, FEATURE_NAMES,
};

#[derive(Parser)]
#[command(name = "diabetes-risk", version, about = "Train and serve a diabetes risk classifier")]
struct Cli {
    /// Log verbosity when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: Level,

    #[arg(long, global = true, value_enum, env = "DIABETES_LOG_FORMAT", default_value = "text")]
    log_format: LogFormatArg,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Text,
    Json,
}

#[derive(Args)]
struct ModelArg {
    /// Path of the model artifact
    #[arg(long, env = "DIABETES_MODEL_PATH", default_value = diabetes_risk::config::DEFAULT_MODEL_PATH)]
    model: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Fit the forest on the survey CSV and save it
    Train {
        #[arg(long, default_value = diabetes_risk::config::DEFAULT_DATASET_PATH)]
        dataset: PathBuf,
        #[command(flatten)]
        model: ModelArg,
        /// Skip scoring the held-out split
        #[arg(long)]
        no_evaluate: bool,
        /// Append this run to a JSON-lines ledger
        #[arg(long, value_name = "LEDGER", num_args = 0..=1,
              default_missing_value = diabetes_risk::config::DEFAULT_TRACKING_PATH)]
        track: Option<PathBuf>,
        #[arg(long, default_value_t = 200)]
        trees: usize,
        #[arg(long)]
        max_depth: Option<usize>,
        #[arg(long, default_value_t = 0.2)]
        test_ratio: f64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Serve predictions over HTTP
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        #[arg(long, default_value_t = 8000)]
        port: u16,
        #[command(flatten)]
        model: ModelArg,
    },
    /// Answer the questions interactively
    Console {
        #[command(flatten)]
        model: ModelArg,
    },
    /// Predict a single subject from 21 feature values
    Predict {
        #[command(flatten)]
        model: ModelArg,
        #[arg(num_args = 21, allow_negative_numbers = true, required = true)]
        features: Vec<f64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let format = match cli.log_format {
        LogFormatArg::Text => LogFormat::Text,
        LogFormatArg::Json => LogFormat::Json,
    };
    init_logging(cli.log_level, format);

    match cli.command {
        Command::Train {
            dataset,
            model,
            no_evaluate,
            track,
            trees,
            max_depth,
            test_ratio,
            seed,
        } => {
            let defaults = TrainConfig::default();
            let config = TrainConfig {
                dataset_path: dataset,
                model_path: model.model,
                test_ratio,
                split_seed: seed,
                forest: ForestParams {
                    n_trees: trees,
                    max_depth,
                    seed,
                    ..ForestParams::default()
                },
                evaluate: !no_evaluate,
                track_experiment: track.is_some(),
                tracking_path: track.unwrap_or(defaults.tracking_path.clone()),
                ..defaults
            };
            println!("🧠 Training model...");
            let report = Trainer::new(config)
                .run()
                .context("training failed")?;
            if let Some(f1) = report.f1_macro() {
                println!("✅ F1 (macro): {f1:.4}");
            }
            println!(
                "💾 Saved model to {:?} ({} train rows, {} test rows)",
                report.model_path, report.train_rows, report.test_rows
            );
        }
        Command::Serve { host, port, model } => {
            let config = ServeConfig {
                host,
                port,
                model_path: model.model,
            };
            let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
            runtime
                .block_on(server::serve(&config))
                .context("prediction service failed")?;
        }
        Command::Console { model } => {
            let model = load(&model.model)?;
            let stdin = io::stdin();
            let stdout = io::stdout();
            Console::new(&model, stdin.lock(), BufWriter::new(stdout.lock()))
                .run()
                .context("console session failed")?;
        }
        Command::Predict { model, features } => {
            let model = load(&model.model)?;
            let features = FeatureVector::try_from(features)?;
            let prediction = model.predict_one(&features)?;
            match RiskClass::from_label(prediction) {
                Some(class) => println!("{prediction} ({class})"),
                None => println!("{prediction}"),
            }
        }
    }

    Ok(())
}

fn load(path: &Path) -> Result<ModelArtifact> {
    ModelArtifact::load_for_schema(path, &FEATURE_NAMES)
        .with_context(|| format!("failed to load model from {path:?}"))
}
