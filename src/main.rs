use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use ironforest_io::{
    ClassProbability, DatasetReader, ExperimentName, FeatureEntry, FitSummary, OobEntry,
    PredictionEntry, ResultWriter,
};
use ironforest_rf::{
    MaxFeatures, OobMode, RandomForest, RandomForestConfig, SplitCriterion, Task,
};

#[derive(Parser)]
#[command(name = "ironforest")]
#[command(about = "Random forest classification and regression on tabular CSV data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Train a forest on a CSV file and save the model
    Fit {
        /// Path to the training CSV file
        #[arg(long)]
        data: PathBuf,

        /// Name of the target column
        #[arg(long)]
        target: String,

        /// Learning task: "classification" or "regression"
        #[arg(long, default_value = "classification")]
        task: String,

        /// Number of trees in the forest
        #[arg(long, default_value_t = 100)]
        n_estimators: usize,

        /// Maximum tree depth (unlimited if not set)
        #[arg(long)]
        max_depth: Option<usize>,

        /// Minimum samples required to split a node
        #[arg(long, default_value_t = 2)]
        min_samples_split: usize,

        /// Minimum samples required in each leaf
        #[arg(long, default_value_t = 1)]
        min_samples_leaf: usize,

        /// Features per split: "sqrt", "log2", "all", an integer, or a fraction in (0, 1]
        #[arg(long)]
        max_features: Option<String>,

        /// Impurity criterion for classification: "gini" or "entropy"
        #[arg(long, default_value = "gini")]
        criterion: String,

        /// Compute the out-of-bag score
        #[arg(long, default_value_t = false)]
        oob: bool,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Predict rows of a CSV file with a saved model
    Predict {
        /// Path to the trained model binary
        #[arg(long)]
        model: PathBuf,

        /// Path to the input CSV file
        #[arg(long)]
        data: PathBuf,

        /// Column to drop before predicting (e.g. the training target)
        #[arg(long)]
        target: Option<String>,

        /// Number of top-k classes to output per row (classification only)
        #[arg(long, default_value_t = 3)]
        top_k: usize,

        /// Experiment name for output files
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct FitOutput {
    experiment: String,
    task: String,
    n_samples: usize,
    n_features: usize,
    n_classes: usize,
    n_estimators: usize,
    oob_score: Option<f64>,
    model_path: String,
}

#[derive(Serialize)]
struct PredictOutput {
    experiment: String,
    task: String,
    n_rows: usize,
    model_n_trees: usize,
    model_n_features: usize,
    model_n_classes: usize,
}

fn parse_task(s: &str) -> Result<Task> {
    match s {
        "classification" => Ok(Task::Classification),
        "regression" => Ok(Task::Regression),
        other => anyhow::bail!("unknown task: {other} (expected classification or regression)"),
    }
}

fn parse_criterion(s: &str) -> Result<SplitCriterion> {
    match s {
        "gini" => Ok(SplitCriterion::Gini),
        "entropy" => Ok(SplitCriterion::Entropy),
        "mse" => Ok(SplitCriterion::Mse),
        other => anyhow::bail!("unknown criterion: {other} (expected gini, entropy, or mse)"),
    }
}

fn parse_max_features(s: &str) -> Result<MaxFeatures> {
    match s {
        "sqrt" => Ok(MaxFeatures::Sqrt),
        "log2" => Ok(MaxFeatures::Log2),
        "all" => Ok(MaxFeatures::All),
        other if other.contains('.') => other
            .parse::<f64>()
            .map(MaxFeatures::Fraction)
            .with_context(|| format!("invalid max_features fraction: {other}")),
        other => other
            .parse::<usize>()
            .map(MaxFeatures::Fixed)
            .with_context(|| {
                format!("invalid max_features: {other} (expected sqrt, log2, all, an integer, or a fraction)")
            }),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Fit {
            data,
            target,
            task,
            n_estimators,
            max_depth,
            min_samples_split,
            min_samples_leaf,
            max_features,
            criterion,
            oob,
            experiment,
            output_dir,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;
            let task = parse_task(&task)?;
            let max_features = max_features.as_deref().map(parse_max_features).transpose()?;

            // 1. Read dataset
            let dataset = DatasetReader::new(&data)
                .with_target(target)
                .read()
                .context("failed to read training CSV")?;
            let targets = dataset
                .targets()
                .context("training CSV has no target column")?;

            // 2. Train
            let oob_mode = if oob { OobMode::Enabled } else { OobMode::Disabled };
            let config = RandomForestConfig::new(n_estimators)?
                .with_max_depth(max_depth)
                .with_min_samples_split(min_samples_split)
                .with_min_samples_leaf(min_samples_leaf)
                .with_max_features(max_features)
                .with_criterion(parse_criterion(&criterion)?)
                .with_oob_mode(oob_mode)
                .with_random_state(cli.seed);
            let result = config
                .fit(task, dataset.features().view(), targets.view())
                .context("training failed")?;

            let oob_score = result.oob_score().map(|s| s.value());
            info!(oob_score = ?oob_score, "forest trained");

            // 3. Save model
            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            let model_path = writer.model_path();
            result
                .forest()
                .save(&model_path)
                .context("failed to save model")?;
            info!(path = %model_path.display(), "model saved");

            // 4. Write fit JSON
            let meta = result.metadata();
            let summary = FitSummary {
                experiment: experiment.clone(),
                task: meta.task.to_string(),
                n_samples: meta.n_samples,
                n_features: meta.n_features,
                n_classes: meta.n_classes,
                n_estimators: meta.n_estimators,
                max_features: meta.max_features_resolved,
                random_state: meta.random_state,
                model_path: model_path.display().to_string(),
                oob: result.oob_score().map(|s| OobEntry {
                    accuracy: s.accuracy(),
                    mse: s.mse(),
                    r2: s.r2(),
                    n_oob_samples: s.n_oob_samples(),
                }),
                feature_importances: result
                    .ranked_importances(dataset.feature_names())
                    .into_iter()
                    .map(|f| FeatureEntry {
                        name: f.name,
                        importance: f.importance,
                        rank: f.rank,
                    })
                    .collect(),
            };
            writer.write_fit(&summary)?;

            // 5. Print summary
            let output = FitOutput {
                experiment,
                task: summary.task,
                n_samples: summary.n_samples,
                n_features: summary.n_features,
                n_classes: summary.n_classes,
                n_estimators: summary.n_estimators,
                oob_score,
                model_path: summary.model_path,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Predict {
            model,
            data,
            target,
            top_k,
            experiment,
            output_dir,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            // 1. Load model
            let forest = RandomForest::load(&model).context("failed to load model")?;
            info!(
                n_trees = forest.n_trees(),
                n_features = forest.n_features(),
                n_classes = forest.n_classes(),
                "model loaded"
            );

            // 2. Read rows, dropping the target column if present
            let mut reader = DatasetReader::new(&data);
            if let Some(column) = target {
                reader = reader.with_target(column);
            }
            let dataset = reader.read().context("failed to read input CSV")?;
            let x = dataset.features().view();

            // 3. Predict: majority vote per row, plus top-k probabilities
            // for classification
            let labels = forest.predict(x).context("prediction failed")?;
            let top_k_per_row: Vec<Vec<ClassProbability>> = match forest.task() {
                Task::Classification => forest
                    .predict_proba_batch(x)
                    .context("probability prediction failed")?
                    .into_iter()
                    .map(|dist| {
                        dist.top_k(top_k)
                            .into_iter()
                            .map(|(class, probability)| ClassProbability { class, probability })
                            .collect()
                    })
                    .collect(),
                Task::Regression => vec![Vec::new(); labels.len()],
            };
            let predictions: Vec<PredictionEntry> = labels
                .iter()
                .zip(top_k_per_row)
                .enumerate()
                .map(|(row, (&prediction, top_k))| PredictionEntry {
                    row,
                    prediction,
                    top_k,
                })
                .collect();

            // 4. Write predictions JSON
            let task = forest.task().to_string();
            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            writer.write_predictions(&task, &predictions)?;

            // 5. Print summary
            let output = PredictOutput {
                experiment,
                task,
                n_rows: predictions.len(),
                model_n_trees: forest.n_trees(),
                model_n_features: forest.n_features(),
                model_n_classes: forest.n_classes(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
