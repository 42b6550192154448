//! `newscheck` command line: train, serve, predict.

use std::{io::Read, path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

use crate::{
    CLASSIFICATION_THRESHOLD, Dataset, Predictor, VectorizerParams,
    server::{self, DEFAULT_ADDR},
    training::{self, DEFAULT_MAX_DF, DEFAULT_SEED, DEFAULT_TEST_SIZE, TrainingConfig},
};

const DEFAULT_ARTIFACTS_DIR: &str = "model_artifacts";

#[derive(Parser, Debug)]
#[command(name = "newscheck", version)]
#[command(about = "Classify news articles as real or fake", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fit the vectorizer and classifier on a labeled CSV and save the artifacts
    Train(TrainArgs),
    /// Serve the prediction endpoint over HTTP
    Serve(ServeArgs),
    /// Classify text from the command line
    Predict(PredictArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// CSV file with `text` and `label` columns
    #[arg(short, long, value_name = "PATH", env = "NEWSCHECK_DATASET", default_value = "dataset.csv")]
    pub dataset: PathBuf,

    /// Directory the artifacts are written to
    #[arg(short, long, value_name = "DIR", env = "NEWSCHECK_ARTIFACTS_DIR", default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts: PathBuf,

    /// Seed for the train/test shuffle
    #[arg(long, env = "NEWSCHECK_SEED", default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Fraction of records held out for evaluation
    #[arg(long, default_value_t = DEFAULT_TEST_SIZE)]
    pub test_size: f64,

    /// Ignore terms in more than this fraction (or count) of documents
    #[arg(long, default_value_t = DEFAULT_MAX_DF)]
    pub max_df: f64,

    /// Ignore terms in fewer than this fraction (or count) of documents
    #[arg(long, default_value_t = 1.0)]
    pub min_df: f64,

    /// Largest n-gram length to index (unigrams only by default)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=8))]
    pub max_ngram: u8,

    /// Keep only the most frequent terms
    #[arg(long)]
    pub max_features: Option<usize>,

    /// Use 1 + ln(tf) instead of raw term counts
    #[arg(long)]
    pub sublinear_tf: bool,

    /// L2 regularization strength of the logistic regression
    #[arg(long, default_value_t = 1.0)]
    pub alpha: f64,

    /// Maximum optimizer iterations
    #[arg(long, default_value_t = 100)]
    pub max_iterations: u64,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Directory holding the trained artifacts
    #[arg(short, long, value_name = "DIR", env = "NEWSCHECK_ARTIFACTS_DIR", default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts: PathBuf,

    /// Address to listen on
    #[arg(long, env = "NEWSCHECK_ADDR", default_value = DEFAULT_ADDR)]
    pub addr: String,

    /// P(real) above which text is classified as real
    #[arg(short, long, env = "NEWSCHECK_THRESHOLD", default_value_t = CLASSIFICATION_THRESHOLD, value_parser = parse_probability)]
    pub threshold: f64,
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Text to analyze (if not provided, reads from stdin)
    #[arg(value_name = "TEXT")]
    pub text: Option<String>,

    /// Read text from file
    #[arg(short, long, value_name = "PATH", conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Directory holding the trained artifacts
    #[arg(short, long, value_name = "DIR", env = "NEWSCHECK_ARTIFACTS_DIR", default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts: PathBuf,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// P(real) above which text is classified as real
    #[arg(short, long, env = "NEWSCHECK_THRESHOLD", default_value_t = CLASSIFICATION_THRESHOLD, value_parser = parse_probability)]
    pub threshold: f64,

    /// Print inference time to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Output just the class label (0 or 1)
    Class,
    /// Output P(real) as a float 0-1
    Probability,
    /// Output as JSON, same shape as the HTTP endpoint
    Json,
    /// Human-readable output with confidence
    Human,
}

fn parse_probability(value: &str) -> std::result::Result<f64, String> {
    let parsed: f64 = value
        .parse()
        .map_err(|_| format!("`{value}` is not a number"))?;
    if (0.0..=1.0).contains(&parsed) {
        Ok(parsed)
    } else {
        Err(format!("`{value}` is not in [0, 1]"))
    }
}

pub fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Train(args) => train(args),
        Command::Serve(args) => serve(args),
        Command::Predict(args) => predict(args),
    }
}

fn training_config(args: &TrainArgs) -> Result<TrainingConfig> {
    let vectorizer = VectorizerParams::new(
        1..=usize::from(args.max_ngram),
        args.min_df,
        args.max_df,
        args.sublinear_tf,
    )?
    .with_max_features(args.max_features)?;
    Ok(TrainingConfig {
        vectorizer,
        logistic: crate::LogisticParams {
            alpha: args.alpha,
            max_iterations: args.max_iterations,
        },
        test_size: args.test_size,
        seed: args.seed,
    })
}

fn train(args: &TrainArgs) -> Result<()> {
    let config = training_config(args)?;
    let dataset = Dataset::from_csv(&args.dataset)
        .with_context(|| format!("Failed to load dataset {}", args.dataset.display()))?;

    let start = Instant::now();
    let trained = training::train(&dataset, &config).context("Training failed")?;
    info!(
        elapsed = ?start.elapsed(),
        train = trained.train_size,
        test = trained.test_size,
        "Training finished"
    );
    println!("{}", trained.report);

    trained
        .artifacts
        .save(&args.artifacts)
        .with_context(|| format!("Failed to save artifacts to {}", args.artifacts.display()))?;
    println!("Model and vectorizer saved successfully");
    Ok(())
}

fn serve(args: &ServeArgs) -> Result<()> {
    let predictor = Predictor::load(&args.artifacts)
        .with_context(|| format!("Failed to load artifacts from {}", args.artifacts.display()))?
        .with_threshold(args.threshold);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(server::serve(&args.addr, predictor))
}

fn read_input(args: &PredictArgs) -> Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    if let Some(path) = &args.file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()));
    }
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read from stdin")?;
    Ok(buffer)
}

fn predict(args: &PredictArgs) -> Result<()> {
    let text = read_input(args)?;
    let predictor = Predictor::load(&args.artifacts)
        .with_context(|| format!("Failed to load artifacts from {}", args.artifacts.display()))?
        .with_threshold(args.threshold);

    let start = args.verbose.then(Instant::now);
    let prediction = predictor.predict(&text)?;
    if let Some(start_time) = start {
        eprintln!("Inference time: {:?}", start_time.elapsed());
    }

    println!("{}", render(&prediction, args.threshold, args.format)?);
    Ok(())
}

fn render(prediction: &crate::Prediction, threshold: f64, format: OutputFormat) -> Result<String> {
    let class = prediction.classification(threshold);
    Ok(match format {
        OutputFormat::Class => usize::from(class).to_string(),
        OutputFormat::Probability => format!("{:.4}", prediction.real_probability()),
        OutputFormat::Json => serde_json::to_string(&server::PredictResponse {
            prediction: class.label().to_string(),
            confidence: prediction.confidence(threshold),
        })?,
        OutputFormat::Human => format!(
            "Result: {class}\nConfidence: {:.2}%",
            prediction.confidence(threshold)
        ),
    })
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;
    use crate::Prediction;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_train_defaults() {
        let cli = Cli::try_parse_from(["newscheck", "train"]).unwrap();
        let Command::Train(args) = cli.command else {
            panic!("expected train subcommand");
        };
        let config = training_config(&args).unwrap();
        assert_eq!(config.seed, 42);
        assert!((config.test_size - 0.2).abs() < f64::EPSILON);
        assert!((config.vectorizer.max_df() - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.vectorizer.ngram_range(), (1, 1));
    }

    #[test]
    fn test_threshold_must_be_a_probability() {
        assert!(Cli::try_parse_from(["newscheck", "serve", "--threshold", "1.5"]).is_err());
        assert!(Cli::try_parse_from(["newscheck", "serve", "--threshold", "abc"]).is_err());
        let cli = Cli::try_parse_from(["newscheck", "serve", "-t", "0.6"]).unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("expected serve subcommand");
        };
        assert!((args.threshold - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_text_and_file_conflict() {
        assert!(Cli::try_parse_from(["newscheck", "predict", "hello", "--file", "x.txt"]).is_err());
    }

    #[test]
    fn test_render_formats() {
        let prediction = Prediction::from_real_probability(0.9);
        assert_eq!(render(&prediction, 0.5, OutputFormat::Class).unwrap(), "1");
        assert_eq!(render(&prediction, 0.5, OutputFormat::Probability).unwrap(), "0.9000");
        assert_eq!(
            render(&prediction, 0.5, OutputFormat::Json).unwrap(),
            r#"{"prediction":"REAL NEWS","confidence":90.0}"#
        );
        assert_eq!(
            render(&prediction, 0.5, OutputFormat::Human).unwrap(),
            "Result: REAL NEWS\nConfidence: 90.00%"
        );
    }

    #[test]
    fn test_train_then_predict_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let dataset_path = dir.path().join("dataset.csv");
        let artifacts_dir = dir.path().join("model_artifacts");

        let dataset = crate::training::tests::toy_dataset(20);
        let mut writer = csv::Writer::from_path(&dataset_path).unwrap();
        writer.write_record(["text", "label"]).unwrap();
        for (text, label) in dataset.texts().iter().zip(dataset.labels()) {
            let label = usize::from(*label).to_string();
            writer.write_record([text.as_str(), label.as_str()]).unwrap();
        }
        writer.flush().unwrap();

        let dataset_arg = dataset_path.to_str().unwrap();
        let artifacts_arg = artifacts_dir.to_str().unwrap();
        let train = Cli::try_parse_from([
            "newscheck",
            "train",
            "--dataset",
            dataset_arg,
            "--artifacts",
            artifacts_arg,
        ])
        .unwrap();
        run(&train).unwrap();
        assert!(artifacts_dir.join(crate::VECTORIZER_FILENAME).is_file());
        assert!(artifacts_dir.join(crate::CLASSIFIER_FILENAME).is_file());

        let input = dir.path().join("article.txt");
        std::fs::write(&input, "Senate committee officials announced the budget report").unwrap();
        let predict_args = |path: &std::path::Path| {
            Cli::try_parse_from([
                "newscheck",
                "predict",
                "--file",
                path.to_str().unwrap(),
                "--artifacts",
                artifacts_arg,
                "--format",
                "json",
            ])
            .unwrap()
        };
        run(&predict_args(&input)).unwrap();

        let predictor = Predictor::load(&artifacts_dir).unwrap();
        let text = std::fs::read_to_string(&input).unwrap();
        assert_eq!(predictor.classify(&text).unwrap(), crate::Classification::Real);

        let blank = dir.path().join("blank.txt");
        std::fs::write(&blank, "  \n").unwrap();
        let err = run(&predict_args(&blank)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::NewsCheckError>(),
            Some(crate::NewsCheckError::EmptyInput)
        ));
    }
}
