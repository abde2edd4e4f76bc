//! Command-line front end: `foodcast train | inspect | predict`.

use crate::artifact::load_model;
use crate::config::ForecastConfig;
use crate::dataset::AttendanceDataset;
use crate::encoding::HandleUnknown;
use crate::error::{ForecastError, Result};
use crate::inspect::ArtifactSummary;
use crate::model::{ForestConfig, ModelKind};
use crate::predictor::{Forecast, Predictor};
use crate::record::{sanitize_popularity, MealRecord, DEFAULT_POPULARITY, WEEKDAYS};
use crate::training::{train, TrainingConfig};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(
    name = "foodcast",
    about = "Forecast canteen attendance and plan how many portions to cook",
    version
)]
pub struct Cli {
    /// Log debug output (overrides RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fit a model on historical attendance and save the artifact.
    Train(TrainArgs),

    /// Describe a saved model artifact.
    Inspect(InspectArgs),

    /// Predict attendance and portions for one meal.
    Predict(PredictArgs),
}

#[derive(Debug, Clone, Args)]
pub struct TrainArgs {
    /// CSV with Day_of_Week, Meal_Type, Food_Item, Popularity_Index, Expected_Students.
    #[arg(long)]
    pub data: PathBuf,

    /// Where to write the artifact (default: FOODCAST_MODEL_PATH or attendance_model.bin).
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Model family: random-forest or linear.
    #[arg(long, default_value = "random-forest")]
    pub model: ModelKind,

    #[arg(long, default_value_t = 300)]
    pub trees: usize,

    /// Maximum tree depth; unlimited when omitted.
    #[arg(long)]
    pub max_depth: Option<usize>,

    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[derive(Debug, Clone, Args)]
pub struct InspectArgs {
    /// Artifact path (default: FOODCAST_MODEL_PATH or attendance_model.bin).
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct PredictArgs {
    /// Artifact path (default: FOODCAST_MODEL_PATH or attendance_model.bin).
    #[arg(long)]
    pub model: Option<PathBuf>,

    #[arg(long)]
    pub day: Option<String>,

    #[arg(long)]
    pub meal: Option<String>,

    #[arg(long)]
    pub food: Option<String>,

    /// Popularity index in [0, 1]; invalid values fall back to 0.5.
    #[arg(long)]
    pub popularity: Option<String>,

    /// Extra share of portions on top of the prediction.
    #[arg(long)]
    pub buffer: Option<f64>,

    /// Reject food, meal or day values the model never saw.
    #[arg(long)]
    pub strict: bool,

    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Parse arguments, initialise logging and run.
pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli)
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // A second init (tests, embedding) is harmless.
    let _ = builder.try_init();
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Train(args) => run_train(args, &ForecastConfig::model_only_from_env()),
        Commands::Inspect(args) => run_inspect(args, &ForecastConfig::model_only_from_env()),
        Commands::Predict(args) => {
            let config = ForecastConfig::from_env()?;
            let stdin = io::stdin();
            let stdout = io::stdout();
            run_predict(args, &config, &mut stdin.lock(), &mut stdout.lock())
        }
    }
}

pub fn run_train(args: TrainArgs, config: &ForecastConfig) -> Result<()> {
    let output = args.output.unwrap_or_else(|| config.model_path.clone());
    let training = TrainingConfig::default()
        .with_model_kind(args.model)
        .with_test_fraction(args.test_fraction)
        .with_split_seed(args.seed)
        .with_forest(
            ForestConfig::default()
                .with_n_estimators(args.trees)
                .with_max_depth(args.max_depth)
                .with_seed(args.seed),
        );

    let dataset = AttendanceDataset::load(&args.data)?;
    let report = train(&dataset, &training)?;
    report.artifact.save_to_file(&output)?;

    match &report.test_metrics {
        Some(m) => println!(
            "Model trained successfully! MAE: {:.2}, R² Score: {:.3}",
            m.mae, m.r_squared
        ),
        None => println!(
            "Model trained successfully! (no held-out rows) training MAE: {:.2}",
            report.train_metrics.mae
        ),
    }
    println!("Model saved to {}", output.display());
    Ok(())
}

pub fn run_inspect(args: InspectArgs, config: &ForecastConfig) -> Result<()> {
    let path = args.model.unwrap_or_else(|| config.model_path.clone());
    println!("Loading model from: {}", path.display());
    let artifact = Arc::new(load_model(&path)?);
    let summary = ArtifactSummary::from_artifact(artifact)?;
    if args.json {
        println!("{}", summary.to_json()?);
    } else {
        println!("{}", summary);
    }
    Ok(())
}

/// Predict for one meal, prompting on `input` for any field not given as a flag.
pub fn run_predict<R: BufRead, W: Write>(
    args: PredictArgs,
    config: &ForecastConfig,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    let mut config = config.clone();
    if let Some(path) = args.model {
        config.model_path = path;
    }
    if let Some(buffer) = args.buffer {
        config.buffer_ratio = buffer;
    }
    if args.strict {
        config.handle_unknown = HandleUnknown::Error;
    }
    let policy = config.serving_policy()?;
    let predictor = Predictor::from_config(&config)?;

    let day = field_or_prompt(args.day, "Enter day of week (e.g. Monday)", input, out)?;
    let meal = field_or_prompt(args.meal, "Enter meal type (Breakfast/Lunch/Supper)", input, out)?;
    let food = field_or_prompt(args.food, "Enter food item (e.g. Rice)", input, out)?;
    let raw_popularity = match args.popularity {
        Some(p) => p,
        None => prompt("Enter popularity index (0.0 - 1.0)", input, out)?,
    };

    let popularity = sanitize_popularity(&raw_popularity);
    if let Some(err) = &popularity.warning {
        writeln!(
            out,
            "Warning: {}. Using default popularity of {}.",
            err, DEFAULT_POPULARITY
        )?;
    }

    let record = MealRecord::new(day, meal, food, popularity.value);
    if !record.has_known_weekday() {
        warn!(
            "'{}' is not a weekday name ({})",
            record.day_of_week,
            WEEKDAYS.join(", ")
        );
    }
    let forecast = predictor.forecast(&record, &policy)?;
    info!(
        "{} {} {}: {} students",
        record.day_of_week, record.meal_type, record.food_item, forecast.prediction.students
    );

    if args.json {
        writeln!(
            out,
            "{}",
            serde_json::to_string_pretty(&forecast).map_err(ForecastError::from)?
        )?;
    } else {
        write_report(out, &record, &forecast)?;
    }
    Ok(())
}

fn write_report<W: Write>(out: &mut W, record: &MealRecord, forecast: &Forecast) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "Prediction Results")?;
    writeln!(
        out,
        "  Meal: {} {} ({}, popularity {:.2})",
        record.day_of_week, record.meal_type, record.food_item, record.popularity_index
    )?;
    writeln!(out, "  Predicted Students: {}", forecast.prediction.students)?;
    writeln!(out, "  Suggested Portions: {}", forecast.strategy.portions)?;
    writeln!(out, "  Waste Risk Level: {}", forecast.strategy.risk)?;
    if forecast.prediction.is_low_confidence() {
        let unseen: Vec<String> = forecast
            .prediction
            .unseen
            .iter()
            .map(|u| format!("{} '{}'", u.field, u.value))
            .collect();
        writeln!(
            out,
            "  Note: {} not seen in training; estimate is less reliable.",
            unseen.join(", ")
        )?;
    }
    Ok(())
}

fn field_or_prompt<R: BufRead, W: Write>(
    value: Option<String>,
    label: &str,
    input: &mut R,
    out: &mut W,
) -> Result<String> {
    let value = match value {
        Some(v) => v.trim().to_string(),
        None => prompt(label, input, out)?,
    };
    if value.is_empty() {
        return Err(ForecastError::InvalidInput(format!(
            "no value given for '{}'",
            label
        )));
    }
    Ok(value)
}

fn prompt<R: BufRead, W: Write>(label: &str, input: &mut R, out: &mut W) -> Result<String> {
    write!(out, "{}: ", label)?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}
