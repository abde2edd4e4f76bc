//! Integration tests: train → save → load → predict → serving strategy.

use foodcast::model::ForestConfig;
use foodcast::{
    compute_serving_strategy, load_model, predict, train, AttendanceDataset, ForecastConfig,
    ForecastError, HandleUnknown, MealRecord, ModelKind, Predictor, RiskLevel, TrainingConfig,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

const DAYS: [&str; 5] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];
const MEALS: [&str; 3] = ["Breakfast", "Lunch", "Supper"];
const FOODS: [&str; 4] = ["Rice", "Garri", "Yam", "Bread & Egg"];

/// Lunch draws the biggest crowd, Garri the smallest; popularity adds up to 100.
fn write_history(path: &Path, rows: usize) {
    let mut csv = String::from("Day_of_Week,Meal_Type,Food_Item,Popularity_Index,Expected_Students\n");
    for i in 0..rows {
        let day = DAYS[i % 5];
        let meal = MEALS[i % 3];
        let food = FOODS[(i / 3) % 4];
        let popularity = ((i * 31) % 101) as f64 / 100.0;
        let base = match meal {
            "Lunch" => 200.0,
            "Supper" => 150.0,
            _ => 100.0,
        };
        let food_shift = if food == "Garri" { -40.0 } else { 0.0 };
        let students = base + food_shift + 100.0 * popularity;
        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            day, meal, food, popularity, students
        ));
    }
    std::fs::write(path, csv).unwrap();
}

fn small_forest() -> TrainingConfig {
    TrainingConfig::default().with_forest(ForestConfig::default().with_n_estimators(40))
}

#[test]
fn test_train_save_load_predict() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let data = dir.path().join("history.csv");
    let model_path = dir.path().join("attendance_model.bin");
    write_history(&data, 240);

    let dataset = AttendanceDataset::load(&data)?;
    let report = train(&dataset, &small_forest())?;
    report.artifact.save_to_file(&model_path)?;

    let artifact = load_model(&model_path)?;
    assert_eq!(artifact.model_kind(), ModelKind::RandomForest);
    assert_eq!(artifact.schema(), report.artifact.schema());

    let lunch = predict(&MealRecord::new("Monday", "Lunch", "Rice", 0.9), &artifact)?;
    let breakfast = predict(&MealRecord::new("Monday", "Breakfast", "Rice", 0.9), &artifact)?;
    assert!(
        lunch > breakfast + 50,
        "lunch {} should clearly beat breakfast {}",
        lunch,
        breakfast
    );

    let strategy = compute_serving_strategy(lunch, 0.07);
    assert!(strategy.portions >= u64::from(lunch));
    assert_eq!(strategy.risk, RiskLevel::Medium);
    Ok(())
}

#[test]
fn test_loaded_model_predicts_like_trained_model() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let data = dir.path().join("history.csv");
    let model_path = dir.path().join("model.bin");
    write_history(&data, 90);

    let report = train(&AttendanceDataset::load(&data)?, &small_forest())?;
    report.artifact.save_to_file(&model_path)?;
    let loaded = load_model(&model_path)?;

    for day in DAYS {
        for meal in MEALS {
            let record = MealRecord::new(day, meal, "Yam", 0.42);
            assert_eq!(predict(&record, &loaded)?, predict(&record, &report.artifact)?);
        }
    }
    Ok(())
}

#[test]
fn test_unseen_food_still_predicts() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let data = dir.path().join("history.csv");
    write_history(&data, 120);
    let report = train(&AttendanceDataset::load(&data)?, &small_forest())?;

    let predictor = Predictor::new(Arc::new(report.artifact));
    let prediction = predictor.predict(&MealRecord::new("Friday", "Supper", "Pizza", 0.5))?;
    assert!(prediction.is_low_confidence());
    assert_eq!(prediction.unseen.len(), 1);

    let strict = predictor.with_handle_unknown(HandleUnknown::Error);
    assert!(matches!(
        strict.predict(&MealRecord::new("Friday", "Supper", "Pizza", 0.5)),
        Err(ForecastError::UnknownCategory { .. })
    ));
    Ok(())
}

#[test]
fn test_linear_model_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let data = dir.path().join("history.csv");
    let model_path = dir.path().join("linear.bin");
    write_history(&data, 150);

    let config = TrainingConfig::default().with_model_kind(ModelKind::Linear);
    let report = train(&AttendanceDataset::load(&data)?, &config)?;
    report.artifact.save_to_file(&model_path)?;

    let predictor = Predictor::from_config(&ForecastConfig::default().with_model_path(&model_path))?;
    let p = predictor.predict(&MealRecord::new("Wednesday", "Lunch", "Rice", 0.5))?;
    // 200 + 100 * 0.5
    assert!((240..=260).contains(&p.students), "got {}", p.students);
    Ok(())
}

#[test]
fn test_missing_artifact_is_model_load() {
    let dir = tempdir().unwrap();
    let config = ForecastConfig::default().with_model_path(dir.path().join("absent.bin"));
    assert!(matches!(
        Predictor::from_config(&config),
        Err(ForecastError::ModelLoad { .. })
    ));
}

#[test]
fn test_training_is_reproducible() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let data = dir.path().join("history.csv");
    write_history(&data, 60);
    let dataset = AttendanceDataset::load(&data)?;
    let config = TrainingConfig::default().with_forest(ForestConfig::default().with_n_estimators(8));

    let a = train(&dataset, &config)?;
    let b = train(&dataset, &config)?;
    assert_eq!(a.test_metrics, b.test_metrics);
    let record = MealRecord::new("Thursday", "Supper", "Garri", 0.3);
    assert_eq!(predict(&record, &a.artifact)?, predict(&record, &b.artifact)?);
    Ok(())
}
