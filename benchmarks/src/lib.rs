//! Shared fixtures for the foodcast benchmarks.
//!
//! Generates deterministic synthetic attendance histories so benchmarks do
//! not depend on a dataset checked into the repository.

use foodcast::{AttendanceDataset, MealRecord, Result};

pub const DAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];
pub const MEALS: [&str; 3] = ["Breakfast", "Lunch", "Supper"];
pub const FOODS: [&str; 8] = [
    "Rice",
    "Jollof Rice",
    "Garri",
    "Yam",
    "Beans",
    "Bread & Egg",
    "Spaghetti",
    "Porridge",
];

/// `i`-th synthetic meal record.
pub fn record(i: usize) -> MealRecord {
    MealRecord::new(
        DAYS[i % DAYS.len()],
        MEALS[i % MEALS.len()],
        FOODS[(i / MEALS.len()) % FOODS.len()],
        ((i * 37) % 101) as f64 / 100.0,
    )
}

/// `n` records with an additive attendance pattern plus a small periodic wobble.
pub fn synthetic_history(n: usize) -> Result<AttendanceDataset> {
    let records: Vec<MealRecord> = (0..n).map(record).collect();
    let targets = records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let meal = match r.meal_type.as_str() {
                "Lunch" => 220.0,
                "Supper" => 160.0,
                _ => 110.0,
            };
            let weekend = if r.day_of_week.starts_with('S') { -50.0 } else { 0.0 };
            meal + weekend + 90.0 * r.popularity_index + (i % 7) as f64
        })
        .collect();
    AttendanceDataset::from_records(records, targets)
}
