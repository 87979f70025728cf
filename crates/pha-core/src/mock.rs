//! Deterministic synthetic user data.
//!
//! The generator is seeded so that demos, tests, and comparisons see the same
//! series for the same seed and anchor time.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data::{
    ActivityDay, Condition, HealthContext, LabPanel, LabResult, Medication, Sample, Sex,
    SleepNight, UserDataBundle, UserProfile, WearableSeries,
};

const HOURS_PER_DAY: u32 = 24;
const HEART_RATE_BASE: f64 = 72.0;
const HRV_BASE: f64 = 45.0;
const SERIES_VARIANCE: f64 = 8.0;
const WEEKDAY_STEPS: f64 = 10_000.0;
const WEEKEND_STEPS: f64 = 8_000.0;
const STEPS_STD_DEV: f64 = 2_000.0;
const MIN_STEPS: f64 = 2_000.0;
const KM_PER_STEP: f64 = 0.0008;

/// Builds a [`UserDataBundle`] for the demo user.
#[derive(Debug, Clone)]
pub struct MockDataGenerator {
    seed: u64,
    days: u32,
    anchor: DateTime<Utc>,
}

impl MockDataGenerator {
    pub const DEFAULT_SEED: u64 = 42;
    pub const DEFAULT_DAYS: u32 = 30;

    /// Create a generator ending at the current time.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            days: Self::DEFAULT_DAYS,
            anchor: Utc::now(),
        }
    }

    /// Set the number of days covered by the series.
    pub fn with_days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }

    /// Fix the time at which the series end.
    pub fn with_anchor(mut self, anchor: DateTime<Utc>) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    /// Generate the full bundle.
    pub fn generate(&self) -> UserDataBundle {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let start_date = self.anchor.date_naive() - Duration::days(i64::from(self.days));
        let start = Utc.from_utc_datetime(&start_date.and_time(NaiveTime::MIN));

        let heart_rate = hourly_series(&mut rng, start, self.days, HEART_RATE_BASE, true);
        let sleep = sleep_nights(&mut rng, start_date, self.days);
        let activity = activity_days(&mut rng, start_date, self.days);
        let heart_rate_variability = hourly_series(&mut rng, start, self.days, HRV_BASE, false);

        UserDataBundle {
            profile: profile(),
            health: health_context(),
            wearables: WearableSeries {
                heart_rate,
                sleep,
                activity,
                heart_rate_variability,
            },
            labs: lab_panel(),
        }
    }
}

impl Default for MockDataGenerator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}

/// Box-Muller transform over the seeded generator.
fn gaussian(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    mean + z * std_dev
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn hourly_series(
    rng: &mut StdRng,
    start: DateTime<Utc>,
    days: u32,
    base: f64,
    daily_pattern: bool,
) -> Vec<Sample> {
    let mut samples = Vec::with_capacity((days * HOURS_PER_DAY) as usize);
    for day in 0..days {
        for hour in 0..HOURS_PER_DAY {
            let timestamp =
                start + Duration::days(i64::from(day)) + Duration::hours(i64::from(hour));
            // Lower at night, higher in the evening.
            let factor = if daily_pattern {
                1.0 + 0.3 * ((f64::from(hour) - 12.0) / 12.0)
            } else {
                1.0
            };
            let value = gaussian(rng, base * factor, SERIES_VARIANCE);
            samples.push(Sample {
                timestamp,
                value: round_to(value, 2),
            });
        }
    }
    samples
}

fn sleep_nights(rng: &mut StdRng, start: NaiveDate, days: u32) -> Vec<SleepNight> {
    (0..days)
        .map(|day| {
            let total = gaussian(rng, 7.5, 1.0).max(3.0);
            let deep = total * rng.gen_range(0.15..0.25);
            let rem = total * rng.gen_range(0.20..0.25);
            SleepNight {
                date: start + Duration::days(i64::from(day)),
                total_hours: round_to(total, 2),
                deep_hours: round_to(deep, 2),
                rem_hours: round_to(rem, 2),
                light_hours: round_to(total - deep - rem, 2),
                quality_score: round_to(rng.gen_range(60.0..95.0), 1),
                times_awakened: rng.gen_range(0..=5),
            }
        })
        .collect()
}

fn activity_days(rng: &mut StdRng, start: NaiveDate, days: u32) -> Vec<ActivityDay> {
    (0..days)
        .map(|day| {
            let date = start + Duration::days(i64::from(day));
            let base = match date.weekday() {
                Weekday::Sat | Weekday::Sun => WEEKEND_STEPS,
                _ => WEEKDAY_STEPS,
            };
            let steps = gaussian(rng, base, STEPS_STD_DEV).max(MIN_STEPS).round();
            ActivityDay {
                date,
                steps: steps as u32,
                active_minutes: rng.gen_range(20..=90),
                calories_burned: rng.gen_range(1800..=2800),
                distance_km: round_to(steps * KM_PER_STEP, 2),
                floors_climbed: rng.gen_range(5..=25),
            }
        })
        .collect()
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

fn profile() -> UserProfile {
    UserProfile {
        user_id: "user_001".to_string(),
        age: 35,
        sex: Sex::Male,
        height_cm: 178.0,
        weight_kg: 82.0,
        activity_level: "moderately_active".to_string(),
        timezone: "America/Los_Angeles".to_string(),
    }
}

fn health_context() -> HealthContext {
    HealthContext {
        conditions: vec![Condition {
            name: "Pre-hypertension".to_string(),
            diagnosed: date(2023, 3, 15),
            status: "monitoring".to_string(),
        }],
        medications: vec![Medication {
            name: "Vitamin D3".to_string(),
            dosage: "2000 IU".to_string(),
            frequency: "daily".to_string(),
            started: date(2023, 1, 10),
        }],
        allergies: vec!["penicillin".to_string()],
        family_history: vec![
            "Type 2 Diabetes (father)".to_string(),
            "Hypertension (mother)".to_string(),
        ],
    }
}

fn lab_panel() -> LabPanel {
    let entries = [
        ("cholesterol_total", 195.0, "mg/dL", "< 200"),
        ("ldl_cholesterol", 120.0, "mg/dL", "< 100"),
        ("hdl_cholesterol", 52.0, "mg/dL", "> 40"),
        ("triglycerides", 115.0, "mg/dL", "< 150"),
        ("glucose_fasting", 98.0, "mg/dL", "70-100"),
        ("hba1c", 5.4, "%", "< 5.7"),
        ("vitamin_d", 28.0, "ng/mL", "30-100"),
    ];

    let results: BTreeMap<String, LabResult> = entries
        .into_iter()
        .map(|(name, value, unit, reference)| {
            (
                name.to_string(),
                LabResult {
                    value,
                    unit: unit.to_string(),
                    reference: reference.to_string(),
                },
            )
        })
        .collect();

    LabPanel {
        test_date: date(2024, 8, 15),
        results,
    }
}
