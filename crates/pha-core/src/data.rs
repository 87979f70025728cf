//! The per-session user data bundle.
//!
//! A [`UserDataBundle`] is built once (usually by [`crate::MockDataGenerator`]),
//! wrapped in `Arc`, and only ever read afterwards. The derived views below are
//! what specialists and the CLI render into prompts and summaries.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Biological sex as recorded in the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
    Other,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Female => write!(f, "female"),
            Sex::Male => write!(f, "male"),
            Sex::Other => write!(f, "other"),
        }
    }
}

/// Static demographic profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub age: u32,
    pub sex: Sex,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub activity_level: String,
    pub timezone: String,
}

impl UserProfile {
    /// Body mass index rounded to one decimal, `0.0` for a non-positive height.
    pub fn bmi(&self) -> f64 {
        let height_m = self.height_cm / 100.0;
        if height_m <= 0.0 {
            return 0.0;
        }
        round1(self.weight_kg / (height_m * height_m))
    }

    /// One-line description, e.g. `35 y/o male, 178 cm, 82 kg, BMI 25.9, moderately_active`.
    pub fn describe(&self) -> String {
        format!(
            "{} y/o {}, {} cm, {} kg, BMI {}, {}",
            self.age,
            self.sex,
            self.height_cm,
            self.weight_kg,
            self.bmi(),
            self.activity_level
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,
    pub diagnosed: NaiveDate,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub started: NaiveDate,
}

/// Clinical records: conditions, medications, allergies and family history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthContext {
    pub conditions: Vec<Condition>,
    pub medications: Vec<Medication>,
    pub allergies: Vec<String>,
    pub family_history: Vec<String>,
}

/// One timestamped reading of an hourly series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepNight {
    pub date: NaiveDate,
    pub total_hours: f64,
    pub deep_hours: f64,
    pub rem_hours: f64,
    pub light_hours: f64,
    pub quality_score: f64,
    pub times_awakened: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDay {
    pub date: NaiveDate,
    pub steps: u32,
    pub active_minutes: u32,
    pub calories_burned: u32,
    pub distance_km: f64,
    pub floors_climbed: u32,
}

/// Wearable time series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WearableSeries {
    pub heart_rate: Vec<Sample>,
    pub sleep: Vec<SleepNight>,
    pub activity: Vec<ActivityDay>,
    pub heart_rate_variability: Vec<Sample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabResult {
    pub value: f64,
    pub unit: String,
    pub reference: String,
}

/// A lab panel drawn on a single date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabPanel {
    pub test_date: NaiveDate,
    pub results: BTreeMap<String, LabResult>,
}

/// Direction of a metric over the observed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Improving => write!(f, "improving"),
            Trend::Stable => write!(f, "stable"),
            Trend::Declining => write!(f, "declining"),
        }
    }
}

/// How regular daily activity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Consistency {
    High,
    Moderate,
    Low,
}

impl fmt::Display for Consistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Consistency::High => write!(f, "high"),
            Consistency::Moderate => write!(f, "moderate"),
            Consistency::Low => write!(f, "low"),
        }
    }
}

/// Averages derived from the wearable series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub avg_resting_heart_rate: f64,
    pub avg_sleep_hours: f64,
    pub avg_daily_steps: f64,
    pub avg_hrv: f64,
    pub sleep_quality_trend: Trend,
    pub activity_consistency: Consistency,
}

/// Sleep-quality delta between window halves that counts as a trend.
const TREND_THRESHOLD: f64 = 3.0;

/// Hours (UTC, exclusive) treated as the resting window.
const RESTING_HOURS_END: u32 = 6;

/// Everything known about the user for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDataBundle {
    pub profile: UserProfile,
    pub health: HealthContext,
    pub wearables: WearableSeries,
    pub labs: LabPanel,
}

impl UserDataBundle {
    pub fn condition_names(&self) -> Vec<String> {
        self.health.conditions.iter().map(|c| c.name.clone()).collect()
    }

    pub fn medication_names(&self) -> Vec<String> {
        self.health
            .medications
            .iter()
            .map(|m| m.name.clone())
            .collect()
    }

    /// Compute averages and trends from the wearable series.
    pub fn metrics_summary(&self) -> MetricsSummary {
        let w = &self.wearables;

        let resting: Vec<f64> = w
            .heart_rate
            .iter()
            .filter(|s| s.timestamp.hour() < RESTING_HOURS_END)
            .map(|s| s.value)
            .collect();
        let resting = if resting.is_empty() {
            w.heart_rate.iter().map(|s| s.value).collect()
        } else {
            resting
        };

        let steps: Vec<f64> = w.activity.iter().map(|d| f64::from(d.steps)).collect();

        MetricsSummary {
            avg_resting_heart_rate: round1(mean(&resting)),
            avg_sleep_hours: round1(mean(
                &w.sleep.iter().map(|n| n.total_hours).collect::<Vec<_>>(),
            )),
            avg_daily_steps: mean(&steps).round(),
            avg_hrv: round1(mean(
                &w.heart_rate_variability
                    .iter()
                    .map(|s| s.value)
                    .collect::<Vec<_>>(),
            )),
            sleep_quality_trend: sleep_trend(&w.sleep),
            activity_consistency: consistency(&steps),
        }
    }

    /// Series names, sample counts, and covered time range.
    pub fn wearable_overview(&self) -> String {
        let w = &self.wearables;
        let mut lines = vec![
            format!("- heart_rate: {} hourly samples (bpm)", w.heart_rate.len()),
            format!(
                "- heart_rate_variability: {} hourly samples (ms)",
                w.heart_rate_variability.len()
            ),
            format!(
                "- sleep: {} nights (total/deep/rem/light hours, quality score, awakenings)",
                w.sleep.len()
            ),
            format!(
                "- activity: {} days (steps, active minutes, calories, distance km, floors)",
                w.activity.len()
            ),
        ];

        if let (Some(first), Some(last)) = (w.heart_rate.first(), w.heart_rate.last()) {
            lines.push(format!(
                "- time range: {} to {}",
                first.timestamp.format("%Y-%m-%d %H:%M"),
                last.timestamp.format("%Y-%m-%d %H:%M")
            ));
        }
        lines.join("\n")
    }

    /// Conditions, medications, allergies and family history, one per line.
    pub fn health_records_text(&self) -> String {
        let h = &self.health;
        let conditions = h
            .conditions
            .iter()
            .map(|c| format!("{} ({}, diagnosed {})", c.name, c.status, c.diagnosed))
            .collect::<Vec<_>>();
        let medications = h
            .medications
            .iter()
            .map(|m| format!("{} {} {} (since {})", m.name, m.dosage, m.frequency, m.started))
            .collect::<Vec<_>>();

        format!(
            "Conditions: {}\nMedications: {}\nAllergies: {}\nFamily history: {}",
            join_or_none(&conditions),
            join_or_none(&medications),
            join_or_none(&h.allergies),
            join_or_none(&h.family_history),
        )
    }

    /// The lab panel with reference ranges.
    pub fn labs_text(&self) -> String {
        let mut lines = vec![format!("Test date: {}", self.labs.test_date)];
        lines.extend(
            self.labs
                .results
                .iter()
                .map(|(name, r)| format!("- {}: {} {} (ref {})", name, r.value, r.unit, r.reference)),
        );
        lines.join("\n")
    }

    /// Condensed human-readable rendering of the whole bundle.
    pub fn summary_text(&self) -> String {
        let m = self.metrics_summary();

        format!(
            "Profile: {profile}\n\
             {records}\n\
             Last {days} days: resting HR {hr} bpm, sleep {sleep} h/night (quality {trend}), \
             {steps} steps/day (consistency {consistency}), HRV {hrv} ms\n\
             Labs: {labs}",
            profile = self.profile.describe(),
            records = self.health_records_text(),
            days = self.wearables.activity.len(),
            hr = m.avg_resting_heart_rate,
            sleep = m.avg_sleep_hours,
            trend = m.sleep_quality_trend,
            steps = m.avg_daily_steps,
            consistency = m.activity_consistency,
            hrv = m.avg_hrv,
            labs = self.labs_text(),
        )
    }
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn sleep_trend(nights: &[SleepNight]) -> Trend {
    if nights.len() < 2 {
        return Trend::Stable;
    }
    let (early, late) = nights.split_at(nights.len() / 2);
    let early = mean(&early.iter().map(|n| n.quality_score).collect::<Vec<_>>());
    let late = mean(&late.iter().map(|n| n.quality_score).collect::<Vec<_>>());

    if late - early > TREND_THRESHOLD {
        Trend::Improving
    } else if early - late > TREND_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// Coefficient of variation of daily steps, bucketed.
fn consistency(steps: &[f64]) -> Consistency {
    let avg = mean(steps);
    if avg <= 0.0 {
        return Consistency::Low;
    }
    let variance = steps.iter().map(|s| (s - avg).powi(2)).sum::<f64>() / steps.len() as f64;
    let cv = variance.sqrt() / avg;

    if cv < 0.15 {
        Consistency::High
    } else if cv < 0.3 {
        Consistency::Moderate
    } else {
        Consistency::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockDataGenerator;

    fn night(quality: f64) -> SleepNight {
        SleepNight {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            total_hours: 7.0,
            deep_hours: 1.0,
            rem_hours: 1.5,
            light_hours: 4.5,
            quality_score: quality,
            times_awakened: 1,
        }
    }

    #[test]
    fn test_bmi() {
        let bundle = MockDataGenerator::new(1).generate();
        assert_eq!(bundle.profile.bmi(), 25.9);
    }

    #[test]
    fn test_bmi_zero_height() {
        let mut profile = MockDataGenerator::new(1).generate().profile;
        profile.height_cm = 0.0;
        assert_eq!(profile.bmi(), 0.0);
    }

    #[test]
    fn test_sleep_trend() {
        assert_eq!(sleep_trend(&[night(60.0), night(70.0)]), Trend::Improving);
        assert_eq!(sleep_trend(&[night(80.0), night(70.0)]), Trend::Declining);
        assert_eq!(sleep_trend(&[night(70.0), night(71.0)]), Trend::Stable);
        assert_eq!(sleep_trend(&[]), Trend::Stable);
    }

    #[test]
    fn test_consistency() {
        assert_eq!(consistency(&[10000.0, 10000.0, 10000.0]), Consistency::High);
        assert_eq!(consistency(&[2000.0, 14000.0]), Consistency::Low);
        assert_eq!(consistency(&[]), Consistency::Low);
    }

    #[test]
    fn test_metrics_summary_ranges() {
        let bundle = MockDataGenerator::new(42).generate();
        let m = bundle.metrics_summary();
        assert!(m.avg_resting_heart_rate > 40.0 && m.avg_resting_heart_rate < 100.0);
        assert!(m.avg_sleep_hours > 4.0 && m.avg_sleep_hours < 11.0);
        assert!(m.avg_daily_steps >= 2000.0);
        assert!(m.avg_hrv > 20.0 && m.avg_hrv < 70.0);
    }

    #[test]
    fn test_views() {
        let bundle = MockDataGenerator::new(42).generate();
        assert_eq!(bundle.condition_names(), vec!["Pre-hypertension".to_string()]);
        assert_eq!(bundle.medication_names(), vec!["Vitamin D3".to_string()]);

        let overview = bundle.wearable_overview();
        assert!(overview.contains("heart_rate: 720 hourly samples"));
        assert!(overview.contains("sleep: 30 nights"));
        assert!(overview.contains("time range"));

        let summary = bundle.summary_text();
        assert!(summary.contains("35 y/o male"));
        assert!(summary.contains("BMI 25.9"));
        assert!(summary.contains("ldl_cholesterol"));
        assert!(summary.contains("Last 30 days"));

        let records = bundle.health_records_text();
        assert!(records.contains("Pre-hypertension (monitoring"));
        assert!(records.contains("penicillin"));
        assert!(bundle.labs_text().starts_with("Test date: 2024-08-15"));
    }
}
