//! PHA Core - shared building blocks for the Personal Health Agent crates.
//!
//! - **config**: environment variable names, env-file loading, typed lookups
//! - **data**: the immutable per-session [`UserDataBundle`] and its read-only views
//! - **json**: defensive extraction of JSON objects from free-form model output
//! - **mock**: deterministic synthetic wearable/lab/profile data
//! - **queries**: sample health queries used by the demo modes

pub mod config;
pub mod data;
pub mod error;
pub mod json;
pub mod mock;
pub mod queries;

pub use config::{env_or, env_string, load_env_file, load_env_files};
pub use data::{
    ActivityDay, Condition, Consistency, HealthContext, LabPanel, LabResult, Medication,
    MetricsSummary, Sample, Sex, SleepNight, Trend, UserDataBundle, UserProfile, WearableSeries,
};
pub use error::{ConfigError, ParseError};
pub use json::{extract_json_block, parse_json, to_pretty_json};
pub use mock::MockDataGenerator;
pub use queries::{sample_queries, SAMPLE_QUERIES};
