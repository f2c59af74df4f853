pub mod config;
pub mod domain_utils;
pub mod edit_distance;
pub mod email;
pub mod engine;
pub mod features;
pub mod scan_tracker;
pub mod statistics;

pub use config::HeuristicConfig;
pub use email::{EmailRecord, LinkRecord};
pub use engine::{AuxiliarySignal, RiskTier, ScoreResult, ScoringEngine};
pub use features::RuleHit;
pub use scan_tracker::ScanTracker;
pub use statistics::{FeedbackStore, ScanLog, ScanRecord};
