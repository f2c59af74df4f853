use crate::engine::{RiskTier, ScoreResult};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// One scored message, as kept for aggregate counters. No message content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub timestamp: DateTime<Utc>,
    pub score: u8,
    pub risk_tier: RiskTier,
}

impl ScanRecord {
    pub fn from_result(result: &ScoreResult) -> Self {
        Self {
            timestamp: Utc::now(),
            score: result.score,
            risk_tier: result.risk_tier,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackVerdict {
    Phishing,
    Legitimate,
}

impl std::str::FromStr for FeedbackVerdict {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "phishing" => Ok(FeedbackVerdict::Phishing),
            "legitimate" | "safe" => Ok(FeedbackVerdict::Legitimate),
            other => anyhow::bail!("unknown verdict '{}': use phishing or legitimate", other),
        }
    }
}

/// User report about a sender. Stored only; never fed back into scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub timestamp: DateTime<Utc>,
    pub sender: String,
    pub verdict: FeedbackVerdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Feedback {
    pub fn new(sender: &str, verdict: FeedbackVerdict, note: Option<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            sender: sender.trim().to_lowercase(),
            verdict,
            note,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub total: u64,
    pub low: u64,
    pub medium: u64,
    pub high: u64,
    pub first_scan: Option<DateTime<Utc>>,
    pub last_scan: Option<DateTime<Utc>>,
}

fn append_json_line<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    let line = serde_json::to_string(value)?;
    writeln!(file, "{}", line)
        .with_context(|| format!("Failed to append to: {}", path.display()))?;
    Ok(())
}

/// Append-only JSON-lines log of `(timestamp, score, risk_tier)`.
pub struct ScanLog;

impl ScanLog {
    pub fn append<P: AsRef<Path>>(path: P, record: &ScanRecord) -> Result<()> {
        append_json_line(path.as_ref(), record)
    }

    /// Count scans per tier. Unreadable lines are skipped with a warning.
    pub fn summarize<P: AsRef<Path>>(path: P) -> Result<ScanSummary> {
        let path = path.as_ref();
        let mut summary = ScanSummary::default();
        if !path.exists() {
            return Ok(summary);
        }

        let file = fs::File::open(path)
            .with_context(|| format!("Failed to open scan log: {}", path.display()))?;

        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: ScanRecord = match serde_json::from_str(&line) {
                Ok(record) => record,
                Err(e) => {
                    log::warn!("Skipping scan log line {}: {}", line_no + 1, e);
                    continue;
                }
            };

            summary.total += 1;
            match record.risk_tier {
                RiskTier::Low => summary.low += 1,
                RiskTier::Medium => summary.medium += 1,
                RiskTier::High => summary.high += 1,
            }
            summary.first_scan = Some(
                summary
                    .first_scan
                    .map_or(record.timestamp, |t| t.min(record.timestamp)),
            );
            summary.last_scan = Some(
                summary
                    .last_scan
                    .map_or(record.timestamp, |t| t.max(record.timestamp)),
            );
        }

        Ok(summary)
    }
}

/// Append-only JSON-lines store of user feedback keyed by sender.
pub struct FeedbackStore;

impl FeedbackStore {
    pub fn record<P: AsRef<Path>>(path: P, feedback: &Feedback) -> Result<()> {
        log::info!(
            "Recording {:?} feedback for {}",
            feedback.verdict,
            feedback.sender
        );
        append_json_line(path.as_ref(), feedback)
    }
}
