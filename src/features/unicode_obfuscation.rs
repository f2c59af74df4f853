use super::{Rule, RuleHit};
use crate::config::ZeroWidthConfig;
use crate::email::EmailRecord;

/// Invisible characters used to split keywords past filters.
pub struct ZeroWidthRule {
    code_points: Vec<u32>,
    deduction: u32,
}

impl ZeroWidthRule {
    pub fn new(config: &ZeroWidthConfig) -> Self {
        Self {
            code_points: config.code_points.clone(),
            deduction: config.deduction,
        }
    }

    fn count_invisible(&self, text: &str) -> usize {
        text.chars()
            .filter(|ch| self.code_points.contains(&(*ch as u32)))
            .count()
    }
}

impl Rule for ZeroWidthRule {
    fn id(&self) -> &str {
        "zero_width_characters"
    }

    fn evaluate(&self, email: &EmailRecord) -> Vec<RuleHit> {
        let count = self.count_invisible(&email.subject) + self.count_invisible(&email.body);
        if count == 0 {
            return Vec::new();
        }

        vec![RuleHit::new(
            self.id(),
            self.deduction,
            format!("Hidden zero-width characters detected: {} in subject/body", count),
            "subject+body",
        )]
    }
}
