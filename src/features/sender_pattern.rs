use super::{Rule, RuleHit};
use crate::config::SenderPatternGroup;
use crate::email::EmailRecord;

/// Flags sender addresses built from alarm or no-reply tokens.
///
/// Each group deducts at most once, naming the first token it found.
pub struct SenderPatternRule {
    groups: Vec<SenderPatternGroup>,
}

impl SenderPatternRule {
    pub fn new(groups: &[SenderPatternGroup]) -> Self {
        Self {
            groups: groups.to_vec(),
        }
    }
}

impl Rule for SenderPatternRule {
    fn id(&self) -> &str {
        "sender_pattern"
    }

    fn evaluate(&self, email: &EmailRecord) -> Vec<RuleHit> {
        let sender = email.sender.trim().to_lowercase();
        if sender.is_empty() {
            return Vec::new();
        }

        self.groups
            .iter()
            .filter_map(|group| {
                let token = group.tokens.iter().find(|t| sender.contains(t.as_str()))?;
                log::trace!("Sender {} matched pattern group {}", sender, group.name);
                Some(RuleHit::new(
                    self.id(),
                    group.deduction,
                    format!(
                        "{}: {} contains \"{}\"",
                        group.description, email.sender, token
                    ),
                    &group.name,
                ))
            })
            .collect()
    }
}
