use super::{Rule, RuleHit};
use crate::config::LookalikeConfig;
use crate::domain_utils::DomainUtils;
use crate::edit_distance;
use crate::email::EmailRecord;

/// Typosquatting check on the sender domain.
///
/// Two independent signals, reported once per email against the first
/// trusted domain they implicate:
/// - the domain is within `max_distance` edits of a trusted domain
/// - the domain, read with confusable glyphs swapped back (`0` as `o`,
///   `rn` as `m`), spells a trusted brand label the raw domain does not
pub struct LookalikeDomainRule {
    trusted_domains: Vec<String>,
    config: LookalikeConfig,
}

impl LookalikeDomainRule {
    pub fn new(trusted_domains: &[String], config: &LookalikeConfig) -> Self {
        Self {
            trusted_domains: trusted_domains.to_vec(),
            config: config.clone(),
        }
    }

    /// Trusted domain that `domain` imitates, if any.
    pub fn imitated_domain(&self, domain: &str) -> Option<&str> {
        if DomainUtils::matches_domain_list(domain, &self.trusted_domains) {
            return None;
        }

        if let Some(near) = self
            .trusted_domains
            .iter()
            .find(|trusted| edit_distance::within(domain, trusted, self.config.max_distance))
        {
            return Some(near.as_str());
        }

        let folded = self.fold_sequences(domain);
        self.trusted_domains
            .iter()
            .find(|trusted| {
                let label = DomainUtils::brand_label(trusted);
                !domain.contains(label) && self.contains_confusable(&folded, label)
            })
            .map(|s| s.as_str())
    }

    fn fold_sequences(&self, domain: &str) -> String {
        let mut folded = domain.to_string();
        for substitution in &self.config.sequences {
            folded = folded.replace(&substitution.sequence, &substitution.letter.to_string());
        }
        folded
    }

    fn chars_match(&self, seen: char, expected: char) -> bool {
        seen == expected
            || self
                .config
                .confusables
                .iter()
                .any(|c| c.glyph == seen && c.letter == expected)
    }

    /// Whether some window of `haystack` spells `label` modulo confusable glyphs.
    fn contains_confusable(&self, haystack: &str, label: &str) -> bool {
        let hay: Vec<char> = haystack.chars().collect();
        let needle: Vec<char> = label.chars().collect();
        if needle.is_empty() || needle.len() > hay.len() {
            return false;
        }

        hay.windows(needle.len()).any(|window| {
            window
                .iter()
                .zip(&needle)
                .all(|(&seen, &expected)| self.chars_match(seen, expected))
        })
    }
}

impl Rule for LookalikeDomainRule {
    fn id(&self) -> &str {
        "lookalike_domain"
    }

    fn evaluate(&self, email: &EmailRecord) -> Vec<RuleHit> {
        let Some(domain) = DomainUtils::sender_domain(&email.sender) else {
            return Vec::new();
        };

        match self.imitated_domain(&domain) {
            Some(trusted) => {
                log::debug!("Sender domain {} imitates {}", domain, trusted);
                vec![RuleHit::new(
                    self.id(),
                    self.config.deduction,
                    format!("Lookalike domain detected: {} mimics {}", domain, trusted),
                    &domain,
                )]
            }
            None => Vec::new(),
        }
    }
}
