pub mod brand_impersonation;
pub mod link_analyzer;
pub mod lookalike_domain;
pub mod phrase_rules;
pub mod sender_pattern;
pub mod unicode_obfuscation;

use crate::config::HeuristicConfig;
use crate::email::EmailRecord;
use serde::{Deserialize, Serialize};

/// One triggered rule instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleHit {
    /// Stable identifier of the rule that fired
    pub rule: String,
    pub deduction: u32,
    /// Human-readable explanation shown to the user
    pub finding: String,
    /// Field value that triggered the hit; (rule, key) is deducted at most once
    #[serde(skip)]
    pub key: String,
}

impl RuleHit {
    pub fn new(rule: &str, deduction: u32, finding: String, key: &str) -> Self {
        Self {
            rule: rule.to_string(),
            deduction,
            finding,
            key: key.to_string(),
        }
    }
}

/// A single detection rule. Rules never see each other's output.
pub trait Rule: Send + Sync {
    fn id(&self) -> &str;
    fn evaluate(&self, email: &EmailRecord) -> Vec<RuleHit>;
}

/// Build the rule battery in evaluation order.
///
/// The order decides the order of findings only; deductions are summed.
pub fn build_rules(config: &HeuristicConfig) -> Vec<Box<dyn Rule>> {
    use link_analyzer::{DeceptiveLinkRule, EvasiveLinkRule, ShortenedUrlRule};
    use phrase_rules::PhraseRule;

    vec![
        Box::new(PhraseRule::new("urgency_language", &config.urgency)),
        Box::new(sender_pattern::SenderPatternRule::new(&config.sender_patterns)),
        Box::new(lookalike_domain::LookalikeDomainRule::new(
            &config.trusted_domains,
            &config.lookalike,
        )),
        Box::new(brand_impersonation::BrandImpersonationRule::new(
            &config.brand_impersonation,
        )),
        Box::new(PhraseRule::new("generic_greeting", &config.generic_greeting)),
        Box::new(PhraseRule::new("sensitive_request", &config.sensitive_request)),
        Box::new(DeceptiveLinkRule::new(
            &config.trusted_domains,
            config.links.deceptive,
        )),
        Box::new(ShortenedUrlRule::new(
            &config.url_shorteners,
            config.links.shortened,
        )),
        Box::new(EvasiveLinkRule::new(
            &config.links.evasive_schemes,
            config.links.evasive,
        )),
        Box::new(PhraseRule::new("poor_grammar", &config.poor_grammar)),
        Box::new(unicode_obfuscation::ZeroWidthRule::new(&config.zero_width)),
        Box::new(PhraseRule::new("scam_technique_markers", &config.scam_markers)),
    ]
}
