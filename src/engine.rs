use crate::config::HeuristicConfig;
use crate::email::EmailRecord;
use crate::features::{build_rules, Rule, RuleHit};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

const MAX_SCORE: u32 = 100;

/// Coarse risk bucket. Thresholds are a contract with the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// HIGH below 30, MEDIUM below 70, LOW otherwise.
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s < 30 => RiskTier::High,
            s if s < 70 => RiskTier::Medium,
            _ => RiskTier::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Verdict for one message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// 0..=100, 100 meaning no risk signals
    pub score: u8,
    pub risk_tier: RiskTier,
    /// Findings in the order the rules fired
    pub issues: Vec<String>,
    pub breakdown: Vec<RuleHit>,
    /// Rule-only score before any auxiliary blending
    pub heuristic_score: u8,
}

/// Optional extra score source (e.g. a classifier) blended into the verdict.
///
/// Returns a trust score on the same 0..=100 scale, or `None` to abstain.
pub trait AuxiliarySignal: Send + Sync {
    fn name(&self) -> &str;
    fn score(&self, email: &EmailRecord) -> Option<u8>;
}

/// Deterministic rule evaluator.
///
/// Holds only immutable tables, so one engine can score records from many
/// threads at once.
pub struct ScoringEngine {
    config: HeuristicConfig,
    rules: Vec<Box<dyn Rule>>,
    auxiliary: Option<Box<dyn AuxiliarySignal>>,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        let config = HeuristicConfig::default().normalized();
        Self {
            rules: build_rules(&config),
            config,
            auxiliary: None,
        }
    }
}

impl ScoringEngine {
    pub fn new(config: HeuristicConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let config = config.normalized();

        log::debug!(
            "Scoring engine initialized with heuristics {} ({} trusted domains)",
            config.version,
            config.trusted_domains.len()
        );

        Ok(Self {
            rules: build_rules(&config),
            config,
            auxiliary: None,
        })
    }

    pub fn with_auxiliary(mut self, signal: Box<dyn AuxiliarySignal>) -> Self {
        log::info!(
            "Blending auxiliary signal '{}' at weight {}",
            signal.name(),
            self.config.auxiliary_weight
        );
        self.auxiliary = Some(signal);
        self
    }

    pub fn config(&self) -> &HeuristicConfig {
        &self.config
    }

    pub fn rule_ids(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    pub fn score(&self, email: &EmailRecord) -> ScoreResult {
        let mut seen = HashSet::new();
        let mut breakdown = Vec::new();
        let mut total_deduction: u32 = 0;

        for rule in &self.rules {
            for hit in rule.evaluate(email) {
                if !seen.insert((hit.rule.clone(), hit.key.clone())) {
                    log::trace!("Skipping repeated {} hit on {}", hit.rule, hit.key);
                    continue;
                }
                log::debug!("{} -{}: {}", hit.rule, hit.deduction, hit.finding);
                total_deduction = total_deduction.saturating_add(hit.deduction);
                breakdown.push(hit);
            }
        }

        let heuristic_score = MAX_SCORE.saturating_sub(total_deduction) as u8;
        let score = self.blend(email, heuristic_score);

        ScoreResult {
            score,
            risk_tier: RiskTier::from_score(score),
            issues: breakdown.iter().map(|h| h.finding.clone()).collect(),
            breakdown,
            heuristic_score,
        }
    }

    fn blend(&self, email: &EmailRecord, heuristic_score: u8) -> u8 {
        let Some(signal) = &self.auxiliary else {
            return heuristic_score;
        };
        let Some(aux) = signal.score(email) else {
            log::debug!("Auxiliary signal '{}' abstained", signal.name());
            return heuristic_score;
        };

        let weight = self.config.auxiliary_weight;
        let aux = aux.min(MAX_SCORE as u8);
        let blended = (1.0 - weight) * f32::from(heuristic_score) + weight * f32::from(aux);
        blended.round().clamp(0.0, MAX_SCORE as f32) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::LinkRecord;

    fn clean_baseline() -> EmailRecord {
        EmailRecord {
            subject: String::new(),
            sender: "user@trusted.com".to_string(),
            body: String::new(),
            links: vec![],
            ..Default::default()
        }
    }

    fn phishing_scenario() -> EmailRecord {
        EmailRecord {
            subject: "Account Suspended - Verify Now".to_string(),
            sender: "support@paypa1-security.net".to_string(),
            sender_display_name: Some("PayPal".to_string()),
            body: "Dear Customer, your account will be suspended. Kindly verify your account immediately.".to_string(),
            links: vec![LinkRecord::new("paypal.com", "http://bit.ly/x1")],
            ..Default::default()
        }
    }

    fn kitchen_sink() -> EmailRecord {
        EmailRecord {
            subject: "URGENT: security alert, act now\u{200B}".to_string(),
            sender: "noreply-security@micros0ft-alerts.com".to_string(),
            sender_display_name: Some("Microsoft Apple Amazon PayPal".to_string()),
            body: "Dear customer, kindly do the needful. Verify your account, enter your password, \
                   confirm your ssn and credit card and bank account. Scan the QR code or call this number. \
                   Final notice, expires within 24 hours."
                .to_string(),
            links: vec![
                LinkRecord::new("paypal.com", "http://1.2.3.4/login"),
                LinkRecord::new("amazon.com", "https://bit.ly/zz"),
                LinkRecord::new("apple.com", "https://xn--80ak6aa92e.com/"),
                LinkRecord::new("Pay", "javascript:steal()"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_baseline_scores_100() {
        let result = ScoringEngine::default().score(&clean_baseline());
        assert_eq!(result.score, 100);
        assert!(result.issues.is_empty());
        assert_eq!(result.risk_tier, RiskTier::Low);
    }

    #[test]
    fn test_empty_record_scores_100() {
        let result = ScoringEngine::default().score(&EmailRecord::default());
        assert_eq!(result.score, 100);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_end_to_end_phishing_scenario() {
        let result = ScoringEngine::default().score(&phishing_scenario());

        assert!(result.score <= 10, "score was {}", result.score);
        assert_eq!(result.risk_tier, RiskTier::High);
        assert!(result.issues.len() >= 6, "issues: {:?}", result.issues);

        let fired: HashSet<&str> = result.breakdown.iter().map(|h| h.rule.as_str()).collect();
        for rule in [
            "urgency_language",
            "generic_greeting",
            "sensitive_request",
            "lookalike_domain",
            "brand_impersonation",
            "shortened_url",
        ] {
            assert!(fired.contains(rule), "{rule} did not fire: {:?}", result.issues);
        }
        let urgency = result
            .breakdown
            .iter()
            .filter(|h| h.rule == "urgency_language")
            .count();
        assert!(urgency >= 2);
        assert!(result
            .issues
            .contains(&"Requests sensitive info: \"verify your account\"".to_string()));
    }

    #[test]
    fn test_deterministic() {
        let engine = ScoringEngine::default();
        let email = phishing_scenario();
        assert_eq!(engine.score(&email), engine.score(&email));
    }

    #[test]
    fn test_clamps_at_zero() {
        let result = ScoringEngine::default().score(&kitchen_sink());
        assert_eq!(result.score, 0);
        assert_eq!(result.heuristic_score, 0);
        assert_eq!(result.risk_tier, RiskTier::High);

        let total: u32 = result.breakdown.iter().map(|h| h.deduction).sum();
        assert!(total > 100);
    }

    #[test]
    fn test_one_extra_phrase_deducts_exactly_once() {
        let engine = ScoringEngine::default();
        let base = EmailRecord {
            sender: "user@trusted.com".to_string(),
            body: "Please verify your account.".to_string(),
            ..Default::default()
        };
        let extra = EmailRecord {
            body: "Please verify your account and your credit card.".to_string(),
            ..base.clone()
        };

        let before = engine.score(&base);
        let after = engine.score(&extra);
        assert_eq!(before.score - after.score, 15);
        assert_eq!(after.issues.len(), before.issues.len() + 1);
    }

    #[test]
    fn test_extra_urgency_phrase_deducts_exactly_once() {
        let engine = ScoringEngine::default();
        let base = EmailRecord {
            sender: "user@trusted.com".to_string(),
            body: "Your statement is ready.".to_string(),
            ..Default::default()
        };
        let extra = EmailRecord {
            body: "Your statement is ready. Please verify immediately.".to_string(),
            ..base.clone()
        };

        let before = engine.score(&base);
        let after = engine.score(&extra);
        assert_eq!(before.score - after.score, 10);
        assert_eq!(after.issues.len(), before.issues.len() + 1);
        assert_eq!(
            after.issues.last().map(String::as_str),
            Some("Urgency language detected: \"verify immediately\"")
        );
    }

    #[test]
    fn test_trailing_dot_trusted_sender_is_clean() {
        let email = EmailRecord {
            sender: "service@paypal.com.".to_string(),
            sender_display_name: Some("PayPal".to_string()),
            links: vec![LinkRecord::new("paypal.com", "https://paypal.com./login")],
            ..Default::default()
        };
        let result = ScoringEngine::default().score(&email);
        assert_eq!(result.score, 100, "issues: {:?}", result.issues);
    }

    #[test]
    fn test_decoy_domain_in_link_text_does_not_hide_mismatch() {
        let email = EmailRecord {
            links: vec![LinkRecord::new(
                "From shop.com: log in at paypal.com",
                "http://evil-domain.ru/x",
            )],
            ..Default::default()
        };
        let result = ScoringEngine::default().score(&email);
        assert_eq!(result.score, 80);
        assert_eq!(result.breakdown[0].rule, "deceptive_link");
    }

    #[test]
    fn test_identical_evasive_links_deduct_once() {
        let engine = ScoringEngine::default();
        let link = LinkRecord::new("Open", "vbscript:msgbox(1)");
        let email = EmailRecord {
            links: vec![link.clone(), link],
            ..Default::default()
        };
        let result = engine.score(&email);
        assert_eq!(result.score, 75);
        assert_eq!(result.issues, vec!["Dangerous link: uses vbscript: scheme"]);
    }

    #[test]
    fn test_identical_links_deduct_once() {
        let engine = ScoringEngine::default();
        let link = LinkRecord::new("here", "http://bit.ly/same");
        let email = EmailRecord {
            links: vec![link.clone(), link],
            ..Default::default()
        };
        let result = engine.score(&email);
        assert_eq!(result.score, 90);
        assert_eq!(result.issues.len(), 1);
    }

    #[test]
    fn test_distinct_links_each_deduct() {
        let engine = ScoringEngine::default();
        let email = EmailRecord {
            links: vec![
                LinkRecord::new("a", "http://bit.ly/one"),
                LinkRecord::new("b", "http://bit.ly/two"),
            ],
            ..Default::default()
        };
        assert_eq!(engine.score(&email).score, 80);
    }

    #[test]
    fn test_malformed_link_does_not_affect_others() {
        let engine = ScoringEngine::default();
        let email = EmailRecord {
            links: vec![
                LinkRecord {
                    text: Some("paypal.com".to_string()),
                    href: Some("::::".to_string()),
                },
                LinkRecord {
                    text: None,
                    href: None,
                },
                LinkRecord::new("paypal.com", "http://evil-domain.ru/x"),
            ],
            ..Default::default()
        };
        let result = engine.score(&email);
        assert_eq!(result.score, 80);
        assert_eq!(result.breakdown[0].rule, "deceptive_link");
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(RiskTier::from_score(0), RiskTier::High);
        assert_eq!(RiskTier::from_score(29), RiskTier::High);
        assert_eq!(RiskTier::from_score(30), RiskTier::Medium);
        assert_eq!(RiskTier::from_score(69), RiskTier::Medium);
        assert_eq!(RiskTier::from_score(70), RiskTier::Low);
        assert_eq!(RiskTier::from_score(100), RiskTier::Low);
        assert_eq!(RiskTier::High.to_string(), "HIGH");
    }

    #[test]
    fn test_findings_follow_rule_order() {
        let result = ScoringEngine::default().score(&phishing_scenario());
        let engine = ScoringEngine::default();
        let order = engine.rule_ids();
        let positions: Vec<usize> = result
            .breakdown
            .iter()
            .map(|h| order.iter().position(|id| *id == h.rule).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_fixture_config_is_injected() {
        let mut config = HeuristicConfig::default();
        config.urgency.phrases = vec!["Tick Tock".to_string()];
        let engine = ScoringEngine::new(config).unwrap();

        let email = EmailRecord {
            subject: "tick tock, urgent".to_string(),
            ..Default::default()
        };
        let result = engine.score(&email);
        assert_eq!(result.issues, vec!["Urgency language detected: \"tick tock\""]);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = HeuristicConfig::default();
        config.lookalike.max_distance = 0;
        assert!(ScoringEngine::new(config).is_err());
    }

    struct FixedSignal(Option<u8>);

    impl AuxiliarySignal for FixedSignal {
        fn name(&self) -> &str {
            "fixed"
        }

        fn score(&self, _email: &EmailRecord) -> Option<u8> {
            self.0
        }
    }

    #[test]
    fn test_auxiliary_signal_is_blended() {
        let engine = ScoringEngine::default().with_auxiliary(Box::new(FixedSignal(Some(0))));
        let result = engine.score(&clean_baseline());
        assert_eq!(result.heuristic_score, 100);
        assert_eq!(result.score, 70);
        assert_eq!(result.risk_tier, RiskTier::Low);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_abstaining_auxiliary_signal() {
        let engine = ScoringEngine::default().with_auxiliary(Box::new(FixedSignal(None)));
        assert_eq!(engine.score(&clean_baseline()).score, 100);
    }

    #[test]
    fn test_engine_is_shareable_across_threads() {
        let engine = std::sync::Arc::new(ScoringEngine::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = engine.clone();
                std::thread::spawn(move || engine.score(&phishing_scenario()).score)
            })
            .collect();
        let scores: Vec<u8> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(scores.windows(2).all(|w| w[0] == w[1]));
    }
}
