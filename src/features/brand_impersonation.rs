use super::{Rule, RuleHit};
use crate::config::{BrandConfig, BrandImpersonationConfig};
use crate::domain_utils::DomainUtils;
use crate::email::EmailRecord;

/// Display name claims a brand the sender address does not belong to.
///
/// Independent of the look-alike check: an exact but unrelated domain
/// (`PayPal <billing@gmail.com>`) still fires.
pub struct BrandImpersonationRule {
    brands: Vec<BrandConfig>,
    deduction: u32,
}

impl BrandImpersonationRule {
    pub fn new(config: &BrandImpersonationConfig) -> Self {
        Self {
            brands: config.brands.clone(),
            deduction: config.deduction,
        }
    }

    /// Whether `sender_domain` is one of the brand's official domains
    pub fn validate_brand_sender(&self, sender_domain: &str, brand: &BrandConfig) -> bool {
        DomainUtils::matches_domain_list(sender_domain, &brand.domains)
    }
}

impl Rule for BrandImpersonationRule {
    fn id(&self) -> &str {
        "brand_impersonation"
    }

    fn evaluate(&self, email: &EmailRecord) -> Vec<RuleHit> {
        let display_name = email.display_name().to_lowercase();
        if display_name.trim().is_empty() {
            return Vec::new();
        }

        let sender_domain = DomainUtils::sender_domain(&email.sender).unwrap_or_default();

        self.brands
            .iter()
            .filter(|brand| display_name.contains(brand.token.as_str()))
            .filter(|brand| !self.validate_brand_sender(&sender_domain, brand))
            .map(|brand| {
                log::debug!(
                    "Display name '{}' claims {} but sender is {}",
                    email.display_name(),
                    brand.token,
                    email.sender
                );
                RuleHit::new(
                    self.id(),
                    self.deduction,
                    format!(
                        "Possible spoof: Claims to be {} but sender is {}",
                        brand.token, email.sender
                    ),
                    &brand.token,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeuristicConfig;

    fn rule() -> BrandImpersonationRule {
        BrandImpersonationRule::new(&HeuristicConfig::default().normalized().brand_impersonation)
    }

    fn email(display_name: &str, sender: &str) -> EmailRecord {
        EmailRecord {
            sender: sender.to_string(),
            sender_display_name: Some(display_name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_brand_with_foreign_domain() {
        let hits = rule().evaluate(&email("PayPal Support", "billing@gmail.com"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].deduction, 25);
        assert_eq!(
            hits[0].finding,
            "Possible spoof: Claims to be paypal but sender is billing@gmail.com"
        );
    }

    #[test]
    fn test_legitimate_brand_sender() {
        let r = rule();
        assert!(r.evaluate(&email("PayPal", "service@paypal.com")).is_empty());
        assert!(r.evaluate(&email("Apple", "no_reply@email.apple.com")).is_empty());
        assert!(r.evaluate(&email("Microsoft account team", "account@outlook.com")).is_empty());
    }

    #[test]
    fn test_missing_sender_with_brand_name() {
        let hits = rule().evaluate(&email("Amazon", ""));
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_multiple_brands_each_deduct() {
        let hits = rule().evaluate(&email("Apple & Google Billing", "billing@pay-now.example"));
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_no_display_name() {
        let record = EmailRecord {
            sender: "someone@paypa1.com".to_string(),
            ..Default::default()
        };
        assert!(rule().evaluate(&record).is_empty());
    }
}
