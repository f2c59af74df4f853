pub mod loader;

use serde::{Deserialize, Serialize};

/// Rule tables and weights for the scoring engine.
///
/// Every section is optional in YAML; absent sections fall back to the
/// built-in tables from `HeuristicConfig::default()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeuristicConfig {
    /// Version tag of the rule tables, echoed by `--test-config`
    pub version: String,
    /// Domains that are genuinely owned by brands users trust
    pub trusted_domains: Vec<String>,
    pub url_shorteners: Vec<String>,
    pub lookalike: LookalikeConfig,
    pub brand_impersonation: BrandImpersonationConfig,
    pub sender_patterns: Vec<SenderPatternGroup>,
    pub urgency: PhraseCategory,
    pub generic_greeting: PhraseCategory,
    pub sensitive_request: PhraseCategory,
    pub poor_grammar: PhraseCategory,
    /// Quishing, vishing and deepfake scam markers
    pub scam_markers: PhraseCategory,
    pub links: LinkDeductions,
    pub zero_width: ZeroWidthConfig,
    /// Blend weight of an auxiliary score source, 0.0..=1.0
    pub auxiliary_weight: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookalikeConfig {
    pub deduction: u32,
    /// Largest edit distance still treated as a near miss
    pub max_distance: usize,
    /// Single characters standing in for letters (`0` for `o`)
    pub confusables: Vec<Confusable>,
    /// Character runs standing in for a letter (`rn` for `m`)
    pub sequences: Vec<SequenceSubstitution>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confusable {
    pub glyph: char,
    pub letter: char,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceSubstitution {
    pub sequence: String,
    pub letter: char,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandImpersonationConfig {
    pub deduction: u32,
    pub brands: Vec<BrandConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandConfig {
    /// Token looked for in the display name
    pub token: String,
    /// Official sending domains; empty means `<token>.com`
    #[serde(default)]
    pub domains: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderPatternGroup {
    pub name: String,
    pub description: String,
    pub tokens: Vec<String>,
    pub deduction: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextField {
    Subject,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stacking {
    /// Each matching phrase deducts
    #[default]
    PerPhrase,
    /// First matching phrase deducts, the rest are ignored
    Once,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseCategory {
    /// Finding prefix, e.g. "Urgency language detected"
    pub label: String,
    pub fields: Vec<TextField>,
    pub phrases: Vec<String>,
    pub deduction: u32,
    #[serde(default)]
    pub stacking: Stacking,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDeductions {
    /// Anchor text names a trusted domain, href goes elsewhere
    pub deceptive: u32,
    pub shortened: u32,
    /// Raw IP, punycode host, `data:` or `javascript:` scheme
    pub evasive: u32,
    pub evasive_schemes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZeroWidthConfig {
    pub deduction: u32,
    /// Unicode scalar values treated as invisible
    pub code_points: Vec<u32>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn phrase_category(
    label: &str,
    fields: &[TextField],
    phrases: &[&str],
    deduction: u32,
    stacking: Stacking,
) -> PhraseCategory {
    PhraseCategory {
        label: label.to_string(),
        fields: fields.to_vec(),
        phrases: strings(phrases),
        deduction,
        stacking,
    }
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        use TextField::{Body, Subject};

        let confusables = [
            ('0', 'o'),
            ('1', 'l'),
            ('1', 'i'),
            ('!', 'i'),
            ('|', 'l'),
            ('3', 'e'),
            ('4', 'a'),
            ('@', 'a'),
            ('5', 's'),
            ('$', 's'),
            ('7', 't'),
        ]
        .into_iter()
        .map(|(glyph, letter)| Confusable { glyph, letter })
        .collect();

        let brand = |token: &str, domains: &[&str]| BrandConfig {
            token: token.to_string(),
            domains: strings(domains),
        };

        Self {
            version: "2024.1".to_string(),
            trusted_domains: strings(&[
                "paypal.com",
                "apple.com",
                "amazon.com",
                "microsoft.com",
                "google.com",
                "facebook.com",
                "netflix.com",
                "linkedin.com",
                "dropbox.com",
                "docusign.com",
                "chase.com",
                "wellsfargo.com",
                "bankofamerica.com",
            ]),
            url_shorteners: strings(&[
                "bit.ly",
                "tinyurl.com",
                "t.co",
                "goo.gl",
                "ow.ly",
                "is.gd",
                "buff.ly",
                "rebrand.ly",
                "cutt.ly",
                "shorturl.at",
                "tiny.cc",
                "rb.gy",
                "t.ly",
            ]),
            lookalike: LookalikeConfig {
                deduction: 25,
                max_distance: 2,
                confusables,
                sequences: vec![
                    SequenceSubstitution {
                        sequence: "rn".to_string(),
                        letter: 'm',
                    },
                    SequenceSubstitution {
                        sequence: "vv".to_string(),
                        letter: 'w',
                    },
                ],
            },
            brand_impersonation: BrandImpersonationConfig {
                deduction: 25,
                brands: vec![
                    brand("paypal", &[]),
                    brand("apple", &["apple.com", "icloud.com"]),
                    brand("amazon", &[]),
                    brand("microsoft", &["microsoft.com", "outlook.com"]),
                    brand("google", &[]),
                    brand("facebook", &["facebook.com", "facebookmail.com"]),
                    brand("netflix", &[]),
                ],
            },
            sender_patterns: vec![
                SenderPatternGroup {
                    name: "noreply".to_string(),
                    description: "No-reply sender address".to_string(),
                    tokens: strings(&["no-reply", "noreply"]),
                    deduction: 5,
                },
                SenderPatternGroup {
                    name: "alert_keywords".to_string(),
                    description: "Alarm keyword in sender address".to_string(),
                    tokens: strings(&["alert", "security", "verify"]),
                    deduction: 10,
                },
            ],
            urgency: phrase_category(
                "Urgency language detected",
                &[Subject, Body],
                &[
                    "urgent",
                    "immediately",
                    "act now",
                    "limited time",
                    "expires",
                    "account suspended",
                    "account will be suspended",
                    "verify now",
                    "verify immediately",
                    "confirm immediately",
                    "security alert",
                    "unusual activity",
                    "final notice",
                    "within 24 hours",
                ],
                10,
                Stacking::PerPhrase,
            ),
            generic_greeting: phrase_category(
                "Generic greeting",
                &[Body],
                &[
                    "dear customer",
                    "dear user",
                    "valued customer",
                    "dear account holder",
                    "dear member",
                    "dear client",
                ],
                8,
                Stacking::Once,
            ),
            sensitive_request: phrase_category(
                "Requests sensitive info",
                &[Body],
                &[
                    "verify your account",
                    "enter your password",
                    "confirm your password",
                    "confirm your ssn",
                    "social security number",
                    "credit card",
                    "bank account",
                    "confirm your identity",
                    "update your payment",
                ],
                15,
                Stacking::PerPhrase,
            ),
            poor_grammar: phrase_category(
                "Suspicious phrasing",
                &[Body],
                &[
                    "kindly",
                    "do the needful",
                    "dear esteemed",
                    "revert back",
                    "at your earliest convenient",
                ],
                5,
                Stacking::PerPhrase,
            ),
            scam_markers: phrase_category(
                "Scam technique marker",
                &[Subject, Body],
                &[
                    // quishing
                    "scan the qr code",
                    "scan this qr code",
                    "qr code below",
                    // vishing
                    "call this number",
                    "call our support line",
                    "voice message",
                    // deepfake / executive impersonation
                    "video call from",
                    "this is your ceo",
                    "purchase gift cards",
                ],
                10,
                Stacking::PerPhrase,
            ),
            links: LinkDeductions {
                deceptive: 20,
                shortened: 10,
                evasive: 25,
                evasive_schemes: strings(&["javascript", "data", "vbscript"]),
            },
            zero_width: ZeroWidthConfig {
                deduction: 15,
                code_points: vec![0x200B, 0x200C, 0x200D, 0xFEFF],
            },
            auxiliary_weight: 0.3,
        }
    }
}

impl HeuristicConfig {
    /// Reject tables the engine cannot score sensibly with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.trusted_domains.is_empty() {
            anyhow::bail!("trusted_domains must not be empty");
        }
        if self.lookalike.max_distance == 0 {
            anyhow::bail!("lookalike.max_distance must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.auxiliary_weight) {
            anyhow::bail!(
                "auxiliary_weight must be within 0.0..=1.0, got {}",
                self.auxiliary_weight
            );
        }

        // Evasive links outrank deceptive ones, which outrank shorteners
        let links = &self.links;
        if links.evasive < links.deceptive || links.deceptive < links.shortened {
            anyhow::bail!(
                "link deductions must satisfy evasive >= deceptive >= shortened (got {} / {} / {})",
                links.evasive,
                links.deceptive,
                links.shortened
            );
        }

        for brand in &self.brand_impersonation.brands {
            if brand.token.trim().is_empty() {
                anyhow::bail!("brand_impersonation contains an empty brand token");
            }
        }

        for group in &self.sender_patterns {
            if group.tokens.iter().any(|t| t.trim().is_empty()) {
                anyhow::bail!("sender pattern '{}' contains an empty token", group.name);
            }
        }

        for (name, category) in self.phrase_categories() {
            if category.fields.is_empty() {
                anyhow::bail!("{name}: at least one field must be inspected");
            }
            if category.phrases.iter().any(|p| p.trim().is_empty()) {
                anyhow::bail!("{name}: phrases must not be empty");
            }
        }

        Ok(())
    }

    /// Lowercased, trimmed copy of the tables, with brand domains filled in.
    pub fn normalized(&self) -> Self {
        let lower = |items: &[String]| -> Vec<String> {
            items.iter().map(|s| s.trim().to_lowercase()).collect()
        };

        let mut config = self.clone();
        config.trusted_domains = lower(&self.trusted_domains);
        config.url_shorteners = lower(&self.url_shorteners);
        config.links.evasive_schemes = lower(&self.links.evasive_schemes);

        for brand in &mut config.brand_impersonation.brands {
            brand.token = brand.token.trim().to_lowercase();
            brand.domains = if brand.domains.is_empty() {
                vec![format!("{}.com", brand.token)]
            } else {
                lower(&brand.domains)
            };
        }
        for group in &mut config.sender_patterns {
            group.tokens = lower(&group.tokens);
        }
        for category in [
            &mut config.urgency,
            &mut config.generic_greeting,
            &mut config.sensitive_request,
            &mut config.poor_grammar,
            &mut config.scam_markers,
        ] {
            category.phrases = lower(&category.phrases);
        }

        config
    }

    fn phrase_categories(&self) -> [(&'static str, &PhraseCategory); 5] {
        [
            ("urgency", &self.urgency),
            ("generic_greeting", &self.generic_greeting),
            ("sensitive_request", &self.sensitive_request),
            ("poor_grammar", &self.poor_grammar),
            ("scam_markers", &self.scam_markers),
        ]
    }
}
