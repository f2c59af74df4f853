use super::{Rule, RuleHit};
use crate::domain_utils::{DomainUtils, HostKind, LinkTarget};
use crate::email::{EmailRecord, LinkRecord};

/// Links with a parseable href, paired with what we learned about the target.
///
/// Links without an href, or with one that does not parse as an absolute
/// URL, are dropped here so every host-based rule skips them alike.
fn parsed_links<'a>(
    email: &'a EmailRecord,
) -> impl Iterator<Item = (&'a LinkRecord, &'a str, LinkTarget)> + 'a {
    email.links.iter().filter_map(|link| {
        let href = link.href.as_deref()?;
        let target = DomainUtils::parse_link_target(href)?;
        Some((link, href, target))
    })
}

/// Anchor text names a trusted domain but the href goes somewhere else.
pub struct DeceptiveLinkRule {
    trusted_domains: Vec<String>,
    deduction: u32,
}

impl DeceptiveLinkRule {
    pub fn new(trusted_domains: &[String], deduction: u32) -> Self {
        Self {
            trusted_domains: trusted_domains.to_vec(),
            deduction,
        }
    }

    /// First trusted domain named in the text. Untrusted tokens before it are skipped.
    fn claimed_domain(&self, text: &str) -> Option<String> {
        DomainUtils::domain_tokens(text)
            .find(|token| self.trusted_domains.iter().any(|d| d == token))
    }
}

impl Rule for DeceptiveLinkRule {
    fn id(&self) -> &str {
        "deceptive_link"
    }

    fn evaluate(&self, email: &EmailRecord) -> Vec<RuleHit> {
        let mut hits = Vec::new();

        for (link, href, target) in parsed_links(email) {
            let Some(text) = link.text.as_deref() else {
                continue;
            };
            let Some(claimed) = self.claimed_domain(text) else {
                continue;
            };
            let Some(host) = target.host.as_deref() else {
                continue;
            };

            if DomainUtils::matches_domain_list(host, std::slice::from_ref(&claimed)) {
                continue;
            }

            log::debug!("Link text claims {} but href host is {}", claimed, host);
            hits.push(RuleHit::new(
                self.id(),
                self.deduction,
                format!("Link disguised: Shows \"{}\" but goes to \"{}\"", text, host),
                href,
            ));
        }

        hits
    }
}

/// Link hidden behind a URL shortener.
pub struct ShortenedUrlRule {
    shorteners: Vec<String>,
    deduction: u32,
}

impl ShortenedUrlRule {
    pub fn new(shorteners: &[String], deduction: u32) -> Self {
        Self {
            shorteners: shorteners.to_vec(),
            deduction,
        }
    }

    pub fn is_shortener(&self, host: &str) -> bool {
        DomainUtils::matches_domain_list(host, &self.shorteners)
    }
}

impl Rule for ShortenedUrlRule {
    fn id(&self) -> &str {
        "shortened_url"
    }

    fn evaluate(&self, email: &EmailRecord) -> Vec<RuleHit> {
        parsed_links(email)
            .filter_map(|(_, href, target)| {
                let host = target.host?;
                if !self.is_shortener(&host) {
                    return None;
                }
                Some(RuleHit::new(
                    self.id(),
                    self.deduction,
                    format!("Shortened URL hides real destination: {}", href),
                    href,
                ))
            })
            .collect()
    }
}

/// Links built to dodge inspection: script/data schemes, raw IPs, punycode hosts.
///
/// At most one finding per link, the first signal in that order.
pub struct EvasiveLinkRule {
    schemes: Vec<String>,
    deduction: u32,
}

impl EvasiveLinkRule {
    pub fn new(schemes: &[String], deduction: u32) -> Self {
        Self {
            schemes: schemes.to_vec(),
            deduction,
        }
    }

    /// Browsers ignore embedded whitespace in a scheme, `java\tscript:` included.
    fn dangerous_scheme(&self, href: &str) -> Option<&str> {
        let compact: String = href
            .chars()
            .filter(|c| !c.is_whitespace() && !c.is_control())
            .collect::<String>()
            .to_lowercase();

        self.schemes
            .iter()
            .find(|scheme| {
                compact
                    .strip_prefix(scheme.as_str())
                    .is_some_and(|rest| rest.starts_with(':'))
            })
            .map(|s| s.as_str())
    }

    fn evasion(&self, href: &str) -> Option<String> {
        let target = DomainUtils::parse_link_target(href);
        let scheme = target
            .as_ref()
            .map(|t| t.scheme.as_str())
            .filter(|scheme| self.schemes.iter().any(|s| s.as_str() == *scheme))
            .or_else(|| self.dangerous_scheme(href));
        if let Some(scheme) = scheme {
            return Some(format!("Dangerous link: uses {}: scheme", scheme));
        }

        let target = target?;
        let host = target.host?;
        match target.host_kind {
            Some(HostKind::Ipv4) | Some(HostKind::Ipv6) => {
                Some(format!("Dangerous link: points to raw IP address {}", host))
            }
            Some(HostKind::Domain) if DomainUtils::is_punycode_host(&host) => {
                Some(format!("Dangerous link: punycode domain {}", host))
            }
            _ => None,
        }
    }
}

impl Rule for EvasiveLinkRule {
    fn id(&self) -> &str {
        "evasive_link"
    }

    fn evaluate(&self, email: &EmailRecord) -> Vec<RuleHit> {
        email
            .links
            .iter()
            .filter_map(|link| {
                let href = link.href.as_deref()?;
                let finding = self.evasion(href)?;
                Some(RuleHit::new(self.id(), self.deduction, finding, href))
            })
            .collect()
    }
}
