use regex::Regex;
use std::sync::OnceLock;
use url::{Host, Url};

/// Kind of host a link points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostKind {
    Domain,
    Ipv4,
    Ipv6,
}

/// What we could learn about a link's `href`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    pub scheme: String,
    /// Canonical host (lowercase, no leading `www.`); `None` for `data:`, `javascript:` etc.
    pub host: Option<String>,
    pub host_kind: Option<HostKind>,
}

/// Minimal domain hierarchy utilities
pub struct DomainUtils;

impl DomainUtils {
    /// Domain part of a sender address, lowercased.
    ///
    /// Tolerates `Name <user@host>` forms. `None` when there is no `@` or nothing after it.
    pub fn sender_domain(sender: &str) -> Option<String> {
        let at_pos = sender.rfind('@')?;
        let domain = sender[at_pos + 1..]
            .trim()
            .trim_end_matches('>')
            .trim()
            .to_lowercase();
        // Fully-qualified form: `paypal.com.` is `paypal.com`
        let domain = domain.strip_suffix('.').unwrap_or(&domain).to_string();
        if domain.is_empty() {
            None
        } else {
            Some(domain)
        }
    }

    /// Check if domain matches any in list (with hierarchy support)
    pub fn matches_domain_list(domain: &str, domain_list: &[String]) -> bool {
        let domain_lower = domain.to_lowercase();

        domain_list.iter().any(|pattern| {
            let pattern_lower = pattern.to_lowercase();
            domain_lower == pattern_lower || domain_lower.ends_with(&format!(".{}", pattern_lower))
        })
    }

    /// Canonicalize domain (remove www prefix and the root dot)
    pub fn canonicalize_domain(domain: &str) -> String {
        let domain_lower = domain.to_lowercase();
        let domain_lower = domain_lower
            .strip_suffix('.')
            .unwrap_or(&domain_lower)
            .to_string();
        if let Some(stripped) = domain_lower.strip_prefix("www.") {
            stripped.to_string()
        } else {
            domain_lower
        }
    }

    /// First domain-shaped token (`something.com`) in free text such as link anchor text.
    pub fn extract_domain_token(text: &str) -> Option<String> {
        Self::domain_tokens(text).next()
    }

    /// Every domain-shaped token in `text`, lowercased, in order of appearance.
    ///
    /// A token must end at a word boundary, so `example.community` yields nothing.
    pub fn domain_tokens(text: &str) -> impl Iterator<Item = String> + '_ {
        static TOKEN: OnceLock<Regex> = OnceLock::new();
        let regex = TOKEN.get_or_init(|| {
            Regex::new(r"(?i)[\w-]+\.com\b").expect("domain token pattern is valid")
        });
        regex.find_iter(text).map(|m| m.as_str().to_lowercase())
    }

    /// Parse an `href`. Relative or otherwise unparseable URLs yield `None`.
    pub fn parse_link_target(href: &str) -> Option<LinkTarget> {
        let parsed = Url::parse(href.trim()).ok()?;

        let (host, host_kind) = match parsed.host() {
            Some(Host::Domain(domain)) => (
                Some(Self::canonicalize_domain(domain)),
                Some(HostKind::Domain),
            ),
            Some(Host::Ipv4(addr)) => (Some(addr.to_string()), Some(HostKind::Ipv4)),
            Some(Host::Ipv6(addr)) => (Some(addr.to_string()), Some(HostKind::Ipv6)),
            None => (None, None),
        };

        Some(LinkTarget {
            scheme: parsed.scheme().to_string(),
            host,
            host_kind,
        })
    }

    /// Any label of the host is IDNA-encoded
    pub fn is_punycode_host(host: &str) -> bool {
        host.split('.')
            .any(|label| label.to_lowercase().starts_with("xn--"))
    }

    /// Leading label of a domain: `paypal` for `paypal.com`
    pub fn brand_label(domain: &str) -> &str {
        domain.split('.').next().unwrap_or(domain)
    }
}
