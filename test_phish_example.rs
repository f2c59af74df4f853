#![allow(clippy::uninlined_format_args)]

use phishguard::{EmailRecord, HeuristicConfig, LinkRecord, RiskTier, ScoringEngine};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("Testing the PayPal suspension phish against the built-in heuristics...");

    // Restrict the tables to what this sample needs, to show fixture injection
    let config_yaml = r#"
version: "sample"
trusted_domains:
  - paypal.com
brand_impersonation:
  deduction: 25
  brands:
    - token: paypal
"#;

    let config: HeuristicConfig = serde_yaml::from_str(config_yaml)?;
    let engines = [
        ("built-in", ScoringEngine::default()),
        ("sample", ScoringEngine::new(config)?),
    ];

    let email = EmailRecord {
        id: Some("<sample-0001@paypa1-security.net>".to_string()),
        subject: "Account Suspended - Verify Now".to_string(),
        sender: "support@paypa1-security.net".to_string(),
        sender_display_name: Some("PayPal".to_string()),
        body: "Dear Customer, your account will be suspended. \
               Kindly verify your account immediately."
            .to_string(),
        links: vec![LinkRecord::new("paypal.com", "http://bit.ly/x1")],
        ..Default::default()
    };

    for (name, engine) in &engines {
        let result = engine.score(&email);

        println!();
        println!("Heuristics: {}", name);
        println!("  Score: {}/100", result.score);
        println!("  Risk tier: {}", result.risk_tier);
        for issue in &result.issues {
            println!("  - {}", issue);
        }

        if result.risk_tier == RiskTier::High {
            println!("SUCCESS: flagged as high risk");
        } else {
            println!("FAILURE: expected HIGH, got {}", result.risk_tier);
        }
    }

    Ok(())
}
