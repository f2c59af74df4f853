use clap::{Arg, ArgAction, Command};
use log::LevelFilter;
use phishguard::config::loader;
use phishguard::statistics::{Feedback, FeedbackVerdict};
use phishguard::{
    EmailRecord, FeedbackStore, HeuristicConfig, RiskTier, ScanLog, ScanRecord, ScanTracker,
    ScoreResult, ScoringEngine,
};
use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::process;

fn main() {
    let matches = Command::new("phishguard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Heuristic phishing risk scoring for email messages")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Heuristics configuration file (YAML)")
                .default_value("/etc/phishguard/heuristics.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Write the built-in heuristics to FILE and exit")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Validate the heuristics configuration and list active rules")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("test-email")
                .long("test-email")
                .value_name("FILE")
                .help("Score one email record (JSON); '-' reads stdin")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("batch")
                .long("batch")
                .value_name("FILE")
                .help("Score email records from a JSON-lines file, once per message id")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print verdicts as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("scan-log")
                .long("scan-log")
                .value_name("FILE")
                .help("Append (timestamp, score, tier) of every verdict to FILE")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .help("Summarize the scan log given with --scan-log")
                .requires("scan-log")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("report")
                .long("report")
                .value_name("SENDER")
                .help("Record user feedback about SENDER")
                .requires_all(["verdict", "feedback-log"])
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("verdict")
                .long("verdict")
                .value_name("VERDICT")
                .help("Feedback verdict: phishing or legitimate")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("note")
                .long("note")
                .value_name("TEXT")
                .help("Free-text note stored with the feedback")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("feedback-log")
                .long("feedback-log")
                .value_name("FILE")
                .help("Feedback store (JSON lines)")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log every rule hit")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let scan_log = matches.get_one::<String>("scan-log");

    if matches.get_flag("stats") {
        if let Some(path) = scan_log {
            show_stats(path);
        }
        return;
    }

    if let Some(sender) = matches.get_one::<String>("report") {
        let verdict = matches.get_one::<String>("verdict").map(String::as_str);
        let store = matches.get_one::<String>("feedback-log").map(String::as_str);
        if let (Some(verdict), Some(store)) = (verdict, store) {
            let note = matches.get_one::<String>("note").cloned();
            report_feedback(store, sender, verdict, note);
        }
        return;
    }

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("/etc/phishguard/heuristics.yaml");

    let config = match loader::load_config_if_present(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e:#}");
            process::exit(1);
        }
    };

    let engine = match ScoringEngine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Invalid configuration: {e:#}");
            process::exit(1);
        }
    };

    if matches.get_flag("test-config") {
        print_config_summary(&engine);
        return;
    }

    let json = matches.get_flag("json");

    let outcome = if let Some(batch_file) = matches.get_one::<String>("batch") {
        run_batch(&engine, batch_file, json, scan_log)
    } else {
        let source = matches
            .get_one::<String>("test-email")
            .map(String::as_str)
            .unwrap_or("-");
        test_email_file(&engine, source, json, scan_log)
    };

    if let Err(e) = outcome {
        eprintln!("❌ {e:#}");
        process::exit(1);
    }
}

fn generate_default_config(path: &str) {
    match loader::write_config(path, &HeuristicConfig::default()) {
        Ok(()) => {
            println!("Default heuristics written to: {path}");
            println!("Edit the keyword tables and weights to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e:#}");
            process::exit(1);
        }
    }
}

fn print_config_summary(engine: &ScoringEngine) {
    let config = engine.config();
    println!("🔍 Heuristics version {}", config.version);
    println!("  Trusted domains: {}", config.trusted_domains.len());
    println!("  URL shorteners: {}", config.url_shorteners.len());
    println!("  Brands watched: {}", config.brand_impersonation.brands.len());
    println!(
        "  Look-alike edit distance: <= {}",
        config.lookalike.max_distance
    );
    println!();
    println!("Rules (evaluation order):");
    for (i, id) in engine.rule_ids().iter().enumerate() {
        println!("  {:>2}. {}", i + 1, id);
    }
    println!("✅ Configuration valid");
}

fn read_source(source: &str) -> anyhow::Result<String> {
    use anyhow::Context;

    if source == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read email record from stdin")?;
        Ok(buffer)
    } else {
        fs::read_to_string(source).with_context(|| format!("Failed to read email file: {source}"))
    }
}

fn test_email_file(
    engine: &ScoringEngine,
    source: &str,
    json: bool,
    scan_log: Option<&String>,
) -> anyhow::Result<()> {
    use anyhow::Context;

    let content = read_source(source)?;
    let email: EmailRecord = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse email record: {source}"))?;
    let email = email.with_html_links();

    let result = engine.score(&email);
    log::info!(
        "Scored message from {}: {} ({})",
        email.sender,
        result.score,
        result.risk_tier
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_verdict(&email, &result);
    }

    if let Some(path) = scan_log {
        ScanLog::append(path, &ScanRecord::from_result(&result))?;
    }
    Ok(())
}

fn run_batch(
    engine: &ScoringEngine,
    batch_file: &str,
    json: bool,
    scan_log: Option<&String>,
) -> anyhow::Result<()> {
    use anyhow::Context;

    let file = fs::File::open(batch_file)
        .with_context(|| format!("Failed to open batch file: {batch_file}"))?;

    let mut tracker = ScanTracker::new();
    let mut scored = 0usize;
    let mut skipped = 0usize;

    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let email: EmailRecord = match serde_json::from_str(&line) {
            Ok(email) => email,
            Err(e) => {
                log::warn!("Skipping line {} of {}: {}", line_no + 1, batch_file, e);
                skipped += 1;
                continue;
            }
        };

        if !tracker.first_sighting(email.id.as_deref()) {
            log::debug!("Already scored message {:?}, skipping", email.id);
            skipped += 1;
            continue;
        }

        let email = email.with_html_links();
        let result = engine.score(&email);
        scored += 1;

        if json {
            let line = serde_json::json!({ "id": email.id, "result": result });
            println!("{}", line);
        } else {
            println!(
                "{:<24} {:>3}/100 {:<6} {}",
                truncate_string(email.id.as_deref().unwrap_or("-"), 24),
                result.score,
                result.risk_tier,
                truncate_string(&email.subject, 40)
            );
        }

        if let Some(path) = scan_log {
            ScanLog::append(path, &ScanRecord::from_result(&result))?;
        }
    }

    log::info!("Batch complete: {scored} scored, {skipped} skipped");
    Ok(())
}

fn print_verdict(email: &EmailRecord, result: &ScoreResult) {
    let icon = match result.risk_tier {
        RiskTier::Low => "✅",
        RiskTier::Medium => "⚠️",
        RiskTier::High => "🚨",
    };

    println!("📧 Email Details:");
    println!("   Sender: {}", email.sender);
    if let Some(name) = &email.sender_display_name {
        println!("   Display name: {}", name);
    }
    println!("   Subject: {}", truncate_string(&email.subject, 80));
    println!("   Links: {}", email.links.len());
    println!();
    println!(
        "{} Trust score: {}/100 ({} risk)",
        icon, result.score, result.risk_tier
    );
    if result.score != result.heuristic_score {
        println!("   Heuristic score: {}/100", result.heuristic_score);
    }

    if result.issues.is_empty() {
        println!("   No risk signals found");
    } else {
        println!("   Issues:");
        for hit in &result.breakdown {
            println!("     - [-{:>2}] {}", hit.deduction, hit.finding);
        }
    }
}

fn show_stats(path: &str) {
    let summary = match ScanLog::summarize(path) {
        Ok(summary) => summary,
        Err(e) => {
            println!("❌ Failed to read scan log: {e:#}");
            process::exit(1);
        }
    };

    println!("📊 Phishguard Statistics");
    println!("═══════════════════════════════════════");
    println!("  Emails scanned: {}", summary.total);
    if summary.total > 0 {
        let pct = |n: u64| (n as f64 / summary.total as f64) * 100.0;
        println!("  ├─ Low risk: {} ({:.1}%)", summary.low, pct(summary.low));
        println!(
            "  ├─ Medium risk: {} ({:.1}%)",
            summary.medium,
            pct(summary.medium)
        );
        println!("  └─ High risk: {} ({:.1}%)", summary.high, pct(summary.high));
    }
    if let (Some(first), Some(last)) = (summary.first_scan, summary.last_scan) {
        println!();
        println!("  First scan: {}", first.format("%Y-%m-%d %H:%M:%S UTC"));
        println!("  Last scan: {}", last.format("%Y-%m-%d %H:%M:%S UTC"));
    }
}

fn report_feedback(store: &str, sender: &str, verdict: &str, note: Option<String>) {
    let verdict: FeedbackVerdict = match verdict.parse() {
        Ok(verdict) => verdict,
        Err(e) => {
            eprintln!("❌ {e}");
            process::exit(1);
        }
    };

    match FeedbackStore::record(store, &Feedback::new(sender, verdict, note)) {
        Ok(()) => println!("✅ Feedback recorded for {sender}"),
        Err(e) => {
            eprintln!("❌ Failed to record feedback: {e:#}");
            process::exit(1);
        }
    }
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
