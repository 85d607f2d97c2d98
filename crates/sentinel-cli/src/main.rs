mod config;

use clap::{Parser, Subcommand};
use sentinel_core::{Heuristics, ThreatReport};
use sentinel_detect::Scanner;
use sentinel_dom::{InMemoryPage, NodeSpec, PageSnapshot, RenderHost};
use sentinel_watch::SurveillanceLoop;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "sentinel")]
#[command(about = "Detect and neutralize UI deception in rendered pages")]
struct Cli {
    #[arg(
        short = 'f',
        long,
        global = true,
        help = "Path to TOML config with heuristics overrides"
    )]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a single element of a captured page
    Scan {
        #[arg(help = "Page snapshot JSON file")]
        page: String,
        #[arg(help = "Selector of the element to classify")]
        selector: String,
    },
    /// Sweep every element of a captured page and report threats
    Audit {
        #[arg(help = "Page snapshot JSON file")]
        page: String,
        #[arg(long, help = "Emit the report as JSON")]
        json: bool,
    },
    /// Replay scripted insertions against a page under live surveillance
    Watch {
        #[arg(help = "Page snapshot JSON file")]
        page: String,
        #[arg(help = "JSON file with a list of scripted insertions")]
        script: String,
        #[arg(long, help = "Emit the report as JSON")]
        json: bool,
    },
}

/// One scripted insertion: a node spec plus the selector of its parent.
#[derive(Debug, Deserialize)]
struct Injection {
    #[serde(default = "default_parent")]
    parent: String,
    node: NodeSpec,
}

fn default_parent() -> String {
    "body".to_string()
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sentinel=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let heuristics = match config::SentinelConfig::load(cli.config.as_deref()) {
        Ok(cfg) => cfg.heuristics,
        Err(e) => {
            eprintln!("error: failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Scan { page, selector } => run_scan(page, selector, heuristics),
        Commands::Audit { page, json } => run_audit(page, json, heuristics),
        Commands::Watch { page, script, json } => run_watch(page, script, json, heuristics).await,
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn load_page(path: &str) -> Result<(Arc<InMemoryPage>, String), Box<dyn std::error::Error>> {
    let snapshot = PageSnapshot::from_file(path)?;
    let name = if snapshot.page.is_empty() {
        path.to_string()
    } else {
        snapshot.page.clone()
    };
    Ok((Arc::new(InMemoryPage::from_snapshot(&snapshot)), name))
}

fn run_scan(
    page: String,
    selector: String,
    heuristics: Heuristics,
) -> Result<(), Box<dyn std::error::Error>> {
    let (host, _) = load_page(&page)?;
    let scanner = Scanner::new(host, heuristics);
    println!("{}", scanner.scan_element(&selector));
    Ok(())
}

fn run_audit(
    page: String,
    json: bool,
    heuristics: Heuristics,
) -> Result<(), Box<dyn std::error::Error>> {
    let (host, name) = load_page(&page)?;
    let scanner = Scanner::new(host, heuristics);
    let report = scanner.audit_page(&name);
    print_report(&report, json)
}

async fn run_watch(
    page: String,
    script: String,
    json: bool,
    heuristics: Heuristics,
) -> Result<(), Box<dyn std::error::Error>> {
    let (host, name) = load_page(&page)?;
    let raw = std::fs::read_to_string(&script)?;
    let injections: Vec<Injection> = serde_json::from_str(&raw)?;

    // arm before replaying so every scripted insertion is observed
    let mut watcher = SurveillanceLoop::new(host.clone(), heuristics.clone());
    let batches = match watcher.arm().await {
        Some(batches) => batches,
        None => return Err("page has no body to watch".into()),
    };
    let handle = tokio::spawn(watcher.pump(batches));

    let mut replayed = 0usize;
    for injection in &injections {
        match host.resolve(&injection.parent) {
            Some(parent) => {
                host.insert(parent, &injection.node);
                replayed += 1;
            }
            None => eprintln!("warning: parent {} not found, skipping", injection.parent),
        }
    }
    info!(replayed, total = injections.len(), "script replayed");

    // closing the stream lets the loop drain every batch before the sweep
    host.close_observers();
    handle.await?;

    let scanner = Scanner::new(host, heuristics);
    let report = scanner.audit_page(&name);
    print_report(&report, json)
}

fn print_report(report: &ThreatReport, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    println!(
        "{}: {} elements scanned, {} finding(s)",
        report.page,
        report.elements_scanned,
        report.findings.len()
    );
    for finding in &report.findings {
        println!(
            "  [{:?}] <{}> {} (risk {})",
            finding.kind, finding.tag, finding.verdict, finding.risk_score
        );
    }
    Ok(())
}
