use crate::config::Config;
use anyhow::{bail, Result};
use shroud_core::{reporter, BatchOptions, Orchestrator, ScanReport, VaultAction};
use shroud_detectors::default_registry;
use shroud_vault::Vault;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

struct ScanArgs {
    root: PathBuf,
    vault: bool,
    json: bool,
    owner: Option<String>,
    concurrency: Option<usize>,
}

fn parse_args(args: &[String]) -> Result<ScanArgs> {
    let mut root = None;
    let mut vault = false;
    let mut json = false;
    let mut owner = None;
    let mut concurrency = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--vault" => vault = true,
            "--json" => json = true,
            "--owner" => match iter.next() {
                Some(value) => owner = Some(value.clone()),
                None => bail!("--owner requires a value"),
            },
            "--concurrency" => match iter.next() {
                Some(value) => concurrency = Some(value.parse()?),
                None => bail!("--concurrency requires a value"),
            },
            other if root.is_none() && !other.starts_with("--") => {
                root = Some(PathBuf::from(other));
            }
            other => bail!("Unknown argument: {other}"),
        }
    }

    let Some(root) = root else {
        bail!("Usage: shroud scan <dir> [--vault] [--owner NAME] [--concurrency N] [--json]");
    };

    Ok(ScanArgs {
        root,
        vault,
        json,
        owner,
        concurrency,
    })
}

pub async fn run(config: &Config, args: &[String]) -> Result<()> {
    let args = parse_args(args)?;

    let registry = Arc::new(default_registry());
    let opts = BatchOptions {
        concurrency: args.concurrency.unwrap_or(config.concurrency),
        detector_timeout: Duration::from_secs(config.detector_timeout_secs),
    };
    let orchestrator = Orchestrator::new(registry, opts);

    let outcome = orchestrator.process_directory(&args.root).await?;

    let mut actions: Vec<VaultAction> = Vec::new();
    if args.vault {
        let sensitive: Vec<_> = outcome.verdicts.iter().filter(|v| v.sensitive).collect();
        if sensitive.is_empty() {
            println!("No sensitive files found; nothing to vault.");
        } else {
            let passphrase = super::prompt_new_passphrase()?;
            let owner = args.owner.as_deref().unwrap_or(&config.owner);
            let vault = Vault::open(&config.vault_dir)?;

            for verdict in sensitive {
                match vault.encrypt(
                    &verdict.record.path,
                    passphrase.as_bytes(),
                    owner,
                    "standard",
                ) {
                    Ok(entry) => actions.push(VaultAction {
                        path: verdict.record.path.clone(),
                        entry_id: entry.uuid,
                    }),
                    // one failed encrypt must not stop the rest
                    Err(e) => eprintln!("Failed to vault {}: {e}", verdict.record.path.display()),
                }
            }
        }
    }

    let report = reporter::build_report(&outcome.verdicts, &actions, &outcome.warnings);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &ScanReport) {
    println!();
    println!("Scan results");
    println!("------------");
    for entry in &report.entries {
        let marker = if entry.sensitive { "[!]" } else { "[ ]" };
        println!(
            "{marker} {} ({}, confidence {:.2}) - {}",
            entry.path.display(),
            entry.modality,
            entry.confidence,
            entry.rationale
        );
    }

    if !report.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &report.warnings {
            println!("  {}: {}", warning.path.display(), warning.message);
        }
    }

    if !report.vault_actions.is_empty() {
        println!();
        println!("Vaulted:");
        for action in &report.vault_actions {
            println!("  {} -> {}", action.path.display(), action.entry_id);
        }
    }

    let summary = &report.summary;
    println!();
    println!(
        "{} file(s) scanned, {} sensitive, {} safe, {} vaulted",
        summary.total_files, summary.sensitive_files, summary.safe_files, summary.vaulted_files
    );
    for recommendation in &summary.recommendations {
        println!("  - {recommendation}");
    }
}
