mod config;
mod explain;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use clap::{Parser, Subcommand};
use config::ConfigMerger;
use friends_domain::{Analyzer, AnalyzerConfig, NeverCancelled};
use friends_edit::{EditError, WriteOptions, render_patch, synthesize_all, write_changes};
use friends_model::{Solution, load_snapshot};
use friends_render::{render_report_md, render_text};
use friends_types::report::{FriendsReport, RunInfo, ToolInfo};
use fs_err as fs;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "friends",
    version,
    about = "Checks calls to friend-restricted methods and adds missing friend declarations."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Report calls to friend-restricted methods from undeclared types.
    Check(CheckArgs),
    /// Add friend declarations for every reported call (default: dry-run).
    Fix(FixArgs),
    /// Explain a rule and how to resolve it.
    Explain(ExplainArgs),
}

#[derive(Debug, Parser)]
struct CheckArgs {
    /// Snapshot file describing documents and resolved symbols.
    #[arg(long, default_value = "friends.snapshot.json")]
    snapshot: Utf8PathBuf,

    /// Root that document paths are relative to (default: the snapshot's directory).
    #[arg(long)]
    root: Option<Utf8PathBuf>,

    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Write the report here instead of stdout.
    #[arg(long)]
    out: Option<Utf8PathBuf>,

    /// Glob patterns for documents to skip (extends the config file list).
    #[arg(long)]
    exclude: Vec<String>,

    /// Worker threads for analysis.
    #[arg(long)]
    jobs: Option<usize>,

    /// Exit with code 2 when any diagnostic is reported.
    #[arg(long, default_value_t = false)]
    deny_warnings: bool,
}

#[derive(Debug, Parser)]
struct FixArgs {
    #[arg(long, default_value = "friends.snapshot.json")]
    snapshot: Utf8PathBuf,

    #[arg(long)]
    root: Option<Utf8PathBuf>,

    /// Write changes to disk. If omitted, only the patch is printed.
    #[arg(long, default_value_t = false)]
    apply: bool,

    /// Do not back up documents before rewriting them.
    #[arg(long, default_value_t = false)]
    no_backup: bool,

    /// With --apply, write the rewritten documents and their hashes here as JSON.
    #[arg(long)]
    changes: Option<Utf8PathBuf>,
}

#[derive(Debug, Parser)]
struct ExplainArgs {
    /// Rule key or id (e.g., "friend-access", "FRIEND001"). Lists rules when omitted.
    rule: Option<String>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Md,
}

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:?}", e);
            eprintln!("error: {:#}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

fn exit_code_for(e: &anyhow::Error) -> u8 {
    e.downcast_ref::<EditError>()
        .map(EditError::exit_code)
        .unwrap_or(1)
}

fn real_main() -> anyhow::Result<u8> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Check(args) => cmd_check(args),
        Command::Fix(args) => cmd_fix(args),
        Command::Explain(args) => cmd_explain(args),
    }
}

/// Explicit root, else the snapshot's directory.
fn resolve_root(snapshot: &Utf8Path, root: Option<Utf8PathBuf>) -> Utf8PathBuf {
    root.or_else(|| snapshot.parent().map(Utf8Path::to_path_buf))
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or_else(|| Utf8PathBuf::from("."))
}

fn load(snapshot: &Utf8Path, root: &Utf8Path) -> anyhow::Result<Solution> {
    load_snapshot(snapshot, Some(root)).with_context(|| format!("load snapshot {}", snapshot))
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<u8> {
    let root = resolve_root(&args.snapshot, args.root);
    let file_config = config::load_or_default(&root).context("load friends.toml config")?;
    let merged = ConfigMerger::new(file_config).merge_check_args(&args.exclude, args.jobs);
    debug!(
        "merged config: enabled={}, exclude={:?}, jobs={}",
        merged.enabled, merged.exclude, merged.jobs
    );

    let started_at = Utc::now();
    let solution = load(&args.snapshot, &root)?;
    let analyzer = Analyzer::new(
        &solution,
        &AnalyzerConfig {
            enabled: merged.enabled,
            exclude: merged.exclude,
        },
    )
    .context("configure analyzer")?;

    let sites = solution.call_sites();
    let analysis = analyzer
        .analyze_parallel(&sites, merged.jobs, &NeverCancelled)
        .context("analyze call sites")?;

    let mut report = FriendsReport::new(tool_info(), analysis.summary, analysis.diagnostics());
    report.run = RunInfo {
        started_at: Some(started_at),
        ended_at: Some(Utc::now()),
    };

    let rendered = match args.format {
        OutputFormat::Text => render_text(&report),
        OutputFormat::Json => {
            let mut s = serde_json::to_string_pretty(&report).context("serialize report")?;
            s.push('\n');
            s
        }
        OutputFormat::Md => render_report_md(&report),
    };
    match &args.out {
        Some(path) => fs::write(path, &rendered).with_context(|| format!("write {}", path))?,
        None => print!("{rendered}"),
    }

    info!(
        call_sites = report.summary.call_sites,
        denied = report.summary.denied,
        "check finished"
    );

    if args.deny_warnings && !report.diagnostics.is_empty() {
        return Ok(2);
    }
    Ok(0)
}

fn cmd_fix(args: FixArgs) -> anyhow::Result<u8> {
    let root = resolve_root(&args.snapshot, args.root);
    let file_config = config::load_or_default(&root).context("load friends.toml config")?;
    let merged = ConfigMerger::new(file_config).merge_fix_args(args.no_backup);

    let solution = load(&args.snapshot, &root)?;
    let analysis = Analyzer::new(
        &solution,
        &AnalyzerConfig {
            enabled: merged.enabled,
            exclude: merged.exclude,
        },
    )
    .context("configure analyzer")?
    .analyze(&solution.call_sites(), &NeverCancelled)
    .context("analyze call sites")?;

    let requests = analysis.denials.iter().map(|d| (&d.callee, &d.caller));
    let batch = synthesize_all(&solution, requests, &NeverCancelled).context("synthesize fixes")?;
    for withheld in &batch.withheld {
        warn!(
            method = %withheld.method,
            friend = %withheld.friend,
            "no fix: {}",
            withheld.error
        );
    }

    let patch = render_patch(&solution.texts(), &batch.after.texts());
    print!("{patch}");

    info!(
        applied = batch.applied,
        unchanged = batch.unchanged,
        withheld = batch.withheld.len(),
        "fixes synthesized"
    );

    if !args.apply {
        debug!("dry-run; pass --apply to write changes");
        return Ok(0);
    }
    if batch.applied == 0 {
        info!("nothing to apply");
        return Ok(0);
    }

    let opts = WriteOptions {
        backup_suffix: merged.backup_suffix,
    };
    let changes = write_changes(
        &root,
        &solution.on_disk_texts(),
        &batch.after.on_disk_texts(),
        &opts,
    )?;

    if let Some(path) = &args.changes {
        write_json(path, &changes)?;
    }

    write_json(&args.snapshot, &batch.after.to_snapshot())?;
    info!(files = changes.len(), snapshot = %args.snapshot, "applied friend grants");
    Ok(0)
}

fn cmd_explain(args: ExplainArgs) -> anyhow::Result<u8> {
    use explain::{RULE_REGISTRY, list_rule_keys, lookup_rule};

    let Some(query) = args.rule else {
        println!("Available rules:\n");
        println!("  {:<16} {:<10} {:<9} TITLE", "KEY", "ID", "SEVERITY");
        println!("  {:<16} {:<10} {:<9} -----", "---", "--", "--------");
        for r in RULE_REGISTRY {
            println!(
                "  {:<16} {:<10} {:<9} {}",
                r.key,
                r.rule.id,
                r.rule.default_severity.label(),
                r.rule.title
            );
        }
        println!();
        println!("Use 'friends explain <key>' for details.");
        return Ok(0);
    };

    let Some(entry) = lookup_rule(&query) else {
        let available = list_rule_keys().join(", ");
        anyhow::bail!("Unknown rule: '{}'\n\nAvailable rules: {}", query, available);
    };
    let rule = entry.rule;

    println!("================================================================================");
    println!("RULE: {}", rule.title);
    println!("================================================================================");
    println!();
    println!("Key:       {}", entry.key);
    println!("ID:        {}", rule.id);
    println!("Category:  {}", rule.category);
    println!("Severity:  {}", rule.default_severity.label());
    println!("Enabled:   {}", rule.enabled_by_default);
    if let Some(title) = entry.fix_title {
        println!("Fix:       {}", title);
    }
    println!();

    println!("DESCRIPTION");
    println!("--------------------------------------------------------------------------------");
    println!("{}", rule.description);
    println!();

    println!("RATIONALE");
    println!("--------------------------------------------------------------------------------");
    println!("{}", entry.rationale);
    println!();

    println!("REMEDIATION GUIDANCE");
    println!("--------------------------------------------------------------------------------");
    println!("{}", entry.remediation);
    println!();

    Ok(0)
}

fn write_json<T: serde::Serialize>(path: &Utf8Path, v: &T) -> anyhow::Result<()> {
    let mut s = serde_json::to_string_pretty(v).context("serialize json")?;
    s.push('\n');
    fs::write(path, s).with_context(|| format!("write {}", path))?;
    Ok(())
}

fn tool_info() -> ToolInfo {
    ToolInfo {
        name: "friends".to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    }
}
