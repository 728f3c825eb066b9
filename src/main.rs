use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use podspec_patcher::{
    load_from_path, locate, patch_candidates, DiskStore, FileStore, PatchOutcome, RuleSet,
    RunReport, SearchSpec,
};
use similar::{ChangeTag, TextDiff};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "podspec-patcher")]
#[command(about = "Pin vendored CocoaPods dependency versions before pod install", long_about = None)]
#[command(version)]
struct Cli {
    /// Plugins root to search (auto-detected if not specified)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Pin file overriding the built-in FBAudienceNetwork table
    #[arg(short, long)]
    pins: Option<PathBuf>,

    /// Dry run - report what would be rewritten without modifying files
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show unified diff of rewritten manifests
    #[arg(short, long)]
    diff: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let root = resolve_root(cli.root)?;

    let (search, rules, origin) = match &cli.pins {
        Some(path) => {
            let file = load_from_path(path)?;
            let origin = if file.meta.name.is_empty() {
                path.display().to_string()
            } else {
                format!("{} ({})", file.meta.name, path.display())
            };
            let (search, rules) = file.resolve();
            (search, rules, origin)
        }
        None => (
            SearchSpec::default(),
            RuleSet::default(),
            "built-in FBAudienceNetwork 6.16 -> 6.17.0 table".to_string(),
        ),
    };

    println!("Root: {}", root.display());
    println!("Pins: {} ({} literal pairs)", origin, rules.len());
    println!();

    let store = DiskStore;

    let located = locate(&store, &root, &search)?;
    for strategy in &located.attempted {
        println!("{}", format!("Searching via {strategy}...").dimmed());
    }
    println!(
        "Found {} candidate manifest(s) via {}",
        located.candidates.len(),
        located.strategy
    );
    println!();

    // Capture contents before patching, for diff output. Only the candidates
    // are read; nothing else in the tree matters.
    let mut contents_before: HashMap<PathBuf, String> = HashMap::new();
    if cli.diff && !cli.dry_run {
        for path in &located.candidates {
            if let Ok(contents) = store.read_to_string(path) {
                contents_before.insert(path.clone(), contents);
            }
        }
    }

    if cli.dry_run {
        println!("{}", "[DRY RUN - no files will be modified]".cyan());
    }

    let files = patch_candidates(&store, &located.candidates, &search, &rules, cli.dry_run)?;
    let report = RunReport { located, files };

    for file in &report.files {
        println!("{}", file.file.display().to_string().bold());

        for (rule, outcome) in &file.outcomes {
            match outcome {
                PatchOutcome::Patched => {
                    if cli.dry_run {
                        println!(
                            "  {} would rewrite {} -> {}",
                            "✓".green(),
                            rule.old,
                            rule.new
                        );
                    } else {
                        println!("  {} rewrote {} -> {}", "✓".green(), rule.old, rule.new);
                    }
                }
                PatchOutcome::AlreadyPatched => {
                    println!(
                        "  {} already has correct version ({})",
                        "⊙".yellow(),
                        rule.new
                    );
                }
                PatchOutcome::NotApplicable { expected, .. } => {
                    println!("  {}", format!("⊘ pattern not found: {expected}").dimmed());
                }
            }
        }

        // No rule touched this manifest; echo its vendor-related lines so the
        // CI log shows what the version pin actually looks like.
        if !file.any_success() {
            if let Some((_, PatchOutcome::NotApplicable { context, .. })) = file.outcomes.first() {
                if context.is_empty() {
                    println!("  {}", "no lines mention the dependency".dimmed());
                } else {
                    println!("  {}", "lines mentioning the dependency:".dimmed());
                    for line in context {
                        println!(
                            "  {}",
                            format!("line {}: {}", line.number, line.text).dimmed()
                        );
                    }
                }
            }
        }

        if cli.diff && !cli.dry_run {
            if let Some(before) = contents_before.get(&file.file) {
                if let Ok(after) = store.read_to_string(&file.file) {
                    if before != &after {
                        display_diff(&file.file, before, &after);
                    }
                }
            }
        }

        println!();
    }

    let (patched, already, missed) = report.counts();
    println!("{}", "Summary:".bold());
    println!("  {} rewritten", format!("{patched}").green());
    println!(
        "  {} already at target version",
        format!("{already}").yellow()
    );
    println!("  {} pattern misses", format!("{missed}").dimmed());

    if report.any_patched() {
        println!("{}", "Patched at least one podspec".green());
    } else {
        // Candidates were found and processed, so this stays a warning; only
        // finding nothing at all is fatal.
        println!("{}", "Warning: no podspecs were patched".yellow());
    }

    Ok(())
}

/// Resolve the plugins root.
///
/// Priority order:
/// 1. Explicit --root flag
/// 2. Conventional locations relative to the current directory
fn resolve_root(cli_root: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = cli_root {
        return path
            .canonicalize()
            .with_context(|| format!("cannot resolve --root {}", path.display()));
    }

    let cwd = env::current_dir().context("cannot determine current directory")?;
    let conventional = [
        ".symlinks/plugins",
        "ios/.symlinks/plugins",
        "../.symlinks/plugins",
    ];
    for rel in conventional {
        let candidate = cwd.join(rel);
        if candidate.is_dir() {
            let root = candidate.canonicalize()?;
            println!(
                "{}",
                format!("Auto-detected plugins root: {}", root.display()).dimmed()
            );
            return Ok(root);
        }
    }

    bail!(
        "{}\n{}\n  {}\n  {}\n  {}",
        "Could not find a plugins root.".red(),
        "Try one of:".bold(),
        "1. cd into the app's ios directory: cd ios && podspec-patcher",
        "2. Specify explicitly: podspec-patcher --root ios/.symlinks/plugins",
        "3. Run pod install once so .symlinks/plugins exists"
    )
}

/// Show unified diff between original and patched manifest contents.
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}
