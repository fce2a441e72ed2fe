use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context};
use clap::{ArgAction, Parser};
use console::style;
use docguard_core::{Baseline, Checker, Config, DocstringStyle, NoqaLocation, Violation};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use serde_yaml::Value as YamlValue;
use walkdir::WalkDir;

/// Docguard CLI entry point.
#[derive(Debug, Parser)]
#[command(
    name = "docguard",
    about = "Check that Python docstrings match the signatures they document."
)]
struct Args {
    /// Path to config file (YAML). Defaults to docguard.yml if present.
    #[arg(long, default_value = "docguard.yml")]
    config: PathBuf,

    /// Docstring style override: numpy, google, or sphinx.
    #[arg(long, value_name = "STYLE")]
    style: Option<String>,

    /// Emit JSON output for automation.
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Suppress per-file output; keep the summary and exit code.
    #[arg(long, action = ArgAction::SetTrue)]
    quiet: bool,

    /// Set config overrides (repeatable as key=value). Example: --set check-arg-order=false
    #[arg(long = "set", value_name = "KEY=VALUE", num_args = 0..)]
    sets: Vec<String>,

    /// Additional file globs to exclude.
    #[arg(long, value_name = "GLOB", num_args = 0..)]
    exclude: Vec<String>,

    /// Baseline file of previously accepted violations.
    #[arg(long, value_name = "FILE")]
    baseline: Option<PathBuf>,

    /// Snapshot the current violations into the baseline file and exit.
    #[arg(long, action = ArgAction::SetTrue)]
    generate_baseline: bool,

    /// Files or directories to check.
    #[arg(value_name = "PATH", default_value = ".", num_args = 0..)]
    paths: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
struct FileResult {
    path: String,
    violations: Vec<Violation>,
    suppressed_by_baseline: usize,
    baseline_regeneration_needed: bool,
}

#[derive(Debug, Serialize)]
struct OutputReport {
    files: Vec<FileResult>,
    total_violations: usize,
    baseline_regeneration_needed: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    run(args)
}

fn run(args: Args) -> anyhow::Result<()> {
    let (mut cfg, config_root) = load_config(&args.config)?;
    apply_overrides(&mut cfg, &args.sets)?;
    if let Some(name) = &args.style {
        cfg.style = parse_style(name)?;
    }
    cfg.exclude.extend(args.exclude.iter().cloned());

    let ignore = build_ignore_set(&cfg.exclude)?;
    let checker = Checker::new(cfg)?;

    let mut files = collect_files(&args.paths, ignore.as_ref())?;
    files.sort();

    if args.generate_baseline {
        let target = args
            .baseline
            .clone()
            .ok_or_else(|| anyhow!("--generate-baseline requires --baseline FILE"))?;
        let mut snapshot = Baseline::new();
        for path in &files {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let rel = display_path(path, &config_root);
            snapshot.record_file(rel, &checker.check_source(&content));
        }
        fs::write(&target, snapshot.generate())
            .with_context(|| format!("Failed to write baseline {}", target.display()))?;
        if !args.quiet {
            println!("Baseline written to {}", target.display());
        }
        return Ok(());
    }

    let baseline = match &args.baseline {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read baseline {}", path.display()))?;
            Some(Baseline::parse(&text))
        }
        None => None,
    };

    let mut file_reports = Vec::new();
    let mut total = 0usize;
    let mut regeneration_needed = false;

    for path in &files {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let rel = display_path(path, &config_root);
        let violations = checker.check_source(&content);
        let (suppressed, remaining, regen) = match &baseline {
            Some(baseline) => {
                let (unfixed, remaining) = baseline.reconcile(&rel, &violations);
                let regen = baseline.needs_regeneration(&rel, &unfixed);
                (unfixed.len(), remaining, regen)
            }
            None => (0, violations, false),
        };
        total += remaining.len();
        regeneration_needed |= regen;

        if !args.quiet && !args.json {
            print_human_report(&rel, &remaining, suppressed);
        }

        file_reports.push(FileResult {
            path: rel,
            violations: remaining,
            suppressed_by_baseline: suppressed,
            baseline_regeneration_needed: regen,
        });
    }

    let output = OutputReport {
        total_violations: total,
        baseline_regeneration_needed: regeneration_needed,
        files: file_reports,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !args.quiet {
        println!(
            "\n{} violation(s) in {} file(s)",
            output.total_violations,
            output.files.len()
        );
        if regeneration_needed {
            println!(
                "{}",
                style("Some baselined violations no longer occur; re-run with --generate-baseline.")
                    .yellow()
            );
        }
    }

    if total > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn print_human_report(path: &str, violations: &[Violation], suppressed: usize) {
    println!("{}", style(path).bold());
    if violations.is_empty() {
        if suppressed > 0 {
            println!("  {} ({} baselined)", style("clean").green(), suppressed);
        } else {
            println!("  {}", style("clean").green());
        }
        return;
    }
    for violation in violations {
        println!("  {}: {}", violation.line, violation.render());
    }
    if suppressed > 0 {
        println!("  {} suppressed by baseline", suppressed);
    }
}

fn load_config(path: &PathBuf) -> anyhow::Result<(Config, PathBuf)> {
    if path.exists() {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let value: YamlValue = serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse YAML {}", path.display()))?;
        let cfg: Config = serde_yaml::from_value(value)
            .with_context(|| format!("Invalid config structure in {}", path.display()))?;
        let dir = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| env::current_dir().expect("working dir"));
        Ok((cfg, dir))
    } else {
        Ok((Config::default(), env::current_dir()?))
    }
}

fn parse_style(name: &str) -> anyhow::Result<DocstringStyle> {
    match name.trim().to_lowercase().as_str() {
        "numpy" => Ok(DocstringStyle::Numpy),
        "google" => Ok(DocstringStyle::Google),
        "sphinx" | "rest" => Ok(DocstringStyle::Sphinx),
        other => Err(anyhow!(
            "unrecognized style `{other}` (expected numpy, google, or sphinx)"
        )),
    }
}

fn parse_noqa_location(value: &str) -> Option<NoqaLocation> {
    match value.trim().to_lowercase().as_str() {
        "definition" => Some(NoqaLocation::Definition),
        "docstring" => Some(NoqaLocation::Docstring),
        "none" => Some(NoqaLocation::None),
        _ => None,
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value, "true" | "1" | "yes")
}

fn apply_overrides(cfg: &mut Config, sets: &[String]) -> anyhow::Result<()> {
    for kv in sets {
        let mut parts = kv.splitn(2, '=');
        let key = parts.next().unwrap_or("").trim();
        let val = parts.next().unwrap_or("").trim();
        if key.is_empty() {
            continue;
        }
        // Accept both spellings: --set check-arg-order and check_arg_order.
        match key.replace('-', "_").as_str() {
            "style" => cfg.style = parse_style(val)?,
            "check_type_hint" => cfg.check_type_hint = parse_bool(val),
            "check_arg_order" => cfg.check_arg_order = parse_bool(val),
            "skip_checking_short_docstrings" => {
                cfg.skip_checking_short_docstrings = parse_bool(val);
            }
            "skip_checking_raises" => cfg.skip_checking_raises = parse_bool(val),
            "allow_init_docstring" => cfg.allow_init_docstring = parse_bool(val),
            "require_return_section_when_returning_none" => {
                cfg.require_return_section_when_returning_none = parse_bool(val);
            }
            "require_yield_section_when_yielding_none" => {
                cfg.require_yield_section_when_yielding_none = parse_bool(val);
            }
            "check_return_types" => cfg.check_return_types = parse_bool(val),
            "check_yield_types" => cfg.check_yield_types = parse_bool(val),
            "check_class_attributes" => cfg.check_class_attributes = parse_bool(val),
            "ignore_underscore_args" => cfg.ignore_underscore_args = parse_bool(val),
            "ignore_private_args" => cfg.ignore_private_args = parse_bool(val),
            "should_document_star_arguments" => {
                cfg.should_document_star_arguments = parse_bool(val);
            }
            "check_arg_defaults" => cfg.check_arg_defaults = parse_bool(val),
            "check_style_mismatch" => cfg.check_style_mismatch = parse_bool(val),
            "noqa_location" => {
                if let Some(location) = parse_noqa_location(val) {
                    cfg.noqa_location = location;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn build_ignore_set(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(Some(builder.build()?))
}

fn collect_files(paths: &[PathBuf], ignore: Option<&GlobSet>) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut walker = WalkDir::new(path).into_iter();
            while let Some(entry_res) = walker.next() {
                let entry = entry_res?;
                let entry_path = entry.path();
                if let Some(set) = ignore {
                    if set.is_match(entry_path) {
                        if entry.file_type().is_dir() {
                            walker.skip_current_dir();
                        }
                        continue;
                    }
                }
                if entry.file_type().is_file() && is_supported(entry_path) {
                    files.push(entry_path.to_path_buf());
                }
            }
        } else if path.is_file() && is_supported(path) {
            if let Some(set) = ignore {
                if set.is_match(path) {
                    continue;
                }
            }
            files.push(path.clone());
        }
    }
    Ok(files)
}

fn is_supported(path: &Path) -> bool {
    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => matches!(ext.to_lowercase().as_str(), "py" | "pyi"),
        None => false,
    }
}

/// Root-relative forward-slash path, the form baseline entries are keyed by.
fn display_path(path: &Path, root: &Path) -> String {
    let rel = pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf());
    rel.to_string_lossy().replace('\\', "/")
}
