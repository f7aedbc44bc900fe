//! Lint field tables: gaps, overlaps and misaligned fields.
//!
//! Usage:
//!   lint_table [OPTIONS] [FILE ...]
//!   lint_table < table.tsv
//!
//! Options:
//!   --human, -H    Human-readable output
//!   --verbose, -v  Debug-level logging on stderr (`RUST_LOG` overrides)
//!
//! If no files are given, reads from stdin. Exit code 1 if any table fails to compile or
//! has error-level findings.

use rawlayout::lint::{lint_source, LintMessage, Severity};
use std::io::{self, Read};
use std::path::Path;

fn print_message(path: &str, m: &LintMessage, style: OutputStyle) {
    let severity_str = match m.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };
    match style {
        OutputStyle::Compact => {
            println!(
                "{}:{}: {}: {} [{}]",
                path,
                m.line,
                severity_str,
                m.message,
                m.rule.id()
            );
        }
        OutputStyle::Human => {
            println!("  {} line {}: {}", path, m.line, m.message);
            println!("    rule: {} ({})", m.rule.id(), severity_str);
        }
    }
}

#[derive(Clone, Copy)]
enum OutputStyle {
    Compact,
    Human,
}

#[derive(Default)]
struct Totals {
    errors: usize,
    warnings: usize,
    failed: bool,
}

fn lint_one(display_path: &str, src: &str, style: OutputStyle, totals: &mut Totals) {
    let messages = match lint_source(src) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{}: {}", display_path, e);
            totals.failed = true;
            return;
        }
    };
    for m in &messages {
        match m.severity {
            Severity::Error => totals.errors += 1,
            Severity::Warning => totals.warnings += 1,
        }
        print_message(display_path, m, style);
    }
}

/// Remove every occurrence of a flag from `args`; true if it was present.
fn take_flag(args: &mut Vec<String>, long: &str, short: &str) -> bool {
    let before = args.len();
    args.retain(|a| a != long && a != short);
    args.len() != before
}

fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let style = if take_flag(&mut args, "--human", "-H") {
        OutputStyle::Human
    } else {
        OutputStyle::Compact
    };
    let level = if take_flag(&mut args, "--verbose", "-v") {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_module("rawlayout", level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    let mut totals = Totals::default();

    if args.is_empty() {
        let mut src = String::new();
        io::stdin().read_to_string(&mut src)?;
        lint_one("<stdin>", &src, style, &mut totals);
    } else {
        for path in &args {
            let path = Path::new(path);
            let src = match std::fs::read_to_string(path) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("{}: {}", path.display(), e);
                    totals.failed = true;
                    continue;
                }
            };
            lint_one(&path.display().to_string(), &src, style, &mut totals);
        }
    }

    if totals.errors > 0 || totals.warnings > 0 {
        eprintln!(
            "lint: {} error(s), {} warning(s)",
            totals.errors, totals.warnings
        );
    }
    if totals.failed || totals.errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}
