//! Compile a field table into a Rust record structure.
//!
//! Usage:
//!   gen_layout [OPTIONS] <NAME> <FILE>
//!
//! FILE `-` reads the table from stdin. The generated source goes to stdout unless
//! `--output` is given; nothing is written when the table fails to compile.

use anyhow::Context;
use clap::Parser;
use rawlayout::{compile, CompileOptions, EmitOptions, LayoutOptions, OffsetCheck, Visibility};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Compile a tab-separated field table into a Rust structure with endian-aware constructors.
#[derive(Debug, Parser)]
#[command(name = "gen_layout", version, about, long_about = None)]
struct Cli {
    /// Name of the generated structure, used verbatim.
    #[arg(value_name = "NAME")]
    name: String,

    /// Field table: offset, type, name, description per line. `-` reads stdin.
    #[arg(value_name = "FILE")]
    path: PathBuf,

    /// Write the generated source here instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Fail when declared offsets leave gaps or overlap.
    #[arg(long, conflicts_with = "no_offset_check")]
    strict_offsets: bool,

    /// Treat offsets as documentation only (no warnings).
    #[arg(long)]
    no_offset_check: bool,

    /// Make the structure, its fields and WIDTH `pub` instead of `pub(crate)`.
    #[arg(long = "pub")]
    public: bool,

    /// Spaces per indentation level.
    #[arg(long, default_value_t = 2)]
    indent: usize,

    /// Comment line placed above the generated code.
    #[arg(long, value_name = "TEXT")]
    header: Option<String>,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn options(&self) -> CompileOptions {
        let offset_check = if self.strict_offsets {
            OffsetCheck::Strict
        } else if self.no_offset_check {
            OffsetCheck::Ignore
        } else {
            OffsetCheck::Warn
        };
        CompileOptions {
            layout: LayoutOptions { offset_check },
            emit: EmitOptions {
                visibility: if self.public {
                    Visibility::Public
                } else {
                    Visibility::Crate
                },
                indent: self.indent,
                header: self.header.clone(),
            },
        }
    }
}

fn read_table(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut src = String::new();
        io::stdin()
            .read_to_string(&mut src)
            .context("reading table from stdin")?;
        Ok(src)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
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

    let src = read_table(&cli.path)?;
    let code = compile(&cli.name, &src, &cli.options())
        .with_context(|| format!("compiling {}", cli.path.display()))?;

    match &cli.output {
        Some(out) => std::fs::write(out, code).with_context(|| format!("writing {}", out.display()))?,
        None => io::stdout().write_all(code.as_bytes())?,
    }
    Ok(())
}
