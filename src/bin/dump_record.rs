//! Decode one raw record with a field table and print its fields.
//!
//! Usage:
//!   dump_record [OPTIONS] <TABLE> <BINARY>
//!
//! Reads `WIDTH` bytes at `--offset` (decimal or 0x-prefixed hex) of BINARY, e.g. an ext4
//! superblock at 0x400 of a partition image.

use anyhow::{bail, Context};
use clap::Parser;
use rawlayout::dump::format_record;
use rawlayout::{load_layout, Codec, Endianness, LayoutOptions, OffsetCheck};
use std::path::PathBuf;

/// Decode a raw record described by a field table.
#[derive(Debug, Parser)]
#[command(name = "dump_record", version, about, long_about = None)]
struct Cli {
    /// Field table describing the record.
    #[arg(value_name = "TABLE")]
    table: PathBuf,

    /// File holding the raw record.
    #[arg(value_name = "BINARY")]
    binary: PathBuf,

    /// Byte offset of the record in BINARY (hex like 0x400 or decimal).
    #[arg(long, default_value = "0", value_parser = parse_offset)]
    offset: u64,

    /// Read multi-byte fields as big-endian instead of little-endian.
    #[arg(long)]
    big_endian: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_offset(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };
    parsed.map_err(|e| format!("invalid offset {:?}: {}", s, e))
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

    let src = std::fs::read_to_string(&cli.table)
        .with_context(|| format!("reading {}", cli.table.display()))?;
    let layout = load_layout(
        &src,
        &LayoutOptions {
            offset_check: OffsetCheck::Warn,
        },
    )
    .with_context(|| format!("compiling {}", cli.table.display()))?;

    let bytes = std::fs::read(&cli.binary)
        .with_context(|| format!("reading {}", cli.binary.display()))?;
    let Some(record) = usize::try_from(cli.offset).ok().and_then(|o| bytes.get(o..)) else {
        bail!(
            "offset {} is past the end of {} ({} bytes)",
            cli.offset,
            cli.binary.display(),
            bytes.len()
        );
    };

    let endianness = if cli.big_endian {
        Endianness::Big
    } else {
        Endianness::Little
    };
    let codec = Codec::new(layout, endianness);
    let fields = codec.decode(record)?;
    println!("{}", format_record(&fields));
    Ok(())
}
