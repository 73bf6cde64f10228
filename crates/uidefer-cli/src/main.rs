mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "uidefer")]
#[command(about = "Locate and patch deferred drop-down regions in code-segment dumps")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve begin/end call-site pairs in a dump
    Scan {
        /// Raw code-segment dump
        dump: PathBuf,

        /// Address of the first byte of the dump (hex, defaults to the host code base)
        #[arg(long)]
        base: Option<String>,

        /// Start of the scanned range (hex, defaults to base)
        #[arg(long)]
        start: Option<String>,

        /// End of the scanned range (hex, defaults to end of dump)
        #[arg(long)]
        end: Option<String>,

        /// Signature file (JSON) instead of the builtin set
        #[arg(short, long, env = "UIDEFER_SIGNATURES")]
        signatures: Option<PathBuf>,

        /// Print pairs and stats as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find every match of a byte pattern
    Find {
        dump: PathBuf,

        #[arg(long)]
        base: Option<String>,

        /// Byte pattern (e.g., "E8 ?? ?? ?? ?? 48 8D")
        #[arg(short, long)]
        pattern: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Redirect every resolved pair to hook addresses and write the result
    Patch {
        dump: PathBuf,

        #[arg(long)]
        base: Option<String>,

        /// Address the begin call sites should reach (hex)
        #[arg(long)]
        begin_hook: String,

        /// Address the end call sites should reach (hex)
        #[arg(long)]
        end_hook: String,

        /// Where to write the patched dump
        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long, env = "UIDEFER_SIGNATURES")]
        signatures: Option<PathBuf>,
    },

    /// Print or save the builtin signature set
    Signatures {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("uidefer=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Command::Scan {
            dump,
            base,
            start,
            end,
            signatures,
            json,
        } => commands::scan::run(
            &dump,
            base.as_deref(),
            start.as_deref(),
            end.as_deref(),
            signatures.as_deref(),
            json,
        ),
        Command::Find {
            dump,
            base,
            pattern,
            limit,
        } => commands::find::run(&dump, base.as_deref(), &pattern, limit),
        Command::Patch {
            dump,
            base,
            begin_hook,
            end_hook,
            output,
            signatures,
        } => commands::patch::run(
            &dump,
            base.as_deref(),
            &begin_hook,
            &end_hook,
            &output,
            signatures.as_deref(),
        ),
        Command::Signatures { output } => commands::signatures::run(output.as_deref()),
    }
}
