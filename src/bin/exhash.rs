//! Interactive host for the extendible-hash store.
#![forbid(unsafe_code)]

use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use exhash::{cli::Session, logging::init_logging, HashKind, StoreOptions, Synchronous};

#[derive(Parser, Debug)]
#[command(
    name = "exhash",
    version,
    about = "Run store commands (N, A, U, R, G, PD, PF, S) from stdin or a script"
)]
struct Cli {
    #[arg(value_name = "SCRIPT", help = "Command file to run instead of stdin")]
    script: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "TOML file with store options")]
    config: Option<PathBuf>,

    #[arg(long, value_enum, help = "Hash strategy override")]
    hash: Option<HashArg>,

    #[arg(long, value_enum, help = "Synchronous mode override")]
    synchronous: Option<SynchronousArg>,

    #[arg(
        long,
        env = "EXHASH_LOG",
        default_value = "warn",
        help = "Tracing filter directives written to stderr"
    )]
    log_filter: String,

    #[arg(long, help = "Seed for generated record payloads")]
    seed: Option<u64>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum HashArg {
    Identity,
    ShiftMult,
    MulXorShift,
    Jenkins,
    XorShiftAdd,
    AddShiftMix,
}

impl From<HashArg> for HashKind {
    fn from(arg: HashArg) -> Self {
        match arg {
            HashArg::Identity => HashKind::Identity,
            HashArg::ShiftMult => HashKind::ShiftMult,
            HashArg::MulXorShift => HashKind::MulXorShift,
            HashArg::Jenkins => HashKind::Jenkins,
            HashArg::XorShiftAdd => HashKind::XorShiftAdd,
            HashArg::AddShiftMix => HashKind::AddShiftMix,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum SynchronousArg {
    Full,
    Normal,
}

impl From<SynchronousArg> for Synchronous {
    fn from(mode: SynchronousArg) -> Self {
        match mode {
            SynchronousArg::Full => Synchronous::Full,
            SynchronousArg::Normal => Synchronous::Normal,
        }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_filter)?;

    let mut options = match &cli.config {
        Some(path) => StoreOptions::from_toml_file(path)?,
        None => StoreOptions::default(),
    };
    if let Some(hash) = cli.hash {
        options = options.hash(hash.into());
    }
    if let Some(mode) = cli.synchronous {
        options = options.synchronous(mode.into());
    }

    let mut session = match cli.seed {
        Some(seed) => Session::with_seed(options, seed),
        None => Session::new(options),
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match &cli.script {
        Some(path) => session.run(BufReader::new(File::open(path)?), &mut out)?,
        None => session.run(io::stdin().lock(), &mut out)?,
    }
    Ok(())
}
