//! Line-oriented command language for driving a store interactively.
//!
//! Each input line is one command. Tokens are separated by single spaces:
//!
//! | Command            | Effect                                          |
//! |--------------------|-------------------------------------------------|
//! | `N path pageSize`  | create a fresh store, replacing any open one    |
//! | `A k [a b c]`      | add a record; a missing payload is generated    |
//! | `U k a b c`        | replace the payload of an existing record       |
//! | `R k`              | remove a record                                 |
//! | `G k`              | print a record                                  |
//! | `PD` / `PF`        | dump the directory / the page file              |
//! | `S`                | print page read and write totals                |
//!
//! Anything else prints `Bad command, try again!`.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::primitives::hash::KeyHash;
use crate::storage::{
    AddOutcome, CounterMetrics, Directory, IoMetrics, RecordDump, StoreOptions,
};
use crate::types::{Record, Result, StoreError};

/// Reply printed for lines that do not parse.
pub const BAD_COMMAND: &str = "Bad command, try again!";

/// Reply printed when a command needs a store and none is open.
pub const NO_STORE: &str = "No store open";

/// Reply printed when `A` names a key that is already stored.
pub const DUPLICATE: &str = "Record already added!";

const RULE: &str = "--------------";

/// Bounds for generated payload values, upper exclusive.
const PAYLOAD_RANGE: std::ops::Range<i32> = -10_000..10_000;

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `N path pageSize`
    New {
        /// File to create.
        path: PathBuf,
        /// Records per page.
        page_size: usize,
    },
    /// `A k [a b c]`
    Add {
        /// Key to insert.
        key: i32,
        /// Explicit payload, if given.
        payload: Option<[i32; 3]>,
    },
    /// `U k a b c`
    Update(Record),
    /// `R k`
    Remove(i32),
    /// `G k`
    Get(i32),
    /// `PD`
    PrintDirectory,
    /// `PF`
    PrintFile,
    /// `S`
    Stats,
    /// `TEST`; accepted and ignored.
    Noop,
}

impl Command {
    /// Parses one line; `None` when the line is not a valid command.
    pub fn parse(line: &str) -> Option<Self> {
        let tokens: Vec<&str> = line.split(' ').collect();
        let ints = |range: std::ops::Range<usize>| -> Option<Vec<i32>> {
            tokens[range].iter().map(|t| t.parse().ok()).collect()
        };
        let command = match (tokens[0], tokens.len()) {
            ("N", 3) => Command::New {
                path: PathBuf::from(tokens[1]),
                page_size: tokens[2].parse().ok()?,
            },
            ("A", 2) => Command::Add {
                key: tokens[1].parse().ok()?,
                payload: None,
            },
            ("A", 5) => {
                let v = ints(1..5)?;
                Command::Add {
                    key: v[0],
                    payload: Some([v[1], v[2], v[3]]),
                }
            }
            ("U", 5) => Command::Update(Record::from_ints(&ints(1..5)?).ok()?),
            ("R", 2) => Command::Remove(tokens[1].parse().ok()?),
            ("G", 2) => Command::Get(tokens[1].parse().ok()?),
            ("PD", 1) => Command::PrintDirectory,
            ("PF", 1) => Command::PrintFile,
            ("S", 1) => Command::Stats,
            ("TEST", _) => Command::Noop,
            _ => return None,
        };
        Some(command)
    }
}

/// Interpreter state: the open store, shared counters and the payload RNG.
pub struct Session {
    options: StoreOptions,
    hasher: Arc<dyn KeyHash>,
    metrics: Arc<CounterMetrics>,
    dir: Option<Directory>,
    rng: StdRng,
}

impl Session {
    /// Creates a session whose stores are opened with `options`.
    ///
    /// `N` always truncates and overrides the page size; every other option
    /// is taken as given.
    pub fn new(options: StoreOptions) -> Self {
        Self::with_rng(options, StdRng::from_entropy())
    }

    /// Like [`Session::new`] with a reproducible payload generator.
    pub fn with_seed(options: StoreOptions, seed: u64) -> Self {
        Self::with_rng(options, StdRng::seed_from_u64(seed))
    }

    fn with_rng(options: StoreOptions, rng: StdRng) -> Self {
        Self {
            hasher: Arc::new(options.hash),
            options,
            metrics: Arc::new(CounterMetrics::default()),
            dir: None,
            rng,
        }
    }

    /// The open store, if any.
    pub fn directory(&mut self) -> Option<&mut Directory> {
        self.dir.as_mut()
    }

    /// Runs every line of `input`, writing replies to `out`, then closes
    /// the store.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<()> {
        for line in input.lines() {
            let line = line?;
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            self.execute(line, out)?;
        }
        out.flush()?;
        self.close()
    }

    /// Executes one line.
    ///
    /// Missing keys, rejected arguments and a full directory are reported on
    /// `out` and the session carries on. I/O failures, damaged pages and
    /// configuration errors are returned.
    pub fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> Result<()> {
        let Some(command) = Command::parse(line) else {
            debug!(line, "cli.bad_command");
            writeln!(out, "{BAD_COMMAND}")?;
            return Ok(());
        };
        let result = match command {
            Command::New { path, page_size } => self.create(path, page_size),
            Command::Stats => {
                writeln!(out, "{RULE}")?;
                writeln!(out, "{}", self.metrics.snapshot())?;
                Ok(())
            }
            Command::Noop => Ok(()),
            command => {
                let payload = match command {
                    Command::Add { payload: None, .. } => Some(self.generate_payload()),
                    _ => None,
                };
                let Some(dir) = self.dir.as_mut() else {
                    writeln!(out, "{NO_STORE}")?;
                    return Ok(());
                };
                apply(dir, self.hasher.as_ref(), command, payload, out)
            }
        };
        match result {
            Err(err) if is_reportable(&err) => {
                warn!(line, error = %err, "cli.command_failed");
                writeln!(out, "{err}")?;
                Ok(())
            }
            other => other,
        }
    }

    /// Closes the open store, if any.
    pub fn close(&mut self) -> Result<()> {
        match self.dir.take() {
            Some(dir) => dir.close(),
            None => Ok(()),
        }
    }

    fn create(&mut self, path: PathBuf, page_size: usize) -> Result<()> {
        if self.dir.is_some() {
            warn!(path = %path.display(), "cli.replacing_open_store");
            self.close()?;
        }
        let options = self.options.clone().page_size(page_size).truncate(true);
        let metrics: Arc<dyn IoMetrics> = self.metrics.clone();
        let dir = Directory::open_with(path, options, self.hasher.clone(), metrics)?;
        self.dir = Some(dir);
        Ok(())
    }

    /// Three coefficients of a quadratic with two distinct real roots.
    fn generate_payload(&mut self) -> [i32; 3] {
        loop {
            let [a, b, c] = [(); 3].map(|_| self.rng.gen_range(PAYLOAD_RANGE));
            let (a64, b64, c64) = (i64::from(a), i64::from(b), i64::from(c));
            if b64 * b64 - 4 * a64 * c64 > 0 {
                return [a, b, c];
            }
        }
    }
}

/// Errors a session reports and survives.
fn is_reportable(err: &StoreError) -> bool {
    err.is_not_found()
        || matches!(
            err,
            StoreError::InvalidArgument(_) | StoreError::DirectoryFull { .. }
        )
}

fn apply<W: Write>(
    dir: &mut Directory,
    hasher: &dyn KeyHash,
    command: Command,
    generated: Option<[i32; 3]>,
    out: &mut W,
) -> Result<()> {
    match command {
        Command::Add { key, payload } => {
            let [a, b, c] = payload.or(generated).unwrap_or_default();
            if dir.add(Record::new(key, a, b, c))? == AddOutcome::Duplicate {
                writeln!(out, "{DUPLICATE}")?;
            }
        }
        Command::Update(record) => dir.update(record)?,
        Command::Remove(key) => {
            dir.remove(key)?;
        }
        Command::Get(key) => writeln!(out, "{}", RecordDump::new(dir.get(key)?, hasher))?,
        Command::PrintDirectory => write!(out, "{}", dir.dump_directory())?,
        Command::PrintFile => write!(out, "{}", dir.dump_file()?)?,
        Command::New { .. } | Command::Stats | Command::Noop => {}
    }
    Ok(())
}
