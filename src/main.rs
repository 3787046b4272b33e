//! gammon -- a backgammon move evaluator speaking JSON lines.
//!
//! Reads one evaluation request per line from stdin and writes one JSON
//! response per line to stdout. Diagnostics go to stderr.
//!
//! Usage:
//!   gammon [OPTIONS] < requests.jsonl
//!
//! Options:
//!   --threads N       Worker threads (default: available parallelism)
//!   --cache N         Heuristic cache entries, 0 to disable (default: 65536)
//!   --max-plies N     Plies per rollout trial (default: 64)
//!   --deadline-ms MS  Rollout budget for requests without one (default: none)
//!   --seed N          Rollout seed for requests without one (default: entropy)
//!   --log-level L     off, error, warn, info, debug or trace (default: warn)

use std::env;
use std::io::{self, BufRead, Write};
use std::process;
use std::str::FromStr;
use std::time::Duration;

use log::{LevelFilter, Log, Metadata, Record};

use gammon::engine::{Engine, EngineConfig};

/// Writes log records to stderr; stdout carries responses only.
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn print_usage() {
    eprintln!("Usage: gammon [--threads N] [--cache N] [--max-plies N] [--deadline-ms MS] [--seed N] [--log-level L]");
}

/// Parses the value following a flag, exiting with usage on failure.
fn flag_value<T: FromStr>(args: &[String], i: usize, flag: &str) -> T {
    match args.get(i).map(|s| s.parse::<T>()) {
        Some(Ok(v)) => v,
        _ => {
            eprintln!("invalid {} value", flag);
            print_usage();
            process::exit(2);
        }
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let mut config = EngineConfig::default();
    let mut level = LevelFilter::Warn;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--threads" => {
                i += 1;
                config.threads = flag_value(&args, i, "--threads");
            }
            "--cache" => {
                i += 1;
                config.cache_capacity = flag_value(&args, i, "--cache");
            }
            "--max-plies" => {
                i += 1;
                config.max_plies = flag_value(&args, i, "--max-plies");
            }
            "--deadline-ms" => {
                i += 1;
                let ms: u64 = flag_value(&args, i, "--deadline-ms");
                config.default_deadline = Some(Duration::from_millis(ms));
            }
            "--seed" => {
                i += 1;
                config.seed = Some(flag_value(&args, i, "--seed"));
            }
            "--log-level" => {
                i += 1;
                level = flag_value(&args, i, "--log-level");
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage();
                process::exit(2);
            }
        }
        i += 1;
    }

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }

    let engine = match Engine::new(config) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    let mut input = stdin.lock();
    let mut line = Vec::new();
    let mut status = 0;
    loop {
        line.clear();
        match input.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                eprintln!("stdin read failed: {}", e);
                status = 1;
                break;
            }
        }
        if let Err(e) = engine.handle_bytes(&line, &mut out) {
            eprintln!("write failed: {}", e);
            status = 1;
            break;
        }
    }
    let _ = out.flush();
    if status != 0 {
        process::exit(status);
    }
}
