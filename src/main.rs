//! # `intel-power-control-helper`
//! Privileged backend for Intel power management frontends: toggles CPU cores,
//! sets GPU clock limits and backlight brightness by writing into `/sys`.
//!
//! Every flag is parsed and validated before anything is written. After that
//! `--cpu` and `--brightness` are applied in the order given, then the GPU clocks.
use std::ffi::OsString;
use std::io;
use std::process::{abort, ExitCode};

use nix::unistd::{geteuid, Uid};
use owo_colors::{OwoColorize, Stream, Style};
use thiserror::Error;
use tracing::{debug, Level};

mod args;
mod check;
mod config;
mod sysfs;

use args::{Immediate, Plan};
use config::Roots;

/// Used to separate generic error msgs from original ones, if any
static SP: &str = "\n    ";

static PREFIX: &str = "intel-power-control-helper:";

/// Errors types to match against in main()
#[derive(Debug, Error)]
pub enum HelperE {
    /// bad flags, bad values, or help/version output
    #[error("{0}")]
    Args(#[from] clap::Error),

    /// effective uid is not root
    #[error("insufficient privileges")]
    Privilege,

    /// one of --min, --max or --bst without a gpu to apply it to
    #[error("Required argument missing: -g/--gpu")]
    MissingGpu,

    /// 0: source error
    /// 1: path of the file
    #[error("Could not open '{1}':{SP}{0}")]
    Open(#[source] io::Error, String),

    /// 0: source error
    /// 1: path of the file
    #[error("Error while reading a file {1}:{SP}{0}")]
    Read(#[source] io::Error, String),

    /// zero bytes came back from a file that should hold the cpu state
    #[error("Could not read from '{0}'")]
    EmptyRead(String),

    /// the `online` file held something other than a digit
    #[error("Unexpected cpu state {0:?} in '{1}'")]
    BadState(char, String),

    /// 0: source error
    /// 1: path of the file
    #[error("Error while writing a file {1}:{SP}{0}")]
    Write(#[source] io::Error, String),

    #[error("Error writing {expected} bytes to '{path}', got {written}")]
    ShortWrite { path: String, expected: usize, written: usize },

    /// Failed to deserialize the toml config file
    #[error("Config file: Failed to deserialize, make sure toml types are correct:{SP}{0}")]
    Deser(#[from] toml::de::Error),
}

impl HelperE {
    /// Everything but a missing privilege aborts the process, the caller should never see a
    /// half applied command line go unnoticed.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, HelperE::Privilege)
    }
}

fn main() -> ExitCode {
    let Err(e) = try_main() else {
        return ExitCode::SUCCESS;
    };

    match e {
        // help and version
        HelperE::Args(e) if !e.use_stderr() => e.exit(),
        HelperE::Args(e) => {
            let _ = e.print();
            abort()
        }
        e => {
            eprintln!("{}", report(&e));
            if e.is_fatal() {
                abort()
            }
            ExitCode::FAILURE
        }
    }
}

/// Diagnostic line for stderr, the prefix is only coloured on a terminal
fn report(e: &HelperE) -> String {
    let prefix = PREFIX.if_supports_color(Stream::Stderr, |p| p.style(Style::new().bold().red()));
    format!("{prefix} {e}")
}

/// Fallible version of main
fn try_main() -> Result<(), HelperE> {
    let plan = prepare(geteuid(), std::env::args_os())?;
    init_logging(plan.debug);
    debug!(?plan, "parsed command line");

    let roots = config::parse_conf()?;
    run(&plan, &roots)
}

/// Privilege gate first, only root gets to find out what is wrong with its command line
fn prepare<I, T>(euid: Uid, itr: I) -> Result<Plan, HelperE>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    check_privileges(euid)?;
    args::parse_from(itr)
}

/// Only root can write the files under /sys this tool touches
fn check_privileges(euid: Uid) -> Result<(), HelperE> {
    if euid.is_root() {
        Ok(())
    } else {
        Err(HelperE::Privilege)
    }
}

fn init_logging(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Applies a validated plan, stops at the first failure
fn run(plan: &Plan, roots: &Roots) -> Result<(), HelperE> {
    for action in &plan.immediate {
        match action {
            Immediate::ToggleCpu(cpu) => {
                sysfs::toggle_cpu(roots, cpu)?;
            }
            Immediate::Brightness(val) => sysfs::set_brightness(roots, val)?,
        }
    }

    if let Some(freq) = &plan.freq {
        for (field, val) in freq.writes() {
            sysfs::set_mhz(roots, &freq.gpu, field, val)?;
        }
    }

    Ok(())
}
