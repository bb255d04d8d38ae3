//! # Command line options

use std::ffi::OsString;

use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};

use crate::check::{DeviceId, Value};
use crate::sysfs::FreqField;
use crate::HelperE;

/// Cli flags
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, args_override_self = true)]
pub struct Cli {
    /// Toggle CPU state for CPU N (e.g. cpu3)
    #[arg(short, long, value_name = "N", action = ArgAction::Append)]
    pub cpu: Vec<DeviceId>,

    /// Select GPU N (e.g. card0)
    #[arg(short, long, value_name = "N")]
    pub gpu: Option<DeviceId>,

    /// Set minimum GPU clock to N MHz (requires -g)
    #[arg(short = 'l', long, value_name = "N")]
    pub min: Option<Value>,

    /// Set maximum GPU clock to N MHz (requires -g)
    #[arg(short = 'u', long, value_name = "N")]
    pub max: Option<Value>,

    /// Set boost GPU clock to N MHz (requires -g)
    #[arg(short = 's', long, value_name = "N")]
    pub bst: Option<Value>,

    /// Set backlight brightness to N
    #[arg(short, long, value_name = "N", action = ArgAction::Append)]
    pub brightness: Vec<Value>,

    /// Trace every file operation on stderr
    #[arg(short, long)]
    pub debug: bool,
}

/// Applied right away, in the order they were given
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Immediate {
    ToggleCpu(DeviceId),
    Brightness(Value),
}

/// Clock writes for one GPU, applied after all immediate actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreqPlan {
    pub gpu: DeviceId,
    pub min: Option<Value>,
    pub max: Option<Value>,
    pub bst: Option<Value>,
}

impl FreqPlan {
    /// Staged writes, min then max then boost
    pub fn writes(&self) -> impl Iterator<Item = (FreqField, &Value)> {
        [
            (FreqField::Min, &self.min),
            (FreqField::Max, &self.max),
            (FreqField::Boost, &self.bst),
        ]
        .into_iter()
        .filter_map(|(f, v)| v.as_ref().map(|v| (f, v)))
    }
}

/// Everything one invocation is going to do, fully validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub immediate: Vec<Immediate>,
    pub freq: Option<FreqPlan>,
    pub debug: bool,
}

impl Plan {
    fn new(cli: Cli, m: &ArgMatches) -> Result<Self, HelperE> {
        // clap keeps each flag's values apart, the indices put them back in command line order
        let mut ordered: Vec<(usize, Immediate)> = indices(m, "cpu")
            .zip(cli.cpu.into_iter().map(Immediate::ToggleCpu))
            .chain(indices(m, "brightness").zip(cli.brightness.into_iter().map(Immediate::Brightness)))
            .collect();
        ordered.sort_by_key(|(i, _)| *i);

        let freq = if cli.min.is_some() || cli.max.is_some() || cli.bst.is_some() {
            let gpu = cli.gpu.ok_or(HelperE::MissingGpu)?;
            Some(FreqPlan { gpu, min: cli.min, max: cli.max, bst: cli.bst })
        } else {
            None
        };

        Ok(Self {
            immediate: ordered.into_iter().map(|(_, a)| a).collect(),
            freq,
            debug: cli.debug,
        })
    }
}

fn indices<'a>(m: &'a ArgMatches, id: &str) -> impl Iterator<Item = usize> + 'a {
    m.indices_of(id).into_iter().flatten()
}

/// Parse cli flags with clap
pub fn parse_from<I, T>(itr: I) -> Result<Plan, HelperE>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let m = Cli::command().try_get_matches_from(itr)?;
    let cli = Cli::from_arg_matches(&m)?;
    Plan::new(cli, &m)
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;

    fn plan(args: &[&str]) -> Result<Plan, HelperE> {
        parse_from(std::iter::once("intel-power-control-helper").chain(args.iter().copied()))
    }

    fn id(s: &str) -> DeviceId {
        s.parse().expect("valid id")
    }

    fn val(s: &str) -> Value {
        s.parse().expect("valid value")
    }

    fn usage_kind(r: Result<Plan, HelperE>) -> ErrorKind {
        match r {
            Err(HelperE::Args(e)) => e.kind(),
            other => panic!("expected a clap error, got {other:?}"),
        }
    }

    #[test]
    fn cli_is_sane() {
        Cli::command().debug_assert();
    }

    #[test]
    fn nothing_to_do() {
        let p = plan(&[]).expect("no flags is fine");
        assert!(p.immediate.is_empty());
        assert_eq!(p.freq, None);
        assert!(!p.debug);
    }

    #[test]
    fn help_and_version() {
        assert_eq!(usage_kind(plan(&["--help"])), ErrorKind::DisplayHelp);
        assert_eq!(usage_kind(plan(&["-h"])), ErrorKind::DisplayHelp);
        // help wins even when there is work after it
        assert_eq!(usage_kind(plan(&["-h", "--cpu", "cpu1"])), ErrorKind::DisplayHelp);
        assert_eq!(usage_kind(plan(&["--version"])), ErrorKind::DisplayVersion);
    }

    #[test]
    fn gpu_freqs() {
        let p = plan(&["--gpu", "card0", "--min", "100"]).expect("valid");
        let f = p.freq.expect("freq staged");
        assert_eq!(f.gpu, id("card0"));
        assert_eq!(f.writes().collect::<Vec<_>>(), vec![(FreqField::Min, &val("100"))]);
    }

    #[test]
    fn short_flags() {
        let p = plan(&["-s", "1100", "-g", "card1", "-u", "1000", "-l", "300"]).expect("valid");
        let f = p.freq.expect("freq staged");
        assert_eq!(f.gpu, id("card1"));
        let fields: Vec<_> = f.writes().map(|(f, v)| (f, v.to_string())).collect();
        assert_eq!(
            fields,
            vec![
                (FreqField::Min, "300".to_owned()),
                (FreqField::Max, "1000".to_owned()),
                (FreqField::Boost, "1100".to_owned()),
            ]
        );
    }

    #[test]
    fn freq_without_gpu() {
        for flag in ["--min", "--max", "--bst", "-l", "-u", "-s"] {
            assert!(matches!(plan(&[flag, "100"]), Err(HelperE::MissingGpu)), "{flag}");
        }
        // an immediate action in the same call does not change that
        assert!(matches!(plan(&["-b", "5", "-l", "100"]), Err(HelperE::MissingGpu)));
    }

    #[test]
    fn gpu_alone_stages_nothing() {
        assert_eq!(plan(&["-g", "card0"]).expect("valid").freq, None);
    }

    #[test]
    fn immediate_order() {
        let p = plan(&["-b", "10", "-c", "cpu1", "--brightness", "20", "--cpu", "cpu2"]).expect("valid");
        assert_eq!(
            p.immediate,
            vec![
                Immediate::Brightness(val("10")),
                Immediate::ToggleCpu(id("cpu1")),
                Immediate::Brightness(val("20")),
                Immediate::ToggleCpu(id("cpu2")),
            ]
        );
    }

    #[test]
    fn last_one_wins() {
        let p = plan(&["-g", "card0", "-g", "card1", "-l", "100", "-l", "200"]).expect("valid");
        let f = p.freq.expect("freq staged");
        assert_eq!(f.gpu, id("card1"));
        assert_eq!(f.min, Some(val("200")));
    }

    #[test]
    fn bad_values() {
        for args in [
            ["--cpu", "../cpu0"],
            ["--gpu", "card0/x"],
            ["--min", "1a"],
            ["--max=-5", "-d"],
            ["--bst", "fast"],
            ["--brightness", "50%"],
            ["--cpu", "cpu0000000000"],
        ] {
            assert_eq!(usage_kind(plan(&args)), ErrorKind::ValueValidation, "{args:?}");
        }
    }

    #[test]
    fn diagnostic_names_flag_and_value() {
        let Err(e) = plan(&["--min", "12x"]) else { panic!("accepted 12x") };
        let msg = e.to_string();
        assert!(msg.contains("--min"), "{msg}");
        assert!(msg.contains("12x"), "{msg}");
    }

    #[test]
    fn unknown_or_incomplete() {
        assert_eq!(usage_kind(plan(&["--turbo"])), ErrorKind::UnknownArgument);
        assert_eq!(usage_kind(plan(&["--cpu"])), ErrorKind::InvalidValue);
    }

    #[test]
    fn debug_flag() {
        assert!(plan(&["-d"]).expect("valid").debug);
    }
}
