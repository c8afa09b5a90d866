//! Command-line interface handling for the goban host.
//!
//! Uses `clap` to parse overrides for the configuration file.

use clap::{value_parser, Arg, ArgMatches, Command};
use std::path::PathBuf;

/// Command line arguments parsed from user input.
///
/// Every option except the config path overrides a value from the
/// configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    /// Optional override for the match inactivity timeout, in seconds
    pub match_timeout_secs: Option<u64>,
    /// Optional override for the sweep interval, in seconds
    pub sweep_interval_secs: Option<u64>,
}

fn command() -> Command {
    Command::new("goban")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Live Go match host")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("goban.toml"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .help("Output logs in JSON format")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("match-timeout")
                .long("match-timeout")
                .value_name("SECONDS")
                .help("Remove matches idle for longer than this")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("sweep-interval")
                .long("sweep-interval")
                .value_name("SECONDS")
                .help("How often to look for idle matches")
                .value_parser(value_parser!(u64)),
        )
}

impl CliArgs {
    /// Parses the process arguments, exiting with usage on error.
    pub fn parse() -> Self {
        Self::try_parse_from(std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    /// Parses an explicit argument list.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Ok(Self::from_matches(&command().try_get_matches_from(args)?))
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("goban.toml")),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            match_timeout_secs: matches.get_one::<u64>("match-timeout").copied(),
            sweep_interval_secs: matches.get_one::<u64>("sweep-interval").copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = CliArgs::try_parse_from(["goban"]).unwrap();
        assert_eq!(args.config_path, PathBuf::from("goban.toml"));
        assert_eq!(args.log_level, None);
        assert!(!args.json_logs);
        assert_eq!(args.match_timeout_secs, None);
    }

    #[test]
    fn overrides() {
        let args = CliArgs::try_parse_from([
            "goban",
            "-c",
            "custom.toml",
            "--log-level",
            "debug",
            "--json-logs",
            "--match-timeout",
            "120",
            "--sweep-interval",
            "10",
        ])
        .unwrap();
        assert_eq!(args.config_path, PathBuf::from("custom.toml"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.json_logs);
        assert_eq!(args.match_timeout_secs, Some(120));
        assert_eq!(args.sweep_interval_secs, Some(10));
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        assert!(CliArgs::try_parse_from(["goban", "--match-timeout", "soon"]).is_err());
    }
}
