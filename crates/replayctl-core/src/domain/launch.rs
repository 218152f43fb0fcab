//! Launch inputs and outputs for the replayer process.
//!
//! `LaunchRequest` is what the operator asks for, `LaunchOptions` is the
//! environment the replayer reads, and `LaunchCommand` is what actually gets
//! spawned. The supervisor treats the last two as opaque values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Prefix shared by every environment variable the replayer reads.
pub const ENV_PREFIX: &str = "REPLAYER_";

pub const ENV_MATCH_STRATEGY: &str = "REPLAYER_MATCH_STRATEGY";
pub const ENV_TRACE: &str = "REPLAYER_TRACE";
pub const ENV_DEBUGGER: &str = "REPLAYER_DEBUGGER";
pub const ENV_INBOUND_READ_TIMEOUT: &str = "REPLAYER_INBOUND_READ_TIMEOUT";
pub const ENV_GC_GLOBAL_STATUS_TIMEOUT: &str = "REPLAYER_GC_GLOBAL_STATUS_TIMEOUT";
pub const ENV_LOG_LEVEL: &str = "REPLAYER_LOG_LEVEL";
pub const ENV_LOG_FILE: &str = "REPLAYER_LOG_FILE";
pub const ENV_INBOUND_PORT: &str = "REPLAYER_INBOUND_PORT";
pub const ENV_OUTBOUND_PORT: &str = "REPLAYER_OUTBOUND_PORT";

/// Timeout handed to the replayer while a debugger is attached, so it does
/// not give up on a paused request.
pub const DEBUGGER_TIMEOUT: &str = "86400s";

/// How recorded traffic is matched against live requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    /// Similarity-based matching.
    #[default]
    Sim,
    /// Chunk-by-chunk matching.
    Chunk,
}

impl MatchStrategy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sim => "sim",
            Self::Chunk => "chunk",
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sim" => Ok(Self::Sim),
            "chunk" => Ok(Self::Chunk),
            other => Err(format!(
                "unknown match strategy '{other}', expected 'sim' or 'chunk'"
            )),
        }
    }
}

/// Operator output verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
    VeryVerbose,
    Debug,
}

impl Verbosity {
    /// Map `-q` and a `-v` occurrence count to a verbosity tier.
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            2 => Self::VeryVerbose,
            _ => Self::Debug,
        }
    }

    /// Log level the replayer itself runs at for this verbosity.
    pub const fn replayer_log_level(self) -> ReplayerLogLevel {
        match self {
            Self::Debug => ReplayerLogLevel::Trace,
            Self::VeryVerbose => ReplayerLogLevel::Debug,
            Self::Verbose => ReplayerLogLevel::Warn,
            Self::Normal | Self::Quiet => ReplayerLogLevel::Error,
        }
    }

    /// Default `tracing` filter directive for our own diagnostics.
    pub const fn tracing_directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::VeryVerbose => "debug",
            Self::Debug => "trace",
        }
    }
}

/// Log level understood by the replayer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplayerLogLevel {
    Trace,
    Debug,
    Warn,
    Error,
}

impl ReplayerLogLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    /// Trace output is too large for the console and goes to a file.
    pub const fn writes_to_file(self) -> bool {
        matches!(self, Self::Trace)
    }
}

impl fmt::Display for ReplayerLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator intent for one launch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchRequest {
    pub match_strategy: MatchStrategy,
    /// Generate function traces inside the replayed application.
    pub trace: bool,
    /// A debugger will be attached; timeouts must not fire.
    pub attach_debugger: bool,
    pub verbosity: Verbosity,
}

impl LaunchRequest {
    pub fn new(match_strategy: MatchStrategy) -> Self {
        Self {
            match_strategy,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    #[must_use]
    pub const fn with_debugger(mut self, attach: bool) -> Self {
        self.attach_debugger = attach;
        self
    }

    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }
}

/// Environment handed to the replayer, keyed by variable name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LaunchOptions(BTreeMap<String, String>);

impl LaunchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replayer log file, present only when trace logging is active.
    pub fn log_file(&self) -> Option<&str> {
        self.get(ENV_LOG_FILE)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LaunchOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Fully built spawn instruction: a shell command line plus environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchCommand {
    /// Line executed through `sh -c`.
    pub command: String,
    /// Variables added to the spawned process environment.
    pub env: BTreeMap<String, String>,
}

impl LaunchCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            env: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command)
    }
}
