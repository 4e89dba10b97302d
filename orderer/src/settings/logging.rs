//! Log settings of the node: the `log` section of the configuration file
//! merged with the `--log-*` command line flags, the latter winning.

use lazy_static::lazy_static;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use std::{
    fmt::{self, Display},
    fs, io,
    path::PathBuf,
    str::FromStr,
};
use structopt::StructOpt;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::util::TryInitError;

const DEFAULT_FILTER_LEVEL: LevelFilter = LevelFilter::INFO;
const DEFAULT_LOG_FORMAT: LogFormat = LogFormat::Default;
const DEFAULT_LOG_OUTPUT: LogOutput = LogOutput::Stderr;

lazy_static! {
    static ref LOG_FILTER_LEVEL_POSSIBLE_VALUES: Vec<&'static str> = {
        [
            LevelFilter::OFF,
            LevelFilter::TRACE,
            LevelFilter::DEBUG,
            LevelFilter::INFO,
            LevelFilter::WARN,
            LevelFilter::ERROR,
        ]
        .iter()
        .map(|name| name.to_string().to_ascii_lowercase())
        .map(|name| &*Box::leak(name.into_boxed_str()))
        .collect()
    };
}

/// messages about overridden settings, to be logged once the logger is
/// installed
pub type LogInfoMsg = Option<Vec<String>>;

pub struct LogSettings {
    pub config: LogSettingsEntry,
    pub msgs: LogInfoMsg,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LogSettingsEntry {
    pub level: LevelFilter,
    pub format: LogFormat,
    pub output: LogOutput,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Default,
    Plain,
    Json,
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogFormat::Default => "default",
            LogFormat::Plain => "plain",
            LogFormat::Json => "json",
        };
        f.write_str(s)
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match &*s.trim().to_lowercase() {
            "plain" => Ok(LogFormat::Plain),
            "json" => Ok(LogFormat::Json),
            "default" => Ok(LogFormat::Default),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    Stderr,
    File(PathBuf),
}

impl FromStr for LogOutput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stdout" => Ok(LogOutput::Stdout),
            "stderr" => Ok(LogOutput::Stderr),
            other => Err(format!("unknown log output '{}'", other)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to open the log file `{}`", .path.to_string_lossy())]
    FileError {
        path: PathBuf,
        #[source]
        cause: io::Error,
    },
    #[error("failed to set global subscriber")]
    SetGlobalSubscriberError(#[source] TryInitError),
}

impl LogSettings {
    pub fn new(command_line: &CliSettings, file: Option<&FileSettings>) -> LogSettings {
        let mut config = LogSettingsEntry {
            level: DEFAULT_FILTER_LEVEL,
            format: DEFAULT_LOG_FORMAT,
            output: DEFAULT_LOG_OUTPUT,
        };
        let mut msgs = Vec::new();

        if let Some(file) = file {
            if let Some(level) = file.level {
                config.level = level;
            }
            if let Some(format) = file.format {
                config.format = format;
            }
            if let Some(output) = &file.output {
                config.output = output.clone();
            }
        }

        if let Some(output) = &command_line.log_output {
            if &config.output != output {
                msgs.push(format!(
                    "log output overriden from command line: {:?} replaced with {:?}",
                    config.output, output
                ));
            }
            config.output = output.clone();
        }
        if let Some(level) = command_line.log_level {
            if config.level != level {
                msgs.push(format!(
                    "log level overriden from command line: {:?} replaced with {:?}",
                    config.level, level
                ));
            }
            config.level = level;
        }
        if let Some(format) = command_line.log_format {
            if config.format != format {
                msgs.push(format!(
                    "log format overriden from command line: {:?} replaced with {:?}",
                    config.format, format
                ));
            }
            config.format = format;
        }

        LogSettings {
            config,
            msgs: if msgs.is_empty() { None } else { Some(msgs) },
        }
    }

    /// install the global subscriber. The returned guards flush the
    /// pending records when dropped and must be kept alive.
    pub fn init_log(self) -> Result<(Vec<WorkerGuard>, LogInfoMsg), Error> {
        let (writer, guard) = match &self.config.output {
            LogOutput::Stdout => tracing_appender::non_blocking(io::stdout()),
            LogOutput::Stderr => tracing_appender::non_blocking(io::stderr()),
            LogOutput::File(path) => {
                let file = fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|cause| Error::FileError {
                        path: path.clone(),
                        cause,
                    })?;
                tracing_appender::non_blocking(file)
            }
        };

        init_subscriber(self.config.level, self.config.format, writer)?;

        Ok((vec![guard], self.msgs))
    }
}

fn init_subscriber(level: LevelFilter, format: LogFormat, writer: NonBlocking) -> Result<(), Error> {
    use tracing_subscriber::prelude::*;

    match format {
        LogFormat::Default | LogFormat::Plain => {
            let layer = tracing_subscriber::fmt::Layer::new()
                .with_level(true)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(level)
                .with(layer)
                .try_init()
        }
        LogFormat::Json => {
            let layer = tracing_subscriber::fmt::Layer::new()
                .json()
                .with_level(true)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(level)
                .with(layer)
                .try_init()
        }
    }
    .map_err(Error::SetGlobalSubscriberError)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileSettings {
    #[serde(default, with = "filter_level_opt_serde")]
    pub level: Option<LevelFilter>,
    pub format: Option<LogFormat>,
    pub output: Option<LogOutput>,
}

mod filter_level_opt_serde {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<LevelFilter>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|variant| {
                variant.parse().map_err(|_| {
                    D::Error::unknown_variant(&variant, &**LOG_FILTER_LEVEL_POSSIBLE_VALUES)
                })
            })
            .transpose()
    }

    pub fn serialize<S: Serializer>(
        data: &Option<LevelFilter>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        data.map(|level| level.to_string()).serialize(serializer)
    }
}

fn log_level_parse(level: &str) -> Result<LevelFilter, String> {
    level
        .parse()
        .map_err(|_| format!("Unknown log level value: '{}'", level))
}

#[derive(Debug, Default, StructOpt)]
pub struct CliSettings {
    /// Set log messages minimum severity. If not configured anywhere, defaults to "info".
    #[structopt(
        long = "log-level",
        parse(try_from_str = log_level_parse),
        possible_values = &LOG_FILTER_LEVEL_POSSIBLE_VALUES
    )]
    pub log_level: Option<LevelFilter>,

    /// Set format of the log emitted. Can be "default", "plain" or "json".
    #[structopt(long = "log-format", parse(try_from_str))]
    pub log_format: Option<LogFormat>,

    /// Set the output of the log emitted. Can be "stdout" or "stderr".
    /// Log files are configured in the configuration file. If not
    /// configured anywhere, defaults to "stderr".
    #[structopt(long = "log-output", parse(try_from_str))]
    pub log_output: Option<LogOutput>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_has_priority() {
        let cli = CliSettings::from_iter(vec![
            "orderer",
            "--log-level",
            &LevelFilter::TRACE.to_string(),
        ]);

        let file: FileSettings = serde_yaml::from_str(
            r#"
            level: warn
            output:
                file:
                    orderer.log
            "#,
        )
        .unwrap();

        let settings = LogSettings::new(&cli, Some(&file));

        assert_eq!(settings.config.level, LevelFilter::TRACE);
        assert_eq!(settings.config.output, LogOutput::File("orderer.log".into()));
        assert_eq!(settings.config.format, DEFAULT_LOG_FORMAT);
        assert_eq!(settings.msgs.map(|msgs| msgs.len()), Some(1));
    }

    #[test]
    fn defaults_without_settings() {
        let settings = LogSettings::new(&CliSettings::default(), None);

        assert_eq!(
            settings.config,
            LogSettingsEntry {
                level: DEFAULT_FILTER_LEVEL,
                format: DEFAULT_LOG_FORMAT,
                output: DEFAULT_LOG_OUTPUT,
            }
        );
        assert!(settings.msgs.is_none());
    }

    #[test]
    fn rejects_unknown_level() {
        let file: Result<FileSettings, _> = serde_yaml::from_str("level: loud");
        assert!(file.is_err());
    }
}
