use super::{Task, TaskError};
use crate::watch::ConfigurationError;
use anyhow::{Context, anyhow};
use std::convert::Infallible;
use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::str::FromStr;
use tracing::debug;

/// Where one output stream of the child process goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Our own stdout (`@STDOUT`)
    Stdout,
    /// Our own stderr (`@STDERR`)
    Stderr,
    /// Captured and only shown if the command fails (`@NULL`)
    Null,
    /// A file, truncated first
    File(PathBuf),
}

impl FromStr for OutputTarget {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "@STDOUT" => Self::Stdout,
            "@STDERR" => Self::Stderr,
            "@NULL" => Self::Null,
            path => Self::File(PathBuf::from(path)),
        })
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("@STDOUT"),
            Self::Stderr => f.write_str("@STDERR"),
            Self::Null => f.write_str("@NULL"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl OutputTarget {
    fn open(&self) -> anyhow::Result<Stdio> {
        Ok(match self {
            Self::Stdout => Stdio::from(io::stdout()),
            Self::Stderr => Stdio::from(io::stderr()),
            Self::Null => Stdio::piped(),
            Self::File(path) => Stdio::from(
                File::create(path)
                    .with_context(|| format!("Failed to open output file: {}", path.display()))?,
            ),
        })
    }

    /// Text the stream produced, when it went somewhere we can read back.
    fn captured(&self, piped: &[u8]) -> String {
        match self {
            Self::Null => String::from_utf8_lossy(piped).into_owned(),
            Self::File(path) => fs::read(path)
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .unwrap_or_default(),
            Self::Stdout | Self::Stderr => String::new(),
        }
    }
}

/// Runs an arbitrary command and fails if it exits non-zero.
///
/// Arguments come as one comma-separated string in which `:` stands for `-`,
/// so `:v,:n,3` runs `cmd -v -n 3`.
#[derive(Debug, Clone)]
pub struct RawCommand {
    pub cmd: String,
    pub args: String,
    pub stdout: OutputTarget,
    pub stderr: OutputTarget,
    /// Run the joined command line through `sh -c`
    pub shell: bool,
}

impl RawCommand {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            args: String::new(),
            stdout: OutputTarget::Stdout,
            stderr: OutputTarget::Stderr,
            shell: false,
        }
    }

    /// The command followed by its decoded arguments.
    fn argv(&self) -> Vec<String> {
        std::iter::once(self.cmd.clone())
            .chain(
                self.args
                    .split(',')
                    .filter(|item| !item.is_empty())
                    .map(|item| item.replace(':', "-")),
            )
            .collect()
    }

    fn build(&self, argv: &[String]) -> Command {
        if self.shell {
            let mut command = Command::new("sh");
            command.arg("-c").arg(argv.join(" "));
            command
        } else {
            let mut command = Command::new(&argv[0]);
            command.args(&argv[1..]);
            command
        }
    }
}

impl Task for RawCommand {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn execute(&self) -> Result<String, TaskError> {
        if self.cmd.trim().is_empty() {
            return Err(anyhow::Error::new(ConfigurationError::Invalid(
                "No value provided for --cmd".to_string(),
            ))
            .into());
        }

        let argv = self.argv();
        let line = argv.join(" ");
        let output = self
            .build(&argv)
            .stdin(Stdio::null())
            .stdout(self.stdout.open()?)
            .stderr(self.stderr.open()?)
            .output()
            .with_context(|| format!("Failed to run {line}"))?;

        debug!(command = %line, status = %output.status, "command finished");

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map_or_else(|| "(killed by signal)".to_string(), |c| c.to_string());
            return Err(anyhow!(
                "Bad return code {code} from {line}:\n{}\n{}",
                self.stdout.captured(&output.stdout),
                self.stderr.captured(&output.stderr)
            )
            .into());
        }

        Ok(format!("Command succeeded: {line}"))
    }
}
