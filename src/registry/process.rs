//! Registry backed by a Google Test executable.
//!
//! Every call spawns the binary once: `--gtest_list_tests` for enumeration, `--gtest_filter=EXPR` for execution.
//! Separate processes mean one crashing run cannot corrupt the state of the next.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output, Stdio};

use gtest_syntax::Filter;

use super::{ExecuteOptions, NativeTestRegistry, RegistryError, RegistryRun, RunStatus};

pub const LIST_TESTS_FLAG: &str = "--gtest_list_tests";
pub const FILTER_FLAG: &str = "--gtest_filter=";
pub const ALSO_RUN_DISABLED_FLAG: &str = "--gtest_also_run_disabled_tests";
const NO_COLOR_FLAG: &str = "--gtest_color=no";

/// gtest creates this file when a run starts and deletes it when the run finishes normally.
pub const PREMATURE_EXIT_ENV: &str = "TEST_PREMATURE_EXIT_FILE";
const PREMATURE_EXIT_FILE_NAME: &str = "premature_exit";
const SCRATCH_PREFIX: &str = "gtest-bridge-";

/// How to invoke the test binary.
#[derive(Debug, Clone)]
pub struct ProcessRegistryConfig {
    /// Path to the test executable (or a bare name resolved through `PATH`)
    pub program: PathBuf,
    /// Arguments passed before the gtest flags
    pub args: Vec<OsString>,
    /// Extra environment variables
    pub env: Vec<(OsString, OsString)>,
    /// Working directory for the binary; inherits the caller's when unset
    pub working_dir: Option<PathBuf>,
    /// Where per-run scratch directories are created; the system temp dir when unset
    pub scratch_root: Option<PathBuf>,
    /// Let gtest colorize its output
    pub color: bool,
}

impl ProcessRegistryConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            working_dir: None,
            scratch_root: None,
            color: false,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_scratch_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(dir.into());
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}

/// Spawns the configured test binary for each enumeration or execution.
#[derive(Debug, Clone)]
pub struct ProcessRegistry {
    config: ProcessRegistryConfig,
}

impl ProcessRegistry {
    /// Wrap a configuration without checking that the binary exists.
    pub fn new(config: ProcessRegistryConfig) -> Self {
        Self { config }
    }

    /// Acquire the registry, failing early when an explicit program path does not point at a file.
    ///
    /// Bare program names are resolved through `PATH` at spawn time and are not checked here.
    pub fn open(config: ProcessRegistryConfig) -> Result<Self, RegistryError> {
        let program = &config.program;
        let is_path = program.components().count() > 1 || program.is_absolute();
        if is_path && !program.is_file() {
            return Err(RegistryError::Unavailable {
                location: program.display().to_string(),
                reason: "no such file".to_string(),
            });
        }
        if let Some(dir) = &config.working_dir {
            if !dir.is_dir() {
                return Err(RegistryError::Unavailable {
                    location: program.display().to_string(),
                    reason: format!("working directory `{}` does not exist", dir.display()),
                });
            }
        }
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &ProcessRegistryConfig {
        &self.config
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args);
        if !self.config.color {
            cmd.arg(NO_COLOR_FLAG);
        }
        for (key, value) in &self.config.env {
            cmd.env(key, value);
        }
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null());
        cmd
    }

    fn spawn(&self, cmd: &mut Command) -> Result<Output, RegistryError> {
        tracing::debug!(command = ?cmd, "spawning native test registry");
        cmd.output().map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                RegistryError::Unavailable {
                    location: self.location(),
                    reason: source.to_string(),
                }
            } else {
                RegistryError::Spawn {
                    location: self.location(),
                    source,
                }
            }
        })
    }

    fn scratch_dir(&self) -> io::Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_PREFIX);
        match &self.config.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
    }
}

impl NativeTestRegistry for ProcessRegistry {
    fn location(&self) -> String {
        self.config.program.display().to_string()
    }

    #[tracing::instrument(skip_all, fields(program = %self.config.program.display()))]
    fn enumerate(&self) -> Result<RegistryRun, RegistryError> {
        let mut cmd = self.command();
        cmd.arg(LIST_TESTS_FLAG);
        let output = self.spawn(&mut cmd)?;
        let status = classify(output.status, false);
        // The listing is stdout only; stderr is kept for diagnosing a failed enumeration.
        let output = if status.is_success() {
            if !output.stderr.is_empty() {
                tracing::debug!(stderr = %String::from_utf8_lossy(&output.stderr), "ignoring stderr from test listing");
            }
            String::from_utf8_lossy(&output.stdout).into_owned()
        } else {
            capture(&output)
        };
        Ok(RegistryRun { status, output })
    }

    #[tracing::instrument(skip_all, fields(program = %self.config.program.display(), filter = %filter))]
    fn execute(&self, filter: &Filter, options: &ExecuteOptions) -> Result<RegistryRun, RegistryError> {
        let scratch = self.scratch_dir()?;
        let marker = scratch.path().join(PREMATURE_EXIT_FILE_NAME);

        let mut cmd = self.command();
        cmd.arg(format!("{FILTER_FLAG}{}", filter.as_str()));
        if options.also_run_disabled {
            cmd.arg(ALSO_RUN_DISABLED_FLAG);
        }
        cmd.env(PREMATURE_EXIT_ENV, &marker);

        let output = self.spawn(&mut cmd)?;
        let premature = premature_exit(&marker);
        Ok(RegistryRun {
            status: classify(output.status, premature),
            output: capture(&output),
        })
    }
}

fn premature_exit(marker: &Path) -> bool {
    marker.exists()
}

/// Everything the binary printed: stdout, then stderr when non-empty.
fn capture(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    if !output.stderr.is_empty() {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&String::from_utf8_lossy(&output.stderr));
    }
    text
}

/// gtest exits 0 when every selected test passed and 1 when any failed. Anything else is abnormal.
fn classify(status: ExitStatus, premature_exit: bool) -> RunStatus {
    if let Some(signal) = terminating_signal(&status) {
        return RunStatus::Aborted(format!("terminated by signal {signal} ({})", signal_name(signal)));
    }
    match status.code() {
        Some(code) if premature_exit => {
            RunStatus::Aborted(format!("exited prematurely with status {code} before the test run finished"))
        }
        Some(code @ (0 | 1)) => RunStatus::Exited(code),
        Some(code) => RunStatus::Aborted(format!("exited with unexpected status {code}")),
        None => RunStatus::Aborted("terminated without an exit status".to_string()),
    }
}

#[cfg(unix)]
fn terminating_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn terminating_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

fn signal_name(signal: i32) -> &'static str {
    match signal {
        2 => "SIGINT",
        4 => "SIGILL",
        6 => "SIGABRT",
        8 => "SIGFPE",
        9 => "SIGKILL",
        11 => "SIGSEGV",
        13 => "SIGPIPE",
        15 => "SIGTERM",
        _ => "unknown signal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builders() {
        let config = ProcessRegistryConfig::new("./unit_tests")
            .with_args(["--gtest_repeat=1"])
            .with_env("VK_ICD_FILENAMES", "/dev/null")
            .with_working_dir("/tmp")
            .with_color(true);
        assert_eq!(config.program, PathBuf::from("./unit_tests"));
        assert_eq!(config.args, vec![OsString::from("--gtest_repeat=1")]);
        assert_eq!(config.env.len(), 1);
        assert_eq!(config.working_dir, Some(PathBuf::from("/tmp")));
        assert!(config.color);
        assert!(config.scratch_root.is_none());
    }

    #[test]
    fn test_open_missing_binary_is_unavailable() {
        let err = ProcessRegistry::open(ProcessRegistryConfig::new("/definitely/not/here/unit_tests")).unwrap_err();
        assert!(matches!(err, RegistryError::Unavailable { .. }));
        assert!(err.to_string().contains("/definitely/not/here/unit_tests"));
    }

    #[test]
    fn test_open_bare_name_is_deferred() {
        assert!(ProcessRegistry::open(ProcessRegistryConfig::new("unit_tests")).is_ok());
    }

    #[test]
    fn test_signal_names() {
        assert_eq!(signal_name(11), "SIGSEGV");
        assert_eq!(signal_name(6), "SIGABRT");
        assert_eq!(signal_name(64), "unknown signal");
    }

    #[cfg(unix)]
    #[test]
    fn test_classify_exit_codes() {
        use std::os::unix::process::ExitStatusExt;

        // Raw wait statuses: exit code in the high byte, signal in the low bits.
        assert_eq!(classify(ExitStatus::from_raw(0), false), RunStatus::Exited(0));
        assert_eq!(classify(ExitStatus::from_raw(1 << 8), false), RunStatus::Exited(1));
        assert!(matches!(classify(ExitStatus::from_raw(3 << 8), false), RunStatus::Aborted(_)));
        assert!(matches!(classify(ExitStatus::from_raw(0), true), RunStatus::Aborted(_)));
        assert_eq!(
            classify(ExitStatus::from_raw(11), false),
            RunStatus::Aborted("terminated by signal 11 (SIGSEGV)".to_string())
        );
    }
}
