//! Argument construction and synchronous invocation of the NullAway Annotator.
//!
//! The annotator re-runs the project's build with the patched POM and reads
//! the files named in the manifest. Only the argument contract lives here;
//! what the annotator does with them is its own business.

use crate::config::PatcherConfig;
use crate::scratch::ScratchDir;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::info;

/// Checker name passed with `-cn`.
pub const CHECKER_NAME: &str = "NULLAWAY";

#[derive(Error, Debug)]
pub enum InvokeError {
    #[error("annotator command is empty")]
    EmptyCommand,

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {}", describe_exit(.code))]
    Exit { program: String, code: Option<i32> },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// Everything the annotator needs to know about one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatorInvocation {
    pub output_dir: PathBuf,
    pub manifest: PathBuf,
    pub initializer: String,
    pub build_command: String,
    pub redirect_build_output: bool,
}

impl AnnotatorInvocation {
    pub fn new(config: &PatcherConfig, scratch: &ScratchDir, basedir: &Path) -> Self {
        Self {
            output_dir: scratch.annotator_dir().to_path_buf(),
            manifest: scratch.manifest_path(),
            initializer: config.annotator.initializer.clone(),
            build_command: build_command(basedir, &config.annotator.build_command),
            redirect_build_output: config.annotator.redirect_build_output,
        }
    }

    /// `-d <dir> -cp <manifest> -i <initializer> --build-command <cmd> -cn NULLAWAY [-rboserr]`
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-d".to_string(),
            self.output_dir.display().to_string(),
            "-cp".to_string(),
            self.manifest.display().to_string(),
            "-i".to_string(),
            self.initializer.clone(),
            "--build-command".to_string(),
            self.build_command.clone(),
            "-cn".to_string(),
            CHECKER_NAME.to_string(),
        ];
        if self.redirect_build_output {
            args.push("-rboserr".to_string());
        }
        args
    }
}

/// `cd <basedir> && <build>`, with the directory quoted for `sh`.
pub fn build_command(basedir: &Path, build: &str) -> String {
    format!("cd {} && {}", shell_quote(&basedir.display().to_string()), build)
}

/// Quote `word` for a POSIX shell unless it is made only of safe characters.
pub fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word.chars().all(|ch| {
            ch.is_ascii_alphanumeric()
                || matches!(ch, '/' | '.' | '_' | '-' | '+' | ':' | '=' | '@' | ',' | '%')
        });
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Runs the annotator with a prepared argument list, blocking until it exits.
pub trait AnnotatorRunner {
    fn run(&self, args: &[String]) -> Result<(), InvokeError>;
}

/// Runs the annotator as a child process (`java -jar annotator-core.jar ...`).
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: String,
    base_args: Vec<String>,
}

impl ProcessRunner {
    pub fn new(command: &[String]) -> Result<Self, InvokeError> {
        let (program, base_args) = command.split_first().ok_or(InvokeError::EmptyCommand)?;
        Ok(Self {
            program: program.clone(),
            base_args: base_args.to_vec(),
        })
    }
}

impl AnnotatorRunner for ProcessRunner {
    fn run(&self, args: &[String]) -> Result<(), InvokeError> {
        info!(program = %self.program, ?args, "starting annotator");

        let status = Command::new(&self.program)
            .args(&self.base_args)
            .args(args)
            .status()
            .map_err(|source| InvokeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(InvokeError::Exit {
                program: self.program.clone(),
                code: status.code(),
            });
        }

        info!("annotator finished");
        Ok(())
    }
}
