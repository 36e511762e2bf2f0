use std::fmt;
use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, Command, Stdio};
use tracing::debug;

use crate::error::{KioskError, KioskResult};

/// How a decoder process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Code(i32),
    /// Terminated by a signal (including our own kill).
    Signal,
}

impl Exit {
    /// Code 0 and signal deaths end supervision; anything else is a crash.
    pub fn is_clean(self) -> bool {
        matches!(self, Exit::Code(0) | Exit::Signal)
    }
}

impl fmt::Display for Exit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exit::Code(code) => write!(f, "exit code {code}"),
            Exit::Signal => f.write_str("signal"),
        }
    }
}

/// Exit-status side of a running decoder.
pub trait DecoderChild: Send {
    /// Non-blocking exit check.
    fn poll_exit(&mut self) -> io::Result<Option<Exit>>;
    fn terminate(&mut self) -> io::Result<()>;
}

/// Pipes and handle of one decoder lifetime.
pub struct DecoderPipes {
    pub stdin: Box<dyn Write + Send>,
    pub stdout: Box<dyn BufRead + Send>,
    pub child: Box<dyn DecoderChild>,
}

pub trait ProcessHost {
    fn spawn(&mut self) -> KioskResult<DecoderPipes>;
}

impl DecoderChild for Child {
    fn poll_exit(&mut self) -> io::Result<Option<Exit>> {
        Ok(self.try_wait()?.map(|status| match status.code() {
            Some(code) => Exit::Code(code),
            None => Exit::Signal,
        }))
    }

    fn terminate(&mut self) -> io::Result<()> {
        self.kill()?;
        self.wait().map(|_| ())
    }
}

/// Spawns the decoder as a child process with piped stdin/stdout.
#[derive(Debug, Clone)]
pub struct CommandHost {
    program: String,
    args: Vec<String>,
}

impl CommandHost {
    pub fn new(command: &[String]) -> KioskResult<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| KioskError::config("decoder command is empty"))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl ProcessHost for CommandHost {
    fn spawn(&mut self) -> KioskResult<DecoderPipes> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                KioskError::decoder(format!("failed to spawn {} (is it installed and on PATH?): {e}", self.program))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| KioskError::decoder("failed to open decoder stdin (unexpected)"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| KioskError::decoder("failed to open decoder stdout (unexpected)"))?;

        debug!("Spawned {} (pid {})", self.program, child.id());
        Ok(DecoderPipes {
            stdin: Box::new(stdin),
            stdout: Box::new(BufReader::new(stdout)),
            child: Box::new(child),
        })
    }
}
