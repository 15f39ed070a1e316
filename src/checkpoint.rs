//! What to do when a subject doesn't have exactly one of each input file
//!
//! Interactive runs stop and wait for the operator to acknowledge the warning. Unattended runs can
//! choose to skip quietly or to abort.

use std::fmt;
use std::io::{self, BufRead, Write};

use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use log::warn;

use crate::slurm::inputs::InputProblem;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum MissingInputPolicy {
    /// Warn and wait for Enter before skipping the subject
    Prompt,
    /// Warn and skip the subject without waiting
    Skip,
    /// Abort the run
    Fail,
}

impl fmt::Display for MissingInputPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MissingInputPolicy::Prompt => write!(f, "prompt"),
            MissingInputPolicy::Skip => write!(f, "skip"),
            MissingInputPolicy::Fail => write!(f, "fail"),
        }
    }
}

impl MissingInputPolicy {
    /// Checkpoint implementing this policy, prompting on the process stdin / stderr
    pub fn checkpoint(&self) -> Box<dyn Checkpoint> {
        match self {
            MissingInputPolicy::Prompt => Box::new(ConsolePrompt::new(io::stdin().lock(), io::stderr())),
            MissingInputPolicy::Skip => Box::new(AutoSkip),
            MissingInputPolicy::Fail => Box::new(AutoFail),
        }
    }
}

/// Decides whether a subject with unusable inputs is skipped (`Ok`) or ends the run (`Err`)
pub trait Checkpoint {
    fn confirm_skip(&mut self, subject: &str, problem: &InputProblem) -> Result<()>;
}

/// Operator facing warning for a subject that can't be run
pub fn warning(subject: &str, problem: &InputProblem) -> String {
    format!(
        "WARNING: It appears that there is not exactly *ONE* of each data file type \
         (3D gradient echo MRI and 2D focal fast spin echo MRI) in the data directory for subject {subject} ({problem}). \
         You may need to run ASHS manually for this subject."
    )
}

/// Blocks until the operator presses Enter
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        ConsolePrompt { input, output }
    }
}

impl<R: BufRead, W: Write> Checkpoint for ConsolePrompt<R, W> {
    fn confirm_skip(&mut self, subject: &str, problem: &InputProblem) -> Result<()> {
        warn!("Subject {subject} has unusable inputs: {problem}");
        write!(
            self.output,
            "{} Press the Enter key to acknowledge this message and skip this subject. >>>",
            warning(subject, problem)
        )?;
        self.output.flush()?;

        // EOF counts as an acknowledgement, there's nobody left to ask
        let mut line = String::new();
        self.input.read_line(&mut line).context("Can't read acknowledgement")?;
        Ok(())
    }
}

pub struct AutoSkip;

impl Checkpoint for AutoSkip {
    fn confirm_skip(&mut self, subject: &str, problem: &InputProblem) -> Result<()> {
        warn!("{}", warning(subject, problem));
        warn!("Skipping subject {subject}");
        Ok(())
    }
}

pub struct AutoFail;

impl Checkpoint for AutoFail {
    fn confirm_skip(&mut self, subject: &str, problem: &InputProblem) -> Result<()> {
        Err(anyhow!(warning(subject, problem)))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn problem() -> InputProblem {
        InputProblem { gradient: 0, focal: 2 }
    }

    #[test]
    fn test_prompt_waits_for_a_line() {
        let mut input = Cursor::new(b"\nleftover\n".to_vec());
        let mut output: Vec<u8> = Vec::new();
        {
            let mut prompt = ConsolePrompt::new(&mut input, &mut output);
            prompt.confirm_skip("S1", &problem()).unwrap();
        }
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.starts_with("WARNING:"));
        assert!(shown.contains("subject S1"));
        assert!(shown.ends_with(">>>"));
        // only the acknowledgement line was consumed
        assert_eq!(input.position(), 1);
    }

    #[test]
    fn test_prompt_accepts_eof() {
        let mut prompt = ConsolePrompt::new(Cursor::new(Vec::new()), Vec::new());
        assert!(prompt.confirm_skip("S1", &problem()).is_ok());
    }

    #[test]
    fn test_auto_policies() {
        assert!(AutoSkip.confirm_skip("S1", &problem()).is_ok());
        let err = AutoFail.confirm_skip("S1", &problem()).unwrap_err();
        assert!(err.to_string().contains("subject S1"));
    }

    #[test]
    fn test_policy_names() {
        assert_eq!(MissingInputPolicy::Skip.to_string(), "skip");
        assert_eq!(MissingInputPolicy::from_str("fail", true).unwrap(), MissingInputPolicy::Fail);
    }
}
