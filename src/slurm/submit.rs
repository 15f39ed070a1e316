use std::process::Command;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::slurm::job::JobPath;

/// Hands a written job script to the cluster scheduler
pub trait Scheduler {
    fn submit(&mut self, job: &JobPath) -> Result<()>;
}

/// Submits with an sbatch executable, usually just `sbatch` from PATH
pub struct Sbatch {
    program: String,
}

impl Sbatch {
    pub fn new(program: impl Into<String>) -> Self {
        Sbatch { program: program.into() }
    }
}

impl Scheduler for Sbatch {
    /// Run sbatch from the job directory and wait for it to exit
    ///
    /// Only a failure to launch sbatch is an error. Its exit status is logged but doesn't stop the
    /// run, sbatch prints its own complaints to the terminal.
    fn submit(&mut self, job: &JobPath) -> Result<()> {
        let mut sbatch = Command::new(&self.program);
        let cmd = sbatch.arg(job.file_name()).current_dir(job.dir());
        info!("Running sbatch process in {}", job.dir().display());
        info!("{:?}", &cmd);

        let status = cmd.status()
            .with_context(|| format!("Failed to execute {} for {}", self.program, job.path.display()))?;
        if status.success() {
            info!("Submitted {}", job.path.display());
        } else {
            warn!("{} exited with {} for {}", self.program, status, job.path.display());
        }
        Ok(())
    }
}
