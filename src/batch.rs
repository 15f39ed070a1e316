//! Run every subject through input matching, script rendering and submission, one at a time

use anyhow::Result;
use log::info;

use crate::checkpoint::Checkpoint;
use crate::config::Config;
use crate::slurm::inputs::find_inputs;
use crate::slurm::job;
use crate::slurm::submit::Scheduler;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub written: usize,
    pub submitted: usize,
    pub skipped: usize,
}

/// Process subjects in order
///
/// Subjects with missing or ambiguous inputs go through the checkpoint, everything else that goes
/// wrong stops the run. Scripts already written or submitted stay where they are.
pub fn submit_all(
    config: &Config,
    subjects: &[String],
    checkpoint: &mut dyn Checkpoint,
    scheduler: &mut dyn Scheduler,
) -> Result<Summary> {
    let mut summary = Summary::default();

    for subject in subjects {
        let inputs = match find_inputs(&config.data_dir, subject)? {
            Ok(inputs) => inputs,
            Err(problem) => {
                checkpoint.confirm_skip(subject, &problem)?;
                summary.skipped += 1;
                continue;
            }
        };

        let job_path = job::create(config, subject, &inputs)?;
        summary.written += 1;

        match config.no_submit {
            true => info!("--no-submit set, not submitting {}", job_path.path.display()),
            false => {
                scheduler.submit(&job_path)?;
                summary.submitted += 1;
            }
        }
    }

    Ok(summary)
}
