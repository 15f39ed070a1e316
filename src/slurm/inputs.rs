use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

/// 3D gradient echo MRI, e.g. `MPRAGE_001.nii.gz`
pub static GRADIENT_PATTERN: &str = "MPRAGE_[0-9]*.nii.*";
/// 2D focal fast spin echo MRI, e.g. `HighResHippo_001.nii.gz`
pub static FOCAL_PATTERN: &str = "HighResHippo_[0-9]*.nii.*";

/// The two scans ASHS needs for one subject
#[derive(Debug, Clone, PartialEq)]
pub struct JobInputs {
    pub gradient: PathBuf,
    pub focal: PathBuf,
}

/// How many files matched each pattern when it wasn't exactly one of each
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputProblem {
    pub gradient: usize,
    pub focal: usize,
}

impl fmt::Display for InputProblem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} gradient echo file(s) matching {}, {} focal file(s) matching {}",
               self.gradient, GRADIENT_PATTERN, self.focal, FOCAL_PATTERN)
    }
}

/// Find the inputs in `<data_dir>/<subject>/`
///
/// The outer `Result` is for I/O failures while globbing, which are fatal. The inner one reports a
/// subject that's missing a file or has ambiguous ones, which only skips that subject. A missing
/// subject directory simply matches nothing.
pub fn find_inputs(data_dir: &Path, subject: &str) -> Result<Result<JobInputs, InputProblem>> {
    let subject_dir = data_dir.join(subject);
    let mut gradient = glob_files(&subject_dir, GRADIENT_PATTERN)?;
    let mut focal = glob_files(&subject_dir, FOCAL_PATTERN)?;

    if gradient.len() != 1 || focal.len() != 1 {
        return Ok(Err(InputProblem { gradient: gradient.len(), focal: focal.len() }));
    }

    let inputs = JobInputs {
        gradient: gradient.remove(0),
        focal: focal.remove(0),
    };
    info!("Subject {subject}: found {} and {}", inputs.gradient.display(), inputs.focal.display());
    Ok(Ok(inputs))
}

fn glob_files(dir: &Path, file_pattern: &str) -> Result<Vec<PathBuf>> {
    // subject ids are directory names, not patterns
    let pattern = format!("{}/{}", glob::Pattern::escape(&dir.to_string_lossy()), file_pattern);
    glob::glob(&pattern)
        .with_context(|| format!("Invalid glob pattern {pattern}"))?
        .collect::<Result<Vec<PathBuf>, glob::GlobError>>()
        .with_context(|| format!("Can't search {}", dir.display()))
}
