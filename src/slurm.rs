//! Find subject inputs, render SLURM job scripts and submit them

/// Match the two required scans in a subject's data directory
pub mod inputs;

/// Read the embedded job templates and render them with the run configuration
pub mod job;

/// Hand written job scripts to sbatch
pub mod submit;
