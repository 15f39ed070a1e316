use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use crate::batch::submit_all;
use crate::checkpoint::MissingInputPolicy;
use crate::config::{Config, DEFAULT_ATLAS};
use crate::slurm::submit::Sbatch;
use crate::subject::read_subjects;

mod batch;
mod checkpoint;
mod config;
mod slurm;
mod subject;

/// Read subject IDs from the first column of a CSV file (with no header) and run ASHS jobs for
/// them using SLURM.
///
/// Each subject needs a directory in the data directory containing *ONE* 3D gradient echo MRI
/// (MPRAGE_[0-9]*.nii.*) and *ONE* 2D focal fast spin echo MRI (HighResHippo_[0-9]*.nii.*).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// CSV file with subject IDs in the first column (no header)
    pub csv: PathBuf,
    /// ASHS root directory
    #[arg(long, env = "ASHS_ROOT")]
    pub root: Option<PathBuf>,
    /// Name of the ASHS atlas, in the top level of the ASHS root directory
    #[arg(long, default_value = DEFAULT_ATLAS)]
    pub atlas: String,
    /// Data directory with one subdirectory per subject [default: <root>/data]
    #[arg(long)]
    pub data: Option<PathBuf>,
    /// Output directory, subject outputs go in subdirectories named by subject ID [default: <root>/outputs]
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Tell ASHS to clean up intermediate files once they are not needed
    #[arg(long)]
    pub tidy: bool,
    /// Number of processors allocated to each ASHS job
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub n_procs: u32,
    /// Memory in GB allocated to each ASHS job
    #[arg(long, default_value_t = 4.0)]
    pub mem: f64,
    /// Wall clock time limit for each ASHS job (HH:MM:SS)
    #[arg(long, default_value = "04:00:00")]
    pub time: String,
    /// Address that receives an email if an ASHS job fails or is requeued
    #[arg(long)]
    pub email: Option<String>,
    /// Write job scripts without submitting them
    #[arg(long)]
    pub no_submit: bool,
    /// What to do with a subject that doesn't have exactly one of each input file
    #[arg(value_enum, long, default_value_t = MissingInputPolicy::Prompt)]
    pub on_missing: MissingInputPolicy,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("ashs-submit starting up");

    let args = Args::parse();
    let config = Config::resolve(args).context("Invalid configuration")?;
    info!("ASHS root: {}, atlas: {}", config.root.display(), config.atlas_name);
    info!("Data directory: {}, output directory: {}", config.data_dir.display(), config.out_dir.display());

    let subjects = read_subjects(&config.csv)
        .with_context(|| format!("Can't read subjects from {}", config.csv.display()))?;

    let mut checkpoint = config.on_missing.checkpoint();
    let mut scheduler = Sbatch::new("sbatch");
    let summary = submit_all(&config, &subjects, checkpoint.as_mut(), &mut scheduler)?;

    info!("{} job scripts written, {} submitted, {} subjects skipped",
          summary.written, summary.submitted, summary.skipped);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;

    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["ashs-submit", "x.csv"]).unwrap();

        assert_eq!(args.csv, PathBuf::from("x.csv"));
        assert_eq!(args.atlas, "ashs_atlas_upennpmc_20170810");
        assert_eq!(args.n_procs, 1);
        assert_eq!(args.mem, 4.0);
        assert_eq!(args.time, "04:00:00");
        assert!(!args.tidy);
        assert!(!args.no_submit);
        assert!(args.data.is_none());
        assert!(args.out.is_none());
        assert!(args.email.is_none());
        assert_eq!(args.on_missing, MissingInputPolicy::Prompt);
    }

    #[test]
    fn test_root_falls_back_to_environment() {
        let command = Args::command();
        let root = command.get_arguments().find(|arg| arg.get_id() == "root").unwrap();
        assert_eq!(root.get_env(), Some(OsStr::new("ASHS_ROOT")));
    }

    #[test]
    fn test_flags() {
        let args = Args::try_parse_from([
            "ashs-submit", "subjects.csv", "--root", "/ashs", "--tidy", "--no-submit", "--n-procs", "8",
            "--mem", "12.5", "--time", "12:00:00", "--email", "a@b", "--on-missing", "skip",
        ]).unwrap();

        assert_eq!(args.root, Some(PathBuf::from("/ashs")));
        assert!(args.tidy && args.no_submit);
        assert_eq!(args.n_procs, 8);
        assert_eq!(args.mem, 12.5);
        assert_eq!(args.email.as_deref(), Some("a@b"));
        assert_eq!(args.on_missing, MissingInputPolicy::Skip);
    }

    #[test]
    fn test_zero_processes_rejected() {
        assert!(Args::try_parse_from(["ashs-submit", "x.csv", "--n-procs", "0"]).is_err());
    }
}
