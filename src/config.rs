//! Resolve command line arguments into an immutable run configuration
//!
//! Every check in here happens before a single subject is touched. If anything is wrong the run
//! stops with a [ConfigError] describing what to fix.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

use crate::checkpoint::MissingInputPolicy;
use crate::Args;

/// Atlas used when `--atlas` isn't set, expected in the top level of the ASHS root
pub static DEFAULT_ATLAS: &str = "ashs_atlas_upennpmc_20170810";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("CSV file {0} does not exist")]
    CsvMissing(PathBuf),
    #[error("time limit {0:?} is malformed: the hours, minutes and seconds must all be integers (format like 04:00:00)")]
    TimeFormat(String),
    #[error("email address {0:?} is malformed: it must contain '@'")]
    EmailFormat(String),
    #[error("ASHS root is unset: use --root or set the ASHS_ROOT environment variable")]
    RootUnset,
    #[error("ASHS root directory {0} does not exist")]
    RootMissing(PathBuf),
    #[error("ASHS atlas {0} does not exist")]
    AtlasMissing(PathBuf),
    #[error("data directory {0} does not exist")]
    DataMissing(PathBuf),
    #[error("invalid resources: {0}")]
    Resources(String),
    #[error("can't use output directory {path}: {source}")]
    OutDir { path: PathBuf, source: io::Error },
    #[error("can't resolve path {path}: {source}")]
    Path { path: PathBuf, source: io::Error },
}

/// Everything a run needs, resolved once at startup and never changed afterwards
#[derive(Debug, Clone)]
pub struct Config {
    pub csv: PathBuf,
    pub root: PathBuf,
    pub atlas_name: String,
    pub atlas: PathBuf,
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,
    pub tidy: bool,
    pub n_procs: u32,
    pub mem_gb: f64,
    pub time: String,
    pub email: Option<String>,
    pub no_submit: bool,
    pub on_missing: MissingInputPolicy,
}

impl Config {
    /// Validate arguments and build the configuration
    ///
    /// `args.root` already carries the `ASHS_ROOT` fallback (clap reads the environment). The
    /// output directory is the only path that may be absent, it's created with its parents.
    pub fn resolve(args: Args) -> Result<Config, ConfigError> {
        if !args.csv.exists() {
            return Err(ConfigError::CsvMissing(args.csv));
        }
        let csv = absolute(&args.csv)?;

        if args.n_procs == 0 {
            return Err(ConfigError::Resources("process count must be at least 1".to_string()));
        }
        if !(args.mem.is_finite() && args.mem > 0.0) {
            return Err(ConfigError::Resources(format!("memory must be a positive number of GB, got {}", args.mem)));
        }

        let time = validate_time(&args.time)?;
        let email = args.email.map(validate_email).transpose()?;

        let root = match args.root {
            None => return Err(ConfigError::RootUnset),
            Some(root) if !root.exists() => return Err(ConfigError::RootMissing(root)),
            Some(root) => absolute(&root)?,
        };

        let atlas = root.join(&args.atlas);
        if !atlas.exists() {
            return Err(ConfigError::AtlasMissing(atlas));
        }

        let data_dir = match args.data {
            Some(data) => absolute(&data)?,
            None => root.join("data"),
        };
        if !data_dir.exists() {
            return Err(ConfigError::DataMissing(data_dir));
        }

        let out_dir = match args.out {
            Some(out) => absolute(&out)?,
            None => root.join("outputs"),
        };
        if !out_dir.exists() {
            info!("Creating output directory {}", out_dir.display());
        }
        fs::create_dir_all(&out_dir).map_err(|source| ConfigError::OutDir { path: out_dir.clone(), source })?;

        Ok(Config {
            csv,
            root,
            atlas_name: args.atlas,
            atlas,
            data_dir,
            out_dir,
            tidy: args.tidy,
            n_procs: args.n_procs,
            mem_gb: args.mem,
            time,
            email,
            no_submit: args.no_submit,
            on_missing: args.on_missing,
        })
    }

    /// SLURM memory request, e.g. `4.0G`
    ///
    /// Whole numbers keep one decimal place (`4` becomes `4.0`), fractions are printed in full and
    /// never in exponent form (`0.00001`, not `1e-5`).
    pub fn mem(&self) -> String {
        match self.mem_gb.fract() == 0.0 {
            true => format!("{:.1}G", self.mem_gb),
            false => format!("{}G", self.mem_gb),
        }
    }

    /// ASHS entry point, launched through srun inside the job
    pub fn ashs_main(&self) -> PathBuf {
        self.root.join("bin").join("ashs_main.sh")
    }
}

/// Trim the time limit and check every `:` separated segment is an integer
fn validate_time(time: &str) -> Result<String, ConfigError> {
    let time = time.trim();
    if time.split(':').all(is_integer) {
        Ok(time.to_string())
    } else {
        Err(ConfigError::TimeFormat(time.to_string()))
    }
}

/// Optionally signed decimal digits, any length, whitespace around them allowed
fn is_integer(segment: &str) -> bool {
    let segment = segment.trim();
    let digits = segment.strip_prefix(['+', '-']).unwrap_or(segment);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn validate_email(email: String) -> Result<String, ConfigError> {
    match email.contains('@') {
        true => Ok(email),
        false => Err(ConfigError::EmailFormat(email)),
    }
}

fn absolute(path: &Path) -> Result<PathBuf, ConfigError> {
    std::path::absolute(path).map_err(|source| ConfigError::Path { path: path.to_path_buf(), source })
}
