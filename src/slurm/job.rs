use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;
use tinytemplate::{format_unescaped, TinyTemplate};

use crate::config::Config;
use crate::slurm::inputs::JobInputs;

/// A JobPath is the path to a job script that's submitted to SLURM via sbatch
///
/// The script always lives in the subject's output directory, which is also the working directory
/// for sbatch and ASHS.
#[derive(Debug, Clone, PartialEq)]
pub struct JobPath {
    pub path: PathBuf,
}

impl JobPath {
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn file_name(&self) -> &str {
        self.path.file_name().and_then(|name| name.to_str()).unwrap_or_default()
    }
}

/// Script file name for a subject, e.g. `sbatch_S1.script`
pub fn script_name(subject: &str) -> String {
    format!("sbatch_{subject}.script")
}

/// Create the subject's output directory and write a rendered job script into it
pub fn create(config: &Config, subject: &str, inputs: &JobInputs) -> Result<JobPath> {
    let subject_dir = config.out_dir.join(subject);
    info!("Creating job for {} in {}", subject, subject_dir.display());
    fs::create_dir_all(&subject_dir)
        .with_context(|| format!("Can't create subject output directory {}", subject_dir.display()))?;

    let job = JobTemplate::render(config, subject, inputs, &subject_dir)?;
    let path = subject_dir.join(script_name(subject));
    if path.exists() {
        warn!("Job script {} already exists and will be overwritten", path.display());
    }
    job.write(&path).with_context(|| format!("Can't write job script {}", path.display()))?;

    Ok(JobPath { path })
}

/// All rendered sections of an ASHS job script
pub struct JobTemplate {
    header: Header,
    mail: Option<Mail>,
    command: Command,
}

impl JobTemplate {
    pub fn render(config: &Config, subject: &str, inputs: &JobInputs, subject_dir: &Path) -> Result<JobTemplate> {
        Ok(JobTemplate {
            header: render_header(config, subject)?,
            mail: config.email.as_deref().map(render_mail).transpose()?,
            command: render_command(config, subject, inputs, subject_dir)?,
        })
    }

    /// Complete script text
    pub fn content(&self) -> String {
        // order is important when writing the file
        let mut content = self.header.content.clone();
        if let Some(mail) = &self.mail {
            content.push_str(&mail.content);
        }
        content.push_str(&self.command.content);
        content
    }

    /// Write the script, truncating anything already at `out_path`
    fn write(&self, out_path: &Path) -> Result<(), std::io::Error> {
        let mut file = fs::File::create(out_path)?;
        file.write_all(self.content().as_bytes())
    }
}

/// Rendered SBATCH header
///
/// Parts of the header set from CLI options:
/// - [X] process count
/// - [X] job RAM
/// - [X] job time
/// - [X] job name (`ASHS_<subject>`)
/// - [X] stdout / stderr log files, named with the SLURM job id
struct Header {
    content: String,
}

/// Rendered mail directives, only present when an email address is configured
///
/// SLURM mails the address if the job fails or is requeued.
struct Mail {
    content: String,
}

/// Rendered ASHS invocation
struct Command {
    content: String,
}

#[derive(Serialize)]
struct HeaderContext {
    n_procs: String,
    mem: String,
    time: String,
    name: String,
}

#[derive(Serialize)]
struct MailContext {
    email: String,
}

#[derive(Serialize)]
struct CommandContext {
    command: String,
}

/// Templates contain paths and shell, never HTML
fn template<'a>(name: &'a str, text: &'a str) -> Result<TinyTemplate<'a>> {
    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&format_unescaped);
    tt.add_template(name, text).with_context(|| format!("Invalid {name} template"))?;
    Ok(tt)
}

/// Render the SBATCH header using TinyTemplate
fn render_header(config: &Config, subject: &str) -> Result<Header> {
    /// included header template
    static HEADER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/header.txt"));
    let tt = template("header", HEADER)?;
    let context = HeaderContext {
        n_procs: config.n_procs.to_string(),
        mem: config.mem(),
        time: config.time.clone(),
        name: format!("ASHS_{subject}"),
    };
    Ok(Header { content: tt.render("header", &context)? })
}

fn render_mail(email: &str) -> Result<Mail> {
    /// included mail template
    static MAIL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/mail.txt"));
    let tt = template("mail", MAIL)?;
    let context = MailContext { email: email.to_string() };
    Ok(Mail { content: tt.render("mail", &context)? })
}

fn render_command(config: &Config, subject: &str, inputs: &JobInputs, subject_dir: &Path) -> Result<Command> {
    /// included command template
    static COMMAND: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/command.txt"));
    let tt = template("command", COMMAND)?;
    let context = CommandContext { command: ashs_command(config, subject, inputs, subject_dir) };
    Ok(Command { content: tt.render("command", &context)? })
}

/// The single line running ASHS inside the allocation
pub fn ashs_command(config: &Config, subject: &str, inputs: &JobInputs, subject_dir: &Path) -> String {
    let mut command = format!(
        "srun {} -a {} -g {} -f {} -w {} -I {}",
        config.ashs_main().display(),
        config.atlas.display(),
        inputs.gradient.display(),
        inputs.focal.display(),
        subject_dir.display(),
        subject,
    );
    if config.tidy {
        command.push_str(" -T");
    }
    command
}
