//! OpenMRS SDK tasks run through Maven.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::OpsConfig;
use crate::error::{OpsError, Result};
use crate::invocation::{CommandRunner, Invocation, StdinMode};

const READY_MARKER: &str = "Starting ProtocolHandler";
const DEBUGGER_MARKER: &str = "Connect remote debugger";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeployOptions {
    /// Accept every SDK prompt with its default.
    pub no_prompt: bool,
    pub offline: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub offline: bool,
    pub skip_deploy: bool,
}

/// Milestones seen in the server's output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerEvents {
    pub ready: bool,
    pub debugger: bool,
}

/// What `configure` found and changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureReport {
    pub properties_path: PathBuf,
    pub before: String,
    pub after: String,
    /// JSON files found in the PIH config directory.
    pub config_files: Vec<String>,
    /// Lines appended; lines already present are not repeated.
    pub appended: Vec<String>,
}

fn mvn(config: &OpsConfig, goal: &str) -> Result<Invocation> {
    Ok(Invocation::new("mvn")
        .arg(goal)
        .current_dir(config.base_dir()?))
}

pub fn deploy_invocation(config: &OpsConfig, options: DeployOptions) -> Result<Invocation> {
    let stdin = if options.no_prompt {
        StdinMode::AutoConfirm
    } else {
        StdinMode::Inherit
    };
    Ok(Invocation::new("mvn")
        .arg("openmrs-sdk:deploy")
        .arg(format!("-Ddistro={}", config.distro_properties))
        .arg_if(options.offline, "--offline")
        .arg("-U")
        .arg(format!("-DserverId={}", config.server_name))
        .current_dir(config.distro_dir()?)
        .stdin(stdin))
}

/// Deploy the distro, updating dependencies.
pub fn deploy(
    runner: &mut dyn CommandRunner,
    config: &OpsConfig,
    options: DeployOptions,
) -> Result<()> {
    let invocation = deploy_invocation(config, options)?;
    runner.run(&invocation)?.require(&invocation)?;
    Ok(())
}

pub fn install(runner: &mut dyn CommandRunner, config: &OpsConfig) -> Result<()> {
    let invocation = mvn(config, "clean")?.args(["install", "-e", "-DskipTests=true"]);
    runner.run(&invocation)?.require(&invocation)?;
    Ok(())
}

pub fn pull(runner: &mut dyn CommandRunner, config: &OpsConfig) -> Result<()> {
    let invocation = mvn(config, "openmrs-sdk:pull")?;
    runner.run(&invocation)?.require(&invocation)?;
    Ok(())
}

pub fn watch(runner: &mut dyn CommandRunner, config: &OpsConfig) -> Result<()> {
    let invocation =
        mvn(config, "openmrs-sdk:watch")?.arg(format!("-DserverId={}", config.server_name));
    runner.run(&invocation)?.require(&invocation)?;
    Ok(())
}

pub fn run_invocation(config: &OpsConfig, offline: bool) -> Result<Invocation> {
    Ok(mvn(config, "openmrs-sdk:run")?
        .args(["-e", "-X"])
        .arg_if(offline, "--offline")
        .arg(format!("-DserverId={}", config.server_name)))
}

/// Deploy (unless skipped) and run the server, watching its output.
pub fn run(
    runner: &mut dyn CommandRunner,
    config: &OpsConfig,
    options: RunOptions,
) -> Result<ServerEvents> {
    if !options.skip_deploy {
        deploy(
            runner,
            config,
            DeployOptions {
                no_prompt: true,
                offline: options.offline,
            },
        )?;
    }

    let invocation = run_invocation(config, options.offline)?;
    let mut events = ServerEvents::default();
    let output = runner.stream(&invocation, &mut |line| {
        if line.contains(READY_MARKER) {
            events.ready = true;
            info!(server = %config.server_name, "server is ready");
        }
        if line.contains(DEBUGGER_MARKER) {
            events.debugger = true;
            info!(server = %config.server_name, "debugger is listening");
        }
    })?;
    output.require(&invocation)?;
    Ok(events)
}

pub fn setup_invocation(config: &OpsConfig, db_password: Option<&str>) -> Result<Invocation> {
    let invocation = mvn(config, "openmrs-sdk:setup")?
        .arg(format!("-DserverId={}", config.server_name))
        .arg(format!("-Ddistro={}", config.distro_artifact))
        .arg(format!("-DdbUri={}", config.db_uri()))
        .arg(format!("-DdbUser={}", config.db_user));
    Ok(match db_password {
        Some(password) => invocation.secret_arg(format!("-DdbPassword={password}")),
        None => invocation,
    })
}

/// Create the SDK server. Without a password the SDK asks for one.
pub fn setup(
    runner: &mut dyn CommandRunner,
    config: &OpsConfig,
    db_password: Option<&str>,
) -> Result<()> {
    let invocation = setup_invocation(config, db_password)?;
    runner.run(&invocation)?.require(&invocation)?;
    Ok(())
}

/// Point the server's runtime properties at the PIH configuration.
pub fn configure(config: &OpsConfig) -> Result<ConfigureReport> {
    let properties_path = config.runtime_properties_path()?;
    let before = read(&properties_path)?;

    let config_dir = config.pih_config_dir_path()?;
    let config_files = json_files(&config_dir)?;
    if config_files.is_empty() {
        warn!(
            dir = %config_dir.display(),
            "no JSON files in the PIH config directory; check pih_config_dir"
        );
    }

    let wanted = [
        format!("pih.config={}", config.pih_config),
        format!("pih.config.dir={}", config_dir.display()),
    ];
    let appended: Vec<String> = wanted
        .into_iter()
        .filter(|line| !before.lines().any(|existing| existing.trim() == line))
        .collect();

    if !appended.is_empty() {
        let write_err = |source| OpsError::WriteFile {
            path: properties_path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .append(true)
            .open(&properties_path)
            .map_err(write_err)?;
        let mut text = String::new();
        if !before.is_empty() && !before.ends_with('\n') {
            text.push('\n');
        }
        for line in &appended {
            text.push_str(line);
            text.push('\n');
        }
        file.write_all(text.as_bytes()).map_err(write_err)?;
        info!(path = %properties_path.display(), lines = appended.len(), "runtime properties updated");
    }

    let after = read(&properties_path)?;
    Ok(ConfigureReport {
        properties_path,
        before,
        after,
        config_files,
        appended,
    })
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| OpsError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

fn json_files(dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|source| OpsError::ReadFile {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files: Vec<String> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".json"))
        .collect();
    files.sort();
    Ok(files)
}
