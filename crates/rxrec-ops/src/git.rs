//! Git commands fanned out over the configured module checkouts.

use std::path::Path;

use tracing::info;

use crate::config::OpsConfig;
use crate::error::Result;
use crate::invocation::{CommandRunner, Invocation};

/// A checkout that is off the main branch or has tracked changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoStatus {
    pub dir: String,
    pub branch: String,
    /// Short status of tracked files, empty when clean.
    pub changes: String,
}

/// What `pull` did in one checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullAction {
    Pulled,
    Fetched,
}

fn git(dir: &Path) -> Invocation {
    Invocation::new("git").current_dir(dir)
}

/// Whether a local branch exists. The exit code is the answer, not a failure.
fn has_branch(runner: &mut dyn CommandRunner, dir: &Path, branch: &str) -> Result<bool> {
    let probe = git(dir)
        .args(["show-ref", "--verify", "--quiet"])
        .arg(format!("refs/heads/{branch}"));
    Ok(runner.capture(&probe)?.success())
}

fn current_branch(runner: &mut dyn CommandRunner, dir: &Path) -> Result<String> {
    let invocation = git(dir).args(["rev-parse", "--abbrev-ref", "HEAD"]);
    let output = runner.capture(&invocation)?.require(&invocation)?;
    Ok(output.stdout.trim().to_string())
}

/// Checkouts that have a local branch named `branch`.
pub fn branch_find(
    runner: &mut dyn CommandRunner,
    config: &OpsConfig,
    branch: &str,
) -> Result<Vec<String>> {
    let mut found = Vec::new();
    for (name, dir) in config.module_paths()? {
        if has_branch(runner, &dir, branch)? {
            found.push(name);
        }
    }
    Ok(found)
}

/// Check out `branch` wherever it exists, then report status.
pub fn checkout(
    runner: &mut dyn CommandRunner,
    config: &OpsConfig,
    branch: &str,
) -> Result<Vec<RepoStatus>> {
    for (name, dir) in config.module_paths()? {
        if has_branch(runner, &dir, branch)? {
            let invocation = git(&dir).args(["checkout", branch]);
            runner.capture(&invocation)?.require(&invocation)?;
            info!(dir = %name, branch, "checked out");
        }
    }
    status(runner, config)
}

/// Pull checkouts on the main branch; fetch the others.
pub fn pull(
    runner: &mut dyn CommandRunner,
    config: &OpsConfig,
) -> Result<Vec<(String, PullAction)>> {
    let mut actions = Vec::new();
    for (name, dir) in config.module_paths()? {
        let branch = current_branch(runner, &dir)?;
        let (action, verb) = if branch == config.main_branch {
            (PullAction::Pulled, "pull")
        } else {
            (PullAction::Fetched, "fetch")
        };
        info!(dir = %name, branch = %branch, "{verb}");
        let invocation = git(&dir).arg(verb);
        runner.run(&invocation)?.require(&invocation)?;
        actions.push((name, action));
    }
    Ok(actions)
}

/// Push `branch` to the fork remote from every checkout that has it.
pub fn push(
    runner: &mut dyn CommandRunner,
    config: &OpsConfig,
    branch: &str,
    force: bool,
) -> Result<Vec<String>> {
    let mut pushed = Vec::new();
    for (name, dir) in config.module_paths()? {
        if !has_branch(runner, &dir, branch)? {
            continue;
        }
        info!(dir = %name, branch, remote = %config.fork_remote, "pushing");
        let invocation = git(&dir)
            .args(["push", config.fork_remote.as_str(), branch])
            .arg_if(force, "--force");
        runner.run(&invocation)?.require(&invocation)?;
        pushed.push(name);
    }
    Ok(pushed)
}

/// Checkouts off the main branch or with tracked changes.
pub fn status(runner: &mut dyn CommandRunner, config: &OpsConfig) -> Result<Vec<RepoStatus>> {
    let mut report = Vec::new();
    for (name, dir) in config.module_paths()? {
        let branch = current_branch(runner, &dir)?;
        let invocation = git(&dir).args(["status", "-s", "-uno"]);
        let changes = runner.capture(&invocation)?.require(&invocation)?.stdout;
        if branch != config.main_branch || !changes.trim().is_empty() {
            report.push(RepoStatus {
                dir: name,
                branch,
                changes,
            });
        }
    }
    Ok(report)
}
