use std::io;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use rxrec_cli::config::{AppConfig, ReconcileConfig};
use rxrec_cli::console::{ConsolePresenter, LineReader};
use rxrec_cli::pipeline::{Operator, RunReport, run_reconcile};
use rxrec_match::CheckpointStore;
use rxrec_model::DuplicatePolicy;
use rxrec_ops::server::{DeployOptions, RunOptions};
use rxrec_ops::{OpsConfig, SystemRunner, db, git, server, vm};

use crate::cli::{DbCommand, GitCommand, MatchArgs, ServerCommand, VmCommand};
use crate::summary::{
    print_configure, print_dirs, print_matches, print_pull, print_repo_status, print_summary,
};

/// Environment variable holding the database password for `server setup`.
pub const DB_PASSWORD_ENV: &str = "RXREC_DB_PASSWORD";

/// Layer command-line overrides on top of the file configuration.
pub fn apply_match_args(config: &mut ReconcileConfig, args: &MatchArgs) {
    if let Some(path) = &args.source {
        config.source.clone_from(path);
    }
    if let Some(path) = &args.local {
        config.local.clone_from(path);
    }
    if let Some(path) = &args.dictionary {
        config.dictionary.clone_from(path);
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir.clone_from(dir);
    }
    if let Some(dir) = &args.intermediates_dir {
        config.intermediates_dir.clone_from(dir);
    }
    if let Some(threshold) = args.local_threshold {
        config.matching.local.threshold = threshold;
    }
    if let Some(threshold) = args.dictionary_threshold {
        config.matching.dictionary.threshold = threshold;
    }
    if args.reject_duplicates {
        config.matching.duplicate_policy = DuplicatePolicy::Reject;
    }
}

pub fn run_match(config: AppConfig, args: &MatchArgs) -> Result<RunReport> {
    let mut reconcile = config.reconcile;
    apply_match_args(&mut reconcile, args);

    let report = if args.no_interactive {
        run_reconcile(&reconcile, None)?
    } else {
        let mut presenter = ConsolePresenter::new(io::stdout());
        let mut reader = LineReader::new(io::stdin().lock(), io::stdout());
        run_reconcile(
            &reconcile,
            Some(Operator {
                presenter: &mut presenter,
                reader: &mut reader,
            }),
        )?
    };

    if args.show_matches {
        print_matches(&report);
    }
    let store = CheckpointStore::new(&reconcile.output_dir, &reconcile.intermediates_dir);
    print_summary(&report, &store);
    Ok(report)
}

pub fn run_server(config: &OpsConfig, command: &ServerCommand) -> Result<()> {
    let span = info_span!("server", server = %config.server_name);
    let _guard = span.enter();
    let mut runner = SystemRunner;
    match command {
        ServerCommand::Configure => {
            let report = server::configure(config).context("configure runtime properties")?;
            print_configure(&report);
        }
        ServerCommand::Deploy { no_prompt, offline } => {
            let options = DeployOptions {
                no_prompt: *no_prompt,
                offline: *offline,
            };
            server::deploy(&mut runner, config, options).context("deploy")?;
        }
        ServerCommand::Install => server::install(&mut runner, config).context("install")?,
        ServerCommand::Pull => server::pull(&mut runner, config).context("pull")?,
        ServerCommand::Run {
            offline,
            skip_deploy,
        } => {
            let options = RunOptions {
                offline: *offline,
                skip_deploy: *skip_deploy,
            };
            let events = server::run(&mut runner, config, options).context("run server")?;
            info!(ready = events.ready, debugger = events.debugger, "server stopped");
        }
        ServerCommand::Setup => {
            let password = std::env::var(DB_PASSWORD_ENV).ok();
            server::setup(&mut runner, config, password.as_deref()).context("setup")?;
        }
        ServerCommand::Watch => server::watch(&mut runner, config).context("watch")?,
    }
    Ok(())
}

pub fn run_git(config: &OpsConfig, command: &GitCommand) -> Result<()> {
    let span = info_span!("git");
    let _guard = span.enter();
    let mut runner = SystemRunner;
    match command {
        GitCommand::BranchFind { branch } => {
            let found = git::branch_find(&mut runner, config, branch).context("find branch")?;
            print_dirs(&found, &format!("No checkout has a branch named {branch}."));
        }
        GitCommand::Checkout { branch } => {
            let statuses = git::checkout(&mut runner, config, branch).context("checkout")?;
            print_repo_status(&statuses);
        }
        GitCommand::Pull => {
            let actions = git::pull(&mut runner, config).context("pull")?;
            print_pull(&actions);
        }
        GitCommand::Push { branch, force } => {
            let pushed = git::push(&mut runner, config, branch, *force).context("push")?;
            print_dirs(&pushed, &format!("No checkout has a branch named {branch}."));
        }
        GitCommand::Status => {
            let statuses = git::status(&mut runner, config).context("status")?;
            print_repo_status(&statuses);
        }
    }
    Ok(())
}

pub fn run_db(config: &OpsConfig, command: &DbCommand) -> Result<()> {
    let span = info_span!("db", database = %config.database_name());
    let _guard = span.enter();
    let mut runner = SystemRunner;
    let result = match command {
        DbCommand::EnableModules => db::enable_modules(&mut runner, config),
        DbCommand::ClearAddressHierarchy => db::clear_address_hierarchy(&mut runner, config),
        DbCommand::ClearIdgen => db::clear_idgen(&mut runner, config),
    };
    result.context("run SQL")
}

pub fn run_vm(command: &VmCommand) -> Result<()> {
    let mut runner = SystemRunner;
    match command {
        VmCommand::RunDisk { disk } => vm::run_disk(&mut runner, disk)
            .with_context(|| format!("boot {}", disk.display())),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn flags_override_file_values() {
        let mut config = ReconcileConfig::default();
        let args = MatchArgs {
            source: Some(PathBuf::from("lists/other.csv")),
            output_dir: Some(PathBuf::from("out")),
            dictionary_threshold: Some(90),
            reject_duplicates: true,
            ..MatchArgs::default()
        };

        apply_match_args(&mut config, &args);

        assert_eq!(config.source, PathBuf::from("lists/other.csv"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.local, ReconcileConfig::default().local);
        assert_eq!(config.matching.dictionary.threshold, 90);
        assert_eq!(config.matching.local.threshold, 80);
        assert_eq!(config.matching.duplicate_policy, DuplicatePolicy::Reject);
    }

    #[test]
    fn absent_flags_keep_file_values() {
        let mut config = ReconcileConfig::default();
        config.matching.local.threshold = 60;
        apply_match_args(&mut config, &MatchArgs::default());
        assert_eq!(config.matching.local.threshold, 60);
        assert_eq!(config.matching.duplicate_policy, DuplicatePolicy::LastWins);
    }
}
