use std::fs;
use std::path::{Path, PathBuf};

use rxrec_ops::git::{self, PullAction};
use rxrec_ops::server::{self, DeployOptions, RunOptions};
use rxrec_ops::{
    CommandOutput, CommandRunner, Invocation, OpsConfig, OpsError, Result, StdinMode, db, vm,
};
use tempfile::TempDir;

/// Records every invocation and answers from a scripted function.
struct Recorder<F> {
    seen: Vec<Invocation>,
    respond: F,
    lines: Vec<&'static str>,
}

impl<F: FnMut(&Invocation) -> CommandOutput> Recorder<F> {
    fn new(respond: F) -> Self {
        Self {
            seen: Vec::new(),
            respond,
            lines: Vec::new(),
        }
    }

    fn commands(&self) -> Vec<String> {
        self.seen.iter().map(ToString::to_string).collect()
    }
}

impl<F: FnMut(&Invocation) -> CommandOutput> CommandRunner for Recorder<F> {
    fn run(&mut self, invocation: &Invocation) -> Result<CommandOutput> {
        self.seen.push(invocation.clone());
        Ok((self.respond)(invocation))
    }

    fn capture(&mut self, invocation: &Invocation) -> Result<CommandOutput> {
        self.seen.push(invocation.clone());
        Ok((self.respond)(invocation))
    }

    fn stream(
        &mut self,
        invocation: &Invocation,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<CommandOutput> {
        self.seen.push(invocation.clone());
        for line in &self.lines {
            on_line(line);
        }
        Ok((self.respond)(invocation))
    }
}

fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        code: Some(0),
        stdout: stdout.to_string(),
    }
}

fn exit(code: i32) -> CommandOutput {
    CommandOutput {
        code: Some(code),
        stdout: String::new(),
    }
}

fn config(base: &Path) -> OpsConfig {
    OpsConfig {
        base_path: base.to_path_buf(),
        module_dirs: vec!["core".into(), "distro".into()],
        distro_module_dir: "distro".into(),
        ..OpsConfig::default()
    }
}

#[test]
fn deploy_without_prompts_confirms_everything() {
    let config = config(Path::new("/code"));
    let mut runner = Recorder::new(|_: &Invocation| ok(""));

    server::deploy(
        &mut runner,
        &config,
        DeployOptions {
            no_prompt: true,
            offline: true,
        },
    )
    .unwrap();

    let deploy = &runner.seen[0];
    assert_eq!(
        deploy.to_string(),
        "mvn openmrs-sdk:deploy -Ddistro=api/src/main/resources/openmrs-distro.properties \
         --offline -U -DserverId=chiapas"
    );
    assert_eq!(deploy.cwd.as_deref(), Some(Path::new("/code/distro")));
    assert_eq!(deploy.stdin, StdinMode::AutoConfirm);
}

#[test]
fn run_deploys_first_and_watches_output() {
    let config = config(Path::new("/code"));
    let mut runner = Recorder::new(|_: &Invocation| ok(""));
    runner.lines = vec![
        "[INFO] Scanning",
        "INFO - Starting ProtocolHandler [\"http-bio-8080\"]",
        "Listening for transport dt_socket. Connect remote debugger now",
    ];

    let events = server::run(&mut runner, &config, RunOptions::default()).unwrap();

    assert!(events.ready);
    assert!(events.debugger);
    let commands = runner.commands();
    assert!(commands[0].starts_with("mvn openmrs-sdk:deploy"));
    assert_eq!(commands[1], "mvn openmrs-sdk:run -e -X -DserverId=chiapas");
}

#[test]
fn run_can_skip_deploy() {
    let config = config(Path::new("/code"));
    let mut runner = Recorder::new(|_: &Invocation| ok(""));

    let events = server::run(
        &mut runner,
        &config,
        RunOptions {
            offline: true,
            skip_deploy: true,
        },
    )
    .unwrap();

    assert_eq!(events, server::ServerEvents::default());
    assert_eq!(
        runner.commands(),
        ["mvn openmrs-sdk:run -e -X --offline -DserverId=chiapas"]
    );
}

#[test]
fn failed_deploy_stops_run() {
    let config = config(Path::new("/code"));
    let mut runner = Recorder::new(|_: &Invocation| exit(1));

    let err = server::run(&mut runner, &config, RunOptions::default()).unwrap_err();

    assert!(matches!(err, OpsError::CommandFailed { code: Some(1), .. }));
    assert_eq!(runner.seen.len(), 1);
}

#[test]
fn setup_masks_the_password() {
    let config = config(Path::new("/code"));
    let mut runner = Recorder::new(|_: &Invocation| ok(""));

    server::setup(&mut runner, &config, Some("s3cret")).unwrap();
    server::setup(&mut runner, &config, None).unwrap();

    let with_password = &runner.seen[0];
    assert_eq!(
        with_password.args.last().map(String::as_str),
        Some("-DdbPassword=s3cret")
    );
    assert!(with_password.to_string().ends_with("-DdbUser=root -DdbPassword=***"));
    assert_eq!(
        runner.seen[1].to_string(),
        "mvn openmrs-sdk:setup -DserverId=chiapas \
         -Ddistro=org.openmrs.module:mirebalais:1.2-SNAPSHOT \
         -DdbUri=jdbc:mysql://localhost:3306/openmrs_chiapas -DdbUser=root"
    );
}

#[test]
fn simple_maven_goals() {
    let config = config(Path::new("/code"));
    let mut runner = Recorder::new(|_: &Invocation| ok(""));

    server::install(&mut runner, &config).unwrap();
    server::pull(&mut runner, &config).unwrap();
    server::watch(&mut runner, &config).unwrap();

    assert_eq!(
        runner.commands(),
        [
            "mvn clean install -e -DskipTests=true",
            "mvn openmrs-sdk:pull",
            "mvn openmrs-sdk:watch -DserverId=chiapas",
        ]
    );
}

#[test]
fn configure_appends_missing_lines_once() {
    let dir = TempDir::new().unwrap();
    let home = dir.path().join("openmrs");
    fs::create_dir_all(home.join("chiapas")).unwrap();
    let properties = home.join("chiapas/openmrs-runtime.properties");
    fs::write(&properties, "connection.username=openmrs").unwrap();
    let pih_dir = dir.path().join("pih-config");
    fs::create_dir_all(&pih_dir).unwrap();
    fs::write(pih_dir.join("pih-config-mexico.json"), "{}").unwrap();

    let config = OpsConfig {
        openmrs_home: home,
        pih_config_dir: Some(pih_dir.clone()),
        ..OpsConfig::default()
    };

    let report = server::configure(&config).unwrap();
    assert_eq!(report.config_files, ["pih-config-mexico.json"]);
    assert_eq!(report.appended.len(), 2);
    assert_eq!(
        report.after,
        format!(
            "connection.username=openmrs\npih.config=mexico,mexico-salvador\npih.config.dir={}\n",
            pih_dir.display()
        )
    );

    let again = server::configure(&config).unwrap();
    assert!(again.appended.is_empty());
    assert_eq!(again.after, report.after);
}

#[test]
fn configure_requires_the_properties_file() {
    let dir = TempDir::new().unwrap();
    let config = OpsConfig {
        openmrs_home: dir.path().to_path_buf(),
        ..OpsConfig::default()
    };
    let err = server::configure(&config).unwrap_err();
    assert!(matches!(err, OpsError::ReadFile { .. }));
}

fn branch_probe_answer(with_branch: &'static str) -> impl FnMut(&Invocation) -> CommandOutput {
    move |invocation: &Invocation| {
        let in_dir = |name: &str| invocation.cwd == Some(Path::new("/code").join(name));
        match invocation.args.first().map(String::as_str) {
            Some("show-ref") if in_dir(with_branch) => ok(""),
            Some("show-ref") => exit(1),
            Some("rev-parse") if in_dir("core") => ok("master\n"),
            Some("rev-parse") => ok("feature\n"),
            Some("status") if in_dir("core") => ok(" M api/pom.xml\n"),
            _ => ok(""),
        }
    }
}

#[test]
fn branch_find_lists_only_checkouts_with_the_branch() {
    let config = config(Path::new("/code"));
    let mut runner = Recorder::new(branch_probe_answer("distro"));

    let found = git::branch_find(&mut runner, &config, "feature").unwrap();

    assert_eq!(found, ["distro"]);
    assert_eq!(
        runner.commands(),
        [
            "git show-ref --verify --quiet refs/heads/feature",
            "git show-ref --verify --quiet refs/heads/feature",
        ]
    );
}

#[test]
fn pull_fetches_off_the_main_branch() {
    let config = config(Path::new("/code"));
    let mut runner = Recorder::new(branch_probe_answer("distro"));

    let actions = git::pull(&mut runner, &config).unwrap();

    assert_eq!(
        actions,
        [
            ("core".to_string(), PullAction::Pulled),
            ("distro".to_string(), PullAction::Fetched),
        ]
    );
    let commands = runner.commands();
    assert!(commands.contains(&"git pull".to_string()));
    assert!(commands.contains(&"git fetch".to_string()));
}

#[test]
fn push_targets_the_fork_remote() {
    let config = config(Path::new("/code"));
    let mut runner = Recorder::new(branch_probe_answer("core"));

    let pushed = git::push(&mut runner, &config, "feature", true).unwrap();

    assert_eq!(pushed, ["core"]);
    let pushes: Vec<_> = runner
        .commands()
        .into_iter()
        .filter(|command| command.starts_with("git push"))
        .collect();
    assert_eq!(pushes, ["git push fork feature --force"]);
}

#[test]
fn checkout_then_reports_status() {
    let config = config(Path::new("/code"));
    let mut runner = Recorder::new(branch_probe_answer("distro"));

    let report = git::checkout(&mut runner, &config, "feature").unwrap();

    assert!(runner.commands().contains(&"git checkout feature".to_string()));
    let dirs: Vec<_> = report.iter().map(|status| status.dir.as_str()).collect();
    assert_eq!(dirs, ["core", "distro"]);
    assert_eq!(report[0].changes, " M api/pom.xml\n");
    assert_eq!(report[1].branch, "feature");
}

#[test]
fn sql_is_passed_to_the_mysql_client() {
    let config = config(Path::new("/code"));
    let mut runner = Recorder::new(|_: &Invocation| ok(""));

    db::clear_idgen(&mut runner, &config).unwrap();
    db::enable_modules(&mut runner, &config).unwrap();

    let clear = &runner.seen[0];
    assert_eq!(clear.program, "mysql");
    assert_eq!(clear.args[..4], ["-u", "root", "-p", "-e"]);
    assert!(
        clear.args[4]
            .starts_with("set foreign_key_checks=0; delete from idgen_auto_generation_option;")
    );
    assert_eq!(clear.args[5], "openmrs_chiapas");
    assert_eq!(runner.seen[1].args[4], db::ENABLE_MODULES_SQL);
}

#[test]
fn sql_with_double_quotes_never_runs() {
    let config = config(Path::new("/code"));
    let mut runner = Recorder::new(|_: &Invocation| ok(""));

    let err = db::run_sql(&mut runner, &config, "delete from \"person\";").unwrap_err();

    assert!(matches!(err, OpsError::UnsafeSql { .. }));
    assert!(runner.seen.is_empty());
}

#[test]
fn run_disk_boots_raw_image() {
    let mut runner = Recorder::new(|_: &Invocation| ok(""));
    vm::run_disk(&mut runner, &PathBuf::from("/vm/emr.img")).unwrap();
    assert_eq!(
        runner.commands(),
        ["sudo qemu-system-x86_64 -enable-kvm -m 4G -usb -device usb-tablet -vga cirrus \
          -drive format=raw,file=/vm/emr.img"]
    );
}

#[test]
fn config_file_overrides_defaults() {
    let config: OpsConfig = toml::from_str(
        r#"
        server_name = "salvador"
        module_dirs = ["openmrs-module-pihcore"]
        db_port = 3307
        "#,
    )
    .unwrap();
    assert_eq!(config.server_name, "salvador");
    assert_eq!(config.module_dirs, ["openmrs-module-pihcore"]);
    assert_eq!(config.db_uri(), "jdbc:mysql://localhost:3307/openmrs_salvador");
    assert_eq!(config.main_branch, "master");

    assert!(toml::from_str::<OpsConfig>("serverName = \"x\"").is_err());
}
