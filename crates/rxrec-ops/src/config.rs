//! Settings shared by every operational task.

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::error::{OpsError, Result};

/// Deployment settings, built once at startup and passed by reference.
///
/// Paths may start with `~`, which expands to the user's home directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OpsConfig {
    /// OpenMRS SDK server id.
    pub server_name: String,
    /// Database name; `openmrs_<server_name>` when unset.
    pub db_name: Option<String>,
    pub db_host: String,
    pub db_port: u16,
    pub db_user: String,
    /// Directory holding the module checkouts.
    pub base_path: PathBuf,
    /// Checkouts under `base_path` that git tasks fan out over.
    pub module_dirs: Vec<String>,
    pub main_branch: String,
    /// Remote that `git push` targets.
    pub fork_remote: String,
    /// OpenMRS SDK home holding one directory per server.
    pub openmrs_home: PathBuf,
    /// Value written as `pih.config`.
    pub pih_config: String,
    /// Value written as `pih.config.dir`; defaults to the config files inside
    /// the puppet checkout.
    pub pih_config_dir: Option<PathBuf>,
    /// Module, under `base_path`, whose distro is deployed.
    pub distro_module_dir: String,
    /// Distro properties file, relative to the distro module.
    pub distro_properties: String,
    /// Maven coordinates of the distro used by `setup`.
    pub distro_artifact: String,
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self {
            server_name: "chiapas".to_string(),
            db_name: None,
            db_host: "localhost".to_string(),
            db_port: 3306,
            db_user: "root".to_string(),
            base_path: PathBuf::from("."),
            module_dirs: [
                "openmrs-module-pihcore",
                "openmrs-module-mirebalais",
                "openmrs-module-mirebalaismetadata",
                "mirebalais-puppet",
            ]
            .map(String::from)
            .to_vec(),
            main_branch: "master".to_string(),
            fork_remote: "fork".to_string(),
            openmrs_home: PathBuf::from("~/openmrs"),
            pih_config: "mexico,mexico-salvador".to_string(),
            pih_config_dir: None,
            distro_module_dir: "openmrs-module-mirebalais".to_string(),
            distro_properties: "api/src/main/resources/openmrs-distro.properties".to_string(),
            distro_artifact: "org.openmrs.module:mirebalais:1.2-SNAPSHOT".to_string(),
        }
    }
}

impl OpsConfig {
    pub fn database_name(&self) -> String {
        self.db_name
            .clone()
            .unwrap_or_else(|| format!("openmrs_{}", self.server_name))
    }

    /// JDBC URI handed to the SDK's setup goal.
    pub fn db_uri(&self) -> String {
        format!(
            "jdbc:mysql://{}:{}/{}",
            self.db_host,
            self.db_port,
            self.database_name()
        )
    }

    pub fn base_dir(&self) -> Result<PathBuf> {
        expand_home(&self.base_path)
    }

    /// Each configured module directory with its full path.
    pub fn module_paths(&self) -> Result<Vec<(String, PathBuf)>> {
        let base = self.base_dir()?;
        Ok(self
            .module_dirs
            .iter()
            .map(|dir| (dir.clone(), base.join(dir)))
            .collect())
    }

    pub fn distro_dir(&self) -> Result<PathBuf> {
        Ok(self.base_dir()?.join(&self.distro_module_dir))
    }

    /// `<openmrs_home>/<server>/openmrs-runtime.properties`.
    pub fn runtime_properties_path(&self) -> Result<PathBuf> {
        Ok(expand_home(&self.openmrs_home)?
            .join(&self.server_name)
            .join("openmrs-runtime.properties"))
    }

    pub fn pih_config_dir_path(&self) -> Result<PathBuf> {
        match &self.pih_config_dir {
            Some(dir) => expand_home(dir),
            None => Ok(self
                .base_dir()?
                .join("mirebalais-puppet/mirebalais-modules/openmrs/files/config")),
        }
    }
}

/// Replace a leading `~` with the home directory.
pub fn expand_home(path: &Path) -> Result<PathBuf> {
    let Ok(rest) = path.strip_prefix("~") else {
        return Ok(path.to_path_buf());
    };
    let dirs = BaseDirs::new().ok_or_else(|| OpsError::NoHomeDirectory {
        path: path.to_path_buf(),
    })?;
    Ok(dirs.home_dir().join(rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_defaults_follow_server_name() {
        let config = OpsConfig {
            server_name: "salvador".into(),
            ..OpsConfig::default()
        };
        assert_eq!(config.database_name(), "openmrs_salvador");
        assert_eq!(config.db_uri(), "jdbc:mysql://localhost:3306/openmrs_salvador");

        let named = OpsConfig {
            db_name: Some("emr".into()),
            ..config
        };
        assert_eq!(named.database_name(), "emr");
    }

    #[test]
    fn plain_paths_are_left_alone() {
        assert_eq!(
            expand_home(Path::new("/srv/openmrs")).unwrap(),
            PathBuf::from("/srv/openmrs")
        );
        assert_eq!(expand_home(Path::new("~user")).unwrap(), PathBuf::from("~user"));
    }

    #[test]
    fn pih_config_dir_defaults_into_puppet_checkout() {
        let config = OpsConfig {
            base_path: PathBuf::from("/code/pih"),
            ..OpsConfig::default()
        };
        assert_eq!(
            config.pih_config_dir_path().unwrap(),
            PathBuf::from("/code/pih/mirebalais-puppet/mirebalais-modules/openmrs/files/config")
        );
    }
}
