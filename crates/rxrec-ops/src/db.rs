//! Data resets run through the MySQL command-line client.

use tracing::info;

use crate::config::OpsConfig;
use crate::error::{OpsError, Result};
use crate::invocation::{CommandRunner, Invocation};

const ADDRESS_HIERARCHY_TABLES: &[&str] = &["address_hierarchy_level", "address_hierarchy_entry"];

const IDGEN_TABLES: &[&str] = &[
    "idgen_auto_generation_option",
    "idgen_id_pool",
    "idgen_identifier_source",
    "idgen_log_entry",
    "idgen_pooled_identifier",
    "idgen_remote_source",
    "idgen_reserved_identifier",
    "idgen_seq_id_gen",
];

/// Marks every `started` global property true so modules load at startup.
pub const ENABLE_MODULES_SQL: &str =
    "update global_property set property_value='true' where property like '%started%';";

/// Empty `tables` with foreign key checks switched off.
pub fn delete_tables_sql(tables: &[&str]) -> String {
    let mut sql = String::from("set foreign_key_checks=0; ");
    for table in tables {
        sql.push_str(&format!("delete from {table}; "));
    }
    sql.push_str("set foreign_key_checks=1; ");
    sql
}

pub fn sql_invocation(config: &OpsConfig, sql: &str) -> Result<Invocation> {
    if sql.contains('"') {
        return Err(OpsError::UnsafeSql {
            sql: sql.to_string(),
        });
    }
    Ok(Invocation::new("mysql")
        .args(["-u", config.db_user.as_str(), "-p", "-e", sql])
        .arg(config.database_name()))
}

/// Run `sql` against the configured database. The client asks for the password.
pub fn run_sql(runner: &mut dyn CommandRunner, config: &OpsConfig, sql: &str) -> Result<()> {
    let invocation = sql_invocation(config, sql)?;
    info!(database = %config.database_name(), user = %config.db_user, "requesting MySQL password");
    runner.run(&invocation)?.require(&invocation)?;
    Ok(())
}

pub fn enable_modules(runner: &mut dyn CommandRunner, config: &OpsConfig) -> Result<()> {
    run_sql(runner, config, ENABLE_MODULES_SQL)
}

pub fn clear_address_hierarchy(runner: &mut dyn CommandRunner, config: &OpsConfig) -> Result<()> {
    run_sql(runner, config, &delete_tables_sql(ADDRESS_HIERARCHY_TABLES))
}

pub fn clear_idgen(runner: &mut dyn CommandRunner, config: &OpsConfig) -> Result<()> {
    run_sql(runner, config, &delete_tables_sql(IDGEN_TABLES))
}
