//! First-boot SQL script mounted into the container's init directory.

use std::path::PathBuf;

use crate::config::DatabaseConfig;

/// File name inside the init directory. MySQL runs scripts in lexical order.
pub const INIT_SCRIPT_NAME: &str = "01-init.sql";

/// Render the init script for `config`.
pub fn render(config: &DatabaseConfig) -> String {
    format!(
        "-- Runs once, on the first start of an empty data directory.\n\
         CREATE DATABASE IF NOT EXISTS `{db}` CHARACTER SET {charset} COLLATE {collation};\n\
         USE `{db}`;\n\
         \n\
         CREATE TABLE IF NOT EXISTS leanrag_meta (\n\
         \x20   id INT AUTO_INCREMENT PRIMARY KEY,\n\
         \x20   created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP\n\
         ) CHARACTER SET {charset} COLLATE {collation};\n",
        db = config.database,
        charset = config.charset,
        collation = config.collation,
    )
}

/// Write the init script unless one is already there.
///
/// Returns the script path and whether it was written by this call.
pub fn ensure(config: &DatabaseConfig) -> std::io::Result<(PathBuf, bool)> {
    let path = config.init_dir.join(INIT_SCRIPT_NAME);
    if path.exists() {
        return Ok((path, false));
    }
    std::fs::create_dir_all(&config.init_dir)?;
    std::fs::write(&path, render(config))?;
    Ok((path, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_creates_database_with_charset() {
        let sql = render(&DatabaseConfig::default());
        assert!(sql.contains(
            "CREATE DATABASE IF NOT EXISTS `leanrag` CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_ci;"
        ));
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS leanrag_meta"));
    }

    #[test]
    fn ensure_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            init_dir: dir.path().join("mysql-init"),
            ..Default::default()
        };

        let (path, written) = ensure(&config).unwrap();
        assert!(written);
        assert!(path.exists());

        std::fs::write(&path, "-- customized\n").unwrap();
        let (_, written) = ensure(&config).unwrap();
        assert!(!written);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "-- customized\n");
    }
}
