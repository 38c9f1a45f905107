//! Configuration resolved from a `.env` file, the way both binaries load it.
//!
//! A single test per binary: it mutates the process environment.

use secrecy::ExposeSecret;
use tempfile::tempdir;

use leanrag_db::config::{DatabaseConfig, InstallerConfig};

#[test]
fn dotenv_overrides_reach_resolved_config() {
    let dir = tempdir().unwrap();
    let env_path = dir.path().join(".env");
    std::fs::write(
        &env_path,
        "LEANRAG_MYSQL_PORT=5555\n\
         LEANRAG_MYSQL_DATABASE=my-project.db\n\
         LEANRAG_MYSQL_PASSWORD='s3cret'\n\
         LEANRAG_MYSQL_READY_ATTEMPTS=5\n\
         LEANRAG_VENV_DIR=.env-py\n",
    )
    .unwrap();
    dotenvy::from_path(&env_path).unwrap();

    let db = DatabaseConfig::resolve().unwrap();
    assert_eq!(db.host_port, 5555);
    assert_eq!(db.database, "my_project_db");
    assert_eq!(db.password.expose_secret(), "s3cret");
    assert_eq!(db.ready_attempts, 5);
    assert_eq!(db.container_name, "leanrag-mysql");

    let profile = db.profile();
    assert!(profile.url().contains("s3cret"));
    assert!(!profile.to_string().contains("s3cret"));

    let installer = InstallerConfig::resolve(Some("3.12".to_string())).unwrap();
    assert_eq!(installer.env_dir, std::path::PathBuf::from(".env-py"));
    assert_eq!(installer.python_version, "3.12");
    assert!(InstallerConfig::resolve(Some("latest".to_string())).is_err());
}
