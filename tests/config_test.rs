use std::ffi::OsString;
use std::fs;

use secrecy::ExposeSecret;
use serial_test::serial;
use tempfile::TempDir;

use kinetic_queue::config::{Config, ENV_CONFIG, ENV_PASSWORD, ENV_SERVER, ENV_USERNAME};
use kinetic_queue::error::QueueError;

/// RAII guard that sets an environment variable and restores it on drop.
///
/// Tests using this must be marked `#[serial]`.
struct EnvGuard {
    name: &'static str,
    original: Option<OsString>,
}

impl EnvGuard {
    fn set(name: &'static str, value: impl AsRef<std::ffi::OsStr>) -> Self {
        let original = std::env::var_os(name);
        // SAFETY: callers are #[serial], so no other thread touches the environment
        unsafe { std::env::set_var(name, value) };
        Self { name, original }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        // SAFETY: see EnvGuard::set
        match &self.original {
            Some(val) => unsafe { std::env::set_var(self.name, val) },
            None => unsafe { std::env::remove_var(self.name) },
        }
    }
}

fn config_in(dir: &TempDir) -> EnvGuard {
    EnvGuard::set(ENV_CONFIG, dir.path().join("nested").join("config.yaml"))
}

#[test]
#[serial]
fn test_load_missing_file_returns_default() {
    let dir = TempDir::new().unwrap();
    let _config = config_in(&dir);

    let config = Config::load().unwrap();
    assert_eq!(config.kapp, "queue");
    assert!(config.server.is_none());
}

#[test]
#[serial]
fn test_save_then_load() {
    let dir = TempDir::new().unwrap();
    let _config = config_in(&dir);

    let mut config = Config::default();
    config.set("server", "https://acme.kinops.io").unwrap();
    config.set("username", "alice").unwrap();
    config.set("page_size", "50").unwrap();
    config.set("all_teams", "IT,HR").unwrap();
    config.save().unwrap();

    let loaded = Config::load().unwrap();
    assert_eq!(loaded.server.as_deref(), Some("https://acme.kinops.io"));
    assert_eq!(loaded.username.as_deref(), Some("alice"));
    assert_eq!(loaded.page_size, 50);
    assert_eq!(loaded.all_teams, Some(vec!["IT".into(), "HR".into()]));
}

#[cfg(unix)]
#[test]
#[serial]
fn test_saved_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let _config = config_in(&dir);

    let mut config = Config::default();
    config.set("password", "hunter2").unwrap();
    config.save().unwrap();

    let mode = fs::metadata(Config::config_path())
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
#[serial]
fn test_load_rejects_invalid_page_size() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    fs::write(&path, "page_size: 7\n").unwrap();
    let _config = EnvGuard::set(ENV_CONFIG, &path);

    assert!(matches!(Config::load(), Err(QueueError::InvalidLimit(7))));
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    let mut config = Config::default();
    config.set("server", "https://file.example.com").unwrap();
    config.set("username", "file-user").unwrap();
    config.set("password", "file-secret").unwrap();

    let _server = EnvGuard::set(ENV_SERVER, "https://env.example.com");
    let _username = EnvGuard::set(ENV_USERNAME, "env-user");
    let _password = EnvGuard::set(ENV_PASSWORD, "env-secret");

    assert_eq!(
        config.server_url().unwrap().as_str(),
        "https://env.example.com/"
    );
    assert_eq!(config.username().as_deref(), Some("env-user"));
    assert_eq!(config.password().unwrap().expose_secret(), "env-secret");
}

#[test]
#[serial]
fn test_missing_server_is_a_config_error() {
    let _server = EnvGuard::set(ENV_SERVER, "");
    let err = Config::default().server_url().unwrap_err();
    assert!(matches!(err, QueueError::Config(_)));
    assert!(err.to_string().contains("server not configured"));
}
