#![allow(dead_code)]

pub mod mock_api;
pub mod mock_data;

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Helper struct to run kq commands in an isolated temp directory
pub struct KqTest {
    pub temp_dir: TempDir,
}

impl KqTest {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        KqTest { temp_dir }
    }

    /// Path of the config file the commands read and write
    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join(".kinetic").join("config.yaml")
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(kq_binary());
        cmd.current_dir(self.temp_dir.path())
            .env_remove("KQ_CONFIG")
            .env_remove("KQ_SERVER")
            .env_remove("KQ_USERNAME")
            .env_remove("KQ_PASSWORD")
            .env("NO_COLOR", "1");
        cmd
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command()
            .args(args)
            .output()
            .expect("Failed to execute kq command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Command {:?} should have failed\nstdout: {}",
            args,
            String::from_utf8_lossy(&output.stdout)
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }
}

pub fn kq_binary() -> &'static str {
    env!("CARGO_BIN_EXE_kq")
}
