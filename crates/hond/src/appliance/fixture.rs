//! Appliances backed by JSON dumps on disk.
//!
//! Each `*.json` file in the fixture directory describes one appliance:
//!
//! ```json
//! {
//!   "info": { "unique_id": "aa:bb:cc", "appliance_type": "WM",
//!             "nick_name": "Washer", "model_name": "HW80-B14979",
//!             "brand": "haier", "fwVersion": "1.2" },
//!   "data": { "attributes": { "parameters": { "machMode": "1" } } },
//!   "settings": { "startProgram.delayTime":
//!                 { "type": "range", "min": 0, "max": 1440, "step": 30, "value": 0 } },
//!   "commands": ["startProgram", "stopProgram"]
//! }
//! ```
//!
//! `update()` re-reads `data` from the file so edits show up on the next poll.
//! Settings are kept in memory: they hold the parameters of the next command.

use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use tracing::info;

use super::Appliance;
use super::ApplianceError;
use super::ApplianceInfo;
use super::ApplianceSource;
use super::AttributeTree;
use super::Settings;

#[derive(Debug, Deserialize)]
struct FixtureFile {
    info: ApplianceInfo,
    #[serde(default)]
    data: AttributeTree,
    #[serde(default)]
    settings: Settings,
    #[serde(default)]
    commands: BTreeSet<String>,
}

async fn read_fixture(path: &Path) -> Result<FixtureFile, ApplianceError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ApplianceError::Io(path.to_path_buf(), e))?;
    serde_json::from_str(&contents).map_err(|e| ApplianceError::Parse(path.to_path_buf(), e))
}

pub struct FixtureAppliance {
    path: PathBuf,
    info: ApplianceInfo,
    data: AttributeTree,
    settings: Settings,
    commands: BTreeSet<String>,
    sent: Vec<String>,
}

impl FixtureAppliance {
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ApplianceError> {
        let path = path.as_ref().to_path_buf();
        let file = read_fixture(&path).await?;
        Ok(Self {
            path,
            info: file.info,
            data: file.data,
            settings: file.settings,
            commands: file.commands,
            sent: Vec::new(),
        })
    }

    /// Commands sent so far, oldest first.
    pub fn sent_commands(&self) -> &[String] {
        &self.sent
    }
}

#[async_trait]
impl Appliance for FixtureAppliance {
    fn info(&self) -> &ApplianceInfo {
        &self.info
    }

    fn data(&self) -> &AttributeTree {
        &self.data
    }

    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    fn commands(&self) -> &BTreeSet<String> {
        &self.commands
    }

    async fn update(&mut self) -> Result<(), ApplianceError> {
        let file = read_fixture(&self.path).await?;
        self.data = file.data;
        debug!("Reloaded appliance {} from {}", self.info.unique_id, self.path.display());
        Ok(())
    }

    async fn send_command(&mut self, command: &str) -> Result<(), ApplianceError> {
        if !self.commands.contains(command) {
            return Err(ApplianceError::UnknownCommand {
                appliance: self.info.unique_id.clone(),
                command: command.to_string(),
            });
        }

        let prefix = format!("{}.", command);
        let parameters: Vec<String> = self
            .settings
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(key, parameter)| format!("{}={}", &key[prefix.len()..], parameter.value()))
            .collect();
        info!(
            "[{}] Sending command {} ({})",
            self.info.unique_id,
            command,
            parameters.join(", ")
        );

        self.sent.push(command.to_string());
        Ok(())
    }
}

/// Loads every `*.json` appliance dump in a directory, in file name order.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    dir: PathBuf,
}

impl FixtureSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ApplianceSource for FixtureSource {
    async fn load(&self) -> Result<Vec<Box<dyn Appliance>>, ApplianceError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| ApplianceError::Io(self.dir.clone(), e))?;

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ApplianceError::Io(self.dir.clone(), e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut appliances: Vec<Box<dyn Appliance>> = Vec::with_capacity(paths.len());
        for path in paths {
            let appliance = FixtureAppliance::from_file(&path).await?;
            info!(
                "Loaded appliance {} ({}, type {}) from {}",
                appliance.info.nick_name,
                appliance.info.unique_id,
                appliance.info.appliance_type,
                path.display()
            );
            appliances.push(Box::new(appliance));
        }

        Ok(appliances)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn write_washer(dir: &Path, mach_mode: &str) -> PathBuf {
        let path = dir.join("washer.json");
        let fixture = json!({
            "info": {
                "unique_id": "aa:bb:cc",
                "appliance_type": "WM",
                "nick_name": "Washer",
                "model_name": "HW80",
                "brand": "haier",
                "fwVersion": "1.2"
            },
            "data": { "attributes": { "parameters": { "machMode": mach_mode } } },
            "settings": {
                "startProgram.delayTime": { "type": "range", "min": 0, "max": 1440, "step": 30, "value": 0 }
            },
            "commands": ["startProgram"]
        });
        fs::write(&path, serde_json::to_string_pretty(&fixture).unwrap()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_directory_ignores_other_files() {
        let temp_dir = TempDir::new().unwrap();
        write_washer(temp_dir.path(), "1");
        fs::write(temp_dir.path().join("README.txt"), "not an appliance").unwrap();

        let appliances = FixtureSource::new(temp_dir.path()).load().await.unwrap();
        assert_eq!(appliances.len(), 1);
        assert_eq!(appliances[0].unique_id(), "aa:bb:cc");
        assert!(appliances[0].settings().contains_key("startProgram.delayTime"));
        assert_eq!(appliances[0].info().extra.get("brand"), Some(&json!("haier")));
    }

    #[tokio::test]
    async fn test_update_rereads_data_and_keeps_settings() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_washer(temp_dir.path(), "1");

        let mut appliance = FixtureAppliance::from_file(&path).await.unwrap();
        appliance
            .setting_mut("startProgram.delayTime")
            .unwrap()
            .set_number(60.0)
            .unwrap();

        write_washer(temp_dir.path(), "2");
        appliance.update().await.unwrap();

        assert_eq!(appliance.data().get("machMode"), Some(&json!("2")));
        assert_eq!(
            appliance.settings()["startProgram.delayTime"].as_f64(),
            Some(60.0)
        );
    }

    #[tokio::test]
    async fn test_send_command() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_washer(temp_dir.path(), "1");
        let mut appliance = FixtureAppliance::from_file(&path).await.unwrap();

        appliance.send_command("startProgram").await.unwrap();
        assert_eq!(appliance.sent_commands(), ["startProgram".to_string()]);

        let err = appliance.send_command("stopProgram").await.unwrap_err();
        assert!(matches!(err, ApplianceError::UnknownCommand { .. }));
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let err = FixtureSource::new("/nonexistent/hond/fixtures")
            .load()
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ApplianceError::Io(..)));
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("broken.json"), "{").unwrap();
        let err = FixtureSource::new(temp_dir.path()).load().await.err().unwrap();
        assert!(matches!(err, ApplianceError::Parse(..)));
    }
}
