use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::UninstallWriter;
use crate::error::Result;

/// What an uninstaller needs to undo a finished installation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UninstallRecord {
    /// RFC 3339 local time
    pub written_at: String,
    pub reboot_required: bool,
    pub install_path: Option<String>,
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

impl UninstallRecord {
    pub fn new(reboot_required: bool, install_path: Option<String>, files: Vec<PathBuf>) -> Self {
        Self {
            written_at: Local::now().to_rfc3339(),
            reboot_required,
            install_path,
            files,
            variables: BTreeMap::new(),
        }
    }

    pub fn with_variables(mut self, variables: BTreeMap<String, String>) -> Self {
        self.variables = variables;
        self
    }
}

/// Writes the record as TOML, replacing any previous one atomically.
/// Records that list no installed files are not written.
pub struct TomlUninstallWriter {
    path: PathBuf,
}

impl TomlUninstallWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/installwiz/uninstall.toml`, falling back to /var/lib
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("/var/lib"))
            .join("installwiz")
            .join("uninstall.toml")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UninstallWriter for TomlUninstallWriter {
    fn write(&self, record: &UninstallRecord) -> Result<()> {
        if record.files.is_empty() {
            debug!("No installed files, not writing {:?}", self.path);
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let payload = toml::to_string_pretty(record)?;
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &self.path)?;

        info!("Wrote uninstall record to {:?}", self.path);
        Ok(())
    }
}
