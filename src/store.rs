//! Persistence of command defaults between runs.
//!
//! Defaults live in the `ASKLLM_DEFAULTS` environment variable. To survive the
//! current shell they are also written as an `export` line into the user's
//! shell profile.

use std::path::{Path, PathBuf};

use anyhow::anyhow;
use tracing::{debug, info};

use crate::config::DEFAULTS_VAR;

const PROFILE_MARKER: &str = "# ask-llm command defaults";
const PROFILE_FILES: [&str; 4] = [".zshrc", ".bashrc", ".bash_profile", ".profile"];

pub trait DefaultsStore {
    /// The stored defaults string, empty when nothing is stored.
    fn load(&self) -> String;

    /// Replace the stored defaults. Blank input clears them.
    fn store(&self, defaults: &str) -> Result<(), anyhow::Error>;
}

pub struct ShellProfileStore {
    home_dir: Option<PathBuf>,
    process_value: Option<String>,
}

impl ShellProfileStore {
    pub fn new(home_dir: Option<PathBuf>, process_value: Option<String>) -> Self {
        ShellProfileStore {
            home_dir,
            process_value,
        }
    }

    pub fn from_env() -> Self {
        ShellProfileStore::new(dirs::home_dir(), std::env::var(DEFAULTS_VAR).ok())
    }

    fn profile_candidates(&self) -> Vec<PathBuf> {
        match &self.home_dir {
            Some(home) => PROFILE_FILES.iter().map(|name| home.join(name)).collect(),
            None => Vec::new(),
        }
    }

    fn read_from_profiles(&self) -> Option<String> {
        self.profile_candidates()
            .iter()
            .filter(|path| path.is_file())
            .find_map(|path| {
                let contents = std::fs::read_to_string(path)
                    .map_err(|e| debug!("Failed to read {}: {}", path.display(), e))
                    .ok()?;
                let value = parse_export_line(&contents)?;
                debug!("Loaded stored defaults from {}", path.display());
                Some(value)
            })
    }

    fn target_profile(&self) -> Result<PathBuf, anyhow::Error> {
        let home = self
            .home_dir
            .as_ref()
            .ok_or_else(|| anyhow!("Unable to determine the home directory"))?;
        let existing = self.profile_candidates().into_iter().find(|p| p.is_file());
        Ok(existing.unwrap_or_else(|| home.join(".profile")))
    }
}

impl DefaultsStore for ShellProfileStore {
    fn load(&self) -> String {
        if let Some(value) = self.process_value.as_deref().filter(|v| !v.is_empty()) {
            return value.to_string();
        }

        self.read_from_profiles().unwrap_or_default()
    }

    fn store(&self, defaults: &str) -> Result<(), anyhow::Error> {
        let target = self.target_profile()?;
        let defaults = defaults.trim();
        write_profile_entry(&target, defaults)?;
        info!("Updated {} in {}", DEFAULTS_VAR, target.display());
        Ok(())
    }
}

fn write_profile_entry(target: &Path, defaults: &str) -> Result<(), anyhow::Error> {
    if !target.exists() {
        if defaults.is_empty() {
            return Ok(());
        }
        let contents = format!("{}\n{}\n", PROFILE_MARKER, export_line(defaults));
        std::fs::write(target, contents)?;
        return Ok(());
    }

    let existing = std::fs::read_to_string(target)?;
    let mut lines: Vec<&str> = existing
        .lines()
        .filter(|line| !line.contains(DEFAULTS_VAR) && !line.contains(PROFILE_MARKER))
        .collect();

    let export = export_line(defaults);
    if !defaults.is_empty() {
        lines.push("");
        lines.push(PROFILE_MARKER);
        lines.push(&export);
    }

    let mut contents = lines.join("\n");
    contents.push('\n');
    std::fs::write(target, contents)?;
    Ok(())
}

fn export_line(defaults: &str) -> String {
    format!(
        "export {}='{}'",
        DEFAULTS_VAR,
        defaults.replace('\'', r"'\''")
    )
}

fn parse_export_line(contents: &str) -> Option<String> {
    let prefix = format!("export {}=", DEFAULTS_VAR);
    contents.lines().find_map(|line| {
        let value = line.trim().strip_prefix(&prefix)?;
        if value.is_empty() {
            return None;
        }
        Some(unquote(value))
    })
}

fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        return value[1..value.len() - 1].replace(r"'\''", "'");
    }
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        return value[1..value.len() - 1].to_string();
    }
    value.to_string()
}
