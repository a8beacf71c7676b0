//! Connection profiles: a JSON mapping of profile name -> endpoint settings.
//! Stored under $XDG_CONFIG_HOME/gpuwatch/profiles.json (fallback: the platform config dir).

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, io, path::PathBuf};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProfileEntry {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_ca: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfilesFile {
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileEntry>,
    #[serde(default)]
    pub version: u32,
}

pub fn config_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join("gpuwatch")
    } else {
        dirs_next::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gpuwatch")
    }
}

pub fn profiles_path() -> PathBuf {
    config_dir().join("profiles.json")
}

/// Missing file means no profiles; a corrupt file is logged and ignored.
pub fn load_profiles() -> ProfilesFile {
    let path = profiles_path();
    match fs::read_to_string(&path) {
        Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "ignoring unreadable profiles file");
            ProfilesFile::default()
        }),
        Err(_) => ProfilesFile::default(),
    }
}

pub fn save_profiles(p: &ProfilesFile) -> io::Result<()> {
    let path = profiles_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_vec_pretty(p).map_err(io::Error::other)?;
    fs::write(path, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_are_omitted_and_defaulted() {
        let mut pf = ProfilesFile::default();
        pf.profiles.insert(
            "lab".into(),
            ProfileEntry {
                url: "ws://lab:8080/ws".into(),
                ..Default::default()
            },
        );
        let js = serde_json::to_string(&pf).unwrap();
        assert!(!js.contains("tls_ca"));
        assert!(!js.contains("window"));

        let back: ProfilesFile =
            serde_json::from_str(r#"{"profiles":{"lab":{"url":"ws://lab:8080/ws","window":120}}}"#)
                .unwrap();
        assert_eq!(back.profiles["lab"].window, Some(120));
        assert_eq!(back.profiles["lab"].retries, None);
        assert_eq!(back.version, 0);
    }
}
