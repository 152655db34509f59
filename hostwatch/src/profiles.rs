//! Connection profiles: JSON mapping of profile name -> { url, host, username, tls_ca }.
//! Stored under XDG config dir: $XDG_CONFIG_HOME/hostwatch/profiles.json (fallback ~/.config/hostwatch/profiles.json)
//! Secrets are never written here.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, io, path::PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProfileEntry {
    /// Gateway endpoint, ws:// or wss://
    pub url: String,
    /// Target host the gateway should watch
    pub host: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_ca: Option<String>,
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
        PathBuf::from(xdg).join("hostwatch")
    } else {
        dirs_next::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hostwatch")
    }
}

pub fn profiles_path() -> PathBuf {
    config_dir().join("profiles.json")
}

pub fn load_profiles() -> ProfilesFile {
    let path = profiles_path();
    match fs::read_to_string(&path) {
        Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable profiles file");
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

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveProfile {
    /// Use the provided runtime inputs (maybe saved by the caller)
    Direct(ProfileEntry),
    /// Loaded from an existing profile entry
    Loaded(ProfileEntry),
    /// Should prompt user to select among profile names
    PromptSelect(Vec<String>),
    /// Should prompt user to create a new profile (name)
    PromptCreate(String),
    /// No profile could be resolved (e.g., missing arguments)
    None,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileRequest {
    pub profile_name: Option<String>,
    pub url: Option<String>,
    pub host: Option<String>,
    pub username: Option<String>,
    pub tls_ca: Option<String>,
}

impl ProfileRequest {
    pub fn resolve(self, pf: &ProfilesFile) -> ResolveProfile {
        match (self.profile_name, self.url) {
            // Only profile name given -> load, letting explicit flags override
            (Some(name), None) => match pf.profiles.get(&name) {
                Some(entry) => {
                    let mut entry = entry.clone();
                    if let Some(h) = self.host {
                        entry.host = h;
                    }
                    if let Some(u) = self.username {
                        entry.username = u;
                    }
                    if self.tls_ca.is_some() {
                        entry.tls_ca = self.tls_ca;
                    }
                    ResolveProfile::Loaded(entry)
                }
                None => ResolveProfile::PromptCreate(name),
            },
            // URL given -> direct (maybe later saved by caller)
            (_, Some(url)) => ResolveProfile::Direct(ProfileEntry {
                url,
                host: self.host.unwrap_or_default(),
                username: self.username.unwrap_or_default(),
                tls_ca: self.tls_ca,
            }),
            // Nothing provided -> maybe prompt select if profiles exist
            (None, None) => {
                if pf.profiles.is_empty() {
                    ResolveProfile::None
                } else {
                    ResolveProfile::PromptSelect(pf.profiles.keys().cloned().collect())
                }
            }
        }
    }
}
