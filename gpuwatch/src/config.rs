//! Runtime settings: CLI overrides merged over a stored profile and defaults.

use std::path::PathBuf;

use tracing::warn;
use url::Url;

use crate::connection::{HistoryPolicy, SessionOptions};
use crate::error::ConfigError;
use crate::history::DEFAULT_CAPACITY;
use crate::profiles::{ProfileEntry, ProfilesFile};
use crate::reconnect::ReconnectPolicy;
use crate::ws::{parse_endpoint, DEFAULT_ENDPOINT};

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub tls_ca: Option<String>,
    pub profile: Option<String>,
    pub save: bool,
    pub window: Option<usize>,
    pub retries: Option<u32>,
    pub retain_history: bool,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub endpoint: Url,
    pub tls_ca: Option<PathBuf>,
    pub window_capacity: usize,
    pub reconnect: ReconnectPolicy,
    pub history: HistoryPolicy,
}

impl Settings {
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            window_capacity: self.window_capacity,
            history: self.history,
        }
    }
}

#[derive(Debug)]
pub struct Resolved {
    pub settings: Settings,
    /// Profile entry the caller should write back to disk.
    pub persist: Option<(String, ProfileEntry)>,
}

impl Overrides {
    pub fn resolve(&self, pf: &ProfilesFile) -> Result<Resolved, ConfigError> {
        let mut persist = None;
        let stored = self.profile.as_ref().and_then(|n| pf.profiles.get(n));

        let entry = match (&self.profile, &self.url, stored) {
            (Some(name), None, None) => return Err(ConfigError::ProfileNotFound(name.clone())),
            (Some(_), None, Some(existing)) => existing.clone(),
            (Some(name), Some(url), existing) => {
                let fresh = ProfileEntry {
                    url: url.clone(),
                    tls_ca: self.tls_ca.clone(),
                    window: self.window,
                    retries: self.retries,
                };
                match existing {
                    None => persist = Some((name.clone(), fresh.clone())),
                    Some(old) if *old != fresh && self.save => {
                        persist = Some((name.clone(), fresh.clone()))
                    }
                    Some(old) if *old != fresh => {
                        warn!(profile = %name, "profile differs from arguments; pass --save to overwrite");
                    }
                    Some(_) => {}
                }
                fresh
            }
            (None, url, _) => ProfileEntry {
                url: url.clone().unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
                tls_ca: self.tls_ca.clone(),
                window: self.window,
                retries: self.retries,
            },
        };

        let endpoint = parse_endpoint(&entry.url)?;
        let window_capacity = self.window.or(entry.window).unwrap_or(DEFAULT_CAPACITY);
        if window_capacity == 0 {
            return Err(ConfigError::InvalidWindow(window_capacity));
        }
        let mut reconnect = ReconnectPolicy::default();
        if let Some(r) = self.retries.or(entry.retries) {
            reconnect.max_retries = r;
        }
        let tls_ca = self.tls_ca.clone().or(entry.tls_ca).map(PathBuf::from);

        Ok(Resolved {
            settings: Settings {
                endpoint,
                tls_ca,
                window_capacity,
                reconnect,
                history: if self.retain_history {
                    HistoryPolicy::Retain
                } else {
                    HistoryPolicy::Reset
                },
            },
            persist,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_profile(name: &str, url: &str) -> ProfilesFile {
        let mut pf = ProfilesFile::default();
        pf.profiles.insert(
            name.into(),
            ProfileEntry {
                url: url.into(),
                window: Some(30),
                ..Default::default()
            },
        );
        pf
    }

    #[test]
    fn nothing_given_uses_defaults() {
        let r = Overrides::default().resolve(&ProfilesFile::default()).unwrap();
        assert_eq!(r.settings.endpoint.as_str(), DEFAULT_ENDPOINT);
        assert_eq!(r.settings.window_capacity, 60);
        assert_eq!(r.settings.history, HistoryPolicy::Reset);
        assert!(r.persist.is_none());
    }

    #[test]
    fn new_profile_is_persisted() {
        let o = Overrides {
            profile: Some("lab".into()),
            url: Some("lab-box:9000".into()),
            ..Default::default()
        };
        let r = o.resolve(&ProfilesFile::default()).unwrap();
        assert_eq!(r.settings.endpoint.as_str(), "ws://lab-box:9000/ws");
        let (name, entry) = r.persist.unwrap();
        assert_eq!(name, "lab");
        assert_eq!(entry.url, "lab-box:9000");
    }

    #[test]
    fn stored_profile_loads_and_cli_overrides_window() {
        let pf = with_profile("lab", "ws://lab:1/ws");
        let o = Overrides {
            profile: Some("lab".into()),
            ..Default::default()
        };
        assert_eq!(o.resolve(&pf).unwrap().settings.window_capacity, 30);
        let o = Overrides {
            profile: Some("lab".into()),
            window: Some(90),
            retries: Some(0),
            ..Default::default()
        };
        let r = o.resolve(&pf).unwrap();
        assert_eq!(r.settings.window_capacity, 90);
        assert_eq!(r.settings.reconnect.max_retries, 0);
        assert!(r.persist.is_none());
    }

    #[test]
    fn changed_profile_saved_only_with_flag() {
        let pf = with_profile("lab", "ws://lab:1/ws");
        let mut o = Overrides {
            profile: Some("lab".into()),
            url: Some("ws://lab:2/ws".into()),
            ..Default::default()
        };
        let r = o.resolve(&pf).unwrap();
        assert!(r.persist.is_none());
        assert_eq!(r.settings.endpoint.as_str(), "ws://lab:2/ws");
        o.save = true;
        assert!(o.resolve(&pf).unwrap().persist.is_some());
    }

    #[test]
    fn unknown_profile_and_zero_window_fail() {
        let o = Overrides {
            profile: Some("nope".into()),
            ..Default::default()
        };
        assert!(matches!(
            o.resolve(&ProfilesFile::default()),
            Err(ConfigError::ProfileNotFound(_))
        ));
        let o = Overrides {
            window: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            o.resolve(&ProfilesFile::default()),
            Err(ConfigError::InvalidWindow(0))
        ));
    }

    #[test]
    fn retain_flag_sets_policy() {
        let o = Overrides {
            retain_history: true,
            ..Default::default()
        };
        let r = o.resolve(&ProfilesFile::default()).unwrap();
        assert_eq!(r.settings.history, HistoryPolicy::Retain);
    }
}
