//! Engine configuration (environment driven).

use std::path::PathBuf;

/// Shared secret accepted for directory users in demo builds.
pub const DEFAULT_DEMO_SECRET: &str = "password123";

/// Runtime configuration for [`crate::AccessControl::from_config`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EngineConfig {
    /// Where persisted records live. `None` keeps everything in memory.
    pub storage_dir: Option<PathBuf>,
    /// Installs the hard-coded bootstrap accounts. Off outside demo builds.
    pub demo_mode: bool,
    /// Shared secret for directory logins; empty disables that resolver.
    pub demo_secret: String,
    /// Start with the demo user directory instead of an empty one.
    pub seed_demo_users: bool,
}

impl EngineConfig {
    /// Everything on, in memory: what the demo application and tests use.
    pub fn demo() -> Self {
        Self {
            storage_dir: None,
            demo_mode: true,
            demo_secret: DEFAULT_DEMO_SECRET.to_string(),
            seed_demo_users: true,
        }
    }

    /// Read configuration from the process environment.
    ///
    /// - `GESTIO_STORAGE_DIR` (default: `<data dir>/gestio`)
    /// - `GESTIO_DEMO_MODE` (`1`/`true`/`yes`, default off)
    /// - `GESTIO_DEMO_SECRET` (default: [`DEFAULT_DEMO_SECRET`] in demo mode, empty otherwise)
    /// - `GESTIO_SEED_USERS` (default: same as demo mode)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let demo_mode = lookup("GESTIO_DEMO_MODE").is_some_and(|v| parse_flag(&v));

        let demo_secret = match lookup("GESTIO_DEMO_SECRET") {
            Some(secret) => secret,
            None if demo_mode => {
                tracing::warn!("GESTIO_DEMO_SECRET not set; using insecure demo default");
                DEFAULT_DEMO_SECRET.to_string()
            }
            None => String::new(),
        };

        let seed_demo_users = lookup("GESTIO_SEED_USERS").map_or(demo_mode, |v| parse_flag(&v));

        let storage_dir = lookup("GESTIO_STORAGE_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .or_else(default_storage_dir);

        Self {
            storage_dir,
            demo_mode,
            demo_secret,
            seed_demo_users,
        }
    }
}

/// `<platform data dir>/gestio`, when the platform has one.
pub fn default_storage_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("gestio"))
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
