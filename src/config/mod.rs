//! Server configuration and the JSON-backed config store.

pub mod env;

pub use env::Credentials;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{Result, TesterError};

/// Default location of the config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "mcp_config.json";

/// Default token overhead when the config file does not set one.
pub const DEFAULT_TOKEN_OVERHEAD: u64 = 100;

/// How the tester reaches an MCP server.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ServerKind {
    Stdio,
    Http,
    Sse,
}

/// Descriptor for a single MCP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub server_type: ServerKind,
    #[serde(default)]
    pub command: Option<String>,
    /// Executable path, used for stdio servers when `command` is unset.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_auto_start")]
    pub auto_start: bool,
    #[serde(default)]
    pub env_vars: BTreeMap<String, String>,
}

fn default_auto_start() -> bool {
    true
}

impl ServerConfig {
    /// Stdio server launched from `command` with `args`.
    pub fn stdio(name: impl Into<String>, command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            server_type: ServerKind::Stdio,
            command: Some(command.into()),
            path: None,
            args,
            url: None,
            auto_start: true,
            env_vars: BTreeMap::new(),
        }
    }

    /// HTTP or SSE server reached at `url`.
    pub fn remote(name: impl Into<String>, kind: ServerKind, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            server_type: kind,
            command: None,
            path: None,
            args: Vec::new(),
            url: Some(url.into()),
            auto_start: true,
            env_vars: BTreeMap::new(),
        }
    }

    /// The program to spawn for a stdio server. A blank `command` falls back
    /// to `path`.
    pub fn executable(&self) -> Option<&str> {
        let non_blank = |value: &&str| !value.trim().is_empty();
        self.command
            .as_deref()
            .filter(non_blank)
            .or_else(|| self.path.as_deref().filter(non_blank))
    }

    /// Check that the connection parameters match the transport kind.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(TesterError::Configuration(
                "server name must not be empty".into(),
            ));
        }
        match self.server_type {
            ServerKind::Stdio if self.executable().is_none() => Err(TesterError::Configuration(
                format!("stdio server '{}' needs --command or --path", self.name),
            )),
            ServerKind::Http | ServerKind::Sse
                if self.url.as_deref().map_or(true, |u| u.trim().is_empty()) =>
            {
                Err(TesterError::Configuration(format!(
                    "{} server '{}' needs --url",
                    self.server_type, self.name
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Root of the persisted config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TesterConfig {
    #[serde(default)]
    pub servers: BTreeMap<String, ServerConfig>,
    #[serde(default)]
    pub default_server: Option<String>,
    #[serde(default = "default_token_overhead")]
    pub token_overhead: u64,
}

fn default_token_overhead() -> u64 {
    DEFAULT_TOKEN_OVERHEAD
}

impl Default for TesterConfig {
    fn default() -> Self {
        Self {
            servers: BTreeMap::new(),
            default_server: None,
            token_overhead: DEFAULT_TOKEN_OVERHEAD,
        }
    }
}

/// Name-keyed server store persisted to a JSON file.
///
/// Every mutation is applied in memory first and then written to disk. A
/// failed write is returned to the caller, but the in-memory change stays.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    config: TesterConfig,
}

impl ConfigStore {
    /// Open the store at `path`, loading existing contents.
    ///
    /// A missing file yields an empty config. A file that cannot be read or
    /// parsed is reported and replaced by an empty config in memory.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Error loading config");
                TesterConfig::default()
            }
        };
        Self { path, config }
    }

    /// Build a store around an in-memory config without touching disk.
    pub fn with_config(path: impl Into<PathBuf>, config: TesterConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    fn load(path: &Path) -> Result<TesterConfig> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, starting empty");
            return Ok(TesterConfig::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write the current config to disk.
    pub fn save(&self) -> Result<()> {
        let raw = serde_json::to_string_pretty(&self.config)?;
        std::fs::write(&self.path, raw)?;
        debug!(path = %self.path.display(), "saved config");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &TesterConfig {
        &self.config
    }

    pub fn token_overhead(&self) -> u64 {
        self.config.token_overhead
    }

    /// Insert or replace a server by name, then persist.
    ///
    /// The first server added becomes the default.
    pub fn add(&mut self, server: ServerConfig) -> Result<()> {
        if self.config.default_server.is_none() {
            self.config.default_server = Some(server.name.clone());
        }
        self.config.servers.insert(server.name.clone(), server);
        self.save()
    }

    /// Remove a server by name, then persist.
    ///
    /// Returns `Ok(false)` without touching the store when no server has that
    /// name. Removing the default promotes the first remaining server.
    pub fn remove(&mut self, name: &str) -> Result<bool> {
        if self.config.servers.remove(name).is_none() {
            return Ok(false);
        }
        if self.config.default_server.as_deref() == Some(name) {
            self.config.default_server = self.config.servers.keys().next().cloned();
        }
        self.save()?;
        Ok(true)
    }

    /// Mark an existing server as default, then persist.
    pub fn set_default(&mut self, name: &str) -> Result<bool> {
        if !self.config.servers.contains_key(name) {
            return Ok(false);
        }
        self.config.default_server = Some(name.to_string());
        self.save()?;
        Ok(true)
    }

    pub fn get(&self, name: &str) -> Option<&ServerConfig> {
        self.config.servers.get(name)
    }

    /// Names of all configured servers, in key order.
    pub fn list(&self) -> Vec<&str> {
        self.config.servers.keys().map(String::as_str).collect()
    }

    pub fn default_name(&self) -> Option<&str> {
        self.config.default_server.as_deref()
    }

    pub fn default_server(&self) -> Option<&ServerConfig> {
        self.config
            .default_server
            .as_deref()
            .and_then(|name| self.config.servers.get(name))
    }

    pub fn is_default(&self, name: &str) -> bool {
        self.default_name() == Some(name)
    }

    /// Look up a named server, or the default when no name is given.
    pub fn resolve(&self, name: Option<&str>) -> Result<&ServerConfig> {
        match name {
            Some(name) => self
                .get(name)
                .ok_or_else(|| TesterError::ServerNotFound(name.to_string())),
            None => self.default_server().ok_or_else(|| {
                TesterError::Configuration("No server configuration found.".into())
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> ConfigStore {
        ConfigStore::open(dir.path().join("mcp_config.json"))
    }

    #[test]
    fn first_added_server_becomes_default() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        store
            .add(ServerConfig::stdio("files", "npx", vec!["server".into()]))
            .unwrap();
        store
            .add(ServerConfig::remote("web", ServerKind::Http, "http://localhost:3000/mcp"))
            .unwrap();

        assert_eq!(store.default_name(), Some("files"));
        assert_eq!(store.list(), vec!["files", "web"]);
    }

    #[test]
    fn removing_default_promotes_remaining_server() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.add(ServerConfig::stdio("a", "cmd-a", vec![])).unwrap();
        store.add(ServerConfig::stdio("b", "cmd-b", vec![])).unwrap();

        assert!(store.remove("a").unwrap());
        assert_eq!(store.default_name(), Some("b"));

        assert!(store.remove("b").unwrap());
        assert_eq!(store.default_name(), None);
        assert!(store.list().is_empty());
    }

    #[test]
    fn removing_non_default_keeps_default() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.add(ServerConfig::stdio("a", "cmd-a", vec![])).unwrap();
        store.add(ServerConfig::stdio("b", "cmd-b", vec![])).unwrap();

        assert!(store.remove("b").unwrap());
        assert_eq!(store.default_name(), Some("a"));
    }

    #[test]
    fn removing_unknown_server_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.add(ServerConfig::stdio("a", "cmd-a", vec![])).unwrap();
        let before = store.config().clone();

        assert!(!store.remove("missing").unwrap());
        assert_eq!(store.config(), &before);
    }

    #[test]
    fn add_overwrites_by_name() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.add(ServerConfig::stdio("a", "old", vec![])).unwrap();
        store.add(ServerConfig::stdio("a", "new", vec![])).unwrap();

        assert_eq!(store.list().len(), 1);
        assert_eq!(store.get("a").unwrap().command.as_deref(), Some("new"));
    }

    #[test]
    fn mutations_are_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mcp_config.json");
        {
            let mut store = ConfigStore::open(&path);
            store.add(ServerConfig::stdio("a", "cmd-a", vec![])).unwrap();
            store
                .add(ServerConfig::remote("b", ServerKind::Sse, "http://localhost/sse"))
                .unwrap();
            assert!(store.set_default("b").unwrap());
        }

        let reopened = ConfigStore::open(&path);
        assert_eq!(reopened.default_name(), Some("b"));
        assert_eq!(reopened.get("b").unwrap().server_type, ServerKind::Sse);
        assert_eq!(reopened.token_overhead(), DEFAULT_TOKEN_OVERHEAD);
    }

    #[test]
    fn set_default_rejects_unknown_name() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.add(ServerConfig::stdio("a", "cmd-a", vec![])).unwrap();

        assert!(!store.set_default("zzz").unwrap());
        assert_eq!(store.default_name(), Some("a"));
    }

    #[test]
    fn persistence_failure_still_updates_memory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("mcp_config.json");
        let mut store = ConfigStore::open(&path);

        let result = store.add(ServerConfig::stdio("a", "cmd-a", vec![]));
        assert!(matches!(result, Err(TesterError::Io(_))));
        assert_eq!(store.default_name(), Some("a"));
        assert!(store.get("a").is_some());
    }

    #[test]
    fn corrupt_file_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mcp_config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = ConfigStore::open(&path);
        assert!(store.list().is_empty());
        assert_eq!(store.default_name(), None);
    }

    #[test]
    fn file_format_uses_snake_case_keys() {
        let mut config = TesterConfig::default();
        config.servers.insert(
            "a".into(),
            ServerConfig::stdio("a", "python", vec!["server.py".into()]),
        );
        config.default_server = Some("a".into());

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["default_server"], "a");
        assert_eq!(value["token_overhead"], 100);
        assert_eq!(value["servers"]["a"]["server_type"], "stdio");
        assert_eq!(value["servers"]["a"]["auto_start"], true);
    }

    #[test]
    fn minimal_descriptor_fills_defaults() {
        let server: ServerConfig = serde_json::from_value(serde_json::json!({
            "name": "web",
            "server_type": "http",
            "url": "http://localhost:8000/mcp"
        }))
        .unwrap();

        assert!(server.auto_start);
        assert!(server.args.is_empty());
        assert!(server.env_vars.is_empty());
    }

    #[test]
    fn resolve_prefers_named_then_default() {
        let mut config = TesterConfig::default();
        config
            .servers
            .insert("a".into(), ServerConfig::stdio("a", "cmd", vec![]));
        config.default_server = Some("a".into());
        let store = ConfigStore::with_config("unused.json", config);

        assert_eq!(store.resolve(None).unwrap().name, "a");
        assert_eq!(store.resolve(Some("a")).unwrap().name, "a");
        assert!(matches!(
            store.resolve(Some("b")),
            Err(TesterError::ServerNotFound(name)) if name == "b"
        ));
    }

    #[test]
    fn validate_checks_connection_parameters() {
        assert!(ServerConfig::stdio("a", "node", vec![]).validate().is_ok());

        let mut by_path = ServerConfig::stdio("a", "", vec![]);
        by_path.command = None;
        assert!(by_path.validate().is_err());
        by_path.path = Some("/usr/local/bin/server".into());
        assert!(by_path.validate().is_ok());
        assert_eq!(by_path.executable(), Some("/usr/local/bin/server"));

        let mut http = ServerConfig::remote("h", ServerKind::Http, "http://x/mcp");
        assert!(http.validate().is_ok());
        http.url = None;
        assert!(http.validate().is_err());
    }

    #[test]
    fn blank_command_falls_back_to_path() {
        let mut server = ServerConfig::stdio("a", "", vec![]);
        assert_eq!(server.executable(), None);

        server.path = Some("/bin/x".into());
        assert_eq!(server.executable(), Some("/bin/x"));
        assert!(server.validate().is_ok());

        server.command = Some("node".into());
        assert_eq!(server.executable(), Some("node"));
    }

    #[test]
    fn server_kind_parses_case_insensitively() {
        assert_eq!("SSE".parse::<ServerKind>().unwrap(), ServerKind::Sse);
        assert_eq!(ServerKind::Http.to_string(), "http");
        assert!("ws".parse::<ServerKind>().is_err());
    }
}
