//! Connection options and the projector registry
//!
//! The registry maps a human readable projector name to its IP address:
//!
//! ```json
//! { "projector": { "main-hall": "10.0.151.20" } }
//! ```

use std::{collections::BTreeMap, fs, io, path::{Path, PathBuf}, time::Duration};

use serde::Deserialize;
use thiserror::Error;

use crate::DEFAULT_PORT;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Options used when opening a [crate::Connection]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    /// TCP port of the projector control service
    pub port: u16,
    /// Give up connecting after this long (`None` waits for the OS)
    pub connect_timeout: Option<Duration>,
    /// Give up waiting for an answer after this long (`None` blocks forever)
    pub read_timeout: Option<Duration>,
    /// Give up sending after this long (`None` blocks forever)
    pub write_timeout: Option<Duration>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            connect_timeout: Some(DEFAULT_TIMEOUT),
            read_timeout: Some(DEFAULT_TIMEOUT),
            write_timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl ConnectOptions {
    /// Create a new options builder
    pub fn builder() -> ConnectOptionsBuilder {
        ConnectOptionsBuilder::default()
    }
}

/// Builder for [ConnectOptions]
#[derive(Debug, Default)]
pub struct ConnectOptionsBuilder {
    options: ConnectOptions,
}

impl ConnectOptionsBuilder {
    /// Set the TCP port
    pub fn port(mut self, port: u16) -> Self {
        self.options.port = port;
        self
    }

    /// Set the connect timeout
    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.options.connect_timeout = timeout;
        self
    }

    /// Set the read timeout
    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.options.read_timeout = timeout;
        self
    }

    /// Set the write timeout
    pub fn write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.options.write_timeout = timeout;
        self
    }

    /// Set connect, read and write timeouts at once
    pub fn timeout(self, timeout: Option<Duration>) -> Self {
        self.connect_timeout(timeout).read_timeout(timeout).write_timeout(timeout)
    }

    /// Build the options
    pub fn build(self) -> ConnectOptions {
        self.options
    }
}

/// Projector names and their addresses
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProjectorRegistry {
    #[serde(rename = "projector")]
    projectors: BTreeMap<String, String>,
}

impl ProjectorRegistry {
    /// Locations searched by [ProjectorRegistry::discover], in order
    pub fn default_locations() -> Vec<PathBuf> {
        let mut locations = vec![PathBuf::from("/etc/ents/projectors.json")];
        if let Some(home) = dirs::home_dir() {
            locations.push(home.join(".ents-projector-control.config.json"));
        }
        locations.push(PathBuf::from("config.json"));
        locations
    }

    /// Load the first existing file among `locations`
    pub fn discover<P: AsRef<Path>>(locations: &[P]) -> Result<Self, Error> {
        for location in locations {
            let location = location.as_ref();
            if location.is_file() {
                tracing::debug!("Loading projector registry from {}", location.display());
                return Self::load(location);
            }
        }

        Err(Error::NotFound {
            searched: locations.iter().map(|it| it.as_ref().to_path_buf()).collect(),
        })
    }

    /// Load a registry file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
        serde_json::from_str(&content)
            .map_err(|source| Error::Parse { path: path.to_path_buf(), source })
    }

    /// Address of a projector. Names are case sensitive.
    pub fn address_of(&self, name: &str) -> Result<&str, Error> {
        self.projectors
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownProjector {
                name: name.to_string(),
                known: self.projectors.keys().cloned().collect(),
            })
    }

    /// Known projector names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.projectors.keys().map(String::as_str)
    }
}

/// Error that can occur while loading the projector registry
#[derive(Debug, Error)]
pub enum Error {
    /// Registry file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },
    /// Registry file is not valid
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        /// File being parsed
        path: PathBuf,
        /// Underlying error
        source: serde_json::Error,
    },
    /// None of the searched locations exist
    #[error("Could not find a configuration file, searched: {}", display_paths(searched))]
    NotFound {
        /// Locations searched
        searched: Vec<PathBuf>,
    },
    /// Name is not in the registry
    #[error("Unknown projector '{name}', must be one of {known:?}")]
    UnknownProjector {
        /// Name requested
        name: String,
        /// Names in the registry
        known: Vec<String>,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths.iter().map(|it| it.display().to_string()).collect::<Vec<_>>().join(", ")
}
