// Copyright (c) 2024 The filedrop developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Runtime settings of the server.
//!
//! The defaults listen on every interface on port 8075 and store uploads in `incoming/`. Each
//! setting can be overridden through the environment:
//!
//! | Variable               | Setting                              |
//! |------------------------|--------------------------------------|
//! | `FILEDROP_HOST`        | interface to listen on               |
//! | `FILEDROP_PORT`        | port to listen on                    |
//! | `FILEDROP_UPLOAD_DIR`  | directory uploads are written to     |
//! | `FILEDROP_STATIC_ROOT` | directory static files are served from |
//! | `FILEDROP_LOG_FILE`    | log file; empty to disable it        |
//! | `RUST_LOG`             | maximum log level                    |

use std::env;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::str::FromStr;

use log::LevelFilter;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8075;
pub const DEFAULT_UPLOAD_DIR: &str = "incoming";
pub const DEFAULT_LOG_FILE: &str = "upload_server.log";

quick_error! {
    /// Error that can happen when reading the configuration from the environment.
    #[derive(Debug)]
    pub enum ConfigError {
        /// `FILEDROP_PORT` is not a port number.
        Port(value: String, err: ParseIntError) {
            display("invalid port {:?}: {}", value, err)
            cause(err)
        }
        /// `RUST_LOG` is not a log level.
        Level(value: String) {
            display("invalid log level {:?}", value)
        }
    }
}

/// Settings of the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub static_root: PathBuf,
    /// `None` disables the log file.
    pub log_file: Option<PathBuf>,
    pub log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            static_root: PathBuf::from("."),
            log_file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
            log_level: LevelFilter::Info,
        }
    }
}

impl Config {
    /// Reads the configuration from the environment of the process.
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_vars(|key| env::var(key).ok())
    }

    /// Builds the configuration from the defaults, overridden by the variables `lookup` knows.
    ///
    /// # Example
    ///
    /// ```
    /// use filedrop::config::Config;
    ///
    /// let config = Config::from_vars(|key| match key {
    ///     "FILEDROP_PORT" => Some("9000".to_owned()),
    ///     _ => None,
    /// }).unwrap();
    ///
    /// assert_eq!(config.addr(), "0.0.0.0:9000");
    /// ```
    pub fn from_vars<F>(lookup: F) -> Result<Config, ConfigError> where F: Fn(&str) -> Option<String> {
        let mut config = Config::default();

        if let Some(host) = lookup("FILEDROP_HOST") {
            config.host = host;
        }

        if let Some(port) = lookup("FILEDROP_PORT") {
            config.port = match port.trim().parse() {
                Ok(p) => p,
                Err(err) => return Err(ConfigError::Port(port, err)),
            };
        }

        if let Some(dir) = lookup("FILEDROP_UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(dir);
        }

        if let Some(root) = lookup("FILEDROP_STATIC_ROOT") {
            config.static_root = PathBuf::from(root);
        }

        if let Some(file) = lookup("FILEDROP_LOG_FILE") {
            config.log_file = if file.is_empty() { None } else { Some(PathBuf::from(file)) };
        }

        if let Some(level) = lookup("RUST_LOG") {
            config.log_level = match LevelFilter::from_str(level.trim()) {
                Ok(l) => l,
                Err(_) => return Err(ConfigError::Level(level)),
            };
        }

        Ok(config)
    }

    /// The address to listen on, as `host:port`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
