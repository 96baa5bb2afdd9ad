//! Config file parsing and validation.
//!
//! The config file is a list of `key=value` lines. Any key can be scoped to
//! a single domain by prefixing it, e.g. `api.example.com.storage_expires=1h`.
//! Domain scoped keys win over global ones.

use crate::api_defaults::{DEFAULT_STORAGE_EXPIRES, USER_AGENT};
use crate::error::{AddContext, FFError};
use crate::log_debug;
use crate::time::Seconds;
use crate::Result;
use std::{collections::HashMap, fs::File, io::Read, path::Path, sync::Arc};

pub trait ConfigProperties {
    fn storage_location(&self) -> &str;
    fn storage_expires(&self) -> Seconds {
        Seconds::new(DEFAULT_STORAGE_EXPIRES)
    }
    fn timeout(&self) -> Option<Seconds> {
        None
    }
    fn user_agent(&self) -> &str {
        USER_AGENT
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    storage_location: String,
    storage_expires: Seconds,
    timeout: Option<Seconds>,
    user_agent: String,
}

impl Config {
    /// Defaults for a storage directory. Used when there is no config file.
    pub fn with_storage_location(storage_location: &str) -> Self {
        Config {
            storage_location: storage_location.to_string(),
            storage_expires: Seconds::new(DEFAULT_STORAGE_EXPIRES),
            timeout: None,
            user_agent: USER_AGENT.to_string(),
        }
    }

    /// Read config data for `domain`. `default_storage_location` is used when
    /// the file does not set `storage_location`.
    pub fn new<T: Read>(reader: T, domain: &str, default_storage_location: &str) -> Result<Self> {
        let config_data = Config::parse(reader, domain)?;
        let storage_location = config_data
            .get("storage_location")
            .map(|s| s.as_str())
            .unwrap_or(default_storage_location);
        let storage_expires = match config_data.get("storage_expires") {
            Some(value) => Config::time_value("storage_expires", value)?,
            None => Seconds::new(DEFAULT_STORAGE_EXPIRES),
        };
        let timeout = config_data
            .get("timeout")
            .map(|value| Config::time_value("timeout", value))
            .transpose()?;
        let user_agent = config_data
            .get("user_agent")
            .map(|s| s.as_str())
            .unwrap_or(USER_AGENT);

        Ok(Config {
            storage_location: storage_location.to_string(),
            storage_expires,
            timeout,
            user_agent: user_agent.to_string(),
        })
    }

    fn time_value(key: &str, value: &str) -> Result<Seconds> {
        Seconds::try_from(value).map_err(|err| {
            FFError::ConfigurationError(format!(
                "Invalid value {value} for {key}. Expected a time like 30s, 5m, 1h: {err}"
            ))
            .into()
        })
    }

    fn parse<T: Read>(mut reader: T, domain: &str) -> Result<HashMap<String, String>> {
        lazy_static! {
            static ref RE_LINE: regex::Regex =
                regex::Regex::new(r"^(?P<key>[\w.\-]+?)\s*=\s*(?P<value>.*)$").unwrap();
        }
        let mut config_data = String::new();
        reader.read_to_string(&mut config_data)?;
        let domain_prefix = format!("{}.", domain);
        let mut global_config = HashMap::new();
        let mut domain_config = HashMap::new();

        for line in config_data.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some(captured_names) = RE_LINE.captures(line) else {
                return Err(FFError::ConfigurationError(format!(
                    "Invalid config line: {line}"
                ))
                .into());
            };
            let key = &captured_names["key"];
            let value = captured_names["value"].trim().to_string();
            if !domain.is_empty() {
                if let Some(domain_key) = key.strip_prefix(&domain_prefix) {
                    domain_config.insert(domain_key.to_string(), value);
                    continue;
                }
            }
            // Keys scoped to other domains are not ours.
            if !key.contains('.') {
                global_config.insert(key.to_string(), value);
            }
        }

        global_config.extend(domain_config);
        Ok(global_config)
    }
}

impl ConfigProperties for Config {
    fn storage_location(&self) -> &str {
        &self.storage_location
    }

    fn storage_expires(&self) -> Seconds {
        self.storage_expires
    }

    fn timeout(&self) -> Option<Seconds> {
        self.timeout
    }

    fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl<T: ConfigProperties + ?Sized> ConfigProperties for Arc<T> {
    fn storage_location(&self) -> &str {
        (**self).storage_location()
    }

    fn storage_expires(&self) -> Seconds {
        (**self).storage_expires()
    }

    fn timeout(&self) -> Option<Seconds> {
        (**self).timeout()
    }

    fn user_agent(&self) -> &str {
        (**self).user_agent()
    }
}

/// Load the config file at `path` for requests against `domain`. A missing
/// file is not an error, defaults apply.
pub fn read_config<P: AsRef<Path>>(
    path: P,
    domain: &str,
    default_storage_location: &str,
) -> Result<Arc<Config>> {
    let path = path.as_ref();
    if !path.exists() {
        log_debug!("No config file at {}, using defaults", path.display());
        return Ok(Arc::new(Config::with_storage_location(
            default_storage_location,
        )));
    }
    let f = File::open(path).map_err(|err| {
        FFError::ConfigurationError(format!("Unable to open {}: {err}", path.display()))
    })?;
    let config = Config::new(f, domain, default_storage_location)
        .err_context(format!("Reading config file {}", path.display()))?;
    Ok(Arc::new(config))
}

/// Host part of an http(s) URL, used to pick domain scoped config keys.
/// Empty if the URL has no recognizable host.
pub fn domain_of(url: &str) -> &str {
    lazy_static! {
        static ref RE_DOMAIN: regex::Regex =
            regex::Regex::new(r"^(?:[a-zA-Z][a-zA-Z0-9+.\-]*://)?(?:[^@/]*@)?(?P<domain>[^:/?#]+)")
                .unwrap();
    }
    RE_DOMAIN
        .captures(url)
        .and_then(|captured| captured.name("domain"))
        .map(|domain| domain.as_str())
        .unwrap_or("")
}
