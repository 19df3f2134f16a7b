//! SSH Hosts.
//!
//! Hosts come either from the comma separated `--hosts` flag or from a host
//! file. A host file groups hosts into sections, INI style:
//!
//! ```text
//! [web]
//! web1.example.com
//! deploy@web2.example.com:2222
//!
//! [db]
//! db1.example.com
//! ```
//!
//! Files ending in `.yaml`/`.yml` are read as YAML instead: either a plain
//! list of hosts, or a mapping from section name to a list of hosts.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::config::Config;
use crate::error::HostFileError;

/// Name of the section holding hosts listed before any section header.
pub const DEFAULT_SECTION: &str = "DEFAULT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    /// Login user given inline as `user@host`.
    pub user: Option<String>,
    /// SSH hostname to connect to.
    pub hostname: String,
    /// Port given inline as `host:port`.
    pub port: Option<u16>,
}

impl Host {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            user: None,
            hostname: hostname.into(),
            port: None,
        }
    }

    /// The address ssh expects as its destination argument.
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.hostname),
            None => self.hostname.clone(),
        }
    }
}

impl FromStr for Host {
    type Err = HostFileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |why: &str| HostFileError::InvalidHost(s.to_string(), why.to_string());
        let s = s.trim();

        let (user, rest) = match s.rsplit_once('@') {
            Some((user, _)) if user.is_empty() => return Err(invalid("empty user")),
            Some((user, _)) if user.starts_with('-') => return Err(invalid("user starts with '-'")),
            Some((user, rest)) => (Some(user.to_string()), rest),
            None => (None, s),
        };

        let (hostname, port) = if let Some(bracketed) = rest.strip_prefix('[') {
            // [v6-address] or [v6-address]:port
            let (addr, after) = bracketed
                .split_once(']')
                .ok_or_else(|| invalid("missing ']'"))?;
            match after {
                "" => (addr, None),
                _ => match after.strip_prefix(':') {
                    Some(port) => (addr, Some(port)),
                    None => return Err(invalid("unexpected text after ']'")),
                },
            }
        } else if rest.matches(':').count() == 1 {
            let (host, port) = rest.split_once(':').unwrap_or((rest, ""));
            (host, Some(port))
        } else {
            // Either no port, or a bare IPv6 address.
            (rest, None)
        };

        if hostname.is_empty() {
            return Err(invalid("empty hostname"));
        }
        // ssh would read it as an option.
        if hostname.starts_with('-') {
            return Err(invalid("hostname starts with '-'"));
        }
        let port = match port {
            Some(port) => match port.parse::<u16>() {
                Ok(0) | Err(_) => return Err(invalid("bad port")),
                Ok(port) => Some(port),
            },
            None => None,
        };

        Ok(Self {
            user,
            hostname: hostname.to_string(),
            port,
        })
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(user) = &self.user {
            write!(f, "{}@", user)?;
        }
        match self.port {
            Some(port) if self.hostname.contains(':') => write!(f, "[{}]:{}", self.hostname, port),
            Some(port) => write!(f, "{}:{}", self.hostname, port),
            None => write!(f, "{}", self.hostname),
        }
    }
}

/// Splits a comma separated host list, dropping blank entries.
pub fn parse_host_list(hosts: &str) -> Vec<String> {
    hosts
        .split(',')
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(str::to_string)
        .collect()
}

/// Hosts grouped into named sections, in file order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Inventory {
    sections: Vec<(String, Vec<String>)>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum YamlInventory {
    Hosts(Vec<String>),
    Sections(serde_yaml::Mapping),
}

impl Inventory {
    /// Reads a host file, choosing YAML or INI by extension.
    pub fn load(path: &Path) -> Result<Self, HostFileError> {
        let text = std::fs::read_to_string(path).map_err(|source| HostFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml {
            Self::parse_yaml(&text).map_err(|source| HostFileError::Yaml {
                path: path.to_path_buf(),
                source,
            })
        } else {
            Ok(Self::parse_ini(&text))
        }
    }

    /// Parses an INI style host file.
    ///
    /// Section bodies are taken verbatim: every non-blank, non-comment line
    /// is one host, even if it looks like `key=value`.
    pub fn parse_ini(text: &str) -> Self {
        let mut inventory = Self::default();
        let mut current = DEFAULT_SECTION.to_string();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(name) = section_header(line) {
                current = name.to_string();
                inventory.section_mut(&current);
                continue;
            }
            inventory.section_mut(&current).push(line.to_string());
        }
        inventory
    }

    /// Parses a YAML host file.
    pub fn parse_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        let mut inventory = Self::default();
        if text.trim().is_empty() {
            return Ok(inventory);
        }
        match serde_yaml::from_str::<Option<YamlInventory>>(text)? {
            None => {}
            Some(YamlInventory::Hosts(hosts)) => {
                inventory.section_mut(DEFAULT_SECTION).extend(hosts);
            }
            Some(YamlInventory::Sections(mapping)) => {
                for (name, hosts) in mapping {
                    let name: String = serde_yaml::from_value(name)?;
                    let hosts: Option<Vec<String>> = serde_yaml::from_value(hosts)?;
                    inventory
                        .section_mut(name.trim())
                        .extend(hosts.unwrap_or_default());
                }
            }
        }
        for (_, hosts) in inventory.sections.iter_mut() {
            hosts.retain(|host| !host.trim().is_empty());
            hosts.iter_mut().for_each(|host| *host = host.trim().to_string());
        }
        Ok(inventory)
    }

    /// Section names in file order.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(name, _)| name.as_str())
    }

    /// Hosts of one section, or of every section when `section` is empty.
    pub fn hosts(&self, section: &str) -> Result<Vec<String>, HostFileError> {
        let section = section.trim();
        if section.is_empty() {
            return Ok(self
                .sections
                .iter()
                .flat_map(|(_, hosts)| hosts.iter().cloned())
                .collect());
        }
        self.sections
            .iter()
            .find(|(name, _)| name == section)
            .map(|(_, hosts)| hosts.clone())
            .ok_or_else(|| HostFileError::NoSuchSection(section.to_string()))
    }

    fn section_mut(&mut self, name: &str) -> &mut Vec<String> {
        let index = match self.sections.iter().position(|(n, _)| n == name) {
            Some(index) => index,
            None => {
                self.sections.push((name.to_string(), vec![]));
                self.sections.len() - 1
            }
        };
        &mut self.sections[index].1
    }
}

/// A `[name]` line, unless the brackets hold an IPv6 address like `[::1]`.
fn section_header(line: &str) -> Option<&str> {
    let name = line.strip_prefix('[')?.strip_suffix(']')?.trim();
    if name.contains(':') {
        None
    } else {
        Some(name)
    }
}

/// Works out the hosts to run on. The host file wins over `--hosts`.
pub fn resolve_hosts(config: &Config) -> Result<Vec<Host>, HostFileError> {
    let names = match &config.host_file {
        Some(path) => Inventory::load(path)?.hosts(&config.section)?,
        None => parse_host_list(&config.hosts),
    };
    if names.is_empty() {
        return Err(HostFileError::Empty);
    }
    let hosts = names
        .iter()
        .map(|name| name.parse())
        .collect::<Result<Vec<Host>, _>>()?;
    log::debug!("Hosts detected: {:?}", hosts);
    Ok(hosts)
}
