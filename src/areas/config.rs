//! Repository configuration
//!
//! `.vcs/config` is a TOML document with one table per section:
//!
//! ```toml
//! [user]
//! name = "Jane Doe"
//! email = "jane@example.com"
//! ```
//!
//! Keys are addressed as `<section>.<name>`; the name is whatever follows the
//! last dot, so `branch.main.remote` lives in table `"branch.main"`.

use crate::artifacts::core::lockfile::Lockfile;
use crate::errors::VcsError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
struct Sections(BTreeMap<String, BTreeMap<String, String>>);

#[derive(Debug)]
pub struct Config {
    path: Box<Path>,
}

impl Config {
    pub fn new(path: Box<Path>) -> Self {
        Config { path }
    }

    fn read(&self) -> anyhow::Result<Sections> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => toml::from_str(&content)
                .with_context(|| format!("unable to parse config {}", self.path.display())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Sections::default()),
            Err(err) => {
                Err(err).with_context(|| format!("unable to read config {}", self.path.display()))
            }
        }
    }

    pub fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let (section, name) = split_key(key)?;

        Ok(self
            .read()?
            .0
            .get(section)
            .and_then(|values| values.get(name))
            .cloned())
    }

    pub fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let (section, name) = split_key(key)?;

        let mut lock = Lockfile::acquire(&self.path)?;
        let mut sections = self.read()?;
        sections
            .0
            .entry(section.to_string())
            .or_default()
            .insert(name.to_string(), value.to_string());

        lock.write_all(toml::to_string(&sections)?.as_bytes())?;
        lock.commit()
    }

    /// Every `(section.name, value)` pair, sorted by key.
    pub fn entries(&self) -> anyhow::Result<Vec<(String, String)>> {
        Ok(self
            .read()?
            .0
            .into_iter()
            .flat_map(|(section, values)| {
                values
                    .into_iter()
                    .map(move |(name, value)| (format!("{section}.{name}"), value))
            })
            .collect())
    }
}

fn split_key(key: &str) -> anyhow::Result<(&str, &str)> {
    match key.rsplit_once('.') {
        Some((section, name)) if !section.is_empty() && !name.is_empty() => Ok((section, name)),
        _ => Err(VcsError::InvalidConfigKey(key.to_string()).into()),
    }
}
