use crate::areas::repository::Repository;
use std::io::Write;

impl Repository {
    pub async fn config_get(&mut self, key: &str) -> anyhow::Result<()> {
        match self.config().get(key)? {
            Some(value) => writeln!(self.writer(), "{value}")?,
            None => anyhow::bail!("config key '{key}' is not set"),
        }

        Ok(())
    }

    pub async fn config_set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.config().set(key, value)
    }

    /// Every `key=value` pair, sorted by key.
    pub async fn config_list(&mut self) -> anyhow::Result<()> {
        for (key, value) in self.config().entries()? {
            writeln!(self.writer(), "{key}={value}")?;
        }

        Ok(())
    }
}
