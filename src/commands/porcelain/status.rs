use crate::areas::repository::Repository;
use crate::artifacts::status::status_info::{Status, StatusInfo};
use std::io::Write;

impl Repository {
    /// Short status of the working tree. Only reads; the index file is not
    /// rewritten.
    pub async fn status(&mut self) -> anyhow::Result<StatusInfo> {
        let index = self.index();
        let mut index = index.lock().await;
        index.load()?;

        let info = Status::new(self).inspect(&index)?;
        for line in info.short_lines() {
            writeln!(self.writer(), "{line}")?;
        }

        Ok(info)
    }
}
