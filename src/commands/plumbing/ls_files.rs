use crate::areas::repository::Repository;
use std::io::Write;

impl Repository {
    /// List index entries; `stage` adds mode, id and merge stage.
    pub async fn ls_files(&mut self, stage: bool) -> anyhow::Result<()> {
        let index = self.index();
        let mut index = index.lock().await;
        index.load()?;

        for entry in index.entries() {
            if stage {
                writeln!(
                    self.writer(),
                    "{} {} {}\t{}",
                    entry.mode(),
                    entry.oid,
                    entry.stage(),
                    entry.name.display()
                )?;
            } else {
                writeln!(self.writer(), "{}", entry.name.display())?;
            }
        }

        Ok(())
    }
}
