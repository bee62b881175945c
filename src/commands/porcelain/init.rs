use crate::areas::repository::Repository;
use crate::artifacts::branch::DEFAULT_BRANCH;
use crate::artifacts::branch::branch_name::BranchName;
use anyhow::Context;
use std::fs;
use std::io::Write;
use tracing::info;

impl Repository {
    /// Create the repository layout. Running it again leaves existing state
    /// alone.
    pub async fn init(&mut self) -> anyhow::Result<()> {
        let reinitialized = self.refs().head_path().exists();

        fs::create_dir_all(self.database().objects_path())
            .context("unable to create the objects directory")?;
        fs::create_dir_all(self.refs().heads_path())
            .context("unable to create the refs/heads directory")?;

        if !reinitialized {
            self.refs()
                .set_head_to_branch(&BranchName::try_parse(DEFAULT_BRANCH)?)
                .context("unable to create the initial HEAD")?;
            info!(path = %self.path().display(), "repository created");
        }

        let verb = if reinitialized {
            "Reinitialized existing"
        } else {
            "Initialized empty"
        };
        writeln!(
            self.writer(),
            "{verb} repository in {}",
            self.repository_path().display()
        )?;

        Ok(())
    }
}
