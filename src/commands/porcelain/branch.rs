use crate::areas::refs::Head;
use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::errors::VcsError;
use colored::Colorize;
use std::io::Write;

impl Repository {
    /// Create `name` at `start`, or at HEAD when no start is given.
    pub async fn create_branch(&mut self, name: &str, start: Option<&str>) -> anyhow::Result<()> {
        let branch_name = BranchName::try_parse(name)?;

        let start_oid = match start {
            Some(start) => self.resolve_commit(start)?,
            None => self
                .refs()
                .read_head()?
                .ok_or_else(|| VcsError::TargetNotFound("HEAD".to_string()))?,
        };

        self.refs().create_branch(&branch_name, &start_oid)
    }

    pub async fn delete_branch(&mut self, name: &str) -> anyhow::Result<()> {
        let branch_name = BranchName::try_parse(name)?;
        let oid = self.refs().delete_branch(&branch_name)?;

        writeln!(
            self.writer(),
            "Deleted branch {branch_name} (was {}).",
            oid.to_short_oid()
        )?;

        Ok(())
    }

    /// Every branch, the current one marked with `*`.
    pub async fn list_branches(&mut self) -> anyhow::Result<()> {
        let head = self.refs().head()?;

        if let Head::Detached(oid) = &head {
            writeln!(
                self.writer(),
                "* {}",
                format!("(HEAD detached at {})", oid.to_short_oid()).green()
            )?;
        }

        for branch in self.refs().list_branches()? {
            if head == Head::Attached(branch.clone()) {
                writeln!(self.writer(), "* {}", branch.to_string().green())?;
            } else {
                writeln!(self.writer(), "  {branch}")?;
            }
        }

        Ok(())
    }
}
