use crate::areas::repository::Repository;
use crate::artifacts::branch::revision::Revision;
use crate::artifacts::objects::object::ObjectBox;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::VcsError;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatFileMode {
    /// Content, rendered per kind
    Pretty,
    Type,
    Size,
}

impl Repository {
    pub async fn cat_file(&mut self, object: &str, mode: CatFileMode) -> anyhow::Result<()> {
        let oid = self.resolve_object(object)?;

        match mode {
            CatFileMode::Type => {
                let object_type = self.database().object_type(&oid)?;
                writeln!(self.writer(), "{object_type}")?;
            }
            CatFileMode::Size => {
                let (_, content) = self.database().load(&oid)?;
                writeln!(self.writer(), "{}", content.len())?;
            }
            CatFileMode::Pretty => match self.database().parse_object(&oid)? {
                ObjectBox::Blob(blob) => self.writer().write_all(blob.data())?,
                ObjectBox::Tree(tree) if tree.is_empty() => {}
                object => writeln!(self.writer(), "{}", object.as_object().display())?,
            },
        }

        Ok(())
    }

    /// Any object named by a revision expression or an id prefix.
    pub(crate) fn resolve_object(&self, expression: &str) -> anyhow::Result<ObjectId> {
        let not_found = || VcsError::ObjectNotFound(expression.to_string());

        let revision = Revision::try_parse(expression).map_err(|_| not_found())?;
        let oid = revision
            .resolve(self.refs(), self.database())?
            .ok_or_else(not_found)?;

        Ok(oid)
    }

    pub(crate) fn resolve_commit(&self, expression: &str) -> anyhow::Result<ObjectId> {
        Revision::resolve_commit(expression, self.refs(), self.database())
    }
}
