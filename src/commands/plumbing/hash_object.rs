use crate::areas::repository::Repository;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use bytes::Bytes;
use std::io::Write;
use std::path::Path;

impl Repository {
    /// Print the blob id of a file, storing the blob when `write` is set.
    pub async fn hash_object(&mut self, file_path: &Path, write: bool) -> anyhow::Result<ObjectId> {
        let data = std::fs::read(file_path)
            .with_context(|| format!("unable to read {}", file_path.display()))?;
        let blob = Blob::new(Bytes::from(data));

        let oid = if write {
            self.database().store(&blob)?
        } else {
            blob.object_id()?
        };

        writeln!(self.writer(), "{oid}")?;

        Ok(oid)
    }
}
