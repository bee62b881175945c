//! Content-addressed object store
//!
//! Objects live zlib-compressed at `objects/<2 hex>/<38 hex>`. Writes go to a
//! temporary file in the target directory followed by a rename, so concurrent
//! writers of the same object are harmless and a crash never leaves a partial
//! object behind. Reads re-hash the payload and reject anything that does not
//! match its name.

use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, ObjectBox, Unpackable, hash_bytes};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use crate::artifacts::objects::{MIN_PREFIX_LENGTH, OBJECT_ID_LENGTH};
use crate::errors::VcsError;
use anyhow::Context;
use bytes::Bytes;
use fake::rand;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use tracing::debug;

#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, object_id: &ObjectId) -> bool {
        self.path.join(object_id.to_path()).is_file()
    }

    /// Persist an object and return its id. Existing objects are not rewritten.
    pub fn store(&self, object: &dyn Object) -> anyhow::Result<ObjectId> {
        let object_content = object.serialize()?;
        let object_id = hash_bytes(&object_content);
        let object_path = self.path.join(object_id.to_path());

        if self.contains(&object_id) {
            return Ok(object_id);
        }

        let object_dir = object_path
            .parent()
            .with_context(|| format!("invalid object path {}", object_path.display()))?;
        std::fs::create_dir_all(object_dir).with_context(|| {
            format!("unable to create object directory {}", object_dir.display())
        })?;

        self.write_object(&object_path, object_content)?;
        debug!(oid = %object_id, kind = %object.object_type(), "stored object");

        Ok(object_id)
    }

    /// Kind and content of a stored object, after full verification.
    pub fn load(&self, object_id: &ObjectId) -> anyhow::Result<(ObjectType, Bytes)> {
        let raw = self.read_object(object_id)?;
        let corrupt = |reason: String| VcsError::ObjectCorrupt {
            oid: object_id.clone(),
            reason,
        };

        if hash_bytes(&raw) != *object_id {
            return Err(corrupt("content does not match its id".into()).into());
        }

        let mut reader = Cursor::new(raw);
        let (object_type, size) =
            ObjectType::parse_header(&mut reader).map_err(|err| corrupt(err.to_string()))?;

        let offset = reader.position() as usize;
        let content = reader.into_inner().slice(offset..);
        if content.len() != size {
            return Err(corrupt(format!(
                "header declares {size} bytes, found {}",
                content.len()
            ))
            .into());
        }

        Ok((object_type, content))
    }

    pub fn object_type(&self, object_id: &ObjectId) -> anyhow::Result<ObjectType> {
        Ok(self.load(object_id)?.0)
    }

    pub fn parse_object(&self, object_id: &ObjectId) -> anyhow::Result<ObjectBox> {
        let (object_type, content) = self.load(object_id)?;
        let reader = Cursor::new(content);

        let object = match object_type {
            ObjectType::Blob => ObjectBox::Blob(Box::new(Blob::deserialize(reader)?)),
            ObjectType::Tree => ObjectBox::Tree(Box::new(self.decode(object_id, reader)?)),
            ObjectType::Commit => ObjectBox::Commit(Box::new(self.decode(object_id, reader)?)),
        };

        Ok(object)
    }

    pub fn parse_blob(&self, object_id: &ObjectId) -> anyhow::Result<Blob> {
        let content = self.load_as(object_id, ObjectType::Blob)?;
        Blob::deserialize(Cursor::new(content))
    }

    pub fn parse_tree(&self, object_id: &ObjectId) -> anyhow::Result<Tree> {
        let content = self.load_as(object_id, ObjectType::Tree)?;
        self.decode(object_id, Cursor::new(content))
    }

    pub fn parse_commit(&self, object_id: &ObjectId) -> anyhow::Result<Commit> {
        let content = self.load_as(object_id, ObjectType::Commit)?;
        self.decode(object_id, Cursor::new(content))
    }

    /// Tree of a commit, or the tree itself when given a tree id.
    pub fn peel_to_tree(&self, object_id: &ObjectId) -> anyhow::Result<ObjectId> {
        match self.object_type(object_id)? {
            ObjectType::Commit => Ok(self.parse_commit(object_id)?.tree_oid().clone()),
            ObjectType::Tree => Ok(object_id.clone()),
            ObjectType::Blob => Err(VcsError::UnexpectedObjectType {
                oid: object_id.clone(),
                expected: ObjectType::Tree.to_string(),
                actual: ObjectType::Blob.to_string(),
            }
            .into()),
        }
    }

    fn load_as(&self, object_id: &ObjectId, expected: ObjectType) -> anyhow::Result<Bytes> {
        let (object_type, content) = self.load(object_id)?;
        object_type.expect(expected, object_id)?;

        Ok(content)
    }

    fn decode<T: Unpackable>(
        &self,
        object_id: &ObjectId,
        reader: Cursor<Bytes>,
    ) -> anyhow::Result<T> {
        T::deserialize(reader).map_err(|err| {
            VcsError::ObjectCorrupt {
                oid: object_id.clone(),
                reason: err.to_string(),
            }
            .into()
        })
    }

    /// Expand an abbreviated id to the unique stored object it names.
    pub fn resolve_prefix(&self, prefix: &str) -> anyhow::Result<ObjectId> {
        if prefix.len() < MIN_PREFIX_LENGTH
            || prefix.len() > OBJECT_ID_LENGTH
            || !prefix.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(VcsError::InvalidObjectId(prefix.to_string()).into());
        }

        let mut candidates = self.find_objects_by_prefix(prefix)?;
        match candidates.len() {
            0 => Err(VcsError::ObjectNotFound(prefix.to_string()).into()),
            1 => Ok(candidates.remove(0)),
            _ => {
                candidates.sort();
                Err(VcsError::AmbiguousId {
                    prefix: prefix.to_string(),
                    candidates,
                }
                .into())
            }
        }
    }

    /// All stored ids starting with `prefix` (at least two hex characters).
    pub fn find_objects_by_prefix(&self, prefix: &str) -> anyhow::Result<Vec<ObjectId>> {
        let prefix = prefix.to_ascii_lowercase();
        if prefix.len() < 2 {
            return Ok(Vec::new());
        }

        let (dir_name, file_prefix) = prefix.split_at(2);
        let dir_path = self.path.join(dir_name);
        if !dir_path.is_dir() {
            return Ok(Vec::new());
        }

        let mut matches = Vec::new();
        for entry in std::fs::read_dir(&dir_path)? {
            let file_name = entry?.file_name();
            let file_name = file_name.to_string_lossy();

            if file_name.starts_with(file_prefix)
                && let Ok(oid) = ObjectId::try_parse(format!("{dir_name}{file_name}"))
            {
                matches.push(oid);
            }
        }

        Ok(matches)
    }

    /// Number of stored objects.
    pub fn object_count(&self) -> anyhow::Result<usize> {
        if !self.path.is_dir() {
            return Ok(0);
        }

        Ok(walkdir::WalkDir::new(&self.path)
            .min_depth(2)
            .max_depth(2)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| !entry.file_name().to_string_lossy().starts_with("tmp-obj-"))
            .count())
    }

    fn read_object(&self, object_id: &ObjectId) -> anyhow::Result<Bytes> {
        let object_path = self.path.join(object_id.to_path());

        let compressed = match std::fs::read(&object_path) {
            Ok(compressed) => compressed,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(VcsError::ObjectNotFound(object_id.to_string()).into());
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("unable to read object file {}", object_path.display())
                });
            }
        };

        Self::decompress(&compressed).map_err(|err| {
            VcsError::ObjectCorrupt {
                oid: object_id.clone(),
                reason: format!("unable to inflate: {err}"),
            }
            .into()
        })
    }

    fn write_object(&self, object_path: &Path, object_content: Bytes) -> anyhow::Result<()> {
        let object_dir = object_path
            .parent()
            .with_context(|| format!("invalid object path {}", object_path.display()))?;
        let temp_object_path = object_dir.join(Self::generate_temp_name());

        let object_content = Self::compress(&object_content)?;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_object_path)
            .with_context(|| {
                format!("unable to open object file {}", temp_object_path.display())
            })?;

        let written = file
            .write_all(&object_content)
            .and_then(|_| file.sync_all())
            .and_then(|_| std::fs::rename(&temp_object_path, object_path));

        if let Err(err) = written {
            let _ = std::fs::remove_file(&temp_object_path);
            return Err(err).with_context(|| {
                format!("unable to write object file {}", object_path.display())
            });
        }

        Ok(())
    }

    fn compress(data: &[u8]) -> anyhow::Result<Vec<u8>> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder
            .write_all(data)
            .context("unable to compress object content")?;

        encoder
            .finish()
            .context("unable to finish compressing object content")
    }

    fn decompress(data: &[u8]) -> std::io::Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(data);
        let mut decompressed_content = Vec::new();
        decoder.read_to_end(&mut decompressed_content)?;

        Ok(decompressed_content.into())
    }

    fn generate_temp_name() -> String {
        format!("tmp-obj-{}", rand::random::<u32>())
    }
}
