use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use anyhow::Result;
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Content encoding of an object, without the `<kind> <size>\0` header
pub trait Packable {
    fn content(&self) -> Result<Bytes>;
}

/// Decoding of object content; the header has already been consumed
pub trait Unpackable {
    fn deserialize(reader: impl BufRead) -> Result<Self>
    where
        Self: Sized;
}

pub trait Object: Packable {
    fn object_type(&self) -> ObjectType;

    fn display(&self) -> String;

    /// Canonical serialization, `<kind> <size>\0<content>`.
    fn serialize(&self) -> Result<Bytes> {
        let content = self.content()?;

        let mut object_bytes = Vec::with_capacity(content.len() + 32);
        write!(
            object_bytes,
            "{} {}\0",
            self.object_type().as_str(),
            content.len()
        )?;
        object_bytes.write_all(&content)?;

        Ok(Bytes::from(object_bytes))
    }

    fn object_id(&self) -> Result<ObjectId> {
        Ok(hash_bytes(&self.serialize()?))
    }

    fn object_path(&self) -> Result<PathBuf> {
        Ok(self.object_id()?.to_path())
    }
}

/// SHA-1 of an already serialized object.
pub fn hash_bytes(bytes: &[u8]) -> ObjectId {
    let mut hasher = Sha1::new();
    hasher.update(bytes);

    // a SHA-1 digest always renders as 40 hex characters
    ObjectId::from_digest(&hasher.finalize()).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectBox {
    Blob(Box<Blob>),
    Tree(Box<Tree>),
    Commit(Box<Commit>),
}

impl ObjectBox {
    pub fn as_object(&self) -> &dyn Object {
        match self {
            ObjectBox::Blob(blob) => blob.as_ref(),
            ObjectBox::Tree(tree) => tree.as_ref(),
            ObjectBox::Commit(commit) => commit.as_ref(),
        }
    }

    pub fn object_type(&self) -> ObjectType {
        self.as_object().object_type()
    }
}
