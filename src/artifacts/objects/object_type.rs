use crate::errors::VcsError;
use std::io::BufRead;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
            ObjectType::Commit => "commit",
        }
    }

    /// Consume the `<kind> <size>\0` header of a serialized object.
    ///
    /// Returns the kind together with the declared content size.
    pub fn parse_header(reader: &mut impl BufRead) -> anyhow::Result<(ObjectType, usize)> {
        let mut kind = Vec::new();
        reader.read_until(b' ', &mut kind)?;
        if kind.pop() != Some(b' ') {
            anyhow::bail!("missing space after object kind");
        }

        let mut size = Vec::new();
        reader.read_until(b'\0', &mut size)?;
        if size.pop() != Some(b'\0') {
            anyhow::bail!("missing NUL after object size");
        }

        let kind = ObjectType::try_from(std::str::from_utf8(&kind)?)?;
        let size = std::str::from_utf8(&size)?.parse::<usize>()?;

        Ok((kind, size))
    }
}

impl TryFrom<&str> for ObjectType {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> anyhow::Result<Self> {
        match value {
            "blob" => Ok(ObjectType::Blob),
            "tree" => Ok(ObjectType::Tree),
            "commit" => Ok(ObjectType::Commit),
            _ => Err(anyhow::anyhow!("invalid object type '{value}'")),
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ObjectType {
    /// Fail with `UnexpectedObjectType` unless `self` is `expected`.
    pub fn expect(
        self,
        expected: ObjectType,
        oid: &crate::artifacts::objects::object_id::ObjectId,
    ) -> anyhow::Result<()> {
        if self != expected {
            return Err(VcsError::UnexpectedObjectType {
                oid: oid.clone(),
                expected: expected.to_string(),
                actual: self.to_string(),
            }
            .into());
        }

        Ok(())
    }
}
