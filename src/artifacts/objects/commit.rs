//! Commit object
//!
//! A commit names a tree snapshot, its parent commits and who recorded it.
//!
//! ```text
//! tree <tree-oid>
//! parent <parent-oid>            (zero or more)
//! author <name> <<email>> <unix-seconds> <+hhmm>
//! committer <name> <<email>> <unix-seconds> <+hhmm>
//!
//! <message>
//! ```

use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::{Context, anyhow};
use bytes::Bytes;
use chrono::{DateTime, FixedOffset};
use std::io::BufRead;

pub const AUTHOR_NAME_ENV: &str = "VCS_AUTHOR_NAME";
pub const AUTHOR_EMAIL_ENV: &str = "VCS_AUTHOR_EMAIL";
pub const AUTHOR_DATE_ENV: &str = "VCS_AUTHOR_DATE";

/// Identity and time of an author or committer
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Author {
    name: String,
    email: String,
    timestamp: DateTime<FixedOffset>,
}

impl Author {
    /// Author stamped with the current local time.
    pub fn new(name: String, email: String) -> Self {
        Author {
            name,
            email,
            timestamp: chrono::Local::now().fixed_offset(),
        }
    }

    pub fn new_with_timestamp(name: String, email: String, timestamp: DateTime<FixedOffset>) -> Self {
        Author {
            name,
            email,
            timestamp,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    /// `Name <email>`
    pub fn display_name(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }

    /// `Name <email> <unix-seconds> <+hhmm>`, as stored in commits
    pub fn display(&self) -> String {
        format!(
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }

    /// `Mon Jan 1 12:34:56 2024 +0000`
    pub fn readable_timestamp(&self) -> String {
        self.timestamp
            .format("%a %b %-d %H:%M:%S %Y %z")
            .to_string()
    }

    /// Resolve the author from `VCS_AUTHOR_*`, falling back to the given
    /// configured name and email.
    ///
    /// `VCS_AUTHOR_DATE` accepts `%Y-%m-%d %H:%M:%S %z` or RFC 2822.
    pub fn load(config_name: Option<String>, config_email: Option<String>) -> anyhow::Result<Self> {
        let name = std::env::var(AUTHOR_NAME_ENV)
            .ok()
            .or(config_name)
            .with_context(|| format!("author name unknown, set {AUTHOR_NAME_ENV} or user.name"))?;
        let email = std::env::var(AUTHOR_EMAIL_ENV)
            .ok()
            .or(config_email)
            .with_context(|| {
                format!("author email unknown, set {AUTHOR_EMAIL_ENV} or user.email")
            })?;

        match std::env::var(AUTHOR_DATE_ENV).ok() {
            Some(date) => Ok(Author::new_with_timestamp(name, email, parse_date(&date)?)),
            None => Ok(Author::new(name, email)),
        }
    }

    /// Parse `Name <email>` as given on the command line, stamped now.
    pub fn parse_identity(identity: &str) -> anyhow::Result<Self> {
        let (name, email) = split_identity(identity)?;
        Ok(Author::new(name, email))
    }

    /// Same identity with another timestamp.
    pub fn at(self, timestamp: DateTime<FixedOffset>) -> Self {
        Author { timestamp, ..self }
    }
}

fn parse_date(date: &str) -> anyhow::Result<DateTime<FixedOffset>> {
    DateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S %z")
        .or_else(|_| DateTime::parse_from_rfc2822(date))
        .with_context(|| format!("invalid date '{date}'"))
}

fn split_identity(identity: &str) -> anyhow::Result<(String, String)> {
    let email_start = identity
        .find('<')
        .ok_or_else(|| anyhow!("invalid identity '{identity}': missing '<'"))?;
    let email_end = identity
        .rfind('>')
        .filter(|end| *end > email_start)
        .ok_or_else(|| anyhow!("invalid identity '{identity}': missing '>'"))?;

    Ok((
        identity[..email_start].trim().to_string(),
        identity[email_start + 1..email_end].to_string(),
    ))
}

impl TryFrom<&str> for Author {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        // split from the right: "<identity> <seconds> <zone>"
        let parts: Vec<&str> = value.rsplitn(3, ' ').collect();
        if parts.len() < 3 {
            return Err(anyhow!("invalid author line '{value}'"));
        }

        let offset = parse_offset(parts[0])?;
        let seconds = parts[1]
            .parse::<i64>()
            .map_err(|_| anyhow!("invalid timestamp '{}'", parts[1]))?;
        let (name, email) = split_identity(parts[2])?;

        let timestamp = DateTime::from_timestamp(seconds, 0)
            .ok_or_else(|| anyhow!("timestamp {seconds} out of range"))?
            .with_timezone(&offset);

        Ok(Author {
            name,
            email,
            timestamp,
        })
    }
}

fn parse_offset(zone: &str) -> anyhow::Result<FixedOffset> {
    let invalid = || anyhow!("invalid timezone '{zone}'");

    if zone.len() != 5 {
        return Err(invalid());
    }
    let sign = match &zone[..1] {
        "+" => 1,
        "-" => -1,
        _ => return Err(invalid()),
    };
    let hours = zone[1..3].parse::<i32>().map_err(|_| invalid())?;
    let minutes = zone[3..5].parse::<i32>().map_err(|_| invalid())?;

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// What history traversal needs to know about a commit
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SlimCommit {
    pub oid: ObjectId,
    pub parents: Vec<ObjectId>,
    /// Committer timestamp
    pub timestamp: DateTime<FixedOffset>,
}

impl PartialOrd for SlimCommit {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Newer commits are greater; equal timestamps fall back to the id.
impl Ord for SlimCommit {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.oid.cmp(&other.oid))
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    parents: Vec<ObjectId>,
    tree_oid: ObjectId,
    author: Author,
    committer: Author,
    message: String,
}

impl Commit {
    /// Commit whose committer is its author.
    pub fn new(parents: Vec<ObjectId>, tree_oid: ObjectId, author: Author, message: String) -> Self {
        Commit {
            parents,
            tree_oid,
            committer: author.clone(),
            author,
            message,
        }
    }

    pub fn with_committer(self, committer: Author) -> Self {
        Commit { committer, ..self }
    }

    pub fn short_message(&self) -> String {
        self.message.lines().next().unwrap_or("").to_string()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn committer(&self) -> &Author {
        &self.committer
    }

    /// Committer time, which orders history.
    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.committer.timestamp()
    }

    pub fn to_slim(&self, oid: ObjectId) -> SlimCommit {
        SlimCommit {
            oid,
            parents: self.parents.clone(),
            timestamp: self.timestamp(),
        }
    }

    fn header_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("tree {}", self.tree_oid)];
        lines.extend(self.parents.iter().map(|parent| format!("parent {parent}")));
        lines.push(format!("author {}", self.author.display()));
        lines.push(format!("committer {}", self.committer.display()));

        lines
    }
}

impl Packable for Commit {
    fn content(&self) -> anyhow::Result<Bytes> {
        let mut content = self.header_lines().join("\n");
        content.push_str("\n\n");
        content.push_str(&self.message);

        Ok(Bytes::from(content))
    }
}

impl Unpackable for Commit {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .context("commit is not valid UTF-8")?;

        let (headers, message) = content
            .split_once("\n\n")
            .ok_or_else(|| anyhow!("commit has no message separator"))?;
        let mut lines = headers.lines().peekable();

        let tree_oid = lines
            .next()
            .and_then(|line| line.strip_prefix("tree "))
            .ok_or_else(|| anyhow!("commit has no tree line"))?;
        let tree_oid = ObjectId::try_parse(tree_oid)?;

        let mut parents = Vec::new();
        while let Some(parent) = lines.peek().and_then(|line| line.strip_prefix("parent ")) {
            parents.push(ObjectId::try_parse(parent)?);
            lines.next();
        }

        let author = lines
            .next()
            .and_then(|line| line.strip_prefix("author "))
            .ok_or_else(|| anyhow!("commit has no author line"))?;
        let author = Author::try_from(author)?;

        let committer = lines
            .next()
            .and_then(|line| line.strip_prefix("committer "))
            .ok_or_else(|| anyhow!("commit has no committer line"))?;
        let committer = Author::try_from(committer)?;

        Ok(Commit {
            parents,
            tree_oid,
            author,
            committer,
            message: message.to_string(),
        })
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn display(&self) -> String {
        let mut lines = self.header_lines();
        lines.push(String::new());
        lines.push(self.message.trim_end_matches('\n').to_string());

        lines.join("\n")
    }
}
