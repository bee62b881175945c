use crate::areas::config::Config;
use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::areas::workspace::{REPOSITORY_DIR, Workspace};
use crate::artifacts::objects::commit::Author;
use crate::errors::VcsError;
use anyhow::Context;
use std::cell::{RefCell, RefMut};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// All areas of one repository for the duration of a single invocation
///
/// Command output goes to `writer`; nothing is cached between invocations.
pub struct Repository {
    path: Box<Path>,
    writer: RefCell<Box<dyn std::io::Write>>,
    index: Arc<Mutex<Index>>,
    database: Database,
    workspace: Workspace,
    refs: Refs,
    config: Config,
}

impl Repository {
    /// Open the repository rooted at `path`. The directory is created when
    /// missing so that `init` can run against a fresh path.
    pub fn new(path: &Path, writer: Box<dyn std::io::Write>) -> anyhow::Result<Self> {
        if !path.exists() {
            std::fs::create_dir_all(path)
                .with_context(|| format!("unable to create {}", path.display()))?;
        }
        let path = path
            .canonicalize()
            .with_context(|| format!("unable to resolve {}", path.display()))?;
        let repository_path = path.join(REPOSITORY_DIR);

        Ok(Repository {
            index: Arc::new(Mutex::new(Index::new(
                repository_path.join("index").into_boxed_path(),
            ))),
            database: Database::new(repository_path.join("objects").into_boxed_path()),
            workspace: Workspace::new(path.clone().into_boxed_path()),
            refs: Refs::new(repository_path.clone().into_boxed_path()),
            config: Config::new(repository_path.join("config").into_boxed_path()),
            writer: RefCell::new(writer),
            path: path.into_boxed_path(),
        })
    }

    /// Open the closest enclosing repository of `start`.
    pub fn discover(start: &Path, writer: Box<dyn std::io::Write>) -> anyhow::Result<Self> {
        let start = start
            .canonicalize()
            .with_context(|| format!("unable to resolve {}", start.display()))?;

        let root = start
            .ancestors()
            .find(|dir| dir.join(REPOSITORY_DIR).is_dir())
            .ok_or_else(|| VcsError::NotARepository(start.clone()))?;
        debug!(root = %root.display(), "found repository");

        Self::new(root, writer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn repository_path(&self) -> std::path::PathBuf {
        self.path.join(REPOSITORY_DIR)
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn std::io::Write>> {
        self.writer.borrow_mut()
    }

    pub fn index(&self) -> Arc<Mutex<Index>> {
        self.index.clone()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Author from `VCS_AUTHOR_*`, else `user.name` and `user.email`.
    pub fn author(&self) -> anyhow::Result<Author> {
        Author::load(self.config.get("user.name")?, self.config.get("user.email")?)
    }
}
