use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use vcs::areas::repository::Repository;
use vcs::artifacts::diff::tree_diff::DiffFilter;
use vcs::commands::plumbing::cat_file::CatFileMode;
use vcs::commands::porcelain::commit::CommitOptions;
use vcs::commands::porcelain::diff::DiffCommandOptions;
use vcs::commands::porcelain::log::LogOptions;
use vcs::commands::porcelain::rm::RmOptions;

const LOG_ENV: &str = "VCS_LOG";

#[derive(Parser)]
#[command(
    name = "vcs",
    version,
    about = "A small content-addressed version control system",
    long_about = "Stores snapshots of a directory tree as content-addressed objects, \
    stages changes through an index and records history as a graph of commits."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Create an empty repository or reinitialize an existing one")]
    Init {
        #[arg(index = 1, help = "Directory to create the repository in")]
        path: Option<PathBuf>,
    },
    #[command(about = "Stage file contents")]
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    #[command(about = "Remove files from the index and the working tree")]
    Rm {
        #[arg(long, help = "Only remove from the index")]
        cached: bool,
        #[arg(short, long, help = "Skip the local changes check")]
        force: bool,
        #[arg(short = 'r', help = "Allow recursive removal of directories")]
        recursive: bool,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    #[command(about = "Show staged, unstaged and untracked paths")]
    Status,
    #[command(name = "write-tree", about = "Store the index as a tree and print its id")]
    WriteTree,
    #[command(about = "Record the index as a new commit")]
    Commit {
        #[arg(short, long)]
        message: String,
        #[arg(long, help = "Override the author, as \"Name <email>\"")]
        author: Option<String>,
        #[arg(long)]
        allow_empty: bool,
    },
    #[command(name = "commit-tree", about = "Create a commit for a tree without moving any ref")]
    CommitTree {
        tree: String,
        #[arg(short = 'p', help = "Parent commit, repeatable")]
        parents: Vec<String>,
        #[arg(short, long)]
        message: String,
    },
    #[command(about = "Show commit history")]
    Log {
        #[arg(short = 'n', long = "max-count")]
        max_count: Option<usize>,
        #[arg(long)]
        first_parent: bool,
        #[arg(long)]
        oneline: bool,
        revision: Option<String>,
    },
    #[command(about = "Show changed paths between the index, the working tree and commits")]
    Diff {
        #[arg(long, alias = "staged")]
        cached: bool,
        #[arg(long, value_name = "ADMT")]
        diff_filter: Option<String>,
        from: Option<String>,
        to: Option<String>,
    },
    #[command(about = "Show a commit and the paths it changed")]
    Show { revision: Option<String> },
    #[command(about = "List, create or delete branches")]
    Branch {
        #[arg(short, long, requires = "name")]
        delete: bool,
        name: Option<String>,
        start: Option<String>,
    },
    #[command(about = "Switch to a branch or commit")]
    Checkout {
        #[arg(short, long, help = "Discard local changes")]
        force: bool,
        target: String,
    },
    #[command(name = "hash-object", about = "Compute a blob id, optionally storing the blob")]
    HashObject {
        #[arg(short, long)]
        write: bool,
        file: PathBuf,
    },
    #[command(name = "cat-file", about = "Print an object's content, type or size")]
    #[command(group(ArgGroup::new("mode").required(true).args(["pretty", "object_type", "size"])))]
    CatFile {
        #[arg(short = 'p')]
        pretty: bool,
        #[arg(short = 't')]
        object_type: bool,
        #[arg(short = 's')]
        size: bool,
        object: String,
    },
    #[command(name = "ls-files", about = "List index entries")]
    LsFiles {
        #[arg(short, long)]
        stage: bool,
    },
    #[command(name = "ls-tree", about = "List the entries of a tree")]
    LsTree {
        #[arg(short = 'r')]
        recursive: bool,
        tree_ish: String,
    },
    #[command(about = "Read or write repository settings")]
    Config {
        #[arg(short, long)]
        list: bool,
        key: Option<String>,
        value: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    let pwd = std::env::current_dir()?;
    let writer = Box::new(std::io::stdout());

    let mut repository = match &command {
        Commands::Init { path: Some(path) } => Repository::new(path, writer)?,
        Commands::Init { path: None } => Repository::new(&pwd, writer)?,
        _ => Repository::discover(&pwd, writer)?,
    };

    match command {
        Commands::Init { .. } => repository.init().await,
        Commands::Add { paths } => repository.add(&paths).await,
        Commands::Rm {
            cached,
            force,
            recursive,
            paths,
        } => {
            let options = RmOptions {
                cached,
                force,
                recursive,
            };
            repository.rm(&paths, options).await
        }
        Commands::Status => repository.status().await.map(|_| ()),
        Commands::WriteTree => repository.write_tree().await.map(|_| ()),
        Commands::Commit {
            message,
            author,
            allow_empty,
        } => {
            let options = CommitOptions {
                author,
                allow_empty,
            };
            repository.commit(&message, &options).await.map(|_| ())
        }
        Commands::CommitTree {
            tree,
            parents,
            message,
        } => repository
            .write_commit(&tree, &parents, &message, None)
            .await
            .map(|_| ()),
        Commands::Log {
            max_count,
            first_parent,
            oneline,
            revision,
        } => {
            let options = LogOptions {
                revision,
                max_count,
                first_parent,
                oneline,
            };
            repository.log(&options).await
        }
        Commands::Diff {
            cached,
            diff_filter,
            from,
            to,
        } => {
            let filter = diff_filter
                .map(|filter| {
                    DiffFilter::try_parse(&filter)
                        .ok_or_else(|| anyhow::anyhow!("invalid diff filter '{filter}'"))
                })
                .transpose()?;
            let options = DiffCommandOptions {
                cached,
                filter,
                from,
                to,
            };
            repository.diff(&options).await.map(|_| ())
        }
        Commands::Show { revision } => repository.show(revision.as_deref()).await.map(|_| ()),
        Commands::Branch {
            delete,
            name,
            start,
        } => match name {
            Some(name) if delete => repository.delete_branch(&name).await,
            Some(name) => repository.create_branch(&name, start.as_deref()).await,
            None => repository.list_branches().await,
        },
        Commands::Checkout { force, target } => {
            repository.checkout(&target, force).await.map(|_| ())
        }
        Commands::HashObject { write, file } => {
            repository.hash_object(&file, write).await.map(|_| ())
        }
        Commands::CatFile {
            pretty,
            object_type,
            size: _,
            object,
        } => {
            let mode = if pretty {
                CatFileMode::Pretty
            } else if object_type {
                CatFileMode::Type
            } else {
                CatFileMode::Size
            };
            repository.cat_file(&object, mode).await
        }
        Commands::LsFiles { stage } => repository.ls_files(stage).await,
        Commands::LsTree {
            recursive,
            tree_ish,
        } => repository.ls_tree(&tree_ish, recursive).await,
        Commands::Config { list, key, value } => match (key, value) {
            _ if list => repository.config_list().await,
            (Some(key), Some(value)) => repository.config_set(&key, &value).await,
            (Some(key), None) => repository.config_get(&key).await,
            (None, _) => repository.config_list().await,
        },
    }
}
