//! Command-line surface for `postdesk`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use postdesk_core::models::BlogStatus;

#[derive(Parser, Debug)]
#[command(name = "postdesk", version, about = "Blog admin console", long_about = None)]
pub struct Cli {
    /// API base URL, e.g. <http://localhost:3000>
    #[arg(long, env = "POSTDESK_API_BASE_URL", global = true)]
    pub api: Option<String>,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and persist the session
    Login {
        #[arg(long)]
        email: String,
        /// Read from a prompt when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Blog post management
    Blogs(BlogsArgs),
    /// Category management
    Categories(CategoriesArgs),
    /// Author management
    Authors(AuthorsArgs),
}

#[derive(Parser, Debug)]
pub struct BlogsArgs {
    #[command(subcommand)]
    pub action: BlogsCmd,
}

#[derive(Subcommand, Debug)]
pub enum BlogsCmd {
    /// List posts with optional filters
    List {
        /// Title search
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        status: Option<StatusArg>,
        /// Category id
        #[arg(long)]
        category: Option<String>,
    },
    /// Create a post
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
        /// Author id
        #[arg(long)]
        author: String,
        /// Category id
        #[arg(long)]
        category: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        cover: Option<String>,
        #[arg(long, value_enum, default_value_t = StatusArg::Draft)]
        status: StatusArg,
    },
    /// Publish a post
    Publish { id: String },
    /// Move a post back to draft
    Unpublish { id: String },
    /// Delete a post
    Delete { id: String },
}

#[derive(Parser, Debug)]
pub struct CategoriesArgs {
    #[command(subcommand)]
    pub action: CategoriesCmd,
}

#[derive(Subcommand, Debug)]
pub enum CategoriesCmd {
    List,
    Add { title: String },
    Rename { id: String, title: String },
    Delete { id: String },
}

#[derive(Parser, Debug)]
pub struct AuthorsArgs {
    #[command(subcommand)]
    pub action: AuthorsCmd,
}

#[derive(Subcommand, Debug)]
pub enum AuthorsCmd {
    List,
    Add {
        name: String,
        #[arg(long, default_value = "")]
        bio: String,
        /// Avatar image URL
        #[arg(long)]
        avatar: Option<String>,
    },
    Delete { id: String },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Draft,
    Published,
}

impl From<StatusArg> for BlogStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Draft => BlogStatus::Draft,
            StatusArg::Published => BlogStatus::Published,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_blog_list_filters() {
        let cli = Cli::try_parse_from([
            "postdesk", "blogs", "list", "--tag", "rust", "--status", "published",
        ])
        .expect("parse");
        match cli.command {
            Commands::Blogs(BlogsArgs {
                action: BlogsCmd::List { tag, status, search, .. },
            }) => {
                assert_eq!(tag.as_deref(), Some("rust"));
                assert_eq!(status, Some(StatusArg::Published));
                assert!(search.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["postdesk", "categories", "list", "--json"]).expect("parse");
        assert!(cli.json);
    }
}
