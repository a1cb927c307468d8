//! Command-line surface

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "deskmail",
    version,
    about = "Browse, search, sort and read desktop mail",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Mailbox backend: mock or real (overrides DESKMAIL_BACKEND)
    #[arg(long, global = true)]
    pub backend: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List folders
    Folders {
        /// Show full paths instead of a tree
        #[arg(long)]
        flat: bool,
    },
    /// List messages in a folder
    Read {
        /// Folder path, e.g. "Inbox" or "Custom/Projects"
        folder: String,
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        listing: ListingArgs,
    },
    /// Search messages
    Find(FindArgs),
    /// Move a message to another folder
    Move {
        message_id: String,
        destination: String,
    },
    /// Show a message in full
    Open { message_id: String },
    /// Show recent audit log entries
    Audit {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

/// Ordering and delivery options shared by `read` and `find`
#[derive(Args, Debug, Clone)]
pub struct ListingArgs {
    /// received_date, subject, sender or importance
    #[arg(long, default_value = "received_date")]
    pub sort_by: String,

    /// asc or desc
    #[arg(long, default_value = "desc")]
    pub sort_order: String,

    /// Stream every result instead of showing one page
    #[arg(long, conflicts_with_all = ["limit", "page"])]
    pub all: bool,

    /// Page size (defaults to the configured page size)
    #[arg(long)]
    pub limit: Option<usize>,

    /// Page number to show
    #[arg(long, default_value_t = 1)]
    pub page: usize,
}

#[derive(Args, Debug, Clone)]
pub struct FindArgs {
    /// Folder path, or "all" (default) to search every folder
    #[arg(long)]
    pub folder: Option<String>,

    /// Query string, e.g. 'from:alice is:unread after:7d budget'
    #[arg(long, short)]
    pub query: Option<String>,

    #[command(flatten)]
    pub filters: FilterArgs,

    #[command(flatten)]
    pub listing: ListingArgs,
}

/// Filter flags shared by `read` and `find`
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Text to look for in subject or body
    #[arg(long)]
    pub keyword: Option<String>,

    /// Sender address or display name
    #[arg(long)]
    pub sender: Option<String>,

    /// Received on or after: YYYY-MM-DD, 7d, 2w, 1M, yesterday, this-week, ...
    #[arg(long)]
    pub since: Option<String>,

    /// Received on or before (same formats as --since)
    #[arg(long)]
    pub until: Option<String>,

    #[arg(long, conflicts_with = "is_read")]
    pub is_unread: bool,

    #[arg(long)]
    pub is_read: bool,

    #[arg(long, conflicts_with = "no_attachments")]
    pub has_attachments: bool,

    #[arg(long)]
    pub no_attachments: bool,

    /// low, normal or high
    #[arg(long)]
    pub importance: Option<String>,

    /// Skip messages from this sender (repeatable)
    #[arg(long)]
    pub not_sender: Vec<String>,

    /// Skip messages whose subject contains this text (repeatable)
    #[arg(long)]
    pub not_subject: Vec<String>,
}
