use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gv", about = concat!("[*] grove v", env!("CARGO_PKG_VERSION"), " - your outline is plain text"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different corpus directory
    #[arg(short = 'C', long = "corpus-dir", global = true)]
    pub corpus_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List headings in a document
    List(ListArgs),
    /// Change a heading's state keyword
    State(StateArgs),
    /// Set or clear a heading's scheduled date
    Schedule(PlanArgs),
    /// Set or clear a heading's deadline
    Deadline(PlanArgs),
    /// Replace a heading's tags
    Tag(TagArgs),
    /// Get, set, or delete a single property
    Prop(PropArgs),
    /// Show or record what a heading is waiting on
    Wait(WaitArgs),
    /// Make a heading recur
    Recur(RecurArgs),
    /// Move a subtree to the end of another document
    Refile(RefileArgs),
    /// Check or assign corpus-wide identifiers
    Ids(IdsArgs),
}

#[derive(Args)]
pub struct ListArgs {
    /// Document to list
    pub file: String,
}

#[derive(Args)]
pub struct StateArgs {
    pub file: String,
    /// Heading identifier (ID property)
    pub id: String,
    /// New state keyword, or `none` to clear it
    pub state: String,
}

#[derive(Args)]
pub struct PlanArgs {
    pub file: String,
    pub id: String,
    /// Date as YYYY-MM-DD, or `clear` to remove the line
    pub date: String,
    /// Repeater token such as `+1w`, `.+3d`, or `++2m`
    #[arg(long)]
    pub repeat: Option<String>,
}

#[derive(Args)]
pub struct TagArgs {
    pub file: String,
    pub id: String,
    /// Tags; passing none clears the tag block
    pub tags: Vec<String>,
}

#[derive(Args)]
pub struct PropArgs {
    pub file: String,
    pub id: String,
    pub key: String,
    /// Value to set; omit to read the current value
    pub value: Option<String>,
    /// Delete the key instead
    #[arg(long, conflicts_with = "value")]
    pub delete: bool,
}

#[derive(Args)]
pub struct WaitArgs {
    pub file: String,
    pub id: String,
    /// Who is being waited on
    #[arg(long)]
    pub who: Option<String>,
    /// The expected deliverable
    #[arg(long)]
    pub what: Option<String>,
    /// Date the request was made (YYYY-MM-DD)
    #[arg(long)]
    pub requested: Option<String>,
    /// Follow-up date (YYYY-MM-DD)
    #[arg(long = "follow-up")]
    pub follow_up: Option<String>,
    /// How the request was made
    #[arg(long)]
    pub channel: Option<String>,
    /// low, normal, high, or urgent
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Remove the whole record
    #[arg(long)]
    pub clear: bool,
}

#[derive(Args)]
pub struct RecurArgs {
    pub file: String,
    pub id: String,
    /// Interval such as 1w, 3d, 2m, 1y
    #[arg(long)]
    pub every: String,
    /// scheduled, completion, or deadline
    #[arg(long, default_value = "scheduled")]
    pub anchor: String,
    /// Preferred weekday (e.g. fri)
    #[arg(long)]
    pub weekday: Option<String>,
}

#[derive(Args)]
pub struct RefileArgs {
    pub source: String,
    pub dest: String,
    pub id: String,
}

#[derive(Args)]
pub struct IdsArgs {
    #[command(subcommand)]
    pub action: IdsAction,
}

#[derive(Subcommand)]
pub enum IdsAction {
    /// Report duplicate identifiers across the corpus
    Check,
    /// Assign missing identifiers and regenerate duplicates
    Assign,
}
