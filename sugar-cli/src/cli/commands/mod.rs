//! Subcommand definitions

pub mod handler;

use clap::Subcommand;
use std::path::PathBuf;

use crate::api::query::DEFAULT_MAX_RESULTS;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List the modules available to the user
    Modules,

    /// List the fields of a module
    Fields {
        module: String,
        /// Show type, label and required flag for each field
        #[arg(long)]
        details: bool,
    },

    /// Fetch one record
    Get {
        module: String,
        id: String,
        /// Comma-separated field names (default: every field)
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },

    /// Fetch a page of records
    List {
        module: String,
        /// SQL WHERE fragment, e.g. "accounts.name like 'A%'"
        #[arg(long, short, default_value = "")]
        query: String,
        /// SQL ORDER BY fragment
        #[arg(long, default_value = "")]
        order: String,
        #[arg(long, default_value_t = 0)]
        offset: i32,
        #[arg(long, short, default_value_t = DEFAULT_MAX_RESULTS)]
        limit: i32,
        /// Include deleted records
        #[arg(long)]
        deleted: bool,
        /// Comma-separated field names (default: every field)
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },

    /// Search records across modules
    Search {
        text: String,
        /// Comma-separated module names
        #[arg(long, short, value_delimiter = ',', required = true)]
        modules: Vec<String>,
        #[arg(long, default_value_t = 0)]
        offset: i32,
        #[arg(long, short, default_value_t = DEFAULT_MAX_RESULTS)]
        limit: i32,
    },

    /// Create or update a record (include id=... to update)
    Set {
        module: String,
        /// Field assignments as name=value
        #[arg(required = true, value_parser = parse_assignment)]
        values: Vec<(String, String)>,
    },

    /// Link two records
    Relate {
        parent: String,
        parent_id: String,
        child: String,
        child_id: String,
    },

    /// List ids of records related to a record
    Relationships {
        module: String,
        id: String,
        related: String,
        /// SQL WHERE fragment applied to the related module
        #[arg(long, short, default_value = "")]
        query: String,
        #[arg(long)]
        deleted: bool,
    },

    /// Fetch a note's attachment
    Attachment {
        id: String,
        /// Write the decoded file here instead of printing its metadata
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Quick-create a record from a few fields
    #[command(subcommand)]
    Create(CreateCommand),

    /// Server version, flavor and clock
    Server,

    /// The logged-in user's id, team and admin flag
    Whoami,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CreateCommand {
    Account {
        name: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        website: String,
    },
    Case {
        name: String,
    },
    Contact {
        first_name: String,
        last_name: String,
        #[arg(long, default_value = "")]
        email: String,
    },
    Lead {
        first_name: String,
        last_name: String,
        #[arg(long, default_value = "")]
        email: String,
    },
    Opportunity {
        name: String,
        amount: String,
    },
}

/// Parse `name=value`; the value may itself contain `=`
fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}
