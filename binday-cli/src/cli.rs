use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "binday",
    version,
    about = "Look up Swedish waste collection schedules and follow the next pickup"
)]
pub(crate) struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Serve the bundled demo data instead of calling the provider
    #[arg(long, global = true)]
    pub demo: bool,

    /// Log debug output to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// List municipalities with a supported provider
    Kommuner,

    /// Search properties by free text
    Search {
        /// Municipality, e.g. Helsingborg
        #[arg(long)]
        kommun: String,

        /// Street address to look for
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Search and store the selected property in the configuration file
    Init {
        /// Municipality, e.g. Helsingborg
        #[arg(long)]
        kommun: String,

        /// County the municipality belongs to
        #[arg(long)]
        lan: Option<String>,

        /// Property id to pick when the search returns several matches
        #[arg(long)]
        match_id: Option<String>,

        /// Street address to look for
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Fetch the configured household's schedule once
    Fetch {
        /// Print the raw schedule snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Refresh the configured household's schedule on the configured interval
    Watch,
}

/// Join positional query words back into one search string.
pub(crate) fn join_query(words: &[String]) -> String {
    words.join(" ").trim().to_owned()
}
