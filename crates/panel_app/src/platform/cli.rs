//! Command-line arguments of `arxiv-panel`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Control panel for the arXiv research assistant backend.
#[derive(Parser, Debug, Clone)]
#[command(name = "arxiv-panel", version)]
pub struct Cli {
    /// Configuration file (RON). Defaults to ./arxiv_panel.ron when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend origin, overriding the configuration file.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Ask the knowledge base a question and stream the answer.
    Query {
        text: String,
        /// Also search online sources.
        #[arg(long)]
        online: bool,
    },
    /// Plan, confirm and run the daily paper workflow.
    Daily {
        /// Research plan text; omitted means the backend default.
        #[arg(long)]
        plan: Option<String>,
        /// First day of the window (YYYY-MM-DD). Defaults to three days ago.
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last day of the window (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Collect categories for newly ingested papers.
    CollectCategories,
    /// Propose, review and execute category merges.
    Merges {
        /// Proposal numbers (as listed) to leave out.
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<usize>,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// List or download daily reports.
    Reports {
        #[command(subcommand)]
        action: ReportsAction,
    },
    /// Show or change backend settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ReportsAction {
    List,
    Get {
        name: String,
        /// Directory to save into instead of the configured reports directory.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum SettingsAction {
    Show,
    Set {
        /// Tunable as KEY=VALUE; VALUE is read as JSON when it parses.
        #[arg(long = "set", value_name = "KEY=VALUE")]
        tunables: Vec<String>,
        /// Default arXiv domains, comma separated.
        #[arg(long)]
        domains: Option<String>,
        /// Preferred category as domain__task.
        #[arg(long, value_name = "DOMAIN__TASK")]
        select: Vec<String>,
        /// Category to drop from the preferences, as domain__task.
        #[arg(long, value_name = "DOMAIN__TASK")]
        deselect: Vec<String>,
        /// Quality teams, comma separated (replaces the list).
        #[arg(long)]
        teams: Option<String>,
        /// JSON file with the quality authors array.
        #[arg(long)]
        authors_file: Option<PathBuf>,
    },
}
