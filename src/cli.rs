use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "Shared task board backed by MongoDB")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task
    Add {
        /// Task title
        title: String,
    },

    /// List all tasks, oldest first
    List {
        /// Print tasks as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show task details
    Show {
        /// Task ID
        id: String,
    },

    /// Toggle a task between pending and completed
    Toggle {
        /// Task ID
        id: String,
    },

    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },

    /// Delete every task
    Clear,

    /// Delete completed tasks only
    ClearCompleted,

    /// Show task counts
    Stats,

    /// Check database connectivity and print the readiness report
    Ready,

    /// Print the resolved connection target without connecting
    Resolve,
}
