//! The `aoitile` command line.
//!
//! Subcommands map one to one onto the library crates:
//!
//! | Command | Crate |
//! |---|---|
//! | `tiles`, `check` | `aoitile-grid` |
//! | `download` | `aoitile-provider` |
//! | `mosaic` | `aoitile-mosaic` |
//! | `clip`, `index` | `aoitile-index` |
//!
//! Errors become exit codes by kind: configuration 2, precondition 3,
//! provider 4, anything else 1.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;

pub use cli::{Cli, Commands};
pub use config::ProjectConfig;
pub use error::RunnerError;

use std::io::Write;

/// Result type for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;

/// Run the parsed command, writing reports to `out`.
pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    let config = ProjectConfig::load_or_default(cli.config.as_deref())?;
    match &cli.command {
        Commands::Tiles(args) => commands::tiles(&config, args, out),
        Commands::Check(args) => commands::check(&config, args, out),
        Commands::Download(args) => commands::download(&config, args, out),
        Commands::Mosaic(args) => commands::mosaic(&config, args, out),
        Commands::Clip(args) => commands::clip(&config, args, out),
        Commands::Index(command) => commands::index(command, out),
    }
}
