//! CLI module for lineage.
//!
//! Subcommands:
//! - `generate`: Print a random hierarchy
//! - `show`: Render a hierarchy through the bridge and report the selection
//! - `serve`: Run a headless engine on a Unix socket

mod generate;
mod serve;
mod show;

use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::HierarchyConfig;
use crate::models::{Hierarchy, SampleFactory};

pub use generate::GenerateCommand;
pub use show::ShowCommand;

/// lineage - random people hierarchies on a visualization engine
#[derive(Parser)]
#[command(name = "lineage")]
#[command(about = "Generate random people hierarchies and render them through a graph engine bridge")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print a random hierarchy
    Generate(GenerateCommand),

    /// Render a hierarchy on the engine and report the selected person
    Show(ShowCommand),

    /// Serve a headless engine to hosts on a Unix socket
    Serve {
        /// Socket path to listen on
        #[arg(long)]
        socket: std::path::PathBuf,
    },
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match self.command {
            Command::Generate(cmd) => cmd.run(),
            Command::Show(cmd) => cmd.run().await,
            Command::Serve { ref socket } => self.run_serve(socket).await,
        }
    }
}

/// Command-line overrides for the `[hierarchy]` config section.
#[derive(Args, Debug, Clone, Default)]
pub struct HierarchyArgs {
    /// Number of people
    #[arg(short, long)]
    pub count: Option<usize>,

    /// Maximum links per person (clamped to 1..=7)
    #[arg(short, long)]
    pub degree: Option<usize>,

    /// RNG seed for a reproducible hierarchy
    #[arg(short, long)]
    pub seed: Option<u64>,
}

impl HierarchyArgs {
    /// Applies the given flags on top of the configured values.
    pub fn apply(&self, config: &mut HierarchyConfig) {
        if let Some(count) = self.count {
            config.count = count;
        }
        if let Some(degree) = self.degree {
            config.degree = degree;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
    }
}

/// Generates the hierarchy described by `config`.
pub fn build_hierarchy(config: &HierarchyConfig) -> Hierarchy {
    match config.seed {
        Some(seed) => Hierarchy::random(
            config.count,
            config.degree,
            &mut StdRng::seed_from_u64(seed),
            &SampleFactory,
        ),
        None => Hierarchy::random(
            config.count,
            config.degree,
            &mut rand::rng(),
            &SampleFactory,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let mut config = HierarchyConfig::default();
        HierarchyArgs {
            count: Some(3),
            degree: None,
            seed: Some(1),
        }
        .apply(&mut config);

        assert_eq!(config.count, 3);
        assert_eq!(config.degree, 4);
        assert_eq!(config.seed, Some(1));
    }

    #[test]
    fn test_seeded_builds_are_identical() {
        let config = HierarchyConfig {
            count: 15,
            degree: 3,
            seed: Some(99),
        };
        let a = build_hierarchy(&config);
        let b = build_hierarchy(&config);
        assert_eq!(a.people(), b.people());
        assert_eq!(a.links(), b.links());
    }

    #[test]
    fn test_cli_parses_show_flags() {
        let app = App::try_parse_from([
            "lineage", "show", "--count", "5", "--select", "2", "--select", "4",
        ])
        .unwrap();
        let Command::Show(cmd) = app.command else {
            panic!("expected show");
        };
        assert_eq!(cmd.hierarchy.count, Some(5));
        assert_eq!(cmd.select, vec![2, 4]);
    }
}
