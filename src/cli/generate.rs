//! Generate subcommand - print a random hierarchy.

use std::fmt::Write as _;

use clap::Parser;

use crate::config::Config;
use crate::error::AppError;
use crate::models::Hierarchy;

use super::{build_hierarchy, HierarchyArgs};

/// Print a random hierarchy as a tree or as JSON.
#[derive(Parser)]
pub struct GenerateCommand {
    #[command(flatten)]
    pub hierarchy: HierarchyArgs,

    /// Print JSON instead of a tree
    #[arg(long)]
    pub json: bool,
}

impl GenerateCommand {
    /// Run the generate command.
    pub fn run(self) -> color_eyre::Result<()> {
        let mut config = Config::load()?;
        self.hierarchy.apply(&mut config.hierarchy);

        let hierarchy = build_hierarchy(&config.hierarchy);
        tracing::debug!(
            count = config.hierarchy.count,
            degree = config.hierarchy.degree,
            "Generated hierarchy"
        );

        let output = if self.json {
            serde_json::to_string_pretty(&hierarchy).map_err(AppError::from)?
        } else {
            render_tree(&hierarchy)
        };
        println!("{}", output);
        Ok(())
    }
}

/// Renders the hierarchy as an indented tree, one person per line.
pub fn render_tree(hierarchy: &Hierarchy) -> String {
    let mut out = String::new();
    if hierarchy.people().is_empty() {
        return out;
    }
    write_person(hierarchy, 0, "", None, &mut out);
    out.truncate(out.trim_end().len());
    out
}

fn write_person(
    hierarchy: &Hierarchy,
    index: usize,
    prefix: &str,
    is_last: Option<bool>,
    out: &mut String,
) {
    let Some(person) = hierarchy.person(index) else {
        return;
    };
    let (branch, child_prefix) = match is_last {
        None => ("", prefix.to_string()),
        Some(true) => ("└── ", format!("{}    ", prefix)),
        Some(false) => ("├── ", format!("{}│   ", prefix)),
    };
    let _ = writeln!(out, "{}{}{} ({})", prefix, branch, person, person.address());

    let children: Vec<usize> = hierarchy.children(index).collect();
    for (i, child) in children.iter().enumerate() {
        let last = i + 1 == children.len();
        write_person(hierarchy, *child, &child_prefix, Some(last), out);
    }
}
