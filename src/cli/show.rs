//! Show subcommand - render a hierarchy through the bridge.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;

use crate::config::Config;
use crate::context::{Context, EngineConnection};
use crate::engine::HeadlessEngine;
use crate::error::AppError;
use crate::host::HostSession;

use super::{build_hierarchy, HierarchyArgs};

/// Render a hierarchy on the engine and report the selected person.
#[derive(Parser)]
pub struct ShowCommand {
    #[command(flatten)]
    pub hierarchy: HierarchyArgs,

    /// Engine socket to connect to instead of the in-process engine
    #[arg(long)]
    pub socket: Option<PathBuf>,

    /// Click the node of this person (by index), in order
    #[arg(long, value_name = "INDEX")]
    pub select: Vec<usize>,

    /// Keep reporting selection changes until interrupted
    #[arg(long)]
    pub watch: bool,
}

impl ShowCommand {
    /// Run the show command.
    pub async fn run(self) -> Result<()> {
        let mut config = Config::load()?;
        self.hierarchy.apply(&mut config.hierarchy);
        if self.socket.is_some() {
            config.bridge.socket = self.socket.clone();
        }

        let ctx = Context::new(config);
        let hierarchy = build_hierarchy(&ctx.config.hierarchy);
        let EngineConnection { client, headless } = ctx.connect().await.map_err(AppError::from)?;

        let mut session = HostSession::render(client, hierarchy, &ctx.config.graph)
            .await
            .map_err(AppError::from)?;
        println!(
            "Rendered {} people and {} links",
            session.hierarchy().people().len(),
            session.hierarchy().links().len()
        );

        for &index in &self.select {
            let engine = headless.as_ref().ok_or(AppError::RemoteEngine)?;
            let selected = click(&mut session, engine, index).await?;
            print_selection(&session, selected);
        }

        if self.watch {
            watch_selection(&mut session).await;
        }
        Ok(())
    }
}

/// Clicks the node of person `index` and waits for the selection to follow.
async fn click(
    session: &mut HostSession,
    engine: &HeadlessEngine,
    index: usize,
) -> Result<Option<usize>, AppError> {
    let count = session.hierarchy().people().len();
    if index >= count {
        return Err(AppError::UnknownPerson { index, count });
    }
    tracing::debug!(index, "Simulating click");
    engine.click_node(index);
    Ok(session.selection_changed().await?)
}

async fn watch_selection(session: &mut HostSession) {
    tracing::info!("Watching selection, press Ctrl-C to stop");
    loop {
        tokio::select! {
            changed = session.selection_changed() => match changed {
                Ok(selected) => print_selection(session, selected),
                Err(e) => {
                    tracing::warn!(error = %e, "Selection stream ended");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
}

fn print_selection(session: &HostSession, selected: Option<usize>) {
    let hierarchy = session.hierarchy();
    let Some(person) = selected.and_then(|index| hierarchy.person(index)) else {
        println!("Selected: nobody");
        return;
    };
    println!("Selected: {}", person);
    println!("  Address:  {}", person.address());

    if let Some(index) = selected {
        let parent = hierarchy
            .parent_of(index)
            .and_then(|p| hierarchy.person(p))
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string());
        println!("  Parent:   {}", parent);
        println!("  Children: {}", hierarchy.children(index).count());
    }
}
