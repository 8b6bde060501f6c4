use std::path::Path;

use anyhow::Result;
use mindease_application::{AnalysisReport, AppContext, ConversationOrchestrator, SurfaceProfile};
use mindease_core::Surface;

use crate::helper::{CliHelper, Repl};
use crate::render;

const COMMANDS: &[&str] = &["/analysis", "/quit"];

pub async fn run(home: Option<&Path>, ephemeral: bool) -> Result<()> {
    let ctx = AppContext::load(home, ephemeral)?;
    let profile = SurfaceProfile::chat();
    let client = ctx.completion_client(&profile).await?;
    let orchestrator = ConversationOrchestrator::new(profile, client, ctx.repository())?
        .with_limits(ctx.session_limits());

    render::banner(
        "MindfulChat",
        "Type a message, '/analysis' to view your conversation analysis, or 'quit' to exit.",
    );
    for turn in orchestrator.snapshot().await {
        render::turn(&turn);
    }

    let mut repl = Repl::new(">> ", CliHelper::new(COMMANDS))?;
    while let Some(line) = repl.read() {
        if line == "/analysis" {
            let report = AnalysisReport::load(ctx.repository().as_ref(), Surface::Chat).await?;
            render::report(&report);
            continue;
        }
        let outcome = orchestrator.submit(&line).await?;
        render::submit_outcome(&outcome, true);
    }

    orchestrator.teardown().await;
    Ok(())
}
