use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use mindease_application::{
    AnalysisOutcome, AnalysisReport, AppContext, CallStatus, SurfaceProfile, VideoSession,
};

use crate::console::SimulatedMedia;
use crate::helper::{CliHelper, Repl};
use crate::render;

const COMMANDS: &[&str] = &["/analyze", "/mood", "/camera", "/mic", "/mute", "/end"];
const CONNECT_DELAY: Duration = Duration::from_millis(1500);

pub async fn run(home: Option<&Path>, ephemeral: bool) -> Result<()> {
    let ctx = AppContext::load(home, ephemeral)?;
    let client = ctx.completion_client(&SurfaceProfile::video()).await?;

    let mut call = VideoSession::new(client, ctx.repository(), Arc::new(SimulatedMedia))
        .with_limits(ctx.session_limits())
        .with_connect_delay(CONNECT_DELAY);

    render::banner(
        "MindEase Video Session",
        "Talk to Dr. Sarah. '/analyze' for a session analysis, '/mood' for mood readings, \
         '/camera', '/mic', '/mute' to toggle media, '/end' to hang up.",
    );
    println!("{}", "Connecting...".bright_black());
    if let Some(err) = call.start_call().await? {
        println!("{}", format!("Camera unavailable: {}", err).yellow());
    }
    print_status(&call);
    if let Some(orchestrator) = call.orchestrator() {
        for turn in orchestrator.snapshot().await {
            render::turn(&turn);
        }
    }

    let mut repl = Repl::new("📹 ", CliHelper::new(COMMANDS))?;
    while let Some(line) = repl.read() {
        match line.as_str() {
            "/analyze" => {
                println!("{}", "Analyzing session...".bright_black());
                let outcome = call.analyze().await?;
                match &outcome {
                    AnalysisOutcome::Stored(stored) => {
                        render::report(&AnalysisReport::Available(stored.clone()))
                    }
                    AnalysisOutcome::NotTriggered => println!(
                        "{}",
                        "Talk with Dr. Sarah a little more before analyzing.".yellow()
                    ),
                    _ => render::analysis_outcome(&outcome),
                }
            }
            "/mood" => render::moods(&call.mood_history().await),
            "/camera" => match call.toggle_camera().await {
                Ok(_) => print_status(&call),
                Err(e) => println!("{}", format!("Camera unavailable: {}", e).yellow()),
            },
            "/mic" => match call.toggle_microphone().await {
                Ok(_) => print_status(&call),
                Err(e) => println!("{}", format!("Microphone unavailable: {}", e).yellow()),
            },
            "/mute" => {
                call.toggle_mute();
                print_status(&call);
            }
            "/end" => break,
            _ => {
                let outcome = call.submit(&line).await?;
                render::submit_outcome(&outcome, true);
            }
        }
    }

    if call.status() != CallStatus::Ended {
        call.end_call().await;
    }
    println!("{}", "Call ended.".bright_black());
    Ok(())
}

fn print_status(call: &VideoSession) {
    let media = call.media_state();
    let flag = |on: bool| if on { "on" } else { "off" };
    println!(
        "{}",
        format!(
            "[{:?}] camera {} | mic {} | audio {}",
            call.status(),
            flag(media.camera_on),
            flag(media.microphone_on),
            if media.muted { "muted" } else { "on" }
        )
        .bright_black()
    );
}
