use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use mindease_application::{AppContext, AudioSession, HandsFreeStop, ListenOutcome, SurfaceProfile};
use mindease_core::Language;

use crate::console::{ConsoleSpeechInput, ConsoleSpeechOutput};
use crate::helper::{CliHelper, Repl};
use crate::render;

const COMMANDS: &[&str] = &["/listen", "/handsfree", "/language", "/speak", "/quit"];
const LANGUAGES: [Language; 3] = [Language::English, Language::Hindi, Language::Tamil];

pub async fn run(
    home: Option<&Path>,
    ephemeral: bool,
    language: Language,
    auto_speak: bool,
) -> Result<()> {
    let ctx = AppContext::load(home, ephemeral)?;
    let client = ctx.completion_client(&SurfaceProfile::audio(language)).await?;

    render::banner(
        "MindEase Voice Assistant",
        "Type to talk, '/listen' for one spoken message, '/handsfree' to keep listening, \
         '/language <name>' to switch, '/speak' to toggle auto-speak, or 'quit' to exit.",
    );

    let mut session = AudioSession::mount(
        language,
        client,
        ctx.repository(),
        Arc::new(ConsoleSpeechInput),
        Arc::new(ConsoleSpeechOutput::new()),
        auto_speak,
    )
    .await?
    .with_limits(ctx.session_limits());
    print_greeting_if_silent(&session).await;

    let language_names: Vec<String> = LANGUAGES.iter().map(|l| l.to_string()).collect();
    let helper = CliHelper::new(COMMANDS).with_arguments("/language", language_names.clone());
    let mut repl = Repl::new("🎙 ", helper)?;
    while let Some(line) = repl.read() {
        let (command, arg) = match line.split_once(' ') {
            Some((command, arg)) => (command, arg.trim()),
            None => (line.as_str(), ""),
        };

        match command {
            "/listen" => match session.listen_once().await {
                Ok(ListenOutcome::Submitted(outcome)) => {
                    render::submit_outcome(&outcome, !session.auto_speak())
                }
                Ok(ListenOutcome::NoSpeech) => {
                    println!("{}", "No speech detected.".bright_black())
                }
                Err(stop) => report_stop(&stop),
            },
            "/handsfree" => {
                println!(
                    "{}",
                    "Hands-free mode: submit an empty line three times or press CTRL-D to stop."
                        .bright_black()
                );
                let before = session.orchestrator().turn_count().await;
                let (submitted, stop) = session.run_hands_free().await;
                if !session.auto_speak() {
                    for turn in session.orchestrator().snapshot().await.iter().skip(before) {
                        render::turn(turn);
                    }
                }
                println!(
                    "{}",
                    format!("Hands-free mode ended after {} message(s).", submitted).bright_black()
                );
                report_stop(&stop);
            }
            "/language" => match Language::from_str(arg) {
                Ok(language) => {
                    session.switch_language(language).await?;
                    println!(
                        "{}",
                        format!("Language: {}", language.display_name()).bright_black()
                    );
                    print_greeting_if_silent(&session).await;
                }
                Err(_) => println!(
                    "{}",
                    format!("Choose one of: {}", language_names.join(", ")).yellow()
                ),
            },
            "/speak" => {
                let enabled = !session.auto_speak();
                session.set_auto_speak(enabled).await;
                println!(
                    "{}",
                    format!("Auto-speak {}", if enabled { "on" } else { "off" }).bright_black()
                );
            }
            _ => {
                let outcome = session.submit_text(&line).await?;
                render::submit_outcome(&outcome, !session.auto_speak());
            }
        }
    }

    session.unmount().await;
    Ok(())
}

async fn print_greeting_if_silent(session: &AudioSession) {
    if session.auto_speak() {
        return;
    }
    for turn in session.orchestrator().snapshot().await {
        render::turn(&turn);
    }
}

fn report_stop(stop: &HandsFreeStop) {
    match stop {
        HandsFreeStop::Requested | HandsFreeStop::Silence => {}
        HandsFreeStop::Error(e) => println!("{}", format!("Speech recognition stopped: {}", e).yellow()),
        HandsFreeStop::Failed(e) => eprintln!("{}", format!("Error: {}", e).red()),
    }
}
