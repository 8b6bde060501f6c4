//! Terminal rendering of transcripts, outcomes and reports.

use colored::Colorize;
use mindease_application::{
    AnalysisOutcome, AnalysisReport, RejectReason, SubmitOutcome,
};
use mindease_core::conversation::{Turn, TurnRole};
use mindease_core::mood::MoodHistory;

pub fn banner(title: &str, hint: &str) {
    println!("{}", format!("=== {} ===", title).bright_magenta().bold());
    println!("{}", hint.bright_black());
    println!();
}

pub fn turn(turn: &Turn) {
    match turn.role() {
        TurnRole::User => println!("{}", format!("> {}", turn.text()).green()),
        TurnRole::Assistant => {
            for line in turn.text().lines() {
                println!("{}", line.bright_blue());
            }
        }
    }
}

/// Prints the reply (unless `speak` already voiced it) and any notice.
pub fn submit_outcome(outcome: &SubmitOutcome, print_reply: bool) {
    match outcome {
        SubmitOutcome::Rejected(reason) => println!("{}", rejection(*reason).yellow()),
        SubmitOutcome::Replied { reply, analysis } => {
            if print_reply {
                reply_text(reply);
            }
            analysis_outcome(analysis);
        }
        SubmitOutcome::Fallback { reply, .. } => {
            if print_reply {
                reply_text(reply);
            }
        }
        SubmitOutcome::Discarded => {}
    }
}

fn reply_text(reply: &str) {
    for line in reply.lines() {
        println!("{}", line.bright_blue());
    }
}

fn rejection(reason: RejectReason) -> &'static str {
    match reason {
        RejectReason::Empty => "Nothing to send.",
        RejectReason::Busy => "Still waiting for the previous reply.",
        RejectReason::TornDown => "This session has ended.",
        RejectReason::SessionFull => "This session is full. Start a new one to keep talking.",
    }
}

pub fn analysis_outcome(outcome: &AnalysisOutcome) {
    match outcome {
        AnalysisOutcome::Stored(stored) => println!(
            "{}",
            format!(
                "Analysis updated ({} messages). Use /analysis to view it.",
                stored.message_count()
            )
            .bright_black()
        ),
        AnalysisOutcome::Failed { alert: true, .. } => {
            println!("{}", "Failed to generate analysis. Please try again.".red())
        }
        AnalysisOutcome::NotTriggered
        | AnalysisOutcome::InProgress
        | AnalysisOutcome::Failed { .. }
        | AnalysisOutcome::Discarded => {}
    }
}

pub fn report(report: &AnalysisReport) {
    for section in report.sections() {
        println!("{}", section.title.bright_yellow().bold());
        for line in &section.lines {
            println!("  {}", line);
        }
        println!();
    }
}

pub fn moods(history: &MoodHistory) {
    if history.is_empty() {
        println!("{}", "No mood readings yet.".bright_black());
        return;
    }
    for sample in history.samples() {
        println!(
            "  {} {:<9} {}",
            sample.at().format("%H:%M:%S").to_string().bright_black(),
            sample.label().to_string(),
            "█".repeat(sample.intensity() as usize).cyan()
        );
    }
    if let (Some(dominant), Some(average)) = (history.dominant(), history.average_intensity()) {
        println!(
            "{}",
            format!("Mostly {} (average intensity {:.1})", dominant, average).bright_black()
        );
    }
}
