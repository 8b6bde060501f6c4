use std::borrow::Cow::{self, Borrowed, Owned};

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

/// Slash-command completion, hints and highlighting for a surface REPL.
///
/// Commands may declare argument values, completed after the first space.
#[derive(Clone, Default)]
pub struct CliHelper {
    commands: Vec<&'static str>,
    arguments: Vec<(&'static str, Vec<String>)>,
}

impl CliHelper {
    pub fn new(commands: &[&'static str]) -> Self {
        Self {
            commands: commands.to_vec(),
            arguments: Vec::new(),
        }
    }

    pub fn with_arguments(mut self, command: &'static str, values: Vec<String>) -> Self {
        self.arguments.push((command, values));
        self
    }

    /// Candidates for the text before the cursor, with the byte offset they
    /// replace from.
    fn candidates<'a>(&'a self, line: &str) -> (usize, Vec<&'a str>) {
        if !line.starts_with('/') {
            return (0, vec![]);
        }
        match line.split_once(' ') {
            Some((command, partial)) => {
                let values = self
                    .arguments
                    .iter()
                    .find(|(name, _)| *name == command)
                    .map(|(_, values)| {
                        values
                            .iter()
                            .map(String::as_str)
                            .filter(|v| v.starts_with(partial))
                            .collect()
                    })
                    .unwrap_or_default();
                (command.len() + 1, values)
            }
            None => (
                0,
                self.commands
                    .iter()
                    .copied()
                    .filter(|cmd| cmd.starts_with(line))
                    .collect(),
            ),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, candidates) = self.candidates(&line[..pos]);
        let pairs = candidates
            .into_iter()
            .map(|c| Pair {
                display: c.to_string(),
                replacement: c.to_string(),
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if !line.starts_with('/') {
            return Borrowed(line);
        }
        match line.split_once(' ') {
            Some((command, rest)) => Owned(format!("{} {}", command.bright_cyan(), rest)),
            None => Owned(line.bright_cyan().to_string()),
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let typed = &line[..pos];
        let (start, candidates) = self.candidates(typed);
        let partial = &typed[start..];
        candidates
            .into_iter()
            .find(|c| c.len() > partial.len())
            .map(|c| c[partial.len()..].dimmed().to_string())
    }
}

impl Validator for CliHelper {}

/// Line editor shared by the surface REPLs.
pub struct Repl {
    editor: Editor<CliHelper, DefaultHistory>,
    prompt: String,
}

impl Repl {
    pub fn new(prompt: &str, helper: CliHelper) -> Result<Self> {
        let mut editor = Editor::new()?;
        editor.set_helper(Some(helper));
        Ok(Self {
            editor,
            prompt: prompt.to_string(),
        })
    }

    /// Next non-empty line, or `None` when the user quits.
    pub fn read(&mut self) -> Option<String> {
        loop {
            match self.editor.readline(&self.prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed == "quit" || trimmed == "exit" || trimmed == "/quit" {
                        println!("{}", "Take care. Goodbye!".bright_green());
                        return None;
                    }
                    if trimmed.is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(trimmed);
                    return Some(trimmed.to_string());
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "CTRL-D detected. Exiting...".bright_green());
                    return None;
                }
                Err(err) => {
                    eprintln!("{}", format!("Error: {:?}", err).red());
                    return None;
                }
            }
        }
    }
}
