//! Terminal rendering and input

use colored::*;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, size},
};
use std::io::{self, IsTerminal, Write};

use arag_core::{AgentResponse, Document, Outcome, Result};

const PROMPT: &str = "arag>";

/// Characters of each source shown under an answer
const SOURCE_PREVIEW_CHARS: usize = 160;

/// Display startup banner
pub fn display_banner() {
    let terminal_width = size().map(|(w, _)| w as usize).unwrap_or(80);
    let banner_width = std::cmp::min(67, terminal_width.saturating_sub(4)).max(40);
    let inner = banner_width - 2;

    let line = |text: &str| format!("│  {}{}│", text, " ".repeat(inner.saturating_sub(text.chars().count() + 2)));

    println!();
    println!("{}", format!("┌{}┐", "─".repeat(inner)).blue());
    println!("{}", line("").blue());
    println!("│  {}{}│", "ARAG - Assistente de conteúdo".blue().bold(), " ".repeat(inner.saturating_sub(31)));
    println!("{}", line("").blue());

    for text in [
        "Gere conteúdo de marketing a partir dos",
        "materiais de referência da empresa.",
        "",
        "Comandos: help, sources, clear, exit",
    ] {
        println!("{}", line(text).blue());
    }

    println!("{}", line("").blue());
    println!("{}", format!("└{}┘", "─".repeat(inner)).blue());
    println!();
    println!(
        "{}",
        "💡 Ex.: Gere uma mensagem de CRM de contagem regressiva para a live do curso de Python".dimmed()
    );
    println!();
}

/// Read one line, with ↑/↓ navigation through previous inputs when
/// attached to a terminal. `None` means input is exhausted.
pub fn handle_input_with_history(history: &mut Vec<String>) -> Result<Option<String>> {
    if !io::stdin().is_terminal() {
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(None);
        }
        let input = input.trim().to_string();
        if !input.is_empty() {
            history.push(input.clone());
        }
        return Ok(Some(input));
    }

    enable_raw_mode()?;
    let result = read_line_raw(history);
    disable_raw_mode()?;
    println!();

    let Some(input) = result? else {
        return Ok(None);
    };
    if !input.is_empty() {
        history.push(input.clone());
    }
    Ok(Some(input))
}

/// What a key press did to the line being edited
#[derive(Debug, PartialEq)]
enum KeyAction {
    Edited,
    Ignored,
    Submit(String),
    /// Ctrl-C, or Ctrl-D on an empty line
    Quit,
}

struct LineEditor<'a> {
    input: String,
    history: &'a [String],
    history_index: Option<usize>,
}

impl<'a> LineEditor<'a> {
    fn new(history: &'a [String]) -> Self {
        Self {
            input: String::new(),
            history,
            history_index: None,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> KeyAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => KeyAction::Quit,
                KeyCode::Char('d') if self.input.is_empty() => KeyAction::Quit,
                _ => KeyAction::Ignored,
            };
        }

        match key.code {
            KeyCode::Enter => return KeyAction::Submit(self.input.trim().to_string()),
            KeyCode::Esc => return KeyAction::Submit(String::new()),
            KeyCode::Char(c) => self.input.push(c),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Up if !self.history.is_empty() => {
                let index = match self.history_index {
                    None => self.history.len() - 1,
                    Some(idx) => idx.saturating_sub(1),
                };
                self.history_index = Some(index);
                self.input = self.history[index].clone();
            }
            KeyCode::Down => match self.history_index {
                Some(idx) if idx + 1 < self.history.len() => {
                    self.history_index = Some(idx + 1);
                    self.input = self.history[idx + 1].clone();
                }
                Some(_) => {
                    self.history_index = None;
                    self.input.clear();
                }
                None => return KeyAction::Ignored,
            },
            _ => return KeyAction::Ignored,
        }
        KeyAction::Edited
    }
}

fn read_line_raw(history: &[String]) -> Result<Option<String>> {
    let mut editor = LineEditor::new(history);
    redraw(&editor.input, 0)?;

    loop {
        let Event::Key(key_event) = event::read()? else {
            continue;
        };
        if key_event.kind != KeyEventKind::Press {
            continue;
        }

        let previous_len = editor.input.chars().count();
        match editor.handle_key(key_event) {
            KeyAction::Submit(line) => return Ok(Some(line)),
            KeyAction::Quit => return Ok(None),
            KeyAction::Edited => redraw(&editor.input, previous_len)?,
            KeyAction::Ignored => {}
        }
    }
}

fn redraw(input: &str, previous_len: usize) -> Result<()> {
    let padding = previous_len.saturating_sub(input.chars().count());
    print!(
        "\r{} {}{}\r{} {}",
        PROMPT.green().bold(),
        input,
        " ".repeat(padding),
        PROMPT.green().bold(),
        input
    );
    io::stdout().flush()?;
    Ok(())
}

/// Display help message
pub fn print_help() {
    println!("{}", "Comandos disponíveis:".bold());
    println!("  {} - Descreva em linguagem natural o conteúdo que precisa", "solicitação".green());
    println!("  {} - Mostra as referências da última resposta", "sources".green());
    println!("  {} - Começa uma nova conversa", "clear".green());
    println!("  {} - Mostra esta ajuda", "help".green());
    println!("  {} - Sai do assistente", "exit/quit".green());
    println!();
    println!("{}", "Exemplos:".bold());
    println!("  Crie uma descrição para um grupo de vendas no WhatsApp");
    println!("  Gere um email de boas-vindas para novos alunos");
}

pub fn print_response(response: &AgentResponse) {
    match response.outcome {
        Outcome::Answered => {
            println!();
            println!("{}", response.result);
            if !response.source_documents.is_empty() {
                println!();
                println!(
                    "{}",
                    format!("📚 {} referência(s). Digite 'sources' para ver.", response.source_documents.len())
                        .dimmed()
                );
            }
        }
        Outcome::OffTopic | Outcome::NoRelevantDocuments => {
            println!("{} {}", "⚠️".yellow(), response.result.yellow());
        }
    }
    println!();
}

pub fn print_sources(sources: &[Document]) {
    if sources.is_empty() {
        println!("{}", "Nenhuma referência para a última resposta.".dimmed());
        return;
    }

    for (i, (path, preview)) in source_previews(sources).into_iter().enumerate() {
        println!("{} {}", format!("{}.", i + 1).cyan(), path.bold());
        println!("   {}", preview.dimmed());
    }
    println!();
}

/// `(source path, shortened content)` for each document
pub fn source_previews(sources: &[Document]) -> Vec<(String, String)> {
    sources
        .iter()
        .map(|doc| {
            let path = doc.source_path().unwrap_or("(sem caminho)").to_string();
            let flat = doc.page_content.split_whitespace().collect::<Vec<_>>().join(" ");
            let mut preview: String = flat.chars().take(SOURCE_PREVIEW_CHARS).collect();
            if flat.chars().count() > SOURCE_PREVIEW_CHARS {
                preview.push('…');
            }
            (path, preview)
        })
        .collect()
}

pub fn print_error(err: &dyn std::fmt::Display) {
    eprintln!("{} {}", "❌".red(), err.to_string().red());
}
