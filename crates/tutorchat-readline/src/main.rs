use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use rustyline::Editor;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use tracing_subscriber::EnvFilter;

use tutorchat_application::{ChatController, ChatView, MessageBody, QuizCard, RenderedMessage};
use tutorchat_core::config::ClientConfig;
use tutorchat_core::session::{ChatMode, MessageRole};
use tutorchat_interaction::ChatApiAgent;

/// Terminal client for the course tutoring chat service.
#[derive(Parser)]
#[command(name = "tutorchat", version, about)]
struct Cli {
    /// Base URL of the chat service (overrides config and environment)
    #[arg(long)]
    base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Conversation mode
    #[arg(long, value_enum, default_value_t = ModeArg::Chat)]
    mode: ModeArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Stateless single-turn chat
    Chat,
    /// Session-oriented role-play dialogue
    Dialogue,
}

impl From<ModeArg> for ChatMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Chat => ChatMode::Chat,
            ModeArg::Dialogue => ChatMode::Dialogue,
        }
    }
}

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: vec![
                "/image".to_string(),
                "/noimage".to_string(),
                "/reveal".to_string(),
                "/reset".to_string(),
                "/end".to_string(),
                "/quit".to_string(),
            ],
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
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// Colored terminal implementation of the view.
struct TerminalView {
    welcome: String,
}

impl TerminalView {
    fn new(mode: ChatMode) -> Self {
        let welcome = match mode {
            ChatMode::Chat => "您好！我是智能助教，可以出题、画知识图谱，也可以直接提问。",
            ChatMode::Dialogue => "您好！输入一个话题，开始一段角色扮演对话。",
        };
        let view = Self {
            welcome: welcome.to_string(),
        };
        view.print_welcome();
        view
    }

    fn print_welcome(&self) {
        println!("{}", "=== Tutorchat ===".bright_magenta().bold());
        println!("{}", self.welcome.bright_blue());
        println!(
            "{}",
            "Commands: /image <path>, /noimage, /reveal <n>, /reset, /end, /quit".bright_black()
        );
        println!();
    }

    fn print_card(&self, card: &QuizCard) {
        let title = if card.record.title.is_empty() {
            format!("题目{}", card.index + 1)
        } else {
            card.record.title.clone()
        };
        println!("{}", title.bright_magenta().bold());
        if !card.record.stem.is_empty() {
            println!("  {}", card.record.stem.bright_blue());
        }
        for option in &card.record.options {
            println!("  {}", option.bright_blue());
        }
        if card.record.has_detail() {
            println!(
                "{}",
                format!("  （输入 /reveal {} 查看解析）", card.index + 1).bright_black()
            );
        }
        println!();
    }
}

impl ChatView for TerminalView {
    fn append(&mut self, message: &RenderedMessage) {
        match message.role {
            MessageRole::User => {
                if let Some(mime) = &message.image_mime {
                    println!("{}", format!("> [图片 {}]", mime).green());
                }
                if let MessageBody::Literal(text) = &message.body {
                    for line in text.lines() {
                        println!("{}", format!("> {}", line).green());
                    }
                }
            }
            MessageRole::System => {
                if let MessageBody::Literal(text) = &message.body {
                    println!("{}", text.bright_black());
                }
            }
            MessageRole::Assistant => match &message.body {
                MessageBody::Markdown(text) | MessageBody::Literal(text) => {
                    for line in text.lines() {
                        println!("{}", line.bright_blue());
                    }
                }
                MessageBody::Diagram { panel, summary } => {
                    for line in panel.lines() {
                        println!("{}", line.cyan());
                    }
                    if let Some(summary) = summary {
                        println!();
                        for line in summary.lines() {
                            println!("{}", line.bright_blue());
                        }
                    }
                }
                MessageBody::QuizCards(cards) => {
                    for card in cards {
                        self.print_card(card);
                    }
                }
                MessageBody::QuizDetail {
                    index,
                    answer,
                    explanation,
                } => {
                    println!("{}", format!("第{}题", index + 1).bright_magenta());
                    if !answer.trim().is_empty() {
                        println!("  {} {}", "正确答案:".bold(), answer.bright_green());
                    }
                    if !explanation.trim().is_empty() {
                        println!("  {}", "解析:".bold());
                        for line in explanation.lines() {
                            println!("  {}", line.bright_blue());
                        }
                    }
                }
            },
        }
        println!();
    }

    fn set_loading(&mut self, loading: bool) {
        if loading {
            println!("{}", "（正在思考…）".bright_black());
        }
    }

    fn alert(&mut self, text: &str) {
        println!("{}", format!("! {}", text).yellow());
    }

    fn reset_log(&mut self) {
        println!("{}", "────────────────────────".bright_black());
        self.print_welcome();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::load()?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(timeout_secs) = cli.timeout_secs {
        config.timeout_secs = timeout_secs;
    }

    let mode: ChatMode = cli.mode.into();
    let backend = Arc::new(ChatApiAgent::new(&config));
    let view = TerminalView::new(mode);
    let mut controller = ChatController::new(view, backend, mode);

    // ===== REPL Setup =====
    let helper = CliHelper::new();
    let mut rl = Editor::new()?;
    rl.set_helper(Some(helper));

    // ===== Main REPL Loop =====
    loop {
        let readline = rl.readline(">> ");

        match readline {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed == "/quit" || trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "再见！".bright_green());
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                if let Some(rest) = trimmed.strip_prefix("/image") {
                    let path = rest.trim();
                    if path.is_empty() {
                        println!("{}", "Usage: /image <path>".bright_black());
                    } else {
                        controller.handle_image_selected(Path::new(path)).await;
                    }
                    continue;
                }
                if trimmed == "/noimage" {
                    controller.handle_clear_image();
                    println!("{}", "已取消选择的图片。".bright_black());
                    continue;
                }
                if let Some(rest) = trimmed.strip_prefix("/reveal") {
                    match rest.trim().parse::<usize>() {
                        Ok(n) if n > 0 => controller.handle_reveal(n - 1),
                        _ => println!("{}", "Usage: /reveal <n>".bright_black()),
                    }
                    continue;
                }
                if trimmed == "/reset" {
                    controller.handle_reset();
                    continue;
                }
                if trimmed == "/end" {
                    controller.handle_end().await;
                    continue;
                }
                if trimmed.starts_with('/') {
                    println!("{}", "Unknown command".bright_black());
                    continue;
                }

                controller.handle_send(trimmed).await;
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type '/quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    Ok(())
}
