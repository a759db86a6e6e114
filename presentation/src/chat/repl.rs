//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::config::{OutputConfig, ReplConfig};
use crate::output::console::ConsoleFormatter;
use crate::output::formatter::OutputFormatter;
use crate::progress::reporter::ProgressReporter;
use colored::Colorize;
use fincounsel_application::{NoProgress, SessionManager, TurnProgress};
use fincounsel_domain::SessionId;
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

const HISTORY_CAPACITY: usize = 1000;

/// What the loop does after a slash command
#[derive(Debug, PartialEq, Eq)]
enum CommandOutcome {
    Continue,
    Exit,
}

/// Create the directory holding `path`, logging when that fails.
///
/// A failure is not fatal: opening the history file then fails too and the
/// REPL runs without history.
fn ensure_parent_dir(path: &Path) -> bool {
    let Some(parent) = path.parent() else {
        return true;
    };
    match std::fs::create_dir_all(parent) {
        Ok(()) => true,
        Err(e) => {
            warn!(dir = %parent.display(), error = %e, "Could not create history directory");
            false
        }
    }
}

/// Interactive chat REPL over one session
pub struct ChatRepl {
    manager: Arc<SessionManager>,
    session: SessionId,
    formatter: ConsoleFormatter,
    output: OutputConfig,
    repl: ReplConfig,
}

impl ChatRepl {
    pub fn new(manager: Arc<SessionManager>, session: SessionId) -> Self {
        Self {
            manager,
            session,
            formatter: ConsoleFormatter::new(),
            output: OutputConfig::default(),
            repl: ReplConfig::default(),
        }
    }

    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.formatter = ConsoleFormatter::new().with_trace(output.show_trace);
        self.output = output;
        self
    }

    pub fn with_repl_config(mut self, repl: ReplConfig) -> Self {
        self.repl = repl;
        self
    }

    fn line_editor(&self) -> Reedline {
        let editor = Reedline::create();
        let Some(path) = self.repl.history_path() else {
            return editor;
        };
        ensure_parent_dir(&path);
        match FileBackedHistory::with_file(HISTORY_CAPACITY, path) {
            Ok(history) => editor.with_history(Box::new(history)),
            Err(e) => {
                warn!("Chat history disabled: {}", e);
                editor
            }
        }
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> io::Result<()> {
        let mut editor = self.line_editor();
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic("fincounsel".to_string()),
            DefaultPromptSegment::Empty,
        );

        self.print_welcome();

        loop {
            match editor.read_line(&prompt)? {
                Signal::Success(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if line.starts_with('/') {
                        if self.handle_command(line).await == CommandOutcome::Exit {
                            break;
                        }
                        continue;
                    }
                    self.process_message(line).await;
                }
                Signal::CtrlC => {
                    println!("^C");
                    continue;
                }
                Signal::CtrlD => {
                    println!("Bye!");
                    break;
                }
            }
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│          fincounsel - Chat Mode             │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("Session: {}", self.session.as_str().bold());
        println!();
        Self::print_commands();
    }

    fn print_commands() {
        println!("Commands:");
        println!("  /help, /h, /?     - Show this help");
        println!("  /session          - Show the current session");
        println!("  /reset            - Clear history and the circuit breaker");
        println!("  /new              - Start a fresh session");
        println!("  /quit, /exit, /q  - Exit chat");
        println!();
        println!("Type \"help\" to see what you can ask. Ctrl-C cancels a running answer.");
        println!();
    }

    async fn handle_command(&mut self, cmd: &str) -> CommandOutcome {
        match cmd {
            "/quit" | "/exit" | "/q" => {
                println!("Bye!");
                CommandOutcome::Exit
            }
            "/help" | "/h" | "/?" => {
                println!();
                Self::print_commands();
                CommandOutcome::Continue
            }
            "/session" => {
                self.print_session().await;
                CommandOutcome::Continue
            }
            "/reset" => {
                match self.manager.reset(&self.session).await {
                    Ok(()) => println!("Session {} reset.", self.session),
                    Err(e) => eprintln!("{}", ConsoleFormatter::format_error(&e)),
                }
                CommandOutcome::Continue
            }
            "/new" => {
                self.session = SessionId::generate();
                println!("Started session {}.", self.session.as_str().bold());
                CommandOutcome::Continue
            }
            _ => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
                CommandOutcome::Continue
            }
        }
    }

    async fn print_session(&self) {
        println!();
        match self.manager.snapshot(&self.session).await {
            Ok(Some(session)) => {
                println!("Session:  {}", session.id());
                println!("Turns:    {}", session.turn());
                println!("Messages: {}", session.messages().len());
                println!(
                    "State:    {}",
                    ConsoleFormatter::state_label(&session.state())
                );
                if session.is_halted() {
                    println!("{}", "Halted: use /reset to continue.".yellow());
                }
            }
            Ok(None) => println!("Session {} has no turns yet.", self.session),
            Err(e) => eprintln!("{}", ConsoleFormatter::format_error(&e)),
        }
        println!();
    }

    async fn process_message(&self, message: &str) {
        println!();

        let cancellation = CancellationToken::new();
        let watcher = {
            let token = cancellation.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    token.cancel();
                }
            })
        };

        let progress: Box<dyn TurnProgress> = if self.repl.show_progress {
            Box::new(ProgressReporter::new())
        } else {
            Box::new(NoProgress)
        };
        let result = self
            .manager
            .handle_turn(&self.session, message, &cancellation, progress.as_ref())
            .await;
        drop(progress);
        watcher.abort();

        match result {
            Ok(reply) => println!("{}", self.formatter.render(&reply, self.output.format)),
            Err(e) => eprintln!("{}", ConsoleFormatter::format_error(&e)),
        }
        println!();
    }
}
