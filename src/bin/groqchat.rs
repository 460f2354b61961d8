//! Interactive chat application for conversing with Groq-hosted Llama models.
//!
//! This binary provides a streaming REPL interface over the Groq chat completions API.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage with default settings
//! groqchat
//!
//! # Specify a model and temperature
//! groqchat --model llama-3.1-8b-instant --temperature 0.3
//!
//! # Set a persona
//! groqchat --system "You are a helpful coding assistant"
//!
//! # Disable colors (useful for piping output)
//! groqchat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/model <id>` - Change the model
//! - `/temperature <v>` - Change the temperature
//! - `/system [prompt]` - Set or reset the persona
//! - `/clear` - Clear conversation history
//! - `/export [dir]` - Save the conversation as JSON
//! - `/quit` - Exit the application

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use biometrics::Collector;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use groqchat::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, EXPORT_MIME_TYPE, PlainTextRenderer,
    Renderer, SessionStore, help_text, parse_command, render_transcript,
};
use groqchat::{ErrorKind, Model, register_biometrics};

/// Main entry point for the groqchat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("groqchat [OPTIONS]");
    let config = ChatConfig::try_from(args)?;
    register_biometrics(Collector::new());

    let adapter = config.adapter();
    let mut store = SessionStore::new();
    config.apply_to(&mut store.initialize().config);
    let has_credential = adapter.has_credential();
    let mut session = ChatSession::from_store(adapter, store);

    // Flag for interrupt handling during streaming
    let interrupted = Arc::new(AtomicBool::new(false));
    let mut renderer =
        PlainTextRenderer::with_color_and_interrupt(config.use_color, interrupted.clone());
    let mut rl = DefaultEditor::new()?;

    // Set up Ctrl+C handler
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    renderer.print_banner(&format!(
        "Powered by Groq ({}). Type /help for commands, /quit to exit.",
        session.model().label()
    ));
    if !has_credential {
        renderer.print_error("API key not found. Please set GROQ_API_KEY in your environment.");
    }
    println!();

    loop {
        // Reset interrupt flag before each input
        interrupted.store(false, Ordering::Relaxed);

        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                // Check for slash commands
                if let Some(cmd) = parse_command(line) {
                    if cmd == ChatCommand::Quit {
                        println!("Goodbye!");
                        break;
                    }
                    handle_command(cmd, &mut session, &mut renderer, &config.export_dir);
                    continue;
                }

                // Regular message - send to API
                if let Err(e) = session.send_streaming(line, &mut renderer).await {
                    match e.kind() {
                        ErrorKind::Interrupted => {}
                        ErrorKind::Configuration => renderer.print_error(&e.to_string()),
                        ErrorKind::Transport | ErrorKind::Local => {
                            renderer.print_error(&format!("An error occurred: {e}"))
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn handle_command(
    cmd: ChatCommand,
    session: &mut ChatSession,
    renderer: &mut PlainTextRenderer,
    export_dir: &Path,
) {
    match cmd {
        ChatCommand::Quit => {}
        ChatCommand::Clear => {
            session.clear();
            renderer.print_info("Conversation cleared.");
            render_transcript(session.history(), renderer);
        }
        ChatCommand::Help => {
            for line in help_text().lines() {
                println!("    {}", line);
            }
        }
        ChatCommand::Model(model) => {
            session.set_model(model);
            renderer.print_info(&format!("Model changed to: {} ({})", model, model.label()));
        }
        ChatCommand::Models => print_models(session.model()),
        ChatCommand::Temperature(value) => {
            session.set_temperature(value);
            renderer.print_info(&format!("temperature set to {}", session.temperature()));
        }
        ChatCommand::TemperatureUp => {
            session.set_temperature(session.temperature().step_up());
            renderer.print_info(&format!("temperature set to {}", session.temperature()));
        }
        ChatCommand::TemperatureDown => {
            session.set_temperature(session.temperature().step_down());
            renderer.print_info(&format!("temperature set to {}", session.temperature()));
        }
        ChatCommand::System(prompt) => {
            let reset = prompt.is_none();
            session.set_system_prompt(prompt);
            if reset {
                renderer.print_info("Persona reset to the default.");
            } else {
                renderer.print_info(&format!("Persona set to: {}", session.system_prompt()));
            }
        }
        ChatCommand::Export(dir) => {
            let dir = dir.map(PathBuf::from).unwrap_or_else(|| export_dir.to_path_buf());
            match session.export_to(&dir) {
                Ok(path) => renderer.print_info(&format!(
                    "Exported {} messages to {} ({EXPORT_MIME_TYPE})",
                    session.message_count(),
                    path.display()
                )),
                Err(err) => renderer.print_error(&format!("Failed to export chat: {}", err)),
            }
        }
        ChatCommand::Import(path) => match session.import_from(Path::new(&path)) {
            Ok(count) => {
                renderer.print_info(&format!("Loaded {count} messages from {path}"));
                render_transcript(session.history(), renderer);
            }
            Err(err) => renderer.print_error(&format!("Failed to import chat: {}", err)),
        },
        ChatCommand::History => {
            if session.history().is_empty() {
                renderer.print_info("(no messages yet)");
            } else {
                render_transcript(session.history(), renderer);
            }
        }
        ChatCommand::Stats => print_stats(session),
        ChatCommand::ShowConfig => print_config(session),
        ChatCommand::Invalid(message) => renderer.print_error(&message),
    }
}

fn print_models(current: Model) {
    println!("    Models:");
    for model in Model::ALL {
        let marker = if model == current { "*" } else { " " };
        println!("    {marker} {:<26}{}", model.id(), model.label());
    }
}

fn print_stats(session: &ChatSession) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Model: {} ({})", stats.model, stats.model.label());
    println!("      Messages: {}", stats.message_count);
    println!("      Temperature: {}", stats.temperature);
    println!(
        "      Total tokens: {} in / {} out ({} requests, {} failed)",
        stats.total_prompt_tokens,
        stats.total_completion_tokens,
        stats.total_requests,
        stats.failed_requests
    );
    if let Some(input) = stats.last_turn_prompt_tokens {
        let output = stats.last_turn_completion_tokens.unwrap_or(0);
        println!("      Last turn tokens: {input} in / {output} out");
    }
}

fn print_config(session: &ChatSession) {
    let config = session.config();
    println!("    Current Configuration:");
    println!("      Model: {} ({})", config.model(), config.model().label());
    println!("      Temperature: {}", config.temperature());
    println!("      Persona: {}", config.system_prompt());
}
