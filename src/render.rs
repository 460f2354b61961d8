//! Output rendering for the chat transcript and streamed replies.
//!
//! This module provides the [`Renderer`] trait, an ANSI plain-text implementation, and
//! [`render_transcript`], which replays a stored conversation through any renderer.

use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::chat::ConversationHistory;
use crate::types::Message;

/// Title shown when a session starts.
pub const APP_TITLE: &str = "Ehsan AI ChatBot";

/// Avatar shown beside user turns.
pub const USER_AVATAR: &str = "\u{1F464}";

/// Avatar shown beside assistant turns.
pub const ASSISTANT_AVATAR: &str = "\u{1F916}";

/// ANSI escape code for dim text (used for informational messages).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for turn labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// A 24-bit colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// `#RRGGBB` form.
    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }

    fn fg(&self) -> String {
        format!("\x1b[38;2;{};{};{}m", self.0, self.1, self.2)
    }

    fn bg(&self) -> String {
        format!("\x1b[48;2;{};{};{}m", self.0, self.1, self.2)
    }
}

/// The colour palette of the chat surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    /// Accent for user turns.
    pub primary: Rgb,
    /// Accent for assistant turns.
    pub secondary: Rgb,
    /// Backdrop colour.
    pub background: Rgb,
    /// Body text colour.
    pub text: Rgb,
}

/// The default palette.
pub const THEME: Theme = Theme {
    primary: Rgb(0x4F, 0x46, 0xE5),
    secondary: Rgb(0x81, 0x8C, 0xF8),
    background: Rgb(0x0F, 0x17, 0x2A),
    text: Rgb(0xF8, 0xFA, 0xFC),
};

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - Recording renderers in tests
pub trait Renderer: Send {
    /// Print one stored turn of the transcript.
    fn print_turn(&mut self, message: &Message);

    /// Called before the first fragment of a live reply.
    fn start_reply(&mut self);

    /// Print a chunk of regular response text.
    ///
    /// This is called incrementally as tokens are streamed from the API.
    fn print_text(&mut self, text: &str);

    /// Called when a live reply is complete.
    ///
    /// Used to ensure proper newlines and cleanup after streaming.
    fn finish_response(&mut self);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when the stream is interrupted by the user.
    fn print_interrupted(&mut self) {}

    /// Returns true if streaming should be interrupted.
    fn should_interrupt(&self) -> bool {
        false
    }
}

/// Replays `history` through `renderer`, one turn per message.
pub fn render_transcript(history: &ConversationHistory, renderer: &mut dyn Renderer) {
    for message in history.iter() {
        renderer.print_turn(message);
    }
}

/// Plain text renderer with optional ANSI styling.
///
/// This renderer outputs text directly to stdout with optional
/// ANSI escape codes drawn from [`THEME`].
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    theme: Theme,
    line_start: bool,
    interrupted: Option<Arc<AtomicBool>>,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            theme: THEME,
            line_start: true,
            interrupted: None,
        }
    }

    /// Attaches an interrupt flag to the renderer.
    pub fn with_interrupt(mut self, interrupted: Arc<AtomicBool>) -> Self {
        self.interrupted = Some(interrupted);
        self
    }

    /// Creates a new PlainTextRenderer with specified color and interrupt flag.
    pub fn with_color_and_interrupt(use_color: bool, interrupted: Arc<AtomicBool>) -> Self {
        Self::with_color(use_color).with_interrupt(interrupted)
    }

    /// Prints the session banner.
    pub fn print_banner(&mut self, subtitle: &str) {
        if self.use_color {
            println!(
                "{ANSI_BOLD}{}{}{APP_TITLE}{ANSI_RESET}",
                self.theme.text.fg(),
                self.theme.background.bg()
            );
        } else {
            println!("{APP_TITLE}");
        }
        self.print_info(subtitle);
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn write(&mut self, text: &str) {
        print!("{text}");
        if !text.is_empty() {
            self.line_start = text.ends_with('\n');
        }
        self.flush();
    }

    fn label(&self, message: &Message) -> String {
        let (avatar, name, accent) = match message {
            Message::System { .. } => ("", "System", self.theme.secondary),
            Message::User { .. } => (USER_AVATAR, "You", self.theme.primary),
            Message::Assistant { .. } => (ASSISTANT_AVATAR, "Assistant", self.theme.secondary),
        };
        let label = if avatar.is_empty() {
            name.to_string()
        } else {
            format!("{avatar} {name}")
        };
        if self.use_color {
            format!("{ANSI_BOLD}{}{label}{ANSI_RESET}", accent.fg())
        } else {
            label
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_turn(&mut self, message: &Message) {
        let label = self.label(message);
        self.write(&format!("{label}\n{}\n\n", message.content()));
    }

    fn start_reply(&mut self) {
        let label = self.label(&Message::assistant(""));
        self.write(&format!("{label}\n"));
    }

    fn print_text(&mut self, text: &str) {
        if self.use_color {
            let colored = format!("{}{text}{ANSI_RESET}", self.theme.text.fg());
            self.write(&colored);
            self.line_start = text.ends_with('\n');
        } else {
            self.write(text);
        }
    }

    fn finish_response(&mut self) {
        if !self.line_start {
            self.write("\n");
        }
        self.write("\n");
    }

    fn print_error(&mut self, error: &str) {
        if !self.line_start {
            self.write("\n");
        }
        if self.use_color {
            eprintln!("{ANSI_RED}Error: {error}{ANSI_RESET}");
        } else {
            eprintln!("Error: {error}");
        }
        self.line_start = true;
    }

    fn print_info(&mut self, info: &str) {
        if self.use_color {
            println!("{ANSI_DIM}{info}{ANSI_RESET}");
        } else {
            println!("{info}");
        }
        self.line_start = true;
        self.flush();
    }

    fn print_interrupted(&mut self) {
        let prefix = if self.line_start { "" } else { "\n" };
        self.write(&format!("{prefix}[interrupted]\n"));
    }

    fn should_interrupt(&self) -> bool {
        self.interrupted
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Renderer that records every call, for assertions.
    #[derive(Default)]
    pub(crate) struct RecordingRenderer {
        pub events: Vec<String>,
        pub interrupt_after: Option<usize>,
        pub fragments: usize,
        pub flag: Option<Arc<AtomicBool>>,
    }

    impl Renderer for RecordingRenderer {
        fn print_turn(&mut self, message: &Message) {
            self.events
                .push(format!("turn {}: {}", message.role(), message.content()));
        }

        fn start_reply(&mut self) {
            self.events.push("start".to_string());
        }

        fn print_text(&mut self, text: &str) {
            self.fragments += 1;
            self.events.push(format!("text {text}"));
        }

        fn finish_response(&mut self) {
            self.events.push("finish".to_string());
        }

        fn print_error(&mut self, error: &str) {
            self.events.push(format!("error {error}"));
        }

        fn print_info(&mut self, info: &str) {
            self.events.push(format!("info {info}"));
        }

        fn print_interrupted(&mut self) {
            self.events.push("interrupted".to_string());
        }

        fn should_interrupt(&self) -> bool {
            self.interrupt_after
                .is_some_and(|after| self.fragments >= after)
                || self
                    .flag
                    .as_ref()
                    .is_some_and(|flag| flag.load(Ordering::Relaxed))
        }
    }

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color);
    }

    #[test]
    fn renderer_without_color() {
        let renderer = PlainTextRenderer::with_color(false);
        assert!(!renderer.use_color);
    }

    #[test]
    fn labels_distinguish_roles() {
        let renderer = PlainTextRenderer::with_color(false);
        assert_eq!(renderer.label(&Message::user("x")), "\u{1F464} You");
        assert_eq!(
            renderer.label(&Message::assistant("x")),
            "\u{1F916} Assistant"
        );

        let renderer = PlainTextRenderer::with_color(true);
        let label = renderer.label(&Message::user("x"));
        assert!(label.contains("\x1b[38;2;79;70;229m"));
        assert!(label.ends_with(ANSI_RESET));
    }

    #[test]
    fn theme_hex() {
        assert_eq!(THEME.primary.hex(), "#4F46E5");
        assert_eq!(THEME.secondary.hex(), "#818CF8");
        assert_eq!(THEME.background.hex(), "#0F172A");
        assert_eq!(THEME.text.hex(), "#F8FAFC");
    }

    #[test]
    fn transcript_replays_in_order() {
        let mut history = ConversationHistory::new();
        history.push_exchange("hi", "hello");
        history.push_exchange("bye", "goodbye");
        let mut renderer = RecordingRenderer::default();
        render_transcript(&history, &mut renderer);
        assert_eq!(
            renderer.events,
            vec![
                "turn user: hi",
                "turn assistant: hello",
                "turn user: bye",
                "turn assistant: goodbye",
            ]
        );
    }

    #[test]
    fn interrupt_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let renderer = PlainTextRenderer::with_color_and_interrupt(false, flag.clone());
        assert!(!renderer.should_interrupt());
        flag.store(true, Ordering::Relaxed);
        assert!(renderer.should_interrupt());
    }
}
