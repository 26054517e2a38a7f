use indicatif::{ProgressBar, ProgressStyle};
use nu_ansi_term::{Color, Style};
use std::fmt::Display;
use std::io::IsTerminal;
use std::time::{Duration, Instant};

/// When to emit ANSI colours.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Clone, Copy)]
enum Tone {
    Heading,
    Key,
    Info,
    Success,
    Warn,
    Error,
}

impl Tone {
    fn style(self) -> Style {
        match self {
            Tone::Heading => Style::new().fg(Color::Purple).bold(),
            Tone::Key => Style::new().fg(Color::LightBlue).bold(),
            Tone::Info => Style::new().fg(Color::LightCyan),
            Tone::Success => Style::new().fg(Color::LightGreen).bold(),
            Tone::Warn => Style::new().fg(Color::Yellow).bold(),
            Tone::Error => Style::new().fg(Color::LightRed).bold(),
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Tone::Heading => "▸",
            Tone::Key => "",
            Tone::Info => "ℹ",
            Tone::Success => "✔",
            Tone::Warn => "⚠",
            Tone::Error => "✖",
        }
    }
}

/// Terminal output for the harness. `quiet` drops icons, colours and
/// spinners but keeps every message.
pub struct Ui {
    paint: bool,
    quiet: bool,
}

impl Ui {
    pub fn new(color: ColorChoice, quiet: bool) -> Self {
        let paint = !quiet
            && match color {
                ColorChoice::Always => true,
                ColorChoice::Never => false,
                ColorChoice::Auto => std::io::stdout().is_terminal(),
            };

        #[cfg(windows)]
        if paint {
            let _ = nu_ansi_term::enable_ansi_support();
        }

        Self { paint, quiet }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn spacer(&self) {
        if !self.quiet {
            println!();
        }
    }

    pub fn heading(&self, title: &str) {
        if self.quiet {
            println!("{title}");
        } else {
            println!("{}", self.paint(Tone::Heading, &format!("{} {title}", Tone::Heading.icon())));
        }
    }

    pub fn info(&self, message: &str) {
        println!("{}", self.line(Tone::Info, message));
    }

    pub fn success(&self, message: &str) {
        println!("{}", self.line(Tone::Success, message));
    }

    pub fn warn(&self, message: &str) {
        eprintln!("{}", self.line(Tone::Warn, message));
    }

    pub fn error(&self, message: &str) {
        eprintln!("{}", self.line(Tone::Error, message));
    }

    /// Heading followed by right-aligned `key: value` rows.
    pub fn section<'a, I, V>(&self, title: &str, rows: I)
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Display,
    {
        let rows: Vec<(&str, String)> = rows
            .into_iter()
            .map(|(key, value)| (key, value.to_string()))
            .collect();
        self.heading(title);
        let width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
        for (key, value) in rows {
            let key = format!("{key:>width$}:");
            println!("  {} {value}", self.paint(Tone::Key, &key));
        }
    }

    /// Heading followed by one bullet per entry; nothing when empty.
    pub fn list<I>(&self, title: &str, entries: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut entries = entries.into_iter().peekable();
        if entries.peek().is_none() {
            return;
        }
        self.heading(title);
        for entry in entries {
            println!("  - {entry}");
        }
    }

    /// Starts a spinner that runs until [`Task::finish`].
    pub fn task(&self, message: impl Into<String>) -> Task {
        let spinner = (!self.quiet).then(|| {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} ({elapsed})") {
                pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
            }
            pb.set_message(message.into());
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        });
        Task {
            start: Instant::now(),
            spinner,
        }
    }

    fn line(&self, tone: Tone, message: &str) -> String {
        if self.quiet {
            message.to_string()
        } else {
            format!("{} {message}", self.paint(tone, tone.icon()))
        }
    }

    fn paint(&self, tone: Tone, text: &str) -> String {
        if self.paint {
            tone.style().paint(text).to_string()
        } else {
            text.to_string()
        }
    }
}

/// A running child process shown as a spinner.
pub struct Task {
    start: Instant,
    spinner: Option<ProgressBar>,
}

impl Task {
    /// Clears the spinner and returns how long it ran.
    pub fn finish(self) -> Duration {
        if let Some(pb) = self.spinner {
            pb.finish_and_clear();
        }
        self.start.elapsed()
    }
}

pub fn format_duration(duration: Duration) -> String {
    if duration.as_secs_f64() >= 1.0 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{:.0}ms", duration.as_secs_f64() * 1_000.0)
    }
}
