use std::io::{IsTerminal, Write};
use std::time::Duration;

use anyhow::anyhow;
use crossterm::cursor::{Hide, MoveToColumn, Show};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor, Stylize};
use crossterm::terminal::{Clear, ClearType};
use crossterm::{execute, queue};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const SPINNER_FRAMES: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Resolve a `--color` value to a terminal color.
///
/// Accepts the basic color names (with `dark_` variants) and `#rrggbb`.
pub fn resolve_color(value: Option<&str>) -> Result<Option<Color>, anyhow::Error> {
    let value = match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => return Ok(None),
    };

    parse_color(value)
        .map(Some)
        .ok_or_else(|| anyhow!("The value provided for --color is not a valid color."))
}

fn parse_color(value: &str) -> Option<Color> {
    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        return Some(Color::Rgb {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        });
    }

    let color = match value.to_ascii_lowercase().replace('-', "_").as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "dark_red" | "maroon" => Color::DarkRed,
        "green" | "lime" => Color::Green,
        "dark_green" => Color::DarkGreen,
        "yellow" => Color::Yellow,
        "dark_yellow" | "olive" => Color::DarkYellow,
        "blue" => Color::Blue,
        "dark_blue" | "navy" => Color::DarkBlue,
        "magenta" | "purple" | "fuchsia" => Color::Magenta,
        "dark_magenta" => Color::DarkMagenta,
        "cyan" | "aqua" => Color::Cyan,
        "dark_cyan" | "teal" => Color::DarkCyan,
        "white" => Color::White,
        "grey" | "gray" | "silver" => Color::Grey,
        "dark_grey" | "dark_gray" => Color::DarkGrey,
        _ => return None,
    };
    Some(color)
}

/// Print the model's answer to stdout.
pub fn print_response(content: &str, color: Option<Color>) -> Result<(), anyhow::Error> {
    let mut stdout = std::io::stdout();
    match color {
        Some(color) => {
            queue!(
                stdout,
                SetForegroundColor(color),
                Print(content),
                ResetColor,
                Print("\n")
            )?;
        }
        None => writeln!(stdout, "{}", content)?,
    }
    stdout.flush()?;
    Ok(())
}

pub fn print_success(message: &str) {
    println!("{}", message.green());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "Error:".red(), message);
}

/// Animated status line on stderr while a request is in flight.
pub struct Spinner {
    stop: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Spinner {
    pub fn start(message: &str) -> Spinner {
        if !std::io::stderr().is_terminal() {
            return Spinner {
                stop: None,
                handle: None,
            };
        }

        Spinner::start_on(message, std::io::stderr())
    }

    /// Animate on any writer; `start` only picks stderr when it is a terminal.
    pub fn start_on<W>(message: &str, mut out: W) -> Spinner
    where
        W: Write + Send + 'static,
    {
        let (stop, mut stopped) = oneshot::channel();
        let message = message.to_string();
        let handle = tokio::spawn(async move {
            let _ = execute!(out, Hide);
            let mut ticker = tokio::time::interval(Duration::from_millis(100));
            let mut frame = 0;
            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    _ = ticker.tick() => {
                        let line = format!("{} {}", SPINNER_FRAMES[frame], message);
                        let _ = execute!(out, MoveToColumn(0), Print(line));
                        frame = (frame + 1) % SPINNER_FRAMES.len();
                    }
                }
            }
            let _ = execute!(out, MoveToColumn(0), Clear(ClearType::CurrentLine), Show);
        });

        Spinner {
            stop: Some(stop),
            handle: Some(handle),
        }
    }

    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}
