use std::io::IsTerminal;
use std::time::{Duration, Instant};

use anstyle::{AnsiColor, Effects, Style};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

pub(crate) fn resolve_output_style(stdout_is_tty: bool, no_color: bool) -> OutputStyle {
    if stdout_is_tty && !no_color {
        OutputStyle::Rich
    } else {
        OutputStyle::Plain
    }
}

pub(crate) fn current_output_style() -> OutputStyle {
    let no_color = std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty());
    resolve_output_style(std::io::stdout().is_terminal(), no_color)
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct TerminalRenderer {
    style: OutputStyle,
}

/// Spinner shown while a network-bound step runs. Plain output gets none.
pub(crate) struct TerminalSpinner {
    style: OutputStyle,
    label: String,
    spinner: Option<ProgressBar>,
    started_at: Instant,
}

impl TerminalRenderer {
    pub(crate) fn from_style(style: OutputStyle) -> Self {
        Self { style }
    }

    pub(crate) fn current() -> Self {
        Self::from_style(current_output_style())
    }

    pub(crate) fn style(self) -> OutputStyle {
        self.style
    }

    pub(crate) fn print_status(self, status: &str, message: &str) {
        println!("{}", render_status_line(self.style, status, message));
    }

    pub(crate) fn print_section(self, title: &str) {
        if self.style == OutputStyle::Plain {
            return;
        }
        println!("{}", colorize(section_style(), &format!("== {title} ==")));
    }

    pub(crate) fn print_lines(self, lines: &[String]) {
        for line in lines {
            println!("{line}");
        }
    }

    pub(crate) fn start_spinner(self, label: &str) -> TerminalSpinner {
        let spinner = if self.style == OutputStyle::Rich {
            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan.bold} {msg} {elapsed}") {
                spinner.set_style(style.tick_chars(spinner_tick_chars(label)));
            }
            spinner.set_message(label.to_string());
            spinner.enable_steady_tick(Duration::from_millis(80));
            Some(spinner)
        } else {
            None
        };

        TerminalSpinner {
            style: self.style,
            label: label.to_string(),
            spinner,
            started_at: Instant::now(),
        }
    }
}

impl TerminalSpinner {
    pub(crate) fn finish(mut self) {
        let Some(spinner) = self.spinner.take() else {
            return;
        };
        spinner.finish_and_clear();
        if let Some(line) =
            render_elapsed_line(self.style, &self.label, self.started_at.elapsed())
        {
            println!("{line}");
        }
    }

    pub(crate) fn abandon(mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

/// Runs `work` under a spinner, clearing it on both outcomes.
pub(crate) fn with_spinner<T, E>(
    renderer: TerminalRenderer,
    label: &str,
    work: impl FnOnce() -> Result<T, E>,
) -> Result<T, E> {
    let spinner = renderer.start_spinner(label);
    let result = work();
    match &result {
        Ok(_) => spinner.finish(),
        Err(_) => spinner.abandon(),
    }
    result
}

pub(crate) fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => message.to_string(),
        OutputStyle::Rich => format!("{} {message}", status_badge(status)),
    }
}

/// Marks the active entry in `list` output.
pub(crate) fn render_installed_line(style: OutputStyle, name: &str, active: bool) -> String {
    match (style, active) {
        (_, false) => format!("  {name}"),
        (OutputStyle::Plain, true) => format!("* {name}"),
        (OutputStyle::Rich, true) => format!("* {}", colorize(active_style(), name)),
    }
}

fn status_badge(status: &str) -> &'static str {
    match status {
        "ok" => "[OK]",
        "warn" => "[WARN]",
        "err" => "[ERR]",
        _ => "[..]",
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let millis = elapsed.subsec_millis();
    format!("{secs}.{millis:03}s")
}

fn spinner_tick_chars(label: &str) -> &'static str {
    match label {
        "install" => ".oO@* ",
        "nightly" => "-=~* ",
        "catalog" => "<^>v ",
        _ => "|/-\\ ",
    }
}

fn render_elapsed_line(style: OutputStyle, label: &str, elapsed: Duration) -> Option<String> {
    if style == OutputStyle::Plain {
        return None;
    }
    Some(format!(
        "{} complete in {}",
        colorize(label_style(), label),
        format_elapsed(elapsed)
    ))
}

fn section_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightBlue.into()))
        .effects(Effects::BOLD)
}

fn label_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightCyan.into()))
        .effects(Effects::BOLD)
}

fn active_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightGreen.into()))
        .effects(Effects::BOLD)
}

pub(crate) fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}
