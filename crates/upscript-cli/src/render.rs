use std::io::IsTerminal;
use std::time::Duration;

use anstyle::{AnsiColor, Effects, Style};
use indicatif::{ProgressBar, ProgressStyle};

use crate::exit_code::find_installation_failure;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct TerminalRenderer {
    style: OutputStyle,
}

pub(crate) struct StepSpinner {
    style: OutputStyle,
    progress_bar: Option<ProgressBar>,
}

impl TerminalRenderer {
    pub(crate) fn from_style(style: OutputStyle) -> Self {
        Self { style }
    }

    pub(crate) fn current() -> Self {
        Self::from_style(current_output_style())
    }

    pub(crate) fn print_status(self, status: &str, message: &str) {
        println!("{}", render_status_line(self.style, status, message));
    }

    pub(crate) fn print_section(self, title: &str) {
        if self.style == OutputStyle::Plain {
            return;
        }
        println!();
        println!("{}", colorize(section_style(), &format!("== {title} ==")));
    }

    /// Spinner for a blocking step; plain output stays silent until the step
    /// finishes.
    pub(crate) fn start_step(self, message: &str) -> StepSpinner {
        let progress_bar = if self.style == OutputStyle::Rich {
            let progress_bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan.bold} {msg} {elapsed}")
            {
                progress_bar.set_style(style.tick_chars(".oO@* "));
            }
            progress_bar.set_message(message.to_string());
            progress_bar.enable_steady_tick(Duration::from_millis(80));
            Some(progress_bar)
        } else {
            None
        };

        StepSpinner {
            style: self.style,
            progress_bar,
        }
    }
}

impl StepSpinner {
    pub(crate) fn finish_success(mut self, message: &str) {
        if let Some(progress_bar) = self.progress_bar.take() {
            progress_bar.finish_and_clear();
        }
        println!("{}", render_status_line(self.style, "ok", message));
    }

    pub(crate) fn finish_abandon(mut self) {
        if let Some(progress_bar) = self.progress_bar.take() {
            progress_bar.finish_and_clear();
        }
    }
}

pub(crate) fn resolve_output_style(stdout_is_tty: bool, _stderr_is_tty: bool) -> OutputStyle {
    if stdout_is_tty {
        OutputStyle::Rich
    } else {
        OutputStyle::Plain
    }
}

pub(crate) fn current_output_style() -> OutputStyle {
    resolve_output_style(
        std::io::stdout().is_terminal(),
        std::io::stderr().is_terminal(),
    )
}

pub(crate) fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => message.to_string(),
        OutputStyle::Rich => {
            let badge = match status {
                "ok" => "[OK]",
                "warn" => "[WARN]",
                "err" => "[ERR]",
                "step" => "[..]",
                _ => "[--]",
            };
            format!("{badge} {message}")
        }
    }
}

/// Error report for stderr: the context chain, then any package manager
/// output captured from a failed install.
pub(crate) fn render_error_lines(style: OutputStyle, err: &anyhow::Error) -> Vec<String> {
    let mut lines = vec![render_status_line(style, "err", &format!("{err:#}"))];
    if let Some(failure) = find_installation_failure(err) {
        lines.extend(failure.diagnostics().lines().map(str::to_string));
    }
    lines
}

pub(crate) fn format_launcher_summary(written: usize, removed: usize) -> String {
    let noun = if written == 1 { "launcher" } else { "launchers" };
    if removed == 0 {
        format!("wrote {written} {noun}")
    } else {
        format!("wrote {written} {noun}, removed {removed} stale")
    }
}

fn section_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightBlue.into()))
        .effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}
