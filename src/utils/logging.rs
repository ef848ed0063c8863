//! Colored diagnostic output.
//!
//! Diagnostics go to stderr so that stdout only ever carries transfer lines.
//! [`init`] also installs this module as the `log` backend, which lets the
//! pipeline use `log::debug!`/`log::warn!` and still render in the same style.
//! Setting `SOLTRACK_SILENT=1` mutes everything.

use chrono::Local;
use colored::Colorize;

/// Severity of a diagnostic line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
    Debug,
}

struct Logger;

static LOGGER: Logger = Logger;

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        if metadata.level() > log::max_level() {
            return false;
        }
        // Dependencies are only shown from warnings upwards.
        metadata.level() <= log::Level::Warn || metadata.target().starts_with("soltrack")
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = match record.level() {
            log::Level::Error => LogLevel::Error,
            log::Level::Warn => LogLevel::Warning,
            log::Level::Info => LogLevel::Info,
            log::Level::Debug | log::Level::Trace => LogLevel::Debug,
        };
        log(level, &record.args().to_string());
    }

    fn flush(&self) {}
}

/// Installs the `log` backend. Calling it more than once is harmless.
pub fn init(verbose: bool) {
    let max_level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(max_level);
    }
}

fn is_silent() -> bool {
    std::env::var("SOLTRACK_SILENT").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

fn format_line(level: LogLevel, message: &str) -> String {
    let tag = match level {
        LogLevel::Info => "INFO ".blue().bold(),
        LogLevel::Success => "OK   ".green().bold(),
        LogLevel::Warning => "WARN ".yellow().bold(),
        LogLevel::Error => "ERROR".red().bold(),
        LogLevel::Debug => "DEBUG".dimmed(),
    };
    let timestamp = Local::now().format("%H:%M:%S%.3f").to_string();
    format!("{} {} {}", timestamp.dimmed(), tag, message)
}

/// Writes a single diagnostic line.
pub fn log(level: LogLevel, message: &str) {
    if is_silent() {
        return;
    }
    eprintln!("{}", format_line(level, message));
}

/// Writes an error with its context, e.g. `log_error("Fetch failed", "sig: timeout")`.
pub fn log_error(context: &str, detail: &str) {
    log(LogLevel::Error, &format!("{}: {detail}", context.bold()));
}

/// Writes a section header.
pub fn log_section(title: &str) {
    if is_silent() {
        return;
    }
    let rule = "=".repeat(60);
    eprintln!("\n{}\n  {}\n{}", rule.cyan(), title.bold(), rule.cyan());
}

/// Writes the startup banner.
pub fn log_startup(wallet: &str, rpc_url: &str, ws_url: &str, commitment: &str) {
    log_section("soltrack - Solana wallet monitor");
    if is_silent() {
        return;
    }
    eprintln!("  {:<12} {}", "Wallet:".bold(), wallet);
    eprintln!("  {:<12} {}", "RPC:".bold(), rpc_url);
    eprintln!("  {:<12} {}", "WebSocket:".bold(), ws_url);
    eprintln!("  {:<12} {}\n", "Commitment:".bold(), commitment);
}
