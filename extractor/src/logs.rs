//! Run log: leveled progress lines.
//!
//! Pipelines report each step through the `log_*` helpers. Errors go to
//! stderr, everything else to stdout.

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    fn marker(self) -> &'static str {
        match self {
            LogLevel::Info => "",
            LogLevel::Success => "✓ ",
            LogLevel::Warning => "⚠️ ",
            LogLevel::Error => "❌ ",
        }
    }
}

/// One printed line: three spaces per nesting level, then the level marker.
pub fn render(level: LogLevel, message: &str, indent: u8) -> String {
    format!(
        "{}{}{}",
        "   ".repeat(usize::from(indent) + 1),
        level.marker(),
        message
    )
}

fn emit(level: LogLevel, message: String, indent: u8) {
    let line = render(level, &message, indent);
    match level {
        LogLevel::Error => eprintln!("{}", line),
        _ => println!("{}", line),
    }
}

pub fn log_info(msg: impl Into<String>) {
    emit(LogLevel::Info, msg.into(), 0);
}

pub fn log_success(msg: impl Into<String>) {
    emit(LogLevel::Success, msg.into(), 0);
}

pub fn log_warning(msg: impl Into<String>) {
    emit(LogLevel::Warning, msg.into(), 0);
}

pub fn log_error(msg: impl Into<String>) {
    emit(LogLevel::Error, msg.into(), 0);
}

/// Info line for a sub-step.
pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    emit(LogLevel::Info, msg.into(), indent);
}
