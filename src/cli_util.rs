use std::io::{self, IsTerminal, Write};
use nu_ansi_term::Style;
use crate::config;
use crate::executor::{ExecError, UnmatchedBracket};
use crate::program::Program;

/// Bytes shown on each side of the offending instruction.
const WINDOW_BYTES: usize = 32;

/// Pretty-print a syntax error with caret positioning.
/// `program` is the executable name used as the message prefix, e.g. "bfscan: ...".
pub fn print_syntax_error(program: &str, code: &Program, bracket: &UnmatchedBracket) {
    let msg = format!("{program}: Syntax error: unmatched bracket {}", bracket.kind);
    print_error_with_context(&msg, code, bracket.ip);
}

pub fn print_exec_error(program: &str, code: &Program, err: &ExecError) {
    match err {
        ExecError::Io { ip, source } => {
            let msg = format!("{program}: I/O error: {source}");
            print_error_with_context(&msg, code, *ip);
        }
    }
}

/// Print a concise error with instruction index and a caret context window.
pub fn print_error_with_context(prefix: &str, code: &Program, pos: usize) {
    let (window, underline) = render_context(code, pos);

    let colored = io::stderr().is_terminal();
    let colors = &config::settings().colors;
    let paint = |style: Style, text: &str| {
        if colored { style.paint(text).to_string() } else { text.to_string() }
    };

    eprintln!("{} at instruction {pos}", paint(colors.error.bold(), prefix));
    eprintln!("  {}", paint(colors.context.normal(), &window));
    eprintln!("  {}", paint(colors.caret.bold(), &underline));
    let _ = io::stderr().flush();
}

/// Build the one-line source window around `pos` and the caret line under it.
///
/// Each source byte takes exactly one column: whitespace renders as a space
/// and other non-printable bytes as `?`.
pub fn render_context(code: &Program, pos: usize) -> (String, String) {
    let start = pos.saturating_sub(WINDOW_BYTES);
    let end = pos.saturating_add(WINDOW_BYTES + 1);

    let window: String = code
        .source_bytes(start..end)
        .into_iter()
        .map(|b| match b {
            b' '..=b'~' => b as char,
            b'\t' | b'\n' | b'\r' => ' ',
            _ => '?',
        })
        .collect();

    // Caret under the exact position
    let mut underline = " ".repeat(pos - start);
    underline.push('^');
    (window, underline)
}
