use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;
use cross_xdg::BaseDirs;
use nu_ansi_term::Color;

use crate::executor::EofPolicy;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "BFSCAN_CONFIG";

const CONFIG_FILE: &str = "bfscan.toml";

/// Colors used when printing diagnostics to a terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct Colors {
    pub error: Color,
    pub context: Color,
    pub caret: Color,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            error: Color::Red,
            context: Color::DarkGray,
            caret: Color::Yellow,
        }
    }
}

/// Values read from the config file. `None` means "not set there".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub eof: Option<EofPolicy>,
    pub cells: Option<usize>,
    pub colors: Colors,
}

static SETTINGS: OnceLock<Settings> = OnceLock::new();

pub fn settings() -> &'static Settings {
    SETTINGS.get_or_init(|| load_from_toml().unwrap_or_default())
}

/// `$BFSCAN_CONFIG` if set, otherwise `bfscan.toml` in the XDG config home.
pub fn config_path() -> Option<PathBuf> {
    if let Some(explicit) = env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(explicit));
    }

    // On Linux: resolves to /home/<user>/.config
    // On Windows: resolves to C:\Users\<user>\.config
    // On macOS: resolves to /Users/<user>/.config
    let base_dirs = BaseDirs::new().ok()?;
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push(CONFIG_FILE);
    Some(path)
}

fn load_from_toml() -> Option<Settings> {
    let path = config_path()?;
    let content = fs::read_to_string(&path).ok()?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Some(parse(&content))
}

/// Parse the small TOML subset we accept: `[section]` headers and
/// `key = value` pairs, values quoted or bare, `#` comments.
pub fn parse(content: &str) -> Settings {
    let mut section = String::new();
    let mut map: HashMap<(String, String), String> = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') { continue; }
        if line.starts_with('[') && line.ends_with(']') {
            section = line[1..line.len()-1].trim().to_string();
            continue;
        }
        if let Some(eq) = line.find('=') {
            let key = line[..eq].trim().to_string();
            let val = unquote(strip_comment(line[eq+1..].trim()));
            map.insert((section.clone(), key), val.to_string());
        }
    }

    let get = |section: &str, key: &str| map.get(&(section.to_string(), key.to_string()));

    let mut cfg = Settings::default();

    if let Some(v) = get("interpreter", "eof") {
        match v.parse::<EofPolicy>() {
            Ok(eof) => cfg.eof = Some(eof),
            Err(e) => tracing::warn!("ignoring config value: {e}"),
        }
    }
    if let Some(v) = get("interpreter", "cells") {
        match v.replace('_', "").parse::<usize>() {
            Ok(n) if n > 0 => cfg.cells = Some(n),
            _ => tracing::warn!(value = %v, "ignoring config value for cells"),
        }
    }

    macro_rules! set {
        ($field:ident, $key:literal) => {
            if let Some(c) = get("colors", $key).and_then(|s| parse_color(s)) { cfg.colors.$field = c; }
        };
    }

    set!(error, "error");
    set!(context, "context");
    set!(caret, "caret");

    cfg
}

fn strip_comment(value: &str) -> &str {
    if value.starts_with('"') {
        // Comment may only follow the closing quote.
        match value[1..].find('"') {
            Some(close) => value[..close + 2].trim(),
            None => value,
        }
    } else {
        value.split('#').next().unwrap_or(value).trim()
    }
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len()-1]
    } else {
        value
    }
}

fn parse_color(value: &str) -> Option<Color> {
    let s = value.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() == 6 && hex.is_ascii() {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return Some(Color::Rgb(r, g, b));
            }
        }
        return None;
    }

    let name = s.to_ascii_lowercase();
    Some(match name.as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" | "purple" => Color::Purple,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "gray" | "grey" => Color::LightGray,
        "darkgray" | "dark_grey" | "darkgrey" | "dark_gray" => Color::DarkGray,
        "lightred" | "light_red" => Color::LightRed,
        "lightgreen" | "light_green" => Color::LightGreen,
        "lightyellow" | "light_yellow" => Color::LightYellow,
        "lightblue" | "light_blue" => Color::LightBlue,
        "lightmagenta" | "light_magenta" => Color::LightPurple,
        "lightcyan" | "light_cyan" => Color::LightCyan,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(parse(""), Settings::default());
    }

    #[test]
    fn reads_interpreter_section() {
        let cfg = parse(
            r#"
            # tape settings
            [interpreter]
            eof = "zero"
            cells = 1_000
            "#,
        );
        assert_eq!(cfg.eof, Some(EofPolicy::Zero));
        assert_eq!(cfg.cells, Some(1000));
    }

    #[test]
    fn keys_outside_their_section_are_ignored() {
        let cfg = parse("eof = zero\n[colors]\ncells = 5\n");
        assert_eq!(cfg.eof, None);
        assert_eq!(cfg.cells, None);
    }

    #[test]
    fn bad_values_fall_back_to_unset() {
        let cfg = parse("[interpreter]\neof = maybe\ncells = 0\n");
        assert_eq!(cfg.eof, None);
        assert_eq!(cfg.cells, None);
    }

    #[test]
    fn trailing_comments_are_stripped() {
        let cfg = parse("[interpreter]\neof = unchanged # keep cell\ncells = 12 # small\n");
        assert_eq!(cfg.eof, Some(EofPolicy::Unchanged));
        assert_eq!(cfg.cells, Some(12));
    }

    #[test]
    fn colors_accept_names_and_hex() {
        let cfg = parse("[colors]\nerror = \"#ff8000\"\ncaret = light_blue\ncontext = nonsense\n");
        assert_eq!(cfg.colors.error, Color::Rgb(255, 128, 0));
        assert_eq!(cfg.colors.caret, Color::LightBlue);
        assert_eq!(cfg.colors.context, Colors::default().context);
    }

    #[test]
    fn non_ascii_hex_color_is_ignored() {
        // "aééb" is six bytes long but not six hex digits.
        let cfg = parse("[colors]\nerror = \"#aééb\"\n");
        assert_eq!(cfg.colors.error, Colors::default().error);
    }
}
