//! Keybinding configuration for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::Deserialize;

use crate::tui::event::Action;

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Key strings for every action. Each action accepts several keys.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeybindingConfig {
    pub quit: Vec<String>,
    pub move_up: Vec<String>,
    pub move_down: Vec<String>,
    pub jump_up: Vec<String>,
    pub jump_down: Vec<String>,
    pub open: Vec<String>,
    pub back: Vec<String>,
    pub refresh: Vec<String>,
    pub refresh_all: Vec<String>,
    pub search: Vec<String>,
    pub toggle_read: Vec<String>,
    pub read_all: Vec<String>,
    pub open_in_browser: Vec<String>,
    pub mixed: Vec<String>,
    pub help: Vec<String>,
}

impl Default for KeybindingConfig {
    fn default() -> Self {
        Self {
            quit: keys(&["q", "Ctrl+c"]),
            move_up: keys(&["k", "Up"]),
            move_down: keys(&["j", "Down"]),
            jump_up: keys(&["K", "Shift+Up", "PageUp"]),
            jump_down: keys(&["J", "Shift+Down", "PageDown"]),
            open: keys(&["Enter", "l", "Right", "Tab"]),
            back: keys(&["h", "Left", "BackTab", "Esc"]),
            refresh: keys(&["r"]),
            refresh_all: keys(&["R"]),
            search: keys(&["/"]),
            toggle_read: keys(&["x"]),
            read_all: keys(&["X"]),
            open_in_browser: keys(&["o"]),
            mixed: keys(&["m"]),
            help: keys(&["?"]),
        }
    }
}

impl KeybindingConfig {
    /// Get the action for a key event. Earlier entries win on overlap.
    pub fn get_action(&self, key: &KeyEvent) -> Action {
        let table: [(&[String], Action); 15] = [
            (&self.quit, Action::Quit),
            (&self.move_up, Action::MoveUp),
            (&self.move_down, Action::MoveDown),
            (&self.jump_up, Action::JumpUp),
            (&self.jump_down, Action::JumpDown),
            (&self.open, Action::Open),
            (&self.back, Action::Back),
            (&self.refresh, Action::Refresh),
            (&self.refresh_all, Action::RefreshAll),
            (&self.search, Action::Search),
            (&self.toggle_read, Action::ToggleRead),
            (&self.read_all, Action::ReadAll),
            (&self.open_in_browser, Action::OpenInBrowser),
            (&self.mixed, Action::Mixed),
            (&self.help, Action::Help),
        ];

        table
            .into_iter()
            .find(|(bindings, _)| matches_key(key, bindings))
            .map(|(_, action)| action)
            .unwrap_or(Action::None)
    }

    /// First configured key for `action`, for the help line.
    pub fn label(&self, action: Action) -> &str {
        let bindings = match action {
            Action::Quit => &self.quit,
            Action::MoveUp => &self.move_up,
            Action::MoveDown => &self.move_down,
            Action::JumpUp => &self.jump_up,
            Action::JumpDown => &self.jump_down,
            Action::Open => &self.open,
            Action::Back => &self.back,
            Action::Refresh => &self.refresh,
            Action::RefreshAll => &self.refresh_all,
            Action::Search => &self.search,
            Action::ToggleRead => &self.toggle_read,
            Action::ReadAll => &self.read_all,
            Action::OpenInBrowser => &self.open_in_browser,
            Action::Mixed => &self.mixed,
            Action::Help => &self.help,
            Action::None => return "",
        };
        bindings.first().map(String::as_str).unwrap_or("")
    }
}

fn matches_key(key: &KeyEvent, bindings: &[String]) -> bool {
    bindings
        .iter()
        .filter_map(|binding| parse_key_string(binding).ok())
        .any(|parsed| parsed.matches(key))
}

/// A parsed key binding with code and modifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    /// Shift is ignored on character events so "K" matches Shift+k.
    pub fn matches(&self, key: &KeyEvent) -> bool {
        self.code == key.code
            && (self.modifiers == key.modifiers
                || (matches!(key.code, KeyCode::Char(_))
                    && self.modifiers == (key.modifiers & !KeyModifiers::SHIFT)))
    }
}

/// Parse a key string such as `"j"`, `"PageDown"` or `"Ctrl+c"`.
///
/// Modifiers are `Ctrl`, `Shift` and `Alt`, joined with `+`. A literal
/// plus sign is written `"+"`.
pub fn parse_key_string(s: &str) -> Result<KeyBinding, String> {
    let s = s.trim();
    if s == "+" {
        return Ok(KeyBinding {
            code: KeyCode::Char('+'),
            modifiers: KeyModifiers::NONE,
        });
    }

    let (mods, key_part) = match s.rsplit_once('+') {
        Some((mods, key)) => (Some(mods), key),
        None => (None, s),
    };

    let mut modifiers = KeyModifiers::NONE;
    for part in mods.into_iter().flat_map(|m| m.split('+')) {
        match part.to_lowercase().as_str() {
            "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
            "shift" => modifiers |= KeyModifiers::SHIFT,
            "alt" => modifiers |= KeyModifiers::ALT,
            _ => return Err(format!("Unknown modifier: {}", part)),
        }
    }

    let code = parse_key_code(key_part)?;
    Ok(KeyBinding { code, modifiers })
}

fn parse_key_code(s: &str) -> Result<KeyCode, String> {
    let mut chars = s.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(KeyCode::Char(c));
    }

    let lower = s.to_lowercase();
    if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
        if (1..=12).contains(&n) {
            return Ok(KeyCode::F(n));
        }
    }

    match lower.as_str() {
        "enter" | "return" => Ok(KeyCode::Enter),
        "tab" => Ok(KeyCode::Tab),
        "backtab" => Ok(KeyCode::BackTab),
        "backspace" | "bs" => Ok(KeyCode::Backspace),
        "delete" | "del" => Ok(KeyCode::Delete),
        "home" => Ok(KeyCode::Home),
        "end" => Ok(KeyCode::End),
        "pageup" | "pgup" => Ok(KeyCode::PageUp),
        "pagedown" | "pgdn" => Ok(KeyCode::PageDown),
        "up" => Ok(KeyCode::Up),
        "down" => Ok(KeyCode::Down),
        "left" => Ok(KeyCode::Left),
        "right" => Ok(KeyCode::Right),
        "esc" | "escape" => Ok(KeyCode::Esc),
        "space" => Ok(KeyCode::Char(' ')),
        _ => Err(format!("Unknown key: {}", s)),
    }
}
