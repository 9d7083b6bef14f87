//! Key binding configuration (`shortcut.toml`).

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Bindings for every screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shortcuts {
    pub login: LoginShortcuts,
    pub home: HomeShortcuts,
    pub tasks: TaskShortcuts,
    pub capture: CaptureShortcuts,
    pub confirm: ConfirmShortcuts,
    pub input_box: InputBoxShortcuts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginShortcuts {
    pub quit: Vec<String>,
    pub cpf: Vec<String>,
    pub matricula: Vec<String>,
    pub sign_in: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeShortcuts {
    pub quit: Vec<String>,
    pub new_capture: Vec<String>,
    pub manual_capture: Vec<String>,
    pub tasks: Vec<String>,
    pub refresh: Vec<String>,
    pub sign_out: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskShortcuts {
    pub back: Vec<String>,
    pub refresh: Vec<String>,
    pub resolve: Vec<String>,
    pub down: Vec<String>,
    pub up: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureShortcuts {
    pub back: Vec<String>,
    pub scan: Vec<String>,
    pub identity: Vec<String>,
    pub quantity: Vec<String>,
    pub validity: Vec<String>,
    pub submit: Vec<String>,
}

/// Answers to a y/n question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmShortcuts {
    pub yes: Vec<String>,
    pub no: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputBoxShortcuts {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub backspace: Vec<String>,
    pub delete: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub home: Vec<String>,
    pub end: Vec<String>,
    pub clear_line: Vec<String>,
}

impl Shortcuts {
    /// Read from TOML, or fall back to defaults when the file is absent.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self {
            login: LoginShortcuts {
                quit: keys(&["q"]),
                cpf: keys(&["c"]),
                matricula: keys(&["m"]),
                sign_in: keys(&["Enter"]),
            },
            home: HomeShortcuts {
                quit: keys(&["q"]),
                new_capture: keys(&["n"]),
                manual_capture: keys(&["d"]),
                tasks: keys(&["p"]),
                refresh: keys(&["r"]),
                sign_out: keys(&["o"]),
            },
            tasks: TaskShortcuts {
                back: keys(&["Esc"]),
                refresh: keys(&["r"]),
                resolve: keys(&["Enter"]),
                down: keys(&["Down", "j"]),
                up: keys(&["Up", "k"]),
            },
            capture: CaptureShortcuts {
                back: keys(&["Esc"]),
                scan: keys(&["s"]),
                identity: keys(&["e"]),
                quantity: keys(&["u"]),
                validity: keys(&["v"]),
                submit: keys(&["Enter"]),
            },
            confirm: ConfirmShortcuts {
                yes: keys(&["y"]),
                no: keys(&["n", "Esc"]),
            },
            input_box: InputBoxShortcuts {
                confirm: keys(&["Enter"]),
                cancel: keys(&["Esc"]),
                backspace: keys(&["Backspace"]),
                delete: keys(&["Delete"]),
                left: keys(&["Left"]),
                right: keys(&["Right"]),
                home: keys(&["Home"]),
                end: keys(&["End"]),
                clear_line: keys(&["Ctrl+u"]),
            },
        }
    }
}

/// True if `key` matches any of the binding strings.
pub fn matches_shortcut(key: &KeyEvent, shortcuts: &[String]) -> bool {
    shortcuts.iter().any(|s| matches_single_shortcut(key, s))
}

/// Match one binding such as `"q"`, `"Enter"` or `"Ctrl+u"`.
fn matches_single_shortcut(key: &KeyEvent, shortcut: &str) -> bool {
    let (mods, key_str) = match shortcut.rsplit_once('+') {
        Some((mods, k)) if !k.is_empty() => (mods, k),
        _ => ("", shortcut),
    };

    let mut expected = KeyModifiers::empty();
    for m in mods.split('+').filter(|m| !m.is_empty()) {
        match m.to_ascii_lowercase().as_str() {
            "ctrl" => expected |= KeyModifiers::CONTROL,
            "alt" => expected |= KeyModifiers::ALT,
            "shift" => expected |= KeyModifiers::SHIFT,
            _ => return false,
        }
    }
    // terminals report SHIFT for upper-case chars; ignore it for plain chars
    let actual = match key.code {
        KeyCode::Char(_) if !expected.contains(KeyModifiers::SHIFT) => {
            key.modifiers.difference(KeyModifiers::SHIFT)
        }
        _ => key.modifiers,
    };
    if actual != expected {
        return false;
    }

    let code = match key_str.to_ascii_lowercase().as_str() {
        "enter" => KeyCode::Enter,
        "esc" => KeyCode::Esc,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "delete" => KeyCode::Delete,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        _ => {
            let mut chars = key_str.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => return false,
            }
        }
    };
    key.code == code
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, mods: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, mods)
    }

    #[test]
    fn simple_char() {
        let k = key(KeyCode::Char('s'), KeyModifiers::empty());
        assert!(matches_shortcut(&k, &keys(&["s"])));
        assert!(!matches_shortcut(&k, &keys(&["u"])));
    }

    #[test]
    fn named_keys_are_case_insensitive() {
        let k = key(KeyCode::Enter, KeyModifiers::empty());
        assert!(matches_shortcut(&k, &keys(&["Enter"])));
        assert!(matches_shortcut(&k, &keys(&["enter"])));
        assert!(!matches_shortcut(&k, &keys(&["Esc"])));
    }

    #[test]
    fn modifier_must_match() {
        let k = key(KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert!(matches_shortcut(&k, &keys(&["Ctrl+u"])));
        assert!(!matches_shortcut(&k, &keys(&["u"])));
        assert!(!matches_shortcut(&k, &keys(&["Hyper+u"])));
    }

    #[test]
    fn plus_key_itself() {
        let k = key(KeyCode::Char('+'), KeyModifiers::empty());
        assert!(matches_shortcut(&k, &keys(&["+"])));
    }

    #[test]
    fn any_of_several_bindings() {
        let bindings = keys(&["Down", "j"]);
        assert!(matches_shortcut(&key(KeyCode::Down, KeyModifiers::empty()), &bindings));
        assert!(matches_shortcut(&key(KeyCode::Char('j'), KeyModifiers::empty()), &bindings));
        assert!(!matches_shortcut(&key(KeyCode::Char('k'), KeyModifiers::empty()), &bindings));
    }

    #[test]
    fn defaults_round_trip_through_toml() {
        let s = toml::to_string_pretty(&Shortcuts::default()).unwrap();
        let back: Shortcuts = toml::from_str(&s).unwrap();
        assert_eq!(back.capture.scan, vec!["s".to_string()]);
    }
}
