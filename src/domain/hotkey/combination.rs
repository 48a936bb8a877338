//! Key identifiers and key combinations

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::error::KeyComboParseError;

/// Platform-independent key identifier.
///
/// Left/right variants of a modifier collapse into a single identifier,
/// so `Ctrl` matches either control key. Variant order defines the
/// canonical display order (modifiers first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyId {
    Ctrl,
    Alt,
    Shift,
    Meta,
    Function(u8),
    Letter(char),
    Digit(u8),
    Space,
    Tab,
    Enter,
    Escape,
    Backspace,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    PrintScreen,
    Pause,
}

impl KeyId {
    /// Whether this key is a modifier
    pub const fn is_modifier(&self) -> bool {
        matches!(self, Self::Ctrl | Self::Alt | Self::Shift | Self::Meta)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ctrl => write!(f, "Ctrl"),
            Self::Alt => write!(f, "Alt"),
            Self::Shift => write!(f, "Shift"),
            Self::Meta => write!(f, "Meta"),
            Self::Function(n) => write!(f, "F{}", n),
            Self::Letter(c) => write!(f, "{}", c.to_ascii_uppercase()),
            Self::Digit(d) => write!(f, "{}", d),
            Self::Space => write!(f, "Space"),
            Self::Tab => write!(f, "Tab"),
            Self::Enter => write!(f, "Enter"),
            Self::Escape => write!(f, "Escape"),
            Self::Backspace => write!(f, "Backspace"),
            Self::Delete => write!(f, "Delete"),
            Self::Insert => write!(f, "Insert"),
            Self::Home => write!(f, "Home"),
            Self::End => write!(f, "End"),
            Self::PageUp => write!(f, "PageUp"),
            Self::PageDown => write!(f, "PageDown"),
            Self::Up => write!(f, "Up"),
            Self::Down => write!(f, "Down"),
            Self::Left => write!(f, "Left"),
            Self::Right => write!(f, "Right"),
            Self::PrintScreen => write!(f, "PrintScreen"),
            Self::Pause => write!(f, "Pause"),
        }
    }
}

impl FromStr for KeyId {
    type Err = KeyComboParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_lowercase();

        let key = match token.as_str() {
            "ctrl" | "control" | "ctrl_l" | "ctrl_r" => Self::Ctrl,
            "alt" | "option" | "opt" | "alt_gr" | "altgr" => Self::Alt,
            "shift" => Self::Shift,
            "meta" | "cmd" | "command" | "win" | "super" => Self::Meta,
            "space" => Self::Space,
            "tab" => Self::Tab,
            "enter" | "return" => Self::Enter,
            "escape" | "esc" => Self::Escape,
            "backspace" => Self::Backspace,
            "delete" | "del" => Self::Delete,
            "insert" | "ins" => Self::Insert,
            "home" => Self::Home,
            "end" => Self::End,
            "pageup" | "pgup" => Self::PageUp,
            "pagedown" | "pgdn" => Self::PageDown,
            "up" => Self::Up,
            "down" => Self::Down,
            "left" => Self::Left,
            "right" => Self::Right,
            "printscreen" | "print" => Self::PrintScreen,
            "pause" => Self::Pause,
            _ => return parse_simple_key(&token, s),
        };

        Ok(key)
    }
}

/// Parse function keys, letters and digits
fn parse_simple_key(token: &str, original: &str) -> Result<KeyId, KeyComboParseError> {
    let unknown = || KeyComboParseError::UnknownKey(original.trim().to_string());

    if let Some(number) = token.strip_prefix('f') {
        if !number.is_empty() {
            let n: u8 = number.parse().map_err(|_| unknown())?;
            return if (1..=24).contains(&n) {
                Ok(KeyId::Function(n))
            } else {
                Err(unknown())
            };
        }
    }

    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Ok(KeyId::Letter(c)),
        (Some(c), None) if c.is_ascii_digit() => Ok(KeyId::Digit(c as u8 - b'0')),
        _ => Err(unknown()),
    }
}

/// An unordered set of keys that must be held simultaneously.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct KeyCombination {
    keys: BTreeSet<KeyId>,
}

impl KeyCombination {
    /// Build a combination from keys
    pub fn new(keys: impl IntoIterator<Item = KeyId>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// The keys in canonical order
    pub fn keys(&self) -> &BTreeSet<KeyId> {
        &self.keys
    }

    /// Exact set equality with the currently held keys
    pub fn matches(&self, held: &BTreeSet<KeyId>) -> bool {
        !self.keys.is_empty() && &self.keys == held
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Display for KeyCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.keys.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join("+"))
    }
}

impl FromStr for KeyCombination {
    type Err = KeyComboParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(KeyComboParseError::Empty);
        }

        let mut keys = BTreeSet::new();
        for token in s.split('+') {
            if token.trim().is_empty() {
                return Err(KeyComboParseError::Empty);
            }
            let key: KeyId = token.parse()?;
            if !keys.insert(key) {
                return Err(KeyComboParseError::DuplicateKey(key.to_string()));
            }
        }

        Ok(Self { keys })
    }
}

impl Serialize for KeyCombination {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for KeyCombination {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(keys: &[KeyId]) -> BTreeSet<KeyId> {
        keys.iter().copied().collect()
    }

    #[test]
    fn parses_modifier_and_function_key() {
        let combo: KeyCombination = "Ctrl+F1".parse().unwrap();
        assert_eq!(combo.keys(), &held(&[KeyId::Ctrl, KeyId::Function(1)]));
    }

    #[test]
    fn parsing_is_case_insensitive_with_aliases() {
        let a: KeyCombination = "control+SHIFT+cmd+x".parse().unwrap();
        let b: KeyCombination = "Meta+Shift+Ctrl+X".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn display_is_canonical() {
        let combo: KeyCombination = "f2 + shift + ctrl".parse().unwrap();
        assert_eq!(combo.to_string(), "Ctrl+Shift+F2");
    }

    #[test]
    fn rejects_unknown_key() {
        let err = "Ctrl+Banana".parse::<KeyCombination>().unwrap_err();
        assert!(matches!(err, KeyComboParseError::UnknownKey(k) if k == "Banana"));
    }

    #[test]
    fn rejects_empty_and_dangling_plus() {
        assert!(matches!(
            "".parse::<KeyCombination>(),
            Err(KeyComboParseError::Empty)
        ));
        assert!(matches!(
            "Ctrl+".parse::<KeyCombination>(),
            Err(KeyComboParseError::Empty)
        ));
    }

    #[test]
    fn rejects_duplicate_keys() {
        let err = "Ctrl+Control+A".parse::<KeyCombination>().unwrap_err();
        assert!(matches!(err, KeyComboParseError::DuplicateKey(_)));
    }

    #[test]
    fn rejects_out_of_range_function_key() {
        assert!("F25".parse::<KeyCombination>().is_err());
        assert!("F0".parse::<KeyCombination>().is_err());
    }

    #[test]
    fn matches_requires_exact_set() {
        let combo: KeyCombination = "Ctrl+F1".parse().unwrap();
        assert!(combo.matches(&held(&[KeyId::Function(1), KeyId::Ctrl])));
        assert!(!combo.matches(&held(&[KeyId::Ctrl, KeyId::Shift, KeyId::Function(1)])));
        assert!(!combo.matches(&held(&[KeyId::Function(1)])));
    }

    #[test]
    fn digits_and_letters() {
        let combo: KeyCombination = "Alt+7".parse().unwrap();
        assert!(combo.keys().contains(&KeyId::Digit(7)));
        assert_eq!(combo.to_string(), "Alt+7");
    }
}
