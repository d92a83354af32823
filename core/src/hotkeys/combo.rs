use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chatsound_types::{Key, ParseKeyError};

/// An unordered set of keys that must be held together
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Combo(BTreeSet<Key>);

impl Combo {
    pub fn new(keys: impl IntoIterator<Item = Key>) -> Self {
        Self(keys.into_iter().collect())
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.0.iter()
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.0.contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keys in display order, for persisting in `HotkeySettings`
    pub fn to_keys(&self) -> Vec<Key> {
        self.0.iter().cloned().collect()
    }
}

impl FromIterator<Key> for Combo {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl From<&[Key]> for Combo {
    fn from(keys: &[Key]) -> Self {
        keys.iter().cloned().collect()
    }
}

/// Parses `"Ctrl+Shift+C"`; whitespace around `+` is ignored
impl FromStr for Combo {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let combo = s
            .split('+')
            .map(str::parse::<Key>)
            .collect::<Result<Combo, _>>()?;
        if combo.is_empty() {
            return Err(ParseKeyError(s.to_string()));
        }
        Ok(combo)
    }
}

impl fmt::Display for Combo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" + ")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_does_not_matter() {
        let a: Combo = "ctrl+shift+c".parse().unwrap();
        let b: Combo = "C + Shift + Ctrl".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn displays_modifiers_first() {
        let combo = Combo::new([Key::Char('C'), Key::LeftShift, Key::LeftControl]);
        assert_eq!(combo.to_string(), "LeftControl + LeftShift + C");
    }

    #[test]
    fn rejects_empty_parts() {
        assert!("".parse::<Combo>().is_err());
        assert!("ctrl++c".parse::<Combo>().is_err());
    }
}
