use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::input::KeyCode;

/// A key combination: the set of keys that must be held together.
///
/// Bindings are values. Rebinding produces a new binding and leaves the old
/// one untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShortcutBinding {
    combination: BTreeSet<KeyCode>,
}

impl ShortcutBinding {
    pub fn new(keys: impl IntoIterator<Item = KeyCode>) -> Result<Self> {
        let combination: BTreeSet<KeyCode> = keys.into_iter().collect();
        if combination.is_empty() {
            return Err(Error::InvalidShortcut(
                "a shortcut needs at least one key".to_string(),
            ));
        }
        Ok(Self { combination })
    }

    /// Parse a spec such as `"Ctrl+Shift+R"`.
    pub fn parse(spec: &str) -> Result<Self> {
        if spec.trim().is_empty() {
            return Err(Error::invalid_shortcut(spec, "empty shortcut string"));
        }

        let mut combination = BTreeSet::new();
        for part in spec.split('+') {
            let part = part.trim();
            if part.is_empty() {
                return Err(Error::invalid_shortcut(spec, "empty key name"));
            }
            let key = KeyCode::from_name(part)
                .ok_or_else(|| Error::invalid_shortcut(spec, &format!("unknown key '{}'", part)))?;
            combination.insert(key);
        }

        Ok(Self { combination })
    }

    pub fn rebound_to(&self, spec: &str) -> Result<Self> {
        Self::parse(spec)
    }

    pub fn combination(&self) -> &BTreeSet<KeyCode> {
        &self.combination
    }

    pub fn contains(&self, key: KeyCode) -> bool {
        self.combination.contains(&key)
    }

    /// True when exactly the bound keys are held.
    pub fn matches(&self, held: &HashSet<KeyCode>) -> bool {
        held.len() == self.combination.len() && self.combination.iter().all(|k| held.contains(k))
    }
}

impl fmt::Display for ShortcutBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<KeyCode> = self.combination.iter().copied().collect();
        keys.sort_by_key(|k| k.display_rank());
        let parts: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        f.write_str(&parts.join("+"))
    }
}

impl FromStr for ShortcutBinding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShortcutBinding {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<ShortcutBinding> for String {
    fn from(binding: ShortcutBinding) -> Self {
        binding.to_string()
    }
}
