//! Outbound recipient list.
//!
//! A single channel name and a list of channel names are distinct variants,
//! so a plain string can never be mistaken for a sequence of one-character
//! recipients.

use serde::{Deserialize, Serialize};

/// One or many chat targets (channels or nicks).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Recipients {
    /// Exactly one target.
    One(String),
    /// Several targets, delivered in order.
    Many(Vec<String>),
}

impl Recipients {
    /// Iterate targets in delivery order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let targets: &[String] = match self {
            Self::One(target) => std::slice::from_ref(target),
            Self::Many(targets) => targets,
        };
        targets.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(targets) => targets.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for Recipients {
    fn from(s: &str) -> Self {
        Self::One(s.to_string())
    }
}

impl From<String> for Recipients {
    fn from(s: String) -> Self {
        Self::One(s)
    }
}

impl From<&String> for Recipients {
    fn from(s: &String) -> Self {
        Self::One(s.clone())
    }
}

impl From<Vec<String>> for Recipients {
    fn from(v: Vec<String>) -> Self {
        Self::Many(v)
    }
}

impl From<Vec<&str>> for Recipients {
    fn from(v: Vec<&str>) -> Self {
        Self::Many(v.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Recipients {
    fn from(v: &[&str]) -> Self {
        Self::Many(v.iter().map(|s| (*s).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Recipients {
    fn from(v: [&str; N]) -> Self {
        Self::Many(v.iter().map(|s| (*s).to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_string_is_one_recipient() {
        let r = Recipients::from("#zenircbot");
        assert_eq!(r.len(), 1);
        assert_eq!(r.iter().collect::<Vec<_>>(), vec!["#zenircbot"]);
    }

    #[test]
    fn test_array_preserves_order() {
        let r = Recipients::from(["b", "a", "c"]);
        assert_eq!(r.iter().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_empty_list() {
        let r = Recipients::from(Vec::<String>::new());
        assert!(r.is_empty());
        assert_eq!(r.iter().count(), 0);
    }

    #[test]
    fn test_untagged_serde() {
        let one: Recipients = serde_json::from_str(r##""#ops""##).unwrap();
        assert_eq!(one, Recipients::One("#ops".to_string()));

        let many: Recipients = serde_json::from_str(r##"["#ops","#log"]"##).unwrap();
        assert_eq!(many.len(), 2);
    }
}
