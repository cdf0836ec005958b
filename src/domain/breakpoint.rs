//! Named container-width tiers

use serde::{Deserialize, Serialize};

/// Responsive breakpoint, each with its own independent grid layout
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    Lg,
    Md,
    Sm,
    Xs,
    Xxs,
}

impl Breakpoint {
    pub const ALL: [Breakpoint; 5] = [
        Breakpoint::Lg,
        Breakpoint::Md,
        Breakpoint::Sm,
        Breakpoint::Xs,
        Breakpoint::Xxs,
    ];

    /// Key used in persisted layouts
    pub fn name(self) -> &'static str {
        match self {
            Breakpoint::Lg => "lg",
            Breakpoint::Md => "md",
            Breakpoint::Sm => "sm",
            Breakpoint::Xs => "xs",
            Breakpoint::Xxs => "xxs",
        }
    }
}

impl std::fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_lowercase_key() {
        assert_eq!(serde_json::to_string(&Breakpoint::Xxs).unwrap(), "\"xxs\"");
        let bp: Breakpoint = serde_json::from_str("\"md\"").unwrap();
        assert_eq!(bp, Breakpoint::Md);
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!(serde_json::from_str::<Breakpoint>("\"foo\"").is_err());
    }
}
