// ── Interface type inference ──

use std::fmt;

use crate::error::SyncError;

/// Interface type values understood by the remote directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceType {
    /// 1000BASE-T copper.
    Base1000T,
    /// 100BASE-TX copper.
    Base100Tx,
    /// T3 serial.
    T3,
    Virtual,
}

impl InterfaceType {
    /// Wire value as accepted by the `type` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Base1000T => "1000base-t",
            Self::Base100Tx => "100base-tx",
            Self::T3 => "t3",
            Self::Virtual => "virtual",
        }
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the inference table: any listed substring selects `kind`.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub patterns: &'static [&'static str],
    pub kind: InterfaceType,
}

/// Checked top to bottom against the lower-cased name; first hit wins.
pub const RULES: &[Rule] = &[
    Rule {
        patterns: &["gigabit", "gi"],
        kind: InterfaceType::Base1000T,
    },
    Rule {
        patterns: &["fast", "fa"],
        kind: InterfaceType::Base100Tx,
    },
    Rule {
        patterns: &["serial", "se"],
        kind: InterfaceType::T3,
    },
    Rule {
        patterns: &["vlan"],
        kind: InterfaceType::Virtual,
    },
    Rule {
        patterns: &["loopback", "lo"],
        kind: InterfaceType::Virtual,
    },
];

/// Infer an interface's type from its name.
pub fn infer_type(name: &str) -> Result<InterfaceType, SyncError> {
    let lowered = name.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.patterns.iter().any(|p| lowered.contains(p)))
        .map(|rule| rule.kind)
        .ok_or_else(|| SyncError::UnknownInterfaceType {
            name: name.to_owned(),
        })
}
