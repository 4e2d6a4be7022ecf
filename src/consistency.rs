use std::fmt;

use serde::{Deserialize, Serialize};

/// Tunable per-statement consistency for reads and writes.
///
/// The variants mirror the native-protocol consistency set; `code` returns
/// the wire value a transport puts into the request frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyLevel {
    Any,
    One,
    Two,
    Three,
    Quorum,
    All,
    LocalQuorum,
    EachQuorum,
    Serial,
    LocalSerial,
    #[default]
    LocalOne,
}

impl ConsistencyLevel {
    /// Native-protocol wire code for this level.
    pub const fn code(self) -> u16 {
        match self {
            Self::Any => 0x0000,
            Self::One => 0x0001,
            Self::Two => 0x0002,
            Self::Three => 0x0003,
            Self::Quorum => 0x0004,
            Self::All => 0x0005,
            Self::LocalQuorum => 0x0006,
            Self::EachQuorum => 0x0007,
            Self::Serial => 0x0008,
            Self::LocalSerial => 0x0009,
            Self::LocalOne => 0x000A,
        }
    }
}

impl fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "ANY",
            Self::One => "ONE",
            Self::Two => "TWO",
            Self::Three => "THREE",
            Self::Quorum => "QUORUM",
            Self::All => "ALL",
            Self::LocalQuorum => "LOCAL_QUORUM",
            Self::EachQuorum => "EACH_QUORUM",
            Self::Serial => "SERIAL",
            Self::LocalSerial => "LOCAL_SERIAL",
            Self::LocalOne => "LOCAL_ONE",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_codes() {
        assert_eq!(ConsistencyLevel::Any.code(), 0x0000);
        assert_eq!(ConsistencyLevel::Quorum.code(), 0x0004);
        assert_eq!(ConsistencyLevel::LocalOne.code(), 0x000A);
    }

    #[test]
    fn test_default_is_local_one() {
        assert_eq!(ConsistencyLevel::default(), ConsistencyLevel::LocalOne);
    }

    #[test]
    fn test_display_uses_protocol_names() {
        assert_eq!(ConsistencyLevel::LocalQuorum.to_string(), "LOCAL_QUORUM");
        assert_eq!(ConsistencyLevel::EachQuorum.to_string(), "EACH_QUORUM");
    }
}
