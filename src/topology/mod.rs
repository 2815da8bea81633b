use std::fmt;

use serde::{Deserialize, Serialize};

pub mod classify;
pub mod compiler;
pub mod normalize;
pub mod parser;

pub use compiler::compile_vdevs;
pub use parser::parse_status_tokens;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaidParity {
    Single,
    Double,
}

impl RaidParity {
    /// Vdev type keyword understood by `zpool create`.
    #[inline]
    pub fn keyword(self) -> &'static str {
        match self {
            RaidParity::Single => "raidz1",
            RaidParity::Double => "raidz2",
        }
    }
}

impl fmt::Display for RaidParity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Device layout of one pool.
///
/// Group order is significant: it is the positional order used on creation
/// and must survive a create/inspect round trip unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolTopology {
    pub name: String,
    pub disks: Vec<Vec<String>>,
    pub mirrors: Vec<Vec<String>>,
    pub raidz: Vec<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raid_parity: Option<RaidParity>,
    pub logs: Vec<String>,
    pub spares: Vec<String>,
}

impl PoolTopology {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parity applied to every raidz group; unset means single parity.
    #[inline]
    pub fn effective_parity(&self) -> RaidParity {
        self.raid_parity.unwrap_or(RaidParity::Single)
    }

    pub fn field(&self, field: Field) -> FieldValue {
        match field {
            Field::Disk => FieldValue::Groups(self.disks.clone()),
            Field::Mirror => FieldValue::Groups(self.mirrors.clone()),
            Field::Raidz => FieldValue::Groups(self.raidz.clone()),
            Field::Log => FieldValue::Devices(self.logs.clone()),
            Field::Spare => FieldValue::Devices(self.spares.clone()),
        }
    }
}

/// Result of inspecting a pool by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolState {
    Absent,
    Present(PoolTopology),
}

impl PoolState {
    #[inline]
    pub fn exists(&self) -> bool {
        matches!(self, PoolState::Present(_))
    }

    pub fn topology(&self) -> Option<&PoolTopology> {
        match self {
            PoolState::Absent => None,
            PoolState::Present(t) => Some(t),
        }
    }

    pub fn field(&self, field: Field) -> FieldValue {
        match self {
            PoolState::Absent => FieldValue::Absent,
            PoolState::Present(t) => t.field(field),
        }
    }
}

/// Structural fields fixed at pool creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    Disk,
    Mirror,
    Raidz,
    Log,
    Spare,
}

impl Field {
    #[cfg(test)]
    pub const ALL: [Field; 5] = [
        Field::Disk,
        Field::Mirror,
        Field::Raidz,
        Field::Log,
        Field::Spare,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Disk => "disk",
            Field::Mirror => "mirror",
            Field::Raidz => "raidz",
            Field::Log => "log",
            Field::Spare => "spare",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Absent,
    Groups(Vec<Vec<String>>),
    Devices(Vec<String>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Absent => f.write_str("absent"),
            FieldValue::Devices(devs) => write!(f, "[{}]", devs.join(", ")),
            FieldValue::Groups(groups) => {
                let parts: Vec<String> = groups
                    .iter()
                    .map(|g| format!("[{}]", g.join(", ")))
                    .collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}
