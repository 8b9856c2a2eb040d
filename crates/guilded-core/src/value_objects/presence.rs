//! Presence - the coloured status circle shown next to a user

use std::fmt;

/// User presence as reported by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Presence {
    #[default]
    Online = 1,
    Idle = 2,
    DoNotDisturb = 3,
    Invisible = 4,
}

impl Presence {
    /// Create a `Presence` from its wire value
    #[must_use]
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::Online),
            2 => Some(Self::Idle),
            3 => Some(Self::DoNotDisturb),
            4 => Some(Self::Invisible),
            _ => None,
        }
    }

    /// Get the wire value
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Idle => "idle",
            Self::DoNotDisturb => "dnd",
            Self::Invisible => "invisible",
        }
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
