use serde::{Deserialize, Serialize};
use std::fmt;

/// Two-valued sync flag of a captured record. The only legal transition is
/// `Unsynced -> Synced`; the store enforces that it is monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncState {
    Unsynced,
    Synced,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Unsynced => "unsynced",
            SyncState::Synced => "synced",
        }
    }

    pub fn is_synced(&self) -> bool {
        matches!(self, SyncState::Synced)
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<bool> for SyncState {
    fn from(flag: bool) -> Self {
        if flag {
            SyncState::Synced
        } else {
            SyncState::Unsynced
        }
    }
}
