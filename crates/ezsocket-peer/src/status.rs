//! Status strings exchanged after each iteration of a negotiated loop.

/// Sent by a client that wants to keep looping.
pub const STATUS_ACTIVE: &str = "Active";
/// Sent by a client that has been asked to stop.
pub const STATUS_STOP: &str = "Stop";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStatus {
    Active,
    Stop,
}

impl LoopStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LoopStatus::Active => STATUS_ACTIVE,
            LoopStatus::Stop => STATUS_STOP,
        }
    }

    /// Exact match only; anything else is `None`.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            STATUS_ACTIVE => Some(LoopStatus::Active),
            STATUS_STOP => Some(LoopStatus::Stop),
            _ => None,
        }
    }
}
