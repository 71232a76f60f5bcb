//! Pending rewards and their claim codes.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RewardKind {
    Bomberman,
    BCoin,
    Key,
    Sen,
    Unknown,
}

impl RewardKind {
    /// Map the wire's reward tag; unmapped tags decode as `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "BOMBERMAN" => Self::Bomberman,
            "BCOIN" => Self::BCoin,
            "KEY" => Self::Key,
            "SEN" => Self::Sen,
            _ => Self::Unknown,
        }
    }

    /// The numeric reward type the claim command expects, for kinds the
    /// server lets us claim.
    pub fn claim_code(&self) -> Option<u32> {
        match self {
            Self::BCoin => Some(1),
            Self::Sen => Some(7),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reward {
    pub kind: RewardKind,
    pub value: f64,
    pub remain_time: i64,
}
