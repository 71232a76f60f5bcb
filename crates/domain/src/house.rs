//! Houses: rest-capacity containers, decoded the same bit-packed way as heroes.

use std::fmt;

use crate::error::DomainError;
use crate::gen::GenBits;

// Bit offsets of the house stat fields (LSB-first, wire contract).
const GI_ID: usize = 0;
const GI_RESERVED: usize = 30;
const GI_RARITY: usize = 40;
const GI_RECOVERY: usize = 45;
const GI_SLOTS: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HouseKind {
    Tiny,
    Mini,
    Luxury,
    Pent,
    Villa,
    SuperVilla,
    Unknown,
}

impl HouseKind {
    pub fn from_index(index: u32) -> Self {
        match index {
            0 => Self::Tiny,
            1 => Self::Mini,
            2 => Self::Luxury,
            3 => Self::Pent,
            4 => Self::Villa,
            5 => Self::SuperVilla,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HouseStats {
    pub id: u32,
    pub reserved: u32,
    pub rarity: u32,
    pub recovery: u32,
    pub slots: u32,
}

impl HouseStats {
    pub fn decode(gen_id: &str) -> Result<Self, DomainError> {
        let bits = GenBits::parse(gen_id)?;
        if bits.len() < GI_SLOTS {
            return Err(DomainError::InvalidGenId(gen_id.to_string()));
        }

        Ok(Self {
            id: bits.field(GI_ID, GI_RESERVED),
            reserved: bits.field(GI_RESERVED, GI_RARITY),
            rarity: bits.field(GI_RARITY, GI_RECOVERY),
            recovery: bits.field(GI_RECOVERY, GI_SLOTS),
            slots: bits.field(GI_SLOTS, bits.len()),
        })
    }
}

/// A house the squad can rest in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct House {
    stats: HouseStats,
    active: bool,
}

impl House {
    pub fn new(stats: HouseStats, active: bool) -> Self {
        Self { stats, active }
    }

    pub fn id(&self) -> u32 {
        self.stats.id
    }

    pub fn active(&self) -> bool {
        self.active
    }

    /// How many resting heroes this house can hold.
    pub fn slots(&self) -> u32 {
        self.stats.slots
    }

    pub fn recovery_per_min(&self) -> f64 {
        f64::from(self.stats.recovery) / 60.0
    }

    pub fn kind(&self) -> HouseKind {
        HouseKind::from_index(self.stats.rarity)
    }
}

impl fmt::Display for House {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?} SLT {}", self.id(), self.kind(), self.slots())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    #[test]
    fn decodes_house_fields() {
        let mut value = U256::ZERO;
        value |= U256::from(123u64) << GI_ID;
        value |= U256::from(2u64) << GI_RARITY; // Luxury
        value |= U256::from(600u64) << GI_RECOVERY;
        value |= U256::from(4u64) << GI_SLOTS;
        let stats = HouseStats::decode(&value.to_string()).expect("decodes");

        assert_eq!(stats.id, 123);
        assert_eq!(stats.rarity, 2);
        assert_eq!(stats.recovery, 600);
        assert_eq!(stats.slots, 4);

        let house = House::new(stats, true);
        assert_eq!(house.kind(), HouseKind::Luxury);
        assert_eq!(house.slots(), 4);
        assert!((house.recovery_per_min() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn short_house_gen_id_is_rejected() {
        let short = (U256::from(1u64) << 40usize).to_string();
        assert!(matches!(
            HouseStats::decode(&short),
            Err(DomainError::InvalidGenId(_))
        ));
    }
}
