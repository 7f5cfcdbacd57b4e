use serde::{Deserialize, Serialize};

use crate::comment::EligibleEntry;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeTier {
    /// 1-based, matches the position in the table.
    pub rank: u32,
    pub name: String,
    pub detail: String,
    /// Retail value in NT$.
    pub value: u64,
}

impl PrizeTier {
    fn new(rank: u32, name: &str, detail: &str, value: u64) -> Self {
        Self { rank, name: name.to_string(), detail: detail.to_string(), value }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Award {
    pub entry: EligibleEntry,
    pub tier: Option<PrizeTier>,
}

/// The campaign's prize catalogue, best prize first.
pub fn default_tiers() -> Vec<PrizeTier> {
    const GRAND: &str = "Ocean Discovery Grand Prize";
    const GUARDIAN: &str = "Ocean Guardian Prize";
    const FRIEND: &str = "Cetacean Friend Prize";
    const SKIN: &str = "Skincare Prize";
    vec![
        PrizeTier::new(1, GRAND, "Bay-view deluxe room + light glow skincare set", 10797),
        PrizeTier::new(2, GUARDIAN, "Sea turtle cup sleeve + light glow skincare set", 1789),
        PrizeTier::new(3, GUARDIAN, "Sea turtle cup sleeve + cleansing star set", 1740),
        PrizeTier::new(4, GUARDIAN, "Sea turtle cup sleeve + light glow skincare set", 1789),
        PrizeTier::new(5, FRIEND, "Orca keyring + cleansing star set", 669),
        PrizeTier::new(6, FRIEND, "Whale keyring + pore purifying set", 634),
        PrizeTier::new(7, SKIN, "Orca keyring + pore purifying set", 669),
        PrizeTier::new(8, SKIN, "Whale keyring + gentle cleansing set", 634),
        PrizeTier::new(9, SKIN, "Light glow skincare set", 600),
        PrizeTier::new(10, SKIN, "Light glow skincare set", 600),
        PrizeTier::new(11, SKIN, "Light glow skincare set", 600),
        PrizeTier::new(12, SKIN, "Cleansing star set", 580),
        PrizeTier::new(13, SKIN, "Pore purifying set", 550),
        PrizeTier::new(14, SKIN, "Pore purifying set", 550),
        PrizeTier::new(15, SKIN, "Gentle cleansing set", 520),
        PrizeTier::new(16, SKIN, "Cleansing star set", 580),
        PrizeTier::new(17, SKIN, "Gentle cleansing set", 520),
        PrizeTier::new(18, SKIN, "Gentle cleansing set", 520),
    ]
}

/// Pairs `winners[i]` with `tiers[i]`. Winners beyond the table get `None`.
pub fn assign_prizes(winners: &[EligibleEntry], tiers: &[PrizeTier]) -> Vec<Award> {
    winners.iter().enumerate().map(|(i, entry)| Award { entry: entry.clone(), tier: tiers.get(i).cloned() }).collect()
}
