use serde_derive::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// A consensus upgrade after which Engine API wire formats may change.
///
/// Variants are declared in activation order so the derived `Ord` follows the fork schedule.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SpecMilestone {
    #[strum(serialize = "PHASE0")]
    Phase0,
    #[strum(serialize = "ALTAIR")]
    Altair,
    #[strum(serialize = "BELLATRIX")]
    Bellatrix,
    #[strum(serialize = "CAPELLA")]
    Capella,
    #[strum(serialize = "DENEB")]
    Deneb,
}

impl SpecMilestone {
    /// The lower-case consensus fork name, as used in fork schedules and beacon APIs.
    pub fn fork_name(&self) -> &'static str {
        match self {
            SpecMilestone::Phase0 => "phase0",
            SpecMilestone::Altair => "altair",
            SpecMilestone::Bellatrix => "bellatrix",
            SpecMilestone::Capella => "capella",
            SpecMilestone::Deneb => "deneb",
        }
    }

    /// All milestones in activation order.
    pub fn all() -> impl Iterator<Item = SpecMilestone> {
        SpecMilestone::iter()
    }
}
