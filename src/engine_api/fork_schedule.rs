use crate::engine_api::milestone::SpecMilestone;
use crate::engine_api::Error;
use serde_derive::{Deserialize, Serialize};
use std::convert::TryFrom;

pub type Epoch = u64;
pub type Slot = u64;

pub const MINIMAL_SLOTS_PER_EPOCH: u64 = 8;
pub const MAINNET_SLOTS_PER_EPOCH: u64 = 32;

/// Supplies the milestones a network configuration supports and which one is active.
///
/// `supported_milestones` must be ascending and free of duplicates.
pub trait MilestoneProvider: Send + Sync {
    fn supported_milestones(&self) -> Vec<SpecMilestone>;

    fn milestone_at_slot(&self, slot: Slot) -> SpecMilestone;
}

/// Raw, unvalidated fork schedule as it appears in a network configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForkScheduleConfig {
    pub slots_per_epoch: u64,
    #[serde(default)]
    pub altair_fork_epoch: Option<Epoch>,
    #[serde(default)]
    pub bellatrix_fork_epoch: Option<Epoch>,
    #[serde(default)]
    pub capella_fork_epoch: Option<Epoch>,
    #[serde(default)]
    pub deneb_fork_epoch: Option<Epoch>,
}

/// The fork epochs of a network. Phase0 is always active from genesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ForkScheduleConfig", into = "ForkScheduleConfig")]
pub struct ForkSchedule {
    config: ForkScheduleConfig,
}

impl TryFrom<ForkScheduleConfig> for ForkSchedule {
    type Error = Error;

    fn try_from(config: ForkScheduleConfig) -> Result<Self, Error> {
        let schedule = ForkSchedule { config };
        schedule.validate()?;
        Ok(schedule)
    }
}

impl From<ForkSchedule> for ForkScheduleConfig {
    fn from(schedule: ForkSchedule) -> Self {
        schedule.config
    }
}

impl ForkSchedule {
    pub fn new(config: ForkScheduleConfig) -> Result<Self, Error> {
        Self::try_from(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let config: ForkScheduleConfig = serde_json::from_str(json)?;
        Self::new(config)
    }

    /// Every fork up to and including `milestone` at genesis, none after it.
    fn minimal_through(milestone: SpecMilestone) -> Self {
        let at_genesis = |fork: SpecMilestone| (fork <= milestone).then_some(0);
        ForkSchedule {
            config: ForkScheduleConfig {
                slots_per_epoch: MINIMAL_SLOTS_PER_EPOCH,
                altair_fork_epoch: at_genesis(SpecMilestone::Altair),
                bellatrix_fork_epoch: at_genesis(SpecMilestone::Bellatrix),
                capella_fork_epoch: at_genesis(SpecMilestone::Capella),
                deneb_fork_epoch: at_genesis(SpecMilestone::Deneb),
            },
        }
    }

    pub fn minimal_phase0() -> Self {
        Self::minimal_through(SpecMilestone::Phase0)
    }

    pub fn minimal_bellatrix() -> Self {
        Self::minimal_through(SpecMilestone::Bellatrix)
    }

    pub fn minimal_capella() -> Self {
        Self::minimal_through(SpecMilestone::Capella)
    }

    pub fn minimal_deneb() -> Self {
        Self::minimal_through(SpecMilestone::Deneb)
    }

    pub fn mainnet() -> Self {
        ForkSchedule {
            config: ForkScheduleConfig {
                slots_per_epoch: MAINNET_SLOTS_PER_EPOCH,
                altair_fork_epoch: Some(74240),
                bellatrix_fork_epoch: Some(144896),
                capella_fork_epoch: Some(194048),
                deneb_fork_epoch: Some(269568),
            },
        }
    }

    pub fn slots_per_epoch(&self) -> u64 {
        self.config.slots_per_epoch
    }

    pub fn fork_epoch(&self, milestone: SpecMilestone) -> Option<Epoch> {
        match milestone {
            SpecMilestone::Phase0 => Some(0),
            SpecMilestone::Altair => self.config.altair_fork_epoch,
            SpecMilestone::Bellatrix => self.config.bellatrix_fork_epoch,
            SpecMilestone::Capella => self.config.capella_fork_epoch,
            SpecMilestone::Deneb => self.config.deneb_fork_epoch,
        }
    }

    pub fn milestone_at_epoch(&self, epoch: Epoch) -> SpecMilestone {
        SpecMilestone::all()
            .filter(|milestone| {
                self.fork_epoch(*milestone)
                    .map_or(false, |fork_epoch| fork_epoch <= epoch)
            })
            .last()
            .unwrap_or(SpecMilestone::Phase0)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.config.slots_per_epoch == 0 {
            return Err(Error::InvalidForkSchedule(
                "slots_per_epoch must be non-zero".to_string(),
            ));
        }

        let mut unscheduled: Option<SpecMilestone> = None;
        let mut previous: Option<(SpecMilestone, Epoch)> = None;
        for milestone in SpecMilestone::all() {
            match (self.fork_epoch(milestone), unscheduled) {
                (Some(_), Some(gap)) => {
                    return Err(Error::InvalidForkSchedule(format!(
                        "{} is scheduled but the earlier fork {} is not",
                        milestone, gap
                    )))
                }
                (Some(epoch), None) => {
                    if let Some((previous_milestone, previous_epoch)) = previous {
                        if epoch < previous_epoch {
                            return Err(Error::InvalidForkSchedule(format!(
                                "{} fork epoch {} is before {} fork epoch {}",
                                milestone, epoch, previous_milestone, previous_epoch
                            )));
                        }
                    }
                    previous = Some((milestone, epoch));
                }
                (None, None) => unscheduled = Some(milestone),
                (None, Some(_)) => {}
            }
        }
        Ok(())
    }
}

impl MilestoneProvider for ForkSchedule {
    fn supported_milestones(&self) -> Vec<SpecMilestone> {
        SpecMilestone::all()
            .filter(|milestone| self.fork_epoch(*milestone).is_some())
            .collect()
    }

    fn milestone_at_slot(&self, slot: Slot) -> SpecMilestone {
        self.milestone_at_epoch(slot / self.config.slots_per_epoch)
    }
}
