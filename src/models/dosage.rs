use serde::{Deserialize, Serialize};

use super::enums::{AdministrationRoute, DosePeriod, DoseRhythm, DoseUnit};

/// Upper bound of a single schedule slot.
pub const MAX_SLOT_COUNT: u8 = 9;

/// Morning / noon / evening / night intake counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoseSchedule {
    pub morning: u8,
    pub noon: u8,
    pub evening: u8,
    pub night: u8,
}

impl DoseSchedule {
    /// Builds a schedule, clamping each slot to `MAX_SLOT_COUNT`.
    pub fn new(morning: u8, noon: u8, evening: u8, night: u8) -> Self {
        Self::from_slots([morning, noon, evening, night])
    }

    pub fn from_slots(slots: [u8; 4]) -> Self {
        let [morning, noon, evening, night] = slots.map(|s| s.min(MAX_SLOT_COUNT));
        Self { morning, noon, evening, night }
    }

    pub fn slots(&self) -> [u8; 4] {
        [self.morning, self.noon, self.evening, self.night]
    }

    pub fn total(&self) -> u32 {
        self.slots().iter().map(|&s| u32::from(s)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Structured "as needed" ceiling, e.g. max. 10 per month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxPerPeriod {
    pub count: u32,
    pub period: Option<DosePeriod>,
}

/// Normalized dosing regimen of a medication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredDosage {
    /// Numeric string with a decimal point, empty when unknown.
    pub dose_value: String,
    pub dose_unit: DoseUnit,
    pub dose_rhythm: DoseRhythm,
    pub dose_schedule: DoseSchedule,
    pub administration_route: AdministrationRoute,
    pub max_per_period: Option<MaxPerPeriod>,
}

impl Default for StructuredDosage {
    fn default() -> Self {
        Self {
            dose_value: String::new(),
            dose_unit: DoseUnit::Mg,
            dose_rhythm: DoseRhythm::Daily,
            dose_schedule: DoseSchedule::default(),
            administration_route: AdministrationRoute::Oral,
            max_per_period: None,
        }
    }
}
