//! Dose selector state: a quarter-step stepper behind a chip that opens a
//! bottom sheet, plus per-slot schedule steppers.

use serde::{Deserialize, Serialize};

use crate::models::dosage::MAX_SLOT_COUNT;
use crate::models::enums::{DoseUnit, TimeOfDay};
use crate::models::DoseSchedule;

/// Quarters per whole unit.
const QUARTERS: u16 = 4;

/// Default upper bound in whole units.
pub const DEFAULT_MAX_UNITS: u16 = 10;

/// Amount stored in quarters so ¼ steps never accumulate float error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoseStepper {
    quarters: u16,
    max_quarters: u16,
}

impl Default for DoseStepper {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNITS)
    }
}

impl DoseStepper {
    pub fn new(max_units: u16) -> Self {
        Self {
            quarters: 0,
            max_quarters: max_units.saturating_mul(QUARTERS),
        }
    }

    /// Parses a stored dose value ("1.5", "0,25"), rounding to the nearest
    /// quarter and clamping to bounds. Unparseable input gives zero.
    pub fn from_dose_value(value: &str, max_units: u16) -> Self {
        let mut stepper = Self::new(max_units);
        if let Ok(parsed) = value.trim().replace(',', ".").parse::<f64>() {
            if parsed.is_finite() && parsed > 0.0 {
                let quarters = (parsed * f64::from(QUARTERS)).round();
                let clamped = quarters.min(f64::from(stepper.max_quarters));
                stepper.quarters = clamped as u16;
            }
        }
        stepper
    }

    pub fn quarters(&self) -> u16 {
        self.quarters
    }

    pub fn increment(&mut self) {
        self.quarters = self.quarters.saturating_add(1).min(self.max_quarters);
    }

    pub fn decrement(&mut self) {
        self.quarters = self.quarters.saturating_sub(1);
    }

    pub fn can_increment(&self) -> bool {
        self.quarters < self.max_quarters
    }

    pub fn can_decrement(&self) -> bool {
        self.quarters > 0
    }

    /// Display label: "0", "¾", "2", "1 ¼".
    pub fn label(&self) -> String {
        let whole = self.quarters / QUARTERS;
        match (whole, fraction_glyph(self.quarters % QUARTERS)) {
            (0, None) => "0".into(),
            (w, None) => w.to_string(),
            (0, Some(f)) => f.into(),
            (w, Some(f)) => format!("{w} {f}"),
        }
    }

    /// Decimal string for `StructuredDosage::dose_value`.
    pub fn dose_value(&self) -> String {
        if self.quarters % QUARTERS == 0 {
            (self.quarters / QUARTERS).to_string()
        } else {
            (f64::from(self.quarters) / f64::from(QUARTERS)).to_string()
        }
    }

    /// Chip summary, e.g. "1 ½ Tabletten".
    pub fn chip_label(&self, unit: DoseUnit) -> String {
        format!("{} {}", self.label(), unit.label())
    }
}

fn fraction_glyph(rest: u16) -> Option<&'static str> {
    match rest {
        1 => Some("¼"),
        2 => Some("½"),
        3 => Some("¾"),
        _ => None,
    }
}

/// Bottom sheet editing a copy of the committed value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoseSheet {
    committed: DoseStepper,
    draft: Option<DoseStepper>,
}

impl DoseSheet {
    pub fn new(committed: DoseStepper) -> Self {
        Self { committed, draft: None }
    }

    pub fn is_open(&self) -> bool {
        self.draft.is_some()
    }

    pub fn committed(&self) -> DoseStepper {
        self.committed
    }

    pub fn open(&mut self) {
        self.draft = Some(self.committed);
    }

    /// Stepper being edited; `None` while the sheet is closed.
    pub fn draft_mut(&mut self) -> Option<&mut DoseStepper> {
        self.draft.as_mut()
    }

    pub fn confirm(&mut self) {
        if let Some(draft) = self.draft.take() {
            self.committed = draft;
        }
    }

    pub fn dismiss(&mut self) {
        self.draft = None;
    }
}

/// Steps one schedule slot up, bounded at `MAX_SLOT_COUNT`.
pub fn increment_slot(schedule: DoseSchedule, slot: TimeOfDay) -> DoseSchedule {
    adjust_slot(schedule, slot, |v| v.saturating_add(1).min(MAX_SLOT_COUNT))
}

/// Steps one schedule slot down, bounded at zero.
pub fn decrement_slot(schedule: DoseSchedule, slot: TimeOfDay) -> DoseSchedule {
    adjust_slot(schedule, slot, |v| v.saturating_sub(1))
}

fn adjust_slot(schedule: DoseSchedule, slot: TimeOfDay, f: impl Fn(u8) -> u8) -> DoseSchedule {
    let mut slots = schedule.slots();
    let index = match slot {
        TimeOfDay::Morning => 0,
        TimeOfDay::Noon => 1,
        TimeOfDay::Evening => 2,
        TimeOfDay::Night => 3,
    };
    slots[index] = f(slots[index]);
    DoseSchedule::from_slots(slots)
}
