use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::db::DatabaseError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serde goes through the same strings so stored and serialised forms agree.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            pub const ALL: &'static [$name] = &[$(Self::$variant),+];
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

str_enum!(ReminderType {
    Medication => "medication",
    Appointment => "appointment",
    Todo => "todo",
});

str_enum!(RepeatRule {
    Never => "none",
    Daily => "daily",
    Weekly => "weekly",
    Monthly => "monthly",
    Weekdays => "weekdays",
});

str_enum!(ReminderStatus {
    Pending => "pending",
    Done => "done",
    Missed => "missed",
    Cancelled => "cancelled",
    Processing => "processing",
    Completed => "completed",
    Failed => "failed",
});

str_enum!(TimeOfDay {
    Morning => "morning",
    Noon => "noon",
    Evening => "evening",
    Night => "night",
});

str_enum!(FollowUpUnit {
    Minutes => "minutes",
    Hours => "hours",
    Days => "days",
    Weeks => "weeks",
});

impl FollowUpUnit {
    pub fn minutes(self) -> i64 {
        match self {
            Self::Minutes => 1,
            Self::Hours => 60,
            Self::Days => 24 * 60,
            Self::Weeks => 7 * 24 * 60,
        }
    }
}

str_enum!(DoseUnit {
    Mg => "mg",
    G => "g",
    Ml => "ml",
    Tablets => "tablets",
    Drops => "drops",
    Injections => "injections",
    Puffs => "puffs",
});

str_enum!(DoseRhythm {
    Daily => "daily",
    Weekly => "weekly",
    Monthly => "monthly",
    AsNeeded => "as_needed",
});

str_enum!(AdministrationRoute {
    Oral => "oral",
    Subcutaneous => "subcutaneous",
    Intramuscular => "intramuscular",
    Nasal => "nasal",
    Other => "other",
});

str_enum!(DosePeriod {
    Day => "day",
    Week => "week",
    Month => "month",
});

str_enum!(CourseType {
    Prophylaxis => "prophylaxis",
    Acute => "acute",
    Other => "other",
});

str_enum!(ImpairmentLevel {
    Unimpaired => "none",
    Mild => "mild",
    Moderate => "moderate",
    Severe => "severe",
});

str_enum!(DiscontinuationReason {
    Ineffective => "ineffective",
    SideEffects => "side_effects",
    PlannedEnd => "planned_end",
    Other => "other",
});

impl TimeOfDay {
    /// Default trigger time for a slot, as (hour, minute) in the reference zone.
    pub fn default_time(&self) -> (u32, u32) {
        match self {
            Self::Morning => (8, 0),
            Self::Noon => (12, 0),
            Self::Evening => (18, 0),
            Self::Night => (22, 0),
        }
    }
}

impl DoseUnit {
    /// Label used in encoded dose text.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mg => "mg",
            Self::G => "g",
            Self::Ml => "ml",
            Self::Tablets => "Tabletten",
            Self::Drops => "Tropfen",
            Self::Injections => "Spritzen",
            Self::Puffs => "Hübe",
        }
    }

    /// Units counted in whole or partial pieces rather than measured.
    pub fn is_countable(&self) -> bool {
        matches!(self, Self::Tablets | Self::Drops | Self::Injections | Self::Puffs)
    }
}

impl ReminderStatus {
    /// Statuses that can still be acted upon by the user.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }
}
