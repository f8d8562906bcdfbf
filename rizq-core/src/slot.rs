use serde::{Deserialize, Serialize};

use crate::error::RizqError;

/// Time-of-day slot a dua or habit is assigned to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlot {
    Fajr,
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeSlot {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fajr => "fajr",
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
        }
    }
}

impl std::str::FromStr for TimeSlot {
    type Err = RizqError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fajr" => Ok(Self::Fajr),
            "morning" => Ok(Self::Morning),
            "afternoon" => Ok(Self::Afternoon),
            "evening" => Ok(Self::Evening),
            "night" => Ok(Self::Night),
            other => Err(RizqError::validation(format!("unknown time slot `{other}`"))),
        }
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::TimeSlot;

    #[test]
    fn parses_slot_names_case_insensitively() {
        assert_eq!("fajr".parse::<TimeSlot>().unwrap(), TimeSlot::Fajr);
        assert_eq!("  Evening ".parse::<TimeSlot>().unwrap(), TimeSlot::Evening);
        assert!("midnight".parse::<TimeSlot>().is_err());
    }

    #[test]
    fn round_trips_through_display() {
        for slot in [
            TimeSlot::Fajr,
            TimeSlot::Morning,
            TimeSlot::Afternoon,
            TimeSlot::Evening,
            TimeSlot::Night,
        ] {
            assert_eq!(slot.to_string().parse::<TimeSlot>().unwrap(), slot);
        }
    }
}
