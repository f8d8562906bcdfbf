use rizq_core::TimeSlot;
use serde::{Deserialize, Serialize};

use crate::model::dua::Dua;

/// A themed, ordered collection of duas assigned to time-of-day slots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journey {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub sort_order: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JourneyDua {
    pub dua: Dua,
    pub time_slot: TimeSlot,
    pub position: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JourneyDetail {
    pub journey: Journey,
    /// Members in journey order (`position` ascending).
    pub duas: Vec<JourneyDua>,
}
