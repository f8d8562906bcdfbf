pub mod achievements;
pub mod activity;
pub mod duas;
pub mod journeys;
pub mod profiles;
