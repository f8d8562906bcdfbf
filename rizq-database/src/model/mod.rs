pub mod achievement;
pub mod activity;
pub mod dua;
pub mod journey;
pub mod profile;
