pub mod auth;
pub mod modules;
pub mod punches;
pub mod timecards;
