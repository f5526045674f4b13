pub mod admin;
pub mod auth;
pub mod doctor;
pub mod open;
pub mod patient;
