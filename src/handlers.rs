pub mod admin;
pub mod health;
pub mod network_entities;
pub mod users;
