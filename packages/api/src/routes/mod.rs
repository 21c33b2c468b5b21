pub mod health;
pub mod rooms;
pub mod stats;
