pub mod config;
pub mod games;
pub mod models;
pub mod random;
pub mod repositories;
pub mod services;
pub mod sync;
