pub mod auth;
pub mod game_room;
pub mod game_stat;
pub mod game_type;
pub mod user;
