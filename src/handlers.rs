pub mod admin;
pub mod auth;
pub mod drivers;
pub mod health;
pub mod races;
pub mod users;
pub mod wallet;
