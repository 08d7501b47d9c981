//! Root for all SeaORM entity modules of the betting backend.
//! Accounts own their race history; drivers stand alone and are only
//! linked to an account through a race at resolution time.

pub mod driver;
pub mod race_history;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::driver::Entity as Driver;
    pub use super::race_history::Entity as RaceHistory;
    pub use super::user::Entity as User;
}
