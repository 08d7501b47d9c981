//! Fixtures shared by the unit tests of this crate.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use model::entities::{driver, user};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, DbErr, Set};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub type Result<T> = std::result::Result<T, DbErr>;

pub const TEST_TEAM: i32 = 2;

/// Cheapest cost bcrypt accepts, keeps hashing out of the test runtime.
pub const TEST_BCRYPT_COST: u32 = 4;

/// Routes test logs to stderr; level from RUST_LOG, WARN by default.
pub fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| level.parse::<Level>().ok())
        .unwrap_or(Level::WARN);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_default(subscriber)
}

pub async fn setup_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

pub async fn new_account(
    db: &DatabaseConnection,
    username: &str,
    wallet: i64,
    is_admin: bool,
) -> Result<user::Model> {
    let now = Utc::now().naive_utc();
    user::ActiveModel {
        team_id: Set(TEST_TEAM),
        username: Set(username.to_string()),
        display_name: Set(username.to_string()),
        password_hash: Set("unused".to_string()),
        wallet: Set(wallet),
        is_admin: Set(is_admin),
        status: Set(user::AccountStatus::Active),
        race_count: Set(0),
        total_winnings: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_account_with_status(
    db: &DatabaseConnection,
    username: &str,
    status: user::AccountStatus,
) -> Result<user::Model> {
    let account = new_account(db, username, 1000, false).await?;
    let mut active: user::ActiveModel = account.into();
    active.status = Set(status);
    active.update(db).await
}

pub async fn new_driver(
    db: &DatabaseConnection,
    number: i32,
    name: &str,
    drive_bonus: i32,
) -> Result<driver::Model> {
    let now = Utc::now().naive_utc();
    driver::ActiveModel {
        team_id: Set(TEST_TEAM),
        number: Set(number),
        name: Set(name.to_string()),
        status: Set(true),
        drive_bonus: Set(drive_bonus),
        wins: Set(0),
        losses: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// A username that no other test in the process has used.
pub fn unique_username(prefix: &str) -> String {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    format!("{}_{}", prefix, NEXT.fetch_add(1, Ordering::SeqCst))
}
