//! Account store: signup, credential checks, profile edits and the lookup
//! rules that hide soft-deleted accounts from outside callers.

use chrono::Utc;
use model::entities::{
    race_history,
    user::{self, AccountStatus},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, Set, SqlErr, TryIntoModel,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{BettingError, Result};

/// Balance given to a fresh account when the signup does not name one.
pub const DEFAULT_STARTING_BALANCE: i64 = 1000;

/// Partition used when a caller does not name a team.
pub const DEFAULT_TEAM_ID: i32 = 2;

/// Input for [`AccountStore::signup`].
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub team_id: i32,
    pub username: String,
    pub password: String,
    /// Defaults to the username.
    pub display_name: Option<String>,
    /// Defaults to the store's starting balance.
    pub wallet: Option<i64>,
}

/// The only account fields a player may edit about themselves.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub password: Option<String>,
}

/// Bootstrap administrator, created or promoted by [`AccountStore::ensure_admin`].
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub team_id: i32,
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub wallet: i64,
}

/// Returns the account with this username in any lifecycle state.
pub async fn find_by_username<C: ConnectionTrait>(
    db: &C,
    username: &str,
) -> Result<Option<user::Model>> {
    Ok(user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?)
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<user::Model>> {
    Ok(user::Entity::find_by_id(id).one(db).await?)
}

/// Applies outside-caller visibility: suspended accounts fail distinctly,
/// deleted accounts look exactly like missing ones.
pub fn ensure_visible(account: user::Model) -> Result<user::Model> {
    match account.status {
        AccountStatus::Active => Ok(account),
        AccountStatus::Suspended => Err(BettingError::AccountSuspended(account.username)),
        AccountStatus::Deleted => Err(BettingError::not_found(format!(
            "User '{}'",
            account.username
        ))),
    }
}

/// Normal lookup by username, subject to [`ensure_visible`].
#[instrument(skip(db))]
pub async fn lookup<C: ConnectionTrait>(db: &C, username: &str) -> Result<user::Model> {
    trace!("Entering lookup");
    match find_by_username(db, username).await? {
        Some(account) => ensure_visible(account).inspect_err(|e| {
            warn!("Lookup of '{}' refused: {}", username, e);
        }),
        None => {
            debug!("User '{}' does not exist", username);
            Err(BettingError::not_found(format!("User '{}'", username)))
        }
    }
}

/// Saves an account. New rows are inserted, existing rows updated.
pub async fn persist<C: ConnectionTrait>(db: &C, account: user::ActiveModel) -> Result<user::Model> {
    let saved = account.save(db).await?;
    Ok(saved.try_into_model()?)
}

/// Active accounts of a team, the listing visible to everyone.
#[instrument(skip(db))]
pub async fn list_active(db: &DatabaseConnection, team_id: i32) -> Result<Vec<user::Model>> {
    let accounts = user::Entity::find()
        .filter(user::Column::TeamId.eq(team_id))
        .filter(user::Column::Status.eq(AccountStatus::Active))
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?;
    debug!("Found {} active accounts in team {}", accounts.len(), team_id);
    Ok(accounts)
}

/// Race history of a visible account, oldest first.
#[instrument(skip(db))]
pub async fn race_history(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Vec<race_history::Model>> {
    let account = lookup(db, username).await?;
    let entries = account
        .find_related(race_history::Entity)
        .order_by_asc(race_history::Column::Id)
        .all(db)
        .await?;
    debug!("Account '{}' has {} race entries", username, entries.len());
    Ok(entries)
}

/// Account operations that need hashing configuration.
#[derive(Debug, Clone)]
pub struct AccountStore {
    bcrypt_cost: u32,
    starting_balance: i64,
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST, DEFAULT_STARTING_BALANCE)
    }
}

impl AccountStore {
    pub fn new(bcrypt_cost: u32, starting_balance: i64) -> Self {
        Self {
            bcrypt_cost,
            starting_balance,
        }
    }

    /// Registers a new active account.
    #[instrument(skip(self, db, new_account), fields(username = %new_account.username, team_id = new_account.team_id))]
    pub async fn signup(&self, db: &DatabaseConnection, new_account: NewAccount) -> Result<user::Model> {
        trace!("Entering signup");
        let username = new_account.username.trim().to_string();
        if username.is_empty() {
            return Err(BettingError::Validation("username is required".to_string()));
        }
        if new_account.password.is_empty() {
            return Err(BettingError::Validation("password is required".to_string()));
        }
        let wallet = new_account.wallet.unwrap_or(self.starting_balance);
        if wallet < 0 {
            return Err(BettingError::Validation(
                "starting wallet cannot be negative".to_string(),
            ));
        }

        if find_by_username(db, &username).await?.is_some() {
            warn!("Username '{}' already exists", username);
            return Err(BettingError::DuplicateUsername(username));
        }

        let password_hash = bcrypt::hash(&new_account.password, self.bcrypt_cost)?;
        let now = Utc::now().naive_utc();
        let display_name = new_account
            .display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| username.clone());

        let account = user::ActiveModel {
            team_id: Set(new_account.team_id),
            username: Set(username.clone()),
            display_name: Set(display_name),
            password_hash: Set(password_hash),
            wallet: Set(wallet),
            is_admin: Set(false),
            status: Set(AccountStatus::Active),
            race_count: Set(0),
            total_winnings: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        // Two signups can pass the lookup above at the same time
        let account = account
            .insert(db)
            .await
            .map_err(|e| duplicate_username_or(e, &username))?;

        info!("Account '{}' created with id {}", account.username, account.id);
        Ok(account)
    }

    /// Checks a username/password pair. Lifecycle visibility applies first.
    #[instrument(skip(self, db, password))]
    pub async fn authenticate(
        &self,
        db: &DatabaseConnection,
        username: &str,
        password: &str,
    ) -> Result<user::Model> {
        trace!("Entering authenticate");
        let account = lookup(db, username).await?;

        if !bcrypt::verify(password, &account.password_hash)? {
            warn!("Wrong password for '{}'", username);
            return Err(BettingError::InvalidCredentials);
        }

        info!("User '{}' authenticated", username);
        Ok(account)
    }

    /// Changes display name and/or password. Admin flag, wallet and status are
    /// deliberately unreachable from here.
    #[instrument(skip(self, db, update))]
    pub async fn update_profile(
        &self,
        db: &DatabaseConnection,
        username: &str,
        update: ProfileUpdate,
    ) -> Result<user::Model> {
        trace!("Entering update_profile");
        let account = lookup(db, username).await?;
        let mut active: user::ActiveModel = account.into();
        let mut updated_fields = Vec::new();

        if let Some(display_name) = update.display_name {
            let display_name = display_name.trim().to_string();
            if display_name.is_empty() {
                return Err(BettingError::Validation(
                    "display name cannot be empty".to_string(),
                ));
            }
            active.display_name = Set(display_name);
            updated_fields.push("display_name");
        }

        if let Some(password) = update.password {
            if password.is_empty() {
                return Err(BettingError::Validation("password cannot be empty".to_string()));
            }
            active.password_hash = Set(bcrypt::hash(&password, self.bcrypt_cost)?);
            updated_fields.push("password");
        }

        if updated_fields.is_empty() {
            debug!("No fields to update for '{}'", username);
            return Ok(active.try_into_model()?);
        }

        active.updated_at = Set(Utc::now().naive_utc());
        let account = active.update(db).await?;
        info!(
            "Profile of '{}' updated. Updated fields: {}",
            username,
            updated_fields.join(", ")
        );
        Ok(account)
    }

    /// Creates the bootstrap admin, or promotes and reactivates an existing
    /// account with that username.
    #[instrument(skip(self, db, seed), fields(username = %seed.username))]
    pub async fn ensure_admin(&self, db: &DatabaseConnection, seed: AdminSeed) -> Result<user::Model> {
        trace!("Entering ensure_admin");
        if let Some(existing) = find_by_username(db, &seed.username).await? {
            if existing.is_admin && existing.is_active() {
                info!("Admin '{}' already exists", existing.username);
                return Ok(existing);
            }

            let mut active: user::ActiveModel = existing.into();
            active.is_admin = Set(true);
            active.status = Set(AccountStatus::Active);
            active.updated_at = Set(Utc::now().naive_utc());
            let promoted = active.update(db).await?;
            info!("Granted admin privileges to '{}'", promoted.username);
            return Ok(promoted);
        }

        let now = Utc::now().naive_utc();
        let admin = user::ActiveModel {
            team_id: Set(seed.team_id),
            username: Set(seed.username.clone()),
            display_name: Set(seed.display_name),
            password_hash: Set(bcrypt::hash(&seed.password, self.bcrypt_cost)?),
            wallet: Set(seed.wallet),
            is_admin: Set(true),
            status: Set(AccountStatus::Active),
            race_count: Set(0),
            total_winnings: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| duplicate_username_or(e, &seed.username))?;

        info!("Admin '{}' created with id {}", admin.username, admin.id);
        Ok(admin)
    }
}

fn duplicate_username_or(err: DbErr, username: &str) -> BettingError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            warn!("Username '{}' already exists", username);
            BettingError::DuplicateUsername(username.to_string())
        }
        _ => BettingError::Database(err),
    }
}
