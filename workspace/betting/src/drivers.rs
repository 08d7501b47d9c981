//! Driver registry: the cars bettors pick from, their standings and the
//! leaderboard projection built from them.

use chrono::Utc;
use model::entities::driver;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait, TryIntoModel,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{BettingError, Result};

/// Bonus given to a driver added without one.
pub const DEFAULT_DRIVE_BONUS: i32 = 2;

/// Leaderboard points per win.
pub const WIN_POINTS: i64 = 25;

/// Leaderboard points per loss. Showing up counts for something.
pub const LOSS_POINTS: i64 = 10;

#[derive(Debug, Clone)]
pub struct NewDriver {
    pub team_id: i32,
    pub number: i32,
    pub name: String,
    /// Defaults to [`DEFAULT_DRIVE_BONUS`].
    pub drive_bonus: Option<i32>,
    /// Defaults to active.
    pub status: Option<bool>,
}

/// Editable driver fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct DriverUpdate {
    pub name: Option<String>,
    pub number: Option<i32>,
    pub status: Option<bool>,
    pub drive_bonus: Option<i32>,
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub rank: usize,
    pub driver: driver::Model,
    pub points: i64,
    pub races_completed: i32,
    /// Percentage rounded to one decimal.
    pub win_rate: f64,
}

impl Standing {
    fn from_driver(driver: driver::Model) -> Self {
        let points = WIN_POINTS * i64::from(driver.wins) + LOSS_POINTS * i64::from(driver.losses);
        let races_completed = driver.races_completed();
        let win_rate = if races_completed > 0 {
            (f64::from(driver.wins) * 1000.0 / f64::from(races_completed)).round() / 10.0
        } else {
            0.0
        };

        Self {
            rank: 0,
            driver,
            points,
            races_completed,
            win_rate,
        }
    }
}

/// Orders drivers by wins, then points, both descending, and assigns 1-based
/// ranks. Remaining ties keep car-number order.
pub fn rank_standings(drivers: Vec<driver::Model>) -> Vec<Standing> {
    let mut standings: Vec<Standing> = drivers.into_iter().map(Standing::from_driver).collect();
    standings.sort_by(|a, b| {
        b.driver
            .wins
            .cmp(&a.driver.wins)
            .then_with(|| b.points.cmp(&a.points))
            .then_with(|| a.driver.number.cmp(&b.driver.number))
    });
    for (idx, standing) in standings.iter_mut().enumerate() {
        standing.rank = idx + 1;
    }
    standings
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DriverRegistry;

impl DriverRegistry {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip(self, db, new_driver), fields(team_id = new_driver.team_id, number = new_driver.number))]
    pub async fn create<C: ConnectionTrait>(&self, db: &C, new_driver: NewDriver) -> Result<driver::Model> {
        trace!("Entering create");
        let name = new_driver.name.trim().to_string();
        if name.is_empty() {
            return Err(BettingError::Validation("driver name is required".to_string()));
        }
        let drive_bonus = new_driver.drive_bonus.unwrap_or(DEFAULT_DRIVE_BONUS);
        if drive_bonus < 0 {
            return Err(BettingError::Validation(
                "drive bonus cannot be negative".to_string(),
            ));
        }

        if self
            .find_by_number(db, new_driver.team_id, new_driver.number)
            .await?
            .is_some()
        {
            warn!(
                "Driver #{} already exists in team {}",
                new_driver.number, new_driver.team_id
            );
            return Err(BettingError::DuplicateDriver {
                team_id: new_driver.team_id,
                number: new_driver.number,
            });
        }

        let now = Utc::now().naive_utc();
        let created = driver::ActiveModel {
            team_id: Set(new_driver.team_id),
            number: Set(new_driver.number),
            name: Set(name),
            status: Set(new_driver.status.unwrap_or(true)),
            drive_bonus: Set(drive_bonus),
            wins: Set(0),
            losses: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| duplicate_driver_or(e, new_driver.team_id, new_driver.number))?;

        info!(
            "Driver #{} '{}' created with id {}",
            created.number, created.name, created.id
        );
        Ok(created)
    }

    /// Adds several drivers to a team. Either all of them are created or none.
    #[instrument(skip(self, db, drivers), fields(count = drivers.len()))]
    pub async fn create_many(
        &self,
        db: &DatabaseConnection,
        team_id: i32,
        drivers: Vec<NewDriver>,
    ) -> Result<Vec<driver::Model>> {
        trace!("Entering create_many");
        let txn = db.begin().await?;
        let mut created = Vec::with_capacity(drivers.len());
        for new_driver in drivers {
            created.push(self.create(&txn, NewDriver { team_id, ..new_driver }).await?);
        }
        txn.commit().await?;

        info!("Created {} drivers in team {}", created.len(), team_id);
        Ok(created)
    }

    pub async fn find_by_number<C: ConnectionTrait>(
        &self,
        db: &C,
        team_id: i32,
        number: i32,
    ) -> Result<Option<driver::Model>> {
        Ok(driver::Entity::find()
            .filter(driver::Column::TeamId.eq(team_id))
            .filter(driver::Column::Number.eq(number))
            .one(db)
            .await?)
    }

    pub async fn find_by_id<C: ConnectionTrait>(&self, db: &C, id: i32) -> Result<Option<driver::Model>> {
        Ok(driver::Entity::find_by_id(id).one(db).await?)
    }

    /// Like [`find_by_id`](Self::find_by_id) but a missing driver is an error.
    pub async fn get<C: ConnectionTrait>(&self, db: &C, id: i32) -> Result<driver::Model> {
        self.find_by_id(db, id)
            .await?
            .ok_or_else(|| BettingError::not_found(format!("Driver {}", id)))
    }

    /// Drivers of a team in car-number order.
    #[instrument(skip(self, db))]
    pub async fn list(&self, db: &DatabaseConnection, team_id: i32) -> Result<Vec<driver::Model>> {
        let drivers = driver::Entity::find()
            .filter(driver::Column::TeamId.eq(team_id))
            .order_by_asc(driver::Column::Number)
            .all(db)
            .await?;
        debug!("Found {} drivers in team {}", drivers.len(), team_id);
        Ok(drivers)
    }

    #[instrument(skip(self, db, update))]
    pub async fn update(
        &self,
        db: &DatabaseConnection,
        id: i32,
        update: DriverUpdate,
    ) -> Result<driver::Model> {
        trace!("Entering update");
        let existing = self.get(db, id).await?;
        let team_id = existing.team_id;
        let target_number = update.number.unwrap_or(existing.number);
        let mut active: driver::ActiveModel = existing.clone().into();
        let mut updated_fields = Vec::new();

        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(BettingError::Validation("driver name cannot be empty".to_string()));
            }
            active.name = Set(name);
            updated_fields.push("name");
        }
        if let Some(number) = update.number {
            if number != existing.number
                && self.find_by_number(db, team_id, number).await?.is_some()
            {
                warn!("Driver #{} already exists in team {}", number, team_id);
                return Err(BettingError::DuplicateDriver { team_id, number });
            }
            active.number = Set(number);
            updated_fields.push("number");
        }
        if let Some(status) = update.status {
            active.status = Set(status);
            updated_fields.push("status");
        }
        if let Some(drive_bonus) = update.drive_bonus {
            if drive_bonus < 0 {
                return Err(BettingError::Validation(
                    "drive bonus cannot be negative".to_string(),
                ));
            }
            active.drive_bonus = Set(drive_bonus);
            updated_fields.push("drive_bonus");
        }

        if updated_fields.is_empty() {
            debug!("No fields to update for driver {}", id);
            return Ok(existing);
        }

        active.updated_at = Set(Utc::now().naive_utc());
        let updated = active
            .update(db)
            .await
            .map_err(|e| duplicate_driver_or(e, team_id, target_number))?;
        info!(
            "Driver {} updated. Updated fields: {}",
            id,
            updated_fields.join(", ")
        );
        Ok(updated)
    }

    /// Hard delete.
    #[instrument(skip(self, db))]
    pub async fn delete(&self, db: &DatabaseConnection, id: i32) -> Result<()> {
        trace!("Entering delete");
        let result = driver::Entity::delete_by_id(id).exec(db).await?;
        if result.rows_affected == 0 {
            warn!("Driver {} not found for deletion", id);
            return Err(BettingError::not_found(format!("Driver {}", id)));
        }
        info!("Driver {} deleted", id);
        Ok(())
    }

    /// Raises the driver's bonus by one.
    #[instrument(skip(self, db))]
    pub async fn apply_hot_streak(&self, db: &DatabaseConnection, id: i32) -> Result<driver::Model> {
        trace!("Entering apply_hot_streak");
        let result = driver::Entity::update_many()
            .col_expr(
                driver::Column::DriveBonus,
                Expr::col(driver::Column::DriveBonus).add(1),
            )
            .col_expr(driver::Column::UpdatedAt, Expr::value(Utc::now().naive_utc()))
            .filter(driver::Column::Id.eq(id))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            warn!("Driver {} not found", id);
            return Err(BettingError::not_found(format!("Driver {}", id)));
        }

        let updated = self.get(db, id).await?;
        info!("Driver {} is on a hot streak, bonus now {}", id, updated.drive_bonus);
        Ok(updated)
    }

    #[instrument(skip(self, db))]
    pub async fn leaderboard(&self, db: &DatabaseConnection, team_id: i32) -> Result<Vec<Standing>> {
        let standings = rank_standings(self.list(db, team_id).await?);
        debug!("Leaderboard for team {} has {} entries", team_id, standings.len());
        Ok(standings)
    }

    /// Applies a race result: the winner is switched on and gains a win, the
    /// loser is switched off and gains a loss. The two writes are independent
    /// and each increments the stored counter in place.
    #[instrument(skip(self, db))]
    pub async fn record_result<C: ConnectionTrait>(
        &self,
        db: &C,
        winner_id: i32,
        loser_id: i32,
    ) -> Result<(driver::Model, driver::Model)> {
        trace!("Entering record_result");
        let winner = bump_standing(db, winner_id, true).await?;
        let loser = bump_standing(db, loser_id, false).await?;

        debug!(
            "Driver #{} now {}W, driver #{} now {}L",
            winner.number, winner.wins, loser.number, loser.losses
        );
        Ok((winner, loser))
    }

    /// Saves a driver. New rows are inserted, existing rows updated.
    pub async fn persist<C: ConnectionTrait>(
        &self,
        db: &C,
        driver: driver::ActiveModel,
    ) -> Result<driver::Model> {
        let saved = driver.save(db).await?;
        Ok(saved.try_into_model()?)
    }
}

/// Adds one win (and switches the driver on) or one loss (and switches it off).
async fn bump_standing<C: ConnectionTrait>(db: &C, id: i32, won: bool) -> Result<driver::Model> {
    let counter = if won {
        driver::Column::Wins
    } else {
        driver::Column::Losses
    };
    let result = driver::Entity::update_many()
        .col_expr(counter, Expr::col(counter).add(1))
        .col_expr(driver::Column::Status, Expr::value(won))
        .col_expr(driver::Column::UpdatedAt, Expr::value(Utc::now().naive_utc()))
        .filter(driver::Column::Id.eq(id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        warn!("Driver {} not found while recording a result", id);
        return Err(BettingError::not_found(format!("Driver {}", id)));
    }

    driver::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| BettingError::not_found(format!("Driver {}", id)))
}

fn duplicate_driver_or(err: DbErr, team_id: i32, number: i32) -> BettingError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            BettingError::DuplicateDriver { team_id, number }
        }
        _ => BettingError::Database(err),
    }
}
