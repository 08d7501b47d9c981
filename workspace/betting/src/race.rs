//! Race resolution: validate a bet, roll for both drivers, settle the wallet
//! and record the result.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use model::entities::{driver, race_history, user};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::accounts;
use crate::drivers::DriverRegistry;
use crate::error::{BettingError, RaceRejection, Result};
use crate::rolls::RollSource;
use crate::wallet::WalletLedger;

/// Multiple of the stake credited back on a win.
pub const WIN_MULTIPLIER: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceOutcome {
    Win,
    Loss,
    Tie,
}

impl RaceOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RaceOutcome::Win => "win",
            RaceOutcome::Loss => "loss",
            RaceOutcome::Tie => "tie",
        }
    }
}

impl fmt::Display for RaceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bet on one of two drivers, identified by car number within a team.
#[derive(Debug, Clone)]
pub struct RaceRequest {
    pub username: String,
    pub team_id: i32,
    pub driver1: i32,
    pub driver2: i32,
    pub backed_driver: i32,
    pub bet_amount: i64,
}

impl RaceRequest {
    /// Checks that need neither the database nor the bettor's balance.
    pub fn validate(&self) -> std::result::Result<(), RaceRejection> {
        if self.driver1 == self.driver2 {
            return Err(RaceRejection::SameDriver(self.driver1));
        }
        if self.bet_amount <= 0 {
            return Err(RaceRejection::NonPositiveBet(self.bet_amount));
        }
        if self.backed_driver != self.driver1 && self.backed_driver != self.driver2 {
            return Err(RaceRejection::BackedDriverNotRacing(self.backed_driver));
        }
        if self.bet_amount.checked_mul(WIN_MULTIPLIER).is_none() {
            return Err(RaceRejection::BetTooLarge(self.bet_amount));
        }
        Ok(())
    }
}

/// One driver's roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roll {
    pub die: i32,
    pub bonus: i32,
}

impl Roll {
    pub fn total(&self) -> i32 {
        self.die + self.bonus
    }
}

/// Which slot crossed the line first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finish {
    First,
    Second,
    DeadHeat,
}

/// Higher total wins; equal totals are a dead heat.
pub fn decide(first: Roll, second: Roll) -> Finish {
    match first.total().cmp(&second.total()) {
        std::cmp::Ordering::Greater => Finish::First,
        std::cmp::Ordering::Less => Finish::Second,
        std::cmp::Ordering::Equal => Finish::DeadHeat,
    }
}

/// Money moved by a settled race: the stake taken and the payout returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub stake: i64,
    pub payout: i64,
}

impl Settlement {
    pub fn for_outcome(outcome: RaceOutcome, bet: i64) -> Result<Self> {
        let payout = match outcome {
            RaceOutcome::Win => bet
                .checked_mul(WIN_MULTIPLIER)
                .ok_or(RaceRejection::BetTooLarge(bet))?,
            RaceOutcome::Loss => 0,
            // The stake comes straight back
            RaceOutcome::Tie => bet,
        };
        Ok(Self { stake: bet, payout })
    }

    /// Signed change to the bettor's balance.
    pub fn net(&self) -> i64 {
        self.payout - self.stake
    }
}

#[derive(Debug, Clone)]
pub struct RaceResult {
    pub outcome: RaceOutcome,
    pub roll1: Roll,
    pub roll2: Roll,
    /// Absent on a dead heat.
    pub winner: Option<driver::Model>,
    pub loser: Option<driver::Model>,
    pub settlement: Settlement,
    /// The bettor after settlement.
    pub account: user::Model,
    /// Both racers, in request order, after their result was recorded.
    pub drivers: (driver::Model, driver::Model),
}

#[derive(Debug, Clone)]
pub struct RaceResolver {
    rolls: Arc<dyn RollSource>,
    ledger: WalletLedger,
    registry: DriverRegistry,
}

impl RaceResolver {
    pub fn new(rolls: Arc<dyn RollSource>) -> Self {
        Self {
            rolls,
            ledger: WalletLedger::new(),
            registry: DriverRegistry::new(),
        }
    }

    /// Runs a race for the bettor and settles the bet.
    ///
    /// Nothing is written unless every check passes. Wallet, statistics and
    /// history are committed together; the driver standings are written
    /// afterwards and a failure there does not undo the settlement.
    #[instrument(skip(self, db, request), fields(username = %request.username, bet = request.bet_amount))]
    pub async fn resolve(&self, db: &DatabaseConnection, request: RaceRequest) -> Result<RaceResult> {
        trace!("Entering resolve");
        request.validate().inspect_err(|rejection| {
            warn!("Race rejected: {}", rejection);
        })?;

        let account = accounts::lookup(db, &request.username).await?;
        let driver1 = self.racer(db, request.team_id, request.driver1).await?;
        let driver2 = self.racer(db, request.team_id, request.driver2).await?;

        if request.bet_amount > account.wallet {
            let rejection = RaceRejection::BetExceedsBalance {
                balance: account.wallet,
                bet: request.bet_amount,
            };
            warn!("Race rejected: {}", rejection);
            return Err(rejection.into());
        }

        let roll1 = Roll {
            die: self.rolls.roll(),
            bonus: driver1.drive_bonus,
        };
        let roll2 = Roll {
            die: self.rolls.roll(),
            bonus: driver2.drive_bonus,
        };
        debug!(
            "Rolled #{}: {} (+{}), #{}: {} (+{})",
            driver1.number, roll1.die, roll1.bonus, driver2.number, roll2.die, roll2.bonus
        );

        let placings = match decide(roll1, roll2) {
            Finish::First => Some((driver1.clone(), driver2.clone())),
            Finish::Second => Some((driver2.clone(), driver1.clone())),
            Finish::DeadHeat => None,
        };
        let outcome = match &placings {
            None => RaceOutcome::Tie,
            Some((winner, _)) if winner.number == request.backed_driver => RaceOutcome::Win,
            Some(_) => RaceOutcome::Loss,
        };
        let settlement = Settlement::for_outcome(outcome, request.bet_amount)?;

        self.settle(db, &account, &driver1, &driver2, placings.as_ref(), outcome, settlement)
            .await?;

        let (winner, loser, drivers) = match placings {
            None => (None, None, (driver1, driver2)),
            Some((winner, loser)) => {
                let (winner, loser) = match self
                    .registry
                    .record_result(db, winner.id, loser.id)
                    .await
                {
                    Ok(updated) => updated,
                    Err(e) => {
                        error!("Race settled but driver standings were not updated: {}", e);
                        (winner, loser)
                    }
                };
                let drivers = if winner.id == driver1.id {
                    (winner.clone(), loser.clone())
                } else {
                    (loser.clone(), winner.clone())
                };
                (Some(winner), Some(loser), drivers)
            }
        };

        let account = accounts::find_by_id(db, account.id)
            .await?
            .ok_or_else(|| BettingError::not_found(format!("User '{}'", request.username)))?;

        info!(
            "Race settled for '{}': {} (net {}), balance now {}",
            account.username,
            outcome,
            settlement.net(),
            account.wallet
        );

        Ok(RaceResult {
            outcome,
            roll1,
            roll2,
            winner,
            loser,
            settlement,
            account,
            drivers,
        })
    }

    async fn racer(&self, db: &DatabaseConnection, team_id: i32, number: i32) -> Result<driver::Model> {
        self.registry
            .find_by_number(db, team_id, number)
            .await?
            .ok_or_else(|| {
                warn!("Driver #{} not found in team {}", number, team_id);
                BettingError::not_found(format!("Driver #{}", number))
            })
    }

    #[allow(clippy::too_many_arguments)]
    async fn settle(
        &self,
        db: &DatabaseConnection,
        account: &user::Model,
        driver1: &driver::Model,
        driver2: &driver::Model,
        placings: Option<&(driver::Model, driver::Model)>,
        outcome: RaceOutcome,
        settlement: Settlement,
    ) -> Result<()> {
        let txn = db.begin().await?;

        self.ledger.debit(&txn, account.id, settlement.stake).await?;
        if settlement.payout > 0 {
            self.ledger.credit(&txn, account.id, settlement.payout).await?;
        }

        if let Some((winner, _)) = placings {
            let winnings = settlement.net().max(0);
            let result = user::Entity::update_many()
                .col_expr(
                    user::Column::RaceCount,
                    Expr::col(user::Column::RaceCount).add(1),
                )
                .col_expr(
                    user::Column::TotalWinnings,
                    Expr::col(user::Column::TotalWinnings).add(winnings),
                )
                .filter(user::Column::Id.eq(account.id))
                .filter(user::Column::TotalWinnings.lte(i64::MAX - winnings))
                .exec(&txn)
                .await?;
            if result.rows_affected == 0 {
                warn!("Winnings of {} would overflow the total of '{}'", winnings, account.username);
                return Err(BettingError::BalanceOverflow {
                    balance: account.total_winnings,
                    requested: winnings,
                });
            }

            race_history::ActiveModel {
                user_id: Set(account.id),
                driver1: Set(driver1.name.clone()),
                driver2: Set(driver2.name.clone()),
                winner: Set(winner.name.clone()),
                bet_amount: Set(settlement.stake),
                payout: Set(settlement.payout),
                user_won: Set(outcome == RaceOutcome::Win),
                created_at: Set(Utc::now().naive_utc()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rolls::ScriptedRolls;
    use crate::testing::{
        TEST_TEAM, init_test_tracing, new_account, new_account_with_status, new_driver, setup_db,
    };
    use model::entities::user::AccountStatus;
    use sea_orm::{ModelTrait, PaginatorTrait};

    fn request(username: &str, backed_driver: i32, bet_amount: i64) -> RaceRequest {
        RaceRequest {
            username: username.to_string(),
            team_id: TEST_TEAM,
            driver1: 1,
            driver2: 44,
            backed_driver,
            bet_amount,
        }
    }

    fn resolver(rolls: impl IntoIterator<Item = i32>) -> RaceResolver {
        RaceResolver::new(Arc::new(ScriptedRolls::new(rolls)))
    }

    async fn grid(db: &DatabaseConnection) {
        new_driver(db, 1, "Max", 2).await.unwrap();
        new_driver(db, 44, "Lewis", 2).await.unwrap();
    }

    #[test]
    fn test_decide() {
        let roll = |die, bonus| Roll { die, bonus };
        assert_eq!(decide(roll(10, 2), roll(9, 2)), Finish::First);
        assert_eq!(decide(roll(3, 5), roll(7, 2)), Finish::First);
        assert_eq!(decide(roll(1, 2), roll(20, 0)), Finish::Second);
        assert_eq!(decide(roll(12, 2), roll(10, 4)), Finish::DeadHeat);
    }

    #[test]
    fn test_settlement_nets() {
        let settle = |outcome, bet| Settlement::for_outcome(outcome, bet).unwrap();
        assert_eq!(settle(RaceOutcome::Win, 200).net(), 200);
        assert_eq!(settle(RaceOutcome::Loss, 200).net(), -200);
        assert_eq!(settle(RaceOutcome::Tie, 100).net(), 0);
        assert_eq!(settle(RaceOutcome::Win, 200).payout, 400);

        let huge = i64::MAX / 2 + 10;
        assert!(matches!(
            Settlement::for_outcome(RaceOutcome::Win, huge),
            Err(BettingError::InvalidRace(RaceRejection::BetTooLarge(b))) if b == huge
        ));
        assert_eq!(settle(RaceOutcome::Loss, huge).stake, huge);
    }

    #[test]
    fn test_request_validation() {
        let mut req = request("x", 1, 100);
        assert_eq!(req.validate(), Ok(()));

        req.driver2 = 1;
        assert_eq!(req.validate(), Err(RaceRejection::SameDriver(1)));

        let req = request("x", 1, 0);
        assert_eq!(req.validate(), Err(RaceRejection::NonPositiveBet(0)));

        let req = request("x", 7, 100);
        assert_eq!(req.validate(), Err(RaceRejection::BackedDriverNotRacing(7)));

        let req = request("x", 1, i64::MAX / 2 + 1);
        assert_eq!(req.validate(), Err(RaceRejection::BetTooLarge(i64::MAX / 2 + 1)));
    }

    #[tokio::test]
    async fn test_win_pays_double() {
        let _guard = init_test_tracing();
        let db = setup_db().await.unwrap();
        grid(&db).await;
        new_account(&db, "winner", 1000, false).await.unwrap();

        let result = resolver([15, 5])
            .resolve(&db, request("winner", 1, 200))
            .await
            .unwrap();

        assert_eq!(result.outcome, RaceOutcome::Win);
        assert_eq!(result.account.wallet, 1200);
        assert_eq!(result.account.race_count, 1);
        assert_eq!(result.account.total_winnings, 200);
        assert_eq!(result.winner.as_ref().map(|d| d.number), Some(1));

        let history = result
            .account
            .find_related(race_history::Entity)
            .all(&db)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].user_won);
        assert_eq!(history[0].winner, "Max");
        assert_eq!(history[0].payout, 400);
    }

    #[tokio::test]
    async fn test_loss_takes_stake() {
        let db = setup_db().await.unwrap();
        grid(&db).await;
        new_account(&db, "loser", 1000, false).await.unwrap();

        let result = resolver([15, 5])
            .resolve(&db, request("loser", 44, 200))
            .await
            .unwrap();

        assert_eq!(result.outcome, RaceOutcome::Loss);
        assert_eq!(result.account.wallet, 800);
        assert_eq!(result.account.race_count, 1);
        assert_eq!(result.account.total_winnings, 0);
        assert_eq!(result.settlement.net(), -200);
    }

    #[tokio::test]
    async fn test_tie_refunds_and_records_nothing() {
        let db = setup_db().await.unwrap();
        grid(&db).await;
        new_account(&db, "tied", 1000, false).await.unwrap();

        let result = resolver([10, 10])
            .resolve(&db, request("tied", 1, 100))
            .await
            .unwrap();

        assert_eq!(result.outcome, RaceOutcome::Tie);
        assert!(result.winner.is_none());
        assert_eq!(result.account.wallet, 1000);
        assert_eq!(result.account.race_count, 0);
        assert_eq!(race_history::Entity::find().count(&db).await.unwrap(), 0);

        let drivers = DriverRegistry::new().list(&db, TEST_TEAM).await.unwrap();
        assert!(drivers.iter().all(|d| d.status && d.races_completed() == 0));
    }

    #[tokio::test]
    async fn test_drivers_flip_after_race() {
        let db = setup_db().await.unwrap();
        grid(&db).await;
        new_account(&db, "watcher", 1000, false).await.unwrap();

        let result = resolver([2, 19])
            .resolve(&db, request("watcher", 1, 50))
            .await
            .unwrap();

        let (max, lewis) = &result.drivers;
        assert_eq!(max.number, 1);
        assert!(!max.status);
        assert_eq!(max.losses, 1);
        assert!(lewis.status);
        assert_eq!(lewis.wins, 1);

        let stored = DriverRegistry::new()
            .find_by_number(&db, TEST_TEAM, 1)
            .await
            .unwrap()
            .unwrap();
        assert!(!stored.status);
    }

    #[tokio::test]
    async fn test_rejected_race_writes_nothing() {
        let db = setup_db().await.unwrap();
        grid(&db).await;
        let account = new_account(&db, "careful", 100, false).await.unwrap();
        let rolls = Arc::new(ScriptedRolls::new([15, 5]));
        let resolver = RaceResolver::new(rolls.clone());

        let too_much = resolver.resolve(&db, request("careful", 1, 150)).await;
        assert!(matches!(
            too_much,
            Err(BettingError::InvalidRace(RaceRejection::BetExceedsBalance {
                balance: 100,
                bet: 150
            }))
        ));

        let mut unknown_driver = request("careful", 1, 50);
        unknown_driver.driver2 = 99;
        assert!(matches!(
            resolver.resolve(&db, unknown_driver).await,
            Err(BettingError::NotFound(_))
        ));

        assert!(matches!(
            resolver.resolve(&db, request("careful", 3, 50)).await,
            Err(BettingError::InvalidRace(RaceRejection::BackedDriverNotRacing(3)))
        ));

        let unchanged = accounts::find_by_id(&db, account.id).await.unwrap().unwrap();
        assert_eq!(unchanged.wallet, account.wallet);
        assert_eq!(unchanged.race_count, 0);
        assert_eq!(race_history::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(rolls.remaining(), 2);
    }

    #[tokio::test]
    async fn test_suspended_bettor_cannot_race() {
        let db = setup_db().await.unwrap();
        grid(&db).await;
        new_account_with_status(&db, "benched", AccountStatus::Suspended)
            .await
            .unwrap();

        let result = resolver([15, 5]).resolve(&db, request("benched", 1, 10)).await;

        assert!(matches!(result, Err(BettingError::AccountSuspended(_))));
    }

    #[tokio::test]
    async fn test_unpayable_bet_is_rejected_before_rolling() {
        let db = setup_db().await.unwrap();
        grid(&db).await;
        let bet = i64::MAX / 2 + 10;
        let account = new_account(&db, "whale", bet, false).await.unwrap();
        let rolls = Arc::new(ScriptedRolls::new([20, 1]));
        let resolver = RaceResolver::new(rolls.clone());

        let result = resolver.resolve(&db, request("whale", 1, bet)).await;

        assert!(matches!(
            result,
            Err(BettingError::InvalidRace(RaceRejection::BetTooLarge(b))) if b == bet
        ));
        let unchanged = accounts::find_by_id(&db, account.id).await.unwrap().unwrap();
        assert_eq!(unchanged.wallet, bet);
        assert_eq!(race_history::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(rolls.remaining(), 2);
    }

    #[tokio::test]
    async fn test_win_past_max_balance_rolls_back() {
        let db = setup_db().await.unwrap();
        grid(&db).await;
        let account = new_account(&db, "capped", i64::MAX - 5, false).await.unwrap();

        let result = resolver([15, 5]).resolve(&db, request("capped", 1, 10)).await;

        assert!(matches!(
            result,
            Err(BettingError::BalanceOverflow { requested: 20, .. })
        ));
        let unchanged = accounts::find_by_id(&db, account.id).await.unwrap().unwrap();
        assert_eq!(unchanged.wallet, i64::MAX - 5);
        assert_eq!(unchanged.race_count, 0);
        assert_eq!(race_history::Entity::find().count(&db).await.unwrap(), 0);

        let max = DriverRegistry::new().find_by_number(&db, TEST_TEAM, 1).await.unwrap().unwrap();
        assert_eq!(max.wins, 0);
    }

    #[tokio::test]
    async fn test_concurrent_races_count_every_result() {
        let db = setup_db().await.unwrap();
        grid(&db).await;
        new_account(&db, "first", 1000, false).await.unwrap();
        new_account(&db, "second", 1000, false).await.unwrap();
        let resolver = resolver([15, 5, 15, 5]);

        let (a, b) = tokio::join!(
            resolver.resolve(&db, request("first", 1, 100)),
            resolver.resolve(&db, request("second", 44, 100))
        );
        assert_eq!(a.unwrap().outcome, RaceOutcome::Win);
        assert_eq!(b.unwrap().outcome, RaceOutcome::Loss);

        let registry = DriverRegistry::new();
        let max = registry.find_by_number(&db, TEST_TEAM, 1).await.unwrap().unwrap();
        let lewis = registry.find_by_number(&db, TEST_TEAM, 44).await.unwrap().unwrap();
        assert_eq!((max.wins, max.losses), (2, 0));
        assert_eq!((lewis.wins, lewis.losses), (0, 2));
    }
}
