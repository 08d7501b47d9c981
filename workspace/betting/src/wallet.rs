//! Wallet ledger: signed balance changes with a non-negative balance invariant.
//!
//! Every mutation is a single conditional `UPDATE`, so two debits racing on
//! the same account cannot both see a sufficient balance. The functions are
//! generic over [`ConnectionTrait`] so the race resolver can run them inside
//! its settlement transaction.

use chrono::Utc;
use model::entities::user;
use sea_orm::{sea_query::Expr, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{BettingError, Result};

#[derive(Debug, Default, Clone, Copy)]
pub struct WalletLedger;

impl WalletLedger {
    pub fn new() -> Self {
        Self
    }

    /// Adds `amount` to the account's balance, refusing to go past `i64::MAX`.
    #[instrument(skip(self, db))]
    pub async fn credit<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: i32,
        amount: i64,
    ) -> Result<user::Model> {
        trace!("Entering credit");
        ensure_positive(amount)?;

        let result = user::Entity::update_many()
            .col_expr(user::Column::Wallet, Expr::col(user::Column::Wallet).add(amount))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now().naive_utc()))
            .filter(user::Column::Id.eq(account_id))
            .filter(user::Column::Wallet.lte(i64::MAX - amount))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return match user::Entity::find_by_id(account_id).one(db).await? {
                None => {
                    warn!("Account {} not found for credit", account_id);
                    Err(BettingError::not_found(format!("Account {}", account_id)))
                }
                Some(account) => {
                    warn!(
                        "Rejected credit of {} to account {}: balance {}",
                        amount, account_id, account.wallet
                    );
                    Err(BettingError::BalanceOverflow {
                        balance: account.wallet,
                        requested: amount,
                    })
                }
            };
        }

        let account = reload(db, account_id).await?;
        info!(
            "Credited {} to account {}, balance now {}",
            amount, account_id, account.wallet
        );
        Ok(account)
    }

    /// Takes `amount` from the account's balance, refusing to go below zero.
    #[instrument(skip(self, db))]
    pub async fn debit<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: i32,
        amount: i64,
    ) -> Result<user::Model> {
        trace!("Entering debit");
        ensure_positive(amount)?;

        // The balance check and the subtraction are one statement
        let result = user::Entity::update_many()
            .col_expr(user::Column::Wallet, Expr::col(user::Column::Wallet).sub(amount))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now().naive_utc()))
            .filter(user::Column::Id.eq(account_id))
            .filter(user::Column::Wallet.gte(amount))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return match user::Entity::find_by_id(account_id).one(db).await? {
                None => {
                    warn!("Account {} not found for debit", account_id);
                    Err(BettingError::not_found(format!("Account {}", account_id)))
                }
                Some(account) => {
                    warn!(
                        "Rejected debit of {} from account {}: balance {}",
                        amount, account_id, account.wallet
                    );
                    Err(BettingError::InsufficientFunds {
                        balance: account.wallet,
                        requested: amount,
                    })
                }
            };
        }

        let account = reload(db, account_id).await?;
        info!(
            "Debited {} from account {}, balance now {}",
            amount, account_id, account.wallet
        );
        Ok(account)
    }
}

fn ensure_positive(amount: i64) -> Result<()> {
    if amount <= 0 {
        debug!("Rejecting non-positive amount {}", amount);
        return Err(BettingError::InvalidAmount(amount));
    }
    Ok(())
}

async fn reload<C: ConnectionTrait>(db: &C, account_id: i32) -> Result<user::Model> {
    user::Entity::find_by_id(account_id)
        .one(db)
        .await?
        .ok_or_else(|| BettingError::not_found(format!("Account {}", account_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{init_test_tracing, new_account, setup_db};

    #[tokio::test]
    async fn test_credit_adds_to_balance() {
        let _guard = init_test_tracing();
        let db = setup_db().await.unwrap();
        let account = new_account(&db, "credit", 1000, false).await.unwrap();

        let updated = WalletLedger::new().credit(&db, account.id, 250).await.unwrap();

        assert_eq!(updated.wallet, 1250);
    }

    #[tokio::test]
    async fn test_non_positive_amounts_are_rejected() {
        let db = setup_db().await.unwrap();
        let account = new_account(&db, "zero", 1000, false).await.unwrap();
        let ledger = WalletLedger::new();

        for amount in [0, -5] {
            assert!(matches!(
                ledger.credit(&db, account.id, amount).await,
                Err(BettingError::InvalidAmount(a)) if a == amount
            ));
            assert!(matches!(
                ledger.debit(&db, account.id, amount).await,
                Err(BettingError::InvalidAmount(_))
            ));
        }

        let unchanged = reload(&db, account.id).await.unwrap();
        assert_eq!(unchanged.wallet, 1000);
    }

    #[tokio::test]
    async fn test_debit_never_drives_balance_negative() {
        let db = setup_db().await.unwrap();
        let account = new_account(&db, "sequence", 100, false).await.unwrap();
        let ledger = WalletLedger::new();

        // (is_credit, amount)
        let steps = [
            (false, 30),
            (false, 80),
            (true, 10),
            (false, 80),
            (false, 1),
            (true, 500),
            (false, 500),
        ];
        let mut expected = 100;

        for (is_credit, amount) in steps {
            let outcome = if is_credit {
                ledger.credit(&db, account.id, amount).await
            } else {
                ledger.debit(&db, account.id, amount).await
            };

            match outcome {
                Ok(updated) => {
                    expected += if is_credit { amount } else { -amount };
                    assert_eq!(updated.wallet, expected);
                    assert!(updated.wallet >= 0);
                }
                Err(BettingError::InsufficientFunds { balance, requested }) => {
                    assert!(!is_credit);
                    assert_eq!(balance, expected);
                    assert_eq!(requested, amount);
                    assert!(balance < amount);
                }
                Err(other) => panic!("unexpected error: {other}"),
            }

            assert_eq!(reload(&db, account.id).await.unwrap().wallet, expected);
        }

        assert_eq!(expected, 29);
    }

    #[tokio::test]
    async fn test_unknown_account_is_not_found() {
        let db = setup_db().await.unwrap();
        let ledger = WalletLedger::new();

        assert!(matches!(
            ledger.debit(&db, 4242, 10).await,
            Err(BettingError::NotFound(_))
        ));
        assert!(matches!(
            ledger.credit(&db, 4242, 10).await,
            Err(BettingError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_credit_cannot_overflow_balance() {
        let db = setup_db().await.unwrap();
        let account = new_account(&db, "rich", i64::MAX - 10, false).await.unwrap();
        let ledger = WalletLedger::new();

        assert!(matches!(
            ledger.credit(&db, account.id, 11).await,
            Err(BettingError::BalanceOverflow { balance, requested: 11 }) if balance == i64::MAX - 10
        ));
        assert_eq!(reload(&db, account.id).await.unwrap().wallet, i64::MAX - 10);

        let topped = ledger.credit(&db, account.id, 10).await.unwrap();
        assert_eq!(topped.wallet, i64::MAX);
        assert!(matches!(
            ledger.credit(&db, account.id, i64::MAX).await,
            Err(BettingError::BalanceOverflow { .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_debits_cannot_both_succeed() {
        let db = setup_db().await.unwrap();
        let account = new_account(&db, "racer", 100, false).await.unwrap();
        let ledger = WalletLedger::new();

        let (first, second) = tokio::join!(
            ledger.debit(&db, account.id, 60),
            ledger.debit(&db, account.id, 60)
        );

        let outcomes = [first, second];
        let successes = outcomes.iter().filter(|o| o.is_ok()).count();
        let rejections = outcomes
            .iter()
            .filter(|o| matches!(o, Err(BettingError::InsufficientFunds { .. })))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(rejections, 1);
        assert_eq!(reload(&db, account.id).await.unwrap().wallet, 40);
    }
}
