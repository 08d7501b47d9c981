//! Account lifecycle: `active`, `suspended`, `deleted`, moved only by an
//! active administrator.

use chrono::Utc;
use model::entities::user::{self, AccountStatus};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::accounts;
use crate::error::{BettingError, Result};

/// A status change an administrator can apply to another account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Suspend,
    Unsuspend,
    SoftDelete,
}

impl LifecycleAction {
    /// The target's status after the action, or why the target is not eligible.
    pub fn apply(self, target: &user::Model) -> Result<AccountStatus> {
        match (self, target.status) {
            (LifecycleAction::Suspend | LifecycleAction::SoftDelete, _) if target.is_admin => {
                Err(BettingError::InvalidTarget(format!(
                    "'{}' is an admin account",
                    target.username
                )))
            }
            (LifecycleAction::SoftDelete, _) => Ok(AccountStatus::Deleted),
            (_, AccountStatus::Deleted) => Err(BettingError::InvalidTarget(format!(
                "'{}' has been deleted",
                target.username
            ))),
            (LifecycleAction::Suspend, _) => Ok(AccountStatus::Suspended),
            (LifecycleAction::Unsuspend, _) => Ok(AccountStatus::Active),
        }
    }
}

/// Accounts of a team grouped by status, for the admin panel.
#[derive(Debug, Clone, Default)]
pub struct StatusOverview {
    pub active: Vec<user::Model>,
    pub suspended: Vec<user::Model>,
    pub deleted: Vec<user::Model>,
}

impl StatusOverview {
    pub fn total(&self) -> usize {
        self.active.len() + self.suspended.len() + self.deleted.len()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AccountLifecycle;

impl AccountLifecycle {
    pub fn new() -> Self {
        Self
    }

    /// Loads the acting admin fresh. A demoted or suspended admin is refused.
    #[instrument(skip(self, db))]
    pub async fn verify_admin(&self, db: &DatabaseConnection, admin_id: i32) -> Result<user::Model> {
        match accounts::find_by_id(db, admin_id).await? {
            Some(admin) if admin.is_admin && admin.is_active() => {
                debug!("Admin {} verified", admin_id);
                Ok(admin)
            }
            _ => {
                warn!("Account {} is not an active admin", admin_id);
                Err(BettingError::Unauthorized)
            }
        }
    }

    pub async fn suspend(&self, db: &DatabaseConnection, target_id: i32, admin_id: i32) -> Result<user::Model> {
        self.transition(db, LifecycleAction::Suspend, target_id, admin_id).await
    }

    pub async fn unsuspend(&self, db: &DatabaseConnection, target_id: i32, admin_id: i32) -> Result<user::Model> {
        self.transition(db, LifecycleAction::Unsuspend, target_id, admin_id).await
    }

    /// Marks the account deleted. The row and its history stay.
    pub async fn soft_delete(&self, db: &DatabaseConnection, target_id: i32, admin_id: i32) -> Result<user::Model> {
        self.transition(db, LifecycleAction::SoftDelete, target_id, admin_id).await
    }

    #[instrument(skip(self, db))]
    pub async fn overview(
        &self,
        db: &DatabaseConnection,
        admin_id: i32,
        team_id: i32,
    ) -> Result<StatusOverview> {
        trace!("Entering overview");
        self.verify_admin(db, admin_id).await?;

        let mut overview = StatusOverview::default();
        let everyone = user::Entity::find()
            .filter(user::Column::TeamId.eq(team_id))
            .order_by_asc(user::Column::Id)
            .all(db)
            .await?;
        for account in everyone {
            match account.status {
                AccountStatus::Active => overview.active.push(account),
                AccountStatus::Suspended => overview.suspended.push(account),
                AccountStatus::Deleted => overview.deleted.push(account),
            }
        }

        debug!("Team {} has {} accounts", team_id, overview.total());
        Ok(overview)
    }

    #[instrument(skip(self, db))]
    async fn transition(
        &self,
        db: &DatabaseConnection,
        action: LifecycleAction,
        target_id: i32,
        admin_id: i32,
    ) -> Result<user::Model> {
        trace!("Entering transition");
        self.verify_admin(db, admin_id).await?;

        let target = accounts::find_by_id(db, target_id)
            .await?
            .ok_or_else(|| BettingError::not_found(format!("User {}", target_id)))?;
        let status = action.apply(&target).inspect_err(|e| {
            warn!("{:?} refused: {}", action, e);
        })?;

        if status == target.status {
            debug!("Account {} is already {}", target_id, status);
            return Ok(target);
        }

        let username = target.username.clone();
        let mut active: user::ActiveModel = target.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now().naive_utc());
        let updated = active.update(db).await?;

        info!("Account '{}' is now {} (by admin {})", username, status, admin_id);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TEST_TEAM, new_account, new_account_with_status, setup_db};

    #[tokio::test]
    async fn test_non_admin_cannot_suspend() {
        let db = setup_db().await.unwrap();
        let player = new_account(&db, "player", 1000, false).await.unwrap();
        let target = new_account(&db, "target", 1000, false).await.unwrap();

        let result = AccountLifecycle::new().suspend(&db, target.id, player.id).await;

        assert!(matches!(result, Err(BettingError::Unauthorized)));
        let unchanged = accounts::find_by_id(&db, target.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, AccountStatus::Active);
    }

    #[tokio::test]
    async fn test_suspended_admin_loses_privileges() {
        let db = setup_db().await.unwrap();
        let admin = new_account(&db, "admin", 1000, true).await.unwrap();
        let target = new_account(&db, "target", 1000, false).await.unwrap();
        let mut active: user::ActiveModel = admin.clone().into();
        active.status = Set(AccountStatus::Suspended);
        active.update(&db).await.unwrap();

        let result = AccountLifecycle::new().suspend(&db, target.id, admin.id).await;

        assert!(matches!(result, Err(BettingError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_admins_are_protected() {
        let db = setup_db().await.unwrap();
        let admin = new_account(&db, "admin", 1000, true).await.unwrap();
        let other_admin = new_account(&db, "other_admin", 1000, true).await.unwrap();
        let lifecycle = AccountLifecycle::new();

        assert!(matches!(
            lifecycle.suspend(&db, other_admin.id, admin.id).await,
            Err(BettingError::InvalidTarget(_))
        ));
        assert!(matches!(
            lifecycle.soft_delete(&db, other_admin.id, admin.id).await,
            Err(BettingError::InvalidTarget(_))
        ));
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let db = setup_db().await.unwrap();
        let admin = new_account(&db, "admin", 1000, true).await.unwrap();
        let target = new_account(&db, "target", 1000, false).await.unwrap();
        let lifecycle = AccountLifecycle::new();

        let suspended = lifecycle.suspend(&db, target.id, admin.id).await.unwrap();
        assert_eq!(suspended.status, AccountStatus::Suspended);
        assert!(matches!(
            accounts::lookup(&db, "target").await,
            Err(BettingError::AccountSuspended(_))
        ));

        let restored = lifecycle.unsuspend(&db, target.id, admin.id).await.unwrap();
        assert_eq!(restored.status, AccountStatus::Active);
        assert!(accounts::lookup(&db, "target").await.is_ok());

        let deleted = lifecycle.soft_delete(&db, target.id, admin.id).await.unwrap();
        assert_eq!(deleted.status, AccountStatus::Deleted);
        assert!(matches!(
            accounts::lookup(&db, "target").await,
            Err(BettingError::NotFound(_))
        ));

        // Deleted is terminal, deleting again is a no-op
        assert!(matches!(
            lifecycle.unsuspend(&db, target.id, admin.id).await,
            Err(BettingError::InvalidTarget(_))
        ));
        assert!(matches!(
            lifecycle.suspend(&db, target.id, admin.id).await,
            Err(BettingError::InvalidTarget(_))
        ));
        let again = lifecycle.soft_delete(&db, target.id, admin.id).await.unwrap();
        assert_eq!(again.status, AccountStatus::Deleted);
    }

    #[tokio::test]
    async fn test_missing_target() {
        let db = setup_db().await.unwrap();
        let admin = new_account(&db, "admin", 1000, true).await.unwrap();

        let result = AccountLifecycle::new().suspend(&db, 4242, admin.id).await;

        assert!(matches!(result, Err(BettingError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_overview_groups_by_status() {
        let db = setup_db().await.unwrap();
        let admin = new_account(&db, "admin", 1000, true).await.unwrap();
        new_account(&db, "active_one", 1000, false).await.unwrap();
        new_account_with_status(&db, "benched", AccountStatus::Suspended)
            .await
            .unwrap();
        new_account_with_status(&db, "gone", AccountStatus::Deleted)
            .await
            .unwrap();
        let lifecycle = AccountLifecycle::new();

        let overview = lifecycle.overview(&db, admin.id, TEST_TEAM).await.unwrap();

        assert_eq!(overview.total(), 4);
        assert_eq!(overview.active.len(), 2);
        assert_eq!(overview.suspended[0].username, "benched");
        assert_eq!(overview.deleted[0].username, "gone");

        let player = overview.active[1].id;
        assert!(matches!(
            lifecycle.overview(&db, player, TEST_TEAM).await,
            Err(BettingError::Unauthorized)
        ));
    }
}
