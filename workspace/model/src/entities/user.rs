use std::fmt;

use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;

use super::race_history;

/// Lifecycle status of an account.
///
/// `Deleted` is terminal: the row is kept but the account is invisible to
/// normal lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum AccountStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "suspended")]
    Suspended,
    #[sea_orm(string_value = "deleted")]
    Deleted,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Suspended => "suspended",
            AccountStatus::Deleted => "deleted",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered player: credential, wallet, lifecycle status and race statistics.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Partition the account belongs to.
    pub team_id: i32,
    #[sea_orm(unique)]
    pub username: String,
    pub display_name: String,
    /// bcrypt hash of the password. Never serialized to clients.
    pub password_hash: String,
    /// Wallet balance in whole currency units. Debits never take it below zero.
    pub wallet: i64,
    #[sea_orm(default_value = "false")]
    pub is_admin: bool,
    pub status: AccountStatus,
    pub race_count: i32,
    pub total_winnings: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Model {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Race history entries, append-only.
    #[sea_orm(has_many = "super::race_history::Entity")]
    RaceHistory,
}

impl Related<race_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RaceHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
