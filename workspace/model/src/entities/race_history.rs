use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;

use super::user;

/// One settled (non-tie) race from the bettor's point of view.
/// Driver names are copied at race time so the entry survives driver edits and deletes.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "race_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub driver1: String,
    pub driver2: String,
    pub winner: String,
    pub bet_amount: i64,
    /// Amount credited back after the stake was taken (0 on a loss).
    pub payout: i64,
    pub user_won: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "user::Entity",
        from = "Column::UserId",
        to = "user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
