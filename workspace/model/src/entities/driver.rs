use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;

/// A race participant. The car number is unique within a team.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "drivers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub team_id: i32,
    pub number: i32,
    pub name: String,
    /// Active flag; flipped on by a win and off by a loss.
    #[sea_orm(default_value = "true")]
    pub status: bool,
    /// Added to the driver's d20 roll.
    pub drive_bonus: i32,
    pub wins: i32,
    pub losses: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Model {
    pub fn races_completed(&self) -> i32 {
        self.wins + self.losses
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
