//! Transport-layer types shared between the server and API clients.
//! Response payloads of the REST handlers are built from these, so a client
//! can deserialize them without duplicating shapes.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generic API response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}

// ===================== Accounts =====================

/// Public view of an account. The credential hash is never part of it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct AccountDto {
    pub id: i32,
    pub team_id: i32,
    pub username: String,
    pub display_name: String,
    pub wallet: i64,
    pub is_admin: bool,
    /// One of `active`, `suspended`, `deleted`
    pub status: String,
    pub race_count: i32,
    pub total_winnings: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct RaceHistoryDto {
    pub id: i32,
    pub driver1: String,
    pub driver2: String,
    pub winner: String,
    pub bet_amount: i64,
    pub payout: i64,
    pub user_won: bool,
    pub created_at: NaiveDateTime,
}

/// Accounts of a team grouped by lifecycle status (admin only).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct StatusOverviewDto {
    pub active: Vec<AccountDto>,
    pub suspended: Vec<AccountDto>,
    pub deleted: Vec<AccountDto>,
    pub total: usize,
}

// ===================== Drivers =====================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct DriverDto {
    pub id: i32,
    pub team_id: i32,
    /// Car number, unique within the team
    pub number: i32,
    pub name: String,
    /// Active flag
    pub status: bool,
    pub drive_bonus: i32,
    pub wins: i32,
    pub losses: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct StandingDto {
    pub rank: usize,
    pub driver: DriverDto,
    pub points: i64,
    pub races_completed: i32,
    /// Percentage with one decimal
    pub win_rate: f64,
}

// ===================== Races =====================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct RollDto {
    /// Raw d20 result
    pub die: i32,
    /// Driver bonus added to the die
    pub bonus: i32,
    pub total: i32,
}

/// Result of a settled race.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct RaceResultDto {
    /// One of `win`, `loss`, `tie`
    pub outcome: String,
    pub roll1: RollDto,
    pub roll2: RollDto,
    /// Car number of the winner, absent on a tie
    pub winner: Option<i32>,
    pub loser: Option<i32>,
    pub bet_amount: i64,
    pub payout: i64,
    /// Signed change to the bettor's balance
    pub net: i64,
    pub account: AccountDto,
    pub drivers: Vec<DriverDto>,
}
