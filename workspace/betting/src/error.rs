use std::fmt;

use thiserror::Error;

/// Why a race request was refused before anything was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaceRejection {
    /// Both slots name the same car.
    SameDriver(i32),
    /// The bet is zero or negative.
    NonPositiveBet(i64),
    /// The backed car is not one of the two racers.
    BackedDriverNotRacing(i32),
    /// The bet is larger than the bettor's balance at validation time.
    BetExceedsBalance { balance: i64, bet: i64 },
    /// A winning payout for this bet would not fit in a balance.
    BetTooLarge(i64),
}

impl fmt::Display for RaceRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaceRejection::SameDriver(number) => {
                write!(f, "driver #{} cannot race against itself", number)
            }
            RaceRejection::NonPositiveBet(bet) => {
                write!(f, "bet amount must be greater than 0, got {}", bet)
            }
            RaceRejection::BackedDriverNotRacing(number) => {
                write!(f, "backed driver #{} is not in this race", number)
            }
            RaceRejection::BetExceedsBalance { balance, bet } => {
                write!(f, "bet of {} exceeds wallet balance of {}", bet, balance)
            }
            RaceRejection::BetTooLarge(bet) => {
                write!(f, "bet of {} is too large to pay out", bet)
            }
        }
    }
}

/// Error types for the betting core.
///
/// Everything except `Database` and `PasswordHash` is an expected,
/// recoverable condition the caller should render to the user.
#[derive(Error, Debug)]
pub enum BettingError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A debit larger than the current balance
    #[error("Insufficient funds: balance is {balance}, requested {requested}")]
    InsufficientFunds { balance: i64, requested: i64 },

    /// Malformed bet input
    #[error("Invalid race: {0}")]
    InvalidRace(RaceRejection),

    /// A credit that would push the balance past the largest storable value
    #[error("Balance overflow: balance is {balance}, cannot add {requested}")]
    BalanceOverflow { balance: i64, requested: i64 },

    /// Wallet amounts must be strictly positive
    #[error("Amount must be greater than 0, got {0}")]
    InvalidAmount(i64),

    /// Malformed account or driver input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Lifecycle operation by a non-admin or an inactive admin
    #[error("Unauthorized: admin privileges required")]
    Unauthorized,

    /// Lifecycle operation against a protected or terminal account
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Account '{0}' is suspended")]
    AccountSuspended(String),

    /// Missing, or soft-deleted when looked up by outside callers
    #[error("{0} not found")]
    NotFound(String),

    #[error("Username '{0}' already exists")]
    DuplicateUsername(String),

    #[error("Driver #{number} already exists in team {team_id}")]
    DuplicateDriver { team_id: i32, number: i32 },

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
}

impl BettingError {
    /// Stable machine-readable category, safe for clients to branch on.
    pub fn code(&self) -> &'static str {
        match self {
            BettingError::Database(_) => "DATABASE_ERROR",
            BettingError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            BettingError::InvalidRace(_) => "INVALID_RACE",
            BettingError::BalanceOverflow { .. } => "BALANCE_OVERFLOW",
            BettingError::InvalidAmount(_) => "INVALID_AMOUNT",
            BettingError::Validation(_) => "VALIDATION_ERROR",
            BettingError::Unauthorized => "UNAUTHORIZED",
            BettingError::InvalidTarget(_) => "INVALID_TARGET",
            BettingError::AccountSuspended(_) => "ACCOUNT_SUSPENDED",
            BettingError::NotFound(_) => "NOT_FOUND",
            BettingError::DuplicateUsername(_) => "DUPLICATE_USERNAME",
            BettingError::DuplicateDriver { .. } => "DUPLICATE_DRIVER",
            BettingError::InvalidCredentials => "INVALID_CREDENTIALS",
            BettingError::PasswordHash(_) => "INTERNAL_ERROR",
        }
    }

    /// True for expected business outcomes, false for infrastructure failures.
    pub fn is_domain(&self) -> bool {
        !matches!(
            self,
            BettingError::Database(_) | BettingError::PasswordHash(_)
        )
    }

    pub(crate) fn not_found(what: impl fmt::Display) -> Self {
        BettingError::NotFound(what.to_string())
    }
}

impl From<RaceRejection> for BettingError {
    fn from(rejection: RaceRejection) -> Self {
        BettingError::InvalidRace(rejection)
    }
}

/// Type alias for Result with BettingError
pub type Result<T> = std::result::Result<T, BettingError>;
