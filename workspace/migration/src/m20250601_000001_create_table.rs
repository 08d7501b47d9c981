use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(integer(Users::TeamId).default(2))
                    .col(string(Users::Username).unique_key())
                    .col(string(Users::DisplayName))
                    .col(string(Users::PasswordHash))
                    .col(big_integer(Users::Wallet).default(1000))
                    .col(boolean(Users::IsAdmin).default(false))
                    .col(string_len(Users::Status, 20).default("active"))
                    .col(integer(Users::RaceCount).default(0))
                    .col(big_integer(Users::TotalWinnings).default(0))
                    .col(date_time(Users::CreatedAt).default(Expr::current_timestamp()))
                    .col(date_time(Users::UpdatedAt).default(Expr::current_timestamp()))
                    .to_owned(),
            )
            .await?;

        // Create drivers table
        manager
            .create_table(
                Table::create()
                    .table(Drivers::Table)
                    .if_not_exists()
                    .col(pk_auto(Drivers::Id))
                    .col(integer(Drivers::TeamId).default(2))
                    .col(integer(Drivers::Number))
                    .col(string(Drivers::Name))
                    .col(boolean(Drivers::Status).default(true))
                    .col(integer(Drivers::DriveBonus).default(2))
                    .col(date_time(Drivers::CreatedAt).default(Expr::current_timestamp()))
                    .col(date_time(Drivers::UpdatedAt).default(Expr::current_timestamp()))
                    .to_owned(),
            )
            .await?;

        // Car numbers are unique within a team
        manager
            .create_index(
                Index::create()
                    .name("idx_drivers_team_number")
                    .table(Drivers::Table)
                    .col(Drivers::TeamId)
                    .col(Drivers::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create race_history table
        manager
            .create_table(
                Table::create()
                    .table(RaceHistory::Table)
                    .if_not_exists()
                    .col(pk_auto(RaceHistory::Id))
                    .col(integer(RaceHistory::UserId))
                    .col(string(RaceHistory::Driver1))
                    .col(string(RaceHistory::Driver2))
                    .col(string(RaceHistory::Winner))
                    .col(big_integer(RaceHistory::BetAmount))
                    .col(big_integer(RaceHistory::Payout).default(0))
                    .col(boolean(RaceHistory::UserWon))
                    .col(date_time(RaceHistory::CreatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_race_history_user")
                            .from(RaceHistory::Table, RaceHistory::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RaceHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Drivers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    TeamId,
    Username,
    DisplayName,
    PasswordHash,
    Wallet,
    IsAdmin,
    Status,
    RaceCount,
    TotalWinnings,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Drivers {
    Table,
    Id,
    TeamId,
    Number,
    Name,
    Status,
    DriveBonus,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum RaceHistory {
    Table,
    Id,
    UserId,
    Driver1,
    Driver2,
    Winner,
    BetAmount,
    Payout,
    UserWon,
    CreatedAt,
}
