use crate::entity_iden::EntityIden;
use model::entities::{driver, prelude::*, race_history};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Win/loss counters are owned by the server rather than derived client-side
        manager
            .alter_table(
                Table::alter()
                    .table(Driver::table())
                    .add_column(
                        ColumnDef::new(Driver::column(driver::Column::Wins))
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Driver::table())
                    .add_column(
                        ColumnDef::new(Driver::column(driver::Column::Losses))
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_race_history_user")
                    .table(RaceHistory::table())
                    .col(RaceHistory::column(race_history::Column::UserId))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_race_history_user")
                    .table(RaceHistory::table())
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Driver::table())
                    .drop_column(Driver::column(driver::Column::Losses))
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Driver::table())
                    .drop_column(Driver::column(driver::Column::Wins))
                    .to_owned(),
            )
            .await
    }
}
