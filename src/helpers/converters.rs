use betting::{RaceResult, Roll, Standing, StatusOverview};
use common::{
    AccountDto, DriverDto, RaceHistoryDto, RaceResultDto, RollDto, StandingDto, StatusOverviewDto,
};
use model::entities::{driver, race_history, user};

/// Public account view; drops the password hash.
pub fn account_to_dto(model: user::Model) -> AccountDto {
    AccountDto {
        id: model.id,
        team_id: model.team_id,
        username: model.username,
        display_name: model.display_name,
        wallet: model.wallet,
        is_admin: model.is_admin,
        status: model.status.to_string(),
        race_count: model.race_count,
        total_winnings: model.total_winnings,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

pub fn history_to_dto(model: race_history::Model) -> RaceHistoryDto {
    RaceHistoryDto {
        id: model.id,
        driver1: model.driver1,
        driver2: model.driver2,
        winner: model.winner,
        bet_amount: model.bet_amount,
        payout: model.payout,
        user_won: model.user_won,
        created_at: model.created_at,
    }
}

pub fn driver_to_dto(model: driver::Model) -> DriverDto {
    DriverDto {
        id: model.id,
        team_id: model.team_id,
        number: model.number,
        name: model.name,
        status: model.status,
        drive_bonus: model.drive_bonus,
        wins: model.wins,
        losses: model.losses,
    }
}

pub fn standing_to_dto(standing: Standing) -> StandingDto {
    StandingDto {
        rank: standing.rank,
        driver: driver_to_dto(standing.driver),
        points: standing.points,
        races_completed: standing.races_completed,
        win_rate: standing.win_rate,
    }
}

pub fn overview_to_dto(overview: StatusOverview) -> StatusOverviewDto {
    let total = overview.total();
    StatusOverviewDto {
        active: overview.active.into_iter().map(account_to_dto).collect(),
        suspended: overview.suspended.into_iter().map(account_to_dto).collect(),
        deleted: overview.deleted.into_iter().map(account_to_dto).collect(),
        total,
    }
}

fn roll_to_dto(roll: Roll) -> RollDto {
    RollDto {
        die: roll.die,
        bonus: roll.bonus,
        total: roll.total(),
    }
}

pub fn race_result_to_dto(result: RaceResult) -> RaceResultDto {
    let (first, second) = result.drivers;
    RaceResultDto {
        outcome: result.outcome.to_string(),
        roll1: roll_to_dto(result.roll1),
        roll2: roll_to_dto(result.roll2),
        winner: result.winner.map(|d| d.number),
        loser: result.loser.map(|d| d.number),
        bet_amount: result.settlement.stake,
        payout: result.settlement.payout,
        net: result.settlement.net(),
        account: account_to_dto(result.account),
        drivers: vec![driver_to_dto(first), driver_to_dto(second)],
    }
}
