//! Database migrations for the league relational store

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_league_structure::Migration),
            Box::new(m20250301_000002_create_games::Migration),
            Box::new(m20250301_000003_create_registrations::Migration),
            Box::new(m20250301_000004_create_change_triggers::Migration),
        ]
    }
}

fn timestamp_now(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

mod m20250301_000001_create_league_structure {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000001_create_league_structure"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Seasons::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Seasons::Id).string().not_null().primary_key())
                        .col(ColumnDef::new(Seasons::Name).string().not_null())
                        .col(ColumnDef::new(Seasons::Year).integer().not_null())
                        .col(ColumnDef::new(Seasons::Status).string().not_null())
                        .col(
                            ColumnDef::new(Seasons::IsActive)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Seasons::StartDate).date())
                        .col(ColumnDef::new(Seasons::EndDate).date())
                        .col(&mut timestamp_now(Seasons::CreatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Conferences::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Conferences::Id).string().not_null().primary_key())
                        .col(ColumnDef::new(Conferences::Name).string().not_null())
                        .col(ColumnDef::new(Conferences::SeasonId).string().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_conferences_season")
                                .from(Conferences::Table, Conferences::SeasonId)
                                .to(Seasons::Table, Seasons::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Divisions::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Divisions::Id).string().not_null().primary_key())
                        .col(ColumnDef::new(Divisions::Name).string().not_null())
                        .col(ColumnDef::new(Divisions::AgeGroup).string().not_null())
                        .col(ColumnDef::new(Divisions::ConferenceId).string())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SeasonDivisions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SeasonDivisions::Id)
                                .string()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(SeasonDivisions::SeasonId).string().not_null())
                        .col(ColumnDef::new(SeasonDivisions::DivisionId).string().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_season_divisions_season")
                                .from(SeasonDivisions::Table, SeasonDivisions::SeasonId)
                                .to(Seasons::Table, Seasons::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_season_divisions_division")
                                .from(SeasonDivisions::Table, SeasonDivisions::DivisionId)
                                .to(Divisions::Table, Divisions::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_season_divisions_pair")
                        .table(SeasonDivisions::Table)
                        .col(SeasonDivisions::SeasonId)
                        .col(SeasonDivisions::DivisionId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Sessions::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Sessions::Id).string().not_null().primary_key())
                        .col(ColumnDef::new(Sessions::SeasonId).string().not_null())
                        .col(ColumnDef::new(Sessions::Name).string().not_null())
                        .col(ColumnDef::new(Sessions::Sequence).integer().not_null())
                        .col(ColumnDef::new(Sessions::StartDate).date())
                        .col(ColumnDef::new(Sessions::EndDate).date())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sessions_season")
                                .from(Sessions::Table, Sessions::SeasonId)
                                .to(Seasons::Table, Seasons::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Venues::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Venues::Id).string().not_null().primary_key())
                        .col(ColumnDef::new(Venues::Name).string().not_null())
                        .col(ColumnDef::new(Venues::Address).string())
                        .col(ColumnDef::new(Venues::City).string())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Teams::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Teams::Id).string().not_null().primary_key())
                        .col(ColumnDef::new(Teams::Name).string().not_null())
                        .col(ColumnDef::new(Teams::ShortName).string())
                        .col(ColumnDef::new(Teams::LogoUrl).string())
                        .col(ColumnDef::new(Teams::Location).string())
                        .col(ColumnDef::new(Teams::PrimaryColor).string())
                        .col(ColumnDef::new(Teams::SecondaryColor).string())
                        .col(ColumnDef::new(Teams::Status).string().not_null())
                        .col(&mut timestamp_now(Teams::CreatedAt))
                        .col(&mut timestamp_now(Teams::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Rosters::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Rosters::Id).string().not_null().primary_key())
                        .col(ColumnDef::new(Rosters::TeamId).string().not_null())
                        .col(ColumnDef::new(Rosters::SeasonDivisionId).string().not_null())
                        .col(&mut timestamp_now(Rosters::CreatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_rosters_season_division")
                                .from(Rosters::Table, Rosters::SeasonDivisionId)
                                .to(SeasonDivisions::Table, SeasonDivisions::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_rosters_team_id")
                        .table(Rosters::Table)
                        .col(Rosters::TeamId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_rosters_team_season_division")
                        .table(Rosters::Table)
                        .col(Rosters::TeamId)
                        .col(Rosters::SeasonDivisionId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(RosterSessionEnrollments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RosterSessionEnrollments::Id)
                                .string()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(RosterSessionEnrollments::RosterId)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RosterSessionEnrollments::SessionId)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RosterSessionEnrollments::AutoEnrolled)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(&mut timestamp_now(RosterSessionEnrollments::EnrolledAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_enrollments_roster")
                                .from(
                                    RosterSessionEnrollments::Table,
                                    RosterSessionEnrollments::RosterId,
                                )
                                .to(Rosters::Table, Rosters::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_enrollments_session")
                                .from(
                                    RosterSessionEnrollments::Table,
                                    RosterSessionEnrollments::SessionId,
                                )
                                .to(Sessions::Table, Sessions::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_enrollments_roster_session")
                        .table(RosterSessionEnrollments::Table)
                        .col(RosterSessionEnrollments::RosterId)
                        .col(RosterSessionEnrollments::SessionId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RosterSessionEnrollments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Rosters::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Teams::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Venues::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Sessions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(SeasonDivisions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Divisions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Conferences::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Seasons::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Seasons {
        Table,
        Id,
        Name,
        Year,
        Status,
        IsActive,
        StartDate,
        EndDate,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Conferences {
        Table,
        Id,
        Name,
        SeasonId,
    }

    #[derive(DeriveIden)]
    enum Divisions {
        Table,
        Id,
        Name,
        AgeGroup,
        ConferenceId,
    }

    #[derive(DeriveIden)]
    enum SeasonDivisions {
        Table,
        Id,
        SeasonId,
        DivisionId,
    }

    #[derive(DeriveIden)]
    enum Sessions {
        Table,
        Id,
        SeasonId,
        Name,
        Sequence,
        StartDate,
        EndDate,
    }

    #[derive(DeriveIden)]
    enum Venues {
        Table,
        Id,
        Name,
        Address,
        City,
    }

    #[derive(DeriveIden)]
    enum Teams {
        Table,
        Id,
        Name,
        ShortName,
        LogoUrl,
        Location,
        PrimaryColor,
        SecondaryColor,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Rosters {
        Table,
        Id,
        TeamId,
        SeasonDivisionId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum RosterSessionEnrollments {
        Table,
        Id,
        RosterId,
        SessionId,
        AutoEnrolled,
        EnrolledAt,
    }
}

mod m20250301_000002_create_games {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000002_create_games"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Games::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Games::Id).string().not_null().primary_key())
                        .col(ColumnDef::new(Games::GameDate).date().not_null())
                        .col(ColumnDef::new(Games::GameTime).time())
                        .col(ColumnDef::new(Games::VenueId).string())
                        .col(ColumnDef::new(Games::HomeRosterId).string().not_null())
                        .col(ColumnDef::new(Games::AwayRosterId).string().not_null())
                        .col(ColumnDef::new(Games::SessionId).string())
                        .col(ColumnDef::new(Games::Status).string().not_null())
                        .col(ColumnDef::new(Games::HomeScore).integer())
                        .col(ColumnDef::new(Games::AwayScore).integer())
                        .col(&mut timestamp_now(Games::CreatedAt))
                        .col(&mut timestamp_now(Games::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_games_game_date")
                        .table(Games::Table)
                        .col(Games::GameDate)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(GameEvents::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(GameEvents::Id).string().not_null().primary_key())
                        .col(ColumnDef::new(GameEvents::GameId).string().not_null())
                        .col(ColumnDef::new(GameEvents::TeamId).string().not_null())
                        .col(ColumnDef::new(GameEvents::PlayerId).string())
                        .col(ColumnDef::new(GameEvents::EventType).string().not_null())
                        .col(ColumnDef::new(GameEvents::Quarter).integer().not_null())
                        .col(ColumnDef::new(GameEvents::GameTime).string().not_null())
                        .col(
                            ColumnDef::new(GameEvents::Points)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(GameEvents::SequenceNumber)
                                .big_integer()
                                .not_null(),
                        )
                        .col(&mut timestamp_now(GameEvents::CreatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_game_events_game")
                                .from(GameEvents::Table, GameEvents::GameId)
                                .to(Games::Table, Games::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // Guards the max+1 sequence assignment against concurrent writers
            manager
                .create_index(
                    Index::create()
                        .name("idx_game_events_game_sequence")
                        .table(GameEvents::Table)
                        .col(GameEvents::GameId)
                        .col(GameEvents::SequenceNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Players::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Players::Id).string().not_null().primary_key())
                        .col(ColumnDef::new(Players::Name).string().not_null())
                        .col(&mut timestamp_now(Players::CreatedAt))
                        .to_owned(),
                )
                .await?;

            let stat = |col: RosterPlayers| {
                ColumnDef::new(col)
                    .double()
                    .not_null()
                    .default(0.0)
                    .to_owned()
            };
            manager
                .create_table(
                    Table::create()
                        .table(RosterPlayers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RosterPlayers::Id)
                                .string()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(RosterPlayers::RosterId).string().not_null())
                        .col(ColumnDef::new(RosterPlayers::PlayerId).string().not_null())
                        .col(ColumnDef::new(RosterPlayers::JerseyNumber).integer())
                        .col(ColumnDef::new(RosterPlayers::Position).string())
                        .col(
                            ColumnDef::new(RosterPlayers::GamesPlayed)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(&mut stat(RosterPlayers::Ppg))
                        .col(&mut stat(RosterPlayers::Rpg))
                        .col(&mut stat(RosterPlayers::Apg))
                        .col(&mut stat(RosterPlayers::Spg))
                        .col(&mut stat(RosterPlayers::Bpg))
                        .col(&mut stat(RosterPlayers::Mpg))
                        .col(&mut stat(RosterPlayers::FgPct))
                        .col(&mut stat(RosterPlayers::ThreePct))
                        .col(&mut stat(RosterPlayers::FtPct))
                        .col(&mut timestamp_now(RosterPlayers::CreatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_roster_players_player")
                                .from(RosterPlayers::Table, RosterPlayers::PlayerId)
                                .to(Players::Table, Players::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Officials::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Officials::Id).string().not_null().primary_key())
                        .col(ColumnDef::new(Officials::Name).string().not_null())
                        .col(ColumnDef::new(Officials::Email).string())
                        .col(ColumnDef::new(Officials::Phone).string())
                        .col(ColumnDef::new(Officials::CertificationLevel).string())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(GameOfficials::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(GameOfficials::GameId).string().not_null())
                        .col(ColumnDef::new(GameOfficials::OfficialId).string().not_null())
                        .primary_key(
                            Index::create()
                                .col(GameOfficials::GameId)
                                .col(GameOfficials::OfficialId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_game_officials_game")
                                .from(GameOfficials::Table, GameOfficials::GameId)
                                .to(Games::Table, Games::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_game_officials_official")
                                .from(GameOfficials::Table, GameOfficials::OfficialId)
                                .to(Officials::Table, Officials::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(GameOfficials::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Officials::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(RosterPlayers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Players::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(GameEvents::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Games::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Games {
        Table,
        Id,
        GameDate,
        GameTime,
        VenueId,
        HomeRosterId,
        AwayRosterId,
        SessionId,
        Status,
        HomeScore,
        AwayScore,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum GameEvents {
        Table,
        Id,
        GameId,
        TeamId,
        PlayerId,
        EventType,
        Quarter,
        GameTime,
        Points,
        SequenceNumber,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Players {
        Table,
        Id,
        Name,
        CreatedAt,
    }

    #[derive(Clone, Copy, DeriveIden)]
    enum RosterPlayers {
        Table,
        Id,
        RosterId,
        PlayerId,
        JerseyNumber,
        Position,
        GamesPlayed,
        Ppg,
        Rpg,
        Apg,
        Spg,
        Bpg,
        Mpg,
        FgPct,
        ThreePct,
        FtPct,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Officials {
        Table,
        Id,
        Name,
        Email,
        Phone,
        CertificationLevel,
    }

    #[derive(DeriveIden)]
    enum GameOfficials {
        Table,
        GameId,
        OfficialId,
    }
}

mod m20250301_000003_create_registrations {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000003_create_registrations"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(TeamRegistrations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TeamRegistrations::Id)
                                .string()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(TeamRegistrations::UserId).string().not_null())
                        .col(ColumnDef::new(TeamRegistrations::TeamName).string().not_null())
                        .col(ColumnDef::new(TeamRegistrations::City).string().not_null())
                        .col(ColumnDef::new(TeamRegistrations::ContactName).string().not_null())
                        .col(ColumnDef::new(TeamRegistrations::ContactEmail).string().not_null())
                        .col(ColumnDef::new(TeamRegistrations::ContactPhone).string())
                        .col(
                            ColumnDef::new(TeamRegistrations::DivisionPreference)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TeamRegistrations::SelectedPackage)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TeamRegistrations::SelectedSessionIds)
                                .json()
                                .not_null(),
                        )
                        .col(ColumnDef::new(TeamRegistrations::Status).string().not_null())
                        .col(
                            ColumnDef::new(TeamRegistrations::PaymentStatus)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(TeamRegistrations::TeamId).string())
                        .col(ColumnDef::new(TeamRegistrations::PaymentSessionId).string())
                        .col(ColumnDef::new(TeamRegistrations::Notes).string())
                        .col(&mut timestamp_now(TeamRegistrations::CreatedAt))
                        .col(&mut timestamp_now(TeamRegistrations::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_team_registrations_user_id")
                        .table(TeamRegistrations::Table)
                        .col(TeamRegistrations::UserId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(TeamPayments::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(TeamPayments::Id).string().not_null().primary_key())
                        .col(ColumnDef::new(TeamPayments::RosterId).string().not_null())
                        .col(ColumnDef::new(TeamPayments::AmountCents).big_integer().not_null())
                        .col(ColumnDef::new(TeamPayments::Currency).string().not_null())
                        .col(ColumnDef::new(TeamPayments::Status).string().not_null())
                        .col(ColumnDef::new(TeamPayments::DueDate).date())
                        .col(ColumnDef::new(TeamPayments::PaidAt).timestamp_with_time_zone())
                        .col(ColumnDef::new(TeamPayments::ProviderSessionId).string())
                        .col(ColumnDef::new(TeamPayments::ProviderPaymentId).string())
                        .col(ColumnDef::new(TeamPayments::Description).string())
                        .col(&mut timestamp_now(TeamPayments::CreatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_team_payments_roster_id")
                        .table(TeamPayments::Table)
                        .col(TeamPayments::RosterId)
                        .to_owned(),
                )
                .await?;

            // NULLs stay distinct, so manual installments without a session coexist
            manager
                .create_index(
                    Index::create()
                        .name("idx_team_payments_provider_session")
                        .table(TeamPayments::Table)
                        .col(TeamPayments::ProviderSessionId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(TeamPayments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(TeamRegistrations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum TeamRegistrations {
        Table,
        Id,
        UserId,
        TeamName,
        City,
        ContactName,
        ContactEmail,
        ContactPhone,
        DivisionPreference,
        SelectedPackage,
        SelectedSessionIds,
        Status,
        PaymentStatus,
        TeamId,
        PaymentSessionId,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum TeamPayments {
        Table,
        Id,
        RosterId,
        AmountCents,
        Currency,
        Status,
        DueDate,
        PaidAt,
        ProviderSessionId,
        ProviderPaymentId,
        Description,
        CreatedAt,
    }
}

/// Postgres triggers that `NOTIFY` on every game and game event row change.
/// Other backends have no listener, so the migration does nothing there.
mod m20250301_000004_create_change_triggers {
    use super::*;
    use crate::infra::change_feed::CHANGE_CHANNEL;
    use sea_orm::{ConnectionTrait, DbBackend};

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000004_create_change_triggers"
        }
    }

    /// The trigger argument names the column holding the game id
    fn notify_function() -> String {
        format!(
            r#"CREATE OR REPLACE FUNCTION league_notify_change() RETURNS trigger AS $$
DECLARE
    changed jsonb;
BEGIN
    IF TG_OP = 'DELETE' THEN
        changed := to_jsonb(OLD);
    ELSE
        changed := to_jsonb(NEW);
    END IF;
    PERFORM pg_notify('{CHANGE_CHANNEL}', json_build_object(
        'table', TG_TABLE_NAME,
        'op', TG_OP,
        'id', changed ->> 'id',
        'game_id', changed ->> TG_ARGV[0]
    )::text);
    RETURN NULL;
END;
$$ LANGUAGE plpgsql"#
        )
    }

    const TRIGGERS: [(&str, &str, &str); 2] = [
        ("games_notify_change", "games", "id"),
        ("game_events_notify_change", "game_events", "game_id"),
    ];

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            if manager.get_database_backend() != DbBackend::Postgres {
                return Ok(());
            }
            let db = manager.get_connection();
            db.execute_unprepared(&notify_function()).await?;
            for (trigger, table, game_column) in TRIGGERS {
                db.execute_unprepared(&format!("DROP TRIGGER IF EXISTS {trigger} ON {table}"))
                    .await?;
                db.execute_unprepared(&format!(
                    "CREATE TRIGGER {trigger} AFTER INSERT OR UPDATE OR DELETE ON {table} \
                     FOR EACH ROW EXECUTE FUNCTION league_notify_change('{game_column}')"
                ))
                .await?;
            }
            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            if manager.get_database_backend() != DbBackend::Postgres {
                return Ok(());
            }
            let db = manager.get_connection();
            for (trigger, table, _) in TRIGGERS {
                db.execute_unprepared(&format!("DROP TRIGGER IF EXISTS {trigger} ON {table}"))
                    .await?;
            }
            db.execute_unprepared("DROP FUNCTION IF EXISTS league_notify_change()")
                .await?;
            Ok(())
        }
    }

}
