//! Relational store behavior through the service

use league_service::contract::*;
use league_service::domain::events::ChangeKind;
use std::collections::HashSet;

mod common;
use common::{date, offer_division, relational_module, seed_league, team_with_roster};

fn scheduled(home: &Roster, away: &Roster, venue_id: &str, day: u32) -> NewGame {
    NewGame {
        date: date(2025, 10, day),
        time: chrono::NaiveTime::from_hms_opt(18, 30, 0),
        venue_id: Some(venue_id.to_string()),
        home_roster_id: home.id.clone(),
        away_roster_id: away.id.clone(),
        session_id: None,
        status: GameStatus::Scheduled,
    }
}

fn final_score(home: i32, away: i32) -> GameUpdate {
    GameUpdate {
        status: Some(GameStatus::Completed),
        home_score: Some(home),
        away_score: Some(away),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_missing_rows_are_none_not_errors() {
    let (module, _db, _feed) = relational_module().await;
    let repos = module.repositories();

    assert!(repos.games.find_by_id("nope").await.unwrap().is_none());
    assert!(repos.teams.find_by_id("nope").await.unwrap().is_none());
    assert!(repos.players.find_by_id("nope").await.unwrap().is_none());
    assert!(repos.registrations.find_by_id("nope").await.unwrap().is_none());
    assert!(repos.seasons.find_current().await.unwrap().is_none());
    assert!(repos.games.find_all().await.unwrap().is_empty());
    assert!(repos
        .teams
        .update("nope", &TeamUpdate::default())
        .await
        .unwrap()
        .is_none());

    let err = module.service().get_game("nope").await.unwrap_err();
    assert_eq!(err, LeagueError::not_found("game", "nope"));
}

#[tokio::test]
async fn test_team_defaults_and_update() {
    let (module, db, _feed) = relational_module().await;
    let league = seed_league(&module, &db).await;
    let service = module.service();

    let (team, _roster) = team_with_roster(&module, &league, "Eastside Eagles").await;
    assert_eq!(team.short_name, "Eastside Eagles");
    assert_eq!(team.status, TeamStatus::Active);
    assert_eq!(team.colors, TeamColors::default());

    let updated = service
        .update_team(
            &team.id,
            TeamUpdate {
                short_name: Some("EAG".to_string()),
                logo: Some("https://cdn.example.com/eagles.png".to_string()),
                colors: Some(TeamColors {
                    primary: "#002244".to_string(),
                    secondary: "#c60c30".to_string(),
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Eastside Eagles");
    assert_eq!(updated.short_name, "EAG");
    assert_eq!(updated.logo.as_deref(), Some("https://cdn.example.com/eagles.png"));
    assert_eq!(updated.colors.primary, "#002244");

    let placement = updated.current.expect("team has a roster");
    assert_eq!(placement.season.id, league.season.id);
    assert_eq!(placement.division.name, "Premier 14U");

    let found = service.search_teams("eagles").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(
        service.teams_for_season(&league.season.id).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_search_treats_wildcards_literally() {
    let (module, _db, _feed) = relational_module().await;
    let service = module.service();
    for name in ["100% Hustle", "Net_Setters", "Netsetters", "Hustle Hoops"] {
        service
            .create_team(NewTeam {
                name: name.to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let names = |teams: Vec<Team>| teams.into_iter().map(|t| t.name).collect::<Vec<_>>();
    assert_eq!(names(service.search_teams("0%").await.unwrap()), ["100% Hustle"]);
    assert_eq!(names(service.search_teams("net_").await.unwrap()), ["Net_Setters"]);
    assert_eq!(names(service.search_teams("%").await.unwrap()), ["100% Hustle"]);
    assert_eq!(names(service.search_teams("_").await.unwrap()), ["Net_Setters"]);
    assert_eq!(service.search_teams("hustle").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_roster_requires_division_offered_in_season() {
    let (module, db, _feed) = relational_module().await;
    let league = seed_league(&module, &db).await;
    let service = module.service();

    let other = service
        .create_division(NewDivision {
            name: "Diamond 17U".to_string(),
            age_group: AgeGroup::Diamond,
            conference_id: None,
        })
        .await
        .unwrap();
    let team = service
        .create_team(NewTeam {
            name: "Westside Wolves".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let rosters = &service.repositories().rosters;
    assert!(rosters
        .create(&team.id, &league.season.id, &other.id)
        .await
        .is_err());

    offer_division(&db, &league.season.id, &other.id).await;
    let roster = rosters
        .create(&team.id, &league.season.id, &other.id)
        .await
        .unwrap();
    assert_eq!(roster.division_id, other.id);

    let offered: HashSet<String> = service
        .divisions_for_season(&league.season.id)
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(offered, HashSet::from([league.division.id, other.id]));
}

#[tokio::test]
async fn test_enrollment_is_unique_per_roster_and_session() {
    let (module, db, _feed) = relational_module().await;
    let league = seed_league(&module, &db).await;
    let service = module.service();
    let (_team, roster) = team_with_roster(&module, &league, "Eastside Eagles").await;

    let first = service
        .enroll_roster(&roster.id, &league.sessions[1].id)
        .await
        .unwrap();
    let again = service
        .enroll_roster(&roster.id, &league.sessions[1].id)
        .await
        .unwrap();
    assert_eq!(first.id, again.id);
    assert!(!first.auto_enrolled);
    assert_eq!(service.roster_enrollments(&roster.id).await.unwrap().len(), 1);

    let err = service
        .enroll_roster(&roster.id, "missing-session")
        .await
        .unwrap_err();
    assert_eq!(err, LeagueError::not_found("session", "missing-session"));
}

#[tokio::test]
async fn test_sessions_are_ordered_by_sequence() {
    let (module, db, _feed) = relational_module().await;
    let league = seed_league(&module, &db).await;

    let names: Vec<String> = module
        .service()
        .sessions_for_season(&league.season.id)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, ["Session 1", "Session 2", "Session 3", "Session 4"]);
}

#[tokio::test]
async fn test_current_season_prefers_latest_start() {
    let (module, db, _feed) = relational_module().await;
    let league = seed_league(&module, &db).await;
    let service = module.service();

    for (name, start, active) in [
        ("Spring 2025", date(2025, 3, 1), true),
        ("Winter 2026", date(2026, 1, 10), false),
    ] {
        service
            .create_season(NewSeason {
                name: name.to_string(),
                year: 2025,
                status: SeasonStatus::Active,
                is_active: active,
                start_date: Some(start),
                end_date: None,
            })
            .await
            .unwrap();
    }

    let current = service.current_season().await.unwrap().unwrap();
    assert_eq!(current.id, league.season.id);
    assert_eq!(service.list_seasons().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_game_read_model_and_queries() {
    let (module, db, _feed) = relational_module().await;
    let league = seed_league(&module, &db).await;
    let service = module.service();
    let (home_team, home) = team_with_roster(&module, &league, "Eastside Eagles").await;
    let (_away_team, away) = team_with_roster(&module, &league, "Westside Wolves").await;

    let early = service
        .create_game(scheduled(&home, &away, &league.venue_id, 4))
        .await
        .unwrap();
    let late = service
        .create_game(scheduled(&away, &home, &league.venue_id, 18))
        .await
        .unwrap();

    assert_eq!(early.title, "Eastside Eagles vs Westside Wolves");
    assert_eq!(early.venue.name, "Riverside Gym");
    assert_eq!(early.home_team.id, home_team.id);
    assert_eq!(early.division.id, league.division.id);
    assert_eq!(early.season.id, league.season.id);
    assert_eq!(early.status, GameStatus::Scheduled);

    let upcoming = service.upcoming_games(date(2025, 10, 5), 10).await.unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].id, late.id);

    let window = service
        .games_between(date(2025, 10, 1), date(2025, 10, 31))
        .await
        .unwrap();
    assert_eq!(window.len(), 2);
    assert_eq!(window[0].id, early.id);

    assert_eq!(service.games_for_team(&home_team.id).await.unwrap().len(), 2);
    assert_eq!(service.search_games("riverside").await.unwrap().len(), 2);
    assert_eq!(service.search_games("wolves").await.unwrap().len(), 2);

    service
        .update_game(
            &early.id,
            GameUpdate {
                status: Some(GameStatus::Live),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let live = service.live_games().await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].id, early.id);

    service
        .update_game(&early.id, final_score(52, 47))
        .await
        .unwrap();
    let results = service.recent_results(5).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].home_score, Some(52));
    assert!(service.live_games().await.unwrap().is_empty());

    let err = service
        .create_game(scheduled(&home, &home, &league.venue_id, 20))
        .await
        .unwrap_err();
    assert!(matches!(err, LeagueError::Validation { .. }));
}

#[tokio::test]
async fn test_game_events_are_numbered_per_game() {
    let (module, db, feed) = relational_module().await;
    let league = seed_league(&module, &db).await;
    let service = module.service();
    let (home_team, home) = team_with_roster(&module, &league, "Eastside Eagles").await;
    let (_away_team, away) = team_with_roster(&module, &league, "Westside Wolves").await;
    let first = service
        .create_game(scheduled(&home, &away, &league.venue_id, 4))
        .await
        .unwrap();
    let second = service
        .create_game(scheduled(&away, &home, &league.venue_id, 11))
        .await
        .unwrap();

    let mut changes = league_service::domain::ChangeFeed::subscribe(&*feed).unwrap();

    let event = |game_id: &str, points: i32| NewGameEvent {
        game_id: game_id.to_string(),
        team_id: home_team.id.clone(),
        player_id: None,
        event_type: "score".to_string(),
        quarter: 1,
        game_time: "07:42".to_string(),
        points,
    };

    for points in [2, 3, 1] {
        service.record_game_event(event(&first.id, points)).await.unwrap();
    }
    let other = service.record_game_event(event(&second.id, 2)).await.unwrap();
    assert_eq!(other.sequence_number, 1);

    let sequence: Vec<i64> = service
        .game_events(&first.id)
        .await
        .unwrap()
        .iter()
        .map(|e| e.sequence_number)
        .collect();
    assert_eq!(sequence, [1, 2, 3]);

    let notification = changes.recv().await.unwrap();
    assert_eq!(notification.game_id.as_deref(), Some(first.id.as_str()));
    assert_eq!(notification.kind, ChangeKind::Insert);

    let err = service
        .record_game_event(event("missing", 2))
        .await
        .unwrap_err();
    assert_eq!(err, LeagueError::not_found("game", "missing"));
}

#[tokio::test]
async fn test_standings_from_completed_games() {
    let (module, db, _feed) = relational_module().await;
    let league = seed_league(&module, &db).await;
    let service = module.service();
    let (eagles, eagles_roster) = team_with_roster(&module, &league, "Eastside Eagles").await;
    let (wolves, wolves_roster) = team_with_roster(&module, &league, "Westside Wolves").await;

    let g1 = service
        .create_game(scheduled(&eagles_roster, &wolves_roster, &league.venue_id, 4))
        .await
        .unwrap();
    let g2 = service
        .create_game(scheduled(&wolves_roster, &eagles_roster, &league.venue_id, 11))
        .await
        .unwrap();
    service
        .create_game(scheduled(&eagles_roster, &wolves_roster, &league.venue_id, 18))
        .await
        .unwrap();
    service.update_game(&g1.id, final_score(60, 50)).await.unwrap();
    service.update_game(&g2.id, final_score(40, 45)).await.unwrap();

    let table = service
        .standings(&league.season.id, Some(&league.division.id))
        .await
        .unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table[0].team.id, eagles.id);
    assert_eq!((table[0].wins, table[0].losses), (2, 0));
    assert_eq!(table[0].point_differential(), 15);
    assert_eq!(table[1].team.id, wolves.id);
    assert_eq!(table[1].win_pct, 0.0);

    assert!(service
        .standings(&league.season.id, Some("other-division"))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_players_and_stat_leaders() {
    let (module, db, _feed) = relational_module().await;
    let league = seed_league(&module, &db).await;
    let service = module.service();
    let (eagles, roster) = team_with_roster(&module, &league, "Eastside Eagles").await;

    for (name, ppg, rpg) in [("Avery Cole", 18.5, 4.0), ("Blake Diaz", 12.0, 9.5), ("Casey Ng", 18.5, 2.0)] {
        let player = service
            .create_player(NewPlayer {
                name: name.to_string(),
                roster_id: roster.id.clone(),
                jersey: Some(7),
                position: Some(Position::PointGuard),
                stats: PlayerStats {
                    games_played: 8,
                    ppg,
                    rpg,
                    ..Default::default()
                },
            })
            .await
            .unwrap();
        assert_eq!(player.team.id, eagles.id);
        assert_eq!(player.season.id, league.season.id);
        assert_eq!(player.roster_id.as_deref(), Some(roster.id.as_str()));
    }

    assert_eq!(service.players_for_team(&eagles.id).await.unwrap().len(), 3);
    assert_eq!(service.search_players("diaz").await.unwrap().len(), 1);

    let leaders = service.stat_leaders(&league.season.id, 2).await.unwrap();
    let scorers: Vec<&str> = leaders.points.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(scorers, ["Avery Cole", "Casey Ng"]);
    assert_eq!(leaders.rebounds[0].name, "Blake Diaz");

    let rebounders = service
        .category_leaders(StatCategory::Rebounds, &league.season.id, 10)
        .await
        .unwrap();
    assert_eq!(rebounders.len(), 3);
    assert_eq!(rebounders[2].name, "Casey Ng");

    let err = service
        .create_player(NewPlayer {
            name: " ".to_string(),
            roster_id: roster.id.clone(),
            jersey: None,
            position: None,
            stats: PlayerStats::default(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LeagueError::Validation { .. }));
}

#[tokio::test]
async fn test_officials_assignment_is_idempotent() {
    let (module, db, _feed) = relational_module().await;
    let league = seed_league(&module, &db).await;
    let service = module.service();
    let (_t1, home) = team_with_roster(&module, &league, "Eastside Eagles").await;
    let (_t2, away) = team_with_roster(&module, &league, "Westside Wolves").await;
    let game = service
        .create_game(scheduled(&home, &away, &league.venue_id, 4))
        .await
        .unwrap();

    let official = service
        .create_official(NewOfficial {
            name: "Sam Ortiz".to_string(),
            certification_level: Some("level 2".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    service.assign_official(&official.id, &game.id).await.unwrap();
    service.assign_official(&official.id, &game.id).await.unwrap();

    let assigned = service.game_officials(&game.id).await.unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].name, "Sam Ortiz");
}

#[tokio::test]
async fn test_payments_summary_and_overdue() {
    let (module, db, _feed) = relational_module().await;
    let league = seed_league(&module, &db).await;
    let service = module.service();
    let (_team, roster) = team_with_roster(&module, &league, "Eastside Eagles").await;

    let installment = |amount: i64, due: chrono::NaiveDate| NewTeamPayment {
        roster_id: roster.id.clone(),
        amount_cents: amount,
        currency: "usd".to_string(),
        status: TeamPaymentStatus::Pending,
        due_date: Some(due),
        paid_at: None,
        provider_session_id: None,
        provider_payment_id: None,
        description: None,
    };

    let first = service
        .record_payment(installment(40_000, date(2025, 9, 1)))
        .await
        .unwrap();
    service
        .record_payment(installment(40_000, date(2025, 10, 1)))
        .await
        .unwrap();
    service
        .record_payment(installment(40_000, date(2025, 11, 1)))
        .await
        .unwrap();

    let paid = service.mark_payment_paid(&first.id).await.unwrap();
    assert_eq!(paid.status, TeamPaymentStatus::Paid);
    assert!(paid.paid_at.is_some());

    let flagged = service.mark_overdue_payments(date(2025, 10, 15)).await.unwrap();
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].due_date, Some(date(2025, 10, 1)));

    let summary = service.payment_summary(&roster.id).await.unwrap();
    assert_eq!(summary.total_cents, 120_000);
    assert_eq!(summary.paid_cents, 40_000);
    assert_eq!(summary.outstanding_cents, 80_000);
    assert_eq!(summary.overdue_cents, 40_000);
    assert_eq!(summary.next_due, Some(date(2025, 10, 1)));

    let err = service
        .record_payment(installment(0, date(2025, 12, 1)))
        .await
        .unwrap_err();
    assert!(matches!(err, LeagueError::Validation { .. }));
}
