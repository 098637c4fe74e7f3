//! Concurrent writers on a file-backed store with several pooled connections

use league_service::contract::*;
use std::collections::HashSet;
use tokio::task::JoinSet;

mod common;
use common::{date, registration_request, seed_league, shared_module, team_with_roster};

fn paid_installment(roster_id: &str, provider_session_id: Option<&str>) -> NewTeamPayment {
    NewTeamPayment {
        roster_id: roster_id.to_string(),
        amount_cents: 60_000,
        currency: "usd".to_string(),
        status: TeamPaymentStatus::Paid,
        due_date: None,
        paid_at: Some(chrono::Utc::now()),
        provider_session_id: provider_session_id.map(str::to_string),
        provider_payment_id: None,
        description: None,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_events_get_gapless_sequence_numbers() {
    let (module, db, _dir) = shared_module(8).await;
    let league = seed_league(&module, &db).await;
    let service = module.service();
    let (home_team, home) = team_with_roster(&module, &league, "Eastside Eagles").await;
    let (_away_team, away) = team_with_roster(&module, &league, "Westside Wolves").await;
    let game = service
        .create_game(NewGame {
            date: date(2025, 10, 4),
            time: None,
            venue_id: Some(league.venue_id.clone()),
            home_roster_id: home.id.clone(),
            away_roster_id: away.id.clone(),
            session_id: None,
            status: GameStatus::Live,
        })
        .await
        .unwrap();

    let mut writers = JoinSet::new();
    for n in 0..24 {
        let service = service.clone();
        let event = NewGameEvent {
            game_id: game.id.clone(),
            team_id: home_team.id.clone(),
            player_id: None,
            event_type: "score".to_string(),
            quarter: 1 + n % 4,
            game_time: format!("0{}:00", n % 8),
            points: 2,
        };
        writers.spawn(async move { service.record_game_event(event).await });
    }

    let mut claimed = Vec::new();
    while let Some(joined) = writers.join_next().await {
        claimed.push(joined.unwrap().unwrap().sequence_number);
    }
    claimed.sort_unstable();
    assert_eq!(claimed, (1..=24).collect::<Vec<i64>>());

    let stored: Vec<i64> = service
        .game_events(&game.id)
        .await
        .unwrap()
        .iter()
        .map(|e| e.sequence_number)
        .collect();
    assert_eq!(stored, (1..=24).collect::<Vec<i64>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_enrollment_keeps_one_row() {
    let (module, db, _dir) = shared_module(8).await;
    let league = seed_league(&module, &db).await;
    let service = module.service();
    let (_team, roster) = team_with_roster(&module, &league, "Eastside Eagles").await;

    let mut writers = JoinSet::new();
    for _ in 0..8 {
        let service = service.clone();
        let roster_id = roster.id.clone();
        let session_id = league.sessions[2].id.clone();
        writers.spawn(async move { service.enroll_roster(&roster_id, &session_id).await });
    }

    let mut ids = HashSet::new();
    while let Some(joined) = writers.join_next().await {
        ids.insert(joined.unwrap().unwrap().id);
    }
    assert_eq!(ids.len(), 1);
    assert_eq!(service.roster_enrollments(&roster.id).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_roster_creation_returns_one_roster() {
    let (module, db, _dir) = shared_module(4).await;
    let league = seed_league(&module, &db).await;
    let service = module.service();
    let team = service
        .create_team(NewTeam {
            name: "Northside Knights".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let rosters = &module.repositories().rosters;
    let (first, second) = tokio::join!(
        rosters.create(&team.id, &league.season.id, &league.division.id),
        rosters.create(&team.id, &league.season.id, &league.division.id),
    );
    assert_eq!(first.unwrap().id, second.unwrap().id);
    assert_eq!(service.rosters_for_team(&team.id).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_payment_is_recorded_once_per_provider_session() {
    let (module, db, _dir) = shared_module(4).await;
    let league = seed_league(&module, &db).await;
    let service = module.service();
    let (_team, roster) = team_with_roster(&module, &league, "Eastside Eagles").await;

    let payments = &module.repositories().payments;
    let installment = paid_installment(&roster.id, Some("cs_dup_1"));
    let (first, second) = tokio::join!(
        payments.create(&installment),
        payments.create(&installment),
    );
    assert_eq!(first.unwrap().id, second.unwrap().id);

    // Installments without a provider session are never merged
    payments.create(&paid_installment(&roster.id, None)).await.unwrap();
    payments.create(&paid_installment(&roster.id, None)).await.unwrap();

    let stored = service.payments_for_roster(&roster.id).await.unwrap();
    assert_eq!(stored.len(), 3);
    assert_eq!(
        stored
            .iter()
            .filter(|p| p.provider_session_id.as_deref() == Some("cs_dup_1"))
            .count(),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_redelivered_checkouts_converge_on_one_team_and_payment() {
    let (module, db, _dir) = shared_module(4).await;
    let league = seed_league(&module, &db).await;
    let service = module.service();

    let mut request = registration_request("full-season", &[]);
    request.division_preference = league.division.id.clone();
    let registration = service.create_registration(request).await.unwrap();

    let completion = CheckoutCompletion {
        registration_id: registration.id.clone(),
        provider_session_id: "cs_race_1".to_string(),
        provider_payment_id: Some("pi_race_1".to_string()),
        amount_cents: None,
        currency: None,
    };

    let (first, second) = tokio::join!(
        service.complete_checkout(completion.clone()),
        service.complete_checkout(completion.clone()),
    );
    let first = first.unwrap();
    let second = second.unwrap();
    assert_eq!(first.status, RegistrationStatus::Approved);
    assert_eq!(second.status, RegistrationStatus::Approved);
    assert!(first.team_id.is_some());
    assert_eq!(first.team_id, second.team_id);

    let stored = service.get_registration(&registration.id).await.unwrap();
    let team_id = stored.team_id.unwrap();
    assert_eq!(Some(team_id.clone()), first.team_id);

    let teams = service.search_teams("Lakeside Lions").await.unwrap();
    assert_eq!(teams.len(), 1);
    assert_eq!(teams[0].id, team_id);

    let rosters = service.rosters_for_team(&team_id).await.unwrap();
    assert_eq!(rosters.len(), 1);
    assert_eq!(
        service.roster_enrollments(&rosters[0].id).await.unwrap().len(),
        4
    );

    let payments = service.payments_for_roster(&rosters[0].id).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].amount_cents, 120_000);
    assert_eq!(payments[0].provider_session_id.as_deref(), Some("cs_race_1"));
}
