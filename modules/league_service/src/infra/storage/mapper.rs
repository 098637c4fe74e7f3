//! Row to domain mappers for the relational store
//!
//! Repositories assemble one canonical record per entity (a row plus its
//! resolved relations) and hand it to these functions. Missing relations map
//! to defaults; only a row without a primary id is rejected.

use super::entity::{
    conference, division, enrollment, game, game_event, official, player, registration, roster,
    roster_player, season, season_division, session, team, team_payment, venue,
};
use crate::contract::{
    game_title, AgeGroup, ConferenceRef, Division, DivisionRef, Game, GameEvent, GameStatus,
    Official, Package, PaymentStatus, Player, PlayerStats, Position, RegistrationStatus, Roster,
    RosterSessionEnrollment, Season, SeasonRef, SeasonStatus, Session, Team, TeamColors,
    TeamPayment, TeamPaymentStatus, TeamPlacement, TeamRef, TeamRegistration, TeamStatus, Venue,
};
use anyhow::{bail, Result};

/// Roster row with its team and season-division chain
#[derive(Debug, Clone)]
pub struct RosterRecord {
    pub roster: roster::Model,
    pub team: Option<team::Model>,
    pub season_division: Option<season_division::Model>,
    pub season: Option<season::Model>,
    pub division: Option<division::Model>,
}

/// Game row with venue and both rosters resolved
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub game: game::Model,
    pub venue: Option<venue::Model>,
    pub home: Option<RosterRecord>,
    pub away: Option<RosterRecord>,
}

/// Team row with the roster used for its placement snapshot
#[derive(Debug, Clone)]
pub struct TeamRecord {
    pub team: team::Model,
    pub latest_roster: Option<RosterRecord>,
}

/// Player row with one roster membership
#[derive(Debug, Clone)]
pub struct PlayerRecord {
    pub player: player::Model,
    pub membership: Option<roster_player::Model>,
    pub roster: Option<RosterRecord>,
}

/// Division row with its conference and season
#[derive(Debug, Clone)]
pub struct DivisionRecord {
    pub division: division::Model,
    pub conference: Option<conference::Model>,
    pub season: Option<season::Model>,
}

fn require_id(id: &str, entity: &str) -> Result<()> {
    if id.trim().is_empty() {
        bail!("{entity} row is missing its primary id");
    }
    Ok(())
}

// ===== References =====

fn season_ref(season: Option<&season::Model>) -> SeasonRef {
    season
        .map(|s| SeasonRef {
            id: s.id.clone(),
            name: s.name.clone(),
        })
        .unwrap_or_default()
}

fn division_ref(division: Option<&division::Model>) -> DivisionRef {
    match division {
        Some(d) => DivisionRef {
            id: d.id.clone(),
            name: if d.name.is_empty() {
                crate::contract::UNKNOWN_DIVISION.to_string()
            } else {
                d.name.clone()
            },
        },
        None => DivisionRef::unknown(),
    }
}

fn team_ref(team: Option<&team::Model>) -> TeamRef {
    team.map(|t| TeamRef {
        id: t.id.clone(),
        name: t.name.clone(),
        short_name: t.short_name.clone().unwrap_or_default(),
        logo: t.logo_url.clone(),
    })
    .unwrap_or_default()
}

fn venue_or_tbd(venue: Option<&venue::Model>) -> Venue {
    match venue {
        Some(v) => Venue {
            id: v.id.clone(),
            name: v.name.clone(),
            address: v.address.clone().unwrap_or_default(),
            city: v.city.clone().unwrap_or_default(),
        },
        None => Venue::tbd(),
    }
}

// ===== Season structure =====

impl TryFrom<season::Model> for Season {
    type Error = anyhow::Error;

    fn try_from(row: season::Model) -> Result<Self> {
        require_id(&row.id, "season")?;
        Ok(Self {
            status: SeasonStatus::parse(&row.status).unwrap_or(SeasonStatus::Upcoming),
            id: row.id,
            name: row.name,
            year: row.year,
            is_active: row.is_active,
            start_date: row.start_date,
            end_date: row.end_date,
        })
    }
}

pub fn to_division(record: DivisionRecord) -> Result<Division> {
    let DivisionRecord {
        division,
        conference,
        season,
    } = record;
    require_id(&division.id, "division")?;

    Ok(Division {
        age_group: AgeGroup::parse(&division.age_group).unwrap_or(AgeGroup::Ascent),
        name: if division.name.is_empty() {
            crate::contract::UNKNOWN_DIVISION.to_string()
        } else {
            division.name
        },
        id: division.id,
        conference: conference.map(|c| ConferenceRef {
            id: c.id,
            name: c.name,
        }),
        season: season.map(|s| SeasonRef {
            id: s.id,
            name: s.name,
        }),
    })
}

impl TryFrom<session::Model> for Session {
    type Error = anyhow::Error;

    fn try_from(row: session::Model) -> Result<Self> {
        require_id(&row.id, "session")?;
        Ok(Self {
            id: row.id,
            season_id: row.season_id,
            name: row.name,
            sequence: row.sequence,
            start_date: row.start_date,
            end_date: row.end_date,
        })
    }
}

// ===== Teams and rosters =====

pub fn to_team(record: TeamRecord) -> Result<Team> {
    let TeamRecord {
        team,
        latest_roster,
    } = record;
    require_id(&team.id, "team")?;

    let current = latest_roster.and_then(|r| {
        r.season.as_ref()?;
        Some(TeamPlacement {
            season: season_ref(r.season.as_ref()),
            division: division_ref(r.division.as_ref()),
        })
    });

    Ok(Team {
        status: TeamStatus::parse(&team.status).unwrap_or(TeamStatus::Active),
        short_name: team.short_name.unwrap_or_default(),
        location: team.location.unwrap_or_default(),
        colors: TeamColors {
            primary: team.primary_color.unwrap_or_default(),
            secondary: team.secondary_color.unwrap_or_default(),
        },
        id: team.id,
        name: team.name,
        logo: team.logo_url,
        current,
    })
}

pub fn to_roster(roster: roster::Model, link: Option<&season_division::Model>) -> Result<Roster> {
    require_id(&roster.id, "roster")?;
    Ok(Roster {
        season_id: link.map(|l| l.season_id.clone()).unwrap_or_default(),
        division_id: link.map(|l| l.division_id.clone()).unwrap_or_default(),
        id: roster.id,
        team_id: roster.team_id,
        season_division_id: roster.season_division_id,
    })
}

impl TryFrom<enrollment::Model> for RosterSessionEnrollment {
    type Error = anyhow::Error;

    fn try_from(row: enrollment::Model) -> Result<Self> {
        require_id(&row.id, "enrollment")?;
        Ok(Self {
            id: row.id,
            roster_id: row.roster_id,
            session_id: row.session_id,
            auto_enrolled: row.auto_enrolled,
            enrolled_at: row.enrolled_at,
        })
    }
}

// ===== Games =====

/// The single Game transform of the relational family
pub fn to_game(record: GameRecord) -> Result<Game> {
    let GameRecord {
        game,
        venue,
        home,
        away,
    } = record;
    require_id(&game.id, "game")?;

    let home_team = team_ref(home.as_ref().and_then(|r| r.team.as_ref()));
    let away_team = team_ref(away.as_ref().and_then(|r| r.team.as_ref()));
    // Both rosters sit in the same season division; fall back to the away side
    let chain = home
        .as_ref()
        .filter(|r| r.season_division.is_some())
        .or(away.as_ref());

    Ok(Game {
        title: game_title(&home_team, &away_team),
        date: Some(game.game_date),
        time: game.game_time,
        venue: venue_or_tbd(venue.as_ref()),
        division: division_ref(chain.and_then(|r| r.division.as_ref())),
        season: season_ref(chain.and_then(|r| r.season.as_ref())),
        home_team,
        away_team,
        home_roster_id: Some(game.home_roster_id),
        away_roster_id: Some(game.away_roster_id),
        session_id: game.session_id,
        status: GameStatus::parse(&game.status).unwrap_or(GameStatus::Scheduled),
        home_score: game.home_score,
        away_score: game.away_score,
        id: game.id,
    })
}

impl TryFrom<game_event::Model> for GameEvent {
    type Error = anyhow::Error;

    fn try_from(row: game_event::Model) -> Result<Self> {
        require_id(&row.id, "game event")?;
        Ok(Self {
            id: row.id,
            game_id: row.game_id,
            team_id: row.team_id,
            player_id: row.player_id,
            event_type: row.event_type,
            quarter: row.quarter,
            game_time: row.game_time,
            points: row.points,
            sequence_number: row.sequence_number,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<official::Model> for Official {
    type Error = anyhow::Error;

    fn try_from(row: official::Model) -> Result<Self> {
        require_id(&row.id, "official")?;
        Ok(Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            certification_level: row.certification_level,
        })
    }
}

// ===== Players =====

pub fn to_player(record: PlayerRecord) -> Result<Player> {
    let PlayerRecord {
        player,
        membership,
        roster,
    } = record;
    require_id(&player.id, "player")?;

    let stats = membership
        .as_ref()
        .map(|m| PlayerStats {
            games_played: m.games_played,
            ppg: m.ppg,
            rpg: m.rpg,
            apg: m.apg,
            spg: m.spg,
            bpg: m.bpg,
            mpg: m.mpg,
            fg_pct: m.fg_pct,
            three_pct: m.three_pct,
            ft_pct: m.ft_pct,
        })
        .unwrap_or_default();

    Ok(Player {
        id: player.id,
        name: player.name,
        team: team_ref(roster.as_ref().and_then(|r| r.team.as_ref())),
        jersey: membership.as_ref().and_then(|m| m.jersey_number),
        position: membership
            .as_ref()
            .and_then(|m| m.position.as_deref())
            .and_then(Position::parse),
        stats,
        division: division_ref(roster.as_ref().and_then(|r| r.division.as_ref())),
        season: season_ref(roster.as_ref().and_then(|r| r.season.as_ref())),
        roster_id: membership.map(|m| m.roster_id),
    })
}

// ===== Registrations and payments =====

impl TryFrom<registration::Model> for TeamRegistration {
    type Error = anyhow::Error;

    fn try_from(row: registration::Model) -> Result<Self> {
        require_id(&row.id, "registration")?;
        let selected_session_ids: Vec<String> =
            serde_json::from_value(row.selected_session_ids).unwrap_or_default();

        Ok(Self {
            selected_package: Package::parse(&row.selected_package)
                .unwrap_or(Package::PayPerSession),
            status: RegistrationStatus::parse(&row.status).unwrap_or(RegistrationStatus::Pending),
            payment_status: PaymentStatus::parse(&row.payment_status)
                .unwrap_or(PaymentStatus::Pending),
            id: row.id,
            user_id: row.user_id,
            team_name: row.team_name,
            city: row.city,
            contact_name: row.contact_name,
            contact_email: row.contact_email,
            contact_phone: row.contact_phone,
            division_preference: row.division_preference,
            selected_session_ids,
            team_id: row.team_id,
            payment_session_id: row.payment_session_id,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<team_payment::Model> for TeamPayment {
    type Error = anyhow::Error;

    fn try_from(row: team_payment::Model) -> Result<Self> {
        require_id(&row.id, "payment")?;
        Ok(Self {
            status: TeamPaymentStatus::parse(&row.status).unwrap_or(TeamPaymentStatus::Pending),
            id: row.id,
            roster_id: row.roster_id,
            amount_cents: row.amount_cents,
            currency: row.currency,
            due_date: row.due_date,
            paid_at: row.paid_at,
            provider_session_id: row.provider_session_id,
            provider_payment_id: row.provider_payment_id,
            description: row.description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn game_row() -> game::Model {
        game::Model {
            id: "g1".to_string(),
            game_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            game_time: None,
            venue_id: None,
            home_roster_id: "r-home".to_string(),
            away_roster_id: "r-away".to_string(),
            session_id: None,
            status: "scheduled".to_string(),
            home_score: None,
            away_score: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_game_without_relations_gets_defaults() {
        let game = to_game(GameRecord {
            game: game_row(),
            venue: None,
            home: None,
            away: None,
        })
        .unwrap();

        assert_eq!(game.venue, Venue::tbd());
        assert_eq!(game.division.name, "unknown");
        assert_eq!(game.home_team.name, "");
        assert_eq!(game.title, "TBD vs TBD");
        assert_eq!(game.status, GameStatus::Scheduled);
    }

    #[test]
    fn test_game_without_id_is_rejected() {
        let mut row = game_row();
        row.id = String::new();
        let result = to_game(GameRecord {
            game: row,
            venue: None,
            home: None,
            away: None,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_status_falls_back() {
        let mut row = game_row();
        row.status = "halftime".to_string();
        let game = to_game(GameRecord {
            game: row,
            venue: None,
            home: None,
            away: None,
        })
        .unwrap();
        assert_eq!(game.status, GameStatus::Scheduled);
    }

    #[test]
    fn test_player_without_membership_has_zero_stats() {
        let player = to_player(PlayerRecord {
            player: player::Model {
                id: "p1".to_string(),
                name: "Jordan".to_string(),
                created_at: Utc::now(),
            },
            membership: None,
            roster: None,
        })
        .unwrap();

        assert_eq!(player.stats, PlayerStats::default());
        assert_eq!(player.division.name, "unknown");
        assert!(player.roster_id.is_none());
    }

    #[test]
    fn test_registration_with_malformed_sessions_defaults_to_empty() {
        let row = registration::Model {
            id: "reg1".to_string(),
            user_id: "u1".to_string(),
            team_name: "Hawks".to_string(),
            city: "Austin".to_string(),
            contact_name: "Sam".to_string(),
            contact_email: "sam@example.com".to_string(),
            contact_phone: None,
            division_preference: "d1".to_string(),
            selected_package: "full-season".to_string(),
            selected_session_ids: serde_json::json!({"not": "a list"}),
            status: "pending".to_string(),
            payment_status: "pending".to_string(),
            team_id: None,
            payment_session_id: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let registration = TeamRegistration::try_from(row).unwrap();
        assert!(registration.selected_session_ids.is_empty());
        assert_eq!(registration.selected_package, Package::FullSeason);
    }
}
