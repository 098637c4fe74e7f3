//! Document to domain transforms for the content store
//!
//! Same contract as the relational mapper: missing relations map to
//! defaults, only a document without `_id` is rejected.

use super::documents::{
    DivisionDoc, GameDoc, PlayerDoc, RefDoc, RosterDoc, SeasonDoc, TeamDoc, VenueDoc,
};
use crate::contract::{
    game_title, AgeGroup, ConferenceRef, Division, DivisionRef, Game, GameStatus, Player,
    PlayerStats, Position, Season, SeasonRef, SeasonStatus, Team, TeamColors, TeamPlacement,
    TeamRef, TeamStatus, Venue, UNKNOWN_DIVISION,
};
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode a list result; `null` is an empty list
pub fn decode_list<T: DeserializeOwned>(value: Value) -> Result<Vec<T>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value).context("unexpected content document shape")
}

/// Decode a single-document result; `null` is `None`
pub fn decode_one<T: DeserializeOwned>(value: Value) -> Result<Option<T>> {
    if value.is_null() {
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .context("unexpected content document shape")
}

fn require_id(id: Option<String>, entity: &str) -> Result<String> {
    id.filter(|id| !id.trim().is_empty())
        .with_context(|| format!("{entity} document is missing its _id"))
}

fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    value.and_then(|v| NaiveDate::parse_from_str(v.get(..10).unwrap_or(v), "%Y-%m-%d").ok())
}

fn parse_time(value: Option<&str>) -> Option<NaiveTime> {
    let value = value?;
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

fn season_ref(doc: Option<&RefDoc>) -> SeasonRef {
    doc.map(|d| SeasonRef {
        id: d.id.clone().unwrap_or_default(),
        name: d.name.clone().unwrap_or_default(),
    })
    .unwrap_or_default()
}

fn division_ref(doc: Option<&RefDoc>) -> DivisionRef {
    match doc {
        Some(d) => DivisionRef {
            id: d.id.clone().unwrap_or_default(),
            name: d
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| UNKNOWN_DIVISION.to_string()),
        },
        None => DivisionRef::unknown(),
    }
}

fn team_ref(doc: Option<&TeamDoc>) -> TeamRef {
    doc.map(|t| TeamRef {
        id: t.id.clone().unwrap_or_default(),
        name: t.name.clone().unwrap_or_default(),
        short_name: t.short_name.clone().unwrap_or_default(),
        logo: t.logo.clone(),
    })
    .unwrap_or_default()
}

fn venue_or_tbd(doc: Option<VenueDoc>) -> Venue {
    match doc {
        Some(v) => Venue {
            id: v.id.unwrap_or_default(),
            name: v.name.unwrap_or_default(),
            address: v.address.unwrap_or_default(),
            city: v.city.unwrap_or_default(),
        },
        None => Venue::tbd(),
    }
}

pub fn to_season(doc: SeasonDoc) -> Result<Season> {
    Ok(Season {
        id: require_id(doc.id, "season")?,
        name: doc.name.unwrap_or_default(),
        year: doc.year.unwrap_or_default(),
        status: doc
            .status
            .as_deref()
            .and_then(SeasonStatus::parse)
            .unwrap_or(SeasonStatus::Upcoming),
        is_active: doc.is_active.unwrap_or(false),
        start_date: parse_date(doc.start_date.as_deref()),
        end_date: parse_date(doc.end_date.as_deref()),
    })
}

pub fn to_division(doc: DivisionDoc) -> Result<Division> {
    let season = doc
        .conference
        .as_ref()
        .and_then(|c| c.season.as_ref())
        .map(|s| season_ref(Some(s)));

    Ok(Division {
        id: require_id(doc.id, "division")?,
        name: doc
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UNKNOWN_DIVISION.to_string()),
        age_group: doc
            .age_group
            .as_deref()
            .and_then(AgeGroup::parse)
            .unwrap_or(AgeGroup::Ascent),
        conference: doc.conference.map(|c| ConferenceRef {
            id: c.id.unwrap_or_default(),
            name: c.name.unwrap_or_default(),
        }),
        season,
    })
}

pub fn to_team(doc: TeamDoc) -> Result<Team> {
    let current = doc.current_season.as_ref().map(|season| TeamPlacement {
        season: season_ref(Some(season)),
        division: division_ref(doc.current_division.as_ref()),
    });
    let colors = doc.colors.unwrap_or_default();

    Ok(Team {
        id: require_id(doc.id, "team")?,
        name: doc.name.unwrap_or_default(),
        short_name: doc.short_name.unwrap_or_default(),
        logo: doc.logo,
        location: doc.location.unwrap_or_default(),
        colors: TeamColors {
            primary: colors.primary.unwrap_or_default(),
            secondary: colors.secondary.unwrap_or_default(),
        },
        status: doc
            .status
            .as_deref()
            .and_then(TeamStatus::parse)
            .unwrap_or(TeamStatus::Active),
        current,
    })
}

/// The single Game transform of the content family
pub fn to_game(doc: GameDoc) -> Result<Game> {
    let id = require_id(doc.id, "game")?;
    let home = doc.home_roster.unwrap_or_default();
    let away = doc.away_roster.unwrap_or_default();

    let home_team = team_ref(home.team.as_ref());
    let away_team = team_ref(away.team.as_ref());
    let chain: &RosterDoc = if home.season.is_some() || home.division.is_some() {
        &home
    } else {
        &away
    };

    Ok(Game {
        title: game_title(&home_team, &away_team),
        date: parse_date(doc.date.as_deref()),
        time: parse_time(doc.time.as_deref()),
        venue: venue_or_tbd(doc.venue),
        division: division_ref(chain.division.as_ref()),
        season: season_ref(chain.season.as_ref()),
        home_team,
        away_team,
        home_roster_id: home.id.clone(),
        away_roster_id: away.id.clone(),
        session_id: doc.session_id,
        status: doc
            .status
            .as_deref()
            .and_then(GameStatus::parse)
            .unwrap_or(GameStatus::Scheduled),
        home_score: doc.home_score,
        away_score: doc.away_score,
        id,
    })
}

pub fn to_player(doc: PlayerDoc) -> Result<Player> {
    let stats = doc.stats.unwrap_or_default();
    let roster = doc.roster.unwrap_or_default();

    Ok(Player {
        id: require_id(doc.id, "player")?,
        name: doc.name.unwrap_or_default(),
        team: team_ref(roster.team.as_ref()),
        jersey: doc.jersey,
        position: doc.position.as_deref().and_then(Position::parse),
        stats: PlayerStats {
            games_played: stats.games_played.unwrap_or(0),
            ppg: stats.ppg.unwrap_or(0.0),
            rpg: stats.rpg.unwrap_or(0.0),
            apg: stats.apg.unwrap_or(0.0),
            spg: stats.spg.unwrap_or(0.0),
            bpg: stats.bpg.unwrap_or(0.0),
            mpg: stats.mpg.unwrap_or(0.0),
            fg_pct: stats.fg_pct.unwrap_or(0.0),
            three_pct: stats.three_pct.unwrap_or(0.0),
            ft_pct: stats.ft_pct.unwrap_or(0.0),
        },
        division: division_ref(roster.division.as_ref()),
        season: season_ref(roster.season.as_ref()),
        roster_id: roster.id,
    })
}
