//! Batched relation loading
//!
//! Every query variant of a repository funnels its rows through these
//! loaders, which resolve relations with one `IN (...)` query per related
//! table and produce the canonical records consumed by the mapper.

use super::entity::{
    conference, division, game, player, roster, roster_player, season, season_division, team,
    venue,
};
use super::mapper::{DivisionRecord, GameRecord, PlayerRecord, RosterRecord, TeamRecord};
use anyhow::Result;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::collections::{BTreeSet, HashMap};

fn unique_ids<'a>(ids: impl Iterator<Item = &'a String>) -> Vec<String> {
    ids.cloned().collect::<BTreeSet<_>>().into_iter().collect()
}

fn index_by<T>(rows: Vec<T>, key: impl Fn(&T) -> String) -> HashMap<String, T> {
    rows.into_iter().map(|row| (key(&row), row)).collect()
}

/// Resolve rosters with team, season division, season and division
pub async fn roster_records(
    db: &DatabaseConnection,
    roster_ids: &[String],
) -> Result<HashMap<String, RosterRecord>> {
    if roster_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rosters = roster::Entity::find()
        .filter(roster::Column::Id.is_in(unique_ids(roster_ids.iter())))
        .all(db)
        .await?;
    resolve_rosters(db, rosters).await
}

/// Resolve already-loaded roster rows
pub async fn resolve_rosters(
    db: &DatabaseConnection,
    rosters: Vec<roster::Model>,
) -> Result<HashMap<String, RosterRecord>> {
    if rosters.is_empty() {
        return Ok(HashMap::new());
    }

    let team_ids = unique_ids(rosters.iter().map(|r| &r.team_id));
    let teams = index_by(
        team::Entity::find()
            .filter(team::Column::Id.is_in(team_ids))
            .all(db)
            .await?,
        |t| t.id.clone(),
    );

    let link_ids = unique_ids(rosters.iter().map(|r| &r.season_division_id));
    let links = index_by(
        season_division::Entity::find()
            .filter(season_division::Column::Id.is_in(link_ids))
            .all(db)
            .await?,
        |l| l.id.clone(),
    );

    let season_ids = unique_ids(links.values().map(|l| &l.season_id));
    let seasons = index_by(
        season::Entity::find()
            .filter(season::Column::Id.is_in(season_ids))
            .all(db)
            .await?,
        |s| s.id.clone(),
    );

    let division_ids = unique_ids(links.values().map(|l| &l.division_id));
    let divisions = index_by(
        division::Entity::find()
            .filter(division::Column::Id.is_in(division_ids))
            .all(db)
            .await?,
        |d| d.id.clone(),
    );

    Ok(rosters
        .into_iter()
        .map(|roster| {
            let link = links.get(&roster.season_division_id).cloned();
            let record = RosterRecord {
                team: teams.get(&roster.team_id).cloned(),
                season: link.as_ref().and_then(|l| seasons.get(&l.season_id).cloned()),
                division: link
                    .as_ref()
                    .and_then(|l| divisions.get(&l.division_id).cloned()),
                season_division: link,
                roster,
            };
            (record.roster.id.clone(), record)
        })
        .collect())
}

/// Resolve games with venue and both rosters, preserving input order
pub async fn game_records(db: &DatabaseConnection, games: Vec<game::Model>) -> Result<Vec<GameRecord>> {
    if games.is_empty() {
        return Ok(Vec::new());
    }

    let venue_ids = unique_ids(games.iter().filter_map(|g| g.venue_id.as_ref()));
    let venues = if venue_ids.is_empty() {
        HashMap::new()
    } else {
        index_by(
            venue::Entity::find()
                .filter(venue::Column::Id.is_in(venue_ids))
                .all(db)
                .await?,
            |v| v.id.clone(),
        )
    };

    let roster_ids: Vec<String> = games
        .iter()
        .flat_map(|g| [g.home_roster_id.clone(), g.away_roster_id.clone()])
        .collect();
    let rosters = roster_records(db, &roster_ids).await?;

    Ok(games
        .into_iter()
        .map(|game| GameRecord {
            venue: game.venue_id.as_ref().and_then(|id| venues.get(id).cloned()),
            home: rosters.get(&game.home_roster_id).cloned(),
            away: rosters.get(&game.away_roster_id).cloned(),
            game,
        })
        .collect())
}

/// Resolve teams with the latest roster for their placement snapshot
pub async fn team_records(db: &DatabaseConnection, teams: Vec<team::Model>) -> Result<Vec<TeamRecord>> {
    if teams.is_empty() {
        return Ok(Vec::new());
    }

    let team_ids = unique_ids(teams.iter().map(|t| &t.id));
    let rosters = roster::Entity::find()
        .filter(roster::Column::TeamId.is_in(team_ids))
        .order_by_desc(roster::Column::CreatedAt)
        .order_by_desc(roster::Column::Id)
        .all(db)
        .await?;

    // Rows arrive newest first; keep the first roster seen per team
    let mut latest: HashMap<String, roster::Model> = HashMap::new();
    for roster in rosters {
        latest.entry(roster.team_id.clone()).or_insert(roster);
    }
    let resolved = resolve_rosters(db, latest.into_values().collect()).await?;
    let by_team: HashMap<String, RosterRecord> = resolved
        .into_values()
        .map(|r| (r.roster.team_id.clone(), r))
        .collect();

    Ok(teams
        .into_iter()
        .map(|team| TeamRecord {
            latest_roster: by_team.get(&team.id).cloned(),
            team,
        })
        .collect())
}

/// Resolve roster memberships into player records, one per membership
pub async fn player_records(
    db: &DatabaseConnection,
    memberships: Vec<roster_player::Model>,
) -> Result<Vec<PlayerRecord>> {
    if memberships.is_empty() {
        return Ok(Vec::new());
    }

    let player_ids = unique_ids(memberships.iter().map(|m| &m.player_id));
    let players = index_by(
        player::Entity::find()
            .filter(player::Column::Id.is_in(player_ids))
            .all(db)
            .await?,
        |p| p.id.clone(),
    );
    let roster_ids: Vec<String> = memberships.iter().map(|m| m.roster_id.clone()).collect();
    let rosters = roster_records(db, &roster_ids).await?;

    Ok(memberships
        .into_iter()
        .filter_map(|membership| {
            // Dangling memberships are skipped rather than failing the listing
            let player = players.get(&membership.player_id).cloned()?;
            Some(PlayerRecord {
                roster: rosters.get(&membership.roster_id).cloned(),
                membership: Some(membership),
                player,
            })
        })
        .collect())
}

/// Resolve divisions with conference and season
pub async fn division_records(
    db: &DatabaseConnection,
    divisions: Vec<division::Model>,
) -> Result<Vec<DivisionRecord>> {
    if divisions.is_empty() {
        return Ok(Vec::new());
    }

    let conference_ids = unique_ids(divisions.iter().filter_map(|d| d.conference_id.as_ref()));
    let conferences = if conference_ids.is_empty() {
        HashMap::new()
    } else {
        index_by(
            conference::Entity::find()
                .filter(conference::Column::Id.is_in(conference_ids))
                .all(db)
                .await?,
            |c| c.id.clone(),
        )
    };

    let season_ids = unique_ids(conferences.values().map(|c| &c.season_id));
    let seasons = if season_ids.is_empty() {
        HashMap::new()
    } else {
        index_by(
            season::Entity::find()
                .filter(season::Column::Id.is_in(season_ids))
                .all(db)
                .await?,
            |s| s.id.clone(),
        )
    };

    Ok(divisions
        .into_iter()
        .map(|division| {
            let conference = division
                .conference_id
                .as_ref()
                .and_then(|id| conferences.get(id).cloned());
            DivisionRecord {
                season: conference
                    .as_ref()
                    .and_then(|c| seasons.get(&c.season_id).cloned()),
                conference,
                division,
            }
        })
        .collect())
}
