//! Query text for the content store
//!
//! One projection per entity. Every query variant of a repository reuses the
//! projection of its entity so the transform sees a single document shape.

pub const SEASON_PROJECTION: &str =
    "{ _id, name, year, status, isActive, startDate, endDate }";

pub const DIVISION_PROJECTION: &str = "{ _id, name, ageGroup, \
     conference->{ _id, name, season->{ _id, name } } }";

pub const TEAM_PROJECTION: &str = "{ _id, name, shortName, \"logo\": coalesce(logo.asset->url, logoUrl), \
     location, colors, status, currentSeason->{ _id, name }, currentDivision->{ _id, name } }";

const ROSTER_PROJECTION: &str = "{ _id, \
     team->{ _id, name, shortName, \"logo\": coalesce(logo.asset->url, logoUrl) }, \
     season->{ _id, name }, division->{ _id, name } }";

pub fn game_projection() -> String {
    format!(
        "{{ _id, date, time, venue->{{ _id, name, address, city }}, \
         homeRoster->{ROSTER_PROJECTION}, awayRoster->{ROSTER_PROJECTION}, \
         \"sessionId\": session._ref, status, homeScore, awayScore }}"
    )
}

pub fn player_projection() -> String {
    format!("{{ _id, name, jersey, position, stats, roster->{ROSTER_PROJECTION} }}")
}

/// `*[filter] | order(...) projection` with an optional slice
pub fn list(filter: &str, order: &str, projection: &str, limit: Option<u64>) -> String {
    let slice = limit.map(|n| format!("[0...{n}]")).unwrap_or_default();
    format!("*[{filter}] | order({order}){slice} {projection}")
}

/// First document matching `_type == doc_type && _id == $id`
pub fn by_id(doc_type: &str, projection: &str) -> String {
    format!("*[_type == \"{doc_type}\" && _id == $id][0] {projection}")
}

/// Wildcard pattern for the `match` operator
pub fn match_pattern(term: &str) -> String {
    format!("*{}*", term.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_with_limit() {
        let query = list("_type == \"game\"", "date asc", "{ _id }", Some(5));
        assert_eq!(query, "*[_type == \"game\"] | order(date asc)[0...5] { _id }");
    }

    #[test]
    fn test_game_projection_dereferences_both_rosters() {
        let projection = game_projection();
        assert!(projection.contains("homeRoster->{ _id, team->"));
        assert!(projection.contains("awayRoster->{ _id, team->"));
    }
}
