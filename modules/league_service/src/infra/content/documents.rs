//! Raw content documents as returned by the projections in `queries`
//!
//! Every field is optional: the content store omits keys that were never set
//! and returns `null` for dangling references.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RefDoc {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeasonDoc {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub year: Option<i32>,
    pub status: Option<String>,
    pub is_active: Option<bool>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConferenceDoc {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub season: Option<RefDoc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DivisionDoc {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub age_group: Option<String>,
    pub conference: Option<ConferenceDoc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColorsDoc {
    pub primary: Option<String>,
    pub secondary: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamDoc {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub logo: Option<String>,
    pub location: Option<String>,
    pub colors: Option<ColorsDoc>,
    pub status: Option<String>,
    pub current_season: Option<RefDoc>,
    pub current_division: Option<RefDoc>,
}

/// Roster dereferenced to its team, season and division
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RosterDoc {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub team: Option<TeamDoc>,
    pub season: Option<RefDoc>,
    pub division: Option<RefDoc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VenueDoc {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameDoc {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub venue: Option<VenueDoc>,
    pub home_roster: Option<RosterDoc>,
    pub away_roster: Option<RosterDoc>,
    pub session_id: Option<String>,
    pub status: Option<String>,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsDoc {
    pub games_played: Option<i32>,
    pub ppg: Option<f64>,
    pub rpg: Option<f64>,
    pub apg: Option<f64>,
    pub spg: Option<f64>,
    pub bpg: Option<f64>,
    pub mpg: Option<f64>,
    pub fg_pct: Option<f64>,
    pub three_pct: Option<f64>,
    pub ft_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerDoc {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub jersey: Option<i32>,
    pub position: Option<String>,
    pub stats: Option<StatsDoc>,
    pub roster: Option<RosterDoc>,
}
