//! Contract models for the league service
//!
//! These models are transport-agnostic and shared by both store families.
//! NO serde derives - stores and transports map into these shapes.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Declares a closed string-backed enumeration with its wire names.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// All variants in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire name stored in both backing stores
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            /// Parse a wire name, `None` when unknown
            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $($wire => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(
    /// Season lifecycle
    SeasonStatus {
        Active => "active",
        Completed => "completed",
        Upcoming => "upcoming",
        Cancelled => "cancelled",
    }
);

string_enum!(
    /// Division age group
    AgeGroup {
        Ascent => "ascent",
        Supreme => "supreme",
        Premier => "premier",
        Diamond => "diamond",
    }
);

string_enum!(
    /// Team standing with the league
    TeamStatus {
        Active => "active",
        Inactive => "inactive",
        Pending => "pending",
        Suspended => "suspended",
    }
);

string_enum!(
    /// Game status. `scheduled -> live -> completed`, with `cancelled` and
    /// `postponed` reachable from `scheduled` or `live`; not enforced here.
    GameStatus {
        Scheduled => "scheduled",
        Live => "live",
        Completed => "completed",
        Cancelled => "cancelled",
        Postponed => "postponed",
    }
);

string_enum!(
    /// Player position
    Position {
        PointGuard => "PG",
        ShootingGuard => "SG",
        SmallForward => "SF",
        PowerForward => "PF",
        Center => "C",
        Player => "P",
    }
);

string_enum!(
    /// Registration pricing tier
    Package {
        FullSeason => "full-season",
        TwoSession => "two-session",
        PayPerSession => "pay-per-session",
    }
);

string_enum!(
    /// Registration review status
    RegistrationStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        Cancelled => "cancelled",
    }
);

string_enum!(
    /// Payment state of a registration checkout
    PaymentStatus {
        Pending => "pending",
        Paid => "paid",
        Failed => "failed",
        Refunded => "refunded",
    }
);

string_enum!(
    /// State of a roster payment installment
    TeamPaymentStatus {
        Pending => "pending",
        Paid => "paid",
        Overdue => "overdue",
        Cancelled => "cancelled",
    }
);

string_enum!(
    /// Stat category used for leader boards
    StatCategory {
        Points => "ppg",
        Rebounds => "rpg",
        Assists => "apg",
        Steals => "spg",
        Blocks => "bpg",
        Minutes => "mpg",
    }
);

impl Package {
    /// Number of sessions a registration must select up front.
    /// Full-season registrations select none; sessions are resolved at approval.
    pub fn required_session_count(&self) -> usize {
        match self {
            Package::FullSeason => 0,
            Package::TwoSession => 2,
            Package::PayPerSession => 1,
        }
    }
}

// ===== Season structure =====

/// League season
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Season {
    pub id: String,
    pub name: String,
    pub year: i32,
    pub status: SeasonStatus,
    pub is_active: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// New season input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSeason {
    pub name: String,
    pub year: i32,
    pub status: SeasonStatus,
    pub is_active: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Lightweight season reference embedded in other models
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeasonRef {
    pub id: String,
    pub name: String,
}

/// Conference reference carried by a division
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConferenceRef {
    pub id: String,
    pub name: String,
}

/// Competitive division. Division -> Conference -> Season is a read-only chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Division {
    pub id: String,
    pub name: String,
    pub age_group: AgeGroup,
    pub conference: Option<ConferenceRef>,
    pub season: Option<SeasonRef>,
}

/// New division input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDivision {
    pub name: String,
    pub age_group: AgeGroup,
    pub conference_id: Option<String>,
}

/// Lightweight division reference embedded in other models
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DivisionRef {
    pub id: String,
    pub name: String,
}

/// Name used when a division relation was not returned
pub const UNKNOWN_DIVISION: &str = "unknown";

impl DivisionRef {
    pub fn unknown() -> Self {
        Self {
            id: String::new(),
            name: UNKNOWN_DIVISION.to_string(),
        }
    }
}

/// Join of a season and a division; the unit a roster registers against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonDivision {
    pub id: String,
    pub season_id: String,
    pub division_id: String,
}

/// Scheduling window within a season
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub season_id: String,
    pub name: String,
    pub sequence: i32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// New session input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub season_id: String,
    pub name: String,
    pub sequence: i32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

// ===== Teams and rosters =====

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TeamColors {
    pub primary: String,
    pub secondary: String,
}

/// Denormalized snapshot of where a team currently plays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamPlacement {
    pub season: SeasonRef,
    pub division: DivisionRef,
}

/// Team; identity is independent of season
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub logo: Option<String>,
    pub location: String,
    pub colors: TeamColors,
    pub status: TeamStatus,
    pub current: Option<TeamPlacement>,
}

/// New team input; omitted fields take defaults
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewTeam {
    pub name: String,
    pub short_name: Option<String>,
    pub logo: Option<String>,
    pub location: Option<String>,
    pub colors: Option<TeamColors>,
    pub status: Option<TeamStatus>,
}

/// Partial team update
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TeamUpdate {
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub logo: Option<String>,
    pub location: Option<String>,
    pub colors: Option<TeamColors>,
    pub status: Option<TeamStatus>,
}

/// Lightweight team reference embedded in games and players
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TeamRef {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub logo: Option<String>,
}

/// Team x SeasonDivision association
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    pub id: String,
    pub team_id: String,
    pub season_division_id: String,
    pub season_id: String,
    pub division_id: String,
}

/// Link between a roster and a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterSessionEnrollment {
    pub id: String,
    pub roster_id: String,
    pub session_id: String,
    pub auto_enrolled: bool,
    pub enrolled_at: DateTime<Utc>,
}

// ===== Games =====

/// Game venue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Venue {
    pub id: String,
    pub name: String,
    pub address: String,
    pub city: String,
}

impl Venue {
    /// Placeholder used when a game has no venue relation
    pub fn tbd() -> Self {
        Self {
            id: "tbd".to_string(),
            name: "TBD".to_string(),
            address: String::new(),
            city: String::new(),
        }
    }
}

/// Scheduled game between two rosters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub id: String,
    /// Derived from team names, never stored
    pub title: String,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub venue: Venue,
    pub home_team: TeamRef,
    pub away_team: TeamRef,
    pub home_roster_id: Option<String>,
    pub away_roster_id: Option<String>,
    pub division: DivisionRef,
    pub season: SeasonRef,
    pub session_id: Option<String>,
    pub status: GameStatus,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
}

/// Build the display title of a game
pub fn game_title(home: &TeamRef, away: &TeamRef) -> String {
    let name = |team: &TeamRef| {
        if team.name.is_empty() {
            "TBD".to_string()
        } else {
            team.name.clone()
        }
    };
    format!("{} vs {}", name(home), name(away))
}

/// New game input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGame {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub venue_id: Option<String>,
    pub home_roster_id: String,
    pub away_roster_id: String,
    pub session_id: Option<String>,
    pub status: GameStatus,
}

/// Partial game update; the status is accepted as given
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GameUpdate {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub venue_id: Option<String>,
    pub status: Option<GameStatus>,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
}

/// Play-by-play entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameEvent {
    pub id: String,
    pub game_id: String,
    pub team_id: String,
    pub player_id: Option<String>,
    pub event_type: String,
    pub quarter: i32,
    pub game_time: String,
    pub points: i32,
    /// Strictly increasing per game, starting at 1
    pub sequence_number: i64,
    pub created_at: DateTime<Utc>,
}

/// New game event input; the sequence number is assigned by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGameEvent {
    pub game_id: String,
    pub team_id: String,
    pub player_id: Option<String>,
    pub event_type: String,
    pub quarter: i32,
    pub game_time: String,
    pub points: i32,
}

/// Game official
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Official {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub certification_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewOfficial {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub certification_level: Option<String>,
}

// ===== Players =====

/// Precomputed per-roster averages
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerStats {
    pub games_played: i32,
    pub ppg: f64,
    pub rpg: f64,
    pub apg: f64,
    pub spg: f64,
    pub bpg: f64,
    pub mpg: f64,
    pub fg_pct: f64,
    pub three_pct: f64,
    pub ft_pct: f64,
}

impl PlayerStats {
    /// Value of a leader-board category
    pub fn value(&self, category: StatCategory) -> f64 {
        match category {
            StatCategory::Points => self.ppg,
            StatCategory::Rebounds => self.rpg,
            StatCategory::Assists => self.apg,
            StatCategory::Steals => self.spg,
            StatCategory::Blocks => self.bpg,
            StatCategory::Minutes => self.mpg,
        }
    }
}

/// Player as seen through a roster membership
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub team: TeamRef,
    pub jersey: Option<i32>,
    pub position: Option<Position>,
    pub stats: PlayerStats,
    pub division: DivisionRef,
    pub season: SeasonRef,
    pub roster_id: Option<String>,
}

/// New player input, placed on a roster
#[derive(Debug, Clone, PartialEq)]
pub struct NewPlayer {
    pub name: String,
    pub roster_id: String,
    pub jersey: Option<i32>,
    pub position: Option<Position>,
    pub stats: PlayerStats,
}

/// Top players per category
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatLeaders {
    pub points: Vec<Player>,
    pub rebounds: Vec<Player>,
    pub assists: Vec<Player>,
    pub steals: Vec<Player>,
    pub blocks: Vec<Player>,
}

// ===== Registrations and payments =====

/// Team registration submitted through the wizard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRegistration {
    pub id: String,
    pub user_id: String,
    pub team_name: String,
    pub city: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub division_preference: String,
    pub selected_package: Package,
    pub selected_session_ids: Vec<String>,
    pub status: RegistrationStatus,
    pub payment_status: PaymentStatus,
    pub team_id: Option<String>,
    pub payment_session_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration request as submitted; the package is kept raw until validated
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegistrationRequest {
    pub user_id: String,
    pub team_name: String,
    pub city: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub division_preference: String,
    pub selected_package: String,
    pub selected_session_ids: Vec<String>,
    pub notes: Option<String>,
}

/// Validated registration ready to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTeamRegistration {
    pub user_id: String,
    pub team_name: String,
    pub city: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub division_preference: String,
    pub selected_package: Package,
    pub selected_session_ids: Vec<String>,
    pub status: RegistrationStatus,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
}

/// Roster payment installment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamPayment {
    pub id: String,
    pub roster_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub status: TeamPaymentStatus,
    pub due_date: Option<NaiveDate>,
    pub paid_at: Option<DateTime<Utc>>,
    pub provider_session_id: Option<String>,
    pub provider_payment_id: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTeamPayment {
    pub roster_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub status: TeamPaymentStatus,
    pub due_date: Option<NaiveDate>,
    pub paid_at: Option<DateTime<Utc>>,
    pub provider_session_id: Option<String>,
    pub provider_payment_id: Option<String>,
    pub description: Option<String>,
}

/// Completed checkout reported by the payment provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutCompletion {
    pub registration_id: String,
    pub provider_session_id: String,
    pub provider_payment_id: Option<String>,
    pub amount_cents: Option<i64>,
    pub currency: Option<String>,
}

/// Money totals for one roster
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaymentSummary {
    pub roster_id: String,
    pub total_cents: i64,
    pub paid_cents: i64,
    /// Sum of every installment not yet paid
    pub outstanding_cents: i64,
    pub overdue_cents: i64,
    pub payment_count: usize,
    pub next_due: Option<NaiveDate>,
}

/// Team line in a standings table
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub team: TeamRef,
    pub wins: u32,
    pub losses: u32,
    pub points_for: i64,
    pub points_against: i64,
    pub win_pct: f64,
}

impl Standing {
    pub fn point_differential(&self) -> i64 {
        self.points_for - self.points_against
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_enum_round_trip_names() {
        assert_eq!(Package::parse("two-session"), Some(Package::TwoSession));
        assert_eq!(Package::TwoSession.as_str(), "two-session");
        assert_eq!(Position::parse("PG"), Some(Position::PointGuard));
        assert_eq!(GameStatus::parse("halftime"), None);
        assert_eq!(RegistrationStatus::ALL.len(), 4);
    }

    #[test]
    fn test_required_session_count() {
        assert_eq!(Package::FullSeason.required_session_count(), 0);
        assert_eq!(Package::TwoSession.required_session_count(), 2);
        assert_eq!(Package::PayPerSession.required_session_count(), 1);
    }

    #[test]
    fn test_game_title_uses_tbd_for_missing_names() {
        let home = TeamRef {
            name: "Hawks".to_string(),
            ..Default::default()
        };
        assert_eq!(game_title(&home, &TeamRef::default()), "Hawks vs TBD");
    }
}
