use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A player document as stored under `u:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    #[serde(default)]
    pub team: Option<Team>,
    #[serde(default)]
    pub stats: Option<Statistics>,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub email: String,
}

impl Player {
    /// Create a player with a freshly generated identifier.
    pub fn new(email: impl Into<String>, age: u32, number: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            team: None,
            stats: None,
            age,
            number: number.into(),
            email: email.into(),
        }
    }

    pub fn with_team(mut self, team: Team) -> Self {
        self.team = Some(team);
        self
    }

    pub fn with_stats(mut self, stats: Statistics) -> Self {
        self.stats = Some(stats);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub loses: u32,
}

/// Where a game was played and who won it. `winner` stays empty for
/// unplayed or drawn games.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub location: String,
    #[serde(default)]
    pub winner: Option<Team>,
}

/// Games of one season in the order they were played.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    #[serde(default)]
    pub games: Vec<Game>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(default)]
    pub goals: u32,
    #[serde(default)]
    pub assists: u32,
}
