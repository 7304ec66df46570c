use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub type TeamId = i64;
pub type GroupLabel = String;
pub type GroupTable = IndexMap<TeamId, StandingsRow>;
pub type Standings = IndexMap<GroupLabel, GroupTable>;
pub type RankedStandings = IndexMap<GroupLabel, Vec<StandingsRow>>;

pub const UNKNOWN_TEAM_NAME: &str = "Unknown";
pub const UNGROUPED_LABEL: &str = "Sin grupo";

/// One fixture of a venue as seen by the standings table: both sides, the
/// group each side is registered in and, once played, the final score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub home_goals: Option<u32>,
    pub away_goals: Option<u32>,
    pub home_team_name: Option<String>,
    pub away_team_name: Option<String>,
    pub home_group: Option<String>,
    pub away_group: Option<String>,
}

impl MatchRecord {
    /// The whole fixture is filed under the home side's group.
    pub fn group_label(&self) -> &str {
        self.home_group.as_deref().unwrap_or(UNGROUPED_LABEL)
    }

    pub fn away_group_label(&self) -> &str {
        self.away_group.as_deref().unwrap_or(UNGROUPED_LABEL)
    }

    pub fn score(&self) -> Option<(u32, u32)> {
        let (Some(home), Some(away)) = (self.home_goals, self.away_goals) else {
            return None;
        };
        Some((home, away))
    }

    pub fn is_played(&self) -> bool {
        self.score().is_some()
    }

    fn home_name(&self) -> String {
        self.home_team_name
            .clone()
            .unwrap_or_else(|| UNKNOWN_TEAM_NAME.to_string())
    }

    fn away_name(&self) -> String {
        self.away_team_name
            .clone()
            .unwrap_or_else(|| UNKNOWN_TEAM_NAME.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsRow {
    pub id: TeamId,
    pub name: String,
    pub points: u32,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i64,
}

impl StandingsRow {
    pub fn new(id: TeamId, name: String) -> Self {
        Self {
            id,
            name,
            points: 0,
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            goals_for: 0,
            goals_against: 0,
            goal_difference: 0,
        }
    }

    fn record(&mut self, scored: u32, conceded: u32) {
        self.played += 1;
        self.goals_for += scored;
        self.goals_against += conceded;
        self.goal_difference = i64::from(self.goals_for) - i64::from(self.goals_against);
        match scored.cmp(&conceded) {
            Ordering::Greater => {
                self.won += 1;
                self.points += 3;
            }
            Ordering::Less => self.lost += 1,
            Ordering::Equal => {
                self.drawn += 1;
                self.points += 1;
            }
        }
    }
}

/// Builds the per-group table for one venue.
///
/// Every team named by a fixture gets a row, even when none of its fixtures
/// has a score yet. Groups and teams keep the order in which they were first
/// seen; the counters do not depend on the order of `matches`.
pub fn compute_standings(matches: &[MatchRecord]) -> Standings {
    let mut standings = Standings::new();

    for m in matches {
        let table = standings.entry(m.group_label().to_string()).or_default();
        table
            .entry(m.home_team_id)
            .or_insert_with(|| StandingsRow::new(m.home_team_id, m.home_name()));
        table
            .entry(m.away_team_id)
            .or_insert_with(|| StandingsRow::new(m.away_team_id, m.away_name()));

        let Some((home_goals, away_goals)) = m.score() else {
            continue;
        };

        if let Some(home) = table.get_mut(&m.home_team_id) {
            home.record(home_goals, away_goals);
        }
        if let Some(away) = table.get_mut(&m.away_team_id) {
            away.record(away_goals, home_goals);
        }
    }

    standings
}

/// Table order: points, goal difference, goals scored, then name and id so
/// ties always come out the same way.
pub fn ranked_rows(table: &GroupTable) -> Vec<&StandingsRow> {
    let mut rows = table.values().collect::<Vec<_>>();
    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(b.goal_difference.cmp(&a.goal_difference))
            .then(b.goals_for.cmp(&a.goals_for))
            .then_with(|| a.name.cmp(&b.name))
            .then(a.id.cmp(&b.id))
    });
    rows
}

pub fn rank_standings(standings: &Standings) -> RankedStandings {
    standings
        .iter()
        .map(|(group, table)| {
            let rows = ranked_rows(table).into_iter().cloned().collect();
            (group.clone(), rows)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMismatch {
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub home_group: String,
    pub away_group: String,
}

/// Fixtures whose sides are registered in different groups. The away team
/// of such a fixture is still counted under the home group.
pub fn group_mismatches(matches: &[MatchRecord]) -> Vec<GroupMismatch> {
    matches
        .iter()
        .filter(|m| m.group_label() != m.away_group_label())
        .map(|m| GroupMismatch {
            home_team_id: m.home_team_id,
            away_team_id: m.away_team_id,
            home_group: m.group_label().to_string(),
            away_group: m.away_group_label().to_string(),
        })
        .collect()
}
