//! Blocking client for the public MLB Stats API.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Default Stats API root.
pub const DEFAULT_STATSAPI_BASE: &str = "https://statsapi.mlb.com/api/v1";

/// Status string the API uses for completed games.
pub const FINAL_STATUS: &str = "Final";

/// Source of team schedules, abstracted so the gatherer can run against fixtures.
pub trait ScheduleSource {
    /// Returns every game for `team_id` between `start` and `end` (inclusive), in API order.
    fn schedule(&self, team_id: u32, start: NaiveDate, end: NaiveDate) -> Result<Vec<ScheduleGame>>;
}

/// One schedule entry, flattened out of the API's nested date/game/teams layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleGame {
    /// API game identifier (`gamePk`).
    pub game_id: u64,
    /// Official calendar date of the game.
    pub game_date: NaiveDate,
    /// Detailed status, e.g. `Final`, `Scheduled`, `Postponed`.
    pub status: String,
    /// Game type code: `R` regular season, `F`/`D`/`L`/`W` postseason rounds, `S` spring.
    pub game_type: String,
    /// Away club identifier.
    pub away_id: u32,
    /// Away club display name.
    pub away_name: String,
    /// Away runs, when reported.
    pub away_score: Option<u32>,
    /// Home club identifier.
    pub home_id: u32,
    /// Home club display name.
    pub home_name: String,
    /// Home runs, when reported.
    pub home_score: Option<u32>,
}

impl ScheduleGame {
    /// Whether the game has been completed.
    pub fn is_final(&self) -> bool {
        self.status == FINAL_STATUS
    }

    /// Whether the game belongs to the regular season.
    pub fn is_regular_season(&self) -> bool {
        self.game_type.eq_ignore_ascii_case("R")
    }

    /// Runs scored by `team_id` and by its opponent, or `None` if the team did not play.
    ///
    /// Missing scores count as zero.
    pub fn score_for(&self, team_id: u32) -> Option<(u32, u32)> {
        let away = self.away_score.unwrap_or(0);
        let home = self.home_score.unwrap_or(0);
        if self.home_id == team_id {
            Some((home, away))
        } else if self.away_id == team_id {
            Some((away, home))
        } else {
            None
        }
    }
}

/// Team metadata returned by the teams endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamInfo {
    /// Team identifier.
    pub id: u32,
    /// Full club name, e.g. `Chicago Cubs`.
    #[serde(default)]
    pub name: String,
    /// Nickname, e.g. `Cubs`.
    #[serde(default)]
    pub team_name: String,
    /// Abbreviation, e.g. `CHC`.
    #[serde(default)]
    pub abbreviation: Option<String>,
    /// City or region name.
    #[serde(default)]
    pub location_name: Option<String>,
}

impl TeamInfo {
    /// Nickname when present, otherwise the full name.
    pub fn display_name(&self) -> &str {
        if self.team_name.trim().is_empty() {
            &self.name
        } else {
            &self.team_name
        }
    }
}

/// One rostered player.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    /// Player reference.
    pub person: Person,
    /// Jersey number as printed by the API (may be blank).
    #[serde(default)]
    pub jersey_number: Option<String>,
    /// Primary position.
    #[serde(default)]
    pub position: Option<Position>,
}

/// Player reference inside a roster entry.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Player identifier.
    pub id: u64,
    /// Display name.
    #[serde(default)]
    pub full_name: String,
}

/// Position reference inside a roster entry.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Position {
    /// Position abbreviation, e.g. `P` or `SS`.
    #[serde(default)]
    pub abbreviation: String,
}

/// Blocking Stats API client.
#[derive(Clone)]
pub struct StatsApiClient {
    client: Client,
    base_url: String,
}

impl StatsApiClient {
    /// Builds a new client rooted at `base_url`.
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        anyhow::ensure!(
            base_url.starts_with("http://") || base_url.starts_with("https://"),
            "stats API base must be an http(s) URL"
        );
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build stats API HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Looks up a team by identifier; `None` when the API knows no such team.
    pub fn lookup_team(&self, team_id: u32) -> Result<Option<TeamInfo>> {
        let url = format!("{}/teams/{}", self.base_url, team_id);
        let Some(response) = self.get_optional::<TeamsResponse>(&url, &[])? else {
            return Ok(None);
        };
        Ok(response.teams.into_iter().find(|team| team.id == team_id))
    }

    /// Fetches the active roster for a team.
    pub fn roster(&self, team_id: u32) -> Result<Vec<RosterEntry>> {
        let url = format!("{}/teams/{}/roster", self.base_url, team_id);
        let response = self
            .get_optional::<RosterResponse>(&url, &[])?
            .unwrap_or_default();
        Ok(response.roster)
    }

    fn get_optional<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .with_context(|| format!("failed to call stats API at {url}"))?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            anyhow::bail!("stats API returned {} for {}: {}", status, url, body);
        }
        let parsed = resp
            .json()
            .with_context(|| format!("failed to parse stats API response from {url}"))?;
        Ok(Some(parsed))
    }
}

impl ScheduleSource for StatsApiClient {
    fn schedule(&self, team_id: u32, start: NaiveDate, end: NaiveDate) -> Result<Vec<ScheduleGame>> {
        let url = format!("{}/schedule", self.base_url);
        let query = [
            ("sportId", "1".to_string()),
            ("teamId", team_id.to_string()),
            ("startDate", start.format("%Y-%m-%d").to_string()),
            ("endDate", end.format("%Y-%m-%d").to_string()),
        ];
        let response = self
            .get_optional::<ScheduleResponse>(&url, &query)?
            .unwrap_or_default();
        Ok(response.into_games())
    }
}

#[derive(Debug, Default, Deserialize)]
struct TeamsResponse {
    #[serde(default)]
    teams: Vec<TeamInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct RosterResponse {
    #[serde(default)]
    roster: Vec<RosterEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct ScheduleResponse {
    #[serde(default)]
    dates: Vec<ScheduleDate>,
}

impl ScheduleResponse {
    fn into_games(self) -> Vec<ScheduleGame> {
        self.dates
            .into_iter()
            .flat_map(|day| {
                let date = day.date;
                day.games.into_iter().map(move |game| game.flatten(date))
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct ScheduleDate {
    date: NaiveDate,
    #[serde(default)]
    games: Vec<RawGame>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGame {
    game_pk: u64,
    #[serde(default)]
    game_type: String,
    #[serde(default)]
    official_date: Option<NaiveDate>,
    #[serde(default)]
    status: RawStatus,
    teams: RawMatchup,
}

impl RawGame {
    fn flatten(self, fallback_date: NaiveDate) -> ScheduleGame {
        ScheduleGame {
            game_id: self.game_pk,
            game_date: self.official_date.unwrap_or(fallback_date),
            status: self.status.detailed_state,
            game_type: self.game_type,
            away_id: self.teams.away.team.id,
            away_name: self.teams.away.team.name,
            away_score: self.teams.away.score,
            home_id: self.teams.home.team.id,
            home_name: self.teams.home.team.name,
            home_score: self.teams.home.score,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStatus {
    #[serde(default)]
    detailed_state: String,
}

#[derive(Debug, Deserialize)]
struct RawMatchup {
    away: RawSide,
    home: RawSide,
}

#[derive(Debug, Deserialize)]
struct RawSide {
    team: RawTeam,
    #[serde(default)]
    score: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawTeam {
    id: u32,
    #[serde(default)]
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEDULE_BODY: &str = r#"{
        "totalGames": 3,
        "dates": [
            {
                "date": "2016-04-04",
                "games": [
                    {
                        "gamePk": 446877,
                        "gameType": "R",
                        "officialDate": "2016-04-04",
                        "status": {"abstractGameState": "Final", "detailedState": "Final"},
                        "teams": {
                            "away": {"score": 9, "team": {"id": 112, "name": "Chicago Cubs"}},
                            "home": {"score": 0, "team": {"id": 108, "name": "Los Angeles Angels"}}
                        }
                    }
                ]
            },
            {
                "date": "2016-04-06",
                "games": [
                    {
                        "gamePk": 446900,
                        "gameType": "R",
                        "status": {"detailedState": "Postponed"},
                        "teams": {
                            "away": {"team": {"id": 112, "name": "Chicago Cubs"}},
                            "home": {"team": {"id": 108, "name": "Los Angeles Angels"}}
                        }
                    },
                    {
                        "gamePk": 446901,
                        "gameType": "R",
                        "officialDate": "2016-04-07",
                        "status": {"detailedState": "Final"},
                        "teams": {
                            "away": {"score": 2, "team": {"id": 112, "name": "Chicago Cubs"}},
                            "home": {"score": 6, "team": {"id": 108, "name": "Los Angeles Angels"}}
                        }
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn flattens_schedule_across_dates() {
        let response: ScheduleResponse = serde_json::from_str(SCHEDULE_BODY).expect("parse");
        let games = response.into_games();
        assert_eq!(games.len(), 3);
        assert_eq!(games[0].game_id, 446877);
        assert_eq!(games[0].away_name, "Chicago Cubs");
        assert_eq!(games[0].away_score, Some(9));
        assert!(games[0].is_final());

        // officialDate missing: falls back to the enclosing date
        assert_eq!(
            games[1].game_date,
            NaiveDate::from_ymd_opt(2016, 4, 6).expect("date")
        );
        assert_eq!(games[1].home_score, None);
        assert!(!games[1].is_final());

        assert_eq!(
            games[2].game_date,
            NaiveDate::from_ymd_opt(2016, 4, 7).expect("date")
        );
    }

    #[test]
    fn empty_schedule_body_yields_no_games() {
        let response: ScheduleResponse =
            serde_json::from_str(r#"{"totalGames": 0}"#).expect("parse");
        assert!(response.into_games().is_empty());
    }

    #[test]
    fn score_for_orients_by_team() {
        let response: ScheduleResponse = serde_json::from_str(SCHEDULE_BODY).expect("parse");
        let games = response.into_games();
        assert_eq!(games[0].score_for(112), Some((9, 0)));
        assert_eq!(games[0].score_for(108), Some((0, 9)));
        assert_eq!(games[0].score_for(147), None);
        assert_eq!(games[1].score_for(112), Some((0, 0)));
    }

    #[test]
    fn parses_team_and_roster_payloads() {
        let teams: TeamsResponse = serde_json::from_str(
            r#"{"teams": [{"id": 147, "name": "New York Yankees", "teamName": "Yankees", "abbreviation": "NYY"}]}"#,
        )
        .expect("teams");
        assert_eq!(teams.teams[0].display_name(), "Yankees");
        assert_eq!(teams.teams[0].abbreviation.as_deref(), Some("NYY"));

        let roster: RosterResponse = serde_json::from_str(
            r#"{"roster": [
                {"person": {"id": 592450, "fullName": "Aaron Judge"}, "jerseyNumber": "99", "position": {"abbreviation": "RF"}},
                {"person": {"id": 1, "fullName": "Someone"}}
            ]}"#,
        )
        .expect("roster");
        assert_eq!(roster.roster.len(), 2);
        assert_eq!(roster.roster[0].person.full_name, "Aaron Judge");
        assert!(roster.roster[1].position.is_none());
    }

    #[test]
    fn display_name_falls_back_to_full_name() {
        let team = TeamInfo {
            id: 1,
            name: "Somewhere Nine".to_string(),
            team_name: String::new(),
            abbreviation: None,
            location_name: None,
        };
        assert_eq!(team.display_name(), "Somewhere Nine");
    }

    #[test]
    fn rejects_non_http_base() {
        assert!(StatsApiClient::new("ftp://example".to_string(), Duration::from_secs(1)).is_err());
    }
}
