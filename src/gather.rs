//! Season-by-season snippet gathering for a single club.

use std::ops::RangeInclusive;
use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::statsapi::{ScheduleGame, ScheduleSource, TeamInfo};

/// Stats API identifier of the Chicago Cubs.
pub const CUBS_TEAM_ID: u32 = 112;

/// Earliest season the collector asks for by default.
pub const DEFAULT_START_YEAR: i32 = 1900;

const CUBS_HISTORY: &str = "The Chicago Cubs are one of baseball's oldest and most historic franchises. \
Founded in 1876 as the Chicago White Stockings, they became the Cubs in 1903. \
They play their home games at historic Wrigley Field, which opened in 1914. \
The Cubs have won three World Series championships (1907, 1908, and 2016), \
breaking a 108-year championship drought with their 2016 victory. \
They've won 17 National League pennants and are known for legendary players \
like Ernie Banks, Ron Santo, Billy Williams, and Ryne Sandberg.";

/// Club being collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamProfile {
    /// Stats API team identifier.
    pub id: u32,
    /// Name used inside snippets (nickname, e.g. `Cubs`).
    pub name: String,
    /// Free-form history blurbs emitted ahead of the seasons.
    pub history: Vec<String>,
    /// Metadata tag stored alongside every vector.
    pub source_tag: String,
}

impl TeamProfile {
    /// Built-in profile for the Chicago Cubs.
    pub fn chicago_cubs() -> Self {
        Self {
            id: CUBS_TEAM_ID,
            name: "Cubs".to_string(),
            history: vec![CUBS_HISTORY.to_string()],
            source_tag: "mlb-chicago-cubs".to_string(),
        }
    }

    /// Profile for any club looked up through the Stats API. No history is attached.
    pub fn from_info(info: &TeamInfo) -> Self {
        Self {
            id: info.id,
            name: info.display_name().to_string(),
            history: Vec::new(),
            source_tag: format!("mlb-{}", slugify(&info.name)),
        }
    }
}

fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Walks seasons for one club and renders plain-text snippets.
pub struct SeasonGatherer<S> {
    source: S,
    team: TeamProfile,
    year_delay: Duration,
}

impl<S: ScheduleSource> SeasonGatherer<S> {
    /// Creates a gatherer that sleeps `year_delay` between seasons.
    pub fn new(source: S, team: TeamProfile, year_delay: Duration) -> Self {
        Self {
            source,
            team,
            year_delay,
        }
    }

    /// Team being gathered.
    pub fn team(&self) -> &TeamProfile {
        &self.team
    }

    /// History blurbs followed by every season in `years`, in order.
    ///
    /// A failed season query never aborts the walk; that season only contributes its header.
    pub fn gather(&self, years: RangeInclusive<i32>) -> Vec<String> {
        let mut snippets = self.team.history.clone();
        let total = years.clone().count();
        info!(
            team = %self.team.name,
            seasons = total,
            "gathering season data"
        );
        for (done, year) in years.enumerate() {
            snippets.extend(self.season(year));
            if (done + 1) % 25 == 0 {
                info!("processed {} of {} seasons", done + 1, total);
            }
            if !self.year_delay.is_zero() {
                thread::sleep(self.year_delay);
            }
        }
        snippets
    }

    /// Snippets for a single season: header, record, bookend games and postseason block.
    pub fn season(&self, year: i32) -> Vec<String> {
        let mut snippets = vec![format!("=== {year} Season ===")];
        let (Some(start), Some(end)) = (ymd(year, 1, 1), ymd(year, 12, 31)) else {
            warn!(year, "season year out of calendar range; skipping");
            return snippets;
        };
        match self.source.schedule(self.team.id, start, end) {
            Ok(games) => {
                debug!(year, games = games.len(), "fetched season schedule");
                snippets.extend(summarize_season(&self.team, year, &games));
            }
            Err(err) => {
                warn!(year, "error fetching {year} season data: {err:#}");
            }
        }
        snippets
    }
}

/// Renders the record, bookend games and postseason block for one season's schedule.
pub fn summarize_season(team: &TeamProfile, year: i32, games: &[ScheduleGame]) -> Vec<String> {
    let mut snippets = Vec::new();
    if let Some(line) = season_record(team, year, games) {
        snippets.push(line);
    }
    snippets.extend(bookend_games(year, games));
    snippets.extend(postseason_block(team, year, games));
    snippets
}

/// Win-loss line, or `None` when the club completed no decided games.
pub fn season_record(team: &TeamProfile, year: i32, games: &[ScheduleGame]) -> Option<String> {
    let (mut wins, mut losses) = (0u32, 0u32);
    for game in games.iter().filter(|game| game.is_final()) {
        match game.score_for(team.id) {
            Some((ours, theirs)) if ours > theirs => wins += 1,
            Some((ours, theirs)) if ours < theirs => losses += 1,
            _ => {}
        }
    }
    if wins + losses == 0 {
        return None;
    }
    Some(format!(
        "In {year}, the {} finished with a {wins}-{losses} record.",
        team.name
    ))
}

/// Opening-day and final completed games between March 1 and November 30.
///
/// Every other game is dropped on purpose to keep the index small.
pub fn bookend_games(year: i32, games: &[ScheduleGame]) -> Vec<String> {
    let completed: Vec<&ScheduleGame> = games
        .iter()
        .filter(|game| game.is_final() && in_window(game, year, (3, 1), (11, 30)))
        .collect();
    match completed.as_slice() {
        [] => Vec::new(),
        [only] => vec![game_result(only)],
        [first, .., last] => vec![game_result(first), game_result(last)],
    }
}

/// Postseason header plus one line per non-regular-season game between October 1 and November 15.
pub fn postseason_block(team: &TeamProfile, year: i32, games: &[ScheduleGame]) -> Vec<String> {
    let playoff: Vec<&ScheduleGame> = games
        .iter()
        .filter(|game| !game.is_regular_season() && in_window(game, year, (10, 1), (11, 15)))
        .collect();
    if playoff.is_empty() {
        return Vec::new();
    }
    let mut block = Vec::with_capacity(playoff.len() + 1);
    block.push(format!("{} postseason appearances in {year}:", team.name));
    for game in playoff {
        block.push(format!(
            "{}: {} at {}, Score: {}-{}",
            game.game_type,
            game.away_name,
            game.home_name,
            render_score(game.away_score),
            render_score(game.home_score)
        ));
    }
    block
}

fn game_result(game: &ScheduleGame) -> String {
    format!(
        "On {}, the {} played at {}. Final score: {} {}, {} {}.",
        game.game_date.format("%Y-%m-%d"),
        game.away_name,
        game.home_name,
        game.away_name,
        render_score(game.away_score),
        game.home_name,
        render_score(game.home_score)
    )
}

fn render_score(score: Option<u32>) -> String {
    score.map_or_else(|| "?".to_string(), |runs| runs.to_string())
}

fn in_window(game: &ScheduleGame, year: i32, from: (u32, u32), to: (u32, u32)) -> bool {
    match (ymd(year, from.0, from.1), ymd(year, to.0, to.1)) {
        (Some(start), Some(end)) => game.game_date >= start && game.game_date <= end,
        _ => false,
    }
}

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}
