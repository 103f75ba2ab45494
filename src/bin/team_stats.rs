use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use oldtimer::statsapi::DEFAULT_STATSAPI_BASE;
use oldtimer::{ScheduleSource, StatsApiClient};

#[derive(Parser, Debug)]
#[command(
    name = "oldtimer-team",
    about = "Print a team's name, roster size and a slice of its schedule",
    after_help = "Example: oldtimer-team 147   (147 = Yankees)"
)]
struct TeamCli {
    /// Stats API team identifier
    team_id: u32,

    /// First date of the schedule slice (YYYY-MM-DD)
    #[arg(long, default_value = "2024-08-15")]
    start: NaiveDate,

    /// Last date of the schedule slice (YYYY-MM-DD)
    #[arg(long, default_value = "2024-08-20")]
    end: NaiveDate,

    /// Stats API root
    #[arg(long, env = "OLDTIMER_STATSAPI_BASE", default_value = DEFAULT_STATSAPI_BASE)]
    statsapi_base_url: String,
}

fn main() -> Result<()> {
    oldtimer::logging::init();
    let cli = TeamCli::parse();
    anyhow::ensure!(cli.start <= cli.end, "--start must not be after --end");
    let stats = StatsApiClient::new(cli.statsapi_base_url, Duration::from_secs(30))?;

    let Some(team) = stats.lookup_team(cli.team_id)? else {
        println!("No data found for team_id={}", cli.team_id);
        return Ok(());
    };
    let team_name = team.display_name().to_string();
    println!("Team Name: {team_name}");

    let roster = stats.roster(cli.team_id)?;
    println!("Total Rostered Players: {}", roster.len());

    let games = stats.schedule(cli.team_id, cli.start, cli.end)?;
    if !games.is_empty() {
        println!(
            "Upcoming {} Games from {} to {}:",
            team_name,
            cli.start.format("%m/%d"),
            cli.end.format("%m/%d/%Y")
        );
        for game in games {
            println!(
                "  - {} vs. {} at {}",
                game.game_date.format("%Y-%m-%d"),
                game.away_name,
                game.home_name
            );
        }
    }
    Ok(())
}
