//! Versus CLI
//!
//! Command-line front end for a league backend:
//! - Manage leagues, players and matches
//! - Show player stats, rankings and head-to-head records
//! - Compute rankings and reports locally from the match list

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use versus::form::{create_league_dialog, create_match_dialog, create_player_dialog, edit_league_dialog};
use versus::gateway::DEFAULT_RECENT_LIMIT;
use versus::{
    Config, Gateway, GatewayConfig, HeadToHead, League, LeagueSummary, LoggingConfig, Match,
    MatchPage, NewMatch, Player, PlayerReport, PlayerStats,
};

#[derive(Parser)]
#[command(name = "versus")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Track leagues, players and head-to-head match results")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend URL (overrides the config file)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Config file (default: ~/.config/versus/config.toml or ./versus.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage leagues
    #[command(subcommand)]
    Leagues(LeagueCommands),

    /// Manage matches
    #[command(subcommand)]
    Matches(MatchCommands),

    /// Manage players
    #[command(subcommand)]
    Players(PlayerCommands),

    /// Player stats for a league, or for one player
    Stats {
        league: String,
        player: Option<String>,
    },

    /// League rankings
    Rankings {
        league: String,
        /// Compute from the match list instead of asking the backend
        #[arg(long)]
        local: bool,
    },

    /// Record between two players
    HeadToHead {
        league: String,
        player_a: String,
        player_b: String,
    },

    /// League totals
    Summary {
        league: String,
        /// Compute from the match list instead of asking the backend
        #[arg(long)]
        local: bool,
    },

    /// A player's stats and record against each opponent
    Report { league: String, player: String },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum LeagueCommands {
    /// List all leagues
    List,
    /// Show one league
    Show { league: String },
    /// Create a league
    Create {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Rename a league
    Rename { league: String, name: String },
    /// Delete a league with its players and matches
    Delete { league: String },
}

#[derive(Subcommand)]
pub enum MatchCommands {
    /// List a league's matches, newest first
    List {
        league: String,
        #[arg(short, long, default_value_t = MatchPage::DEFAULT_LIMIT)]
        limit: u32,
        #[arg(short, long, default_value_t = 0)]
        offset: u32,
    },
    /// Record a match result
    Record {
        league: String,
        player1: String,
        #[arg(allow_hyphen_values = true)]
        player1_score: String,
        player2: String,
        #[arg(allow_hyphen_values = true)]
        player2_score: String,
    },
    /// Replace a match result
    Edit {
        match_id: String,
        player1: String,
        #[arg(allow_hyphen_values = true)]
        player1_score: i64,
        player2: String,
        #[arg(allow_hyphen_values = true)]
        player2_score: i64,
    },
    /// Delete a match
    Delete { match_id: String },
    /// Most recent matches of a league
    Recent {
        league: String,
        #[arg(short, long, default_value_t = DEFAULT_RECENT_LIMIT)]
        limit: u32,
    },
}

#[derive(Subcommand)]
pub enum PlayerCommands {
    /// List registered players
    List { league: String },
    /// Register a player
    Add { league: String, name: String },
    /// Remove a player and their matches
    Remove { league: String, name: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    init_tracing(&config.logging);

    let gateway = Gateway::new(GatewayConfig::from(&config)).context("Failed to create API client")?;
    let json = cli.format == OutputFormat::Json;

    match cli.command {
        Commands::Leagues(command) => leagues(&gateway, command, json).await?,
        Commands::Matches(command) => matches(&gateway, command, json).await?,
        Commands::Players(command) => players(&gateway, command, json).await?,

        Commands::Stats { league, player } => match player {
            Some(name) => {
                let stats = gateway.get_player_stats(&league, &name).await?;
                emit(json, &stats, |s| print_stats(std::slice::from_ref(s)))?;
            }
            None => {
                let stats = gateway.list_player_stats(&league).await?;
                emit(json, &stats, |s| print_stats(s))?;
            }
        },

        Commands::Rankings { league, local } => {
            let rankings = if local {
                gateway.local_rankings(&league).await?
            } else {
                gateway.get_rankings(&league).await?
            };
            emit(json, &rankings, |r| print_rankings(r))?;
        }

        Commands::HeadToHead {
            league,
            player_a,
            player_b,
        } => {
            let record = gateway.get_head_to_head(&league, &player_a, &player_b).await?;
            emit(json, &record, print_head_to_head)?;
        }

        Commands::Summary { league, local } => {
            let summary = if local {
                gateway.local_league_summary(&league).await?
            } else {
                gateway.get_league_summary(&league).await?
            };
            emit(json, &summary, print_summary)?;
        }

        Commands::Report { league, player } => {
            let report = gateway.player_report(&league, &player).await?;
            emit(json, &report, print_report)?;
        }

        Commands::Config { output } => write_default_config(output.as_ref())?,
    }

    Ok(())
}

/// Resolve the config, with CLI flags applied on top
///
/// The configured subscriber does not exist yet, so events from loading go
/// to a plain stderr subscriber at the default level.
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let bootstrap = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(LoggingConfig::default().filter_directive())),
        )
        .finish();

    let mut config = tracing::subscriber::with_default(bootstrap, || match &cli.config {
        Some(path) => Config::load_with_env(path),
        None => Ok(Config::load_default()),
    })?;

    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(logging.filter_directive()));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so `--format json` output stays parseable
    if logging.is_json() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn write_default_config(output: Option<&PathBuf>) -> anyhow::Result<()> {
    let config = versus::generate_default_config();

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &config)?;
            println!("Config written to {:?}", path);
        }
        None => {
            print!("{}", config);
        }
    }
    Ok(())
}

async fn leagues(gateway: &Gateway, command: LeagueCommands, json: bool) -> anyhow::Result<()> {
    match command {
        LeagueCommands::List => {
            let leagues = gateway.list_leagues().await?;
            emit(json, &leagues, |l| print_leagues(l))?;
        }
        LeagueCommands::Show { league } => {
            let league = gateway.get_league(&league).await?;
            emit(json, &league, |l| print_leagues(std::slice::from_ref(l)))?;
        }
        LeagueCommands::Create { name, description } => {
            let mut dialog = create_league_dialog();
            dialog.open();
            if let Some(values) = dialog.values_mut() {
                values.name = name;
                values.description = description;
            }
            let created = dialog
                .submit(|v| async move { gateway.create_league(v.to_new_league()).await })
                .await?;
            emit(json, &created, |l| println!("Created league {} ({})", l.name, l.id))?;
        }
        LeagueCommands::Rename { league, name } => {
            let mut dialog = edit_league_dialog();
            dialog.open();
            if let Some(values) = dialog.values_mut() {
                values.name = name;
            }
            let updated = dialog
                .submit(|v| async move { gateway.update_league(&league, v.to_update()).await })
                .await?;
            emit(json, &updated, |l| println!("Renamed league {} to {}", l.id, l.name))?;
        }
        LeagueCommands::Delete { league } => {
            let message = gateway.delete_league(&league).await?;
            emit(json, &message, |m| println!("{}", m.message))?;
        }
    }
    Ok(())
}

async fn matches(gateway: &Gateway, command: MatchCommands, json: bool) -> anyhow::Result<()> {
    match command {
        MatchCommands::List {
            league,
            limit,
            offset,
        } => {
            let matches = gateway.list_matches(&league, MatchPage::new(limit, offset)).await?;
            emit(json, &matches, |m| print_matches(m))?;
        }
        MatchCommands::Record {
            league,
            player1,
            player1_score,
            player2,
            player2_score,
        } => {
            let mut dialog = create_match_dialog();
            dialog.open();
            if let Some(values) = dialog.values_mut() {
                values.player1 = player1;
                values.player1_score = player1_score;
                values.player2 = player2;
                values.player2_score = player2_score;
            }
            let created = dialog
                .submit(|v| async move {
                    let request = v.to_request()?;
                    gateway.create_match(&league, request).await
                })
                .await?;
            emit(json, &created, |m| {
                println!("Recorded match {}: {} wins", m.id, m.winner)
            })?;
        }
        MatchCommands::Edit {
            match_id,
            player1,
            player1_score,
            player2,
            player2_score,
        } => {
            let update = NewMatch::new(player1, player1_score, player2, player2_score);
            let updated = gateway.update_match(&match_id, update).await?;
            emit(json, &updated, |m| {
                println!("Updated match {}: {} wins", m.id, m.winner)
            })?;
        }
        MatchCommands::Delete { match_id } => {
            let message = gateway.delete_match(&match_id).await?;
            emit(json, &message, |m| println!("{}", m.message))?;
        }
        MatchCommands::Recent { league, limit } => {
            let matches = gateway.recent_matches(&league, limit).await?;
            emit(json, &matches, |m| print_matches(m))?;
        }
    }
    Ok(())
}

async fn players(gateway: &Gateway, command: PlayerCommands, json: bool) -> anyhow::Result<()> {
    match command {
        PlayerCommands::List { league } => {
            let players = gateway.list_players(&league).await?;
            emit(json, &players, |p| print_players(p))?;
        }
        PlayerCommands::Add { league, name } => {
            let mut dialog = create_player_dialog();
            dialog.open();
            if let Some(values) = dialog.values_mut() {
                values.name = name;
            }
            let created = dialog
                .submit(|v| async move { gateway.create_player(&league, v.to_request()).await })
                .await?;
            emit(json, &created, |p| println!("Added player {}", p.name))?;
        }
        PlayerCommands::Remove { league, name } => {
            let message = gateway.delete_player(&league, &name).await?;
            emit(json, &message, |m| println!("{}", m.message))?;
        }
    }
    Ok(())
}

/// Print `value` as JSON or through its table printer
fn emit<T: Serialize>(json: bool, value: &T, table: impl FnOnce(&T)) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        table(value);
    }
    Ok(())
}

fn print_leagues(leagues: &[League]) {
    if leagues.is_empty() {
        println!("No leagues yet.");
        println!();
        println!("Create your first league with:");
        println!("  versus leagues create \"Office Ping Pong\"");
        return;
    }

    println!("{:<38} {:<24} {:<12} {}", "ID", "Name", "Created", "Description");
    println!("{}", "-".repeat(90));
    for league in leagues {
        println!(
            "{:<38} {:<24} {:<12} {}",
            league.id,
            league.name,
            league.created_at.format("%Y-%m-%d"),
            league.description.as_deref().unwrap_or("-")
        );
    }
}

fn print_matches(matches: &[Match]) {
    if matches.is_empty() {
        println!("No matches recorded");
        return;
    }

    println!("{:<17} {:<38} {:<30} {}", "Date", "ID", "Result", "Winner");
    println!("{}", "-".repeat(100));
    for m in matches {
        let result = format!(
            "{} {}-{} {}",
            m.player1, m.player1_score, m.player2_score, m.player2
        );
        println!(
            "{:<17} {:<38} {:<30} {}",
            m.created_at.format("%Y-%m-%d %H:%M"),
            m.id,
            result,
            m.winner
        );
    }
}

fn print_players(players: &[Player]) {
    if players.is_empty() {
        println!("No players registered");
        return;
    }
    for player in players {
        println!("{}", player.name);
    }
}

fn print_stats(stats: &[PlayerStats]) {
    if stats.is_empty() {
        println!("No stats yet");
        return;
    }

    println!(
        "{:<20} {:>6} {:>6} {:>6} {:>8} {:>8} {:>6}  {}",
        "Player", "Played", "Won", "Lost", "Win %", "Avg", "Best", "Streak"
    );
    println!("{}", "-".repeat(90));
    for s in stats {
        println!(
            "{:<20} {:>6} {:>6} {:>6} {:>7.1}% {:>8.1} {:>6}  {}",
            s.player_name,
            s.matches_played,
            s.matches_won,
            s.matches_lost,
            s.win_rate,
            s.average_score,
            s.highest_score,
            s.streak_label()
        );
    }
}

fn print_rankings(rankings: &[PlayerStats]) {
    if rankings.is_empty() {
        println!("No players ranked yet");
        return;
    }

    println!(
        "{:>4}  {:<20} {:>8} {:>6} {:>8} {:>6}",
        "Rank", "Player", "Win %", "Won", "Avg", "Best"
    );
    println!("{}", "-".repeat(60));
    for (i, s) in rankings.iter().enumerate() {
        println!(
            "{:>4}  {:<20} {:>7.1}% {:>6} {:>8.1} {:>6}",
            i + 1,
            s.player_name,
            s.win_rate,
            s.matches_won,
            s.average_score,
            s.highest_score
        );
    }
}

fn print_head_to_head(record: &HeadToHead) {
    let (first, second) = (&record.first, &record.second);

    println!("{} vs {}", first.name, second.name);
    println!("{}", "-".repeat(40));
    println!("Matches: {}", record.total_matches);
    for player in [first, second] {
        println!(
            "  {:<20} {:>3} wins ({:.1}%), avg {:.1}",
            player.name, player.wins, player.win_rate, player.average_score
        );
    }
    println!("Average margin ({}): {:+.1}", first.name, record.average_score_difference);

    if !record.match_history.is_empty() {
        println!();
        for m in &record.match_history {
            println!(
                "  {}  {}-{}  {}",
                m.date.format("%Y-%m-%d"),
                m.first_score,
                m.second_score,
                m.winner
            );
        }
    }
}

fn print_summary(summary: &LeagueSummary) {
    println!("Matches:       {}", summary.total_matches);
    println!("Players:       {}", summary.total_players);
    println!("Average score: {:.1}", summary.average_score);
    println!("Highest score: {}", summary.highest_score);
}

fn print_report(report: &PlayerReport) {
    print_stats(std::slice::from_ref(&report.stats));

    if report.opponents.is_empty() {
        return;
    }
    println!();
    println!("{:<20} {:>6} {:>6} {:>8}", "Opponent", "Won", "Lost", "Win %");
    println!("{}", "-".repeat(44));
    for o in &report.opponents {
        println!(
            "{:<20} {:>6} {:>6} {:>7.1}%",
            o.opponent, o.wins, o.losses, o.win_rate
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_format_is_validated() {
        let cli = Cli::try_parse_from(["versus", "--format", "json", "leagues", "list"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);

        let cli = Cli::try_parse_from(["versus", "leagues", "list"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Table);

        assert!(Cli::try_parse_from(["versus", "--format", "xml", "leagues", "list"]).is_err());
    }

    #[test]
    fn test_load_config_applies_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nbase_url = \"http://from-file:8000\"").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = Cli::try_parse_from(["versus", "--config", &path, "leagues", "list"]).unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.api.request_timeout_secs, 30);

        let cli = Cli::try_parse_from([
            "versus",
            "--config",
            &path,
            "--api-url",
            "http://flag:9000",
            "leagues",
            "list",
        ])
        .unwrap();
        assert_eq!(load_config(&cli).unwrap().api.base_url, "http://flag:9000");
    }

    #[test]
    fn test_missing_config_file_is_reported() {
        let cli = Cli::try_parse_from(["versus", "--config", "/nonexistent/versus.toml", "leagues", "list"])
            .unwrap();
        let err = load_config(&cli).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
