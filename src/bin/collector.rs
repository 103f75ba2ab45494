use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Datelike;
use clap::Parser;
use oldtimer::embedder::openai::{
    DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_EMBEDDING_MODEL, DEFAULT_OPENAI_BASE,
};
use oldtimer::gather::{CUBS_TEAM_ID, DEFAULT_START_YEAR};
use oldtimer::pinecone::DEFAULT_PINECONE_CONTROL;
use oldtimer::statsapi::DEFAULT_STATSAPI_BASE;
use oldtimer::{
    embed_snippets, ensure_index, BatchUpserter, Chunker, CollectorKeys, EmbedOptions,
    IndexSpec, OpenAiEmbedder, PineconeClient, SeasonGatherer, StatsApiClient, TeamProfile,
    VectorRecord, DEFAULT_CHUNK_CHARS, DEFAULT_UPSERT_BATCH,
};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "oldtimer-collector",
    about = "Gather a club's season history, embed it and store it in a Pinecone index"
)]
struct CollectorCli {
    /// Stats API team identifier
    #[arg(long, env = "OLDTIMER_TEAM_ID", default_value_t = CUBS_TEAM_ID)]
    team_id: u32,

    /// First season to gather
    #[arg(long, env = "OLDTIMER_START_YEAR", default_value_t = DEFAULT_START_YEAR)]
    start_year: i32,

    /// Last season to gather (defaults to the current year)
    #[arg(long, env = "OLDTIMER_END_YEAR")]
    end_year: Option<i32>,

    /// Target Pinecone index
    #[arg(long, env = "OLDTIMER_INDEX", default_value = "cubs-index")]
    index_name: String,

    /// Serverless cloud used when the index has to be created
    #[arg(long, env = "OLDTIMER_PINECONE_CLOUD", default_value = "aws")]
    cloud: String,

    /// Maximum characters per embedded chunk
    #[arg(long, env = "OLDTIMER_CHUNK_CHARS", default_value_t = DEFAULT_CHUNK_CHARS)]
    chunk_chars: usize,

    /// Records per upsert call
    #[arg(long, env = "OLDTIMER_UPSERT_BATCH", default_value_t = DEFAULT_UPSERT_BATCH)]
    batch_size: usize,

    /// Milliseconds to pause between seasons
    #[arg(long, env = "OLDTIMER_YEAR_DELAY_MS", default_value_t = 100)]
    year_delay_ms: u64,

    /// Milliseconds to pause after each embedding request
    #[arg(long, env = "OLDTIMER_EMBED_DELAY_MS", default_value_t = 100)]
    embed_delay_ms: u64,

    /// Embedding model identifier
    #[arg(long, env = "OLDTIMER_OPENAI_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    openai_model: String,

    /// Vector length produced by the model (also the index dimension)
    #[arg(long, env = "OLDTIMER_DIMENSIONS", default_value_t = DEFAULT_EMBEDDING_DIMENSIONS)]
    dimensions: usize,

    /// Base URL for the OpenAI-compatible API
    #[arg(long, env = "OLDTIMER_OPENAI_BASE", default_value = DEFAULT_OPENAI_BASE)]
    openai_base_url: String,

    /// Attempts per embedding request (1 disables retries)
    #[arg(long, env = "OLDTIMER_OPENAI_ATTEMPTS", default_value_t = 1)]
    max_attempts: usize,

    /// Stats API root
    #[arg(long, env = "OLDTIMER_STATSAPI_BASE", default_value = DEFAULT_STATSAPI_BASE)]
    statsapi_base_url: String,

    /// Pinecone control-plane root
    #[arg(long, env = "OLDTIMER_PINECONE_CONTROL", default_value = DEFAULT_PINECONE_CONTROL)]
    pinecone_control_url: String,

    /// Max seconds to wait for each HTTP request
    #[arg(long, env = "OLDTIMER_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Max seconds to wait for a newly created index to become ready
    #[arg(long, env = "OLDTIMER_INDEX_READY_SECS", default_value_t = 300)]
    index_ready_secs: u64,
}

fn main() -> Result<()> {
    oldtimer::logging::init();
    let cli = CollectorCli::parse();
    let keys = CollectorKeys::from_env()?;
    let timeout = Duration::from_secs(cli.timeout_secs.max(1));
    let end_year = cli
        .end_year
        .unwrap_or_else(|| chrono::Local::now().year());
    anyhow::ensure!(
        cli.start_year <= end_year,
        "start year {} is after end year {}",
        cli.start_year,
        end_year
    );

    info!("starting historical data collection...");
    let stats = StatsApiClient::new(cli.statsapi_base_url.clone(), timeout)?;
    let team = resolve_team(&stats, cli.team_id)?;
    let source_tag = team.source_tag.clone();
    let gatherer = SeasonGatherer::new(stats, team, Duration::from_millis(cli.year_delay_ms));
    let snippets = gatherer.gather(cli.start_year..=end_year);
    if snippets.is_empty() {
        error!("No data was collected. Aborting.");
        anyhow::bail!("no data was collected");
    }
    info!("collected {} text snippets", snippets.len());

    let embedder = OpenAiEmbedder::new(
        &keys.openai_api_key,
        &cli.openai_base_url,
        cli.openai_model.clone(),
        None,
        timeout,
        cli.max_attempts,
    )?;
    let options = EmbedOptions {
        chunker: Chunker::new(cli.chunk_chars),
        delay: Duration::from_millis(cli.embed_delay_ms),
        dimensions: cli.dimensions,
    };
    let pairs = embed_snippets(&embedder, &snippets, &options);
    info!("created {} embeddings", pairs.len());

    let pinecone = PineconeClient::new(&keys.pinecone_api_key, &cli.pinecone_control_url, timeout)?;
    let spec = IndexSpec::cosine(&cli.index_name, cli.dimensions, &cli.cloud, &keys.pinecone_region);
    ensure_index(
        &pinecone,
        &spec,
        Duration::from_secs(2),
        Duration::from_secs(cli.index_ready_secs),
    )?;
    let index = pinecone
        .index(&cli.index_name)
        .with_context(|| format!("failed to open index '{}'", cli.index_name))?;

    let mut upserter = BatchUpserter::new(&index, cli.batch_size);
    for pair in pairs {
        upserter.push(VectorRecord::from_pair(pair, &source_tag))?;
    }
    let summary = upserter.finish()?;
    info!(
        "stored {} vectors in '{}' across {} batch(es)",
        summary.records, cli.index_name, summary.batches
    );
    Ok(())
}

fn resolve_team(stats: &StatsApiClient, team_id: u32) -> Result<TeamProfile> {
    if team_id == CUBS_TEAM_ID {
        return Ok(TeamProfile::chicago_cubs());
    }
    let info = stats
        .lookup_team(team_id)?
        .ok_or_else(|| anyhow::anyhow!("no team found for team_id={team_id}"))?;
    Ok(TeamProfile::from_info(&info))
}
