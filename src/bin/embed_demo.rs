use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use oldtimer::embedder::openai::{
    DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_EMBEDDING_MODEL, DEFAULT_OPENAI_BASE,
};
use oldtimer::{embed_snippets, Chunker, DemoKeys, EmbedOptions, OpenAiEmbedder};

const SAMPLE_SNIPPETS: [&str; 2] = [
    "The quick brown fox jumps over the lazy dog.",
    "Baseball is America's pastime.",
];

#[derive(Parser, Debug)]
#[command(
    name = "oldtimer-embed-demo",
    about = "Embed a couple of fixed sentences and print the leading dimensions"
)]
struct DemoCli {
    /// Embedding model identifier
    #[arg(long, env = "OLDTIMER_OPENAI_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    openai_model: String,

    /// Base URL for the OpenAI-compatible API
    #[arg(long, env = "OLDTIMER_OPENAI_BASE", default_value = DEFAULT_OPENAI_BASE)]
    openai_base_url: String,

    /// Expected vector length
    #[arg(long, env = "OLDTIMER_DIMENSIONS", default_value_t = DEFAULT_EMBEDDING_DIMENSIONS)]
    dimensions: usize,

    /// Number of leading dimensions to print
    #[arg(long, default_value_t = 5)]
    show: usize,
}

fn main() -> Result<()> {
    oldtimer::logging::init();
    let cli = DemoCli::parse();
    let keys = DemoKeys::from_env()?;
    let embedder = OpenAiEmbedder::new(
        &keys.openai_api_key,
        &cli.openai_base_url,
        cli.openai_model,
        None,
        Duration::from_secs(30),
        1,
    )?;
    let options = EmbedOptions {
        chunker: Chunker::new(usize::MAX),
        delay: Duration::ZERO,
        dimensions: cli.dimensions,
    };
    for pair in embed_snippets(&embedder, SAMPLE_SNIPPETS, &options) {
        let shown = cli.show.min(pair.vector.len());
        println!("Snippet: {}", pair.text);
        println!("Embedding (first {} dims): {:?}", shown, &pair.vector[..shown]);
        println!("{}", "-".repeat(40));
    }
    Ok(())
}
