use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use oldtimer::chat::{build_prompt, render_context, ChatRequest, OpenAiChat, DEFAULT_CHAT_MODEL};
use oldtimer::embedder::openai::{DEFAULT_EMBEDDING_MODEL, DEFAULT_OPENAI_BASE};
use oldtimer::pinecone::DEFAULT_PINECONE_CONTROL;
use oldtimer::{AskKeys, Embedder, OpenAiEmbedder, PineconeClient};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "oldtimer-ask",
    about = "Ask the old-timer a baseball question answered from the Pinecone index"
)]
struct AskCli {
    /// Question for the old-timer
    question: String,

    /// Number of matches pulled from the index
    #[arg(long, default_value_t = 3)]
    top_k: usize,

    /// Embedding model identifier (must match the one used by the collector)
    #[arg(long, env = "OLDTIMER_OPENAI_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    embedding_model: String,

    /// Chat model used for the answer
    #[arg(long, env = "OLDTIMER_CHAT_MODEL", default_value = DEFAULT_CHAT_MODEL)]
    chat_model: String,

    /// Sampling temperature for the answer model
    #[arg(long, default_value_t = 0.7)]
    temperature: f32,

    /// Maximum tokens to request from the completion model
    #[arg(long, default_value_t = 300)]
    max_completion_tokens: usize,

    /// Base URL for the OpenAI-compatible API
    #[arg(long, env = "OLDTIMER_OPENAI_BASE", default_value = DEFAULT_OPENAI_BASE)]
    openai_base_url: String,

    /// Pinecone control-plane root
    #[arg(long, env = "OLDTIMER_PINECONE_CONTROL", default_value = DEFAULT_PINECONE_CONTROL)]
    pinecone_control_url: String,

    /// Only print the retrieved context (skip the chat call)
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

fn main() -> Result<()> {
    oldtimer::logging::init();
    let cli = AskCli::parse();
    let keys = AskKeys::from_env()?;
    let question = cli.question.trim();
    anyhow::ensure!(!question.is_empty(), "question must not be blank");
    let timeout = Duration::from_secs(60);

    let embedder = OpenAiEmbedder::new(
        &keys.openai_api_key,
        &cli.openai_base_url,
        cli.embedding_model.clone(),
        None,
        timeout,
        1,
    )?;
    let vector = embedder
        .embed(question)
        .context("failed to create embedding for the question")?;

    let pinecone = PineconeClient::new(&keys.pinecone_api_key, &cli.pinecone_control_url, timeout)?;
    let index = pinecone.index(&keys.index_name)?;
    let matches = index
        .query(&vector, cli.top_k, true)
        .context("failed to retrieve relevant baseball knowledge")?;
    info!("retrieved {} match(es) from '{}'", matches.len(), keys.index_name);
    let context = render_context(&matches)?;
    println!("--- Retrieved Context ---\n{context}\n");
    if cli.dry_run {
        println!("dry-run enabled; skipping chat call.");
        return Ok(());
    }

    let prompt = build_prompt(question, &context);
    let chat = OpenAiChat::new(
        keys.openai_api_key.clone(),
        &cli.openai_base_url,
        cli.chat_model.clone(),
        timeout,
    )?;
    let answer = chat.answer(&ChatRequest {
        prompt: &prompt,
        temperature: cli.temperature,
        max_tokens: cli.max_completion_tokens,
    })?;
    println!("--- Answer ---\n{answer}");
    Ok(())
}
