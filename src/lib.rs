#![warn(missing_docs)]
//! Core library entry points for the oldtimer baseball knowledge pipeline.

pub mod chat;
pub mod chunk;
pub mod config;
pub mod embedder;
pub mod gather;
pub mod logging;
pub mod pinecone;
pub mod records;
pub mod statsapi;
pub mod upsert;

pub use chunk::{Chunker, DEFAULT_CHUNK_CHARS};
pub use config::{AskKeys, CollectorKeys, ConfigError, DemoKeys};
pub use embedder::openai::OpenAiEmbedder;
pub use embedder::{embed_snippets, EmbedOptions, Embedder, EmbeddingPair};
pub use gather::{SeasonGatherer, TeamProfile};
pub use pinecone::{IndexCatalog, IndexSpec, PineconeClient, PineconeIndex, VectorSink};
pub use records::{RecordMetadata, VectorRecord};
pub use statsapi::{ScheduleGame, ScheduleSource, StatsApiClient, TeamInfo};
pub use upsert::{ensure_index, BatchUpserter, UpsertSummary, DEFAULT_UPSERT_BATCH};
