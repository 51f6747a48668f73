use thiserror::Error;

pub type Result<T> = std::result::Result<T, RetrievalError>;

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding failure: {0}")]
    Embedding(String),

    #[error("Compilation failure: {0}")]
    Compilation(String),

    #[error("Disallowed statement: {0}")]
    DisallowedStatement(String),

    #[error("Connection failure: {0}")]
    Connection(String),

    #[error("Query failure: {0}")]
    Query(String),

    #[error("Mapping failure: {0}")]
    Mapping(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod filter;
pub mod genai;
pub mod query;
pub mod schema;
pub mod search;
