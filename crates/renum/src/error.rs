use renum_schema::DefinitionConflict;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error(transparent)]
    ConflictingDefinition(#[from] DefinitionConflict),

    #[error("unknown enum '{name}' in schema '{schema}'")]
    UnknownEnum { schema: String, name: String },

    #[error("enum '{name}' already exists in schema '{schema}'")]
    DuplicateEnum { schema: String, name: String },

    #[error("enum '{name}' has no value '{value}'")]
    UnknownValue { name: String, value: String },

    #[error("enum '{name}' already has value '{value}'")]
    DuplicateValue { name: String, value: String },
}
