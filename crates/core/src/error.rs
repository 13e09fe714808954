#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no such column with name: \"{0}\"")]
    ColumnNotFound(String),
    #[error("duplicate column name in schema: \"{0}\"")]
    DuplicateColumn(String),
    #[error("failed to deserialize schema: {0}")]
    SchemaDeserialization(serde_json::Error),

    #[error("patient resource must be a JSON object")]
    InvalidPatientResource,
    #[error("patient resource has no id")]
    MissingPatientId,
    #[error("invalid record id: {0}")]
    InvalidRecordId(serde_json::Value),
    #[error("column \"{column}\" must hold an array of items")]
    InvalidColumnData { column: String },
    #[error("item {index} of column \"{column}\" must be a JSON object")]
    InvalidItem { column: String, index: usize },

    #[error("column \"{0}\" is a singleton and already holds an item")]
    SingletonColumnOccupied(String),
}

pub type ModelResult<T> = std::result::Result<T, ModelError>;
