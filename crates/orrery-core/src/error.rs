//! Error types for the orrery engine

use thiserror::Error;

/// Core orrery errors
#[derive(Error, Debug)]
pub enum OrreryError {
    // Construction errors
    #[error("Impossible geometry: {0}")]
    ImpossibleGeometry(String),

    #[error("Rank {rank} does not exceed dependency rank {dependency_rank}")]
    RankViolation { rank: i32, dependency_rank: i32 },

    #[error("Entity {id} is not a position source")]
    NotAPoint { id: String },

    #[error("Entity {id} is not a shape")]
    NotAShape { id: String },

    #[error("Entity {id} is not a line")]
    NotALine { id: String },

    #[error("Entity {id} is not a measurement")]
    NotAMeasurement { id: String },

    // Registry errors
    #[error("Unknown entity id: {0}")]
    UnknownEntity(String),

    // Expression errors
    #[error("Expression syntax error: {0}")]
    ExprSyntax(String),

    #[error("Unbound name in expression: {0}")]
    UnboundName(String),

    #[error("Type mismatch evaluating expression: {0}")]
    TypeMismatch(String),

    // Scene load errors
    #[error("Unknown entity kind: {0}")]
    UnknownKind(String),

    #[error("Descriptor for {kind} is missing required field {field}")]
    MissingField { kind: String, field: &'static str },

    // Wire errors
    #[error("Invalid packet: {0}")]
    InvalidPacket(String),
}

/// Result type for orrery operations
pub type OrreryResult<T> = Result<T, OrreryError>;
