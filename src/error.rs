use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse topology JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse schedule CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid track geometry for '{name}': {reason}")]
    InvalidGeometry { name: String, reason: String },

    #[error("Malformed stop list '{0}'")]
    MalformedStopList(String),

    #[error("Invalid schedule for train '{train_id}': {reason}")]
    InvalidSchedule { train_id: String, reason: String },

    #[error("Unknown station code '{0}'")]
    UnknownStation(String),

    #[error("Unknown corridor '{0}'")]
    UnknownCorridor(String),

    #[error("No corridor connects '{from}' to '{to}'")]
    UnresolvedRoute { from: String, to: String },

    #[error("Unknown train '{0}'")]
    UnknownTrain(String),

    #[error("Train '{0}' already exists")]
    DuplicateTrain(String),

    #[error("Negative delay of {minutes} min for train '{train_id}' is not allowed")]
    NegativeDelay { train_id: String, minutes: f64 },

    #[error("Failed to build optimization model: {0}")]
    ModelConstruction(String),
}

impl Error {
    /// A configuration error is fatal to the setup of the entity it concerns
    /// (train route, topology) and must be surfaced, never skipped.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::InvalidGeometry { .. }
                | Error::MalformedStopList(_)
                | Error::InvalidSchedule { .. }
                | Error::UnknownStation(_)
                | Error::UnknownCorridor(_)
                | Error::UnresolvedRoute { .. }
                | Error::NegativeDelay { .. }
                | Error::ModelConstruction(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
