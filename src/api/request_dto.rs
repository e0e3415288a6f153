use serde::Deserialize;

/// A disruption injection request: delay one train in one corridor.
#[derive(Debug, Deserialize)]
pub struct DisruptionRequestDto {
    pub train_id: String,
    pub corridor: String,
    pub delay_minutes: f64,
    #[serde(default)]
    pub reason: Option<String>,
}

/// A special-train request, used for mid-run insertion and what-if analysis.
#[derive(Debug, Deserialize)]
pub struct SpecialTrainRequestDto {
    pub train_id: String,
    pub dep_time: f64,
    pub speed_kmh: f64,
    /// Ordered station codes; first is the origin, last the destination.
    pub stops: Vec<String>,
    #[serde(default)]
    pub priority: Option<u8>,
    #[serde(default)]
    pub through_destination: Option<String>,
}
