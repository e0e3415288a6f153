use serde::Deserialize;

/// Raw GeoJSON feature collection describing the corridor network. Tracks
/// arrive as LineString features, stations as Point features; both are
/// converted into domain types by the loader.
#[derive(Debug, Deserialize)]
pub struct FeatureCollectionDto {
    pub features: Vec<FeatureDto>,
}

#[derive(Debug, Deserialize)]
pub struct FeatureDto {
    pub geometry: GeometryDto,
    #[serde(default)]
    pub properties: FeaturePropertiesDto,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum GeometryDto {
    /// Coordinates follow the GeoJSON convention: `[longitude, latitude]`.
    Point { coordinates: [f64; 2] },
    LineString { coordinates: Vec<[f64; 2]> },
}

/// Properties bag shared by track and station features. Which fields are
/// required depends on the geometry; the loader validates per feature kind.
#[derive(Debug, Default, Deserialize)]
pub struct FeaturePropertiesDto {
    pub name: Option<String>,
    /// Station code, e.g. "SBC".
    pub code: Option<String>,
    /// Track classification: "main", "siding" or "secondary".
    pub track_type: Option<String>,
    /// Parallel-track capacity of a track feature.
    pub capacity: Option<u32>,
    /// Corridor label grouping parallel tracks.
    pub segment: Option<String>,
    pub platforms: Option<u32>,
    pub dwell_minutes: Option<f64>,
}
