use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// WGS84 longitude/latitude, the only reference system the service stores.
pub const SRID: u32 = 4326;

/// A geographic point. Serializes in the wire shape `{ "lat": .., "lng": .. }`
/// and converts to/from the EWKT text form PostGIS understands.
///
/// Coordinates are stored as given: out-of-range values are not rejected
/// here. Handlers that accept user input are expected to validate ranges
/// before persisting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// EWKT text bound into SQL via `ST_GeomFromEWKT`.
    /// Note EWKT orders coordinates longitude first.
    pub fn ewkt(&self) -> String {
        format!("SRID={};POINT({} {})", SRID, self.lng, self.lat)
    }

    /// Parse the output of `ST_AsEWKT` (or plain WKT without the SRID
    /// prefix) back into a point.
    pub fn parse_ewkt(text: &str) -> Result<Self> {
        let text = text.trim();
        let body = match text.split_once(';') {
            Some((srid, rest)) => {
                let srid = srid
                    .strip_prefix("SRID=")
                    .ok_or_else(|| anyhow!("invalid EWKT prefix: {}", text))?;
                let srid: u32 = srid
                    .parse()
                    .map_err(|_| anyhow!("invalid SRID in EWKT: {}", text))?;
                if srid != SRID {
                    return Err(anyhow!("unexpected SRID {}, expected {}", srid, SRID));
                }
                rest
            }
            None => text,
        };

        let coords = body
            .strip_prefix("POINT(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| anyhow!("not a point geometry: {}", text))?;

        let mut parts = coords.split_whitespace();
        let lng = parts
            .next()
            .ok_or_else(|| anyhow!("missing longitude: {}", text))?
            .parse::<f64>()
            .map_err(|_| anyhow!("invalid longitude: {}", text))?;
        let lat = parts
            .next()
            .ok_or_else(|| anyhow!("missing latitude: {}", text))?
            .parse::<f64>()
            .map_err(|_| anyhow!("invalid latitude: {}", text))?;
        if parts.next().is_some() {
            return Err(anyhow!("trailing coordinates in point: {}", text));
        }

        Ok(Self { lat, lng })
    }

    /// True when both coordinates fall inside the WGS84 domain.
    pub fn in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}
