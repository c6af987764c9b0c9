//! Geographic coordinates and great-circle distance.

use crate::error::{CoreError, CoreResult};

/// Mean Earth radius, kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees.
///
/// Immutable after construction; both constructors reject out-of-range
/// values, so every `GeoCoord` in circulation is valid.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoCoord {
    latitude: f64,
    longitude: f64,
}

impl GeoCoord {
    /// Build from decimal degrees. Latitude must lie in [-90, 90],
    /// longitude in [-180, 180].
    pub fn new(latitude: f64, longitude: f64) -> CoreResult<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoreError::OutOfRange {
                what: "latitude",
                value: latitude,
            });
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoreError::OutOfRange {
                what: "longitude",
                value: longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Build from degrees/minutes/seconds plus a compass direction per axis.
    ///
    /// Accepts `N`/`S` for latitude and `E`/`W` for longitude; southern and
    /// western coordinates come out negative.
    #[allow(clippy::too_many_arguments)]
    pub fn from_dms(
        lat_deg: u32,
        lat_min: u32,
        lat_sec: f64,
        lat_dir: char,
        lon_deg: u32,
        lon_min: u32,
        lon_sec: f64,
        lon_dir: char,
    ) -> CoreResult<Self> {
        let latitude = dms_axis("latitude", lat_deg, lat_min, lat_sec, 90)?;
        let longitude = dms_axis("longitude", lon_deg, lon_min, lon_sec, 180)?;
        let latitude = match lat_dir {
            'N' => latitude,
            'S' => -latitude,
            dir => {
                return Err(CoreError::InvalidDirection {
                    what: "latitude",
                    dir,
                });
            }
        };
        let longitude = match lon_dir {
            'E' => longitude,
            'W' => -longitude,
            dir => {
                return Err(CoreError::InvalidDirection {
                    what: "longitude",
                    dir,
                });
            }
        };
        Self::new(latitude, longitude)
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance to `other` in kilometres (haversine formula).
    pub fn distance_km(&self, other: GeoCoord) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

impl Default for GeoCoord {
    /// The null island: 0° N, 0° E.
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
        }
    }
}

fn dms_axis(what: &'static str, deg: u32, min: u32, sec: f64, deg_max: u32) -> CoreResult<f64> {
    if deg > deg_max {
        return Err(CoreError::OutOfRange {
            what,
            value: deg as f64,
        });
    }
    if min > 60 {
        return Err(CoreError::OutOfRange {
            what,
            value: min as f64,
        });
    }
    if !(0.0..=60.0).contains(&sec) {
        return Err(CoreError::OutOfRange { what, value: sec });
    }
    Ok(deg as f64 + min as f64 / 60.0 + sec / 3600.0)
}
