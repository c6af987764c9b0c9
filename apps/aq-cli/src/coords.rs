//! Coordinate-string decoding.
//!
//! Scripts carry coordinates as `DD:MM:SS.S{N|S},DDD:MM:SS.S{E|W}`, e.g.
//! `41:58:30N,2:49:10.5E`. Range and direction validation happens in
//! [`GeoCoord::from_dms`]; this module only takes the string apart.

use aq_core::GeoCoord;

use crate::error::{CliError, CliResult};

pub fn parse_coord(text: &str) -> CliResult<GeoCoord> {
    let bad = || CliError::BadCoordinate {
        text: text.to_string(),
    };
    let (lat, lon) = text.split_once(',').ok_or_else(bad)?;
    let (lat_deg, lat_min, lat_sec, lat_dir) = parse_axis(lat).ok_or_else(bad)?;
    let (lon_deg, lon_min, lon_sec, lon_dir) = parse_axis(lon).ok_or_else(bad)?;
    Ok(GeoCoord::from_dms(
        lat_deg, lat_min, lat_sec, lat_dir, lon_deg, lon_min, lon_sec, lon_dir,
    )?)
}

/// Split one axis, `DD:MM:SS.S` plus a trailing direction letter.
fn parse_axis(text: &str) -> Option<(u32, u32, f64, char)> {
    let mut parts = text.split(':');
    let deg = parts.next()?.parse().ok()?;
    let min = parts.next()?.parse().ok()?;
    let rest = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    let dir = rest.chars().next_back()?;
    let sec = rest[..rest.len() - dir.len_utf8()].parse().ok()?;
    Some((deg, min, sec, dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_both_axes() {
        let c = parse_coord("41:58:30N,2:49:10.5E").unwrap();
        assert!((c.latitude() - (41.0 + 58.0 / 60.0 + 30.0 / 3600.0)).abs() < 1e-9);
        assert!((c.longitude() - (2.0 + 49.0 / 60.0 + 10.5 / 3600.0)).abs() < 1e-9);
    }

    #[test]
    fn south_and_west_come_out_negative() {
        let c = parse_coord("10:0:0S,20:0:0W").unwrap();
        assert_eq!(c.latitude(), -10.0);
        assert_eq!(c.longitude(), -20.0);
    }

    #[test]
    fn rejects_malformed_strings() {
        assert!(parse_coord("no-comma").is_err());
        assert!(parse_coord("41:58N,2:49:0E").is_err());
        assert!(parse_coord("41:58:30N;2:49:0E").is_err());
        assert!(parse_coord("41:58:30X,2:49:0E").is_err());
        assert!(parse_coord("41:58:30:1N,2:49:0E").is_err());
    }
}
