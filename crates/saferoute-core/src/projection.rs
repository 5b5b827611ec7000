//! WGS84 <-> UTM conversion.
//!
//! Transverse Mercator after Krüger, using the third-order series in the
//! third flattening `n`. Accuracy inside a zone is in the millimetre range,
//! which is far below what hazard buffers need.

use crate::error::Error;
use crate::models::{GeoCoordinate, ProjectedCoordinate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// UTM is only defined between these latitudes.
const MIN_LAT: f64 = -80.0;
const MAX_LAT: f64 = 84.0;
/// Longitude offset from the central meridian beyond which we refuse to
/// project (zones are 6° wide; one neighbouring zone of slack).
const MAX_ZONE_OFFSET_DEG: f64 = 9.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    #[default]
    North,
    South,
}

impl Hemisphere {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hemisphere::North => "north",
            Hemisphere::South => "south",
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hemisphere {
    type Err = Error;

    /// Accepts `north`/`south` or `n`/`s`, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "north" | "n" => Ok(Hemisphere::North),
            "south" | "s" => Ok(Hemisphere::South),
            other => Err(Error::Projection(format!(
                "unknown hemisphere {other:?} (expected north or south)"
            ))),
        }
    }
}

/// Fixed pair of reference systems: WGS84 geographic and one UTM zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtmProjector {
    zone: u8,
    hemisphere: Hemisphere,
    central_meridian: f64,
    false_northing: f64,
    rectifying_radius: f64,
    eccentricity: f64,
    alpha: [f64; 3],
    beta: [f64; 3],
    delta: [f64; 3],
}

impl UtmProjector {
    pub fn new(zone: u8, hemisphere: Hemisphere) -> Result<Self, Error> {
        if !(1..=60).contains(&zone) {
            return Err(Error::Projection(format!("UTM zone {zone} outside 1..=60")));
        }

        let n = WGS84_F / (2.0 - WGS84_F);
        let n2 = n * n;
        let n3 = n2 * n;

        Ok(Self {
            zone,
            hemisphere,
            central_meridian: f64::from(zone) * 6.0 - 183.0,
            false_northing: match hemisphere {
                Hemisphere::North => 0.0,
                Hemisphere::South => FALSE_NORTHING_SOUTH,
            },
            rectifying_radius: WGS84_A / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0),
            eccentricity: 2.0 * n.sqrt() / (1.0 + n),
            alpha: [
                n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0,
                13.0 * n2 / 48.0 - 3.0 * n3 / 5.0,
                61.0 * n3 / 240.0,
            ],
            beta: [
                n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0,
                n2 / 48.0 + n3 / 15.0,
                17.0 * n3 / 480.0,
            ],
            delta: [
                2.0 * n - 2.0 * n2 / 3.0 - 2.0 * n3,
                7.0 * n2 / 3.0 - 8.0 * n3 / 5.0,
                56.0 * n3 / 15.0,
            ],
        })
    }

    pub fn zone(&self) -> u8 {
        self.zone
    }

    pub fn hemisphere(&self) -> Hemisphere {
        self.hemisphere
    }

    pub fn central_meridian(&self) -> f64 {
        self.central_meridian
    }

    /// EPSG code of the projected system (326xx north, 327xx south).
    pub fn epsg(&self) -> u32 {
        let base = match self.hemisphere {
            Hemisphere::North => 32600,
            Hemisphere::South => 32700,
        };
        base + u32::from(self.zone)
    }

    pub fn to_projected(&self, coord: GeoCoordinate) -> Result<ProjectedCoordinate, Error> {
        let offset = self.check_domain(coord)?;

        let phi = coord.lat.to_radians();
        let lambda = offset.to_radians();
        let e = self.eccentricity;

        let t = (phi.sin().atanh() - e * (e * phi.sin()).atanh()).sinh();
        let xi_p = t.atan2(lambda.cos());
        let eta_p = (lambda.sin() / (1.0 + t * t).sqrt()).atanh();

        let mut xi = xi_p;
        let mut eta = eta_p;
        for (j, alpha) in self.alpha.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi += alpha * (k * xi_p).sin() * (k * eta_p).cosh();
            eta += alpha * (k * xi_p).cos() * (k * eta_p).sinh();
        }

        let scale = K0 * self.rectifying_radius;
        Ok(ProjectedCoordinate::new(
            FALSE_EASTING + scale * eta,
            self.false_northing + scale * xi,
        ))
    }

    pub fn to_geographic(&self, coord: ProjectedCoordinate) -> Result<GeoCoordinate, Error> {
        if !coord.easting.is_finite() || !coord.northing.is_finite() {
            return Err(Error::Projection(format!(
                "non-finite projected coordinate ({}, {})",
                coord.easting, coord.northing
            )));
        }

        let scale = K0 * self.rectifying_radius;
        let xi = (coord.northing - self.false_northing) / scale;
        let eta = (coord.easting - FALSE_EASTING) / scale;

        let mut xi_p = xi;
        let mut eta_p = eta;
        for (j, beta) in self.beta.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi_p -= beta * (k * xi).sin() * (k * eta).cosh();
            eta_p -= beta * (k * xi).cos() * (k * eta).sinh();
        }

        let chi = (xi_p.sin() / eta_p.cosh()).asin();
        let mut phi = chi;
        for (j, delta) in self.delta.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            phi += delta * (k * chi).sin();
        }
        let lambda = eta_p.sinh().atan2(xi_p.cos());

        let geo = GeoCoordinate::new(
            wrap_longitude(self.central_meridian + lambda.to_degrees()),
            phi.to_degrees(),
        );
        self.check_domain(geo).map_err(|_| {
            Error::Projection(format!(
                "({}, {}) lies outside UTM zone {}",
                coord.easting, coord.northing, self.zone
            ))
        })?;
        Ok(geo)
    }

    /// Returns the longitude offset from the central meridian.
    fn check_domain(&self, coord: GeoCoordinate) -> Result<f64, Error> {
        coord
            .validate()
            .map_err(|err| Error::Projection(err.to_string()))?;
        if !(MIN_LAT..=MAX_LAT).contains(&coord.lat) {
            return Err(Error::Projection(format!(
                "latitude {} outside UTM coverage [{MIN_LAT}, {MAX_LAT}]",
                coord.lat
            )));
        }
        let offset = wrap_longitude(coord.lng - self.central_meridian);
        if offset.abs() > MAX_ZONE_OFFSET_DEG {
            return Err(Error::Projection(format!(
                "longitude {} is {:.1}° from the zone {} central meridian",
                coord.lng,
                offset.abs(),
                self.zone
            )));
        }
        Ok(offset)
    }
}

fn wrap_longitude(lng: f64) -> f64 {
    let wrapped = (lng + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lng > 0.0 {
        180.0
    } else {
        wrapped
    }
}
