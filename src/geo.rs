//! Geohash helpers backing the GEO commands.
//!
//! Coordinates are interleaved into a 52-bit integer (26 steps per axis,
//! longitude bit first) which is stored as the member's sorted-set score.

const STEP: u32 = 26;

pub const LATITUDE_MIN: f64 = -85.05112878;
pub const LATITUDE_MAX: f64 = 85.05112878;
pub const LONGITUDE_MIN: f64 = -180.0;
pub const LONGITUDE_MAX: f64 = 180.0;

const EARTH_RADIUS_IN_METERS: f64 = 6372797.560856;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinates {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        (LONGITUDE_MIN..=LONGITUDE_MAX).contains(&self.longitude)
            && (LATITUDE_MIN..=LATITUDE_MAX).contains(&self.latitude)
    }

    pub fn encode(&self) -> u64 {
        let mut hash = 0u64;
        let mut latitude_range = (LATITUDE_MIN, LATITUDE_MAX);
        let mut longitude_range = (LONGITUDE_MIN, LONGITUDE_MAX);

        for step in 0..STEP {
            let bit = ((STEP - step - 1) * 2) as u64;
            let longitude_mid = (longitude_range.0 + longitude_range.1) / 2.0;
            let latitude_mid = (latitude_range.0 + latitude_range.1) / 2.0;

            if self.longitude >= longitude_mid {
                hash |= 1 << (bit + 1);
                longitude_range.0 = longitude_mid;
            } else {
                longitude_range.1 = longitude_mid;
            }

            if self.latitude >= latitude_mid {
                hash |= 1 << bit;
                latitude_range.0 = latitude_mid;
            } else {
                latitude_range.1 = latitude_mid;
            }
        }

        hash
    }

    /// Center of the cell a hash identifies.
    pub fn decode(hash: u64) -> Self {
        let mut latitude_range = (LATITUDE_MIN, LATITUDE_MAX);
        let mut longitude_range = (LONGITUDE_MIN, LONGITUDE_MAX);

        for step in 0..STEP {
            let bit = ((STEP - step - 1) * 2) as u64;
            let longitude_mid = (longitude_range.0 + longitude_range.1) / 2.0;
            let latitude_mid = (latitude_range.0 + latitude_range.1) / 2.0;

            if hash & (1 << (bit + 1)) != 0 {
                longitude_range.0 = longitude_mid;
            } else {
                longitude_range.1 = longitude_mid;
            }

            if hash & (1 << bit) != 0 {
                latitude_range.0 = latitude_mid;
            } else {
                latitude_range.1 = latitude_mid;
            }
        }

        Self::new(
            (longitude_range.0 + longitude_range.1) / 2.0,
            (latitude_range.0 + latitude_range.1) / 2.0,
        )
    }

    /// Haversine distance in meters.
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        let latitude_1 = self.latitude.to_radians();
        let latitude_2 = other.latitude.to_radians();
        let u = ((latitude_2 - latitude_1) / 2.0).sin();
        let v = ((other.longitude.to_radians() - self.longitude.to_radians()) / 2.0).sin();

        2.0 * EARTH_RADIUS_IN_METERS
            * (u * u + latitude_1.cos() * latitude_2.cos() * v * v)
                .sqrt()
                .asin()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceUnit {
    Meters,
    Kilometers,
    Miles,
    Feet,
}

impl DistanceUnit {
    pub fn parse(unit: &str) -> Option<Self> {
        match unit.to_lowercase().as_str() {
            "m" => Some(DistanceUnit::Meters),
            "km" => Some(DistanceUnit::Kilometers),
            "mi" => Some(DistanceUnit::Miles),
            "ft" => Some(DistanceUnit::Feet),
            _ => None,
        }
    }

    pub fn meters(&self) -> f64 {
        match self {
            DistanceUnit::Meters => 1.0,
            DistanceUnit::Kilometers => 1000.0,
            DistanceUnit::Miles => 1609.34,
            DistanceUnit::Feet => 0.3048,
        }
    }
}
