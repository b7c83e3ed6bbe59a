//! GEO commands. Positions live in a sorted set whose score is the 52-bit
//! geohash of the coordinates.

use crate::{
    commands::{
        command_utils::{check_arity, parse_float},
        CommandError,
    },
    geo::{Coordinates, DistanceUnit},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct GeoaddArguments {
    key: String,
    locations: Vec<(Coordinates, String)>,
}

impl GeoaddArguments {
    pub fn parse(arguments: &[String]) -> Result<Self, CommandError> {
        check_arity("GEOADD", arguments, 4, None)?;

        let triplets = &arguments[1..];

        if triplets.len() % 3 != 0 {
            return Err(CommandError::SyntaxError);
        }

        let mut locations = Vec::with_capacity(triplets.len() / 3);

        for triplet in triplets.chunks_exact(3) {
            let coordinates = Coordinates::new(parse_float(&triplet[0])?, parse_float(&triplet[1])?);

            if !coordinates.is_valid() {
                return Err(CommandError::InvalidCoordinates(
                    coordinates.longitude,
                    coordinates.latitude,
                ));
            }

            locations.push((coordinates, triplet[2].clone()));
        }

        Ok(Self {
            key: arguments[0].clone(),
            locations,
        })
    }
}

/// Handles the Redis GEOADD command.
///
/// Each location is stored in a sorted set, scored by its 52-bit geohash.
///
/// # Arguments
///
/// * `store` - The key space
/// * `arguments` - The key followed by one or more `longitude latitude member` triples
///
/// # Returns
///
/// * `Ok(RespValue::Integer)` - The number of members that were not present before
/// * `Err(CommandError::InvalidCoordinates)` - If a pair lies outside the valid range
/// * `Err(CommandError::NotAFloat)` - If a coordinate is not a number
///
/// # Examples
///
/// ```ignore
/// let result = geoadd(&mut store, &["places".into(), "2.2944692".into(), "48.8584625".into(), "Paris".into()]);
/// // Returns: Ok(RespValue::Integer(1))
/// ```
pub fn geoadd(store: &mut KeyValueStore, arguments: &[String]) -> Result<RespValue, CommandError> {
    let geoadd_arguments = GeoaddArguments::parse(arguments)?;
    let sorted_set = store.get_sorted_set_or_default(&geoadd_arguments.key)?;

    let added = geoadd_arguments
        .locations
        .iter()
        .filter(|(coordinates, member)| sorted_set.insert(member, coordinates.encode() as f64))
        .count();

    Ok(RespValue::Integer(added as i64))
}

/// Handles the Redis GEOPOS command.
///
/// # Returns
///
/// * `Ok(RespValue::Array)` - `[longitude, latitude]` per member, a null
///   array in place of unknown members
pub fn geopos(store: &mut KeyValueStore, arguments: &[String]) -> Result<RespValue, CommandError> {
    check_arity("GEOPOS", arguments, 1, None)?;

    let sorted_set = store.get_sorted_set(&arguments[0])?;

    let positions = arguments[1..]
        .iter()
        .map(|member| {
            match sorted_set.as_ref().and_then(|sorted_set| sorted_set.score(member)) {
                Some(score) => {
                    let coordinates = Coordinates::decode(score as u64);
                    RespValue::bulk_string_array([
                        coordinates.longitude.to_string(),
                        coordinates.latitude.to_string(),
                    ])
                }
                None => RespValue::NullArray,
            }
        })
        .collect();

    Ok(RespValue::Array(positions))
}

/// Handles the Redis GEODIST command.
///
/// # Arguments
///
/// * `store` - The key space
/// * `arguments` - `[key, member, member]`, optionally followed by `m`, `km`, `mi` or `ft`
///
/// # Returns
///
/// * `Ok(RespValue::BulkString)` - The distance rounded to four decimals, in meters unless a unit is given
/// * `Ok(RespValue::NullBulkString)` - If the key or either member is missing
/// * `Err(CommandError::UnsupportedUnit)` - For any other unit
///
/// # Examples
///
/// ```ignore
/// let result = geodist(&mut store, &["places".into(), "Paris".into(), "London".into(), "km".into()]);
/// // Returns: Ok(RespValue::BulkString(..)), the distance in kilometers with four decimals
/// ```
pub fn geodist(store: &mut KeyValueStore, arguments: &[String]) -> Result<RespValue, CommandError> {
    check_arity("GEODIST", arguments, 3, Some(4))?;

    let unit = match arguments.get(3) {
        Some(unit) => DistanceUnit::parse(unit).ok_or(CommandError::UnsupportedUnit)?,
        None => DistanceUnit::Meters,
    };

    let Some(sorted_set) = store.get_sorted_set(&arguments[0])? else {
        return Ok(RespValue::NullBulkString);
    };

    let (Some(first), Some(second)) = (
        sorted_set.score(&arguments[1]),
        sorted_set.score(&arguments[2]),
    ) else {
        return Ok(RespValue::NullBulkString);
    };

    let meters =
        Coordinates::decode(first as u64).distance_to(&Coordinates::decode(second as u64));

    Ok(RespValue::BulkString(format!("{:.4}", meters / unit.meters())))
}

pub struct GeosearchArguments {
    key: String,
    center: Coordinates,
    radius_in_meters: f64,
}

impl GeosearchArguments {
    /// Only `GEOSEARCH key FROMLONLAT lon lat BYRADIUS radius unit`.
    pub fn parse(arguments: &[String]) -> Result<Self, CommandError> {
        check_arity("GEOSEARCH", arguments, 7, Some(7))?;

        if !arguments[1].eq_ignore_ascii_case("FROMLONLAT")
            || !arguments[4].eq_ignore_ascii_case("BYRADIUS")
        {
            return Err(CommandError::SyntaxError);
        }

        let center = Coordinates::new(parse_float(&arguments[2])?, parse_float(&arguments[3])?);

        if !center.is_valid() {
            return Err(CommandError::InvalidCoordinates(center.longitude, center.latitude));
        }

        let unit = DistanceUnit::parse(&arguments[6]).ok_or(CommandError::UnsupportedUnit)?;

        Ok(Self {
            key: arguments[0].clone(),
            center,
            radius_in_meters: parse_float(&arguments[5])? * unit.meters(),
        })
    }
}

/// Handles the Redis GEOSEARCH command.
///
/// # Arguments
///
/// * `store` - The key space
/// * `arguments` - `[key, FROMLONLAT, longitude, latitude, BYRADIUS, radius, unit]`
///
/// # Returns
///
/// * `Ok(RespValue::Array)` - Members within the radius, in score order
/// * `Err(CommandError::SyntaxError)` - If another search shape is requested
/// * `Err(CommandError::InvalidCoordinates)` - If the center lies outside the valid range
pub fn geosearch(
    store: &mut KeyValueStore,
    arguments: &[String],
) -> Result<RespValue, CommandError> {
    let geosearch_arguments = GeosearchArguments::parse(arguments)?;

    let Some(sorted_set) = store.get_sorted_set(&geosearch_arguments.key)? else {
        return Ok(RespValue::Array(Vec::new()));
    };

    let members = sorted_set
        .iter()
        .filter(|(_, score)| {
            Coordinates::decode(*score as u64).distance_to(&geosearch_arguments.center)
                <= geosearch_arguments.radius_in_meters
        })
        .map(|(member, _)| member.to_string())
        .collect::<Vec<_>>();

    Ok(RespValue::bulk_string_array(members))
}
