use std::{str::FromStr, time::Duration};

use crate::commands::CommandError;

/// Fails with the arity error of `command` unless `min <= len <= max`.
pub fn check_arity(
    command: &str,
    arguments: &[String],
    min: usize,
    max: Option<usize>,
) -> Result<(), CommandError> {
    let length = arguments.len();

    if length < min || max.is_some_and(|max| length > max) {
        return Err(CommandError::wrong_arguments(command));
    }

    Ok(())
}

pub fn parse_integer<T: FromStr>(value: &str) -> Result<T, CommandError> {
    value.parse::<T>().map_err(|_| CommandError::NotAnInteger)
}

pub fn parse_float(value: &str) -> Result<f64, CommandError> {
    match value.parse::<f64>() {
        Ok(number) if !number.is_nan() => Ok(number),
        _ => Err(CommandError::NotAFloat),
    }
}

/// Seconds as sent to blocking list commands. `0` means no deadline.
pub fn parse_timeout_seconds(value: &str) -> Result<Option<Duration>, CommandError> {
    let seconds = value
        .parse::<f64>()
        .ok()
        .filter(|seconds| seconds.is_finite())
        .ok_or(CommandError::InvalidTimeout)?;

    if seconds < 0.0 {
        return Err(CommandError::NegativeTimeout);
    }

    if seconds == 0.0 {
        return Ok(None);
    }

    Duration::try_from_secs_f64(seconds)
        .map(Some)
        .map_err(|_| CommandError::InvalidTimeout)
}

/// Turns an inclusive `start..=stop` pair where negative values count from
/// the end into concrete indexes into a sequence of `length` items.
///
/// Returns `None` when the range selects nothing.
pub fn normalize_range(length: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let length = length as i64;

    if length == 0 {
        return None;
    }

    let start = if start < 0 { (length + start).max(0) } else { start };
    let stop = if stop < 0 { length + stop } else { stop.min(length - 1) };

    if start > stop || start >= length {
        return None;
    }

    Some((start as usize, stop as usize))
}
