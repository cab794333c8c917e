use std::time::Duration;

use crate::error::ConfigError;

/// Parses durations such as `500ms`, `1.5s`, `2m`, `1h`, or compound forms
/// like `1m30s`. A bare integer is read as seconds.
///
/// # Errors
///
/// Returns an error for empty input, unknown units, overflow, or a zero total.
pub fn parse_duration_value(value: &str) -> Result<Duration, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::DurationEmpty);
    }

    if value.chars().all(|ch| ch.is_ascii_digit()) {
        let secs: u64 = value
            .parse()
            .map_err(|err| ConfigError::InvalidDurationNumber {
                value: value.to_owned(),
                source: err,
            })?;
        return non_zero(Duration::from_secs(secs));
    }

    let mut total_nanos: u128 = 0;
    let mut rest = value;
    while !rest.is_empty() {
        let number_len = rest
            .chars()
            .take_while(|ch| ch.is_ascii_digit() || *ch == '.')
            .count();
        let (num_part, tail) = rest.split_at(number_len);
        let unit_len = tail
            .chars()
            .take_while(|ch| ch.is_ascii_alphabetic() || matches!(*ch, 'µ' | 'μ'))
            .map(char::len_utf8)
            .sum::<usize>();
        let (unit, remainder) = tail.split_at(unit_len);
        if num_part.is_empty() || unit.is_empty() {
            return Err(ConfigError::InvalidDurationFormat {
                value: value.to_owned(),
            });
        }

        let segment = segment_nanos(value, num_part, unit_nanos(unit)?)?;
        total_nanos = total_nanos
            .checked_add(segment)
            .ok_or(ConfigError::DurationOverflow)?;
        rest = remainder;
    }

    let nanos = u64::try_from(total_nanos).map_err(|_overflow| ConfigError::DurationOverflow)?;
    non_zero(Duration::from_nanos(nanos))
}

/// Fraction digits beyond nanosecond precision of the largest unit are
/// ignored.
const MAX_FRACTION_DIGITS: usize = 18;

/// Nanoseconds in `number` (`12`, `1.5`, `.25`, `3.`) of a unit worth
/// `unit` nanoseconds, truncated toward zero.
fn segment_nanos(value: &str, number: &str, unit: u128) -> Result<u128, ConfigError> {
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if fraction.contains('.') || (whole.is_empty() && fraction.is_empty()) {
        return Err(ConfigError::InvalidDurationFormat {
            value: value.to_owned(),
        });
    }

    let parse = |digits: &str| -> Result<u128, ConfigError> {
        if digits.is_empty() {
            return Ok(0);
        }
        digits
            .parse::<u64>()
            .map(u128::from)
            .map_err(|err| ConfigError::InvalidDurationNumber {
                value: value.to_owned(),
                source: err,
            })
    };

    let whole_nanos = parse(whole)?
        .checked_mul(unit)
        .ok_or(ConfigError::DurationOverflow)?;
    let fraction = fraction.get(..MAX_FRACTION_DIGITS).unwrap_or(fraction);
    let exponent = u32::try_from(fraction.len()).map_err(|_overflow| ConfigError::DurationOverflow)?;
    let fraction_nanos = parse(fraction)?
        .checked_mul(unit)
        .zip(10_u128.checked_pow(exponent))
        .and_then(|(scaled, scale)| scaled.checked_div(scale))
        .ok_or(ConfigError::DurationOverflow)?;
    whole_nanos
        .checked_add(fraction_nanos)
        .ok_or(ConfigError::DurationOverflow)
}

fn unit_nanos(unit: &str) -> Result<u128, ConfigError> {
    let nanos = match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60_000_000_000,
        "h" => 3_600_000_000_000,
        _ => {
            return Err(ConfigError::InvalidDurationUnit {
                unit: unit.to_owned(),
            });
        }
    };
    Ok(nanos)
}

const fn non_zero(duration: Duration) -> Result<Duration, ConfigError> {
    if duration.is_zero() {
        Err(ConfigError::DurationZero)
    } else {
        Ok(duration)
    }
}
