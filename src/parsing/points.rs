//! Coordinate list parsing
//!
//! Turns the whitespace-separated text of `pos`/`posList` elements into points.

use crate::error::RingError;
use crate::geometry::Point;

/// Parse a coordinate list into points, three values per point.
///
/// The first token that is not a finite number aborts the list, and a value
/// count that is not a multiple of 3 rejects it; either way no points are
/// returned so the ring is never partially used.
pub fn parse_coordinates(text: &str) -> Result<Vec<Point>, RingError> {
    let mut values: Vec<f32> = Vec::new();

    for token in text.split_whitespace() {
        let value: f32 = token.parse().map_err(|_| RingError::InvalidToken {
            token: token.to_string(),
        })?;
        if !value.is_finite() {
            return Err(RingError::NonFinite {
                token: token.to_string(),
            });
        }
        values.push(value);
    }

    if values.len() % 3 != 0 {
        return Err(RingError::CoordinateCount { count: values.len() });
    }

    Ok(values
        .chunks_exact(3)
        .map(|xyz| Point::new(xyz[0], xyz[1], xyz[2]))
        .collect())
}
