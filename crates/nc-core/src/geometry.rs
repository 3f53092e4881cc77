//! Canvas coordinates.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A 2-D point on the infinite canvas.
///
/// Positions are layout-only: nothing in the graph model derives meaning from
/// them except super-block placement and prompt ordering.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Build a position, rejecting NaN and infinities.
    ///
    /// JSON has no encoding for non-finite floats, so such a position would not
    /// survive a save/load cycle.
    pub fn checked(x: f64, y: f64) -> CoreResult<Self> {
        if !x.is_finite() {
            return Err(CoreError::NonFinite {
                what: "position.x",
                value: x,
            });
        }
        if !y.is_finite() {
            return Err(CoreError::NonFinite {
                what: "position.y",
                value: y,
            });
        }
        Ok(Self { x, y })
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_rejects_nan() {
        assert!(Position::checked(f64::NAN, 0.0).is_err());
        assert!(Position::checked(0.0, f64::INFINITY).is_err());
        assert_eq!(Position::checked(1.0, 2.0).unwrap(), Position::new(1.0, 2.0));
    }

    #[test]
    fn wire_shape() {
        let json = serde_json::to_string(&Position::new(10.0, -4.5)).unwrap();
        assert_eq!(json, r#"{"x":10.0,"y":-4.5}"#);
    }
}
