//! Detector observations in frame-pixel coordinates

use serde::{Deserialize, Serialize};

use crate::error::ObservationError;

/// A point in frame pixels, origin top-left
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Axis-aligned detection box: top-left corner plus size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// One frame's detector output
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Detection {
    Lost,
    Point(Point),
    BoundingBox(BoundingBox),
}

impl Detection {
    /// Point the controller should centre, if anything was detected
    pub fn target(&self) -> Option<Point> {
        match self {
            Self::Lost => None,
            Self::Point(p) => Some(*p),
            Self::BoundingBox(b) => Some(b.center()),
        }
    }

    /// Parse one line of a recorded detection stream.
    ///
    /// Accepts `none`, `x y` or `x y w h`, whitespace or comma separated.
    /// Blank lines and `#` comments yield `Ok(None)`.
    pub fn parse_line(line_no: usize, line: &str) -> Result<Option<Self>, ObservationError> {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            return Ok(None);
        }
        if line.eq_ignore_ascii_case("none") || line == "-" {
            return Ok(Some(Self::Lost));
        }

        let values = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|field| !field.is_empty())
            .map(|field| match field.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(value),
                Ok(_) => Err(ObservationError::NonFinite {
                    line: line_no,
                    value: field.to_string(),
                }),
                Err(_) => Err(ObservationError::InvalidNumber {
                    line: line_no,
                    value: field.to_string(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        match *values.as_slice() {
            [x, y] => Ok(Some(Self::Point(Point::new(x, y)))),
            [x, y, width, height] => Ok(Some(Self::BoundingBox(BoundingBox {
                x,
                y,
                width,
                height,
            }))),
            _ => Err(ObservationError::FieldCount {
                line: line_no,
                fields: values.len(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_center() {
        let bbox = BoundingBox {
            x: 100.0,
            y: 50.0,
            width: 40.0,
            height: 21.0,
        };
        assert_eq!(bbox.center(), Point::new(120.0, 60.5));
        assert_eq!(Detection::BoundingBox(bbox).target(), Some(Point::new(120.0, 60.5)));
    }

    #[test]
    fn test_parse_lines() {
        assert_eq!(Detection::parse_line(1, "  # header"), Ok(None));
        assert_eq!(Detection::parse_line(2, ""), Ok(None));
        assert_eq!(Detection::parse_line(3, "None"), Ok(Some(Detection::Lost)));
        assert_eq!(
            Detection::parse_line(4, "1375 972"),
            Ok(Some(Detection::Point(Point::new(1375.0, 972.0))))
        );
        assert_eq!(
            Detection::parse_line(5, "10, 20, 30, 40 # face"),
            Ok(Some(Detection::BoundingBox(BoundingBox {
                x: 10.0,
                y: 20.0,
                width: 30.0,
                height: 40.0
            })))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            Detection::parse_line(7, "1 2 3"),
            Err(ObservationError::FieldCount { line: 7, fields: 3 })
        );
        assert_eq!(
            Detection::parse_line(8, "12 abc"),
            Err(ObservationError::InvalidNumber {
                line: 8,
                value: "abc".to_string()
            })
        );
        assert_eq!(
            Detection::parse_line(9, "nan nan"),
            Err(ObservationError::NonFinite {
                line: 9,
                value: "nan".to_string()
            })
        );
        assert!(matches!(
            Detection::parse_line(10, "0 0 inf 40"),
            Err(ObservationError::NonFinite { line: 10, .. })
        ));
    }
}
