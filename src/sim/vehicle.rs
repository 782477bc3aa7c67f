use crate::protocol::VehicleState;
use serde::{Deserialize, Serialize};

/// Direction of travel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heading {
    #[serde(rename = "N")]
    North,
    #[serde(rename = "S")]
    South,
    #[serde(rename = "E")]
    East,
    #[serde(rename = "W")]
    West,
}

impl Heading {
    /// Order used when drawing a random heading
    pub const ALL: [Heading; 4] = [Heading::East, Heading::West, Heading::North, Heading::South];

    /// True for headings that move along the x axis
    pub fn is_horizontal(self) -> bool {
        matches!(self, Heading::East | Heading::West)
    }
}

/// Axis-aligned motion bounds of a zone
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Square bounds anchored at the origin
    pub fn square(size: f64) -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
            max_x: size,
            max_y: size,
        }
    }
}

/// A single vehicle owned by one zone
#[derive(Clone, Debug, PartialEq)]
pub struct Vehicle {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub heading: Heading,
    pub bounds: Bounds,
}

impl Vehicle {
    pub fn new(id: String, x: f64, y: f64, heading: Heading, bounds: Bounds) -> Self {
        Self {
            id,
            x,
            y,
            heading,
            bounds,
        }
    }

    /// Move one tick along the heading.
    ///
    /// A vehicle that passes `max + size` on its leading edge re-enters at
    /// `min - size` (and vice versa), so coordinates on the axis of motion
    /// stay within `[min - size, max + size]`.
    pub fn advance(&mut self, speed: f64, size: f64) {
        let b = self.bounds;
        match self.heading {
            Heading::East => {
                self.x += speed;
                if self.x > b.max_x + size {
                    self.x = b.min_x - size;
                }
            }
            Heading::West => {
                self.x -= speed;
                if self.x < b.min_x - size {
                    self.x = b.max_x + size;
                }
            }
            Heading::South => {
                self.y += speed;
                if self.y > b.max_y + size {
                    self.y = b.min_y - size;
                }
            }
            Heading::North => {
                self.y -= speed;
                if self.y < b.min_y - size {
                    self.y = b.max_y + size;
                }
            }
        }
    }

    pub fn state(&self) -> VehicleState {
        VehicleState {
            id: self.id.clone(),
            x: self.x,
            y: self.y,
            direction: self.heading,
        }
    }
}
