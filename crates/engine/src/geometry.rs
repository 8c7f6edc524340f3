use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Integer grid coordinate. `y` grows downward, so `Direction::N` is `y - 1`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, direction: Direction) -> Self {
        self + direction.delta()
    }

    pub fn neighbors4(self) -> [Coord; 4] {
        [
            self.step(Direction::N),
            self.step(Direction::E),
            self.step(Direction::S),
            self.step(Direction::W),
        ]
    }

    pub fn neighbors8(self) -> [Coord; 8] {
        Direction::ALL.map(|direction| self.step(direction))
    }

    pub fn is_adjacent8(self, other: Coord) -> bool {
        self != other && chebyshev_distance(self, other) == 1
    }
}

impl Add for Coord {
    type Output = Coord;

    fn add(self, rhs: Coord) -> Coord {
        Coord::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Coord {
    type Output = Coord;

    fn sub(self, rhs: Coord) -> Coord {
        Coord::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Angle in degrees (0 = east, 90 = north) and radius in tiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarCoord {
    pub angle_degrees: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Direction {
    /// Clockwise from north.
    pub const ALL: [Direction; 8] = [
        Direction::N,
        Direction::NE,
        Direction::E,
        Direction::SE,
        Direction::S,
        Direction::SW,
        Direction::W,
        Direction::NW,
    ];

    pub fn delta(self) -> Coord {
        match self {
            Self::N => Coord::new(0, -1),
            Self::NE => Coord::new(1, -1),
            Self::E => Coord::new(1, 0),
            Self::SE => Coord::new(1, 1),
            Self::S => Coord::new(0, 1),
            Self::SW => Coord::new(-1, 1),
            Self::W => Coord::new(-1, 0),
            Self::NW => Coord::new(-1, -1),
        }
    }

    pub fn from_delta(delta: Coord) -> Option<Self> {
        let normalized = Coord::new(delta.x.signum(), delta.y.signum());
        Self::ALL
            .into_iter()
            .find(|direction| direction.delta() == normalized)
    }

    fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|direction| *direction == self)
            .unwrap_or(0)
    }

    /// Rotates by `steps` eighth-turns; positive is clockwise.
    pub fn rotated(self, steps: i32) -> Self {
        let index = (self.index() as i32 + steps).rem_euclid(8) as usize;
        Self::ALL[index]
    }

    pub fn opposite(self) -> Self {
        self.rotated(4)
    }

    pub fn angle_degrees(self) -> f64 {
        angle_of_delta(self.delta())
    }

    /// Nearest of the eight directions to an angle.
    pub fn from_angle_degrees(angle: f64) -> Self {
        let normalized = normalize_degrees(angle);
        // index 0 is north (90 degrees) and the sequence runs clockwise
        let clockwise_from_north = normalize_degrees(90.0 - normalized);
        let sector = ((clockwise_from_north + 22.5).rem_euclid(360.0) / 45.0).floor() as usize;
        Self::ALL[sector % 8]
    }

    pub fn is_diagonal(self) -> bool {
        matches!(self, Self::NE | Self::SE | Self::SW | Self::NW)
    }
}

/// The four sides of a tile, used for cover lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Up,
    Right,
    Down,
    Left,
}

impl Side {
    pub fn direction(self) -> Direction {
        match self {
            Self::Up => Direction::N,
            Self::Right => Direction::E,
            Self::Down => Direction::S,
            Self::Left => Direction::W,
        }
    }
}

pub fn angle_of_delta(delta: Coord) -> f64 {
    (-(delta.y as f64)).atan2(delta.x as f64).to_degrees()
}

/// Angle from `from` toward `to`, in degrees within `(-180, 180]`.
pub fn angle_between(from: Coord, to: Coord) -> f64 {
    angle_of_delta(to - from)
}

pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Smallest absolute difference between two angles, in `[0, 180]`.
pub fn angle_difference(a: f64, b: f64) -> f64 {
    normalize_degrees(a - b).abs()
}

pub fn distance(a: Coord, b: Coord) -> f64 {
    let dx = (b.x - a.x) as f64;
    let dy = (b.y - a.y) as f64;
    (dx * dx + dy * dy).sqrt()
}

pub fn chebyshev_distance(a: Coord, b: Coord) -> u32 {
    a.x.abs_diff(b.x).max(a.y.abs_diff(b.y))
}

pub fn manhattan_distance(a: Coord, b: Coord) -> u32 {
    a.x.abs_diff(b.x).saturating_add(a.y.abs_diff(b.y))
}

/// Bresenham rasterization, both endpoints included.
pub fn line_between(from: Coord, to: Coord) -> Vec<Coord> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let step_x = if from.x < to.x { 1 } else { -1 };
    let step_y = if from.y < to.y { 1 } else { -1 };
    let mut error = dx + dy;
    let mut current = from;
    let mut tiles = Vec::with_capacity((dx.max(-dy) + 1) as usize);

    loop {
        tiles.push(current);
        if current == to {
            break;
        }
        let doubled = 2 * error;
        if doubled >= dy {
            error += dy;
            current.x += step_x;
        }
        if doubled <= dx {
            error += dx;
            current.y += step_y;
        }
    }
    tiles
}

/// Tiles along the ray from `from` through `through`, excluding `from`, at most `length` long.
pub fn ray_through(from: Coord, through: Coord, length: usize) -> Vec<Coord> {
    if from == through || length == 0 {
        return Vec::new();
    }
    let delta = through - from;
    let scale = (length as i32).max(1) * 2;
    let far = Coord::new(from.x + delta.x * scale, from.y + delta.y * scale);
    line_between(from, far)
        .into_iter()
        .skip(1)
        .take(length)
        .collect()
}

pub fn polar_to_cartesian(origin: Coord, polar: PolarCoord) -> Coord {
    let radians = polar.angle_degrees.to_radians();
    let x = origin.x as f64 + polar.radius * radians.cos();
    let y = origin.y as f64 - polar.radius * radians.sin();
    Coord::new(x.round() as i32, y.round() as i32)
}

pub fn cartesian_to_polar(origin: Coord, point: Coord) -> PolarCoord {
    PolarCoord {
        angle_degrees: angle_between(origin, point),
        radius: distance(origin, point),
    }
}

/// Sides a shot arriving from `angle_from_target_to_source` passes through.
///
/// Exact diagonals count as two sides; every other angle maps to the single closest side.
pub fn cover_sides(angle_from_target_to_source: f64) -> Vec<Side> {
    let angle = normalize_degrees(angle_from_target_to_source);
    const EPSILON: f64 = 1e-9;
    let diagonal = |target: f64| (angle - target).abs() < EPSILON;
    if diagonal(45.0) {
        return vec![Side::Up, Side::Right];
    }
    if diagonal(135.0) {
        return vec![Side::Up, Side::Left];
    }
    if diagonal(-45.0) {
        return vec![Side::Down, Side::Right];
    }
    if diagonal(-135.0) {
        return vec![Side::Down, Side::Left];
    }

    let side = if (-45.0..45.0).contains(&angle) {
        Side::Right
    } else if (45.0..135.0).contains(&angle) {
        Side::Up
    } else if (-135.0..-45.0).contains(&angle) {
        Side::Down
    } else {
        Side::Left
    };
    vec![side]
}
