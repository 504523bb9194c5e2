use std::f64::consts::FRAC_PI_6;

use crate::model::Point;

pub const MODEL_TO_RENDER: f64 = 50.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct IsoPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

pub fn to_isometric(x: f64, y: f64, z: f64) -> IsoPoint {
    let (sin, cos) = FRAC_PI_6.sin_cos();
    IsoPoint {
        x: (x - y) * cos / MODEL_TO_RENDER,
        y: ((x + y) * sin - z) / MODEL_TO_RENDER,
        z: z / MODEL_TO_RENDER,
    }
}

pub fn from_isometric(iso_x: f64, iso_y: f64) -> Point {
    let (sin, cos) = FRAC_PI_6.sin_cos();
    let diff = iso_x * MODEL_TO_RENDER / cos;
    let sum = iso_y * MODEL_TO_RENDER / sin;
    Point::new((sum + diff) * 0.5, (sum - diff) * 0.5)
}

pub fn rotate_ground(p: Point, angle: f64) -> Point {
    if angle == 0.0 {
        return p;
    }
    let (sin, cos) = angle.sin_cos();
    Point::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos)
}
