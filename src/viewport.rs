use crate::model::{Point, Viewport};
use crate::projection::{from_isometric, rotate_ground, to_isometric};

pub const MIN_ZOOM: f64 = 0.2;
pub const MAX_ZOOM: f64 = 4.0;
pub const DEFAULT_WHEEL_SENSITIVITY: f64 = 0.001;
pub const PIXELS_PER_UNIT: f64 = 60.0;
pub const ZOOM_STEP: f64 = 1.25;

const ROTATE_SPEED: f64 = 0.01;
const MAX_TILT: f64 = 1.2;

pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        return MIN_ZOOM;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

impl Viewport {
    fn scale(&self) -> f64 {
        PIXELS_PER_UNIT * self.zoom
    }

    fn tilt(&self) -> f64 {
        self.rotation.x.clamp(-MAX_TILT, MAX_TILT).cos()
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = clamp_zoom(zoom);
    }

    pub fn zoom_by(&mut self, factor: f64) {
        self.set_zoom(self.zoom * factor);
    }

    pub fn apply_wheel(&mut self, delta_y: f64, sensitivity: f64) {
        self.zoom_by(1.0 - delta_y * sensitivity);
    }

    /// Pans by a pointer delta in screen pixels. Screen y grows downwards while the
    /// viewport offset grows upwards, so the y component is inverted.
    pub fn pan_by_screen(&mut self, dx: f64, dy: f64) {
        let scale = self.scale();
        self.x += dx / scale;
        self.y -= dy / scale;
    }

    pub fn rotate_by_screen(&mut self, dx: f64, dy: f64) {
        self.rotation.y += dx * ROTATE_SPEED;
        self.rotation.x = (self.rotation.x + dy * ROTATE_SPEED).clamp(-MAX_TILT, MAX_TILT);
    }

    pub fn reset(&mut self) {
        *self = Viewport::default();
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ScreenTransform {
    pub center: Point,
    pub viewport: Viewport,
}

impl ScreenTransform {
    pub fn new(center: Point, viewport: Viewport) -> Self {
        Self { center, viewport }
    }

    pub fn model_to_screen(&self, p: Point, z: f64) -> Point {
        let ground = rotate_ground(p, self.viewport.rotation.y);
        let iso = to_isometric(ground.x, ground.y, z);
        self.render_to_screen(iso.x, iso.y)
    }

    pub fn render_to_screen(&self, iso_x: f64, iso_y: f64) -> Point {
        let vp = &self.viewport;
        let scale = vp.scale();
        Point::new(
            self.center.x + (iso_x + vp.x) * scale,
            self.center.y + (iso_y * vp.tilt() - vp.y) * scale,
        )
    }

    pub fn screen_to_model(&self, s: Point) -> Point {
        let vp = &self.viewport;
        let scale = vp.scale();
        let iso_x = (s.x - self.center.x) / scale - vp.x;
        let iso_y = ((s.y - self.center.y) / scale + vp.y) / vp.tilt();
        rotate_ground(from_isometric(iso_x, iso_y), -vp.rotation.y)
    }

    pub fn pixels_per_model_unit(&self) -> f64 {
        self.viewport.scale() / crate::projection::MODEL_TO_RENDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rotation;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn wheel_zoom_pins_to_bounds() {
        let mut vp = Viewport::default();
        for _ in 0..200 {
            vp.apply_wheel(400.0, DEFAULT_WHEEL_SENSITIVITY);
            assert!(vp.zoom >= MIN_ZOOM);
        }
        assert_eq!(vp.zoom, MIN_ZOOM);

        for _ in 0..200 {
            vp.apply_wheel(-400.0, DEFAULT_WHEEL_SENSITIVITY);
            assert!(vp.zoom <= MAX_ZOOM);
        }
        assert_eq!(vp.zoom, MAX_ZOOM);
    }

    #[test]
    fn degenerate_wheel_never_reaches_zero() {
        let mut vp = Viewport::default();
        // 1 - 5000 * 0.001 is negative.
        vp.apply_wheel(5000.0, DEFAULT_WHEEL_SENSITIVITY);
        assert_eq!(vp.zoom, MIN_ZOOM);
        vp.set_zoom(f64::NAN);
        assert_eq!(vp.zoom, MIN_ZOOM);
        vp.set_zoom(f64::INFINITY);
        assert_eq!(vp.zoom, MAX_ZOOM);
    }

    #[test]
    fn pan_inverts_screen_y() {
        let mut vp = Viewport::default();
        vp.pan_by_screen(PIXELS_PER_UNIT, PIXELS_PER_UNIT);
        assert!(close(vp.x, 1.0));
        assert!(close(vp.y, -1.0));
    }

    #[test]
    fn pan_is_scaled_by_zoom() {
        let mut vp = Viewport {
            zoom: 2.0,
            ..Viewport::default()
        };
        vp.pan_by_screen(PIXELS_PER_UNIT, 0.0);
        assert!(close(vp.x, 0.5));
    }

    #[test]
    fn content_follows_the_pointer_when_panning() {
        let center = Point::new(400.0, 300.0);
        let mut vp = Viewport::default();
        let p = Point::new(30.0, -10.0);
        let before = ScreenTransform::new(center, vp).model_to_screen(p, 0.0);
        vp.pan_by_screen(12.0, -7.0);
        let after = ScreenTransform::new(center, vp).model_to_screen(p, 0.0);
        assert!(close(after.x - before.x, 12.0));
        assert!(close(after.y - before.y, -7.0));
    }

    #[test]
    fn screen_round_trip_with_rotation() {
        let vp = Viewport {
            x: 1.5,
            y: -0.75,
            zoom: 1.7,
            rotation: Rotation { x: 0.4, y: 0.9 },
        };
        let t = ScreenTransform::new(Point::new(320.0, 240.0), vp);
        for p in [Point::new(0.0, 0.0), Point::new(123.0, -45.5), Point::new(-800.0, 3.0)] {
            let s = t.model_to_screen(p, 0.0);
            let back = t.screen_to_model(s);
            assert!(close(back.x, p.x) && close(back.y, p.y), "{p:?} -> {back:?}");
        }
    }

    #[test]
    fn tilt_is_clamped() {
        let mut vp = Viewport::default();
        vp.rotate_by_screen(0.0, 10_000.0);
        assert_eq!(vp.rotation.x, MAX_TILT);
        vp.rotate_by_screen(50.0, 0.0);
        assert!(close(vp.rotation.y, 0.5));
    }
}
