use eframe::egui;

use crate::model::{Point, Rgba, Workspace};
use crate::scene::{DrawCommand, Scene};
use crate::tools::Tool;
use crate::viewport::ScreenTransform;

const MAX_GRID_LINES: usize = 200;
const MIN_GRID_SPACING_PX: f64 = 14.0;

pub(super) fn to_pos(p: Point) -> egui::Pos2 {
    egui::pos2(p.x as f32, p.y as f32)
}

pub(super) fn to_point(p: egui::Pos2) -> Point {
    Point::new(p.x as f64, p.y as f64)
}

pub(super) fn to_color(c: Rgba) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.a)
}

pub(super) fn from_color(c: egui::Color32) -> Rgba {
    let [r, g, b, a] = c.to_srgba_unmultiplied();
    Rgba { r, g, b, a }
}

pub(super) fn transform_for(rect: egui::Rect, ws: &Workspace) -> ScreenTransform {
    ScreenTransform::new(to_point(rect.center()), ws.viewport)
}

pub(super) fn tool_button(ui: &mut egui::Ui, tool: Tool, active: Tool) -> bool {
    let label = format!("{} ({})", tool.label(), tool.shortcut());
    ui.selectable_label(active == tool, label).clicked()
}

pub(super) fn draw_background(
    painter: &egui::Painter,
    rect: egui::Rect,
    t: &ScreenTransform,
    ws: &Workspace,
) {
    let bg = painter.ctx().style().visuals.extreme_bg_color;
    painter.rect_filled(rect, 0.0, bg);

    let mut step = ws.grid_size.max(f64::EPSILON);
    let px_per_unit = t.pixels_per_model_unit();
    while step * px_per_unit < MIN_GRID_SPACING_PX {
        step *= 2.0;
    }

    let corners = [
        rect.left_top(),
        rect.right_top(),
        rect.left_bottom(),
        rect.right_bottom(),
    ]
    .map(|c| t.screen_to_model(to_point(c)));
    let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
    if !(min_x.is_finite() && max_x.is_finite() && min_y.is_finite() && max_y.is_finite()) {
        return;
    }

    let minor = if ws.snap_to_grid {
        egui::Color32::from_gray(62)
    } else {
        egui::Color32::from_gray(48)
    };
    let axis = egui::Color32::from_rgb(71, 85, 105);

    let first_x = (min_x / step).floor() as i64;
    let last_x = (max_x / step).ceil() as i64;
    for i in (first_x..=last_x).take(MAX_GRID_LINES) {
        let x = i as f64 * step;
        let color = if i == 0 { axis } else { minor };
        painter.line_segment(
            [
                to_pos(t.model_to_screen(Point::new(x, min_y), 0.0)),
                to_pos(t.model_to_screen(Point::new(x, max_y), 0.0)),
            ],
            egui::Stroke::new(1.0, color),
        );
    }
    let first_y = (min_y / step).floor() as i64;
    let last_y = (max_y / step).ceil() as i64;
    for j in (first_y..=last_y).take(MAX_GRID_LINES) {
        let y = j as f64 * step;
        let color = if j == 0 { axis } else { minor };
        painter.line_segment(
            [
                to_pos(t.model_to_screen(Point::new(min_x, y), 0.0)),
                to_pos(t.model_to_screen(Point::new(max_x, y), 0.0)),
            ],
            egui::Stroke::new(1.0, color),
        );
    }
}

pub(super) fn draw_scene(painter: &egui::Painter, scene: &Scene) {
    for command in &scene.commands {
        match command {
            DrawCommand::Polygon {
                points,
                fill,
                stroke,
            } => {
                let stroke = stroke.map_or(egui::Stroke::NONE, |s| {
                    egui::Stroke::new(s.width as f32, to_color(s.color))
                });
                painter.add(egui::Shape::convex_polygon(
                    points.iter().copied().map(to_pos).collect(),
                    to_color(*fill),
                    stroke,
                ));
            }
            DrawCommand::Polyline {
                points,
                stroke,
                dashed,
            } => {
                let egui_stroke = egui::Stroke::new(stroke.width as f32, to_color(stroke.color));
                let points: Vec<egui::Pos2> = points.iter().copied().map(to_pos).collect();
                if *dashed {
                    let dash = stroke.width as f32 * 4.0;
                    for pair in points.windows(2) {
                        draw_dashed_line(painter, pair[0], pair[1], egui_stroke, dash, dash * 0.6);
                    }
                } else {
                    painter.add(egui::Shape::line(points, egui_stroke));
                }
            }
            DrawCommand::Text {
                at,
                text,
                size,
                color,
            } => {
                painter.text(
                    to_pos(*at),
                    egui::Align2::CENTER_CENTER,
                    text,
                    egui::FontId::proportional(*size as f32),
                    to_color(*color),
                );
            }
        }
    }
}

fn draw_dashed_line(
    painter: &egui::Painter,
    a: egui::Pos2,
    b: egui::Pos2,
    stroke: egui::Stroke,
    dash_len: f32,
    gap_len: f32,
) {
    let v = b - a;
    let len = v.length();
    if len <= f32::EPSILON {
        return;
    }
    let dir = v / len;
    let mut pos = 0.0;
    let mut drawing = true;
    while pos < len {
        let seg_len = if drawing { dash_len } else { gap_len };
        let next_pos = (pos + seg_len).min(len);
        if drawing {
            painter.line_segment([a + dir * pos, a + dir * next_pos], stroke);
        }
        pos = next_pos;
        drawing = !drawing;
    }
}
