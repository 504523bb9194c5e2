use crate::model::{Point, Rgba, Viewport, Workspace};
use crate::scene::{self, DrawCommand, SceneInput};
use crate::viewport::ScreenTransform;

const PADDING: f64 = 24.0;

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

fn rgba_to_svg_rgb(rgba: Rgba) -> (String, f64) {
    let opacity = rgba.a as f64 / 255.0;
    (format!("rgb({},{},{})", rgba.r, rgba.g, rgba.b), opacity)
}

fn points_attr(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{:.3},{:.3}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(super) fn workspace_to_svg(ws: &Workspace) -> String {
    let viewport = Viewport {
        x: 0.0,
        y: 0.0,
        zoom: 1.0,
        rotation: ws.viewport.rotation,
    };
    let input = SceneInput::new(ScreenTransform::new(Point::default(), viewport));
    let scene = scene::build_scene(ws, &input);

    let (min, max) = scene
        .bounds()
        .unwrap_or((Point::new(0.0, 0.0), Point::new(800.0, 600.0)));
    let min_x = min.x - PADDING;
    let min_y = min.y - PADDING;
    let width = max.x - min.x + PADDING * 2.0;
    let height = max.y - min.y + PADDING * 2.0;

    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    out.push('\n');
    out.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{:.3} {:.3} {:.3} {:.3}" width="{:.3}" height="{:.3}">"#,
        min_x, min_y, width, height, width, height
    ));
    out.push('\n');

    for command in &scene.commands {
        match command {
            DrawCommand::Polygon {
                points,
                fill,
                stroke,
            } => {
                let (fill_rgb, fill_opacity) = rgba_to_svg_rgb(*fill);
                let stroke_attrs = match stroke {
                    Some(s) => {
                        let (rgb, opacity) = rgba_to_svg_rgb(s.color);
                        format!(
                            r#"stroke="{}" stroke-opacity="{:.3}" stroke-width="{:.3}" stroke-linejoin="round""#,
                            rgb, opacity, s.width
                        )
                    }
                    None => r#"stroke="none""#.to_string(),
                };
                out.push_str(&format!(
                    r#"<polygon points="{}" fill="{}" fill-opacity="{:.3}" {} />"#,
                    points_attr(points),
                    fill_rgb,
                    fill_opacity,
                    stroke_attrs
                ));
            }
            DrawCommand::Polyline {
                points,
                stroke,
                dashed,
            } => {
                let (rgb, opacity) = rgba_to_svg_rgb(stroke.color);
                let dash = if *dashed {
                    format!(
                        r#" stroke-dasharray="{:.3} {:.3}""#,
                        stroke.width * 4.0,
                        stroke.width * 2.5
                    )
                } else {
                    String::new()
                };
                out.push_str(&format!(
                    r#"<polyline points="{}" fill="none" stroke="{}" stroke-opacity="{:.3}" stroke-width="{:.3}"{} />"#,
                    points_attr(points),
                    rgb,
                    opacity,
                    stroke.width,
                    dash
                ));
            }
            DrawCommand::Text {
                at,
                text,
                size,
                color,
            } => {
                let (rgb, opacity) = rgba_to_svg_rgb(*color);
                out.push_str(&format!(
                    r#"<text x="{:.3}" y="{:.3}" font-family="sans-serif" font-size="{:.3}" text-anchor="middle" dominant-baseline="middle" fill="{}" fill-opacity="{:.3}">{}</text>"#,
                    at.x,
                    at.y,
                    size,
                    rgb,
                    opacity,
                    escape_xml(text)
                ));
            }
        }
        out.push('\n');
    }
    out.push_str("</svg>\n");
    out
}
