use crate::model::{
    ArrowType, Connector, LineStyle, Node, NodeKind, Point, Polarity, Rgba, Workspace,
};
use crate::projection::rotate_ground;
use crate::viewport::ScreenTransform;

const SELECTED: Rgba = Rgba::rgb(250, 204, 21);
const PENDING: Rgba = Rgba::rgb(34, 211, 238);
const REINFORCING: Rgba = Rgba::rgb(34, 197, 94);
const BALANCING: Rgba = Rgba::rgb(239, 68, 68);
const ARROW_SIZE: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub width: f64,
    pub color: Rgba,
}

impl Stroke {
    pub fn new(width: f64, color: Rgba) -> Self {
        Self { width, color }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Polygon {
        points: Vec<Point>,
        fill: Rgba,
        stroke: Option<Stroke>,
    },
    Polyline {
        points: Vec<Point>,
        stroke: Stroke,
        dashed: bool,
    },
    Text {
        at: Point,
        text: String,
        size: f64,
        color: Rgba,
    },
}

#[derive(Clone, Copy, Debug)]
pub struct SceneInput<'a> {
    pub transform: ScreenTransform,
    pub selection: Option<&'a str>,
    pub pending_from: Option<&'a str>,
    pub pointer: Option<Point>,
}

impl<'a> SceneInput<'a> {
    pub fn new(transform: ScreenTransform) -> Self {
        Self {
            transform,
            selection: None,
            pending_from: None,
            pointer: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    pub commands: Vec<DrawCommand>,
}

impl Scene {
    pub fn bounds(&self) -> Option<(Point, Point)> {
        let mut points = self.commands.iter().flat_map(|c| match c {
            DrawCommand::Polygon { points, .. } | DrawCommand::Polyline { points, .. } => {
                points.clone()
            }
            DrawCommand::Text { at, .. } => vec![*at],
        });
        let first = points.next()?;
        Some(points.fold((first, first), |(min, max), p| {
            (
                Point::new(min.x.min(p.x), min.y.min(p.y)),
                Point::new(max.x.max(p.x), max.y.max(p.y)),
            )
        }))
    }
}

pub fn extrusion(kind: NodeKind) -> f64 {
    match kind {
        NodeKind::Stock => 40.0,
        NodeKind::Flow => 20.0,
        NodeKind::Auxiliary => 30.0,
        NodeKind::Connector => 8.0,
    }
}

fn shade(c: Rgba, factor: f64) -> Rgba {
    let f = |v: u8| (v as f64 * factor).round().clamp(0.0, 255.0) as u8;
    Rgba {
        r: f(c.r),
        g: f(c.g),
        b: f(c.b),
        a: c.a,
    }
}

fn text_color_on(c: Rgba) -> Rgba {
    let luma = 0.299 * c.r as f64 + 0.587 * c.g as f64 + 0.114 * c.b as f64;
    if luma > 140.0 {
        Rgba::rgb(15, 23, 42)
    } else {
        Rgba::rgb(248, 250, 252)
    }
}

fn depth(p: Point, yaw: f64) -> f64 {
    let r = rotate_ground(p, yaw);
    r.x + r.y
}

fn footprint(node: &Node) -> [Point; 4] {
    let (hw, hh) = (node.width * 0.5, node.height * 0.5);
    [
        Point::new(node.x - hw, node.y - hh),
        Point::new(node.x + hw, node.y - hh),
        Point::new(node.x + hw, node.y + hh),
        Point::new(node.x - hw, node.y + hh),
    ]
}

pub fn paint_order<'w>(ws: &'w Workspace, yaw: f64) -> Vec<&'w Node> {
    let mut nodes = ws.visible_nodes();
    nodes.sort_by(|a, b| {
        ws.layer_rank(&a.layer)
            .cmp(&ws.layer_rank(&b.layer))
            .then_with(|| depth(a.position(), yaw).total_cmp(&depth(b.position(), yaw)))
            .then_with(|| a.z.total_cmp(&b.z))
    });
    nodes
}

pub fn build_scene(ws: &Workspace, input: &SceneInput) -> Scene {
    let mut scene = Scene::default();
    let t = &input.transform;

    let mut connectors = ws.visible_connectors();
    connectors.sort_by_key(|c| ws.layer_rank(&c.layer));
    for connector in connectors {
        push_connector(&mut scene, ws, t, connector);
    }

    let pending = input.pending_from.and_then(|id| ws.node(id));
    if let (Some(from), Some(pointer)) = (pending, input.pointer) {
        let mid = from.z + extrusion(from.kind) * 0.5;
        scene.commands.push(DrawCommand::Polyline {
            points: vec![t.model_to_screen(from.position(), mid), t.model_to_screen(pointer, 0.0)],
            stroke: Stroke::new(1.5, PENDING),
            dashed: true,
        });
    }

    for node in paint_order(ws, t.viewport.rotation.y) {
        let outline = if input.selection == Some(node.id.as_str()) {
            Stroke::new(2.5, SELECTED)
        } else if input.pending_from == Some(node.id.as_str()) {
            Stroke::new(2.5, PENDING)
        } else {
            Stroke::new(1.0, shade(node.color, 0.5))
        };
        push_node(&mut scene, t, node, outline);
    }
    scene
}

fn push_node(scene: &mut Scene, t: &ScreenTransform, node: &Node, outline: Stroke) {
    let yaw = t.viewport.rotation.y;
    let corners = footprint(node);
    let bottom = node.z;
    let top = node.z + extrusion(node.kind);

    let mut sides: Vec<(f64, usize)> = (0..4)
        .map(|i| {
            let a = corners[i];
            let b = corners[(i + 1) % 4];
            (depth(Point::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5), yaw), i)
        })
        .collect();
    sides.sort_by(|a, b| a.0.total_cmp(&b.0));

    for (_, i) in sides {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        let factor = if i % 2 == 0 { 0.8 } else { 0.65 };
        scene.commands.push(DrawCommand::Polygon {
            points: vec![
                t.model_to_screen(a, bottom),
                t.model_to_screen(b, bottom),
                t.model_to_screen(b, top),
                t.model_to_screen(a, top),
            ],
            fill: shade(node.color, factor),
            stroke: Some(outline),
        });
    }
    scene.commands.push(DrawCommand::Polygon {
        points: corners.iter().map(|c| t.model_to_screen(*c, top)).collect(),
        fill: node.color,
        stroke: Some(outline),
    });

    if !node.label.is_empty() {
        scene.commands.push(DrawCommand::Text {
            at: t.model_to_screen(node.position(), top),
            text: node.label.clone(),
            size: (13.0 * t.viewport.zoom).clamp(8.0, 32.0),
            color: text_color_on(node.color),
        });
    }
}

/// Where the segment from the node centre towards `toward` leaves the footprint.
fn exit_point(node: &Node, toward: Point) -> Point {
    let d = toward - node.position();
    let (hw, hh) = (node.width * 0.5, node.height * 0.5);
    let tx = if d.x.abs() > f64::EPSILON { hw / d.x.abs() } else { f64::INFINITY };
    let ty = if d.y.abs() > f64::EPSILON { hh / d.y.abs() } else { f64::INFINITY };
    let s = tx.min(ty).min(1.0);
    Point::new(node.x + d.x * s, node.y + d.y * s)
}

fn push_connector(scene: &mut Scene, ws: &Workspace, t: &ScreenTransform, c: &Connector) {
    let (Some(from), Some(to)) = (ws.node(&c.from), ws.node(&c.to)) else {
        return;
    };
    let from_z = from.z + extrusion(from.kind) * 0.5;
    let to_z = to.z + extrusion(to.kind) * 0.5;
    let bend_z = (from_z + to_z) * 0.5;
    let first = c.bends.first().map_or(to.position(), |b| Point::new(b.x, b.y));
    let last = c.bends.last().map_or(from.position(), |b| Point::new(b.x, b.y));

    let mut points = vec![t.model_to_screen(exit_point(from, first), from_z)];
    points.extend(c.bends.iter().map(|b| t.model_to_screen(Point::new(b.x, b.y), bend_z)));
    points.push(t.model_to_screen(exit_point(to, last), to_z));

    let color = match c.polarity {
        Polarity::Reinforcing => REINFORCING,
        Polarity::Balancing => BALANCING,
    };
    let scale = t.viewport.zoom.clamp(0.5, 2.0);
    let n = points.len();
    let (a, b) = (points[(n - 1) / 2], points[n / 2]);
    let mid = Point::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5);

    let head = arrowhead(points[n - 2], points[n - 1], ARROW_SIZE * scale, color);
    let tail = (c.arrow == ArrowType::Double)
        .then(|| arrowhead(points[1], points[0], ARROW_SIZE * scale, color));

    scene.commands.push(DrawCommand::Polyline {
        points,
        stroke: Stroke::new(2.0 * scale, color),
        dashed: c.style == LineStyle::Dashed,
    });
    scene.commands.extend(head);
    scene.commands.extend(tail.flatten());
    scene.commands.push(DrawCommand::Text {
        at: mid,
        text: match c.polarity {
            Polarity::Reinforcing => "+".to_string(),
            Polarity::Balancing => "\u{2212}".to_string(),
        },
        size: 14.0 * scale,
        color,
    });
}

fn arrowhead(a: Point, b: Point, size: f64, color: Rgba) -> Option<DrawCommand> {
    let v = b - a;
    let len = v.x.hypot(v.y);
    if len <= f64::EPSILON {
        return None;
    }
    let dir = Point::new(v.x / len, v.y / len);
    let perp = Point::new(-dir.y, dir.x);
    let base = Point::new(b.x - dir.x * size, b.y - dir.y * size);
    let spread = size * 0.6;
    Some(DrawCommand::Polygon {
        points: vec![
            b,
            Point::new(base.x + perp.x * spread, base.y + perp.y * spread),
            Point::new(base.x - perp.x * spread, base.y - perp.y * spread),
        ],
        fill: color,
        stroke: None,
    })
}

fn silhouette(t: &ScreenTransform, node: &Node) -> Vec<Point> {
    let top = node.z + extrusion(node.kind);
    let points = footprint(node)
        .iter()
        .flat_map(|c| [t.model_to_screen(*c, node.z), t.model_to_screen(*c, top)])
        .collect();
    convex_hull(points)
}

fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn convex_hull(mut points: Vec<Point>) -> Vec<Point> {
    points.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    let half = |iter: &mut dyn Iterator<Item = Point>| {
        let mut chain: Vec<Point> = Vec::new();
        for p in iter {
            while chain.len() >= 2
                && cross(chain[chain.len() - 2], chain[chain.len() - 1], p) <= 0.0
            {
                chain.pop();
            }
            chain.push(p);
        }
        chain.pop();
        chain
    };
    let mut hull = half(&mut points.iter().copied());
    hull.extend(half(&mut points.iter().rev().copied()));
    hull
}

fn point_in_polygon(p: Point, poly: &[Point]) -> bool {
    let mut inside = false;
    let mut j = poly.len().wrapping_sub(1);
    for i in 0..poly.len() {
        let (a, b) = (poly[i], poly[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

pub fn hit_test(ws: &Workspace, t: &ScreenTransform, screen: Point) -> Option<String> {
    paint_order(ws, t.viewport.rotation.y)
        .into_iter()
        .rev()
        .find(|node| point_in_polygon(screen, &silhouette(t, node)))
        .map(|node| node.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DEFAULT_LAYER_ID, Viewport};

    fn transform() -> ScreenTransform {
        ScreenTransform::new(Point::new(400.0, 300.0), Viewport::default())
    }

    fn labelled(id: &str, layer: &str, x: f64, y: f64) -> Node {
        let mut n = Node::new(id, layer, x, y);
        n.label = id.to_string();
        n
    }

    fn labels(scene: &Scene) -> Vec<String> {
        scene
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn polygons(scene: &Scene) -> usize {
        scene
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Polygon { .. }))
            .count()
    }

    #[test]
    fn each_node_is_four_sides_and_a_top() {
        let mut ws = Workspace::default();
        ws.add_node(labelled("a", DEFAULT_LAYER_ID, 0.0, 0.0)).unwrap();
        let scene = build_scene(&ws, &SceneInput::new(transform()));
        assert_eq!(polygons(&scene), 5);
        assert_eq!(labels(&scene), vec!["a"]);
    }

    #[test]
    fn hidden_layers_draw_nothing() {
        let mut ws = Workspace::default();
        let notes = ws.add_layer("Notes");
        ws.add_node(labelled("a", DEFAULT_LAYER_ID, 0.0, 0.0)).unwrap();
        ws.add_node(labelled("b", &notes, 300.0, 0.0)).unwrap();
        ws.add_connector(Connector::new("ab", "a", "b", DEFAULT_LAYER_ID)).unwrap();
        ws.toggle_layer_visible(&notes).unwrap();

        let scene = build_scene(&ws, &SceneInput::new(transform()));
        assert_eq!(labels(&scene), vec!["a"]);
        assert!(!scene.commands.iter().any(|c| matches!(c, DrawCommand::Polyline { .. })));
    }

    #[test]
    fn nearer_nodes_paint_later_within_a_layer() {
        let mut ws = Workspace::default();
        ws.add_node(labelled("near", DEFAULT_LAYER_ID, 500.0, 500.0)).unwrap();
        ws.add_node(labelled("far", DEFAULT_LAYER_ID, -500.0, -500.0)).unwrap();
        let scene = build_scene(&ws, &SceneInput::new(transform()));
        assert_eq!(labels(&scene), vec!["far", "near"]);
    }

    #[test]
    fn layer_rank_beats_depth() {
        let mut ws = Workspace::default();
        let top = ws.add_layer("Top");
        ws.add_node(labelled("front", DEFAULT_LAYER_ID, 500.0, 500.0)).unwrap();
        ws.add_node(labelled("back", &top, -500.0, -500.0)).unwrap();
        let scene = build_scene(&ws, &SceneInput::new(transform()));
        assert_eq!(labels(&scene), vec!["front", "back"]);
    }

    #[test]
    fn selection_gets_highlight_outline() {
        let mut ws = Workspace::default();
        ws.add_node(Node::new("a", DEFAULT_LAYER_ID, 0.0, 0.0)).unwrap();
        let input = SceneInput {
            selection: Some("a"),
            ..SceneInput::new(transform())
        };
        let scene = build_scene(&ws, &input);
        assert!(scene.commands.iter().all(|c| match c {
            DrawCommand::Polygon { stroke, .. } => *stroke == Some(Stroke::new(2.5, SELECTED)),
            _ => true,
        }));
    }

    #[test]
    fn double_arrow_gets_two_heads() {
        let mut ws = Workspace::default();
        ws.add_node(Node::new("a", DEFAULT_LAYER_ID, 0.0, 0.0)).unwrap();
        ws.add_node(Node::new("b", DEFAULT_LAYER_ID, 400.0, 0.0)).unwrap();
        let mut c = Connector::new("ab", "a", "b", DEFAULT_LAYER_ID);
        c.arrow = ArrowType::Double;
        c.polarity = Polarity::Balancing;
        ws.add_connector(c).unwrap();
        let scene = build_scene(&ws, &SceneInput::new(transform()));
        assert_eq!(polygons(&scene), 10 + 2);
        assert!(labels(&scene).contains(&"\u{2212}".to_string()));
    }

    #[test]
    fn exit_point_lands_on_footprint_edge() {
        let n = Node::new("a", DEFAULT_LAYER_ID, 0.0, 0.0);
        let p = exit_point(&n, Point::new(1000.0, 0.0));
        assert!((p.x - n.width * 0.5).abs() < 1e-9 && p.y == 0.0);
        let q = exit_point(&n, Point::new(0.0, -1000.0));
        assert!(q.x == 0.0 && (q.y + n.height * 0.5).abs() < 1e-9);
        // Targets inside the footprint are returned unchanged.
        assert_eq!(exit_point(&n, Point::new(10.0, 5.0)), Point::new(10.0, 5.0));
    }

    #[test]
    fn hit_test_finds_topmost_visible_node() {
        let t = transform();
        let mut ws = Workspace::default();
        let top = ws.add_layer("Top");
        ws.add_node(Node::new("under", DEFAULT_LAYER_ID, 0.0, 0.0)).unwrap();
        ws.add_node(Node::new("over", &top, 0.0, 0.0)).unwrap();

        let center = t.model_to_screen(Point::new(0.0, 0.0), 0.0);
        assert_eq!(hit_test(&ws, &t, center), Some("over".to_string()));

        ws.toggle_layer_visible(&top).unwrap();
        assert_eq!(hit_test(&ws, &t, center), Some("under".to_string()));

        let far = t.model_to_screen(Point::new(5000.0, -5000.0), 0.0);
        assert_eq!(hit_test(&ws, &t, far), None);
    }

    #[test]
    fn bounds_cover_all_commands() {
        let mut ws = Workspace::default();
        ws.add_node(Node::new("a", DEFAULT_LAYER_ID, 0.0, 0.0)).unwrap();
        let scene = build_scene(&ws, &SceneInput::new(transform()));
        let (min, max) = scene.bounds().unwrap();
        assert!(min.x < 400.0 && max.x > 400.0);
        assert!(Scene::default().bounds().is_none());
    }
}
