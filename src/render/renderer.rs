//! Per-frame draw list for the graph overlay and HUD.

use super::canvas::{Canvas, Color, LINE_HEIGHT, text_width};
use crate::{
    config::RenderConfig,
    interaction::Mode,
    scene::{NodeId, SceneGraph, ScreenPoint},
    types::GestureKind,
};

const EDGE_COLOR: Color = [100, 100, 100, 255];
const OUTLINE_COLOR: Color = [255, 255, 255, 255];
const SELECTED_RING_COLOR: Color = [0, 255, 255, 255];
const LABEL_COLOR: Color = [255, 255, 255, 255];
const LABEL_BACKGROUND: Color = [0, 0, 0, 255];
const HUD_PANEL: Color = [0, 0, 0, 140];
const MODE_COLOR: Color = [0, 255, 0, 255];
const ZOOM_COLOR: Color = [255, 255, 0, 255];
const GESTURE_COLOR: Color = [0, 128, 255, 255];
const TEXT_COLOR: Color = [255, 255, 255, 255];

const EDGE_THICKNESS: i32 = 2;
const HUD_SCALE: i32 = 2;
const LABEL_SCALE: i32 = 1;

pub const INSTRUCTIONS: [&str; 4] = [
    "Pinch + drag to move nodes",
    "Fist + move to rotate graph",
    "Two hands to zoom in/out",
    "Say or type: rotate mode, drag mode, zoom mode",
];

/// Interaction state shown in the HUD.
#[derive(Clone, Copy, Debug)]
pub struct HudState {
    pub mode: Mode,
    pub last_gesture: GestureKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Edge {
        from: ScreenPoint,
        to: ScreenPoint,
    },
    Node {
        id: NodeId,
        center: ScreenPoint,
        radius: i32,
        color: [u8; 3],
        selected: bool,
    },
    Label {
        anchor: ScreenPoint,
        offset: i32,
        text: String,
    },
    Hud {
        lines: Vec<(String, Color)>,
        corner: String,
    },
}

pub struct Renderer {
    cfg: RenderConfig,
}

impl Renderer {
    pub fn new(cfg: RenderConfig) -> Self {
        Self { cfg }
    }

    /// Edges first, then nodes farthest-first with their labels, then HUD.
    pub fn draw_list(&self, scene: &SceneGraph, hud: HudState) -> Vec<DrawOp> {
        let camera = scene.camera();
        let (width, height) = camera.viewport();
        let screen: Vec<Option<ScreenPoint>> = scene
            .all_screen_positions()
            .into_iter()
            .map(|(_, p)| p.screen().filter(|s| s.within(width, height)))
            .collect();

        let mut ops = Vec::with_capacity(scene.edges().len() + scene.nodes().len() * 2 + 1);
        for edge in scene.edges() {
            let on_screen = |id: NodeId| screen.get(id.0).copied().flatten();
            if let (Some(from), Some(to)) = (on_screen(edge.0), on_screen(edge.1)) {
                ops.push(DrawOp::Edge { from, to });
            }
        }

        for id in scene.depth_order() {
            let (Some(node), Some(Some(center))) = (scene.node(id), screen.get(id.0)) else {
                continue;
            };
            let selected = scene.selected() == Some(id);
            let radius = if selected {
                self.cfg.selected_radius
            } else {
                self.cfg.node_radius
            };
            ops.push(DrawOp::Node {
                id,
                center: *center,
                radius,
                color: node.color,
                selected,
            });
            if self.cfg.draw_labels {
                ops.push(DrawOp::Label {
                    anchor: *center,
                    offset: radius + 2,
                    text: node.label.clone(),
                });
            }
        }

        let mut lines = vec![
            (format!("Mode: {}", hud.mode.label().to_uppercase()), MODE_COLOR),
            (format!("Gesture: {}", hud.last_gesture.label()), GESTURE_COLOR),
            (
                format!("Nodes: {}  Edges: {}", scene.nodes().len(), scene.edges().len()),
                TEXT_COLOR,
            ),
        ];
        lines.extend(INSTRUCTIONS.iter().map(|s| (s.to_string(), TEXT_COLOR)));
        ops.push(DrawOp::Hud {
            lines,
            corner: format!("Zoom: {:.1}x", camera.zoom()),
        });
        ops
    }

    pub fn paint(&self, canvas: &mut dyn Canvas, ops: &[DrawOp]) {
        for op in ops {
            match op {
                DrawOp::Edge { from, to } => {
                    canvas.line((from.x, from.y), (to.x, to.y), EDGE_COLOR, EDGE_THICKNESS);
                }
                DrawOp::Node {
                    center,
                    radius,
                    color,
                    selected,
                    ..
                } => {
                    let c = center.as_pixel();
                    if *selected {
                        canvas.ring(c, radius + 4, SELECTED_RING_COLOR, 2);
                    }
                    canvas.fill_circle(c, *radius, [color[0], color[1], color[2], 255]);
                    canvas.ring(c, *radius, OUTLINE_COLOR, 1);
                }
                DrawOp::Label {
                    anchor,
                    offset,
                    text,
                } => {
                    let (x, y) = anchor.as_pixel();
                    let w = text_width(text, LABEL_SCALE);
                    let origin = (x - w / 2, y + offset);
                    canvas.fill_rect(
                        origin.0 - 2,
                        origin.1 - 2,
                        w + 3,
                        LINE_HEIGHT + 2,
                        LABEL_BACKGROUND,
                    );
                    canvas.text(origin, text, LABEL_COLOR, LABEL_SCALE);
                }
                DrawOp::Hud { lines, corner } => self.paint_hud(canvas, lines, corner),
            }
        }
    }

    fn paint_hud(&self, canvas: &mut dyn Canvas, lines: &[(String, Color)], corner: &str) {
        let line_height = LINE_HEIGHT * HUD_SCALE + 4;
        let panel_w = lines
            .iter()
            .map(|(text, _)| text_width(text, HUD_SCALE))
            .max()
            .unwrap_or(0);
        canvas.fill_rect(4, 4, panel_w + 12, line_height * lines.len() as i32 + 8, HUD_PANEL);
        for (i, (text, color)) in lines.iter().enumerate() {
            canvas.text((10, 10 + i as i32 * line_height), text, *color, HUD_SCALE);
        }

        let (width, _) = canvas.size();
        let corner_w = text_width(corner, HUD_SCALE);
        canvas.text((width as i32 - corner_w - 10, 10), corner, ZOOM_COLOR, HUD_SCALE);
    }

    pub fn render(&self, canvas: &mut dyn Canvas, scene: &SceneGraph, hud: HudState) {
        let ops = self.draw_list(scene, hud);
        self.paint(canvas, &ops);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        render::canvas::RgbaCanvas,
        scene::{camera::Projection, loader::GraphData},
        types::Frame,
    };

    fn hud() -> HudState {
        HudState {
            mode: Mode::Rotate,
            last_gesture: GestureKind::None,
        }
    }

    fn scene_with(labels: &[&str], edges: Vec<(usize, usize)>) -> SceneGraph {
        SceneGraph::new(
            &AppConfig::default(),
            GraphData {
                labels: labels.iter().map(|s| s.to_string()).collect(),
                edges,
            },
        )
    }

    fn node_ids(ops: &[DrawOp]) -> Vec<NodeId> {
        ops.iter()
            .filter_map(|op| match op {
                DrawOp::Node { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn sample_scene_draws_every_node_back_to_front() {
        let scene = SceneGraph::sample(&AppConfig::default());
        let renderer = Renderer::new(RenderConfig::default());
        let ops = renderer.draw_list(&scene, hud());
        assert_eq!(node_ids(&ops), scene.depth_order());
        let edges = ops.iter().filter(|op| matches!(op, DrawOp::Edge { .. })).count();
        assert_eq!(edges, scene.edges().len());
        assert!(matches!(ops.last(), Some(DrawOp::Hud { .. })));
    }

    #[test]
    fn edges_need_both_endpoints_on_screen() {
        let mut scene = scene_with(&["a", "b", "c"], vec![(0, 1), (1, 2)]);
        // Push node 2 behind the eye.
        scene.apply_drag(NodeId(2), [0.0, 0.0, 20.0]);
        assert_eq!(
            scene.camera().project(scene.nodes()[2].position),
            Projection::Offscreen
        );
        let ops = Renderer::new(RenderConfig::default()).draw_list(&scene, hud());
        let edges = ops.iter().filter(|op| matches!(op, DrawOp::Edge { .. })).count();
        assert_eq!(edges, 1);
        assert!(!node_ids(&ops).contains(&NodeId(2)));
    }

    #[test]
    fn selected_node_is_enlarged() {
        let mut scene = scene_with(&["a", "b"], vec![(0, 1)]);
        scene.apply_drag(NodeId(1), [0.0, 0.0, 0.0]);
        let cfg = RenderConfig::default();
        let ops = Renderer::new(cfg.clone()).draw_list(&scene, hud());
        for op in &ops {
            if let DrawOp::Node {
                id,
                radius,
                selected,
                ..
            } = op
            {
                assert_eq!(*selected, *id == NodeId(1));
                let expected = if *selected {
                    cfg.selected_radius
                } else {
                    cfg.node_radius
                };
                assert_eq!(*radius, expected);
            }
        }
    }

    #[test]
    fn hud_reports_mode_zoom_and_counts() {
        let scene = scene_with(&["a", "b"], vec![(0, 1)]);
        let ops = Renderer::new(RenderConfig::default()).draw_list(
            &scene,
            HudState {
                mode: Mode::Drag,
                last_gesture: GestureKind::Pinch,
            },
        );
        let Some(DrawOp::Hud { lines, corner }) = ops.last() else {
            panic!("missing hud");
        };
        assert_eq!(corner, "Zoom: 1.5x");
        let texts: Vec<&str> = lines.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(texts[0], "Mode: DRAG");
        assert_eq!(texts[1], "Gesture: pinch");
        assert_eq!(texts[2], "Nodes: 2  Edges: 1");
        assert_eq!(&texts[3..], &INSTRUCTIONS);
    }

    #[test]
    fn labels_can_be_disabled() {
        let scene = scene_with(&["a", "b"], vec![]);
        let cfg = RenderConfig {
            draw_labels: false,
            ..RenderConfig::default()
        };
        let ops = Renderer::new(cfg).draw_list(&scene, hud());
        assert!(!ops.iter().any(|op| matches!(op, DrawOp::Label { .. })));
    }

    #[test]
    fn paint_changes_pixels() {
        let scene = SceneGraph::sample(&AppConfig::default());
        let mut frame = Frame::solid(640, 480, [0, 0, 0, 255]);
        let before = frame.rgba.clone();
        Renderer::new(RenderConfig::default()).render(&mut RgbaCanvas::new(&mut frame), &scene, hud());
        assert_ne!(before, frame.rgba);
    }
}
