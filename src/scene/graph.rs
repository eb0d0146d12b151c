use std::path::Path;

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{
    camera::{CameraProjection, Projection, ROTATION_SCALE, ScreenPoint, Vec3},
    layout::{LayoutParams, spring_layout},
    loader::{GraphData, GraphLoadError, load_graph_file},
};
use crate::config::{AppConfig, GraphConfig, InteractionConfig};

/// Drag displacements are scaled by `sensitivity * DRAG_SCALE` world units.
pub const DRAG_SCALE: f32 = 0.01;

/// Per-axis scale from the unit layout cube into the view volume.
const VIEW_EXTENT: Vec3 = [1.5, 1.5, 1.0];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub position: Vec3,
    pub color: [u8; 3],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge(pub NodeId, pub NodeId);

/// Graph topology and node positions; camera access goes through the
/// intent methods only.
pub struct SceneGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    camera: CameraProjection,
    selected: Option<NodeId>,
    interaction: InteractionConfig,
    layout: GraphConfig,
}

impl SceneGraph {
    pub fn new(config: &AppConfig, data: GraphData) -> Self {
        let mut scene = Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            camera: CameraProjection::new(config.camera.clone()),
            selected: None,
            interaction: config.interaction.clone(),
            layout: config.graph.clone(),
        };
        scene.replace_topology(data);
        scene
    }

    /// Builds the seeded random geometric sample graph.
    pub fn sample(config: &AppConfig) -> Self {
        Self::new(config, sample_graph(&config.graph))
    }

    /// Swaps in new topology and lays it out from scratch.
    pub fn reload(&mut self, data: GraphData) {
        self.replace_topology(data);
        log::info!(
            "graph reloaded: {} nodes, {} edges",
            self.nodes.len(),
            self.edges.len()
        );
    }

    /// Loads a graph file; on error the current graph is left untouched.
    pub fn load_file(&mut self, path: &Path) -> Result<(), GraphLoadError> {
        let data = load_graph_file(path)?;
        self.reload(data);
        Ok(())
    }

    fn replace_topology(&mut self, data: GraphData) {
        let count = data.labels.len();
        let mut rng = StdRng::seed_from_u64(self.layout.seed);
        let params = LayoutParams {
            k: self.layout.layout_k,
            iterations: self.layout.layout_iterations,
        };
        let positions = spring_layout(count, &data.edges, params, &mut rng);
        let colors = degree_colors(count, &data.edges);

        self.nodes = data
            .labels
            .into_iter()
            .zip(colors)
            .enumerate()
            .map(|(idx, (label, color))| Node {
                id: NodeId(idx),
                label,
                position: [
                    positions[[idx, 0]] * VIEW_EXTENT[0],
                    positions[[idx, 1]] * VIEW_EXTENT[1],
                    positions[[idx, 2]] * VIEW_EXTENT[2],
                ],
                color,
            })
            .collect();
        self.edges = data
            .edges
            .into_iter()
            .map(|(a, b)| Edge(NodeId(a), NodeId(b)))
            .collect();
        self.selected = None;
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn camera(&self) -> &CameraProjection {
        &self.camera
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width, height);
    }

    pub fn apply_drag(&mut self, id: NodeId, delta: Vec3) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            for axis in 0..3 {
                node.position[axis] += delta[axis];
            }
            self.selected = Some(id);
            log::debug!("dragged node {} to {:?}", node.label, node.position);
        }
    }

    /// Moves whichever node sits under the normalised gesture `position`.
    pub fn drag_at(&mut self, position: (f32, f32), displacement: (f32, f32)) -> Option<NodeId> {
        if displacement == (0.0, 0.0) {
            return None;
        }
        let (width, height) = self.camera.viewport();
        let target = ScreenPoint {
            x: position.0 * width as f32,
            y: position.1 * height as f32,
        };
        let id = self.node_at(target)?;
        let scale = self.interaction.drag_sensitivity * DRAG_SCALE;
        self.apply_drag(
            id,
            [displacement.0 * scale, -displacement.1 * scale, 0.0],
        );
        Some(id)
    }

    pub fn node_at(&self, target: ScreenPoint) -> Option<NodeId> {
        let positions: Vec<Vec3> = self.nodes.iter().map(|n| n.position).collect();
        self.camera
            .hit_test(&positions, target, self.interaction.hit_radius_px)
            .map(NodeId)
    }

    /// Rotates the view by a hand displacement in normalised frame units.
    pub fn apply_rotation(&mut self, delta_yaw: f32, delta_pitch: f32) {
        if delta_yaw == 0.0 && delta_pitch == 0.0 {
            return;
        }
        let scale = self.interaction.rotate_sensitivity * ROTATION_SCALE;
        self.camera.rotate(delta_yaw * scale, delta_pitch * scale);
        log::debug!(
            "rotated view: yaw={:.3} pitch={:.3}",
            self.camera.yaw(),
            self.camera.pitch()
        );
    }

    pub fn apply_zoom(&mut self, ratio: f32) {
        self.camera.scale_zoom(ratio);
        log::debug!("zoom now {:.2}x", self.camera.zoom());
    }

    pub fn reset_view(&mut self) {
        self.camera.reset();
        self.selected = None;
        log::info!("camera view reset, eye at {:?}", self.camera.eye());
    }

    pub fn all_screen_positions(&self) -> Vec<(NodeId, Projection)> {
        self.nodes
            .iter()
            .map(|n| (n.id, self.camera.project(n.position)))
            .collect()
    }

    /// Node ids ordered farthest from the eye first.
    pub fn depth_order(&self) -> Vec<NodeId> {
        let positions: Vec<Vec3> = self.nodes.iter().map(|n| n.position).collect();
        self.camera
            .back_to_front(&positions)
            .into_iter()
            .map(NodeId)
            .collect()
    }
}

/// Uniform points in the unit cube joined when closer than `sample_radius`.
pub fn sample_graph(cfg: &GraphConfig) -> GraphData {
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let points: Vec<Vec3> = (0..cfg.sample_nodes)
        .map(|_| [rng.r#gen(), rng.r#gen(), rng.r#gen()])
        .collect();

    let mut edges = Vec::new();
    for a in 0..points.len() {
        for b in (a + 1)..points.len() {
            let d2: f32 = (0..3).map(|k| (points[a][k] - points[b][k]).powi(2)).sum();
            if d2 <= cfg.sample_radius * cfg.sample_radius {
                edges.push((a, b));
            }
        }
    }

    GraphData {
        labels: (0..cfg.sample_nodes).map(|i| i.to_string()).collect(),
        edges,
    }
}

/// Blue for low degree through red for the best connected node.
fn degree_colors(count: usize, edges: &[(usize, usize)]) -> Vec<[u8; 3]> {
    let mut degree = vec![0usize; count];
    for &(a, b) in edges {
        degree[a] += 1;
        degree[b] += 1;
    }
    let max = degree.iter().copied().max().unwrap_or(0);
    degree
        .into_iter()
        .map(|d| {
            let c = if max > 0 { d as f32 / max as f32 } else { 0.0 };
            [
                (255.0 * c) as u8,
                (100.0 * (1.0 - c)) as u8,
                (255.0 * (1.0 - c)) as u8,
            ]
        })
        .collect()
}
