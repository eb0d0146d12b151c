//! Fruchterman-Reingold spring layout in three dimensions.

use ndarray::{Array2, Axis};
use rand::Rng;
use rayon::prelude::*;

const MIN_DISTANCE: f32 = 0.01;

#[derive(Clone, Copy, Debug)]
pub struct LayoutParams {
    /// Optimal edge length.
    pub k: f32,
    pub iterations: usize,
}

/// Lays out `node_count` nodes and returns an `n x 3` matrix of positions
/// centred on the origin with the largest coordinate magnitude equal to 1.
pub fn spring_layout<R: Rng>(
    node_count: usize,
    edges: &[(usize, usize)],
    params: LayoutParams,
    rng: &mut R,
) -> Array2<f32> {
    let mut pos = Array2::<f32>::zeros((node_count, 3));
    if node_count == 0 {
        return pos;
    }
    pos.mapv_inplace(|_| rng.r#gen::<f32>());
    if node_count == 1 {
        pos.fill(0.0);
        return pos;
    }

    let mut adjacency = Array2::<f32>::zeros((node_count, node_count));
    for &(a, b) in edges {
        if a != b && a < node_count && b < node_count {
            adjacency[[a, b]] = 1.0;
            adjacency[[b, a]] = 1.0;
        }
    }

    let k = params.k;
    let mut temperature = 0.1 * max_extent(&pos);
    let cooling = temperature / (params.iterations as f32 + 1.0);

    for _ in 0..params.iterations {
        let displacement: Vec<[f32; 3]> = (0..node_count)
            .into_par_iter()
            .map(|i| {
                let mut disp = [0.0f32; 3];
                for j in 0..node_count {
                    if i == j {
                        continue;
                    }
                    let delta = [
                        pos[[i, 0]] - pos[[j, 0]],
                        pos[[i, 1]] - pos[[j, 1]],
                        pos[[i, 2]] - pos[[j, 2]],
                    ];
                    let distance = norm(delta).max(MIN_DISTANCE);
                    let force = k * k / (distance * distance) - adjacency[[i, j]] * distance / k;
                    for axis in 0..3 {
                        disp[axis] += delta[axis] * force;
                    }
                }
                disp
            })
            .collect();

        for (i, disp) in displacement.into_iter().enumerate() {
            let mut length = norm(disp);
            if length < MIN_DISTANCE {
                length = 0.1;
            }
            let step = temperature / length;
            for axis in 0..3 {
                pos[[i, axis]] += disp[axis] * step;
            }
        }
        temperature -= cooling;
    }

    rescale(&mut pos);
    pos
}

fn rescale(pos: &mut Array2<f32>) {
    if let Some(mean) = pos.mean_axis(Axis(0)) {
        *pos -= &mean;
    }
    let limit = pos.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
    if limit > 0.0 {
        pos.mapv_inplace(|v| v / limit);
    }
}

fn max_extent(pos: &Array2<f32>) -> f32 {
    pos.axis_iter(Axis(1))
        .map(|col| {
            let (lo, hi) = col
                .iter()
                .fold((f32::MAX, f32::MIN), |acc, v| (acc.0.min(*v), acc.1.max(*v)));
            hi - lo
        })
        .fold(0.0, f32::max)
}

fn norm(v: [f32; 3]) -> f32 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}
