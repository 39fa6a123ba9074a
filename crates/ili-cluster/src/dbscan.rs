// SPDX-License-Identifier: MIT OR Apache-2.0

//! Density-based clustering over small embedded point sets.
//!
//! DBSCAN fits interaction-zone detection because the cluster count is
//! unknown up front and isolated anomalies should fall out as noise
//! rather than force-joining a cluster.

/// Label for points that belong to no cluster.
pub const NOISE: i32 = -1;

const UNVISITED: i32 = -2;

/// Runs DBSCAN over Euclidean points and returns one label per point.
///
/// A point is a core point when its eps-neighborhood, itself included,
/// holds at least `min_samples` points. Cluster labels start at 0;
/// unclustered points get [`NOISE`].
pub fn dbscan(points: &[[f64; 3]], eps: f64, min_samples: usize) -> Vec<i32> {
    let n = points.len();
    let mut labels = vec![UNVISITED; n];
    let mut cluster = 0i32;

    for i in 0..n {
        if labels[i] != UNVISITED {
            continue;
        }
        let neighbors = region_query(points, i, eps);
        if neighbors.len() < min_samples {
            labels[i] = NOISE;
            continue;
        }

        labels[i] = cluster;
        let mut queue = neighbors;
        let mut head = 0;
        while head < queue.len() {
            let j = queue[head];
            head += 1;
            if labels[j] == NOISE {
                // Border point reachable from a core point.
                labels[j] = cluster;
            }
            if labels[j] != UNVISITED {
                continue;
            }
            labels[j] = cluster;
            let reachable = region_query(points, j, eps);
            if reachable.len() >= min_samples {
                queue.extend(reachable);
            }
        }
        cluster += 1;
    }

    labels
}

fn region_query(points: &[[f64; 3]], center: usize, eps: f64) -> Vec<usize> {
    let c = points[center];
    points
        .iter()
        .enumerate()
        .filter(|(_, p)| {
            let dx = p[0] - c[0];
            let dy = p[1] - c[1];
            let dz = p[2] - c[2];
            (dx * dx + dy * dy + dz * dz).sqrt() <= eps
        })
        .map(|(idx, _)| idx)
        .collect()
}
