//! Centroid-based clustering (Lloyd's iteration with deterministic grid
//! seeding).
//!
//! Exposed as a free function over member snapshots so the entropy-gated
//! strategy can compose it for its active subset.

use nalgebra::{distance, distance_squared, Point2};

use crate::cluster::{Cluster, MemberSnapshot};

/// Lloyd's iteration stops once every centroid moves less than this.
const CONVERGENCE_EPS: f64 = 1e-3;

/// Hard cap on Lloyd's iterations.
const MAX_ITERATIONS: usize = 50;

/// Partitions `nodes` into at most `requested` clusters.
///
/// k is clamped to the node count. Seeding is deterministic: k centroids are
/// arranged on the smallest rows x cols grid fitting k points over the
/// field. Each cluster's head is the member nearest its final centroid (the
/// centroid itself is not a sensor). Empty clusters are dropped.
pub fn cluster_by_centroid(
    nodes: &[MemberSnapshot],
    requested: usize,
    width: f64,
    height: f64,
) -> Vec<Cluster> {
    let k = requested.min(nodes.len());
    if k == 0 {
        return Vec::new();
    }

    let mut centroids = seed_centroids(k, width, height);
    let mut assignments = vec![0usize; nodes.len()];

    for _ in 0..MAX_ITERATIONS {
        assign_nearest(nodes, &centroids, &mut assignments);

        let mut movement: f64 = 0.0;
        for (c, centroid) in centroids.iter_mut().enumerate() {
            if let Some(mean) = member_mean(nodes, &assignments, c) {
                movement = movement.max(distance(centroid, &mean));
                *centroid = mean;
            }
        }
        if movement < CONVERGENCE_EPS {
            break;
        }
    }
    assign_nearest(nodes, &centroids, &mut assignments);

    let mut clusters = Vec::with_capacity(k);
    for (c, centroid) in centroids.iter().enumerate() {
        let members: Vec<MemberSnapshot> = nodes
            .iter()
            .zip(&assignments)
            .filter(|(_, &a)| a == c)
            .map(|(node, _)| *node)
            .collect();
        if members.is_empty() {
            continue;
        }
        let head = members
            .iter()
            .min_by(|a, b| {
                distance_squared(&a.position, centroid)
                    .total_cmp(&distance_squared(&b.position, centroid))
            })
            .map(|m| m.id)
            .unwrap_or(members[0].id);
        clusters.push(Cluster::new(clusters.len() as u32, head, members));
    }
    clusters
}

/// K points on the smallest rows x cols grid that fits them, row-major at
/// cell centers.
fn seed_centroids(k: usize, width: f64, height: f64) -> Vec<Point2<f64>> {
    let cols = (k as f64).sqrt().ceil() as usize;
    let rows = k.div_ceil(cols);
    (0..k)
        .map(|c| {
            let col = c % cols;
            let row = c / cols;
            Point2::new(
                (col as f64 + 0.5) * width / cols as f64,
                (row as f64 + 0.5) * height / rows as f64,
            )
        })
        .collect()
}

fn assign_nearest(
    nodes: &[MemberSnapshot],
    centroids: &[Point2<f64>],
    assignments: &mut [usize],
) {
    for (node, slot) in nodes.iter().zip(assignments.iter_mut()) {
        *slot = centroids
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                distance_squared(&node.position, a).total_cmp(&distance_squared(&node.position, b))
            })
            .map(|(i, _)| i)
            .unwrap_or(0);
    }
}

fn member_mean(
    nodes: &[MemberSnapshot],
    assignments: &[usize],
    cluster: usize,
) -> Option<Point2<f64>> {
    let mut sum = Point2::new(0.0, 0.0);
    let mut count = 0usize;
    for (node, &a) in nodes.iter().zip(assignments) {
        if a == cluster {
            sum.x += node.position.x;
            sum.y += node.position.y;
            count += 1;
        }
    }
    if count == 0 {
        None
    } else {
        Some(Point2::new(sum.x / count as f64, sum.y / count as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::SensorId;

    fn node(id: SensorId, x: f64, y: f64) -> MemberSnapshot {
        MemberSnapshot {
            id,
            position: Point2::new(x, y),
            energy: 100.0,
            asleep: false,
        }
    }

    #[test]
    fn test_empty_input_empty_output() {
        assert!(cluster_by_centroid(&[], 5, 100.0, 100.0).is_empty());
    }

    #[test]
    fn test_requested_k_clamped_to_node_count() {
        let nodes: Vec<_> = (0..5).map(|i| node(i, i as f64 * 20.0, 10.0)).collect();
        let clusters = cluster_by_centroid(&nodes, 500, 100.0, 100.0);
        assert!(!clusters.is_empty());
        assert!(clusters.len() <= 5);
        let placed: usize = clusters.iter().map(|c| c.members.len()).sum();
        assert_eq!(placed, 5);
    }

    #[test]
    fn test_single_node_single_cluster() {
        let nodes = vec![node(7, 40.0, 60.0)];
        let clusters = cluster_by_centroid(&nodes, 5, 100.0, 100.0);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].head, 7);
        assert_eq!(clusters[0].members.len(), 1);
    }

    #[test]
    fn test_separated_groups_get_separate_clusters() {
        // Two tight groups in opposite corners.
        let mut nodes = Vec::new();
        for i in 0..4 {
            nodes.push(node(i, 5.0 + i as f64, 5.0));
        }
        for i in 4..8 {
            nodes.push(node(i, 90.0 + (i - 4) as f64, 95.0));
        }
        let clusters = cluster_by_centroid(&nodes, 2, 100.0, 100.0);
        assert_eq!(clusters.len(), 2);
        for cluster in &clusters {
            let near_origin = cluster.members.iter().filter(|m| m.position.x < 50.0).count();
            assert!(near_origin == 0 || near_origin == cluster.members.len());
        }
    }

    #[test]
    fn test_head_is_member_nearest_centroid() {
        // Symmetric pair with one node at the exact mean.
        let nodes = vec![node(0, 10.0, 10.0), node(1, 20.0, 20.0), node(2, 30.0, 30.0)];
        let clusters = cluster_by_centroid(&nodes, 1, 100.0, 100.0);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].head, 1);
    }

    #[test]
    fn test_converged_partition_is_a_fixed_point() {
        // Three tight groups far apart: Lloyd's iteration must converge
        // well inside the cap, leaving each centroid at its group mean.
        // Re-clustering any cluster's members alone then reproduces the
        // same head, i.e. the partition is stable.
        let mut nodes = Vec::new();
        for (g, (cx, cy)) in [(10.0, 10.0), (90.0, 10.0), (50.0, 90.0)].into_iter().enumerate() {
            for i in 0..5 {
                nodes.push(node((g * 5 + i) as SensorId, cx + i as f64, cy + i as f64));
            }
        }

        let clusters = cluster_by_centroid(&nodes, 3, 100.0, 100.0);
        assert_eq!(clusters.len(), 3);
        for cluster in &clusters {
            let again = cluster_by_centroid(&cluster.members, 1, 100.0, 100.0);
            assert_eq!(again.len(), 1);
            assert_eq!(again[0].head, cluster.head);
        }
    }

    #[test]
    fn test_deterministic_for_same_input() {
        let nodes: Vec<_> = (0..30)
            .map(|i| node(i, (i as f64 * 37.0) % 100.0, (i as f64 * 53.0) % 100.0))
            .collect();
        let a = cluster_by_centroid(&nodes, 4, 100.0, 100.0);
        let b = cluster_by_centroid(&nodes, 4, 100.0, 100.0);
        assert_eq!(a.len(), b.len());
        for (ca, cb) in a.iter().zip(&b) {
            assert_eq!(ca.head, cb.head);
            let ids_a: Vec<_> = ca.members.iter().map(|m| m.id).collect();
            let ids_b: Vec<_> = cb.members.iter().map(|m| m.id).collect();
            assert_eq!(ids_a, ids_b);
        }
    }
}
