//! Static 2-d tree for radius-bounded nearest-neighbour queries.

use crate::types::Point;

/// A point returned by a query, with its distance to the query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Position of the point in the slice the tree was built from.
    pub index: usize,
    pub distance: f64,
}

#[derive(Debug, Clone, Copy)]
struct KdNode {
    point: usize,
    split_on_y: bool,
    left: Option<u32>,
    right: Option<u32>,
}

/// A balanced k-d tree over a fixed set of points.
///
/// Nodes are stored flat; node indices refer into `nodes` and the root is
/// the first node built.
#[derive(Debug, Clone)]
pub struct KdTree {
    points: Vec<Point>,
    nodes: Vec<KdNode>,
    root: Option<u32>,
}

impl KdTree {
    pub fn build(points: &[Point]) -> Self {
        let mut tree = Self {
            points: points.to_vec(),
            nodes: Vec::with_capacity(points.len()),
            root: None,
        };
        let mut order: Vec<usize> = (0..points.len()).collect();
        tree.root = tree.build_from(&mut order, 0);
        tree
    }

    fn build_from(&mut self, order: &mut [usize], depth: usize) -> Option<u32> {
        if order.is_empty() {
            return None;
        }

        let split_on_y = depth % 2 == 1;
        let points = &self.points;
        order.sort_by(|&a, &b| {
            let (pa, pb) = (points[a], points[b]);
            if split_on_y {
                pa.y.total_cmp(&pb.y).then(a.cmp(&b))
            } else {
                pa.x.total_cmp(&pb.x).then(a.cmp(&b))
            }
        });

        let mid = order.len() / 2;
        let node_idx = self.nodes.len() as u32;
        self.nodes.push(KdNode {
            point: order[mid],
            split_on_y,
            left: None,
            right: None,
        });

        let (below, rest) = order.split_at_mut(mid);
        let left = self.build_from(below, depth + 1);
        let right = self.build_from(&mut rest[1..], depth + 1);

        let node = &mut self.nodes[node_idx as usize];
        node.left = left;
        node.right = right;
        Some(node_idx)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Up to `k` points within `radius` of `query` (inclusive), closest first.
    /// Ties are broken by input order.
    pub fn nearest(&self, query: Point, k: usize, radius: f64) -> Vec<Neighbor> {
        let mut found = Vec::new();
        if k == 0 {
            return found;
        }
        if let Some(root) = self.root {
            self.collect_within(root, query, radius, &mut found);
        }
        found.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.index.cmp(&b.index))
        });
        found.truncate(k);
        found
    }

    fn collect_within(&self, node_idx: u32, query: Point, radius: f64, found: &mut Vec<Neighbor>) {
        let node = self.nodes[node_idx as usize];
        let point = self.points[node.point];

        let distance = point.distance(&query);
        if distance <= radius {
            found.push(Neighbor {
                index: node.point,
                distance,
            });
        }

        let offset = if node.split_on_y {
            query.y - point.y
        } else {
            query.x - point.x
        };
        let (near, far) = if offset < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(child) = near {
            self.collect_within(child, query, radius, found);
        }
        if offset.abs() <= radius {
            if let Some(child) = far {
                self.collect_within(child, query, radius, found);
            }
        }
    }
}
