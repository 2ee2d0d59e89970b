//! Reading order of text boxes
//!
//! With a `boxes_flow` value the boxes of a page are clustered bottom-up:
//! the pair whose union wastes the least area is merged first, and a pair
//! whose union would swallow a third box is deferred. The resulting tree is
//! then sorted level by level with a flow-weighted key and flattened
//! depth-first. Without a flow value boxes are sorted by position only.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::types::{BBox, LayoutParams, Orientation, TextBox};

/// Put the boxes of one page into reading order
pub fn order_boxes(boxes: Vec<TextBox>, params: &LayoutParams) -> Vec<TextBox> {
    match params.boxes_flow {
        None => order_by_position(boxes),
        Some(flow) => order_by_clustering(boxes, flow),
    }
}

fn order_by_position(mut boxes: Vec<TextBox>) -> Vec<TextBox> {
    // Vertical boxes first, right to left; horizontal boxes top to bottom
    boxes.sort_by(|a, b| match (a.orientation, b.orientation) {
        (Orientation::Vertical, Orientation::Horizontal) => Ordering::Less,
        (Orientation::Horizontal, Orientation::Vertical) => Ordering::Greater,
        (Orientation::Vertical, Orientation::Vertical) => b
            .bbox
            .x1
            .total_cmp(&a.bbox.x1)
            .then(b.bbox.y0.total_cmp(&a.bbox.y0)),
        (Orientation::Horizontal, Orientation::Horizontal) => b
            .bbox
            .y0
            .total_cmp(&a.bbox.y0)
            .then(a.bbox.x0.total_cmp(&b.bbox.x0)),
    });
    boxes
}

// ============================================================
// Hierarchical clustering
// ============================================================

#[derive(Debug)]
enum NodeKind {
    Leaf(usize),
    Group(Vec<usize>),
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    bbox: BBox,
    /// Vertical boxes and groups containing one read top-to-bottom, right-to-left
    vertical: bool,
}

/// Merge candidate; the heap pops the smallest entry first
#[derive(Debug, Clone, Copy)]
struct Candidate {
    deferred: bool,
    waste: f64,
    a: usize,
    b: usize,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deferred
            .cmp(&self.deferred)
            .then(other.waste.total_cmp(&self.waste))
            .then(other.a.cmp(&self.a))
            .then(other.b.cmp(&self.b))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// Area of the union not covered by either part
fn waste(a: &BBox, b: &BBox) -> f64 {
    a.union(b).area() - a.area() - b.area()
}

struct Clustering {
    nodes: Vec<Node>,
    alive: Vec<bool>,
}

impl Clustering {
    fn new(boxes: &[TextBox]) -> Self {
        let nodes: Vec<Node> = boxes
            .iter()
            .enumerate()
            .map(|(i, b)| Node {
                kind: NodeKind::Leaf(i),
                bbox: b.bbox,
                vertical: b.orientation == Orientation::Vertical,
            })
            .collect();
        let alive = vec![true; nodes.len()];
        Self { nodes, alive }
    }

    /// True when some other live node overlaps the union of `a` and `b`
    fn has_intruder(&self, a: usize, b: usize) -> bool {
        let area = self.nodes[a].bbox.union(&self.nodes[b].bbox);
        self.nodes.iter().enumerate().any(|(i, node)| {
            i != a
                && i != b
                && self.alive[i]
                && !(node.bbox.x1 <= area.x0
                    || area.x1 <= node.bbox.x0
                    || node.bbox.y1 <= area.y0
                    || area.y1 <= node.bbox.y0)
        })
    }

    fn run(&mut self) {
        let mut heap = BinaryHeap::new();
        let n = self.nodes.len();
        for a in 0..n {
            for b in (a + 1)..n {
                heap.push(Candidate {
                    deferred: false,
                    waste: waste(&self.nodes[a].bbox, &self.nodes[b].bbox),
                    a,
                    b,
                });
            }
        }

        while let Some(candidate) = heap.pop() {
            let Candidate { a, b, .. } = candidate;
            if !self.alive[a] || !self.alive[b] {
                continue;
            }
            if !candidate.deferred && self.has_intruder(a, b) {
                heap.push(Candidate {
                    deferred: true,
                    ..candidate
                });
                continue;
            }

            let group = self.nodes.len();
            self.nodes.push(Node {
                kind: NodeKind::Group(vec![a, b]),
                bbox: self.nodes[a].bbox.union(&self.nodes[b].bbox),
                vertical: self.nodes[a].vertical || self.nodes[b].vertical,
            });
            self.alive[a] = false;
            self.alive[b] = false;

            for other in 0..group {
                if self.alive[other] {
                    heap.push(Candidate {
                        deferred: false,
                        waste: waste(&self.nodes[group].bbox, &self.nodes[other].bbox),
                        a: group,
                        b: other,
                    });
                }
            }
            self.alive.push(true);
        }
    }

    /// Sort every group's children by the flow key of that group
    fn sort_groups(&mut self, flow: f64) {
        for id in 0..self.nodes.len() {
            let vertical = self.nodes[id].vertical;
            let mut children = match &self.nodes[id].kind {
                NodeKind::Group(children) => children.clone(),
                NodeKind::Leaf(_) => continue,
            };
            children.sort_by(|&x, &y| {
                let kx = flow_key(&self.nodes[x].bbox, vertical, flow);
                let ky = flow_key(&self.nodes[y].bbox, vertical, flow);
                kx.total_cmp(&ky)
            });
            self.nodes[id].kind = NodeKind::Group(children);
        }
    }

    /// Leaf box indices in depth-first order
    fn flatten(&self) -> Vec<usize> {
        let mut order = Vec::new();
        let mut stack: Vec<usize> = (0..self.nodes.len())
            .filter(|&id| self.alive[id])
            .rev()
            .collect();
        while let Some(id) = stack.pop() {
            match &self.nodes[id].kind {
                NodeKind::Leaf(index) => order.push(*index),
                NodeKind::Group(children) => stack.extend(children.iter().rev()),
            }
        }
        order
    }
}

fn flow_key(bbox: &BBox, vertical: bool, flow: f64) -> f64 {
    if vertical {
        -(1.0 + flow) * (bbox.x0 + bbox.x1) - (1.0 - flow) * bbox.y1
    } else {
        (1.0 - flow) * bbox.x0 - (1.0 + flow) * (bbox.y0 + bbox.y1)
    }
}

fn order_by_clustering(boxes: Vec<TextBox>, flow: f64) -> Vec<TextBox> {
    if boxes.len() < 2 {
        return boxes;
    }
    let mut clustering = Clustering::new(&boxes);
    clustering.run();
    clustering.sort_groups(flow);
    let order = clustering.flatten();
    log::trace!("Ordered {} boxes: {:?}", boxes.len(), order);

    let mut slots: Vec<Option<TextBox>> = boxes.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|index| slots.get_mut(index).and_then(Option::take))
        .collect()
}
