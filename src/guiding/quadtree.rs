//! Directional quadtrees over the equal-area octahedral square. A tree is a
//! flat array of four-child nodes; child `i` covers the quadrant with
//! `x >= 0.5` when bit 0 of `i` is set and `y >= 0.5` when bit 1 is set.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::math::sampling::ONE_MINUS_EPSILON;
use crate::math::*;

/// Marks a quadrant without a subtree, and a leaf without any tree.
pub const NO_CHILD: u32 = u32::MAX;

/// Quadrants receiving less than this share of their tree's flux are not
/// subdivided further.
pub const LEAF_ENERGY_PORTION: Float = 0.01;

pub const MAX_QUADTREE_DEPTH: u32 = 20;

/// Read-only quadrant of a guide tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideNode {
    pub flux: Float,
    pub child: u32,
}

/// Quadrant of a train tree. Flux is an `f32` accumulated by
/// compare-and-swap so any number of paths can splat at once.
#[derive(Debug)]
pub struct TrainNode {
    flux: AtomicU32,
    pub child: u32,
}

impl TrainNode {
    pub fn new(child: u32) -> TrainNode {
        TrainNode { flux: AtomicU32::new(0.0f32.to_bits()), child }
    }

    #[inline]
    pub fn flux(&self) -> Float {
        Float::from_bits(self.flux.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn add_flux(&self, value: Float) {
        atomic_add(&self.flux, value);
    }

    pub fn to_guide(&self) -> GuideNode {
        GuideNode { flux: self.flux(), child: self.child }
    }
}

pub fn atomic_add(target: &AtomicU32, value: Float) {
    let mut current = target.load(Ordering::Relaxed);
    loop {
        let next = (Float::from_bits(current) + value).to_bits();
        match target.compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return,
            Err(actual) => current = actual,
        }
    }
}

#[inline]
fn quadrant(p: Point2f) -> usize {
    (p.x >= 0.5) as usize | (((p.y >= 0.5) as usize) << 1)
}

/// Position inside the chosen quadrant, rescaled to `[0, 1)^2`.
#[inline]
fn descend(p: Point2f, quadrant: usize) -> Point2f {
    let shift = |v: Float, upper: bool| (if upper { 2.0 * v - 1.0 } else { 2.0 * v }).clamp(0.0, ONE_MINUS_EPSILON);
    Point2f::new(shift(p.x, quadrant & 1 != 0), shift(p.y, quadrant & 2 != 0))
}

/// A point drawn from a quadtree with its density over the unit square and
/// the side length of the cell it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquareSample {
    pub p: Point2f,
    pub pdf: Float,
    pub footprint: Float,
}

/// Draws a point proportionally to flux. Quadrants with no flux below them
/// are sampled uniformly.
pub fn sample(nodes: &[[GuideNode; 4]], root: u32, u: Point2f) -> SquareSample {
    let mut u = Point2f::new(u.x.min(ONE_MINUS_EPSILON), u.y.min(ONE_MINUS_EPSILON));
    let mut origin = Point2f::new(0.0, 0.0);
    let mut size = 1.0;
    let mut pdf = 1.0;
    let mut node = root;

    while node != NO_CHILD {
        let children = &nodes[node as usize];
        let f = children.map(|c| c.flux.max(0.0));
        let total: Float = f.iter().sum();
        if total <= 0.0 {
            break;
        }

        let p_right = (f[1] + f[3]) / total;
        let right = u.x >= 1.0 - p_right;
        u.x = if right { (u.x - (1.0 - p_right)) / p_right } else { u.x / (1.0 - p_right) };

        let (lower, upper) = if right { (f[1], f[3]) } else { (f[0], f[2]) };
        let p_top = upper / (lower + upper);
        let top = u.y >= 1.0 - p_top;
        u.y = if top { (u.y - (1.0 - p_top)) / p_top } else { u.y / (1.0 - p_top) };
        u = Point2f::new(u.x.clamp(0.0, ONE_MINUS_EPSILON), u.y.clamp(0.0, ONE_MINUS_EPSILON));

        let q = right as usize | ((top as usize) << 1);
        pdf *= 4.0 * f[q] / total;
        size *= 0.5;
        origin = Point2f::new(
            origin.x + if right { size } else { 0.0 },
            origin.y + if top { size } else { 0.0 },
        );
        node = children[q].child;
    }

    // Keep the point inside its cell despite rounding.
    let inside = |o: Float, u: Float| (o + u * size).min(next_float_down(o + size));
    SquareSample {
        p: Point2f::new(inside(origin.x, u.x), inside(origin.y, u.y)),
        pdf,
        footprint: size,
    }
}

/// Density over the unit square at `p` and the side of the cell holding it.
pub fn pdf(nodes: &[[GuideNode; 4]], root: u32, p: Point2f) -> (Float, Float) {
    let mut p = p;
    let mut size = 1.0;
    let mut pdf = 1.0;
    let mut node = root;

    while node != NO_CHILD {
        let children = &nodes[node as usize];
        let total: Float = children.iter().map(|c| c.flux.max(0.0)).sum();
        if total <= 0.0 {
            break;
        }
        let q = quadrant(p);
        pdf *= 4.0 * children[q].flux.max(0.0) / total;
        if pdf == 0.0 {
            return (0.0, size * 0.5);
        }
        size *= 0.5;
        p = descend(p, q);
        node = children[q].child;
    }

    (pdf, size)
}

/// Flux of the deepest cell holding `p`, scaled by `4^depth`.
pub fn flux_density(nodes: &[[GuideNode; 4]], root: u32, p: Point2f) -> Float {
    let mut p = p;
    let mut node = root;
    let mut depth = 0;

    while node != NO_CHILD {
        let q = quadrant(p);
        let child = nodes[node as usize][q];
        if child.child == NO_CHILD {
            return child.flux * (1u64 << (2 * depth)) as Float;
        }
        p = descend(p, q);
        node = child.child;
        depth += 1;
    }

    0.0
}

/// Adds `flux` to every quadrant on the way down to `p`.
pub fn splat(nodes: &[[TrainNode; 4]], root: u32, p: Point2f, flux: Float) {
    let mut p = p;
    let mut node = root;

    while node != NO_CHILD {
        let q = quadrant(p);
        let child = &nodes[node as usize][q];
        child.add_flux(flux);
        p = descend(p, q);
        node = child.child;
    }
}

/// Builds a fresh, empty train tree shaped after the flux recorded in
/// `existing` under `node`: quadrants holding at least
/// [`LEAF_ENERGY_PORTION`] of the total are subdivided. Returns the new root.
pub fn refine(
    new_nodes: &mut Vec<[TrainNode; 4]>,
    existing: &[[GuideNode; 4]],
    node: u32,
    flux_ratio: Float,
    depth: u32,
) -> u32 {
    math_assert!((0.0..=1.0 + 1e-4).contains(&flux_ratio), "flux ratio {flux_ratio}");
    if flux_ratio < LEAF_ENERGY_PORTION || depth >= MAX_QUADTREE_DEPTH {
        return NO_CHILD;
    }

    let children = if node == NO_CHILD {
        [(NO_CHILD, 0.25); 4]
    } else {
        let quads = &existing[node as usize];
        let total: Float = quads.iter().map(|q| q.flux.max(0.0)).sum();
        if total > 0.0 {
            quads.map(|q| (q.child, q.flux.max(0.0) / total))
        } else {
            [(NO_CHILD, 0.25); 4]
        }
    };

    let refined = children.map(|(child, portion)| {
        TrainNode::new(refine(new_nodes, existing, child, flux_ratio * portion, depth + 1))
    });

    let id = new_nodes.len() as u32;
    new_nodes.push(refined);
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_tree_is_three_levels() {
        let mut nodes = Vec::new();
        let root = refine(&mut nodes, &[], NO_CHILD, 1.0, 0);
        assert_eq!(nodes.len(), 1 + 4 + 16);
        assert_eq!(root as usize, nodes.len() - 1);
    }

    #[test]
    fn atomic_add_accumulates() {
        let node = TrainNode::new(NO_CHILD);
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..1000 {
                        node.add_flux(0.5);
                    }
                });
            }
        });
        assert_eq!(node.flux(), 2000.0);
    }

    #[test]
    fn empty_tree_is_uniform() {
        let s = sample(&[], NO_CHILD, Point2f::new(0.3, 0.8));
        assert_eq!(s.pdf, 1.0);
        assert_eq!(s.footprint, 1.0);
        assert_eq!(pdf(&[], NO_CHILD, Point2f::new(0.1, 0.1)), (1.0, 1.0));
    }

    #[test]
    fn sample_matches_pdf() {
        let leaf = |flux| GuideNode { flux, child: NO_CHILD };
        let nodes = vec![
            [leaf(1.0), leaf(0.0), leaf(2.0), leaf(1.0)],
            [leaf(3.0), GuideNode { flux: 4.0, child: 0 }, leaf(0.5), leaf(0.5)],
        ];
        let root = 1;
        for i in 0..16 {
            for j in 0..16 {
                let u = Point2f::new((i as Float + 0.5) / 16.0, (j as Float + 0.5) / 16.0);
                let s = sample(&nodes, root, u);
                let (p, footprint) = pdf(&nodes, root, s.p);
                approx::assert_relative_eq!(s.pdf, p, max_relative = 1e-4);
                assert_eq!(s.footprint, footprint);
                assert!(s.pdf > 0.0);
            }
        }
    }
}
