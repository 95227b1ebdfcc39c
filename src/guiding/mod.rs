//! Online path guiding with a spatial-directional tree: a binary space
//! partition over the scene bounds whose leaves each own a directional
//! quadtree. Paths read the guide trees and splat into the train trees
//! during a pass; [`SdTree::refine`] swaps them in between passes.

use std::sync::atomic::{AtomicU32, Ordering};

use tracing::info;

use crate::math::*;

pub mod quadtree;

pub use quadtree::{GuideNode, TrainNode, NO_CHILD};

/// Spatial leaves are split once their visit count exceeds
/// `SPLIT_VISITS * sqrt(2^iteration)`.
pub const SPLIT_VISITS: u32 = 12000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BspKind {
    Leaf { guide: u32, train: u32 },
    Inner { children: [u32; 2] },
}

#[derive(Debug)]
struct BspNode {
    kind: BspKind,
    count: AtomicU32,
}

impl BspNode {
    fn leaf(guide: u32, train: u32, count: u32) -> BspNode {
        BspNode { kind: BspKind::Leaf { guide, train }, count: AtomicU32::new(count) }
    }
}

/// A located spatial leaf. `extent` is the world-space size of its cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SdLeaf {
    pub node: u32,
    guide: u32,
    train: u32,
    pub extent: Vec3f,
}

/// A guided direction with its solid angle density and the side length of
/// the quadtree cell it came from, in octahedral square units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideSample {
    pub wi: Vec3f,
    pub pdf: Float,
    pub footprint: Float,
}

#[derive(Debug)]
pub struct SdTree {
    bounds: Bounds3f,
    bsp: Vec<BspNode>,
    guide: Vec<[GuideNode; 4]>,
    train: Vec<[TrainNode; 4]>,
    iteration: u32,
}

impl SdTree {
    /// A single spatial leaf with no guide yet, so sampling starts out
    /// uniform, and a train tree subdivided a few levels deep.
    pub fn new(bounds: Bounds3f) -> SdTree {
        let mut train = Vec::new();
        let root = quadtree::refine(&mut train, &[], NO_CHILD, 1.0, 0);

        SdTree {
            bounds,
            bsp: vec![BspNode::leaf(NO_CHILD, root, 0)],
            guide: Vec::new(),
            train,
            iteration: 0,
        }
    }

    #[inline]
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn leaf_count(&self) -> usize {
        self.bsp.iter().filter(|n| matches!(n.kind, BspKind::Leaf { .. })).count()
    }

    /// Finds the spatial leaf holding `p` and counts the visit. Points
    /// outside the bounds are clamped onto them.
    pub fn locate(&self, p: Point3f) -> SdLeaf {
        let leaf = self.leaf_at(p);
        self.bsp[leaf.node as usize].count.fetch_add(1, Ordering::Relaxed);
        leaf
    }

    /// Like [`SdTree::locate`] without counting a visit.
    pub fn leaf_at(&self, p: Point3f) -> SdLeaf {
        let mut x = self.bounds.offset(p).map(|v| v.clamp(0.0, 1.0));
        let mut extent = self.bounds.diagonal();
        let mut node = 0u32;
        let mut axis = 0;

        loop {
            match self.bsp[node as usize].kind {
                BspKind::Leaf { guide, train } => return SdLeaf { node, guide, train, extent },
                BspKind::Inner { children } => {
                    let upper = x[axis] >= 0.5;
                    x[axis] = if upper { 2.0 * x[axis] - 1.0 } else { 2.0 * x[axis] };
                    extent[axis] *= 0.5;
                    node = children[upper as usize];
                    axis = (axis + 1) % 3;
                }
            }
        }
    }

    pub fn sample(&self, leaf: &SdLeaf, u: Point2f) -> GuideSample {
        let s = quadtree::sample(&self.guide, leaf.guide, u);
        GuideSample {
            wi: equal_area_square_to_sphere(s.p),
            pdf: s.pdf * FRAC_1_4PI,
            footprint: s.footprint,
        }
    }

    /// Solid angle density of [`SdTree::sample`] at `wi`, and the footprint
    /// of the cell `wi` falls in.
    pub fn pdf(&self, leaf: &SdLeaf, wi: Vec3f) -> (Float, Float) {
        let (pdf, footprint) = quadtree::pdf(&self.guide, leaf.guide, equal_area_sphere_to_square(wi));
        (pdf * FRAC_1_4PI, footprint)
    }

    /// Records `flux` arriving from `wi` in the leaf's train tree.
    pub fn splat(&self, leaf: &SdLeaf, wi: Vec3f, flux: Float) {
        self.splat_square(leaf, equal_area_sphere_to_square(wi), flux);
    }

    /// Like [`SdTree::splat`], addressed by octahedral square position.
    pub fn splat_square(&self, leaf: &SdLeaf, p: Point2f, flux: Float) {
        if flux.is_finite() && flux > 0.0 {
            quadtree::splat(&self.train, leaf.train, p, flux);
        }
    }

    /// Guide flux density at `wi`, for inspecting what has been learned.
    pub fn flux_density(&self, leaf: &SdLeaf, wi: Vec3f) -> Float {
        quadtree::flux_density(&self.guide, leaf.guide, equal_area_sphere_to_square(wi))
    }

    /// Ends a learning pass. Busy spatial leaves are split in two, the
    /// trained trees become the guides, and each leaf gets a new empty
    /// train tree refined after the flux its guide holds.
    pub fn refine(&mut self) {
        self.iteration += 1;
        let threshold = SPLIT_VISITS.saturating_mul(((1u64 << self.iteration.min(63)) as f64).sqrt() as u32);

        let trained: Vec<[GuideNode; 4]> = self.train.iter().map(|n| n.each_ref().map(TrainNode::to_guide)).collect();
        let mut train = Vec::new();

        let mut pending = vec![0u32];
        while let Some(node) = pending.pop() {
            let bsp_len = self.bsp.len() as u32;
            let n = &mut self.bsp[node as usize];
            let (guide, trained_root) = match n.kind {
                BspKind::Inner { children } => {
                    pending.extend(children);
                    continue;
                }
                BspKind::Leaf { guide, train } => (guide, train),
            };

            let count = *n.count.get_mut();
            if count > threshold {
                n.kind = BspKind::Inner { children: [bsp_len, bsp_len + 1] };
                self.bsp.push(BspNode::leaf(guide, trained_root, count / 2));
                self.bsp.push(BspNode::leaf(guide, trained_root, count / 2));
                pending.extend([bsp_len, bsp_len + 1]);
                continue;
            }

            let new_root = quadtree::refine(&mut train, &trained, trained_root, 1.0, 0);
            n.kind = BspKind::Leaf { guide: trained_root, train: new_root };
            *n.count.get_mut() = 0;
        }

        self.guide = trained;
        self.train = train;

        info!(
            iteration = self.iteration,
            spatial_leaves = self.leaf_count(),
            guide_nodes = self.guide.len(),
            train_nodes = self.train.len(),
            "refined guiding tree"
        );
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    use super::*;

    fn unit_bounds() -> Bounds3f {
        Bounds3f::new(Point3f::new(-1.0, -1.0, -1.0), Point3f::new(1.0, 1.0, 1.0))
    }

    /// Integrates the guide density over the sphere on a grid over the
    /// octahedral square, which is exact for cells no smaller than a texel.
    fn integrate(tree: &SdTree, leaf: &SdLeaf, n: usize) -> Float {
        let mut sum = 0.0f64;
        for i in 0..n {
            for j in 0..n {
                let p = Point2f::new((i as Float + 0.5) / n as Float, (j as Float + 0.5) / n as Float);
                sum += quadtree::pdf(&tree.guide, leaf.guide, p).0 as f64;
            }
        }
        (sum / (n * n) as f64) as Float
    }

    fn trained_tree(rng: &mut SmallRng, passes: usize) -> SdTree {
        let mut tree = SdTree::new(unit_bounds());
        let hot = Vec3f::new(0.3, 0.5, 0.8).normalize();
        for _ in 0..passes {
            let leaf = tree.locate(Point3f::new(0.1, 0.2, 0.3));
            for _ in 0..4000 {
                let u = Point2f::new(rng.gen(), rng.gen());
                let wi = equal_area_square_to_sphere(u);
                let flux = if wi.dot(hot) > 0.9 { 10.0 } else { 0.1 };
                tree.splat(&leaf, wi, flux);
            }
            tree.refine();
        }
        tree
    }

    #[test]
    fn untrained_tree_is_uniform() {
        let tree = SdTree::new(unit_bounds());
        let leaf = tree.locate(Point3f::new(0.0, 0.0, 0.0));
        let s = tree.sample(&leaf, Point2f::new(0.2, 0.7));
        approx::assert_relative_eq!(s.pdf, FRAC_1_4PI);
        approx::assert_relative_eq!(tree.pdf(&leaf, s.wi).0, FRAC_1_4PI);
        approx::assert_relative_eq!(s.wi.length(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn trained_pdf_integrates_to_one() {
        let mut rng = SmallRng::seed_from_u64(1);
        let tree = trained_tree(&mut rng, 3);
        let leaf = tree.locate(Point3f::new(0.1, 0.2, 0.3));
        approx::assert_abs_diff_eq!(integrate(&tree, &leaf, 512), 1.0, epsilon = 1e-3);
    }

    #[test]
    fn sample_and_pdf_agree() {
        let mut rng = SmallRng::seed_from_u64(2);
        let tree = trained_tree(&mut rng, 2);
        let leaf = tree.locate(Point3f::new(0.1, 0.2, 0.3));
        for _ in 0..1000 {
            let s = quadtree::sample(&tree.guide, leaf.guide, Point2f::new(rng.gen(), rng.gen()));
            let (pdf, footprint) = quadtree::pdf(&tree.guide, leaf.guide, s.p);
            approx::assert_relative_eq!(s.pdf, pdf, max_relative = 1e-4);
            assert_eq!(s.footprint, footprint);
        }

        let s = tree.sample(&leaf, Point2f::new(0.4, 0.6));
        approx::assert_relative_eq!(s.wi.length(), 1.0, epsilon = 1e-5);
        assert!(s.pdf > 0.0);
    }

    #[test]
    fn biased_splats_bias_sampling() {
        let mut rng = SmallRng::seed_from_u64(3);
        let tree = trained_tree(&mut rng, 3);
        let leaf = tree.locate(Point3f::new(0.1, 0.2, 0.3));
        let hot = Vec3f::new(0.3, 0.5, 0.8).normalize();

        // Chi-squared goodness of fit over an 8x8 grid of square bins,
        // expected counts integrated from the density.
        const BINS: usize = 8;
        const SUB: usize = 32;
        let n = 100_000;
        let mut expected = [0.0f64; BINS * BINS];
        for i in 0..BINS * SUB {
            for j in 0..BINS * SUB {
                let p = Point2f::new((i as Float + 0.5) / (BINS * SUB) as Float, (j as Float + 0.5) / (BINS * SUB) as Float);
                let pdf = quadtree::pdf(&tree.guide, leaf.guide, p).0 as f64;
                expected[(j / SUB) * BINS + i / SUB] += pdf / ((BINS * SUB) * (BINS * SUB)) as f64 * n as f64;
            }
        }

        let mut observed = [0.0f64; BINS * BINS];
        let mut near_hot = 0;
        for _ in 0..n {
            let s = tree.sample(&leaf, Point2f::new(rng.gen(), rng.gen()));
            if s.wi.dot(hot) > 0.9 {
                near_hot += 1;
            }
            let p = equal_area_sphere_to_square(s.wi);
            let bin = |v: Float| ((v * BINS as Float) as usize).min(BINS - 1);
            observed[bin(p.y) * BINS + bin(p.x)] += 1.0;
        }

        let mut chi2 = 0.0;
        let mut dof = 0;
        for (o, e) in observed.iter().zip(&expected) {
            if *e < 5.0 {
                continue;
            }
            chi2 += (o - e) * (o - e) / e;
            dof += 1;
        }
        assert!(dof > 1);
        // Generous bound on the 99.9% quantile for up to 64 bins.
        assert!(chi2 < 120.0, "chi2 {chi2} over {dof} bins");

        // The cap around `hot` covers 5% of the sphere but carries most of
        // the flux.
        assert!(near_hot as Float / n as Float > 0.5, "{near_hot}");
    }

    #[test]
    fn busy_leaves_split() {
        let mut tree = SdTree::new(unit_bounds());
        for i in 0..(SPLIT_VISITS * 2) {
            let x = (i % 100) as Float / 50.0 - 1.0;
            tree.locate(Point3f::new(x, 0.0, 0.0));
        }
        tree.refine();
        assert!(tree.leaf_count() >= 2);

        let left = tree.locate(Point3f::new(-0.5, 0.0, 0.0));
        let right = tree.locate(Point3f::new(0.5, 0.0, 0.0));
        assert_ne!(left.node, right.node);
        approx::assert_relative_eq!(left.extent.x, 1.0);
        approx::assert_relative_eq!(left.extent.y, 2.0);
    }

    #[test]
    fn lookups_without_visits_never_split() {
        let mut tree = SdTree::new(unit_bounds());
        for i in 0..(SPLIT_VISITS * 2) {
            let x = (i % 100) as Float / 50.0 - 1.0;
            tree.leaf_at(Point3f::new(x, 0.0, 0.0));
        }
        tree.refine();
        assert_eq!(tree.leaf_count(), 1);

        // Outside points clamp onto the root.
        assert_eq!(tree.leaf_at(Point3f::new(5.0, -9.0, 0.0)).node, 0);
    }
}
