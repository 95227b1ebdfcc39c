use arrayvec::ArrayVec;

use crate::math::*;
use crate::primitive::Hit;
use crate::scene::{NodeId, NodeType, Scene};
use crate::shape::AbstractShape;

pub const BVH_STACK_SIZE: usize = 64;
pub const TRANSFORM_STACK_SIZE: usize = 2;

#[derive(Debug, Clone, Copy)]
enum Visit {
    Node(NodeId),
    /// Leaves the innermost transform node, restoring the ray saved on
    /// entry.
    ExitTransform,
}

/// Mutable traversal state shared by the closest-hit and any-hit queries.
struct Traversal {
    stack: ArrayVec<Visit, BVH_STACK_SIZE>,
    transforms: ArrayVec<(Ray, NodeId), TRANSFORM_STACK_SIZE>,
    ray: Ray,
    inv_dir: Vec3f,
}

impl Traversal {
    fn new(ray: &Ray, root: NodeId) -> Traversal {
        let mut stack = ArrayVec::new();
        stack.push(Visit::Node(root));
        Traversal {
            stack,
            transforms: ArrayVec::new(),
            ray: *ray,
            inv_dir: inverse_direction(ray.direction),
        }
    }

    #[inline]
    fn push(&mut self, visit: Visit) {
        assert!(!self.stack.is_full(), "BVH traversal stack overflow ({BVH_STACK_SIZE} entries)");
        self.stack.push(visit);
    }

    fn set_ray(&mut self, ray: Ray) {
        self.inv_dir = inverse_direction(ray.direction);
        self.ray = ray;
    }

    /// Pushes the children of a BVH node if its box overlaps `[0, t_max]`.
    /// The child nearer along the split axis is visited first.
    fn visit_bvh(&mut self, scene: &Scene, id: NodeId, t_max: Float) {
        let node = scene.bvh_node(id);
        if node.bounds().intersect_p(self.ray.origin, self.inv_dir, t_max).is_none() {
            return;
        }

        if node.is_leaf() {
            self.push(Visit::Node(node.far));
            return;
        }

        let near = NodeId::new(NodeType::Bvh, id.idx() + 1);
        if self.ray.direction[node.axis()] < 0.0 {
            self.push(Visit::Node(near));
            self.push(Visit::Node(node.far));
        } else {
            self.push(Visit::Node(node.far));
            self.push(Visit::Node(near));
        }
    }

    fn enter_transform(&mut self, scene: &Scene, id: NodeId) {
        assert!(
            !self.transforms.is_full(),
            "transform nesting exceeds {TRANSFORM_STACK_SIZE} levels",
        );
        let node = scene.transform_node(id);
        self.push(Visit::ExitTransform);
        self.push(Visit::Node(node.object));
        self.transforms.push((self.ray, id));
        let local = node.transform.apply_inverse_ray(&self.ray);
        self.set_ray(local);
    }

    fn exit_transform(&mut self) {
        if let Some((ray, _)) = self.transforms.pop() {
            self.set_ray(ray);
        }
    }
}

#[inline]
fn inverse_direction(d: Vec3f) -> Vec3f {
    Vec3f::new(1.0 / d.x, 1.0 / d.y, 1.0 / d.z)
}

impl Scene {
    /// Closest hit with `t` in `(0, t_max)`. `t` is measured along the
    /// caller's ray, which is never renormalized on the way down.
    pub fn intersect(&self, ray: &Ray, t_max: Float) -> Option<Hit> {
        let mut state = Traversal::new(ray, self.root);
        let mut closest = t_max;
        let mut hit = None;

        while let Some(visit) = state.stack.pop() {
            let id = match visit {
                Visit::Node(id) => id,
                Visit::ExitTransform => {
                    state.exit_transform();
                    continue;
                }
            };

            match id.ty() {
                NodeType::Bvh => state.visit_bvh(self, id, closest),
                NodeType::Transform => state.enter_transform(self, id),
                NodeType::Primitive => {
                    let prim = self.primitive_node(id);
                    let Some(si) = self.shapes.get(prim.shape).raycast(&state.ray, closest) else {
                        continue;
                    };
                    closest = si.t;

                    let mut h = Hit {
                        p: si.p,
                        n: si.n,
                        n_geo: si.n_geo,
                        tangent: si.tangent,
                        t: si.t,
                        uv: si.uv,
                        material: prim.material,
                        light: prim.light,
                    };
                    for &(_, node) in state.transforms.iter().rev() {
                        let t = &self.transform_node(node).transform;
                        h.p = t.apply_point(h.p);
                        h.n = t.apply_normal(h.n);
                        h.n_geo = t.apply_normal(h.n_geo);
                        h.tangent = t.apply_vector(h.tangent);
                    }
                    if !state.transforms.is_empty() {
                        h.n = h.n.normalize();
                        h.n_geo = h.n_geo.normalize();
                    }
                    hit = Some(h);
                }
            }
        }

        hit
    }

    /// Whether anything lies along the ray with `t` in `(0, t_max)`.
    pub fn intersect_predicate(&self, ray: &Ray, t_max: Float) -> bool {
        let mut state = Traversal::new(ray, self.root);

        while let Some(visit) = state.stack.pop() {
            let id = match visit {
                Visit::Node(id) => id,
                Visit::ExitTransform => {
                    state.exit_transform();
                    continue;
                }
            };

            match id.ty() {
                NodeType::Bvh => state.visit_bvh(self, id, t_max),
                NodeType::Transform => state.enter_transform(self, id),
                NodeType::Primitive => {
                    let prim = self.primitive_node(id);
                    if self.shapes.get(prim.shape).raycast(&state.ray, t_max).is_some() {
                        return true;
                    }
                }
            }
        }

        false
    }
}
