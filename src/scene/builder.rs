use arrayvec::ArrayVec;
use tracing::{debug, info};

use crate::color::Spectra;
use crate::error::{SceneError, SceneResult};
use crate::light::sampler::{LightSamplers, PowerLightSampler, UniformLightSampler};
use crate::light::{AbstractLight, AreaLight, ImageInfiniteLight, Lights, UniformInfiniteLight};
use crate::material::Materials;
use crate::math::*;
use crate::primitive::{BvhNode, PrimitiveNode, TransformNode, BVH_STACK_SIZE, TRANSFORM_STACK_SIZE};
use crate::scene::{
    LightId, LightSamplerId, LightSamplerType, LightType, MaterialId, NodeId, NodeType, Scene, ShapeId, SpectrumId,
};
use crate::shape::{AbstractShape, Shapes};
use crate::texture::{Image, Textures};

/// Past this depth the BVH build stops evaluating the SAH and splits at the
/// median, so the tree stays shallow enough for the traversal stack.
const MAX_SAH_DEPTH: usize = BVH_STACK_SIZE / 2 - 8;

/// Assembles the flat node arrays of a [`Scene`]. Handles returned by the
/// `add_*` methods stay valid in the built scene.
#[derive(Debug, Default)]
pub struct SceneBuilder {
    pub shapes: Shapes,
    pub materials: Materials,
    pub textures: Textures,
    pub spectra: Spectra,

    lights: Lights,
    bvh_nodes: Vec<BvhNode>,
    transform_nodes: Vec<TransformNode>,
    primitive_nodes: Vec<PrimitiveNode>,
}

#[derive(Debug, Clone, Copy)]
struct BuildItem {
    node: NodeId,
    bounds: Bounds3f,
    centroid: Point3f,
}

impl SceneBuilder {
    pub fn new() -> SceneBuilder {
        SceneBuilder::default()
    }

    pub fn add_primitive(&mut self, shape: ShapeId, material: MaterialId) -> NodeId {
        self.push_primitive(PrimitiveNode { shape, material, light: LightId::NONE })
    }

    /// A primitive that also emits `radiance` from its front face, or from
    /// both faces when `two_sided`.
    pub fn add_emissive_primitive(
        &mut self,
        shape: ShapeId,
        material: MaterialId,
        radiance: SpectrumId,
        two_sided: bool,
    ) -> (NodeId, LightId) {
        let light = self.lights.add_area(AreaLight::new(radiance, shape, two_sided));
        let node = self.push_primitive(PrimitiveNode { shape, material, light });
        (node, light)
    }

    fn push_primitive(&mut self, prim: PrimitiveNode) -> NodeId {
        let id = NodeId::new(NodeType::Primitive, self.primitive_nodes.len());
        self.primitive_nodes.push(prim);
        id
    }

    pub fn add_uniform_light(&mut self, radiance: SpectrumId) -> LightId {
        self.lights.add_uniform(UniformInfiniteLight::new(radiance))
    }

    /// An environment map over the equal-area octahedral square, placed by
    /// `transform` (light to world).
    pub fn add_image_light(
        &mut self,
        image: Image,
        radiance: SpectrumId,
        scale: Float,
        transform: Transform,
    ) -> SceneResult<LightId> {
        let (w, h) = (image.width(), image.height());
        if image.data().iter().all(|&v| v <= 0.0) {
            return Err(SceneError::DegenerateLightDistribution);
        }
        let light = ImageInfiniteLight::new(image, radiance, scale, transform)
            .ok_or(SceneError::InvalidEnvironmentImage(w, h))?;
        Ok(self.lights.add_image(light))
    }

    /// An instance of `object` placed by `transform` (object to world).
    pub fn add_transform(&mut self, transform: Transform, object: NodeId) -> SceneResult<NodeId> {
        self.check_node(object)?;
        let id = NodeId::new(NodeType::Transform, self.transform_nodes.len());
        self.transform_nodes.push(TransformNode { transform, object });
        Ok(id)
    }

    /// Builds a BVH over `objects`, which may be primitives, instances or
    /// other BVHs. Each leaf holds exactly one object.
    pub fn add_bvh(&mut self, objects: &[NodeId]) -> SceneResult<NodeId> {
        if objects.is_empty() {
            return Err(SceneError::EmptyBvh);
        }

        let mut items = Vec::with_capacity(objects.len());
        for &node in objects {
            self.check_node(node)?;
            let bounds = self.node_bounds(node);
            items.push(BuildItem { node, bounds, centroid: bounds.centroid() });
        }

        let root = self.bvh_nodes.len();
        self.emit_bvh(&mut items, 0);
        debug!(objects = objects.len(), nodes = self.bvh_nodes.len() - root, "built bvh");

        Ok(NodeId::new(NodeType::Bvh, root))
    }

    /// Writes the subtree over `items` depth first, so that every inner
    /// node's near child directly follows it. Returns the node's index.
    fn emit_bvh(&mut self, items: &mut [BuildItem], depth: usize) -> usize {
        let idx = self.bvh_nodes.len();
        let bounds = items.iter().fold(Bounds3f::EMPTY, |b, i| b.union(i.bounds));

        if let [item] = items {
            self.bvh_nodes.push(BvhNode { min: bounds.min, max: bounds.max, flags: 0, far: item.node });
            return idx;
        }

        // Placeholder until the far child's index is known.
        self.bvh_nodes.push(BvhNode { min: bounds.min, max: bounds.max, flags: 1, far: NodeId::new(NodeType::Bvh, 0) });

        let centroid_bounds = Bounds3f::from_points(items.iter().map(|i| i.centroid));
        let axis = centroid_bounds.max_dimension();
        items.sort_by(|a, b| a.centroid[axis].total_cmp(&b.centroid[axis]));

        let split = if depth >= MAX_SAH_DEPTH || centroid_bounds.diagonal()[axis] == 0.0 {
            items.len() / 2
        } else {
            sah_split(items)
        };

        let (near, far) = items.split_at_mut(split);
        self.emit_bvh(near, depth + 1);
        let far = self.emit_bvh(far, depth + 1);

        let node = &mut self.bvh_nodes[idx];
        node.flags = 1 << axis;
        node.far = NodeId::new(NodeType::Bvh, far);
        idx
    }

    fn check_node(&self, node: NodeId) -> SceneResult<()> {
        let len = match node.ty() {
            NodeType::Bvh => self.bvh_nodes.len(),
            NodeType::Transform => self.transform_nodes.len(),
            NodeType::Primitive => self.primitive_nodes.len(),
        };
        if node.idx() >= len {
            return Err(SceneError::InvalidNode(node));
        }
        if node.ty() == NodeType::Primitive {
            let shape = self.primitive_nodes[node.idx()].shape;
            if !self.shapes.contains(shape) {
                return Err(SceneError::InvalidShape(shape));
            }
        }
        Ok(())
    }

    /// World bounds of a node in its parent's space.
    fn node_bounds(&self, node: NodeId) -> Bounds3f {
        match node.ty() {
            NodeType::Bvh => self.bvh_nodes[node.idx()].bounds(),
            NodeType::Transform => {
                let t = &self.transform_nodes[node.idx()];
                t.transform.apply_bounds(&self.node_bounds(t.object))
            }
            NodeType::Primitive => self.shapes.get(self.primitive_nodes[node.idx()].shape).bounds(),
        }
    }

    fn validate_handles(&self) -> SceneResult<()> {
        for &prim in &self.primitive_nodes {
            if !self.shapes.contains(prim.shape) {
                return Err(SceneError::InvalidShape(prim.shape));
            }
            if !self.materials.contains(prim.material) {
                return Err(SceneError::InvalidMaterial(prim.material));
            }
        }

        self.materials.validate(&self.textures, &self.spectra)?;
        self.textures.validate(&self.spectra)
    }

    /// Walks everything reachable from `root`. Checks the transform
    /// nesting and gives every area light the transform that places it.
    fn assign_light_transforms(&mut self, root: NodeId) -> SceneResult<()> {
        let mut placed: Vec<Option<ArrayVec<NodeId, TRANSFORM_STACK_SIZE>>> = vec![None; self.lights.len()];
        let mut seen = vec![false; self.lights.len()];

        let mut pending: Vec<(NodeId, ArrayVec<NodeId, TRANSFORM_STACK_SIZE>)> = vec![(root, ArrayVec::new())];
        while let Some((node, chain)) = pending.pop() {
            match node.ty() {
                NodeType::Bvh => {
                    let n = &self.bvh_nodes[node.idx()];
                    if n.is_leaf() {
                        pending.push((n.far, chain));
                    } else {
                        pending.push((NodeId::new(NodeType::Bvh, node.idx() + 1), chain.clone()));
                        pending.push((n.far, chain));
                    }
                }
                NodeType::Transform => {
                    let mut chain = chain;
                    if chain.try_push(node).is_err() {
                        return Err(SceneError::TransformDepth(TRANSFORM_STACK_SIZE));
                    }
                    pending.push((self.transform_nodes[node.idx()].object, chain));
                }
                NodeType::Primitive => {
                    let light = self.primitive_nodes[node.idx()].light;
                    if light.is_none() {
                        continue;
                    }
                    let Some(path) = self.lights.all().iter().position(|&l| l == light) else {
                        return Err(SceneError::InvalidLight(light));
                    };
                    if seen[path] {
                        return Err(SceneError::InstancedLight(light));
                    }
                    seen[path] = true;
                    placed[path] = Some(chain);
                }
            }
        }

        for (path, chain) in placed.into_iter().enumerate() {
            let light = self.lights.all()[path];
            let Some(chain) = chain else {
                if light.ty() == LightType::Area {
                    return Err(SceneError::UnplacedLight(light));
                }
                continue;
            };
            let transform_node = match chain.as_slice() {
                [] => None,
                [single] => Some(*single),
                chain => {
                    let composed = chain
                        .iter()
                        .map(|n| self.transform_nodes[n.idx()].transform)
                        .fold(Transform::default(), |acc, t| acc * t);
                    let object = self.transform_nodes[chain[chain.len() - 1].idx()].object;
                    let id = NodeId::new(NodeType::Transform, self.transform_nodes.len());
                    self.transform_nodes.push(TransformNode { transform: composed, object });
                    Some(id)
                }
            };
            self.lights.area_mut(light).transform_node = transform_node;
        }

        Ok(())
    }

    /// Freezes the scene under `root` and builds both light samplers,
    /// selecting `light_sampler` for rendering.
    pub fn build(mut self, root: NodeId, light_sampler: LightSamplerType) -> SceneResult<Scene> {
        if self.primitive_nodes.is_empty() {
            return Err(SceneError::EmptyScene);
        }
        self.check_node(root)?;
        self.validate_handles()?;
        self.assign_light_transforms(root)?;

        for light in self.lights.all() {
            let spectrum = self.lights.spectrum(*light);
            if !self.spectra.contains(spectrum) {
                return Err(SceneError::InvalidSpectrum(spectrum));
            }
        }

        let bounds = self.node_bounds(root);
        self.lights.preprocess(&bounds);

        let mut scene = Scene {
            bvh_nodes: self.bvh_nodes,
            transform_nodes: self.transform_nodes,
            primitive_nodes: self.primitive_nodes,
            root,
            bounds,
            shapes: self.shapes,
            materials: self.materials,
            textures: self.textures,
            spectra: self.spectra,
            lights: self.lights,
            light_samplers: LightSamplers::default(),
            light_sampler: LightSamplerId::new(light_sampler, 0),
        };

        // Infinite lights cannot be measured directly; they share the power
        // of everything finite.
        let finite: Float = scene
            .lights
            .all()
            .iter()
            .filter(|l| !l.is_infinite())
            .map(|&l| scene.lights.get(l).phi(&scene))
            .sum();
        let powers: Vec<(LightId, Float)> = scene
            .lights
            .all()
            .iter()
            .map(|&l| (l, if l.is_infinite() { finite.max(1.0) } else { scene.lights.get(l).phi(&scene) }))
            .collect();

        let uniform = scene.light_samplers.add_uniform(UniformLightSampler::new(scene.lights.all()));
        let power = scene.light_samplers.add_power(PowerLightSampler::new(&powers));
        scene.light_sampler = match light_sampler {
            LightSamplerType::Uniform => uniform,
            LightSamplerType::Power => power,
        };

        info!(
            bvh_nodes = scene.bvh_nodes.len(),
            transforms = scene.transform_nodes.len(),
            primitives = scene.primitive_nodes.len(),
            lights = scene.lights.len(),
            "scene built"
        );

        Ok(scene)
    }
}

/// Index splitting centroid-sorted `items` at the lowest surface area
/// heuristic cost.
fn sah_split(items: &[BuildItem]) -> usize {
    let n = items.len();
    let mut right_area = vec![0.0; n];
    let mut b = Bounds3f::EMPTY;
    for i in (1..n).rev() {
        b = b.union(items[i].bounds);
        right_area[i] = b.surface_area();
    }

    let mut best = (Float::INFINITY, n / 2);
    let mut b = Bounds3f::EMPTY;
    for i in 1..n {
        b = b.union(items[i - 1].bounds);
        let cost = i as Float * b.surface_area() + (n - i) as Float * right_area[i];
        if cost < best.0 {
            best = (cost, i);
        }
    }
    best.1
}
