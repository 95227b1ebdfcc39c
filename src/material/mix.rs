use crate::material::MaterialEvaluator;
use crate::math::*;
use crate::scene::{MaterialId, TextureId};

/// Picks `materials[1]` with probability `amount`. Never turned into a
/// BSDF itself; see [`Materials::resolve`](crate::material::Materials::resolve).
#[derive(Debug, Clone)]
pub struct MixMaterial {
    pub materials: [MaterialId; 2],
    pub amount: TextureId,
}

impl MixMaterial {
    pub fn choose<E: MaterialEvaluator>(&self, eval: &E, uv: Point2f, u: Float) -> MaterialId {
        let amount = eval.evaluate_float(self.amount, uv);

        if amount <= 0.0 {
            self.materials[0]
        } else if amount >= 1.0 {
            self.materials[1]
        } else if amount < u {
            self.materials[0]
        } else {
            self.materials[1]
        }
    }
}
