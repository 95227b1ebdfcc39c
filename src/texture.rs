use arrayvec::ArrayVec;

use crate::color::{SampledSpectrum, SampledWavelengths, Spectra};
use crate::error::{SceneError, SceneResult};
use crate::math::*;
use crate::scene::{SpectrumId, TextureId, TextureType};

/// Deepest chain of nested textures one lookup may walk.
pub const MAX_TEXTURE_DEPTH: usize = 16;

/// Wavelength the scalar view of a spectral texture is taken at.
const FLOAT_TEXTURE_LAMBDA: Float = 550.0;

pub trait AbstractTextureEvaluator {
    fn evaluate(&self, texture: TextureId, uv: Point2f, lambda: &SampledWavelengths) -> SampledSpectrum;

    fn evaluate_float(&self, texture: TextureId, uv: Point2f) -> Float;
}

/// A single channel image, addressed in `[0, 1]^2` with `v` growing
/// downwards. Lookups take the nearest texel.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: usize,
    height: usize,
    data: Vec<Float>,
}

impl Image {
    pub fn new(width: usize, height: usize, data: Vec<Float>) -> Option<Image> {
        if width == 0 || height == 0 || data.len() != width * height {
            return None;
        }
        Some(Image { width, height, data })
    }

    #[inline]
    pub fn width(&self) -> usize { self.width }

    #[inline]
    pub fn height(&self) -> usize { self.height }

    #[inline]
    pub fn data(&self) -> &[Float] { &self.data }

    #[inline]
    pub fn texel(&self, x: usize, y: usize) -> Float {
        self.data[y * self.width + x]
    }

    /// Nearest lookup with repeat wrapping.
    pub fn lookup_nearest(&self, uv: Point2f) -> Float {
        let wrap = |v: Float, n: usize| {
            let i = (v * n as Float).floor() as i64;
            i.rem_euclid(n as i64) as usize
        };
        self.texel(wrap(uv.x, self.width), wrap(uv.y, self.height))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantTexture {
    pub spectrum: SpectrumId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageTexture {
    pub image: u32,
}

/// Product of two textures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleTexture {
    pub left: TextureId,
    pub right: TextureId,
}

/// Alternates between two textures on the unit grid in uv.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckerboardTexture {
    pub even: TextureId,
    pub odd: TextureId,
}

impl CheckerboardTexture {
    #[inline]
    pub fn select(&self, uv: Point2f) -> TextureId {
        let parity = (uv.x.floor() as i64 + uv.y.floor() as i64).rem_euclid(2);
        if parity == 0 { self.even } else { self.odd }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Textures {
    constant: Vec<ConstantTexture>,
    image: Vec<ImageTexture>,
    scale: Vec<ScaleTexture>,
    checkerboard: Vec<CheckerboardTexture>,
    images: Vec<Image>,
}

impl Textures {
    pub fn add_constant(&mut self, spectrum: SpectrumId) -> TextureId {
        let id = TextureId::new(TextureType::Constant, self.constant.len());
        self.constant.push(ConstantTexture { spectrum });
        id
    }

    pub fn add_image(&mut self, image: Image) -> TextureId {
        let id = TextureId::new(TextureType::Image, self.image.len());
        self.image.push(ImageTexture { image: self.images.len() as u32 });
        self.images.push(image);
        id
    }

    pub fn add_scale(&mut self, left: TextureId, right: TextureId) -> TextureId {
        let id = TextureId::new(TextureType::Scale, self.scale.len());
        self.scale.push(ScaleTexture { left, right });
        id
    }

    pub fn add_checkerboard(&mut self, even: TextureId, odd: TextureId) -> TextureId {
        let id = TextureId::new(TextureType::Checkerboard, self.checkerboard.len());
        self.checkerboard.push(CheckerboardTexture { even, odd });
        id
    }

    pub fn contains(&self, texture: TextureId) -> bool {
        let idx = texture.idx();
        match texture.ty() {
            TextureType::Constant => idx < self.constant.len(),
            TextureType::Image => idx < self.image.len(),
            TextureType::Scale => idx < self.scale.len(),
            TextureType::Checkerboard => idx < self.checkerboard.len(),
        }
    }

    /// Textures referenced by `texture` that must exist for it to evaluate.
    pub fn children(&self, texture: TextureId) -> ArrayVec<TextureId, 2> {
        let mut out = ArrayVec::new();
        match texture.ty() {
            TextureType::Scale => {
                let s = &self.scale[texture.idx()];
                out.push(s.left);
                out.push(s.right);
            }
            TextureType::Checkerboard => {
                let c = &self.checkerboard[texture.idx()];
                out.push(c.even);
                out.push(c.odd);
            }
            TextureType::Constant | TextureType::Image => {}
        }
        out
    }

    pub fn constant_spectrum(&self, texture: TextureId) -> Option<SpectrumId> {
        match texture.ty() {
            TextureType::Constant => Some(self.constant[texture.idx()].spectrum),
            _ => None,
        }
    }

    /// Multiplies together every leaf reached from `texture`. Scale nodes
    /// fan out into both operands and checkerboards pick one side, so the
    /// walk is a product over a tree and needs no recursion.
    fn walk<F: FnMut(TextureId)>(&self, texture: TextureId, uv: Point2f, mut leaf: F) {
        let mut pending: ArrayVec<TextureId, MAX_TEXTURE_DEPTH> = ArrayVec::new();
        pending.push(texture);

        while let Some(tex) = pending.pop() {
            match tex.ty() {
                TextureType::Constant | TextureType::Image => leaf(tex),
                TextureType::Scale => {
                    let s = &self.scale[tex.idx()];
                    assert!(pending.remaining_capacity() >= 2, "texture nesting deeper than {MAX_TEXTURE_DEPTH}");
                    pending.push(s.right);
                    pending.push(s.left);
                }
                TextureType::Checkerboard => {
                    pending.push(self.checkerboard[tex.idx()].select(uv));
                }
            }
        }
    }

    pub fn evaluate(
        &self,
        spectra: &Spectra,
        texture: TextureId,
        uv: Point2f,
        lambda: &SampledWavelengths,
    ) -> SampledSpectrum {
        use crate::color::AbstractSpectrumEvaluator as _;

        let mut result = SampledSpectrum::from_const(1.0);
        self.walk(texture, uv, |tex| match tex.ty() {
            TextureType::Constant => result *= spectra.sample(self.constant[tex.idx()].spectrum, lambda),
            TextureType::Image => result *= self.image_value(tex, uv),
            _ => unreachable!(),
        });
        result
    }

    pub fn evaluate_float(&self, spectra: &Spectra, texture: TextureId, uv: Point2f) -> Float {
        let mut result = 1.0;
        self.walk(texture, uv, |tex| match tex.ty() {
            TextureType::Constant => result *= spectra.get(self.constant[tex.idx()].spectrum, FLOAT_TEXTURE_LAMBDA),
            TextureType::Image => result *= self.image_value(tex, uv),
            _ => unreachable!(),
        });
        result
    }

    /// Checks that every texture's operands exist and that no chain of
    /// nested textures outgrows the evaluation stack.
    pub(crate) fn validate(&self, spectra: &Spectra) -> SceneResult<()> {
        let all = (0..self.constant.len())
            .map(|i| TextureId::new(TextureType::Constant, i))
            .chain((0..self.scale.len()).map(|i| TextureId::new(TextureType::Scale, i)))
            .chain((0..self.checkerboard.len()).map(|i| TextureId::new(TextureType::Checkerboard, i)));

        for texture in all {
            let mut pending: Vec<(TextureId, usize)> = vec![(texture, 1)];
            while let Some((tex, depth)) = pending.pop() {
                if !self.contains(tex) {
                    return Err(SceneError::InvalidTexture(tex));
                }
                if depth >= MAX_TEXTURE_DEPTH {
                    return Err(SceneError::TextureDepth(MAX_TEXTURE_DEPTH));
                }
                if let Some(spectrum) = self.constant_spectrum(tex) {
                    if !spectra.contains(spectrum) {
                        return Err(SceneError::InvalidSpectrum(spectrum));
                    }
                }
                pending.extend(self.children(tex).into_iter().map(|c| (c, depth + 1)));
            }
        }
        Ok(())
    }

    #[inline]
    fn image_value(&self, texture: TextureId, uv: Point2f) -> Float {
        let image = &self.images[self.image[texture.idx()].image as usize];
        image.lookup_nearest(uv)
    }
}
