use crate::math::*;

#[inline]
pub fn mix_bits(mut v: u64) -> u64 {
    v ^= v.wrapping_shr(31);
    v = v.wrapping_mul(0x7fb5d329728ea185);
    v ^= v.wrapping_shr(27);
    v = v.wrapping_mul(0x81dadef4bc2dd44d);
    v ^= v.wrapping_shr(33);
    v
}

pub fn murmur_hash_64a(key: &[u8], seed: u64) -> u64 {
    const M: u64 = 0xc6a4a7935bd1e995;
    const R: u32 = 47;

    let mut h = seed ^ (key.len() as u64).wrapping_mul(M);

    let mut chunks = key.chunks_exact(8);
    for chunk in &mut chunks {
        let mut k = u64::from_le_bytes([
            chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6], chunk[7],
        ]);

        k = k.wrapping_mul(M);
        k ^= k >> R;
        k = k.wrapping_mul(M);
        h ^= k;
        h = h.wrapping_mul(M);
    }

    let tail = chunks.remainder();
    if !tail.is_empty() {
        for (i, b) in tail.iter().enumerate() {
            h ^= (*b as u64) << (8 * i);
        }
        h = h.wrapping_mul(M);
    }

    h ^= h >> R;
    h = h.wrapping_mul(M);
    h ^= h >> R;
    h
}

/// Hash of a surface point and two handles, used to pick between the two
/// sides of a mix material. The same inputs always hash identically, so a
/// point resolves to the same constituent every time it is shaded.
pub fn hash_point_pair(p: Point3f, a: u32, b: u32) -> u64 {
    let mut key = [0u8; 20];
    key[0..4].copy_from_slice(&p.x.to_le_bytes());
    key[4..8].copy_from_slice(&p.y.to_le_bytes());
    key[8..12].copy_from_slice(&p.z.to_le_bytes());
    key[12..16].copy_from_slice(&a.to_le_bytes());
    key[16..20].copy_from_slice(&b.to_le_bytes());
    murmur_hash_64a(&key, 0)
}

/// Maps a hash onto `[0, 1)` using its top 24 bits.
#[inline]
pub fn hash_to_unit(h: u64) -> Float {
    (h >> 40) as Float * (1.0 / (1u64 << 24) as Float)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_hash_is_stable() {
        let p = Point3f::new(0.25, -1.0, 3.5);
        assert_eq!(hash_point_pair(p, 1, 2), hash_point_pair(p, 1, 2));
        assert_ne!(hash_point_pair(p, 1, 2), hash_point_pair(p, 2, 1));
        assert_ne!(hash_point_pair(p, 1, 2), hash_point_pair(Point3f::new(0.25, -1.0, 3.25), 1, 2));
    }

    #[test]
    fn unit_range() {
        for i in 0..1000u64 {
            let u = hash_to_unit(mix_bits(i));
            assert!((0.0..1.0).contains(&u));
        }
        assert!(hash_to_unit(u64::MAX) < 1.0);
    }
}
