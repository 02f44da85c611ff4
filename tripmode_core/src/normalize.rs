//! Affine feature normalization learned at training time.
use crate::error::BuildError;
use crate::features::FeatureVector;

/// One `(scale, offset)` pair applied to every component:
/// `normalized[i] = scale * raw[i] + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationParams {
    scale: f64,
    offset: f64,
}

impl NormalizationParams {
    pub fn new(scale: f64, offset: f64) -> Result<Self, BuildError> {
        if !scale.is_finite() || !offset.is_finite() {
            return Err(BuildError::InvalidConfig(
                "normalization scale and offset must be finite",
            ));
        }
        Ok(Self { scale, offset })
    }

    pub const fn identity() -> Self {
        Self {
            scale: 1.0,
            offset: 0.0,
        }
    }

    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[inline]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    #[inline]
    pub fn apply(&self, v: f64) -> f64 {
        self.scale * v + self.offset
    }
}

impl Default for NormalizationParams {
    fn default() -> Self {
        Self::identity()
    }
}

pub fn normalize(vector: &FeatureVector, params: &NormalizationParams) -> FeatureVector {
    let mut out = *vector;
    for v in out.as_mut_slice() {
        *v = params.apply(*v);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripmode_traits::FEATURE_LEN;

    #[test]
    fn applies_same_pair_to_every_component() {
        let raw: [f64; FEATURE_LEN] = std::array::from_fn(|i| i as f64);
        let p = NormalizationParams::new(2.0, -1.0).unwrap();
        let out = normalize(&FeatureVector::from_array(raw), &p);
        for (i, v) in out.as_slice().iter().enumerate() {
            assert_eq!(*v, 2.0 * i as f64 - 1.0);
        }
    }

    #[test]
    fn identity_is_a_no_op() {
        let raw = FeatureVector::from_array([0.125; FEATURE_LEN]);
        assert_eq!(normalize(&raw, &NormalizationParams::identity()), raw);
    }

    #[test]
    fn rejects_non_finite_params() {
        assert!(NormalizationParams::new(f64::NAN, 0.0).is_err());
        assert!(NormalizationParams::new(1.0, f64::INFINITY).is_err());
    }
}
