//! Window → fixed-length feature vector.
//!
//! Layout, per channel in `Channel::ALL` order:
//! `[mean_x, mean_y, mean_z, entropy_x, entropy_y, entropy_z]`,
//! giving `FEATURE_LEN` components for the whole window.
//!
//! The entropy term is count-weighted: for each bucket `b` with `count_b`
//! members out of `n`, it adds `count_b * (-p_b * ln p_b)`. The trained
//! models expect this scale, so it must not be replaced by the normalized
//! Shannon form.
use crate::error::EngineError;
use crate::window::Window;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use tripmode_traits::{Channel, FEATURE_LEN, Sample};

/// Width of one discretization bucket for the entropy features.
pub const BUCKET_WIDTH: f64 = 0.1;

/// Components contributed by each channel.
pub const PER_CHANNEL: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_LEN]);

impl FeatureVector {
    #[inline]
    pub const fn from_array(values: [f64; FEATURE_LEN]) -> Self {
        Self(values)
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.0
    }

    #[inline]
    pub fn into_array(self) -> [f64; FEATURE_LEN] {
        self.0
    }

    /// The six components contributed by `channel`.
    pub fn channel(&self, channel: Channel) -> &[f64] {
        let start = channel.index() * PER_CHANNEL;
        &self.0[start..start + PER_CHANNEL]
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// libsvm training line: `<class> 0:<v0> 1:<v1> ...` with 10 decimals.
    /// Indices are zero-based to match the models trained on these files.
    pub fn to_svm_line(&self, class_no: i32) -> String {
        let mut line = class_no.to_string();
        for (idx, v) in self.0.iter().enumerate() {
            let _ = write!(line, " {idx}:{v:.10}");
        }
        line
    }
}

/// Round a bucket quotient half-to-even.
#[inline]
pub fn round_bucket(quotient: f64) -> i64 {
    quotient.round_ties_even() as i64
}

#[inline]
pub fn bucket(value: f64) -> i64 {
    round_bucket(value / BUCKET_WIDTH)
}

/// Count-weighted bucket entropy of `values`. Empty input yields 0.
pub fn weighted_entropy<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut buckets: BTreeMap<i64, u32> = BTreeMap::new();
    let mut n: u32 = 0;
    for v in values {
        *buckets.entry(bucket(v)).or_insert(0) += 1;
        n += 1;
    }
    if n == 0 {
        return 0.0;
    }
    let n = f64::from(n);
    buckets
        .values()
        .map(|&count| {
            let count = f64::from(count);
            let p = count / n;
            count * (-p * p.ln())
        })
        .sum()
}

fn axes(s: &Sample) -> [f64; 3] {
    [f64::from(s.x), f64::from(s.y), f64::from(s.z)]
}

/// Arithmetic mean of each axis. An empty channel is a caller bug.
pub fn mean_features(channel: Channel, samples: &[Sample]) -> Result<[f64; 3], EngineError> {
    if samples.is_empty() {
        return Err(EngineError::InvalidInput {
            channel,
            reason: "mean of an empty channel",
        });
    }
    let mut sum = [0.0f64; 3];
    for s in samples {
        for (acc, v) in sum.iter_mut().zip(axes(s)) {
            *acc += v;
        }
    }
    let n = samples.len() as f64;
    Ok(sum.map(|v| v / n))
}

pub fn entropy_features(samples: &[Sample]) -> [f64; 3] {
    std::array::from_fn(|axis| weighted_entropy(samples.iter().map(|s| axes(s)[axis])))
}

/// Encode a validated window. Fails with `InvalidInput` on an empty channel
/// and never yields a partially filled vector.
pub fn encode(window: &Window) -> Result<FeatureVector, EngineError> {
    let mut out = [0.0f64; FEATURE_LEN];
    for ch in Channel::ALL {
        let samples = window.samples(ch);
        let base = ch.index() * PER_CHANNEL;
        let mean = mean_features(ch, samples)?;
        out[base..base + 3].copy_from_slice(&mean);
        out[base + 3..base + PER_CHANNEL].copy_from_slice(&entropy_features(samples));
    }
    let fv = FeatureVector(out);
    if !fv.is_finite() {
        let channel = Channel::ALL
            .into_iter()
            .find(|&ch| fv.channel(ch).iter().any(|v| !v.is_finite()))
            .unwrap_or(Channel::LinearAcceleration);
        return Err(EngineError::InvalidInput {
            channel,
            reason: "non-finite feature",
        });
    }
    Ok(fv)
}
