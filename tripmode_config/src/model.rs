//! Linear one-vs-rest classifier loaded from TOML.
//!
//! ```toml
//! [[classes]]
//! code = 1
//! bias = -0.2
//! weights = [0.1, 0.0, ...]   # exactly FEATURE_LEN entries
//! ```
//!
//! `predict` returns the code of the class with the highest decision value.
//! Ties resolve to the class listed first.
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tripmode_traits::{BoxError, Classifier, FEATURE_LEN};

#[derive(Debug, Deserialize, Clone)]
pub struct ClassWeights {
    pub code: i32,
    #[serde(default)]
    pub bias: f64,
    pub weights: Vec<f64>,
}

impl ClassWeights {
    #[inline]
    fn decision(&self, features: &[f64]) -> f64 {
        self.weights
            .iter()
            .zip(features)
            .map(|(w, f)| w * f)
            .sum::<f64>()
            + self.bias
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LinearModel {
    pub classes: Vec<ClassWeights>,
}

impl LinearModel {
    pub fn from_toml_str(s: &str) -> eyre::Result<Self> {
        let model: LinearModel =
            toml::from_str(s).map_err(|e| eyre::eyre!("invalid model TOML: {e}"))?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> eyre::Result<()> {
        if self.classes.is_empty() {
            eyre::bail!("model must declare at least one class");
        }
        let mut seen = HashSet::new();
        for (i, c) in self.classes.iter().enumerate() {
            if !seen.insert(c.code) {
                eyre::bail!("model class {} reuses code {}", i, c.code);
            }
            if c.weights.len() != FEATURE_LEN {
                eyre::bail!(
                    "model class {} (code {}) has {} weights, expected {}",
                    i,
                    c.code,
                    c.weights.len(),
                    FEATURE_LEN
                );
            }
            if !c.bias.is_finite() || c.weights.iter().any(|w| !w.is_finite()) {
                eyre::bail!("model class {} (code {}) has non-finite parameters", i, c.code);
            }
        }
        Ok(())
    }

    pub fn codes(&self) -> impl Iterator<Item = i32> + '_ {
        self.classes.iter().map(|c| c.code)
    }
}

impl Classifier for LinearModel {
    fn predict(&self, features: &[f64]) -> Result<i32, BoxError> {
        if features.len() != FEATURE_LEN {
            return Err(format!(
                "feature vector has {} components, expected {}",
                features.len(),
                FEATURE_LEN
            )
            .into());
        }
        let mut best: Option<(i32, f64)> = None;
        for class in &self.classes {
            let d = class.decision(features);
            match best {
                Some((_, top)) if d <= top => {}
                _ => best = Some((class.code, d)),
            }
        }
        best.map(|(code, _)| code)
            .ok_or_else(|| "model has no classes".into())
    }
}

pub fn load_model(path: &Path) -> eyre::Result<LinearModel> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("open model {:?}: {}", path, e))?;
    LinearModel::from_toml_str(&text)
}
