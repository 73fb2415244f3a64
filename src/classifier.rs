//! Boundary to the externally trained risk model.
//!
//! The model was fit on feature vectors laid out as
//! `[age, avg_reaction_time, correct_count, wrong_count, composite_score]`. That order is part of
//! the contract with the artifact: reordering the fields silently corrupts predictions.

use crate::error::{Error, Result};
use crate::scoring::ScoreSummary;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Feature names in the order the model expects them
pub const FEATURE_NAMES: [&str; 5] = [
    "age",
    "avg_reaction_time",
    "correct_count",
    "wrong_count",
    "composite_score",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum RiskLabel {
    #[strum(to_string = "low risk")]
    LowRisk,
    #[strum(to_string = "high risk")]
    HighRisk,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub age: u32,
    pub avg_reaction_time: f64,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub composite_score: i64,
}

impl FeatureVector {
    pub fn new(age: u32, summary: &ScoreSummary) -> Self {
        Self {
            age,
            avg_reaction_time: summary.avg_reaction_time,
            correct_count: summary.correct_count,
            wrong_count: summary.wrong_count,
            composite_score: summary.composite_score,
        }
    }

    pub fn to_array(&self) -> [f64; 5] {
        [
            f64::from(self.age),
            self.avg_reaction_time,
            f64::from(self.correct_count),
            f64::from(self.wrong_count),
            self.composite_score as f64,
        ]
    }
}

pub trait RiskClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<RiskLabel>;
}

/// Stands in when no model could be loaded; every prediction reports why.
#[derive(Debug, Clone)]
pub struct UnavailableClassifier {
    reason: String,
}

impl UnavailableClassifier {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl RiskClassifier for UnavailableClassifier {
    fn predict(&self, _features: &FeatureVector) -> Result<RiskLabel> {
        Err(Error::ClassifierUnavailable(self.reason.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// On-disk form of the trained model: a standard scaler followed by a binary logistic regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    pub scaler: StandardScaler,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl ModelArtifact {
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| Error::ClassifierUnavailable(format!("malformed model artifact: {e}")))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            Error::ClassifierUnavailable(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&bytes)
    }

    pub fn into_model(self) -> Result<LogisticModel> {
        LogisticModel::try_from(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogisticModel {
    mean: [f64; 5],
    scale: [f64; 5],
    coefficients: [f64; 5],
    intercept: f64,
}

impl LogisticModel {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let model = ModelArtifact::load(path.as_ref())?.into_model()?;
        tracing::info!(path = %path.as_ref().display(), "loaded risk model");
        Ok(model)
    }

    /// Signed distance from the decision boundary in scaled feature space
    pub fn decision_function(&self, features: &FeatureVector) -> f64 {
        features
            .to_array()
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .zip(&self.coefficients)
            .fold(self.intercept, |acc, ((x, (mean, scale)), coef)| {
                acc + coef * (x - mean) / scale
            })
    }

    /// Probability of the high-risk class
    pub fn probability(&self, features: &FeatureVector) -> f64 {
        1.0 / (1.0 + (-self.decision_function(features)).exp())
    }
}

impl TryFrom<ModelArtifact> for LogisticModel {
    type Error = Error;

    fn try_from(artifact: ModelArtifact) -> Result<Self> {
        if let Some(names) = &artifact.feature_names {
            if names.iter().map(String::as_str).ne(FEATURE_NAMES) {
                return Err(Error::ClassifierUnavailable(format!(
                    "model expects features {names:?}, this screener produces {FEATURE_NAMES:?}"
                )));
            }
        }

        let mean = fixed_width("scaler.mean", &artifact.scaler.mean)?;
        let scale = fixed_width("scaler.scale", &artifact.scaler.scale)?;
        let coefficients = fixed_width("coefficients", &artifact.coefficients)?;

        if scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            return Err(Error::ClassifierUnavailable(
                "scaler.scale entries must be finite and non-zero".into(),
            ));
        }
        if !artifact.intercept.is_finite() {
            return Err(Error::ClassifierUnavailable("intercept is not finite".into()));
        }

        Ok(Self {
            mean,
            scale,
            coefficients,
            intercept: artifact.intercept,
        })
    }
}

impl RiskClassifier for LogisticModel {
    fn predict(&self, features: &FeatureVector) -> Result<RiskLabel> {
        let z = self.decision_function(features);
        if !z.is_finite() {
            return Err(Error::ClassifierUnavailable(format!(
                "model produced a non-finite score for {:?}",
                features.to_array()
            )));
        }
        Ok(if z > 0.0 {
            RiskLabel::HighRisk
        } else {
            RiskLabel::LowRisk
        })
    }
}

fn fixed_width(field: &str, values: &[f64]) -> Result<[f64; 5]> {
    <[f64; 5]>::try_from(values).map_err(|_| {
        Error::ClassifierUnavailable(format!(
            "{field} has {} entries, expected {}",
            values.len(),
            FEATURE_NAMES.len()
        ))
    })
}
