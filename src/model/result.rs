// src/model/result.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::ValidatorError;

/// Named diagnostic values attached to a result
pub type Evidence = BTreeMap<String, Value>;

/// Tier 1 depends on composition and formal charge only,
/// tier 2 additionally on computed 3-D geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Tier {
    One,
    Two,
}

impl From<Tier> for u8 {
    fn from(t: Tier) -> u8 {
        match t {
            Tier::One => 1,
            Tier::Two => 2,
        }
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Tier::One),
            2 => Ok(Tier::Two),
            other => Err(format!("tier must be 1 or 2, got {}", other)),
        }
    }
}

/// How far a check stands apart from the model that produced the structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Independence {
    /// Textbook chemistry only
    FullyIndependent,
    /// Leans on experimental statistics or fitted parameters
    SemiIndependent,
    /// Re-derives what the generating model already optimised
    ComputationalConsistency,
}

impl Independence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Independence::FullyIndependent => "fully_independent",
            Independence::SemiIndependent => "semi_independent",
            Independence::ComputationalConsistency => "computational_consistency",
        }
    }
}

/// Output of one validator on one structure.
///
/// The constructors keep `applicable == score.is_some()` and the score
/// finite; there is no pass/fail field. Deserialization goes through the
/// same checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredResult")]
pub struct ValidationResult {
    structure_id: String,
    validator: String,
    applicable: bool,
    score: Option<f64>,
    evidence: Evidence,
    tier: Tier,
    #[serde(skip_serializing_if = "Option::is_none")]
    independence: Option<Independence>,
}

/// Wire form of `ValidationResult`, checked on the way in
#[derive(Deserialize)]
struct StoredResult {
    structure_id: String,
    validator: String,
    applicable: bool,
    score: Option<f64>,
    #[serde(default)]
    evidence: Evidence,
    tier: Tier,
    #[serde(default)]
    independence: Option<Independence>,
}

impl TryFrom<StoredResult> for ValidationResult {
    type Error = String;

    fn try_from(raw: StoredResult) -> Result<Self, Self::Error> {
        match (raw.applicable, raw.score) {
            (true, Some(score)) if score.is_finite() => {}
            (true, Some(score)) => {
                return Err(format!("{}: non-finite score {}", raw.validator, score));
            }
            (true, None) => return Err(format!("{}: applicable without a score", raw.validator)),
            (false, Some(_)) => return Err(format!("{}: score on a skipped result", raw.validator)),
            (false, None) => {}
        }
        Ok(Self {
            structure_id: raw.structure_id,
            validator: raw.validator,
            applicable: raw.applicable,
            score: raw.score,
            evidence: raw.evidence,
            tier: raw.tier,
            independence: raw.independence,
        })
    }
}

impl ValidationResult {
    pub fn computed(
        structure_id: &str,
        validator: &str,
        tier: Tier,
        score: f64,
        evidence: Evidence,
    ) -> Result<Self, ValidatorError> {
        if !score.is_finite() {
            return Err(ValidatorError::NonFiniteScore { value: score });
        }
        Ok(Self {
            structure_id: structure_id.to_string(),
            validator: validator.to_string(),
            applicable: true,
            score: Some(score),
            evidence,
            tier,
            independence: None,
        })
    }

    pub fn not_applicable(
        structure_id: &str,
        validator: &str,
        tier: Tier,
        reason: &str,
        mut evidence: Evidence,
    ) -> Self {
        evidence.insert("skip_reason".into(), Value::from(reason));
        Self {
            structure_id: structure_id.to_string(),
            validator: validator.to_string(),
            applicable: false,
            score: None,
            evidence,
            tier,
            independence: None,
        }
    }

    pub fn structure_id(&self) -> &str {
        &self.structure_id
    }

    pub fn validator(&self) -> &str {
        &self.validator
    }

    pub fn applicable(&self) -> bool {
        self.applicable
    }

    pub fn score(&self) -> Option<f64> {
        self.score
    }

    pub fn evidence(&self) -> &Evidence {
        &self.evidence
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Set by the runner from the validator that produced the result
    pub fn independence(&self) -> Option<Independence> {
        self.independence
    }

    pub fn with_independence(mut self, independence: Independence) -> Self {
        self.independence = Some(independence);
        self
    }

    /// Adds a diagnostic note; never touches the score
    pub fn with_evidence(mut self, key: &str, value: Value) -> Self {
        self.evidence.insert(key.to_string(), value);
        self
    }
}
