// src/oxidation/consensus.rs

use crate::model::oxidation::{Confidence, Method, MethodTag};

/// Outcome of reducing several methods' answers to one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduced<T> {
    pub confidence: Confidence,
    pub value: Option<T>,
    pub tag: MethodTag,
}

/// The single reduction rule, in priority order:
///
/// 1. ≥2 values, all equal: `both_agree`, the shared value
/// 2. exactly one value: `single_method`, that value
/// 3. ≥2 values that differ: `methods_disagree`, no value
/// 4. no value: `no_assignment`, no value
///
/// Used both per site and for the structure as a whole.
pub fn reduce<T: PartialEq + Clone>(results: &[(Method, Option<T>)]) -> Reduced<T> {
    let produced: Vec<(Method, &T)> = results
        .iter()
        .filter_map(|(m, v)| v.as_ref().map(|v| (*m, v)))
        .collect();

    match produced.as_slice() {
        [] => Reduced {
            confidence: Confidence::NoAssignment,
            value: None,
            tag: MethodTag::None,
        },
        [(method, value)] => Reduced {
            confidence: Confidence::SingleMethod,
            value: Some((*value).clone()),
            tag: MethodTag::from(*method),
        },
        [(_, first), rest @ ..] if rest.iter().all(|(_, v)| v == first) => Reduced {
            confidence: Confidence::BothAgree,
            value: Some((*first).clone()),
            tag: MethodTag::Consensus,
        },
        _ => Reduced {
            confidence: Confidence::MethodsDisagree,
            value: None,
            tag: MethodTag::Disagreement,
        },
    }
}
