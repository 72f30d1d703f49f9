// src/oxidation/guesses.rs
//
// Composition-only assignment: pick one known state per element so the
// formula is neutral, preferring common states.

use super::MethodRun;
use crate::config::ResolverConfig;
use crate::model::elements;
use crate::model::oxidation::Method;
use crate::model::structure::StructureRecord;

/// Added when the most electronegative element ends up non-negative
const ELECTRONEGATIVITY_PENALTY: usize = 1000;

/// Best neutral combination over the reduced formula, element order as in
/// `composition()`. `Err` carries the reason no answer exists.
pub fn best_combination(
    structure: &StructureRecord,
    max_combinations: usize,
) -> Result<Vec<(String, i32)>, String> {
    let formula: Vec<(String, i64)> = structure
        .reduced_composition()
        .into_iter()
        .map(|(el, n)| (el, n as i64))
        .collect();

    let mut choices: Vec<&'static [i32]> = Vec::with_capacity(formula.len());
    let mut space: usize = 1;
    for (el, _) in &formula {
        let states = elements::known_oxidation_states(el);
        if states.is_empty() {
            return Err(format!("no known oxidation states for {}", el));
        }
        space = space
            .checked_mul(states.len())
            .filter(|&s| s <= max_combinations)
            .ok_or_else(|| format!("more than {} combinations", max_combinations))?;
        choices.push(states);
    }

    let most_electronegative = formula
        .iter()
        .enumerate()
        .filter_map(|(i, (el, _))| elements::electronegativity(el).map(|chi| (i, chi)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i);

    // Odometer over preference indices; index 0 is the most common state
    let mut idx = vec![0usize; formula.len()];
    let mut best: Option<(usize, Vec<i32>)> = None;

    for _ in 0..space {
        let combo: Vec<i32> = idx.iter().zip(&choices).map(|(&k, s)| s[k]).collect();
        let charge: i64 = combo
            .iter()
            .zip(&formula)
            .map(|(&s, (_, n))| s as i64 * n)
            .sum();

        if charge == 0 {
            let mut score: usize = idx.iter().sum();
            if most_electronegative.is_some_and(|i| combo[i] >= 0) {
                score += ELECTRONEGATIVITY_PENALTY;
            }
            let better = match &best {
                None => true,
                Some((s, v)) => (score, &combo) < (*s, v),
            };
            if better {
                best = Some((score, combo));
            }
        }

        for k in (0..idx.len()).rev() {
            idx[k] += 1;
            if idx[k] < choices[k].len() {
                break;
            }
            idx[k] = 0;
        }
    }

    let (_, states) = best.ok_or_else(|| "no charge-neutral combination".to_string())?;
    Ok(formula.into_iter().map(|(el, _)| el).zip(states).collect())
}

pub fn assign(structure: &StructureRecord, config: &ResolverConfig) -> MethodRun {
    let n = structure.sites.len();
    match best_combination(structure, config.max_guess_combinations) {
        Ok(per_element) => {
            let states = structure
                .sites
                .iter()
                .map(|site| {
                    per_element
                        .iter()
                        .find(|(el, _)| *el == site.element)
                        .map(|(_, s)| *s)
                })
                .collect();
            MethodRun::from_states(Method::OxidationGuess, states, "no element matched")
        }
        Err(reason) => {
            log::debug!("{}: oxidation guess failed: {}", structure.id, reason);
            MethodRun::failed(Method::OxidationGuess, n, &reason)
        }
    }
}
