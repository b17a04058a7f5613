//! Random gate chains sampled from a hardware's placeable actions.

use std::collections::BTreeMap;
use std::f64::consts::TAU;
use std::sync::Arc;

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use qbench_ir::{Gate, GateChain, GateSpec, Hardware, HardwareConfig, QubitId};

use super::{Quota, Target, TargetGenerator};
use crate::artifact::Artifact;
use crate::error::{BenchError, BenchResult};

const MASS_TOLERANCE: f64 = 1e-9;

/// How actions outside the two-qubit pool are drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GateDistribution {
    /// `"uniform"`: every action equally likely.
    Named(String),
    /// Probability per gate-set entry, split evenly over that entry's placements.
    Weights(BTreeMap<String, f64>),
}

impl Default for GateDistribution {
    fn default() -> Self {
        GateDistribution::Named("uniform".to_string())
    }
}

/// Configuration of [`RandomChainTarget`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RandomChainConfig {
    /// Hardware whose gate set and connectivity define the actions.
    pub hardware: HardwareConfig,
    /// Number of chains; absent or negative means unbounded.
    #[serde(default)]
    pub number: Option<i64>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub gate_distribution: GateDistribution,
    /// Fixed number of gates per chain.
    #[serde(default)]
    pub chain_length: Option<usize>,
    /// Lower end of a uniformly drawn length; defaults to zero.
    #[serde(default)]
    pub chain_length_min: Option<usize>,
    /// Upper end of a uniformly drawn length, inclusive.
    #[serde(default)]
    pub chain_length_max: Option<usize>,
    /// Stop a chain once its depth reaches this value.
    #[serde(default)]
    pub depth_limit: Option<usize>,
    #[serde(default)]
    pub two_qubit_gate_num_upper_bound: Option<usize>,
    /// Requires the upper bound; defaults to zero.
    #[serde(default)]
    pub two_qubit_gate_num_lower_bound: Option<usize>,
}

impl RandomChainConfig {
    /// Fixed-length chains on `hardware`, uniform distribution, unbounded count.
    pub fn new(hardware: HardwareConfig, chain_length: usize) -> Self {
        Self {
            hardware,
            number: None,
            seed: None,
            gate_distribution: GateDistribution::default(),
            chain_length: Some(chain_length),
            chain_length_min: None,
            chain_length_max: None,
            depth_limit: None,
            two_qubit_gate_num_upper_bound: None,
            two_qubit_gate_num_lower_bound: None,
        }
    }
}

/// One gate-set entry on one ordered qubit tuple.
#[derive(Debug, Clone)]
struct Action {
    spec: GateSpec,
    qubits: Vec<QubitId>,
}

/// Samples gate chains action by action.
///
/// Two-qubit actions get their own pool when a two-qubit count bound is
/// set; the bounded number of two-qubit gates is placed at positions drawn
/// without replacement.
pub struct RandomChainTarget {
    name: String,
    hardware: Arc<Hardware>,
    actions: Vec<Action>,
    two_qubit_actions: Vec<Action>,
    weights: Option<WeightedIndex<f64>>,
    length: (usize, usize),
    depth_limit: Option<usize>,
    two_qubit_bounds: Option<(usize, usize)>,
    quota: Quota,
    next_id: u64,
    rng: StdRng,
}

impl RandomChainTarget {
    /// Validate `config` and build the action pools.
    pub fn new(name: impl Into<String>, config: RandomChainConfig) -> BenchResult<Self> {
        let hardware = Arc::new(Hardware::from_config(&config.hardware)?);
        let two_qubit_bounds = two_qubit_bounds(&config)?;
        let length = length_range(&config)?;

        let (actions, two_qubit_actions) = build_actions(&hardware, two_qubit_bounds.is_some());
        if actions.is_empty() {
            return Err(BenchError::Config(format!(
                "hardware '{}' admits no placeable actions",
                hardware.name()
            )));
        }
        if two_qubit_bounds.is_some_and(|(_, hi)| hi > 0) && two_qubit_actions.is_empty() {
            return Err(BenchError::Config(format!(
                "hardware '{}' admits no two-qubit actions",
                hardware.name()
            )));
        }

        let weights = match &config.gate_distribution {
            GateDistribution::Named(name) if name == "uniform" => None,
            GateDistribution::Named(other) => {
                return Err(BenchError::Config(format!("unknown gate distribution '{other}'")));
            }
            GateDistribution::Weights(_) if two_qubit_bounds.is_some() => {
                return Err(BenchError::ConflictingConstraints(
                    "an explicit gate distribution cannot be combined with a two-qubit gate bound".into(),
                ));
            }
            GateDistribution::Weights(w) => Some(action_weights(&hardware, &actions, w)?),
        };

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        debug!(
            hardware = hardware.name(),
            actions = actions.len(),
            two_qubit_actions = two_qubit_actions.len(),
            "random chain generator ready"
        );
        Ok(Self {
            name: name.into(),
            hardware,
            actions,
            two_qubit_actions,
            weights,
            length,
            depth_limit: config.depth_limit,
            two_qubit_bounds,
            quota: Quota::new(config.number),
            next_id: 0,
            rng,
        })
    }

    /// Hardware the chains are bound to.
    pub fn hardware(&self) -> &Arc<Hardware> {
        &self.hardware
    }

    /// Size of the main and two-qubit action pools.
    pub fn num_actions(&self) -> (usize, usize) {
        (self.actions.len(), self.two_qubit_actions.len())
    }

    /// Sample one chain, ignoring the count limit.
    pub fn sample(&mut self) -> BenchResult<GateChain> {
        let (min, max) = self.length;
        let chain_length = if min == max { min } else { self.rng.gen_range(min..=max) };

        let mut two_qubit_slot = vec![false; chain_length];
        if let Some((lo, hi)) = self.two_qubit_bounds {
            let count = self.rng.gen_range(lo..=hi);
            if count > chain_length {
                return Err(BenchError::Generation(format!(
                    "cannot place {count} two-qubit gates in a chain of {chain_length}"
                )));
            }
            for pos in rand::seq::index::sample(&mut self.rng, chain_length, count) {
                two_qubit_slot[pos] = true;
            }
        }

        let mut chain = GateChain::new(Arc::clone(&self.hardware));
        let mut layers = vec![0usize; self.hardware.num_qubits() as usize];
        let mut depth = 0usize;
        for is_two_qubit in two_qubit_slot {
            if self.depth_limit.is_some_and(|limit| depth >= limit) {
                break;
            }
            let action = if is_two_qubit {
                &self.two_qubit_actions[self.rng.gen_range(0..self.two_qubit_actions.len())]
            } else {
                let idx = match &self.weights {
                    Some(w) => w.sample(&mut self.rng),
                    None => self.rng.gen_range(0..self.actions.len()),
                };
                &self.actions[idx]
            };
            let gate = instantiate(&action.spec, &mut self.rng)?;
            let level = action.qubits.iter().map(|q| layers[q.index()]).max().unwrap_or(0) + 1;
            for q in &action.qubits {
                layers[q.index()] = level;
            }
            depth = depth.max(level);
            chain.add_gate(gate, action.qubits.clone())?;
        }
        Ok(chain)
    }
}

impl Iterator for RandomChainTarget {
    type Item = BenchResult<Target>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.quota.take() {
            return None;
        }
        self.next_id += 1;
        let id = self.next_id.to_string();
        Some(self.sample().map(|chain| (Artifact::Chain(chain), id)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.quota.remaining() {
            Some(n) => (n, Some(n)),
            None => (usize::MAX, None),
        }
    }
}

impl TargetGenerator for RandomChainTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.quota.reset();
        self.next_id = 0;
    }
}

fn two_qubit_bounds(config: &RandomChainConfig) -> BenchResult<Option<(usize, usize)>> {
    match (config.two_qubit_gate_num_lower_bound, config.two_qubit_gate_num_upper_bound) {
        (None, None) => Ok(None),
        (Some(_), None) => Err(BenchError::ConflictingConstraints(
            "two_qubit_gate_num_lower_bound requires two_qubit_gate_num_upper_bound".into(),
        )),
        (lo, Some(hi)) => {
            let lo = lo.unwrap_or(0);
            if lo > hi {
                return Err(BenchError::ConflictingConstraints(format!(
                    "two-qubit gate lower bound {lo} exceeds upper bound {hi}"
                )));
            }
            if config.depth_limit.is_some() {
                return Err(BenchError::ConflictingConstraints(
                    "depth_limit cannot be combined with a two-qubit gate bound".into(),
                ));
            }
            Ok(Some((lo, hi)))
        }
    }
}

fn length_range(config: &RandomChainConfig) -> BenchResult<(usize, usize)> {
    match (config.chain_length, config.chain_length_min, config.chain_length_max) {
        (Some(n), None, None) => Ok((n, n)),
        (Some(_), _, _) => Err(BenchError::ConflictingConstraints(
            "chain_length cannot be combined with chain_length_min/chain_length_max".into(),
        )),
        (None, min, Some(max)) => {
            let min = min.unwrap_or(0);
            if min > max {
                return Err(BenchError::Config(format!("chain_length_min {min} exceeds chain_length_max {max}")));
            }
            Ok((min, max))
        }
        (None, _, None) => Err(BenchError::Config("chain_length or chain_length_max is required".into())),
    }
}

/// Every gate-set entry on every ordered qubit tuple the connectivity allows.
///
/// With `split_two_qubit`, two-qubit actions go to the second pool.
fn build_actions(hardware: &Hardware, split_two_qubit: bool) -> (Vec<Action>, Vec<Action>) {
    let n = hardware.num_qubits();
    let conn = hardware.connectivity();
    let mut actions = Vec::new();
    let mut two_qubit = Vec::new();
    for spec in hardware.gate_set().specs() {
        if !spec.kind.is_unitary() {
            continue;
        }
        let Some(arity) = spec.kind.num_qubits() else { continue };
        for tuple in permutations(n, arity as usize) {
            let qubits: Vec<QubitId> = tuple.into_iter().map(QubitId).collect();
            if arity > 1 && !conn.check_connection(&qubits) {
                continue;
            }
            let action = Action { spec: spec.clone(), qubits };
            if split_two_qubit && arity == 2 {
                two_qubit.push(action);
            } else {
                actions.push(action);
            }
        }
    }
    (actions, two_qubit)
}

/// Ordered `k`-tuples of distinct values below `n`, in lexicographic order.
fn permutations(n: u32, k: usize) -> Vec<Vec<u32>> {
    fn extend(n: u32, k: usize, current: &mut Vec<u32>, out: &mut Vec<Vec<u32>>) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        for q in 0..n {
            if !current.contains(&q) {
                current.push(q);
                extend(n, k, current, out);
                current.pop();
            }
        }
    }
    let mut out = Vec::new();
    extend(n, k, &mut Vec::with_capacity(k), &mut out);
    out
}

/// Per-action probabilities from per-entry weights.
///
/// Declared mass above one is rejected; leftover mass is shared evenly by the
/// actions of unlisted entries, and must be zero if every entry is listed.
fn action_weights(
    hardware: &Hardware,
    actions: &[Action],
    declared: &BTreeMap<String, f64>,
) -> BenchResult<WeightedIndex<f64>> {
    let mut per_entry: Vec<(GateSpec, f64)> = Vec::with_capacity(declared.len());
    for (key, &p) in declared {
        let spec = GateSpec::parse(key)?;
        if !hardware.gate_set().specs().iter().any(|s| same_entry(s, &spec)) {
            return Err(BenchError::Config(format!("gate '{key}' is not in the hardware gate set")));
        }
        if !(0.0..=1.0).contains(&p) {
            return Err(BenchError::ProbabilityMass(format!("probability {p} for '{key}' is outside [0, 1]")));
        }
        per_entry.push((spec, p));
    }

    let total: f64 = per_entry.iter().map(|(_, p)| p).sum();
    if total > 1.0 + MASS_TOLERANCE {
        return Err(BenchError::ProbabilityMass(format!("declared probabilities sum to {total} > 1")));
    }

    let declared_for = |action: &Action| {
        per_entry
            .iter()
            .find(|(spec, _)| same_entry(spec, &action.spec))
            .map(|(_, p)| *p)
    };
    let placements = |spec: &GateSpec| actions.iter().filter(|a| same_entry(&a.spec, spec)).count();
    let unlisted = actions.iter().filter(|a| declared_for(a).is_none()).count();
    let remainder = (1.0 - total).max(0.0);
    if remainder > MASS_TOLERANCE && unlisted == 0 {
        return Err(BenchError::ProbabilityMass(format!(
            "declared probabilities sum to {total} but every gate is listed"
        )));
    }

    let probs: Vec<f64> = actions
        .iter()
        .map(|a| match declared_for(a) {
            Some(p) => p / placements(&a.spec) as f64,
            None => remainder / unlisted as f64,
        })
        .collect();
    WeightedIndex::new(&probs).map_err(|e| BenchError::ProbabilityMass(e.to_string()))
}

fn same_entry(a: &GateSpec, b: &GateSpec) -> bool {
    if a.kind != b.kind {
        return false;
    }
    match (&a.params, &b.params) {
        (None, None) => true,
        (Some(x), Some(y)) => x.len() == y.len() && x.iter().zip(y).all(|(p, q)| (p - q).abs() < MASS_TOLERANCE),
        _ => false,
    }
}

/// Concrete gate for an entry, drawing free angles uniformly from `[0, 2π)`.
fn instantiate(spec: &GateSpec, rng: &mut StdRng) -> BenchResult<Gate> {
    let params = match &spec.params {
        Some(fixed) => fixed.clone(),
        None => (0..spec.kind.num_params()).map(|_| rng.gen_range(0.0..TAU)).collect(),
    };
    Ok(Gate::new(spec.kind, params)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qbench_ir::{ConnectivityConfig, GateKind};

    fn hardware(gate_set: &[&str], n: u32) -> HardwareConfig {
        HardwareConfig {
            name: Some("Test".into()),
            preset: None,
            gate_set: Some(gate_set.iter().map(|s| s.to_string()).collect()),
            qubit_connectivity: ConnectivityConfig {
                class: Some("all2all".into()),
                adj_matrix: None,
                num_qubits: Some(n),
            },
        }
    }

    fn config(gate_set: &[&str], n: u32, length: usize) -> RandomChainConfig {
        let mut c = RandomChainConfig::new(hardware(gate_set, n), length);
        c.seed = Some(10);
        c
    }

    #[test]
    fn test_permutations() {
        assert_eq!(permutations(3, 2), vec![vec![0, 1], vec![0, 2], vec![1, 0], vec![1, 2], vec![2, 0], vec![2, 1]]);
        assert_eq!(permutations(2, 1), vec![vec![0], vec![1]]);
    }

    #[test]
    fn test_action_space_respects_connectivity() {
        let mut hw = hardware(&["x", "cx"], 3);
        hw.qubit_connectivity.class = Some("linear".into());
        let generator = RandomChainTarget::new("t", RandomChainConfig::new(hw, 5)).unwrap();
        // 3 single-qubit placements plus 0-1, 1-0, 1-2, 2-1.
        assert_eq!(generator.num_actions(), (7, 0));
    }

    #[test]
    fn test_split_pool_with_bound() {
        let mut c = config(&["x", "cx"], 2, 5);
        c.two_qubit_gate_num_upper_bound = Some(1);
        let generator = RandomChainTarget::new("t", c).unwrap();
        assert_eq!(generator.num_actions(), (2, 2));
    }

    #[test]
    fn test_fixed_length() {
        let mut generator = RandomChainTarget::new("t", config(&["rx(2*pi/30)", "cnot"], 2, 100)).unwrap();
        let chain = generator.sample().unwrap();
        assert_eq!(chain.len(), 100);
        assert!(chain.check_gate_set());
        assert!(chain.check_connectivity());
    }

    #[test]
    fn test_length_range() {
        let mut c = config(&["x"], 1, 0);
        c.chain_length = None;
        c.chain_length_min = Some(3);
        c.chain_length_max = Some(6);
        let mut generator = RandomChainTarget::new("t", c).unwrap();
        for _ in 0..50 {
            let len = generator.sample().unwrap().len();
            assert!((3..=6).contains(&len));
        }
    }

    #[test]
    fn test_free_angles_in_range() {
        let mut generator = RandomChainTarget::new("t", config(&["u3"], 1, 50)).unwrap();
        let chain = generator.sample().unwrap();
        for op in chain.ops() {
            assert_eq!(op.kind(), GateKind::U3);
            assert!(op.gate.params().iter().all(|p| (0.0..TAU).contains(p)));
        }
    }

    #[test]
    fn test_number_limit() {
        let mut c = config(&["x"], 1, 2);
        c.number = Some(2);
        let generator = RandomChainTarget::new("t", c).unwrap();
        assert_eq!(generator.count(), 2);
    }

    #[test]
    fn test_lower_bound_requires_upper() {
        let mut c = config(&["x", "cx"], 2, 5);
        c.two_qubit_gate_num_lower_bound = Some(1);
        assert!(matches!(RandomChainTarget::new("t", c), Err(BenchError::ConflictingConstraints(_))));
    }

    #[test]
    fn test_bounds_inverted() {
        let mut c = config(&["x", "cx"], 2, 5);
        c.two_qubit_gate_num_lower_bound = Some(3);
        c.two_qubit_gate_num_upper_bound = Some(1);
        assert!(matches!(RandomChainTarget::new("t", c), Err(BenchError::ConflictingConstraints(_))));
    }

    #[test]
    fn test_weights_with_bound_conflict() {
        let mut c = config(&["x", "cx"], 2, 5);
        c.two_qubit_gate_num_upper_bound = Some(1);
        c.gate_distribution = GateDistribution::Weights([("x".to_string(), 0.5)].into());
        assert!(matches!(RandomChainTarget::new("t", c), Err(BenchError::ConflictingConstraints(_))));
    }

    #[test]
    fn test_probability_mass_above_one() {
        let mut c = config(&["x", "h", "cx"], 2, 5);
        c.gate_distribution = GateDistribution::Weights([("x".to_string(), 0.7), ("cx".to_string(), 0.6)].into());
        assert!(matches!(RandomChainTarget::new("t", c), Err(BenchError::ProbabilityMass(_))));
    }

    #[test]
    fn test_probability_mass_below_one_all_listed() {
        let mut c = config(&["x", "cx"], 2, 5);
        c.gate_distribution = GateDistribution::Weights([("x".to_string(), 0.2), ("cx".to_string(), 0.3)].into());
        assert!(matches!(RandomChainTarget::new("t", c), Err(BenchError::ProbabilityMass(_))));
    }

    #[test]
    fn test_remainder_goes_to_unlisted() {
        // x gets 0.0 declared, the whole mass falls on h.
        let mut c = config(&["x", "h"], 1, 200);
        c.gate_distribution = GateDistribution::Weights([("x".to_string(), 0.0)].into());
        let mut generator = RandomChainTarget::new("t", c).unwrap();
        let chain = generator.sample().unwrap();
        assert_eq!(chain.count_kind(GateKind::H), 200);
    }

    #[test]
    fn test_unknown_distribution_key() {
        let mut c = config(&["x", "cx"], 2, 5);
        c.gate_distribution = GateDistribution::Weights([("ry".to_string(), 0.5)].into());
        assert!(matches!(RandomChainTarget::new("t", c), Err(BenchError::Config(_))));
    }

    #[test]
    fn test_bound_larger_than_chain() {
        let mut c = config(&["x", "cx"], 2, 1);
        c.two_qubit_gate_num_lower_bound = Some(3);
        c.two_qubit_gate_num_upper_bound = Some(3);
        let mut generator = RandomChainTarget::new("t", c).unwrap();
        assert!(matches!(generator.next(), Some(Err(BenchError::Generation(_)))));
    }
}
