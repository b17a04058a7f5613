//! Hardware descriptions: native gate set plus qubit connectivity.
//!
//! A [`Hardware`] is what every gate chain is bound to. Strategies produce
//! chains bound to their own hardware; checks such as
//! [`GateChain::check_connectivity`](crate::GateChain::check_connectivity)
//! are always evaluated against the chain's current hardware.

use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::error::{IrError, IrResult};
use crate::gate::{Gate, GateKind};
use crate::qasm::eval_angle;
use crate::qubit::QubitId;

/// Tolerance used when matching fixed-angle gate set entries.
const ANGLE_TOLERANCE: f64 = 1e-9;

/// One entry of a native gate set.
///
/// `params == None` admits the kind with any angles; `Some(angles)` admits
/// only that exact rotation, e.g. `rx(2*pi/30)`.
#[derive(Debug, Clone, PartialEq)]
pub struct GateSpec {
    /// Gate family.
    pub kind: GateKind,
    /// Fixed angles, if the entry pins them.
    pub params: Option<Vec<f64>>,
}

impl GateSpec {
    /// Entry admitting any angles for `kind`.
    pub fn any(kind: GateKind) -> Self {
        Self { kind, params: None }
    }

    /// Entry admitting exactly `gate`.
    pub fn fixed(gate: &Gate) -> Self {
        Self { kind: gate.kind(), params: Some(gate.params().to_vec()) }
    }

    /// Parse `"cx"`, `"rz"` or `"rx(2*pi/30)"`.
    pub fn parse(text: &str) -> IrResult<Self> {
        let text = text.trim();
        let (name, args) = match text.find('(') {
            Some(open) => {
                let close = text
                    .rfind(')')
                    .filter(|&c| c > open)
                    .ok_or_else(|| IrError::InvalidAngle(text.to_string()))?;
                (&text[..open], Some(&text[open + 1..close]))
            }
            None => (text, None),
        };
        let kind = GateKind::from_name(name).ok_or_else(|| IrError::UnknownGate(name.to_string()))?;
        let params = match args {
            None => None,
            Some(args) => {
                let values = args.split(',').map(eval_angle).collect::<IrResult<Vec<_>>>()?;
                // Validates the arity.
                Gate::new(kind, values.clone())?;
                Some(values)
            }
        };
        Ok(Self { kind, params })
    }

    /// Whether this entry admits `gate`.
    pub fn matches(&self, gate: &Gate) -> bool {
        if gate.kind() != self.kind {
            return false;
        }
        match &self.params {
            None => true,
            Some(fixed) => fixed
                .iter()
                .zip(gate.params())
                .all(|(a, b)| (a - b).abs() < ANGLE_TOLERANCE),
        }
    }

    /// Whether angles are free for this entry.
    pub fn is_parameterized(&self) -> bool {
        self.params.is_none() && self.kind.num_params() > 0
    }

    /// Concrete gate for a fixed entry, or for a kind without angles.
    pub fn to_gate(&self) -> Option<Gate> {
        match &self.params {
            Some(p) => Gate::new(self.kind, p.clone()).ok(),
            None if self.kind.num_params() == 0 => Some(Gate::from(self.kind)),
            None => None,
        }
    }
}

impl fmt::Display for GateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.label())?;
        if let Some(p) = &self.params {
            let angles: Vec<String> = p.iter().map(|a| format!("{a:.6}")).collect();
            write!(f, "({})", angles.join(","))?;
        }
        Ok(())
    }
}

/// The set of gates a device executes natively.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GateSet {
    specs: Vec<GateSpec>,
}

impl GateSet {
    /// Build from entries; duplicates are dropped.
    pub fn new(specs: impl IntoIterator<Item = GateSpec>) -> Self {
        let mut out: Vec<GateSpec> = Vec::new();
        for spec in specs {
            if !out.contains(&spec) {
                out.push(spec);
            }
        }
        Self { specs: out }
    }

    /// Parse a list of textual entries.
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> IrResult<Self> {
        let specs = entries
            .iter()
            .map(|e| GateSpec::parse(e.as_ref()))
            .collect::<IrResult<Vec<_>>>()?;
        Ok(Self::new(specs))
    }

    /// Build from kinds with free angles.
    pub fn from_kinds(kinds: impl IntoIterator<Item = GateKind>) -> Self {
        Self::new(kinds.into_iter().map(GateSpec::any))
    }

    /// IBM-style basis: `u3`, `cx`.
    pub fn ibm() -> Self {
        Self::from_kinds([GateKind::U3, GateKind::CX])
    }

    /// Rigetti-style basis: `rx`, `rz`, `cz`.
    pub fn rigetti() -> Self {
        Self::from_kinds([GateKind::Rx, GateKind::Rz, GateKind::CZ])
    }

    /// Trapped-ion style basis: `rx`, `ry`, `rz`, `cx`.
    pub fn ionq() -> Self {
        Self::from_kinds([GateKind::Rx, GateKind::Ry, GateKind::Rz, GateKind::CX])
    }

    /// `cx`, `rz`, `rx`.
    pub fn cx_rz_rx() -> Self {
        Self::from_kinds([GateKind::CX, GateKind::Rz, GateKind::Rx])
    }

    /// Every unitary kind known to the IR.
    pub fn universal() -> Self {
        Self::from_kinds(GateKind::ALL.into_iter().filter(|k| k.is_unitary()))
    }

    /// Look up a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ibm" => Some(Self::ibm()),
            "rigetti" => Some(Self::rigetti()),
            "ionq" => Some(Self::ionq()),
            "cx_rz_rx" => Some(Self::cx_rz_rx()),
            "universal" => Some(Self::universal()),
            _ => None,
        }
    }

    /// Whether some entry admits `gate`.
    pub fn contains(&self, gate: &Gate) -> bool {
        self.specs.iter().any(|s| s.matches(gate))
    }

    /// Whether the kind appears at all, fixed or free.
    pub fn contains_kind(&self, kind: GateKind) -> bool {
        self.specs.iter().any(|s| s.kind == kind)
    }

    /// Whether the kind appears with free angles (or has none).
    pub fn contains_free(&self, kind: GateKind) -> bool {
        self.specs.iter().any(|s| s.kind == kind && s.params.is_none())
    }

    /// Entries in insertion order.
    pub fn specs(&self) -> &[GateSpec] {
        &self.specs
    }

    /// Distinct kinds in insertion order.
    pub fn kinds(&self) -> Vec<GateKind> {
        let mut kinds = Vec::new();
        for s in &self.specs {
            if !kinds.contains(&s.kind) {
                kinds.push(s.kind);
            }
        }
        kinds
    }

    /// Largest arity among the entries (at least 1).
    pub fn max_arity(&self) -> u32 {
        self.specs
            .iter()
            .filter_map(|s| s.kind.num_qubits())
            .max()
            .unwrap_or(1)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl fmt::Display for GateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self.specs.iter().map(ToString::to_string).collect();
        f.write_str(&labels.join(", "))
    }
}

/// Directed qubit connectivity graph.
///
/// Symmetric constructions insert both directions. Routing treats the graph
/// as undirected; [`Connectivity::check_connection`] respects direction.
#[derive(Debug, Clone)]
pub struct Connectivity {
    num_qubits: u32,
    graph: DiGraphMap<u32, ()>,
    /// `dist[a][b]`: undirected hop count, `u32::MAX` if unreachable.
    dist: Vec<Vec<u32>>,
    /// `pred[a][b]`: predecessor of `b` on a shortest path from `a`.
    pred: Vec<Vec<u32>>,
    all_to_all: bool,
}

impl Connectivity {
    fn with_edges(num_qubits: u32, edges: impl IntoIterator<Item = (u32, u32)>, all_to_all: bool) -> Self {
        let mut graph = DiGraphMap::new();
        for q in 0..num_qubits {
            graph.add_node(q);
        }
        for (a, b) in edges {
            graph.add_edge(a, b, ());
        }
        let mut conn = Self { num_qubits, graph, dist: Vec::new(), pred: Vec::new(), all_to_all };
        conn.precompute_paths();
        conn
    }

    /// Every ordered pair of distinct qubits is connected.
    pub fn all_to_all(n: u32) -> Self {
        let edges = (0..n).flat_map(|a| (0..n).filter(move |&b| b != a).map(move |b| (a, b)));
        Self::with_edges(n, edges, true)
    }

    /// Nearest-neighbour chain `0-1-2-...`.
    pub fn linear(n: u32) -> Self {
        let edges = (0..n.saturating_sub(1)).flat_map(|i| [(i, i + 1), (i + 1, i)]);
        Self::with_edges(n, edges, false)
    }

    /// Qubit 0 connected to every other qubit.
    pub fn star(n: u32) -> Self {
        let edges = (1..n).flat_map(|i| [(0, i), (i, 0)]);
        Self::with_edges(n, edges, false)
    }

    /// From a square adjacency matrix; any non-zero off-diagonal entry `m[a][b]`
    /// is a directed edge `a -> b`.
    pub fn from_adjacency(matrix: &[Vec<f64>]) -> IrResult<Self> {
        let n = matrix.len();
        if let Some(row) = matrix.iter().find(|row| row.len() != n) {
            return Err(IrError::InvalidConnectivity(format!(
                "adjacency matrix must be square: {n} rows but a row of length {}",
                row.len()
            )));
        }
        let edges: Vec<(u32, u32)> = matrix
            .iter()
            .enumerate()
            .flat_map(|(a, row)| {
                row.iter()
                    .enumerate()
                    .filter(move |&(b, v)| b != a && *v != 0.0)
                    .map(move |(b, _)| (a as u32, b as u32))
            })
            .collect();
        let full = edges.len() == n * n.saturating_sub(1);
        Ok(Self::with_edges(n as u32, edges, full))
    }

    fn precompute_paths(&mut self) {
        let n = self.num_qubits as usize;
        self.dist = vec![vec![u32::MAX; n]; n];
        self.pred = vec![vec![u32::MAX; n]; n];
        for src in 0..n {
            self.dist[src][src] = 0;
            let mut queue = VecDeque::from([src as u32]);
            while let Some(cur) = queue.pop_front() {
                for nb in self.neighbors(cur) {
                    let nbu = nb as usize;
                    if self.dist[src][nbu] == u32::MAX {
                        self.dist[src][nbu] = self.dist[src][cur as usize] + 1;
                        self.pred[src][nbu] = cur;
                        queue.push_back(nb);
                    }
                }
            }
        }
    }

    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Whether the graph contains every ordered pair.
    pub fn is_all_to_all(&self) -> bool {
        self.all_to_all
    }

    /// Directed edge `a -> b` exists.
    #[inline]
    pub fn is_connected(&self, a: u32, b: u32) -> bool {
        self.graph.contains_edge(a, b)
    }

    /// Whether a multi-qubit operation on `qubits` is executable: every
    /// ordered pair `(qubits[i], qubits[j])` with `i < j` must be an edge.
    pub fn check_connection(&self, qubits: &[QubitId]) -> bool {
        if qubits.iter().any(|q| q.0 >= self.num_qubits) {
            return false;
        }
        qubits.iter().enumerate().all(|(i, a)| {
            qubits[i + 1..].iter().all(|b| self.is_connected(a.0, b.0))
        })
    }

    /// Undirected neighbours of `q`, ascending.
    pub fn neighbors(&self, q: u32) -> Vec<u32> {
        if !self.graph.contains_node(q) {
            return Vec::new();
        }
        let mut out: Vec<u32> = self
            .graph
            .neighbors_directed(q, Direction::Outgoing)
            .chain(self.graph.neighbors_directed(q, Direction::Incoming))
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Directed edges.
    pub fn edges(&self) -> Vec<(u32, u32)> {
        self.graph.all_edges().map(|(a, b, _)| (a, b)).collect()
    }

    /// Undirected hop count.
    pub fn distance(&self, a: u32, b: u32) -> Option<u32> {
        let d = *self.dist.get(a as usize)?.get(b as usize)?;
        (d != u32::MAX).then_some(d)
    }

    /// Undirected shortest path `a ..= b`.
    pub fn shortest_path(&self, a: u32, b: u32) -> Option<Vec<u32>> {
        self.distance(a, b)?;
        let mut path = vec![b];
        let mut cur = b;
        while cur != a {
            cur = self.pred[a as usize][cur as usize];
            path.push(cur);
        }
        path.reverse();
        Some(path)
    }

    /// Whether every qubit can reach every other qubit.
    pub fn is_connected_graph(&self) -> bool {
        petgraph::algo::connected_components(&self.graph) <= 1
    }
}

/// A target device: name, native gates, connectivity.
#[derive(Debug, Clone)]
pub struct Hardware {
    name: String,
    gate_set: GateSet,
    connectivity: Connectivity,
}

impl Hardware {
    pub fn new(name: impl Into<String>, gate_set: GateSet, connectivity: Connectivity) -> Self {
        Self { name: name.into(), gate_set, connectivity }
    }

    /// All-to-all hardware accepting every gate, used for freshly parsed circuits.
    pub fn unconstrained(num_qubits: u32) -> Self {
        Self::new("Unconstrained", GateSet::universal(), Connectivity::all_to_all(num_qubits))
    }

    /// Build from a configuration block.
    pub fn from_config(config: &HardwareConfig) -> IrResult<Self> {
        config.build()
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.connectivity.num_qubits()
    }

    #[inline]
    pub fn gate_set(&self) -> &GateSet {
        &self.gate_set
    }

    #[inline]
    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    /// Compact label, e.g. `Ibm5Q`.
    pub fn label(&self) -> String {
        format!("{}{}Q", self.name, self.num_qubits())
    }
}

/// Connectivity section of a hardware configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConnectivityConfig {
    /// `all2all`, `linear` or `star`. Ignored when `adj_matrix` is given.
    #[serde(default)]
    pub class: Option<String>,
    /// Explicit adjacency matrix.
    #[serde(default)]
    pub adj_matrix: Option<Vec<Vec<f64>>>,
    /// Width for class-based connectivity.
    #[serde(default)]
    pub num_qubits: Option<u32>,
}

impl ConnectivityConfig {
    fn build(&self) -> IrResult<Connectivity> {
        if let Some(matrix) = &self.adj_matrix {
            return Connectivity::from_adjacency(matrix);
        }
        let n = self
            .num_qubits
            .ok_or_else(|| IrError::InvalidConnectivity("num_qubits is required".into()))?;
        match self.class.as_deref().unwrap_or("all2all").to_ascii_lowercase().as_str() {
            "all2all" | "full" | "all_to_all" => Ok(Connectivity::all_to_all(n)),
            "linear" | "line" => Ok(Connectivity::linear(n)),
            "star" => Ok(Connectivity::star(n)),
            other => Err(IrError::InvalidConnectivity(format!("unknown connectivity class '{other}'"))),
        }
    }
}

/// Serializable hardware description.
///
/// Either names a gate-set `preset` or lists `gate_set` entries explicitly;
/// an explicit list wins when both are present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HardwareConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub gate_set: Option<Vec<String>>,
    pub qubit_connectivity: ConnectivityConfig,
}

impl HardwareConfig {
    /// Preset gate set with all-to-all connectivity.
    pub fn preset(preset: &str, num_qubits: u32) -> Self {
        Self {
            name: None,
            preset: Some(preset.to_string()),
            gate_set: None,
            qubit_connectivity: ConnectivityConfig {
                class: Some("all2all".into()),
                adj_matrix: None,
                num_qubits: Some(num_qubits),
            },
        }
    }

    fn build(&self) -> IrResult<Hardware> {
        let gate_set = match (&self.gate_set, &self.preset) {
            (Some(entries), _) => GateSet::parse(entries)?,
            (None, Some(p)) => GateSet::preset(p)
                .ok_or_else(|| IrError::InvalidHardware(format!("unknown gate set preset '{p}'")))?,
            (None, None) => {
                return Err(IrError::InvalidHardware("either `gate_set` or `preset` is required".into()));
            }
        };
        if gate_set.is_empty() {
            return Err(IrError::InvalidHardware("gate set is empty".into()));
        }
        let connectivity = self.qubit_connectivity.build()?;
        let name = match (&self.name, &self.preset) {
            (Some(n), _) => n.clone(),
            (None, Some(p)) => capitalize(p),
            (None, None) => "Custom".to_string(),
        };
        Ok(Hardware::new(name, gate_set, connectivity))
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
