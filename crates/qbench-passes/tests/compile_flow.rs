//! Routing, rebase and cancellation applied in sequence to QASM circuits.

use std::sync::Arc;

use qbench_ir::{Connectivity, GateKind, GateSet, Hardware, qasm, sim};
use qbench_passes::{CancelRedundancies, GateSetRebase, GreedyRouting, Pass, PostProcessing};

const GHZ: &str = r#"
OPENQASM 2.0;
include "qelib1.inc";
qreg q[4];
creg c[4];
h q[0];
cx q[0],q[1];
cx q[0],q[2];
cx q[0],q[3];
barrier q;
measure q -> c;
"#;

fn device(gate_set: GateSet, conn: Connectivity) -> Arc<Hardware> {
    Arc::new(Hardware::new("Device", gate_set, conn))
}

#[test]
fn test_ghz_on_linear_ibm() {
    let chain = qasm::parse(GHZ, None).unwrap();
    let hw = device(GateSet::ibm(), Connectivity::linear(4));

    let routed = GreedyRouting::new(true).run(&chain, &hw).unwrap();
    let native = GateSetRebase.run(&routed, &hw).unwrap();
    let compact = CancelRedundancies::default().run(&native, &hw).unwrap();

    assert!(compact.check_connectivity());
    assert!(compact.check_gate_set());
    assert!(compact.check_qubit_number());
    assert_eq!(compact.count_kind(GateKind::Measure), 4);
    assert!(compact.num_gates() <= native.num_gates());
}

#[test]
fn test_rebase_then_cancel_keeps_unitary_on_full_device() {
    let chain = qasm::parse(GHZ, None).unwrap();
    let hw = device(GateSet::rigetti(), Connectivity::all_to_all(4));

    let native = GateSetRebase.run(&chain, &hw).unwrap();
    let compact = CancelRedundancies::default().run(&native, &hw).unwrap();
    let strip = PostProcessing { remove_measure: true, remove_barrier: true };

    let before = strip.run(&chain, &hw).unwrap();
    let after = strip.run(&compact, &hw).unwrap();
    assert!(sim::equivalent(&before, &after, 8).unwrap());
    assert_eq!(compact.count_kind(GateKind::CZ), 3);
}

#[test]
fn test_qasm_round_trip_of_compiled_chain() {
    let chain = qasm::parse(GHZ, None).unwrap();
    let hw = device(GateSet::ibm(), Connectivity::star(4));
    let compiled = GateSetRebase.run(&GreedyRouting::default().run(&chain, &hw).unwrap(), &hw).unwrap();
    let reparsed = qasm::parse(&qasm::emit(&compiled), Some(Arc::clone(&hw))).unwrap();
    assert_eq!(reparsed.len(), compiled.len());
    assert!(reparsed.check_gate_set());
}
