//! End-to-end benchmark runs writing into a temporary directory.

use qbench_core::engine::{CONFIG_FILE, ID_COLUMNS, QASM_DIR, REPORT_FILE};
use qbench_core::{BenchError, BenchmarkConfig, BenchmarkEngine, EngineObserver, EngineOptions, NoopObserver};

const CONFIG: &str = r#"
pipelines:
  - id: ibm_line
    plot_group: routing
    target:
      task: circuit_transformation
      algo: random_chain
      name: rand3
      number: 2
      seed: 10
      chain_length: 15
      hardware:
        preset: ionq
        qubit_connectivity: { class: all2all, num_qubits: 3 }
    stages:
      - id: target
        strategy: target_analysis
        args:
          hardware: &line
            preset: ibm
            qubit_connectivity: { class: linear, num_qubits: 3 }
      - id: route
        strategy: greedy_routing
        args: { hardware: *line, decompose_swaps: true }
      - id: rebase
        strategy: gate_set_rebase
        args: { hardware: *line, analyser_options: { compute_fidelity: true } }
      - id: compress
        strategy: cancel_redundancies
        args: { hardware: *line }
"#;

#[derive(Default)]
struct Recorder {
    started: Vec<String>,
    done: Vec<(String, bool)>,
}

impl EngineObserver for Recorder {
    fn on_pipeline_start(&mut self, pipeline: &str, _index: usize, _total: usize) {
        self.started.push(pipeline.to_string());
    }

    fn on_target_done(&mut self, _pipeline: &str, target_id: &str, ok: bool) {
        self.done.push((target_id.to_string(), ok));
    }
}

fn options(dir: &std::path::Path) -> EngineOptions {
    EngineOptions { output_dir: dir.to_path_buf(), run_id: Some("run".into()), ..Default::default() }
}

#[test]
fn test_engine_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = BenchmarkConfig::from_yaml(CONFIG).unwrap();
    let engine = BenchmarkEngine::new(config, options(dir.path()));
    let mut recorder = Recorder::default();
    let summary = engine.run(&mut recorder).unwrap();

    assert_eq!(summary.rows, 8);
    assert_eq!(summary.failed_runs, 0);
    assert_eq!(recorder.started, vec!["ibm_line"]);
    assert_eq!(recorder.done, vec![("1".to_string(), true), ("2".to_string(), true)]);

    let csv = std::fs::read_to_string(dir.path().join(REPORT_FILE)).unwrap();
    let mut lines = csv.lines();
    let header: Vec<&str> = lines.next().unwrap().split(',').collect();
    assert_eq!(&header[..ID_COLUMNS.len()], ID_COLUMNS);
    assert!(header.contains(&"Full Check"));
    assert!(header.contains(&"Fidelity"));
    assert_eq!(lines.count(), 8);

    let hw_col = header.iter().position(|c| *c == "Pipeline Output Hardware Name").unwrap();
    let width_col = header.iter().position(|c| *c == "Pipeline Output Number of Qubits").unwrap();
    for row in csv.lines().skip(1) {
        let cells: Vec<&str> = row.split(',').collect();
        assert_eq!(cells[hw_col], "Ibm3Q");
        assert_eq!(cells[width_col], "3");
    }

    let qasm = dir.path().join(QASM_DIR).join("run_output_ibm_line_rand3_1_compress.qasm");
    let text = std::fs::read_to_string(qasm).unwrap();
    assert!(text.starts_with("OPENQASM 2.0;"));
    assert!(dir.path().join(CONFIG_FILE).exists());
}

#[test]
fn test_engine_recreates_qasm_dir() {
    let dir = tempfile::tempdir().unwrap();
    let stale = dir.path().join(QASM_DIR).join("stale.qasm");
    std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
    std::fs::write(&stale, "junk").unwrap();
    let engine = BenchmarkEngine::new(BenchmarkConfig::from_yaml(CONFIG).unwrap(), options(dir.path()));
    engine.run(&mut NoopObserver).unwrap();
    assert!(!stale.exists());
}

#[test]
fn test_engine_skips_failed_runs() {
    // Four qubits of target on three-qubit hardware: routing refuses every chain.
    let wide = CONFIG.replace("qubit_connectivity: { class: all2all, num_qubits: 3 }", "qubit_connectivity: { class: all2all, num_qubits: 4 }");
    let dir = tempfile::tempdir().unwrap();
    let engine = BenchmarkEngine::new(BenchmarkConfig::from_yaml(&wide).unwrap(), options(dir.path()));
    let mut recorder = Recorder::default();
    let summary = engine.run(&mut recorder).unwrap();
    assert_eq!(summary.failed_runs, 2);
    assert_eq!(summary.rows, 0);
    assert!(recorder.done.iter().all(|(_, ok)| !ok));
}

#[test]
fn test_engine_unknown_strategy_is_fatal() {
    let bad = CONFIG.replace("strategy: gate_set_rebase", "strategy: zx_reduce");
    let dir = tempfile::tempdir().unwrap();
    let engine = BenchmarkEngine::new(BenchmarkConfig::from_yaml(&bad).unwrap(), options(dir.path()));
    let err = engine.run(&mut NoopObserver).unwrap_err();
    assert!(matches!(err, BenchError::UnknownStrategy { .. }));
}

const SHARED_TARGET: &str = r#"
pipelines:
  - id: plain
    target: &rand
      task: circuit_transformation
      algo: random_chain
      name: rand
      number: 1
      seed: 3
      chain_length: 6
      hardware:
        preset: ibm
        qubit_connectivity: { class: all2all, num_qubits: 2 }
    stages:
      - id: s
        strategy: target_analysis
        args:
          hardware: &ibm
            preset: ibm
            qubit_connectivity: { class: all2all, num_qubits: 2 }
  - id: measured
    target: *rand
    stages:
      - id: s
        strategy: pre_processing
        args:
          hardware:
            preset: ionq
            qubit_connectivity: { class: all2all, num_qubits: 2 }
          add_measure: true
"#;

fn column(header: &[&str], name: &str) -> usize {
    header.iter().position(|c| *c == name).unwrap()
}

#[test]
fn test_pipelines_sharing_target_and_stage_ids_keep_separate_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let engine = BenchmarkEngine::new(BenchmarkConfig::from_yaml(SHARED_TARGET).unwrap(), options(dir.path()));
    let summary = engine.run(&mut NoopObserver).unwrap();
    assert_eq!(summary.rows, 2);

    let csv = std::fs::read_to_string(dir.path().join(REPORT_FILE)).unwrap();
    let mut lines = csv.lines();
    let header: Vec<&str> = lines.next().unwrap().split(',').collect();
    let rows: Vec<Vec<&str>> = lines.map(|l| l.split(',').collect()).collect();
    let (path_col, hw_col) = (column(&header, "QASM Path"), column(&header, "Pipeline Output Hardware Name"));

    let plain = rows.iter().find(|r| r[1] == "plain").unwrap();
    let measured = rows.iter().find(|r| r[1] == "measured").unwrap();
    assert_ne!(plain[path_col], measured[path_col]);
    assert!(!std::fs::read_to_string(plain[path_col]).unwrap().contains("measure"));
    assert!(std::fs::read_to_string(measured[path_col]).unwrap().contains("measure"));
    assert_eq!(plain[hw_col], "Ibm2Q");
    assert_eq!(measured[hw_col], "Ionq2Q");
}

#[test]
fn test_unbounded_generator_requires_cap() {
    let unbounded = CONFIG.replace("      number: 2\n", "");
    let dir = tempfile::tempdir().unwrap();
    let engine = BenchmarkEngine::new(BenchmarkConfig::from_yaml(&unbounded).unwrap(), options(dir.path()));
    assert!(matches!(engine.run(&mut NoopObserver), Err(BenchError::Config(_))));

    let capped = EngineOptions { max_targets: Some(3), ..options(dir.path()) };
    let engine = BenchmarkEngine::new(BenchmarkConfig::from_yaml(&unbounded).unwrap(), capped);
    assert_eq!(engine.run(&mut NoopObserver).unwrap().rows, 12);
}
