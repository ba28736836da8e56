use decision_core::config::{CONFIDENCE_THRESHOLD, MARGIN_ERROR};
use decision_core::store::{CategoryRegistry, MemoryStore};
use decision_core::{
    ConfidenceMatrix, DecisionEngine, DecisionError, DecisionStage, MatrixError, Parameters,
    ScoredCategory,
};

const SOURCES: [&str; 3] = ["text", "metadata", "image"];

fn make_matrix(rows: &[(&str, [f64; 3])]) -> ConfidenceMatrix {
    let sources = SOURCES.iter().map(|s| (*s).into()).collect();
    let rows = rows
        .iter()
        .map(|(name, scores)| ((*name).into(), scores.to_vec()))
        .collect();
    ConfidenceMatrix::new(sources, rows).unwrap()
}

fn areas(result: &decision_core::DecisionResult) -> Vec<&str> {
    std::iter::once(&result.decision)
        .chain(&result.others)
        .map(|c| c.area.as_str())
        .collect()
}

#[test]
fn single_qualifying_cell_decides_immediately() {
    let store = MemoryStore::seeded();
    let engine = DecisionEngine::with_store(&store);

    // "civil" has the higher mean, but only "penal" has a strong signal
    let matrix = make_matrix(&[
        ("civil", [0.80, 0.85, 0.87]),
        ("penal", [0.95, 0.0, 0.0]),
        ("laboral", [0.1, 0.2, 0.3]),
    ]);

    let report = engine.decide_report(&matrix).unwrap();

    assert_eq!(report.stage, DecisionStage::SingleSignal);
    assert_eq!(report.qualifying_cells, 1);
    assert_eq!(report.result.decision, ScoredCategory::new("penal", 0.95));
    assert!(report.result.others.is_empty());
}

#[test]
fn no_qualifying_cell_averages_whole_matrix() {
    let store = MemoryStore::seeded();
    let engine = DecisionEngine::with_store(&store);

    let matrix = make_matrix(&[
        ("civil", [0.3, 0.3, 0.3]),
        ("penal", [0.6, 0.6, 0.6]),
        ("laboral", [0.5, 0.5, 0.5]),
    ]);

    let report = engine.decide_report(&matrix).unwrap();

    assert_eq!(report.stage, DecisionStage::NoStrongSignal);
    assert_eq!(report.qualifying_cells, 0);
    assert_eq!(report.result.decision.area, "penal");
    assert!((report.result.decision.score - 0.6).abs() < 1e-12);
    assert!(report.result.others.is_empty());
}

#[test]
fn several_qualifying_cells_average_only_their_categories() {
    let store = MemoryStore::seeded();
    let engine = DecisionEngine::with_store(&store);

    // "familia" has the best mean overall but no strong signal, so it must
    // not take part in the averaging
    let matrix = make_matrix(&[
        ("familia", [0.87, 0.87, 0.87]),
        ("civil", [0.90, 0.3, 0.3]),
        ("penal", [0.2, 0.92, 0.2]),
    ]);

    let report = engine.decide_report(&matrix).unwrap();

    assert_eq!(report.stage, DecisionStage::Contested);
    assert_eq!(report.qualifying_cells, 2);
    assert_eq!(report.result.decision.area, "civil");
    assert!((report.result.decision.score - 0.5).abs() < 1e-12);
    assert!(!areas(&report.result).contains(&"familia"));
    // penal's mean of 0.44 falls below 0.5 - 0.05
    assert!(report.result.others.is_empty());
}

#[test]
fn margin_window_reports_runner_ups() {
    let store = MemoryStore::seeded();
    let engine = DecisionEngine::with_store(&store);

    let matrix = ConfidenceMatrix::from_sparse(vec![
        ("A", vec![("text", 0.90)]),
        ("B", vec![("text", 0.87)]),
        ("C", vec![("text", 0.80)]),
    ])
    .unwrap();

    // A alone would pass the default threshold
    store.set_parameter(CONFIDENCE_THRESHOLD, 0.95);

    let result = engine.decide(&matrix).unwrap();

    assert_eq!(result.decision, ScoredCategory::new("A", 0.90));
    assert_eq!(result.others, vec![ScoredCategory::new("B", 0.87)]);
}

#[test]
fn decision_score_is_within_margin_of_best_mean() {
    let store = MemoryStore::seeded();
    store.set_parameter(MARGIN_ERROR, 0.2);
    let engine = DecisionEngine::with_store(&store);

    let matrix = make_matrix(&[
        ("a", [0.5, 0.1, 0.2]),
        ("b", [0.4, 0.4, 0.4]),
        ("c", [0.3, 0.3, 0.3]),
        ("d", [0.0, 0.0, 0.0]),
    ]);

    let result = engine.decide(&matrix).unwrap();
    let best = matrix.rows().iter().map(|r| r.mean()).fold(f64::MIN, f64::max);

    assert!(result.decision.score >= best - 0.2);
    for other in &result.others {
        assert!(other.score <= result.decision.score);
        assert!(other.score >= best - 0.2);
    }
    assert_eq!(areas(&result), vec!["b", "c", "a"]);
}

#[test]
fn ties_are_ordered_by_input_row_not_name() {
    let store = MemoryStore::seeded();
    let engine = DecisionEngine::with_store(&store);

    let matrix = make_matrix(&[
        ("zeta", [0.4, 0.4, 0.4]),
        ("alpha", [0.4, 0.4, 0.4]),
        ("mu", [0.4, 0.4, 0.4]),
    ]);

    let result = engine.decide(&matrix).unwrap();
    assert_eq!(areas(&result), vec!["zeta", "alpha", "mu"]);
}

#[test]
fn usage_counter_increments_by_one() {
    let store = MemoryStore::seeded();
    store.register("penal").unwrap();
    store.set_usage_count("penal", 3).unwrap();

    let engine = DecisionEngine::with_store(&store);
    let matrix = make_matrix(&[("civil", [0.1, 0.1, 0.1]), ("penal", [0.95, 0.2, 0.1])]);

    engine.decide(&matrix).unwrap();

    assert_eq!(store.usage_count("penal").unwrap(), 4);
    assert_eq!(store.usage_count("civil").unwrap(), 0);
}

#[test]
fn new_categories_are_registered_once() {
    let store = MemoryStore::seeded();
    let engine = DecisionEngine::with_store(&store);
    let matrix = make_matrix(&[("civil", [0.1, 0.1, 0.1]), ("penal", [0.2, 0.2, 0.2])]);

    engine.decide(&matrix).unwrap();
    engine.decide(&matrix).unwrap();

    let names: Vec<String> = store.categories().into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["civil".to_string(), "penal".to_string()]);
    assert_eq!(store.usage_count("penal").unwrap(), 2);
}

#[test]
fn registering_twice_is_a_no_op() {
    let store = MemoryStore::new();

    assert!(store.register("civil").unwrap());
    store.set_usage_count("civil", 7).unwrap();
    assert!(!store.register("civil").unwrap());

    assert_eq!(store.list_all().unwrap().len(), 1);
    assert_eq!(store.usage_count("civil").unwrap(), 7);
}

#[test]
fn missing_parameter_is_config_missing_without_side_effects() {
    let store = MemoryStore::seeded();
    store.remove_parameter(MARGIN_ERROR);
    let engine = DecisionEngine::with_store(&store);

    let matrix = make_matrix(&[("civil", [0.1, 0.1, 0.1])]);
    let err = engine.decide(&matrix).unwrap_err();

    match err {
        DecisionError::ConfigMissing(name) => assert_eq!(name, MARGIN_ERROR),
        other => panic!("expected ConfigMissing, got {other:?}"),
    }
    assert!(store.list_all().unwrap().is_empty());
}

#[test]
fn empty_store_has_no_silent_defaults() {
    let store = MemoryStore::new();
    let engine = DecisionEngine::with_store(&store);
    let matrix = make_matrix(&[("civil", [0.95, 0.1, 0.1])]);

    assert!(matches!(
        engine.decide(&matrix),
        Err(DecisionError::ConfigMissing(name)) if name == CONFIDENCE_THRESHOLD
    ));
}

#[test]
fn out_of_domain_parameter_is_rejected() {
    let store = MemoryStore::with_parameters(Parameters {
        confidence_threshold: 1.5,
        margin_error: 0.05,
    });
    let engine = DecisionEngine::with_store(&store);
    let matrix = make_matrix(&[("civil", [0.5, 0.1, 0.1])]);

    assert!(matches!(
        engine.decide(&matrix),
        Err(DecisionError::InvalidParameter { .. })
    ));
}

#[test]
fn invalid_matrix_never_reaches_the_engine() {
    let err = ConfidenceMatrix::from_sparse(Vec::<(&str, Vec<(&str, f64)>)>::new()).unwrap_err();
    assert!(matches!(err, MatrixError::Empty));

    let err = ConfidenceMatrix::from_sparse(vec![("civil", vec![("text", 1.2)])]).unwrap_err();
    assert!(matches!(err, MatrixError::ScoreOutOfRange { .. }));

    let as_decision_error = DecisionError::from(err);
    assert!(matches!(as_decision_error, DecisionError::InvalidInput(_)));
}

#[test]
fn separate_stores_can_serve_each_role() {
    let params = MemoryStore::seeded();
    let registry = MemoryStore::new();
    let engine = DecisionEngine::new(&params, &registry);

    let matrix = make_matrix(&[("civil", [0.9, 0.1, 0.1])]);
    engine.decide(&matrix).unwrap();

    assert_eq!(registry.usage_count("civil").unwrap(), 1);
    assert!(params.list_all().unwrap().is_empty());
}
