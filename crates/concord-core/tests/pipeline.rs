//! End-to-end: requirements and sources through arbitration, validation
//! and reporting

use concord_contract::{HttpMethod, SchemaSpec};
use concord_core::{ConcordConfig, ContractEngine};
use concord_extract::{SlotKey, SourceLanguage};
use concord_metrics::Operation;
use concord_synthesis::{Proposal, SynthesisRule};
use concord_test_utils::{init_tracing, GO_BACKEND, GO_MODELS, PY_SDK, REQUIREMENTS_MD, TS_FRONTEND};
use concord_validate::{Component, MismatchKind, Severity, NOT_FOUND};
use pretty_assertions::assert_eq;
use std::collections::HashMap;

fn engine() -> ContractEngine {
    init_tracing();
    ContractEngine::new(ConcordConfig::new().with_generator("Users", "1.0.0")).unwrap()
}

fn backend_contract(engine: &ContractEngine) -> concord_contract::Contract {
    let analysis = engine.analyze_source("go", "main.go", GO_BACKEND).unwrap();
    let contract = engine.generate_from_routes(&analysis);
    let request = engine
        .infer_schema(SourceLanguage::Go, GO_MODELS, "CreateUserRequest")
        .unwrap();
    let user = engine.infer_schema(SourceLanguage::Go, GO_MODELS, "User").unwrap();
    let schemas: HashMap<String, SchemaSpec> = [
        (SlotKey::request("/users", HttpMethod::Post).to_string(), request),
        (SlotKey::response("/users/{id}", HttpMethod::Get, "200").to_string(), user),
    ]
    .into_iter()
    .collect();
    engine.enhance_contract(&contract, &schemas)
}

#[test]
fn requirements_match_backend_endpoints() {
    let engine = engine();
    let doc = engine.parse_requirements(REQUIREMENTS_MD).unwrap();
    assert_eq!(doc.endpoints.len(), 4);
    let required = engine.generate_from_requirements(&doc);
    let backend = backend_contract(&engine);

    let mismatches = engine.compare_contracts(
        Component::new("requirements", &required),
        Component::new("backend", &backend),
    );
    assert!(mismatches.is_empty(), "{mismatches:#?}");
}

#[test]
fn enhanced_backend_carries_inferred_bodies() {
    let engine = engine();
    let backend = backend_contract(&engine);

    let post = backend.operation("/users", HttpMethod::Post).unwrap();
    let request = post.request_schema().unwrap();
    assert!(request.declares("email"));
    assert!(request.declares("password"));
    assert!(request.required.contains(&"email".to_string()));

    let get = backend.operation("/users/{id}", HttpMethod::Get).unwrap();
    assert!(get.response_schema("200").unwrap().declares("id"));
}

#[test]
fn frontend_drift_is_reported() {
    let engine = engine();
    let backend = backend_contract(&engine);
    let analysis = engine.analyze_source("ts", "web/src/api/users.ts", TS_FRONTEND).unwrap();
    let frontend = engine.generate_from_calls(&analysis);
    assert_eq!(frontend.endpoint_count(), 4);

    let mismatches = engine.validate_frontend_backend(&frontend, &backend);
    let summary: Vec<(Severity, MismatchKind, String)> = mismatches
        .iter()
        .map(|m| (m.severity, m.kind, m.endpoint()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (Severity::Error, MismatchKind::EndpointMismatch, "PUT /users/{id}".to_string()),
            (Severity::Warning, MismatchKind::EndpointMismatch, "DELETE /users/{id}".to_string()),
            (Severity::Warning, MismatchKind::SchemaIncompatibility, "POST /users".to_string()),
        ]
    );
    assert_eq!(mismatches[0].actual, "/users/{id} supports GET, DELETE");

    let report = engine.generate_report(&mismatches, false);
    assert!(report.contains("- Total mismatches: 3"));
    assert!(report.contains("## ERROR (1)"));
    assert!(report.contains("## WARNING (2)"));
}

#[test]
fn sdk_parameter_naming_drift() {
    let engine = engine();
    let backend = backend_contract(&engine);
    let analysis = engine.analyze_source("python", "users_client.py", PY_SDK).unwrap();
    assert_eq!(analysis.calls.len(), 3);
    let sdk = engine.generate_from_calls(&analysis);

    let mismatches = engine.validate_sdk_backend(&sdk, &backend);
    let errors: Vec<String> = mismatches
        .iter()
        .filter(|m| m.severity == Severity::Error)
        .map(|m| m.endpoint())
        .collect();
    assert_eq!(errors, vec!["GET /users/{user_id}".to_string()]);
    assert_eq!(mismatches[0].actual, NOT_FOUND);

    let unused: Vec<String> = mismatches
        .iter()
        .filter(|m| m.kind == MismatchKind::EndpointMismatch && m.severity == Severity::Warning)
        .map(|m| m.endpoint())
        .collect();
    assert_eq!(unused, vec!["GET /users/{id}".to_string(), "DELETE /users/{id}".to_string()]);
}

#[test]
fn backend_expertise_wins_arbitration() {
    let engine = engine();
    let backend = backend_contract(&engine);
    let doc = engine.parse_requirements(REQUIREMENTS_MD).unwrap();
    let required = engine.generate_from_requirements(&doc);

    let result = engine
        .synthesize_contracts(&[
            Proposal::new("backend", backend.clone(), 0.9, "derived from served routes").unwrap(),
            Proposal::new("product", required, 0.5, "from requirements").unwrap(),
        ])
        .unwrap();
    assert_eq!(result.rule(), SynthesisRule::DomainExpertise);
    assert_eq!(result.winning_agent(), Some("backend"));
    assert_eq!(result.solution(), Some(&backend));
}

#[tokio::test]
async fn written_contract_validates_and_metrics_follow() {
    let engine = engine();
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("contracts/users.yaml");
    engine.write_contract(&backend_contract(&engine), &good).await.unwrap();

    assert!(engine.validate_contract_file(&good).await.unwrap().is_empty());
    let reloaded = engine.load_contract(&good).await.unwrap();
    assert_eq!(reloaded.endpoint_count(), 4);

    let bad = dir.path().join("broken.yaml");
    std::fs::write(&bad, "openapi: [unclosed\n").unwrap();
    let mismatches = engine.validate_contract_file(&bad).await.unwrap();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].kind, MismatchKind::InvalidContract);

    let report = engine.generate_report(&mismatches, true);
    let report_path = dir.path().join("report.md");
    engine.write_report(&report, &report_path).await.unwrap();
    assert!(std::fs::read_to_string(&report_path).unwrap().contains("## ERROR (1)"));

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.operations[&Operation::ValidateFile].total, 2);
    assert_eq!(snapshot.operations[&Operation::ValidateFile].failed(), 0);
    assert_eq!(snapshot.schema_parses.total, 3);
    assert_eq!(snapshot.schema_parses.failed(), 1);
    assert!(engine.health().healthy);

    let slo = engine.slo_report();
    assert!(!slo.check("schema_parse_success").unwrap().met);
    assert!(slo.check("availability").unwrap().met);

    let text = engine.prometheus_text().unwrap();
    assert!(text.contains(r#"concord_operations_total{operation="validate_file",outcome="ok"} 2"#));
}

#[tokio::test]
async fn oversized_contract_fails_closed() {
    init_tracing();
    let engine = ContractEngine::new(ConcordConfig::new().with_max_contract_bytes(16)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.yaml");
    std::fs::write(&path, "openapi: 3.0.3\npaths: {}\n").unwrap();

    let err = engine.validate_contract_file(&path).await.unwrap_err();
    assert!(err.is_defense_triggered());
    assert_eq!(engine.snapshot().operations[&Operation::ValidateFile].failed(), 1);
    assert!(!engine.health().healthy);
}

#[test]
fn missing_model_is_skippable() {
    let engine = engine();
    let err = engine
        .infer_schema(SourceLanguage::Go, GO_MODELS, "Invoice")
        .unwrap_err();
    assert!(err.is_not_found());
}
