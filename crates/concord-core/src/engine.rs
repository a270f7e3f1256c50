//! Instrumented contract engine
//!
//! [`ContractEngine`] owns one configured instance of every component and
//! wraps each operation in an `info_span!` plus a metrics record. The
//! components themselves stay stateless; the only shared mutable state is
//! the [`MetricsCollector`].

use crate::config::ConcordConfig;
use crate::error::{ConcordError, Result};
use concord_contract::{Contract, Sanitizer, SchemaSpec};
use concord_extract::{
    Analysis, ContractGenerator, RequirementsDocument, RequirementsParser, SchemaInferrer,
    SourceAnalyzer, SourceLanguage,
};
use concord_metrics::{
    render_prometheus, HealthStatus, MetricsCollector, MetricsSnapshot, Operation, SloReport,
    SloTargets,
};
use concord_synthesis::{
    ContractCompletenessScorer, ContractUnionMerger, Proposal, ProposalSynthesizer,
    SynthesisResult,
};
use concord_validate::{
    Component, ContractLoader, ContractMismatch, ContractValidator, LoadError, ReportGenerator,
};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Configured components plus shared metrics
pub struct ContractEngine {
    config: ConcordConfig,
    analyzer: SourceAnalyzer,
    inferrer: SchemaInferrer,
    requirements: RequirementsParser,
    generator: ContractGenerator,
    synthesizer: ProposalSynthesizer<Contract>,
    validator: ContractValidator,
    reporter: ReportGenerator,
    loader: ContractLoader,
    metrics: Arc<MetricsCollector>,
    slo: SloTargets,
}

impl fmt::Debug for ContractEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractEngine")
            .field("config", &self.config)
            .field("synthesizer", &self.synthesizer)
            .finish_non_exhaustive()
    }
}

impl ContractEngine {
    /// Build every component from `config`
    ///
    /// # Errors
    /// [`ConcordError::Config`] for out-of-range values,
    /// [`ConcordError::Extract`] if a built-in pattern fails its self-test.
    pub fn new(config: ConcordConfig) -> Result<Self> {
        config.validate()?;
        let sanitizer = Sanitizer::new(config.sanitize.clone());
        let analyzer = SourceAnalyzer::new(config.extract.clone(), sanitizer.clone())?;
        let inferrer = SchemaInferrer::new(config.extract.clone(), sanitizer.clone())?;
        let requirements = RequirementsParser::new(config.extract.clone(), sanitizer.clone())?;
        let generator = ContractGenerator::new(&config.generator.title, &config.generator.version);
        let synthesizer = ProposalSynthesizer::new(config.synthesis.clone())
            .with_scorer(ContractCompletenessScorer)
            .with_merger(ContractUnionMerger);
        let reporter = ReportGenerator::new(config.redaction.clone());
        let loader = ContractLoader::new(config.loader.clone(), sanitizer);
        let metrics = Arc::new(MetricsCollector::new(config.metrics.clone()));

        tracing::info!(
            max_proposals = config.synthesis.max_proposals,
            max_contract_bytes = config.loader.max_bytes,
            "contract engine ready"
        );
        Ok(Self {
            config,
            analyzer,
            inferrer,
            requirements,
            generator,
            synthesizer,
            validator: ContractValidator::new(),
            reporter,
            loader,
            metrics,
            slo: SloTargets::default(),
        })
    }

    /// Share an existing collector, e.g. across engines
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Replace the SLO targets used by [`Self::slo_report`]
    #[must_use]
    pub fn with_slo_targets(mut self, slo: SloTargets) -> Self {
        self.slo = slo;
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ConcordConfig {
        &self.config
    }

    /// Shared collector
    #[inline]
    #[must_use]
    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    fn finish(&self, operation: Operation, component: &str, started: Instant, ok: bool) {
        let elapsed = started.elapsed();
        self.metrics.record_operation(operation, elapsed, ok);
        tracing::info!(%operation, component, ?elapsed, ok, "operation finished");
    }

    fn observe<T>(&self, operation: Operation, component: &str, work: impl FnOnce() -> T) -> T {
        let span = tracing::info_span!("concord", %operation, component);
        let _entered = span.enter();
        let started = Instant::now();
        let out = work();
        self.finish(operation, component, started, true);
        out
    }

    fn try_observe<T, E>(
        &self,
        operation: Operation,
        component: &str,
        work: impl FnOnce() -> std::result::Result<T, E>,
    ) -> Result<T>
    where
        E: Into<ConcordError>,
    {
        let span = tracing::info_span!("concord", %operation, component);
        let _entered = span.enter();
        let started = Instant::now();
        let result = work().map_err(Into::into);
        if let Err(err) = &result {
            tracing::warn!(error = %err, "operation failed");
        }
        self.finish(operation, component, started, result.is_ok());
        result
    }

    async fn try_observe_async<T, E>(
        &self,
        operation: Operation,
        component: &str,
        work: impl Future<Output = std::result::Result<T, E>>,
    ) -> Result<T>
    where
        E: Into<ConcordError>,
    {
        let span = tracing::info_span!("concord", %operation, component);
        let started = Instant::now();
        let result = work.instrument(span.clone()).await.map_err(Into::into);
        let _entered = span.enter();
        if let Err(err) = &result {
            tracing::warn!(error = %err, "operation failed");
        }
        self.finish(operation, component, started, result.is_ok());
        result
    }

    /// Extract routes, calls and client methods from tagged source
    ///
    /// # Errors
    /// Unsupported language tag or oversized source.
    pub fn analyze_source(&self, tag: &str, file: &str, source: &str) -> Result<Analysis> {
        self.try_observe(Operation::Analyze, file, || {
            self.analyzer.analyze_tagged(tag, file, source)
        })
    }

    /// Read and analyze one source file
    ///
    /// # Errors
    /// Unreadable or oversized file.
    pub async fn analyze_file(
        &self,
        language: SourceLanguage,
        path: impl AsRef<Path>,
    ) -> Result<Analysis> {
        let path = path.as_ref();
        let component = path.display().to_string();
        self.try_observe_async(
            Operation::Analyze,
            &component,
            self.analyzer.analyze_file(language, path),
        )
        .await
    }

    /// Infer the schema of a named model type
    ///
    /// # Errors
    /// See [`SchemaInferrer::infer`]; absent types satisfy
    /// [`ConcordError::is_not_found`].
    pub fn infer_schema(
        &self,
        language: SourceLanguage,
        source: &str,
        type_name: &str,
    ) -> Result<SchemaSpec> {
        self.try_observe(Operation::InferSchema, type_name, || {
            self.inferrer.infer(language, source, type_name)
        })
    }

    /// Parse markdown requirements
    ///
    /// # Errors
    /// Invalid method or path, too many fields, oversized text.
    pub fn parse_requirements(&self, text: &str) -> Result<RequirementsDocument> {
        self.try_observe(Operation::ParseRequirements, "requirements", || {
            self.requirements.parse(text)
        })
    }

    /// Read and parse a markdown requirements file
    ///
    /// # Errors
    /// See [`Self::parse_requirements`], plus IO failures.
    pub async fn parse_requirements_file(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<RequirementsDocument> {
        let path = path.as_ref();
        let component = path.display().to_string();
        self.try_observe_async(
            Operation::ParseRequirements,
            &component,
            self.requirements.parse_file(path),
        )
        .await
    }

    /// Contract for every required endpoint
    #[must_use]
    pub fn generate_from_requirements(&self, doc: &RequirementsDocument) -> Contract {
        self.observe(Operation::Generate, "requirements", || {
            self.generator.generate_from_requirements(doc)
        })
    }

    /// Contract for the routes a backend serves
    #[must_use]
    pub fn generate_from_routes(&self, analysis: &Analysis) -> Contract {
        self.observe(Operation::Generate, &analysis.file, || {
            self.generator.generate_from_backend(&analysis.routes)
        })
    }

    /// Contract for the endpoints a frontend or SDK calls
    #[must_use]
    pub fn generate_from_calls(&self, analysis: &Analysis) -> Contract {
        self.observe(Operation::Generate, &analysis.file, || {
            self.generator.generate_from_backend(&analysis.calls)
        })
    }

    /// Copy of `contract` with inferred schemas in the named slots
    #[must_use]
    pub fn enhance_contract(
        &self,
        contract: &Contract,
        schemas: &HashMap<String, SchemaSpec>,
    ) -> Contract {
        self.observe(Operation::Enhance, &contract.info.title, || {
            self.generator.enhance_contract(contract, schemas)
        })
    }

    /// Arbitrate competing contract proposals
    ///
    /// # Errors
    /// Empty or over-cap proposal sets. Escalation is `Ok`.
    pub fn synthesize_contracts(
        &self,
        proposals: &[Proposal<Contract>],
    ) -> Result<SynthesisResult<Contract>> {
        let result = self.try_observe(Operation::Synthesize, "proposals", || {
            self.synthesizer.synthesize(proposals)
        })?;
        self.metrics.record_synthesis(result.rule().as_str());
        if result.is_escalated() {
            tracing::warn!(proposals = proposals.len(), "synthesis escalated");
        }
        Ok(result)
    }

    /// Endpoint-level diff of `a` against `b`
    #[must_use]
    pub fn compare_contracts(&self, a: Component<'_>, b: Component<'_>) -> Vec<ContractMismatch> {
        let component = format!("{} -> {}", a.name, b.name);
        self.observe(Operation::Compare, &component, || {
            self.validator.compare_contracts(a, b)
        })
    }

    /// Frontend against backend, endpoints and request schemas
    #[must_use]
    pub fn validate_frontend_backend(
        &self,
        frontend: &Contract,
        backend: &Contract,
    ) -> Vec<ContractMismatch> {
        self.observe(Operation::ValidateSchemas, "frontend", || {
            self.validator.validate_frontend_backend(frontend, backend)
        })
    }

    /// SDK against backend, endpoints and request schemas
    #[must_use]
    pub fn validate_sdk_backend(&self, sdk: &Contract, backend: &Contract) -> Vec<ContractMismatch> {
        self.observe(Operation::ValidateSchemas, "sdk", || {
            self.validator.validate_sdk_backend(sdk, backend)
        })
    }

    fn record_parse_outcome(&self, result: &std::result::Result<Contract, LoadError>) {
        match result {
            Ok(_) => self.metrics.record_schema_parse(true),
            Err(err) if err.is_syntax() || err.is_defense_triggered() => {
                self.metrics.record_schema_parse(false);
            }
            Err(_) => {}
        }
    }

    /// Load a contract file under the size and time bounds
    ///
    /// # Errors
    /// IO failures, triggered defenses and syntax errors.
    pub async fn load_contract(&self, path: impl AsRef<Path>) -> Result<Contract> {
        let path = path.as_ref();
        let component = path.display().to_string();
        self.try_observe_async(Operation::LoadContract, &component, async {
            let result = self.loader.load(path).await;
            self.record_parse_outcome(&result);
            result
        })
        .await
    }

    /// Load a contract file and check its structure
    ///
    /// An unparseable document is reported as one ERROR mismatch.
    ///
    /// # Errors
    /// IO failures and triggered defenses.
    pub async fn validate_contract_file(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<Vec<ContractMismatch>> {
        let path = path.as_ref();
        let component = path.display().to_string();
        self.try_observe_async(Operation::ValidateFile, &component, async {
            let result = self.loader.load(path).await;
            self.record_parse_outcome(&result);
            match result {
                Ok(contract) => Ok(self.loader.validate_contract(&contract, &component)),
                Err(LoadError::Syntax(err)) => {
                    Ok(vec![ContractLoader::syntax_mismatch(&component, &err)])
                }
                Err(err) => Err(err),
            }
        })
        .await
    }

    /// Render mismatches as markdown
    #[must_use]
    pub fn generate_report(&self, mismatches: &[ContractMismatch], redact: bool) -> String {
        self.observe(Operation::Report, "report", || {
            self.reporter.generate_report(mismatches, redact)
        })
    }

    /// Write a contract as JSON or YAML by extension
    ///
    /// # Errors
    /// Serialization or IO failure.
    pub async fn write_contract(&self, contract: &Contract, path: impl AsRef<Path>) -> Result<()> {
        concord_validate::write_contract_file(contract, path).await?;
        Ok(())
    }

    /// Write a rendered report
    ///
    /// # Errors
    /// IO failure.
    pub async fn write_report(&self, report: &str, path: impl AsRef<Path>) -> Result<()> {
        concord_validate::write_report(report, path).await?;
        Ok(())
    }

    /// Record whether a validator verdict was later confirmed correct
    pub fn record_verdict(&self, correct: bool) {
        self.metrics.record_verdict(correct);
    }

    /// Current metrics
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// SLO compliance over current metrics
    #[must_use]
    pub fn slo_report(&self) -> SloReport {
        self.slo.evaluate(&self.metrics.snapshot())
    }

    /// Health over current metrics
    #[must_use]
    pub fn health(&self) -> HealthStatus {
        HealthStatus::of(&self.metrics.snapshot())
    }

    /// Prometheus text exposition of current metrics
    ///
    /// # Errors
    /// [`ConcordError::Metrics`] if rendering fails.
    pub fn prometheus_text(&self) -> Result<String> {
        Ok(render_prometheus(&self.metrics.snapshot(), &self.slo)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_contract::HttpMethod;
    use concord_synthesis::SynthesisRule;

    fn engine() -> ContractEngine {
        ContractEngine::new(ConcordConfig::default()).unwrap()
    }

    #[test]
    fn invalid_config_rejected() {
        let err = ContractEngine::new(ConcordConfig::new().with_max_proposals(0)).unwrap_err();
        assert!(matches!(err, ConcordError::Config(_)));
    }

    #[test]
    fn failures_count_against_availability() {
        let engine = engine();
        let err = engine.analyze_source("cobol", "a.cbl", "").unwrap_err();
        assert!(err.is_input_rejected());
        engine.analyze_source("go", "main.go", "package main\n").unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.operations[&Operation::Analyze].total, 2);
        assert_eq!(snapshot.operations[&Operation::Analyze].failed(), 1);
        assert!((snapshot.availability() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn synthesis_rule_is_counted() {
        let engine = engine();
        let mut contract = Contract::new("api", "1.0.0");
        contract.insert_operation("/users", HttpMethod::Get, concord_contract::Operation::new());
        let result = engine
            .synthesize_contracts(&[
                Proposal::new("backend", contract.clone(), 0.8, "routes").unwrap(),
                Proposal::new("frontend", contract, 0.6, "calls").unwrap(),
            ])
            .unwrap();
        assert_eq!(result.rule(), SynthesisRule::Unanimous);
        assert_eq!(engine.snapshot().synthesis_rules["unanimous"], 1);
    }

    #[test]
    fn empty_proposals_fail_and_are_recorded() {
        let engine = engine();
        assert!(engine.synthesize_contracts(&[]).is_err());
        assert_eq!(engine.snapshot().operations[&Operation::Synthesize].failed(), 1);
        assert!(engine.snapshot().synthesis_rules.is_empty());
    }

    #[test]
    fn requirements_file_is_instrumented() {
        let engine = engine();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("requirements.md");
        std::fs::write(&path, "### POST /orders\nRequest: {sku, quantity: integer}\n").unwrap();

        let doc = tokio_test::block_on(engine.parse_requirements_file(&path)).unwrap();
        assert_eq!(doc.endpoints.len(), 1);
        assert!(tokio_test::block_on(engine.parse_requirements_file(dir.path().join("absent.md"))).is_err());

        let tally = engine.snapshot().operations[&Operation::ParseRequirements];
        assert_eq!((tally.total, tally.failed()), (2, 1));
    }

    #[test]
    fn shared_collector() {
        let shared = Arc::new(MetricsCollector::default());
        let a = engine().with_metrics(Arc::clone(&shared));
        let b = engine().with_metrics(Arc::clone(&shared));
        a.generate_report(&[], false);
        b.generate_report(&[], false);
        assert_eq!(shared.snapshot().report_latency.count, 2);
    }
}
