//! Engine — matches trigger inputs to rules and runs their action chains.
//!
//! One engine owns one variable store and one action registry. It exposes
//! the input trigger ([`Engine::run`]), the startup/shutdown sequencer and
//! [`Engine::start_triggers`], which installs file watches and cron jobs and
//! hands back the [`Lifecycle`] that releases them.

use std::sync::Arc;

use tokio::sync::mpsc;

use codematic_domain::error::{CodematicError, ConfigError};
use codematic_domain::options::EngineOptions;
use codematic_domain::rule::{InputRules, Rule};
use codematic_domain::time;
use codematic_domain::variables::CODE;

use crate::context::ExecutionContext;
use crate::executor::{ChainExecutor, ChainReport};
use crate::lifecycle::Lifecycle;
use crate::ports::{AuditLog, AuditRecord, FileWatcher, OutputSink, Scheduler, TracingOutput};
use crate::registry::ActionRegistry;
use crate::triggers;
use crate::variables::Variables;

/// Capacity of each trigger source's event channel.
const TRIGGER_CHANNEL_CAPACITY: usize = 64;

/// Rule-driven automation engine. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

struct Inner {
    registry: ActionRegistry,
    context: ExecutionContext,
    options: EngineOptions,
    input_rules: InputRules,
    audit: Option<Arc<dyn AuditLog>>,
}

impl Engine {
    /// Create a builder for constructing an [`Engine`].
    #[must_use]
    pub fn builder(registry: ActionRegistry) -> EngineBuilder {
        EngineBuilder::new(registry)
    }

    #[must_use]
    pub fn variables(&self) -> &Variables {
        self.inner.context.variables()
    }

    #[must_use]
    pub fn registry(&self) -> &ActionRegistry {
        &self.inner.registry
    }

    #[must_use]
    pub fn options(&self) -> &EngineOptions {
        &self.inner.options
    }

    /// Input trigger: run the first input rule matching `code`.
    ///
    /// Appends an audit record, stores `code` as `CODE`, then runs the
    /// rule's chain. Returns `Ok(None)` when no rule matches.
    ///
    /// # Errors
    ///
    /// Returns [`CodematicError::Config`] when the chain hits a
    /// configuration error. Malformed input rules are rejected earlier, by
    /// [`EngineBuilder::build`].
    #[tracing::instrument(skip(self))]
    pub async fn run(&self, code: &str) -> Result<Option<ChainReport>, CodematicError> {
        let Some(rule) = self.inner.input_rules.first_match(Some(code)) else {
            tracing::info!("no rule matches input");
            return Ok(None);
        };
        tracing::info!(rule = rule.label(), "rule matched");
        self.audit(rule, code).await;
        self.run_rule(rule, Some(code)).await.map(Some)
    }

    /// Run `rule`'s chain unconditionally, storing `code` as `CODE` first
    /// when given.
    ///
    /// # Errors
    ///
    /// Returns [`CodematicError::Config`] when the rule has no action or the
    /// chain hits a configuration error.
    #[tracing::instrument(skip(self, rule), fields(rule = rule.label()))]
    pub async fn run_rule(
        &self,
        rule: &Rule,
        code: Option<&str>,
    ) -> Result<ChainReport, CodematicError> {
        let root = rule.root_action()?;
        if let Some(code) = code {
            self.variables().set(CODE, code);
        }
        let report = ChainExecutor::new(&self.inner.registry, &self.inner.context)
            .run(root)
            .await?;
        tracing::debug!(
            run_id = %report.run_id,
            steps = report.steps.len(),
            outcome = ?report.last_outcome(),
            "chain finished"
        );
        Ok(report)
    }

    /// Run `rules` one after the other, each chain completing before the
    /// next starts.
    ///
    /// # Errors
    ///
    /// Stops at the first configuration error; the remaining rules are not
    /// run.
    pub async fn run_sequence(&self, rules: &[Rule]) -> Result<Vec<ChainReport>, CodematicError> {
        let mut reports = Vec::with_capacity(rules.len());
        for rule in rules {
            reports.push(self.run_rule(rule, None).await?);
        }
        Ok(reports)
    }

    /// Seed external parameters into the store, then run the startup rules.
    ///
    /// # Errors
    ///
    /// Same as [`run_sequence`](Self::run_sequence).
    #[tracing::instrument(skip_all)]
    pub async fn startup<I, K, V>(&self, seed: I) -> Result<Vec<ChainReport>, CodematicError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in seed {
            self.variables().set(key.into(), value.into());
        }
        let rules = &self.inner.options.on_startup;
        tracing::info!(count = rules.len(), "running startup rules");
        self.run_sequence(rules).await
    }

    /// Run the shutdown rules, then release every trigger in `lifecycle`.
    ///
    /// Triggers are released even when a shutdown rule fails.
    ///
    /// # Errors
    ///
    /// Same as [`run_sequence`](Self::run_sequence).
    #[tracing::instrument(skip_all)]
    pub async fn shutdown(&self, lifecycle: Lifecycle) -> Result<Vec<ChainReport>, CodematicError> {
        let rules = &self.inner.options.on_shutdown;
        tracing::info!(count = rules.len(), "running shutdown rules");
        let result = self.run_sequence(rules).await;
        lifecycle.shutdown().await;
        result
    }

    /// Install one watch per file-change registration and one job per
    /// schedule registration, each with its own dispatcher task.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Fails on the first registration that cannot be installed. Triggers
    /// installed before the failure are released.
    #[tracing::instrument(skip_all)]
    pub fn start_triggers(
        &self,
        watcher: &dyn FileWatcher,
        scheduler: &dyn Scheduler,
    ) -> Result<Lifecycle, CodematicError> {
        let mut lifecycle = Lifecycle::new();

        for trigger in &self.inner.options.on_filechange {
            trigger.rule.root_action()?;
            let pattern = trigger.name_pattern()?;
            let (tx, rx) = mpsc::channel(TRIGGER_CHANNEL_CAPACITY);
            let handle = watcher.watch(trigger, tx)?;
            let dispatcher = tokio::spawn(triggers::file_change::dispatch(
                self.clone(),
                Arc::new(trigger.clone()),
                pattern,
                rx,
            ));
            lifecycle.adopt(handle, dispatcher);
        }

        for trigger in &self.inner.options.on_schedule {
            trigger.rule.root_action()?;
            let (tx, rx) = mpsc::channel(TRIGGER_CHANNEL_CAPACITY);
            let handle = scheduler.schedule(trigger, tx)?;
            let dispatcher = tokio::spawn(triggers::schedule::dispatch(
                self.clone(),
                Arc::new(trigger.clone()),
                rx,
            ));
            lifecycle.adopt(handle, dispatcher);
        }

        tracing::info!(count = lifecycle.len(), "triggers started");
        Ok(lifecycle)
    }

    /// Store `value` in `var` and run `rule`, logging instead of returning
    /// errors. Used by trigger dispatchers, which have no caller to report
    /// to.
    pub(crate) async fn fire(&self, rule: &Rule, var: &str, value: String) {
        self.variables().set(var, value);
        if let Err(err) = self.run_rule(rule, None).await {
            tracing::error!(error = %err, rule = rule.label(), "triggered rule failed");
        }
    }

    async fn audit(&self, rule: &Rule, code: &str) {
        let Some(audit) = &self.inner.audit else {
            return;
        };
        let record = AuditRecord {
            at: time::now(),
            rule: rule.label().to_string(),
            input: code.to_string(),
        };
        if let Err(err) = audit.append(&record).await {
            tracing::warn!(%err, "failed to append audit record");
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("registry", &self.inner.registry)
            .field("input_rules", &self.inner.input_rules.len())
            .finish_non_exhaustive()
    }
}

/// Step-by-step builder for [`Engine`].
pub struct EngineBuilder {
    registry: ActionRegistry,
    options: EngineOptions,
    variables: Variables,
    output: Arc<dyn OutputSink>,
    audit: Option<Arc<dyn AuditLog>>,
}

impl EngineBuilder {
    #[must_use]
    pub fn new(registry: ActionRegistry) -> Self {
        Self {
            registry,
            options: EngineOptions::default(),
            variables: Variables::new(),
            output: Arc::new(TracingOutput),
            audit: None,
        }
    }

    #[must_use]
    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn input_rules(mut self, rules: Vec<Rule>) -> Self {
        self.options.on_input = rules;
        self
    }

    #[must_use]
    pub fn startup_rules(mut self, rules: Vec<Rule>) -> Self {
        self.options.on_startup = rules;
        self
    }

    #[must_use]
    pub fn shutdown_rules(mut self, rules: Vec<Rule>) -> Self {
        self.options.on_shutdown = rules;
        self
    }

    /// Share an existing variable store instead of starting empty.
    #[must_use]
    pub fn variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    #[must_use]
    pub fn output(mut self, output: Arc<dyn OutputSink>) -> Self {
        self.output = output;
        self
    }

    #[must_use]
    pub fn audit_log(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Validate the rule lists and build the engine.
    ///
    /// # Errors
    ///
    /// Returns the first malformed rule or invalid pattern found.
    pub fn build(self) -> Result<Engine, ConfigError> {
        self.options.validate()?;
        let input_rules = InputRules::compile(&self.options.on_input)?;
        tracing::debug!(input_rules = input_rules.len(), "engine built");
        Ok(Engine {
            inner: Arc::new(Inner {
                registry: self.registry,
                context: ExecutionContext::new(self.variables, self.output),
                options: self.options,
                input_rules,
                audit: self.audit,
            }),
        })
    }
}
