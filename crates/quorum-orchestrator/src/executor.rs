//! Phase executor: resolve, fan out under a bounded pool, join, persist, gate

use anyhow::Result;
use async_trait::async_trait;
use quorum_gate::GateValidator;
use quorum_llm::{AdapterRegistry, ServiceAdapter};
use quorum_prompt_template::{PromptProvider, synthetic_prompt};
use quorum_utils::logging::{phase_span, task_span};
use quorum_utils::{TaskMetadata, TaskResult};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{Instrument, debug, error, info, warn};

use crate::decision::{GateDecider, HumanDecision, proceeds};
use crate::output::RunOutput;
use crate::phase::PhaseDescriptor;
use crate::runner::{PhaseReport, PhaseRunner};
use crate::state::RunState;

/// A task ready to dispatch
struct Job {
    task: String,
    service: String,
    adapter: Arc<dyn ServiceAdapter>,
    prompt: String,
}

pub struct PhaseExecutor {
    registry: Arc<AdapterRegistry>,
    prompts: Arc<dyn PromptProvider>,
    validator: GateValidator,
    context: BTreeMap<String, String>,
    output: Option<RunOutput>,
    gates_enabled: bool,
    decider: Option<Arc<dyn GateDecider>>,
}

impl PhaseExecutor {
    #[must_use]
    pub fn new(registry: Arc<AdapterRegistry>, prompts: Arc<dyn PromptProvider>) -> Self {
        Self {
            registry,
            prompts,
            validator: GateValidator::new(),
            context: BTreeMap::new(),
            output: None,
            gates_enabled: true,
            decider: None,
        }
    }

    #[must_use]
    pub fn with_validator(mut self, validator: GateValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Values merged into every prompt-rendering context
    #[must_use]
    pub fn with_context(mut self, context: BTreeMap<String, String>) -> Self {
        self.context = context;
        self
    }

    #[must_use]
    pub fn with_output(mut self, output: RunOutput) -> Self {
        self.output = Some(output);
        self
    }

    #[must_use]
    pub fn with_gates(mut self, enabled: bool) -> Self {
        self.gates_enabled = enabled;
        self
    }

    /// Consulted at gates when the run pauses for confirmation
    #[must_use]
    pub fn with_decider(mut self, decider: Arc<dyn GateDecider>) -> Self {
        self.decider = Some(decider);
        self
    }

    /// Split the phase's tasks into dispatchable jobs and skipped task names
    fn plan(&self, phase: &PhaseDescriptor) -> (Vec<Job>, Vec<String>) {
        let mut jobs = Vec::with_capacity(phase.tasks.len());
        let mut skipped = Vec::new();

        for task in &phase.tasks {
            let Some(service) = phase.service_for(task) else {
                warn!(task = %task, "No service bound to task, skipping");
                skipped.push(task.clone());
                continue;
            };
            let adapter = match self.registry.get(service) {
                Some(adapter) if adapter.is_available() => adapter,
                _ => {
                    warn!(task = %task, service = service, "Service unavailable, skipping task");
                    skipped.push(task.clone());
                    continue;
                }
            };
            jobs.push(Job {
                task: task.clone(),
                service: service.to_string(),
                prompt: self.prompt_for(phase, task),
                adapter,
            });
        }
        (jobs, skipped)
    }

    fn prompt_for(&self, phase: &PhaseDescriptor, task: &str) -> String {
        let mut context = self.context.clone();
        context
            .entry("phase".to_string())
            .or_insert_with(|| phase.name.clone());
        context
            .entry("task".to_string())
            .or_insert_with(|| task.to_string());

        match self.prompts.resolve(&phase.name, task, &context) {
            Ok(prompt) => prompt,
            Err(err) => {
                warn!(task = task, error = %err, "Using synthetic prompt");
                synthetic_prompt(&phase.name, task, &context)
            }
        }
    }

    /// Run every job with at most `parallel_limit` in flight; results come
    /// back in job order once all have finished
    async fn dispatch(&self, phase: &PhaseDescriptor, jobs: Vec<Job>) -> Vec<TaskResult> {
        let semaphore = Arc::new(Semaphore::new(phase.parallel_limit.max(1)));
        let timeout = phase.task_timeout;

        let mut handles = Vec::with_capacity(jobs.len());
        for job in jobs {
            let semaphore = Arc::clone(&semaphore);
            let span = task_span(&phase.name, &job.task, &job.service);
            let key = (job.task.clone(), job.service.clone());

            let handle = tokio::spawn(
                async move {
                    let Ok(_permit) = semaphore.acquire_owned().await else {
                        return TaskResult::error(
                            job.task,
                            job.service,
                            "worker pool closed before dispatch",
                            TaskMetadata::default(),
                        );
                    };
                    debug!("Task dispatched");
                    job.adapter.execute(&job.prompt, &job.task, Some(timeout)).await
                }
                .instrument(span),
            );
            handles.push((key, handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for ((task, service), handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(err) => {
                    error!(task = %task, service = %service, error = %err, "Task aborted");
                    TaskResult::error(
                        task,
                        service,
                        format!("task aborted: {err}"),
                        TaskMetadata::default(),
                    )
                }
            };
            results.push(result);
        }
        results
    }

    async fn run(
        &self,
        phase: &PhaseDescriptor,
        state: &mut RunState,
        pause_at_gate: bool,
    ) -> Result<PhaseReport> {
        info!(
            tasks = phase.tasks.len(),
            parallel_limit = phase.parallel_limit,
            "Phase started"
        );

        let (jobs, skipped) = self.plan(phase);
        let results = self.dispatch(phase, jobs).await;

        for result in &results {
            if let Some(output) = &self.output {
                state.record_documents(output.write_task(&phase.name, result)?);
            }
            state
                .aggregator
                .add_result(&phase.name, &result.task, result.clone());
        }

        let failed = results.iter().filter(|r| !r.is_success()).count();
        info!(
            succeeded = results.len() - failed,
            failed = failed,
            skipped = skipped.len(),
            "Phase tasks joined"
        );

        let mut report = PhaseReport {
            phase: phase.name.clone(),
            ordinal: phase.ordinal,
            proceed: true,
            gate: None,
            decision: None,
            results,
            skipped,
        };

        if !(phase.gate_required && self.gates_enabled) {
            debug!("Gate not evaluated");
            return Ok(report);
        }

        let gate = self
            .validator
            .evaluate(&phase.name, phase.ordinal, &report.results);
        if let Some(output) = &self.output {
            state.record_documents([output.write_gate(&gate)?]);
        }

        // No answer at the prompt (no terminal, closed stdin) halts the run
        let decision = match &self.decider {
            Some(decider) if pause_at_gate => Some(decider.decide(&gate).unwrap_or_else(|err| {
                warn!(error = %err, "Gate confirmation unavailable, halting");
                HumanDecision::Halt
            })),
            _ => None,
        };
        report.proceed = proceeds(&gate, decision);
        report.decision = decision;

        for rec in &gate.recommendations {
            info!(recommendation = %rec, "Gate recommendation");
        }
        state.gates.record(gate.clone());
        report.gate = Some(gate);
        Ok(report)
    }
}

#[async_trait]
impl PhaseRunner for PhaseExecutor {
    fn availability(&self) -> BTreeMap<String, bool> {
        self.registry.availability()
    }

    async fn run_phase(
        &self,
        phase: &PhaseDescriptor,
        state: &mut RunState,
        pause_at_gate: bool,
    ) -> Result<PhaseReport> {
        let span = phase_span(&phase.name, phase.ordinal);
        self.run(phase, state, pause_at_gate).instrument(span).await
    }
}
