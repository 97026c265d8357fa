//! Main execution engine - orchestrates the entire workflow run

use crate::{
    core::{
        graph::JobGraph,
        job::{InstanceId, JobInstance},
        report::{ReportHandle, RunReport},
        state::{JobStatus, RunStatus, StepResult},
    },
    execution::{ExecutionScheduler, RunConfig, RunContext, StepExecutor},
    runner::StepRunner,
};
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Events that can occur during workflow execution
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        run_id: Uuid,
        workflow: String,
        instances: usize,
    },
    InstanceStarted {
        id: InstanceId,
    },
    StepStarted {
        id: InstanceId,
        index: usize,
        name: String,
    },
    StepFinished {
        id: InstanceId,
        result: StepResult,
    },
    InstanceFinished {
        id: InstanceId,
        status: JobStatus,
    },
    InstanceBlocked {
        id: InstanceId,
    },
    InstanceSkipped {
        id: InstanceId,
    },
    InstanceCancelled {
        id: InstanceId,
    },
    RunFinished {
        run_id: Uuid,
        status: RunStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Fan-out of execution events to every registered handler
#[derive(Clone, Default)]
pub struct EventEmitter {
    handlers: Arc<Vec<EventHandler>>,
}

impl EventEmitter {
    pub fn new(handlers: Vec<EventHandler>) -> Self {
        Self {
            handlers: Arc::new(handlers),
        }
    }

    /// Emit an event to all handlers
    pub fn emit(&self, event: ExecutionEvent) {
        for handler in self.handlers.iter() {
            handler(event.clone());
        }
    }
}

/// Main workflow execution engine
pub struct ExecutionEngine<R> {
    config: Arc<RunConfig>,
    scheduler: ExecutionScheduler,
    executor: Arc<StepExecutor<R>>,
    event_handlers: Vec<EventHandler>,
}

impl<R: StepRunner + 'static> ExecutionEngine<R> {
    pub fn new(runner: R, config: RunConfig) -> Self {
        Self {
            scheduler: ExecutionScheduler::new(config.capacity),
            config: Arc::new(config),
            executor: Arc::new(StepExecutor::new(runner)),
            event_handlers: Vec::new(),
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        self.executor.runner()
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    /// Execute every instance of the graph and return the finalized report
    pub async fn execute(&self, graph: &JobGraph) -> RunReport {
        let report = ReportHandle::new(RunReport::new(
            self.config.workflow.clone(),
            graph.instance_ids(),
        ));
        let run_id = report.read().await.run_id();
        let events = EventEmitter::new(self.event_handlers.clone());
        let cancel = CancellationToken::new();
        let ctx = RunContext::new(self.config.clone(), report.clone())
            .with_cancel(cancel.clone())
            .with_events(events.clone());

        info!(
            "Starting workflow run: {} ({}), {} instances, capacity {}",
            self.config.workflow,
            run_id,
            graph.len(),
            self.scheduler.capacity()
        );
        events.emit(ExecutionEvent::RunStarted {
            run_id,
            workflow: self.config.workflow.clone(),
            instances: graph.len(),
        });

        let mut tasks: JoinSet<(usize, Result<JobStatus, JoinError>)> = JoinSet::new();

        // Main execution loop
        loop {
            self.settle(graph, &ctx).await;

            let eligible = if cancel.is_cancelled() {
                Vec::new()
            } else {
                graph.eligible(&*report.read().await, self.config.policy)
            };

            for index in self.scheduler.next_instances(&eligible, tasks.len()) {
                let Some(instance) = graph.instance(index).cloned() else {
                    continue;
                };
                self.dispatch(&mut tasks, index, instance, &ctx).await;
            }

            if tasks.is_empty() {
                // Nothing in flight and nothing eligible: nothing left can run
                let stuck = report.read().await.pending();
                for index in stuck {
                    warn!("Job instance {} can never become eligible", instance_name(graph, index));
                    self.block(graph, index, &ctx).await;
                }
                break;
            }

            if let Some(joined) = tasks.join_next().await {
                let (index, status) = match joined {
                    Ok((index, Ok(status))) => (index, status),
                    Ok((index, Err(err))) => {
                        error!(
                            "Executor for {} panicked: {}",
                            instance_name(graph, index),
                            err
                        );
                        self.fail_panicked(graph, index, &ctx).await;
                        (index, JobStatus::Failed)
                    }
                    Err(err) => {
                        error!("Execution task failed: {}", err);
                        continue;
                    }
                };

                if status == JobStatus::Failed && self.config.fail_fast && !cancel.is_cancelled() {
                    info!(
                        "Fail-fast: cancelling run after {} failed",
                        instance_name(graph, index)
                    );
                    cancel.cancel();
                }
            }
        }

        drop(ctx);
        let report = report.finalize().await;
        let status = report.summarize();
        info!("Workflow run finished: {} - {:?}", self.config.workflow, status);
        events.emit(ExecutionEvent::RunFinished { run_id, status });

        report
    }

    /// Spawn one instance; the report marks it running before the task starts
    async fn dispatch(
        &self,
        tasks: &mut JoinSet<(usize, Result<JobStatus, JoinError>)>,
        index: usize,
        instance: Arc<JobInstance>,
        ctx: &RunContext,
    ) {
        ctx.report.mark_running(index).await;
        ctx.events.emit(ExecutionEvent::InstanceStarted {
            id: instance.id.clone(),
        });

        let executor = self.executor.clone();
        let task_ctx = ctx.clone();
        tasks.spawn(async move {
            // Inner task so a panicking executor still reports its index
            let result = tokio::spawn(async move {
                executor.run(index, &instance, &task_ctx).await
            })
            .await;
            (index, result)
        });
    }

    /// Settle undispatched instances that will never run
    ///
    /// Repeats until stable so that blocking propagates down chains of jobs.
    async fn settle(&self, graph: &JobGraph, ctx: &RunContext) {
        loop {
            let (skipped, blocked) = {
                let snapshot = ctx.report.read().await;
                (
                    graph.skipped(&snapshot),
                    graph.blocked(&snapshot, self.config.policy),
                )
            };

            if skipped.is_empty() && blocked.is_empty() {
                break;
            }

            for index in skipped {
                info!("Skipping job instance {}", instance_name(graph, index));
                ctx.report.finish_instance(index, JobStatus::Skipped, None).await;
                if let Some(instance) = graph.instance(index) {
                    ctx.events.emit(ExecutionEvent::InstanceSkipped {
                        id: instance.id.clone(),
                    });
                }
            }
            for index in blocked {
                self.block(graph, index, ctx).await;
            }
        }

        if ctx.cancel.is_cancelled() {
            let pending = ctx.report.read().await.pending();
            for index in pending {
                info!("Cancelling undispatched job instance {}", instance_name(graph, index));
                ctx.report.finish_instance(index, JobStatus::Cancelled, None).await;
                if let Some(instance) = graph.instance(index) {
                    ctx.events.emit(ExecutionEvent::InstanceCancelled {
                        id: instance.id.clone(),
                    });
                }
            }
        }
    }

    async fn block(&self, graph: &JobGraph, index: usize, ctx: &RunContext) {
        info!("Job instance {} blocked by a prerequisite", instance_name(graph, index));
        ctx.report.finish_instance(index, JobStatus::Blocked, None).await;
        if let Some(instance) = graph.instance(index) {
            ctx.events.emit(ExecutionEvent::InstanceBlocked {
                id: instance.id.clone(),
            });
        }
    }

    async fn fail_panicked(&self, graph: &JobGraph, index: usize, ctx: &RunContext) {
        ctx.report.finish_instance(index, JobStatus::Failed, None).await;
        if let Some(instance) = graph.instance(index) {
            ctx.events.emit(ExecutionEvent::InstanceFinished {
                id: instance.id.clone(),
                status: JobStatus::Failed,
            });
        }
    }
}

fn instance_name(graph: &JobGraph, index: usize) -> String {
    graph
        .instance(index)
        .map(|i| i.id.to_string())
        .unwrap_or_else(|| format!("#{}", index))
}
