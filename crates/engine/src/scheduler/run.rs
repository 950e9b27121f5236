use std::collections::{HashMap, VecDeque};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;
use ursa_core::{AnalysisError, CacheKey, EngineConfig, ResultItem};

use crate::cache;
use crate::collector::{Collector, FailureRecord, Output, ResultRecord, RunReport};
use crate::executor::Executor;
use crate::expand::{self, UnitOutput, WorkUnit};
use crate::graph::{DependencyGraph, InstanceId};
use crate::metrics::RunStats;

type UnitId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Waiting on dependencies.
    Pending,
    /// Ready; units not yet generated.
    Expanding,
    /// Units outstanding.
    Running,
    Complete,
}

struct InFlight {
    instance: InstanceId,
    label: String,
    /// Set once a worker picks the unit up; queued units never expire.
    deadline: Option<Instant>,
    cache_key: Option<CacheKey>,
}

/// Messages a worker sends back for one unit.
enum UnitEvent {
    Started { id: UnitId, at: Instant },
    Finished { id: UnitId, output: UnitOutput },
}

/// Coordinator for one execution request.
///
/// Owns every piece of bookkeeping and runs on the calling thread; workers
/// only execute units and send their outcome back over the channel.
pub(super) struct Run<'g, F: FnMut(&Output)> {
    graph: &'g DependencyGraph,
    executor: Arc<dyn Executor>,
    timeout: Option<Duration>,
    abort_on_failure: bool,

    states: Vec<State>,
    outstanding: Vec<usize>,
    /// Results kept for feeding dependents; empty for instances without any.
    produced: Vec<Vec<ResultItem>>,
    ready: VecDeque<InstanceId>,
    in_flight: HashMap<UnitId, InFlight>,
    next_unit: UnitId,
    aborted: bool,

    tx: Sender<UnitEvent>,
    rx: Receiver<UnitEvent>,
    collector: Collector<F>,
    stats: RunStats,
}

impl<'g, F: FnMut(&Output)> Run<'g, F> {
    pub(super) fn new(
        graph: &'g DependencyGraph,
        executor: Arc<dyn Executor>,
        config: &EngineConfig,
        on_output: F,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            graph,
            executor,
            timeout: config.unit_timeout(),
            abort_on_failure: config.abort_on_failure,
            states: vec![State::Pending; graph.len()],
            outstanding: vec![0; graph.len()],
            produced: vec![Vec::new(); graph.len()],
            ready: VecDeque::new(),
            in_flight: HashMap::new(),
            next_unit: 0,
            aborted: false,
            tx,
            rx,
            collector: Collector::new(on_output),
            stats: RunStats::default(),
        }
    }

    pub(super) fn execute(mut self) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();
        info!(
            run_id = %run_id,
            instances = self.graph.len(),
            requested = self.graph.requested(),
            executor = self.executor.name(),
            "run started"
        );

        for id in self.graph.roots() {
            self.states[id] = State::Expanding;
            self.ready.push_back(id);
        }

        loop {
            while let Some(id) = self.ready.pop_front() {
                self.expand(id);
            }
            if self.in_flight.is_empty() {
                break;
            }
            self.wait();
        }

        let graph = self.graph;
        let unfinished: Vec<String> = self
            .states
            .iter()
            .enumerate()
            .filter(|(_, state)| **state != State::Complete)
            .map(|(id, _)| graph.instance(id).name().to_string())
            .collect();

        self.stats.elapsed = start.elapsed();
        info!(
            run_id = %run_id,
            units = self.stats.units_dispatched,
            cache_hits = self.stats.cache_hits,
            failures = self.stats.failures,
            aborted = self.aborted,
            elapsed_ms = self.stats.elapsed.as_millis() as u64,
            "run finished"
        );

        RunReport {
            run_id,
            started_at,
            outputs: self.collector.into_outputs(),
            stats: self.stats,
            aborted: self.aborted,
            unfinished,
        }
    }

    fn expand(&mut self, id: InstanceId) {
        let graph = self.graph;
        let instance = graph.instance(id);
        let units = {
            let dependencies: Vec<_> = graph
                .dependencies_of(id)
                .iter()
                .map(|&dep| (graph.instance(dep), self.produced[dep].as_slice()))
                .collect();
            expand::expand(id, instance, &dependencies)
        };

        self.states[id] = State::Running;
        self.outstanding[id] = units.len();
        debug!(bear = %instance.name(), units = units.len(), "expanded");

        if units.is_empty() {
            self.complete(id);
            return;
        }

        for unit in units {
            if let Some(key) = &unit.cache_key {
                if let Some(hit) = cache::lookup(instance, key) {
                    debug!(unit = %unit.label, items = hit.len(), "cache hit");
                    self.stats.cache_hits += 1;
                    self.deliver(id, hit);
                    self.settle(id);
                    continue;
                }
                self.stats.cache_misses += 1;
            }
            self.dispatch(unit);
        }
    }

    fn dispatch(&mut self, mut unit: WorkUnit) {
        let id = self.next_unit;
        self.next_unit += 1;
        trace!(unit = %unit.label, "dispatching");

        self.in_flight.insert(
            id,
            InFlight {
                instance: unit.instance,
                label: unit.label.clone(),
                deadline: None,
                cache_key: unit.cache_key.take(),
            },
        );
        self.stats.units_dispatched += 1;

        let tx = self.tx.clone();
        self.executor.spawn(Box::new(move || {
            // The coordinator may already be gone if this unit timed out.
            let _ = tx.send(UnitEvent::Started { id, at: Instant::now() });
            let output = unit.execute();
            let _ = tx.send(UnitEvent::Finished { id, output });
        }));
    }

    /// Block until one event arrives or the earliest deadline passes.
    fn wait(&mut self) {
        let deadline = self.in_flight.values().filter_map(|u| u.deadline).min();
        let received = match deadline {
            Some(deadline) => self
                .rx
                .recv_timeout(deadline.saturating_duration_since(Instant::now())),
            None => self.rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(UnitEvent::Started { id, at }) => self.start(id, at),
            Ok(UnitEvent::Finished { id, output }) => self.finish(id, output),
            Err(RecvTimeoutError::Timeout) => self.expire_overdue(),
            Err(RecvTimeoutError::Disconnected) => self.abandon_in_flight(),
        }
    }

    fn start(&mut self, id: UnitId, at: Instant) {
        let (Some(timeout), Some(unit)) = (self.timeout, self.in_flight.get_mut(&id)) else {
            return;
        };
        unit.deadline = Some(at + timeout);
    }

    fn finish(&mut self, id: UnitId, output: UnitOutput) {
        let Some(unit) = self.in_flight.remove(&id) else {
            debug!(unit_id = id, "discarding late outcome of expired unit");
            return;
        };
        let instance = self.graph.instance(unit.instance);
        self.stats.record_execution(instance.name(), output.duration);

        if output.error.is_none() {
            if let Some(key) = unit.cache_key {
                cache::store(instance, key, &output.results);
            }
        }

        self.deliver(unit.instance, output.results);
        if let Some(error) = output.error {
            self.fail(unit.instance, unit.label, error);
        }
        self.settle(unit.instance);
    }

    fn expire_overdue(&mut self) {
        let now = Instant::now();
        let overdue: Vec<UnitId> = self
            .in_flight
            .iter()
            .filter(|(_, unit)| unit.deadline.is_some_and(|d| d <= now))
            .map(|(&id, _)| id)
            .collect();

        let timeout = self.timeout.unwrap_or_default();
        for id in overdue {
            if let Some(unit) = self.in_flight.remove(&id) {
                self.fail(unit.instance, unit.label, AnalysisError::TimedOut(timeout));
                self.settle(unit.instance);
            }
        }
    }

    fn abandon_in_flight(&mut self) {
        let ids: Vec<UnitId> = self.in_flight.keys().copied().collect();
        for id in ids {
            if let Some(unit) = self.in_flight.remove(&id) {
                let error = AnalysisError::failed("executor dropped the unit");
                self.fail(unit.instance, unit.label, error);
                self.settle(unit.instance);
            }
        }
    }

    fn deliver(&mut self, id: InstanceId, results: Vec<ResultItem>) {
        let graph = self.graph;
        let bear = graph.instance(id).name();
        let keep = !graph.dependents_of(id).is_empty();
        for item in results {
            if keep {
                self.produced[id].push(item.clone());
            }
            self.collector.push(Output::Result(ResultRecord {
                bear: bear.to_string(),
                item,
            }));
        }
    }

    fn fail(&mut self, id: InstanceId, unit: String, error: AnalysisError) {
        let bear = self.graph.instance(id).name().to_string();
        warn!(bear = %bear, unit = %unit, error = %error, "unit failed");
        self.stats.failures += 1;
        self.collector.push(Output::Failure(FailureRecord { bear, unit, error }));

        if self.abort_on_failure && !self.aborted {
            self.aborted = true;
            warn!(in_flight = self.in_flight.len(), "aborting run; draining in-flight units");
        }
    }

    /// One unit of `id` is accounted for.
    fn settle(&mut self, id: InstanceId) {
        self.outstanding[id] = self.outstanding[id].saturating_sub(1);
        if self.outstanding[id] == 0 {
            self.complete(id);
        }
    }

    fn complete(&mut self, id: InstanceId) {
        let graph = self.graph;
        self.states[id] = State::Complete;
        debug!(bear = %graph.instance(id).name(), "instance complete");

        if self.aborted {
            return;
        }
        for &dependent in graph.dependents_of(id) {
            if self.states[dependent] == State::Pending
                && graph.is_ready(dependent, |dep| self.states[dep] == State::Complete)
            {
                self.states[dependent] = State::Expanding;
                self.ready.push_back(dependent);
            }
        }
    }
}
