//! Dependency graph between bear instances of one execution request.
//!
//! Building the graph pulls in every transitively required dependency,
//! validates that the bear-type edges are acyclic, and exposes the
//! readiness predicate the scheduler gates expansion on. Nothing here
//! executes analysis.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use ursa_core::{BearInstance, BearSpec, ConfigurationError};

use crate::error::EngineError;
use crate::registry::BearRegistry;

/// Index of an instance within a [`DependencyGraph`].
pub type InstanceId = usize;

pub struct DependencyGraph {
    instances: Vec<Arc<BearInstance>>,
    /// instance -> instances it depends on
    dependencies: Vec<Vec<InstanceId>>,
    /// instance -> instances depending on it
    dependents: Vec<Vec<InstanceId>>,
    requested: usize,
}

impl DependencyGraph {
    /// Build the graph for the requested instances.
    ///
    /// Dependencies are instantiated with the dependent's settings, files
    /// and cache, and shared between dependents bound to the same inputs.
    pub fn build(requested: Vec<BearInstance>, registry: &BearRegistry) -> Result<Self, EngineError> {
        check_acyclic(requested.iter().map(BearInstance::spec), registry)?;

        let requested_count = requested.len();
        let mut instances: Vec<Arc<BearInstance>> = requested.into_iter().map(Arc::new).collect();
        let mut dependencies: Vec<Vec<InstanceId>> = vec![Vec::new(); instances.len()];

        let mut next = 0;
        while next < instances.len() {
            let current = Arc::clone(&instances[next]);
            let mut deps = Vec::new();
            for dep_name in current.spec().dependencies() {
                let existing = instances
                    .iter()
                    .position(|other| other.name() == dep_name && other.shares_inputs_with(&current));
                let id = match existing {
                    Some(id) => id,
                    None => {
                        let bear = registry.get(dep_name).ok_or_else(|| {
                            ConfigurationError::UnknownDependency {
                                bear: current.name().to_string(),
                                dependency: dep_name.to_string(),
                            }
                        })?;
                        let instance = current.derive(Arc::clone(bear))?;
                        debug!(bear = %dep_name, dependent = %current.name(), "pulled in dependency");
                        instances.push(Arc::new(instance));
                        dependencies.push(Vec::new());
                        instances.len() - 1
                    }
                };
                deps.push(id);
            }
            dependencies[next] = deps;
            next += 1;
        }

        let mut dependents: Vec<Vec<InstanceId>> = vec![Vec::new(); instances.len()];
        for (id, deps) in dependencies.iter().enumerate() {
            for &dep in deps {
                dependents[dep].push(id);
            }
        }

        Ok(Self {
            instances,
            dependencies,
            dependents,
            requested: requested_count,
        })
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Number of instances the caller asked for; the rest were pulled in.
    pub fn requested(&self) -> usize {
        self.requested
    }

    pub fn instance(&self, id: InstanceId) -> &Arc<BearInstance> {
        &self.instances[id]
    }

    pub fn instances(&self) -> impl Iterator<Item = (InstanceId, &Arc<BearInstance>)> {
        self.instances.iter().enumerate()
    }

    pub fn dependencies_of(&self, id: InstanceId) -> &[InstanceId] {
        &self.dependencies[id]
    }

    pub fn dependents_of(&self, id: InstanceId) -> &[InstanceId] {
        &self.dependents[id]
    }

    /// Instances with no dependencies; these start directly in expansion.
    pub fn roots(&self) -> impl Iterator<Item = InstanceId> + '_ {
        (0..self.len()).filter(|&id| self.dependencies[id].is_empty())
    }

    /// An instance is ready once every dependency has completed.
    pub fn is_ready(&self, id: InstanceId, complete: impl Fn(InstanceId) -> bool) -> bool {
        self.dependencies[id].iter().all(|&dep| complete(dep))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Depth-first walk over bear-type edges, failing on the first back edge.
fn check_acyclic<'a>(
    roots: impl Iterator<Item = &'a BearSpec>,
    registry: &BearRegistry,
) -> Result<(), EngineError> {
    let mut marks: HashMap<String, Mark> = HashMap::new();
    let mut path: Vec<String> = Vec::new();
    for spec in roots {
        visit(spec, registry, &mut marks, &mut path)?;
    }
    Ok(())
}

fn visit(
    spec: &BearSpec,
    registry: &BearRegistry,
    marks: &mut HashMap<String, Mark>,
    path: &mut Vec<String>,
) -> Result<(), EngineError> {
    if marks.contains_key(spec.name()) {
        return Ok(());
    }
    marks.insert(spec.name().to_string(), Mark::Visiting);
    path.push(spec.name().to_string());

    for dep in spec.dependencies() {
        match marks.get(dep) {
            Some(Mark::Done) => {}
            Some(Mark::Visiting) => {
                let start = path.iter().position(|name| name == dep).unwrap_or(0);
                let mut cycle: Vec<&str> = path[start..].iter().map(String::as_str).collect();
                cycle.push(dep);
                return Err(EngineError::CyclicDependency(cycle.join(" -> ")));
            }
            None => {
                let bear = registry
                    .get(dep)
                    .ok_or_else(|| ConfigurationError::UnknownDependency {
                        bear: spec.name().to_string(),
                        dependency: dep.to_string(),
                    })?;
                visit(bear.spec(), registry, marks, path)?;
            }
        }
    }

    path.pop();
    marks.insert(spec.name().to_string(), Mark::Done);
    Ok(())
}
