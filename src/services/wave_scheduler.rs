//! Wave scheduling: partition a subtask graph into sequential waves.
//!
//! Each round collects every unscheduled subtask whose dependencies are all
//! scheduled. When a round finds nothing eligible (a cycle or a dangling
//! reference), the remainder is forced into one final wave and the plan is
//! flagged with a [`ScheduleDiagnostic`].

use std::collections::{HashMap, HashSet};
use tracing::warn;

use crate::domain::models::{ScheduleDiagnostic, Subtask, WavePlan};

fn detect_cycle_util<'a>(
    node: &'a str,
    graph: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    rec_stack: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> bool {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(neighbors) = graph.get(node) {
        for &neighbor in neighbors {
            if !visited.contains(neighbor) {
                if detect_cycle_util(neighbor, graph, visited, rec_stack, path) {
                    return true;
                }
            } else if rec_stack.contains(neighbor) {
                if let Some(cycle_start) = path.iter().position(|&id| id == neighbor) {
                    path.drain(0..cycle_start);
                    path.push(neighbor);
                    return true;
                }
            }
        }
    }

    rec_stack.remove(node);
    path.pop();
    false
}

/// Stateless wave partitioner.
pub struct WaveScheduler;

impl WaveScheduler {
    /// Partition `subtasks` into ordered waves.
    ///
    /// Every subtask lands in exactly one wave. Within a wave subtasks are
    /// ordered by ascending priority, ties keeping input order.
    pub fn partition(subtasks: &[Subtask]) -> WavePlan {
        let mut scheduled_ids: HashSet<&str> = HashSet::new();
        let mut pending: Vec<&Subtask> = subtasks.iter().collect();
        let mut waves: Vec<Vec<Subtask>> = Vec::new();

        while !pending.is_empty() {
            let (ready, blocked): (Vec<&Subtask>, Vec<&Subtask>) = pending
                .into_iter()
                .partition(|s| s.depends_on.iter().all(|d| scheduled_ids.contains(d.as_str())));

            if ready.is_empty() {
                let diagnostic = Self::diagnose(subtasks, &blocked);
                warn!(
                    unresolved = diagnostic.unresolved.len(),
                    detail = %diagnostic.describe(),
                    "wave partition degraded"
                );
                waves.push(Self::ordered(blocked));
                return WavePlan {
                    waves,
                    diagnostic: Some(diagnostic),
                };
            }

            scheduled_ids.extend(ready.iter().map(|s| s.id.as_str()));
            waves.push(Self::ordered(ready));
            pending = blocked;
        }

        WavePlan {
            waves,
            diagnostic: None,
        }
    }

    fn ordered(mut wave: Vec<&Subtask>) -> Vec<Subtask> {
        wave.sort_by_key(|s| s.priority);
        wave.into_iter().cloned().collect()
    }

    fn diagnose(all: &[Subtask], blocked: &[&Subtask]) -> ScheduleDiagnostic {
        let known: HashSet<&str> = all.iter().map(|s| s.id.as_str()).collect();

        let dangling = blocked
            .iter()
            .flat_map(|s| {
                s.depends_on
                    .iter()
                    .filter(|d| !known.contains(d.as_str()))
                    .map(|d| (s.id.clone(), d.clone()))
            })
            .collect();

        ScheduleDiagnostic {
            unresolved: blocked.iter().map(|s| s.id.clone()).collect(),
            dangling,
            cycle: Self::find_cycle(blocked),
        }
    }

    /// One dependency cycle among `subtasks`, closed (first id repeated last).
    pub fn find_cycle(subtasks: &[&Subtask]) -> Option<Vec<String>> {
        let graph: HashMap<&str, Vec<&str>> = subtasks
            .iter()
            .map(|s| (s.id.as_str(), s.depends_on.iter().map(String::as_str).collect()))
            .collect();

        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        // Input order keeps the reported cycle deterministic.
        for s in subtasks {
            let id = s.id.as_str();
            if !visited.contains(id)
                && detect_cycle_util(id, &graph, &mut visited, &mut rec_stack, &mut path)
            {
                return Some(path.into_iter().map(str::to_string).collect());
            }
        }
        None
    }
}
