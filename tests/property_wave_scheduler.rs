use ada::domain::models::Subtask;
use ada::services::WaveScheduler;
use proptest::prelude::*;
use proptest::sample::Index;
use std::collections::{HashMap, HashSet};

/// Random acyclic graph: node `i` may only depend on nodes before it.
fn acyclic_graph() -> impl Strategy<Value = Vec<Subtask>> {
    prop::collection::vec((1u32..10, prop::collection::vec(any::<Index>(), 0..4)), 1..30).prop_map(
        |nodes| {
            nodes
                .into_iter()
                .enumerate()
                .map(|(i, (priority, deps))| {
                    let mut s = Subtask::new(format!("task_{i:03}"), Some("exec"), "node");
                    s.priority = priority;
                    if i > 0 {
                        let mut picked: Vec<String> =
                            deps.iter().map(|d| format!("task_{:03}", d.index(i))).collect();
                        picked.sort();
                        picked.dedup();
                        s.depends_on = picked;
                    }
                    s
                })
                .collect()
        },
    )
}

fn wave_index(waves: &[Vec<Subtask>]) -> HashMap<String, usize> {
    waves
        .iter()
        .enumerate()
        .flat_map(|(w, wave)| wave.iter().map(move |s| (s.id.clone(), w)))
        .collect()
}

proptest! {
    /// Property: every subtask is scheduled exactly once
    #[test]
    fn prop_every_subtask_scheduled_once(subtasks in acyclic_graph()) {
        let plan = WaveScheduler::partition(&subtasks);
        let scheduled: Vec<&str> = plan.waves.iter().flatten().map(|s| s.id.as_str()).collect();
        let unique: HashSet<&str> = scheduled.iter().copied().collect();

        prop_assert_eq!(scheduled.len(), subtasks.len());
        prop_assert_eq!(unique.len(), subtasks.len());
        prop_assert!(plan.diagnostic.is_none());
    }

    /// Property: dependencies always land in a strictly earlier wave
    #[test]
    fn prop_dependencies_precede_dependents(subtasks in acyclic_graph()) {
        let plan = WaveScheduler::partition(&subtasks);
        let index = wave_index(&plan.waves);

        for s in &subtasks {
            for dep in &s.depends_on {
                prop_assert!(index[dep] < index[&s.id], "{} scheduled before {}", s.id, dep);
            }
        }
    }

    /// Property: waves are minimal; anything past the first wave waits on
    /// something in the wave directly before it
    #[test]
    fn prop_waves_are_as_early_as_possible(subtasks in acyclic_graph()) {
        let plan = WaveScheduler::partition(&subtasks);
        let index = wave_index(&plan.waves);

        for s in &subtasks {
            let w = index[&s.id];
            if w == 0 {
                prop_assert!(s.depends_on.is_empty());
            } else {
                prop_assert!(s.depends_on.iter().any(|d| index[d] == w - 1));
            }
        }
    }

    /// Property: each wave is ordered by ascending priority
    #[test]
    fn prop_waves_sorted_by_priority(subtasks in acyclic_graph()) {
        let plan = WaveScheduler::partition(&subtasks);
        for wave in &plan.waves {
            prop_assert!(wave.windows(2).all(|pair| pair[0].priority <= pair[1].priority));
        }
    }

    /// Property: a dangling reference degrades the plan but loses nothing
    #[test]
    fn prop_dangling_reference_is_diagnosed(subtasks in acyclic_graph(), victim in any::<Index>()) {
        let mut subtasks = subtasks;
        let i = victim.index(subtasks.len());
        subtasks[i].depends_on.push("missing_999".to_string());

        let plan = WaveScheduler::partition(&subtasks);
        let diagnostic = plan.diagnostic.clone();
        prop_assert!(diagnostic.is_some());
        let diagnostic = diagnostic.unwrap();
        prop_assert!(diagnostic.unresolved.contains(&subtasks[i].id));
        prop_assert!(diagnostic
            .dangling
            .contains(&(subtasks[i].id.clone(), "missing_999".to_string())));

        let scheduled: HashSet<&str> = plan.waves.iter().flatten().map(|s| s.id.as_str()).collect();
        prop_assert_eq!(scheduled.len(), subtasks.len());
    }
}

#[test]
fn test_two_node_cycle_reports_closed_path() {
    let mut a = Subtask::new("a", Some("exec"), "a");
    a.depends_on = vec!["b".to_string()];
    let mut b = Subtask::new("b", Some("exec"), "b");
    b.depends_on = vec!["a".to_string()];
    let root = Subtask::new("root", Some("exec"), "root");

    let plan = WaveScheduler::partition(&[root, a, b]);
    assert_eq!(plan.shape(), vec![1, 2]);
    let diagnostic = plan.diagnostic.expect("cycle must be diagnosed");
    assert_eq!(diagnostic.cycle, Some(vec!["a".to_string(), "b".to_string(), "a".to_string()]));
}
