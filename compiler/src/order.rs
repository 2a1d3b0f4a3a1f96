//! Ordering: a topological sort of the final commands.
//!
//! Commands live in an arena; edges run from producer index to consumer index. Kahn's
//! algorithm drains the graph, always taking the ready command with the smallest
//! `(rank, input index)` key, so the output is deterministic.

use crate::{Atom, Command, CompileError, CompileResult, Stranded};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;
use wish_core::{AnyId, AtomKind, GraphSlice};

/// Execution rank: creations first, then relations, then assignments, then removals.
fn rank(cmd: &Command) -> u8 {
    match cmd {
        Command::Instantiate {
            atom: Atom::Relation { .. },
            ..
        } => 1,
        Command::Instantiate { .. } => 0,
        Command::Assign { .. } => 2,
        Command::Terminate { .. } => 3,
        _ => 4,
    }
}

/// The dependency graph of a command list.
struct DependencyGraph {
    /// successors[i]: commands that must run after command i
    successors: Vec<BTreeSet<usize>>,
    /// predecessors[i]: commands that must run before command i
    predecessors: Vec<BTreeSet<usize>>,
    /// unmet[i]: identities command i needs that nothing provides
    unmet: Vec<Vec<AnyId>>,
}

impl DependencyGraph {
    fn build(cmds: &[Command], slice: &dyn GraphSlice) -> Self {
        let n = cmds.len();
        let mut graph = Self {
            successors: vec![BTreeSet::new(); n],
            predecessors: vec![BTreeSet::new(); n],
            unmet: vec![Vec::new(); n],
        };

        let mut producers: BTreeMap<AnyId, usize> = BTreeMap::new();
        for (i, cmd) in cmds.iter().enumerate() {
            if let Command::Instantiate { .. } = cmd {
                for name in cmd.names() {
                    producers.entry(name).or_insert(i);
                }
            }
        }

        // terminates by target, for relation-before-endpoint removal
        let terminates: BTreeMap<&AnyId, usize> = cmds
            .iter()
            .enumerate()
            .filter_map(|(i, cmd)| match cmd {
                Command::Terminate { target } => Some((target, i)),
                _ => None,
            })
            .collect();

        for (i, cmd) in cmds.iter().enumerate() {
            match cmd {
                Command::Instantiate {
                    atom: Atom::Relation { source, target, .. },
                    ..
                } => {
                    graph.require(i, source, &producers, slice);
                    graph.require(i, target, &producers, slice);
                }
                Command::Assign { target, .. } => graph.require(i, target, &producers, slice),
                Command::Terminate { target } => {
                    // a relation goes before the records it connects
                    if let Some(AtomKind::Relation { source, target, .. }) =
                        slice.lookup(target).map(|reference| reference.kind)
                    {
                        for endpoint in [source, target] {
                            if let Some(&j) = terminates.get(&AnyId::Eternal(endpoint)) {
                                graph.edge(i, j);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        graph
    }

    fn require(
        &mut self,
        consumer: usize,
        id: &AnyId,
        producers: &BTreeMap<AnyId, usize>,
        slice: &dyn GraphSlice,
    ) {
        match producers.get(id) {
            Some(&producer) if producer != consumer => self.edge(producer, consumer),
            Some(_) => self.unmet[consumer].push(id.clone()),
            // value and delegate nodes are interned on demand
            None if slice.contains(id) || matches!(id, AnyId::Value(_) | AnyId::Delegate(_)) => {}
            None => self.unmet[consumer].push(id.clone()),
        }
    }

    fn edge(&mut self, from: usize, to: usize) {
        if from != to {
            self.successors[from].insert(to);
            self.predecessors[to].insert(from);
        }
    }
}

/// Sort `cmds` so every command follows the commands it depends on.
pub fn order(cmds: Vec<Command>, slice: &dyn GraphSlice) -> CompileResult<Vec<Command>> {
    let graph = DependencyGraph::build(&cmds, slice);
    let n = cmds.len();

    let mut indegree: Vec<usize> = graph.predecessors.iter().map(BTreeSet::len).collect();
    let mut ready: BTreeSet<(u8, usize)> = (0..n)
        .filter(|&i| indegree[i] == 0 && graph.unmet[i].is_empty())
        .map(|i| (rank(&cmds[i]), i))
        .collect();

    let mut sorted: Vec<usize> = Vec::with_capacity(n);
    while let Some(next) = ready.iter().next().copied() {
        ready.remove(&next);
        let (_, i) = next;
        sorted.push(i);
        for &j in &graph.successors[i] {
            indegree[j] -= 1;
            if indegree[j] == 0 && graph.unmet[j].is_empty() {
                ready.insert((rank(&cmds[j]), j));
            }
        }
    }

    if sorted.len() < n {
        let placed: BTreeSet<usize> = sorted.iter().copied().collect();
        let stranded = (0..n)
            .filter(|i| !placed.contains(i))
            .map(|i| {
                let mut unmet = graph.unmet[i].clone();
                for &j in &graph.predecessors[i] {
                    if !placed.contains(&j) {
                        unmet.extend(cmds[j].names().into_iter().take(1));
                    }
                }
                Stranded {
                    command: cmds[i].clone(),
                    unmet,
                }
            })
            .collect();
        return Err(CompileError::dependency(stranded));
    }

    let mut slots: Vec<Option<Command>> = cmds.into_iter().map(Some).collect();
    let ordered: Vec<Command> = sorted
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect();
    verify_order(&ordered, slice)?;
    debug!(commands = ordered.len(), "ordered");
    Ok(ordered)
}

/// Check that every command in `cmds` comes after the commands it depends on.
pub fn verify_order(cmds: &[Command], slice: &dyn GraphSlice) -> CompileResult<()> {
    let graph = DependencyGraph::build(cmds, slice);
    let stranded: Vec<Stranded> = (0..cmds.len())
        .filter_map(|i| {
            let mut unmet = graph.unmet[i].clone();
            for &j in &graph.predecessors[i] {
                if j > i {
                    unmet.extend(cmds[j].names().into_iter().take(1));
                }
            }
            (!unmet.is_empty()).then(|| Stranded {
                command: cmds[i].clone(),
                unmet,
            })
        })
        .collect();
    if stranded.is_empty() {
        Ok(())
    } else {
        Err(CompileError::dependency(stranded))
    }
}
