//! Control-flow graph helpers.
//!
//! Blocks reference each other by string id inside terminator tags; the
//! passes and the validator want index-based adjacency instead of
//! repeated linear scans. [`Cfg`] resolves every terminator edge once
//! per function.

use crate::ir::IrFunction;
use std::collections::HashMap;

/// Index-based adjacency for one function's blocks
#[derive(Debug, Clone)]
pub struct Cfg {
    pub successors: Vec<Vec<usize>>,
    pub predecessors: Vec<Vec<usize>>,
}

impl Cfg {
    /// Resolve terminator targets to block indices. Targets that name no
    /// block are dropped here; the validator reports them separately.
    pub fn build(function: &IrFunction) -> Cfg {
        let index: HashMap<&str, usize> = function
            .blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (b.id.as_str(), i))
            .collect();

        let n = function.blocks.len();
        let mut successors = vec![Vec::new(); n];
        let mut predecessors = vec![Vec::new(); n];
        for (i, block) in function.blocks.iter().enumerate() {
            let Some(terminator) = block.terminator() else {
                continue;
            };
            for target in terminator.successor_targets() {
                if let Some(&j) = index.get(target) {
                    successors[i].push(j);
                    predecessors[j].push(i);
                }
            }
        }
        Cfg {
            successors,
            predecessors,
        }
    }

    /// Blocks reachable from the entry block along terminator edges
    pub fn reachable(&self) -> Vec<bool> {
        let n = self.successors.len();
        let mut seen = vec![false; n];
        if n == 0 {
            return seen;
        }
        let mut queue = std::collections::VecDeque::from([0usize]);
        seen[0] = true;
        while let Some(i) = queue.pop_front() {
            for &j in &self.successors[i] {
                if !seen[j] {
                    seen[j] = true;
                    queue.push_back(j);
                }
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builders::FunctionBuilder;

    #[test]
    fn builds_diamond_adjacency() {
        let function = FunctionBuilder::new("f", "float")
            .block("entry", |b| {
                b.branch_cond(1, "then1", "else2");
            })
            .block("then1", |b| {
                b.branch("merge3");
            })
            .block("else2", |b| {
                b.branch("merge3");
            })
            .block("merge3", |b| {
                b.ret(None);
            })
            .build();

        let cfg = Cfg::build(&function);
        assert_eq!(cfg.successors[0], vec![1, 2]);
        assert_eq!(cfg.predecessors[3], vec![1, 2]);
        assert!(cfg.reachable().iter().all(|&r| r));
    }

    #[test]
    fn detects_unreachable_blocks() {
        let function = FunctionBuilder::new("f", "float")
            .block("entry", |b| {
                b.ret(None);
            })
            .block("orphan", |b| {
                b.ret(None);
            })
            .build();

        let cfg = Cfg::build(&function);
        assert_eq!(cfg.reachable(), vec![true, false]);
    }
}
