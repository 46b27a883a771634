/// Identifier and register allocation for one transpiler session.
///
/// Both counters only grow. `compile()` does not reset them, so names minted for
/// different units compiled by the same `Transpiler` never collide in the target's
/// global register namespace. Only [`Allocator::reset`] starts over.

use crate::command::Command;

pub const DEFAULT_PREFIX: &str = "TS";

#[derive(Debug, Default)]
pub struct Allocator {
    next_id: u64,
    next_register: u64,
    /// `declare-register` commands for the script currently being lowered.
    preamble: Vec<Command>,
}

impl Allocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `prefix_N`, unique for the session. The prefix defaults to `TS`.
    pub fn fresh_id(&mut self, prefix: Option<&str>) -> String {
        self.next_id += 1;
        format!("{}_{}", prefix.unwrap_or(DEFAULT_PREFIX), self.next_id)
    }

    /// A new anonymous register, declared in the current preamble.
    pub fn fresh_register(&mut self) -> String {
        self.next_register += 1;
        let name = format!("register{}", self.next_register);
        self.declare(&name);
        name
    }

    /// Declare an already minted name in the current preamble.
    pub fn declare(&mut self, name: &str) {
        self.preamble.push(Command::DeclareRegister(name.to_string()));
    }

    pub fn preamble(&self) -> &[Command] {
        &self.preamble
    }

    /// Install a new preamble buffer, returning the previous one.
    pub fn swap_preamble(&mut self, preamble: Vec<Command>) -> Vec<Command> {
        std::mem::replace(&mut self.preamble, preamble)
    }

    pub fn take_preamble(&mut self) -> Vec<Command> {
        self.swap_preamble(Vec::new())
    }

    /// Explicit session reset: counters start over.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_fresh_ids_are_unique() {
        let mut alloc = Allocator::new();
        assert_eq!(alloc.fresh_id(None), "TS_1");
        assert_eq!(alloc.fresh_id(Some("x")), "x_2");
        assert_eq!(alloc.fresh_id(Some("x")), "x_3");

        let mut seen = HashSet::new();
        for _ in 0..100 {
            assert!(seen.insert(alloc.fresh_id(Some("v"))));
        }
    }

    #[test]
    fn test_fresh_register_is_declared_once() {
        let mut alloc = Allocator::new();
        let first = alloc.fresh_register();
        let second = alloc.fresh_register();
        assert_eq!(first, "register1");
        assert_eq!(second, "register2");
        assert_eq!(
            alloc.preamble(),
            &[
                Command::DeclareRegister("register1".to_string()),
                Command::DeclareRegister("register2".to_string()),
            ]
        );
    }

    #[test]
    fn test_register_and_id_counters_are_independent() {
        let mut alloc = Allocator::new();
        alloc.fresh_id(None);
        alloc.fresh_id(None);
        assert_eq!(alloc.fresh_register(), "register1");
        assert_eq!(alloc.fresh_id(None), "TS_3");
    }

    #[test]
    fn test_swap_preamble() {
        let mut alloc = Allocator::new();
        alloc.declare("outer");
        let saved = alloc.swap_preamble(Vec::new());
        alloc.declare("inner");
        let inner = alloc.swap_preamble(saved);
        assert_eq!(inner, vec![Command::DeclareRegister("inner".to_string())]);
        assert_eq!(alloc.take_preamble(), vec![Command::DeclareRegister("outer".to_string())]);
        assert!(alloc.preamble().is_empty());
    }

    #[test]
    fn test_reset() {
        let mut alloc = Allocator::new();
        alloc.fresh_id(None);
        alloc.fresh_register();
        alloc.reset();
        assert_eq!(alloc.fresh_id(None), "TS_1");
        assert_eq!(alloc.fresh_register(), "register1");
    }
}
