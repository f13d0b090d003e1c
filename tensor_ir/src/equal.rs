// Copyright 2026 the Tensor VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The non-recursive structural-equality engine.
//!
//! The engine pushes object comparisons onto an explicit task stack and
//! expands children through registered per-type reducers, so recursion
//! depth is bounded by the input graph, not the host stack. Reducers run in
//! the same depth-first, left-to-right order a recursive implementation
//! would produce: pending children are drained onto the stack in reverse,
//! so the earliest-enqueued child expands first.
//!
//! Two remap maps (`lhs -> rhs`, `rhs -> lhs`) are populated when a task
//! that a reducer marked as a graph node completes, which both handles
//! variable-mediated cycles and enforces identity-stable matching of shared
//! nodes.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::object::ObjectRef;
use crate::path::{ObjectPath, ObjectPathPair};
use crate::reducer::SEqualReducer;
use crate::registry::ReducerRegistry;
use crate::value::Value;

/// Options for one [`SEqualHandler`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SEqualConfig {
    /// Turn a `false` result into a [`StructuralMismatch`] error with a
    /// rendered diagnostic.
    pub assert_mode: bool,
    /// Track object paths and record the first mismatch.
    pub trace_mismatch: bool,
    /// Prefer a finer, later-discovered mismatch path over a coarser,
    /// earlier one. Changes only the reported path, never the result.
    pub defer_fails: bool,
}

/// Renders roots for assert-mode diagnostics.
///
/// The default rendering is the nodes' `Debug` output; embedders with a
/// real script printer can underline the mismatch path.
pub trait ScriptPrinter {
    /// Renders `root`, optionally underlining `path`.
    fn script(&self, root: &Value, path: Option<&ObjectPath>) -> String;
}

/// A failed assert-mode structural comparison.
#[derive(Clone, Debug)]
pub struct StructuralMismatch {
    /// Paths to the first mismatch, when tracing recorded one.
    pub first_mismatch: Option<ObjectPathPair>,
    message: String,
}

impl core::fmt::Display for StructuralMismatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.message)
    }
}

impl core::error::Error for StructuralMismatch {}

/// One unit of deferred comparison work.
enum Task {
    Compare {
        lhs: ObjectRef,
        rhs: ObjectRef,
        map_free_vars: bool,
        current_paths: Option<ObjectPathPair>,
        children_expanded: bool,
        graph_equal: bool,
    },
    /// Fails with `current_paths` without comparing anything.
    ForceFail { current_paths: ObjectPathPair },
}

/// The structural-equality engine. One instance serves one top-level
/// comparison at a time; all state is reset on entry.
pub struct SEqualHandler<'r> {
    registry: &'r ReducerRegistry,
    config: SEqualConfig,
    printer: Option<&'r dyn ScriptPrinter>,
    first_mismatch: Option<ObjectPathPair>,
    pending_tasks: Vec<Task>,
    task_stack: Vec<Task>,
    allow_push_to_stack: bool,
    equal_map_lhs: HashMap<usize, ObjectRef>,
    equal_map_rhs: HashMap<usize, ObjectRef>,
}

impl<'r> SEqualHandler<'r> {
    /// Creates an engine over `registry`.
    #[must_use]
    pub fn new(registry: &'r ReducerRegistry, config: SEqualConfig) -> Self {
        Self {
            registry,
            config,
            printer: None,
            first_mismatch: None,
            pending_tasks: Vec::new(),
            task_stack: Vec::new(),
            allow_push_to_stack: true,
            equal_map_lhs: HashMap::new(),
            equal_map_rhs: HashMap::new(),
        }
    }

    /// Uses `printer` to render roots in assert-mode diagnostics.
    #[must_use]
    pub fn with_printer(mut self, printer: &'r dyn ScriptPrinter) -> Self {
        self.printer = Some(printer);
        self
    }

    /// Compares `lhs` and `rhs` structurally.
    ///
    /// Returns `Ok(result)`; in assert mode a failed comparison becomes an
    /// `Err` carrying a rendered diagnostic instead of `Ok(false)`.
    pub fn equal(
        &mut self,
        lhs: &Value,
        rhs: &Value,
        map_free_vars: bool,
    ) -> Result<bool, StructuralMismatch> {
        self.task_stack.clear();
        self.pending_tasks.clear();
        self.equal_map_lhs.clear();
        self.equal_map_rhs.clear();
        self.first_mismatch = None;
        self.allow_push_to_stack = true;

        let current_paths = if self.config.trace_mismatch {
            let root = ObjectPath::root();
            Some(ObjectPathPair::new(root.clone(), root))
        } else {
            None
        };

        let result = self.equal_impl(lhs, rhs, map_free_vars, current_paths);
        if self.config.assert_mode && !result {
            return Err(self.build_mismatch(lhs, rhs));
        }
        Ok(result)
    }

    fn equal_impl(
        &mut self,
        lhs: &Value,
        rhs: &Value,
        map_free_vars: bool,
        current_paths: Option<ObjectPathPair>,
    ) -> bool {
        if !lhs.same_tag(rhs) {
            return self.check_result(false, current_paths);
        }
        let (Some(lhs_obj), Some(rhs_obj)) = (lhs.as_object(), rhs.as_object()) else {
            // Same-tag non-object values compare bitwise.
            if lhs.prim_bitwise_equal(rhs) {
                return true;
            }
            return self.check_result(false, current_paths);
        };

        if !self.se_equal_reduce(Some(lhs_obj), Some(rhs_obj), map_free_vars, current_paths) {
            return false;
        }
        assert!(self.allow_push_to_stack, "stack pushes must be enabled at the top level");
        assert_eq!(
            self.pending_tasks.len(),
            1,
            "top-level reduction must enqueue exactly one task"
        );
        if let Some(task) = self.pending_tasks.pop() {
            self.task_stack.push(task);
        }
        self.run_tasks()
    }

    /// Reduces a pair of optional child objects, applying the early-result
    /// rules before enqueuing a comparison task.
    pub(crate) fn se_equal_reduce(
        &mut self,
        lhs: Option<&ObjectRef>,
        rhs: Option<&ObjectRef>,
        map_free_vars: bool,
        current_paths: Option<ObjectPathPair>,
    ) -> bool {
        // Identity (`same_as`) is deliberately not an early-out: with free
        // variable remapping, two shared vars can be mapped across each
        // other, and the surrounding trees then mean different things.
        let early: Option<bool> = match (lhs, rhs) {
            (None, None) => Some(true),
            (None, Some(_)) | (Some(_), None) => Some(false),
            (Some(l), Some(r)) => {
                if l.node_type_id() != r.node_type_id() {
                    Some(false)
                } else if let Some(mapped) = self.equal_map_lhs.get(&l.addr()) {
                    Some(mapped.same_as(r))
                } else if self.equal_map_rhs.contains_key(&r.addr()) {
                    Some(false)
                } else {
                    None
                }
            }
        };

        match early {
            Some(true) => true,
            Some(false) => {
                if self.is_path_tracing_enabled() && self.config.defer_fails {
                    if let Some(paths) = current_paths {
                        // Postpone: a finer mismatch discovered in a sibling
                        // subtree should win over this one.
                        self.defer_fail(paths);
                        return true;
                    }
                }
                self.check_result(false, current_paths)
            }
            None => {
                // A cloned pair is safe to hold: the early rules proved both
                // are objects.
                if let (Some(l), Some(r)) = (lhs, rhs) {
                    self.pending_tasks.push(Task::Compare {
                        lhs: l.clone(),
                        rhs: r.clone(),
                        map_free_vars,
                        current_paths,
                        children_expanded: false,
                        graph_equal: false,
                    });
                }
                true
            }
        }
    }

    /// Enqueues a task that fails with `paths` once it reaches the top of
    /// the stack.
    pub(crate) fn defer_fail(&mut self, paths: ObjectPathPair) {
        self.pending_tasks.push(Task::ForceFail {
            current_paths: paths,
        });
    }

    pub(crate) fn is_fail_deferral_enabled(&self) -> bool {
        self.config.defer_fails
    }

    pub(crate) fn is_path_tracing_enabled(&self) -> bool {
        self.config.trace_mismatch
    }

    /// Marks the task currently being expanded as a graph node.
    ///
    /// # Panics
    ///
    /// Panics when called outside a reducer expansion.
    pub(crate) fn mark_graph_node(&mut self) {
        assert!(
            !self.allow_push_to_stack,
            "graph nodes can only be marked during reducer expansion"
        );
        match self.task_stack.last_mut() {
            Some(Task::Compare { graph_equal, .. }) => *graph_equal = true,
            _ => panic!("graph nodes can only be marked during reducer expansion"),
        }
    }

    pub(crate) fn map_lhs_to_rhs(&self, obj: &ObjectRef) -> ObjectRef {
        self.equal_map_lhs
            .get(&obj.addr())
            .cloned()
            .unwrap_or_else(|| obj.clone())
    }

    pub(crate) fn record_mismatch(&mut self, paths: ObjectPathPair) {
        if self.first_mismatch.is_none() {
            self.first_mismatch = Some(paths);
        }
    }

    fn check_result(&mut self, result: bool, current_paths: Option<ObjectPathPair>) -> bool {
        if self.is_path_tracing_enabled() && !result && self.first_mismatch.is_none() {
            if let Some(paths) = current_paths {
                self.first_mismatch = Some(paths);
            }
        }
        result
    }

    fn dispatch(
        &mut self,
        lhs: &ObjectRef,
        rhs: &ObjectRef,
        map_free_vars: bool,
        current_paths: Option<ObjectPathPair>,
    ) -> bool {
        debug_assert_eq!(lhs.node_type_id(), rhs.node_type_id());
        // Skip entries that already have equality maps.
        if let Some(mapped) = self.equal_map_lhs.get(&lhs.addr()) {
            let ok = mapped.same_as(rhs);
            return self.check_result(ok, current_paths);
        }
        if self.equal_map_rhs.contains_key(&rhs.addr()) {
            return self.check_result(false, current_paths);
        }
        let registry = self.registry;
        let mut equal = SEqualReducer::new(self, current_paths.clone(), map_free_vars);
        let ok = registry.reduce(lhs, rhs, &mut equal);
        self.check_result(ok, current_paths)
    }

    fn run_tasks(&mut self) -> bool {
        while let Some(task) = self.task_stack.pop() {
            match task {
                Task::ForceFail { current_paths } => {
                    return self.check_result(false, Some(current_paths));
                }
                Task::Compare {
                    lhs,
                    rhs,
                    graph_equal,
                    children_expanded: true,
                    ..
                } => {
                    // All children passed; the pair is equal.
                    if let Some(mapped) = self.equal_map_lhs.get(&lhs.addr()) {
                        assert!(
                            mapped.same_as(&rhs),
                            "lhs -> rhs equality map diverged during traversal"
                        );
                    }
                    if graph_equal {
                        self.equal_map_lhs.insert(lhs.addr(), rhs.clone());
                        self.equal_map_rhs.insert(rhs.addr(), lhs);
                    }
                }
                Task::Compare {
                    lhs,
                    rhs,
                    map_free_vars,
                    current_paths,
                    children_expanded: false,
                    graph_equal,
                } => {
                    // Re-push as expanded before dispatch so the reducer can
                    // mark it as a graph node.
                    self.task_stack.push(Task::Compare {
                        lhs: lhs.clone(),
                        rhs: rhs.clone(),
                        map_free_vars,
                        current_paths: current_paths.clone(),
                        children_expanded: true,
                        graph_equal,
                    });
                    debug_assert!(self.pending_tasks.is_empty());
                    self.allow_push_to_stack = false;
                    let ok = self.dispatch(&lhs, &rhs, map_free_vars, current_paths);
                    self.allow_push_to_stack = true;
                    if !ok {
                        return false;
                    }
                    // Reverse order: earlier-enqueued children expand first.
                    while let Some(pending) = self.pending_tasks.pop() {
                        self.task_stack.push(pending);
                    }
                }
            }
        }
        true
    }

    /// Returns the recorded first mismatch, if any.
    #[must_use]
    pub fn first_mismatch(&self) -> Option<&ObjectPathPair> {
        self.first_mismatch.as_ref()
    }

    /// Takes the recorded first mismatch, if any.
    pub fn take_first_mismatch(&mut self) -> Option<ObjectPathPair> {
        self.first_mismatch.take()
    }

    fn render(&self, root: &Value, path: Option<&ObjectPath>) -> String {
        match self.printer {
            Some(printer) => printer.script(root, path),
            None => format!("{root:?}"),
        }
    }

    fn build_mismatch(&self, lhs: &Value, rhs: &Value) -> StructuralMismatch {
        let mut message = String::from("StructuralEqual check failed, caused by lhs");
        match &self.first_mismatch {
            Some(pair) => {
                message.push_str(&format!(
                    " at {}:\n{}\nand rhs at {}:\n{}",
                    pair.lhs_path(),
                    self.render(lhs, Some(pair.lhs_path())),
                    pair.rhs_path(),
                    self.render(rhs, Some(pair.rhs_path())),
                ));
            }
            None => {
                message.push_str(&format!(
                    ":\n{}\nand rhs:\n{}",
                    self.render(lhs, None),
                    self.render(rhs, None),
                ));
            }
        }
        StructuralMismatch {
            first_mismatch: self.first_mismatch.clone(),
            message,
        }
    }
}

/// Compares two values structurally. No tracing, no deferral.
#[must_use]
pub fn structural_equal(
    registry: &ReducerRegistry,
    lhs: &Value,
    rhs: &Value,
    map_free_vars: bool,
) -> bool {
    let mut handler = SEqualHandler::new(registry, SEqualConfig::default());
    handler.equal(lhs, rhs, map_free_vars).unwrap_or(false)
}

/// Returns the paths to the first structural mismatch between `lhs` and
/// `rhs`, or `None` when they are equal. Fail deferral is enabled so the
/// finest mismatch in traversal order is reported.
#[must_use]
pub fn first_structural_mismatch(
    registry: &ReducerRegistry,
    lhs: &Value,
    rhs: &Value,
    map_free_vars: bool,
) -> Option<ObjectPathPair> {
    let mut handler = SEqualHandler::new(
        registry,
        SEqualConfig {
            assert_mode: false,
            trace_mismatch: true,
            defer_fails: true,
        },
    );
    let equal = handler.equal(lhs, rhs, map_free_vars).unwrap_or(false);
    let mismatch = handler.take_first_mismatch();
    debug_assert_eq!(equal, mismatch.is_none());
    mismatch
}

/// Compares two values structurally, returning a rendered diagnostic on
/// mismatch. Deferral is enabled for the highest-resolution path.
pub fn assert_structural_equal(
    registry: &ReducerRegistry,
    lhs: &Value,
    rhs: &Value,
    map_free_vars: bool,
) -> Result<(), StructuralMismatch> {
    let mut handler = SEqualHandler::new(
        registry,
        SEqualConfig {
            assert_mode: true,
            trace_mismatch: true,
            defer_fails: true,
        },
    );
    handler.equal(lhs, rhs, map_free_vars).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{IntImm, Tuple};
    use alloc::format;
    use alloc::vec;
    use tensor_vm::dtype::DataType;

    fn int32(v: i64) -> crate::object::ObjectRef {
        IntImm::new(DataType::int(32, 1), v)
    }

    #[test]
    fn primitive_roots_compare_bitwise() {
        let reg = ReducerRegistry::with_builtin_nodes();
        assert!(structural_equal(&reg, &Value::Int(3), &Value::Int(3), false));
        assert!(!structural_equal(&reg, &Value::Int(3), &Value::Int(4), false));
        assert!(!structural_equal(&reg, &Value::Int(3), &Value::Float(3.0), false));
        assert!(structural_equal(&reg, &Value::None, &Value::None, false));
        assert!(!structural_equal(&reg, &Value::None, &Value::Int(0), false));
        assert!(structural_equal(
            &reg,
            &Value::Float(f64::NAN),
            &Value::Float(f64::NAN),
            false
        ));
    }

    #[test]
    fn mismatched_primitive_roots_record_the_root_path() {
        let reg = ReducerRegistry::with_builtin_nodes();
        let pair = first_structural_mismatch(&reg, &Value::Int(3), &Value::Int(4), false).unwrap();
        assert_eq!(format!("{}", pair.lhs_path()), "<root>");
    }

    #[test]
    fn no_mismatch_is_recorded_on_success() {
        let reg = ReducerRegistry::with_builtin_nodes();
        let lhs = Tuple::new(vec![int32(1), int32(2)]);
        let rhs = Tuple::new(vec![int32(1), int32(2)]);
        assert!(first_structural_mismatch(&reg, &lhs.into(), &rhs.into(), false).is_none());
    }

    #[test]
    fn assert_mode_renders_a_diagnostic() {
        let reg = ReducerRegistry::with_builtin_nodes();
        let err = assert_structural_equal(&reg, &int32(3).into(), &int32(4).into(), false)
            .unwrap_err();
        let rendered = format!("{err}");
        assert!(rendered.starts_with("StructuralEqual check failed, caused by lhs at <root>.value"));
        assert!(rendered.contains("and rhs at <root>.value"));
        assert!(err.first_mismatch.is_some());
    }

    #[test]
    fn assert_mode_without_paths_prints_the_values() {
        let reg = ReducerRegistry::with_builtin_nodes();
        let mut handler = SEqualHandler::new(
            &reg,
            SEqualConfig {
                assert_mode: true,
                trace_mismatch: false,
                defer_fails: false,
            },
        );
        let err = handler
            .equal(&Value::Int(3), &Value::Int(4), false)
            .unwrap_err();
        assert!(format!("{err}").contains("caused by lhs:\n"));
        assert!(err.first_mismatch.is_none());
    }

    #[test]
    fn handler_state_resets_between_calls() {
        let reg = ReducerRegistry::with_builtin_nodes();
        let mut handler = SEqualHandler::new(
            &reg,
            SEqualConfig {
                assert_mode: false,
                trace_mismatch: true,
                defer_fails: true,
            },
        );
        assert!(!handler.equal(&int32(1).into(), &int32(2).into(), false).unwrap());
        assert!(handler.first_mismatch().is_some());
        assert!(handler.equal(&int32(1).into(), &int32(1).into(), false).unwrap());
        assert!(handler.first_mismatch().is_none());
    }

    struct TaggedPrinter;

    impl ScriptPrinter for TaggedPrinter {
        fn script(&self, root: &Value, _path: Option<&ObjectPath>) -> String {
            format!("<<{root:?}>>")
        }
    }

    #[test]
    fn diagnostics_render_through_the_printer() {
        let reg = ReducerRegistry::with_builtin_nodes();
        let printer = TaggedPrinter;
        let mut handler = SEqualHandler::new(
            &reg,
            SEqualConfig {
                assert_mode: true,
                trace_mismatch: true,
                defer_fails: true,
            },
        )
        .with_printer(&printer);
        let err = handler
            .equal(&Value::Int(3), &Value::Int(4), false)
            .unwrap_err();
        assert!(format!("{err}").contains("<<Int(3)>>"));
    }
}
