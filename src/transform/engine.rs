//! Compiled jq query cache.
//!
//! # Responsibilities
//! - Compile query text once, at registration time
//! - Store compiled programs under opaque handles for the process lifetime
//! - Execute a stored program against a JSON value, enforcing the
//!   single-result contract
//!
//! # Design Decisions
//! - Handles are generated UUIDs; entries are never evicted
//! - Registration happens during startup; execution is concurrent and
//!   read-only, so the map only needs to serialize structural mutation
//! - A query must produce exactly one value: zero, an error value, or a
//!   second value are all distinct failures

use std::fmt;

use dashmap::DashMap;
use jaq_interpret::{Ctx, Filter, FilterT, ParseCtx, RcIter, Val};
use thiserror::Error;
use uuid::Uuid;

/// Opaque identifier of a compiled query stored in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransformHandle(Uuid);

impl TransformHandle {
    /// Allocate a fresh, unique handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransformHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransformHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Query text failed to compile. Fatal at startup for configured routes.
#[derive(Debug, Clone, Error)]
pub enum CompileError {
    /// The query text is not valid jq syntax.
    #[error("failed to parse query: {0}")]
    Parse(String),

    /// The query references names unknown to the standard definitions.
    #[error("query references {count} undefined name(s)")]
    Undefined { count: usize },
}

/// A stored program could not produce the single value the adapter requires.
#[derive(Debug, Clone, Error)]
pub enum ExecError {
    /// No program is registered under this handle.
    #[error("transformation for handle {0} not found")]
    NotFound(TransformHandle),

    /// The program produced no output values.
    #[error("transform {0} generated an empty result")]
    EmptyResult(TransformHandle),

    /// The program's first output was an evaluation error.
    #[error("transform {handle} failed: {cause}")]
    EvaluationFailed {
        handle: TransformHandle,
        cause: String,
    },

    /// The program produced more than one output value.
    #[error("transform {0} generated multiple results")]
    MultipleResults(TransformHandle),
}

/// Keeps a set of pre-compiled jq queries ready for execution.
#[derive(Default)]
pub struct TransformCache {
    programs: DashMap<TransformHandle, Filter>,
}

impl TransformCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            programs: DashMap::new(),
        }
    }

    /// Compile `query` and store it under `handle` for later execution.
    pub fn add(&self, handle: TransformHandle, query: &str) -> Result<(), CompileError> {
        let (main, errs) = jaq_parse::parse(query, jaq_parse::main());
        if !errs.is_empty() {
            let causes: Vec<String> = errs.iter().map(ToString::to_string).collect();
            return Err(CompileError::Parse(causes.join("; ")));
        }
        let main = main.ok_or_else(|| CompileError::Parse("query is empty".to_string()))?;

        let mut defs = ParseCtx::new(Vec::new());
        defs.insert_natives(jaq_core::core());
        defs.insert_defs(jaq_std::std());
        let program = defs.compile(main);
        if !defs.errs.is_empty() {
            return Err(CompileError::Undefined {
                count: defs.errs.len(),
            });
        }

        self.programs.insert(handle, program);
        Ok(())
    }

    /// Run the program stored under `handle` against `input`.
    ///
    /// Returns the single value the program produced. Safe to call from many
    /// request tasks concurrently.
    pub fn execute(
        &self,
        handle: TransformHandle,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, ExecError> {
        let program = self.programs.get(&handle).ok_or(ExecError::NotFound(handle))?;

        let inputs = RcIter::new(core::iter::empty());
        let mut outputs = program.run((Ctx::new([], &inputs), Val::from(input)));

        let first = match outputs.next() {
            None => return Err(ExecError::EmptyResult(handle)),
            Some(Err(e)) => {
                return Err(ExecError::EvaluationFailed {
                    handle,
                    cause: e.to_string(),
                })
            }
            Some(Ok(val)) => val,
        };

        if outputs.next().is_some() {
            return Err(ExecError::MultipleResults(handle));
        }

        Ok(serde_json::Value::from(first))
    }

    /// Number of stored programs.
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    /// Whether the cache holds no programs.
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}
