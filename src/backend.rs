//! Code-emitting backends.
//!
//! The core stops at the parse table. Emission is the job of backend
//! plugins located by a string key; how a backend is discovered and what it
//! writes are its own business.

use crate::{compile::ProcessedSpec, table::ParseTable, types::Map};

/// Options forwarded verbatim from the specification.
pub type Options = Map<String, String>;

pub trait Backend {
    /// Emit whatever this backend emits. Side effects are the backend's own.
    fn invoke(
        &self,
        spec: &ProcessedSpec,
        table: &ParseTable,
        options: &Options,
    ) -> anyhow::Result<()>;
}

#[derive(Default)]
pub struct BackendRegistry {
    backends: Map<String, Box<dyn Backend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a backend, replacing any previous one under the same name.
    pub fn register(&mut self, name: impl Into<String>, backend: Box<dyn Backend>) {
        self.backends.insert(name.into(), backend);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Backend> {
        self.backends.get(name).map(|backend| &**backend)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.backends.keys().map(String::as_str)
    }
}
