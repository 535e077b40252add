// SPDX-FileCopyrightText: 2026 rgbctrl contributors
//
// SPDX-License-Identifier: BSD-2-Clause

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use rgbctrl_core::{DynResult, Frame};

mod dummy;
#[cfg(feature = "serial")]
mod serial;

pub use dummy::RecordingSink;
#[cfg(feature = "serial")]
pub use serial::SerialSink;

/// How to reach the physical LED hardware.
#[derive(Debug, Clone)]
pub enum SinkAccess {
    Serial { path: String, baud: u32 },
    Dummy,
}

/// Component A's transmit half: turns a rendered [`Frame`] into bytes on
/// the wire. Implementations own whatever connection state they need.
pub trait Transmit: Send {
    fn show<'a>(&'a mut self, frame: &'a Frame)
        -> Pin<Box<dyn Future<Output = DynResult<()>> + Send + 'a>>;
}

pub type SinkFactory = fn(SinkAccess) -> DynResult<Box<dyn Transmit>>;

/// Registry of pluggable transmit backends, selected by name at startup.
#[derive(Clone, Default)]
pub struct SinkRegistry {
    factories: HashMap<String, SinkFactory>,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_sink(&mut self, name: &str, factory: SinkFactory) {
        self.factories.insert(normalize_name(name), factory);
    }

    pub fn is_sink_registered(&self, name: &str) -> bool {
        self.factories.contains_key(&normalize_name(name))
    }

    pub fn registered_sinks(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn build_sink(&self, name: &str, access: SinkAccess) -> DynResult<Box<dyn Transmit>> {
        let key = normalize_name(name);
        let factory = self
            .factories
            .get(&key)
            .ok_or_else(|| format!("unknown pixel sink backend: {name}"))?;
        factory(access)
    }
}

fn normalize_name(name: &str) -> String {
    name.to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Registers every sink backend enabled by this build's features.
pub fn register_builtin_sinks_on(registry: &mut SinkRegistry) {
    registry.register_sink("dummy", dummy_factory);
    #[cfg(feature = "serial")]
    registry.register_sink("serial", serial::serial_factory);
}

fn dummy_factory(_access: SinkAccess) -> DynResult<Box<dyn Transmit>> {
    Ok(Box::new(RecordingSink::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dummy_backend_is_always_registered() {
        let mut registry = SinkRegistry::new();
        register_builtin_sinks_on(&mut registry);
        assert!(registry.is_sink_registered("Dummy"));
    }

    #[test]
    fn unknown_backend_name_errors() {
        let registry = SinkRegistry::new();
        assert!(registry.build_sink("nope", SinkAccess::Dummy).is_err());
    }
}
