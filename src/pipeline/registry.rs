// src/pipeline/registry.rs

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::errors::TransformError;
use crate::pipeline::asset::{Asset, StepOptions};
use crate::pipeline::processors;

/// A single named transformation over one asset.
///
/// Implementations must be stateless: the same input and options always
/// produce the same output. Options are opaque to the orchestrator; each
/// processor reads and validates its own keys.
pub trait Processor: Send + Sync {
    fn name(&self) -> &'static str;

    fn process(&self, asset: Asset, options: &StepOptions) -> Result<Asset, TransformError>;

    /// If true, the step emits a copy of the current asset to the output
    /// directory instead of transforming it.
    fn is_snapshot(&self) -> bool {
        false
    }
}

/// One configured step: processor name plus its options.
#[derive(Debug, Clone)]
pub struct StepSpec {
    pub processor: String,
    pub options: StepOptions,
}

impl StepSpec {
    pub fn new(processor: impl Into<String>, options: StepOptions) -> Self {
        Self {
            processor: processor.into(),
            options,
        }
    }
}

/// Name -> processor lookup used by every task run.
#[derive(Clone, Default)]
pub struct TransformRegistry {
    processors: BTreeMap<&'static str, Arc<dyn Processor>>,
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("processors", &self.processors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TransformRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every processor shipped with assetdag.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for processor in processors::builtin() {
            registry.register(processor);
        }
        registry
    }

    /// Add (or replace) a processor under its own name.
    pub fn register(&mut self, processor: Arc<dyn Processor>) {
        self.processors.insert(processor.name(), processor);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.processors.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.processors.keys().copied()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Processor>> {
        self.processors.get(name)
    }

    /// Fold `steps` over `asset`, left to right.
    ///
    /// Returns every asset to be written: snapshots taken by `write` steps in
    /// order, then the final asset. The first failing step aborts the chain.
    pub fn apply(&self, steps: &[StepSpec], asset: Asset) -> Result<Vec<Asset>, TransformError> {
        let mut emitted = Vec::new();
        let mut current = asset;

        for step in steps {
            let processor = self.get(&step.processor).ok_or_else(|| {
                TransformError::new(&current.source, &step.processor, "unknown processor")
            })?;

            if processor.is_snapshot() {
                trace!(path = ?current.path, "snapshot emitted mid-pipeline");
                emitted.push(current.clone());
                continue;
            }

            trace!(step = %step.processor, path = ?current.path, "applying step");
            current = processor.process(current, &step.options)?;
        }

        emitted.push(current);
        Ok(emitted)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    struct Upper;

    impl Processor for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }

        fn process(&self, mut asset: Asset, _options: &StepOptions) -> Result<Asset, TransformError> {
            asset.contents = asset.contents.to_ascii_uppercase();
            Ok(asset)
        }
    }

    struct Broken;

    impl Processor for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn process(&self, asset: Asset, _options: &StepOptions) -> Result<Asset, TransformError> {
            Err(asset.fail(self.name(), "malformed input"))
        }
    }

    fn registry() -> TransformRegistry {
        let mut registry = TransformRegistry::builtin();
        registry.register(Arc::new(Upper));
        registry.register(Arc::new(Broken));
        registry
    }

    fn asset() -> Asset {
        Asset::new(PathBuf::from("/src/a.txt"), PathBuf::from("a.txt"), b"hello".to_vec())
    }

    fn step(name: &str) -> StepSpec {
        StepSpec::new(name, StepOptions::default())
    }

    #[test]
    fn steps_run_in_declared_order_with_snapshots() {
        let rename = StepSpec::new(
            "rename",
            StepOptions::from_toml("suffix = \".min\"").unwrap(),
        );
        let out = registry()
            .apply(&[step("write"), step("upper"), rename], asset())
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].path, PathBuf::from("a.txt"));
        assert_eq!(out[0].contents, b"hello");
        assert_eq!(out[1].path, PathBuf::from("a.min.txt"));
        assert_eq!(out[1].contents, b"HELLO");
    }

    #[test]
    fn failing_step_aborts_the_chain() {
        let err = registry()
            .apply(&[step("upper"), step("broken"), step("write")], asset())
            .unwrap_err();
        assert_eq!(err.step, "broken");
        assert_eq!(err.path, PathBuf::from("/src/a.txt"));
    }

    #[test]
    fn empty_step_list_is_a_copy() {
        let out = registry().apply(&[], asset()).unwrap();
        assert_eq!(out, vec![asset()]);
    }
}
