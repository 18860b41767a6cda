//! Process-wide registry handle.
//!
//! A [`RegistryContext`] is constructed explicitly and cloned wherever the
//! registry is needed. Initialization, reload and teardown each hold the
//! write lock for their whole duration, so readers never see a half-built
//! registry.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{RegistryError, Result};
use crate::registry::{CalculatorRegistry, InitSummary};

#[derive(Debug, Clone, Default)]
pub struct RegistryContext {
    inner: Arc<RwLock<CalculatorRegistry>>,
}

impl RegistryContext {
    pub fn new(registry: CalculatorRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Initialize on first use.
    ///
    /// Returns the summary when this call performed the initialization and
    /// `None` when another caller already had.
    pub fn ensure_initialized(&self) -> Result<Option<InitSummary>> {
        if self.read()?.is_initialized() {
            return Ok(None);
        }
        let mut registry = self.write()?;
        // Another caller may have won the race for the write lock.
        if registry.is_initialized() {
            return Ok(None);
        }
        Ok(Some(registry.initialize()))
    }

    pub fn reload(&self) -> Result<InitSummary> {
        Ok(self.write()?.reload())
    }

    pub fn teardown(&self) -> Result<()> {
        self.write()?.teardown();
        Ok(())
    }

    pub fn read(&self) -> Result<RwLockReadGuard<'_, CalculatorRegistry>> {
        self.inner.read().map_err(|_| RegistryError::Poisoned)
    }

    pub fn write(&self) -> Result<RwLockWriteGuard<'_, CalculatorRegistry>> {
        self.inner.write().map_err(|_| RegistryError::Poisoned)
    }
}
