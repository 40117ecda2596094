//! `ExtensionRegistry`: id-keyed lookup over an [`ActivationManager`] (not
//! specified by the base format, added because a complete system needs a way
//! to find a loaded extension by its declared `extension_id` rather than by
//! registration order).

use super::manager::ActivationManager;
use crate::config::ActivationConfig;
use crate::error::{LefError, LefResult};
use crate::extension::ExtensionModel;
use std::collections::HashMap;
use std::sync::Arc;

pub struct ExtensionRegistry {
    manager: ActivationManager,
    index_by_id: HashMap<u32, usize>,
}

impl ExtensionRegistry {
    pub fn new(config: &ActivationConfig) -> Self {
        Self {
            manager: ActivationManager::new(config),
            index_by_id: HashMap::new(),
        }
    }

    pub fn manager(&self) -> &ActivationManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut ActivationManager {
        &mut self.manager
    }

    pub fn register(&mut self, ext: Arc<ExtensionModel>) -> LefResult<()> {
        let id = ext.header.extension_id;
        if self.index_by_id.contains_key(&id) {
            return Err(LefError::InvalidArgument(format!(
                "extension id {id} is already registered"
            )));
        }
        self.manager.register(ext);
        self.index_by_id.insert(id, self.manager.len() - 1);
        Ok(())
    }

    /// Remove the extension registered under `id`. The parallel vectors in
    /// [`ActivationManager`] compact on removal, so every index recorded
    /// after the removed one shifts down by one.
    pub fn unregister(&mut self, id: u32) -> bool {
        let Some(idx) = self.index_by_id.remove(&id) else {
            return false;
        };
        if let Some(ext) = self.manager.extension(idx).cloned() {
            self.manager.unregister(&ext);
        }
        for v in self.index_by_id.values_mut() {
            if *v > idx {
                *v -= 1;
            }
        }
        true
    }

    pub fn contains(&self, id: u32) -> bool {
        self.index_by_id.contains_key(&id)
    }

    pub fn get(&self, id: u32) -> Option<&Arc<ExtensionModel>> {
        self.index_by_id.get(&id).and_then(|&i| self.manager.extension(i))
    }

    pub fn list(&self) -> Vec<u32> {
        self.index_by_id.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.index_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_by_id.is_empty()
    }
}
