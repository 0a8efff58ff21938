use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::data_loader::{ManyToOneDataLoader, OneToManyDataLoader};
use super::errors::EagerLoadError;

/// Owner of every data loader created during one materialization cycle.
///
/// Loaders are keyed by relation path. Partial queries borrow the node and
/// only ever add loaders through [`StorageNode::set_many_to_one_data_loader`]
/// or its one-to-many twin, both of which keep the first loader for a key.
#[derive(Default)]
pub struct StorageNode {
    many_to_one: RefCell<HashMap<String, Rc<ManyToOneDataLoader>>>,
    one_to_many: RefCell<HashMap<String, Rc<OneToManyDataLoader>>>,
}

impl StorageNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_many_to_one_data_loader(&self, key: &str) -> bool {
        self.many_to_one.borrow().contains_key(key)
    }

    pub fn many_to_one_data_loader(&self, key: &str) -> Result<Rc<ManyToOneDataLoader>, EagerLoadError> {
        self.many_to_one
            .borrow()
            .get(key)
            .cloned()
            .ok_or_else(|| EagerLoadError::LoaderNotRegistered {
                key: key.to_string(),
            })
    }

    /// Store `loader` under `key` unless one is already there. Returns the
    /// loader now registered.
    pub fn set_many_to_one_data_loader(
        &self,
        key: &str,
        loader: ManyToOneDataLoader,
    ) -> Rc<ManyToOneDataLoader> {
        let mut loaders = self.many_to_one.borrow_mut();
        Rc::clone(loaders.entry(key.to_string()).or_insert_with(|| {
            debug!("Registered many-to-one loader '{}': {}", key, loader.sql());
            Rc::new(loader)
        }))
    }

    pub fn has_one_to_many_data_loader(&self, key: &str) -> bool {
        self.one_to_many.borrow().contains_key(key)
    }

    pub fn one_to_many_data_loader(&self, key: &str) -> Result<Rc<OneToManyDataLoader>, EagerLoadError> {
        self.one_to_many
            .borrow()
            .get(key)
            .cloned()
            .ok_or_else(|| EagerLoadError::LoaderNotRegistered {
                key: key.to_string(),
            })
    }

    pub fn set_one_to_many_data_loader(
        &self,
        key: &str,
        loader: OneToManyDataLoader,
    ) -> Rc<OneToManyDataLoader> {
        let mut loaders = self.one_to_many.borrow_mut();
        Rc::clone(loaders.entry(key.to_string()).or_insert_with(|| {
            debug!("Registered one-to-many loader '{}': {}", key, loader.sql());
            Rc::new(loader)
        }))
    }

    /// Number of registered loaders, both kinds
    pub fn len(&self) -> usize {
        self.many_to_one.borrow().len() + self.one_to_many.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
