use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ConsoleError;

type Shared = Arc<dyn Any + Send + Sync>;
type Factory = Box<dyn Fn() -> Shared>;

/// Name-keyed service locator shared by every command of a console.
///
/// Services are registered as factories and constructed lazily: the first
/// `get` for a name runs its factory once and caches the instance for the
/// process lifetime. Lookups for unregistered names fail with
/// `UnknownService` — there is no silent miss.
#[derive(Default)]
pub struct ServiceRegistry {
    factories: HashMap<String, Factory>,
    resolved: RefCell<HashMap<String, Shared>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        ServiceRegistry::default()
    }

    /// Register a lazily-constructed service under `name`. A later
    /// registration under the same name replaces the earlier factory if
    /// the service has not been resolved yet.
    pub fn register<T, F>(&mut self, name: impl Into<String>, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + 'static,
    {
        self.factories
            .insert(name.into(), Box::new(move || Arc::new(factory())));
    }

    /// Register a pre-built instance under `name`.
    pub fn provide<T: Send + Sync + 'static>(&mut self, name: impl Into<String>, value: T) {
        self.resolved
            .get_mut()
            .insert(name.into(), Arc::new(value));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolved.borrow().contains_key(name) || self.factories.contains_key(name)
    }

    /// Resolve the service registered under `name` as a `T`.
    ///
    /// # Errors
    ///
    /// `UnknownService` when no service is registered under `name`, or
    /// when the registered service is not a `T`.
    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, ConsoleError> {
        let cached = self.resolved.borrow().get(name).cloned();
        let shared = match cached {
            Some(shared) => shared,
            None => {
                let factory = self
                    .factories
                    .get(name)
                    .ok_or_else(|| ConsoleError::UnknownService(name.to_string()))?;
                let shared = factory();
                self.resolved
                    .borrow_mut()
                    .insert(name.to_string(), shared.clone());
                shared
            }
        };
        shared.downcast::<T>().map_err(|_| {
            ConsoleError::UnknownService(format!(
                "{name} is registered with a different type"
            ))
        })
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("registered", &self.factories.len())
            .field("resolved", &self.resolved.borrow().len())
            .finish()
    }
}
