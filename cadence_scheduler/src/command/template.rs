//! Reusable command descriptions.
//!
//! A [`CommandTemplate`] produces a fresh command instance for every run.
//! Clones share identity: scheduling a template whose previous run is still
//! active is a no-op, and cancelling a template cancels that run.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::command::Command;
use crate::error::{BindingError, CompositionError};

type Factory = dyn Fn() -> Result<Box<dyn Command>, CompositionError>;

/// Identity shared by all clones of one template.
///
/// Drawn from a process-wide counter, so keys are never reused even after
/// the template is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateKey(u64);

impl TemplateKey {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Named factory for fresh command runs.
#[derive(Clone)]
pub struct CommandTemplate {
    key: TemplateKey,
    name: Rc<str>,
    factory: Rc<Factory>,
}

impl CommandTemplate {
    /// Template over an infallible factory.
    pub fn new<C, F>(name: impl Into<String>, factory: F) -> Self
    where
        C: Command + 'static,
        F: Fn() -> C + 'static,
    {
        Self {
            key: TemplateKey::next(),
            name: Rc::from(name.into()),
            factory: Rc::new(move || Ok(Box::new(factory()) as Box<dyn Command>)),
        }
    }

    /// Template over a factory that composes groups.
    ///
    /// The factory is invoked once here so composition errors surface at
    /// startup instead of at first schedule.
    pub fn try_new<C, F>(name: impl Into<String>, factory: F) -> Result<Self, CompositionError>
    where
        C: Command + 'static,
        F: Fn() -> Result<C, CompositionError> + 'static,
    {
        factory()?;
        Ok(Self {
            key: TemplateKey::next(),
            name: Rc::from(name.into()),
            factory: Rc::new(move || factory().map(|c| Box::new(c) as Box<dyn Command>)),
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn key(&self) -> TemplateKey {
        self.key
    }

    /// Build a fresh run.
    pub fn instantiate(&self) -> Result<Box<dyn Command>, CompositionError> {
        (self.factory)()
    }
}

impl fmt::Debug for CommandTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTemplate")
            .field("name", &self.name)
            .field("key", &self.key())
            .finish()
    }
}

/// Named templates available to the binding table.
#[derive(Debug, Clone, Default)]
pub struct CommandCatalog {
    templates: Vec<CommandTemplate>,
}

impl CommandCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template, replacing any previous entry with the same name.
    pub fn insert(&mut self, template: CommandTemplate) -> &mut Self {
        self.templates.retain(|t| t.name() != template.name());
        self.templates.push(template);
        self
    }

    pub fn get(&self, name: &str) -> Option<&CommandTemplate> {
        self.templates.iter().find(|t| t.name() == name)
    }

    pub fn resolve(&self, name: &str) -> Result<&CommandTemplate, BindingError> {
        self.get(name)
            .ok_or_else(|| BindingError::UnknownCommand(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|t| t.name())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
