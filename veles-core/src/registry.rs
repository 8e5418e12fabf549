//! Type registry for jsonclass decoding
//!
//! Tags come in two forms. A bare name such as `Point` is a *local* name and
//! is looked up by the type's bare class name. A dotted name such as
//! `geometry.Point` is looked up by the full path the type registered under.
//! Nothing is ever loaded by name at runtime; a tag that no registered type
//! claims is a hard decode failure.
//!
//! Types are registered at startup and never removed.

use crate::error::Result;
use crate::object::{Construct, ConstructorArgs, JsonClass};
use std::collections::HashMap;

/// Builds a boxed instance from tag constructor arguments
pub type Constructor = fn(ConstructorArgs) -> Result<Box<dyn JsonClass>>;

fn construct_boxed<T: Construct>(args: ConstructorArgs) -> Result<Box<dyn JsonClass>> {
    Ok(Box::new(T::construct(args)?))
}

/// Mapping from type tags to constructors
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    local: HashMap<String, Constructor>,
    qualified: HashMap<String, Constructor>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under its bare class name and, when dotted, its full path
    ///
    /// ```rust
    /// # use veles_core::{Construct, ConstructorArgs, JsonClass, TypeRegistry};
    /// # #[derive(Debug, Clone)]
    /// # struct Point;
    /// # impl JsonClass for Point { fn class_name(&self) -> &str { Self::CLASS_NAME } }
    /// # impl Construct for Point {
    /// #     const CLASS_NAME: &'static str = "geometry.Point";
    /// #     fn construct(_: ConstructorArgs) -> veles_core::Result<Self> { Ok(Point) }
    /// # }
    /// let mut registry = TypeRegistry::new();
    /// registry.register::<Point>();
    ///
    /// assert!(registry.resolve("Point").is_some());
    /// assert!(registry.resolve("geometry.Point").is_some());
    /// assert!(registry.resolve("other.Point").is_none());
    /// ```
    pub fn register<T: Construct>(&mut self) {
        self.register_constructor(T::CLASS_NAME, construct_boxed::<T>);
    }

    /// Register a constructor under an explicit tag
    pub fn register_constructor(&mut self, class_name: &str, constructor: Constructor) {
        let bare = bare_name(class_name);
        tracing::debug!(class_name = %class_name, "Registering jsonclass type");
        self.local.insert(bare.to_string(), constructor);
        if bare != class_name {
            self.qualified.insert(class_name.to_string(), constructor);
        }
    }

    /// Resolve a tag: bare names locally, dotted names by full path
    pub fn resolve(&self, class_name: &str) -> Option<Constructor> {
        if class_name.contains('.') {
            self.qualified.get(class_name).copied()
        } else {
            self.local.get(class_name).copied()
        }
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.resolve(class_name).is_some()
    }

    /// Registered bare names, sorted
    pub fn local_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.local.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.local.len()
    }

    pub fn is_empty(&self) -> bool {
        self.local.is_empty()
    }
}

/// Last dotted segment of a tag
pub fn bare_name(class_name: &str) -> &str {
    class_name.rsplit('.').next().unwrap_or(class_name)
}
