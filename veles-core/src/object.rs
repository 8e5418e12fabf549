//! Native value model for the jsonclass object codec
//!
//! `Object` is what callers hand to the codec and what the codec hands back.
//! It mirrors JSON with two additions: a `Tuple` container, which encodes
//! exactly like a list, and `Instance`, an arbitrary value that knows how to
//! describe itself through the [`JsonClass`] trait.
//!
//! # Serializable types
//!
//! A type becomes taggable by implementing [`JsonClass`]. It becomes
//! reconstructible on decode by also implementing [`Construct`] and being
//! registered in a [`TypeRegistry`](crate::TypeRegistry).
//!
//! ```rust
//! use veles_core::{Construct, ConstructorArgs, JsonClass, Object, Serialized};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Point {
//!     x: i64,
//!     y: i64,
//! }
//!
//! impl JsonClass for Point {
//!     fn class_name(&self) -> &str {
//!         Self::CLASS_NAME
//!     }
//!
//!     fn serialize(&self, method: &str) -> Option<Serialized> {
//!         (method == "_serialize").then(|| Serialized::positional(vec![self.x.into(), self.y.into()]))
//!     }
//! }
//!
//! impl Construct for Point {
//!     const CLASS_NAME: &'static str = "Point";
//!
//!     fn construct(args: ConstructorArgs) -> veles_core::Result<Self> {
//!         Ok(Point { x: args.get(0, "x")?, y: args.get(1, "y")? })
//!     }
//! }
//!
//! let point = Object::instance(Point { x: 1, y: 2 });
//! assert_eq!(point.as_instance().unwrap().downcast_ref::<Point>(), Some(&Point { x: 1, y: 2 }));
//! ```

use crate::error::{Error, Result};
use downcast_rs::Downcast;
use dyn_clone::DynClone;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Constructor arguments carried in a tag: `[typeTag, constructorArgs]`
#[derive(Debug, Clone, PartialEq)]
pub enum ConstructorArgs {
    Positional(Vec<Value>),
    Keyword(Map<String, Value>),
}

impl ConstructorArgs {
    /// Interpret the second element of a tag
    ///
    /// Anything other than an array or an object is a translation error.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => Ok(ConstructorArgs::Positional(items.clone())),
            Value::Object(map) => Ok(ConstructorArgs::Keyword(map.clone())),
            _ => Err(Error::Translation(
                "Constructor args must be a dict or list.".into(),
            )),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            ConstructorArgs::Positional(items) => Value::Array(items.clone()),
            ConstructorArgs::Keyword(map) => Value::Object(map.clone()),
        }
    }

    /// Raw argument by position or by keyword, whichever form was sent
    pub fn lookup(&self, index: usize, name: &str) -> Option<&Value> {
        match self {
            ConstructorArgs::Positional(items) => items.get(index),
            ConstructorArgs::Keyword(map) => map.get(name),
        }
    }

    /// Typed argument by position or by keyword
    pub fn get<T: DeserializeOwned>(&self, index: usize, name: &str) -> Result<T> {
        let value = self.lookup(index, name).ok_or_else(|| {
            Error::Translation(format!("Missing constructor argument {} ({}).", name, index))
        })?;
        serde_json::from_value(value.clone()).map_err(|e| {
            Error::Translation(format!("Invalid constructor argument {}: {}", name, e))
        })
    }

    pub fn len(&self) -> usize {
        match self {
            ConstructorArgs::Positional(items) => items.len(),
            ConstructorArgs::Keyword(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ConstructorArgs {
    fn default() -> Self {
        ConstructorArgs::Positional(Vec::new())
    }
}

/// Output of a custom serializer: constructor args plus extra attributes
///
/// Both parts are merged into the tagged envelope verbatim. Attribute values
/// are not run through the codec again.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Serialized {
    pub args: ConstructorArgs,
    pub attributes: Map<String, Value>,
}

impl Serialized {
    pub fn positional(args: Vec<Value>) -> Self {
        Self {
            args: ConstructorArgs::Positional(args),
            attributes: Map::new(),
        }
    }

    pub fn keyword(args: Map<String, Value>) -> Self {
        Self {
            args: ConstructorArgs::Keyword(args),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }
}

/// A value the object codec can tag
///
/// Every method but `class_name` has a default, so a type picks one of two
/// encodings:
///
/// - **Custom serializer**: return `Some` from `serialize` for the configured
///   serializer name (`_serialize` by default).
/// - **Attribute fallback**: return its attributes from `attributes`. The
///   codec keeps the ones holding plain values, skips names listed by
///   `ignored`, and drops nested instances.
pub trait JsonClass: Downcast + DynClone + Debug + Send + Sync {
    /// Type tag: `module.ClassName`, or a bare `ClassName` for a local type
    fn class_name(&self) -> &str;

    /// Custom serializer looked up under the configured `serialize_method` name
    ///
    /// Return `None` when this type offers no serializer under `method`.
    fn serialize(&self, _method: &str) -> Option<Serialized> {
        None
    }

    /// Attribute names to leave out, looked up under the configured `ignore_attribute` name
    fn ignored(&self, _attribute: &str) -> Vec<String> {
        Vec::new()
    }

    /// Attributes used by the fallback encoding
    fn attributes(&self) -> Vec<(String, Object)> {
        Vec::new()
    }

    /// Assign an attribute after construction
    ///
    /// Return `false` if the type has no such attribute. The decoder then
    /// keeps the value on the surrounding [`Instance`] as an extra.
    fn set_attribute(&mut self, _name: &str, _value: Value) -> bool {
        false
    }
}

downcast_rs::impl_downcast!(JsonClass);
dyn_clone::clone_trait_object!(JsonClass);

/// A `JsonClass` type that can be rebuilt from a tag
pub trait Construct: JsonClass + Sized {
    /// Type tag this type registers under
    const CLASS_NAME: &'static str;

    fn construct(args: ConstructorArgs) -> Result<Self>;
}

/// A tagged value plus the attributes it did not absorb
#[derive(Debug, Clone)]
pub struct Instance {
    object: Box<dyn JsonClass>,
    extra: Map<String, Value>,
}

impl Instance {
    pub fn new(object: impl JsonClass) -> Self {
        Self::from_box(Box::new(object))
    }

    pub fn from_box(object: Box<dyn JsonClass>) -> Self {
        Self {
            object,
            extra: Map::new(),
        }
    }

    pub fn class_name(&self) -> &str {
        self.object.class_name()
    }

    pub fn object(&self) -> &dyn JsonClass {
        self.object.as_ref()
    }

    pub fn downcast_ref<T: JsonClass>(&self) -> Option<&T> {
        self.object.as_ref().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: JsonClass>(&mut self) -> Option<&mut T> {
        self.object.as_mut().downcast_mut::<T>()
    }

    /// Attributes assigned on decode that the type did not take
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Assign an attribute, falling back to `extra`
    pub fn set_attribute(&mut self, name: &str, value: Value) {
        if !self.object.set_attribute(name, value.clone()) {
            self.extra.insert(name.to_string(), value);
        }
    }

    pub fn into_inner(self) -> Box<dyn JsonClass> {
        self.object
    }
}

impl PartialEq for Instance {
    /// Structural comparison: same tag, same attributes, same extras
    fn eq(&self, other: &Self) -> bool {
        self.class_name() == other.class_name()
            && self.object.attributes() == other.object.attributes()
            && self.extra == other.extra
    }
}

/// Native value handed to and returned from the object codec
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Object {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    Str(String),
    List(Vec<Object>),
    /// Fixed-size sequence; encodes as a JSON array
    Tuple(Vec<Object>),
    Map(BTreeMap<String, Object>),
    Instance(Instance),
}

impl Object {
    pub fn instance(value: impl JsonClass) -> Self {
        Object::Instance(Instance::new(value))
    }

    pub fn tuple<T: Into<Object>>(items: impl IntoIterator<Item = T>) -> Self {
        Object::Tuple(items.into_iter().map(Into::into).collect())
    }

    pub fn map<K: Into<String>, V: Into<Object>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Object::Map(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Name of the variant, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Object::Null => "null",
            Object::Bool(_) => "bool",
            Object::Number(_) => "number",
            Object::Str(_) => "str",
            Object::List(_) => "list",
            Object::Tuple(_) => "tuple",
            Object::Map(_) => "map",
            Object::Instance(_) => "instance",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Object::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Object::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Object::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Object::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Convert to JSON without tagging
    ///
    /// Fails with `Error::Serialization` if an instance is reached; use
    /// `jsonclass::dump` for graphs that contain instances.
    pub fn to_plain(&self) -> Result<Value> {
        Ok(match self {
            Object::Null => Value::Null,
            Object::Bool(b) => Value::Bool(*b),
            Object::Number(n) => Value::Number(n.clone()),
            Object::Str(s) => Value::String(s.clone()),
            Object::List(items) | Object::Tuple(items) => {
                Value::Array(items.iter().map(Object::to_plain).collect::<Result<_>>()?)
            }
            Object::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), v.to_plain()?)))
                    .collect::<Result<_>>()?,
            ),
            Object::Instance(instance) => {
                return Err(Error::Serialization(format!(
                    "Object of type {} is not JSON serializable",
                    instance.class_name()
                )))
            }
        })
    }
}

impl From<Value> for Object {
    /// Plain structural conversion; `__jsonclass__` tags are not interpreted
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Object::Null,
            Value::Bool(b) => Object::Bool(b),
            Value::Number(n) => Object::Number(n),
            Value::String(s) => Object::Str(s),
            Value::Array(items) => Object::List(items.into_iter().map(Object::from).collect()),
            Value::Object(map) => {
                Object::Map(map.into_iter().map(|(k, v)| (k, Object::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Object {
    fn from(b: bool) -> Self {
        Object::Bool(b)
    }
}

macro_rules! object_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Object {
            fn from(n: $t) -> Self {
                Object::Number(Number::from(n))
            }
        })*
    };
}

object_from_int!(i32, i64, u32, u64, usize);

impl From<f64> for Object {
    /// Non-finite floats have no JSON form and become null
    fn from(f: f64) -> Self {
        Number::from_f64(f).map(Object::Number).unwrap_or(Object::Null)
    }
}

impl From<&str> for Object {
    fn from(s: &str) -> Self {
        Object::Str(s.to_string())
    }
}

impl From<String> for Object {
    fn from(s: String) -> Self {
        Object::Str(s)
    }
}

impl<T: Into<Object>> From<Vec<T>> for Object {
    fn from(items: Vec<T>) -> Self {
        Object::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Object>> From<BTreeMap<String, T>> for Object {
    fn from(map: BTreeMap<String, T>) -> Self {
        Object::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Object>> From<Option<T>> for Object {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Object::Null)
    }
}

impl From<Instance> for Object {
    fn from(instance: Instance) -> Self {
        Object::Instance(instance)
    }
}
