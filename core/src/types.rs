//! Dynamic value model and type specifications.
//!
//! The matcher validates untyped values coming from embedders (scripting
//! bridges, config files, host handles). This module defines the closed
//! [`Value`] enum those embedders hand over, the [`Class`] hierarchy used for
//! instance-of checks, and the declarative [`TypeSpec`] describing an
//! acceptable value shape.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Shared reference to a [`Class`].
pub type ClassRef = Arc<Class>;

/// A named constructor with an optional parent.
///
/// Identity is pointer identity: two classes with the same name are still
/// distinct unless they are the same allocation.
///
/// # Examples
///
/// ```
/// use cli_john_core::{Class, Value};
///
/// let base = Class::new("Base");
/// let derived = Class::extending("Derived", &base);
///
/// let obj = Value::instance(&derived);
/// assert!(obj.is_instance_of(&base));
/// assert!(obj.is_instance_of(&derived));
/// assert!(!Value::instance(&base).is_instance_of(&derived));
/// ```
#[derive(Debug)]
pub struct Class {
    name: String,
    parent: Option<ClassRef>,
}

impl Class {
    /// Creates a root class.
    pub fn new(name: impl Into<String>) -> ClassRef {
        Arc::new(Self {
            name: name.into(),
            parent: None,
        })
    }

    /// Creates a class whose instances are also instances of `parent`.
    pub fn extending(name: impl Into<String>, parent: &ClassRef) -> ClassRef {
        Arc::new(Self {
            name: name.into(),
            parent: Some(Arc::clone(parent)),
        })
    }

    /// Returns the class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parent class, if any.
    pub fn parent(&self) -> Option<&ClassRef> {
        self.parent.as_ref()
    }

    /// Returns `true` if `other` is this class or one of its ancestors.
    pub fn derives_from(self: &Arc<Self>, other: &ClassRef) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if Arc::ptr_eq(class, other) {
                return true;
            }
            current = class.parent.as_ref();
        }
        false
    }
}

type CallableFn = dyn Fn(&[Value]) -> Value + Send + Sync;

/// A named callable value.
///
/// Equality is pointer identity, like function identity in the host
/// scripting model.
#[derive(Clone)]
pub struct Callable {
    name: String,
    func: Arc<CallableFn>,
}

impl Callable {
    /// Wraps a closure as a callable value.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Returns the callable's name (may be empty for anonymous functions).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the callable.
    pub fn call(&self, args: &[Value]) -> Value {
        (self.func)(args)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({})", self.name)
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

/// An object: an optional class plus ordered named fields.
#[derive(Debug, Clone, Default)]
pub struct Object {
    /// Constructor the object was created from (`None` for plain objects).
    pub class: Option<ClassRef>,
    /// Named fields, ordered by key.
    pub fields: BTreeMap<String, Value>,
}

impl Object {
    /// Creates a plain object with no class.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Returns a field by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        let same_class = match (&self.class, &other.class) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_class && self.fields == other.fields
    }
}

/// An untyped value handed to the matcher.
///
/// # Examples
///
/// ```
/// use cli_john_core::Value;
///
/// assert_eq!(Value::from("x").category(), "string");
/// assert_eq!(Value::from(3).category(), "number");
/// assert_eq!(Value::Null.category(), "object");
/// assert_eq!(Value::from(vec!["a", "b"]).category(), "object");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value.
    #[default]
    Undefined,
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Floating-point number.
    Number(f64),
    /// Arbitrary-precision integer (bounded to `i128` here).
    BigInt(i128),
    /// UTF-8 string.
    String(String),
    /// Unique symbol, identified by its description.
    Symbol(String),
    /// Ordered list of values.
    Array(Vec<Value>),
    /// Object with optional class.
    Object(Object),
    /// Plain function.
    Function(Callable),
    /// Constructor reference.
    Class(ClassRef),
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Value {
    /// Creates an empty object instance of `class`.
    pub fn instance(class: &ClassRef) -> Self {
        Value::Object(Object {
            class: Some(Arc::clone(class)),
            fields: BTreeMap::new(),
        })
    }

    /// Wraps a closure as a function value.
    pub fn function<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Value::Function(Callable::new(name, func))
    }

    /// Returns the primitive category tag of this value.
    ///
    /// Arrays, objects and `null` are all `"object"`; functions and classes
    /// are `"function"`.
    pub fn category(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Null | Value::Array(_) | Value::Object(_) => "object",
            Value::Function(_) | Value::Class(_) => "function",
        }
    }

    /// Returns `true` if this is an object created from `class` or a
    /// subclass of it.
    pub fn is_instance_of(&self, class: &ClassRef) -> bool {
        match self {
            Value::Object(Object {
                class: Some(own), ..
            }) => own.derives_from(class),
            _ => false,
        }
    }

    /// Returns the string slice if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the array elements if this is an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the object if this is an object.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Truthiness in the host scripting model.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::BigInt(n) => *n != 0,
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Invokes the value if it is a function; other values yield `undefined`.
    pub fn call(&self, args: &[Value]) -> Value {
        match self {
            Value::Function(f) => f.call(args),
            _ => Value::Undefined,
        }
    }

    /// Stable string encoding used when a non-string value has to stand in
    /// for a name.
    ///
    /// Strings are returned verbatim; everything else is JSON-encoded.
    ///
    /// ```
    /// use cli_john_core::Value;
    ///
    /// assert_eq!(Value::from("deploy").to_stable_string(), "deploy");
    /// assert_eq!(Value::from(42).to_stable_string(), "42");
    /// assert_eq!(Value::from(vec!["a"]).to_stable_string(), r#"["a"]"#);
    /// ```
    pub fn to_stable_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => serde_json::to_string(other).unwrap_or_else(|_| other.category().to_string()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Undefined | Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::BigInt(n) => serializer.serialize_str(&n.to_string()),
            Value::String(s) => serializer.serialize_str(s),
            Value::Symbol(desc) => serializer.serialize_str(&format!("Symbol({desc})")),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(obj) => {
                let mut map = serializer.serialize_map(Some(obj.fields.len()))?;
                for (key, value) in &obj.fields {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Value::Function(f) => serializer.serialize_str(&format!("[Function: {}]", f.name())),
            Value::Class(c) => serializer.serialize_str(&format!("[class {}]", c.name())),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(obj)
    }
}

impl From<ClassRef> for Value {
    fn from(class: ClassRef) -> Self {
        Value::Class(class)
    }
}

/// Declarative description of an acceptable value shape.
///
/// - [`TypeSpec::Tag`] holds a category tag, a custom-handler name, or a
///   `|`-delimited union of those.
/// - [`TypeSpec::Class`] matches instances of a class (or its subclasses).
/// - [`TypeSpec::AnyOf`] is a union of specs evaluated in declaration order.
///
/// # Examples
///
/// ```
/// use cli_john_core::{Class, TypeSpec};
///
/// let spec = TypeSpec::from("string|number");
/// assert!(matches!(spec, TypeSpec::Tag(_)));
///
/// let widget = Class::new("Widget");
/// let spec = TypeSpec::any_of([TypeSpec::from("undefined"), TypeSpec::from(&widget)]);
/// assert_eq!(spec.branches().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSpec {
    /// Category tag, handler name, or pipe-delimited union string.
    Tag(String),
    /// Class reference (instance-of check).
    Class(ClassRef),
    /// Ordered union of specs.
    AnyOf(Vec<TypeSpec>),
}

impl TypeSpec {
    /// Builds an ordered union.
    pub fn any_of(specs: impl IntoIterator<Item = TypeSpec>) -> Self {
        TypeSpec::AnyOf(specs.into_iter().collect())
    }

    /// Normalizes to a list: a bare spec becomes a singleton.
    pub fn branches(&self) -> &[TypeSpec] {
        match self {
            TypeSpec::AnyOf(list) => list,
            single => std::slice::from_ref(single),
        }
    }

    /// Converts an untyped value into a spec.
    ///
    /// Strings become tags, classes become class references and arrays become
    /// unions. Anything else is not a spec and yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(TypeSpec::Tag(s.clone())),
            Value::Class(c) => Some(TypeSpec::Class(Arc::clone(c))),
            Value::Array(items) => items
                .iter()
                .map(TypeSpec::from_value)
                .collect::<Option<Vec<_>>>()
                .map(TypeSpec::AnyOf),
            _ => None,
        }
    }
}

impl From<&str> for TypeSpec {
    fn from(s: &str) -> Self {
        TypeSpec::Tag(s.to_string())
    }
}

impl From<String> for TypeSpec {
    fn from(s: String) -> Self {
        TypeSpec::Tag(s)
    }
}

impl From<&ClassRef> for TypeSpec {
    fn from(class: &ClassRef) -> Self {
        TypeSpec::Class(Arc::clone(class))
    }
}

impl From<ClassRef> for TypeSpec {
    fn from(class: ClassRef) -> Self {
        TypeSpec::Class(class)
    }
}

impl From<Vec<TypeSpec>> for TypeSpec {
    fn from(specs: Vec<TypeSpec>) -> Self {
        TypeSpec::AnyOf(specs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_follows_typeof() {
        assert_eq!(Value::Undefined.category(), "undefined");
        assert_eq!(Value::Bool(true).category(), "boolean");
        assert_eq!(Value::BigInt(7).category(), "bigint");
        assert_eq!(Value::Symbol("s".into()).category(), "symbol");
        assert_eq!(Value::Object(Object::new()).category(), "object");
        assert_eq!(Value::function("f", |_| Value::Undefined).category(), "function");
        assert_eq!(Value::Class(Class::new("C")).category(), "function");
    }

    #[test]
    fn test_instance_of_walks_parent_chain() {
        let a = Class::new("A");
        let b = Class::extending("B", &a);
        let c = Class::extending("C", &b);
        let unrelated = Class::new("A");

        let obj = Value::instance(&c);
        assert!(obj.is_instance_of(&a));
        assert!(obj.is_instance_of(&b));
        assert!(!obj.is_instance_of(&unrelated));
        assert!(!Value::from("A").is_instance_of(&a));
    }

    #[test]
    fn test_stable_string_encodes_objects_as_json() {
        let obj = Object::new().with_field("b", 2).with_field("a", "x");
        assert_eq!(Value::from(obj).to_stable_string(), r#"{"a":"x","b":2}"#);
        assert_eq!(Value::Number(1.5).to_stable_string(), "1.5");
        assert_eq!(Value::Null.to_stable_string(), "null");
        assert_eq!(Value::Bool(false).to_stable_string(), "false");
    }

    #[test]
    fn test_spec_from_value_rejects_non_specs() {
        assert_eq!(
            TypeSpec::from_value(&Value::from("string")),
            Some(TypeSpec::from("string"))
        );
        assert!(TypeSpec::from_value(&Value::from(3)).is_none());
        assert!(TypeSpec::from_value(&Value::from(vec![Value::from("a"), Value::Null])).is_none());
        assert!(matches!(
            TypeSpec::from_value(&Value::from(vec!["a", "b"])),
            Some(TypeSpec::AnyOf(list)) if list.len() == 2
        ));
    }

    #[test]
    fn test_callable_identity() {
        let f = Callable::new("f", |_| Value::Bool(true));
        let g = f.clone();
        let h = Callable::new("f", |_| Value::Bool(true));
        assert_eq!(f, g);
        assert_ne!(f, h);
        assert_eq!(f.call(&[]), Value::Bool(true));
    }
}
