//! Typed attribute values carried by plugin descriptors

use crate::foundation::math::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to another plugin instance, optionally to one of its outputs
///
/// An empty reference is the valid "no plugin" value and is distinct from
/// the attribute being absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttrPlugin {
    /// Name of the referenced plugin instance; empty means unset
    pub plugin: String,
    /// Named output of the referenced plugin; `None` selects its default output
    pub output: Option<String>,
}

impl AttrPlugin {
    /// Reference the default output of a plugin
    pub fn new(plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            output: None,
        }
    }

    /// The "no plugin" sentinel
    pub fn empty() -> Self {
        Self::default()
    }

    /// Select a named output of the referenced plugin
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Whether this is the "no plugin" sentinel
    pub fn is_empty(&self) -> bool {
        self.plugin.is_empty()
    }
}

impl fmt::Display for AttrPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.output {
            Some(output) => write!(f, "{}::{}", self.plugin, output),
            None => write!(f, "{}", self.plugin),
        }
    }
}

/// Declared type of a schema attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttrKind {
    /// Boolean flag
    Bool,
    /// Integer or enum value
    Int,
    /// Scalar float
    Float,
    /// String or file path
    String,
    /// RGB color
    Color,
    /// RGBA color
    AColor,
    /// 3-component vector
    Vector,
    /// 4x4 transform
    Matrix,
    /// Plugin reference
    Plugin,
    /// Ordered list of values
    List,
}

impl AttrKind {
    /// The value an attribute of this kind takes when nothing else is known
    pub fn zero_value(self) -> AttrValue {
        match self {
            Self::Bool => AttrValue::Bool(false),
            Self::Int => AttrValue::Int(0),
            Self::Float => AttrValue::Float(0.0),
            Self::String => AttrValue::String(String::new()),
            Self::Color => AttrValue::Color(Vec3::zeros()),
            Self::AColor => AttrValue::AColor(Vec4::zeros()),
            Self::Vector => AttrValue::Vector(Vec3::zeros()),
            Self::Matrix => AttrValue::Matrix(Mat4::identity()),
            Self::Plugin => AttrValue::Plugin(AttrPlugin::empty()),
            Self::List => AttrValue::List(Vec::new()),
        }
    }
}

/// A typed attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    /// Boolean flag
    Bool(bool),
    /// Integer or enum value
    Int(i64),
    /// Scalar float
    Float(f32),
    /// String or file path
    String(String),
    /// RGB color
    Color(Vec3),
    /// RGBA color
    AColor(Vec4),
    /// 3-component vector
    Vector(Vec3),
    /// 4x4 transform
    Matrix(Mat4),
    /// Reference to another plugin
    Plugin(AttrPlugin),
    /// Ordered list of values (texture lists and the like)
    List(Vec<AttrValue>),
}

impl AttrValue {
    /// Kind of this value
    pub fn kind(&self) -> AttrKind {
        match self {
            Self::Bool(_) => AttrKind::Bool,
            Self::Int(_) => AttrKind::Int,
            Self::Float(_) => AttrKind::Float,
            Self::String(_) => AttrKind::String,
            Self::Color(_) => AttrKind::Color,
            Self::AColor(_) => AttrKind::AColor,
            Self::Vector(_) => AttrKind::Vector,
            Self::Matrix(_) => AttrKind::Matrix,
            Self::Plugin(_) => AttrKind::Plugin,
            Self::List(_) => AttrKind::List,
        }
    }

    /// Plugin reference carried by this value, if any
    pub fn as_plugin(&self) -> Option<&AttrPlugin> {
        match self {
            Self::Plugin(plugin) => Some(plugin),
            _ => None,
        }
    }

    /// Float carried by this value; integers are widened
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Int(value) => Some(*value as f32),
            _ => None,
        }
    }

    /// Boolean carried by this value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// String carried by this value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Every plugin reference in this value, descending into lists
    pub fn plugin_refs(&self) -> Vec<&AttrPlugin> {
        match self {
            Self::Plugin(plugin) if !plugin.is_empty() => vec![plugin],
            Self::List(items) => items.iter().flat_map(AttrValue::plugin_refs).collect(),
            _ => Vec::new(),
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f32> for AttrValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Mat4> for AttrValue {
    fn from(value: Mat4) -> Self {
        Self::Matrix(value)
    }
}

impl From<AttrPlugin> for AttrValue {
    fn from(value: AttrPlugin) -> Self {
        Self::Plugin(value)
    }
}
