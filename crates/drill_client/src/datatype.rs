use std::convert::Infallible;
use std::fmt::Display;
use std::str::FromStr;

use serde::de::Visitor;
use serde::{Deserialize, Serialize};

/// Storage plugin type as reported by `INFORMATION_SCHEMA.SCHEMATA`.
///
/// Only the types that change how schemas are discovered get their own
/// variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PluginType {
    /// Filesystem backed plugins (dfs, s3, classpath...).
    File,
    Mongo,
    Splunk,
    /// Anything else, lower-cased. Usually a relational database (`jdbc`).
    Other(String),
}

impl PluginType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::File => "file",
            Self::Mongo => "mongo",
            Self::Splunk => "splunk",
            Self::Other(s) => s.as_str(),
        }
    }
}

impl FromStr for PluginType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_lowercase();
        let ty = match s.as_str() {
            "file" => Self::File,
            "mongo" => Self::Mongo,
            "splunk" => Self::Splunk,
            _ => Self::Other(s),
        };
        Ok(ty)
    }
}

impl From<&str> for PluginType {
    fn from(value: &str) -> Self {
        match value.parse() {
            Ok(ty) => ty,
            Err(never) => match never {},
        }
    }
}

impl Display for PluginType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PluginType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

struct PluginTypeVisitor;

impl Visitor<'_> for PluginTypeVisitor {
    type Value = PluginType;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("drill storage plugin type")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(PluginType::from(v))
    }
}

impl<'de> Deserialize<'de> for PluginType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(PluginTypeVisitor)
    }
}
