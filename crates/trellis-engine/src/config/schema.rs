//! Configuration schema (§4.E): the shape of a root or extension
//! configuration document before it is resolved and validated.

use std::collections::HashMap;

use serde::Deserialize;

use crate::transform::{TransformationClass, TriggerClass};

/// One transformation set: a name plus the path (relative to the config
/// path, §6) of the document declaring its transformations.
#[derive(Debug, Clone, Deserialize)]
pub struct SetSpec {
    pub name: String,
    pub path: String,
}

/// One declared group (§4.E): a name, the class path implementing it, and
/// its class/trigger pair.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupSpec {
    pub name: String,
    #[serde(default)]
    pub class: String,
    pub kind: TransformationClass,
    pub trigger: TriggerClass,
    /// Whether this group is a block transformation (§4.D.4) — rejected in
    /// combination with `trigger = translation-unit`.
    #[serde(default)]
    pub block: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RootConfig {
    pub version: String,
    #[serde(default)]
    pub sets: Vec<SetSpec>,
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// An extension configuration amends a root rather than replacing it
/// wholesale (§4.E, GLOSSARY): absent fields leave the root's value
/// untouched, present ones replace it outright.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtensionConfig {
    pub sets: Option<Vec<SetSpec>>,
    pub groups: Option<Vec<GroupSpec>>,
    #[serde(default)]
    pub params: HashMap<String, String>,
}
