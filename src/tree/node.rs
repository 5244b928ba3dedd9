//! tree::node
//!
//! The `Setting | Group` sum type.

use std::rc::Weak;

use serde_json::{Map, Value};

use super::events::Event;
use super::group::{Group, GroupInner};
use super::setting::Setting;
use super::TreeError;
use crate::persistor::{PersistOptions, Persistor, PersistorResult, Sources};

/// A node of the tree: a leaf setting or a group.
///
/// Equality is identity: two nodes are equal when they are the same
/// setting or the same group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Setting(Setting),
    Group(Group),
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Setting(setting) => setting.name(),
            Node::Group(group) => group.name(),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Node::Setting(setting) => setting.path(),
            Node::Group(group) => group.path(),
        }
    }

    pub fn path_segments(&self) -> Vec<String> {
        match self {
            Node::Setting(setting) => setting.path_segments(),
            Node::Group(group) => group.path_segments(),
        }
    }

    pub fn parent(&self) -> Option<Group> {
        match self {
            Node::Setting(setting) => setting.parent(),
            Node::Group(group) => group.parent(),
        }
    }

    /// Ancestor groups, topmost first.
    pub fn ancestors(&self) -> Vec<Group> {
        let mut ancestors = Vec::new();
        let mut current = self.parent();
        while let Some(group) = current {
            current = group.parent();
            ancestors.push(group);
        }
        ancestors.reverse();
        ancestors
    }

    pub(crate) fn set_parent(&self, parent: Weak<GroupInner>) {
        match self {
            Node::Setting(setting) => setting.set_parent(parent),
            Node::Group(group) => group.set_parent(parent),
        }
    }

    pub fn tags(&self) -> Vec<String> {
        match self {
            Node::Setting(setting) => setting.tags(),
            Node::Group(group) => group.tags(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        match self {
            Node::Setting(setting) => setting.has_tag(tag),
            Node::Group(group) => group.has_tag(tag),
        }
    }

    /// Whether the node or any of its ancestors carries `tag`.
    pub fn has_tag_inherited(&self, tag: &str) -> bool {
        match self {
            Node::Setting(setting) => setting.has_tag_inherited(tag),
            Node::Group(group) => group.has_tag_inherited(tag),
        }
    }

    pub fn add_tag(&self, tag: impl Into<String>) -> bool {
        match self {
            Node::Setting(setting) => setting.add_tag(tag),
            Node::Group(group) => group.add_tag(tag),
        }
    }

    pub fn remove_tag(&self, tag: &str) -> bool {
        match self {
            Node::Setting(setting) => setting.remove_tag(tag),
            Node::Group(group) => group.remove_tag(tag),
        }
    }

    pub fn as_setting(&self) -> Option<&Setting> {
        match self {
            Node::Setting(setting) => Some(setting),
            Node::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Node::Group(group) => Some(group),
            Node::Setting(_) => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Node::Group(_))
    }

    pub fn invoke_event(&self, event: &Event) -> anyhow::Result<()> {
        match self {
            Node::Setting(setting) => setting.invoke_event(event),
            Node::Group(group) => group.invoke_event(event),
        }
    }

    /// Serialize the node and, for groups, the whole subtree.
    pub fn to_document(&self) -> Value {
        match self {
            Node::Setting(setting) => setting.to_document(),
            Node::Group(group) => group.to_document(),
        }
    }

    pub fn load(&self, sources: impl Into<Sources>, options: PersistOptions<'_>) -> PersistorResult {
        Persistor::load(std::slice::from_ref(self), sources.into(), options)
    }

    pub fn save(&self, sources: impl Into<Sources>, options: PersistOptions<'_>) -> PersistorResult {
        Persistor::save(std::slice::from_ref(self), sources.into(), options)
    }
}

impl From<Setting> for Node {
    fn from(setting: Setting) -> Self {
        Node::Setting(setting)
    }
}

impl From<Group> for Node {
    fn from(group: Group) -> Self {
        Node::Group(group)
    }
}

impl From<&Setting> for Node {
    fn from(setting: &Setting) -> Self {
        Node::Setting(setting.clone())
    }
}

impl From<&Group> for Node {
    fn from(group: &Group) -> Self {
        Node::Group(group.clone())
    }
}

/// The `tags` list of a stored node; absent means none.
pub(crate) fn document_tags(doc: &Map<String, Value>) -> Result<Vec<String>, TreeError> {
    match doc.get("tags") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(tags)) => tags
            .iter()
            .map(|tag| {
                tag.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| TreeError::InvalidDocument("tags must be strings".into()))
            })
            .collect(),
        Some(_) => Err(TreeError::InvalidDocument("'tags' must be a list".into())),
    }
}
