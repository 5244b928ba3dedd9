//! sources::document
//!
//! Reconciling stored documents with in-memory trees.
//!
//! # Document shape
//!
//! A document is a list of root nodes. A setting node is an object with
//! `name` and `value` (plus `type`, `default_value` and optional metadata);
//! a group node is an object with `name` and a `settings` list. A node with
//! both `value` and `settings`, or neither, is malformed. The whole document
//! is checked before anything is loaded or merged.
//!
//! # Reading
//!
//! Stored nodes are matched to in-memory nodes by name, level by level.
//! Only `value` is taken from a matched setting node. Stored nodes with no
//! in-memory counterpart are built from the stored metadata and appended to
//! their group. In-memory nodes with no stored counterpart are reported back
//! and keep their current value.
//!
//! # Writing
//!
//! Each written node replaces the stored node with the same name at the
//! same path, creating ancestor group nodes as needed. The rest of the
//! document is untouched.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::traits::{ModifyDataFn, SourceError};
use crate::tree::{tags, Group, Node, Setting, TreeError, PATH_SEPARATOR};

pub(crate) fn apply_modify_data(
    data: Value,
    modify_data: Option<&ModifyDataFn>,
) -> Result<Value, SourceError> {
    match modify_data {
        Some(modify) => modify(data).map_err(SourceError::modify_data),
        None => Ok(data),
    }
}

/// Check the shape of a whole document, returning its root nodes.
pub fn validate_document(data: &Value) -> Result<&[Value], SourceError> {
    let roots = data
        .as_array()
        .ok_or_else(|| invalid("document must be a list of nodes"))?;
    validate_nodes(roots, None)?;
    Ok(roots)
}

fn validate_nodes(nodes: &[Value], parent: Option<&str>) -> Result<(), SourceError> {
    for node in nodes {
        let node = node.as_object().ok_or_else(|| {
            invalid(format!(
                "expected a node object in {}",
                parent.map_or("the top level".to_string(), |p| format!("'{}'", p))
            ))
        })?;
        let name = node.get("name").and_then(Value::as_str).ok_or_else(|| {
            invalid(format!(
                "node without a string 'name' in {}",
                parent.map_or("the top level".to_string(), |p| format!("'{}'", p))
            ))
        })?;
        let path = match parent {
            Some(parent) => format!("{}{}{}", parent, PATH_SEPARATOR, name),
            None => name.to_string(),
        };

        match (node.get("value"), node.get("settings")) {
            (Some(_), Some(_)) => {
                return Err(invalid(format!(
                    "'{}' has both 'value' and 'settings'",
                    path
                )))
            }
            (None, None) => {
                return Err(invalid(format!(
                    "'{}' has neither 'value' nor 'settings'",
                    path
                )))
            }
            (Some(_), None) => {}
            (None, Some(Value::Array(children))) => validate_nodes(children, Some(path.as_str()))?,
            (None, Some(_)) => {
                return Err(invalid(format!("'settings' of '{}' must be a list", path)))
            }
        }
    }
    Ok(())
}

/// Find the stored node at a `/`-separated path.
pub fn find_path<'a>(
    data: &'a Value,
    path: &str,
) -> Result<Option<&'a Map<String, Value>>, SourceError> {
    let roots = validate_document(data)?;
    let segments: Vec<String> = path.split(PATH_SEPARATOR).map(str::to_string).collect();
    locate(roots, &segments)
}

// =============================================================================
// Reading
// =============================================================================

pub(crate) fn read_nodes(data: &Value, nodes: &[Node]) -> Result<Vec<Node>, SourceError> {
    let roots = validate_document(data)?;
    let mut not_loaded = Vec::new();

    for node in nodes {
        if node.has_tag_inherited(tags::IGNORE_LOAD) {
            continue;
        }
        match locate(roots, &node.path_segments())? {
            Some(stored) => reconcile(node, stored, &mut not_loaded)?,
            None => collect_not_loaded(node, &mut not_loaded),
        }
    }

    Ok(not_loaded)
}

fn locate<'a>(
    roots: &'a [Value],
    segments: &[String],
) -> Result<Option<&'a Map<String, Value>>, SourceError> {
    let mut level = roots;
    let mut found = None;

    for (index, segment) in segments.iter().enumerate() {
        let Some(stored) = find_node(level, segment) else {
            return Ok(None);
        };
        if index + 1 < segments.len() {
            match stored.get("settings") {
                Some(Value::Array(children)) => level = children.as_slice(),
                _ => {
                    return Err(kind_mismatch(
                        &segments[..=index].join(&PATH_SEPARATOR.to_string()),
                        "group",
                        "setting",
                    ))
                }
            }
        }
        found = Some(stored);
    }

    Ok(found)
}

fn reconcile(
    node: &Node,
    stored: &Map<String, Value>,
    not_loaded: &mut Vec<Node>,
) -> Result<(), SourceError> {
    match node {
        Node::Setting(setting) => {
            let value = stored
                .get("value")
                .ok_or_else(|| kind_mismatch(&setting.path(), "setting", "group"))?;
            assign_loaded_value(setting, value.clone())?;
        }
        Node::Group(group) => {
            let Some(Value::Array(stored_children)) = stored.get("settings") else {
                return Err(kind_mismatch(&group.path(), "group", "setting"));
            };

            for child in group.children() {
                if child.has_tag(tags::IGNORE_LOAD) {
                    continue;
                }
                match find_node(stored_children, child.name()) {
                    Some(stored_child) => reconcile(&child, stored_child, not_loaded)?,
                    None => collect_not_loaded(&child, not_loaded),
                }
            }

            for stored_child in stored_children.iter().filter_map(Value::as_object) {
                let Some(name) = stored_child.get("name").and_then(Value::as_str) else {
                    continue;
                };
                if group.contains(name) || stored_has_tag(stored_child, tags::IGNORE_LOAD) {
                    continue;
                }
                let materialized = materialize(stored_child)?;
                debug!(path = %group.path(), name, "adding node found only in source");
                group.add([materialized]).map_err(tree_error)?;
            }
        }
    }
    Ok(())
}

/// Build a node, and for groups its whole subtree, from stored data.
fn materialize(stored: &Map<String, Value>) -> Result<Node, SourceError> {
    match stored.get("settings") {
        Some(Value::Array(children)) => {
            let group = Group::from_document(stored).map_err(tree_error)?;
            for child in children.iter().filter_map(Value::as_object) {
                if stored_has_tag(child, tags::IGNORE_LOAD) {
                    continue;
                }
                group.add([materialize(child)?]).map_err(tree_error)?;
            }
            Ok(Node::Group(group))
        }
        _ => {
            let setting = Setting::from_document(stored).map_err(tree_error)?;
            if let Some(value) = stored.get("value") {
                assign_loaded_value(&setting, value.clone())?;
            }
            Ok(Node::Setting(setting))
        }
    }
}

/// Assign a stored value; a value that fails validation is replaced by the
/// default, leaving `is_valid` false. A failing event handler aborts the read.
fn assign_loaded_value(setting: &Setting, value: Value) -> Result<(), SourceError> {
    let handler_error = |error| SourceError::handler(setting.path(), error);
    setting.set_value(value).map_err(handler_error)?;
    if !setting.is_valid() {
        warn!(setting = %setting.path(), "stored value is not valid, using the default");
        setting.reset().map_err(handler_error)?;
    }
    Ok(())
}

fn collect_not_loaded(node: &Node, not_loaded: &mut Vec<Node>) {
    match node {
        Node::Group(group) if !group.is_empty() => {
            for descendant in group
                .walk()
                .include_groups(true)
                .skip_tags([tags::IGNORE_LOAD])
            {
                match &descendant {
                    Node::Group(inner) if !inner.is_empty() => {}
                    _ => not_loaded.push(descendant),
                }
            }
        }
        _ => not_loaded.push(node.clone()),
    }
}

// =============================================================================
// Writing
// =============================================================================

pub(crate) fn merge_nodes(existing: Option<Value>, nodes: &[Node]) -> Result<Value, SourceError> {
    let mut roots = match existing {
        None => Vec::new(),
        Some(Value::Array(roots)) => {
            validate_nodes(&roots, None)?;
            roots
        }
        Some(_) => return Err(invalid("document must be a list of nodes")),
    };

    for node in nodes {
        if node.has_tag_inherited(tags::IGNORE_SAVE) {
            continue;
        }
        let Some(serialized) = serialize(node) else {
            continue;
        };

        let mut level = &mut roots;
        for ancestor in node.ancestors() {
            level = ensure_group(level, &ancestor)?;
        }
        upsert(level, serialized);
    }

    Ok(Value::Array(roots))
}

/// Serialize a node, leaving out `ignore_save` descendants. A group whose
/// children are all left out is itself left out.
fn serialize(node: &Node) -> Option<Value> {
    if node.has_tag(tags::IGNORE_SAVE) {
        return None;
    }
    match node {
        Node::Setting(setting) => Some(setting.to_document()),
        Node::Group(group) => {
            let children = group.children();
            let serialized: Vec<Value> = children.iter().filter_map(serialize).collect();
            if !children.is_empty() && serialized.is_empty() {
                return None;
            }
            let mut doc = group.document_header();
            doc.insert("settings".into(), Value::Array(serialized));
            Some(Value::Object(doc))
        }
    }
}

fn ensure_group<'a>(
    level: &'a mut Vec<Value>,
    group: &Group,
) -> Result<&'a mut Vec<Value>, SourceError> {
    let index = match position(level, group.name()) {
        Some(index) => index,
        None => {
            let mut header = group.document_header();
            header.insert("settings".into(), Value::Array(Vec::new()));
            level.push(Value::Object(header));
            level.len() - 1
        }
    };

    match level[index].get_mut("settings") {
        Some(Value::Array(children)) => Ok(children),
        _ => Err(kind_mismatch(&group.path(), "group", "setting")),
    }
}

fn upsert(level: &mut Vec<Value>, node: Value) {
    let index = node
        .get("name")
        .and_then(Value::as_str)
        .and_then(|name| position(level, name));
    match index {
        Some(index) => level[index] = node,
        None => level.push(node),
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn find_node<'a>(level: &'a [Value], name: &str) -> Option<&'a Map<String, Value>> {
    level
        .iter()
        .filter_map(Value::as_object)
        .find(|node| node.get("name").and_then(Value::as_str) == Some(name))
}

fn position(level: &[Value], name: &str) -> Option<usize> {
    level
        .iter()
        .position(|node| node.get("name").and_then(Value::as_str) == Some(name))
}

fn stored_has_tag(stored: &Map<String, Value>, tag: &str) -> bool {
    stored
        .get("tags")
        .and_then(Value::as_array)
        .is_some_and(|tags| tags.iter().any(|t| t.as_str() == Some(tag)))
}

fn invalid(message: impl Into<String>) -> SourceError {
    SourceError::InvalidFormat(message.into())
}

fn kind_mismatch(path: &str, in_memory: &str, stored: &str) -> SourceError {
    invalid(format!(
        "'{}' is a {} in memory but a {} in the source",
        path, in_memory, stored
    ))
}

fn tree_error(error: TreeError) -> SourceError {
    SourceError::InvalidFormat(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{EventKind, SettingKind};
    use serde_json::json;

    fn string_setting(name: &str, default: &str) -> Setting {
        Setting::builder(name, SettingKind::String)
            .default_value(default)
            .build()
            .expect("valid setting")
    }

    /// root/main/{file_extension, output_directory}, root/advanced/{overwrite_mode}
    fn sample_tree() -> Group {
        let root = Group::new("root").expect("valid");
        let main = Group::new("main").expect("valid");
        main.add([
            string_setting("file_extension", "png"),
            string_setting("output_directory", "/tmp"),
        ])
        .expect("add");
        let advanced = Group::new("advanced").expect("valid");
        advanced
            .add([string_setting("overwrite_mode", "rename")])
            .expect("add");
        root.add([Node::from(main), Node::from(advanced)]).expect("add");
        root
    }

    fn names(nodes: &[Node]) -> Vec<String> {
        nodes.iter().map(Node::path).collect()
    }

    #[test]
    fn validation_rejects_malformed_documents() {
        let cases = [
            json!({"name": "root", "settings": []}),
            json!([["root"]]),
            json!([{"settings": []}]),
            json!([{"name": "a", "value": 1, "settings": []}]),
            json!([{"name": "a"}]),
            json!([{"name": "root", "settings": {"a": 1}}]),
            json!([{"name": "root", "settings": [{"name": "a", "type": "int"}]}]),
        ];
        for case in cases {
            assert!(
                matches!(validate_document(&case), Err(SourceError::InvalidFormat(_))),
                "expected invalid format for {}",
                case
            );
        }
        assert!(validate_document(&json!([])).is_ok());
    }

    #[test]
    fn read_assigns_only_values() {
        let root = sample_tree();
        let data = json!([{"name": "root", "settings": [
            {"name": "main", "settings": [
                {"name": "file_extension", "type": "string", "value": "jpg",
                 "default_value": "bmp", "description": "ignored"}
            ]}
        ]}]);

        let not_loaded = read_nodes(&data, &[Node::from(&root)]).expect("read");

        let extension = root.setting("main/file_extension").expect("setting");
        assert_eq!(extension.value(), json!("jpg"));
        assert_eq!(extension.default_value(), &json!("png"));
        assert_eq!(extension.description(), "File extension");
        assert_eq!(
            names(&not_loaded),
            vec!["root/main/output_directory", "root/advanced/overwrite_mode"]
        );
    }

    #[test]
    fn missing_group_is_expanded_into_leaves() {
        let root = sample_tree();
        let empty = Group::new("empty").expect("valid");
        root.group("advanced").expect("group").add([empty]).expect("add");

        let data = json!([{"name": "root", "settings": []}]);
        let not_loaded = read_nodes(&data, &[Node::from(&root)]).expect("read");

        assert_eq!(
            names(&not_loaded),
            vec![
                "root/main/file_extension",
                "root/main/output_directory",
                "root/advanced/overwrite_mode",
                "root/advanced/empty"
            ]
        );
    }

    #[test]
    fn missing_root_reports_requested_setting() {
        let root = sample_tree();
        let setting = root.setting("main/file_extension").expect("setting");
        let not_loaded = read_nodes(&json!([]), &[Node::from(&setting)]).expect("read");
        assert_eq!(not_loaded, vec![Node::from(setting)]);
    }

    #[test]
    fn ignore_load_keeps_value_and_is_not_reported() {
        let root = sample_tree();
        let main = root.group("main").expect("group");
        main.add_tag(tags::IGNORE_LOAD);
        let data = json!([{"name": "root", "settings": [
            {"name": "advanced", "settings": [
                {"name": "overwrite_mode", "type": "string", "value": "skip"}
            ]}
        ]}]);

        let not_loaded = read_nodes(&data, &[Node::from(&root)]).expect("read");
        assert!(not_loaded.is_empty());

        let extension = root.setting("main/file_extension").expect("setting");
        assert!(read_nodes(&data, &[Node::from(&extension)])
            .expect("read")
            .is_empty());
        assert_eq!(extension.value(), json!("png"));
    }

    #[test]
    fn stored_only_nodes_are_materialized() {
        let root = sample_tree();
        let data = json!([{"name": "root", "settings": [
            {"name": "main", "settings": [
                {"name": "file_extension", "type": "string", "value": "jpg"},
                {"name": "quality", "type": "integer", "value": 80,
                 "default_value": 90, "min_value": 0, "max_value": 100}
            ]},
            {"name": "extra", "tags": ["custom"], "settings": [
                {"name": "flag", "type": "bool", "value": true},
                {"name": "hidden", "type": "bool", "value": true, "tags": ["ignore_load"]}
            ]},
            {"name": "skipped", "tags": ["ignore_load"], "settings": []}
        ]}]);

        read_nodes(&data, &[Node::from(&root)]).expect("read");

        let quality = root.setting("main/quality").expect("materialized");
        assert_eq!(quality.value(), json!(80));
        assert_eq!(quality.default_value(), &json!(90));
        assert_eq!(quality.type_name(), "int");

        let extra = root.group("extra").expect("materialized");
        assert!(extra.has_tag("custom"));
        assert_eq!(root.setting("extra/flag").expect("setting").value(), json!(true));
        assert!(!extra.contains("hidden"));
        assert!(!root.contains("skipped"));

        let order: Vec<String> = root.children().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(order, vec!["main", "advanced", "extra"]);
    }

    #[test]
    fn unknown_type_is_invalid_format() {
        let root = sample_tree();
        let data = json!([{"name": "root", "settings": [
            {"name": "mystery", "type": "colour", "value": "red"}
        ]}]);
        assert!(matches!(
            read_nodes(&data, &[Node::from(&root)]),
            Err(SourceError::InvalidFormat(_))
        ));
    }

    #[test]
    fn kind_mismatch_is_invalid_format() {
        let root = sample_tree();
        let setting_stored_as_group = json!([{"name": "root", "settings": [
            {"name": "main", "settings": [{"name": "file_extension", "settings": []}]}
        ]}]);
        assert!(matches!(
            read_nodes(&setting_stored_as_group, &[Node::from(&root)]),
            Err(SourceError::InvalidFormat(_))
        ));

        let group_stored_as_setting = json!([{"name": "root", "settings": [
            {"name": "main", "type": "string", "value": "x"}
        ]}]);
        let setting = root.setting("main/file_extension").expect("setting");
        assert!(matches!(
            read_nodes(&group_stored_as_setting, &[Node::from(&setting)]),
            Err(SourceError::InvalidFormat(_))
        ));
    }

    #[test]
    fn invalid_stored_value_falls_back_to_default() {
        let root = Group::new("root").expect("valid");
        let count = Setting::builder("count", SettingKind::Int { min: Some(0), max: Some(10) })
            .default_value(5)
            .build()
            .expect("valid");
        root.add([count.clone()]).expect("add");
        count.set_value(7).expect("set value");

        let data = json!([{"name": "root", "settings": [
            {"name": "count", "type": "int", "value": 50}
        ]}]);
        let not_loaded = read_nodes(&data, &[Node::from(&root)]).expect("read");

        assert!(not_loaded.is_empty());
        assert_eq!(count.value(), json!(5));
        assert!(!count.is_valid());
    }

    #[test]
    fn merge_creates_ancestors_and_keeps_other_entries() {
        let root = sample_tree();
        let setting = root.setting("main/file_extension").expect("setting");
        setting.set_value("jpg").expect("set value");
        let existing = json!([
            {"name": "other", "type": "string", "value": "kept"},
            {"name": "root", "tags": ["stale"], "settings": [
                {"name": "advanced", "settings": []}
            ]}
        ]);

        let merged = merge_nodes(Some(existing), &[Node::from(&setting)]).expect("merge");

        assert_eq!(merged[0]["value"], json!("kept"));
        assert_eq!(merged[1]["tags"], json!(["stale"]));
        assert_eq!(merged[1]["settings"][0]["name"], json!("advanced"));
        assert_eq!(merged[1]["settings"][1]["name"], json!("main"));
        assert_eq!(
            merged[1]["settings"][1]["settings"][0]["value"],
            json!("jpg")
        );
    }

    #[test]
    fn merge_replaces_group_wholesale() {
        let root = sample_tree();
        let existing = json!([{"name": "root", "settings": [
            {"name": "main", "settings": [
                {"name": "removed_long_ago", "type": "string", "value": "x"},
                {"name": "output_directory", "type": "string", "value": "/old"}
            ]}
        ]}]);

        let merged = merge_nodes(Some(existing), &[Node::from(&root)]).expect("merge");
        let main = &merged[0]["settings"][0];
        let names: Vec<&str> = main["settings"]
            .as_array()
            .expect("list")
            .iter()
            .filter_map(|n| n["name"].as_str())
            .collect();
        assert_eq!(names, vec!["file_extension", "output_directory"]);
        assert_eq!(main["settings"][1]["value"], json!("/tmp"));
    }

    #[test]
    fn merge_omits_ignore_save() {
        let root = sample_tree();
        root.setting("main/file_extension")
            .expect("setting")
            .add_tag(tags::IGNORE_SAVE);
        root.setting("advanced/overwrite_mode")
            .expect("setting")
            .add_tag(tags::IGNORE_SAVE);
        root.add([Group::new("empty").expect("valid")]).expect("add");

        let merged = merge_nodes(None, &[Node::from(&root)]).expect("merge");
        assert_eq!(
            merged,
            json!([{"name": "root", "settings": [
                {"name": "main", "settings": [
                    {"name": "output_directory", "type": "string",
                     "value": "/tmp", "default_value": "/tmp"}
                ]},
                {"name": "empty", "settings": []}
            ]}])
        );

        let tagged = root.setting("main/file_extension").expect("setting");
        let untouched = merge_nodes(Some(json!([])), &[Node::from(&tagged)]).expect("merge");
        assert_eq!(untouched, json!([]));
    }

    #[test]
    fn merge_rejects_malformed_existing_data() {
        let root = sample_tree();
        assert!(matches!(
            merge_nodes(Some(json!({"root": []})), &[Node::from(&root)]),
            Err(SourceError::InvalidFormat(_))
        ));
        assert!(matches!(
            merge_nodes(Some(json!([{"name": "root", "value": 1}])), &[Node::from(
                &root.setting("main/file_extension").expect("setting")
            )]),
            Err(SourceError::InvalidFormat(_))
        ));
    }

    #[test]
    fn write_then_read_round_trip() {
        let root = sample_tree();
        root.setting("main/file_extension").expect("setting").set_value("jpg").expect("set value");
        root.setting("advanced/overwrite_mode").expect("setting").set_value("skip").expect("set value");

        let data = merge_nodes(None, &[Node::from(&root)]).expect("merge");
        root.reset().expect("reset");
        let not_loaded = read_nodes(&data, &[Node::from(&root)]).expect("read");

        assert!(not_loaded.is_empty());
        assert_eq!(root.setting("main/file_extension").expect("s").value(), json!("jpg"));
        assert_eq!(root.setting("advanced/overwrite_mode").expect("s").value(), json!("skip"));
    }

    #[test]
    fn stored_order_does_not_affect_reading() {
        let root = sample_tree();
        let main = root.group("main").expect("group");
        main.reorder("output_directory", 0).expect("reorder");
        let data = json!([{"name": "root", "settings": [
            {"name": "advanced", "settings": [
                {"name": "overwrite_mode", "type": "string", "value": "skip"}
            ]},
            {"name": "main", "settings": [
                {"name": "file_extension", "type": "string", "value": "jpg"},
                {"name": "output_directory", "type": "string", "value": "/home"}
            ]}
        ]}]);

        let not_loaded = read_nodes(&data, &[Node::from(&root)]).expect("read");

        assert!(not_loaded.is_empty());
        assert_eq!(root.setting("main/file_extension").expect("s").value(), json!("jpg"));
        assert_eq!(root.setting("main/output_directory").expect("s").value(), json!("/home"));
        assert_eq!(root.setting("advanced/overwrite_mode").expect("s").value(), json!("skip"));
        let order: Vec<String> = main.children().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(order, vec!["output_directory", "file_extension"]);
        let order: Vec<String> = root.children().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(order, vec!["main", "advanced"]);
    }

    #[test]
    fn write_follows_current_order() {
        let root = sample_tree();
        let existing = json!([{"name": "root", "settings": [
            {"name": "main", "settings": [
                {"name": "file_extension", "type": "string", "value": "png"},
                {"name": "output_directory", "type": "string", "value": "/tmp"}
            ]}
        ]}]);
        root.group("main").expect("group").reorder("output_directory", 0).expect("reorder");
        root.reorder("advanced", 0).expect("reorder");

        let merged = merge_nodes(Some(existing), &[Node::from(&root)]).expect("merge");

        let stored_names = |level: &Value| -> Vec<String> {
            level["settings"]
                .as_array()
                .expect("list")
                .iter()
                .filter_map(|n| n["name"].as_str().map(str::to_string))
                .collect()
        };
        assert_eq!(stored_names(&merged[0]), vec!["advanced", "main"]);
        assert_eq!(
            stored_names(&merged[0]["settings"][1]),
            vec!["output_directory", "file_extension"]
        );
    }

    #[test]
    fn failing_handler_aborts_the_read() {
        let root = sample_tree();
        let extension = root.setting("main/file_extension").expect("setting");
        extension.connect_event(EventKind::BeforeSetValue, |_, _| anyhow::bail!("read-only"));
        let data = json!([{"name": "root", "settings": [
            {"name": "main", "settings": [
                {"name": "file_extension", "type": "string", "value": "jpg"}
            ]}
        ]}]);

        let err = read_nodes(&data, &[Node::from(&root)]).unwrap_err();

        assert!(matches!(
            &err,
            SourceError::Handler { path, .. } if path == "root/main/file_extension"
        ));
        assert!(err.to_string().contains("read-only"));
        assert_eq!(extension.value(), json!("png"));
    }

    #[test]
    fn modify_data_errors_are_wrapped() {
        let failing = |_: Value| -> anyhow::Result<Value> { anyhow::bail!("cannot migrate") };
        let err = apply_modify_data(json!([]), Some(&failing)).unwrap_err();
        assert!(matches!(err, SourceError::ModifyData { .. }));
        assert!(err.to_string().contains("cannot migrate"));
    }

    #[test]
    fn find_path_navigates_groups() {
        let data = json!([{"name": "root", "settings": [
            {"name": "main", "settings": [{"name": "file_extension", "type": "string", "value": "jpg"}]}
        ]}]);
        let found = find_path(&data, "root/main/file_extension").expect("valid").expect("found");
        assert_eq!(found["value"], json!("jpg"));
        assert!(find_path(&data, "root/nope").expect("valid").is_none());
    }
}
