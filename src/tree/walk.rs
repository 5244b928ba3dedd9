//! tree::walk
//!
//! Lazy depth-first traversal of a group's descendants.

use super::group::Group;
use super::node::Node;

/// Depth-first, insertion-ordered iterator over a group's descendants.
///
/// By default yields settings only. A node carrying any skipped tag is
/// excluded together with its subtree. Each group's children are
/// snapshotted when the walk descends into it.
///
/// ```
/// use settree::tree::{Group, Node, Setting, SettingKind};
///
/// let root = Group::new("root").unwrap();
/// let main = Group::new("main").unwrap();
/// main.add([Setting::new("a", SettingKind::String).unwrap()]).unwrap();
/// root.add([Node::from(main), Setting::new("b", SettingKind::Bool).unwrap().into()]).unwrap();
///
/// let names: Vec<String> = root.walk().map(|n| n.name().to_string()).collect();
/// assert_eq!(names, ["a", "b"]);
///
/// let with_groups = root.walk().include_groups(true).count();
/// assert_eq!(with_groups, 3);
/// ```
#[derive(Clone)]
pub struct Walk {
    root: Group,
    include_groups: bool,
    skip_tags: Vec<String>,
    stack: Option<Vec<std::vec::IntoIter<Node>>>,
}

impl Walk {
    pub(crate) fn new(root: Group) -> Self {
        Self {
            root,
            include_groups: false,
            skip_tags: Vec::new(),
            stack: None,
        }
    }

    /// Also yield groups, each before its children.
    pub fn include_groups(mut self, include: bool) -> Self {
        self.include_groups = include;
        self
    }

    /// Exclude nodes carrying any of `tags`, and their subtrees.
    pub fn skip_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_tags.extend(tags.into_iter().map(Into::into));
        self
    }
}

impl Iterator for Walk {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        let root = &self.root;
        let skip_tags = &self.skip_tags;
        let include_groups = self.include_groups;
        let stack = self
            .stack
            .get_or_insert_with(|| vec![root.children().into_iter()]);

        loop {
            let next = stack.last_mut()?.next();
            let Some(node) = next else {
                stack.pop();
                continue;
            };

            if skip_tags.iter().any(|tag| node.has_tag(tag)) {
                continue;
            }

            match &node {
                Node::Group(group) => {
                    stack.push(group.children().into_iter());
                    if include_groups {
                        return Some(node);
                    }
                }
                Node::Setting(_) => return Some(node),
            }
        }
    }
}
