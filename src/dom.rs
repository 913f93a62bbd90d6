use std::collections::HashMap;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub enum NodeKind {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Element {
    pub tag_name: String,
    pub attrs: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    root: NodeId,
    id_index: HashMap<String, NodeId>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Document,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            id_index: HashMap::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn create_node(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            kind,
        });
        if let Some(parent_id) = parent {
            self.nodes[parent_id.0].children.push(id);
        }
        id
    }

    pub fn create_element(
        &mut self,
        parent: NodeId,
        tag_name: impl Into<String>,
        attrs: HashMap<String, String>,
    ) -> NodeId {
        let element = Element {
            tag_name: tag_name.into(),
            attrs,
        };
        let id = self.create_node(Some(parent), NodeKind::Element(element));
        if let Some(id_attr) = self
            .element(id)
            .and_then(|element| element.attrs.get("id").cloned())
        {
            if !id_attr.is_empty() {
                self.id_index.insert(id_attr, id);
            }
        }
        id
    }

    pub fn create_text(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.create_node(Some(parent), NodeKind::Text(text.into()))
    }

    pub fn create_detached_element(&mut self, tag_name: impl Into<String>) -> NodeId {
        let element = Element {
            tag_name: tag_name.into(),
            attrs: HashMap::new(),
        };
        self.create_node(None, NodeKind::Element(element))
    }

    pub fn create_detached_text(&mut self, text: impl Into<String>) -> NodeId {
        self.create_node(None, NodeKind::Text(text.into()))
    }

    pub fn element(&self, node_id: NodeId) -> Option<&Element> {
        match &self.nodes[node_id.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, node_id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[node_id.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|e| e.tag_name.as_str())
    }

    pub fn text(&self, node_id: NodeId) -> Option<&str> {
        match &self.nodes[node_id.0].kind {
            NodeKind::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes[node_id.0].parent
    }

    pub fn children(&self, node_id: NodeId) -> &[NodeId] {
        &self.nodes[node_id.0].children
    }

    pub fn attr(&self, node_id: NodeId, name: &str) -> Option<String> {
        self.element(node_id)
            .and_then(|element| element.attrs.get(name).cloned())
    }

    pub fn set_attr(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::Dom("attribute target is not an element".into()))?;
        element.attrs.insert(name.to_string(), value.to_string());
        if name == "id" {
            self.rebuild_id_index();
        }
        Ok(())
    }

    pub fn by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    fn can_have_children(&self, node_id: NodeId) -> bool {
        matches!(
            self.nodes.get(node_id.0).map(|n| &n.kind),
            Some(NodeKind::Document | NodeKind::Element(_))
        )
    }

    fn is_valid_node(&self, node_id: NodeId) -> bool {
        node_id.0 < self.nodes.len()
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if !self.can_have_children(parent) {
            return Err(Error::Dom("append target cannot have children".into()));
        }
        if child == self.root || child == parent {
            return Err(Error::Dom("invalid append node".into()));
        }
        if !self.is_valid_node(child) {
            return Err(Error::Dom("append node is invalid".into()));
        }

        // Prevent cycles: parent must not be inside child's subtree.
        let mut cursor = Some(parent);
        while let Some(node) = cursor {
            if node == child {
                return Err(Error::Dom("append would create a cycle".into()));
            }
            cursor = self.parent(node);
        }

        if let Some(old_parent) = self.parent(child) {
            self.nodes[old_parent.0].children.retain(|id| *id != child);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.rebuild_id_index();
        Ok(())
    }

    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) -> Result<()> {
        if !self.can_have_children(parent) {
            return Err(Error::Dom("insert target cannot have children".into()));
        }
        if child == self.root || child == parent {
            return Err(Error::Dom("invalid insert node".into()));
        }
        if !self.is_valid_node(child) || !self.is_valid_node(reference) {
            return Err(Error::Dom("insert node is invalid".into()));
        }
        if self.parent(reference) != Some(parent) {
            return Err(Error::Dom("insert reference is not a direct child".into()));
        }
        if child == reference {
            return Ok(());
        }

        let mut cursor = Some(parent);
        while let Some(node) = cursor {
            if node == child {
                return Err(Error::Dom("insert would create a cycle".into()));
            }
            cursor = self.parent(node);
        }

        if let Some(old_parent) = self.parent(child) {
            self.nodes[old_parent.0].children.retain(|id| *id != child);
        }

        let Some(index) = self.nodes[parent.0]
            .children
            .iter()
            .position(|id| *id == reference)
        else {
            return Err(Error::Dom("insert reference is missing".into()));
        };

        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(index, child);
        self.rebuild_id_index();
        Ok(())
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.parent(child) != Some(parent) {
            return Err(Error::Dom("remove target is not a direct child".into()));
        }
        self.nodes[parent.0].children.retain(|id| *id != child);
        self.nodes[child.0].parent = None;
        self.rebuild_id_index();
        Ok(())
    }

    // No-op when target is detached.
    pub fn replace_with(&mut self, target: NodeId, replacement: NodeId) -> Result<()> {
        let Some(parent) = self.parent(target) else {
            return Ok(());
        };
        if target == replacement {
            return Ok(());
        }
        self.insert_before(parent, replacement, target)?;
        self.remove_child(parent, target)
    }

    pub fn text_content(&self, node_id: NodeId) -> String {
        match &self.nodes[node_id.0].kind {
            NodeKind::Document | NodeKind::Element(_) => {
                let mut out = String::new();
                for child in &self.nodes[node_id.0].children {
                    out.push_str(&self.text_content(*child));
                }
                out
            }
            NodeKind::Text(text) => text.clone(),
        }
    }

    pub fn set_text_content(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        if self.element(node_id).is_none() {
            return Err(Error::Dom("text target is not an element".into()));
        }
        let old_children = std::mem::take(&mut self.nodes[node_id.0].children);
        for child in old_children {
            self.nodes[child.0].parent = None;
        }
        if !value.is_empty() {
            self.create_text(node_id, value.to_string());
        }
        self.rebuild_id_index();
        Ok(())
    }

    pub fn inner_html(&self, node_id: NodeId) -> Result<String> {
        if self.element(node_id).is_none() {
            return Err(Error::Dom("markup target is not an element".into()));
        }
        let mut out = String::new();
        for child in &self.nodes[node_id.0].children {
            out.push_str(&self.serialize_node(*child));
        }
        Ok(out)
    }

    pub fn set_inner_html(&mut self, node_id: NodeId, markup: &str) -> Result<()> {
        if self.element(node_id).is_none() {
            return Err(Error::Dom("markup target is not an element".into()));
        }

        let fragment = crate::html::parse_fragment(markup)?;

        let old_children = std::mem::take(&mut self.nodes[node_id.0].children);
        for child in old_children {
            self.nodes[child.0].parent = None;
        }

        let children = fragment.nodes[fragment.root.0].children.clone();
        for child in children {
            self.clone_subtree_from(&fragment, child, Some(node_id))?;
        }

        self.rebuild_id_index();
        Ok(())
    }

    fn clone_subtree_from(
        &mut self,
        source: &Dom,
        source_node: NodeId,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        let kind = match &source.nodes[source_node.0].kind {
            NodeKind::Document => {
                return Err(Error::Dom("cannot clone a document node into markup".into()));
            }
            NodeKind::Element(element) => NodeKind::Element(element.clone()),
            NodeKind::Text(text) => NodeKind::Text(text.clone()),
        };

        let node = self.create_node(parent, kind);
        for child in &source.nodes[source_node.0].children {
            self.clone_subtree_from(source, *child, Some(node))?;
        }
        Ok(node)
    }

    // Splices the children of the fragment's root into parent, in order.
    pub fn append_fragment(&mut self, parent: NodeId, fragment: &Dom) -> Result<()> {
        if !self.can_have_children(parent) {
            return Err(Error::Dom("fragment target cannot have children".into()));
        }
        let children = fragment.nodes[fragment.root.0].children.clone();
        for child in children {
            self.clone_subtree_from(fragment, child, Some(parent))?;
        }
        self.rebuild_id_index();
        Ok(())
    }

    pub fn outer_html(&self, node_id: NodeId) -> String {
        self.serialize_node(node_id)
    }

    fn serialize_node(&self, node_id: NodeId) -> String {
        self.serialize_node_in(node_id, false)
    }

    fn serialize_node_in(&self, node_id: NodeId, raw_text: bool) -> String {
        match &self.nodes[node_id.0].kind {
            NodeKind::Document => {
                let mut out = String::new();
                for child in &self.nodes[node_id.0].children {
                    out.push_str(&self.serialize_node_in(*child, false));
                }
                out
            }
            // Text round-trips through parse_fragment, so it is re-escaped on
            // the way out, except inside raw-text containers.
            NodeKind::Text(text) => {
                if raw_text {
                    text.clone()
                } else {
                    escape_markup_text(text)
                }
            }
            NodeKind::Element(element) => {
                let mut out = String::new();
                out.push('<');
                out.push_str(&element.tag_name);
                let mut names = element.attrs.keys().collect::<Vec<_>>();
                names.sort();
                for name in names {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attr_value(&element.attrs[name]));
                    out.push('"');
                }
                out.push('>');
                if crate::html::is_void_tag(&element.tag_name)
                    && self.nodes[node_id.0].children.is_empty()
                {
                    return out;
                }
                let raw = crate::html::is_raw_text_tag(&element.tag_name);
                for child in &self.nodes[node_id.0].children {
                    out.push_str(&self.serialize_node_in(*child, raw));
                }
                out.push_str("</");
                out.push_str(&element.tag_name);
                out.push('>');
                out
            }
        }
    }

    pub fn class_contains(&self, node_id: NodeId, class_name: &str) -> Result<bool> {
        let element = self
            .element(node_id)
            .ok_or_else(|| Error::Dom("class target is not an element".into()))?;
        Ok(has_class(element, class_name))
    }

    pub fn class_add(&mut self, node_id: NodeId, class_name: &str) -> Result<()> {
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::Dom("class target is not an element".into()))?;
        let mut classes = class_tokens(element.attrs.get("class").map(String::as_str));
        if !classes.iter().any(|name| name == class_name) {
            classes.push(class_name.to_string());
        }
        set_class_attr(element, &classes);
        Ok(())
    }

    pub fn class_remove(&mut self, node_id: NodeId, class_name: &str) -> Result<()> {
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::Dom("class target is not an element".into()))?;
        let mut classes = class_tokens(element.attrs.get("class").map(String::as_str));
        classes.retain(|name| name != class_name);
        set_class_attr(element, &classes);
        Ok(())
    }

    pub fn class_toggle(&mut self, node_id: NodeId, class_name: &str) -> Result<bool> {
        let has = self.class_contains(node_id, class_name)?;
        if has {
            self.class_remove(node_id, class_name)?;
            Ok(false)
        } else {
            self.class_add(node_id, class_name)?;
            Ok(true)
        }
    }

    // Descendant elements in document order; root itself is not considered.
    pub fn elements_by_tag_names(&self, root: NodeId, tag_names: &[&str]) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendant_elements(root, &mut out);
        out.retain(|id| {
            self.tag_name(*id)
                .map(|tag| tag_names.iter().any(|want| tag.eq_ignore_ascii_case(want)))
                .unwrap_or(false)
        });
        out
    }

    pub fn elements_with_class(&self, root: NodeId, class_name: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendant_elements(root, &mut out);
        out.retain(|id| {
            self.element(*id)
                .map(|element| has_class(element, class_name))
                .unwrap_or(false)
        });
        out
    }

    pub fn first_with_class(&self, root: NodeId, class_name: &str) -> Option<NodeId> {
        self.elements_with_class(root, class_name).into_iter().next()
    }

    pub fn text_leaves_in(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_text_leaves(root, &mut out);
        out
    }

    fn collect_text_leaves(&self, node_id: NodeId, out: &mut Vec<NodeId>) {
        match &self.nodes[node_id.0].kind {
            NodeKind::Text(_) => out.push(node_id),
            NodeKind::Document | NodeKind::Element(_) => {
                for child in &self.nodes[node_id.0].children {
                    self.collect_text_leaves(*child, out);
                }
            }
        }
    }

    fn collect_elements_dfs(&self, node_id: NodeId, out: &mut Vec<NodeId>) {
        if matches!(self.nodes[node_id.0].kind, NodeKind::Element(_)) {
            out.push(node_id);
        }
        for child in &self.nodes[node_id.0].children {
            self.collect_elements_dfs(*child, out);
        }
    }

    fn collect_descendant_elements(&self, node_id: NodeId, out: &mut Vec<NodeId>) {
        for child in &self.nodes[node_id.0].children {
            self.collect_elements_dfs(*child, out);
        }
    }

    // Node.normalize(): merges adjacent text leaves and drops empty ones.
    pub fn normalize(&mut self, node_id: NodeId) {
        let children = self.nodes[node_id.0].children.clone();
        for child in &children {
            if matches!(self.nodes[child.0].kind, NodeKind::Element(_)) {
                self.normalize(*child);
            }
        }

        let mut kept: Vec<NodeId> = Vec::new();
        for child in children {
            let text = match &self.nodes[child.0].kind {
                NodeKind::Text(text) => Some(text.clone()),
                _ => None,
            };
            match text {
                Some(text) if text.is_empty() => {
                    self.nodes[child.0].parent = None;
                }
                Some(text) => {
                    let mut merged = false;
                    if let Some(prev) = kept.last().copied() {
                        if let NodeKind::Text(existing) = &mut self.nodes[prev.0].kind {
                            existing.push_str(&text);
                            merged = true;
                        }
                    }
                    if merged {
                        self.nodes[child.0].parent = None;
                    } else {
                        kept.push(child);
                    }
                }
                None => kept.push(child),
            }
        }
        self.nodes[node_id.0].children = kept;
    }

    pub(crate) fn rebuild_id_index(&mut self) {
        let mut next = HashMap::new();
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if let NodeKind::Element(element) = &self.nodes[node.0].kind {
                if let Some(id) = element.attrs.get("id") {
                    if !id.is_empty() {
                        next.insert(id.clone(), node);
                    }
                }
            }
            for child in self.nodes[node.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        self.id_index = next;
    }
}

pub(crate) fn has_class(element: &Element, class_name: &str) -> bool {
    element
        .attrs
        .get("class")
        .map(|classes| classes.split_whitespace().any(|c| c == class_name))
        .unwrap_or(false)
}

fn class_tokens(class_attr: Option<&str>) -> Vec<String> {
    class_attr
        .map(|value| {
            value
                .split_whitespace()
                .filter(|token| !token.is_empty())
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default()
}

fn set_class_attr(element: &mut Element, classes: &[String]) {
    if classes.is_empty() {
        element.attrs.remove("class");
    } else {
        element.attrs.insert("class".to_string(), classes.join(" "));
    }
}

fn escape_markup_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attr_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
