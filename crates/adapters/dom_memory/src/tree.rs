//! Arena storage and the document port implementation.

use std::cell::RefCell;
use std::rc::Rc;

use futures::FutureExt;

use sensordb_app::ports::{ClickFuture, ClickHandler, Document};
use sensordb_domain::error::DocumentError;

type SharedHandler = Rc<dyn Fn() -> ClickFuture>;

/// Handle on an element of a [`MemoryDocument`].
///
/// A handle goes stale once the element is released by clearing its parent;
/// stale handles read as empty and refuse mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementRef {
    index: usize,
    generation: u32,
}

pub(crate) enum Content {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
}

pub(crate) struct Node {
    pub(crate) content: Content,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
    handlers: Vec<SharedHandler>,
}

impl Node {
    fn new(content: Content) -> Self {
        Self {
            content,
            parent: None,
            children: Vec::new(),
            handlers: Vec::new(),
        }
    }

    fn is_element(&self) -> bool {
        matches!(self.content, Content::Element { .. })
    }
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

pub(crate) struct Arena {
    slots: Vec<Slot>,
    // Released slots, reused before the arena grows.
    free: Vec<usize>,
}

impl Arena {
    fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    fn alloc(&mut self, content: Content) -> ElementRef {
        let node = Some(Node::new(content));
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.node = node;
            return ElementRef {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            node,
        });
        ElementRef {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    pub(crate) fn node(&self, index: usize) -> Option<&Node> {
        self.slots.get(index)?.node.as_ref()
    }

    fn node_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.slots.get_mut(index)?.node.as_mut()
    }

    /// Index of the live node behind `element`, if the handle is current.
    pub(crate) fn resolve(&self, element: ElementRef) -> Option<usize> {
        let slot = self.slots.get(element.index)?;
        (slot.generation == element.generation && slot.node.is_some()).then_some(element.index)
    }

    fn element(&self, element: ElementRef) -> Option<&Node> {
        self.resolve(element).and_then(|index| self.node(index))
    }

    fn element_mut(&mut self, element: ElementRef) -> Option<&mut Node> {
        let index = self.resolve(element)?;
        self.node_mut(index)
    }

    fn attach(&mut self, parent: usize, child: usize) {
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
    }

    fn detach(&mut self, index: usize) {
        let parent = self.node_mut(index).and_then(|node| node.parent.take());
        if let Some(parent) = parent.and_then(|parent| self.node_mut(parent)) {
            parent.children.retain(|&child| child != index);
        }
    }

    fn is_ancestor_or_self(&self, candidate: usize, mut index: usize) -> bool {
        loop {
            if index == candidate {
                return true;
            }
            match self.node(index).and_then(|node| node.parent) {
                Some(parent) => index = parent,
                None => return false,
            }
        }
    }

    /// Free every child of `index` and their descendants, returning the
    /// click handlers they carried.
    fn release_children(&mut self, index: usize) -> Vec<SharedHandler> {
        let mut stack = match self.node_mut(index) {
            Some(node) => std::mem::take(&mut node.children),
            None => return Vec::new(),
        };
        let mut handlers = Vec::new();
        while let Some(child) = stack.pop() {
            let slot = &mut self.slots[child];
            if let Some(node) = slot.node.take() {
                slot.generation = slot.generation.wrapping_add(1);
                stack.extend(node.children);
                handlers.extend(node.handlers);
                self.free.push(child);
            }
        }
        handlers
    }

    pub(crate) fn collect_text(&self, index: usize, out: &mut String) {
        let Some(node) = self.node(index) else {
            return;
        };
        match &node.content {
            Content::Text(text) => out.push_str(text),
            Content::Element { .. } => {
                for &child in &node.children {
                    self.collect_text(child, out);
                }
            }
        }
    }
}

/// An in-memory document with a single `body` root.
///
/// Unlike a browser DOM, clearing an element releases its former children:
/// their slots are reused, their click handlers are dropped and their
/// handles go stale.
#[derive(Clone)]
pub struct MemoryDocument {
    pub(crate) arena: Rc<RefCell<Arena>>,
    body: ElementRef,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    #[must_use]
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let body = arena.alloc(Content::Element {
            tag: "body".to_string(),
            attributes: Vec::new(),
        });
        Self {
            arena: Rc::new(RefCell::new(arena)),
            body,
        }
    }

    /// Create an element carrying `classes` and append it to `parent`.
    ///
    /// The element is left detached when `parent` is stale.
    pub fn add_element(&self, parent: ElementRef, tag: &str, classes: &[&str]) -> ElementRef {
        let mut arena = self.arena.borrow_mut();
        let element = arena.alloc(Content::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        });
        if !classes.is_empty()
            && let Some(node) = arena.element_mut(element)
        {
            set_attr(node, "class", &classes.join(" "));
        }
        if let Some(parent) = arena.resolve(parent) {
            arena.attach(parent, element.index);
        }
        element
    }

    /// Element children of `element`, in order.
    #[must_use]
    pub fn children(&self, element: ElementRef) -> Vec<ElementRef> {
        let arena = self.arena.borrow();
        let Some(node) = arena.element(element) else {
            return Vec::new();
        };
        node.children
            .iter()
            .filter_map(|&child| {
                let slot = &arena.slots[child];
                let live = slot.node.as_ref().is_some_and(Node::is_element);
                live.then_some(ElementRef {
                    index: child,
                    generation: slot.generation,
                })
            })
            .collect()
    }

    /// Descendants of `root` with the given tag, in document order.
    #[must_use]
    pub fn find_by_tag(&self, root: ElementRef, tag: &str) -> Vec<ElementRef> {
        self.subtree(&root)
            .into_iter()
            .filter(|element| self.tag_name(element) == tag)
            .collect()
    }

    #[must_use]
    pub fn attribute(&self, element: ElementRef, name: &str) -> Option<String> {
        let arena = self.arena.borrow();
        match &arena.element(element)?.content {
            Content::Element { attributes, .. } => attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone()),
            Content::Text(_) => None,
        }
    }

    /// Concatenated text of every descendant text node.
    #[must_use]
    pub fn text_content(&self, element: ElementRef) -> String {
        let mut out = String::new();
        let arena = self.arena.borrow();
        if let Some(index) = arena.resolve(element) {
            arena.collect_text(index, &mut out);
        }
        out
    }

    /// Run every click handler registered on `element`.
    ///
    /// Handlers are invoked immediately, in registration order; the returned
    /// future drives the work they started and fails with the first error.
    /// Clicking a released element does nothing.
    pub fn click(&self, element: ElementRef) -> ClickFuture {
        let handlers = self
            .arena
            .borrow()
            .element(element)
            .map(|node| node.handlers.clone())
            .unwrap_or_default();
        let started: Vec<ClickFuture> = handlers.iter().map(|handler| handler()).collect();
        async move {
            for work in started {
                work.await?;
            }
            Ok(())
        }
        .boxed_local()
    }

    /// Number of click handlers registered on `element`.
    #[must_use]
    pub fn click_handlers(&self, element: ElementRef) -> usize {
        self.arena
            .borrow()
            .element(element)
            .map_or(0, |node| node.handlers.len())
    }

    /// Number of node slots the arena holds, live or free.
    #[must_use]
    pub fn allocated_nodes(&self) -> usize {
        self.arena.borrow().slots.len()
    }

    fn release_children(&self, element: ElementRef) {
        let released = {
            let mut arena = self.arena.borrow_mut();
            match arena.resolve(element) {
                Some(index) => arena.release_children(index),
                None => Vec::new(),
            }
        };
        // Handlers may own anything; drop them once the arena is unborrowed.
        drop(released);
    }
}

fn set_attr(node: &mut Node, name: &str, value: &str) {
    if let Content::Element { attributes, .. } = &mut node.content {
        match attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => attributes.push((name.to_string(), value.to_string())),
        }
    }
}

fn stale() -> DocumentError {
    DocumentError("element has been released".to_string())
}

impl Document for MemoryDocument {
    type Element = ElementRef;

    fn body(&self) -> ElementRef {
        self.body
    }

    fn subtree(&self, root: &ElementRef) -> Vec<ElementRef> {
        let arena = self.arena.borrow();
        let mut out = Vec::new();
        let Some(start) = arena.resolve(*root) else {
            return out;
        };
        let mut stack = vec![start];
        while let Some(index) = stack.pop() {
            if let Some(node) = arena.node(index).filter(|node| node.is_element()) {
                out.push(ElementRef {
                    index,
                    generation: arena.slots[index].generation,
                });
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    fn tag_name(&self, element: &ElementRef) -> String {
        match self.arena.borrow().element(*element).map(|node| &node.content) {
            Some(Content::Element { tag, .. }) => tag.clone(),
            _ => String::new(),
        }
    }

    fn has_class(&self, element: &ElementRef, class: &str) -> bool {
        self.attribute(*element, "class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    fn create_element(&self, tag: &str) -> Result<ElementRef, DocumentError> {
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DocumentError(format!("invalid tag name: {tag:?}")));
        }
        Ok(self.arena.borrow_mut().alloc(Content::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        }))
    }

    fn set_text(&self, element: &ElementRef, text: &str) {
        self.release_children(*element);
        let mut arena = self.arena.borrow_mut();
        if let Some(parent) = arena.resolve(*element) {
            let node = arena.alloc(Content::Text(text.to_string()));
            arena.attach(parent, node.index);
        }
    }

    fn set_attribute(
        &self,
        element: &ElementRef,
        name: &str,
        value: &str,
    ) -> Result<(), DocumentError> {
        if name.is_empty() || name.contains(|c: char| c.is_whitespace() || "\"'<>/=".contains(c)) {
            return Err(DocumentError(format!("invalid attribute name: {name:?}")));
        }
        let mut arena = self.arena.borrow_mut();
        let node = arena.element_mut(*element).ok_or_else(stale)?;
        set_attr(node, name, value);
        Ok(())
    }

    fn append_child(&self, parent: &ElementRef, child: &ElementRef) -> Result<(), DocumentError> {
        let mut arena = self.arena.borrow_mut();
        let (Some(parent), Some(child)) = (arena.resolve(*parent), arena.resolve(*child)) else {
            return Err(stale());
        };
        if arena.is_ancestor_or_self(child, parent) {
            return Err(DocumentError(
                "cannot append an element to itself or its descendant".to_string(),
            ));
        }
        arena.detach(child);
        arena.attach(parent, child);
        Ok(())
    }

    fn clear_children(&self, element: &ElementRef) {
        self.release_children(*element);
    }

    fn on_click(&self, element: &ElementRef, handler: ClickHandler) {
        if let Some(node) = self.arena.borrow_mut().element_mut(*element) {
            node.handlers.push(Rc::from(handler));
        }
    }
}
