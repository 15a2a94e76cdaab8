//! `web-sys` implementation of the document port.

use std::cell::RefCell;
use std::rc::Rc;

use sensordb_app::ports::{ClickHandler, Document};
use sensordb_domain::error::DocumentError;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::listeners::ListenerRegistry;

/// A click listener attached to an element; detached again when dropped.
struct ClickListener {
    element: web_sys::Element,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

impl Drop for ClickListener {
    fn drop(&mut self) {
        if self
            .element
            .remove_event_listener_with_callback("click", self.closure.as_ref().unchecked_ref())
            .is_err()
        {
            tracing::debug!("failed to detach click listener");
        }
    }
}

/// The live page document.
///
/// Click listeners are owned by the document and dropped when the element
/// they listen on is removed through [`Document::clear_children`].
#[derive(Clone)]
pub struct WebDocument {
    document: web_sys::Document,
    // `<body>`, or the root element for documents without one.
    root: web_sys::Element,
    listeners: Rc<RefCell<ListenerRegistry<web_sys::Element, ClickListener>>>,
}

fn js_error(context: &str, err: &JsValue) -> DocumentError {
    DocumentError(format!("{context}: {err:?}"))
}

impl WebDocument {
    /// Wrap `window.document`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] outside a browsing context or when the
    /// document has no element to scan.
    pub fn from_window() -> Result<Self, DocumentError> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| DocumentError("no window.document".to_string()))?;
        let root = document
            .body()
            .map(web_sys::Element::from)
            .or_else(|| document.document_element())
            .ok_or_else(|| DocumentError("document has no root element".to_string()))?;
        Ok(Self {
            document,
            root,
            listeners: Rc::default(),
        })
    }
}

impl Document for WebDocument {
    type Element = web_sys::Element;

    fn body(&self) -> web_sys::Element {
        self.root.clone()
    }

    fn subtree(&self, root: &web_sys::Element) -> Vec<web_sys::Element> {
        let mut out = vec![root.clone()];
        if let Ok(list) = root.query_selector_all("*") {
            out.extend(
                (0..list.length())
                    .filter_map(|i| list.item(i))
                    .filter_map(|node| node.dyn_into::<web_sys::Element>().ok()),
            );
        }
        out
    }

    fn tag_name(&self, element: &web_sys::Element) -> String {
        element.tag_name().to_ascii_lowercase()
    }

    fn has_class(&self, element: &web_sys::Element, class: &str) -> bool {
        element.class_list().contains(class)
    }

    fn create_element(&self, tag: &str) -> Result<web_sys::Element, DocumentError> {
        self.document
            .create_element(tag)
            .map_err(|err| js_error("createElement", &err))
    }

    fn set_text(&self, element: &web_sys::Element, text: &str) {
        self.clear_children(element);
        element.set_text_content(Some(text));
    }

    fn set_attribute(
        &self,
        element: &web_sys::Element,
        name: &str,
        value: &str,
    ) -> Result<(), DocumentError> {
        element
            .set_attribute(name, value)
            .map_err(|err| js_error("setAttribute", &err))
    }

    fn append_child(
        &self,
        parent: &web_sys::Element,
        child: &web_sys::Element,
    ) -> Result<(), DocumentError> {
        parent
            .append_child(child)
            .map(|_| ())
            .map_err(|err| js_error("appendChild", &err))
    }

    fn clear_children(&self, element: &web_sys::Element) {
        let mut removed = Vec::new();
        while let Some(child) = element.first_child() {
            match element.remove_child(&child) {
                Ok(child) => removed.push(child),
                Err(_) => break,
            }
        }
        if removed.is_empty() {
            return;
        }
        let released = self.listeners.borrow_mut().release_where(|listening| {
            removed
                .iter()
                .any(|node| node.contains(Some(listening.as_ref())))
        });
        drop(released);
    }

    fn on_click(&self, element: &web_sys::Element, handler: ClickHandler) {
        let listener = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            event.prevent_default();
            let work = handler();
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(error) = work.await {
                    tracing::warn!(%error, "click handler failed");
                }
            });
        });
        if element
            .add_event_listener_with_callback("click", listener.as_ref().unchecked_ref())
            .is_ok()
        {
            self.listeners.borrow_mut().insert(
                element.clone(),
                ClickListener {
                    element: element.clone(),
                    closure: listener,
                },
            );
        }
    }
}
