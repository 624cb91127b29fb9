//! The four informational panels opened by clicking satellite parts.
//!
//! A panel is anything that can be hidden or shown; on the web that is a DOM
//! element with a `hidden` class, natively an in-memory flag.

use std::{cell::Cell, collections::HashMap, rc::Rc};

use crate::scene::PickTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Overlay {
    Projects,
    Contact,
    About,
    Clients,
}

impl Overlay {
    pub const ALL: [Overlay; 4] = [
        Overlay::Projects,
        Overlay::Contact,
        Overlay::About,
        Overlay::Clients,
    ];

    pub fn dom_id(self) -> &'static str {
        match self {
            Overlay::Projects => "projects-overlay",
            Overlay::Contact => "contact-overlay",
            Overlay::About => "about-overlay",
            Overlay::Clients => "clients-overlay",
        }
    }

    /// Panel opened by clicking a satellite part
    pub fn for_tag(tag: PickTag) -> Self {
        match tag {
            PickTag::Screen => Overlay::Projects,
            PickTag::Antenna => Overlay::Contact,
            PickTag::SolarPanel1 => Overlay::About,
            PickTag::SolarPanel2 => Overlay::Clients,
        }
    }
}

pub trait Panel {
    fn set_hidden(&self, hidden: bool);
    fn is_hidden(&self) -> bool;
}

/// Panels by id. Ids without a panel are ignored.
#[derive(Clone)]
pub struct OverlayManager<P> {
    panels: HashMap<String, P>,
}

impl<P: Panel> OverlayManager<P> {
    pub fn new() -> Self {
        Self {
            panels: HashMap::new(),
        }
    }

    pub fn insert(&mut self, id: impl Into<String>, panel: P) {
        self.panels.insert(id.into(), panel);
    }

    pub fn show(&self, id: &str) {
        if let Some(panel) = self.panels.get(id) {
            panel.set_hidden(false);
        }
    }

    pub fn hide(&self, id: &str) {
        if let Some(panel) = self.panels.get(id) {
            panel.set_hidden(true);
        }
    }

    /// `None` for unknown ids
    pub fn is_hidden(&self, id: &str) -> Option<bool> {
        self.panels.get(id).map(Panel::is_hidden)
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }
}

impl<P: Panel> Default for OverlayManager<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Panel without a page behind it, the state is only logged
#[derive(Debug, Clone)]
pub struct MemoryPanel {
    id: String,
    hidden: Rc<Cell<bool>>,
}

impl MemoryPanel {
    /// Starts hidden, like the page's panels
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            hidden: Rc::new(Cell::new(true)),
        }
    }
}

impl Panel for MemoryPanel {
    fn set_hidden(&self, hidden: bool) {
        if self.hidden.replace(hidden) != hidden {
            log::info!("{} {}", if hidden { "Hiding" } else { "Showing" }, self.id);
        }
    }

    fn is_hidden(&self) -> bool {
        self.hidden.get()
    }
}

impl OverlayManager<MemoryPanel> {
    pub fn in_memory() -> Self {
        let mut overlays = Self::new();
        for overlay in Overlay::ALL {
            overlays.insert(overlay.dom_id(), MemoryPanel::new(overlay.dom_id()));
        }
        overlays
    }
}

#[cfg(target_arch = "wasm32")]
pub use dom::DomPanel;

#[cfg(target_arch = "wasm32")]
mod dom {
    use wasm_bindgen::{closure::Closure, JsCast};

    use super::{Overlay, OverlayManager, Panel};

    const HIDDEN_CLASS: &str = "hidden";

    /// Overlay element toggled through its class list
    #[derive(Clone)]
    pub struct DomPanel(web_sys::Element);

    impl Panel for DomPanel {
        fn set_hidden(&self, hidden: bool) {
            let classes = self.0.class_list();
            let result = if hidden {
                classes.add_1(HIDDEN_CLASS)
            } else {
                classes.remove_1(HIDDEN_CLASS)
            };
            if let Err(e) = result {
                log::warn!("Couldn't toggle {}: {:?}", self.0.id(), e);
            }
        }

        fn is_hidden(&self) -> bool {
            self.0.class_list().contains(HIDDEN_CLASS)
        }
    }

    impl OverlayManager<DomPanel> {
        /// Looks up the four panels, missing elements are left out
        pub fn from_document(document: &web_sys::Document) -> Self {
            let mut overlays = Self::new();
            for overlay in Overlay::ALL {
                match document.get_element_by_id(overlay.dom_id()) {
                    Some(element) => overlays.insert(overlay.dom_id(), DomPanel(element)),
                    None => log::warn!("No element with id {}", overlay.dom_id()),
                }
            }
            overlays
        }

        /// Every `.close-btn` hides the `.overlay` it sits in
        pub fn bind_close_controls(&self, document: &web_sys::Document) {
            let buttons = match document.query_selector_all(".close-btn") {
                Ok(buttons) => buttons,
                Err(e) => {
                    log::warn!("Couldn't query close buttons: {:?}", e);
                    return;
                }
            };

            for i in 0..buttons.length() {
                let Some(button) = buttons.item(i) else {
                    continue;
                };
                let overlays = self.clone();
                let on_click = Closure::<dyn FnMut(web_sys::MouseEvent)>::new(
                    move |event: web_sys::MouseEvent| {
                        let overlay = event
                            .target()
                            .and_then(|target| target.dyn_into::<web_sys::Element>().ok())
                            .and_then(|element| element.closest(".overlay").ok().flatten());
                        if let Some(overlay) = overlay {
                            overlays.hide(&overlay.id());
                        }
                    },
                );
                if let Err(e) = button
                    .add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())
                {
                    log::warn!("Couldn't bind close button: {:?}", e);
                }
                // The listeners live as long as the page
                on_click.forget();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panels_start_hidden() {
        let overlays = OverlayManager::in_memory();
        assert_eq!(overlays.len(), 4);
        for overlay in Overlay::ALL {
            assert_eq!(overlays.is_hidden(overlay.dom_id()), Some(true));
        }
    }

    #[test]
    fn test_show_and_hide_one_panel() {
        let overlays = OverlayManager::in_memory();
        overlays.show("projects-overlay");
        assert_eq!(overlays.is_hidden("projects-overlay"), Some(false));
        for other in ["contact-overlay", "about-overlay", "clients-overlay"] {
            assert_eq!(overlays.is_hidden(other), Some(true));
        }

        overlays.hide("projects-overlay");
        assert_eq!(overlays.is_hidden("projects-overlay"), Some(true));
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let overlays = OverlayManager::in_memory();
        overlays.show("resume-overlay");
        overlays.hide("resume-overlay");
        assert_eq!(overlays.is_hidden("resume-overlay"), None);
        assert!(Overlay::ALL
            .iter()
            .all(|o| overlays.is_hidden(o.dom_id()) == Some(true)));
    }

    #[test]
    fn test_clones_share_panels() {
        let overlays = OverlayManager::in_memory();
        let close_handler = overlays.clone();
        overlays.show("about-overlay");
        close_handler.hide("about-overlay");
        assert_eq!(overlays.is_hidden("about-overlay"), Some(true));
    }

    #[test]
    fn test_tag_mapping() {
        assert_eq!(Overlay::for_tag(PickTag::Screen).dom_id(), "projects-overlay");
        assert_eq!(Overlay::for_tag(PickTag::Antenna).dom_id(), "contact-overlay");
        assert_eq!(Overlay::for_tag(PickTag::SolarPanel1).dom_id(), "about-overlay");
        assert_eq!(Overlay::for_tag(PickTag::SolarPanel2).dom_id(), "clients-overlay");
    }
}
