//! Views: what a context drives to put its keyboard on screen.

pub mod headless;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use eekboard_core::ContextId;
use tokio::sync::mpsc::UnboundedSender;

use crate::application::{FactoryError, KeyboardView, ViewEvent, ViewFactory};

pub use headless::{HeadlessView, ViewSnapshot};

/// Creates a [`HeadlessView`] per context.
///
/// Views report user key events on the shared channel. The factory keeps a
/// weak handle to each live view so callers can find and drive it.
pub struct HeadlessViewFactory {
    events: UnboundedSender<ViewEvent>,
    views: Mutex<HashMap<ContextId, Weak<HeadlessView>>>,
}

impl HeadlessViewFactory {
    pub fn new(events: UnboundedSender<ViewEvent>) -> Self {
        Self {
            events,
            views: Mutex::new(HashMap::new()),
        }
    }

    /// The view of a live context.
    pub fn view(&self, id: ContextId) -> Option<Arc<HeadlessView>> {
        self.views
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .and_then(Weak::upgrade)
    }
}

impl ViewFactory for HeadlessViewFactory {
    fn create_view(
        &self,
        id: ContextId,
        client_name: &str,
    ) -> Result<Arc<dyn KeyboardView>, FactoryError> {
        let view = Arc::new(HeadlessView::new(id, client_name, self.events.clone()));
        let mut views = self.views.lock().unwrap_or_else(PoisonError::into_inner);
        // Contexts drop their view when destroyed.
        views.retain(|_, v| v.strong_count() > 0);
        views.insert(id, Arc::downgrade(&view));
        Ok(view)
    }
}
