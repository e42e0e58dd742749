//! Recording doubles shared by the application unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use eekboard_core::{ClientIdentity, ContextId, Key, KeyboardDescription};

use super::context::Context;
use super::ports::{
    ContextFactory, FactoryError, KeyboardView, LayoutLoadError, LayoutLoader,
    StandardContextFactory, ViewFactory,
};
use super::repeat::RepeatSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCall {
    Attach(String),
    Detach,
    Show(bool),
    Hide,
}

#[derive(Default)]
pub struct RecordingView {
    calls: Mutex<Vec<ViewCall>>,
}

impl RecordingView {
    pub fn calls(&self) -> Vec<ViewCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl KeyboardView for RecordingView {
    fn attach(&self, keyboard: &KeyboardDescription) {
        self.calls
            .lock()
            .unwrap()
            .push(ViewCall::Attach(keyboard.name().to_string()));
    }
    fn detach(&self) {
        self.calls.lock().unwrap().push(ViewCall::Detach);
    }
    fn show(&self, fullscreen: bool) {
        self.calls.lock().unwrap().push(ViewCall::Show(fullscreen));
    }
    fn hide(&self) {
        self.calls.lock().unwrap().push(ViewCall::Hide);
    }
}

/// Hands out a [`RecordingView`] per context and keeps them for inspection.
#[derive(Default)]
pub struct RecordingViews {
    views: Mutex<HashMap<ContextId, Arc<RecordingView>>>,
}

impl RecordingViews {
    pub fn view(&self, id: ContextId) -> Arc<RecordingView> {
        Arc::clone(&self.views.lock().unwrap()[&id])
    }
}

impl ViewFactory for RecordingViews {
    fn create_view(
        &self,
        id: ContextId,
        _client_name: &str,
    ) -> Result<Arc<dyn KeyboardView>, FactoryError> {
        let view = Arc::new(RecordingView::default());
        self.views.lock().unwrap().insert(id, Arc::clone(&view));
        Ok(view)
    }
}

/// Builds a two-key layout named after the requested name; `"broken"` fails.
pub struct StaticLoader;

impl LayoutLoader for StaticLoader {
    fn load(&self, spec: &str) -> Result<KeyboardDescription, LayoutLoadError> {
        if spec == "broken" {
            return Err(LayoutLoadError::NotFound(spec.to_string()));
        }
        Ok(KeyboardDescription::new(
            spec,
            vec![
                Key::from_keysym_names(38, "AC01", &[&["a", "A"], &["b"]]),
                Key::from_keysym_names(50, "LFSH", &[&["Shift_L"]]),
            ],
        )
        .expect("valid test layout"))
    }
}

pub struct FailingFactory;

impl ContextFactory for FailingFactory {
    fn create_context(
        &self,
        _id: ContextId,
        _owner: ClientIdentity,
        _client_name: &str,
    ) -> Result<Context, FactoryError> {
        Err(FactoryError("no display".into()))
    }
}

pub fn factory() -> (StandardContextFactory, Arc<RecordingViews>) {
    let views = Arc::new(RecordingViews::default());
    let factory = StandardContextFactory::new(
        Arc::new(StaticLoader),
        views.clone(),
        RepeatSettings::default(),
    );
    (factory, views)
}
