use crate::error::{ChartError, ChartResult};
use crate::render::RasterContext;

use super::{ChartEngine, ChartListener};

impl<C: RasterContext> ChartEngine<C> {
    /// Registers a listener with a unique identifier.
    pub fn register_listener(&mut self, listener: Box<dyn ChartListener>) -> ChartResult<()> {
        let listener_id = listener.id().to_owned();
        if listener_id.is_empty() {
            return Err(ChartError::InvalidData(
                "listener id must not be empty".to_owned(),
            ));
        }
        if self.has_listener(&listener_id) {
            return Err(ChartError::InvalidData(format!(
                "listener with id `{listener_id}` is already registered"
            )));
        }
        self.core.runtime.listeners.push(listener);
        Ok(())
    }

    /// Unregisters a listener by id. Returns `true` when removed.
    pub fn unregister_listener(&mut self, listener_id: &str) -> bool {
        let listeners = &mut self.core.runtime.listeners;
        match listeners.iter().position(|entry| entry.id() == listener_id) {
            Some(position) => {
                listeners.remove(position);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.core.runtime.listeners.len()
    }

    #[must_use]
    pub fn has_listener(&self, listener_id: &str) -> bool {
        self.core
            .runtime
            .listeners
            .iter()
            .any(|listener| listener.id() == listener_id)
    }
}
