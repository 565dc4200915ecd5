use wasm_bindgen::prelude::Closure;
use web_sys::{CanvasRenderingContext2d, FileReader, HtmlCanvasElement, ProgressEvent};

use maskpaint_editor::{ApiClient, EditorSession, GalleryState, ViewScope};

/// A file read in progress and the handlers attached to its reader.
///
/// Settling clears the reader so the next read may start. The handlers stay
/// until the next read replaces them, never dropped from inside their own
/// call.
pub struct FileRead<R, H> {
    reader: Option<R>,
    handlers: Vec<H>,
}

impl<R, H> Default for FileRead<R, H> {
    fn default() -> Self {
        Self {
            reader: None,
            handlers: Vec::new(),
        }
    }
}

impl<R, H> FileRead<R, H> {
    pub fn is_pending(&self) -> bool {
        self.reader.is_some()
    }

    pub fn start(&mut self, reader: R, handlers: Vec<H>) {
        self.reader = Some(reader);
        self.handlers = handlers;
    }

    /// Called on load, error or abort alike.
    pub fn settle(&mut self) -> Option<R> {
        self.reader.take()
    }
}

pub struct State {
    pub canvas: HtmlCanvasElement,
    pub ctx: CanvasRenderingContext2d,
    pub session: EditorSession,
    pub gallery: GalleryState,
    pub api: ApiClient,
    /// Pointer currently drawing, if any. Other pointers are ignored.
    pub active_pointer: Option<i32>,
    pub file_read: FileRead<FileReader, Closure<dyn FnMut(ProgressEvent)>>,
    /// Closed when the page is torn down; async continuations check it
    /// before applying. Replaced when the page is shown again.
    pub scope: ViewScope,
}

impl State {
    pub fn is_loading_file(&self) -> bool {
        self.file_read.is_pending()
    }

    pub fn finish_file_load(&mut self) {
        self.file_read.settle();
    }

    /// Opens a fresh scope if the old one was closed. Results dropped while
    /// closed are gone, so a submission still marked in flight is abandoned.
    pub fn reopen_scope(&mut self) -> bool {
        if self.scope.is_alive() {
            return false;
        }
        self.scope = ViewScope::new();
        self.session.abandon_submit();
        true
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    #[test]
    fn failed_read_unblocks_the_next_one() {
        let mut read: FileRead<u32, Rc<()>> = FileRead::default();
        assert!(!read.is_pending());
        let handler = Rc::new(());
        read.start(1, vec![handler.clone(), handler.clone()]);
        assert!(read.is_pending());

        assert_eq!(read.settle(), Some(1));
        assert!(!read.is_pending());
        assert_eq!(Rc::strong_count(&handler), 3);
        assert_eq!(read.settle(), None);

        read.start(2, Vec::new());
        assert!(read.is_pending());
        assert_eq!(Rc::strong_count(&handler), 1);
    }
}
