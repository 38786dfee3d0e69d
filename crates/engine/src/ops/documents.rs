use crate::{
    BusinessVertical, Document, DocumentId, DocumentKind, EngineError, ResultEngine,
    context::UiSnapshot,
};

use super::Engine;

impl Engine {
    /// Opens a blank document in the creation form for `kind` and makes that
    /// view active.
    pub fn new_document(&mut self, kind: DocumentKind, vertical: BusinessVertical) -> DocumentId {
        let mut doc = Document::new(kind, vertical);
        doc.tax_rate_bps = self.default_tax_rate_bps;
        let id = doc.id;
        tracing::info!("new {kind} {id} ({vertical})");
        self.show(doc);
        id
    }

    /// Loads a stored document into the form for its kind and makes that view
    /// active on the document's vertical.
    pub fn open_document(&mut self, kind: DocumentKind, id: DocumentId) -> ResultEngine<&Document> {
        let doc = self.repository.load(kind, id)?;
        self.show(doc);
        self.open
            .get(&kind)
            .ok_or_else(|| EngineError::KeyNotFound(format!("{kind} {id}")))
    }

    fn show(&mut self, doc: Document) {
        let kind = doc.kind;
        let vertical = doc.vertical();
        self.detach_renderers();
        self.router.reset();
        self.open.insert(kind, doc);
        self.route(&UiSnapshot::new().showing(kind).selected(vertical));
    }

    /// Closes the form for `kind`, discarding unsaved changes.
    pub fn close_document(&mut self, kind: DocumentKind) -> Option<Document> {
        self.detach_renderers();
        let closed = self.open.remove(&kind);
        if self.router.current().is_some_and(|route| route.kind == kind) {
            self.router.reset();
        } else {
            self.attach_renderers();
        }
        closed
    }

    /// The document open in the form for `kind`.
    pub fn document(&self, kind: DocumentKind) -> Option<&Document> {
        self.open.get(&kind)
    }

    /// The document targeted by the current route.
    pub fn current_document(&self) -> ResultEngine<&Document> {
        self.active_document().map(|(_, doc)| doc)
    }

    /// Sets the client name of the routed document.
    pub fn set_client(&mut self, client: Option<&str>) -> ResultEngine<()> {
        let (_, doc) = self.active_document_mut()?;
        doc.client = client
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);
        doc.touch();
        Ok(())
    }

    /// Persists the routed document.
    ///
    /// On failure the in-memory document is kept as is and stays dirty, so
    /// nothing is lost; the caller tells the operator it is not durable yet.
    pub fn save(&mut self) -> ResultEngine<DocumentId> {
        let route = self.active_route()?;
        let doc = self
            .open
            .get_mut(&route.kind)
            .ok_or_else(|| EngineError::KeyNotFound(format!("no open {}", route.kind)))?;
        if let Err(err) = self.repository.save(doc) {
            tracing::warn!("{} {} kept in memory only: {err}", doc.kind, doc.id);
            return Err(err);
        }
        doc.mark_saved();
        Ok(doc.id)
    }

    /// Stored documents of `kind`.
    pub fn documents(&self, kind: DocumentKind) -> ResultEngine<Vec<Document>> {
        self.repository.load_all(kind)
    }

    /// Deletes a stored document, closing its form if it is open.
    pub fn delete_document(&mut self, kind: DocumentKind, id: DocumentId) -> ResultEngine<()> {
        self.repository.delete(kind, id)?;
        if self.open.get(&kind).is_some_and(|doc| doc.id == id) {
            self.close_document(kind);
        }
        Ok(())
    }
}
