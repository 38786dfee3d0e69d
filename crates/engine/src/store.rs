//! Persistence of documents on top of a plain key/value string store.
//!
//! Each document kind is one collection stored under a stable key
//! ([`DocumentKind::collection_key`]) as a JSON array of [`DocumentRecord`].
//! Writes are synchronous and last-write-wins.

use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    BusinessVertical, Document, DocumentId, DocumentKind, EngineError, QuoteMode, ResultEngine,
    ServiceEntry, quote_mode::Section,
};

/// Synchronous string store the engine persists into.
///
/// Reads never fail: an absent key is `None`. Writes report success.
pub trait KeyValueStore {
    fn load(&self, key: &str) -> Option<String>;
    fn save(&mut self, key: &str, value: &str) -> bool;
}

/// In-memory store. Clones share the same data.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: Rc<RefCell<HashMap<String, String>>>,
    refuse_writes: Rc<Cell<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following write fail until turned off again.
    pub fn refuse_writes(&self, refuse: bool) {
        self.refuse_writes.set(refuse);
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        self.raw(key)
    }

    fn save(&mut self, key: &str, value: &str) -> bool {
        if self.refuse_writes.get() {
            return false;
        }
        self.insert_raw(key, value);
        true
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at an existing directory.
    pub fn open(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a directory", root.display()),
            ));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Option<String> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Some(content),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                tracing::warn!("failed to read {key}: {err}");
                None
            }
        }
    }

    fn save(&mut self, key: &str, value: &str) -> bool {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let result = fs::write(&tmp, value).and_then(|()| fs::rename(&tmp, &path));
        if let Err(err) = result {
            tracing::warn!("failed to write {}: {err}", path.display());
            return false;
        }
        true
    }
}

/// Stored shape of a [`Document`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub kind: DocumentKind,
    pub vertical: BusinessVertical,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub tax_rate_bps: u32,
    pub sections: Vec<SectionRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SectionRecord {
    pub vertical: BusinessVertical,
    pub mode: QuoteMode,
    pub services: Vec<ServiceEntry>,
    #[serde(default)]
    pub stashed_services: Vec<ServiceEntry>,
}

impl From<&Document> for DocumentRecord {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            kind: doc.kind,
            vertical: doc.vertical(),
            client: doc.client.clone(),
            tax_rate_bps: doc.tax_rate_bps,
            sections: doc.sections().map(SectionRecord::from).collect(),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

impl From<&Section> for SectionRecord {
    fn from(section: &Section) -> Self {
        Self {
            vertical: section.vertical(),
            mode: section.mode(),
            services: section.ledger().entries().to_vec(),
            stashed_services: section.stash().to_vec(),
        }
    }
}

impl TryFrom<DocumentRecord> for Document {
    type Error = EngineError;

    fn try_from(record: DocumentRecord) -> Result<Self, Self::Error> {
        let mut sections = BTreeMap::new();
        for section in record.sections {
            let vertical = section.vertical;
            let restored = Section::restore(
                record.id,
                vertical,
                section.mode,
                section.services,
                section.stashed_services,
            )
            .map_err(|err| {
                EngineError::Persistence(format!("document {} is corrupt: {err}", record.id))
            })?;
            if sections.insert(vertical, restored).is_some() {
                return Err(EngineError::Persistence(format!(
                    "document {} has two {vertical} sections",
                    record.id
                )));
            }
        }

        let mut doc = Document::from_parts(
            record.id,
            record.kind,
            record.vertical,
            sections,
            record.created_at,
            record.updated_at,
        );
        doc.client = record.client;
        doc.tax_rate_bps = record.tax_rate_bps;
        doc.section_mut(record.vertical);
        Ok(doc)
    }
}

/// Loads and saves documents, one collection per kind.
pub struct DocumentRepository {
    store: Box<dyn KeyValueStore>,
}

impl DocumentRepository {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self::from_boxed(Box::new(store))
    }

    pub fn from_boxed(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn records(&self, kind: DocumentKind) -> ResultEngine<Vec<DocumentRecord>> {
        let key = kind.collection_key();
        match self.store.load(key) {
            None => Ok(Vec::new()),
            Some(raw) if raw.trim().is_empty() => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|err| EngineError::Persistence(format!("{key} are unreadable: {err}"))),
        }
    }

    fn write(&mut self, kind: DocumentKind, records: &[DocumentRecord]) -> ResultEngine<()> {
        let key = kind.collection_key();
        let payload = serde_json::to_string_pretty(records)
            .map_err(|err| EngineError::Persistence(format!("cannot encode {key}: {err}")))?;
        if !self.store.save(key, &payload) {
            tracing::warn!("store refused to write {key}");
            return Err(EngineError::Persistence(format!("could not save {key}")));
        }
        Ok(())
    }

    pub fn load_all(&self, kind: DocumentKind) -> ResultEngine<Vec<Document>> {
        self.records(kind)?
            .into_iter()
            .map(Document::try_from)
            .collect()
    }

    pub fn load(&self, kind: DocumentKind, id: DocumentId) -> ResultEngine<Document> {
        let record = self
            .records(kind)?
            .into_iter()
            .find(|record| record.id == id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("{kind} {id}")))?;
        Document::try_from(record)
    }

    /// Inserts or overwrites the document.
    pub fn save(&mut self, doc: &Document) -> ResultEngine<()> {
        let mut records = self.records(doc.kind)?;
        let record = DocumentRecord::from(doc);
        match records.iter_mut().find(|existing| existing.id == doc.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        self.write(doc.kind, &records)?;
        tracing::info!("saved {} {}", doc.kind, doc.id);
        Ok(())
    }

    pub fn delete(&mut self, kind: DocumentKind, id: DocumentId) -> ResultEngine<()> {
        let mut records = self.records(kind)?;
        let before = records.len();
        records.retain(|record| record.id != id);
        if records.len() == before {
            return Err(EngineError::KeyNotFound(format!("{kind} {id}")));
        }
        self.write(kind, &records)?;
        tracing::info!("deleted {kind} {id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MoneyCents, Quantity, build_custom, build_itemized};

    fn sample_document() -> Document {
        let mut doc = Document::new(DocumentKind::Estimate, BusinessVertical::Concrete);
        doc.client = Some("Hartley residence".to_string());
        doc.tax_rate_bps = 650;
        let concrete = doc.section_mut(BusinessVertical::Concrete);
        concrete
            .add_itemized(
                build_itemized(
                    BusinessVertical::Concrete,
                    "Driveway leveling",
                    Quantity::whole(120),
                    "sqft",
                    MoneyCents::new(4_50),
                )
                .unwrap(),
            )
            .unwrap();
        concrete.switch_mode(QuoteMode::Custom).unwrap();
        concrete
            .add_flat(
                build_custom(
                    BusinessVertical::Concrete,
                    "Whole job\nincludes sealing",
                    MoneyCents::new(600_00),
                )
                .unwrap(),
            )
            .unwrap();
        doc.set_vertical(BusinessVertical::Masonry);
        doc
    }

    #[test]
    fn absent_collection_is_empty() {
        let repo = DocumentRepository::new(MemoryStore::new());
        assert!(repo.load_all(DocumentKind::Invoice).unwrap().is_empty());
    }

    #[test]
    fn save_and_load_round_trips_sections_and_stash() {
        let store = MemoryStore::new();
        let mut repo = DocumentRepository::new(store.clone());
        let doc = sample_document();
        repo.save(&doc).unwrap();
        assert!(store.raw("estimates").is_some());
        assert!(store.raw("invoices").is_none());

        let loaded = repo.load(DocumentKind::Estimate, doc.id).unwrap();
        assert_eq!(loaded.vertical(), BusinessVertical::Masonry);
        assert_eq!(loaded.client.as_deref(), Some("Hartley residence"));
        assert_eq!(loaded.totals().unwrap(), doc.totals().unwrap());
        let concrete = loaded.section(BusinessVertical::Concrete).unwrap();
        let original = doc.section(BusinessVertical::Concrete).unwrap();
        assert_eq!(concrete.mode(), QuoteMode::Custom);
        assert_eq!(concrete.ledger().entries(), original.ledger().entries());
        assert_eq!(concrete.stash(), original.stash());
        assert_eq!(
            concrete.custom_quote().unwrap().description.as_str(),
            "Whole job\nincludes sealing"
        );
    }

    #[test]
    fn save_overwrites_by_id() {
        let mut repo = DocumentRepository::new(MemoryStore::new());
        let mut doc = sample_document();
        repo.save(&doc).unwrap();
        doc.client = Some("Updated".to_string());
        repo.save(&doc).unwrap();

        let all = repo.load_all(DocumentKind::Estimate).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].client.as_deref(), Some("Updated"));
    }

    #[test]
    fn refused_write_is_a_persistence_error() {
        let store = MemoryStore::new();
        store.refuse_writes(true);
        let mut repo = DocumentRepository::new(store);
        let err = repo.save(&sample_document()).unwrap_err();
        assert!(matches!(err, EngineError::Persistence(_)));
    }

    #[test]
    fn corrupt_records_are_reported() {
        let store = MemoryStore::new();
        store.insert_raw("invoices", "{not json");
        let repo = DocumentRepository::new(store.clone());
        assert!(matches!(
            repo.load_all(DocumentKind::Invoice),
            Err(EngineError::Persistence(_))
        ));

        // A stored zero amount never makes it back into a ledger.
        let mut doc = Document::new(DocumentKind::Invoice, BusinessVertical::Concrete);
        doc.section_mut(BusinessVertical::Concrete)
            .add_itemized(
                build_custom(BusinessVertical::Concrete, "Slab", MoneyCents::new(100)).unwrap(),
            )
            .unwrap();
        let json = serde_json::to_string(&[DocumentRecord::from(&doc)])
            .unwrap()
            .replace("\"flat_amount\":100", "\"flat_amount\":0");
        store.insert_raw("invoices", &json);
        assert!(matches!(
            repo.load(DocumentKind::Invoice, doc.id),
            Err(EngineError::Persistence(_))
        ));
    }

    #[test]
    fn delete_removes_only_the_target() {
        let mut repo = DocumentRepository::new(MemoryStore::new());
        let first = Document::new(DocumentKind::Invoice, BusinessVertical::Concrete);
        let second = Document::new(DocumentKind::Invoice, BusinessVertical::Masonry);
        repo.save(&first).unwrap();
        repo.save(&second).unwrap();

        repo.delete(DocumentKind::Invoice, first.id).unwrap();
        let left = repo.load_all(DocumentKind::Invoice).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, second.id);
        assert!(matches!(
            repo.delete(DocumentKind::Invoice, first.id),
            Err(EngineError::KeyNotFound(_))
        ));
    }
}
