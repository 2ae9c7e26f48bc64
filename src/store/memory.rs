//! # In-Memory Store
//!
//! Process-local backend used for development (`memory://`) and tests.
//! Documents are kept per collection in insertion order.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::id::DocumentId;
use super::search::SearchQuery;
use super::{Document, DocumentStore, WriteOutcome, ID_FIELD};

/// Connection string scheme selecting this backend
pub const SCHEME: &str = "memory://";

/// In-memory document store
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// collection -> documents
    data: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&HashMap<String, Vec<Document>>) -> T) -> StoreResult<T> {
        let data = self
            .data
            .read()
            .map_err(|_| StoreError::Backend("Lock poisoned".to_string()))?;
        Ok(f(&data))
    }

    fn write<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, Vec<Document>>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut data = self
            .data
            .write()
            .map_err(|_| StoreError::Backend("Lock poisoned".to_string()))?;
        f(&mut data)
    }

    fn has_id(doc: &Document, id: &DocumentId) -> bool {
        doc.get(ID_FIELD).and_then(Value::as_str) == Some(id.to_hex().as_str())
    }
}

/// Assign `value` at a dotted path, creating intermediate objects
fn set_path(doc: &mut Document, path: &str, value: Value) -> StoreResult<()> {
    if path.split('.').any(str::is_empty) {
        return Err(StoreError::InvalidDocument(format!(
            "field path '{path}' has an empty segment"
        )));
    }

    let mut segments = path.split('.').peekable();
    let mut current = doc;

    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return Ok(());
        }

        let next = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Document::new()));
        current = next.as_object_mut().ok_or_else(|| {
            StoreError::InvalidDocument(format!(
                "cannot create field '{path}': '{segment}' is not an object"
            ))
        })?;
    }

    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        self.read(|_| ())
    }

    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.read(|data| data.get(collection).cloned().unwrap_or_default())
    }

    async fn insert(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> StoreResult<Vec<Document>> {
        let stored: Vec<Document> = documents
            .into_iter()
            .map(|doc| {
                let mut with_id = Document::new();
                with_id.insert(
                    ID_FIELD.to_string(),
                    Value::String(DocumentId::generate().to_hex()),
                );
                with_id.extend(doc);
                with_id
            })
            .collect();

        self.write(|data| {
            data.entry(collection.to_string())
                .or_default()
                .extend(stored.iter().cloned());
            Ok(())
        })?;

        Ok(stored)
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> StoreResult<Option<Document>> {
        self.read(|data| {
            data.get(collection)
                .and_then(|docs| docs.iter().find(|doc| Self::has_id(doc, id)))
                .cloned()
        })
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
        patch: Document,
    ) -> StoreResult<WriteOutcome> {
        self.write(|data| {
            let Some(doc) = data
                .get_mut(collection)
                .and_then(|docs| docs.iter_mut().find(|doc| Self::has_id(doc, id)))
            else {
                return Ok(WriteOutcome::new(0));
            };

            // Apply to a copy so a failing path leaves the document untouched
            let mut updated = doc.clone();
            for (path, value) in patch {
                set_path(&mut updated, &path, value)?;
            }
            *doc = updated;

            Ok(WriteOutcome::new(1))
        })
    }

    async fn delete_by_id(&self, collection: &str, id: &DocumentId) -> StoreResult<WriteOutcome> {
        self.write(|data| {
            let Some(docs) = data.get_mut(collection) else {
                return Ok(WriteOutcome::new(0));
            };
            match docs.iter().position(|doc| Self::has_id(doc, id)) {
                Some(index) => {
                    docs.remove(index);
                    Ok(WriteOutcome::new(1))
                }
                None => Ok(WriteOutcome::new(0)),
            }
        })
    }

    async fn search(&self, collection: &str, query: &SearchQuery) -> StoreResult<Vec<Document>> {
        self.read(|data| {
            data.get(collection)
                .map(|docs| docs.iter().filter(|doc| query.matches(doc)).cloned().collect())
                .unwrap_or_default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn id_of(doc: &Document) -> DocumentId {
        doc[ID_FIELD].as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn test_find_all_on_unknown_collection_is_empty() {
        let store = MemoryStore::new();
        assert!(store.find_all("nothing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_assigns_ids_and_preserves_fields() {
        let store = MemoryStore::new();
        let inserted = store
            .insert("items", vec![doc(json!({"subject": "Algebra"})), doc(json!({"subject": "Art"}))])
            .await
            .unwrap();

        assert_eq!(inserted.len(), 2);
        assert_ne!(inserted[0][ID_FIELD], inserted[1][ID_FIELD]);
        assert_eq!(inserted[0]["subject"], "Algebra");

        let all = store.find_all("items").await.unwrap();
        assert_eq!(all, inserted);
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = MemoryStore::new();
        store.insert("a", vec![doc(json!({"x": 1}))]).await.unwrap();
        assert!(store.find_all("b").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let store = MemoryStore::new();
        let inserted = store.insert("items", vec![doc(json!({"x": 1}))]).await.unwrap();
        let id = id_of(&inserted[0]);

        let found = store.find_by_id("items", &id).await.unwrap();
        assert_eq!(found, Some(inserted[0].clone()));

        let missing = store.find_by_id("items", &DocumentId::generate()).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MemoryStore::new();
        let inserted = store
            .insert("items", vec![doc(json!({"subject": "Algebra", "price": "10"}))])
            .await
            .unwrap();
        let id = id_of(&inserted[0]);

        let outcome = store
            .update_by_id("items", &id, doc(json!({"price": "15"})))
            .await
            .unwrap();
        assert!(outcome.is_single());

        let found = store.find_by_id("items", &id).await.unwrap().unwrap();
        assert_eq!(found["price"], "15");
        assert_eq!(found["subject"], "Algebra");
    }

    #[tokio::test]
    async fn test_update_is_idempotent() {
        let store = MemoryStore::new();
        let inserted = store.insert("items", vec![doc(json!({"a": 1}))]).await.unwrap();
        let id = id_of(&inserted[0]);

        let first = store.update_by_id("items", &id, doc(json!({"a": 2}))).await.unwrap();
        let after_first = store.find_by_id("items", &id).await.unwrap();
        let second = store.update_by_id("items", &id, doc(json!({"a": 2}))).await.unwrap();
        let after_second = store.find_by_id("items", &id).await.unwrap();

        assert!(first.is_single());
        assert!(second.is_single());
        assert_eq!(after_first, after_second);
    }

    #[tokio::test]
    async fn test_update_dotted_path() {
        let store = MemoryStore::new();
        let inserted = store
            .insert("items", vec![doc(json!({"meta": {"a": 1, "b": 2}}))])
            .await
            .unwrap();
        let id = id_of(&inserted[0]);

        store
            .update_by_id("items", &id, doc(json!({"meta.a": 9, "new.deep": true})))
            .await
            .unwrap();

        let found = store.find_by_id("items", &id).await.unwrap().unwrap();
        assert_eq!(found["meta"], json!({"a": 9, "b": 2}));
        assert_eq!(found["new"], json!({"deep": true}));
    }

    #[tokio::test]
    async fn test_update_through_scalar_fails_without_partial_write() {
        let store = MemoryStore::new();
        let inserted = store
            .insert("items", vec![doc(json!({"a": 1, "b": 1}))])
            .await
            .unwrap();
        let id = id_of(&inserted[0]);

        let result = store
            .update_by_id("items", &id, doc(json!({"b": 5, "a.x": 1})))
            .await;
        assert!(matches!(result, Err(StoreError::InvalidDocument(_))));

        let found = store.find_by_id("items", &id).await.unwrap().unwrap();
        assert_eq!(found["b"], 1);
    }

    #[tokio::test]
    async fn test_update_missing_matches_nothing() {
        let store = MemoryStore::new();
        let outcome = store
            .update_by_id("items", &DocumentId::generate(), doc(json!({"a": 1})))
            .await
            .unwrap();
        assert_eq!(outcome.matched, 0);
    }

    #[tokio::test]
    async fn test_delete_once() {
        let store = MemoryStore::new();
        let inserted = store
            .insert("items", vec![doc(json!({"a": 1})), doc(json!({"a": 2}))])
            .await
            .unwrap();
        let id = id_of(&inserted[0]);

        assert!(store.delete_by_id("items", &id).await.unwrap().is_single());
        assert_eq!(store.delete_by_id("items", &id).await.unwrap().matched, 0);

        let remaining = store.find_all("items").await.unwrap();
        assert_eq!(remaining, vec![inserted[1].clone()]);
    }

    #[tokio::test]
    async fn test_search() {
        let store = MemoryStore::new();
        store
            .insert(
                "lessons",
                vec![
                    doc(json!({"subject": "Math", "location": "Hendon"})),
                    doc(json!({"subject": "Music", "location": "Colindale"})),
                ],
            )
            .await
            .unwrap();

        let query = SearchQuery::with_default_fields("MATH").unwrap();
        let results = store.search("lessons", &query).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["subject"], "Math");

        let query = SearchQuery::with_default_fields("").unwrap();
        assert_eq!(store.search("lessons", &query).await.unwrap().len(), 2);
    }

    #[test]
    fn test_set_path_top_level() {
        let mut target = doc(json!({"a": 1}));
        set_path(&mut target, "a", json!(2)).unwrap();
        set_path(&mut target, "b", json!([1, 2])).unwrap();
        assert_eq!(Value::Object(target), json!({"a": 2, "b": [1, 2]}));
    }

    #[test]
    fn test_set_path_rejects_empty_segments() {
        let mut target = doc(json!({"a": {"b": 1}}));
        for path in ["", "a..b", "a.", ".a"] {
            assert!(
                matches!(
                    set_path(&mut target, path, json!(2)),
                    Err(StoreError::InvalidDocument(_))
                ),
                "'{path}' should be rejected"
            );
        }
        assert_eq!(Value::Object(target), json!({"a": {"b": 1}}));
    }
}
