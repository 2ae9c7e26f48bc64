//! # MongoDB Store
//!
//! Backend over the official async MongoDB driver. Documents cross the
//! boundary as JSON; `_id` object ids are flattened to their hex form on the
//! way out.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, Bson, Document as BsonDocument};
use mongodb::{Client, Collection, Database};
use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::id::DocumentId;
use super::search::SearchQuery;
use super::{Document, DocumentStore, WriteOutcome, ID_FIELD};

/// MongoDB-backed document store
#[derive(Debug, Clone)]
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    /// Connect to `uri` and bind to `database`
    pub async fn connect(uri: &str, database: &str) -> StoreResult<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self {
            database: client.database(database),
        })
    }

    fn collection(&self, name: &str) -> Collection<BsonDocument> {
        self.database.collection(name)
    }
}

fn id_filter(id: &DocumentId) -> BsonDocument {
    doc! { ID_FIELD: id.object_id() }
}

/// Convert a JSON document into BSON
pub(crate) fn to_bson(doc: &Document) -> StoreResult<BsonDocument> {
    Ok(bson::to_document(doc)?)
}

/// Convert a stored BSON document into JSON
pub(crate) fn to_json(mut doc: BsonDocument) -> Document {
    if let Ok(oid) = doc.get_object_id(ID_FIELD) {
        doc.insert(ID_FIELD, oid.to_hex());
    }

    match Bson::Document(doc).into_relaxed_extjson() {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

/// `$or` of case-insensitive `$regex` clauses, one per search field
pub(crate) fn search_filter(query: &SearchQuery) -> BsonDocument {
    if query.matches_everything() {
        return BsonDocument::new();
    }

    let pattern = query.pattern();
    let clauses: Vec<BsonDocument> = query
        .fields()
        .iter()
        .map(|field| {
            let mut clause = BsonDocument::new();
            clause.insert(field.as_str(), doc! { "$regex": pattern.as_str(), "$options": "i" });
            clause
        })
        .collect();

    doc! { "$or": clauses }
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn ping(&self) -> StoreResult<()> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let cursor = self.collection(collection).find(doc! {}).await?;
        let docs: Vec<BsonDocument> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(to_json).collect())
    }

    async fn insert(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> StoreResult<Vec<Document>> {
        let mut stored = Vec::with_capacity(documents.len());
        let mut encoded = Vec::with_capacity(documents.len());

        for doc in documents {
            let id = DocumentId::generate();

            let mut bson_doc = doc! { ID_FIELD: id.object_id() };
            bson_doc.extend(to_bson(&doc)?);
            encoded.push(bson_doc);

            let mut json_doc = Document::new();
            json_doc.insert(ID_FIELD.to_string(), Value::String(id.to_hex()));
            json_doc.extend(doc);
            stored.push(json_doc);
        }

        self.collection(collection).insert_many(&encoded).await?;
        Ok(stored)
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> StoreResult<Option<Document>> {
        let found = self.collection(collection).find_one(id_filter(id)).await?;
        Ok(found.map(to_json))
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
        patch: Document,
    ) -> StoreResult<WriteOutcome> {
        let update = doc! { "$set": to_bson(&patch)? };
        let result = self
            .collection(collection)
            .update_one(id_filter(id), update)
            .await?;
        Ok(WriteOutcome::new(result.matched_count))
    }

    async fn delete_by_id(&self, collection: &str, id: &DocumentId) -> StoreResult<WriteOutcome> {
        let result = self.collection(collection).delete_one(id_filter(id)).await?;
        Ok(WriteOutcome::new(result.deleted_count))
    }

    async fn search(&self, collection: &str, query: &SearchQuery) -> StoreResult<Vec<Document>> {
        let cursor = self.collection(collection).find(search_filter(query)).await?;
        let docs: Vec<BsonDocument> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(to_json).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;
    use serde_json::json;

    #[test]
    fn test_to_json_flattens_object_id() {
        let oid = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        let stored = doc! { "_id": oid, "subject": "Math", "spaces": 5 };

        let json = to_json(stored);
        assert_eq!(json["_id"], "507f1f77bcf86cd799439011");
        assert_eq!(json["subject"], "Math");
        assert_eq!(json["spaces"], 5);
    }

    #[test]
    fn test_to_bson_keeps_nested_values() {
        let doc = json!({"subject": "Math", "tags": ["a", "b"], "meta": {"level": 2}});
        let bson_doc = to_bson(doc.as_object().unwrap()).unwrap();

        assert_eq!(bson_doc.get_str("subject").unwrap(), "Math");
        assert_eq!(bson_doc.get_array("tags").unwrap().len(), 2);
        assert!(bson_doc.get_document("meta").is_ok());
    }

    #[test]
    fn test_search_filter_ors_escaped_regex() {
        let query = SearchQuery::with_default_fields("a+b").unwrap();
        let filter = search_filter(&query);

        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 4);

        let first = clauses[0].as_document().unwrap();
        let subject = first.get_document("subject").unwrap();
        assert_eq!(subject.get_str("$regex").unwrap(), r"a\+b");
        assert_eq!(subject.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn test_empty_search_filter_matches_everything() {
        let query = SearchQuery::with_default_fields("").unwrap();
        assert!(search_filter(&query).is_empty());
    }
}
