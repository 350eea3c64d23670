//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::traits::LedgerStore;
use crate::types::{LedgerError, LedgerResult, LineItem, MatchRecord, Period, TransactionHeader};

/// In-memory storage implementation for testing and development
#[derive(Debug, Clone)]
pub struct MemoryStore {
    headers: Arc<RwLock<HashMap<String, TransactionHeader>>>,
    lines: Arc<RwLock<HashMap<String, Vec<LineItem>>>>,
    matches: Arc<RwLock<HashMap<String, MatchRecord>>>,
}

impl MemoryStore {
    /// Create a new memory store instance
    pub fn new() -> Self {
        Self {
            headers: Arc::new(RwLock::new(HashMap::new())),
            lines: Arc::new(RwLock::new(HashMap::new())),
            matches: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.headers.write().unwrap().clear();
        self.lines.write().unwrap().clear();
        self.matches.write().unwrap().clear();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn save_header(&mut self, header: &TransactionHeader) -> LedgerResult<()> {
        self.headers
            .write()
            .unwrap()
            .insert(header.id.clone(), header.clone());
        Ok(())
    }

    async fn get_header(&self, header_id: &str) -> LedgerResult<Option<TransactionHeader>> {
        Ok(self.headers.read().unwrap().get(header_id).cloned())
    }

    async fn list_headers(&self) -> LedgerResult<Vec<TransactionHeader>> {
        let mut headers: Vec<TransactionHeader> =
            self.headers.read().unwrap().values().cloned().collect();
        headers.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(headers)
    }

    async fn update_header(&mut self, header: &TransactionHeader) -> LedgerResult<()> {
        if self.headers.read().unwrap().contains_key(&header.id) {
            self.headers
                .write()
                .unwrap()
                .insert(header.id.clone(), header.clone());
            Ok(())
        } else {
            Err(LedgerError::HeaderNotFound(header.id.clone()))
        }
    }

    async fn save_lines(&mut self, header_id: &str, lines: &[LineItem]) -> LedgerResult<()> {
        self.lines
            .write()
            .unwrap()
            .insert(header_id.to_string(), lines.to_vec());
        Ok(())
    }

    async fn get_lines(&self, header_id: &str) -> LedgerResult<Vec<LineItem>> {
        Ok(self
            .lines
            .read()
            .unwrap()
            .get(header_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_match(&mut self, record: &MatchRecord) -> LedgerResult<()> {
        self.matches
            .write()
            .unwrap()
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn get_match(&self, match_id: &str) -> LedgerResult<Option<MatchRecord>> {
        Ok(self.matches.read().unwrap().get(match_id).cloned())
    }

    async fn update_match(&mut self, record: &MatchRecord) -> LedgerResult<()> {
        if self.matches.read().unwrap().contains_key(&record.id) {
            self.matches
                .write()
                .unwrap()
                .insert(record.id.clone(), record.clone());
            Ok(())
        } else {
            Err(LedgerError::MatchNotFound(record.id.clone()))
        }
    }

    async fn delete_match(&mut self, match_id: &str) -> LedgerResult<()> {
        if self.matches.write().unwrap().remove(match_id).is_some() {
            Ok(())
        } else {
            Err(LedgerError::MatchNotFound(match_id.to_string()))
        }
    }

    async fn matches_for_header(&self, header_id: &str) -> LedgerResult<Vec<MatchRecord>> {
        let mut records: Vec<MatchRecord> = self
            .matches
            .read()
            .unwrap()
            .values()
            .filter(|m| m.involves(header_id))
            .cloned()
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn matches_after_period(&self, period: &Period) -> LedgerResult<Vec<MatchRecord>> {
        Ok(self
            .matches
            .read()
            .unwrap()
            .values()
            .filter(|m| &m.period > period)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionType;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    fn header(id: &str) -> TransactionHeader {
        TransactionHeader::new(
            id.to_string(),
            format!("REF-{id}"),
            TransactionType::Invoice,
            BigDecimal::from(100),
            NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            None,
            Period::new("202608"),
        )
    }

    #[tokio::test]
    async fn test_header_round_trip() {
        let mut store = MemoryStore::new();
        store.save_header(&header("h1")).await.unwrap();
        let loaded = store.get_header("h1").await.unwrap().unwrap();
        assert_eq!(loaded.reference, "REF-h1");
        assert!(store.get_header("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_header_fails() {
        let mut store = MemoryStore::new();
        let result = store.update_header(&header("h1")).await;
        assert!(matches!(result, Err(LedgerError::HeaderNotFound(_))));
    }

    #[tokio::test]
    async fn test_matches_for_header_covers_both_sides() {
        let mut store = MemoryStore::new();
        let m1 = MatchRecord::new(
            "a".to_string(),
            "b".to_string(),
            BigDecimal::from(10),
            Period::new("202608"),
        );
        let m2 = MatchRecord::new(
            "c".to_string(),
            "a".to_string(),
            BigDecimal::from(20),
            Period::new("202608"),
        );
        store.save_match(&m1).await.unwrap();
        store.save_match(&m2).await.unwrap();

        let records = store.matches_for_header("a").await.unwrap();
        assert_eq!(records.len(), 2);
        let records = store.matches_for_header("b").await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_matches_after_period() {
        let mut store = MemoryStore::new();
        let m1 = MatchRecord::new(
            "a".to_string(),
            "b".to_string(),
            BigDecimal::from(10),
            Period::new("202607"),
        );
        let m2 = MatchRecord::new(
            "a".to_string(),
            "c".to_string(),
            BigDecimal::from(20),
            Period::new("202609"),
        );
        store.save_match(&m1).await.unwrap();
        store.save_match(&m2).await.unwrap();

        let later = store.matches_after_period(&Period::new("202608")).await.unwrap();
        assert_eq!(later.len(), 1);
        assert_eq!(later[0].matched_to, "c");
    }
}
