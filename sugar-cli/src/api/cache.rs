//! Module field cache
//!
//! Memoizes the ordered field-name list of each module so the "all fields"
//! convenience calls describe a module at most once. Entries are never
//! evicted; a schema change on the server is only seen by a fresh cache.

use log::debug;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

use super::error::{ClientError, Result};
use super::module_name::ModuleName;

type FieldList = Arc<[String]>;

/// Per-module field lists, loaded lazily and kept for the cache's lifetime.
///
/// The map lock only covers slot lookup. Loading runs under the slot's
/// `OnceCell`, so concurrent callers for the same module wait for the first
/// load instead of issuing their own. A failed load leaves the slot empty.
#[derive(Debug, Default)]
pub struct ModuleFieldCache {
    slots: Mutex<HashMap<ModuleName, Arc<OnceCell<FieldList>>>>,
}

impl ModuleFieldCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached field list for `module`, calling `load` on a miss.
    pub async fn get_or_load<F, Fut>(&self, module: &ModuleName, load: F) -> Result<FieldList>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<String>>>,
    {
        let slot = self.slot(module);
        let fields = slot
            .get_or_try_init(|| async {
                debug!("Field cache miss for {module}, describing module");
                let fields = load().await?;
                debug!("Cached {} fields for {module}", fields.len());
                Ok::<FieldList, ClientError>(Arc::from(fields))
            })
            .await?;

        Ok(Arc::clone(fields))
    }

    /// The cached field list for `module`, without loading
    pub fn cached_fields(&self, module: &ModuleName) -> Option<FieldList> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(module).and_then(|slot| slot.get().cloned())
    }

    pub fn contains(&self, module: &ModuleName) -> bool {
        self.cached_fields(module).is_some()
    }

    /// Number of modules with a loaded field list
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|slot| slot.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, module: &ModuleName) -> Arc<OnceCell<FieldList>> {
        // A poisoned map is still consistent: slots are only ever inserted
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(module.clone()).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::ErrorValue;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn account_fields() -> Vec<String> {
        vec!["name".into(), "id".into(), "employees".into()]
    }

    #[tokio::test]
    async fn test_second_casing_hits_cache() {
        let cache = ModuleFieldCache::new();
        let calls = AtomicUsize::new(0);
        let load = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ClientError>(account_fields())
        };

        let first = cache.get_or_load(&ModuleName::new("accounts"), load).await.unwrap();
        let second = cache.get_or_load(&ModuleName::new("Accounts"), load).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(&*first, &["name", "id", "employees"]);
        assert_eq!(first, second);
        assert!(cache.contains(&ModuleName::new("ACCOUNTS")));
    }

    #[tokio::test]
    async fn test_concurrent_misses_load_once() {
        let cache = ModuleFieldCache::new();
        let calls = AtomicUsize::new(0);
        let module = ModuleName::new("leads");
        let load = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, ClientError>(vec!["first_name".to_string(), "last_name".to_string()])
        };

        let (a, b) = tokio::join!(
            cache.get_or_load(&module, load),
            cache.get_or_load(&module, load)
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_misses_across_tasks() {
        let cache = Arc::new(ModuleFieldCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_load(&ModuleName::new("opportunities"), || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        Ok(vec!["amount".to_string()])
                    })
                    .await
            }));
        }
        for handle in handles {
            assert_eq!(&*handle.await.unwrap().unwrap(), &["amount"]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let cache = ModuleFieldCache::new();
        let module = ModuleName::new("cases");

        let failed = cache
            .get_or_load(&module, || async {
                Err(ClientError::from(
                    ErrorValue::new("20", "Module Does Not Exist", "No such module")
                        .check()
                        .unwrap_err(),
                ))
            })
            .await;
        assert!(failed.is_err());
        assert!(!cache.contains(&module));
        assert!(cache.is_empty());

        let fields = cache
            .get_or_load(&module, || async { Ok(vec!["case_number".to_string()]) })
            .await
            .unwrap();
        assert_eq!(&*fields, &["case_number"]);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_modules_load_separately() {
        let cache = ModuleFieldCache::new();
        let calls = AtomicUsize::new(0);
        let load = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ClientError>(vec!["id".to_string()])
        };

        cache.get_or_load(&ModuleName::new("accounts"), load).await.unwrap();
        cache.get_or_load(&ModuleName::new("contacts"), load).await.unwrap();
        cache.get_or_load(&ModuleName::new("contacts"), load).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
        assert!(cache.cached_fields(&ModuleName::new("leads")).is_none());
    }
}
