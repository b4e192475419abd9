//! Session-scoped language preference and remote configuration state.
//!
//! The store is the only writer of its state. Readers subscribe through a `watch`
//! channel and always see whole snapshots.
//!
//! A fetch result is committed only if its language is still the active one when it
//! completes. In-flight fetches are never cancelled; stale results are dropped on arrival.

use crate::clients::ConfigSource;
use crate::errors::ConfigFetchError;
use crate::preferences::storage::PreferenceStorage;
use crate::types::{CargoType, ConfigPayload, Language};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceState {
    pub active_language: Language,
    pub config: Option<Arc<ConfigPayload>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreState {
    Uninitialized,
    Ready(PreferenceState),
}

impl StoreState {
    fn ready(language: Language) -> Self {
        StoreState::Ready(PreferenceState {
            active_language: language,
            config: None,
        })
    }

    /// Active language; `en` before initialisation.
    pub fn active_language(&self) -> Language {
        match self {
            StoreState::Uninitialized => Language::En,
            StoreState::Ready(state) => state.active_language,
        }
    }

    pub fn config(&self) -> Option<&Arc<ConfigPayload>> {
        match self {
            StoreState::Uninitialized => None,
            StoreState::Ready(state) => state.config.as_ref(),
        }
    }
}

/// Result of starting a session.
pub struct SessionStart {
    /// Language read back from durable storage, if any.
    pub restored: Option<Language>,
    pub fetch: JoinHandle<()>,
}

pub struct PreferenceStore {
    state: watch::Sender<StoreState>,
    storage: Arc<dyn PreferenceStorage>,
    source: Arc<dyn ConfigSource>,
    last_fetch_error: Mutex<Option<String>>,
}

impl PreferenceStore {
    pub fn new(storage: Arc<dyn PreferenceStorage>, source: Arc<dyn ConfigSource>) -> Arc<Self> {
        let (state, _) = watch::channel(StoreState::Uninitialized);
        Arc::new(Self {
            state,
            storage,
            source,
            last_fetch_error: Mutex::new(None),
        })
    }

    /// Seed the active language from storage (default `en`) and fetch its configuration.
    /// Does not wait for geolocation; the store is usable as soon as this returns.
    pub fn initialize(self: &Arc<Self>) -> SessionStart {
        let restored = match self.storage.load() {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "could not read stored language preference");
                None
            }
        };
        let language = restored.unwrap_or_default();

        self.state.send_modify(|state| {
            if matches!(state, StoreState::Uninitialized) {
                *state = StoreState::ready(language);
            }
        });
        let active = self.active_language();
        info!(language = %active, restored = restored.is_some(), "language preference ready");

        SessionStart {
            restored,
            fetch: self.spawn_fetch(active),
        }
    }

    /// Explicit user switch: becomes active immediately, is persisted, then fetched.
    pub fn switch_language(self: &Arc<Self>, language: Language) -> JoinHandle<()> {
        self.state.send_modify(|state| *state = StoreState::ready(language));
        if let Err(e) = self.storage.save(language) {
            warn!(error = %e, %language, "could not persist language preference");
        }
        info!(%language, "language switched");
        self.spawn_fetch(language)
    }

    /// Re-fetch the active language. The current config stays until a new one commits.
    pub fn refresh(self: &Arc<Self>) -> JoinHandle<()> {
        self.spawn_fetch(self.active_language())
    }

    fn spawn_fetch(self: &Arc<Self>, language: Language) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let result = store.source.fetch(language).await;
            store.commit(language, result);
        })
    }

    fn commit(&self, language: Language, result: Result<ConfigPayload, ConfigFetchError>) {
        match result {
            Ok(payload) => {
                let payload = Arc::new(payload);
                let committed = self.state.send_if_modified(|state| match state {
                    StoreState::Ready(current) if current.active_language == language => {
                        current.config = Some(payload);
                        true
                    }
                    _ => false,
                });
                if committed {
                    *self.last_fetch_error.lock() = None;
                    debug!(%language, "configuration committed");
                } else {
                    debug!(%language, "discarding configuration for inactive language");
                }
            }
            Err(e) if self.active_language() != language => {
                debug!(%language, error = %e, "ignoring failed fetch for inactive language");
            }
            Err(e) => {
                warn!(%language, error = %e, "failed to load configuration");
                *self.last_fetch_error.lock() = Some(e.to_string());
            }
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> StoreState {
        self.state.borrow().clone()
    }

    pub fn active_language(&self) -> Language {
        self.state.borrow().active_language()
    }

    /// Diagnostic only; fetch failures are never raised.
    pub fn last_fetch_error(&self) -> Option<String> {
        self.last_fetch_error.lock().clone()
    }

    /// Translation at a dotted key path, or `fallback` when absent.
    pub fn translate(&self, key_path: &str, fallback: &str) -> String {
        self.state
            .borrow()
            .config()
            .and_then(|config| config.translation(key_path))
            .unwrap_or(fallback)
            .to_string()
    }

    pub fn t(&self, key_path: &str) -> String {
        self.translate(key_path, "")
    }

    pub fn cargo_types(&self) -> Vec<CargoType> {
        self.state
            .borrow()
            .config()
            .map(|config| config.cargo_types.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::storage::MemoryPreferenceStorage;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Semaphore;

    /// Each fetch waits for a permit on its language's gate before answering.
    struct GatedSource {
        gates: HashMap<Language, Arc<Semaphore>>,
        failing: AtomicBool,
    }

    impl GatedSource {
        fn new() -> Arc<Self> {
            let gates = [Language::En, Language::Zh]
                .into_iter()
                .map(|lang| (lang, Arc::new(Semaphore::new(0))))
                .collect();
            Arc::new(Self {
                gates,
                failing: AtomicBool::new(false),
            })
        }

        fn release(&self, language: Language) {
            self.gates[&language].add_permits(1);
        }
    }

    fn payload_for(language: Language) -> ConfigPayload {
        ConfigPayload::from_parts(
            Some(&json!({ "lang": language.code(), "nav": { "home": format!("home-{language}") } })),
            vec![CargoType {
                id: "general".to_string(),
                name: format!("general-{language}"),
                value: "general".to_string(),
            }],
        )
    }

    #[async_trait]
    impl ConfigSource for GatedSource {
        async fn fetch(&self, language: Language) -> Result<ConfigPayload, ConfigFetchError> {
            self.gates[&language]
                .acquire()
                .await
                .expect("gate closed")
                .forget();
            if self.failing.load(Ordering::SeqCst) {
                return Err(ConfigFetchError::Api("unavailable".to_string()));
            }
            Ok(payload_for(language))
        }
    }

    fn store_with(
        storage: MemoryPreferenceStorage,
        source: &Arc<GatedSource>,
    ) -> (Arc<PreferenceStore>, Arc<MemoryPreferenceStorage>) {
        let storage = Arc::new(storage);
        let store = PreferenceStore::new(storage.clone(), source.clone());
        (store, storage)
    }

    #[tokio::test]
    async fn test_starts_uninitialized_with_english_default() {
        let source = GatedSource::new();
        let (store, _) = store_with(MemoryPreferenceStorage::new(), &source);
        assert_eq!(store.snapshot(), StoreState::Uninitialized);
        assert_eq!(store.active_language(), Language::En);
    }

    #[tokio::test]
    async fn test_initialize_without_stored_preference() {
        let source = GatedSource::new();
        let (store, storage) = store_with(MemoryPreferenceStorage::new(), &source);

        let start = store.initialize();
        assert_eq!(start.restored, None);
        assert_eq!(
            store.snapshot(),
            StoreState::Ready(PreferenceState {
                active_language: Language::En,
                config: None,
            })
        );
        // Default-first: nothing is persisted until the user chooses.
        assert_eq!(storage.load().unwrap(), None);

        source.release(Language::En);
        start.fetch.await.unwrap();
        assert_eq!(store.t("lang"), "en");
        assert_eq!(store.cargo_types()[0].name, "general-en");
    }

    #[tokio::test]
    async fn test_initialize_restores_stored_language() {
        let source = GatedSource::new();
        let (store, _) = store_with(MemoryPreferenceStorage::with_value(Language::Zh), &source);

        let start = store.initialize();
        assert_eq!(start.restored, Some(Language::Zh));
        assert_eq!(store.active_language(), Language::Zh);

        source.release(Language::Zh);
        start.fetch.await.unwrap();
        assert_eq!(store.translate("nav.home", "Home"), "home-zh");
    }

    #[tokio::test]
    async fn test_switch_persists_and_resets_config() {
        let source = GatedSource::new();
        let (store, storage) = store_with(MemoryPreferenceStorage::new(), &source);
        let start = store.initialize();
        source.release(Language::En);
        start.fetch.await.unwrap();
        assert!(store.snapshot().config().is_some());

        let fetch = store.switch_language(Language::Zh);
        assert_eq!(store.active_language(), Language::Zh);
        assert!(store.snapshot().config().is_none());
        assert_eq!(storage.load().unwrap(), Some(Language::Zh));

        source.release(Language::Zh);
        fetch.await.unwrap();
        assert_eq!(store.t("lang"), "zh");
    }

    #[tokio::test]
    async fn test_late_payload_for_previous_language_is_discarded() {
        let source = GatedSource::new();
        let (store, _) = store_with(MemoryPreferenceStorage::new(), &source);

        let initial = store.initialize().fetch;
        let to_zh = store.switch_language(Language::Zh);
        let back_to_en = store.switch_language(Language::En);

        source.release(Language::En);
        source.release(Language::En);
        initial.await.unwrap();
        back_to_en.await.unwrap();
        assert_eq!(store.t("lang"), "en");

        // zh completes after the second switch
        source.release(Language::Zh);
        to_zh.await.unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.active_language(), Language::En);
        assert_eq!(store.t("lang"), "en");
        assert_eq!(store.cargo_types()[0].name, "general-en");
    }

    #[tokio::test]
    async fn test_late_failure_for_previous_language_is_ignored() {
        let source = GatedSource::new();
        let (store, _) = store_with(MemoryPreferenceStorage::new(), &source);

        let initial = store.initialize().fetch;
        let to_zh = store.switch_language(Language::Zh);
        let back_to_en = store.switch_language(Language::En);

        source.release(Language::En);
        source.release(Language::En);
        initial.await.unwrap();
        back_to_en.await.unwrap();
        assert!(store.snapshot().config().is_some());

        // zh fails after en is active again
        source.failing.store(true, Ordering::SeqCst);
        source.release(Language::Zh);
        to_zh.await.unwrap();

        assert_eq!(store.active_language(), Language::En);
        assert_eq!(store.t("lang"), "en");
        assert_eq!(store.last_fetch_error(), None);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_last_good_config() {
        let source = GatedSource::new();
        let (store, _) = store_with(MemoryPreferenceStorage::new(), &source);
        let start = store.initialize();
        source.release(Language::En);
        start.fetch.await.unwrap();
        let before = store.snapshot();

        source.failing.store(true, Ordering::SeqCst);
        let refresh = store.refresh();
        source.release(Language::En);
        refresh.await.unwrap();

        assert_eq!(store.snapshot(), before);
        assert_eq!(store.t("lang"), "en");
        assert!(store.last_fetch_error().unwrap().contains("unavailable"));
    }

    #[tokio::test]
    async fn test_missing_key_returns_fallback() {
        let source = GatedSource::new();
        let (store, _) = store_with(MemoryPreferenceStorage::new(), &source);
        assert_eq!(store.translate("nav.home", "Home"), "Home");
        assert_eq!(store.t("nav.home"), "");

        let start = store.initialize();
        source.release(Language::En);
        start.fetch.await.unwrap();
        assert_eq!(store.translate("does.not.exist", "fallback"), "fallback");
        assert_eq!(store.t("nav"), "");
    }

    #[tokio::test]
    async fn test_subscribers_are_notified() {
        let source = GatedSource::new();
        let (store, _) = store_with(MemoryPreferenceStorage::new(), &source);
        let mut rx = store.subscribe();

        let start = store.initialize();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().active_language(), Language::En);

        source.release(Language::En);
        start.fetch.await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().config().is_some());
    }
}
