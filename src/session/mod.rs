//! UI-facing session state with debounced search.
//!
//! This layer is the degrade boundary: persistence failures are logged and
//! collapse to an empty or unchanged view, never surfaced to the UI as errors.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::core::ids::ConversationId;
use crate::core::types::Conversation;
use crate::engine::ChatEngine;
use crate::query::ConversationGroup;

/// Navigation state for a chat client: sidebar visibility, active
/// conversation, cached grouped listing, and debounced search.
pub struct SessionController {
    engine: Arc<ChatEngine>,
    debounce: Duration,
    sidebar_open: RwLock<bool>,
    active_conversation: RwLock<Option<ConversationId>>,
    groups: Arc<RwLock<Vec<ConversationGroup>>>,
    search_results: Arc<RwLock<Vec<Conversation>>>,
    search_text: RwLock<String>,
    search_task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionController {
    /// Create a session controller over an engine. The search debounce
    /// interval comes from the engine configuration.
    #[must_use]
    pub fn new(engine: Arc<ChatEngine>) -> Self {
        let debounce = Duration::from_millis(engine.config().session.search_debounce_ms);
        Self {
            engine,
            debounce,
            sidebar_open: RwLock::new(false),
            active_conversation: RwLock::new(None),
            groups: Arc::new(RwLock::new(Vec::new())),
            search_results: Arc::new(RwLock::new(Vec::new())),
            search_text: RwLock::new(String::new()),
            search_task: Mutex::new(None),
        }
    }

    /// Whether the sidebar is open.
    pub async fn is_sidebar_open(&self) -> bool {
        *self.sidebar_open.read().await
    }

    /// Open or close the sidebar.
    pub async fn set_sidebar_open(&self, open: bool) {
        *self.sidebar_open.write().await = open;
    }

    /// Toggle the sidebar and return its new state.
    pub async fn toggle_sidebar(&self) -> bool {
        let mut guard = self.sidebar_open.write().await;
        *guard = !*guard;
        *guard
    }

    /// Currently active conversation, if any.
    pub async fn active_conversation(&self) -> Option<ConversationId> {
        *self.active_conversation.read().await
    }

    /// Make a conversation active after verifying it exists. Returns whether
    /// the selection took effect.
    pub async fn select_conversation(&self, id: ConversationId) -> bool {
        match self.engine.conversation_exists(id).await {
            Ok(true) => {
                *self.active_conversation.write().await = Some(id);
                debug!("Switched to conversation: {id}");
                true
            }
            Ok(false) => {
                warn!("Conversation not found: {id}");
                false
            }
            Err(err) => {
                error!("Failed to check conversation {id}: {err}");
                false
            }
        }
    }

    /// Clear the active conversation.
    pub async fn clear_active_conversation(&self) {
        *self.active_conversation.write().await = None;
    }

    /// Create a conversation and make it active. Returns `None` when
    /// persistence fails; the error is logged.
    pub async fn create_conversation(&self, title: Option<&str>) -> Option<Conversation> {
        match self.engine.create_conversation(title).await {
            Ok(conversation) => {
                *self.active_conversation.write().await = Some(conversation.id);
                Some(conversation)
            }
            Err(err) => {
                error!("Failed to create conversation: {err}");
                None
            }
        }
    }

    /// Rename a conversation, then reload the grouped listing.
    pub async fn rename_conversation(&self, id: ConversationId, title: &str) {
        if let Err(err) = self.engine.rename_conversation(id, title).await {
            error!("Failed to rename conversation {id}: {err}");
            return;
        }
        self.refresh().await;
    }

    /// Delete a conversation, clearing the active selection when it pointed
    /// at the deleted thread, then reload the grouped listing.
    pub async fn delete_conversation(&self, id: ConversationId) {
        if let Err(err) = self.engine.delete_conversation(id).await {
            error!("Failed to delete conversation {id}: {err}");
            return;
        }

        {
            let mut active = self.active_conversation.write().await;
            if *active == Some(id) {
                *active = None;
            }
        }
        self.refresh().await;
    }

    /// Delete every conversation and message, then reload the grouped
    /// listing.
    pub async fn clear_all(&self) {
        if let Err(err) = self.engine.clear_all().await {
            error!("Failed to clear conversations: {err}");
            return;
        }
        self.clear_active_conversation().await;
        self.refresh().await;
    }

    /// Reload the grouped listing immediately. Failures degrade to an empty
    /// list.
    pub async fn refresh(&self) {
        match self.engine.grouped_conversations().await {
            Ok(groups) => *self.groups.write().await = groups,
            Err(err) => {
                error!("Failed to load conversations: {err}");
                self.groups.write().await.clear();
            }
        }
    }

    /// Cached grouped listing.
    pub async fn groups(&self) -> Vec<ConversationGroup> {
        self.groups.read().await.clone()
    }

    /// Results of the most recent completed search.
    pub async fn search_results(&self) -> Vec<Conversation> {
        self.search_results.read().await.clone()
    }

    /// Current search text.
    pub async fn search_text(&self) -> String {
        self.search_text.read().await.clone()
    }

    /// Record a search-text change and re-query after the debounce interval.
    ///
    /// A pending query from an earlier change is aborted, so a superseded
    /// search never overwrites newer results. Blank text clears the results
    /// and reloads the grouped listing instead.
    pub async fn set_search_text(&self, text: impl Into<String>) {
        let text = text.into();
        let needle = text.trim().to_string();
        *self.search_text.write().await = text;

        let mut task_slot = self.search_task.lock().await;
        if let Some(task) = task_slot.take() {
            task.abort();
        }

        let engine = Arc::clone(&self.engine);
        let groups = Arc::clone(&self.groups);
        let results = Arc::clone(&self.search_results);
        let debounce = self.debounce;
        *task_slot = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;

            if needle.is_empty() {
                results.write().await.clear();
                match engine.grouped_conversations().await {
                    Ok(fresh) => *groups.write().await = fresh,
                    Err(err) => {
                        error!("Failed to load conversations: {err}");
                        groups.write().await.clear();
                    }
                }
                return;
            }

            match engine.search_conversations(&needle).await {
                Ok(hits) => {
                    debug!("Search for {needle:?} matched {} conversations", hits.len());
                    *results.write().await = hits;
                }
                Err(err) => {
                    error!("Search failed: {err}");
                    results.write().await.clear();
                }
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::core::config::ChatConfig;
    use crate::core::types::MessageRole;
    use crate::engine::ChatBackends;

    async fn controller() -> SessionController {
        let mut config = ChatConfig::default();
        config.storage.sqlite_path = PathBuf::from(":memory:");
        config.session.search_debounce_ms = 25;
        let backends = ChatBackends::sqlite(&config).await.unwrap();
        let engine = Arc::new(ChatEngine::new(config, backends).unwrap());
        SessionController::new(engine)
    }

    async fn seed(controller: &SessionController, title: &str) -> Conversation {
        let conversation = controller.create_conversation(Some(title)).await.unwrap();
        controller
            .engine
            .append_message(conversation.id, MessageRole::User, "seeded message")
            .await
            .unwrap();
        conversation
    }

    #[tokio::test]
    async fn test_sidebar_toggle() {
        let controller = controller().await;
        assert!(!controller.is_sidebar_open().await);
        assert!(controller.toggle_sidebar().await);
        assert!(controller.is_sidebar_open().await);
        controller.set_sidebar_open(false).await;
        assert!(!controller.is_sidebar_open().await);
    }

    #[tokio::test]
    async fn test_create_selects_and_refresh_lists_active_only() {
        let controller = controller().await;
        let seeded = seed(&controller, "Thread").await;
        controller.create_conversation(Some("Empty thread")).await.unwrap();

        controller.refresh().await;
        let groups = controller.groups().await;
        let ids: Vec<ConversationId> = groups
            .iter()
            .flat_map(|g| g.conversations.iter().map(|c| c.id))
            .collect();
        assert_eq!(ids, vec![seeded.id]);
        // The most recent create is the active conversation.
        assert!(controller.active_conversation().await.is_some());
        assert_ne!(controller.active_conversation().await, Some(seeded.id));
    }

    #[tokio::test]
    async fn test_select_requires_existing_conversation() {
        let controller = controller().await;
        let seeded = seed(&controller, "Thread").await;

        assert!(!controller.select_conversation(ConversationId::new()).await);
        assert!(controller.select_conversation(seeded.id).await);
        assert_eq!(controller.active_conversation().await, Some(seeded.id));
    }

    #[tokio::test]
    async fn test_rename_updates_grouped_listing() {
        let controller = controller().await;
        let seeded = seed(&controller, "Old name").await;

        controller.rename_conversation(seeded.id, "New name").await;

        let groups = controller.groups().await;
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].conversations[0].title, "New name");
    }

    #[tokio::test]
    async fn test_delete_clears_matching_active_selection() {
        let controller = controller().await;
        let seeded = seed(&controller, "Thread").await;
        assert!(controller.select_conversation(seeded.id).await);

        controller.delete_conversation(seeded.id).await;

        assert_eq!(controller.active_conversation().await, None);
        assert!(controller.groups().await.is_empty());
    }

    #[tokio::test]
    async fn test_debounced_search_populates_results() {
        let controller = controller().await;
        let rust = seed(&controller, "Rust lifetimes").await;
        seed(&controller, "Gardening").await;

        controller.set_search_text("rust").await;
        assert!(controller.search_results().await.is_empty());

        tokio::time::sleep(Duration::from_millis(300)).await;
        let results = controller.search_results().await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, rust.id);
    }

    #[tokio::test]
    async fn test_rapid_changes_supersede_pending_query() {
        let controller = controller().await;
        seed(&controller, "Alpha notes").await;
        let beta = seed(&controller, "Beta notes").await;

        controller.set_search_text("alpha").await;
        controller.set_search_text("beta").await;
        assert_eq!(controller.search_text().await, "beta");

        tokio::time::sleep(Duration::from_millis(300)).await;
        let results = controller.search_results().await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, beta.id);
    }

    #[tokio::test]
    async fn test_blank_search_restores_grouped_listing() {
        let controller = controller().await;
        seed(&controller, "Thread").await;

        controller.set_search_text("thread").await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(controller.search_results().await.len(), 1);

        controller.set_search_text("  ").await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(controller.search_results().await.is_empty());
        assert_eq!(controller.groups().await.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_all_resets_view_state() {
        let controller = controller().await;
        let seeded = seed(&controller, "Thread").await;
        assert!(controller.select_conversation(seeded.id).await);
        controller.refresh().await;
        assert!(!controller.groups().await.is_empty());

        controller.clear_all().await;

        assert_eq!(controller.active_conversation().await, None);
        assert!(controller.groups().await.is_empty());
    }
}
