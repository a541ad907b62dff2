//! Sink adapter: the task board.
//!
//! The board stores tasks as cards in three lists, one per status. A
//! card's status IS its list membership; whatever status-like fields the
//! remote record carries are never read. The link back to a lead is a
//! token embedded in the card description (see `leadsync_model::token`).

use crate::config::BoardConfig;
use crate::error::{SyncError, SyncResult};
use crate::http::{ApiRequest, ApiResponse, HttpClient};
use crate::retry::{call_with_retry, RetryPolicy};
use leadsync_model::{embed_lead_id, extract_lead_id, Task, TaskStatus};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{error, warn};
use url::Url;

/// The engine's view of the task board.
pub trait TaskBoard: Send + Sync {
    /// Fetches every task across the three partitions, in the fixed order
    /// TODO, IN_PROGRESS, DONE, tagging each with its partition's status.
    fn list_tasks(&self) -> SyncResult<Vec<Task>>;

    /// First task whose back-reference matches, in partition-then-fetch
    /// order. A full scan per lookup; there is no index.
    fn find_task_by_lead_id(&self, lead_id: &str) -> SyncResult<Option<Task>> {
        Ok(self
            .list_tasks()?
            .into_iter()
            .find(|task| task.lead_id == lead_id))
    }

    /// Idempotent upsert. An existing task is converged to `status` and
    /// returned otherwise unchanged (title and notes are never
    /// overwritten); a missing one is created in the partition for
    /// `status` with the lead id token prepended to its notes.
    fn ensure_task(
        &self,
        title: &str,
        lead_id: &str,
        status: TaskStatus,
        notes: Option<&str>,
    ) -> SyncResult<Task>;

    /// Moves the task to the partition for `status`. A structural move,
    /// not a field update.
    fn update_task_status(&self, task_id: &str, status: TaskStatus) -> SyncResult<()>;
}

/// REST implementation of [`TaskBoard`].
pub struct RestTaskBoard<C: HttpClient> {
    config: BoardConfig,
    retry: RetryPolicy,
    client: C,
}

impl<C: HttpClient> RestTaskBoard<C> {
    /// Creates an adapter over the given client.
    pub fn new(config: BoardConfig, retry: RetryPolicy, client: C) -> Self {
        Self {
            config,
            retry,
            client,
        }
    }

    /// The three partitions in scan order, paired with their list ids.
    fn partitions(&self) -> [(&str, TaskStatus); 3] {
        [
            (self.config.list_todo_id.as_str(), TaskStatus::Todo),
            (
                self.config.list_in_progress_id.as_str(),
                TaskStatus::InProgress,
            ),
            (self.config.list_done_id.as_str(), TaskStatus::Done),
        ]
    }

    fn list_id_for(&self, status: TaskStatus) -> &str {
        match status {
            TaskStatus::Todo => &self.config.list_todo_id,
            TaskStatus::InProgress => &self.config.list_in_progress_id,
            TaskStatus::Done => &self.config.list_done_id,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<String, String> {
        let mut url = Url::parse(&self.config.api_url)
            .map_err(|e| format!("invalid board api url: {e}"))?;
        {
            let mut parts = url
                .path_segments_mut()
                .map_err(|()| "board api url cannot be a base".to_string())?;
            parts.pop_if_empty();
            for segment in segments {
                parts.push(segment);
            }
        }
        Ok(url.to_string())
    }

    fn with_credentials(&self, request: ApiRequest) -> ApiRequest {
        request
            .query("key", &self.config.api_key)
            .query("token", &self.config.api_token)
    }

    fn check(&self, operation: &str, response: ApiResponse) -> Result<ApiResponse, String> {
        if response.is_success() {
            return Ok(response);
        }
        match response.status {
            401 => error!(
                operation,
                "board 401: invalid key/token, or the token lacks access to the board/lists"
            ),
            403 => error!(
                operation,
                "board 403: forbidden; ensure the token has board access and the lists belong to the configured board"
            ),
            status => error!(
                operation,
                status,
                body = %response.body,
                "board request failed"
            ),
        }
        Err(format!("status {}: {}", response.status, response.body))
    }

    fn fetch_partition(&self, list_id: &str, status: TaskStatus) -> SyncResult<Vec<Task>> {
        let cards = call_with_retry(&self.retry, "board partition list", || {
            let url = self.endpoint(&["lists", list_id, "cards"])?;
            let request = self.with_credentials(ApiRequest::get(url));
            let response = self.client.send(&request)?;
            self.check("board partition list", response)?.json()
        })?;

        let mut tasks = Vec::new();
        if let Some(cards) = cards.as_array() {
            for card in cards {
                if let Some(task) = decode_card(card, status) {
                    tasks.push(task);
                }
            }
        }
        Ok(tasks)
    }
}

/// Builds a canonical task from a card, tagged with the PARTITION's
/// status. Any status field stored on the card itself is ignored.
fn decode_card(card: &Value, status: TaskStatus) -> Option<Task> {
    let Some(id) = card.get("id").and_then(Value::as_str) else {
        warn!(?card, "skipping board card without id");
        return None;
    };
    let desc = card.get("desc").and_then(Value::as_str).unwrap_or("");

    Some(Task {
        id: id.to_string(),
        title: card
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        status,
        lead_id: extract_lead_id(desc).unwrap_or_default(),
        notes: Some(desc.to_string()),
    })
}

impl<C: HttpClient> TaskBoard for RestTaskBoard<C> {
    fn list_tasks(&self) -> SyncResult<Vec<Task>> {
        let mut tasks = Vec::new();
        for (list_id, status) in self.partitions() {
            if list_id.is_empty() {
                continue;
            }
            tasks.extend(self.fetch_partition(list_id, status)?);
        }
        Ok(tasks)
    }

    fn ensure_task(
        &self,
        title: &str,
        lead_id: &str,
        status: TaskStatus,
        notes: Option<&str>,
    ) -> SyncResult<Task> {
        if let Some(existing) = self.find_task_by_lead_id(lead_id)? {
            self.update_task_status(&existing.id, status)?;
            return Ok(existing);
        }

        call_with_retry(&self.retry, "board card create", || {
            let url = self.endpoint(&["cards"])?;
            let desc = embed_lead_id(lead_id, notes.unwrap_or(""));
            let request = self.with_credentials(ApiRequest::post(url)).form(vec![
                ("name".to_string(), title.to_string()),
                ("idList".to_string(), self.list_id_for(status).to_string()),
                ("desc".to_string(), desc),
            ]);
            let response = self.client.send(&request)?;
            let card = self.check("board card create", response)?.json()?;

            let id = card
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| "create response missing card id".to_string())?;
            Ok(Task {
                id: id.to_string(),
                title: card
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or(title)
                    .to_string(),
                status,
                lead_id: lead_id.to_string(),
                notes: Some(
                    card.get("desc")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string(),
                ),
            })
        })
    }

    fn update_task_status(&self, task_id: &str, status: TaskStatus) -> SyncResult<()> {
        call_with_retry(&self.retry, "board card move", || {
            let url = self.endpoint(&["cards", task_id])?;
            let request = self
                .with_credentials(ApiRequest::put(url))
                .query("idList", self.list_id_for(status));
            let response = self.client.send(&request)?;
            self.check("board card move", response)?;
            Ok(())
        })
    }
}

/// An in-memory task board for testing.
///
/// Cards live in partitions exactly as on the real board; the status of a
/// listed task comes from the partition it sits in, and the back-reference
/// is re-parsed from the stored description on every listing.
#[derive(Default)]
pub struct MemoryTaskBoard {
    cards: Mutex<Vec<StoredCard>>,
    next_id: AtomicU64,
    fail_list: AtomicBool,
    fail_moves: AtomicBool,
    fail_ensure_for: Mutex<HashSet<String>>,
}

#[derive(Debug, Clone)]
struct StoredCard {
    id: String,
    title: String,
    desc: String,
    partition: TaskStatus,
}

impl MemoryTaskBoard {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a card directly into a partition, bypassing `ensure_task`.
    /// Returns the card id.
    pub fn insert_card(&self, partition: TaskStatus, title: &str, desc: &str) -> String {
        let id = format!("task-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.cards.lock().push(StoredCard {
            id: id.clone(),
            title: title.to_string(),
            desc: desc.to_string(),
            partition,
        });
        id
    }

    /// Total number of cards on the board.
    pub fn card_count(&self) -> usize {
        self.cards.lock().len()
    }

    /// Tasks currently sitting in one partition.
    pub fn tasks_in(&self, partition: TaskStatus) -> Vec<Task> {
        self.cards
            .lock()
            .iter()
            .filter(|card| card.partition == partition)
            .map(StoredCard::to_task)
            .collect()
    }

    /// Makes `list_tasks` (and everything built on it) fail.
    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    /// Makes `update_task_status` fail.
    pub fn set_fail_moves(&self, fail: bool) {
        self.fail_moves.store(fail, Ordering::SeqCst);
    }

    /// Makes `ensure_task` fail for one lead id.
    pub fn fail_ensure_for(&self, lead_id: &str) {
        self.fail_ensure_for.lock().insert(lead_id.to_string());
    }
}

impl StoredCard {
    fn to_task(&self) -> Task {
        Task {
            id: self.id.clone(),
            title: self.title.clone(),
            status: self.partition,
            lead_id: extract_lead_id(&self.desc).unwrap_or_default(),
            notes: Some(self.desc.clone()),
        }
    }
}

impl TaskBoard for MemoryTaskBoard {
    fn list_tasks(&self) -> SyncResult<Vec<Task>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(SyncError::upstream(
                "board partition list",
                3,
                "injected list failure",
            ));
        }
        let cards = self.cards.lock();
        let mut tasks = Vec::new();
        for partition in TaskStatus::PARTITIONS {
            tasks.extend(
                cards
                    .iter()
                    .filter(|card| card.partition == partition)
                    .map(StoredCard::to_task),
            );
        }
        Ok(tasks)
    }

    fn ensure_task(
        &self,
        title: &str,
        lead_id: &str,
        status: TaskStatus,
        notes: Option<&str>,
    ) -> SyncResult<Task> {
        if self.fail_ensure_for.lock().contains(lead_id) {
            return Err(SyncError::upstream(
                "board card create",
                3,
                "injected create failure",
            ));
        }

        if let Some(existing) = self.find_task_by_lead_id(lead_id)? {
            self.update_task_status(&existing.id, status)?;
            return Ok(existing);
        }

        let id = self.insert_card(status, title, &embed_lead_id(lead_id, notes.unwrap_or("")));
        let cards = self.cards.lock();
        let card = cards
            .iter()
            .find(|card| card.id == id)
            .ok_or_else(|| SyncError::upstream("board card create", 1, "card vanished"))?;
        Ok(card.to_task())
    }

    fn update_task_status(&self, task_id: &str, status: TaskStatus) -> SyncResult<()> {
        if self.fail_moves.load(Ordering::SeqCst) {
            return Err(SyncError::upstream(
                "board card move",
                3,
                "injected move failure",
            ));
        }
        let mut cards = self.cards.lock();
        match cards.iter_mut().find(|card| card.id == task_id) {
            Some(card) => {
                card.partition = status;
                Ok(())
            }
            None => Err(SyncError::upstream(
                "board card move",
                1,
                format!("card {task_id} not found"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Method, MockHttpClient, RequestBody};

    fn config() -> BoardConfig {
        BoardConfig::new(
            "https://board.example.com/1",
            "k",
            "t",
            "board1",
            "list-todo",
            "list-wip",
            "list-done",
        )
    }

    fn adapter(client: MockHttpClient) -> RestTaskBoard<MockHttpClient> {
        RestTaskBoard::new(config(), RetryPolicy::no_retry(), client)
    }

    #[test]
    fn lists_partitions_in_fixed_order() {
        let client = MockHttpClient::new();
        client.on(Method::Get, "/lists/list-todo/cards", 200, r#"[{"id":"c1","name":"A","desc":"LeadID: L1\n"}]"#);
        client.on(Method::Get, "/lists/list-wip/cards", 200, "[]");
        client.on(
            Method::Get,
            "/lists/list-done/cards",
            200,
            r#"[{"id":"c2","name":"B","desc":"LeadID: L2\n"}]"#,
        );

        let tasks = adapter(client).list_tasks().unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].status, TaskStatus::Todo);
        assert_eq!(tasks[0].lead_id, "L1");
        assert_eq!(tasks[1].status, TaskStatus::Done);
        assert_eq!(tasks[1].lead_id, "L2");
    }

    #[test]
    fn partition_tag_overrides_any_stored_status_field() {
        let client = MockHttpClient::new();
        client.on(Method::Get, "/lists/list-todo/cards", 200, "[]");
        client.on(Method::Get, "/lists/list-wip/cards", 200, "[]");
        // The card claims to be TODO; the DONE partition wins.
        client.on(
            Method::Get,
            "/lists/list-done/cards",
            200,
            r#"[{"id":"c9","name":"X","desc":"","status":"TODO"}]"#,
        );

        let tasks = adapter(client).list_tasks().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].status, TaskStatus::Done);
        assert_eq!(tasks[0].lead_id, "");
    }

    #[test]
    fn unparsable_token_yields_untracked_task() {
        let client = MockHttpClient::new();
        client.on(
            Method::Get,
            "/lists/list-todo/cards",
            200,
            r#"[{"id":"c1","name":"A","desc":"no token here"}]"#,
        );
        client.on(Method::Get, "/lists/list-wip/cards", 200, "[]");
        client.on(Method::Get, "/lists/list-done/cards", 200, "[]");

        let tasks = adapter(client).list_tasks().unwrap();
        assert!(!tasks[0].is_tracked());
    }

    #[test]
    fn ensure_creates_in_the_partition_for_status() {
        let client = MockHttpClient::new();
        client.on(Method::Get, "/lists/list-todo/cards", 200, "[]");
        client.on(Method::Get, "/lists/list-wip/cards", 200, "[]");
        client.on(Method::Get, "/lists/list-done/cards", 200, "[]");
        client.on(
            Method::Post,
            "/cards",
            200,
            r#"{"id":"c1","name":"Follow up: Ann","desc":"LeadID: L1\nEmail: a@x.com"}"#,
        );

        let board = adapter(client);
        let task = board
            .ensure_task("Follow up: Ann", "L1", TaskStatus::Todo, Some("Email: a@x.com"))
            .unwrap();

        assert_eq!(task.id, "c1");
        assert_eq!(task.lead_id, "L1");
        assert_eq!(task.status, TaskStatus::Todo);

        let requests = board.client.requests();
        let create = requests.last().unwrap();
        let Some(RequestBody::Form(pairs)) = &create.body else {
            panic!("expected a form body");
        };
        assert!(pairs.contains(&("idList".to_string(), "list-todo".to_string())));
        assert!(pairs
            .iter()
            .any(|(k, v)| k == "desc" && v.starts_with("LeadID: L1\n")));
    }

    #[test]
    fn ensure_converges_an_existing_task_without_rewriting_it() {
        let client = MockHttpClient::new();
        client.on(
            Method::Get,
            "/lists/list-todo/cards",
            200,
            r#"[{"id":"c1","name":"Follow up: Ann","desc":"LeadID: L1\nold notes"}]"#,
        );
        client.on(Method::Get, "/lists/list-wip/cards", 200, "[]");
        client.on(Method::Get, "/lists/list-done/cards", 200, "[]");
        client.on(Method::Put, "/cards/c1", 200, "{}");

        let board = adapter(client);
        let task = board
            .ensure_task("New Title", "L1", TaskStatus::InProgress, Some("new notes"))
            .unwrap();

        // The existing record comes back untouched.
        assert_eq!(task.title, "Follow up: Ann");
        assert_eq!(task.notes.as_deref(), Some("LeadID: L1\nold notes"));

        let requests = board.client.requests();
        let moved = requests.last().unwrap();
        assert_eq!(moved.method, Method::Put);
        assert!(moved
            .query
            .contains(&("idList".to_string(), "list-wip".to_string())));
    }

    #[test]
    fn move_targets_the_partition_list() {
        let client = MockHttpClient::new();
        client.on(Method::Put, "/cards/c7", 200, "{}");

        let board = adapter(client);
        board.update_task_status("c7", TaskStatus::Done).unwrap();

        let requests = board.client.requests();
        assert!(requests[0]
            .query
            .contains(&("idList".to_string(), "list-done".to_string())));
        assert!(requests[0].query.contains(&("key".to_string(), "k".to_string())));
    }

    #[test]
    fn unauthorized_list_fails_after_retries() {
        let client = MockHttpClient::new();
        client.on(Method::Get, "/lists/list-todo/cards", 401, "unauthorized");

        let board = RestTaskBoard::new(
            config(),
            RetryPolicy::new(2)
                .with_initial_delay(std::time::Duration::from_millis(1))
                .with_max_delay(std::time::Duration::from_millis(1)),
            client,
        );

        let err = board.list_tasks().unwrap_err();
        assert!(matches!(err, SyncError::Upstream { attempts: 2, .. }));
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn empty_list_id_skips_the_partition() {
        let client = MockHttpClient::new();
        client.on(Method::Get, "/lists/list-todo/cards", 200, "[]");
        client.on(Method::Get, "/lists/list-done/cards", 200, "[]");

        let mut partial = config();
        partial.list_in_progress_id = String::new();
        let board = RestTaskBoard::new(partial, RetryPolicy::no_retry(), client);

        board.list_tasks().unwrap();
        assert_eq!(board.client.request_count(), 2);
    }

    #[test]
    fn memory_board_ensure_is_idempotent() {
        let board = MemoryTaskBoard::new();
        board
            .ensure_task("T", "L1", TaskStatus::Todo, Some("n"))
            .unwrap();
        board
            .ensure_task("T", "L1", TaskStatus::Todo, Some("n"))
            .unwrap();
        assert_eq!(board.card_count(), 1);
    }
}
