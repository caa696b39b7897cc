//! Dataset retrieval workflow.
//!
//! `Workflow` is a synchronous state machine; the async fetch plans only
//! produce results. Every `begin` bumps a generation counter and hands out a
//! `Ticket`; a result is applied only when its ticket is still current, so a
//! slow earlier response can never overwrite a newer one.

use std::cell::RefCell;

use tracing::{debug, info, warn};
use url::Url;

use crate::api::{ApiClient, Transport};
use crate::dataset::Dataset;
use crate::error::{ApiError, WorkflowFailure};

/// Section shown for identity-scoped loads, whatever keys come back.
pub const IDENTITY_SECTION: &str = "My Schedule";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowKind {
    Generate,
    LoadLatest,
    LoadForIdentity(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Requesting(WorkflowKind),
    Loaded,
    Failed(WorkflowFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    kind: WorkflowKind,
}

impl Ticket {
    pub fn kind(&self) -> &WorkflowKind {
        &self.kind
    }
}

/// What a successful fetch plan produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub dataset: Dataset,
    /// Download reference of the artifact behind the dataset, if known.
    pub download_ref: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
    state: WorkflowState,
    dataset: Option<Dataset>,
    active_section: Option<String>,
    download_ref: Option<String>,
    generation: u64,
}

impl Default for Workflow {
    fn default() -> Self {
        Self {
            state: WorkflowState::Idle,
            dataset: None,
            active_section: None,
            download_ref: None,
            generation: 0,
        }
    }
}

impl Workflow {
    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Last successfully loaded dataset; kept across failures.
    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn active_section(&self) -> Option<&str> {
        self.active_section.as_deref()
    }

    pub fn download_ref(&self) -> Option<&str> {
        self.download_ref.as_deref()
    }

    pub fn is_requesting(&self) -> bool {
        matches!(self.state, WorkflowState::Requesting(_))
    }

    pub fn failure(&self) -> Option<&WorkflowFailure> {
        match &self.state {
            WorkflowState::Failed(f) => Some(f),
            _ => None,
        }
    }

    /// Start a workflow, superseding any in-flight one. Returns None (and
    /// changes nothing) for an identity load with an empty id.
    pub fn begin(&mut self, kind: WorkflowKind) -> Option<Ticket> {
        if let WorkflowKind::LoadForIdentity(id) = &kind {
            if id.trim().is_empty() {
                warn!("Refusing identity load without an id");
                return None;
            }
        }
        if let WorkflowState::Requesting(previous) = &self.state {
            debug!("{:?} supersedes in-flight {:?}", kind, previous);
        }
        self.generation += 1;
        self.state = WorkflowState::Requesting(kind.clone());
        info!("Workflow {} started: {:?}", self.generation, kind);
        Some(Ticket {
            generation: self.generation,
            kind,
        })
    }

    /// Apply the outcome of `ticket`, or discard it if a newer workflow began.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<Fetched, WorkflowFailure>,
    ) -> Completion {
        if ticket.generation != self.generation {
            debug!(
                "Discarding stale result of workflow {} (current {})",
                ticket.generation, self.generation
            );
            return Completion::Stale;
        }

        match result {
            Ok(fetched) => {
                self.active_section = match &ticket.kind {
                    WorkflowKind::LoadForIdentity(_) => Some(IDENTITY_SECTION.to_string()),
                    _ => fetched.dataset.first_section().map(str::to_string),
                };
                if fetched.download_ref.is_some() {
                    self.download_ref = fetched.download_ref;
                }
                info!(
                    "Workflow {} loaded {} sections",
                    ticket.generation,
                    fetched.dataset.len()
                );
                self.dataset = Some(fetched.dataset);
                self.state = WorkflowState::Loaded;
            }
            Err(failure) => {
                warn!("Workflow {} failed: {}", ticket.generation, failure);
                self.state = WorkflowState::Failed(failure);
            }
        }
        Completion::Applied
    }

    /// Switch the visible section. No-op unless loaded and `name` exists.
    pub fn select_section(&mut self, name: &str) {
        if self.state != WorkflowState::Loaded {
            return;
        }
        if self.dataset.as_ref().is_some_and(|d| d.contains(name)) {
            self.active_section = Some(name.to_string());
        }
    }
}

/// Entry trigger derived from the current route parameters.
pub fn entry_trigger(identity: Option<&str>) -> WorkflowKind {
    match identity.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => WorkflowKind::LoadForIdentity(id.to_string()),
        None => WorkflowKind::LoadLatest,
    }
}

/// Single-writer access to a workflow held by some container.
pub trait WorkflowHost {
    fn with_workflow<R>(&self, f: impl FnOnce(&mut Workflow) -> R) -> Option<R>;
}

impl WorkflowHost for RefCell<Workflow> {
    fn with_workflow<R>(&self, f: impl FnOnce(&mut Workflow) -> R) -> Option<R> {
        Some(f(&mut self.borrow_mut()))
    }
}

/// Begin `kind` on `host`, run its fetch plan and apply the result.
/// None when the host refused to start (empty id, or the host is gone).
pub async fn run<H, T>(host: &H, client: &ApiClient<T>, kind: WorkflowKind) -> Option<Completion>
where
    H: WorkflowHost,
    T: Transport,
{
    let ticket = host.with_workflow(|w| w.begin(kind))??;
    let result = fetch(client, ticket.kind()).await;
    host.with_workflow(|w| w.complete(ticket, result))
}

pub async fn fetch<T: Transport>(
    client: &ApiClient<T>,
    kind: &WorkflowKind,
) -> Result<Fetched, WorkflowFailure> {
    match kind {
        WorkflowKind::Generate => {
            let generated = client.generate().await?;
            let json_ref = resolve_json_ref(client, &generated.json_url);
            let dataset = client.dataset_at(&json_ref).await?;
            Ok(Fetched {
                dataset,
                download_ref: Some(generated.download_url),
            })
        }
        WorkflowKind::LoadLatest => {
            let latest = client.latest().await.map_err(|e| match e {
                ApiError::Service { status: 404, .. } => WorkflowFailure::NotFound,
                other => other.into(),
            })?;
            let json_ref = client.url_for(&latest_json_path(&latest.download_url));
            let dataset = client.dataset_at(&json_ref).await?;
            Ok(Fetched {
                dataset,
                download_ref: Some(latest.download_url),
            })
        }
        WorkflowKind::LoadForIdentity(id) => {
            let dataset = client.teacher_dataset(id).await?;
            Ok(Fetched {
                dataset,
                download_ref: None,
            })
        }
    }
}

/// Absolute http(s) references are used as-is; anything else is relative to
/// the service base.
pub fn resolve_json_ref<T: Transport>(client: &ApiClient<T>, json_url: &str) -> String {
    if is_absolute(json_url) {
        json_url.to_string()
    } else {
        client.url_for(json_url)
    }
}

/// The service stores each artifact's JSON twin under `/json/` where the
/// CSV lives under `/download/`.
// TODO: switch to a direct JSON reference once `/latest` returns `json_url` like `/generate`.
pub fn latest_json_path(download_url: &str) -> String {
    download_url.replacen("/download/", "/json/", 1)
}

pub(crate) fn is_absolute(reference: &str) -> bool {
    Url::parse(reference).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use futures::executor::{block_on, LocalPool};
    use futures::task::LocalSpawnExt;

    use super::*;
    use crate::api::Method;
    use crate::error::TransportError;
    use crate::testing::{client_with, ok_reply, ScriptedTransport};

    fn dataset(json: &str) -> Dataset {
        Dataset::from_json(json.as_bytes()).unwrap()
    }

    fn fetched(json: &str) -> Result<Fetched, WorkflowFailure> {
        Ok(Fetched {
            dataset: dataset(json),
            download_ref: None,
        })
    }

    fn loaded(json: &str) -> Workflow {
        let mut w = Workflow::default();
        let t = w.begin(WorkflowKind::LoadLatest).unwrap();
        w.complete(t, fetched(json));
        w
    }

    #[test]
    fn test_load_selects_first_section_in_arrival_order() {
        let w = loaded(r#"{"Sec-B":[],"Sec-A":[{"Day":"Mon"}]}"#);
        assert_eq!(w.state(), &WorkflowState::Loaded);
        assert_eq!(w.active_section(), Some("Sec-B"));
    }

    #[test]
    fn test_empty_dataset_has_no_active_section() {
        let w = loaded("{}");
        assert_eq!(w.state(), &WorkflowState::Loaded);
        assert_eq!(w.active_section(), None);
    }

    #[test]
    fn test_select_section_is_idempotent_and_ignores_unknown() {
        let mut w = loaded(r#"{"Sec-A":[{"Day":"Mon"}],"Sec-B":[]}"#);
        w.select_section("Sec-B");
        let once = w.clone();
        w.select_section("Sec-B");
        assert_eq!(w, once);
        w.select_section("Nope");
        assert_eq!(w.active_section(), Some("Sec-B"));
    }

    #[test]
    fn test_select_section_requires_loaded() {
        let mut w = loaded(r#"{"Sec-A":[],"Sec-B":[]}"#);
        w.begin(WorkflowKind::Generate).unwrap();
        w.select_section("Sec-B");
        assert_eq!(w.active_section(), Some("Sec-A"));
    }

    #[test]
    fn test_failure_keeps_prior_dataset() {
        let mut w = loaded(r#"{"Sec-A":[{"Day":"Mon"}]}"#);
        let before = w.dataset().cloned();
        let t = w.begin(WorkflowKind::LoadLatest).unwrap();
        w.complete(t, Err(WorkflowFailure::NotFound));
        assert_eq!(w.state(), &WorkflowState::Failed(WorkflowFailure::NotFound));
        assert_eq!(w.dataset().cloned(), before);
        assert_eq!(w.active_section(), Some("Sec-A"));
    }

    #[test]
    fn test_later_request_wins_when_earlier_arrives_last() {
        let mut w = Workflow::default();
        let a = w.begin(WorkflowKind::LoadLatest).unwrap();
        let b = w.begin(WorkflowKind::Generate).unwrap();
        assert_eq!(w.complete(b, fetched(r#"{"From-B":[]}"#)), Completion::Applied);
        assert_eq!(w.complete(a, fetched(r#"{"From-A":[]}"#)), Completion::Stale);
        assert_eq!(w.active_section(), Some("From-B"));
        assert_eq!(w.state(), &WorkflowState::Loaded);
    }

    #[test]
    fn test_stale_failure_is_discarded() {
        let mut w = Workflow::default();
        let a = w.begin(WorkflowKind::LoadLatest).unwrap();
        let b = w.begin(WorkflowKind::LoadLatest).unwrap();
        w.complete(b, fetched(r#"{"Sec":[]}"#));
        assert_eq!(w.complete(a, Err(WorkflowFailure::Timeout)), Completion::Stale);
        assert_eq!(w.state(), &WorkflowState::Loaded);
    }

    #[test]
    fn test_identity_load_forces_fixed_section() {
        let mut w = Workflow::default();
        let t = w
            .begin(WorkflowKind::LoadForIdentity("T-9".into()))
            .unwrap();
        w.complete(t, fetched(r#"{"Anything":[{"Day":"Mon"}]}"#));
        assert_eq!(w.active_section(), Some(IDENTITY_SECTION));
    }

    #[test]
    fn test_empty_identity_refused() {
        let mut w = loaded(r#"{"Sec":[]}"#);
        let before = w.clone();
        assert!(w.begin(WorkflowKind::LoadForIdentity("  ".into())).is_none());
        assert_eq!(w, before);
    }

    #[test]
    fn test_entry_trigger_from_route_params() {
        assert_eq!(entry_trigger(None), WorkflowKind::LoadLatest);
        assert_eq!(entry_trigger(Some("")), WorkflowKind::LoadLatest);
        assert_eq!(
            entry_trigger(Some("T-9")),
            WorkflowKind::LoadForIdentity("T-9".into())
        );
    }

    #[test]
    fn test_latest_json_path_substitution() {
        assert_eq!(
            latest_json_path("/download/timetable_17.csv"),
            "/json/timetable_17.csv"
        );
    }

    #[test]
    fn test_generate_fetches_relative_json_on_base() {
        let transport = ScriptedTransport::new();
        transport.reply(
            Method::Post,
            "http://svc.test/generate",
            200,
            r#"{"filename":"t.csv","download_url":"/download/t.csv","json_url":"/json/42"}"#,
        );
        transport.reply(
            Method::Get,
            "http://svc.test/json/42",
            200,
            r#"{"Sec-A":[{"Day":"Mon"}],"Sec-B":[]}"#,
        );
        let host = RefCell::new(Workflow::default());
        let client = client_with(transport.clone());

        let done = block_on(run(&host, &client, WorkflowKind::Generate));
        assert_eq!(done, Some(Completion::Applied));
        let w = host.borrow();
        assert_eq!(w.active_section(), Some("Sec-A"));
        assert_eq!(w.download_ref(), Some("/download/t.csv"));
        assert_eq!(transport.requests()[1].url, "http://svc.test/json/42");
    }

    #[test]
    fn test_generate_uses_absolute_json_as_is() {
        let transport = ScriptedTransport::new();
        transport.reply(
            Method::Post,
            "http://svc.test/generate",
            200,
            r#"{"filename":"t.csv","download_url":"/download/t.csv","json_url":"https://cdn.test/t.json"}"#,
        );
        transport.reply(Method::Get, "https://cdn.test/t.json", 200, r#"{"S":[]}"#);
        let host = RefCell::new(Workflow::default());
        block_on(run(&host, &client_with(transport), WorkflowKind::Generate));
        assert_eq!(host.borrow().state(), &WorkflowState::Loaded);
    }

    #[test]
    fn test_load_latest_not_found() {
        let transport = ScriptedTransport::new();
        transport.reply(
            Method::Get,
            "http://svc.test/latest",
            404,
            r#"{"detail":"No generated files found"}"#,
        );
        let host = RefCell::new(loaded(r#"{"Old":[]}"#));
        block_on(run(&host, &client_with(transport), WorkflowKind::LoadLatest));
        let w = host.borrow();
        assert_eq!(w.state(), &WorkflowState::Failed(WorkflowFailure::NotFound));
        assert_eq!(w.dataset().and_then(|d| d.first_section()), Some("Old"));
    }

    #[test]
    fn test_load_latest_derives_json_path() {
        let transport = ScriptedTransport::new();
        transport.reply(
            Method::Get,
            "http://svc.test/latest",
            200,
            r#"{"filename":"timetable_1.csv","download_url":"/download/timetable_1.csv"}"#,
        );
        transport.reply(
            Method::Get,
            "http://svc.test/json/timetable_1.csv",
            200,
            r#"{"CSE-A":[{"Day":"Mon","09:00":"Math"}]}"#,
        );
        let host = RefCell::new(Workflow::default());
        block_on(run(&host, &client_with(transport), WorkflowKind::LoadLatest));
        assert_eq!(host.borrow().active_section(), Some("CSE-A"));
    }

    #[test]
    fn test_transport_and_http_failures_carry_different_detail() {
        let transport = ScriptedTransport::new();
        transport.reply(Method::Get, "http://svc.test/timetable/teacher/T-1", 500, "{}");
        transport.fail(
            Method::Get,
            "http://svc.test/timetable/teacher/T-2",
            TransportError::Timeout,
        );
        let client = client_with(transport);
        let host = RefCell::new(Workflow::default());

        block_on(run(&host, &client, WorkflowKind::LoadForIdentity("T-1".into())));
        let http = host.borrow().failure().cloned().unwrap();
        block_on(run(&host, &client, WorkflowKind::LoadForIdentity("T-2".into())));
        let timeout = host.borrow().failure().cloned().unwrap();

        assert!(matches!(http, WorkflowFailure::ServiceError { status: 500, .. }));
        assert_eq!(timeout, WorkflowFailure::Timeout);
        assert_ne!(http.to_string(), timeout.to_string());
    }

    #[test]
    fn test_concurrent_runs_slow_earlier_response_discarded() {
        let transport = ScriptedTransport::new();
        let slow_a = transport.pending(Method::Get, "http://svc.test/timetable/teacher/A");
        let fast_b = transport.pending(Method::Get, "http://svc.test/timetable/teacher/B");
        let client = Rc::new(client_with(transport));
        let host = Rc::new(RefCell::new(Workflow::default()));

        let mut pool = LocalPool::new();
        let spawner = pool.spawner();
        for id in ["A", "B"] {
            let (client, host) = (client.clone(), host.clone());
            spawner
                .spawn_local(async move {
                    run(&*host, &*client, WorkflowKind::LoadForIdentity(id.into())).await;
                })
                .unwrap();
            pool.run_until_stalled();
        }

        fast_b.send(ok_reply(r#"{"My Schedule":[{"Day":"B"}]}"#)).unwrap();
        pool.run_until_stalled();
        slow_a.send(ok_reply(r#"{"My Schedule":[{"Day":"A"}]}"#)).unwrap();
        pool.run();

        let w = host.borrow();
        let rows = w.dataset().and_then(|d| d.rows(IDENTITY_SECTION)).unwrap();
        assert_eq!(rows[0]["Day"], "B");
        assert_eq!(w.state(), &WorkflowState::Loaded);
    }
}
