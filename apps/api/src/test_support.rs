//! In-memory collaborators for pipeline and router tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

use crate::auth::{AuthClientError, Session, SessionInfo, SessionResolver, SessionUser};
use crate::config::Config;
use crate::errors::AppError;
use crate::extraction::{
    DiscoveredLink, ExtractedJson, ExtractionError, ExtractionService, Location, MapOptions,
    PageMetadata, ScrapeOptions, ScrapedPage,
};
use crate::items::pipeline::ImportPipeline;
use crate::items::store::ItemStore;
use crate::models::item::{ItemStatus, ItemUpdate, NewItem, SavedItem};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Item store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryItemStore {
    items: Mutex<Vec<SavedItem>>,
    updates: Mutex<HashMap<Uuid, usize>>,
    outage: AtomicBool,
}

impl MemoryItemStore {
    pub fn all(&self) -> Vec<SavedItem> {
        self.items.lock().unwrap().clone()
    }

    pub fn update_count(&self, id: Uuid) -> usize {
        self.updates.lock().unwrap().get(&id).copied().unwrap_or(0)
    }

    /// Makes every subsequent call fail as if the database were unreachable.
    pub fn go_down(&self) {
        self.outage.store(true, Ordering::SeqCst);
    }

    fn check_up(&self) -> Result<(), AppError> {
        if self.outage.load(Ordering::SeqCst) {
            return Err(AppError::Internal(anyhow::anyhow!("store unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn create(&self, item: NewItem) -> Result<SavedItem, AppError> {
        self.check_up()?;
        let mut items = self.items.lock().unwrap();
        // Strictly increasing creation times keep ordering deterministic.
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let saved = SavedItem {
            id: Uuid::new_v4(),
            user_id: item.user_id,
            url: item.url,
            title: None,
            content: None,
            author: None,
            og_image: None,
            published_at: None,
            status: item.status,
            created_at: base + Duration::seconds(items.len() as i64),
        };
        items.push(saved.clone());
        Ok(saved)
    }

    async fn update(&self, id: Uuid, update: ItemUpdate) -> Result<SavedItem, AppError> {
        self.check_up()?;
        let mut items = self.items.lock().unwrap();
        let item = items
            .iter_mut()
            .find(|i| {
                i.id == id && matches!(i.status, ItemStatus::Pending | ItemStatus::Processing)
            })
            .ok_or_else(|| AppError::NotFound(format!("Item {id} is not awaiting extraction")))?;

        item.status = update.status();
        if let ItemUpdate::Completed(fields) = update {
            item.title = fields.title;
            item.content = fields.content;
            item.author = fields.author;
            item.og_image = fields.og_image;
            item.published_at = fields.published_at;
        }
        *self.updates.lock().unwrap().entry(id).or_default() += 1;
        Ok(item.clone())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<SavedItem>, AppError> {
        self.check_up()?;
        let mut owned: Vec<SavedItem> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(owned)
    }

    async fn find_for_user(&self, id: Uuid, user_id: &str) -> Result<Option<SavedItem>, AppError> {
        self.check_up()?;
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == id && i.user_id == user_id)
            .cloned())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Extraction service
// ────────────────────────────────────────────────────────────────────────────

/// Scripted extractor. Unscripted URLs fail like a service error.
#[derive(Default)]
pub struct ScriptedExtractor {
    pages: HashMap<String, ScrapedPage>,
    links: Option<Vec<DiscoveredLink>>,
    scrape_calls: Mutex<Vec<String>>,
    map_calls: Mutex<Vec<(String, MapOptions)>>,
}

impl ScriptedExtractor {
    pub fn with_page(mut self, url: &str, page: ScrapedPage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn with_links(mut self, links: Vec<DiscoveredLink>) -> Self {
        self.links = Some(links);
        self
    }

    pub fn scrape_calls(&self) -> Vec<String> {
        self.scrape_calls.lock().unwrap().clone()
    }

    pub fn map_calls(&self) -> Vec<(String, MapOptions)> {
        self.map_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExtractionService for ScriptedExtractor {
    async fn scrape(
        &self,
        url: &str,
        _options: &ScrapeOptions,
    ) -> Result<ScrapedPage, ExtractionError> {
        self.scrape_calls.lock().unwrap().push(url.to_string());
        self.pages.get(url).cloned().ok_or(ExtractionError::Api {
            status: 500,
            message: format!("scrape of {url} failed"),
        })
    }

    async fn map(
        &self,
        url: &str,
        options: &MapOptions,
    ) -> Result<Vec<DiscoveredLink>, ExtractionError> {
        self.map_calls
            .lock()
            .unwrap()
            .push((url.to_string(), options.clone()));
        self.links
            .clone()
            .ok_or_else(|| ExtractionError::Unsuccessful("map timed out".to_string()))
    }
}

pub fn article_page() -> ScrapedPage {
    ScrapedPage {
        markdown: Some("body text".to_string()),
        json: Some(ExtractedJson {
            author: Some("Jane Doe".to_string()),
            published_at: Some("2024-01-15".to_string()),
        }),
        metadata: Some(PageMetadata {
            title: Some("Example".to_string()),
            og_image: Some("https://example.com/img.png".to_string()),
        }),
    }
}

pub fn link(url: &str) -> DiscoveredLink {
    DiscoveredLink {
        url: url.to_string(),
        title: None,
        description: None,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sessions
// ────────────────────────────────────────────────────────────────────────────

/// Resolves every request to the same session, or to none.
pub struct StaticSessions(pub Option<Session>);

#[async_trait]
impl SessionResolver for StaticSessions {
    async fn get_session(&self, _headers: &HeaderMap) -> Result<Option<Session>, AuthClientError> {
        Ok(self.0.clone())
    }

    async fn sign_out(&self, _headers: &HeaderMap) -> Result<Vec<String>, AuthClientError> {
        Ok(vec!["session_token=; Max-Age=0; Path=/".to_string()])
    }
}

/// An auth provider that cannot answer.
pub struct FailingSessions;

#[async_trait]
impl SessionResolver for FailingSessions {
    async fn get_session(&self, _headers: &HeaderMap) -> Result<Option<Session>, AuthClientError> {
        Err(AuthClientError::Api {
            status: 503,
            message: "auth provider unavailable".to_string(),
        })
    }

    async fn sign_out(&self, _headers: &HeaderMap) -> Result<Vec<String>, AuthClientError> {
        Err(AuthClientError::Api {
            status: 503,
            message: "auth provider unavailable".to_string(),
        })
    }
}

pub fn session_for(user_id: &str) -> Session {
    Session {
        session: SessionInfo {
            id: format!("sess-{user_id}"),
            expires_at: None,
        },
        user: SessionUser {
            id: user_id.to_string(),
            email: Some(format!("{user_id}@example.com")),
            name: None,
        },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wiring
// ────────────────────────────────────────────────────────────────────────────

pub fn location() -> Location {
    Location {
        country: "IN".to_string(),
        languages: vec!["en".to_string()],
    }
}

pub fn pipeline(store: Arc<MemoryItemStore>, extractor: Arc<ScriptedExtractor>) -> ImportPipeline {
    ImportPipeline::new(store, extractor, location())
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/shelf_test".to_string(),
        firecrawl_api_key: "test-key".to_string(),
        firecrawl_api_url: "http://127.0.0.1:0".to_string(),
        auth_url: "http://127.0.0.1:0".to_string(),
        login_path: "/login".to_string(),
        extract_country: "IN".to_string(),
        extract_languages: vec!["en".to_string()],
        port: 0,
        rust_log: "debug".to_string(),
    }
}

pub fn app_state(
    store: Arc<MemoryItemStore>,
    extractor: Arc<ScriptedExtractor>,
    session: Option<Session>,
) -> AppState {
    app_state_with_sessions(store, extractor, Arc::new(StaticSessions(session)))
}

pub fn app_state_with_sessions(
    store: Arc<MemoryItemStore>,
    extractor: Arc<ScriptedExtractor>,
    sessions: Arc<dyn SessionResolver>,
) -> AppState {
    AppState {
        pipeline: pipeline(store, extractor),
        sessions,
        config: test_config(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stub HTTP upstream
// ────────────────────────────────────────────────────────────────────────────

/// One scripted reply from a `StubUpstream`.
#[derive(Debug, Clone)]
pub struct StubReply {
    status: u16,
    body: String,
    set_cookies: Vec<String>,
}

impl StubReply {
    pub fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            set_cookies: Vec::new(),
        }
    }

    pub fn with_cookie(mut self, cookie: &str) -> Self {
        self.set_cookies.push(cookie.to_string());
        self
    }
}

/// A request as the stub upstream received it.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub headers: HeaderMap,
    pub body: String,
}

#[derive(Clone)]
struct StubState {
    replies: Arc<Vec<StubReply>>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

/// Loopback HTTP server that answers every request from a script, in order.
/// Once the script runs out the last reply repeats.
pub struct StubUpstream {
    pub base_url: String,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl StubUpstream {
    pub async fn start(replies: Vec<StubReply>) -> Self {
        assert!(!replies.is_empty(), "a stub needs at least one reply");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new().fallback(stub_reply).with_state(StubState {
            replies: Arc::new(replies),
            seen: seen.clone(),
        });
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base_url: format!("http://{addr}"),
            seen,
        }
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

async fn stub_reply(State(stub): State<StubState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();

    let index = {
        let mut seen = stub.seen.lock().unwrap();
        seen.push(SeenRequest {
            method: parts.method.to_string(),
            path: parts.uri.path().to_string(),
            headers: parts.headers,
            body: String::from_utf8_lossy(&body).into_owned(),
        });
        seen.len() - 1
    };

    let reply = &stub.replies[index.min(stub.replies.len() - 1)];
    let mut response = (
        StatusCode::from_u16(reply.status).unwrap(),
        [(CONTENT_TYPE, "application/json")],
        reply.body.clone(),
    )
        .into_response();
    for cookie in &reply.set_cookies {
        response
            .headers_mut()
            .append(SET_COOKIE, HeaderValue::from_str(cookie).unwrap());
    }
    response
}

/// A client for loopback stubs that ignores any proxy set in the environment.
pub fn loopback_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// A loopback address with nothing listening on it.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
