//! 旅行搭子客户端
//!
//! 把配置、会话、HTTP 客户端和各业务管理器组装在一起。调用方通过
//! `set_*_listener` 注册回调，之后取得的管理器都使用新的监听器。

use crate::travel::auth::{AuthApi, AuthResponse, RegisterRequest};
use crate::travel::buddy::{BuddyApi, BuddyBackend, BuddyListener, BuddyManager};
use crate::travel::chat::{ChatApi, ChatBackend, ChatListener, ChatRoom, EmptyChatListener};
use crate::travel::config::ClientConfig;
use crate::travel::destination::{DestinationApi, DestinationBackend, SavedDestinations};
use crate::travel::error::ApiResult;
use crate::travel::http::HttpClient;
use crate::travel::location::LocationSearch;
use crate::travel::notification::{
    NotificationApi, NotificationBackend, NotificationCenter, NotificationListener,
};
use crate::travel::preference::{PreferenceApi, PreferenceBackend, PreferenceStore};
use crate::travel::session::{Session, SessionEvents};
use crate::travel::trip::{
    EmptyTripListener, InvitationInbox, TripApi, TripBackend, TripCatalog, TripListener,
    TripMembershipManager,
};
use crate::travel::types::TripId;
use std::sync::Arc;
use tracing::info;

/// 旅行搭子客户端
#[derive(Clone)]
pub struct TravelClient {
    config: ClientConfig,
    session: Session,
    http: HttpClient,
    auth: AuthApi,
    buddy_backend: Arc<dyn BuddyBackend>,
    trip_backend: Arc<dyn TripBackend>,
    chat_backend: Arc<dyn ChatBackend>,
    notification_backend: Arc<dyn NotificationBackend>,
    preference_backend: Arc<dyn PreferenceBackend>,
    destination_backend: Arc<dyn DestinationBackend>,
    trip_listener: Arc<dyn TripListener>,
    chat_listener: Arc<dyn ChatListener>,
    buddies: Arc<BuddyManager>,
    notifications: Arc<NotificationCenter>,
    location: Arc<LocationSearch>,
}

impl TravelClient {
    /// 创建客户端（未登录）
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let session = Session::new();
        let http = HttpClient::new(config.api_base_url.clone(), session.clone())?;
        let location = LocationSearch::new(
            reqwest::Client::new(),
            config.nominatim_url.clone(),
            config.location_debounce,
        );

        let buddy_backend: Arc<dyn BuddyBackend> = Arc::new(BuddyApi::new(http.clone()));
        let notification_backend: Arc<dyn NotificationBackend> =
            Arc::new(NotificationApi::new(http.clone()));

        info!(
            "[Client] 🚀 客户端已创建，API: {}, WS: {}",
            config.api_base_url, config.ws_base_url
        );

        Ok(Self {
            auth: AuthApi::new(http.clone()),
            buddies: Arc::new(BuddyManager::new(buddy_backend.clone(), session.clone())),
            notifications: Arc::new(NotificationCenter::new(notification_backend.clone())),
            buddy_backend,
            notification_backend,
            trip_backend: Arc::new(TripApi::new(http.clone())),
            chat_backend: Arc::new(ChatApi::new(http.clone())),
            preference_backend: Arc::new(PreferenceApi::new(http.clone())),
            destination_backend: Arc::new(DestinationApi::new(http.clone())),
            trip_listener: Arc::new(EmptyTripListener),
            chat_listener: Arc::new(EmptyChatListener),
            location: Arc::new(location),
            config,
            session,
            http,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// 订阅登录/登出/失效事件
    pub fn session_events(&self) -> SessionEvents {
        self.session.subscribe()
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        self.auth.login(email, password).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse> {
        self.auth.register(request).await
    }

    pub async fn google_login(&self, access_token: &str) -> ApiResult<AuthResponse> {
        self.auth.google_login(access_token).await
    }

    pub fn logout(&self) {
        self.auth.logout();
    }

    /// 注册搭子监听器（重建搭子管理器，本地匹配列表需重新拉取）
    pub fn set_buddy_listener(&mut self, listener: Arc<dyn BuddyListener>) {
        self.buddies = Arc::new(BuddyManager::with_listener(
            self.buddy_backend.clone(),
            self.session.clone(),
            listener,
        ));
    }

    /// 注册行程监听器，对之后取得的行程管理器生效
    pub fn set_trip_listener(&mut self, listener: Arc<dyn TripListener>) {
        self.trip_listener = listener;
    }

    /// 注册聊天监听器，对之后打开的聊天室生效
    pub fn set_chat_listener(&mut self, listener: Arc<dyn ChatListener>) {
        self.chat_listener = listener;
    }

    /// 注册通知监听器（重建通知中心）
    pub fn set_notification_listener(&mut self, listener: Arc<dyn NotificationListener>) {
        self.notifications = Arc::new(NotificationCenter::with_listener(
            self.notification_backend.clone(),
            listener,
        ));
    }

    pub fn buddies(&self) -> Arc<BuddyManager> {
        self.buddies.clone()
    }

    pub fn notifications(&self) -> Arc<NotificationCenter> {
        self.notifications.clone()
    }

    pub fn location(&self) -> Arc<LocationSearch> {
        self.location.clone()
    }

    /// 单个行程的成员管理器
    pub fn trip(&self, trip_id: TripId) -> TripMembershipManager {
        TripMembershipManager::with_listener(
            self.trip_backend.clone(),
            self.session.clone(),
            trip_id,
            self.trip_listener.clone(),
        )
    }

    pub fn invitations(&self) -> InvitationInbox {
        InvitationInbox::with_listener(self.trip_backend.clone(), self.trip_listener.clone())
    }

    pub fn catalog(&self) -> TripCatalog {
        TripCatalog::new(self.trip_backend.clone())
    }

    /// 行程聊天室（调用 `open` 后才会拉历史、建连接）
    pub fn chat_room(&self, trip_id: TripId) -> ChatRoom {
        ChatRoom::with_listener(
            trip_id,
            self.chat_backend.clone(),
            self.session.clone(),
            &self.config,
            self.chat_listener.clone(),
        )
    }

    pub fn preferences(&self) -> PreferenceStore {
        PreferenceStore::new(self.preference_backend.clone())
    }

    pub fn destinations(&self, trip_id: TripId) -> SavedDestinations {
        SavedDestinations::new(self.destination_backend.clone(), trip_id)
    }
}
