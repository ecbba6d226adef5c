//! Top-level real-time engine that ties together all subsystems.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use murmur_auth::jwt::CredentialVerifier;
use murmur_core::clock::Clock;
use murmur_core::config::realtime::RealtimeConfig;
use murmur_core::traits::Repository;
use murmur_core::types::{MessageId, NotificationId, UserId};
use murmur_entity::message::ChatMessage;
use murmur_entity::notification::{Notification, NotificationSettings};
use murmur_entity::user::User;

use crate::chat::service::ChatService;
use crate::connection::authenticator::ConnectionAuthenticator;
use crate::connection::manager::ConnectionManager;
use crate::connection::pool::ConnectionPool;
use crate::metrics::RealtimeMetrics;
use crate::notification::dispatcher::NotificationDispatcher;
use crate::notification::gate::NotificationGate;
use crate::notification::settings::NotificationSettingsService;
use crate::presence::forwarder::PresenceForwarder;
use crate::presence::tracker::PresenceTracker;
use crate::router::MessageRouter;
use crate::topic::registry::TopicRegistry;

/// Persistence collaborators the engine reads and writes.
#[derive(Clone)]
pub struct EngineStores {
    /// User profiles (presence is mirrored onto them).
    pub users: Arc<dyn Repository<User, UserId>>,
    /// Chat history.
    pub messages: Arc<dyn Repository<ChatMessage, MessageId>>,
    /// Stored notifications.
    pub notifications: Arc<dyn Repository<Notification, NotificationId>>,
    /// Per-user notification settings.
    pub settings: Arc<dyn Repository<NotificationSettings, UserId>>,
}

impl std::fmt::Debug for EngineStores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineStores").finish()
    }
}

/// Central real-time engine that coordinates all WebSocket subsystems.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Connection manager.
    pub connections: Arc<ConnectionManager>,
    /// Handshake authenticator.
    pub authenticator: ConnectionAuthenticator,
    /// Presence tracker.
    pub presence: Arc<PresenceTracker>,
    /// Topic registry.
    pub topics: Arc<TopicRegistry>,
    /// Message router.
    pub router: Arc<MessageRouter>,
    /// Private history and addressed sends.
    pub chat: ChatService,
    /// Notification dispatcher.
    pub notifications: NotificationDispatcher,
    /// Notification settings.
    pub settings: NotificationSettingsService,
    /// Metrics collector.
    pub metrics: Arc<RealtimeMetrics>,
    users: Arc<dyn Repository<User, UserId>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine").finish()
    }
}

impl RealtimeEngine {
    /// Creates a new real-time engine with all subsystems.
    pub fn new(
        config: RealtimeConfig,
        verifier: Arc<dyn CredentialVerifier>,
        stores: EngineStores,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let metrics = Arc::new(RealtimeMetrics::new());
        let pool = Arc::new(ConnectionPool::new());
        let topics = Arc::new(TopicRegistry::new());
        let presence = Arc::new(PresenceTracker::new(
            clock.clone(),
            config.presence_event_buffer,
        ));
        let router = Arc::new(MessageRouter::new(
            pool.clone(),
            presence.clone(),
            topics.clone(),
            metrics.clone(),
        ));
        let notifications = NotificationDispatcher::new(
            NotificationGate::new(stores.settings.clone(), clock.clone()),
            stores.notifications.clone(),
            router.clone(),
            metrics.clone(),
        );
        let settings = NotificationSettingsService::new(stores.settings.clone(), clock.clone());
        let chat = ChatService::new(
            stores.messages.clone(),
            router.clone(),
            presence.clone(),
            notifications.clone(),
            clock,
        );
        let connections = Arc::new(ConnectionManager::new(
            config,
            pool,
            topics.clone(),
            presence.clone(),
            router.clone(),
            chat.clone(),
            metrics.clone(),
        ));
        let authenticator = ConnectionAuthenticator::new(verifier, presence.clone());

        info!("Real-time engine initialized");

        Self {
            connections,
            authenticator,
            presence,
            topics,
            router,
            chat,
            notifications,
            settings,
            metrics,
            users: stores.users,
            shutdown_tx,
        }
    }

    /// Forward presence changes to the `presence` topic and mirror them
    /// onto the user's stored profile. Runs until shutdown.
    pub fn spawn_presence_forwarder(&self) -> JoinHandle<()> {
        let mut events = self.presence.subscribe();
        let mut shutdown = self.shutdown_receiver();
        let mut forwarder =
            PresenceForwarder::new(self.presence.clone(), self.router.clone(), self.users.clone());

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    event = events.recv() => match event {
                        Ok(event) => {
                            forwarder.apply(event).await;
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Presence forwarder lagged; resynchronising");
                            forwarder.resync().await;
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            debug!("Presence forwarder stopped");
        })
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Initiates a graceful shutdown of the real-time engine.
    pub fn shutdown(&self) {
        info!("Shutting down real-time engine");
        let _ = self.shutdown_tx.send(());
        self.connections.close_all();
    }
}
