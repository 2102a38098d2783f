//! DaZeus core client.
//!
//! One owned connection to the core. Requests are answered in order, and
//! events can arrive at any time, including while a response is awaited;
//! those are queued and handed out by [`DaZeusClient::next_event`].

use std::collections::VecDeque;
use std::sync::Mutex as StdMutex;

use futures::{SinkExt, StreamExt};
use karma_core::error::{KarmaError, KarmaResult};
use karma_core::types::Scope;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio_util::codec::Framed;
use tracing::{debug, trace};

use crate::codec::DaZeusCodec;
use crate::endpoint::{Endpoint, Transport};
use crate::protocol::{check_success, property_value, request, Event};

type Connection = Framed<Box<dyn Transport>, DaZeusCodec>;

struct Inner {
    conn: Option<Connection>,
    pending_events: VecDeque<Event>,
}

/// Client for the DaZeus plugin socket.
pub struct DaZeusClient {
    inner: Mutex<Inner>,
    last_error: StdMutex<Option<String>>,
}

impl DaZeusClient {
    /// Connect to the core.
    pub async fn connect(endpoint: &Endpoint) -> KarmaResult<Self> {
        let transport = endpoint.connect().await?;
        debug!("Connected to DaZeus at {}", endpoint);
        Ok(Self::from_transport(transport))
    }

    /// Wrap an already-open stream.
    pub fn from_transport<T: Transport + 'static>(transport: T) -> Self {
        let transport: Box<dyn Transport> = Box::new(transport);
        Self {
            inner: Mutex::new(Inner {
                conn: Some(Framed::new(transport, DaZeusCodec::new())),
                pending_events: VecDeque::new(),
            }),
            last_error: StdMutex::new(None),
        }
    }

    /// Identify this plugin to the core.
    pub async fn handshake(
        &self,
        name: &str,
        version: &str,
        config_group: Option<&str>,
    ) -> KarmaResult<()> {
        let config_group = config_group.unwrap_or(name);
        self.request(request::handshake(name, version, config_group))
            .await
            .map_err(|e| KarmaError::handshake(format!("handshake failed: {}", e)))?;
        Ok(())
    }

    /// Subscribe to events by name.
    pub async fn subscribe(&self, events: &[&str]) -> KarmaResult<()> {
        self.request(request::subscribe(events)).await?;
        Ok(())
    }

    /// Send a chat message.
    pub async fn message(&self, network: &str, target: &str, text: &str) -> KarmaResult<()> {
        self.request(request::message(network, target, text)).await?;
        Ok(())
    }

    /// Read a property.
    pub async fn get_property(&self, key: &str, scope: &Scope) -> KarmaResult<Option<String>> {
        let response = self.request(request::get_property(key, scope)).await?;
        Ok(property_value(&response))
    }

    /// Write a property.
    pub async fn set_property(&self, key: &str, value: &str, scope: &Scope) -> KarmaResult<()> {
        self.request(request::set_property(key, value, scope)).await?;
        Ok(())
    }

    /// Remove a property.
    pub async fn unset_property(&self, key: &str, scope: &Scope) -> KarmaResult<()> {
        self.request(request::unset_property(key, scope)).await?;
        Ok(())
    }

    /// Wait for the next event from the core.
    pub async fn next_event(&self) -> KarmaResult<Event> {
        let mut inner = self.inner.lock().await;
        if let Some(event) = inner.pending_events.pop_front() {
            return Ok(event);
        }

        loop {
            let frame = self.read_frame(&mut inner).await?;
            match Event::from_frame(&frame) {
                Some(event) => return Ok(event),
                None => debug!("Ignoring response with no request outstanding: {}", frame),
            }
        }
    }

    /// Close the connection. Later calls fail with a connection error.
    pub async fn close(&self) -> KarmaResult<()> {
        let mut inner = self.inner.lock().await;
        if let Some(mut conn) = inner.conn.take() {
            conn.close().await?;
            debug!("Closed DaZeus connection");
        }
        Ok(())
    }

    /// Whether the connection is still open.
    pub async fn is_open(&self) -> bool {
        self.inner.lock().await.conn.is_some()
    }

    /// The most recent request failure, if any.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|e| e.clone())
    }

    async fn request(&self, req: Value) -> KarmaResult<Value> {
        let result = self.exchange(req).await;
        if let Err(e) = &result {
            if let Ok(mut last_error) = self.last_error.lock() {
                *last_error = Some(e.to_string());
            }
        }
        result
    }

    async fn exchange(&self, req: Value) -> KarmaResult<Value> {
        let mut inner = self.inner.lock().await;
        trace!("DaZeus request: {}", req);
        inner
            .conn
            .as_mut()
            .ok_or_else(KarmaError::connection_closed)?
            .send(req)
            .await?;

        loop {
            let frame = self.read_frame(&mut inner).await?;
            match Event::from_frame(&frame) {
                Some(event) => inner.pending_events.push_back(event),
                None => {
                    trace!("DaZeus response: {}", frame);
                    return check_success(frame);
                }
            }
        }
    }

    async fn read_frame(&self, inner: &mut Inner) -> KarmaResult<Value> {
        let conn = inner
            .conn
            .as_mut()
            .ok_or_else(KarmaError::connection_closed)?;
        match conn.next().await {
            Some(frame) => frame,
            None => {
                inner.conn = None;
                Err(KarmaError::connection_closed())
            }
        }
    }
}
