//! Connection driver and inbound routing.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, Packet, QoS};
use tokio::sync::watch;

use thermotrack_app::command_inbox::CommandInbox;
use thermotrack_app::event_bus::InProcessEventBus;
use thermotrack_app::ports::EventPublisher;
use thermotrack_domain::event::EventPayload;

use crate::error::MqttError;

/// Where inbound messages go.
#[derive(Clone, Default)]
pub struct Inbound {
    /// Receives payloads from the commands topic.
    pub commands: Option<CommandInbox>,
    /// Receives payloads from the events topic (for the persistence sink).
    pub events: Option<InProcessEventBus>,
}

/// Routes a received message by topic.
pub(crate) struct Router {
    events_topic: String,
    commands_topic: String,
    inbound: Inbound,
}

impl Router {
    pub(crate) fn new(events_topic: String, commands_topic: String, inbound: Inbound) -> Self {
        Self {
            events_topic,
            commands_topic,
            inbound,
        }
    }

    /// Topics to (re-)subscribe after every connect.
    pub(crate) fn subscriptions(&self) -> Vec<&str> {
        let mut topics = Vec::with_capacity(2);
        if self.inbound.commands.is_some() {
            topics.push(self.commands_topic.as_str());
        }
        if self.inbound.events.is_some() {
            topics.push(self.events_topic.as_str());
        }
        topics
    }

    pub(crate) async fn dispatch(&self, topic: &str, payload: &[u8]) {
        let text = match std::str::from_utf8(payload).map_err(MqttError::NotUtf8) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(topic, error = %err, "dropping message");
                return;
            }
        };
        if topic == self.commands_topic {
            if let Some(inbox) = &self.inbound.commands {
                inbox.deliver(text);
            }
        } else if topic == self.events_topic {
            if let Some(bus) = &self.inbound.events {
                match serde_json::from_str::<EventPayload>(text) {
                    Ok(payload) => {
                        let _ = bus.publish(payload).await;
                    }
                    Err(err) => tracing::debug!(error = %err, "ignoring non-event message"),
                }
            }
        } else {
            tracing::debug!(topic, "message on unexpected topic");
        }
    }
}

/// Drives the MQTT connection: reconnects, re-subscribes and routes inbound
/// messages. Outgoing publishes are flushed as a side effect of polling.
pub struct MqttEventLoop {
    client: AsyncClient,
    event_loop: EventLoop,
    events_topic: String,
    commands_topic: String,
    reconnect_delay: Duration,
}

impl MqttEventLoop {
    pub(crate) fn new(
        client: AsyncClient,
        event_loop: EventLoop,
        events_topic: String,
        commands_topic: String,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            client,
            event_loop,
            events_topic,
            commands_topic,
            reconnect_delay,
        }
    }

    /// Poll until `shutdown` flips to `true`, then disconnect.
    pub async fn run(mut self, inbound: Inbound, mut shutdown: watch::Receiver<bool>) {
        let router = Router::new(self.events_topic.clone(), self.commands_topic.clone(), inbound);
        tracing::info!(events = %self.events_topic, commands = %self.commands_topic, "MQTT transport started");

        loop {
            let polled = tokio::select! {
                polled = self.event_loop.poll() => polled,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            };
            match polled {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    tracing::info!("connected to MQTT broker");
                    for topic in router.subscriptions() {
                        // try_subscribe: awaiting here would block the poller that drains the queue.
                        if let Err(err) = self.client.try_subscribe(topic, QoS::AtMostOnce) {
                            tracing::warn!(topic, error = %err, "failed to subscribe");
                        }
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    router.dispatch(&publish.topic, &publish.payload).await;
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "MQTT connection error, retrying");
                    let stop = tokio::select! {
                        () = tokio::time::sleep(self.reconnect_delay) => false,
                        changed = shutdown.changed() => changed.is_err(),
                    };
                    if stop || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        if let Err(err) = self.client.try_disconnect() {
            tracing::debug!(error = %err, "disconnect request not queued");
        }
        tracing::info!("MQTT transport stopped");
    }
}
