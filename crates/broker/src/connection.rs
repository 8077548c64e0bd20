//! BrokerConnection - resilient MQTT subscription

use std::sync::Arc;
use std::time::Duration;

use contracts::{BrokerConfig, BrokerMessage};
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS,
    SubscribeReasonCode,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use crate::error::Result;
use crate::forward::{ForwardStats, Forwarder};
use crate::options::{mqtt_options, to_qos};

/// Requests buffered between the client handle and the event loop
const CLIENT_CAPACITY: usize = 16;

/// Subscription to the telemetry topic
///
/// Every accepted session (the first one and each reconnect) renews the
/// subscription. Transport loss is logged, then the connection is retried
/// after a fixed interval until cancelled. Messages published while
/// disconnected are not recovered.
pub struct BrokerConnection {
    options: MqttOptions,
    topic: String,
    qos: QoS,
    reconnect_interval: Duration,
}

impl BrokerConnection {
    /// Prepare a connection (nothing is dialed until [`run`](Self::run))
    pub fn new(config: &BrokerConfig) -> Result<Self> {
        Ok(Self {
            options: mqtt_options(config)?,
            topic: config.topic.clone(),
            qos: to_qos(config.qos),
            reconnect_interval: Duration::from_millis(config.reconnect_interval_ms),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Run the subscription on a background task
    pub fn spawn(self, forwarder: Forwarder, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(forwarder, cancel))
    }

    /// Drive the connection until cancelled
    #[instrument(
        name = "broker_connection",
        skip_all,
        fields(topic = %self.topic, broker = ?self.options.broker_address())
    )]
    pub async fn run(self, forwarder: Forwarder, cancel: CancellationToken) {
        let (client, mut eventloop) = AsyncClient::new(self.options.clone(), CLIENT_CAPACITY);
        let stats = forwarder.stats();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                event = eventloop.poll() => match event {
                    Ok(Event::Incoming(packet)) => {
                        self.on_packet(packet, &client, &forwarder, &stats);
                    }
                    Ok(Event::Outgoing(_)) => {}
                    Err(e) => {
                        stats.inc_reconnects();
                        observability::record_broker_reconnect();
                        warn!(
                            error = %e,
                            retry_in_ms = self.reconnect_interval.as_millis() as u64,
                            "broker transport lost"
                        );

                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => break,
                            _ = tokio::time::sleep(self.reconnect_interval) => {}
                        }
                    }
                }
            }
        }

        if let Err(e) = client.try_disconnect() {
            debug!(error = %e, "disconnect request not delivered");
        }
        drain(&mut eventloop).await;
        info!("broker connection closed");
    }

    fn on_packet(
        &self,
        packet: Packet,
        client: &AsyncClient,
        forwarder: &Forwarder,
        stats: &Arc<ForwardStats>,
    ) {
        match packet {
            Packet::ConnAck(ack) if ack.code == ConnectReturnCode::Success => {
                stats.inc_connections();
                info!(session_present = ack.session_present, "broker session accepted");
                if let Err(e) = client.try_subscribe(self.topic.clone(), self.qos) {
                    warn!(error = %e, "subscribe request not queued");
                }
            }
            Packet::ConnAck(ack) => {
                warn!(code = ?ack.code, "broker refused session");
            }
            Packet::SubAck(ack) => {
                for code in &ack.return_codes {
                    match code {
                        SubscribeReasonCode::Success(qos) => {
                            info!(granted_qos = ?qos, "subscribed");
                        }
                        SubscribeReasonCode::Failure => {
                            warn!("broker rejected subscription");
                        }
                    }
                }
            }
            Packet::Publish(publish) => {
                trace!(bytes = publish.payload.len(), "publish received");
                forwarder.forward(BrokerMessage::new(publish.topic, publish.payload));
            }
            _ => {}
        }
    }
}

/// Flush the pending DISCONNECT without waiting on a dead transport
async fn drain(eventloop: &mut EventLoop) {
    let flush = async {
        while let Ok(event) = eventloop.poll().await {
            if let Event::Outgoing(rumqttc::Outgoing::Disconnect) = event {
                break;
            }
        }
    };
    if tokio::time::timeout(Duration::from_millis(500), flush)
        .await
        .is_err()
    {
        debug!("disconnect flush timed out");
    }
}
