//! Stream Hub: a single actor task owning the subscriber registry.
//!
//! One task, one command channel, no shared locks: a single logical
//! registry with per-subscriber filters and drop-on-full backpressure,
//! which a plain `broadcast::channel` can't express. A `broadcast`
//! receiver that falls behind gets a `Lagged` error and skips entries; it
//! is never evicted the way a bounded mpsc subscriber is here.

use observability_common::{LogEntry, LogLevel};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use tokio::sync::mpsc;

pub type SubscriberId = u64;

/// Subscriber-supplied filter; missing fields match anything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriberFilter {
    pub service: Option<String>,
    pub level: Option<LogLevel>,
    pub correlation_id: Option<String>,
}

impl SubscriberFilter {
    fn matches(&self, entry: &LogEntry) -> bool {
        self.service.as_deref().is_none_or(|s| entry.service == s)
            && self.level.is_none_or(|l| entry.level == l)
            && self
                .correlation_id
                .as_deref()
                .is_none_or(|c| entry.correlation_id == c)
    }
}

enum HubCommand {
    Register {
        filter: SubscriberFilter,
        mailbox_capacity: usize,
        reply: tokio::sync::oneshot::Sender<(SubscriberId, mpsc::Receiver<LogEntry>)>,
    },
    Unregister(SubscriberId),
    SetFilter(SubscriberId, SubscriberFilter),
    Publish(Box<LogEntry>),
    SubscriberCount(tokio::sync::oneshot::Sender<usize>),
}

#[derive(Clone)]
pub struct StreamHubHandle {
    cmd_tx: mpsc::Sender<HubCommand>,
}

impl StreamHubHandle {
    pub async fn register(
        &self,
        filter: SubscriberFilter,
        mailbox_capacity: usize,
    ) -> (SubscriberId, mpsc::Receiver<LogEntry>) {
        let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
        if self
            .cmd_tx
            .send(HubCommand::Register {
                filter,
                mailbox_capacity,
                reply: reply_tx,
            })
            .await
            .is_err()
        {
            let (_tx, rx) = mpsc::channel(1);
            return (0, rx);
        }
        reply_rx.await.unwrap_or_else(|_| {
            let (_tx, rx) = mpsc::channel(1);
            (0, rx)
        })
    }

    pub async fn unregister(&self, id: SubscriberId) {
        let _ = self.cmd_tx.send(HubCommand::Unregister(id)).await;
    }

    pub async fn set_filter(&self, id: SubscriberId, filter: SubscriberFilter) {
        let _ = self.cmd_tx.send(HubCommand::SetFilter(id, filter)).await;
    }

    /// Non-blocking on the caller: the hub itself never awaits a
    /// subscriber's mailbox, so ingest latency is never coupled to a slow
    /// reader.
    pub async fn publish(&self, entry: LogEntry) {
        let _ = self.cmd_tx.send(HubCommand::Publish(Box::new(entry))).await;
    }

    #[cfg(test)]
    pub async fn subscriber_count(&self) -> usize {
        let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
        let _ = self.cmd_tx.send(HubCommand::SubscriberCount(reply_tx)).await;
        reply_rx.await.unwrap_or(0)
    }
}

struct Subscriber {
    filter: SubscriberFilter,
    mailbox: mpsc::Sender<LogEntry>,
}

pub struct StreamHub {
    cmd_rx: mpsc::Receiver<HubCommand>,
    subscribers: FxHashMap<SubscriberId, Subscriber>,
    next_id: SubscriberId,
}

impl StreamHub {
    /// Spawns the actor task and returns a cloneable handle to it.
    #[must_use]
    pub fn spawn() -> StreamHubHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(1024);
        let hub = StreamHub {
            cmd_rx,
            subscribers: FxHashMap::default(),
            next_id: 1,
        };
        tokio::spawn(hub.run());
        StreamHubHandle { cmd_tx }
    }

    async fn run(mut self) {
        while let Some(cmd) = self.cmd_rx.recv().await {
            match cmd {
                HubCommand::Register {
                    filter,
                    mailbox_capacity,
                    reply,
                } => {
                    let id = self.next_id;
                    self.next_id += 1;
                    let (tx, rx) = mpsc::channel(mailbox_capacity.max(1));
                    self.subscribers.insert(id, Subscriber { filter, mailbox: tx });
                    let _ = reply.send((id, rx));
                }
                HubCommand::Unregister(id) => {
                    self.subscribers.remove(&id);
                }
                HubCommand::SetFilter(id, filter) => {
                    if let Some(sub) = self.subscribers.get_mut(&id) {
                        sub.filter = filter;
                    }
                }
                HubCommand::Publish(entry) => {
                    let mut dead = Vec::new();
                    for (id, sub) in &self.subscribers {
                        if !sub.filter.matches(&entry) {
                            continue;
                        }
                        if let Err(mpsc::error::TrySendError::Full(_) | mpsc::error::TrySendError::Closed(_)) =
                            sub.mailbox.try_send((*entry).clone())
                        {
                            dead.push(*id);
                        }
                    }
                    for id in dead {
                        self.subscribers.remove(&id);
                    }
                }
                HubCommand::SubscriberCount(reply) => {
                    let _ = reply.send(self.subscribers.len());
                }
            }
        }
    }
}
