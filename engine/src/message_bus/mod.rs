//! Message Bus for pipeline notifications
//!
//! The MessageBus lets observers (the CLI, tests, future front-ends) follow
//! the command pipeline without the agent knowing who is listening. It uses
//! bounded channels to prevent unbounded memory growth and supports both
//! specific event subscriptions and global "All" subscriptions.
//!
//! Publishing never blocks the pipeline: a subscriber whose channel is full
//! or closed simply misses the event.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// Channel buffer size for bounded channels
const CHANNEL_BUFFER_SIZE: usize = 100;

/// Event types that can be published on the message bus
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum EventType {
    /// A command entered the pipeline
    CommandReceived,
    /// A workflow started executing
    WorkflowStarted,
    /// A workflow finished all its steps
    WorkflowCompleted,
    /// A workflow stopped on an error
    WorkflowFailed,
    /// The preference record was persisted
    PreferencesSaved,
    /// Subscribe to all event types
    All,
}

/// Events that can be published on the message bus
#[derive(Debug, Clone)]
pub enum Event {
    /// Command received with its text
    CommandReceived { text: String },
    /// Workflow started with ID, intent and number of steps
    WorkflowStarted {
        workflow_id: String,
        intent: String,
        steps: usize,
    },
    /// Workflow completed with ID and composed message
    WorkflowCompleted { workflow_id: String, message: String },
    /// Workflow failed with ID and error
    WorkflowFailed { workflow_id: String, error: String },
    /// Preferences saved under a storage key
    PreferencesSaved { storage_key: String },
}

impl Event {
    /// Get the event type for this event
    pub fn event_type(&self) -> EventType {
        match self {
            Event::CommandReceived { .. } => EventType::CommandReceived,
            Event::WorkflowStarted { .. } => EventType::WorkflowStarted,
            Event::WorkflowCompleted { .. } => EventType::WorkflowCompleted,
            Event::WorkflowFailed { .. } => EventType::WorkflowFailed,
            Event::PreferencesSaved { .. } => EventType::PreferencesSaved,
        }
    }
}

/// Message bus for pub/sub communication between components
///
/// Each subscriber gets its own bounded channel with CHANNEL_BUFFER_SIZE
/// capacity.
pub struct MessageBus {
    channels: Arc<Mutex<HashMap<EventType, Vec<mpsc::Sender<Event>>>>>,
}

impl MessageBus {
    /// Create a new MessageBus
    pub fn new() -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Subscribe to a specific event type, or `EventType::All` for every event
    pub async fn subscribe(&self, event_type: EventType) -> mpsc::Receiver<Event> {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let mut channels = self.channels.lock().await;
        channels.entry(event_type).or_default().push(tx);
        rx
    }

    /// Publish an event to all subscribers
    ///
    /// The event goes to the subscribers of its own type and to every
    /// `EventType::All` subscriber. Subscribers that dropped their receiver
    /// are pruned.
    pub async fn publish(&self, event: Event) {
        let mut channels = self.channels.lock().await;
        let event_type = event.event_type();

        for key in [event_type, EventType::All] {
            if let Some(subscribers) = channels.get_mut(&key) {
                subscribers.retain(|tx| match tx.try_send(event.clone()) {
                    Ok(()) => true,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        debug!("Subscriber lagging, dropped {:?} event", event_type);
                        true
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => false,
                });
            }
        }
    }

    /// Number of live subscriptions across all event types
    pub async fn subscriber_count(&self) -> usize {
        let channels = self.channels.lock().await;
        channels.values().map(Vec::len).sum()
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}
