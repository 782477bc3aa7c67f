// Live fan-out of the aggregate to any number of observers

use crate::state::{AggregateStateView, ControllerState};
use futures::stream::{self, Stream};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Whether an event is a subscriber's first payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    InitialData,
    Update,
}

/// One emission: always the full current state, never a delta
#[derive(Clone, Debug, Serialize)]
pub struct BroadcastEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(flatten)]
    pub view: AggregateStateView,
}

/// Hands out independent subscriptions over the controller state.
///
/// Every subscriber polls the shared state on its own timer, so a slow or
/// vanished subscriber only delays itself.
#[derive(Clone)]
pub struct Broadcaster {
    state: Arc<ControllerState>,
    period: Duration,
}

impl Broadcaster {
    pub fn new(state: Arc<ControllerState>, period: Duration) -> Self {
        Self { state, period }
    }

    /// Infinite event stream with its own cursor.
    ///
    /// The first event is always `InitialData`; later ticks emit `Update`
    /// only when the step counter moved since this subscriber's last event.
    pub fn subscribe(&self) -> impl Stream<Item = BroadcastEvent> + Send + 'static {
        let cursor = Cursor {
            state: Arc::clone(&self.state),
            period: self.period,
            ticker: None,
            last_step: None,
        };

        stream::unfold(cursor, |mut cursor| async move {
            let event = cursor.next_event().await;
            Some((event, cursor))
        })
    }
}

struct Cursor {
    state: Arc<ControllerState>,
    period: Duration,
    // Created on first poll so subscribing needs no runtime context
    ticker: Option<Interval>,
    last_step: Option<u64>,
}

impl Cursor {
    async fn next_event(&mut self) -> BroadcastEvent {
        let period = self.period;
        let ticker = self.ticker.get_or_insert_with(|| {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });

        loop {
            ticker.tick().await;
            if let Some(event) = Self::observe(&self.state, &mut self.last_step) {
                return event;
            }
        }
    }

    fn observe(state: &ControllerState, last_step: &mut Option<u64>) -> Option<BroadcastEvent> {
        let kind = match *last_step {
            None => EventKind::InitialData,
            Some(last) if state.step() > last => EventKind::Update,
            Some(_) => return None,
        };

        let view = state.view();
        *last_step = Some(view.step);
        Some(BroadcastEvent { kind, view })
    }
}
