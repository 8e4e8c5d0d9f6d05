//! The bounded order queue and the dispatcher feeding it.
//!
//! The queue moves through three states. It is `Open` while the dispatcher
//! may still push, `Closed` once the sending half is closed (explicitly or by
//! being dropped), and `Drained` once a worker finds it closed and empty.
//! Closing is the only way workers learn that no more work is coming.

use crate::download::{Download, Order, UiEvent};
use crate::error::{Error, Result};

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// Default number of orders buffered between the dispatcher and the pool.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Lifecycle of an order queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Open,
    Closed,
    Drained,
}

impl QueueState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => QueueState::Open,
            1 => QueueState::Closed,
            _ => QueueState::Drained,
        }
    }
}

#[derive(Debug, Default)]
struct SharedState(AtomicU8);

impl SharedState {
    fn get(&self) -> QueueState {
        QueueState::from_u8(self.0.load(Ordering::SeqCst))
    }

    fn close(&self) {
        let _ = self
            .0
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst);
    }

    fn drain(&self) {
        self.0.store(2, Ordering::SeqCst);
    }
}

/// Create a queue holding at most `capacity` pending orders.
pub fn order_queue(capacity: usize) -> (OrderSender, OrderReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let state = Arc::new(SharedState::default());
    (
        OrderSender {
            tx: Some(tx),
            state: state.clone(),
        },
        OrderReceiver {
            rx: Arc::new(Mutex::new(rx)),
            state,
        },
    )
}

/// Sending half of the queue. Dropping it closes the queue.
#[derive(Debug)]
pub struct OrderSender {
    tx: Option<mpsc::Sender<Order>>,
    state: Arc<SharedState>,
}

impl OrderSender {
    /// Push one order, waiting while the queue is full.
    pub async fn push(&self, order: Order) -> Result<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| Error::Internal("order queue is closed".into()))?;
        tx.send(order)
            .await
            .map_err(|_| Error::Internal("order queue has no workers left".into()))
    }

    /// Close the queue. Workers finish what is buffered, then stop.
    pub fn close(self) {}

    pub fn state(&self) -> QueueState {
        self.state.get()
    }
}

impl Drop for OrderSender {
    fn drop(&mut self) {
        // Mark closed before the channel closes, so no worker can observe
        // the end of the queue while the state still reads `Open`.
        self.state.close();
        self.tx.take();
    }
}

/// Receiving half of the queue, shared by every worker of the pool.
#[derive(Debug, Clone)]
pub struct OrderReceiver {
    rx: Arc<Mutex<mpsc::Receiver<Order>>>,
    state: Arc<SharedState>,
}

impl OrderReceiver {
    /// Next order, or `None` once the queue is closed and empty.
    pub async fn next(&self) -> Option<Order> {
        let next = self.rx.lock().await.recv().await;
        if next.is_none() {
            self.state.drain();
        }
        next
    }

    pub fn state(&self) -> QueueState {
        self.state.get()
    }
}

/// Push one order per download, then close the queue.
///
/// Returns the number of orders pushed. Does not wait for any of them to
/// complete.
pub async fn dispatch(
    sender: OrderSender,
    downloads: Vec<Download>,
    notify: mpsc::UnboundedSender<UiEvent>,
) -> usize {
    let mut pushed = 0;
    for download in downloads {
        if let Err(e) = sender.push(Order::new(download, notify.clone())).await {
            debug!(error = %e, "Dispatcher stopped early");
            break;
        }
        pushed += 1;
    }
    debug!(pushed, "All orders dispatched, closing queue");
    sender.close();
    pushed
}
