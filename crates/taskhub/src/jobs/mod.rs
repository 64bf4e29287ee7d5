//! Asynchronous notification delivery.
//!
//! Mutating task operations hand assignment notifications to the
//! [`NotificationDispatcher`], which enqueues them and returns. A
//! [`WorkerPool`] drains the queue on its own tokio tasks, running each job
//! through the [`NotificationWorker`] with bounded retry.

mod dispatcher;
mod pool;
mod worker;

pub use dispatcher::NotificationDispatcher;
pub use pool::WorkerPool;
pub use worker::NotificationWorker;
