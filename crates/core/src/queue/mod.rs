mod error;
mod traits;
mod types;

pub use error::{QueueError, Result};
pub use traits::JobQueue;
pub use types::{
    deserialize_envelope, serialize_envelope, Job, JobEnvelope, RetryPolicy,
    DEFAULT_MAX_ATTEMPTS,
};
