//! Repositories for the persisted schema.

pub mod channel;
pub mod peak;
pub mod sample;
pub mod session;

pub use channel::ChannelRepository;
pub use peak::PeakRepository;
pub use sample::SampleRepository;
pub use session::SessionRepository;

use crate::database::DbPool;

/// Bundle of repositories sharing one connection pool.
///
/// Storage is the only shared mutable resource across the worker, supervisor,
/// and reconciler tasks; every repository operation is a self-contained
/// statement or transaction.
pub struct Storage {
    pub channels: ChannelRepository,
    pub samples: SampleRepository,
    pub sessions: SessionRepository,
    pub peaks: PeakRepository,
}

impl Storage {
    pub fn new(pool: DbPool) -> Self {
        Self {
            channels: ChannelRepository::new(pool.clone()),
            samples: SampleRepository::new(pool.clone()),
            sessions: SessionRepository::new(pool.clone()),
            peaks: PeakRepository::new(pool),
        }
    }
}
