//! Database models.

pub mod peak;
pub mod sample;
pub mod session;

pub use peak::PeakRow;
pub use sample::SampleRow;
pub use session::SessionRow;
