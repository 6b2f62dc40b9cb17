pub mod buffer;
pub mod clock;
pub mod state;

pub use buffer::{FrameOutcome, SampleBuffer, DEFAULT_CAPACITY, DEFAULT_SETTLE_DELAY};
pub use clock::{Clock, ManualClock, SystemClock};
pub use state::{BufferStatus, Sample, SampleSource};
