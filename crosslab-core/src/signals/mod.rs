//! Signal generation: crossover detection, trend state, near-cross prediction.
//!
//! Everything here is a pure function of indicator frames. Nothing reads the
//! wall clock or position state; callers pass evaluation dates explicitly.

pub mod detector;
pub mod merge;
pub mod predict;
pub mod session;
pub mod trend;

pub use detector::{detect_crosses, detect_in_frames, CrossDetector, CrossParams};
pub use merge::merge_events;
pub use predict::{predict_cross, PotentialCross, PredictParams};
pub use session::{split_session, SessionSplit};
pub use trend::{classify_trend, EntrySignal, TrendState};
