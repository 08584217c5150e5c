//! Domain types for CrossLab

pub mod bar;
pub mod direction;
pub mod event;
pub mod instrument;
pub mod position;
pub mod trade;

pub use bar::{normalize_bars, Bar};
pub use direction::{Direction, PositionSide};
pub use event::CrossEvent;
pub use instrument::{InstrumentError, InstrumentSpec, InstrumentTable};
pub use position::Position;
pub use trade::{ExitReason, TradeRecord};

/// Symbol type alias
pub type Symbol = String;
