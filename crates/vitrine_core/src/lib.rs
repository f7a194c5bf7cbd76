//! Vitrine Core
//!
//! Foundational primitives shared by every Vitrine crate:
//!
//! - **Layout**: node identifiers, rectangles and the [`LayoutOracle`] that
//!   answers "how wide is this" questions
//! - **Events**: pointer, scroll, wheel and resize events with a keyed dispatcher
//! - **State Machines**: table-driven lifecycles with entry actions
//! - **Errors**: the failure taxonomy every feature reports through

pub mod error;
pub mod events;
pub mod fsm;
pub mod layout;

pub use error::{Result, VitrineError};
pub use events::{Event, EventData, EventDispatcher, EventType};
pub use fsm::{EventId, StateId, StateMachine};
pub use layout::{LayoutOracle, NodeId, Rect, Viewport};
