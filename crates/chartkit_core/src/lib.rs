//! chartkit core
//!
//! Foundational primitives for the chartkit data pipeline:
//!
//! - **Geometry**: points, sizes, rectangles and colors
//! - **Values**: the dynamically typed item every data source hands out
//! - **Notification**: synchronous observer lists replacing signal/slot fan-out
//! - **Frames**: dirty flags and a scheduler that coalesce relayouts
//!
//! # Example
//!
//! ```rust
//! use chartkit_core::{DirtyFlag, FrameScheduler, Notifier};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let changed = Notifier::<()>::new();
//! let scheduler = Rc::new(FrameScheduler::new());
//! let flag = DirtyFlag::new();
//! let relayouts = Rc::new(Cell::new(0));
//!
//! let (s, f, r) = (scheduler.clone(), flag.clone(), relayouts.clone());
//! let _sub = changed.subscribe(move |_| {
//!     let r = r.clone();
//!     s.schedule(&f, move || r.set(r.get() + 1));
//! });
//!
//! changed.emit();
//! changed.emit();
//! scheduler.run_frame();
//! assert_eq!(relayouts.get(), 1);
//! ```

pub mod error;
pub mod frame;
pub mod geometry;
pub mod notify;
pub mod value;

pub use error::ColorParseError;
pub use frame::{DirtyFlag, FrameScheduler, MAX_FRAME_PASSES};
pub use geometry::{Color, Point, Rect, Size};
pub use notify::{Notifier, ObserverId, Subscription};
pub use value::{max_of, min_of, Value, ValueKind};
