//! Common imports for feature modules.
//!
//! ```
//! use touchline_pages::prelude::*;
//! ```

pub use crate::callback::CallbackResult;
pub use crate::delegation::{ActionOptions, EventDispatcher};
pub use crate::dom::{Document, Element, Event, EventType};
pub use crate::error::BoxError;
pub use crate::init::{InitOptions, InitRegistry};
pub use crate::instances::{InstanceCache, Modal, ModalOptions, Widget};
pub use crate::runtime::{Page, current_page};
pub use crate::settings::PagesSettings;
