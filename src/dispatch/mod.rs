//! Button-to-action dispatch
//!
//! A static table of [`Binding`]s, each a [`Condition`] over the controller
//! buttons, an [`ActivationMode`] and a [`RobotAction`], is evaluated once per
//! tick by the [`ActionDispatcher`].
//!
//! ```text
//! ControllerSnapshot ──► Condition::evaluate ──► edge / level detection ──► Dispatch
//!                                                                          ├─ continuous (holds drivetrain)
//!                                                                          └─ fired (one-shot)
//! ```

pub mod binding;
pub mod condition;
pub mod dispatcher;

pub use binding::{ActivationMode, Binding, RobotAction};
pub use condition::Condition;
pub use dispatcher::{ActionDispatcher, Dispatch};
