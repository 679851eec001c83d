//! UI Backend - session controller core
//!
//! Everything with state or invariants lives here; hosts only implement
//! `UiSurface` and forward `Command`s.
//!
//! ## Architecture
//!
//! - **ModeController**: entry point; owns the active mode and redraws on switch
//! - **SharedState**: one explicit session state shared by the components
//! - **RequestDispatcher**: single-flight backend calls with a scoped guard
//! - **MessageRenderer**: message to display fragment
//! - **NotificationCenter** / **ConfirmationGate**: side-channel UI
//! - **AppEvent**: optional event channel for hosts

mod commands;
mod confirmation;
mod controller;
mod conversation;
mod dispatcher;
mod errors;
mod events;
mod menu;
mod notifications;
mod renderer;
mod state;
mod traits;
mod types;
mod uploads;

pub use commands::Command;
pub use confirmation::ConfirmationGate;
pub use controller::ModeController;
pub use conversation::MessageStore;
pub use dispatcher::{DispatchObserver, DispatchOutcome, NoopObserver, RequestDispatcher};
pub use errors::{ValidationError, ValidationKind};
pub use events::AppEvent;
pub use menu::MenuSubscription;
pub use notifications::{NotificationCenter, Toast, ToastPhase};
pub use renderer::{format_text, Fragment, Inline, MessageRenderer, SourceReference};
pub use state::{PendingConfirmation, SharedState};
pub use traits::{ClipboardSink, UiSurface};
pub use types::{
    format_size, now_timestamp, ChatMode, FileCandidate, MenuKind, Message, RequestPhase, Sender,
    Severity, StagedFile, StagedFileId,
};
pub use uploads::{StageReport, UploadStager};
