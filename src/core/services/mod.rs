pub mod mass_edition;
pub mod schedule_session;

pub use mass_edition::{apply, FieldOverride, MassEditionSession, MassEditionSpec};
pub use schedule_session::{ScheduleBuffer, ScheduleEditingSession};

/// Lifecycle of an editing session buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Clean,
    Dirty,
}

#[cfg(test)]
mod tests;
