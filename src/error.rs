use thiserror::Error;

/// Invariant violations raised by the tree, dispatcher, focus controller and
/// scheduler. They surface to the caller of the top-level entry point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UiError {
    #[error("unknown element")]
    UnknownElement,

    #[error("an element cannot be inserted as its own child")]
    SelfParenting,

    #[error("cannot insert an ancestor into its own subtree")]
    CyclicInsert,

    #[error("child index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("element is not a child of the given parent")]
    NotAChild,

    #[error("event is already being dispatched")]
    EventAlreadyDispatching,

    #[error("scheduled item is not known to the scheduler")]
    UnknownScheduledItem,

    #[error("scheduled item is already scheduled")]
    AlreadyScheduled,

    #[error("element is not attached to the panel")]
    NotInPanel,

    #[error("the panel root cannot be detached or destroyed")]
    RootElement,

    #[error("layout engine error: {0}")]
    Layout(String),
}

pub type UiResult<T> = Result<T, UiError>;
