/// What a component did with a key.
///
/// Views offer each key to their components first and only run their own
/// bindings on `NotHandled`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed, nothing for the parent to do
  Handled,
  /// Consumed, and the parent has to act on this event
  Event(T),
  NotHandled,
}
