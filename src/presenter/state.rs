/// Crossfade state of the presenter. Error mode is tracked separately and
/// only suppresses time-based switching.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum TransitionState {
    Idle,      // One slide fully opaque, nothing animating
    Switching, // Outgoing slide fading out while the incoming one fades in
}
