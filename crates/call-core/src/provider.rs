//! Contract between callkeeper and the telephony provider

use crate::replay::StateStream;
use crate::state::CallState;

/// A source of call state and sink of call commands
///
/// Commands are fire-and-forget: their effect becomes visible only through
/// later snapshots on the state stream. Implementations usually publish
/// through a [`ReplayState`](crate::ReplayState).
pub trait CallSessionProvider: Send + Sync {
    /// Subscribe to the state stream, starting with the current snapshot
    fn subscribe(&self) -> StateStream;

    /// The current snapshot
    fn current_state(&self) -> CallState;

    /// Place an outgoing call to `handle`
    fn start_call(&self, handle: &str);

    /// Accept the ringing incoming call
    fn answer_call(&self);

    /// Decline the ringing incoming call
    fn reject_call(&self);

    /// Hang up
    fn end_call(&self);

    /// Mute or unmute the microphone
    fn toggle_mute(&self, muted: bool);

    /// Route audio to the loudspeaker or back to the earpiece
    fn toggle_speaker(&self, enabled: bool);

    /// Free provider resources once the call is over
    fn release(&self);
}
