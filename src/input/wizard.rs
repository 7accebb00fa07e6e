//! Exclusive input capture: rebind scanning and the controller assignment wizard
//!
//! Only one capture can run at a time. [`CaptureMode`] holds whichever is
//! active, so a rebind scan and an assignment session can never overlap.
//!
//! The wizard asks each player in turn to press a button and stores the
//! identity of the controller that answered as that slot's preference. With
//! exactly four controllers the last one is assigned without a prompt when it
//! is the only one left.

use std::collections::HashSet;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use super::types::{GameInput, InputBinding, InputDevice, InstanceId, MAX_PLAYERS};

/// Title of the assignment prompt
pub const ASSIGNMENT_PROMPT_TITLE: &str = "Assign Controllers";

/// Result of an assignment session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOutcome {
    InProgress,
    Completed,
    Cancelled,
}

/// Caller-side view of an assignment session
///
/// Poll with [`try_outcome`](Self::try_outcome) from a game loop or
/// `.wait().await` from async code.
#[derive(Debug)]
pub struct AssignmentHandle {
    rx: Option<oneshot::Receiver<AssignmentOutcome>>,
    resolved: Option<AssignmentOutcome>,
}

impl AssignmentHandle {
    pub(crate) fn channel() -> (oneshot::Sender<AssignmentOutcome>, Self) {
        let (tx, rx) = oneshot::channel();
        (
            tx,
            Self {
                rx: Some(rx),
                resolved: None,
            },
        )
    }

    /// Handle for a session that finished without running
    pub(crate) fn finished(outcome: AssignmentOutcome) -> Self {
        Self {
            rx: None,
            resolved: Some(outcome),
        }
    }

    /// Current outcome without blocking
    pub fn try_outcome(&mut self) -> AssignmentOutcome {
        if let Some(outcome) = self.resolved {
            return outcome;
        }

        let Some(rx) = self.rx.as_mut() else {
            return AssignmentOutcome::Cancelled;
        };

        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return AssignmentOutcome::InProgress,
            // Session dropped without reporting (subsystem shut down)
            Err(TryRecvError::Closed) => AssignmentOutcome::Cancelled,
        };
        self.resolved = Some(outcome);
        self.rx = None;
        outcome
    }

    /// Wait for the session to finish
    pub async fn wait(mut self) -> AssignmentOutcome {
        if let Some(outcome) = self.resolved {
            return outcome;
        }
        match self.rx.take() {
            Some(rx) => rx.await.unwrap_or(AssignmentOutcome::Cancelled),
            None => AssignmentOutcome::Cancelled,
        }
    }
}

/// Prompt the UI should show for the current player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentPrompt {
    pub title: &'static str,
    pub message: String,
    /// Lit icons and total icons
    pub progress: (usize, usize),
}

/// State of one wizard run
#[derive(Debug)]
pub struct AssignmentSession {
    next_player: usize,
    total_players: usize,
    prompt_count: usize,
    auto_assign_last: bool,
    claimed: HashSet<InstanceId>,
    notifier: Option<oneshot::Sender<AssignmentOutcome>>,
}

impl AssignmentSession {
    /// Start a session for `detected_controllers` controllers (at least two)
    pub fn begin(detected_controllers: usize, notifier: oneshot::Sender<AssignmentOutcome>) -> Self {
        let total_players = detected_controllers.min(MAX_PLAYERS);
        let auto_assign_last = detected_controllers == MAX_PLAYERS;
        let prompt_count = if auto_assign_last {
            MAX_PLAYERS - 1
        } else {
            total_players
        };

        Self {
            next_player: 0,
            total_players,
            prompt_count,
            auto_assign_last,
            claimed: HashSet::new(),
            notifier: Some(notifier),
        }
    }

    pub fn next_player(&self) -> usize {
        self.next_player
    }

    pub fn total_players(&self) -> usize {
        self.total_players
    }

    pub fn prompt_count(&self) -> usize {
        self.prompt_count
    }

    pub fn auto_assign_last(&self) -> bool {
        self.auto_assign_last
    }

    pub fn is_claimed(&self, instance_id: InstanceId) -> bool {
        self.claimed.contains(&instance_id)
    }

    /// Claim a controller for the player being prompted
    ///
    /// Returns the slot it was bound to.
    pub fn claim(&mut self, instance_id: InstanceId) -> usize {
        let slot = self.next_player;
        self.claimed.insert(instance_id);
        self.next_player += 1;
        slot
    }

    pub fn prompts_done(&self) -> bool {
        self.next_player >= self.prompt_count
    }

    /// The single unclaimed controller among `open`, if exactly one is left
    pub fn pick_last(&self, open: &[InstanceId]) -> Option<InstanceId> {
        let mut remaining = open.iter().filter(|id| !self.claimed.contains(*id));
        let first = remaining.next().copied()?;
        match remaining.next() {
            Some(_) => None,
            None => Some(first),
        }
    }

    /// Bind the final controller to the last slot without prompting
    pub fn claim_last(&mut self, instance_id: InstanceId) -> usize {
        self.claimed.insert(instance_id);
        self.next_player = MAX_PLAYERS;
        MAX_PLAYERS - 1
    }

    /// Give up on auto-assigning and prompt the fourth player explicitly
    pub fn extend_to_fourth(&mut self) {
        self.auto_assign_last = false;
        self.prompt_count = MAX_PLAYERS;
    }

    pub fn prompt(&self) -> AssignmentPrompt {
        let player = self.next_player + 1;
        AssignmentPrompt {
            title: ASSIGNMENT_PROMPT_TITLE,
            message: format!(
                "Player {}: Press any button on the controller you want to use.\n\n\
                 Press Esc to skip and keep the current ordering.",
                player
            ),
            progress: (player, self.total_players),
        }
    }

    /// End the session and hand back its notifier
    pub fn finish(mut self) -> Option<oneshot::Sender<AssignmentOutcome>> {
        self.claimed.clear();
        self.notifier.take()
    }
}

/// Which binding a rebind scan is capturing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRequest {
    pub device: InputDevice,
    pub game_input: GameInput,
}

/// The exclusive capture currently running
#[derive(Debug, Default)]
pub enum CaptureMode {
    #[default]
    Idle,
    Scanning(ScanRequest),
    Assigning(AssignmentSession),
}

impl CaptureMode {
    pub fn name(&self) -> &'static str {
        match self {
            CaptureMode::Idle => "idle",
            CaptureMode::Scanning(_) => "rebind scan",
            CaptureMode::Assigning(_) => "controller assignment",
        }
    }
}

/// Capture mode plus the last binding captured by a rebind scan
#[derive(Debug, Default)]
pub struct CaptureState {
    pub mode: CaptureMode,
    pub scanned: Option<InputBinding>,
}

impl CaptureState {
    pub fn scan_request(&self) -> Option<ScanRequest> {
        match &self.mode {
            CaptureMode::Scanning(request) => Some(*request),
            _ => None,
        }
    }

    pub fn is_assigning(&self) -> bool {
        matches!(self.mode, CaptureMode::Assigning(_))
    }

    /// Record a scanned binding and leave scan mode
    pub fn finish_scan(&mut self, binding: InputBinding) {
        self.mode = CaptureMode::Idle;
        self.scanned = Some(binding);
    }

    /// Take the session out, leaving the capture idle
    pub fn take_session(&mut self) -> Option<AssignmentSession> {
        match std::mem::take(&mut self.mode) {
            CaptureMode::Assigning(session) => Some(session),
            other => {
                self.mode = other;
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(count: usize) -> (AssignmentSession, AssignmentHandle) {
        let (tx, handle) = AssignmentHandle::channel();
        (AssignmentSession::begin(count, tx), handle)
    }

    #[test]
    fn test_two_players_prompt_both() {
        let (session, _) = session(2);
        assert_eq!(session.total_players(), 2);
        assert_eq!(session.prompt_count(), 2);
        assert!(!session.auto_assign_last());
    }

    #[test]
    fn test_four_players_prompt_three() {
        let (session, _) = session(4);
        assert_eq!(session.total_players(), 4);
        assert_eq!(session.prompt_count(), 3);
        assert!(session.auto_assign_last());
    }

    #[test]
    fn test_more_than_four_is_clamped() {
        let (session, _) = session(6);
        assert_eq!(session.total_players(), 4);
        assert_eq!(session.prompt_count(), 4);
        assert!(!session.auto_assign_last());
    }

    #[test]
    fn test_claims_advance_players() {
        let (mut session, _) = session(2);
        assert_eq!(session.claim(5), 0);
        assert!(session.is_claimed(5));
        assert!(!session.prompts_done());
        assert_eq!(session.claim(6), 1);
        assert!(session.prompts_done());
    }

    #[test]
    fn test_pick_last_requires_exactly_one() {
        let (mut session, _) = session(4);
        session.claim(1);
        session.claim(2);
        session.claim(3);

        assert_eq!(session.pick_last(&[1, 2, 3, 4]), Some(4));
        assert_eq!(session.pick_last(&[1, 2, 3, 4, 5]), None);
        assert_eq!(session.pick_last(&[1, 2, 3]), None);
    }

    #[test]
    fn test_extend_to_fourth() {
        let (mut session, _) = session(4);
        for id in 1..=3 {
            session.claim(id);
        }
        assert!(session.prompts_done());

        session.extend_to_fourth();
        assert!(!session.prompts_done());
        assert!(!session.auto_assign_last());
        assert_eq!(session.prompt().progress, (4, 4));
    }

    #[test]
    fn test_prompt_text() {
        let (mut session, _) = session(3);
        session.claim(9);
        let prompt = session.prompt();
        assert_eq!(prompt.title, "Assign Controllers");
        assert!(prompt.message.starts_with("Player 2: Press any button"));
        assert!(prompt.message.ends_with("keep the current ordering."));
        assert_eq!(prompt.progress, (2, 3));
    }

    #[test]
    fn test_handle_reports_outcome() {
        let (session, mut handle) = session(2);
        assert_eq!(handle.try_outcome(), AssignmentOutcome::InProgress);

        if let Some(tx) = session.finish() {
            let _ = tx.send(AssignmentOutcome::Completed);
        }
        assert_eq!(handle.try_outcome(), AssignmentOutcome::Completed);
        assert_eq!(handle.try_outcome(), AssignmentOutcome::Completed);
    }

    #[test]
    fn test_dropped_session_reads_cancelled() {
        let (session, mut handle) = session(2);
        drop(session);
        assert_eq!(handle.try_outcome(), AssignmentOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_wait_for_outcome() {
        let (session, handle) = session(3);
        let waiter = tokio::spawn(handle.wait());

        if let Some(tx) = session.finish() {
            let _ = tx.send(AssignmentOutcome::Cancelled);
        }
        assert_eq!(waiter.await.unwrap(), AssignmentOutcome::Cancelled);
    }

    #[test]
    fn test_take_session_leaves_scan_alone() {
        let mut state = CaptureState {
            mode: CaptureMode::Scanning(ScanRequest {
                device: InputDevice::Keyboard,
                game_input: GameInput::A,
            }),
            scanned: None,
        };
        assert!(state.take_session().is_none());
        assert!(state.scan_request().is_some());

        let (session, _) = session(2);
        state.mode = CaptureMode::Assigning(session);
        assert!(state.take_session().is_some());
        assert!(matches!(state.mode, CaptureMode::Idle));
    }
}
