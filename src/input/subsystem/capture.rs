//! Rebind scanning and the controller assignment wizard

use tracing::{debug, info};

use super::InputSubsystem;
use crate::input::backend::ControllerBackend;
use crate::input::types::{GameInput, InputBinding, InputDevice, InstanceId, MAX_PLAYERS};
use crate::input::wizard::{
    AssignmentHandle, AssignmentOutcome, AssignmentPrompt, AssignmentSession, CaptureMode, ScanRequest,
};
use crate::input::InputError;

/// What to tell the UI once the capture lock is released
enum WizardStep {
    Prompt(AssignmentPrompt),
    Finished {
        notifier: Option<tokio::sync::oneshot::Sender<AssignmentOutcome>>,
        all_assigned: bool,
    },
}

impl<B: ControllerBackend> InputSubsystem<B> {
    /// Capture the next input from `device` as a binding for `game_input`
    pub fn start_scanning_input(&self, device: InputDevice, game_input: GameInput) -> Result<(), InputError> {
        let mut capture = self.capture.lock();
        match &capture.mode {
            CaptureMode::Assigning(_) => return Err(InputError::CaptureBusy(capture.mode.name())),
            CaptureMode::Idle | CaptureMode::Scanning(_) => {},
        }

        capture.scanned = None;
        capture.mode = CaptureMode::Scanning(ScanRequest { device, game_input });
        debug!("Scanning {:?} input for {:?}", device, game_input);
        Ok(())
    }

    /// Stop a scan without touching the scanned value
    pub fn stop_scanning_input(&self) {
        let mut capture = self.capture.lock();
        if capture.scan_request().is_some() {
            capture.mode = CaptureMode::Idle;
        }
    }

    /// Abandon a scan; nothing is captured
    pub fn cancel_scanning_input(&self) {
        let mut capture = self.capture.lock();
        if capture.scan_request().is_some() {
            capture.mode = CaptureMode::Idle;
            capture.scanned = None;
            debug!("Input scan cancelled");
        }
    }

    pub fn is_scanning_input(&self) -> bool {
        self.capture.lock().scan_request().is_some()
    }

    /// Game input the running scan is capturing for
    pub fn scanned_game_input(&self) -> Option<GameInput> {
        self.capture.lock().scan_request().map(|r| r.game_input)
    }

    /// Take the captured binding, leaving none behind
    pub fn take_scanned_input(&self) -> Option<InputBinding> {
        self.capture.lock().scanned.take()
    }

    pub(super) fn finish_scan(&self, binding: InputBinding) {
        debug!("Scanned binding {:?}", binding);
        self.capture.lock().finish_scan(binding);
    }

    /// Start the assignment wizard for `detected_controllers` controllers
    ///
    /// With one controller or none there is nothing to assign and the
    /// returned handle already reads [`AssignmentOutcome::Completed`].
    /// Starting again while a session runs restarts it; the old session
    /// reports [`AssignmentOutcome::Cancelled`].
    pub fn begin_controller_assignment(&self, detected_controllers: usize) -> Result<AssignmentHandle, InputError> {
        if detected_controllers <= 1 {
            return Ok(AssignmentHandle::finished(AssignmentOutcome::Completed));
        }

        let (tx, handle) = AssignmentHandle::channel();
        let (prompt, replaced) = {
            let mut capture = self.capture.lock();
            if capture.scan_request().is_some() {
                return Err(InputError::CaptureBusy(capture.mode.name()));
            }

            let replaced = capture.take_session();
            let session = AssignmentSession::begin(detected_controllers, tx);
            let prompt = session.prompt();
            capture.mode = CaptureMode::Assigning(session);
            (prompt, replaced)
        };

        if let Some(notifier) = replaced.and_then(AssignmentSession::finish) {
            let _ = notifier.send(AssignmentOutcome::Cancelled);
        }

        info!("🎮 Controller assignment started for {} controllers", detected_controllers);
        self.show_assignment_prompt(&prompt);
        Ok(handle)
    }

    /// Cancel a running wizard; does nothing when none is active
    pub fn cancel_controller_assignment(&self) {
        let Some(session) = self.capture.lock().take_session() else {
            return;
        };

        info!("Controller assignment cancelled");
        self.ui.close_prompt();
        self.ui.clear_prompt_progress();
        if let Some(notifier) = session.finish() {
            let _ = notifier.send(AssignmentOutcome::Cancelled);
        }
    }

    pub fn is_controller_assignment_active(&self) -> bool {
        self.capture.lock().is_assigning()
    }

    fn show_assignment_prompt(&self, prompt: &AssignmentPrompt) {
        self.ui.open_notification(prompt.title, &prompt.message);
        let (completed, total) = prompt.progress;
        self.ui.set_prompt_progress(completed, total);
    }

    /// Route a button press to the wizard
    ///
    /// Returns false when no session is active. Presses from controllers
    /// already claimed this session, or not open, are swallowed.
    pub(super) fn try_handle_controller_assignment(&self, instance_id: InstanceId) -> bool {
        let step = {
            let mut capture = self.capture.lock();
            let CaptureMode::Assigning(session) = &mut capture.mode else {
                return false;
            };

            if session.is_claimed(instance_id) {
                return true;
            }

            let identity = {
                let registry = self.registry.lock();
                if !registry.is_open(instance_id) {
                    return true;
                }
                registry.identity(instance_id).unwrap_or_default()
            };

            let slot = session.claim(instance_id);
            self.config.set_controller_identity(slot, identity.clone());
            info!("Player {} -> controller {} ({})", slot + 1, instance_id, identity);

            // Show the new binding right away
            self.refresh_assignments();

            if !session.prompts_done() {
                WizardStep::Prompt(session.prompt())
            } else if session.auto_assign_last() {
                let open = self.registry.lock().open_ids();
                match session.pick_last(&open) {
                    Some(last_id) => {
                        let identity = self.registry.lock().identity(last_id).unwrap_or_default();
                        let slot = session.claim_last(last_id);
                        self.config.set_controller_identity(slot, identity.clone());
                        info!("Player {} -> controller {} ({}) [auto]", slot + 1, last_id, identity);
                        self.refresh_assignments();

                        let notifier = capture.take_session().and_then(AssignmentSession::finish);
                        WizardStep::Finished {
                            notifier,
                            all_assigned: true,
                        }
                    },
                    None => {
                        debug!("Last controller is ambiguous, prompting player {}", MAX_PLAYERS);
                        session.extend_to_fourth();
                        WizardStep::Prompt(session.prompt())
                    },
                }
            } else {
                let notifier = capture.take_session().and_then(AssignmentSession::finish);
                WizardStep::Finished {
                    notifier,
                    all_assigned: false,
                }
            }
        };

        match step {
            WizardStep::Prompt(prompt) => self.show_assignment_prompt(&prompt),
            WizardStep::Finished {
                notifier,
                all_assigned,
            } => {
                if all_assigned {
                    self.ui.set_prompt_progress(MAX_PLAYERS, MAX_PLAYERS);
                }
                info!("✅ Controller assignment complete");
                self.ui.close_prompt();
                self.ui.clear_prompt_progress();
                if let Some(notifier) = notifier {
                    let _ = notifier.send(AssignmentOutcome::Completed);
                }
            },
        }

        true
    }
}
