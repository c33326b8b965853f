//! Read → decode → inject loop
//!
//! [`Bridge`] owns everything the loop touches: the line source, the pointer
//! sink and the button state. Nothing lives in globals, so the whole path can
//! be driven from tests with fake collaborators.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, trace, warn};

use crate::buttons::{ButtonAction, ButtonState, TriggerPolicy};
use crate::config::PointerConfig;
use crate::motion::{scale_delta, MotionRounding};
use crate::pointer::PointerSink;
use crate::protocol::{decode_line, FrameError};
use crate::transport::{LineSource, TransportError};

/// Per-run settings, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BridgeSettings {
    pub scale: f64,
    pub rounding: MotionRounding,
    pub trigger: TriggerPolicy,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self::from(&PointerConfig::default())
    }
}

impl From<&PointerConfig> for BridgeSettings {
    fn from(config: &PointerConfig) -> Self {
        Self {
            scale: config.scale,
            rounding: config.rounding,
            trigger: config.trigger,
        }
    }
}

/// What happened to a single input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Line was dropped; button state untouched
    Skipped(FrameError),
    /// Line decoded into a frame
    Frame {
        motion: Option<(i32, i32)>,
        actions: Vec<ButtonAction>,
    },
}

/// Counters reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub frames: u64,
    pub skipped: u64,
    pub motions: u64,
    pub button_actions: u64,
    pub injection_errors: u64,
}

pub struct Bridge<S, P> {
    source: S,
    pointer: P,
    buttons: ButtonState,
    settings: BridgeSettings,
    stats: BridgeStats,
}

impl<S: LineSource, P: PointerSink> Bridge<S, P> {
    pub fn new(source: S, pointer: P, settings: BridgeSettings) -> Self {
        Self {
            source,
            pointer,
            buttons: ButtonState::new(),
            settings,
            stats: BridgeStats::default(),
        }
    }

    /// Decode one line and forward the result to the pointer sink.
    pub fn process_line(&mut self, line: &str) -> LineOutcome {
        let frame = match decode_line(line) {
            Ok(frame) => frame,
            Err(e) => {
                if e != FrameError::Empty {
                    self.stats.skipped += 1;
                    debug!("Skipping line {:?}: {}", line.trim_end(), e);
                }
                return LineOutcome::Skipped(e);
            }
        };

        trace!(?frame, "Decoded frame");
        self.stats.frames += 1;

        let motion = scale_delta(frame.dx, frame.dy, self.settings.scale, self.settings.rounding);
        if let Some((dx, dy)) = motion {
            self.stats.motions += 1;
            if let Err(e) = self.pointer.move_relative(dx, dy) {
                self.stats.injection_errors += 1;
                warn!("Failed to move pointer by ({}, {}): {}", dx, dy, e);
            }
        }

        let actions = self
            .buttons
            .update(frame.left, frame.right, self.settings.trigger);
        self.dispatch(&actions);

        LineOutcome::Frame { motion, actions }
    }

    /// Wait for the next line and process it.
    ///
    /// Returns `Ok(None)` when the read timed out with no data.
    pub fn poll_once(&mut self) -> Result<Option<LineOutcome>, TransportError> {
        match self.source.next_line()? {
            Some(line) => Ok(Some(self.process_line(&line))),
            None => Ok(None),
        }
    }

    /// Run until `shutdown` is set or the transport fails.
    ///
    /// `shutdown` is checked between reads, so the read timeout bounds how
    /// long a stop request can take. Buttons held under `PressHold` are
    /// released on the way out.
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<BridgeStats, TransportError> {
        info!(
            "Bridge running (trigger: {:?}, scale: {}, rounding: {:?})",
            self.settings.trigger, self.settings.scale, self.settings.rounding
        );

        let result = loop {
            if shutdown.load(Ordering::Relaxed) {
                debug!("Shutdown requested, leaving bridge loop");
                break Ok(());
            }
            if let Err(e) = self.poll_once() {
                break Err(e);
            }
        };

        self.release_held();
        result.map(|()| self.stats)
    }

    /// Release any button still held down.
    pub fn release_held(&mut self) {
        let actions = self.buttons.release_all(self.settings.trigger);
        if !actions.is_empty() {
            debug!("Releasing held buttons: {:?}", actions);
        }
        self.dispatch(&actions);
    }

    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    pub fn buttons(&self) -> &ButtonState {
        &self.buttons
    }

    pub fn pointer(&self) -> &P {
        &self.pointer
    }

    pub fn into_parts(self) -> (S, P) {
        (self.source, self.pointer)
    }

    fn dispatch(&mut self, actions: &[ButtonAction]) {
        for &action in actions {
            self.stats.button_actions += 1;
            if let Err(e) = self.pointer.apply(action) {
                self.stats.injection_errors += 1;
                warn!("Failed to inject {:?}: {}", action, e);
            }
        }
    }
}
