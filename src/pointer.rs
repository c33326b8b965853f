//! Pointer injection backends
//!
//! [`EnigoPointer`] drives the real OS pointer. [`ConsolePointer`] only logs
//! what it would have done, which is handy for checking a device's output
//! without the cursor jumping around.

use enigo::{Coordinate, Direction, Enigo, Mouse, Settings};
use thiserror::Error;
use tracing::{debug, info};

use crate::buttons::{ButtonAction, MouseButton};

#[derive(Debug, Error)]
pub enum PointerError {
    #[error("failed to connect to the input injection service: {0}")]
    Connect(#[from] enigo::NewConError),

    #[error("input injection failed: {0}")]
    Input(#[from] enigo::InputError),
}

/// Sink for pointer motion and button events.
pub trait PointerSink {
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), PointerError>;
    fn click(&mut self, button: MouseButton) -> Result<(), PointerError>;
    fn press(&mut self, button: MouseButton) -> Result<(), PointerError>;
    fn release(&mut self, button: MouseButton) -> Result<(), PointerError>;

    /// Dispatch a decoded [`ButtonAction`] to the matching method.
    fn apply(&mut self, action: ButtonAction) -> Result<(), PointerError> {
        match action {
            ButtonAction::Click(b) => self.click(b),
            ButtonAction::Press(b) => self.press(b),
            ButtonAction::Release(b) => self.release(b),
        }
    }
}

/// OS pointer injection via `enigo`.
pub struct EnigoPointer {
    enigo: Enigo,
}

impl EnigoPointer {
    pub fn new() -> Result<Self, PointerError> {
        let enigo = Enigo::new(&Settings::default())?;
        info!("Pointer injection ready");
        Ok(Self { enigo })
    }

    fn button(&mut self, button: MouseButton, direction: Direction) -> Result<(), PointerError> {
        self.enigo.button(to_enigo(button), direction)?;
        Ok(())
    }
}

fn to_enigo(button: MouseButton) -> enigo::Button {
    match button {
        MouseButton::Left => enigo::Button::Left,
        MouseButton::Right => enigo::Button::Right,
    }
}

impl PointerSink for EnigoPointer {
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), PointerError> {
        self.enigo.move_mouse(dx, dy, Coordinate::Rel)?;
        Ok(())
    }

    fn click(&mut self, button: MouseButton) -> Result<(), PointerError> {
        self.button(button, Direction::Click)
    }

    fn press(&mut self, button: MouseButton) -> Result<(), PointerError> {
        self.button(button, Direction::Press)
    }

    fn release(&mut self, button: MouseButton) -> Result<(), PointerError> {
        self.button(button, Direction::Release)
    }
}

/// Logs pointer actions instead of injecting them.
#[derive(Debug, Default)]
pub struct ConsolePointer {
    action_count: u64,
}

impl ConsolePointer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action_count(&self) -> u64 {
        self.action_count
    }

    fn log(&mut self, what: std::fmt::Arguments<'_>) {
        self.action_count += 1;
        info!(
            "🖱️  [{}] {} [#{}]",
            chrono::Local::now().format("%H:%M:%S%.3f"),
            what,
            self.action_count
        );
    }
}

impl PointerSink for ConsolePointer {
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), PointerError> {
        self.log(format_args!("move ({:+}, {:+})", dx, dy));
        debug!(dx, dy, "ConsolePointer move");
        Ok(())
    }

    fn click(&mut self, button: MouseButton) -> Result<(), PointerError> {
        self.log(format_args!("click {}", button));
        Ok(())
    }

    fn press(&mut self, button: MouseButton) -> Result<(), PointerError> {
        self.log(format_args!("press {}", button));
        Ok(())
    }

    fn release(&mut self, button: MouseButton) -> Result<(), PointerError> {
        self.log(format_args!("release {}", button));
        Ok(())
    }
}
