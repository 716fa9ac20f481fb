//! Suggestion overlay visibility
//!
//! The overlay is a surface that a render host shows on top of the input.
//! Opening may be requested before the host has handed over a surface; that
//! intent is remembered as [`OverlayStatus::Opening`] and fulfilled on the
//! next [`OverlayState::initialize`].
//!
//! | from      | `open()`                 | `close()`        | `initialize()`              |
//! |-----------|--------------------------|------------------|-----------------------------|
//! | `Closed`  | `Open` (surface) / `Opening` | no-op        | attach                      |
//! | `Opening` | no-op, pending           | no-op            | attach → `Closed` → `open()` |
//! | `Open`    | no-op                    | `Closed`         | swap surface, stay `Open`   |
//!
//! When suppressed, `open`, `close` and `toggle` never change anything.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

/// Where the overlay currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayStatus {
    #[default]
    Closed,
    /// Open was requested before a surface was attached
    Opening,
    Open,
}

/// Result of [`OverlayState::open`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenResult {
    /// The surface is in the host
    Shown,
    /// No surface yet; the overlay opens once one is attached
    Pending,
    /// The overlay is disabled by configuration
    Suppressed,
}

impl OpenResult {
    #[must_use]
    pub const fn is_shown(self) -> bool {
        matches!(self, Self::Shown)
    }
}

/// Opaque handle to the render surface; never inspected by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// The visual host the overlay surface is inserted into
pub trait OverlayHost: Send + Sync {
    fn insert(&self, surface: SurfaceId);
    fn remove(&self, surface: SurfaceId);
}

struct Attachment {
    host: Arc<dyn OverlayHost>,
    surface: SurfaceId,
}

/// Overlay open/close state machine
pub struct OverlayState {
    status: OverlayStatus,
    attachment: Option<Attachment>,
    suppressed: bool,
}

impl OverlayState {
    /// Create a closed overlay; `suppressed` turns every transition into a no-op
    #[must_use]
    pub const fn new(suppressed: bool) -> Self {
        Self {
            status: OverlayStatus::Closed,
            attachment: None,
            suppressed,
        }
    }

    #[must_use]
    pub const fn status(&self) -> OverlayStatus {
        self.status
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.status, OverlayStatus::Open)
    }

    #[must_use]
    pub const fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    /// Attach the render surface, completing a pending open
    pub fn initialize(&mut self, host: Arc<dyn OverlayHost>, surface: SurfaceId) -> OverlayStatus {
        let reopen = !matches!(self.status, OverlayStatus::Closed);
        if self.status == OverlayStatus::Open {
            if let Some(previous) = self.attachment.take() {
                previous.host.remove(previous.surface);
            }
        }
        self.attachment = Some(Attachment { host, surface });
        if reopen {
            self.status = OverlayStatus::Closed;
            self.open();
        }
        debug!(?surface, status = ?self.status, "overlay surface attached");
        self.status
    }

    /// Show the overlay, or remember the intent if no surface is attached
    pub fn open(&mut self) -> OpenResult {
        if self.suppressed {
            return OpenResult::Suppressed;
        }
        match self.status {
            OverlayStatus::Open => OpenResult::Shown,
            OverlayStatus::Opening => OpenResult::Pending,
            OverlayStatus::Closed => match &self.attachment {
                Some(attachment) => {
                    attachment.host.insert(attachment.surface);
                    self.status = OverlayStatus::Open;
                    debug!("overlay opened");
                    OpenResult::Shown
                }
                None => {
                    self.status = OverlayStatus::Opening;
                    debug!("overlay open deferred until a surface is attached");
                    OpenResult::Pending
                }
            },
        }
    }

    /// Hide the overlay; only effective while `Open`
    ///
    /// Returns whether the surface was removed.
    pub fn close(&mut self) -> bool {
        if self.suppressed || self.status != OverlayStatus::Open {
            return false;
        }
        if let Some(attachment) = &self.attachment {
            attachment.host.remove(attachment.surface);
        }
        self.status = OverlayStatus::Closed;
        debug!("overlay closed");
        true
    }

    /// `close()` unless `Closed`, otherwise `open()`
    pub fn toggle(&mut self) -> OverlayStatus {
        if self.status == OverlayStatus::Closed {
            self.open();
        } else {
            self.close();
        }
        self.status
    }

    /// Drop the surface; an open overlay falls back to `Opening`
    pub fn detach(&mut self) -> OverlayStatus {
        if let Some(attachment) = self.attachment.take() {
            if self.status == OverlayStatus::Open {
                attachment.host.remove(attachment.surface);
                self.status = OverlayStatus::Opening;
            }
            debug!(surface = ?attachment.surface, status = ?self.status, "overlay surface detached");
        }
        self.status
    }

    /// Remove the surface from the host and forget it
    pub(crate) fn teardown(&mut self) {
        if let Some(attachment) = self.attachment.take() {
            if self.status == OverlayStatus::Open {
                attachment.host.remove(attachment.surface);
            }
        }
        self.status = OverlayStatus::Closed;
    }
}

impl Default for OverlayState {
    fn default() -> Self {
        Self::new(false)
    }
}

impl fmt::Debug for OverlayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayState")
            .field("status", &self.status)
            .field("surface", &self.attachment.as_ref().map(|a| a.surface))
            .field("suppressed", &self.suppressed)
            .finish()
    }
}
