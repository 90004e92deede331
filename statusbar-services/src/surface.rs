//! Rendering surface seam

use statusbar_core::StatusView;

/// Whatever displays the status line (menu bar, terminal, ...)
pub trait StatusSurface: Send + Sync {
    fn publish(&self, view: &StatusView);
}
