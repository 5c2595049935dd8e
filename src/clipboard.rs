//! Clipboard support (native builds only; other builds report failure)

#[cfg(feature = "native")]
use copypasta::{ClipboardContext, ClipboardProvider};

#[cfg(feature = "native")]
pub fn copy_to_clipboard(s: &str) -> bool {
    match ClipboardContext::new() {
        Ok(mut ctx) => match ctx.set_contents(s.to_string()) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("[clipboard] set failed: {e}");
                false
            }
        },
        Err(e) => {
            log::warn!("[clipboard] unavailable: {e}");
            false
        }
    }
}

#[cfg(not(feature = "native"))]
pub fn copy_to_clipboard(_s: &str) -> bool {
    false
}
