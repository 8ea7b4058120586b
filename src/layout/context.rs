//! Per-composition layout context.
//!
//! The engine's only mutable state is the color round-robin cursor. It is
//! threaded through calls explicitly — never module-level — so concurrent
//! requests each get a fresh, deterministic color cycle.

use crate::types::colors::palette_color;

/// Mutable state for one composition run.
#[derive(Debug, Default)]
pub struct LayoutContext {
    cursor: usize,
}

impl LayoutContext {
    /// A fresh context with the color cursor at the start of the palette.
    pub fn new() -> Self {
        Self::default()
    }

    /// The next palette color in the round-robin cycle.
    pub fn next_color(&mut self) -> &'static str {
        let color = palette_color(self.cursor);
        self.cursor += 1;
        color
    }

    /// Rewind the cursor to the start of the palette.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::colors::COLOR_PALETTE;

    #[test]
    fn test_round_robin_wraps_and_resets() {
        let mut ctx = LayoutContext::new();
        let first: Vec<&str> = (0..COLOR_PALETTE.len()).map(|_| ctx.next_color()).collect();
        assert_eq!(first, COLOR_PALETTE);
        assert_eq!(ctx.next_color(), COLOR_PALETTE[0]);
        ctx.reset();
        assert_eq!(ctx.next_color(), COLOR_PALETTE[0]);
    }
}
