use crate::asset::AssetRef;

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum CarouselState {
    Uninitialized, // Waiting for the asset list
    Ready,         // Rotating; the timer may or may not be running
    Disposed,      // Torn down, every entry point is inert
}

/// Visual side of a transition, stepped by `Carousel::update`.
#[derive(Debug, PartialEq, Clone)]
pub enum FadePhase {
    Idle,
    FadingOut {
        sequence: u64,
        target: AssetRef,
        from: f32,
        elapsed: f32,
    },
    Settling { elapsed: f32 }, // Swapped (or skipped), fully transparent
    FadingIn { elapsed: f32 },
}
