pub const WINDOW_WIDTH: i32 = 960;              // Initial width of the host window
pub const WINDOW_HEIGHT: i32 = 540;             // Initial height of the host window
pub const FPS: u32 = 60;                        // Frames per second

pub const MAX_CANDIDATE_INDEX: u32 = 20;        // Candidates are probed for 1..=MAX_CANDIDATE_INDEX
pub const MAX_INDEX_LIMIT: u32 = 1000;          // Highest accepted max_index
pub const CANDIDATE_EXTENSIONS: &[&str] = &["jpg", "png", "jpeg"]; // Probed in this order
pub const BASE_PATH: &str = "archives";         // Prefix of every constructed candidate
pub const FALLBACK_ASSET: &str = "archives/1.jpg";

pub const INTERVAL_MS: u64 = 5000;              // Auto-advance period
pub const FADE_MS: u64 = 200;                   // Fade-out and fade-in duration, each
pub const SETTLE_DELAY: f32 = 0.06;             // Pause between swap and fade-in (seconds)
pub const PROBE_TIMEOUT_MS: u64 = 3000;         // A probe still pending after this is absent
pub const DECODED_CACHE_LIMIT: usize = 4;       // Decoded images held for the renderer
