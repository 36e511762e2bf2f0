pub const RENDER_WIDTH: i32 = 1920;             // Default window width
pub const RENDER_HEIGHT: i32 = 1080;            // Default window height
pub const FPS: u32 = 30;                        // Frames per second

pub const DISPLAY_DURATION: f32 = 11.0;         // Time each image stays up (seconds)
pub const FADE_DURATION: f32 = 1.0;             // Crossfade between two images (seconds)
pub const ERROR_FADE_DURATION: f32 = 10.0;      // One half-cycle of the dim overlay (seconds)

pub const SCAN_INTERVAL: f32 = 10.0 * 60.0;     // Directory rescan while images are present (seconds)
pub const ERROR_SCAN_INTERVAL: f32 = 60.0;      // Directory rescan while errored (seconds)
pub const ERROR_DIM_DELAY: f32 = 10.0 * 60.0;   // Error image shown this long before dimming starts (seconds)

pub const LOAD_FAILURE_THRESHOLD: u32 = 5;      // Failed loads in a row before the directory is rescanned
pub const LOAD_RETRY_DELAY: f32 = 2.0;          // Wait before trying the next image after a failed load (seconds)

pub const DECODER_CRASH_THRESHOLD: u32 = 5;     // Decoder crashes in a row before a music rescan is requested
pub const DECODER_CRASH_COOLDOWN: f32 = 2.0;    // Wait before respawning a crashed decoder (seconds)
pub const DECODER_READY_TIMEOUT: f32 = 1.0;     // Longest wait for the decoder handshake per command (seconds)
pub const DECODER_CLOSE_TIMEOUT: f32 = 2.0;     // Longest wait for the reader thread on shutdown (seconds)

pub const MAX_SECONDS: f32 = 365.0 * 24.0 * 3600.0; // Upper bound for any configured time (one year)

pub const IMAGE_DIR: &str = "/mnt/photos";
pub const ERROR_IMAGE: &str = "ErrorImage.png";
pub const DECODER_COMMAND: &[&str] = &["mpg123", "-R"];

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif"];
pub const MUSIC_EXTENSIONS: &[&str] = &["mp3", "ogg", "flac", "wav"];

// Composite SDTV output uses non-square pixels (9:8 for NTSC)
pub const SDTV_WIDTH: i32 = 720;
pub const SDTV_HEIGHT: i32 = 480;
pub const SDTV_LOGICAL_WIDTH: f32 = 640.0;
pub const SDTV_PIXEL_ASPECT: f32 = 1.125;
