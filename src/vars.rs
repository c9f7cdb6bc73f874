/* # scheduling */

pub const MAX_TASK_TIME: u64 = 100; // millis before a sweep yields control
pub const MIN_SLEEP_TIME: u64 = 25; // millis a yielded sweep waits before resuming
pub const FRAME_RATE: u64 = 40; // desired millis per animation frame

/* # gestures */

pub const MIN_MOVE: f64 = 4.0; // slack in pixels before a drag operation begins
pub const MOVE_END_WAIT: u64 = 1000; // millis to wait before a move is considered done
pub const SCALE_EXTENT: (f64, f64) = (25.0, 3000.0);

/* # interpolation */

pub const OVERLAY_ALPHA: u8 = 102; // floor(0.4 * 255)
pub const DISTORTION_STEP: f64 = 0.0000360; // degrees, roughly four meters of latitude
pub const PARALLEL_CHUNK: usize = 16; // column pairs per rayon chunk

/* # particles */

pub const INTENSITY_SCALE_STEP: usize = 10;
pub const MAX_PARTICLE_AGE: u32 = 100; // frames a particle is drawn before regeneration
pub const PARTICLE_MULTIPLIER: f64 = 7.0;
pub const PARTICLE_REDUCTION: f64 = 0.75; // share of particles kept on constrained devices
pub const RANDOMIZE_ATTEMPTS: usize = 30;
pub const FADE_ALPHA: f64 = 0.97;

/* # overlay */

pub const LEGEND_LENGTH: usize = 256;
pub const LEGEND_THICKNESS: usize = 8;

/* # reporting */

pub const PROGRESS_GLYPHS: usize = 22;
