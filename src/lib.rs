// Coverage-triggered pixel-mask painting and erasing.
//
// A [`Zone`] wraps one RGBA image. Freehand strokes paint (or erase) the
// image on a background worker thread; once the covered share of the
// eligible area reaches the configured threshold, a one-shot callback fires.
// The render loop calls [`Zone::frame`] once per frame to pick up the
// latest pixels.

pub mod brush;
pub mod canvas;
pub mod config;
pub mod error;
pub mod mask;
pub mod present;
pub mod sampler;
pub mod source;
pub mod trigger;
pub mod types;
pub mod worker;
pub mod zone;

pub use config::{ResetMode, ZoneConfig};
pub use error::Error;
pub use mask::EligibilityPolicy;
pub use present::DisplaySurface;
pub use sampler::{PointerId, ScreenRect, UvRect};
pub use types::{BrushOperation, FrameBuffer, ZoneId};
pub use zone::Zone;
