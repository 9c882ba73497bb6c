//! Transform stage: operations that take a [`FrameSequence`] and return a
//! new one.
//!
//! Per-frame operations go through [`FrameSequence::map_frames`], so they
//! run on the rayon pool when the `parallel` feature is on. Operations that
//! reorder or retime frames work on the whole ordered sequence.
//!
//! [`FrameSequence`]: crate::FrameSequence
//! [`FrameSequence::map_frames`]: crate::FrameSequence::map_frames

mod color;
mod compose;
mod overlay;
mod timing;

pub use color::grayscale;
pub use compose::{combine, first_frame};
pub use overlay::{caption, caption_band, watermark, watermark_box};
pub use timing::{bounce, reverse, speed};
