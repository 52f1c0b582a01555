//! Output layout and job archive for reelweave.
//!
//! Every job owns one directory under the output root:
//!
//! ```text
//! output/
//! └── 6f1c.../
//!     ├── job.json          (job snapshot)
//!     ├── scenes/
//!     │   ├── 000_image.png
//!     │   ├── 000_audio.mp3
//!     │   ├── 001_image.png
//!     │   └── 001_audio.mp3
//!     └── final.mp4
//! ```
//!
//! Asset paths are unique per (job, scene, asset kind), so concurrent scene
//! tasks never write to the same file.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod filesystem;
mod layout;

pub use filesystem::{FileSystemJobRepository, video_bytes};
pub use layout::AssetLayout;
