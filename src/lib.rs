//! Shotreel assembles review edits for dailies.
//!
//! Given a list of named shots it finds the latest footage for each one across a prioritized
//! [`Location`] tree, stamps every clip with a shot mask, stands in a placeholder where
//! footage is missing and concatenates the result into one sequence. Pixel work is left to
//! an external [`MediaTool`] (ffmpeg by default); this crate only decides what to render.
//!
//! - Build an [`Edit`] from a shot list or by adding [`Clip`]s
//! - Resolve footage from a [`FootageSource`]
//! - [`Edit::conform`], [`Edit::preconvert_clips`], then [`Edit::build`] or [`Edit::fastbuild`]
#![forbid(unsafe_code)]

mod foundation;

pub mod clip;
pub mod config;
pub mod edit;
pub mod filtergraph;
pub mod footage;
pub mod location;
pub mod media;
pub mod probe;
pub mod shotlist;
pub mod tool;

pub use crate::foundation::core::{FrameSize, seconds_to_frames};
pub use crate::foundation::error::{ShotreelError, ShotreelResult};

pub use crate::clip::{Clip, ClipKind, ClipState, FindOptions};
pub use crate::config::Config;
pub use crate::edit::{ClipFailure, ConformMode, Edit, PreconvertReport, TEMP_DIR_PREFIX};
pub use crate::filtergraph::{MaskMode, MissingMediaCard, ShotMask, SlateCard};
pub use crate::footage::{FootageSource, ResolvedFootage};
pub use crate::location::{FootageMatch, Location, LocationListing, LocationSpec};
pub use crate::probe::PROBE_FAILED;
pub use crate::shotlist::{ShotEntry, load_shot_list, mask_file, save_shot_list, scan_folder};
pub use crate::tool::{FfmpegTool, MediaTool, ProbeEntry, RenderInput, RenderRequest};
