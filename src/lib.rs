#![allow(dead_code)]
#![allow(non_upper_case_globals)]
pub mod arg_parse;
pub mod archetypes;
pub mod catalog;
pub mod compositor;
pub mod effects;
pub mod error;
pub mod filters;
pub mod noise;
pub mod render;
pub mod sampler;
pub mod scheduler;
pub mod song;
pub mod synth;
pub mod time;
pub mod types;
pub mod volume;

pub use error::NuanceError;
pub use song::{dry_run, process_track};
pub use types::{NuanceMap, Parameters};
