//! Transformation module.
//!
//! - Normalizer: upstream facility results to facility records
//! - Reshaper: analytics rows to report lines
//! - Pipeline: `sync` and `transfer` runs

pub mod normalizer;
pub mod pipeline;
pub mod reshaper;

pub use normalizer::{
    facility_from_org_unit, normalize_grid, FacilitySchema, FieldSource, ResolvedSchema,
};
pub use pipeline::*;
pub use reshaper::{date_stamp, Reshaped, Reshaper};
