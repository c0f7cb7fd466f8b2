pub mod analysis;
pub mod assessment;
pub mod boundary;
pub mod cleanup;
pub mod config;
pub mod dem;
pub mod diagnostics;
pub mod error;
pub mod narrative;
pub mod raster;
pub mod risk;
pub mod server;
pub mod soil;
pub mod statistics;
pub mod support;
pub mod terrain;
pub mod utils;
pub mod whiteboxtools_wrappers;
