use std::path::Path;

use error_stack::{Report, ResultExt};
use gdal::raster::{Buffer, GdalType};
use gdal::{Dataset, DriverManager};

use crate::error::RasterError;

const IDENTITY_TRANSFORM: [f64; 6] = [0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

/// Single-band grid held in memory, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster<T> {
    pub width: usize,
    pub height: usize,
    pub geo_transform: [f64; 6],
    pub projection: String,
    pub no_data: Option<f64>,
    pub data: Vec<T>,
}

impl<T: GdalType + Copy + Default> Raster<T> {
    /// Reads band 1 of `path`.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, Report<RasterError>> {
        let path = path.as_ref();
        let read_err = || RasterError::Read(path.display().to_string());

        let dataset = Dataset::open(path).change_context_lazy(read_err)?;
        let (width, height) = dataset.raster_size();
        let geo_transform = dataset.geo_transform().unwrap_or(IDENTITY_TRANSFORM);
        let projection = dataset.projection();

        let band = dataset.rasterband(1).change_context_lazy(read_err)?;
        let no_data = band.no_data_value();
        let buffer = band
            .read_as::<T>((0, 0), (width, height), (width, height), None)
            .change_context_lazy(read_err)?;

        log::debug!("read {} ({}x{})", path.display(), width, height);

        Ok(Self {
            width,
            height,
            geo_transform,
            projection,
            no_data,
            data: buffer.data,
        })
    }

    /// Writes a single-band GeoTIFF carrying this raster's georeferencing.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), Report<RasterError>> {
        let path = path.as_ref();
        let write_err = || RasterError::Write(path.display().to_string());

        let driver = DriverManager::get_driver_by_name("GTiff").change_context_lazy(write_err)?;
        let mut dataset = driver
            .create_with_band_type::<T, _>(path, self.width as isize, self.height as isize, 1)
            .change_context_lazy(write_err)?;

        dataset
            .set_geo_transform(&self.geo_transform)
            .change_context_lazy(write_err)?;
        if !self.projection.is_empty() {
            dataset
                .set_projection(&self.projection)
                .change_context_lazy(write_err)?;
        }

        let mut band = dataset.rasterband(1).change_context_lazy(write_err)?;
        band.set_no_data_value(self.no_data)
            .change_context_lazy(write_err)?;

        let buffer = Buffer::new((self.width, self.height), self.data.clone());
        band.write((0, 0), (self.width, self.height), &buffer)
            .change_context_lazy(write_err)?;

        log::debug!("wrote {} ({}x{})", path.display(), self.width, self.height);
        Ok(())
    }
}

impl<T> Raster<T> {
    /// Replaces the pixel values, keeping the georeferencing.
    pub fn with_data<U>(&self, data: Vec<U>, no_data: Option<f64>) -> Raster<U> {
        Raster {
            width: self.width,
            height: self.height,
            geo_transform: self.geo_transform,
            projection: self.projection.clone(),
            no_data,
            data,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn ensure_same_shape<U>(&self, other: &Raster<U>) -> Result<(), Report<RasterError>> {
        if self.width != other.width || self.height != other.height {
            return Err(Report::new(RasterError::SizeMismatch {
                expected: (self.width, self.height),
                actual: (other.width, other.height),
            }));
        }
        Ok(())
    }
}

impl Raster<f64> {
    /// Pixels equal to the declared nodata value become NaN so reductions
    /// can skip them.
    pub fn masked(mut self) -> Self {
        if let Some(nd) = self.no_data.filter(|nd| !nd.is_nan()) {
            self.data.iter_mut().filter(|v| **v == nd).for_each(|v| *v = f64::NAN);
            self.no_data = Some(f64::NAN);
        }
        self
    }

    pub fn to_f32(&self) -> Raster<f32> {
        self.with_data(self.data.iter().map(|&v| v as f32).collect(), self.no_data)
    }
}
