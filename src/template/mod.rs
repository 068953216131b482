//! Template storage, normalization plans and template bootstrapping.

use crate::image::{ImageView, Raster};
use crate::util::AerofidResult;

mod bootstrap;
mod plan;

pub use bootstrap::{proxy_templates_from_points, template_from_point};
pub use plan::TemplatePlan;

/// Owned template image in contiguous grayscale format.
#[derive(Clone, Debug)]
pub struct Template {
    img: Raster,
}

impl Template {
    /// Creates a template from a contiguous grayscale buffer.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> AerofidResult<Self> {
        let img = Raster::new("template", data, width, height)?;
        Ok(Self { img })
    }

    /// Wraps an already loaded raster.
    pub fn from_raster(img: Raster) -> Self {
        Self { img }
    }

    /// Returns a borrowed view of the template data.
    pub fn view(&self) -> ImageView<'_, u8> {
        self.img.view()
    }

    pub fn width(&self) -> usize {
        self.img.width()
    }

    pub fn height(&self) -> usize {
        self.img.height()
    }

    /// Precomputes the zero-mean statistics used by the ZNCC kernels.
    pub fn plan(&self) -> AerofidResult<TemplatePlan> {
        TemplatePlan::from_view(self.view())
    }
}
