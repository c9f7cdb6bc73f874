use crate::{
    carto::globe::{Globe, View},
    config::OverlayType,
    error::Result,
    flow::{field::VectorField, interpolate::Grids},
    imaging::{raster::Raster, render::legend},
    vars::{LEGEND_LENGTH, LEGEND_THICKNESS},
};
use log::trace;
use std::path::Path;

const GRID_POINT: [u8; 4] = [255, 255, 255, 255];

/// the colour layer drawn above the map, with the bar that explains it
#[derive(Clone, Debug, PartialEq)]
pub struct Overlay {
    pub raster: Raster,
    pub legend: Option<Raster>,
}

impl Overlay {
    /// none for the overlay type blanks the layer, as while the globe moves
    pub fn draw(
        field: &VectorField,
        view: &View,
        overlay_type: Option<OverlayType>,
        grids: Option<&Grids>,
        globe: Option<&Globe>,
        show_grid_points: bool,
    ) -> Self {
        let mut raster = match overlay_type {
            Some(OverlayType::Off) | None => Raster::new(view.width, view.height),
            Some(_) => field.overlay().clone(),
        };
        if let (Some(_), Some(grids), Some(globe), true) =
            (overlay_type, grids, globe, show_grid_points)
        {
            draw_grid_points(&mut raster, grids, globe);
        }
        Self {
            raster,
            legend: grids
                .map(|grids| legend(&grids.overlay.scale, LEGEND_LENGTH, LEGEND_THICKNESS)),
        }
    }

    pub fn save(&self, image: &Path, bar: &Path) -> Result<()> {
        self.raster.save(image)?;
        if let Some(legend) = &self.legend {
            legend.save(bar)?;
        }
        Ok(())
    }
}

/// one white pixel per visible grid point holding data
fn draw_grid_points(raster: &mut Raster, grids: &Grids, globe: &Globe) {
    let projection = globe.projection.as_ref();
    let points = grids.overlay.defined_points();
    trace!("drawing {} grid points", points.len());
    for coord in points
        .into_iter()
        .filter(|coord| projection.is_visible(*coord))
    {
        let point = projection.project(coord).round();
        raster.put(point.x, point.y, GRID_POINT);
    }
}
