use super::RenderError;
use crate::core::models::angles::{AngleFamily, AngleKind};
use plotters::prelude::*;
use std::path::Path;

const PLOT_SIZE: (u32, u32) = (1000, 600);

/// A residue's two angle series with detected change points.
#[derive(Debug, Clone)]
pub struct BreakpointPlot<'a> {
    pub title: String,
    pub family: AngleFamily,
    /// Frame index of every sample.
    pub frames: &'a [usize],
    pub samples: &'a [[f64; 2]],
    /// Frame indices to mark, without the closing sentinel.
    pub breakpoints: &'a [usize],
}

impl BreakpointPlot<'_> {
    /// Value range of one panel, widened to cover at least the periodic domain
    /// so panels of different residues share a scale.
    pub fn y_range(&self, dim: usize) -> (f64, f64) {
        let domain = self.family.domain();
        self.samples
            .iter()
            .map(|s| s[dim])
            .filter(|v| v.is_finite())
            .fold((domain.lo, domain.hi), |(lo, hi), v| (lo.min(v), hi.max(v)))
    }

    /// Writes an SVG with one stacked panel per angle.
    pub fn draw(&self, path: &Path) -> Result<(), RenderError> {
        let plot_err = |e: &dyn std::fmt::Display| RenderError::Plot {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let root = SVGBackend::new(path, PLOT_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(|e| plot_err(&e))?;

        let (first, second) = self.family.kinds();
        let x_max = self.frames.last().copied().unwrap_or(0).max(1) as f64;

        for (dim, (panel, kind)) in root
            .split_evenly((2, 1))
            .iter()
            .zip([first, second])
            .enumerate()
        {
            let (lo, hi) = self.y_range(dim);
            let mut chart = ChartBuilder::on(panel)
                .caption(panel_title(&self.title, kind), ("sans-serif", 16))
                .margin(10)
                .x_label_area_size(30)
                .y_label_area_size(50)
                .build_cartesian_2d(0f64..x_max, lo..hi)
                .map_err(|e| plot_err(&e))?;

            chart
                .configure_mesh()
                .disable_mesh()
                .x_desc("frame")
                .y_desc(kind.to_string())
                .draw()
                .map_err(|e| plot_err(&e))?;

            chart
                .draw_series(LineSeries::new(
                    self.frames
                        .iter()
                        .zip(self.samples)
                        .map(|(&f, s)| (f as f64, s[dim])),
                    &BLUE,
                ))
                .map_err(|e| plot_err(&e))?;

            for &b in self.breakpoints {
                chart
                    .draw_series(LineSeries::new(
                        [(b as f64, lo), (b as f64, hi)],
                        RED.stroke_width(2),
                    ))
                    .map_err(|e| plot_err(&e))?;
            }
        }

        root.present().map_err(|e| plot_err(&e))?;
        Ok(())
    }
}

fn panel_title(title: &str, kind: AngleKind) -> String {
    format!("{} {}", title, kind.symbol())
}
