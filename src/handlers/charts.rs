use std::io::Cursor;

use anyhow::{anyhow, Context, Result};
use plotters::prelude::*;

use crate::dialogue::ChartData;

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 500;

/// Рисует накопительный ряд с линией нормы и отдаёт PNG.
/// Ось X: минуты с первой записи.
pub fn render_chart(chart: &ChartData) -> Result<Vec<u8>> {
    if chart.points.is_empty() {
        return Err(anyhow!("chart has no points"));
    }

    let first = chart.points[0].0;
    let points: Vec<(f64, f64)> = chart
        .points
        .iter()
        .map(|&(at, value)| ((at - first).num_seconds() as f64 / 60.0, value))
        .collect();

    let x_max = points.last().map(|&(x, _)| x).unwrap_or(0.0).max(1.0);
    let y_max = points
        .iter()
        .map(|&(_, y)| y)
        .fold(chart.goal, f64::max)
        .max(1.0)
        * 1.1;
    let y_min = points.iter().map(|&(_, y)| y).fold(0.0, f64::min) * 1.1;

    let mut raw = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut raw, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| anyhow!("{}", e))?;

        let mut builder = ChartBuilder::on(&root);
        let mut ctx = builder
            .caption(&chart.title, ("sans-serif", 28))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0.0..x_max, y_min..y_max)
            .map_err(|e| anyhow!("{}", e))?;

        ctx.configure_mesh()
            .x_desc("Минуты с первой записи")
            .y_desc(chart.y_label.clone())
            .draw()
            .map_err(|e| anyhow!("{}", e))?;

        ctx.draw_series(LineSeries::new(points.iter().copied(), &BLUE))
            .map_err(|e| anyhow!("{}", e))?
            .label(chart.series_label.clone())
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], BLUE));

        ctx.draw_series(
            points
                .iter()
                .map(|&point| Circle::new(point, 3, BLUE.filled())),
        )
        .map_err(|e| anyhow!("{}", e))?;

        ctx.draw_series(LineSeries::new(
            [(0.0, chart.goal), (x_max, chart.goal)],
            &RED,
        ))
        .map_err(|e| anyhow!("{}", e))?
        .label(chart.goal_label.clone())
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], RED));

        ctx.configure_series_labels()
            .border_style(&BLACK)
            .background_style(WHITE.mix(0.85))
            .draw()
            .map_err(|e| anyhow!("{}", e))?;

        root.present().map_err(|e| anyhow!("{}", e))?;
    }

    let img = image::RgbImage::from_raw(WIDTH, HEIGHT, raw)
        .ok_or_else(|| anyhow!("pixel buffer size mismatch"))?;
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .context("PNG encoding failed")?;
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn sample_chart() -> ChartData {
        let start = Utc::now();
        ChartData {
            title: "Прогресс по воде".to_string(),
            y_label: "Выпито воды (мл)".to_string(),
            series_label: "Выпито".to_string(),
            goal: 2500.0,
            goal_label: "Норма воды".to_string(),
            points: vec![
                (start, 300.0),
                (start + Duration::minutes(90), 800.0),
                (start + Duration::minutes(200), 1400.0),
            ],
            caption: "График прогресса по воде".to_string(),
            filename: "water_progress.png".to_string(),
        }
    }

    #[test]
    fn renders_png_bytes() {
        let png = render_chart(&sample_chart()).unwrap();
        // Сигнатура PNG
        assert_eq!(&png[..8], &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn single_point_is_renderable() {
        let mut chart = sample_chart();
        chart.points.truncate(1);
        assert!(render_chart(&chart).is_ok());
    }

    #[test]
    fn empty_series_is_an_error() {
        let mut chart = sample_chart();
        chart.points.clear();
        assert!(render_chart(&chart).is_err());
    }
}
