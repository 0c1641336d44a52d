use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use brushwork::brush::{Brush, BrushParams};
use brushwork::config::{load_engine_config, EngineConfig};
use brushwork::geometry::{Argb, Point};
use brushwork::gesture::GestureEvent;
use brushwork::palette::{generate_palette, Palette, PaletteJob, PaletteType};
use brushwork::surface::ImageSurface;
use brushwork::tools::{ShapeType, ToolKind, Toolbox};
use brushwork::EngineResult;
use rand::rngs::StdRng;
use rand::SeedableRng;

const USAGE: &str = "usage:
  brushwork generate <#rrggbb> <palette-type> [count]
  brushwork extract <image> [count]
  brushwork demo <out.png>";

fn main() -> Result<()> {
    brushwork::logging::init();
    let config = load_engine_config();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let args = args.iter().map(String::as_str).collect::<Vec<_>>();

    match args.as_slice() {
        ["generate", base, kind, rest @ ..] => {
            let count = parse_count(rest, config.default_palette_count)?;
            let palette = generate(base, kind, count)
                .with_context(|| format!("failed to generate a {kind} palette from {base}"))?;
            print_palette(&palette)
        }
        ["extract", path, rest @ ..] => {
            let count = parse_count(rest, config.default_palette_count)?;
            let palette = extract(Path::new(path), count, config.kmeans_sample_budget)
                .with_context(|| format!("failed to extract a palette from {path}"))?;
            print_palette(&palette)
        }
        ["demo", out] => {
            let out = PathBuf::from(out);
            render_demo(&config, &out)
                .with_context(|| format!("failed to write {}", out.display()))
        }
        _ => bail!("{USAGE}"),
    }
}

fn generate(base: &str, kind: &str, count: usize) -> EngineResult<Palette> {
    let base = base.parse::<Argb>()?;
    let palette_type = kind.parse::<PaletteType>()?;
    let mut rng = StdRng::from_entropy();
    Ok(generate_palette(base, palette_type, count, &mut rng)?)
}

fn extract(path: &Path, count: usize, sample_budget: usize) -> EngineResult<Palette> {
    let image = image::open(path)?.to_rgba8();
    Ok(PaletteJob::spawn_extract(image, count, sample_budget).wait()?)
}

fn parse_count(rest: &[&str], default: usize) -> Result<usize> {
    match rest {
        [] => Ok(default),
        [count] => count
            .parse()
            .with_context(|| format!("invalid color count {count}")),
        _ => bail!("{USAGE}"),
    }
}

fn print_palette(palette: &Palette) -> Result<()> {
    let json = serde_json::to_string_pretty(palette).context("failed to serialize palette")?;
    println!("{json}");
    Ok(())
}

/// Paints a stroke, a shape, a curve and a fill through the toolbox, then
/// writes the canvas as PNG.
fn render_demo(config: &EngineConfig, out: &Path) -> EngineResult<()> {
    let mut canvas = ImageSurface::filled(320, 240, Argb::WHITE);
    let mut preview = ImageSurface::new(320, 240);
    let mut rng = StdRng::seed_from_u64(7);
    let mut toolbox = Toolbox::from_config(config);
    let mut clock = 0_u64;
    let mut event = |x: f32, y: f32| {
        clock += 16;
        GestureEvent::at(Point::new(x, y), clock)
    };

    toolbox.update_params(BrushParams::new(Argb::from_rgb(30, 60, 160), 6.0));
    toolbox.pointer_down(&mut canvas, &event(20.0, 200.0));
    for step in 1..=20 {
        let t = step as f32 / 20.0;
        toolbox.pointer_move(&mut preview, &event(20.0 + 120.0 * t, 200.0 - 60.0 * t * t));
    }
    toolbox.pointer_up(&mut canvas, &mut preview, &event(140.0, 140.0), &mut rng);

    toolbox.set_active(ToolKind::Shape);
    toolbox.shape_tool_mut().set_shape(ShapeType::Rectangle);
    toolbox.update_params(BrushParams::new(Argb::from_rgb(200, 40, 40), 4.0));
    toolbox.pointer_down(&mut canvas, &event(180.0, 30.0));
    toolbox.pointer_move(&mut preview, &event(250.0, 80.0));
    toolbox.pointer_move(&mut preview, &event(290.0, 110.0));
    toolbox.pointer_up(&mut canvas, &mut preview, &event(290.0, 110.0), &mut rng);

    toolbox.set_active(ToolKind::Fill);
    toolbox.update_params(BrushParams::new(Argb::from_rgb(250, 210, 60), 4.0));
    toolbox.pointer_down(&mut canvas, &event(235.0, 70.0));
    toolbox.pointer_up(&mut canvas, &mut preview, &event(235.0, 70.0), &mut rng);

    toolbox.set_active(ToolKind::Curve);
    toolbox.set_brush(Brush::marker());
    toolbox.update_params(BrushParams::new(Argb::from_rgb(20, 140, 80), 5.0));
    for (x, y) in [(40.0, 40.0), (150.0, 60.0)] {
        toolbox.pointer_down(&mut canvas, &event(x, y));
        toolbox.pointer_up(&mut canvas, &mut preview, &event(x, y), &mut rng);
    }

    canvas.save_png(out)?;
    tracing::info!(path = %out.display(), "demo canvas written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use brushwork::palette::PaletteError;
    use brushwork::EngineError;

    use super::*;

    #[test]
    fn generate_reports_bad_input_through_engine_errors() {
        let palette = generate("#FF3366", "split-complementary", 3).expect("palette");
        assert_eq!(palette.colors.len(), 3);

        assert!(matches!(
            generate("FF3366", "triadic", 3),
            Err(EngineError::Color(_))
        ));
        assert!(matches!(
            generate("#FF3366", "rainbow", 3),
            Err(EngineError::Palette(PaletteError::UnknownType(_)))
        ));
        assert!(matches!(
            generate("#FF3366", "triadic", 0),
            Err(EngineError::Palette(PaletteError::InvalidCount))
        ));
    }

    #[test]
    fn extract_reports_unreadable_images_as_image_errors() {
        let missing = std::env::temp_dir().join("brushwork-missing-image.png");
        assert!(matches!(
            extract(&missing, 3, 100),
            Err(EngineError::Image(_))
        ));
    }

    #[test]
    fn parse_count_falls_back_to_the_configured_default() {
        assert_eq!(parse_count(&[], 5).expect("default"), 5);
        assert_eq!(parse_count(&["8"], 5).expect("parsed"), 8);
        assert!(parse_count(&["eight"], 5).is_err());
    }
}
