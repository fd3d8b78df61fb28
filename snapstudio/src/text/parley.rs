//! Text engine backed by parley shaping and skrifa outlines.
//!
//! Layout is done by parley; glyph outlines are extracted with skrifa and
//! filled onto the tiny-skia pixmap. The font and layout contexts are
//! expensive to build, so one pair is shared behind a mutex for the life of
//! the engine.

use parking_lot::Mutex;
use parley::layout::{GlyphRun, Layout, PositionedLayoutItem};
use parley::style::{FontStack, LineHeight, StyleProperty};
use parley::{FontContext, LayoutContext};
use peniko::Color as PenikoColor;
use skrifa::instance::{LocationRef, NormalizedCoord, Size};
use skrifa::outline::{DrawSettings, OutlinePen};
use skrifa::raw::FontRef as ReadFontsRef;
use skrifa::{GlyphId, MetadataProvider, OutlineGlyph};
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Transform};

use super::{FontSpec, TextEngine, TextSize};

/// Line height multiplier applied to every layout.
const LINE_HEIGHT: f32 = 1.2;

/// Shaping contexts shared across measure and paint calls.
struct Contexts {
    fonts: FontContext,
    layouts: LayoutContext<PenikoColor>,
}

/// Real text engine: parley layout, skrifa outlines, tiny-skia fill.
pub struct ParleyTextEngine {
    inner: Mutex<Contexts>,
}

impl ParleyTextEngine {
    /// Create an engine using the system font collection.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Contexts {
                fonts: FontContext::default(),
                layouts: LayoutContext::new(),
            }),
        }
    }

    fn layout(&self, text: &str, font: &FontSpec) -> Layout<PenikoColor> {
        let mut inner = self.inner.lock();
        let Contexts { fonts, layouts } = &mut *inner;
        let mut builder = layouts.ranged_builder(fonts, text, 1.0, true);
        builder.push_default(StyleProperty::FontStack(FontStack::Source(
            font.family.as_str().into(),
        )));
        builder.push_default(StyleProperty::FontSize(font.size));
        builder.push_default(StyleProperty::LineHeight(LineHeight::MetricsRelative(
            LINE_HEIGHT,
        )));
        builder.push_default(StyleProperty::Brush(PenikoColor::WHITE));
        let mut layout = builder.build(text);
        layout.break_all_lines(None);
        layout
    }
}

impl Default for ParleyTextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEngine for ParleyTextEngine {
    fn measure(&self, text: &str, font: &FontSpec) -> TextSize {
        let layout = self.layout(text, font);
        TextSize {
            width: layout.width(),
            height: layout.height(),
        }
    }

    fn paint(&self, pixmap: &mut Pixmap, text: &str, origin: (f32, f32), font: &FontSpec, color: Color) {
        let layout = self.layout(text, font);
        let mut pen = GlyphPen::new(pixmap, color);
        for line in layout.lines() {
            for item in line.items() {
                if let PositionedLayoutItem::GlyphRun(glyph_run) = item {
                    pen.render_run(&glyph_run, origin);
                }
            }
        }
    }
}

/// Fills glyph outlines onto a pixmap via `skrifa::OutlinePen`.
struct GlyphPen<'a> {
    pixmap: &'a mut Pixmap,
    x: f32,
    y: f32,
    paint: Paint<'static>,
    open_path: PathBuilder,
}

impl<'a> GlyphPen<'a> {
    fn new(pixmap: &'a mut Pixmap, color: Color) -> Self {
        let mut paint = Paint::default();
        paint.set_color(color);
        paint.anti_alias = true;
        Self {
            pixmap,
            x: 0.0,
            y: 0.0,
            paint,
            open_path: PathBuilder::new(),
        }
    }

    fn render_run(&mut self, glyph_run: &GlyphRun<'_, PenikoColor>, origin: (f32, f32)) {
        let mut run_x = glyph_run.offset();
        let run_y = glyph_run.baseline();
        let run = glyph_run.run();
        let font = run.font();
        let font_size = run.font_size();
        let normalized_coords: Vec<NormalizedCoord> = run
            .normalized_coords()
            .iter()
            .map(|coord| NormalizedCoord::from_bits(*coord))
            .collect();

        let Ok(font_ref) = ReadFontsRef::from_index(font.data.as_ref(), font.index) else {
            return;
        };
        let outlines = font_ref.outline_glyphs();

        for glyph in glyph_run.glyphs() {
            let glyph_x = origin.0 + run_x + glyph.x;
            let glyph_y = origin.1 + run_y - glyph.y;
            run_x += glyph.advance;

            let Some(outline) = outlines.get(GlyphId::from(glyph.id)) else {
                continue;
            };
            self.x = glyph_x;
            self.y = glyph_y;
            self.draw_glyph(&outline, font_size, &normalized_coords);
        }
    }

    fn draw_glyph(&mut self, glyph: &OutlineGlyph<'_>, size: f32, coords: &[NormalizedCoord]) {
        let settings = DrawSettings::unhinted(Size::new(size), LocationRef::new(coords));
        if glyph.draw(settings, self).is_err() {
            self.open_path.clear();
            return;
        }
        let builder = core::mem::replace(&mut self.open_path, PathBuilder::new());
        if let Some(path) = builder.finish() {
            self.pixmap.fill_path(
                &path,
                &self.paint,
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }
}

impl OutlinePen for GlyphPen<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        self.open_path.move_to(self.x + x, self.y - y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.open_path.line_to(self.x + x, self.y - y);
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.open_path
            .quad_to(self.x + cx0, self.y - cy0, self.x + x, self.y - y);
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.open_path.cubic_to(
            self.x + cx0,
            self.y - cy0,
            self.x + cx1,
            self.y - cy1,
            self.x + x,
            self.y - y,
        );
    }

    fn close(&mut self) {
        self.open_path.close();
    }
}
