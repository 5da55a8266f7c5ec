use citygrid_assets::Visual;
use citygrid_common::VisualKind;
use citygrid_scene::SceneGraph;
use std::collections::BTreeMap;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the placed visuals and produces output. It never
/// mutates the scene; the reconciler owns what is placed.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene.
    fn render(&self, scene: &SceneGraph<Visual>) -> Self::Output;
}

/// Top-down text renderer.
///
/// One character per tile, rows along grid `y`: the tier digit of the
/// building standing there, `.` for bare terrain, a space where nothing is
/// placed. Useful for CLI output, logging, and testing the render interface.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

fn glyph(kind: VisualKind) -> char {
    match kind {
        VisualKind::Terrain(_) => '.',
        VisualKind::Building(tier) => char::from(b'0' + tier.level()),
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &SceneGraph<Visual>) -> String {
        // Buildings draw over terrain on the same tile.
        let mut cells = BTreeMap::new();
        for visual in scene.iter() {
            let key = (visual.coord.y, visual.coord.x);
            let cell = cells.entry(key).or_insert(visual.kind);
            if matches!(visual.kind, VisualKind::Building(_)) {
                *cell = visual.kind;
            }
        }

        let mut out = String::new();
        out.push_str(&format!("=== Scene (visuals={}) ===\n", scene.len()));

        let width = cells.keys().map(|&(_, x)| x + 1).max().unwrap_or(0);
        let height = cells.keys().map(|&(y, _)| y + 1).max().unwrap_or(0);
        for y in 0..height {
            let row: String = (0..width)
                .map(|x| cells.get(&(y, x)).map_or(' ', |k| glyph(*k)))
                .collect();
            out.push_str(row.trim_end());
            out.push('\n');
        }
        out
    }
}
