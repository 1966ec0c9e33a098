use pprof_flame_protocol::{FlameNode, Rect, RenderCommand, ThemeToken, ValueUnit, Viewport};

/// Narrowest frame worth drawing, in pixels.
const MIN_FRAME_WIDTH: f64 = 0.5;

/// Height needed to draw every row of `root` at `cell_height` per row.
pub fn flame_graph_height(root: &FlameNode, cell_height: f64) -> f64 {
    (root.max_depth() + 1) as f64 * cell_height
}

/// Lay out a flame graph (root row at the top) as render commands.
///
/// Each node's width is proportional to its value relative to the root.
/// Children are placed left to right in the order they appear. Frames
/// narrower than half a pixel are skipped together with their subtrees,
/// as are rows outside the viewport's vertical range.
pub fn render_flame_graph(
    root: &FlameNode,
    viewport: &Viewport,
    cell_height: f64,
    unit: ValueUnit,
) -> Vec<RenderCommand> {
    if root.value <= 0 {
        return Vec::new();
    }
    let total = root.value as f64;
    let x_scale = viewport.width / total;

    let mut commands = Vec::new();
    commands.push(RenderCommand::BeginGroup {
        id: "flame-graph".to_string(),
        label: Some(root.name.clone()),
    });

    let mut stack = vec![(root, 0usize, viewport.x)];
    while let Some((node, depth, x)) = stack.pop() {
        let w = node.value as f64 * x_scale;
        if node.value <= 0 || w < MIN_FRAME_WIDTH {
            continue;
        }
        let y = viewport.y + depth as f64 * cell_height;
        if viewport.intersects_band(y, cell_height) {
            let share = 100.0 * node.value as f64 / total;
            commands.push(RenderCommand::DrawRect {
                rect: Rect::new(x, y, w, cell_height - 1.0),
                color: ThemeToken::flame_for_depth(depth),
                border_color: Some(ThemeToken::Border),
                label: Some(node.name.clone()),
                tooltip: Some(format!(
                    "{} ({}, {share:.2}%)",
                    node.name,
                    unit.format_value(node.value as f64)
                )),
            });
        }

        let mut child_x = x;
        let mut placed = Vec::with_capacity(node.children.len());
        for child in &node.children {
            placed.push((child, depth + 1, child_x));
            child_x += child.value.max(0) as f64 * x_scale;
        }
        stack.extend(placed.into_iter().rev());
    }

    commands.push(RenderCommand::EndGroup);
    commands
}
