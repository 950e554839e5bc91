//! Text front-end for headless runs.
//!
//! Prints the navigation strip and side panel whenever the shell redraws
//! them, and reports viewport placeholders and mesh counts through tracing.

use std::io::Write;

use demo_shared::{
    math::Mat4,
    render::{Background, DirectionalLight, OverlayBackend, RenderBackend, Visual},
    resources::EnvironmentMap,
    ui::{NavItem, UiFragment},
};
use tracing::{debug, info};

pub struct ConsoleView<W: Write> {
    out: W,
    meshes: usize,
    last_meshes: Option<usize>,
    placeholder: Option<String>,
    shown_placeholder: Option<String>,
    environment: Option<String>,
}

impl ConsoleView<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            meshes: 0,
            last_meshes: None,
            placeholder: None,
            shown_placeholder: None,
            environment: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_lines(&mut self, lines: &[String]) {
        for line in lines {
            // Console output is best-effort.
            let _ = writeln!(self.out, "{line}");
        }
        let _ = self.out.flush();
    }
}

impl<W: Write> RenderBackend for ConsoleView<W> {
    fn begin_frame(&mut self, _background: &Background) {
        self.meshes = 0;
        self.placeholder = None;
    }

    fn set_view_proj(&mut self, _view_proj: Mat4) {}

    fn set_environment(&mut self, env: &EnvironmentMap) {
        if self.environment.as_deref() != Some(env.preset.as_str()) {
            info!(preset = %env.preset, intensity = env.intensity, "Environment applied");
            self.environment = Some(env.preset.clone());
        }
    }

    fn draw_light(&mut self, _light: &DirectionalLight) {}

    fn draw_mesh(&mut self, _visual: &Visual, _transform: &Mat4) {
        self.meshes += 1;
    }

    fn draw_placeholder(&mut self, text: &str) {
        self.placeholder = Some(text.to_string());
    }

    fn end_frame(&mut self) {
        if self.placeholder != self.shown_placeholder {
            if let Some(text) = &self.placeholder {
                let line = format!("[viewport] {text}");
                self.write_lines(&[line]);
            }
            self.shown_placeholder = self.placeholder.clone();
        }
        if self.last_meshes != Some(self.meshes) {
            debug!(meshes = self.meshes, "Viewport mesh count changed");
            self.last_meshes = Some(self.meshes);
        }
    }
}

impl<W: Write> OverlayBackend for ConsoleView<W> {
    fn draw_nav(&mut self, links: &[NavItem]) {
        let strip: Vec<String> = links
            .iter()
            .map(|link| {
                if link.active {
                    format!("[{}]", link.label)
                } else {
                    link.label.clone()
                }
            })
            .collect();
        let line = format!("[nav] {}", strip.join(" | "));
        self.write_lines(&[line]);
    }

    fn draw_panel(&mut self, fragment: Option<&UiFragment>) {
        let mut lines = vec!["[panel]".to_string()];
        match fragment {
            Some(fragment) => lines.extend(fragment.to_lines().into_iter().map(|l| format!("  {l}"))),
            None => lines.push("  (empty)".to_string()),
        }
        self.write_lines(&lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use demo_shared::{render::Color, ui::UiNode};

    #[test]
    fn overlay_and_placeholder_are_printed() {
        let mut view = ConsoleView::new(Vec::new());
        let bg = Background {
            top: Color::BLUE,
            bottom: Color::WHITE,
        };
        view.draw_nav(&[
            NavItem {
                label: "Shapes".into(),
                path: "/".into(),
                active: true,
            },
            NavItem {
                label: "Joints".into(),
                path: "/joints".into(),
                active: false,
            },
        ]);
        view.draw_panel(Some(&UiFragment::new(UiNode::text("hello"))));
        view.begin_frame(&bg);
        view.draw_placeholder("Loading...");
        view.end_frame();
        view.begin_frame(&bg);
        view.draw_placeholder("Loading...");
        view.end_frame();

        let text = String::from_utf8(view.into_inner()).unwrap();
        assert_eq!(
            text,
            "[nav] [Shapes] | Joints\n[panel]\n  hello\n[viewport] Loading...\n"
        );
    }
}
