use std::path::PathBuf;

use egui::{Color32, Context, RichText, ScrollArea, Ui};

use crate::stamp::Options;
use crate::stamp::options::{HEIGHT_RANGE_MM, MAX_EDGE_RANGE_MM, SMOOTH_RADIUS_RANGE_MM};
use crate::ui::state::UiState;
use crate::ui::theme::*;

#[derive(Default)]
pub struct UiActions {
    /// One selection: files dropped in one frame, or the path field.
    pub open_files: Option<Vec<PathBuf>>,
    pub set_options: Option<Options>,
    pub export: bool,
    pub dismiss_error: bool,
}

/// Paths of files dropped onto the window this frame. `None` when nothing
/// was dropped; entries without a filesystem path are skipped.
pub fn dropped_paths(files: &[egui::DroppedFile]) -> Option<Vec<PathBuf>> {
    if files.is_empty() {
        return None;
    }
    Some(files.iter().filter_map(|f| f.path.clone()).collect())
}

pub fn draw_side_panel(ctx: &Context, state: &mut UiState) -> UiActions {
    let mut actions = UiActions {
        open_files: ctx.input(|i| dropped_paths(&i.raw.dropped_files)),
        ..Default::default()
    };
    let hovering = ctx.input(|i| !i.raw.hovered_files.is_empty());

    egui::SidePanel::right("control_panel")
        .min_width(300.0)
        .max_width(400.0)
        .default_width(320.0)
        .frame(egui::Frame::default().fill(BG_PANEL).inner_margin(16.0))
        .show(ctx, |ui| {
            ScrollArea::vertical().show(ui, |ui| {
                ui.heading(RichText::new("Stamp Maker").strong());
                ui.add_space(4.0);
                ui.label(RichText::new("Image to printable stamp").color(TEXT_MUTED).size(11.0));
                ui.add_space(16.0);

                source_section(ui, state, hovering, &mut actions);
                ui.add_space(12.0);
                ui.separator();
                ui.add_space(12.0);

                if let Some(options) = options_section(ui, state.options) {
                    state.options = options;
                    actions.set_options = Some(options);
                }
                ui.add_space(12.0);
                ui.separator();
                ui.add_space(12.0);

                export_section(ui, state, &mut actions);

                if let Some(err) = &state.last_error {
                    ui.add_space(12.0);
                    actions.dismiss_error = error_banner(ui, err);
                }

                ui.add_space(16.0);
                status_line(ui, state);
            });
        });

    actions
}

fn section_header(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).color(TEXT_MUTED).size(11.0).strong());
    ui.add_space(4.0);
}

fn source_section(ui: &mut Ui, state: &mut UiState, hovering: bool, actions: &mut UiActions) {
    section_header(ui, "SOURCE");

    let hint = if hovering {
        RichText::new("Release to open").color(ACCENT_WARM)
    } else {
        RichText::new("Drop an image onto the window").color(TEXT_MUTED).italics()
    };
    ui.label(hint);
    ui.add_space(4.0);

    ui.horizontal(|ui| {
        let field = ui.add(
            egui::TextEdit::singleline(&mut state.path_input)
                .hint_text("path/to/image.png")
                .desired_width(ui.available_width() - 64.0),
        );
        let submitted = field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        let path = state.path_input.trim();
        if (ui.add_enabled(!path.is_empty(), egui::Button::new("Open")).clicked() || submitted)
            && !path.is_empty()
        {
            actions.open_files = Some(vec![PathBuf::from(path)]);
        }
    });

    ui.add_space(4.0);
    match (&state.source_name, state.reading) {
        (_, true) => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(RichText::new("Reading…").color(TEXT_MUTED));
            });
        }
        (Some(name), false) => {
            ui.label(RichText::new(name).color(TEXT_BRIGHT));
        }
        (None, false) => {
            ui.label(RichText::new("No image loaded").color(TEXT_MUTED));
        }
    }
}

/// Returns the new value when any control changed.
fn options_section(ui: &mut Ui, current: Options) -> Option<Options> {
    section_header(ui, "OPTIONS");

    let mut invert = current.invert;
    let mut max_edge = current.max_edge_mm;
    let mut smooth = current.smooth_radius_mm;
    let mut height = current.height_mm;

    ui.checkbox(&mut invert, "Invert");

    egui::Grid::new("options").num_columns(2).spacing([12.0, 6.0]).show(ui, |ui| {
        ui.label("Max edge");
        ui.add(
            egui::DragValue::new(&mut max_edge)
                .range(MAX_EDGE_RANGE_MM.0..=MAX_EDGE_RANGE_MM.1)
                .speed(0.5)
                .suffix(" mm"),
        );
        ui.end_row();

        ui.label("Smoothing");
        ui.add(
            egui::DragValue::new(&mut smooth)
                .range(SMOOTH_RADIUS_RANGE_MM.0..=SMOOTH_RADIUS_RANGE_MM.1)
                .speed(0.05)
                .suffix(" mm"),
        );
        ui.end_row();

        ui.label("Height");
        ui.add(
            egui::DragValue::new(&mut height)
                .range(HEIGHT_RANGE_MM.0..=HEIGHT_RANGE_MM.1)
                .speed(0.1)
                .suffix(" mm"),
        );
        ui.end_row();
    });

    let next = current
        .with_invert(invert)
        .with_max_edge_mm(max_edge)
        .with_smooth_radius_mm(smooth)
        .with_height_mm(height);
    (next != current).then_some(next)
}

fn export_section(ui: &mut Ui, state: &UiState, actions: &mut UiActions) {
    section_header(ui, "EXPORT");

    let button = egui::Button::new(RichText::new("Export OBJ").color(if state.export_enabled {
        BG_DEEP
    } else {
        TEXT_MUTED
    }))
    .fill(if state.export_enabled { ACCENT_GREEN } else { BG_WIDGET })
    .min_size(egui::vec2(ui.available_width(), 32.0));

    if ui.add_enabled(state.export_enabled, button).clicked() {
        actions.export = true;
    }

    ui.add_space(4.0);
    ui.label(
        RichText::new(format!("to {}", state.export_dir.display()))
            .color(TEXT_MUTED)
            .size(11.0),
    );
    if let Some(path) = &state.last_export {
        ui.label(
            RichText::new(format!("Saved {}", path.display()))
                .color(ACCENT_GREEN)
                .size(11.0),
        );
    }
}

/// Returns `true` when dismissed.
fn error_banner(ui: &mut Ui, err: &str) -> bool {
    let mut dismissed = false;
    egui::Frame::default()
        .fill(Color32::from_rgb(40, 15, 15))
        .stroke(egui::Stroke::new(1.0, ACCENT_RED))
        .rounding(4.0)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.label(RichText::new(err).color(ACCENT_RED).size(11.0));
            if ui.small_button("Dismiss").clicked() {
                dismissed = true;
            }
        });
    dismissed
}

fn status_line(ui: &mut Ui, state: &UiState) {
    ui.style_mut().override_font_id = Some(egui::FontId::new(11.0, egui::FontFamily::Monospace));
    let text = match state.mesh_info {
        Some(info) => format!(
            "{} triangles | {:.1} x {:.1} x {:.1} mm",
            fmt_num(info.triangles),
            info.size.x,
            info.size.y,
            info.size.z
        ),
        None => "no mesh".to_string(),
    };
    ui.label(RichText::new(text).color(TEXT_MUTED));
}

pub fn draw_help_overlay(ctx: &Context, distance: f32) {
    egui::Area::new(egui::Id::new("help_overlay"))
        .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(12.0, -12.0))
        .show(ctx, |ui| {
            egui::Frame::default()
                .fill(Color32::from_black_alpha(180))
                .rounding(6.0)
                .inner_margin(10.0)
                .show(ui, |ui| {
                    ui.style_mut().override_font_id =
                        Some(egui::FontId::new(11.0, egui::FontFamily::Monospace));
                    ui.label(RichText::new("LMB+Drag - Orbit | Scroll - Zoom | H - Hide").color(TEXT_MUTED));
                    ui.label(RichText::new(format!("Distance: {distance:.1}")).color(TEXT_MUTED));
                });
        });
}

fn fmt_num(n: usize) -> String {
    if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        format!("{}", n)
    }
}
