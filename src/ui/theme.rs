use egui::{Color32, FontFamily, FontId, Rounding, Stroke, TextStyle, Visuals};

pub const BG_DEEP: Color32 = Color32::from_rgb(10, 10, 12);
pub const BG_PANEL: Color32 = Color32::from_rgb(18, 18, 21);
pub const BG_WIDGET: Color32 = Color32::from_rgb(30, 30, 35);
pub const BG_WIDGET_HOVER: Color32 = Color32::from_rgb(42, 42, 50);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(190, 190, 194);
pub const TEXT_MUTED: Color32 = Color32::from_rgb(112, 112, 118);
pub const TEXT_BRIGHT: Color32 = Color32::from_rgb(232, 232, 236);

/// Matches the warm key light of the preview.
pub const ACCENT_WARM: Color32 = Color32::from_rgb(255, 191, 128);
/// Matches the cool fill light.
pub const ACCENT_COOL: Color32 = Color32::from_rgb(128, 128, 255);
pub const ACCENT_GREEN: Color32 = Color32::from_rgb(70, 172, 90);
pub const ACCENT_RED: Color32 = Color32::from_rgb(196, 60, 60);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgb(48, 48, 58);

pub fn apply_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    let mut visuals = Visuals::dark();
    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = BG_PANEL;
    visuals.window_fill = BG_PANEL;
    visuals.extreme_bg_color = BG_DEEP;
    visuals.faint_bg_color = BG_PANEL;
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.window_rounding = Rounding::same(6.0);
    visuals.hyperlink_color = ACCENT_COOL;
    visuals.warn_fg_color = ACCENT_WARM;
    visuals.error_fg_color = ACCENT_RED;
    visuals.selection.bg_fill = ACCENT_WARM.gamma_multiply(0.35);
    visuals.selection.stroke = Stroke::new(1.0, ACCENT_WARM);

    let widgets = &mut visuals.widgets;
    for w in [
        &mut widgets.noninteractive,
        &mut widgets.inactive,
        &mut widgets.hovered,
        &mut widgets.active,
        &mut widgets.open,
    ] {
        w.rounding = Rounding::same(4.0);
    }
    widgets.inactive.bg_fill = BG_WIDGET;
    widgets.inactive.weak_bg_fill = BG_WIDGET;
    widgets.inactive.bg_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    widgets.hovered.bg_fill = BG_WIDGET_HOVER;
    widgets.hovered.weak_bg_fill = BG_WIDGET_HOVER;
    widgets.hovered.bg_stroke = Stroke::new(1.0, ACCENT_WARM);
    widgets.hovered.fg_stroke = Stroke::new(1.0, TEXT_BRIGHT);
    widgets.active.bg_stroke = Stroke::new(2.0, ACCENT_WARM);
    widgets.active.fg_stroke = Stroke::new(1.0, TEXT_BRIGHT);

    style.visuals = visuals;

    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);

    style.text_styles = [
        (TextStyle::Small, FontId::new(11.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Button, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Heading, FontId::new(18.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(12.0, FontFamily::Monospace)),
    ]
    .into();

    ctx.set_style(style);
}
