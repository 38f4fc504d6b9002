use egui::{Color32, ColorImage, ComboBox, Context, RichText, TextureOptions, Vec2};
use std::time::Instant;

use super::accessibility::Feature;
use super::session::Section;
use super::App;
use crate::types::ThemeState;

const GREEN: Color32 = Color32::from_rgb(0x00, 0x90, 0x39);
const YELLOW: Color32 = Color32::from_rgb(0xFD, 0xC8, 0x06);

/// Draw the main application UI
pub fn draw_ui(app: &mut App, ctx: &Context) {
    let now = Instant::now();
    app.session.poll_sync();
    apply_style(app, ctx);

    egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if ui.button("☰").on_hover_text("Menu").clicked() {
                app.nav_open = !app.nav_open;
            }
            let config = app.session.config();
            ui.heading(RichText::new(&config.municipality_name).color(GREEN))
                .on_hover_text(format!("Código IBGE {}", config.municipality_code));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let icon = app.session.theme().icon();
                if ui.button(icon.glyph()).on_hover_text("Alternar tema").clicked() {
                    app.session.toggle_theme();
                }
                if ui.button("♿").on_hover_text("Acessibilidade").clicked() {
                    app.show_accessibility = !app.show_accessibility;
                }
            });
        });
    });

    if app.nav_open {
        egui::SidePanel::left("nav_menu").show(ctx, |ui| {
            ui.heading("Seções");
            ui.separator();
            for section in Section::ALL {
                if ui.selectable_label(app.section == section, section.title()).clicked() {
                    app.select_section(section);
                }
            }
        });
    }

    if app.show_accessibility {
        let mut open = true;
        egui::Window::new("Acessibilidade")
            .open(&mut open)
            .resizable(false)
            .show(ctx, |ui| {
                for feature in Feature::ALL {
                    let mut enabled = app.session.accessibility().is_enabled(feature);
                    if ui.checkbox(&mut enabled, feature.label()).changed() {
                        app.session.toggle_feature(feature);
                        app.sync_chart_style();
                    }
                }
            });
        app.show_accessibility = open;
    }

    egui::CentralPanel::default().show(ctx, |ui| {
        draw_status(app, ui);
        ui.separator();
        egui::ScrollArea::vertical().show(ui, |ui| {
            if app.section == Section::Overview {
                draw_kpis(app, ui, now);
                ui.separator();
            }
            ui.heading(app.section.title());
            let ids: Vec<_> = app.session.charts_in(app.section).collect();
            for id in ids {
                draw_chart_card(app, ui, id, now);
            }
        });
    });

    upload_textures(app, ctx);

    if app.session.is_syncing() {
        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}

fn apply_style(app: &mut App, ctx: &Context) {
    let key = (app.session.theme().state(), *app.session.accessibility());
    if app.applied_style == Some(key) {
        return;
    }
    let mut base = egui::Style::default();
    base.visuals = match key.0 {
        ThemeState::Light => egui::Visuals::light(),
        ThemeState::Dark => egui::Visuals::dark(),
    };
    ctx.set_style(key.1.styled(&base));
    app.applied_style = Some(key);
}

fn draw_status(app: &App, ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        if app.session.is_syncing() {
            ui.spinner();
        }
        let degraded = app.session.report().map(|r| r.is_degraded()).unwrap_or(false);
        let text = RichText::new(app.session.status_line());
        ui.label(if degraded { text.color(YELLOW) } else { text });
    });
    let sources: Vec<String> = match app.session.report() {
        Some(report) => report.sources.iter().map(|s| s.describe()).collect(),
        None => app
            .session
            .last_sync()
            .map(|summary| summary.sources.clone())
            .unwrap_or_default(),
    };
    if !sources.is_empty() {
        ui.collapsing("Fontes", |ui| {
            for line in &sources {
                ui.label(line);
            }
        });
    }
}

fn draw_kpis(app: &mut App, ui: &mut egui::Ui, now: Instant) {
    let mut animating = false;
    ui.horizontal_wrapped(|ui| {
        for kpi in app.session.kpis_mut() {
            ui.group(|ui| {
                ui.vertical(|ui| {
                    ui.label(kpi.label);
                    kpi.counter.start(now);
                    let text = if kpi.counter.is_finished(now) {
                        kpi.final_text()
                    } else {
                        animating = true;
                        kpi.text_at(now)
                    };
                    ui.label(RichText::new(text).size(24.0).strong());
                });
            });
        }
    });
    if animating {
        ui.ctx().request_repaint();
    }
}

enum CardAction {
    Select(usize, usize),
    Toggle(String, bool),
}

fn draw_chart_card(app: &mut App, ui: &mut egui::Ui, id: usize, now: Instant) {
    let Some(chart) = app.session.registry().get(id) else {
        return;
    };
    let title = chart.title.clone();
    let selectors = chart.selectors().to_vec();
    let substitute = chart.showing_substitute();
    let toggles: Vec<(String, bool)> = if chart.is_toggleable() {
        chart
            .datasets()
            .iter()
            .map(|d| (d.label.clone(), chart.is_visible(&d.label)))
            .collect()
    } else {
        Vec::new()
    };
    let (w, h) = app.chart_style.size;
    let size = Vec2::new(w as f32, h as f32);
    let mut actions = Vec::new();

    ui.group(|ui| {
        ui.label(RichText::new(&title).strong());
        if !selectors.is_empty() {
            ui.horizontal(|ui| {
                for (axis, selector) in selectors.iter().enumerate() {
                    let mut chosen = selector.chosen_index();
                    ui.label(format!("{}:", selector.name));
                    ComboBox::new(("chart_selector", id, axis), "")
                        .selected_text(selector.chosen())
                        .show_ui(ui, |ui| {
                            for (idx, option) in selector.options.iter().enumerate() {
                                ui.selectable_value(&mut chosen, idx, option);
                            }
                        });
                    if chosen != selector.chosen_index() {
                        actions.push(CardAction::Select(axis, chosen));
                    }
                }
            });
            if substitute {
                ui.small("Sem dados para a seleção; exibindo o período mais recente.");
            }
        }
        if !toggles.is_empty() {
            ui.horizontal_wrapped(|ui| {
                for (label, visible) in &toggles {
                    let mut checked = *visible;
                    if ui.checkbox(&mut checked, label.as_str()).changed() {
                        actions.push(CardAction::Toggle(label.clone(), checked));
                    }
                }
            });
        }

        let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
        if ui.is_rect_visible(rect) && app.mark_visible(id, now) {
            ui.ctx().request_repaint();
        }
        match app.textures.get(&id) {
            Some(texture) if app.is_revealed(id, now) => {
                egui::Image::new((texture.id(), size)).paint_at(ui, rect);
            }
            _ if app.failed.contains(&id) => {
                ui.put(rect, egui::Label::new("Gráfico indisponível"));
            }
            _ => {
                ui.put(rect, egui::Spinner::new());
                ui.ctx().request_repaint_after(app.session.config().reveal_delay());
            }
        }
    });

    if let Some(chart) = app.session.registry_mut().get_mut(id) {
        for action in actions {
            match action {
                CardAction::Select(axis, option) => {
                    chart.select(axis, option);
                }
                CardAction::Toggle(label, visible) => {
                    chart.set_visible(&label, visible);
                }
            }
        }
    }
}

fn upload_textures(app: &mut App, ctx: &Context) {
    for (id, image) in app.render_pending() {
        let color_image = ColorImage::from_rgb([image.width as usize, image.height as usize], &image.rgb);
        match app.textures.get_mut(&id) {
            Some(texture) => texture.set(color_image, TextureOptions::LINEAR),
            None => {
                let texture = ctx.load_texture(format!("chart-{}", id), color_image, TextureOptions::LINEAR);
                app.textures.insert(id, texture);
            }
        }
    }
}
