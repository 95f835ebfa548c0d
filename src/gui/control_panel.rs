//! Control Panel Widget
//! Left side panel with the data source, resolution settings and filters.

use crate::data::ResolutionPolicy;
use crate::pipeline::FilterSelection;
use egui::{Color32, ComboBox, RichText, ScrollArea};
use std::path::PathBuf;

/// Metric menu source chosen in the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogMode {
    #[default]
    Fixed,
    Auto,
}

/// User settings for the analysis
#[derive(Default, Clone)]
pub struct UserSettings {
    pub csv_path: Option<PathBuf>,
    pub policy: ResolutionPolicy,
    pub catalog_mode: CatalogMode,
    pub year: String,
    pub metric: String,
}

/// Left side control panel with file selection and filter controls.
pub struct ControlPanel {
    pub settings: UserSettings,
    pub columns: Vec<String>,
    pub years: Vec<String>,
    pub states: Vec<String>,
    pub selected_states: Vec<bool>,
    pub metrics: Vec<String>,
    pub status: String,
    pub export_enabled: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            settings: UserSettings::default(),
            columns: Vec::new(),
            years: Vec::new(),
            states: Vec::new(),
            selected_states: Vec::new(),
            metrics: Vec::new(),
            status: "Upload a CSV file to start".to_string(),
            export_enabled: false,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything derived from the previous file
    pub fn reset_filters(&mut self) {
        self.years.clear();
        self.states.clear();
        self.selected_states.clear();
        self.metrics.clear();
        self.settings.year.clear();
        self.settings.metric.clear();
        self.export_enabled = false;
    }

    /// Update the normalized column list shown after a load
    pub fn update_columns(&mut self, columns: Vec<String>) {
        self.columns = columns;
    }

    /// Replace filter choices with a fresh selection
    pub fn apply_selection(
        &mut self,
        years: Vec<String>,
        states: Vec<String>,
        metrics: Vec<String>,
        selection: &FilterSelection,
    ) {
        self.years = years;
        self.metrics = metrics;
        self.settings.year = selection.year.clone();
        self.settings.metric = selection.metric.clone();
        self.update_states(states, &selection.states);
    }

    /// Replace state choices, checking the ones in `selected`
    pub fn update_states(&mut self, states: Vec<String>, selected: &[String]) {
        self.selected_states = states.iter().map(|s| selected.contains(s)).collect();
        self.states = states;
    }

    pub fn get_selected_states(&self) -> Vec<String> {
        self.states
            .iter()
            .zip(self.selected_states.iter())
            .filter(|(_, &selected)| selected)
            .map(|(state, _)| state.clone())
            .collect()
    }

    /// Current selection as pipeline input
    pub fn selection(&self) -> FilterSelection {
        FilterSelection {
            year: self.settings.year.clone(),
            states: self.get_selected_states(),
            metric: self.settings.metric.clone(),
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("📊 Judiciary Expenses")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("State courts comparison")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== CSV File Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .settings
                        .csv_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    ui.label(RichText::new(&path_text).size(12.0).color(
                        if self.settings.csv_path.is_some() {
                            Color32::WHITE
                        } else {
                            Color32::GRAY
                        },
                    ));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Browse").clicked() {
                            action = ControlPanelAction::BrowseCsv;
                        }
                    });
                });
            });

        if !self.columns.is_empty() {
            ui.add_space(5.0);
            ui.collapsing(format!("Columns found ({})", self.columns.len()), |ui| {
                for col in &self.columns {
                    ui.label(RichText::new(col).size(11.0).monospace());
                }
            });
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Resolution Section =====
        ui.label(RichText::new("⚙️ Column Resolution").size(14.0).strong());
        ui.add_space(5.0);

        ui.horizontal(|ui| {
            let before = self.settings.policy;
            ui.radio_value(&mut self.settings.policy, ResolutionPolicy::Exact, "Exact");
            ui.radio_value(
                &mut self.settings.policy,
                ResolutionPolicy::FuzzySubstring,
                "Fuzzy",
            );
            if self.settings.policy != before {
                action = ControlPanelAction::PolicyChanged;
            }
        });

        ui.add_space(5.0);
        ui.horizontal(|ui| {
            let before = self.settings.catalog_mode;
            ui.radio_value(&mut self.settings.catalog_mode, CatalogMode::Fixed, "Fixed metrics");
            ui.radio_value(&mut self.settings.catalog_mode, CatalogMode::Auto, "All numeric");
            if self.settings.catalog_mode != before {
                action = ControlPanelAction::CatalogChanged;
            }
        });

        ui.add_space(5.0);
        ui.horizontal(|ui| {
            if ui.small_button("Load config…").clicked() {
                action = ControlPanelAction::LoadConfig;
            }
            if ui.small_button("Save config…").clicked() {
                action = ControlPanelAction::SaveConfig;
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Filter Section =====
        ui.label(RichText::new("🔧 Filters").size(14.0).strong());
        ui.add_space(8.0);

        let label_width = 70.0;
        let combo_width = 200.0;

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Year:"));
            ComboBox::from_id_salt("year")
                .width(combo_width)
                .selected_text(&self.settings.year)
                .show_ui(ui, |ui| {
                    for year in &self.years {
                        if ui
                            .selectable_label(self.settings.year == *year, year)
                            .clicked()
                            && self.settings.year != *year
                        {
                            self.settings.year = year.clone();
                            action = ControlPanelAction::YearChanged;
                        }
                    }
                });
        });

        ui.add_space(5.0);

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Metric:"));
            ComboBox::from_id_salt("metric")
                .width(combo_width)
                .selected_text(&self.settings.metric)
                .show_ui(ui, |ui| {
                    for metric in &self.metrics {
                        if ui
                            .selectable_label(self.settings.metric == *metric, metric)
                            .clicked()
                            && self.settings.metric != *metric
                        {
                            self.settings.metric = metric.clone();
                            action = ControlPanelAction::SelectionChanged;
                        }
                    }
                });
        });

        ui.add_space(10.0);
        ui.label("States:");
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(5.0)
            .show(ui, |ui| {
                ScrollArea::vertical().max_height(160.0).show(ui, |ui| {
                    for (i, state) in self.states.iter().enumerate() {
                        if i < self.selected_states.len()
                            && ui.checkbox(&mut self.selected_states[i], state).changed()
                        {
                            action = ControlPanelAction::SelectionChanged;
                        }
                    }
                });
            });

        ui.add_space(5.0);
        ui.horizontal(|ui| {
            if ui.small_button("Select All").clicked() {
                self.selected_states.iter_mut().for_each(|v| *v = true);
                action = ControlPanelAction::SelectionChanged;
            }
            if ui.small_button("Clear All").clicked() {
                self.selected_states.iter_mut().for_each(|v| *v = false);
                action = ControlPanelAction::SelectionChanged;
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Export Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.export_enabled, |ui| {
                let png_button = egui::Button::new(RichText::new("🖼 Export PNG").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(png_button).clicked() {
                    action = ControlPanelAction::ExportPng;
                }

                ui.add_space(5.0);

                let csv_button = egui::Button::new(RichText::new("📄 Export table").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(csv_button).clicked() {
                    action = ControlPanelAction::ExportTable;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status Section =====
        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.starts_with("Loaded") || self.status.starts_with("Exported") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    PolicyChanged,
    CatalogChanged,
    LoadConfig,
    SaveConfig,
    YearChanged,
    SelectionChanged,
    ExportPng,
    ExportTable,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn selection_reflects_checked_states() {
        let mut panel = ControlPanel::new();
        let selection = FilterSelection {
            year: "2022".into(),
            states: strings(&["AM", "BA"]),
            metric: "m".into(),
        };
        panel.apply_selection(
            strings(&["2021", "2022"]),
            strings(&["AM", "BA", "SP"]),
            strings(&["m"]),
            &selection,
        );
        assert_eq!(panel.selection(), selection);

        panel.selected_states[2] = true;
        assert_eq!(panel.get_selected_states(), strings(&["AM", "BA", "SP"]));
    }

    #[test]
    fn reset_clears_filters() {
        let mut panel = ControlPanel::new();
        panel.update_states(strings(&["SP"]), &strings(&["SP"]));
        panel.export_enabled = true;
        panel.reset_filters();
        assert!(panel.get_selected_states().is_empty());
        assert!(!panel.export_enabled);
    }
}
