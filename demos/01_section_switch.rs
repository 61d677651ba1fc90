#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release
#![allow(rustdoc::missing_crate_level_docs)] // it's an example
#![allow(unsafe_code)]
#![allow(clippy::undocumented_unsafe_blocks)]

use eframe::{egui, egui_glow, glow};

use egui::mutex::Mutex;
use std::sync::Arc;

fn main() -> eframe::Result {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([550.0, 600.0]),
        multisampling: 4,
        renderer: eframe::Renderer::Glow,
        ..Default::default()
    };
    eframe::run_native(
        "Switching fragment sections of one program",
        options,
        Box::new(|cc| Ok(Box::new(MyApp::new(cc)))),
    )
}

struct MyApp {
    /// Behind an `Arc<Mutex<…>>` so we can pass it to [`egui::PaintCallback`] and paint later.
    drawer: Arc<Mutex<del_glow_multishader::drawer_vtx2xyrgb::Drawer>>,
    section_names: Vec<String>,
    active: String,
}

impl MyApp {
    fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let gl = cc
            .gl
            .as_ref()
            .expect("You need to run eframe with the glow backend");
        let mut drawer = del_glow_multishader::drawer_vtx2xyrgb::Drawer::new();
        drawer.compile_shader(gl).expect("failed to build the program");
        let vtx2xyrgb: [f32; 15] = [
            -0.5, -0.5, 1.0, 0.0, 0.0, 0.0, 0.5, 0.0, 1.0, 0.0, 0.5, -0.5, 0.0, 0.0, 1.0,
        ];
        drawer
            .set_vtx2xyrgb(gl, &vtx2xyrgb)
            .expect("failed to upload vertices");
        let section_names = drawer.section_names();
        let active = section_names.first().cloned().unwrap_or_default();
        Self {
            drawer: Arc::new(Mutex::new(drawer)),
            section_names,
            active,
        }
    }
}

impl eframe::App for MyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("fragment section:");
                for name in &self.section_names {
                    ui.radio_value(&mut self.active, name.clone(), name.as_str());
                }
                // selecting a name the program does not have draws nothing
                ui.radio_value(&mut self.active, "missing".to_string(), "missing");
            });
            egui::Frame::canvas(ui.style()).show(ui, |ui| {
                self.custom_painting(ui);
            });
        });
    }

    fn on_exit(&mut self, gl: Option<&glow::Context>) {
        if let Some(gl) = gl {
            self.drawer.lock().destroy(gl);
        }
    }
}

impl MyApp {
    fn custom_painting(&mut self, ui: &mut egui::Ui) {
        let (rect, _response) =
            ui.allocate_exact_size(egui::Vec2::splat(500.0), egui::Sense::hover());
        // Clone locals so we can move them into the paint callback:
        let drawer = self.drawer.clone();
        let active = self.active.clone();
        let callback = egui::PaintCallback {
            rect,
            callback: std::sync::Arc::new(egui_glow::CallbackFn::new(move |_info, painter| {
                let mut drawer = drawer.lock();
                drawer.set_section(painter.gl(), &active);
                drawer.paint(painter.gl());
            })),
        };
        ui.painter().add(callback);
    }
}
