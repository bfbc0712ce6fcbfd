//! Interactive display host built on eframe.
//!
//! Each panel keeps the images pushed by the tracker and uploads them as textures
//! on the next frame. The mouse wheel anywhere in the window is forwarded to the
//! scroll handler; closing the window ends the session.

use egui::{Color32, ColorImage, Rect, Sense, TextureHandle, TextureOptions, Vec2, pos2, vec2};
use image::RgbaImage;
use log::debug;

use crate::colormap::Colorbar;
use crate::enums::Layer;
use crate::layout::Grid;
use crate::session::SessionError;
use crate::surface::{Backend, Figure, ScrollEvent, Surface};

const TITLE_HEIGHT: f32 = 20.0;
const COLORBAR_HEIGHT: f32 = 12.0;
const COLORBAR_LABEL_HEIGHT: f32 = 20.0;

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub title: String,
    pub width: f32,
    pub height: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "volume-scroll".to_string(),
            width: 1000.0,
            height: 800.0,
        }
    }
}

#[derive(Default)]
pub struct Panel {
    layers: [Option<RgbaImage>; 2],
    textures: [Option<TextureHandle>; 2],
    dirty: [bool; 2],
    title: Option<String>,
    colorbar: Option<Colorbar>,
    colorbar_texture: Option<TextureHandle>,
    repaint: bool,
}

impl Surface for Panel {
    fn set_image(&mut self, layer: Layer, image: RgbaImage) {
        self.layers[layer.index()] = Some(image);
        self.dirty[layer.index()] = true;
    }

    fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    fn draw_colorbar(&mut self, colorbar: Colorbar) {
        self.colorbar = Some(colorbar);
        self.colorbar_texture = None;
    }

    fn request_redraw(&mut self) {
        self.repaint = true;
    }
}

fn to_color_image(image: &RgbaImage) -> ColorImage {
    let size = [image.width() as usize, image.height() as usize];
    ColorImage::from_rgba_unmultiplied(size, image.as_raw())
}

impl Panel {
    fn upload(&mut self, ctx: &egui::Context, id: usize) {
        for idx in 0..self.layers.len() {
            if !std::mem::take(&mut self.dirty[idx]) {
                continue;
            }
            let Some(image) = &self.layers[idx] else {
                continue;
            };
            let color_image = to_color_image(image);
            match &mut self.textures[idx] {
                Some(texture) => texture.set(color_image, TextureOptions::NEAREST),
                slot => {
                    *slot = Some(ctx.load_texture(
                        format!("panel_{id}_layer_{idx}"),
                        color_image,
                        TextureOptions::NEAREST,
                    ))
                }
            }
        }

        if let (Some(colorbar), None) = (&self.colorbar, &self.colorbar_texture) {
            let strip = colorbar.to_image(256, 1);
            self.colorbar_texture = Some(ctx.load_texture(
                format!("panel_{id}_colorbar"),
                to_color_image(&strip),
                TextureOptions::LINEAR,
            ));
        }
    }

    fn show(&self, ui: &mut egui::Ui, cell: Vec2) {
        ui.vertical(|ui| {
            ui.set_min_size(cell);
            ui.label(self.title.as_deref().unwrap_or_default());

            let Some(base) = &self.textures[Layer::Base.index()] else {
                return;
            };
            let [width, height] = base.size();
            let mut room = vec2(cell.x, cell.y - TITLE_HEIGHT);
            if self.colorbar.is_some() {
                room.y -= COLORBAR_HEIGHT + COLORBAR_LABEL_HEIGHT;
            }
            let scale = (room.x / width as f32).min(room.y / height as f32).max(0.0);
            let size = vec2(width as f32 * scale, height as f32 * scale);

            let (rect, _) = ui.allocate_exact_size(size, Sense::hover());
            let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
            for texture in self.textures.iter().flatten() {
                ui.painter().image(texture.id(), rect, uv, Color32::WHITE);
            }

            if let (Some(colorbar), Some(texture)) = (&self.colorbar, &self.colorbar_texture) {
                let (bar, _) = ui.allocate_exact_size(vec2(size.x, COLORBAR_HEIGHT), Sense::hover());
                ui.painter().image(texture.id(), bar, uv, Color32::WHITE);
                ui.horizontal(|ui| {
                    ui.label(format!("{:.1}", colorbar.window.min));
                    ui.label(format!("{} .. {:.1}", colorbar.colormap, colorbar.window.max));
                });
            }
        });
    }
}

pub struct EguiFigure {
    grid: Grid,
    panels: Vec<Panel>,
    caption: String,
}

impl EguiFigure {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            panels: (0..grid.panel_count()).map(|_| Panel::default()).collect(),
            caption: String::new(),
        }
    }

    fn upload(&mut self, ctx: &egui::Context) {
        for (id, panel) in self.panels.iter_mut().enumerate() {
            panel.upload(ctx, id);
        }
    }

    fn take_repaint(&mut self) -> bool {
        self.panels
            .iter_mut()
            .fold(false, |any, panel| std::mem::take(&mut panel.repaint) || any)
    }
}

impl Figure for EguiFigure {
    type Surface = Panel;

    fn grid(&self) -> Grid {
        self.grid
    }

    fn surfaces_mut(&mut self) -> &mut [Panel] {
        &mut self.panels
    }

    fn set_caption(&mut self, caption: &str) {
        self.caption = caption.to_string();
    }
}

struct ViewerApp<H> {
    figure: EguiFigure,
    handler: H,
}

impl<H> eframe::App for ViewerApp<H>
where
    H: FnMut(&ScrollEvent, &mut EguiFigure) + 'static,
{
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let delta = ctx.input(|i| i.raw_scroll_delta.y);
        if delta != 0.0 {
            (self.handler)(&ScrollEvent { delta }, &mut self.figure);
        }
        self.figure.upload(ctx);

        egui::TopBottomPanel::top("caption").show(ctx, |ui| {
            for line in self.figure.caption.lines() {
                ui.label(line);
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let grid = self.figure.grid;
            let spacing = ui.spacing().item_spacing;
            let available = ui.available_size();
            let cell = vec2(
                (available.x - spacing.x * grid.cols.saturating_sub(1) as f32) / grid.cols as f32,
                (available.y - spacing.y * grid.rows.saturating_sub(1) as f32) / grid.rows as f32,
            );
            egui::Grid::new("panels").num_columns(grid.cols).show(ui, |ui| {
                for (idx, panel) in self.figure.panels.iter().enumerate() {
                    panel.show(ui, cell);
                    if grid.position(idx).1 + 1 == grid.cols {
                        ui.end_row();
                    }
                }
            });
        });

        if self.figure.take_repaint() {
            ctx.request_repaint();
        }
    }
}

/// Native window backend.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    config: ViewerConfig,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> Self {
        Self { config }
    }
}

impl Backend for Viewer {
    type Figure = EguiFigure;

    fn create_figure(&mut self, grid: Grid) -> Result<EguiFigure, SessionError> {
        debug!("creating {}x{} panel grid", grid.rows, grid.cols);
        Ok(EguiFigure::new(grid))
    }

    fn show<H>(self, figure: EguiFigure, handler: H) -> Result<(), SessionError>
    where
        H: FnMut(&ScrollEvent, &mut EguiFigure) + 'static,
    {
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([self.config.width, self.config.height]),
            renderer: eframe::Renderer::Wgpu,
            ..Default::default()
        };

        eframe::run_native(
            &self.config.title,
            options,
            Box::new(move |_cc| Box::new(ViewerApp { figure, handler })),
        )
        .map_err(|err| SessionError::Display(err.to_string()))
    }
}
