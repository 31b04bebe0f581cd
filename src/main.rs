use std::path::PathBuf;

use clap::Parser;
use gtk::{glib, prelude::*};
use log::error;
use materialviewer::{MaterialViewer, ViewerConfig};

const APP_ID: &str = "io.github.materialviewer.MaterialViewer";

/// Preview and tweak shader materials on a rotating mesh.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// TOML file with viewer settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Vertex shader to load at start-up, overrides the config file
    #[arg(long, requires = "fragment")]
    vertex: Option<PathBuf>,

    /// Fragment shader to load at start-up, overrides the config file
    #[arg(long, requires = "vertex")]
    fragment: Option<PathBuf>,
}

impl Args {
    fn viewer_config(&self) -> Result<ViewerConfig, materialviewer::ConfigError> {
        let mut config = match &self.config {
            Some(path) => ViewerConfig::load(path)?,
            None => ViewerConfig::default(),
        };
        if let (Some(vertex), Some(fragment)) = (&self.vertex, &self.fragment) {
            config.vertex_shader = Some(vertex.clone());
            config.fragment_shader = Some(fragment.clone());
        }
        Ok(config)
    }
}

fn main() -> glib::ExitCode {
    let args = Args::parse();
    materialviewer::init();

    let config = match args.viewer_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return glib::ExitCode::FAILURE;
        }
    };

    let app = gtk::Application::builder().application_id(APP_ID).build();
    app.connect_activate(move |app| {
        let viewer = MaterialViewer::new(config.clone());
        let window = gtk::ApplicationWindow::builder()
            .application(app)
            .title("Material Viewer")
            .default_width(1280)
            .default_height(720)
            .child(&viewer)
            .build();
        window.present();
    });

    // arguments were consumed by clap
    app.run_with_args::<&str>(&[])
}
