use std::path::PathBuf;

use clap::Parser;
use ndarray::ArrayD;
use volume_scroll::{
    MaskOptions, ScrollOptions,
    enums::SortBy,
    normalizer::{AlphaInput, PerVolume},
    scroll, scroll_mask,
    viewer::{Viewer, ViewerConfig},
    volume_loader::VolumeLoader,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// DICOM series directories, one volume each
    #[arg(required = true, value_name = "DIR")]
    volumes: Vec<PathBuf>,

    /// Overlay the second series on the first as a mask
    #[arg(long)]
    mask: bool,

    /// Mask opacity: a fraction in [0, 1] or an integer percentage in [0, 100]
    #[arg(long, default_value = "0.15", value_parser = parse_alpha)]
    alpha: AlphaInput,

    /// Color map, once for all volumes or once per volume
    #[arg(long, value_name = "NAME")]
    cmap: Vec<String>,

    /// Axis to scroll through
    #[arg(long, default_value_t = 2)]
    scroll_dim: usize,

    /// How slices of a series are ordered
    #[arg(long, value_enum, default_value_t = SortBy::ImagePositionPatient)]
    sort_by: SortBy,
}

fn parse_alpha(raw: &str) -> Result<AlphaInput, String> {
    if let Ok(percent) = raw.parse::<i64>() {
        return Ok(AlphaInput::Int(percent));
    }
    raw.parse::<f64>()
        .map(AlphaInput::Float)
        .map_err(|err| format!("{raw} is not a number: {err}"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let volumes = cli
        .volumes
        .iter()
        .map(|dir| VolumeLoader::load_from_directory(dir, cli.sort_by).map(|v| v.into_dyn()))
        .collect::<Result<Vec<ArrayD<u16>>, _>>()?;

    let viewer = Viewer::new(ViewerConfig::default());
    if cli.mask {
        let [volume, mask]: [ArrayD<u16>; 2] = volumes
            .try_into()
            .map_err(|v: Vec<_>| format!("--mask takes two series, got {}", v.len()))?;
        let mut options = MaskOptions::default()
            .with_alpha(cli.alpha)
            .with_scroll_dim(cli.scroll_dim);
        if !cli.cmap.is_empty() {
            options = options.with_cmap(PerVolume::Each(cli.cmap));
        }
        scroll_mask(viewer, volume, mask, options)?;
    } else {
        let mut options = ScrollOptions::default().with_scroll_dim(cli.scroll_dim);
        if !cli.cmap.is_empty() {
            options = options.with_cmap(PerVolume::Each(cli.cmap));
        }
        scroll(viewer, volumes, options)?;
    }
    Ok(())
}
