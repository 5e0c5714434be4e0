use anyhow::Context;
use clap::{Parser, ValueEnum};
use slicemesh::mask_loader::StructurePoints;
use slicemesh::mesh::CornerOrder;
use slicemesh::reconstruction::reconstruct_enabled;
use slicemesh::settings::Settings;
use slicemesh::structures::{EnabledStructures, StructureCatalog};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CornerOrderArg {
    Binary,
    Cyclic,
}

impl From<CornerOrderArg> for CornerOrder {
    fn from(arg: CornerOrderArg) -> Self {
        match arg {
            CornerOrderArg::Binary => CornerOrder::Binary,
            CornerOrderArg::Cyclic => CornerOrder::Cyclic,
        }
    }
}

/// Reconstruct a colored surface mesh from stacked segmentation masks
#[derive(Debug, Parser)]
#[command(name = "slicemesh", version)]
struct Cli {
    /// JSON settings file; missing file means defaults
    #[arg(long, default_value = "slicemesh.json")]
    settings: PathBuf,

    /// Directory holding `<structure>_frame_<n>.png` masks
    #[arg(long)]
    masks: Option<PathBuf>,

    /// Number of frames per structure
    #[arg(long)]
    frames: Option<u32>,

    /// Iso level for surface extraction
    #[arg(long)]
    iso: Option<f32>,

    /// Smoothing passes before extraction
    #[arg(long)]
    smooth: Option<u32>,

    #[arg(long, value_enum)]
    corner_order: Option<CornerOrderArg>,

    /// Structures to leave out (repeatable)
    #[arg(long)]
    disable: Vec<String>,

    /// Reconstruct only these structures (repeatable)
    #[arg(long, conflicts_with = "disable")]
    only: Vec<String>,

    /// Print the structure menu and exit
    #[arg(long)]
    list: bool,

    /// Print the effective settings as JSON and exit
    #[arg(long)]
    dump_settings: bool,
}

impl Cli {
    fn effective_settings(&self) -> anyhow::Result<Settings> {
        let mut settings = Settings::load(&self.settings)
            .with_context(|| format!("loading {}", self.settings.display()))?;

        if let Some(root) = &self.masks {
            settings.masks.root = root.clone();
        }
        if let Some(frames) = self.frames {
            settings.masks.frame_count = frames;
        }
        if let Some(iso) = self.iso {
            settings.reconstruction.iso_level = iso;
        }
        if let Some(smooth) = self.smooth {
            settings.reconstruction.smoothing_iterations = smooth;
        }
        if let Some(order) = self.corner_order {
            settings.reconstruction.corner_order = order.into();
        }
        settings.reconstruction.validate()?;
        Ok(settings)
    }

    fn enabled(&self, catalog: &StructureCatalog) -> anyhow::Result<EnabledStructures> {
        if !self.only.is_empty() {
            return Ok(EnabledStructures::enable_only(catalog, &self.only)?);
        }
        let mut enabled = catalog.all_enabled();
        enabled.disable_named(catalog, &self.disable)?;
        Ok(enabled)
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let settings = cli.effective_settings()?;
    let catalog = StructureCatalog::anatomical();
    let enabled = cli.enabled(&catalog)?;

    if cli.dump_settings {
        println!("{}", settings.to_json()?);
        return Ok(());
    }
    if cli.list {
        print!("{}", enabled.status_report(&catalog));
        return Ok(());
    }

    info!("Reading masks from {}", settings.masks.root.display());
    let cache = StructurePoints::load(&settings.masks, &catalog);
    info!("{} points across {} structures", cache.total_points(), catalog.len());

    let mesh = reconstruct_enabled(&cache, &enabled, &settings.reconstruction);

    match mesh.bounds() {
        Some(bounds) => info!(
            "Mesh ready: {} vertices ({} bytes), {} triangles, bounds {:?} .. {:?}, center {:?}",
            mesh.vertex_count(),
            mesh.vertex_bytes().len(),
            mesh.triangle_count(),
            bounds.min,
            bounds.max,
            bounds.center()
        ),
        None => info!("Mesh is empty; no enabled structure produced a surface"),
    }

    Ok(())
}
