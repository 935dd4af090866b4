use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use taxcomp::{ChartRenderer as _, GroupFilter, PipelineConfig};

#[derive(Parser, Debug)]
#[command(
    name = "taxcomp",
    version,
    about = "Animate tax revenue composition by country"
)]
struct Cli {
    /// JSON config file; fields it omits keep their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the cached dataset (extracting it if needed) and write the animated GIF.
    Animate(AnimateArgs),
    /// Re-read the workbook and rewrite the dataset cache.
    Extract(ExtractArgs),
    /// Render a single chart frame as a PNG.
    Frame(FrameArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeChoice {
    /// Reference-group members only.
    Reference,
    /// Countries outside the reference group.
    NonReference,
    /// Every country.
    All,
}

impl From<ModeChoice> for GroupFilter {
    fn from(mode: ModeChoice) -> Self {
        match mode {
            ModeChoice::Reference => GroupFilter::Reference,
            ModeChoice::NonReference => GroupFilter::NonReference,
            ModeChoice::All => GroupFilter::All,
        }
    }
}

#[derive(Args, Debug, Default)]
struct Overrides {
    /// Workbook to extract from.
    #[arg(long)]
    source: Option<PathBuf>,

    /// Sheet name inside the workbook.
    #[arg(long)]
    sheet: Option<String>,

    /// First year of the range.
    #[arg(long)]
    start_year: Option<i32>,

    /// Last year of the range.
    #[arg(long)]
    end_year: Option<i32>,

    /// Which countries to chart.
    #[arg(long, value_enum)]
    mode: Option<ModeChoice>,

    /// Country whose label is emphasized.
    #[arg(long, conflicts_with = "no_highlight")]
    highlight: Option<String>,

    /// Emphasize no country.
    #[arg(long, default_value_t = false)]
    no_highlight: bool,

    /// Animation output path.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Interpolation steps per year transition.
    #[arg(long)]
    sub_steps: Option<u32>,

    /// Directory holding the dataset cache.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Logo drawn in the top-right corner of every frame.
    #[arg(long, conflicts_with = "no_brand")]
    brand_image: Option<PathBuf>,

    /// Draw no logo, even when the default logo file is present.
    #[arg(long, default_value_t = false)]
    no_brand: bool,

    /// Render frames on a worker pool.
    #[arg(long, default_value_t = false)]
    parallel: bool,
}

impl Overrides {
    fn apply(self, cfg: &mut PipelineConfig) {
        if let Some(v) = self.source {
            cfg.paths.source = v;
        }
        if let Some(v) = self.sheet {
            cfg.paths.sheet = Some(v);
        }
        if let Some(v) = self.start_year {
            cfg.start_year = v;
        }
        if let Some(v) = self.end_year {
            cfg.end_year = v;
        }
        if let Some(v) = self.mode {
            cfg.group_filter = v.into();
        }
        if let Some(v) = self.highlight {
            cfg.highlight_country = Some(v);
        }
        if self.no_highlight {
            cfg.highlight_country = None;
        }
        if let Some(v) = self.output {
            cfg.paths.output = Some(v);
        }
        if let Some(v) = self.sub_steps {
            cfg.sub_steps = v;
        }
        if let Some(v) = self.cache_dir {
            cfg.paths.cache_dir = v;
        }
        if let Some(v) = self.brand_image {
            cfg.render.brand_image = Some(v);
        }
        if self.no_brand {
            cfg.render.brand_image = None;
        }
        if self.parallel {
            cfg.render.parallel = true;
        }
    }
}

#[derive(Args, Debug, Default)]
struct AnimateArgs {
    #[command(flatten)]
    overrides: Overrides,

    /// Ignore any cached dataset and extract again.
    #[arg(long, default_value_t = false)]
    refresh: bool,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    #[command(flatten)]
    overrides: Overrides,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    overrides: Overrides,

    /// Year to chart.
    #[arg(long)]
    year: i32,

    /// Blend toward the following year (0 shows `year` as-is).
    #[arg(long, default_value_t = 0.0)]
    weight: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Also write the chart description as JSON.
    #[arg(long)]
    spec_json: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let base = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => PipelineConfig::default(),
    };

    match cli.cmd.unwrap_or(Command::Animate(AnimateArgs::default())) {
        Command::Animate(args) => cmd_animate(base, args),
        Command::Extract(args) => cmd_extract(base, args),
        Command::Frame(args) => cmd_frame(base, args),
    }
}

fn configure(mut cfg: PipelineConfig, overrides: Overrides) -> anyhow::Result<PipelineConfig> {
    let no_brand = overrides.no_brand;
    overrides.apply(&mut cfg);
    if !no_brand {
        cfg = cfg.with_default_brand_in(Path::new("."));
    }
    cfg.validate().context("invalid configuration")?;
    Ok(cfg)
}

fn cmd_animate(base: PipelineConfig, args: AnimateArgs) -> anyhow::Result<()> {
    let cfg = configure(base, args.overrides)?;
    let (out, stats) = taxcomp::run_animation(&cfg, args.refresh).context("build animation")?;
    eprintln!("wrote {} ({} frames)", out.display(), stats.frames);
    Ok(())
}

fn cmd_extract(base: PipelineConfig, args: ExtractArgs) -> anyhow::Result<()> {
    let cfg = configure(base, args.overrides)?;
    let (_dataset, stats) = taxcomp::extract_to_cache(&cfg).context("extract dataset")?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    let cache = taxcomp::DatasetCache::new(&cfg.paths.cache_dir);
    eprintln!("wrote {}", cache.path_for(&cfg.paths.cache_key).display());
    Ok(())
}

fn cmd_frame(base: PipelineConfig, args: FrameArgs) -> anyhow::Result<()> {
    let cfg = configure(base, args.overrides)?;
    let (dataset, _origin) = taxcomp::load_or_extract(&cfg, false).context("load dataset")?;

    let shown = if args.weight > 0.0 {
        taxcomp::interpolate(&dataset, args.year, args.weight)?
    } else {
        dataset
    };
    let spec = taxcomp::compose_frame(
        &shown,
        args.year,
        cfg.group_filter,
        cfg.highlight_country.as_deref(),
        &cfg,
    );

    if let Some(path) = &args.spec_json {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        let f = File::create(path).with_context(|| format!("create '{}'", path.display()))?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut w, &spec)
            .with_context(|| format!("write chart spec '{}'", path.display()))?;
        w.flush()
            .with_context(|| format!("write chart spec '{}'", path.display()))?;
        eprintln!("wrote {}", path.display());
    }

    let rasterizer = taxcomp::pipeline::rasterizer_for(&cfg)?;
    let frame = rasterizer.render(&spec)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
