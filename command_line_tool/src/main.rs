use clap::{Args, Parser, Subcommand};
use daisymatch::daisy_grid::DEFAULT_DESCRIPTOR_LENGTH;
use daisymatch::descriptor_compare::{compare_at, DEFAULT_REFERENCE_SCALE};
use daisymatch::match_result::OffsetAxis;
use daisymatch::petal_coverage::{coverage_map, CropWindow, PetalSelection, RatioSweep};
use daisymatch::search_window::{DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};
use daisymatch::{
    BlockMatcher, DaisyError, DescriptorField, FieldDimensions, SearchWindow, WindowAlignment,
};
use log::*;
use std::error::Error;
use std::path::PathBuf;

/// Command line arguments structure.
#[derive(Parser, Debug)]
#[command(author, version, about = "CLI for DAISY descriptor matching and inspection.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Block-match the descriptors of two images and write offset and distance maps
    Match(MatchArgs),

    /// Print the descriptor of one pixel from a candidate and a reference file
    Compare(CompareArgs),

    /// Print how many petals of a ring land inside a crop for every canvas pixel
    Coverage(CoverageArgs),

    /// Print the paired petal ratio for a sweep of centred crop sizes as CSV
    Ratios(RatioArgs),
}

#[derive(Args, Debug)]
struct MatchArgs {
    /// Descriptor file of the first image
    descriptors1: PathBuf,

    /// Descriptor file of the second image
    descriptors2: PathBuf,

    /// Prefix of the output files (<prefix>MatchYOffset.bin, ...)
    prefix: String,

    /// Image height in pixels
    #[arg(allow_negative_numbers = true)]
    height: i64,

    /// Image width in pixels
    #[arg(allow_negative_numbers = true)]
    width: i64,

    /// Rows searched around each pixel
    #[arg(allow_negative_numbers = true, default_value_t = DEFAULT_WINDOW_HEIGHT as i64)]
    window_height: i64,

    /// Columns searched around each pixel
    #[arg(allow_negative_numbers = true, default_value_t = DEFAULT_WINDOW_WIDTH as i64)]
    window_width: i64,

    /// Number of floats per descriptor
    #[arg(long, default_value_t = DEFAULT_DESCRIPTOR_LENGTH as i64)]
    descriptor_length: i64,

    /// Centre the window exactly on the pixel. Output differs from the historical layout.
    #[arg(long)]
    centered_window: bool,

    /// Do not spread rows over worker threads
    #[arg(long)]
    sequential: bool,

    /// Also write PNG previews of both offset maps
    #[arg(long)]
    preview: bool,
}

#[derive(Args, Debug)]
struct CompareArgs {
    /// Descriptor file to check (e.g. computed on the GPU)
    candidate: PathBuf,

    /// Reference descriptor file
    reference: PathBuf,

    /// Image width in pixels
    #[arg(long, default_value_t = 1024)]
    width: usize,

    /// Pixel row
    #[arg(short, long, default_value_t = 256)]
    y: usize,

    /// Pixel column
    #[arg(short, long, default_value_t = 256)]
    x: usize,

    #[arg(long, default_value_t = DEFAULT_DESCRIPTOR_LENGTH)]
    descriptor_length: usize,

    /// Factor applied to the reference values
    #[arg(long, default_value_t = DEFAULT_REFERENCE_SCALE)]
    reference_scale: f32,
}

#[derive(Args, Debug)]
struct CoverageArgs {
    /// Side of the square canvas
    #[arg(long, default_value_t = 65)]
    canvas: usize,

    /// First row and column of the crop
    #[arg(long, default_value_t = 16)]
    crop_start: usize,

    /// Last row and column of the crop (inclusive)
    #[arg(long, default_value_t = 47)]
    crop_end: usize,

    /// Petal ring, 0 is innermost
    #[arg(long, default_value_t = 2)]
    ring: usize,

    /// Only count petals whose neighbouring petal is inside as well
    #[arg(long)]
    adjacent: bool,

    /// Write the map as a PNG image
    #[arg(long)]
    preview: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RatioArgs {
    #[arg(long, default_value_t = 128)]
    canvas: usize,

    #[arg(long, default_value_t = 8)]
    min_width: usize,

    /// Crop sides stop before this value
    #[arg(long, default_value_t = 34)]
    max_width: usize,

    #[arg(long, default_value_t = 2)]
    step: usize,

    #[arg(long, default_value_t = 2)]
    ring: usize,
}

fn run_match(args: MatchArgs) -> Result<(), Box<dyn Error>> {
    let dimensions = FieldDimensions::from_signed(args.height, args.width, args.descriptor_length)?;
    let alignment = if args.centered_window {
        WindowAlignment::Centered
    } else {
        WindowAlignment::Legacy
    };
    let window = SearchWindow::new(
        DaisyError::positive("search window height", args.window_height)?,
        DaisyError::positive("search window width", args.window_width)?,
    )?
    .with_alignment(alignment);

    let field1 = DescriptorField::from_file(&args.descriptors1, dimensions)?;
    let field2 = DescriptorField::from_file(&args.descriptors2, dimensions)?;

    let mut matcher = BlockMatcher::new(window);
    if args.sequential {
        matcher = matcher.sequential();
    }
    let result = matcher.match_fields(&field1, &field2)?;

    let summary = result.summary();
    info!(
        "{} pixels, {} stationary, mean distance {:.3}, max distance {:.3}",
        summary.pixels, summary.stationary, summary.mean_diff, summary.max_diff
    );

    result.write_to_prefix(&args.prefix)?;

    if args.preview {
        for (axis, name) in [(OffsetAxis::Y, "MatchYOffset.png"), (OffsetAxis::X, "MatchXOffset.png")] {
            let filename = format!("{}{}", args.prefix, name);
            info!("Writing image {filename}");
            result.offset_preview(axis).save(&filename)?;
        }
    }
    Ok(())
}

fn run_compare(args: CompareArgs) -> Result<(), Box<dyn Error>> {
    let comparison = compare_at(
        &args.candidate,
        &args.reference,
        args.width,
        args.y,
        args.x,
        args.descriptor_length,
        args.reference_scale,
    )?;
    println!("{comparison}");
    Ok(())
}

fn run_coverage(args: CoverageArgs) -> Result<(), Box<dyn Error>> {
    let crop = CropWindow::new(args.crop_start, args.crop_end, args.crop_start, args.crop_end)?;
    let map = coverage_map(
        args.canvas,
        args.canvas,
        &crop,
        &PetalSelection::Ring(args.ring),
        args.adjacent,
    )?;

    for y in 0..map.height() {
        println!("{y}");
        println!("{:?}", map.row(y));
    }
    for (petals, pixels) in map.histogram() {
        println!("{pixels} pixels with {petals} petals");
    }

    if let Some(path) = args.preview {
        info!("Writing image {}", path.display());
        map.preview().save(&path)?;
    }
    Ok(())
}

fn run_ratios(args: RatioArgs) -> Result<(), Box<dyn Error>> {
    let sweep = RatioSweep {
        canvas: args.canvas,
        min_width: args.min_width,
        max_width: args.max_width,
        step: args.step,
        ring: args.ring,
    };
    println!("width_x,width_y,ratio");
    for sample in sweep.run()? {
        println!("{},{},{:.6}", sample.width_x, sample.width_y, sample.ratio);
    }
    Ok(())
}

fn main() {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init_timed();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Match(args) => run_match(args),
        Command::Compare(args) => run_compare(args),
        Command::Coverage(args) => run_coverage(args),
        Command::Ratios(args) => run_ratios(args),
    };

    if let Err(e) = outcome {
        eprintln!("Err: {e}");
        std::process::exit(1);
    }
}
