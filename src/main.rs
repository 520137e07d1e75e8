use std::error::Error;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command, ValueEnum};
use log::info;
use mosaic::config::parse_size;
use mosaic::transport::{handle_request, handle_tiles_request, respond};
use mosaic::{
    codec, load_config, CropMethod, MosaicConfig, MosaicPipeline, ResampleFilter, Rounding,
};

#[derive(ValueEnum, Clone, Debug)]
enum RoundingArg {
    HalfUp,
    HalfEven,
}

#[derive(ValueEnum, Clone, Debug)]
enum CropMethodArg {
    CropEqual,
    CropRandom,
}

#[derive(ValueEnum, Clone, Debug)]
enum FilterArg {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

fn cli() -> Command {
    Command::new("mosaic")
        .version("0.1")
        .about("Cover-fit an image, average it into blocks and draw a grid.")
        .arg(
            Arg::new("input")
                .help("Sets the input file to use")
                .required_unless_present("json")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .index(1),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("Output file, or output directory with --tiles"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("JSON configuration file"),
        )
        .arg(
            Arg::new("size")
                .long("size")
                .help("The canvas size of the output.")
                .value_name("W,H"),
        )
        .arg(
            Arg::new("block")
                .short('b')
                .long("block")
                .help("The block size in pixels.")
                .value_name("UINT")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("tiles")
                .long("tiles")
                .help("Write one mosaic per tile size instead of a single one.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("tile_sizes")
                .long("tile_sizes")
                .help("Block sizes for --tiles, e.g. 128,64,32,16,8.")
                .value_name("UINT,...")
                .value_delimiter(',')
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("no_grid")
                .long("no-grid")
                .help("Do not draw grid lines.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("rounding")
                .long("rounding")
                .help("Tie-break for averaged channels.")
                .value_name("Rounding")
                .value_parser(value_parser!(RoundingArg)),
        )
        .arg(
            Arg::new("crop_method")
                .long("crop_method")
                .help("Where to crop the overflow. Possible values are crop-equal and crop-random.")
                .value_name("CropMethod")
                .value_parser(value_parser!(CropMethodArg)),
        )
        .arg(
            Arg::new("filter")
                .long("filter")
                .help("Resampling filter used when scaling.")
                .value_name("Filter")
                .value_parser(value_parser!(FilterArg)),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Read a {\"file\": <base64>} request from stdin and answer on stdout.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Prints debug information verbosely.")
                .action(ArgAction::SetTrue),
        )
}

fn main() -> Result<(), Box<dyn Error>> {
    let matches = cli().get_matches();

    let level = if matches.get_flag("verbose") { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = build_config(&matches)?;

    if matches.get_flag("json") {
        return run_json(&config, matches.get_flag("tiles"));
    }

    let input_path = matches
        .get_one::<PathBuf>("input")
        .ok_or("An input file is required")?;
    info!("Using input file: {}", input_path.display());

    let bytes = std::fs::read(input_path)?;
    let source = codec::decode(&bytes)?;
    let pipeline = MosaicPipeline::from_config(&config)?;
    let output = matches.get_one::<PathBuf>("output");

    if matches.get_flag("tiles") {
        let dir = match output {
            Some(dir) => dir.clone(),
            None => input_path.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        std::fs::create_dir_all(&dir)?;
        let tiles = pipeline.render_tiles(&source, &config.tile_specs()?)?;
        for tile in &tiles {
            let path = dir.join(output_name(input_path, &format!("_mosaic_{}.png", tile.label)));
            std::fs::write(&path, codec::encode_png(&tile.buffer)?)?;
            println!("Tile {} saved to {}", tile.label, path.display());
        }
    } else {
        let path = match output {
            Some(path) => path.clone(),
            None => input_path.with_file_name(output_name(input_path, "_mosaic.png")),
        };
        let mosaic = pipeline.render(&source)?;
        std::fs::write(&path, codec::encode_png(&mosaic)?)?;
        println!("Mosaic saved to {}", path.display());
    }

    Ok(())
}

/// Config file, then environment, then command line flags.
fn build_config(matches: &ArgMatches) -> Result<MosaicConfig, Box<dyn Error>> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => load_config(path)?,
        None => MosaicConfig::default(),
    };
    config.apply_env()?;

    if let Some(size) = matches.get_one::<String>("size") {
        let (w, h) = parse_size(size)?;
        config.cover_width = w;
        config.cover_height = h;
    }
    if let Some(block) = matches.get_one::<u32>("block") {
        config.block_size = *block;
    }
    if let Some(sizes) = matches.get_many::<u32>("tile_sizes") {
        config.tile_sizes = sizes.copied().collect();
    }
    if matches.get_flag("no_grid") {
        config.grid = false;
    }
    if let Some(rounding) = matches.get_one::<RoundingArg>("rounding") {
        config.rounding = match rounding {
            RoundingArg::HalfUp => Rounding::HalfUp,
            RoundingArg::HalfEven => Rounding::HalfEven,
        };
    }
    if let Some(crop) = matches.get_one::<CropMethodArg>("crop_method") {
        config.crop = match crop {
            CropMethodArg::CropEqual => CropMethod::CropEqual,
            CropMethodArg::CropRandom => CropMethod::CropRandom,
        };
    }
    if let Some(filter) = matches.get_one::<FilterArg>("filter") {
        config.filter = match filter {
            FilterArg::Nearest => ResampleFilter::Nearest,
            FilterArg::Triangle => ResampleFilter::Triangle,
            FilterArg::CatmullRom => ResampleFilter::CatmullRom,
            FilterArg::Gaussian => ResampleFilter::Gaussian,
            FilterArg::Lanczos3 => ResampleFilter::Lanczos3,
        };
    }

    config.validate()?;
    Ok(config)
}

fn run_json(config: &MosaicConfig, tiles: bool) -> Result<(), Box<dyn Error>> {
    let mut body = String::new();
    io::stdin().read_to_string(&mut body)?;

    let (status, json) = if tiles {
        respond(&handle_tiles_request(&body, config))
    } else {
        respond(&handle_request(&body, config))
    };
    println!("{json}");

    if status != 200 {
        return Err(format!("Request failed with status {status}").into());
    }
    Ok(())
}

fn output_name(input_path: &Path, suffix: &str) -> String {
    let file_stem = input_path.file_stem().unwrap_or_default();
    let mut new_name = file_stem.to_string_lossy().into_owned();
    new_name.push_str(suffix);
    new_name
}
