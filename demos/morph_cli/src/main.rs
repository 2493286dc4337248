use std::path::{Path, PathBuf};
use std::time::Duration;

use argh::FromArgs;
use serde::Deserialize;

use morpher::{
    image::{Image, ImageSize},
    imgproc::parallel::ExecutionStrategy,
    morph::{generate_with, CancelToken, Feature, GenerateOptions, MorphConfig, MorphSession},
};

#[derive(FromArgs)]
/// Morph one image into another along matched features
struct Args {
    /// path to the first image
    #[argh(option)]
    source: PathBuf,

    /// path to the second image
    #[argh(option)]
    destination: PathBuf,

    /// path to a json file with `source` and `destination` feature lists
    #[argh(option)]
    features: PathBuf,

    /// number of frames to write
    #[argh(option, default = "10")]
    frames: usize,

    /// directory where the frames are written
    #[argh(option, default = "PathBuf::from(\"frames\")")]
    output: PathBuf,

    /// json file with the engine parameters
    #[argh(option)]
    config: Option<PathBuf>,

    /// run each frame on a dedicated pool of this many threads
    #[argh(option)]
    threads: Option<usize>,

    /// give up after this many seconds
    #[argh(option)]
    timeout_secs: Option<u64>,
}

#[derive(Deserialize)]
struct FeatureFile {
    source: Vec<Feature>,
    destination: Vec<Feature>,
}

fn read_rgba8(path: &Path) -> Result<Image<u8, 4>, Box<dyn std::error::Error>> {
    let img = image::open(path)?.into_rgba8();
    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };
    Ok(Image::new(size, img.into_raw())?)
}

fn write_rgba8(path: &Path, img: &Image<u8, 4>) -> Result<(), Box<dyn std::error::Error>> {
    let buf = image::RgbaImage::from_raw(
        img.width() as u32,
        img.height() as u32,
        img.as_slice().to_vec(),
    )
    .ok_or("frame buffer does not match its size")?;
    buf.save(path)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let mut config = match &args.config {
        Some(path) => serde_json::from_str::<MorphConfig>(&std::fs::read_to_string(path)?)?,
        None => MorphConfig::default(),
    };
    if let Some(n) = args.threads {
        config = config.with_strategy(ExecutionStrategy::Fixed(n));
    }

    let features: FeatureFile = serde_json::from_str(&std::fs::read_to_string(&args.features)?)?;

    let source = read_rgba8(&args.source)?;
    let destination = read_rgba8(&args.destination)?;
    log::info!(
        "loaded {} and {} ({})",
        args.source.display(),
        args.destination.display(),
        source.size()
    );

    let session = MorphSession::from_features(
        source,
        destination,
        features.source,
        features.destination,
        config,
    )?;

    // create a cancel token to stop the generation
    let cancel_token = CancelToken::new();

    ctrlc::set_handler({
        let cancel_token = cancel_token.clone();
        move || {
            println!("Received Ctrl-C signal. Sending cancel signal !!");
            cancel_token.cancel();
        }
    })?;

    let mut options = GenerateOptions::default().with_cancel(cancel_token);
    if let Some(secs) = args.timeout_secs {
        options = options.with_timeout(Duration::from_secs(secs));
    }

    std::fs::create_dir_all(&args.output)?;

    for frame in generate_with(&session, args.frames, options)? {
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) if err.is_cancelled() => {
                log::warn!("generation cancelled, stopping");
                break;
            }
            Err(err) => return Err(err.into()),
        };

        let path = args.output.join(format!("frame_{:04}.png", frame.index()));
        write_rgba8(&path, frame.image())?;
        log::info!("wrote {} (t = {:.3})", path.display(), frame.t());
    }

    Ok(())
}
