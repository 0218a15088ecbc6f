use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use flipbook::media::open_animation;
use flipbook::{
    FrameCallback, FrameInfo, FrameStore, GifDecoder, PlayDirection, PlaybackDriver,
    PlaybackEvent, PlaybackSettings, Sequencer,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the frame table of a GIF
    Info { path: PathBuf },
    /// Play an animation without a window, logging each presented frame
    Play(PlayArgs),
    /// Write every composed frame of a GIF as a PNG
    Export { path: PathBuf, out_dir: PathBuf },
}

#[derive(clap::Args, Debug)]
struct PlayArgs {
    path: PathBuf,

    #[arg(short, long, default_value_t = 1, help = "Stop after this many loops")]
    loops: u64,

    #[arg(short = 'n', long, help = "Stop after this many frames (overrides --loops)")]
    frames: Option<usize>,

    #[arg(short, long, help = "Delay multiplier, 1.0 is authored speed")]
    speed: Option<f32>,

    #[arg(long, help = "Play from the last frame towards the first")]
    backward: bool,

    #[arg(long, help = "Reverse direction at each end instead of wrapping")]
    ping_pong: bool,

    #[arg(long, help = "Decode all frames before playing")]
    preload: bool,

    #[arg(long, help = "Persist these options as the new defaults")]
    save_settings: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    match Cli::parse().command {
        Command::Info { path } => info(&path),
        Command::Play(args) => play(args),
        Command::Export { path, out_dir } => {
            let count = export(&path, &out_dir)?;
            println!("Wrote {count} frames to {}", out_dir.display());
            Ok(())
        }
    }
}

fn open_store(path: &Path) -> Result<FrameStore> {
    let decoder =
        GifDecoder::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(FrameStore::new(decoder))
}

fn info(path: &Path) -> Result<()> {
    let mut store = open_store(path)?;
    store.load_until_end();
    let count = store.num_frames().unwrap_or(0);
    println!(
        "{}: {}x{}, {count} frames, seekable: {}",
        path.display(),
        store.width(),
        store.height(),
        store.is_seekable()
    );
    println!("{:>5}  {:>7}  {:<10}  {:<16}  full", "index", "delay", "dispose", "placement");

    let mut total_ms = 0u64;
    for i in 0..count {
        let Some(frame) = store.frame(i) else {
            break;
        };
        total_ms += u64::from(frame.delay_ms);
        let full = if store.is_full_frame(i) == Some(true) {
            "yes"
        } else {
            "no"
        };
        println!(
            "{i:>5}  {:>5}ms  {:<10}  {:<16}  {full}",
            frame.delay_ms,
            frame.disposal.to_string(),
            frame.placement.to_string()
        );
    }
    println!("total {total_ms}ms");
    Ok(())
}

fn play(args: PlayArgs) -> Result<()> {
    let mut settings = PlaybackSettings::load();
    if let Some(speed) = args.speed {
        settings.speed = speed;
    }
    if args.backward {
        settings.direction = PlayDirection::Backward;
    }
    if args.ping_pong {
        settings.ping_pong = true;
    }
    if args.preload {
        settings.preload = true;
    }
    if args.save_settings {
        settings.save();
    }

    let producer = open_animation(&args.path, settings.preload)
        .with_context(|| format!("opening {}", args.path.display()))?;
    let sequencer = Sequencer::from_boxed(producer)
        .with_direction(settings.direction)
        .with_ping_pong(settings.ping_pong);

    let callback: FrameCallback = Arc::new(|info: &FrameInfo| log::info!("Frame {info}"));
    let driver =
        PlaybackDriver::spawn(sequencer, Some(callback)).context("starting playback thread")?;
    driver.set_speed(settings.speed);
    let events = driver.events();

    if settings.start_paused {
        log::info!("Starting paused, showing one frame");
        if !driver.step_forward() {
            bail!("{} has no frames", args.path.display());
        }
        while !matches!(events.recv(), Ok(PlaybackEvent::Frame(_)) | Err(_)) {}
        return Ok(());
    }

    driver.play();
    let mut frames = 0usize;
    let mut loops = 0u64;
    for event in events.iter() {
        match event {
            PlaybackEvent::Frame(_) => {
                frames += 1;
                if args.frames.is_some_and(|n| frames >= n) {
                    break;
                }
            }
            PlaybackEvent::Repeating => {
                loops += 1;
                if args.frames.is_none() && loops >= args.loops {
                    break;
                }
            }
            PlaybackEvent::Finished | PlaybackEvent::Stopped => break,
            PlaybackEvent::Started | PlaybackEvent::Paused => {}
        }
    }
    driver.stop();
    log::info!("Presented {frames} frames, {loops} loops");
    Ok(())
}

fn export(path: &Path, out_dir: &Path) -> Result<usize> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    let mut store = open_store(path)?;
    let mut count = 0;
    while let Some(frame) = store.frame(count) {
        let composed = &frame.composed;
        let Some(image) =
            image::RgbaImage::from_raw(composed.width, composed.height, composed.data.clone())
        else {
            bail!("frame {count} has an inconsistent pixel buffer");
        };
        let file = out_dir.join(format!("frame_{count:04}.png"));
        image
            .save(&file)
            .with_context(|| format!("writing {}", file.display()))?;
        count += 1;
    }
    Ok(count)
}
