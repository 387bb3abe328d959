use std::{fs::File, path::PathBuf, process::ExitCode};

use clap::Parser;
use log::*;
use simplelog::{
    ColorChoice, CombinedLogger, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use yase::{
    app::{utils, Config, EmuThread},
    core::{GameDb, Snes},
};

/// A S.N.E.S. emulator.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the ROM file
    rom: PathBuf,
    /// Number of frames to run, overrides the config
    #[arg(short, long)]
    frames: Option<u64>,
    /// Path to the YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Write the last frame to this image file
    #[arg(long)]
    screenshot: Option<PathBuf>,
    /// Also write the log to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Run the emulation on its own thread
    #[arg(long)]
    threaded: bool,
    /// Write a savestate once done
    #[arg(long)]
    quicksave: bool,
    /// Start from this savestate instead of powering on
    #[arg(long)]
    quickload: Option<PathBuf>,
}

fn init_logging(level: LevelFilter, log_file: &Option<PathBuf>) {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = log_file {
        match File::create(path) {
            Ok(f) => loggers.push(WriteLogger::new(level, simplelog::Config::default(), f)),
            Err(e) => eprintln!("Unable to create log file {:?}: {}", path, e),
        }
    }
    if let Err(e) = CombinedLogger::init(loggers) {
        eprintln!("Unable to initialize logging: {}", e);
    }
}

fn run(snes: &mut Snes, frames: u64, threaded: bool) -> Result<u64, yase::core::Error> {
    let mut cycles = 0;
    if threaded {
        let emu = EmuThread::new(std::mem::take(snes));
        for _ in 0..frames {
            emu.run_frame_async();
            let result = emu.wait();
            emu.with_snes(|s| s.bus.ppu.swap_buffers());
            match result {
                Ok(c) => cycles += c,
                Err(e) => {
                    *snes = emu.into_inner();
                    return Err(e);
                }
            }
        }
        *snes = emu.into_inner();
    } else {
        for _ in 0..frames {
            cycles += snes.run_frame()?;
            snes.bus.ppu.swap_buffers();
        }
    }
    Ok(cycles)
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config_path = args.config.clone().or_else(Config::default_path);
    let mut config = match &config_path {
        Some(p) => Config::load(p),
        None => Config::default(),
    };
    init_logging(config.level_filter(), &args.log_file);
    debug!("Using config {:?}: {:?}", config_path, config);

    let save_path = config.save_path(&args.rom);
    let mut snes = match Snes::load_rom(&args.rom, &GameDb::new(), Some(&save_path)) {
        Ok(s) => s,
        Err(e) => {
            error!("Unable to load {:?}: {}", args.rom, e);
            return ExitCode::FAILURE;
        }
    };
    snes.settings = config.settings;
    config.game_name = args
        .rom
        .file_stem()
        .map(|s| s.to_string_lossy().to_string());
    if let Some(path) = &args.quickload {
        config.quickload_file = Some(path.clone());
        if !utils::quickload(&mut snes, &config) {
            return ExitCode::FAILURE;
        }
    }

    let frames = args.frames.or(config.frames).unwrap_or(60);
    let result = run(&mut snes, frames, args.threaded);
    let code = match result {
        Ok(cycles) => {
            info!("Ran {} frames, {} CPU cycles", frames, cycles);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Emulation stopped: {}", e);
            ExitCode::FAILURE
        }
    };

    if let Some(path) = &args.screenshot {
        if let Err(e) = utils::screenshot(&snes, path) {
            error!("Unable to write screenshot {:?}: {}", path, e);
        }
    }
    if args.quicksave {
        utils::quicksave(&snes, &mut config);
    }
    if let Err(e) = snes.flush_save() {
        error!("Unable to write save file: {}", e);
    }
    code
}
