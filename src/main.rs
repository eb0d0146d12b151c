mod app;
mod cli;
mod config;
mod display;
mod gesture;
mod interaction;
mod pipeline;
mod render;
mod scene;
mod types;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use app::Session;
use cli::{Cli, Commands};
use config::AppConfig;
use display::{HeadlessViewport, Viewport};
use pipeline::{BlankFrames, CommandQueue, LandmarkExtractor, LineSource, ReplayExtractor};
use scene::SceneGraph;
use types::RunFlag;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = AppConfig::load_or_default(cli.config.as_deref()).with_context(|| {
        match &cli.config {
            Some(path) => format!("failed to load config {}", path.display()),
            None => "invalid default config".to_string(),
        }
    })?;

    match &cli.command {
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        Commands::Run { graph } => run_live(&cli, &config, graph.as_deref()),
        Commands::Replay {
            script,
            graph,
            snapshot,
        } => {
            let mut extractor = ReplayExtractor::from_file(script)?;
            log::info!("replaying {} frames from {}", extractor.total(), script.display());
            let mut frames =
                BlankFrames::new(config.camera.viewport_width, config.camera.viewport_height);
            let mut viewport = replay_viewport(&config, snapshot.clone())?;
            let running = RunFlag::new();
            let mut session = build_session(&cli, &config, graph.as_deref(), &running)?;
            app::run_loop(
                &mut session,
                &mut frames,
                &mut extractor,
                viewport.as_mut(),
                &running,
            )
        }
    }
}

/// Sample graph, replaced by `graph` when it loads.
fn build_scene(config: &AppConfig, graph: Option<&Path>) -> SceneGraph {
    let mut scene = SceneGraph::sample(config);
    if let Some(path) = graph {
        if let Err(err) = scene.load_file(path) {
            log::warn!("keeping sample graph: {err}");
        }
    }
    scene
}

fn build_session(
    cli: &Cli,
    config: &AppConfig,
    graph: Option<&Path>,
    running: &RunFlag,
) -> Result<Session> {
    let (tx, queue) = CommandQueue::new();
    if cli.no_commands {
        drop(tx);
    } else {
        pipeline::spawn_command_listener(LineSource::stdin(), tx, running.clone())?;
        log::info!("type a mode command (e.g. \"drag mode\") and press enter");
    }
    Ok(Session::new(config, build_scene(config, graph), queue))
}

fn replay_viewport(
    config: &AppConfig,
    snapshot: Option<std::path::PathBuf>,
) -> Result<Box<dyn Viewport>> {
    if snapshot.is_none() {
        if let Some(window) = open_window(config)? {
            return Ok(window);
        }
    }
    Ok(Box::new(HeadlessViewport::new(snapshot)))
}

#[cfg(feature = "window-minifb")]
fn open_window(config: &AppConfig) -> Result<Option<Box<dyn Viewport>>> {
    let window = display::WindowViewport::new(
        "Gesture Graph",
        config.camera.viewport_width,
        config.camera.viewport_height,
    )?;
    Ok(Some(Box::new(window)))
}

#[cfg(not(feature = "window-minifb"))]
fn open_window(_config: &AppConfig) -> Result<Option<Box<dyn Viewport>>> {
    Ok(None)
}

#[cfg_attr(not(feature = "camera-nokhwa"), allow(dead_code))]
fn landmark_extractor() -> Box<dyn LandmarkExtractor> {
    #[cfg(feature = "handpose-ort")]
    {
        let model_path = pipeline::model_download::default_handpose_model_path();
        match pipeline::handpose::OrtExtractor::new(&model_path) {
            Ok(extractor) => return Box::new(extractor),
            Err(err) => log::error!("hand tracking unavailable: {err:?}"),
        }
    }
    #[cfg(not(feature = "handpose-ort"))]
    log::warn!("built without handpose-ort; no hands will be detected");
    Box::new(pipeline::NoHands)
}

#[cfg(feature = "camera-nokhwa")]
fn run_live(cli: &Cli, config: &AppConfig, graph: Option<&Path>) -> Result<()> {
    let running = RunFlag::new();
    let (frame_tx, frame_rx) = crossbeam_channel::bounded(1);
    let _stream = pipeline::capture::start_capture(
        config.capture.camera_index,
        config.capture.mirror,
        frame_tx,
        running.clone(),
    )
    .context("failed to start camera")?;

    let mut extractor = landmark_extractor();
    let mut frames = pipeline::capture::ChannelFrames::new(frame_rx, running.clone());
    let mut viewport: Box<dyn Viewport> = match open_window(config)? {
        Some(window) => window,
        None => {
            log::warn!("built without window-minifb; frames are not displayed");
            Box::new(HeadlessViewport::new(None))
        }
    };
    let mut session = build_session(cli, config, graph, &running)?;
    app::run_loop(
        &mut session,
        &mut frames,
        extractor.as_mut(),
        viewport.as_mut(),
        &running,
    )
}

#[cfg(not(feature = "camera-nokhwa"))]
fn run_live(_cli: &Cli, _config: &AppConfig, _graph: Option<&Path>) -> Result<()> {
    anyhow::bail!(
        "built without camera support; rebuild with --features camera-nokhwa or use `replay`"
    )
}
