//! Command implementations: live playback and file export.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use ambient_walk::{
    backend::{AudioGraph, RealtimeGraph},
    engine::{scheduler::TICK_PERIOD_SECONDS, Exporter, NoteEvent, TracingObserver},
    ControlHandle, EncodeError, Engine, EngineConfig,
};

/// Options shared by both export commands.
pub struct Export {
    pub out: PathBuf,
    pub config: Option<PathBuf>,
    pub hyperbars: Option<u32>,
    pub seed: Option<u64>,
}

fn load_config(path: Option<&Path>) -> EyreResult<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .wrap_err_with(|| format!("failed to load config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

/// Play until `seconds` have passed, or forever.
pub fn play(config: Option<&Path>, seconds: Option<f64>) -> EyreResult<()> {
    let config = load_config(config)?;
    let seed = config.seed_or_random();
    let data = config.graph_data().wrap_err("failed to load relation graph")?;
    let control = ControlHandle::new(config.params(), config.tempo());

    let mut engine = Engine::new(
        RealtimeGraph::new(),
        data,
        control,
        StdRng::seed_from_u64(seed),
    )
    .with_observer(Box::new(TracingObserver));

    engine.start().wrap_err("failed to start playback")?;
    info!(seed, bpm = config.tempo().bpm, "playing, press Ctrl+C to stop");

    let started = Instant::now();
    let period = Duration::from_secs_f64(TICK_PERIOD_SECONDS);
    loop {
        if seconds.is_some_and(|limit| started.elapsed().as_secs_f64() >= limit) {
            break;
        }
        let now = engine.graph().current_time();
        engine.tick(now);
        thread::sleep(period);
    }

    engine.stop();
    Ok(())
}

pub fn export_wav(export: Export) -> EyreResult<()> {
    write_export(export, |exporter, notes| exporter.export_wav(notes))
}

pub fn export_midi(export: Export) -> EyreResult<()> {
    write_export(export, |exporter, notes| exporter.export_midi(notes))
}

fn write_export<F>(export: Export, encode: F) -> EyreResult<()>
where
    F: FnOnce(&Exporter, &[NoteEvent]) -> Result<Vec<u8>, EncodeError>,
{
    let config = load_config(export.config.as_deref())?;
    let seed = export.seed.unwrap_or_else(|| config.seed_or_random());
    let hyperbars = export.hyperbars.unwrap_or(config.hyperbars);

    let exporter = config.exporter(seed).wrap_err("failed to load relation graph")?;
    let notes = exporter.generate(hyperbars);
    info!(seed, hyperbars, notes = notes.len(), "generated");

    let bytes = encode(&exporter, &notes).wrap_err("encoding failed")?;
    fs::write(&export.out, &bytes)
        .wrap_err_with(|| format!("failed to write {}", export.out.display()))?;
    info!(path = %export.out.display(), bytes = bytes.len(), "written");
    Ok(())
}
