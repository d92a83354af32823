use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chatsound_core::context::{AppConfig, AppConfigExt, ConfigError};
use chatsound_core::engine::{EngineHandle, SoundEngine, create_engine_channel};
use chatsound_core::library::{AudioLibrary, ClipResolver};
use chatsound_core::playback::{ChannelPool, RodioDevice};
use chatsound_core::rules::RuleSet;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::warn;

/// Holds all shared state for the CLI application.
/// The engine owns evaluation; this is the settings-UI side of it.
pub struct CliContext {
    pub config: Arc<RwLock<AppConfig>>,
    pub engine: EngineHandle,
    pub rules: Arc<RuleSet>,
    pub library: AudioLibrary,
    enabled: Arc<AtomicBool>,
    pool: Arc<ChannelPool>,
    engine_task: Mutex<Option<JoinHandle<()>>>,
}

impl CliContext {
    /// Load settings and start the engine. Must be called inside a runtime.
    pub fn new() -> Self {
        let config = AppConfig::load();

        let library = AudioLibrary::from_settings(config.audio.audio_dir.as_deref())
            .unwrap_or_else(|e| {
                warn!(error = %e, "Using ./audio as the audio directory");
                AudioLibrary::new("audio")
            });
        if let Err(e) = library.ensure_exists() {
            warn!(error = %e, "Audio directory unavailable");
        }

        let (engine, rx) = create_engine_channel();
        let resolver: Arc<dyn ClipResolver> = Arc::new(library.clone());
        let service =
            SoundEngine::from_config(&engine, rx, &config, Arc::new(RodioDevice), resolver);

        let rules = service.rules();
        let enabled = service.enabled_flag();
        let pool = service.pool();
        let engine_task = tokio::spawn(service.run());

        Self {
            config: Arc::new(RwLock::new(config)),
            engine,
            rules,
            library,
            enabled,
            pool,
            engine_task: Mutex::new(Some(engine_task)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn pool(&self) -> &ChannelPool {
        &self.pool
    }

    /// Copy the live rules (with play counters) into the config and persist it
    pub async fn save(&self) -> Result<(), ConfigError> {
        let mut config = self.config.write().await;
        config.sound_commands = self.rules.to_commands();
        config.save()
    }

    /// Stop the engine and wait for its channels to be released
    pub async fn shutdown(&self) {
        self.engine.shutdown();
        let Some(task) = self.engine_task.lock().await.take() else {
            return;
        };
        if let Err(e) = task.await {
            warn!(error = %e, "Sound engine task failed");
        }
    }
}
