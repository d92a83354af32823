//! Scripted audio device for tests
//!
//! Clips play until the test releases them (or immediately in auto-finish
//! mode). File names listed with `fail_on` return a device error, names listed
//! with `panic_on` panic inside `start`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use super::{AudioDevice, Playback, PlaybackError, Stopper};

#[derive(Default)]
struct Gate {
    open: Mutex<bool>,
    changed: Condvar,
}

impl Gate {
    fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.changed.notify_all();
    }
}

struct GateStopper {
    gate: Arc<Gate>,
    device: Arc<Mutex<Script>>,
}

impl Stopper for GateStopper {
    fn stop(&self) {
        self.device.lock().unwrap().stops += 1;
        self.gate.open();
    }
}

#[derive(Default)]
struct Script {
    auto_finish: bool,
    fail_on: HashSet<String>,
    panic_on: HashSet<String>,
    attempts: Vec<PathBuf>,
    started: Vec<(PathBuf, Arc<Gate>)>,
    stops: usize,
}

#[derive(Clone, Default)]
pub(crate) struct ScriptedDevice {
    script: Arc<Mutex<Script>>,
}

impl ScriptedDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every clip ends as soon as it starts
    pub fn auto_finish() -> Self {
        let device = Self::new();
        device.script.lock().unwrap().auto_finish = true;
        device
    }

    pub fn fail_on(&self, file_name: &str) {
        self.script.lock().unwrap().fail_on.insert(file_name.to_string());
    }

    pub fn panic_on(&self, file_name: &str) {
        self.script.lock().unwrap().panic_on.insert(file_name.to_string());
    }

    /// End the oldest still-playing clip with this file name
    pub fn release(&self, file_name: &str) -> bool {
        let script = self.script.lock().unwrap();
        let gate = script
            .started
            .iter()
            .find(|(path, gate)| file_of(path) == file_name && !*gate.open.lock().unwrap())
            .map(|(_, gate)| Arc::clone(gate));
        drop(script);
        match gate {
            Some(gate) => {
                gate.open();
                true
            }
            None => false,
        }
    }

    /// File names that started successfully, in start order
    pub fn started(&self) -> Vec<String> {
        self.script
            .lock()
            .unwrap()
            .started
            .iter()
            .map(|(p, _)| file_of(p))
            .collect()
    }

    /// Every `start` call, including failed ones
    pub fn attempts(&self) -> usize {
        self.script.lock().unwrap().attempts.len()
    }

    pub fn stops(&self) -> usize {
        self.script.lock().unwrap().stops
    }
}

impl AudioDevice for ScriptedDevice {
    fn start(&self, path: &Path, _gain: f32) -> Result<Box<dyn Playback>, PlaybackError> {
        let name = file_of(path);
        let mut script = self.script.lock().unwrap();
        script.attempts.push(path.to_path_buf());

        if script.panic_on.contains(&name) {
            drop(script);
            panic!("scripted panic for {name}");
        }
        if script.fail_on.contains(&name) {
            return Err(PlaybackError::Device(format!("scripted failure for {name}")));
        }

        let gate = Arc::new(Gate::default());
        if script.auto_finish {
            *gate.open.lock().unwrap() = true;
        }
        script.started.push((path.to_path_buf(), Arc::clone(&gate)));

        Ok(Box::new(ScriptedPlayback {
            gate,
            path: path.to_path_buf(),
            device: Arc::clone(&self.script),
        }))
    }
}

struct ScriptedPlayback {
    gate: Arc<Gate>,
    path: PathBuf,
    device: Arc<Mutex<Script>>,
}

impl Playback for ScriptedPlayback {
    fn stopper(&self) -> Arc<dyn Stopper> {
        Arc::new(GateStopper {
            gate: Arc::clone(&self.gate),
            device: Arc::clone(&self.device),
        })
    }

    fn wait(self: Box<Self>, timeout: Option<Duration>) -> Result<(), PlaybackError> {
        let open = self.gate.open.lock().unwrap();
        match timeout {
            None => {
                let _open = self.gate.changed.wait_while(open, |o| !*o).unwrap();
                Ok(())
            }
            Some(t) => {
                let (_open, result) = self.gate.changed.wait_timeout_while(open, t, |o| !*o).unwrap();
                if result.timed_out() {
                    Err(PlaybackError::TimedOut {
                        path: self.path.clone(),
                        timeout: t,
                    })
                } else {
                    Ok(())
                }
            }
        }
    }
}

fn file_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Poll `condition` until it holds or two seconds pass
pub(crate) fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
