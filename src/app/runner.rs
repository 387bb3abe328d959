use std::{
    sync::{Arc, Condvar, Mutex, MutexGuard},
    thread::JoinHandle,
};

use log::*;

use crate::core::{Error, Snes};

struct State {
    snes: Snes,
    // Set by the UI thread to request a frame, cleared by the emulation thread once it is done
    running: bool,
    quit: bool,
    result: Option<Result<u64, Error>>,
}

type Shared = Arc<(Mutex<State>, Condvar)>;

/// Runs the SNES on its own thread, one frame at a time.
///
/// The emulator state is only touched by the emulation thread while a frame is running, so
/// the caller must [EmuThread::wait] before looking at it.
pub struct EmuThread {
    shared: Shared,
    handle: Option<JoinHandle<()>>,
}

impl EmuThread {
    /// Move a SNES onto a new emulation thread.
    pub fn new(snes: Snes) -> EmuThread {
        let shared: Shared = Arc::new((
            Mutex::new(State {
                snes,
                running: false,
                quit: false,
                result: None,
            }),
            Condvar::new(),
        ));
        let thread_shared = shared.clone();
        let handle = std::thread::spawn(move || EmuThread::run(thread_shared));
        EmuThread {
            shared,
            handle: Some(handle),
        }
    }

    // The lock is held for the whole of `run_frame`, so callers block in `wait` or `with_snes`
    // until the frame is done instead of polling a half-run console.
    fn run(shared: Shared) {
        let (lock, cvar) = &*shared;
        let Ok(mut state) = lock.lock() else {
            return;
        };
        loop {
            while !state.running && !state.quit {
                state = match cvar.wait(state) {
                    Ok(s) => s,
                    Err(_) => return,
                };
            }
            if state.quit {
                debug!("Emulation thread exiting");
                return;
            }
            let result = state.snes.run_frame();
            state.result = Some(result);
            state.running = false;
            cvar.notify_all();
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A poisoned lock means the emulation thread panicked, the state is still readable
        self.shared
            .0
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Ask the emulation thread to run a frame and return immediately.
    pub fn run_frame_async(&self) {
        let mut state = self.lock();
        state.running = true;
        self.shared.1.notify_all();
    }

    /// Block until the requested frame is done, returning its result.
    pub fn wait(&self) -> Result<u64, Error> {
        let mut state = self.lock();
        while state.running {
            state = self
                .shared
                .1
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        state.result.take().unwrap_or(Ok(0))
    }

    /// Run some code with the SNES while no frame is running.
    pub fn with_snes<T>(&self, f: impl FnOnce(&mut Snes) -> T) -> T {
        let mut state = self.lock();
        while state.running {
            state = self
                .shared
                .1
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        f(&mut state.snes)
    }

    /// Stop the emulation thread and take the SNES back.
    pub fn into_inner(mut self) -> Snes {
        self.stop();
        let mut state = self.lock();
        std::mem::take(&mut state.snes)
    }

    fn stop(&mut self) {
        self.lock().quit = true;
        self.shared.1.notify_all();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Emulation thread panicked");
            }
        }
    }
}

impl Drop for EmuThread {
    fn drop(&mut self) {
        self.stop();
    }
}
