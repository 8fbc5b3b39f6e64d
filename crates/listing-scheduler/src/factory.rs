//! Builds the one job manager a process runs with.
//!
//! `ManagerHolder` is an ordinary value owned by the application context,
//! not a global. It resolves the mode and constructs the manager on first
//! use, and `reset_manager` tears it down so the next call starts fresh.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::{
    resolve_mode_from, HostedSchedulerAdapter, JobManager, LocalTimerManager, Mode, ModeInputs,
    NoopJobManager, SchedulerConfig,
};

/// Construct the manager implementation for `mode`.
pub fn build_manager(
    mode: Mode,
    inputs: &ModeInputs,
    config: &SchedulerConfig,
) -> Arc<dyn JobManager> {
    match mode {
        Mode::Disabled => {
            info!("Background jobs disabled");
            Arc::new(NoopJobManager::new())
        }
        Mode::Hosted => match inputs.hosted_settings() {
            Some(settings) => Arc::new(HostedSchedulerAdapter::new(settings, config.clone())),
            None => {
                warn!("Hosted mode requested without complete settings, using local timers");
                Arc::new(LocalTimerManager::new(config.clone()))
            }
        },
        Mode::Platform => {
            info!("Platform cron registration is not wired up, using local timers");
            Arc::new(LocalTimerManager::new(config.clone()))
        }
        Mode::Local => Arc::new(LocalTimerManager::new(config.clone())),
    }
}

type InputSource = dyn Fn() -> ModeInputs + Send + Sync;

struct Active {
    mode: Mode,
    manager: Arc<dyn JobManager>,
}

/// Lazily constructed, resettable owner of the process's job manager.
pub struct ManagerHolder {
    inputs: Arc<InputSource>,
    config: SchedulerConfig,
    active: Mutex<Option<Active>>,
}

impl ManagerHolder {
    /// Holder that reads mode inputs from the process environment each time
    /// it builds a manager.
    pub fn from_env(config: SchedulerConfig) -> Self {
        Self::with_inputs(config, ModeInputs::from_env)
    }

    /// Holder with an explicit source of mode inputs.
    pub fn with_inputs<F>(config: SchedulerConfig, inputs: F) -> Self
    where
        F: Fn() -> ModeInputs + Send + Sync + 'static,
    {
        Self {
            inputs: Arc::new(inputs),
            config,
            active: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Active>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The process's manager, built on first call.
    pub fn get_manager(&self) -> Arc<dyn JobManager> {
        let mut active = self.lock();
        if let Some(current) = active.as_ref() {
            return Arc::clone(&current.manager);
        }

        let inputs = (self.inputs)();
        let mode = resolve_mode_from(&inputs);
        info!(mode = %mode, "Building job manager");
        let manager = build_manager(mode, &inputs, &self.config);
        *active = Some(Active {
            mode,
            manager: Arc::clone(&manager),
        });
        manager
    }

    /// Stop every job on the current manager and forget it.
    pub fn reset_manager(&self) {
        let previous = self.lock().take();
        if let Some(previous) = previous {
            previous.manager.stop_all_jobs();
            info!(mode = %previous.mode, "Job manager reset");
        }
    }

    /// Mode of the current manager, if one has been built.
    pub fn resolved_mode(&self) -> Option<Mode> {
        self.lock().as_ref().map(|active| active.mode)
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}
