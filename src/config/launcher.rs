//! Launcher and runtime configuration structures.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How scheduler loops are pumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One dedicated OS thread per loop.
    #[default]
    Thread,
    /// No threads; the host drives each loop itself.
    Manual,
}

impl std::str::FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "thread" | "threads" => Ok(Self::Thread),
            "manual" => Ok(Self::Manual),
            other => Err(format!("unknown execution mode `{other}`")),
        }
    }
}

/// Largest accepted `max_queue_depth`. Run queues preallocate every slot.
pub const MAX_QUEUE_DEPTH: usize = 1 << 20;

/// Per-loop tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Maximum queued tasks before `spawn` rejects work.
    pub max_queue_depth: usize,
    /// Maximum tasks run by a single `run_once` turn.
    pub turn_budget: usize,
    /// Longest an idle driver parks before re-checking the loop, in milliseconds.
    pub idle_wait_ms: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_queue_depth: 1024,
            turn_budget: 32,
            idle_wait_ms: 50,
        }
    }
}

impl LoopConfig {
    /// Idle parking interval as a `Duration`.
    #[must_use]
    pub const fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms)
    }

    /// Validate loop configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_queue_depth == 0 {
            return Err("max_queue_depth must be greater than 0".into());
        }
        if self.max_queue_depth > MAX_QUEUE_DEPTH {
            return Err(format!("max_queue_depth must be at most {MAX_QUEUE_DEPTH}"));
        }
        if self.turn_budget == 0 {
            return Err("turn_budget must be greater than 0".into());
        }
        if self.idle_wait_ms == 0 {
            return Err("idle_wait_ms must be greater than 0".into());
        }
        Ok(())
    }
}

/// Settings shared by every launcher a factory builds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LauncherConfig {
    /// Execution strategy.
    #[serde(default)]
    pub mode: ExecutionMode,
    /// Prefix for launcher thread names.
    #[serde(default = "default_thread_prefix")]
    pub thread_name_prefix: String,
    /// Stack size for launcher threads; platform default when unset.
    #[serde(default)]
    pub thread_stack_size: Option<usize>,
    /// Loop tuning.
    #[serde(default, rename = "loop")]
    pub sched_loop: LoopConfig,
}

fn default_thread_prefix() -> String {
    "sched".into()
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::default(),
            thread_name_prefix: default_thread_prefix(),
            thread_stack_size: None,
            sched_loop: LoopConfig::default(),
        }
    }
}

impl LauncherConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the execution mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the thread name prefix.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set the launcher thread stack size.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = Some(bytes);
        self
    }

    /// Set the run queue depth.
    #[must_use]
    pub const fn with_max_queue_depth(mut self, depth: usize) -> Self {
        self.sched_loop.max_queue_depth = depth;
        self
    }

    /// Set the per-turn task budget.
    #[must_use]
    pub const fn with_turn_budget(mut self, budget: usize) -> Self {
        self.sched_loop.turn_budget = budget;
        self
    }

    /// Set the idle parking interval.
    #[must_use]
    pub const fn with_idle_wait_ms(mut self, ms: u64) -> Self {
        self.sched_loop.idle_wait_ms = ms;
        self
    }

    /// Validate launcher configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.thread_name_prefix.is_empty() {
            return Err("thread_name_prefix must not be empty".into());
        }
        if self.thread_name_prefix.contains('\0') {
            return Err("thread_name_prefix must not contain NUL".into());
        }
        if self.thread_stack_size == Some(0) {
            return Err("thread_stack_size must be greater than 0".into());
        }
        self.sched_loop.validate()
    }
}

/// Root runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Loops created per scheduler when the caller does not say otherwise.
    #[serde(default = "default_threads")]
    pub default_threads: usize,
    /// Launcher settings; the mode here picks the single active factory.
    #[serde(default)]
    pub launcher: LauncherConfig,
}

fn default_threads() -> usize {
    num_cpus::get().max(1)
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_threads: default_threads(),
            launcher: LauncherConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Create a configuration for the given mode, other settings default.
    #[must_use]
    pub fn with_mode(mode: ExecutionMode) -> Self {
        Self {
            launcher: LauncherConfig::new().with_mode(mode),
            ..Self::default()
        }
    }

    /// Set the default loops per scheduler.
    #[must_use]
    pub const fn with_default_threads(mut self, threads: usize) -> Self {
        self.default_threads = threads;
        self
    }

    /// Replace the launcher settings.
    #[must_use]
    pub fn with_launcher(mut self, launcher: LauncherConfig) -> Self {
        self.launcher = launcher;
        self
    }

    /// Validate all settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.default_threads == 0 {
            return Err("default_threads must be greater than 0".into());
        }
        self.launcher
            .validate()
            .map_err(|e| format!("launcher invalid: {e}"))
    }

    /// Parse runtime configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the environment, loading `.env` first if present.
    ///
    /// Unset variables keep their defaults. Recognized variables:
    /// `SCHED_LAUNCH_MODE`, `SCHED_THREADS`, `SCHED_QUEUE_DEPTH`,
    /// `SCHED_TURN_BUDGET`, `SCHED_IDLE_WAIT_MS`, `SCHED_THREAD_STACK_SIZE`,
    /// `SCHED_THREAD_PREFIX`.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(mode) = lookup("SCHED_LAUNCH_MODE") {
            cfg.launcher.mode = mode.parse()?;
        }
        if let Some(threads) = parse_var(&lookup, "SCHED_THREADS")? {
            cfg.default_threads = threads;
        }
        if let Some(depth) = parse_var(&lookup, "SCHED_QUEUE_DEPTH")? {
            cfg.launcher.sched_loop.max_queue_depth = depth;
        }
        if let Some(budget) = parse_var(&lookup, "SCHED_TURN_BUDGET")? {
            cfg.launcher.sched_loop.turn_budget = budget;
        }
        if let Some(ms) = parse_var(&lookup, "SCHED_IDLE_WAIT_MS")? {
            cfg.launcher.sched_loop.idle_wait_ms = ms;
        }
        if let Some(bytes) = parse_var(&lookup, "SCHED_THREAD_STACK_SIZE")? {
            cfg.launcher.thread_stack_size = Some(bytes);
        }
        if let Some(prefix) = lookup("SCHED_THREAD_PREFIX") {
            cfg.launcher.thread_name_prefix = prefix;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, String>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| format!("{key}: cannot parse `{raw}`: {e}"))
        })
        .transpose()
}
