//! The configuration manager: owns the schema tree, the published value,
//! and the reload pipeline.
//!
//! Construction compiles the schema, performs the first resolution (a
//! failure aborts construction), then optionally starts the file watcher.
//! Reloads re-resolve off-lock and swap the published value only on
//! success, so readers always see the last good configuration.

use arc_swap::ArcSwapOption;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::error::{ConfigError, RenderError};
use crate::notifier::{ChangeNotifier, ConfigUpdate};
use crate::render::{
    EnvHelpFormat, EnvHelpStyle, TemplateStyle, render_env_help, render_template,
};
use crate::resolve::{EnvSource, OsEnv, resolve};
use crate::schema::{Describe, SchemaTree};
use crate::watcher::{FileEvent, WatcherConfig, start_file_watcher};

/// Config file location used when none is given.
pub const DEFAULT_CONFIG_PATH: &str = "./config.yml";

/// Optional self-check for configuration types, run once per successful
/// merge, before the value is published. A rejection aborts that resolution
/// attempt; the previously published value stays current.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

type Validator<T> = Box<dyn Fn(&T) -> Result<(), String> + Send + Sync>;
type ErrorHandler = Box<dyn Fn(&ConfigError) + Send + Sync>;

struct Shared<T> {
    tree: SchemaTree,
    path: PathBuf,
    file_required: bool,
    env: Box<dyn EnvSource + Send + Sync>,
    current: ArcSwapOption<T>,
    notifier: ChangeNotifier<T>,
    validator: Option<Validator<T>>,
    error_handler: ErrorHandler,
}

/// Loads, publishes, and hot-reloads a configuration of type `T`.
pub struct ConfigManager<T> {
    shared: Arc<Shared<T>>,
    _watch_task: Option<tokio::task::JoinHandle<()>>,
}

impl<T> std::fmt::Debug for ConfigManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigManager").finish_non_exhaustive()
    }
}

impl<T> ConfigManager<T>
where
    T: Describe + DeserializeOwned + Send + Sync + 'static,
{
    pub fn builder() -> ConfigManagerBuilder<T> {
        ConfigManagerBuilder::new()
    }

    /// The current configuration.
    ///
    /// Panics if called before the first successful resolution, which
    /// cannot happen for a manager obtained from
    /// [`ConfigManagerBuilder::build`].
    pub fn config(&self) -> Arc<T> {
        self.shared
            .current
            .load_full()
            .expect("configuration accessed before first successful resolution")
    }

    /// Re-resolve from all sources.
    ///
    /// On success the new value is swapped in and subscribers are notified;
    /// on failure the previous value stays current.
    pub fn reload(&self) -> Result<Arc<T>, ConfigError> {
        Self::resolve_and_publish(&self.shared)
    }

    /// Receive `{old, new}` events for every published replacement.
    ///
    /// The subscription lives until `cancel` completes; its channel buffers
    /// at most one pending event.
    pub fn subscribe(
        &self,
        cancel: impl Future<Output = ()> + Send + 'static,
    ) -> mpsc::Receiver<ConfigUpdate<T>> {
        self.shared.notifier.subscribe(cancel)
    }

    /// The compiled schema tree.
    pub fn schema(&self) -> &SchemaTree {
        &self.shared.tree
    }

    /// Render an annotated YAML template of the configuration shape.
    pub fn template(&self, include_help: bool) -> Result<String, RenderError> {
        render_template(&self.shared.tree, include_help, &TemplateStyle::default())
    }

    /// Render environment-variable documentation.
    pub fn env_help(&self, format: EnvHelpFormat) -> Result<String, RenderError> {
        render_env_help(&self.shared.tree, format, &EnvHelpStyle::default())
    }

    fn resolve_and_publish(shared: &Shared<T>) -> Result<Arc<T>, ConfigError> {
        let next: T = resolve(
            &shared.tree,
            &shared.path,
            shared.file_required,
            shared.env.as_ref(),
        )?;
        if let Some(validator) = &shared.validator {
            validator(&next).map_err(ConfigError::Validation)?;
        }
        let next = Arc::new(next);
        let previous = shared.current.swap(Some(Arc::clone(&next)));
        if let Some(previous) = previous {
            shared.notifier.publish(ConfigUpdate {
                old: previous,
                new: Arc::clone(&next),
            });
        }
        Ok(next)
    }
}

/// Builder for [`ConfigManager`].
pub struct ConfigManagerBuilder<T> {
    path: PathBuf,
    file_required: bool,
    env: Box<dyn EnvSource + Send + Sync>,
    validator: Option<Validator<T>>,
    error_handler: ErrorHandler,
    watch: bool,
    watcher: WatcherConfig,
}

impl<T> ConfigManagerBuilder<T>
where
    T: Describe + DeserializeOwned + Send + Sync + 'static,
{
    fn new() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_CONFIG_PATH),
            file_required: true,
            env: Box::new(OsEnv),
            validator: None,
            error_handler: Box::new(|err| error!("config error: {err}")),
            watch: true,
            watcher: WatcherConfig::default(),
        }
    }

    /// Path of the config file (default `./config.yml`).
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Tolerate a missing config file and resolve from defaults and
    /// environment only.
    pub fn optional_file(mut self) -> Self {
        self.file_required = false;
        self
    }

    /// Replace the environment reader. Tests inject fixed maps here.
    pub fn env_source(mut self, env: impl EnvSource + Send + Sync + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    /// Install a validation hook run after every successful merge.
    pub fn validator(
        mut self,
        validator: impl Fn(&T) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Use the type's own [`Validate`] implementation as the hook.
    pub fn validate(self) -> Self
    where
        T: Validate,
    {
        self.validator(|config: &T| config.validate())
    }

    /// Handler invoked when a watcher-triggered reload fails. Defaults to
    /// logging the error.
    pub fn on_error(mut self, handler: impl Fn(&ConfigError) + Send + Sync + 'static) -> Self {
        self.error_handler = Box::new(handler);
        self
    }

    /// Enable or disable file watching (default: enabled).
    pub fn watch(mut self, enabled: bool) -> Self {
        self.watch = enabled;
        self
    }

    /// Debounce window for the file watcher.
    pub fn debounce(mut self, window: Duration) -> Self {
        self.watcher.debounce = window;
        self
    }

    /// Compile the schema, resolve the initial configuration, and start the
    /// watcher.
    ///
    /// Must be called within a tokio runtime when watching is enabled.
    pub fn build(self) -> Result<ConfigManager<T>, ConfigError> {
        let tree = SchemaTree::of::<T>()?;
        let shared = Arc::new(Shared {
            tree,
            path: self.path,
            file_required: self.file_required,
            env: self.env,
            current: ArcSwapOption::empty(),
            notifier: ChangeNotifier::new(),
            validator: self.validator,
            error_handler: self.error_handler,
        });

        ConfigManager::resolve_and_publish(&shared)?;

        let watch_task = if self.watch {
            let mut handle = start_file_watcher(shared.path.clone(), self.watcher)?;
            let shared = Arc::clone(&shared);
            Some(tokio::spawn(async move {
                while let Some(event) = handle.next_event().await {
                    match event {
                        FileEvent::Changed(path) => {
                            match ConfigManager::resolve_and_publish(&shared) {
                                Ok(_) => {
                                    info!(path = %path.display(), "configuration reloaded");
                                }
                                Err(err) => (shared.error_handler)(&err),
                            }
                        }
                        FileEvent::Error(message) => {
                            error!("config watcher error: {message}");
                        }
                    }
                }
            }))
        } else {
            None
        };

        Ok(ConfigManager {
            shared,
            _watch_task: watch_task,
        })
    }
}
