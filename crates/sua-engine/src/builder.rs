//! Engine builder
//!
//! ```text
//! create ─▶ init(ua, log, media) ─▶ transport (UDP) ─▶ start ─▶ install
//!   │             │                        │              │
//!   └─────────────┴──── any failure ───────┴──────────────┴─▶ destroy,
//!                                                         record "<step> failed."
//! ```

use std::sync::Arc;

use sua_native::{NativeUserAgent, PjStatus, TransportType};
use tracing::{debug, info, warn};

use crate::bridge;
use crate::config::{LoggingConfiguration, MediaConfiguration, TransportConfiguration};
use crate::engine::{Engine, EngineCore};
use crate::events::{EventFilter, EventKind, EventSubscription, LogReceiverHandler};
use crate::translate;

pub const STEP_CREATE: &str = "pjsua create";
pub const STEP_INIT: &str = "pjsua init";
pub const STEP_TRANSPORT: &str = "pjsua transport";
pub const STEP_START: &str = "pjsua start";

/// Collects engine configuration and brings a native user agent up
///
/// Setters replace a whole sub-configuration and never validate; problems
/// surface when [`Builder::create`] runs.
///
/// # Examples
///
/// ```rust
/// use sua_engine::config::{LoggingConfiguration, MediaConfiguration, TransportConfiguration};
/// use sua_engine::Builder;
///
/// let builder = Builder::new()
///     .with_media_configuration(MediaConfiguration::new())
///     .with_logging_configuration(LoggingConfiguration::new().with_console_level(3))
///     .with_transport_configuration(TransportConfiguration::new().with_port(0));
/// assert_eq!(builder.transport_configuration().port, 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    media: MediaConfiguration,
    logging: LoggingConfiguration,
    transport: TransportConfiguration,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_media_configuration(mut self, media: MediaConfiguration) -> Self {
        self.media = media;
        self
    }

    pub fn with_logging_configuration(mut self, logging: LoggingConfiguration) -> Self {
        self.logging = logging;
        self
    }

    pub fn with_transport_configuration(mut self, transport: TransportConfiguration) -> Self {
        self.transport = transport;
        self
    }

    pub fn media_configuration(&self) -> &MediaConfiguration {
        &self.media
    }

    pub fn logging_configuration(&self) -> &LoggingConfiguration {
        &self.logging
    }

    pub fn transport_configuration(&self) -> &TransportConfiguration {
        &self.transport
    }

    /// Bring `native` up and make the result the callback target
    ///
    /// Stops at the first failing step. The returned engine is then invalid:
    /// [`Engine::is_valid`] is false, [`Engine::last_error`] names the step,
    /// and the native engine has been destroyed again. Only one engine can
    /// be running per process; while one is, this fails at the create step
    /// with `EEXISTS` and leaves the running engine alone.
    pub fn create(self, native: Arc<dyn NativeUserAgent>) -> Engine {
        let core = Arc::new(EngineCore::new(native));

        if bridge::is_occupied() {
            warn!("Another engine is already running");
            core.record_failure(STEP_CREATE, PjStatus::EEXISTS);
            return Engine::from_core(core);
        }

        match self.start(&core) {
            Ok(()) => {
                info!("Engine started");
                Engine::from_core(core)
            }
            Err((step, status)) => {
                warn!("{} failed: {}", step, status);
                core.native().destroy();
                core.record_failure(step, status);
                Engine::from_core(core)
            }
        }
    }

    fn start(&self, core: &Arc<EngineCore>) -> Result<(), (&'static str, PjStatus)> {
        let native = core.native();

        native
            .create()
            .into_result()
            .map_err(|status| (STEP_CREATE, status))?;

        let ua_cfg = translate::ua_config(bridge::callbacks());
        let log_cfg = translate::log_config(&self.logging, bridge::log_callback());
        if let Some(receiver) = self.logging.receiver() {
            core.events().subscribe(
                EventSubscription::queued(Arc::new(LogReceiverHandler(receiver.clone())))
                    .with_filter(EventFilter::kinds([EventKind::Log])),
            );
        }
        let media_cfg = translate::media_config(&self.media);

        native
            .init(&ua_cfg, &log_cfg, &media_cfg)
            .into_result()
            .map_err(|status| (STEP_INIT, status))?;

        let transport_cfg = translate::transport_config(&self.transport);
        let transport_id = native
            .transport_create(TransportType::Udp, &transport_cfg)
            .map_err(|status| (STEP_TRANSPORT, status))?;
        debug!("UDP transport {:?} on port {}", transport_id, transport_cfg.port);

        native
            .start()
            .into_result()
            .map_err(|status| (STEP_START, status))?;

        // Another builder may have installed itself since the occupancy check.
        bridge::install(core.clone()).map_err(|status| (STEP_CREATE, status))?;
        core.set_running();
        Ok(())
    }
}
