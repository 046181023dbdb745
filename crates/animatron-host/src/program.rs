//! Per-tick program
//!
//! The host calls [`Program::tick`] once per tick with the invocation
//! argument. An empty argument just continues the animation; control
//! commands rebuild the setup or drive a recording session, and anything
//! else is matched against `ARGUMENT_<X>` triggers.

use animatron_core::search::blocks_of_type;
use animatron_core::{
    BlockDirectory, BlockRef, Capability, ConfigStore, ControllerInput, InputCalibration,
    RawInput, Recorder, Sequencer,
};
use animatron_script::{Error, Loader, Settings};

/// Rebuild settings and animation from configuration
pub const SETUP: &str = "SETUP";
/// Prefix of `RECORD;<segment>;<mode>`
pub const RECORD_PREFIX: &str = "RECORD;";
/// Record the changes since the last snapshot
pub const RECORD_STEPS: &str = "RECORD_STEPS";
/// Write the recording into the configuration and set up again
pub const RECORDING_DONE: &str = "RECORDING_DONE";

pub const RECORD_USAGE: &str =
    "Animation recording mode argument must contain segment and mode, e.g. RECORD;legs;moveForward";
pub const ALREADY_RECORDING: &str = "Already recording, please call RECORDING_DONE if finished or RECORD_STEPS to snapshot current changes.";
pub const NO_SEGMENTS: &str = "No animation segments are configured.";
pub const ACTIVE_STEPS: &str = "Active animation steps:";

/// Status header shown above every status text
pub fn header() -> String {
    format!(
        "Animatron Sequencer\nVersion {}\n\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Outcome of the last setup
#[derive(Debug)]
enum SetupState {
    Ready(Sequencer),
    Failed(Error),
}

/// The sequencer bound to a host grid
pub struct Program<D: BlockDirectory> {
    /// The block running the program; holds the main configuration
    me: BlockRef,
    directory: D,
    state: SetupState,
    calibration: InputCalibration,
    controller: Option<BlockRef>,
    surface: Option<BlockRef>,
    recorder: Option<Recorder>,
}

impl<D: BlockDirectory> Program<D> {
    /// Create a program and run the initial setup
    pub fn new(me: BlockRef, directory: D) -> Self {
        let mut program = Self {
            me,
            directory,
            state: SetupState::Ready(Sequencer::new(Default::default())),
            calibration: InputCalibration::default(),
            controller: None,
            surface: None,
            recorder: None,
        };
        program.setup();
        program
    }

    // === Accessors ===

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// The running sequencer, `None` after a failed setup
    pub fn sequencer(&self) -> Option<&Sequencer> {
        match &self.state {
            SetupState::Ready(sequencer) => Some(sequencer),
            SetupState::Failed(_) => None,
        }
    }

    /// Error of the last setup, if it failed
    pub fn setup_error(&self) -> Option<&Error> {
        match &self.state {
            SetupState::Ready(_) => None,
            SetupState::Failed(error) => Some(error),
        }
    }

    pub fn recorder(&self) -> Option<&Recorder> {
        self.recorder.as_ref()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    // === Setup ===

    /// Reload configuration and rebuild all runtime state
    pub fn setup(&mut self) {
        log::info!("setting up animation...");
        let settings = Settings::from_config(&ConfigStore::parse(&self.me.custom_data()));
        self.surface = self.find_surface(settings.surface.as_deref());

        let loaded = Loader::new(&self.directory).load(&self.me);
        match loaded {
            Ok(setup) => {
                self.calibration = InputCalibration::new(setup.settings.input);
                self.controller = self.find_controller(setup.settings.controller.as_deref());
                self.state = SetupState::Ready(Sequencer::new(setup.animation));
                log::info!("animation setup completed");
            }
            Err(error) => {
                log::error!("animation setup failed: {error}");
                self.state = SetupState::Failed(error);
            }
        }
    }

    fn find_controller(&self, name: Option<&str>) -> Option<BlockRef> {
        if let Some(name) = name {
            let named = self
                .directory
                .block_with_name(name)
                .filter(|block| block.controller().is_some());
            if named.is_some() {
                return named;
            }
            log::warn!("controller '{name}' not found, looking for another one");
        }

        let controllers = blocks_of_type(&self.directory, Capability::Controller);
        let main = controllers
            .iter()
            .find(|block| block.controller().is_some_and(|c| c.is_main()))
            .cloned();
        main.or_else(|| controllers.into_iter().next())
    }

    fn find_surface(&self, name: Option<&str>) -> Option<BlockRef> {
        if let Some(name) = name {
            let named = self
                .directory
                .block_with_name(name)
                .filter(|block| block.surface().is_some());
            if named.is_some() {
                return named;
            }
            log::warn!("surface '{name}' not found, using the program's own");
        }
        Some(self.me.clone()).filter(|me| me.surface().is_some())
    }

    // === Tick ===

    /// Run one tick, returning the status text that was displayed
    pub fn tick(&mut self, argument: &str) -> String {
        let mut status = header();

        if argument == SETUP {
            self.setup();
        }

        if argument.starts_with(RECORD_PREFIX) {
            let parts: Vec<&str> = argument.split(';').collect();
            if parts.len() != 3 {
                status.push_str(RECORD_USAGE);
                return self.show(status);
            }
            if self.recorder.is_some() {
                status.push_str(ALREADY_RECORDING);
                return self.show(status);
            }
            self.recorder = Some(Recorder::start(parts[1], parts[2], &self.directory));
        }

        if self.recorder.is_some() {
            if argument == RECORDING_DONE {
                self.finish_recording();
            } else {
                if argument == RECORD_STEPS {
                    if let Some(recorder) = &mut self.recorder {
                        recorder.record_steps();
                    }
                }
                if let Some(recorder) = &self.recorder {
                    status.push_str(&format!(
                        "Recording steps for:\n Segment: {}\n Mode: {}\n Current recorded steps count: {}",
                        recorder.segment(),
                        recorder.mode(),
                        recorder.recorded().len()
                    ));
                }
                // No animation while recording
                return self.show(status);
            }
        }

        let input = self.read_input();
        match &mut self.state {
            SetupState::Failed(error) => {
                status.push_str(&format!("Setup failed: {error}"));
            }
            SetupState::Ready(sequencer) => {
                let report = sequencer.tick(argument, &input);
                if sequencer.animation().is_empty() {
                    status.push_str(NO_SEGMENTS);
                } else {
                    status.push_str(ACTIVE_STEPS);
                    status.push('\n');
                    for line in report.trace_lines() {
                        status.push_str(&line);
                        status.push('\n');
                    }
                }
            }
        }
        self.show(status)
    }

    fn finish_recording(&mut self) {
        let Some(recorder) = self.recorder.take() else {
            return;
        };
        let mut config = ConfigStore::parse(&self.me.custom_data());
        recorder.write(&mut config);
        self.me.set_custom_data(&config.to_string());
        self.setup();
    }

    fn read_input(&mut self) -> ControllerInput {
        let raw = self
            .controller
            .as_ref()
            .and_then(|block| block.controller().map(RawInput::from_controller));
        match raw {
            Some(raw) => self.calibration.read(&raw),
            None => ControllerInput::idle(),
        }
    }

    fn show(&self, status: String) -> String {
        if let Some(surface) = self.surface.as_ref().and_then(|block| block.surface()) {
            surface.write_text(&status);
        }
        status
    }
}
