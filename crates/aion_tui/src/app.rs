//! TUI application core.
//!
//! [`TuiApp`] owns the simulation kernel (if in simulation mode), waveform
//! data, and TUI state. It provides the main event loop and coordinates
//! simulation stepping with UI rendering. In viewer mode, the kernel is
//! absent and only pre-loaded waveform data is displayed.

use aion_common::Interner;
use aion_ir::Design;
use aion_sim::interactive::{format_value, SimCommand};
use aion_sim::kernel::StepResult;
use aion_sim::{SimError, SimKernel};

use crate::commands::{parse_tui_command, TuiCommand};
use crate::state::{FocusedPanel, InputMode, TuiState};
use crate::waveform_data::WaveformData;

/// Cached information about a simulation signal.
#[derive(Clone, Debug)]
pub struct SignalInfo {
    /// Signal identifier in the simulation kernel.
    pub id: aion_sim::SimSignalId,
    /// Hierarchical signal name.
    pub name: String,
    /// Bit width of the signal.
    pub width: u32,
}

/// Operating mode for the TUI application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TuiMode {
    /// Live simulation with a kernel — stepping and running are available.
    Simulation,
    /// Read-only viewer for pre-loaded waveform data — no kernel present.
    Viewer,
}

/// The core TUI application state.
///
/// Owns the simulation kernel (if in simulation mode), waveform history,
/// and UI state. Provides methods for stepping the simulation, handling
/// key events, and executing commands. In viewer mode, simulation commands
/// are unavailable and only waveform navigation is supported.
pub struct TuiApp {
    /// The simulation kernel, present only in simulation mode.
    pub kernel: Option<SimKernel>,
    /// The current operating mode.
    pub mode: TuiMode,
    /// Waveform value change history.
    pub waveform: WaveformData,
    /// UI state (viewport, selection, mode, etc.).
    pub state: TuiState,
    /// Cached signal info: (id, name, width) for each signal.
    pub signal_info: Vec<SignalInfo>,
    /// Whether the simulation is initialized.
    pub initialized: bool,
    /// Whether the application should quit.
    pub should_quit: bool,
}

impl TuiApp {
    /// Creates a new TUI application from an elaborated design.
    ///
    /// The `interner` is used to resolve interned signal names.
    pub fn new(design: &Design, interner: &Interner) -> Result<Self, SimError> {
        let kernel = SimKernel::new(design, interner)?;
        let raw_signals = kernel.all_signals();
        let mut waveform = WaveformData::new();

        let signal_info: Vec<SignalInfo> = raw_signals
            .iter()
            .map(|(id, name, width)| {
                waveform.register(*id, name.to_string(), *width);
                SignalInfo {
                    id: *id,
                    name: name.to_string(),
                    width: *width,
                }
            })
            .collect();

        let state = TuiState::new(signal_info.len());

        Ok(Self {
            kernel: Some(kernel),
            mode: TuiMode::Simulation,
            waveform,
            state,
            signal_info,
            initialized: false,
            should_quit: false,
        })
    }

    /// Creates a TUI application in viewer mode from pre-loaded waveform data.
    ///
    /// No simulation kernel is created. Simulation commands (step, run, etc.)
    /// are unavailable; only waveform navigation and inspection are supported.
    pub fn from_waveform(waveform: WaveformData, signal_info: Vec<SignalInfo>) -> Self {
        let state = TuiState::new(signal_info.len());
        Self {
            kernel: None,
            mode: TuiMode::Viewer,
            waveform,
            state,
            signal_info,
            initialized: true,
            should_quit: false,
        }
    }

    /// Initializes the simulation kernel.
    ///
    /// Must be called once before stepping. Records the initial signal values.
    /// No-op in viewer mode.
    pub fn initialize(&mut self) -> Result<(), SimError> {
        if self.initialized {
            return Ok(());
        }
        if let Some(ref mut kernel) = self.kernel {
            kernel.initialize()?;
        }
        self.initialized = true;
        self.snapshot_signals();

        // Collect initial display output
        if let Some(ref mut kernel) = self.kernel {
            let output = kernel.take_display_output();
            self.state.display_output.extend(output);
        }
        Ok(())
    }

    /// Advances the simulation to the next meaningful time point and records signal values.
    ///
    /// Uses `run_until()` to process both events and suspended process wakeups,
    /// ensuring delay-based scheduling is honored.
    ///
    /// Returns an error in viewer mode since no simulation kernel is present.
    pub fn step(&mut self) -> Result<StepResult, SimError> {
        let kernel = self.kernel.as_mut().ok_or_else(|| SimError::Other {
            message: "not available in viewer mode".into(),
        })?;

        let result = if let Some(next_t) = kernel.next_event_time_fs() {
            kernel.run_until(next_t)?
        } else {
            StepResult::Done
        };
        self.snapshot_signals();

        // Collect display output
        let output = self.kernel.as_mut().unwrap().take_display_output();
        self.state.display_output.extend(output);

        Ok(result)
    }

    /// Runs the simulation for the given duration in femtoseconds.
    ///
    /// Steps through each event time up to the target, snapshotting signal
    /// values at every event so that the waveform captures all intermediate
    /// transitions (clock toggles, counter increments, etc.).
    ///
    /// Returns an error in viewer mode.
    pub fn run_for(&mut self, duration_fs: u64) -> Result<(), SimError> {
        if self.kernel.is_none() {
            return Err(SimError::Other {
                message: "not available in viewer mode".into(),
            });
        }
        let target_fs = self.kernel.as_ref().unwrap().current_time().fs + duration_fs;

        loop {
            let kernel = self.kernel.as_mut().unwrap();
            if kernel.is_finished() {
                break;
            }
            let next_t = match kernel.next_event_time_fs() {
                Some(t) if t <= target_fs => t,
                _ => break,
            };
            kernel.run_until(next_t)?;
            self.snapshot_signals();
        }

        // Advance time to target even if no more events
        {
            let kernel = self.kernel.as_mut().unwrap();
            if kernel.current_time().fs < target_fs && !kernel.is_finished() {
                kernel.run_until(target_fs)?;
            }
        }
        self.snapshot_signals();

        let kernel = self.kernel.as_mut().unwrap();
        let output = kernel.take_display_output();
        self.state.display_output.extend(output);

        Ok(())
    }

    /// Returns the formatted value of a signal at the current cursor time.
    ///
    /// Looks up the value from the waveform history at `cursor_fs` so the
    /// signal list panel shows the value at the cursor, not the final sim
    /// time. Falls back to the kernel's current value when no waveform data
    /// exists yet (simulation mode only).
    pub fn signal_value_str(&self, signal_idx: usize) -> String {
        // Try waveform history at cursor time first
        if let Some(history) = self.waveform.signals.get(signal_idx) {
            if let Some(val) = history.value_at(self.state.cursor_fs) {
                return format_value(val);
            }
        }
        // Fall back to current kernel value (simulation mode only)
        if let Some(ref kernel) = self.kernel {
            if let Some(info) = self.signal_info.get(signal_idx) {
                let val = kernel.signal_value(info.id);
                return format_value(val);
            }
        }
        "?".into()
    }

    /// Returns the current simulation time as a formatted string.
    ///
    /// In viewer mode, shows the cursor time or waveform max time.
    pub fn time_str(&self) -> String {
        if let Some(ref kernel) = self.kernel {
            format!("{}", kernel.current_time())
        } else {
            format!("{}", aion_sim::SimTime::from_fs(self.state.cursor_fs))
        }
    }

    /// Returns whether the simulation is finished.
    ///
    /// In viewer mode, always returns `true`.
    pub fn is_finished(&self) -> bool {
        self.kernel.as_ref().is_none_or(|k| k.is_finished())
    }

    /// Returns whether the simulation has pending events.
    ///
    /// In viewer mode, always returns `false`.
    pub fn has_pending_events(&self) -> bool {
        self.kernel.as_ref().is_some_and(|k| k.has_pending_events())
    }

    /// Executes a TUI command.
    pub fn execute_command(&mut self, input: &str) -> Result<String, String> {
        let cmd = parse_tui_command(input)?;
        match cmd {
            TuiCommand::Sim(sim_cmd) => self.execute_sim_command(&sim_cmd),
            TuiCommand::ZoomIn => {
                self.state.viewport.zoom_in(self.state.cursor_fs);
                Ok("Zoomed in".into())
            }
            TuiCommand::ZoomOut => {
                self.state.viewport.zoom_out(self.state.cursor_fs);
                Ok("Zoomed out".into())
            }
            TuiCommand::ZoomFit => {
                let max_t = self.waveform.max_time();
                let kernel_t = self.kernel.as_ref().map_or(0, |k| k.current_time().fs);
                self.state.viewport.fit(max_t.max(kernel_t));
                Ok("Fit to simulation range".into())
            }
            TuiCommand::Goto { time_fs } => {
                self.state.cursor_fs = time_fs;
                Ok(format!("Cursor at {}", aion_sim::SimTime::from_fs(time_fs)))
            }
            TuiCommand::AddSignal { name } => self.add_signal_to_waveform(&name),
            TuiCommand::RemoveSignal { name } => self.remove_signal_from_waveform(&name),
            TuiCommand::CycleFormat => {
                self.state.value_format = self.state.value_format.cycle();
                Ok(format!("Format: {:?}", self.state.value_format))
            }
            TuiCommand::ToggleHelp => {
                self.state.show_help = !self.state.show_help;
                Ok(String::new())
            }
        }
    }

    /// Executes a simulation command and returns a status message.
    fn execute_sim_command(&mut self, cmd: &SimCommand) -> Result<String, String> {
        if self.mode == TuiMode::Viewer {
            return match cmd {
                SimCommand::Quit => {
                    self.should_quit = true;
                    Ok("Quitting".into())
                }
                SimCommand::Help => Ok(help_text()),
                SimCommand::Signals => {
                    let mut s = format!("{} signal(s):\n", self.signal_info.len());
                    for info in &self.signal_info {
                        s.push_str(&format!("  {} [{} bit]\n", info.name, info.width));
                    }
                    Ok(s.trim_end().to_string())
                }
                SimCommand::Time => Ok(format!("Time: {}", self.time_str())),
                SimCommand::Inspect { signals } => {
                    let mut output = String::new();
                    for name in signals {
                        let mut found = false;
                        for (i, info) in self.signal_info.iter().enumerate() {
                            if info.name == *name || info.name.ends_with(&format!(".{name}")) {
                                let val_str = self.signal_value_str(i);
                                output.push_str(&format!("{} = {val_str}\n", info.name));
                                found = true;
                                break;
                            }
                        }
                        if !found {
                            output.push_str(&format!("Signal not found: {name}\n"));
                        }
                    }
                    Ok(output.trim_end().to_string())
                }
                _ => Err("not available in viewer mode".into()),
            };
        }

        match cmd {
            SimCommand::Run { duration_fs } => {
                self.run_for(*duration_fs).map_err(|e| e.to_string())?;
                Ok(format!("Ran to {}", self.time_str()))
            }
            SimCommand::Step => {
                let result = self.step().map_err(|e| e.to_string())?;
                match result {
                    StepResult::Continued => Ok(format!("Stepped to {}", self.time_str())),
                    StepResult::Done => Ok("Simulation finished".into()),
                }
            }
            SimCommand::Inspect { signals } => {
                let kernel = self.kernel.as_ref().unwrap();
                let mut output = String::new();
                for name in signals {
                    match kernel.find_signal(name) {
                        Some(id) => {
                            let val = kernel.signal_value(id);
                            output.push_str(&format!("{name} = {}\n", format_value(val)));
                        }
                        None => {
                            output.push_str(&format!("Signal not found: {name}\n"));
                        }
                    }
                }
                Ok(output.trim_end().to_string())
            }
            SimCommand::Time => Ok(format!("Time: {}", self.time_str())),
            SimCommand::Signals => {
                let mut s = format!("{} signal(s):\n", self.signal_info.len());
                for info in &self.signal_info {
                    s.push_str(&format!("  {} [{} bit]\n", info.name, info.width));
                }
                Ok(s.trim_end().to_string())
            }
            SimCommand::Quit => {
                self.should_quit = true;
                Ok("Quitting".into())
            }
            SimCommand::Help => Ok(help_text()),
            SimCommand::Status => {
                let finished = self.is_finished();
                Ok(format!(
                    "Time: {}\nSignals: {}\nFinished: {finished}",
                    self.time_str(),
                    self.signal_info.len(),
                ))
            }
            SimCommand::Continue => {
                while !self.is_finished() && self.has_pending_events() {
                    let result = self.step().map_err(|e| e.to_string())?;
                    if result == StepResult::Done {
                        break;
                    }
                }
                Ok(format!("Continued to {}", self.time_str()))
            }
            _ => Ok("Command not yet supported in TUI".into()),
        }
    }

    /// Toggles bus expansion for the currently selected signal.
    ///
    /// Only multi-bit signals can be expanded. When expanded, individual
    /// bit traces are shown below the bus in the waveform panel.
    pub fn toggle_expand(&mut self) {
        let idx = self.state.selected_signal;
        if let Some(info) = self.signal_info.get(idx) {
            if info.width > 1 && !self.state.expanded_signals.remove(&idx) {
                self.state.expanded_signals.insert(idx);
            }
        }
    }

    /// Returns the formatted value of a single bit at the current cursor time.
    pub fn bit_value_str(&self, signal_idx: usize, bit: u32) -> String {
        if let Some(history) = self.waveform.signals.get(signal_idx) {
            if let Some(logic) = history.bit_value_at(self.state.cursor_fs, bit) {
                return match logic {
                    aion_common::Logic::Zero => "0",
                    aion_common::Logic::One => "1",
                    aion_common::Logic::X => "x",
                    aion_common::Logic::Z => "z",
                }
                .into();
            }
        }
        "?".into()
    }

    /// Snapshots current signal values into waveform data.
    fn snapshot_signals(&mut self) {
        if let Some(ref kernel) = self.kernel {
            let time_fs = kernel.current_time().fs;
            for (i, info) in self.signal_info.iter().enumerate() {
                let val = kernel.signal_value(info.id).clone();
                self.waveform.record(i, time_fs, val);
            }
        }
    }

    /// Adds a signal to the waveform display by name pattern.
    fn add_signal_to_waveform(&mut self, name: &str) -> Result<String, String> {
        let mut added = 0;
        for (i, info) in self.signal_info.iter().enumerate() {
            if info.name.contains(name) && !self.state.waveform_signals.contains(&i) {
                self.state.waveform_signals.push(i);
                added += 1;
            }
        }
        if added > 0 {
            Ok(format!("Added {added} signal(s)"))
        } else {
            Err(format!("No matching signal found for '{name}'"))
        }
    }

    /// Removes a signal from the waveform display by name pattern.
    fn remove_signal_from_waveform(&mut self, name: &str) -> Result<String, String> {
        let before = self.state.waveform_signals.len();
        self.state.waveform_signals.retain(|&i| {
            self.signal_info
                .get(i)
                .is_none_or(|info| !info.name.contains(name))
        });
        let removed = before - self.state.waveform_signals.len();
        if removed > 0 {
            Ok(format!("Removed {removed} signal(s)"))
        } else {
            Err(format!("No matching signal in waveform for '{name}'"))
        }
    }

    /// Handles a key event in normal mode.
    pub fn handle_normal_key(&mut self, key: crossterm::event::KeyCode) {
        use crossterm::event::KeyCode;
        match key {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next_signal(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev_signal(),
            KeyCode::Char('h') | KeyCode::Left => self.state.viewport.scroll_left(),
            KeyCode::Char('l') | KeyCode::Right => self.state.viewport.scroll_right(),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.state.viewport.zoom_in(self.state.cursor_fs);
            }
            KeyCode::Char('-') => {
                self.state.viewport.zoom_out(self.state.cursor_fs);
            }
            KeyCode::Char(' ') => {
                if self.mode == TuiMode::Simulation {
                    let _ = self.step();
                } else {
                    self.state.status_message = "Viewer mode: simulation not available".into();
                }
            }
            KeyCode::Char(':') => {
                self.state.mode = InputMode::Command;
                self.state.command_buffer.clear();
            }
            KeyCode::Char('?') => {
                self.state.show_help = !self.state.show_help;
            }
            KeyCode::Char('e') => {
                self.toggle_expand();
            }
            KeyCode::Char('d') => {
                self.state.value_format = self.state.value_format.cycle();
            }
            KeyCode::Char('f') => {
                let max_t = self.waveform.max_time();
                let kernel_t = self.kernel.as_ref().map_or(0, |k| k.current_time().fs);
                self.state.viewport.fit(max_t.max(kernel_t));
            }
            KeyCode::Enter => {
                self.state.toggle_waveform_signal();
            }
            KeyCode::Tab => {
                self.state.focused = match self.state.focused {
                    FocusedPanel::SignalList => FocusedPanel::Waveform,
                    FocusedPanel::Waveform => FocusedPanel::CommandInput,
                    FocusedPanel::CommandInput => FocusedPanel::SignalList,
                };
            }
            _ => {}
        }
    }

    /// Handles a key event in command mode.
    pub fn handle_command_key(&mut self, key: crossterm::event::KeyCode) {
        use crossterm::event::KeyCode;
        match key {
            KeyCode::Esc => {
                self.state.mode = InputMode::Normal;
                self.state.command_buffer.clear();
            }
            KeyCode::Enter => {
                let cmd = self.state.command_buffer.clone();
                self.state.mode = InputMode::Normal;
                self.state.command_buffer.clear();
                if !cmd.is_empty() {
                    match self.execute_command(&cmd) {
                        Ok(msg) => {
                            if !msg.is_empty() {
                                self.state.status_message = msg;
                            }
                        }
                        Err(err) => {
                            self.state.status_message = format!("Error: {err}");
                        }
                    }
                }
            }
            KeyCode::Backspace => {
                self.state.command_buffer.pop();
            }
            KeyCode::Char(c) => {
                self.state.command_buffer.push(c);
            }
            _ => {}
        }
    }
}

/// Returns the help text for the TUI.
fn help_text() -> String {
    "\
Navigation:
  j/k  or ↑/↓   Select signal
  h/l  or ←/→   Scroll waveform
  +/-            Zoom in/out
  f              Fit to time range
  Space          Step simulation
  Enter          Toggle signal in waveform
  e              Expand/collapse bus bits
  Tab            Switch panel focus
  d              Cycle value format (hex/bin/dec)
  ?              Toggle help
  :              Enter command mode
  q              Quit

Commands:
  run <dur>      Run for duration (e.g., 'run 100ns')
  step (s)       Single delta step
  continue (c)   Run to completion
  goto <time>    Jump cursor to time
  zoomin/zo      Zoom in/out
  fit            Fit viewport
  add <signal>   Add signal to waveform
  rm <signal>    Remove signal from waveform
  fmt            Cycle value format
  quit (q)       Exit"
        .to_string()
}
