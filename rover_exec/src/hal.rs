//! # Hardware abstraction layer
//!
//! The HAL provides the rest of the executable with named I/O channels:
//! boolean inputs (buttons), boolean outputs (LEDs), encoder tick counters,
//! and floating point inputs/outputs (attitude signals, motor and servo
//! demands). Channels are declared in `hal.toml` and resolved to opaque
//! copyable handles at startup; an unknown channel name is a configuration
//! error raised before the control cycle starts.
//!
//! This is an in-memory backend: reads and writes through resolved handles
//! cannot fail, and the `set_*`/`add_*` mutators let the simulation and the
//! tests drive the input side.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use thiserror::Error;

// Internal
use util::params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Handle to a named boolean input channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicIn(usize);

/// Handle to a named boolean output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicOut(usize);

/// Handle to a named encoder tick counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encoder(usize);

/// Handle to a named floating point input channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalogIn(usize);

/// Handle to a named floating point output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalogOut(usize);

/// Channel declarations for the HAL.
#[derive(Debug, Default, Deserialize)]
pub struct HalParams {
    pub logic_inputs: Vec<String>,
    pub logic_outputs: Vec<String>,
    pub encoders: Vec<String>,
    pub analog_inputs: Vec<String>,
    pub analog_outputs: Vec<String>,
}

/// The hardware abstraction layer itself.
///
/// Owns the value of every declared channel. There is exactly one `Hal` per
/// execution, constructed in `main` and passed by reference to the components
/// that need it.
pub struct Hal {
    logic_ins: Vec<(String, bool)>,
    logic_outs: Vec<(String, bool)>,
    encoders: Vec<(String, i64)>,
    analog_ins: Vec<(String, f64)>,
    analog_outs: Vec<(String, f64)>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors during HAL initialisation.
#[derive(Debug, Error)]
pub enum HalError {
    #[error("Could not load HAL parameters: {0}")]
    ParamLoadError(#[from] params::LoadError),

    #[error("No {1} channel named {0:?} is declared")]
    UnknownChannel(String, &'static str),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Hal {
    /// Initialise the HAL from the given parameter file.
    pub fn init(params_path: &str) -> Result<Self, HalError> {
        let params: HalParams = params::load(params_path)?;
        Ok(Self::from_params(params))
    }

    /// Build the HAL directly from a set of channel declarations.
    ///
    /// All channels start at `false`/`0`/`0.0`.
    pub fn from_params(params: HalParams) -> Self {
        Hal {
            logic_ins: params.logic_inputs.into_iter().map(|n| (n, false)).collect(),
            logic_outs: params.logic_outputs.into_iter().map(|n| (n, false)).collect(),
            encoders: params.encoders.into_iter().map(|n| (n, 0)).collect(),
            analog_ins: params.analog_inputs.into_iter().map(|n| (n, 0.0)).collect(),
            analog_outs: params.analog_outputs.into_iter().map(|n| (n, 0.0)).collect(),
        }
    }

    // ---- HANDLE RESOLUTION ----

    pub fn logic_input(&self, name: &str) -> Result<LogicIn, HalError> {
        Self::find(&self.logic_ins, name, "logic input").map(LogicIn)
    }

    pub fn logic_output(&self, name: &str) -> Result<LogicOut, HalError> {
        Self::find(&self.logic_outs, name, "logic output").map(LogicOut)
    }

    pub fn encoder(&self, name: &str) -> Result<Encoder, HalError> {
        Self::find(&self.encoders, name, "encoder").map(Encoder)
    }

    pub fn analog_input(&self, name: &str) -> Result<AnalogIn, HalError> {
        Self::find(&self.analog_ins, name, "analog input").map(AnalogIn)
    }

    pub fn analog_output(&self, name: &str) -> Result<AnalogOut, HalError> {
        Self::find(&self.analog_outs, name, "analog output").map(AnalogOut)
    }

    // ---- CHANNEL ACCESS ----

    pub fn read_logic_in(&self, handle: LogicIn) -> bool {
        self.logic_ins[handle.0].1
    }

    pub fn write_logic_out(&mut self, handle: LogicOut, value: bool) {
        self.logic_outs[handle.0].1 = value;
    }

    /// Read back the last value written to a logic output.
    pub fn logic_out_value(&self, handle: LogicOut) -> bool {
        self.logic_outs[handle.0].1
    }

    pub fn encoder_ticks(&self, handle: Encoder) -> i64 {
        self.encoders[handle.0].1
    }

    pub fn read_analog_in(&self, handle: AnalogIn) -> f64 {
        self.analog_ins[handle.0].1
    }

    pub fn write_analog_out(&mut self, handle: AnalogOut, value: f64) {
        self.analog_outs[handle.0].1 = value;
    }

    /// Read back the last value written to an analog output.
    pub fn analog_out_value(&self, handle: AnalogOut) -> f64 {
        self.analog_outs[handle.0].1
    }

    // ---- SIMULATION/TEST MUTATORS ----

    pub fn set_logic_in(&mut self, handle: LogicIn, value: bool) {
        self.logic_ins[handle.0].1 = value;
    }

    pub fn set_encoder_ticks(&mut self, handle: Encoder, ticks: i64) {
        self.encoders[handle.0].1 = ticks;
    }

    pub fn add_encoder_ticks(&mut self, handle: Encoder, delta: i64) {
        self.encoders[handle.0].1 += delta;
    }

    pub fn set_analog_in(&mut self, handle: AnalogIn, value: f64) {
        self.analog_ins[handle.0].1 = value;
    }

    // ---- PRIVATE ----

    fn find<T>(
        channels: &[(String, T)],
        name: &str,
        kind: &'static str,
    ) -> Result<usize, HalError> {
        channels
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| HalError::UnknownChannel(name.to_string(), kind))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_params() -> HalParams {
        HalParams {
            logic_inputs: vec!["btn_a".into()],
            logic_outputs: vec!["led_a".into()],
            encoders: vec!["enc_a".into()],
            analog_inputs: vec!["quat_a".into()],
            analog_outputs: vec!["motor_a".into()],
        }
    }

    #[test]
    fn test_channel_roundtrip() {
        let mut hal = Hal::from_params(test_params());

        let btn = hal.logic_input("btn_a").unwrap();
        let led = hal.logic_output("led_a").unwrap();
        let enc = hal.encoder("enc_a").unwrap();
        let motor = hal.analog_output("motor_a").unwrap();

        assert!(!hal.read_logic_in(btn));
        hal.set_logic_in(btn, true);
        assert!(hal.read_logic_in(btn));

        hal.write_logic_out(led, true);
        assert!(hal.logic_out_value(led));

        assert_eq!(hal.encoder_ticks(enc), 0);
        hal.add_encoder_ticks(enc, 42);
        hal.add_encoder_ticks(enc, -2);
        assert_eq!(hal.encoder_ticks(enc), 40);

        hal.write_analog_out(motor, 1.5);
        assert_eq!(hal.analog_out_value(motor), 1.5);
    }

    #[test]
    fn test_unknown_channel() {
        let hal = Hal::from_params(test_params());

        assert!(matches!(
            hal.logic_input("no_such_channel"),
            Err(HalError::UnknownChannel(_, _))
        ));
        assert!(matches!(
            hal.encoder("btn_a"),
            Err(HalError::UnknownChannel(_, _))
        ));
    }
}
