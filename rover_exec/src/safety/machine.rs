//! The event-driven safety state machine
//!
//! The machine owns a flat set of named states with a total rank order (used
//! only to register range events, not as a containment hierarchy), a fully
//! explicit `(state, event) -> state` transition table, and per-state input
//! rules, output rules and entry actions. It is built once at startup through
//! [`SafetyBuilder`], which validates the configuration before the first
//! cycle runs: incomplete I/O rule coverage, an unset entry state, duplicate
//! transitions and private self-transitions are all rejected there.
//!
//! Once built, [`SafetySystem::tick`] runs one cycle: sample the critical
//! inputs, take the first matching input rule (or a queued external event),
//! transition if the pair is registered, apply the new state's outputs, run
//! its action. Actions may trigger further events through [`SafetyContext`]:
//! private events cascade to the successor state within the same tick
//! (bounded by [`MAX_CASCADE_DEPTH`]), public events are queued for the next
//! cycle exactly like an external trigger.
//!
//! An event with no registered transition from the current state is a silent
//! no-op: buttons and faults that do not apply to the current state are
//! ignored by design.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace, warn};

// Internal
use super::rules::{InputRule, OutputRule};
use crate::hal::{Hal, LogicIn, LogicOut};
use crate::io_mon::IoMonitor;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Maximum number of private-event cascades within a single tick.
///
/// A correctly configured chart walks at most a handful of states per cycle;
/// exceeding this limit means two states are private-triggering each other
/// and the configuration is unsound.
pub const MAX_CASCADE_DEPTH: usize = 8;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Identifies a registered state. Only the builder that registered the state
/// can produce its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateId(pub(super) usize);

/// Identifies a registered event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventId(pub(super) usize);

/// The context handed to state actions.
///
/// Actions communicate with the rest of the system exclusively through this
/// struct: they may trigger follow-on events and they own the two flags the
/// main loop reads each cycle.
pub struct SafetyContext {
    /// Event triggered by the currently running action, if any.
    pending: Option<EventId>,

    /// True while the control timedomain is running, i.e. while motion and
    /// servo processing may execute and actuator demands may be applied.
    pub control_active: bool,

    /// Set when the executor should stop at the end of the current cycle.
    pub stop_requested: bool,
}

/// A state action: runs on every cycle the state is active, starting with the
/// cycle it is entered on.
pub type EntryAction = Box<dyn FnMut(&mut SafetyContext)>;

struct StateConfig {
    name: String,
    input_rules: Vec<InputRule>,
    output_rules: Vec<OutputRule>,
    entry_action: Option<EntryAction>,
}

struct EventConfig {
    name: String,
    visibility: EventVisibility,
}

/// Builder for a [`SafetySystem`].
///
/// States gain ranks in registration order (ascending, unique); events,
/// transitions and per-state rules are collected and validated in
/// [`SafetyBuilder::build`].
pub struct SafetyBuilder {
    states: Vec<StateConfig>,
    events: Vec<EventConfig>,
    transitions: Vec<(StateId, EventId, StateId)>,
    reversed_ranges: Vec<(StateId, StateId)>,
    entry_state: Option<StateId>,
    critical_inputs: Vec<LogicIn>,
    critical_outputs: Vec<LogicOut>,
}

/// The built safety state machine.
pub struct SafetySystem {
    states: Vec<StateConfig>,
    events: Vec<EventConfig>,

    /// Transition table indexed `[state][event]`, fully enumerable for
    /// auditing via [`SafetySystem::transition_target`].
    table: Vec<Vec<Option<StateId>>>,

    entry_state: StateId,
    current: StateId,

    /// Externally triggered public event waiting for the next cycle. A single
    /// slot: the most recent trigger wins, which lets an urgent event (an
    /// emergency) displace a queued routine one.
    pending: Option<EventId>,

    ctx: SafetyContext,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Whether an event may be triggered from outside the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventVisibility {
    /// Triggerable by any external caller (buttons, mission script, fault
    /// handlers).
    Public,

    /// Triggerable only from within the machine's own turn (state actions and
    /// input rules), used to cascade to a successor state.
    Private,
}

/// Configuration errors detected when building the safety system.
#[derive(Debug, thiserror::Error)]
pub enum SafetyConfigError {
    #[error("No entry state has been set")]
    NoEntryState,

    #[error("Transition ({0}, {1}) is registered more than once")]
    DuplicateTransition(String, String),

    #[error("State {0} registers the private event {1} as a self-transition")]
    PrivateSelfTransition(String, String),

    #[error("State {0} must set every critical output exactly once")]
    OutputCoverage(String),

    #[error("State {0} must have exactly one rule for every critical input")]
    InputCoverage(String),

    #[error("Range transition bounds are reversed: {0} ranks above {1}")]
    ReversedRange(String, String),
}

/// Runtime errors raised by the safety system.
///
/// Both variants indicate misuse or misconfiguration rather than an
/// environmental failure, and the executable treats them as fatal.
#[derive(Debug, thiserror::Error)]
pub enum SafetyError {
    #[error("Private event {0} cannot be triggered from outside the safety system")]
    PrivateEventFromOutside(String),

    #[error(
        "State {0} exceeded the cascade depth limit ({1}); \
         the state chart contains a private event loop"
    )]
    CascadeDepthExceeded(String, usize),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SafetyContext {
    /// Trigger a follow-on event from within a state action.
    ///
    /// A private event cascades to the successor state within the same tick;
    /// a public event is queued for the next cycle.
    pub fn trigger_event(&mut self, event: EventId) {
        self.pending = Some(event);
    }
}

impl SafetyBuilder {
    pub fn new() -> Self {
        SafetyBuilder {
            states: Vec::new(),
            events: Vec::new(),
            transitions: Vec::new(),
            reversed_ranges: Vec::new(),
            entry_state: None,
            critical_inputs: Vec::new(),
            critical_outputs: Vec::new(),
        }
    }

    /// Declare the set of critical inputs every state must rule on.
    pub fn set_critical_inputs(&mut self, inputs: Vec<LogicIn>) {
        self.critical_inputs = inputs;
    }

    /// Declare the set of critical outputs every state must set.
    pub fn set_critical_outputs(&mut self, outputs: Vec<LogicOut>) {
        self.critical_outputs = outputs;
    }

    /// Register a state. Rank is the registration order, ascending.
    pub fn add_state(&mut self, name: &str) -> StateId {
        self.states.push(StateConfig {
            name: name.to_string(),
            input_rules: Vec::new(),
            output_rules: Vec::new(),
            entry_action: None,
        });
        StateId(self.states.len() - 1)
    }

    /// Register an event.
    pub fn add_event(&mut self, name: &str, visibility: EventVisibility) -> EventId {
        self.events.push(EventConfig {
            name: name.to_string(),
            visibility,
        });
        EventId(self.events.len() - 1)
    }

    /// Register a single transition.
    pub fn add_transition(&mut self, from: StateId, event: EventId, to: StateId) {
        self.transitions.push((from, event, to));
    }

    /// Register `(s, event) -> to` for every state `s` whose rank lies in
    /// `[low.rank, high.rank]` inclusive.
    pub fn add_range_transition(
        &mut self,
        low: StateId,
        high: StateId,
        event: EventId,
        to: StateId,
    ) {
        if low.0 > high.0 {
            self.reversed_ranges.push((low, high));
            return;
        }

        for rank in low.0..=high.0 {
            self.transitions.push((StateId(rank), event, to));
        }
    }

    pub fn set_entry_state(&mut self, state: StateId) {
        self.entry_state = Some(state);
    }

    pub fn set_input_rules(&mut self, state: StateId, rules: Vec<InputRule>) {
        self.states[state.0].input_rules = rules;
    }

    pub fn set_output_rules(&mut self, state: StateId, rules: Vec<OutputRule>) {
        self.states[state.0].output_rules = rules;
    }

    pub fn set_entry_action(&mut self, state: StateId, action: EntryAction) {
        self.states[state.0].entry_action = Some(action);
    }

    /// Validate the configuration and build the machine.
    pub fn build(self) -> Result<SafetySystem, SafetyConfigError> {
        let entry_state = self.entry_state.ok_or(SafetyConfigError::NoEntryState)?;

        if let Some((low, high)) = self.reversed_ranges.first() {
            return Err(SafetyConfigError::ReversedRange(
                self.states[low.0].name.clone(),
                self.states[high.0].name.clone(),
            ));
        }

        // Build the explicit [state][event] table, rejecting duplicates
        let mut table: Vec<Vec<Option<StateId>>> =
            vec![vec![None; self.events.len()]; self.states.len()];

        for (from, event, to) in &self.transitions {
            let slot = &mut table[from.0][event.0];
            if slot.is_some() {
                return Err(SafetyConfigError::DuplicateTransition(
                    self.states[from.0].name.clone(),
                    self.events[event.0].name.clone(),
                ));
            }

            // A private self-transition would cascade onto itself forever
            if *from == *to && self.events[event.0].visibility == EventVisibility::Private {
                return Err(SafetyConfigError::PrivateSelfTransition(
                    self.states[from.0].name.clone(),
                    self.events[event.0].name.clone(),
                ));
            }

            *slot = Some(*to);
        }

        // Every state must rule on every critical input and set every
        // critical output exactly once, so that no output can retain an
        // undefined residual value from a previous state.
        for state in &self.states {
            if !Self::covers_exactly_once(
                &self.critical_outputs,
                &state.output_rules.iter().map(|r| r.output).collect::<Vec<_>>(),
            ) {
                return Err(SafetyConfigError::OutputCoverage(state.name.clone()));
            }

            if !Self::covers_exactly_once(
                &self.critical_inputs,
                &state.input_rules.iter().map(|r| r.input()).collect::<Vec<_>>(),
            ) {
                return Err(SafetyConfigError::InputCoverage(state.name.clone()));
            }
        }

        Ok(SafetySystem {
            states: self.states,
            events: self.events,
            table,
            entry_state,
            current: entry_state,
            pending: None,
            ctx: SafetyContext {
                pending: None,
                control_active: false,
                stop_requested: false,
            },
        })
    }

    /// True if `used` contains every element of `required` exactly once and
    /// nothing else.
    fn covers_exactly_once<T: PartialEq + Copy>(required: &[T], used: &[T]) -> bool {
        used.len() == required.len()
            && required
                .iter()
                .all(|r| used.iter().filter(|u| **u == *r).count() == 1)
    }
}

impl Default for SafetyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetySystem {
    /// The active state.
    pub fn current_state(&self) -> StateId {
        self.current
    }

    /// The configured entry state.
    pub fn entry_state(&self) -> StateId {
        self.entry_state
    }

    pub fn state_name(&self, state: StateId) -> &str {
        &self.states[state.0].name
    }

    pub fn event_name(&self, event: EventId) -> &str {
        &self.events[event.0].name
    }

    /// Look up a public event by name, for callers which only hold a string
    /// (the mission script).
    pub fn public_event(&self, name: &str) -> Option<EventId> {
        self.events
            .iter()
            .position(|e| e.name == name && e.visibility == EventVisibility::Public)
            .map(EventId)
    }

    /// Audit access to the transition table.
    pub fn transition_target(&self, state: StateId, event: EventId) -> Option<StateId> {
        self.table[state.0][event.0]
    }

    /// True while the control timedomain is running.
    pub fn control_active(&self) -> bool {
        self.ctx.control_active
    }

    /// True once the chart has requested the executor to stop.
    pub fn stop_requested(&self) -> bool {
        self.ctx.stop_requested
    }

    /// Trigger a public event from outside the machine.
    ///
    /// The event is queued and takes effect on the next [`SafetySystem::tick`]
    /// unless an input-rule event fires on that cycle, in which case it stays
    /// queued. Only one external event is held: the most recent trigger wins.
    pub fn trigger_event(&mut self, event: EventId) -> Result<(), SafetyError> {
        match self.events[event.0].visibility {
            EventVisibility::Public => {
                if let Some(prev) = self.pending.replace(event) {
                    if prev != event {
                        warn!(
                            "Queued event {} displaced by {}",
                            self.events[prev.0].name, self.events[event.0].name
                        );
                    }
                }
                Ok(())
            }
            EventVisibility::Private => Err(SafetyError::PrivateEventFromOutside(
                self.events[event.0].name.clone(),
            )),
        }
    }

    /// Execute exactly one safety cycle.
    ///
    /// In order: sample the critical inputs and evaluate the active state's
    /// rules (first match wins); consume the queued external event if no rule
    /// fired; transition if the pair is registered; apply the state's output
    /// rules; run the state's action, cascading on private events up to
    /// [`MAX_CASCADE_DEPTH`] times.
    pub fn tick(&mut self, hal: &mut Hal, io_mon: &mut IoMonitor) -> Result<(), SafetyError> {
        io_mon.sample(hal);

        let mut event = io_mon
            .evaluate(&self.states[self.current.0].input_rules)
            .or_else(|| self.pending.take());

        let mut depth = 0usize;

        loop {
            // Transition if one is registered for (current, event); an
            // unregistered pair leaves the state unchanged
            if let Some(e) = event {
                match self.table[self.current.0][e.0] {
                    Some(target) => {
                        info!(
                            "Safety state change: {} --[{}]--> {}",
                            self.states[self.current.0].name,
                            self.events[e.0].name,
                            self.states[target.0].name
                        );
                        self.current = target;
                    }
                    None => trace!(
                        "Event {} not registered for state {}, ignored",
                        self.events[e.0].name,
                        self.states[self.current.0].name
                    ),
                }
            }

            // Apply the state's output rules, every critical output gets set
            for rule in &self.states[self.current.0].output_rules {
                hal.write_logic_out(rule.output, rule.value);
            }

            // Run the state's action
            self.ctx.pending = None;
            if let Some(action) = self.states[self.current.0].entry_action.as_mut() {
                action(&mut self.ctx);
            }

            match self.ctx.pending.take() {
                Some(e) => match self.events[e.0].visibility {
                    EventVisibility::Private => {
                        depth += 1;
                        if depth > MAX_CASCADE_DEPTH {
                            return Err(SafetyError::CascadeDepthExceeded(
                                self.states[self.current.0].name.clone(),
                                MAX_CASCADE_DEPTH,
                            ));
                        }
                        event = Some(e);
                    }
                    EventVisibility::Public => {
                        // Queued for the next cycle, like an external trigger
                        if let Some(prev) = self.pending.replace(e) {
                            if prev != e {
                                warn!(
                                    "Queued event {} displaced by {}",
                                    self.events[prev.0].name, self.events[e.0].name
                                );
                            }
                        }
                        break;
                    }
                },
                None => break,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hal::HalParams;
    use crate::safety::rules::{check, ignore, set};

    /// A HAL with one button and two LEDs, enough for the machine tests.
    fn test_hal() -> Hal {
        Hal::from_params(HalParams {
            logic_inputs: vec!["btn_a".into(), "btn_b".into()],
            logic_outputs: vec!["led_a".into(), "led_b".into()],
            encoders: vec![],
            analog_inputs: vec![],
            analog_outputs: vec![],
        })
    }

    /// Cover both LEDs with all-false rules for the given builder state.
    fn dark_leds(builder: &mut SafetyBuilder, hal: &Hal, state: StateId) {
        let led_a = hal.logic_output("led_a").unwrap();
        let led_b = hal.logic_output("led_b").unwrap();
        builder.set_output_rules(state, vec![set(led_a, false), set(led_b, false)]);
    }

    #[test]
    fn test_entry_state_and_registered_transitions() {
        let mut hal = test_hal();
        let mut io_mon = IoMonitor::new(vec![]);

        let mut b = SafetyBuilder::new();
        let led_a = hal.logic_output("led_a").unwrap();
        let led_b = hal.logic_output("led_b").unwrap();
        b.set_critical_outputs(vec![led_a, led_b]);

        let s_off = b.add_state("Off");
        let s_on = b.add_state("On");
        let e_go = b.add_event("go", EventVisibility::Public);
        let e_nop = b.add_event("nop", EventVisibility::Public);

        b.add_transition(s_off, e_go, s_on);
        b.set_entry_state(s_off);
        dark_leds(&mut b, &hal, s_off);
        dark_leds(&mut b, &hal, s_on);

        let mut sys = b.build().unwrap();

        // Active state before the first tick is the entry state
        assert_eq!(sys.current_state(), s_off);

        // Registered transition is taken
        sys.trigger_event(e_go).unwrap();
        sys.tick(&mut hal, &mut io_mon).unwrap();
        assert_eq!(sys.current_state(), s_on);

        // Unregistered events are silent no-ops
        sys.trigger_event(e_go).unwrap();
        sys.tick(&mut hal, &mut io_mon).unwrap();
        assert_eq!(sys.current_state(), s_on);
        sys.trigger_event(e_nop).unwrap();
        sys.tick(&mut hal, &mut io_mon).unwrap();
        assert_eq!(sys.current_state(), s_on);
    }

    #[test]
    fn test_range_transition() {
        let mut hal = test_hal();
        let mut io_mon = IoMonitor::new(vec![]);

        let mut b = SafetyBuilder::new();
        let led_a = hal.logic_output("led_a").unwrap();
        let led_b = hal.logic_output("led_b").unwrap();
        b.set_critical_outputs(vec![led_a, led_b]);

        let s0 = b.add_state("S0");
        let s1 = b.add_state("S1");
        let s2 = b.add_state("S2");
        let s3 = b.add_state("S3");
        let e_fault = b.add_event("fault", EventVisibility::Public);
        let e_up = b.add_event("up", EventVisibility::Public);

        b.add_range_transition(s1, s2, e_fault, s3);
        b.add_transition(s0, e_up, s1);
        b.set_entry_state(s0);
        for s in [s0, s1, s2, s3].iter() {
            dark_leds(&mut b, &hal, *s);
        }

        let mut sys = b.build().unwrap();

        // Table audit: every state in [s1, s2] maps fault to s3, s0 does not
        assert_eq!(sys.transition_target(s1, e_fault), Some(s3));
        assert_eq!(sys.transition_target(s2, e_fault), Some(s3));
        assert_eq!(sys.transition_target(s0, e_fault), None);
        assert_eq!(sys.transition_target(s3, e_fault), None);

        // Live check: fault from s0 is ignored, fault from s1 lands in s3
        sys.trigger_event(e_fault).unwrap();
        sys.tick(&mut hal, &mut io_mon).unwrap();
        assert_eq!(sys.current_state(), s0);

        sys.trigger_event(e_up).unwrap();
        sys.tick(&mut hal, &mut io_mon).unwrap();
        assert_eq!(sys.current_state(), s1);

        sys.trigger_event(e_fault).unwrap();
        sys.tick(&mut hal, &mut io_mon).unwrap();
        assert_eq!(sys.current_state(), s3);
    }

    #[test]
    fn test_output_tables_follow_state() {
        let mut hal = test_hal();
        let mut io_mon = IoMonitor::new(vec![]);
        let led_a = hal.logic_output("led_a").unwrap();
        let led_b = hal.logic_output("led_b").unwrap();

        let mut b = SafetyBuilder::new();
        b.set_critical_outputs(vec![led_a, led_b]);

        let s_off = b.add_state("Off");
        let s_on = b.add_state("On");
        let e_go = b.add_event("go", EventVisibility::Public);

        b.add_transition(s_off, e_go, s_on);
        b.set_entry_state(s_off);
        b.set_output_rules(s_off, vec![set(led_a, false), set(led_b, false)]);
        b.set_output_rules(s_on, vec![set(led_a, false), set(led_b, true)]);

        let mut sys = b.build().unwrap();

        sys.tick(&mut hal, &mut io_mon).unwrap();
        assert!(!hal.logic_out_value(led_a));
        assert!(!hal.logic_out_value(led_b));

        sys.trigger_event(e_go).unwrap();
        sys.tick(&mut hal, &mut io_mon).unwrap();
        assert!(!hal.logic_out_value(led_a));
        assert!(hal.logic_out_value(led_b));
    }

    #[test]
    fn test_input_rules_first_match_wins() {
        let mut hal = test_hal();
        let btn_a = hal.logic_input("btn_a").unwrap();
        let btn_b = hal.logic_input("btn_b").unwrap();
        let mut io_mon = IoMonitor::new(vec![btn_a, btn_b]);

        let mut b = SafetyBuilder::new();
        let led_a = hal.logic_output("led_a").unwrap();
        let led_b = hal.logic_output("led_b").unwrap();
        b.set_critical_inputs(vec![btn_a, btn_b]);
        b.set_critical_outputs(vec![led_a, led_b]);

        let s0 = b.add_state("S0");
        let s1 = b.add_state("S1");
        let s2 = b.add_state("S2");
        let e1 = b.add_event("e1", EventVisibility::Public);
        let e2 = b.add_event("e2", EventVisibility::Public);

        b.add_transition(s0, e1, s1);
        b.add_transition(s0, e2, s2);
        b.set_entry_state(s0);
        for s in [s0, s1, s2].iter() {
            dark_leds(&mut b, &hal, *s);
            b.set_input_rules(*s, vec![check(btn_a, false, e1), check(btn_b, false, e2)]);
        }

        let mut sys = b.build().unwrap();

        // Both buttons pressed: only the first rule's event fires
        hal.set_logic_in(btn_a, true);
        hal.set_logic_in(btn_b, true);
        sys.tick(&mut hal, &mut io_mon).unwrap();
        assert_eq!(sys.current_state(), s1);
    }

    #[test]
    fn test_ignored_inputs_never_trigger() {
        let mut hal = test_hal();
        let btn_a = hal.logic_input("btn_a").unwrap();
        let btn_b = hal.logic_input("btn_b").unwrap();
        let mut io_mon = IoMonitor::new(vec![btn_a, btn_b]);

        let mut b = SafetyBuilder::new();
        let led_a = hal.logic_output("led_a").unwrap();
        let led_b = hal.logic_output("led_b").unwrap();
        b.set_critical_inputs(vec![btn_a, btn_b]);
        b.set_critical_outputs(vec![led_a, led_b]);

        let s0 = b.add_state("S0");
        let s1 = b.add_state("S1");
        let e1 = b.add_event("e1", EventVisibility::Public);

        b.add_transition(s0, e1, s1);
        b.set_entry_state(s0);
        for s in [s0, s1].iter() {
            dark_leds(&mut b, &hal, *s);
            b.set_input_rules(*s, vec![ignore(btn_a), ignore(btn_b)]);
        }

        let mut sys = b.build().unwrap();

        hal.set_logic_in(btn_a, true);
        hal.set_logic_in(btn_b, true);
        sys.tick(&mut hal, &mut io_mon).unwrap();
        assert_eq!(sys.current_state(), s0);

        // The samples are still available for diagnostics
        assert_eq!(io_mon.value(btn_a), Some(true));
        assert_eq!(io_mon.value(btn_b), Some(true));
    }

    #[test]
    fn test_private_cascade() {
        let mut hal = test_hal();
        let mut io_mon = IoMonitor::new(vec![]);

        let mut b = SafetyBuilder::new();
        let led_a = hal.logic_output("led_a").unwrap();
        let led_b = hal.logic_output("led_b").unwrap();
        b.set_critical_outputs(vec![led_a, led_b]);

        let s0 = b.add_state("S0");
        let s1 = b.add_state("S1");
        let s2 = b.add_state("S2");
        let e_go = b.add_event("go", EventVisibility::Public);
        let e_next = b.add_event("next", EventVisibility::Private);

        b.add_transition(s0, e_go, s1);
        b.add_transition(s1, e_next, s2);
        b.set_entry_state(s0);
        for s in [s0, s1, s2].iter() {
            dark_leds(&mut b, &hal, *s);
        }
        b.set_entry_action(s1, Box::new(move |ctx| ctx.trigger_event(e_next)));

        let mut sys = b.build().unwrap();

        // One tick walks through s1 into s2
        sys.trigger_event(e_go).unwrap();
        sys.tick(&mut hal, &mut io_mon).unwrap();
        assert_eq!(sys.current_state(), s2);
    }

    #[test]
    fn test_cascade_depth_exceeded_is_fatal() {
        let mut hal = test_hal();
        let mut io_mon = IoMonitor::new(vec![]);

        let mut b = SafetyBuilder::new();
        let led_a = hal.logic_output("led_a").unwrap();
        let led_b = hal.logic_output("led_b").unwrap();
        b.set_critical_outputs(vec![led_a, led_b]);

        let s0 = b.add_state("S0");
        let s1 = b.add_state("S1");
        let e_fwd = b.add_event("fwd", EventVisibility::Private);
        let e_back = b.add_event("back", EventVisibility::Private);

        b.add_transition(s0, e_fwd, s1);
        b.add_transition(s1, e_back, s0);
        b.set_entry_state(s0);
        dark_leds(&mut b, &hal, s0);
        dark_leds(&mut b, &hal, s1);
        b.set_entry_action(s0, Box::new(move |ctx| ctx.trigger_event(e_fwd)));
        b.set_entry_action(s1, Box::new(move |ctx| ctx.trigger_event(e_back)));

        let mut sys = b.build().unwrap();

        assert!(matches!(
            sys.tick(&mut hal, &mut io_mon),
            Err(SafetyError::CascadeDepthExceeded(_, MAX_CASCADE_DEPTH))
        ));
    }

    #[test]
    fn test_private_self_transition_rejected() {
        let hal = test_hal();

        let mut b = SafetyBuilder::new();
        let led_a = hal.logic_output("led_a").unwrap();
        let led_b = hal.logic_output("led_b").unwrap();
        b.set_critical_outputs(vec![led_a, led_b]);

        let s0 = b.add_state("S0");
        let e_loop = b.add_event("loop", EventVisibility::Private);

        b.add_transition(s0, e_loop, s0);
        b.set_entry_state(s0);
        b.set_output_rules(s0, vec![set(led_a, false), set(led_b, false)]);

        assert!(matches!(
            b.build(),
            Err(SafetyConfigError::PrivateSelfTransition(_, _))
        ));
    }

    #[test]
    fn test_incomplete_output_coverage_rejected() {
        let hal = test_hal();

        let mut b = SafetyBuilder::new();
        let led_a = hal.logic_output("led_a").unwrap();
        let led_b = hal.logic_output("led_b").unwrap();
        b.set_critical_outputs(vec![led_a, led_b]);

        let s0 = b.add_state("S0");
        b.set_entry_state(s0);

        // Only one of the two critical outputs is covered
        b.set_output_rules(s0, vec![set(led_a, false)]);

        assert!(matches!(
            b.build(),
            Err(SafetyConfigError::OutputCoverage(_))
        ));
    }

    #[test]
    fn test_reversed_range_rejected() {
        let hal = test_hal();

        let mut b = SafetyBuilder::new();
        let led_a = hal.logic_output("led_a").unwrap();
        let led_b = hal.logic_output("led_b").unwrap();
        b.set_critical_outputs(vec![led_a, led_b]);

        let s0 = b.add_state("S0");
        let s1 = b.add_state("S1");
        let e_fault = b.add_event("fault", EventVisibility::Public);

        b.add_range_transition(s1, s0, e_fault, s0);
        b.set_entry_state(s0);
        dark_leds(&mut b, &hal, s0);
        dark_leds(&mut b, &hal, s1);

        assert!(matches!(
            b.build(),
            Err(SafetyConfigError::ReversedRange(_, _))
        ));
    }

    #[test]
    fn test_private_event_rejected_from_outside() {
        let hal = test_hal();

        let mut b = SafetyBuilder::new();
        let led_a = hal.logic_output("led_a").unwrap();
        let led_b = hal.logic_output("led_b").unwrap();
        b.set_critical_outputs(vec![led_a, led_b]);

        let s0 = b.add_state("S0");
        let e_priv = b.add_event("internal", EventVisibility::Private);
        b.set_entry_state(s0);
        dark_leds(&mut b, &hal, s0);

        let mut sys = b.build().unwrap();

        assert!(matches!(
            sys.trigger_event(e_priv),
            Err(SafetyError::PrivateEventFromOutside(_))
        ));
    }
}
