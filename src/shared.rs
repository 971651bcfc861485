// Key layout for the terminal front end:
//
// Grid buttons (the 16 pads):
//   1 2 3 4       //  PadDown(0..=3) / PadUp(0..=3)
//   q w e r       //  PadDown(4..=7) / PadUp(4..=7)
//   a s d f       //  PadDown(8..=11) / PadUp(8..=11)
//   z x c v       //  PadDown(12..=15) / PadUp(12..=15)
//
// Modifiers and transport:
//   Space         //  TogglePlay
//   b             //  ToggleRecord
//   m             //  ToggleMetronome
//   l             //  ToggleLooping
//   k             //  CycleCountIn
//   n             //  TapTempo
//   - / =         //  NudgeBpm(-1 / +1)
//   g (held)      //  next pad key selects the pad shown in the step row
//   t             //  toggles write mode: pad keys paint steps of the selected pad
//   u             //  toggles grid/velocity edit mode
//   [ / ]         //  velocity drag down / up on the last touched step
//   p             //  NextPreset
//   0             //  ClearSelectedPad, Shift+0 (')') clears everything
//   Esc           //  Quit
//
// The sequencer owns all pattern and transport state; the tui only reads a
// snapshot of it each frame.

pub const NUM_PADS: usize = 16;
pub const STEPS_PER_PATTERN: usize = 16;

pub const MIN_BPM: u16 = 40;
pub const MAX_BPM: u16 = 300;

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    // grid presses; the middle layer decides trigger vs. paint
    PadDown(u8),
    PadUp(u8),

    // held g + grid press, resolved by the tui
    SelectPad(u8),

    TogglePlay,
    ToggleRecord,
    ToggleMetronome,
    ToggleLooping,
    CycleCountIn,
    TapTempo,
    NudgeBpm(i16),

    ToggleWriteMode,
    ToggleEditMode,
    VelocityNudge(f32), // simulated vertical drag in screen units

    NextPreset,
    ClearSelectedPad,
    ClearAll,

    Quit,
}

// Everything the front end shows, rebuilt by the middle layer each frame.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayState {
    pub bpm: u16,
    pub transport: &'static str, // "IDLE", "COUNT", "PLAY"
    pub playing_step: Option<usize>,
    pub recording: bool,
    pub looping: bool,
    pub metronome: bool,
    pub count_in_bars: u8,
    pub write_mode: bool,
    pub velocity_mode: bool,
    pub selected_pad: usize,
    pub selected_row: [f32; STEPS_PER_PATTERN],
    pub pads_loaded: usize,
    pub sounding_pad: Option<usize>, // manual preview still playing
    pub display_text: String, // last preset / notice
}
