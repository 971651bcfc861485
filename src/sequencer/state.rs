use serde::{Deserialize, Serialize};

use super::tempo::clamp_bpm;

// Bars of preroll before a recording pass. Anything else is rejected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CountInBars {
    #[default]
    Off,
    One,
    Two,
    Four,
}

impl CountInBars {
    pub fn bars(self) -> u8 {
        match self {
            CountInBars::Off => 0,
            CountInBars::One => 1,
            CountInBars::Two => 2,
            CountInBars::Four => 4,
        }
    }

    pub fn next(self) -> Self {
        match self {
            CountInBars::Off => CountInBars::One,
            CountInBars::One => CountInBars::Two,
            CountInBars::Two => CountInBars::Four,
            CountInBars::Four => CountInBars::Off,
        }
    }
}

impl TryFrom<u8> for CountInBars {
    type Error = String;

    fn try_from(bars: u8) -> Result<Self, Self::Error> {
        match bars {
            0 => Ok(CountInBars::Off),
            1 => Ok(CountInBars::One),
            2 => Ok(CountInBars::Two),
            4 => Ok(CountInBars::Four),
            other => Err(format!("count-in must be 0, 1, 2 or 4 bars, got {other}")),
        }
    }
}

impl From<CountInBars> for u8 {
    fn from(c: CountInBars) -> u8 {
        c.bars()
    }
}

// What a grid press does in the step editor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditMode {
    #[default]
    Grid,
    Velocity,
}

// Whether releasing a pad key cuts the manual voice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayMode {
    #[default]
    OneShot,
    Hold,
}

// Which step an overdubbed hit lands on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordQuantize {
    // the step the scheduler last advanced to
    #[default]
    Current,
    // the step closest to the engine clock at the moment of the hit
    Nearest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transport {
    Idle,
    CountingIn,
    Playing,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SequencerState {
    pub bpm: u16,
    pub transport: Transport,
    pub current_step: Option<usize>,
    pub recording: bool,
    pub looping: bool,
    pub metronome_on: bool,
    pub count_in: CountInBars,
}

impl Default for SequencerState {
    fn default() -> Self {
        Self {
            bpm: 120,
            transport: Transport::Idle,
            current_step: None,
            recording: false,
            looping: true,
            metronome_on: false,
            count_in: CountInBars::Off,
        }
    }
}

impl SequencerState {
    pub fn playing(&self) -> bool {
        self.transport == Transport::Playing
    }

    pub fn set_bpm(&mut self, bpm: i64) {
        self.bpm = clamp_bpm(bpm);
    }
}
