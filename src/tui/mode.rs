// state local to tui, mirrors held keys so grid presses can be resolved
// into semantic inputevents
#[derive(Clone, Debug, Default)]
pub struct TuiState {
    // g held: the next grid press picks the pad shown in the step row
    pub select_held: bool,
    // grid keys currently down, so a release after g is let go still reports
    pub pads_down: [bool; crate::shared::NUM_PADS],
}
