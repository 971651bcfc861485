// One stereo frame; the render side mixes in these and only interleaves at
// the very end for whatever channel count the device wants.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StereoFrame {
    pub left: f32,
    pub right: f32,
}

impl StereoFrame {
    pub fn mono(x: f32) -> Self {
        Self { left: x, right: x }
    }

    pub fn add_scaled(&mut self, other: StereoFrame, gain: f32) {
        self.left += other.left * gain;
        self.right += other.right * gain;
    }

    // Writes this frame into one interleaved device frame. Extra channels get
    // silence, a mono device gets the average.
    pub fn write_interleaved(self, out: &mut [f32]) {
        match out {
            [] => {}
            [only] => *only = 0.5 * (self.left + self.right),
            [l, r, rest @ ..] => {
                *l = self.left;
                *r = self.right;
                rest.fill(0.0);
            }
        }
    }
}
