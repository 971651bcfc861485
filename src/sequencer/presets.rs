use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A named step layout. Loading one replaces the whole matrix.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PresetPattern {
    pub name: String,
    pub category: String,
    pub steps_by_pad: BTreeMap<usize, Vec<usize>>,
}

impl PresetPattern {
    fn new(name: &str, category: &str, rows: &[(usize, &[usize])]) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            steps_by_pad: rows.iter().map(|(pad, steps)| (*pad, steps.to_vec())).collect(),
        }
    }
}

// Pad convention for the built-ins: 0 kick, 1 snare, 2 closed hat,
// 3 open hat, 4 clap, 5 rim.
pub fn builtin_presets() -> Vec<PresetPattern> {
    vec![
        PresetPattern::new("Four on the Floor", "House", &[
            (0, &[0, 4, 8, 12]),
            (2, &[2, 6, 10, 14]),
            (4, &[4, 12]),
        ]),
        PresetPattern::new("Boom Bap", "Hip Hop", &[
            (0, &[0, 7, 10]),
            (1, &[4, 12]),
            (2, &[0, 2, 4, 6, 8, 10, 12, 14]),
        ]),
        PresetPattern::new("Trap Rolls", "Trap", &[
            (0, &[0, 6, 11]),
            (1, &[8]),
            (2, &[0, 2, 4, 6, 8, 9, 10, 11, 12, 14, 15]),
            (3, &[7]),
        ]),
        PresetPattern::new("Backbeat", "Rock", &[
            (0, &[0, 8, 10]),
            (1, &[4, 12]),
            (2, &[0, 2, 4, 6, 8, 10, 12, 14]),
        ]),
        PresetPattern::new("Amen-ish", "Breakbeat", &[
            (0, &[0, 2, 10, 11]),
            (1, &[4, 7, 9, 12, 15]),
            (2, &[0, 2, 4, 6, 8, 10, 12, 14]),
        ]),
        PresetPattern::new("Dembow", "Reggaeton", &[
            (0, &[0, 4, 8, 12]),
            (5, &[3, 6, 11, 14]),
        ]),
    ]
}
