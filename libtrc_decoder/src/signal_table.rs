// The signal layout of the inertial/GNSS unit on the acquisition bus. Each identifier
// carries exactly one group of fields and each group owns a contiguous run of columns
// in the output table, in the order listed here.
use std::sync::OnceLock;

use fxhash::FxHashMap;

use super::frame::CanFrame;
use super::payload::PayloadFormat::{Signed16 as S16, Signed32 as S32};
use super::payload::{decode, PayloadFormat};

const MIN_SIGNAL_PAYLOAD: usize = 2; // Frames shorter than this never produce values

/// One decode instruction: where a field lives in the payload and how to scale it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub offset: usize,
    pub scale: f64,
    pub format: PayloadFormat,
}

const fn field(
    name: &'static str,
    offset: usize,
    scale: f64,
    format: PayloadFormat,
) -> FieldSpec {
    FieldSpec {
        name,
        offset,
        scale,
        format,
    }
}

/// All of the fields decoded from a single identifier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalGroup {
    pub name: &'static str,
    pub identifier: u32,
    pub fields: &'static [FieldSpec],
}

static SIGNAL_GROUPS: [SignalGroup; 14] = [
    SignalGroup {
        name: "position",
        identifier: 0x601,
        fields: &[
            field("PosLon", 4, 1e-7, S32),
            field("PosLat", 0, 1e-7, S32),
        ],
    },
    SignalGroup {
        name: "altitude",
        identifier: 0x602,
        fields: &[field("Altitude", 0, 0.001, S32)],
    },
    SignalGroup {
        name: "speed",
        identifier: 0x603,
        fields: &[field("Speed2D", 6, 0.01, S16)],
    },
    SignalGroup {
        name: "angular_accel",
        identifier: 0x60E,
        fields: &[
            field("AngAccelX", 0, 0.1, S16),
            field("AngAccelY", 2, 0.1, S16),
            field("AngAccelZ", 4, 0.1, S16),
        ],
    },
    SignalGroup {
        name: "velocity",
        identifier: 0x604,
        fields: &[
            field("VelForward", 0, 0.01, S16),
            field("VelLateral", 2, 0.01, S16),
        ],
    },
    SignalGroup {
        name: "accel",
        identifier: 0x605,
        fields: &[
            field("AccelX", 0, 0.01, S16),
            field("AccelY", 2, 0.01, S16),
            field("AccelZ", 4, 0.01, S16),
        ],
    },
    SignalGroup {
        name: "accel_vehicle",
        identifier: 0x606,
        fields: &[
            field("AccelForward", 0, 0.01, S16),
            field("AccelLateral", 2, 0.01, S16),
            field("AccelSlip", 6, 0.01, S16),
        ],
    },
    SignalGroup {
        name: "heading_pitch_roll",
        identifier: 0x607,
        fields: &[
            field("AngleHeading", 0, 0.01, S16),
            field("AnglePitch", 2, 0.01, S16),
            field("AngleRoll", 4, 0.01, S16),
        ],
    },
    SignalGroup {
        name: "angular_rate",
        identifier: 0x608,
        fields: &[
            field("AngRateX", 0, 0.01, S16),
            field("AngRateY", 2, 0.01, S16),
            field("AngRateZ", 4, 0.01, S16),
        ],
    },
    SignalGroup {
        name: "angular_rate_vehicle",
        identifier: 0x609,
        fields: &[
            field("AngRateForward", 0, 0.01, S16),
            field("AngRateLateral", 2, 0.01, S16),
        ],
    },
    SignalGroup {
        name: "distance",
        identifier: 0x60B,
        fields: &[
            field("DistanceWithHold", 0, 0.001, S16),
            field("Distance", 4, 0.001, S16),
        ],
    },
    SignalGroup {
        name: "local_position",
        identifier: 0x60C,
        fields: &[
            field("PosLocalX", 0, 1e-4, S32),
            field("PosLocalY", 4, 1e-4, S32),
        ],
    },
    SignalGroup {
        name: "local_velocity",
        identifier: 0x60D,
        fields: &[
            field("VelLocalX", 0, 0.01, S16),
            field("VelLocalY", 2, 0.01, S16),
            field("AngleLocalYaw", 4, 0.01, S16),
            field("AngleLocalTrack", 6, 0.01, S16),
        ],
    },
    SignalGroup {
        name: "angular_accel_vehicle",
        identifier: 0x60F,
        fields: &[
            field("AngAccelForward", 0, 0.1, S16),
            field("AngAccelLateral", 2, 0.1, S16),
        ],
    },
];

/// SignalTable maps frame identifiers onto their signal group.
///
/// The table is fixed; use [`SignalTable::global`] to share the single instance.
#[derive(Debug, Clone)]
pub struct SignalTable {
    groups: &'static [SignalGroup],
    by_identifier: FxHashMap<u32, usize>,
}

impl SignalTable {
    fn new(groups: &'static [SignalGroup]) -> Self {
        let by_identifier = groups
            .iter()
            .enumerate()
            .map(|(idx, group)| (group.identifier, idx))
            .collect();
        Self {
            groups,
            by_identifier,
        }
    }

    /// The process-wide table, built on first use
    pub fn global() -> &'static Self {
        static TABLE: OnceLock<SignalTable> = OnceLock::new();
        TABLE.get_or_init(|| Self::new(&SIGNAL_GROUPS))
    }

    pub fn groups(&self) -> &'static [SignalGroup] {
        self.groups
    }

    /// Index of the group carried by this identifier, if any
    pub fn group_index(&self, identifier: u32) -> Option<usize> {
        self.by_identifier.get(&identifier).copied()
    }

    /// Field names of every group, in column order
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> {
        let groups: &'static [SignalGroup] = self.groups;
        groups
            .iter()
            .flat_map(|group| group.fields.iter().map(|f| f.name))
    }

    pub fn column_count(&self) -> usize {
        self.groups.iter().map(|group| group.fields.len()).sum()
    }

    /// Column range of each group, counted from the first signal column
    pub fn group_column_ranges(&self) -> Vec<std::ops::Range<usize>> {
        let mut start = 0;
        self.groups
            .iter()
            .map(|group| {
                let range = start..start + group.fields.len();
                start = range.end;
                range
            })
            .collect()
    }

    /// Decode a frame into a fresh row. Only the frame's own group gets values.
    pub fn decode_frame(&self, frame: &CanFrame) -> SignalRow {
        let mut row = SignalRow::empty(self.groups.len());
        if frame.payload().len() < MIN_SIGNAL_PAYLOAD {
            return row;
        }
        if let Some(idx) = self.group_index(frame.identifier()) {
            let values = self.groups[idx]
                .fields
                .iter()
                .map(|f| decode(frame.payload(), f.offset, f.scale, f.format))
                .collect();
            row.slots[idx] = Some(values);
        }
        row
    }
}

/// The signal part of one output row: one slot per group, None meaning not applicable.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRow {
    slots: Vec<Option<Vec<f64>>>,
}

impl SignalRow {
    fn empty(n_groups: usize) -> Self {
        Self {
            slots: vec![None; n_groups],
        }
    }

    pub fn group_values(&self, group_index: usize) -> Option<&[f64]> {
        self.slots.get(group_index)?.as_deref()
    }

    /// Index of the group holding values, if any
    pub fn active_group(&self) -> Option<usize> {
        self.slots.iter().position(|slot| slot.is_some())
    }

    /// Flatten to one cell per column, using None for not applicable
    pub fn cells<'a>(
        &'a self,
        table: &'a SignalTable,
    ) -> impl Iterator<Item = Option<f64>> + 'a {
        debug_assert_eq!(self.slots.len(), table.groups().len());
        table
            .groups()
            .iter()
            .zip(self.slots.iter())
            .flat_map(|(group, slot)| {
                (0..group.fields.len()).map(move |i| slot.as_ref().map(|values| values[i]))
            })
    }
}
