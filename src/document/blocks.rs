//! Time-varying parameter blocks held by channel formats

use serde::{Deserialize, Serialize};

use crate::document::ids::{BlockFormatId, ChannelFormatId, TypeDefinition};

/// Identity and timing shared by every block variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockTiming {
    pub id: BlockFormatId,
    /// Start relative to the owning object's start; absent means zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rtime_ns: Option<i64>,
    /// Absent means unbounded: the block runs to the next block or end of file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ns: Option<i64>,
}

impl BlockTiming {
    pub fn new(id: BlockFormatId, rtime_ns: Option<i64>, duration_ns: Option<i64>) -> Self {
        Self {
            id,
            rtime_ns,
            duration_ns,
        }
    }
}

/// Timing capability implemented by every block variant
pub trait TimedBlock: Clone {
    fn timing(&self) -> &BlockTiming;

    fn timing_mut(&mut self) -> &mut BlockTiming;

    fn id(&self) -> BlockFormatId {
        self.timing().id
    }

    fn rtime(&self) -> i64 {
        self.timing().rtime_ns.unwrap_or(0)
    }

    fn set_rtime(&mut self, rtime_ns: Option<i64>) {
        self.timing_mut().rtime_ns = rtime_ns;
    }

    /// `None` when unbounded
    fn duration(&self) -> Option<i64> {
        self.timing().duration_ns
    }

    fn set_duration(&mut self, duration_ns: Option<i64>) {
        self.timing_mut().duration_ns = duration_ns;
    }

    fn is_unbounded(&self) -> bool {
        self.timing().duration_ns.is_none()
    }

    fn set_counter(&mut self, counter: u32) {
        self.timing_mut().id.counter = counter;
    }

    /// Move the block under another channel, keeping its counter
    fn relabel(&mut self, channel: ChannelFormatId) {
        let counter = self.timing().id.counter;
        self.timing_mut().id = channel.block_id(counter);
    }
}

/// Spherical or cartesian source position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "coordinate", rename_all = "snake_case")]
pub enum Position {
    Polar {
        azimuth: f32,
        elevation: f32,
        #[serde(default = "default_distance")]
        distance: f32,
    },
    Cartesian {
        x: f32,
        y: f32,
        z: f32,
    },
}

fn default_distance() -> f32 {
    1.0
}

fn default_gain() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectSpeakersBlock {
    #[serde(flatten)]
    pub timing: BlockTiming,
    #[serde(default)]
    pub speaker_labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixCoefficient {
    /// Input channel as an opaque channel format reference
    pub input_channel: String,
    #[serde(default = "default_gain")]
    pub gain: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixBlock {
    #[serde(flatten)]
    pub timing: BlockTiming,
    #[serde(default)]
    pub coefficients: Vec<MatrixCoefficient>,
}

/// Jump-position record of an object block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JumpPosition {
    pub flag: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpolation_length_ns: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectsBlock {
    #[serde(flatten)]
    pub timing: BlockTiming,
    pub position: Position,
    #[serde(default = "default_gain")]
    pub gain: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jump_position: Option<JumpPosition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoaBlock {
    #[serde(flatten)]
    pub timing: BlockTiming,
    pub order: u32,
    pub degree: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalization: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinauralBlock {
    #[serde(flatten)]
    pub timing: BlockTiming,
}

impl TimedBlock for DirectSpeakersBlock {
    fn timing(&self) -> &BlockTiming {
        &self.timing
    }

    fn timing_mut(&mut self) -> &mut BlockTiming {
        &mut self.timing
    }
}

impl TimedBlock for MatrixBlock {
    fn timing(&self) -> &BlockTiming {
        &self.timing
    }

    fn timing_mut(&mut self) -> &mut BlockTiming {
        &mut self.timing
    }
}

impl TimedBlock for ObjectsBlock {
    fn timing(&self) -> &BlockTiming {
        &self.timing
    }

    fn timing_mut(&mut self) -> &mut BlockTiming {
        &mut self.timing
    }
}

impl TimedBlock for HoaBlock {
    fn timing(&self) -> &BlockTiming {
        &self.timing
    }

    fn timing_mut(&mut self) -> &mut BlockTiming {
        &mut self.timing
    }
}

impl TimedBlock for BinauralBlock {
    fn timing(&self) -> &BlockTiming {
        &self.timing
    }

    fn timing_mut(&mut self) -> &mut BlockTiming {
        &mut self.timing
    }
}

/// The ordered block sequence of a channel format, one variant per type definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "items", rename_all = "snake_case")]
pub enum ChannelBlocks {
    DirectSpeakers(Vec<DirectSpeakersBlock>),
    Matrix(Vec<MatrixBlock>),
    Objects(Vec<ObjectsBlock>),
    Hoa(Vec<HoaBlock>),
    Binaural(Vec<BinauralBlock>),
}

impl ChannelBlocks {
    /// Empty sequence of the variant matching a type definition
    pub fn empty(type_def: TypeDefinition) -> Self {
        match type_def {
            TypeDefinition::DirectSpeakers => ChannelBlocks::DirectSpeakers(Vec::new()),
            TypeDefinition::Matrix => ChannelBlocks::Matrix(Vec::new()),
            TypeDefinition::Objects => ChannelBlocks::Objects(Vec::new()),
            TypeDefinition::Hoa => ChannelBlocks::Hoa(Vec::new()),
            TypeDefinition::Binaural => ChannelBlocks::Binaural(Vec::new()),
        }
    }

    pub fn type_definition(&self) -> TypeDefinition {
        match self {
            ChannelBlocks::DirectSpeakers(_) => TypeDefinition::DirectSpeakers,
            ChannelBlocks::Matrix(_) => TypeDefinition::Matrix,
            ChannelBlocks::Objects(_) => TypeDefinition::Objects,
            ChannelBlocks::Hoa(_) => TypeDefinition::Hoa,
            ChannelBlocks::Binaural(_) => TypeDefinition::Binaural,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ChannelBlocks::DirectSpeakers(b) => b.len(),
            ChannelBlocks::Matrix(b) => b.len(),
            ChannelBlocks::Objects(b) => b.len(),
            ChannelBlocks::Hoa(b) => b.len(),
            ChannelBlocks::Binaural(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Timing of every block, in sequence order
    pub fn timings(&self) -> Vec<&BlockTiming> {
        fn collect<B: TimedBlock>(blocks: &[B]) -> Vec<&BlockTiming> {
            blocks.iter().map(|b| b.timing()).collect()
        }
        match self {
            ChannelBlocks::DirectSpeakers(b) => collect(b),
            ChannelBlocks::Matrix(b) => collect(b),
            ChannelBlocks::Objects(b) => collect(b),
            ChannelBlocks::Hoa(b) => collect(b),
            ChannelBlocks::Binaural(b) => collect(b),
        }
    }

    /// Point every block ID at `channel`
    pub fn relabel(&mut self, channel: ChannelFormatId) {
        fn apply<B: TimedBlock>(blocks: &mut [B], channel: ChannelFormatId) {
            for block in blocks {
                block.relabel(channel);
            }
        }
        match self {
            ChannelBlocks::DirectSpeakers(b) => apply(b, channel),
            ChannelBlocks::Matrix(b) => apply(b, channel),
            ChannelBlocks::Objects(b) => apply(b, channel),
            ChannelBlocks::Hoa(b) => apply(b, channel),
            ChannelBlocks::Binaural(b) => apply(b, channel),
        }
    }
}
