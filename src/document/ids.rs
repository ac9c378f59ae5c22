//! Typed, kind-scoped element identifiers in their ADM textual form

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Highest numeric value reserved for the common (built-in) definitions
pub const COMMON_DEFINITIONS_MAX: u32 = 0x0FFF;

/// Largest value that fits the four hex digits of a format ID
pub const FORMAT_VALUE_MAX: u32 = 0xFFFF;

/// Largest value that fits the four hex digits of an object ID
pub const OBJECT_VALUE_MAX: u32 = 0xFFFF;

/// Channel type category shared by packs, channels, streams and tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeDefinition {
    DirectSpeakers,
    Matrix,
    Objects,
    Hoa,
    Binaural,
}

impl TypeDefinition {
    /// Four-digit type code used inside IDs
    pub fn code(&self) -> u32 {
        match self {
            TypeDefinition::DirectSpeakers => 0x0001,
            TypeDefinition::Matrix => 0x0002,
            TypeDefinition::Objects => 0x0003,
            TypeDefinition::Hoa => 0x0004,
            TypeDefinition::Binaural => 0x0005,
        }
    }

    pub fn from_code(code: u32) -> Result<Self, DomainError> {
        match code {
            0x0001 => Ok(TypeDefinition::DirectSpeakers),
            0x0002 => Ok(TypeDefinition::Matrix),
            0x0003 => Ok(TypeDefinition::Objects),
            0x0004 => Ok(TypeDefinition::Hoa),
            0x0005 => Ok(TypeDefinition::Binaural),
            other => Err(DomainError::InvalidFormat(format!(
                "Unknown type definition code {:04X}",
                other
            ))),
        }
    }
}

impl fmt::Display for TypeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TypeDefinition::DirectSpeakers => "DirectSpeakers",
            TypeDefinition::Matrix => "Matrix",
            TypeDefinition::Objects => "Objects",
            TypeDefinition::Hoa => "HOA",
            TypeDefinition::Binaural => "Binaural",
        };
        write!(f, "{}", label)
    }
}

/// True when a format value belongs to the common definitions set
pub fn is_common_definition(value: u32) -> bool {
    value <= COMMON_DEFINITIONS_MAX
}

fn parse_hex(text: &str, digits: usize, whole: &str) -> Result<u32, DomainError> {
    if text.len() != digits || !text.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DomainError::InvalidFormat(format!("Malformed ID: {}", whole)));
    }
    u32::from_str_radix(text, 16)
        .map_err(|_| DomainError::InvalidFormat(format!("Malformed ID: {}", whole)))
}

fn strip_prefix<'a>(text: &'a str, prefix: &str) -> Result<&'a str, DomainError> {
    text.strip_prefix(prefix)
        .ok_or_else(|| DomainError::InvalidFormat(format!("Expected {} ID, got {}", prefix, text)))
}

/// Split `ttttxxxx` into a type definition and value
fn parse_type_value(body: &str, whole: &str) -> Result<(TypeDefinition, u32), DomainError> {
    if body.len() != 8 {
        return Err(DomainError::InvalidFormat(format!("Malformed ID: {}", whole)));
    }
    let type_def = TypeDefinition::from_code(parse_hex(&body[..4], 4, whole)?)?;
    let value = parse_hex(&body[4..], 4, whole)?;
    Ok((type_def, value))
}

macro_rules! string_serde {
    ($ty:ty) => {
        impl TryFrom<String> for $ty {
            type Error = DomainError;

            fn try_from(text: String) -> Result<Self, Self::Error> {
                text.parse()
            }
        }

        impl From<$ty> for String {
            fn from(id: $ty) -> Self {
                id.to_string()
            }
        }
    };
}

/// `AO_xxxx`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AO_{:04X}", self.0)
    }
}

impl FromStr for ObjectId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = strip_prefix(s.trim(), "AO_")?;
        Ok(Self(parse_hex(body, 4, s)?))
    }
}

string_serde!(ObjectId);

/// `ATU_xxxxxxxx`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackUidId(pub u32);

impl fmt::Display for TrackUidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ATU_{:08X}", self.0)
    }
}

impl FromStr for TrackUidId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = strip_prefix(s.trim(), "ATU_")?;
        Ok(Self(parse_hex(body, 8, s)?))
    }
}

string_serde!(TrackUidId);

/// `AP_ttttxxxx`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackFormatId {
    pub type_def: TypeDefinition,
    pub value: u32,
}

impl PackFormatId {
    pub fn new(type_def: TypeDefinition, value: u32) -> Self {
        Self { type_def, value }
    }

    pub fn is_common_definition(&self) -> bool {
        is_common_definition(self.value)
    }
}

impl fmt::Display for PackFormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AP_{:04X}{:04X}", self.type_def.code(), self.value)
    }
}

impl FromStr for PackFormatId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = strip_prefix(s.trim(), "AP_")?;
        let (type_def, value) = parse_type_value(body, s)?;
        Ok(Self { type_def, value })
    }
}

string_serde!(PackFormatId);

/// `AC_ttttxxxx`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelFormatId {
    pub type_def: TypeDefinition,
    pub value: u32,
}

impl ChannelFormatId {
    pub fn new(type_def: TypeDefinition, value: u32) -> Self {
        Self { type_def, value }
    }

    pub fn is_common_definition(&self) -> bool {
        is_common_definition(self.value)
    }

    /// Block ID with the given counter inside this channel
    pub fn block_id(&self, counter: u32) -> BlockFormatId {
        BlockFormatId {
            type_def: self.type_def,
            value: self.value,
            counter,
        }
    }
}

impl fmt::Display for ChannelFormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AC_{:04X}{:04X}", self.type_def.code(), self.value)
    }
}

impl FromStr for ChannelFormatId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = strip_prefix(s.trim(), "AC_")?;
        let (type_def, value) = parse_type_value(body, s)?;
        Ok(Self { type_def, value })
    }
}

string_serde!(ChannelFormatId);

/// `AB_ttttxxxx_cccccccc`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlockFormatId {
    pub type_def: TypeDefinition,
    pub value: u32,
    pub counter: u32,
}

impl fmt::Display for BlockFormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AB_{:04X}{:04X}_{:08X}",
            self.type_def.code(),
            self.value,
            self.counter
        )
    }
}

impl FromStr for BlockFormatId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = strip_prefix(s.trim(), "AB_")?;
        let (head, counter) = body
            .split_once('_')
            .ok_or_else(|| DomainError::InvalidFormat(format!("Malformed ID: {}", s)))?;
        let (type_def, value) = parse_type_value(head, s)?;
        let counter = parse_hex(counter, 8, s)?;
        Ok(Self {
            type_def,
            value,
            counter,
        })
    }
}

string_serde!(BlockFormatId);

/// `AS_ttttxxxx`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StreamFormatId {
    pub type_def: TypeDefinition,
    pub value: u32,
}

impl StreamFormatId {
    pub fn new(type_def: TypeDefinition, value: u32) -> Self {
        Self { type_def, value }
    }

    pub fn is_common_definition(&self) -> bool {
        is_common_definition(self.value)
    }
}

impl fmt::Display for StreamFormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AS_{:04X}{:04X}", self.type_def.code(), self.value)
    }
}

impl FromStr for StreamFormatId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = strip_prefix(s.trim(), "AS_")?;
        let (type_def, value) = parse_type_value(body, s)?;
        Ok(Self { type_def, value })
    }
}

string_serde!(StreamFormatId);

/// `AT_ttttxxxx_cc`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackFormatId {
    pub type_def: TypeDefinition,
    pub value: u32,
    pub counter: u32,
}

impl TrackFormatId {
    pub fn new(type_def: TypeDefinition, value: u32, counter: u32) -> Self {
        Self {
            type_def,
            value,
            counter,
        }
    }

    pub fn is_common_definition(&self) -> bool {
        is_common_definition(self.value)
    }
}

impl fmt::Display for TrackFormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AT_{:04X}{:04X}_{:02X}",
            self.type_def.code(),
            self.value,
            self.counter
        )
    }
}

impl FromStr for TrackFormatId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = strip_prefix(s.trim(), "AT_")?;
        let (head, counter) = body
            .split_once('_')
            .ok_or_else(|| DomainError::InvalidFormat(format!("Malformed ID: {}", s)))?;
        let (type_def, value) = parse_type_value(head, s)?;
        let counter = parse_hex(counter, 2, s)?;
        Ok(Self {
            type_def,
            value,
            counter,
        })
    }
}

string_serde!(TrackFormatId);
