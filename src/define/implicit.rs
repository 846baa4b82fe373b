// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Built-in defines that every suite can read.
//!
//! The implicit slots occupy indices `0..IMPLICIT_DEFINE_COUNT` and describe
//! the storage configuration a bench runs against. Several defaults are
//! derived from other slots, so they are evaluated through the same lazy
//! lookup as suite defines and pick up overrides of the slots they read.

use super::{Define, DefineLookup, DefineMap};
use crate::error::Result;
use strum::{EnumCount, IntoEnumIterator};
use strum_macros::{EnumCount as EnumCountMacro, EnumIter, IntoStaticStr};

/// Reserved implicit slots. The discriminant is the slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumCountMacro, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(usize)]
pub enum ImplicitDefine {
    ReadSize,
    ProgSize,
    BlockSize,
    BlockCount,
    DiskSize,
    CacheSize,
    InlineSize,
    ShrubSize,
    FragmentSize,
    CrystalSize,
    LookaheadSize,
    BlockCycles,
    EraseValue,
    EraseCycles,
    BadblockBehavior,
    PowerlossBehavior,
}

pub const READ_SIZE: usize = ImplicitDefine::ReadSize as usize;
pub const PROG_SIZE: usize = ImplicitDefine::ProgSize as usize;
pub const BLOCK_SIZE: usize = ImplicitDefine::BlockSize as usize;
pub const BLOCK_COUNT: usize = ImplicitDefine::BlockCount as usize;
pub const DISK_SIZE: usize = ImplicitDefine::DiskSize as usize;
pub const CACHE_SIZE: usize = ImplicitDefine::CacheSize as usize;
pub const INLINE_SIZE: usize = ImplicitDefine::InlineSize as usize;
pub const SHRUB_SIZE: usize = ImplicitDefine::ShrubSize as usize;
pub const FRAGMENT_SIZE: usize = ImplicitDefine::FragmentSize as usize;
pub const CRYSTAL_SIZE: usize = ImplicitDefine::CrystalSize as usize;
pub const LOOKAHEAD_SIZE: usize = ImplicitDefine::LookaheadSize as usize;
pub const BLOCK_CYCLES: usize = ImplicitDefine::BlockCycles as usize;
pub const ERASE_VALUE: usize = ImplicitDefine::EraseValue as usize;
pub const ERASE_CYCLES: usize = ImplicitDefine::EraseCycles as usize;
pub const BADBLOCK_BEHAVIOR: usize = ImplicitDefine::BadblockBehavior as usize;
pub const POWERLOSS_BEHAVIOR: usize = ImplicitDefine::PowerlossBehavior as usize;

/// Number of reserved implicit slots.
pub const IMPLICIT_DEFINE_COUNT: usize = ImplicitDefine::COUNT;

/// Bad blocks report a prog error.
pub const BADBLOCK_PROGERROR: i64 = 0;
/// Power loss leaves the device untouched.
pub const POWERLOSS_NOOP: i64 = 0;

impl ImplicitDefine {
    /// Slot index of this define.
    pub fn slot(self) -> usize {
        self as usize
    }

    /// Name as reported in listings and matched by overrides.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Default value, reading other slots through `defines` where needed.
    pub fn default_value(self, defines: &mut dyn DefineLookup) -> Result<i64> {
        use ImplicitDefine::*;
        Ok(match self {
            ReadSize => 1,
            ProgSize => 1,
            BlockSize => 4096,
            BlockCount => {
                let disk_size = defines.value(DISK_SIZE)?;
                disk_size.checked_div(defines.value(BLOCK_SIZE)?).unwrap_or(0)
            }
            DiskSize => 1024 * 1024,
            CacheSize => {
                let io = defines.value(READ_SIZE)?.max(defines.value(PROG_SIZE)?);
                io.max(16)
            }
            InlineSize => defines.value(BLOCK_SIZE)? / 8,
            ShrubSize => defines.value(INLINE_SIZE)?,
            FragmentSize => defines.value(CACHE_SIZE)?,
            CrystalSize => defines.value(BLOCK_SIZE)? / 8,
            LookaheadSize => 16,
            BlockCycles => -1,
            EraseValue => 0xff,
            EraseCycles => 0,
            BadblockBehavior => BADBLOCK_PROGERROR,
            PowerlossBehavior => POWERLOSS_NOOP,
        })
    }
}

/// The implicit layer: one single-permutation define per reserved slot.
pub fn implicit_defines() -> DefineMap {
    ImplicitDefine::iter()
        .map(|def| Some(Define::new(1, move |defines, _| def.default_value(defines))))
        .collect()
}

/// Names of the reserved slots, indexed by slot.
pub fn implicit_names() -> Vec<String> {
    ImplicitDefine::iter().map(|def| def.name().to_owned()).collect()
}

/// Storage configuration read from the implicit defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchConfig {
    pub read_size: i64,
    pub prog_size: i64,
    pub block_size: i64,
    pub block_count: i64,
    pub block_cycles: i64,
    pub cache_size: i64,
    pub inline_size: i64,
    pub shrub_size: i64,
    pub fragment_size: i64,
    pub crystal_size: i64,
    pub lookahead_size: i64,
    pub erase_value: i64,
    pub erase_cycles: i64,
    pub badblock_behavior: i64,
    pub powerloss_behavior: i64,
}

impl BenchConfig {
    /// Resolve every field from the current permutation.
    pub fn resolve(defines: &mut dyn DefineLookup) -> Result<Self> {
        Ok(Self {
            read_size: defines.value(READ_SIZE)?,
            prog_size: defines.value(PROG_SIZE)?,
            block_size: defines.value(BLOCK_SIZE)?,
            block_count: defines.value(BLOCK_COUNT)?,
            block_cycles: defines.value(BLOCK_CYCLES)?,
            cache_size: defines.value(CACHE_SIZE)?,
            inline_size: defines.value(INLINE_SIZE)?,
            shrub_size: defines.value(SHRUB_SIZE)?,
            fragment_size: defines.value(FRAGMENT_SIZE)?,
            crystal_size: defines.value(CRYSTAL_SIZE)?,
            lookahead_size: defines.value(LOOKAHEAD_SIZE)?,
            erase_value: defines.value(ERASE_VALUE)?,
            erase_cycles: defines.value(ERASE_CYCLES)?,
            badblock_behavior: defines.value(BADBLOCK_BEHAVIOR)?,
            powerloss_behavior: defines.value(POWERLOSS_BEHAVIOR)?,
        })
    }
}
