// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Traversal flags and content counters.
//!
//! Authored patches tag each side of a constraint edge with *content* flags
//! (add/remove walk, fly, power, sight). Markup accumulates those tags into
//! per-triangle [`ContentFlagCounts`] and resolves them into [`PathFlags`].

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

use serde::{Deserialize, Serialize};

/// Declares a transparent bit-set newtype with set/test helpers.
macro_rules! navi_flags {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($repr:ty) {
            $($(#[$fmeta:meta])* const $flag:ident = $value:expr;)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name($repr);

        impl $name {
            pub const NONE: Self = Self(0);
            $($(#[$fmeta])* pub const $flag: Self = Self($value);)*

            #[inline]
            pub const fn from_bits(bits: $repr) -> Self {
                Self(bits)
            }

            #[inline]
            pub const fn bits(self) -> $repr {
                self.0
            }

            #[inline]
            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }

            /// True when every bit of `other` is set.
            #[inline]
            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            /// True when any bit of `other` is set.
            #[inline]
            pub const fn intersects(self, other: Self) -> bool {
                self.0 & other.0 != 0
            }

            #[inline]
            pub fn insert(&mut self, other: Self) {
                self.0 |= other.0;
            }

            #[inline]
            pub fn remove(&mut self, other: Self) {
                self.0 &= !other.0;
            }
        }

        impl BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }

        impl BitAnd for $name {
            type Output = Self;
            fn bitand(self, rhs: Self) -> Self {
                Self(self.0 & rhs.0)
            }
        }

        impl BitAndAssign for $name {
            fn bitand_assign(&mut self, rhs: Self) {
                self.0 &= rhs.0;
            }
        }

        impl Not for $name {
            type Output = Self;
            fn not(self) -> Self {
                Self(!self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let mut first = true;
                write!(f, "{}(", stringify!($name))?;
                $(
                    if self.contains(Self::$flag) && Self::$flag.0 != 0 {
                        if !first {
                            write!(f, " | ")?;
                        }
                        write!(f, "{}", stringify!($flag))?;
                        first = false;
                    }
                )*
                if first {
                    write!(f, "NONE")?;
                }
                write!(f, ")")
            }
        }
    };
}

navi_flags! {
    /// Resolved traversal capabilities of a triangle.
    pub struct PathFlags(u8) {
        const WALK = 1 << 0;
        const FLY = 1 << 1;
        const POWER = 1 << 2;
        const SIGHT = 1 << 3;
        /// Walkable and flyable at once.
        const TALL_WALK = 1 << 4;
        /// Excluded from spawning.
        const BLACK_OUT_ZONE = 1 << 5;
    }
}

navi_flags! {
    /// Authored add/remove tags, one bit per [`ContentFlagCounts`] slot.
    pub struct ContentFlags(u8) {
        const ADD_WALK = 1 << 0;
        const REMOVE_WALK = 1 << 1;
        const ADD_FLY = 1 << 2;
        const REMOVE_FLY = 1 << 3;
        const ADD_POWER = 1 << 4;
        const REMOVE_POWER = 1 << 5;
        const ADD_SIGHT = 1 << 6;
        const REMOVE_SIGHT = 1 << 7;
    }
}

navi_flags! {
    pub struct EdgeFlags(u8) {
        /// Authored boundary, exempt from Delaunay flips.
        const CONSTRAINT = 1 << 0;
        /// Door boundary; never split or removed.
        const DOOR = 1 << 1;
        /// Queued in a Delaunay repair work-list.
        const DELAUNAY = 1 << 2;
    }
}

impl EdgeFlags {
    /// Flags carried over when constraints are merged.
    pub const MASK: Self = Self(Self::CONSTRAINT.0 | Self::DOOR.0);
}

navi_flags! {
    pub struct TriangleFlags(u8) {
        const ATTACHED = 1 << 0;
        const MARKUP = 1 << 1;
    }
}

navi_flags! {
    pub struct PointFlags(u8) {
        /// Referenced by at least one triangle.
        const ATTACHED = 1 << 0;
    }
}

navi_flags! {
    /// Options for one path generation call.
    pub struct PathGenerationFlags(u8) {
        /// Return the closest partial path when the goal is unreachable.
        const INCOMPLETED_PATH = 1 << 0;
        /// Skip the sweep that validates the last leg of a partial path.
        const IGNORE_SWEEP = 1 << 1;
    }
}

impl ContentFlags {
    /// Resolves content tags into traversal capabilities.
    ///
    /// A capability is present when its add tag is set and its remove tag is
    /// not. `TALL_WALK` requires both walk and fly.
    pub fn to_path_flags(self) -> PathFlags {
        let pairs = [
            (Self::ADD_WALK, Self::REMOVE_WALK, PathFlags::WALK),
            (Self::ADD_FLY, Self::REMOVE_FLY, PathFlags::FLY),
            (Self::ADD_POWER, Self::REMOVE_POWER, PathFlags::POWER),
            (Self::ADD_SIGHT, Self::REMOVE_SIGHT, PathFlags::SIGHT),
        ];
        let mut path_flags = PathFlags::NONE;
        for (add, remove, flag) in pairs {
            if self.contains(add) && !self.contains(remove) {
                path_flags |= flag;
            }
        }
        if path_flags.contains(PathFlags::WALK | PathFlags::FLY) {
            path_flags |= PathFlags::TALL_WALK;
        }
        path_flags
    }
}

/// Content slot indices into [`ContentFlagCounts`].
pub mod slot {
    pub const ADD_WALK: usize = 0;
    pub const REMOVE_WALK: usize = 1;
    pub const ADD_FLY: usize = 2;
    pub const REMOVE_FLY: usize = 3;
    pub const ADD_POWER: usize = 4;
    pub const REMOVE_POWER: usize = 5;
    pub const ADD_SIGHT: usize = 6;
    pub const REMOVE_SIGHT: usize = 7;
}

/// Signed accumulator per content slot.
///
/// A value type: markup copies it at every propagation step.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ContentFlagCounts(pub [i32; 8]);

impl ContentFlagCounts {
    pub const COUNT: usize = 8;

    /// State outside all authored geometry: flyable, power and sight pass,
    /// not walkable.
    pub fn exterior() -> Self {
        let mut counts = Self::default();
        counts.0[slot::ADD_FLY] = 1;
        counts.0[slot::ADD_POWER] = 1;
        counts.0[slot::ADD_SIGHT] = 1;
        counts
    }

    /// One count per set bit of `flags`.
    pub fn from_content_flags(flags: ContentFlags) -> Self {
        let mut counts = Self::default();
        for (i, c) in counts.0.iter_mut().enumerate() {
            *c = ((flags.bits() >> i) & 1) as i32;
        }
        counts
    }

    #[inline]
    pub fn get(&self, slot: usize) -> i32 {
        self.0[slot]
    }

    #[inline]
    pub fn set(&mut self, slot: usize, value: i32) {
        self.0[slot] = value;
    }

    pub fn clear(&mut self) {
        self.0 = [0; 8];
    }

    /// Adds `add` and subtracts `sub` slot by slot.
    pub fn apply(&mut self, add: &Self, sub: &Self) {
        for i in 0..Self::COUNT {
            self.0[i] += add.0[i] - sub.0[i];
        }
    }

    pub fn to_content_flags(&self) -> ContentFlags {
        let bits = self
            .0
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .fold(0u8, |acc, (i, _)| acc | (1 << i));
        ContentFlags::from_bits(bits)
    }

    pub fn to_path_flags(&self) -> PathFlags {
        self.to_content_flags().to_path_flags()
    }
}

impl fmt::Debug for ContentFlagCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, "]")
    }
}

/// Content counters for both sides of a constraint edge.
///
/// Side 0 is the region to the left of the edge's `p0 -> p1` direction,
/// side 1 the region to its right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EdgePathingFlags {
    pub sides: [ContentFlagCounts; 2],
}

impl EdgePathingFlags {
    pub fn new(side0: ContentFlags, side1: ContentFlags) -> Self {
        Self {
            sides: [
                ContentFlagCounts::from_content_flags(side0),
                ContentFlagCounts::from_content_flags(side1),
            ],
        }
    }

    pub fn clear(&mut self) {
        self.sides[0].clear();
        self.sides[1].clear();
    }

    pub fn clear_side(&mut self, side: usize) {
        self.sides[side].clear();
    }

    pub fn content_flags_for_side(&self, side: usize) -> ContentFlags {
        self.sides[side].to_content_flags()
    }

    /// Accumulates `other` into `self`; `flip` swaps the sides of `other`
    /// first, for edges with opposite direction.
    pub fn merge(&mut self, other: &EdgePathingFlags, flip: bool) {
        let (a, b) = if flip { (1, 0) } else { (0, 1) };
        for i in 0..ContentFlagCounts::COUNT {
            self.sides[0].0[i] += other.sides[a].0[i];
            self.sides[1].0[i] += other.sides[b].0[i];
        }
    }

    /// Same counters with sides swapped.
    pub fn flipped(&self) -> Self {
        Self {
            sides: [self.sides[1], self.sides[0]],
        }
    }
}

/// Filter deciding whether a triangle's flags satisfy a containment query.
pub trait PathFlagsCheck {
    /// When false the filter is skipped and every triangle passes.
    fn can_bypass_check(&self) -> bool;
    fn path_flags_check(&self, flags: PathFlags) -> bool;
}

/// Requires every bit of the wrapped flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultPathFlagsCheck(pub PathFlags);

impl PathFlagsCheck for DefaultPathFlagsCheck {
    fn can_bypass_check(&self) -> bool {
        !self.0.is_empty()
    }

    fn path_flags_check(&self, flags: PathFlags) -> bool {
        flags.contains(self.0)
    }
}
