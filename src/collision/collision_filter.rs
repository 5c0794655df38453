use bitflags::bitflags;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

bitflags! {
    /// Collision layer or mask bits of a collision object
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
    pub struct CollisionLayers: u32 {
        const LAYER_1 = 0x00000001;
        const LAYER_2 = 0x00000002;
        const LAYER_3 = 0x00000004;
        const LAYER_4 = 0x00000008;
        const LAYER_5 = 0x00000010;
        const LAYER_6 = 0x00000020;
        const LAYER_7 = 0x00000040;
        const LAYER_8 = 0x00000080;
        const LAYER_9 = 0x00000100;
        const LAYER_10 = 0x00000200;
        const LAYER_11 = 0x00000400;
        const LAYER_12 = 0x00000800;
        const LAYER_13 = 0x00001000;
        const LAYER_14 = 0x00002000;
        const LAYER_15 = 0x00004000;
        const LAYER_16 = 0x00008000;
        const LAYER_17 = 0x00010000;
        const LAYER_18 = 0x00020000;
        const LAYER_19 = 0x00040000;
        const LAYER_20 = 0x00080000;
        const LAYER_21 = 0x00100000;
        const LAYER_22 = 0x00200000;
        const LAYER_23 = 0x00400000;
        const LAYER_24 = 0x00800000;
        const LAYER_25 = 0x01000000;
        const LAYER_26 = 0x02000000;
        const LAYER_27 = 0x04000000;
        const LAYER_28 = 0x08000000;
        const LAYER_29 = 0x10000000;
        const LAYER_30 = 0x20000000;
        const LAYER_31 = 0x40000000;
        const LAYER_32 = 0x80000000;

        /// All layers
        const ALL = 0xFFFFFFFF;
    }
}

impl Default for CollisionLayers {
    fn default() -> Self {
        CollisionLayers::LAYER_1
    }
}

/// Layer and mask of a collision object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct CollisionFilter {
    /// Layers this object lives in
    pub layer: CollisionLayers,

    /// Layers this object scans
    pub mask: CollisionLayers,
}

impl CollisionFilter {
    pub fn new(layer: CollisionLayers, mask: CollisionLayers) -> Self {
        Self { layer, mask }
    }

    /// Two objects interact if either one scans a layer the other lives in
    #[inline]
    pub fn interacts_with(&self, other: &CollisionFilter) -> bool {
        self.layer.intersects(other.mask) || other.layer.intersects(self.mask)
    }

    /// Returns whether this object scans a layer of `other`
    #[inline]
    pub fn scans(&self, other: &CollisionFilter) -> bool {
        self.mask.intersects(other.layer)
    }
}
