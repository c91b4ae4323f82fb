use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags::bitflags! {
    /// Per-child record flags
    ///
    /// Serialized as the raw bit set so persisted trees stay compact.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InfoFlags: u16 {
        /// Remote access requires admin permission.
        const ADMIN = 1 << 0;
        /// Not listed to remote peers.
        const HIDDEN = 1 << 1;
        /// Never persisted.
        const TRANSIENT = 1 << 2;
        /// Remote peers may not write the value.
        const READ_ONLY = 1 << 3;
        /// Cannot be removed; set on every declared default.
        const PERMANENT = 1 << 4;
        /// Copies take the default's current value instead of the local one.
        const DEFAULT_ON_COPY = 1 << 5;
    }
}

impl Serialize for InfoFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.bits())
    }
}

impl<'de> Deserialize<'de> for InfoFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u16::deserialize(deserializer).map(InfoFlags::from_bits_truncate)
    }
}

impl InfoFlags {
    /// Lower-case names of the set flags, for logs and diagnostics
    pub fn names(self) -> Vec<&'static str> {
        self.iter_names()
            .map(|(name, _)| match name {
                "ADMIN" => "admin",
                "HIDDEN" => "hidden",
                "TRANSIENT" => "transient",
                "READ_ONLY" => "read_only",
                "PERMANENT" => "permanent",
                _ => "default_on_copy",
            })
            .collect()
    }
}
