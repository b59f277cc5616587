use crate::error::InvalidChannel;

/// Channel list for MCP3008
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Channel {
    CH0 = 0,
    CH1 = 1,
    CH2 = 2,
    CH3 = 3,
    CH4 = 4,
    CH5 = 5,
    CH6 = 6,
    CH7 = 7,
}

impl Channel {
    const ALL: [Self; 8] = [
        Self::CH0,
        Self::CH1,
        Self::CH2,
        Self::CH3,
        Self::CH4,
        Self::CH5,
        Self::CH6,
        Self::CH7,
    ];

    /// Iterate over all channels.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::ALL.into_iter()
    }

    /// The 3-bit channel select value.
    pub fn index(self) -> u8 {
        self as u8
    }
}

impl TryFrom<i32> for Channel {
    type Error = InvalidChannel;

    fn try_from(index: i32) -> Result<Self, Self::Error> {
        usize::try_from(index)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or(InvalidChannel(index))
    }
}

impl From<Channel> for i32 {
    fn from(channel: Channel) -> Self {
        channel.index() as i32
    }
}
