use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// A segment sequence number.
///
/// The sequence space is 16 bits wide and wraps around, so sequence numbers have no total order.
///  Comparisons go through [Seq::wrapping_cmp], which is meaningful as long as the compared
///  numbers are less than half the sequence space apart. The send window is far smaller than
///  that, see [crate::config::AckConfig::MAX_WINDOW_SIZE].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Seq(u16);

impl Display for Seq {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Seq {
    pub const ZERO: Seq = Seq(0);

    pub fn from_raw(value: u16) -> Self {
        Self(value)
    }

    pub fn to_raw(&self) -> u16 {
        self.0
    }

    /// A random starting point in the sequence space, e.g. for a newly created endpoint
    pub fn random() -> Seq {
        Seq(rand::random())
    }

    pub fn next(&self) -> Seq {
        Seq(self.0.wrapping_add(1))
    }

    pub fn prev(&self) -> Seq {
        Seq(self.0.wrapping_sub(1))
    }

    pub fn plus(&self, n: u16) -> Seq {
        Seq(self.0.wrapping_add(n))
    }

    /// the number of increments it takes to get from `earlier` to `self`
    pub fn distance_from(&self, earlier: Seq) -> u16 {
        self.0.wrapping_sub(earlier.0)
    }

    pub fn wrapping_cmp(&self, other: Seq) -> Ordering {
        (self.0.wrapping_sub(other.0) as i16).cmp(&0)
    }

    pub fn is_before(&self, other: Seq) -> bool {
        self.wrapping_cmp(other) == Ordering::Less
    }

    pub fn is_after(&self, other: Seq) -> bool {
        self.wrapping_cmp(other) == Ordering::Greater
    }

    /// The slot index of this sequence number in a window of the given size, which must be a
    ///  power of two
    pub fn slot(&self, window_size: usize) -> usize {
        debug_assert!(window_size.is_power_of_two());
        self.0 as usize & (window_size - 1)
    }
}
