//! Capability sets for operators and functions.
//!
//! Operators and functions advertise which operations they support as a
//! [`Capabilities`] bitmask. Algorithms query it once at construction, so a
//! missing capability is reported before the first iteration instead of in
//! the middle of a run.
use std::fmt;

/// Capability — one operation an operator or function may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Direct,
    Adjoint,
    Value,
    Gradient,
    Proximal,
    ConvexConjugate,
    ProximalConjugate,
}

impl Capability {
    pub const ALL: [Capability; 7] = [
        Capability::Direct,
        Capability::Adjoint,
        Capability::Value,
        Capability::Gradient,
        Capability::Proximal,
        Capability::ConvexConjugate,
        Capability::ProximalConjugate,
    ];

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Direct => "direct",
            Capability::Adjoint => "adjoint",
            Capability::Value => "value",
            Capability::Gradient => "gradient",
            Capability::Proximal => "proximal",
            Capability::ConvexConjugate => "convex_conjugate",
            Capability::ProximalConjugate => "proximal_conjugate",
        };
        f.write_str(name)
    }
}

/// Capabilities — set of [`Capability`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);

    /// Build a set from a list of capabilities.
    pub const fn of(caps: &[Capability]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < caps.len() {
            bits |= caps[i].bit();
            i += 1;
        }
        Capabilities(bits)
    }

    pub const fn with(self, cap: Capability) -> Self {
        Capabilities(self.0 | cap.bit())
    }

    pub const fn without(self, cap: Capability) -> Self {
        Capabilities(self.0 & !cap.bit())
    }

    pub const fn contains(self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    pub const fn intersection(self, other: Capabilities) -> Self {
        Capabilities(self.0 & other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, cap) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{cap}")?;
        }
        write!(f, "}}")
    }
}
