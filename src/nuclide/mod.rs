//! Nuclide identifiers and the periodic-table symbol set.
//!
//! An identifier canonically encodes `Z·10^7 + A·10^4 + S`: `Z` atomic
//! number, `A` mass number, `S` a four-digit isomeric-state tag (`0` for
//! ground state, `1` for the first metastable state reached via an `m`
//! suffix). A legacy `ZZAAA`-style integer (`Z·1000 + A`, no state digits)
//! is accepted and canonicalized on ingestion, as is a symbolic form like
//! `"U-235"` or `"Cs-137m"`.

pub mod registry;

use std::fmt;
use std::str::FromStr;

use chumsky::prelude::{end, filter, just, text, Parser, Simple};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde_with::DeserializeFromStr;

use crate::error::Error;

/// Below this magnitude a bare integer is the legacy `Z·1000 + A` form;
/// at or above it, `Z·10_000_000` alone already exceeds it for any valid
/// `Z >= 1`, so it is unambiguously the canonical encoding.
const LEGACY_THRESHOLD: u32 = 10_000_000;

/// A nuclide identifier, canonically `Z·10^7 + A·10^4 + S`.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, DeserializeFromStr)]
pub struct NuclideId(u32);

impl NuclideId {
    /// Builds a canonical id directly from its parts, without validating.
    pub const fn from_parts(z: u32, a: u32, state: u32) -> Self {
        Self(z * 10_000_000 + a * 10_000 + state)
    }

    /// Canonicalizes a legacy `Z·1000 + A` identifier (ground state).
    pub const fn from_legacy(zzaaa: u32) -> Self {
        Self::from_parts(zzaaa / 1000, zzaaa % 1000, 0)
    }

    /// The raw canonical integer encoding.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Atomic number.
    pub const fn z(self) -> u32 {
        self.0 / 10_000_000
    }

    /// Mass number.
    pub const fn a(self) -> u32 {
        (self.0 / 10_000) % 1_000
    }

    /// Isomeric-state tag (`0` = ground state).
    pub const fn state(self) -> u32 {
        self.0 % 10_000
    }

    /// The same nuclide in its ground state, used to key tables that don't
    /// distinguish isomers (e.g. the builtin atomic-mass table).
    pub const fn ground_state(self) -> Self {
        Self::from_parts(self.z(), self.a(), 0)
    }

    /// `1 <= Z <= 118` and `A >= Z`, the validity predicate from the data
    /// model.
    pub const fn is_valid(self) -> bool {
        let z = self.z();
        z >= 1 && z <= 118 && self.a() >= z
    }

    /// The element this nuclide belongs to, if `Z` is in range.
    pub fn element(self) -> Option<Element> {
        Element::from_z(self.z() as u8)
    }
}

impl fmt::Display for NuclideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.element() {
            Some(element) => {
                write!(f, "{}-{}", element.symbol(), self.a())?;
                if self.state() == 1 {
                    write!(f, "m")?;
                } else if self.state() > 1 {
                    write!(f, "[{}]", self.state())?;
                }
                Ok(())
            }
            None => write!(f, "{}", self.0),
        }
    }
}

impl FromStr for NuclideId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        nuclide_id_parser()
            .then_ignore(end())
            .parse(s.trim())
            .map_err(|_| Error::InvalidNuclide(s.to_string()))
            .and_then(|id| {
                if id.is_valid() {
                    Ok(id)
                } else {
                    Err(Error::InvalidNuclide(s.to_string()))
                }
            })
    }
}

fn nuclide_id_parser() -> impl Parser<char, NuclideId, Error = Simple<char>> {
    let numeric = text::int(10).try_map(|s: String, span| {
        s.parse::<u32>()
            .map_err(|e| Simple::custom(span, e.to_string()))
    });

    let numeric_id = numeric.map(|n| {
        if n < LEGACY_THRESHOLD {
            NuclideId::from_legacy(n)
        } else {
            NuclideId(n)
        }
    });

    let symbol = filter(|c: &char| c.is_ascii_alphabetic())
        .repeated()
        .at_least(1)
        .collect::<String>()
        .try_map(|s, span| {
            Element::from_symbol(&s).ok_or_else(|| Simple::custom(span, "unknown element symbol"))
        });

    let mass = text::int(10).try_map(|s: String, span| {
        s.parse::<u32>()
            .map_err(|e| Simple::custom(span, e.to_string()))
    });

    let isomeric_suffix = filter(|c: &char| c.is_ascii_alphabetic())
        .repeated()
        .collect::<String>();

    let symbolic_id = symbol
        .then_ignore(just('-').or_not())
        .then(mass)
        .then(isomeric_suffix)
        .map(|((element, a), suffix)| {
            let state = if suffix.is_empty() { 0 } else { 1 };
            NuclideId::from_parts(element as u32, a, state)
        });

    symbolic_id.or(numeric_id)
}

/// The full periodic table, `Z = 1..=118`.
#[rustfmt::skip]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromPrimitive)]
pub enum Element {
    H = 1, He, Li, Be, B, C, N, O, F, Ne, Na, Mg, Al, Si, P, S, Cl, Ar, K, Ca,
    Sc, Ti, V, Cr, Mn, Fe, Co, Ni, Cu, Zn, Ga, Ge, As, Se, Br, Kr, Rb, Sr, Y,
    Zr, Nb, Mo, Tc, Ru, Rh, Pd, Ag, Cd, In, Sn, Sb, Te, I, Xe, Cs, Ba, La, Ce,
    Pr, Nd, Pm, Sm, Eu, Gd, Tb, Dy, Ho, Er, Tm, Yb, Lu, Hf, Ta, W, Re, Os, Ir,
    Pt, Au, Hg, Tl, Pb, Bi, Po, At, Rn, Fr, Ra, Ac, Th, Pa, U, Np, Pu, Am, Cm,
    Bk, Cf, Es, Fm, Md, No, Lr, Rf, Db, Sg, Bh, Hs, Mt, Ds, Rg, Cn, Nh, Fl, Mc,
    Lv, Ts, Og,
}

#[rustfmt::skip]
const SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al",
    "Si", "P", "S", "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe",
    "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr",
    "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn",
    "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm",
    "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W",
    "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl", "Pb", "Bi", "Po", "At", "Rn",
    "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf",
    "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds",
    "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

impl Element {
    pub fn from_z(z: u8) -> Option<Self> {
        FromPrimitive::from_u8(z)
    }

    pub fn from_symbol(s: &str) -> Option<Self> {
        SYMBOLS
            .iter()
            .position(|sym| sym.eq_ignore_ascii_case(s))
            .map(|i| Element::from_z((i + 1) as u8).unwrap())
    }

    pub fn symbol(self) -> &'static str {
        SYMBOLS[self as usize - 1]
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Element {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Element::from_symbol(s).ok_or_else(|| Error::InvalidNuclide(s.to_string()))
    }
}
