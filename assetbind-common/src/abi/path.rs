//! Lazily formatted locations of values inside an encoded parameter list,
//! used as hints in codec errors.

use std::fmt::{self, Display, Formatter};

#[derive(Clone, Copy, Debug)]
pub(crate) enum ValuePath<'a> {
    /// A top-level parameter, with its ABI name when one is known.
    Param(usize, &'a str),
    /// An element of an array.
    Element(&'a ValuePath<'a>, usize),
    /// A component of a tuple.
    Component(&'a ValuePath<'a>, usize),
}

impl Display for ValuePath<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ValuePath::Param(index, "") => write!(f, "#{}", index),
            ValuePath::Param(_, name) => f.write_str(name),
            ValuePath::Element(parent, index) => write!(f, "{}[{}]", parent, index),
            ValuePath::Component(parent, index) => write!(f, "{}.{}", parent, index),
        }
    }
}
