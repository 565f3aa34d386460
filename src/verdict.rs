//! The analyzer's typed conclusion about a method (§6 verdict taxonomy).

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verdict {
    No,
    Maybe,
    AssertionError,
    IndexOutOfBounds,
    ArithmeticException,
    NullPointerException,
    UnsupportedOperationException,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::No => write!(f, "No"),
            Self::Maybe => write!(f, "Maybe"),
            Self::AssertionError => write!(f, "AssertionError"),
            Self::IndexOutOfBounds => write!(f, "IndexOutOfBounds"),
            Self::ArithmeticException => write!(f, "ArithmeticException"),
            Self::NullPointerException => write!(f, "NullPointerException"),
            Self::UnsupportedOperationException => write!(f, "UnsupportedOperationException"),
        }
    }
}

impl Verdict {
    /// Maps a thrown class name to its verdict kind (§4.C: `throw` looks up
    /// the heap class and yields `Exception(kind(class))`).
    ///
    /// Unknown exception classes fall back to `UnsupportedOperationException`
    /// rather than aborting analysis with an implementation error — a thrown
    /// object is always a domain exception, never a decoder failure.
    pub fn from_exception_class(class: &str) -> Self {
        let simple = class.rsplit(['/', '.']).next().unwrap_or(class);
        match simple {
            "AssertionError" => Self::AssertionError,
            "ArrayIndexOutOfBoundsException" | "IndexOutOfBoundsException" | "StringIndexOutOfBoundsException" => {
                Self::IndexOutOfBounds
            }
            "ArithmeticException" => Self::ArithmeticException,
            "NullPointerException" => Self::NullPointerException,
            _ => Self::UnsupportedOperationException,
        }
    }
}

/// Optional evidence attached to a non-`No`/`Maybe` verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Witness {
    /// Sign-lattice analyzer: the refined sign state at the point an
    /// exception-producing instruction was reached.
    SignTrace(String),
    /// Concolic analyzer: the concrete argument assignment that drove
    /// execution down the witnessed path.
    ConcreteArgs(Vec<i64>),
}
