use std::net::IpAddr;

/// The role a field plays on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Not exposed on the command line: the kind of a field marked `ignore` or `option = "skip"`.
    ///
    /// Such fields are dropped while declaring, so no compiled [`crate::OptionDescriptor`] carries it.
    Ignore,
    /// A boolean toggle which takes no value (ex: `--verbose`).
    Flip,
    /// A named option which takes precisely one value (ex: `--name NAME`).
    Flag,
    /// A positional value, consumed in declaration order.
    Argument,
    /// A nested record which consumes the rest of the command line.
    Subcommand,
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The semantic value type of a field, which decides coercion and the displayed hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeHint {
    /// No value (switches and sub-commands).
    None,
    /// Signed integer, any of `0x`, `0b`, `0o`/`0` or decimal.
    Int,
    /// Unsigned integer, same bases as `Int`.
    Uint,
    /// Float or `numerator/denominator` rational.
    Rat,
    /// Raw string.
    Str,
    /// Existing file, opened read-only.
    File,
    /// File permission bits.
    FileMode,
    /// RFC 3339 timestamp.
    Time,
    /// Human readable duration (ex: `1h30m`).
    Span,
    /// Network interface by name.
    Iface,
    /// IPv4/IPv6 address or resolvable hostname.
    Ip,
    /// Network address with mask.
    Cidr,
}

impl std::fmt::Display for TypeHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hint = match self {
            TypeHint::None => "NONE",
            TypeHint::Int => "INT",
            TypeHint::Uint => "UINT",
            TypeHint::Rat => "RAT",
            TypeHint::Str => "STR",
            TypeHint::File => "FILE",
            TypeHint::FileMode => "FMODE",
            TypeHint::Time => "TIME",
            TypeHint::Span => "SPAN",
            TypeHint::Iface => "IFACE",
            TypeHint::Ip => "IP",
            TypeHint::Cidr => "CIDR",
        };
        write!(f, "{hint}")
    }
}

/// File permission bits, always below `2^32`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileMode(pub u32);

impl FileMode {
    /// The raw mode bits.
    pub fn bits(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for FileMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The leading zero keeps the text octal when it is parsed back.
        match self.0 {
            0 => write!(f, "0"),
            bits => write!(f, "0{bits:o}"),
        }
    }
}

/// A network interface of this host, with the addresses assigned to it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NetInterface {
    /// The OS-level interface name (ex: `lo`, `eth0`).
    pub name: String,
    /// Every address bound to the interface.
    pub addresses: Vec<IpAddr>,
}

impl std::fmt::Display for NetInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TypeHint::None, "NONE")]
    #[case(TypeHint::Int, "INT")]
    #[case(TypeHint::Uint, "UINT")]
    #[case(TypeHint::Rat, "RAT")]
    #[case(TypeHint::Str, "STR")]
    #[case(TypeHint::File, "FILE")]
    #[case(TypeHint::FileMode, "FMODE")]
    #[case(TypeHint::Time, "TIME")]
    #[case(TypeHint::Span, "SPAN")]
    #[case(TypeHint::Iface, "IFACE")]
    #[case(TypeHint::Ip, "IP")]
    #[case(TypeHint::Cidr, "CIDR")]
    fn type_hint_display(#[case] hint: TypeHint, #[case] expected: &str) {
        assert_eq!(hint.to_string(), expected);
    }

    #[test]
    fn file_mode_display() {
        assert_eq!(FileMode(0o644).to_string(), "0644");
        assert_eq!(FileMode(0).to_string(), "0");
        assert_eq!(FileMode(0o644).bits(), 420);
    }
}
