//! Conversions from a command line token to a typed value.
//!
//! Every function here is pure apart from the filesystem/network lookups of
//! [`open_file`], [`lookup_interface`] and [`resolve_ip`].
//! Nothing is written anywhere on failure; the caller decides where the value goes.
use std::fs::File;
use std::net::{IpAddr, ToSocketAddrs};
use std::sync::LazyLock;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use ipnet::IpNet;
use num_rational::Ratio;
use num_traits::ToPrimitive;
use regex::Regex;
use thiserror::Error;
use unicode_width::UnicodeWidthStr;

use crate::model::{FileMode, NetInterface, TypeHint};

static RE_HEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0[xX]([0-9a-fA-F]+)$").expect("static regex must compile"));
static RE_BIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0[bB]([01]+)$").expect("static regex must compile"));
static RE_OCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0[oO]?([0-7]+)$").expect("static regex must compile"));
static RE_DEC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0|[1-9][0-9]*)$").expect("static regex must compile"));
static RE_FLOAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?(0|[1-9][0-9]*)?\.[0-9]+$").expect("static regex must compile")
});
static RE_RAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^/]+)/([^/]+)$").expect("static regex must compile"));

/// Failure to convert a token into the requested value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoerceError {
    /// Not a signed integer in any supported base.
    #[error("'{token}' is not a valid INT.")]
    Int {
        /// The offending token.
        token: String,
    },
    /// Not an unsigned integer in any supported base.
    #[error("'{token}' is not a valid UINT.")]
    Uint {
        /// The offending token.
        token: String,
    },
    /// Neither a float, a rational nor an integer.
    #[error("'{token}' is not a valid RAT.")]
    Rat {
        /// The offending token.
        token: String,
    },
    /// A rational with a zero denominator.
    #[error("'{token}' has a zero denominator.")]
    ZeroDenominator {
        /// The offending token.
        token: String,
    },
    /// Not `true` or `false`.
    #[error("'{token}' is not a valid boolean.")]
    Bool {
        /// The offending token.
        token: String,
    },
    /// The value does not fit the destination field without loss.
    #[error("'{token}' overflows {target}.")]
    Overflow {
        /// The offending token.
        token: String,
        /// The destination type.
        target: &'static str,
    },
    /// The path does not exist.
    #[error("file '{path}' does not exist.")]
    FileMissing {
        /// The requested path.
        path: String,
    },
    /// The path exists but is a directory.
    #[error("'{path}' is not a file.")]
    NotAFile {
        /// The requested path.
        path: String,
    },
    /// The file exists but could not be opened.
    #[error("cannot open file '{path}': {reason}.")]
    FileOpen {
        /// The requested path.
        path: String,
        /// The underlying OS error.
        reason: String,
    },
    /// Not an unsigned integer below `2^32`.
    #[error("invalid file-mode '{token}'.")]
    FileMode {
        /// The offending token.
        token: String,
    },
    /// Not an RFC 3339 timestamp.
    #[error("invalid time '{token}': {reason}.")]
    Time {
        /// The offending token.
        token: String,
        /// The parser's explanation.
        reason: String,
    },
    /// Not a human readable duration.
    #[error("invalid time duration '{token}': {reason}.")]
    Span {
        /// The offending token.
        token: String,
        /// The parser's explanation.
        reason: String,
    },
    /// No interface of this name on the host.
    #[error("invalid IFACE '{token}'.")]
    Iface {
        /// The offending token.
        token: String,
    },
    /// Neither an address literal nor a resolvable hostname.
    #[error("invalid IP '{token}'.")]
    Ip {
        /// The offending token.
        token: String,
    },
    /// Not in CIDR notation.
    #[error("invalid CIDR '{token}': {reason}.")]
    Cidr {
        /// The offending token.
        token: String,
        /// The parser's explanation.
        reason: String,
    },
    /// The destination has no conversion from a token.
    #[error("not implemented set {hint}.")]
    Unsupported {
        /// The hint of the destination.
        hint: TypeHint,
    },
}

// Splits the base prefix off an unsigned literal.
fn split_radix(token: &str) -> Option<(u32, &str)> {
    let radixes: [(&LazyLock<Regex>, u32); 4] =
        [(&RE_HEX, 16), (&RE_BIN, 2), (&RE_OCT, 8), (&RE_DEC, 10)];

    radixes.iter().find_map(|(re, radix)| {
        re.captures(token)
            .and_then(|captures| captures.get(1))
            .map(|digits| (*radix, digits.as_str()))
    })
}

/// Parse a signed integer with an optional leading `-`.
///
/// `0x`/`0X` is hexadecimal, `0b`/`0B` binary, `0o`/`0O` or a bare leading `0` octal, anything else decimal.
/// The literal `"0"` is decimal zero.
pub fn parse_int(token: &str) -> Result<i64, CoerceError> {
    let invalid = || CoerceError::Int {
        token: token.to_string(),
    };
    let (negative, unsigned) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let (radix, digits) = split_radix(unsigned).ok_or_else(invalid)?;
    // Keep the sign attached so that i64::MIN stays representable.
    let literal = if negative {
        format!("-{digits}")
    } else {
        digits.to_string()
    };

    i64::from_str_radix(&literal, radix).map_err(|_| invalid())
}

/// Parse an unsigned integer; the bases are the same as [`parse_int`], a sign is rejected.
pub fn parse_uint(token: &str) -> Result<u64, CoerceError> {
    let invalid = || CoerceError::Uint {
        token: token.to_string(),
    };
    let (radix, digits) = split_radix(token).ok_or_else(invalid)?;
    u64::from_str_radix(digits, radix).map_err(|_| invalid())
}

/// Parse a float (`-1.25`), a rational (`-5/4`, each side base aware) or a plain signed integer.
///
/// Rationals are reduced exactly before the single conversion to floating point.
pub fn parse_rat(token: &str) -> Result<f64, CoerceError> {
    let invalid = || CoerceError::Rat {
        token: token.to_string(),
    };

    if RE_FLOAT.is_match(token) {
        return token.parse::<f64>().map_err(|_| invalid());
    }

    if let Some(captures) = RE_RAT.captures(token) {
        let numerator = parse_int(&captures[1]).map_err(|_| invalid())?;
        let denominator = parse_int(&captures[2]).map_err(|_| invalid())?;

        if denominator == 0 {
            return Err(CoerceError::ZeroDenominator {
                token: token.to_string(),
            });
        }

        // i128 so that normalising the sign of i64::MIN cannot overflow.
        // Converted as a whole: dividing two rounded operands rounds twice.
        let ratio = Ratio::new(i128::from(numerator), i128::from(denominator));
        return ratio.to_f64().ok_or_else(invalid);
    }

    parse_int(token).map(|value| value as f64).map_err(|_| invalid())
}

/// Parse `true` or `false`.
pub fn parse_bool(token: &str) -> Result<bool, CoerceError> {
    token.parse::<bool>().map_err(|_| CoerceError::Bool {
        token: token.to_string(),
    })
}

/// Open an existing, non-directory path read-only.
pub fn open_file(path: &str) -> Result<File, CoerceError> {
    match std::fs::metadata(path) {
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Err(CoerceError::FileMissing {
                path: path.to_string(),
            });
        }
        Ok(metadata) if metadata.is_dir() => {
            return Err(CoerceError::NotAFile {
                path: path.to_string(),
            });
        }
        _ => {}
    }

    File::open(path).map_err(|error| CoerceError::FileOpen {
        path: path.to_string(),
        reason: error.to_string(),
    })
}

/// Parse permission bits as an unsigned integer (any base) below `2^32`.
pub fn parse_file_mode(token: &str) -> Result<FileMode, CoerceError> {
    let invalid = || CoerceError::FileMode {
        token: token.to_string(),
    };
    let bits = parse_uint(token).map_err(|_| invalid())?;
    u32::try_from(bits).map(FileMode).map_err(|_| invalid())
}

/// Parse a strict RFC 3339 timestamp.
pub fn parse_timestamp(token: &str) -> Result<DateTime<FixedOffset>, CoerceError> {
    DateTime::parse_from_rfc3339(token).map_err(|error| CoerceError::Time {
        token: token.to_string(),
        reason: error.to_string(),
    })
}

/// Parse a human readable duration such as `100ms` or `1h30m`.
pub fn parse_duration(token: &str) -> Result<Duration, CoerceError> {
    humantime::parse_duration(token).map_err(|error| CoerceError::Span {
        token: token.to_string(),
        reason: error.to_string(),
    })
}

/// Find a network interface of this host by name.
pub fn lookup_interface(name: &str) -> Result<NetInterface, CoerceError> {
    let invalid = || CoerceError::Iface {
        token: name.to_string(),
    };
    let addresses: Vec<IpAddr> = if_addrs::get_if_addrs()
        .map_err(|_| invalid())?
        .into_iter()
        .filter(|interface| interface.name == name)
        .map(|interface| interface.ip())
        .collect();

    if addresses.is_empty() {
        return Err(invalid());
    }

    Ok(NetInterface {
        name: name.to_string(),
        addresses,
    })
}

/// Parse an address literal, or resolve a hostname and take its first address.
pub fn resolve_ip(token: &str) -> Result<IpAddr, CoerceError> {
    if let Ok(address) = token.parse::<IpAddr>() {
        return Ok(address);
    }

    (token, 0)
        .to_socket_addrs()
        .ok()
        .and_then(|mut addresses| addresses.next())
        .map(|address| address.ip())
        .ok_or_else(|| CoerceError::Ip {
            token: token.to_string(),
        })
}

/// Parse CIDR notation into the network (host bits cleared) and its mask.
pub fn parse_network(token: &str) -> Result<IpNet, CoerceError> {
    token
        .parse::<IpNet>()
        .map(|network| network.trunc())
        .map_err(|error| CoerceError::Cidr {
            token: token.to_string(),
            reason: error.to_string(),
        })
}

/// The number of terminal columns `text` occupies; East Asian wide glyphs take two.
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}
