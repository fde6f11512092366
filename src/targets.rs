use std::fmt;
use std::iter::Once;
use std::net::Ipv4Addr;

use ipnet::Ipv4AddrRange;

use crate::error::{Error, Result};

/// What to scan: one host verbatim, or a run of IPv4 addresses sharing a /24 prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// Taken as given. No resolution happens up front; an unresolvable name
    /// just produces no open ports.
    Single(String),
    /// Inclusive range varying only in the fourth octet.
    Range { start: Ipv4Addr, end: Ipv4Addr },
}

impl TargetSpec {
    pub fn single(host: impl Into<String>) -> Self {
        Self::Single(host.into())
    }

    /// Validate two endpoint strings and build a range target.
    pub fn range(start: &str, end: &str) -> Result<Self> {
        let s = parse_endpoint(start)?;
        let e = parse_endpoint(end)?;
        let (so, eo) = (s.octets(), e.octets());
        if so[..3] != eo[..3] {
            return Err(Error::RangePrefixMismatch {
                start: s.to_string(),
                end: e.to_string(),
            });
        }
        if so[3] > eo[3] {
            return Err(Error::RangeReversed {
                start: s.to_string(),
                end: e.to_string(),
            });
        }
        Ok(Self::Range { start: s, end: e })
    }

    /// Parse `A.B.C.S-A.B.C.E`.
    pub fn parse_range(spec: &str) -> Result<Self> {
        let (start, end) = spec
            .split_once('-')
            .ok_or_else(|| Error::MalformedRange(spec.to_string()))?;
        if end.contains('-') {
            return Err(Error::MalformedRange(spec.to_string()));
        }
        Self::range(start, end)
    }

    /// Lazily yield every host to scan, in ascending order.
    pub fn hosts(&self) -> Hosts {
        match self {
            Self::Single(host) => Hosts::Single(std::iter::once(host.clone())),
            Self::Range { start, end } => Hosts::Range(Ipv4AddrRange::new(*start, *end)),
        }
    }

    pub fn host_count(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Range { start, end } => usize::from(end.octets()[3] - start.octets()[3]) + 1,
        }
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(host) => f.write_str(host),
            Self::Range { start, end } => write!(f, "{start}-{end}"),
        }
    }
}

/// Iterator returned by [`TargetSpec::hosts`].
#[derive(Debug, Clone)]
pub enum Hosts {
    Single(Once<String>),
    Range(Ipv4AddrRange),
}

impl Iterator for Hosts {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        match self {
            Self::Single(it) => it.next(),
            Self::Range(it) => it.next().map(|ip| ip.to_string()),
        }
    }
}

/// Expand a start/end address pair into the host strings it covers.
pub fn expand_targets(start: &str, end: &str) -> Result<Vec<String>> {
    Ok(TargetSpec::range(start, end)?.hosts().collect())
}

fn parse_endpoint(s: &str) -> Result<Ipv4Addr> {
    let trimmed = s.trim();
    trimmed
        .parse::<Ipv4Addr>()
        .map_err(|_| Error::InvalidAddress(trimmed.to_string()))
}
