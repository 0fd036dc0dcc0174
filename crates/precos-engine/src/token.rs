use std::fmt;

/// Identifier tying an asynchronous completion back to the request that
/// issued it. Tokens are monotonically increasing per surface; a
/// completion is applied only when its token matches the most recently
/// issued one, which is the whole stale-response discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic token source. Each independent lookup surface owns one.
#[derive(Debug, Default)]
pub struct TokenSeq(u64);

impl TokenSeq {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self) -> RequestToken {
        self.0 += 1;
        RequestToken(self.0)
    }
}
