/// An opaque failure signalled by the simulator boundary, distinct from a
/// configuration or transport error (§6 "Simulator boundary", §9 "Failure
/// as a control-flow value"). The core never inspects `code`; it exists so
/// diagnostics can echo back whatever the simulator wrapper raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimFailure {
    pub code: i64,
}

impl SimFailure {
    pub fn new(code: i64) -> Self {
        Self { code }
    }
}

impl std::fmt::Display for SimFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "simulator failure (code {})", self.code)
    }
}
