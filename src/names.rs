//! Fresh-name generation for temporaries.
//!
//! One `NameGen` is owned by one compilation, so independent compilations
//! never share counter state and tests get deterministic names.

/// Generates globally unique temporary names within one compilation.
///
/// Names have the form `tmp.0`, `tmp.1`, and so on. The `.` cannot appear
/// in a source-level identifier, so generated names never collide.
#[derive(Debug, Default)]
pub struct NameGen {
    next: u32,
}

impl NameGen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a name never returned before by this generator.
    pub fn fresh(&mut self) -> String {
        let n = self.next;
        self.next += 1;
        format!("tmp.{}", n)
    }
}
