/// Single-identity gate guarding `/admin`.
#[derive(Clone, Debug)]
pub struct AdminGate {
    handle: String,
}

impl AdminGate {
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
        }
    }

    /// Exact, case-sensitive match. No trimming, no `@` stripping.
    pub fn is_admin(&self, handle: Option<&str>) -> bool {
        let Some(handle) = handle else {
            return false;
        };
        if self.handle.is_empty() {
            return false;
        }
        handle == self.handle
    }
}
