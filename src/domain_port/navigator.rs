pub trait Navigator: Send + Sync {
    /// Replaces the current location with `route`.
    fn replace(&self, route: &str);
}
