/// The text-entry surface a controller is attached to.
pub trait InputSurface: Send + Sync {
    /// Hide any on-screen input method. Called when a submission is accepted.
    fn dismiss(&self);
}

/// For headless use.
pub struct NoopSurface;

impl InputSurface for NoopSurface {
    fn dismiss(&self) {}
}
